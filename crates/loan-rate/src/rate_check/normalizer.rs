//! Maps applicant answers onto the [0, 1] feature ranges the scoring API
//! was trained on.
//!
//! Amounts and the loan term are rounded to 4 decimals, the credit-score
//! probability to 2. Non-finite inputs are treated as zero.

use serde::{Deserialize, Serialize};

use super::applicant::{ApplicantInput, FieldName};
use super::fields::{descriptor, PreviewKind};

/// Currency value that normalizes to 1.0.
pub const AMOUNT_CEILING: f64 = 100_000.0;

/// Decimal rounding of the exact binary value, as the browser's
/// `Number.prototype.toFixed` does it. Exact halves go away from zero.
///
/// Scaling by `10^places` first is not equivalent: 0.00035 is stored just
/// below the half and must round down, but `0.00035 * 1e4` lands above 3.5.
pub(crate) fn round_to(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let magnitude = value.abs();
    let rounded = if is_exact_half(magnitude, places) {
        let factor = 10f64.powi(places as i32);
        (magnitude * factor).ceil() / factor
    } else {
        format!("{:.*}", places, magnitude)
            .parse::<f64>()
            .unwrap_or(magnitude)
    };

    if rounded == 0.0 {
        0.0
    } else {
        rounded.copysign(value)
    }
}

/// Whether `magnitude` sits exactly between two `places`-decimal neighbours.
///
/// Only values with at most `places + 1` fractional bits can, and for those
/// the `places + 1` digit expansion is exact.
fn is_exact_half(magnitude: f64, places: usize) -> bool {
    let scaled = magnitude * 2f64.powi(places as i32 + 1);
    scaled.fract() == 0.0 && format!("{:.*}", places + 1, magnitude).ends_with('5')
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn normalize_amount(value: f64) -> f64 {
    normalize_amount_with(value, AMOUNT_CEILING)
}

/// `min(value / ceiling, 1)` rounded to 4 decimals.
///
/// Negative values pass through; callers are expected to validate first.
pub fn normalize_amount_with(value: f64, ceiling: f64) -> f64 {
    round_to(finite_or_zero(value) / ceiling, 4).min(1.0)
}

/// Rescale a 1..=12 month term onto [0, 1]. Out-of-range terms are not clamped.
pub fn normalize_term(months: f64) -> f64 {
    round_to((finite_or_zero(months) - 1.0) / 11.0, 4)
}

/// Credit score bands used by the approval heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

struct TierCurve {
    floor_score: f64,
    ceiling_score: f64,
    floor_probability: f64,
    probability_span: f64,
    score_span: f64,
    inclusive_ceiling: bool,
}

const EXCELLENT: TierCurve = TierCurve {
    floor_score: 750.0,
    ceiling_score: 850.0,
    floor_probability: 0.95,
    probability_span: 0.04,
    score_span: 100.0,
    inclusive_ceiling: true,
};

const GOOD: TierCurve = TierCurve {
    floor_score: 700.0,
    ceiling_score: 750.0,
    floor_probability: 0.80,
    probability_span: 0.14,
    score_span: 50.0,
    inclusive_ceiling: false,
};

const FAIR: TierCurve = TierCurve {
    floor_score: 650.0,
    ceiling_score: 700.0,
    floor_probability: 0.50,
    probability_span: 0.29,
    score_span: 50.0,
    inclusive_ceiling: false,
};

const POOR: TierCurve = TierCurve {
    floor_score: 300.0,
    ceiling_score: 650.0,
    floor_probability: 0.0,
    probability_span: 0.49,
    score_span: 350.0,
    inclusive_ceiling: false,
};

impl CreditTier {
    pub const ALL: [CreditTier; 4] = [
        CreditTier::Excellent,
        CreditTier::Good,
        CreditTier::Fair,
        CreditTier::Poor,
    ];

    fn curve(self) -> &'static TierCurve {
        match self {
            CreditTier::Excellent => &EXCELLENT,
            CreditTier::Good => &GOOD,
            CreditTier::Fair => &FAIR,
            CreditTier::Poor => &POOR,
        }
    }

    /// Tier containing `score`; scores above 850 or below 300 have none.
    pub fn classify(score: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| {
            let curve = tier.curve();
            let below_ceiling = if curve.inclusive_ceiling {
                score <= curve.ceiling_score
            } else {
                score < curve.ceiling_score
            };
            score >= curve.floor_score && below_ceiling
        })
    }

    /// Evaluate this tier's line at `score`, whether or not the score falls
    /// inside the tier.
    pub fn probability_at(self, score: f64) -> f64 {
        let curve = self.curve();
        let value = curve.floor_probability
            + (score - curve.floor_score) * (curve.probability_span / curve.score_span);
        match self {
            CreditTier::Poor => value.max(0.0),
            _ => value,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CreditTier::Excellent => "Excellent",
            CreditTier::Good => "Good",
            CreditTier::Fair => "Fair",
            CreditTier::Poor => "Poor",
        }
    }
}

/// The tier curve before rounding. Scores outside every tier map to 0.
pub fn credit_probability_unrounded(score: f64) -> f64 {
    let score = finite_or_zero(score);
    CreditTier::classify(score)
        .map(|tier| tier.probability_at(score))
        .unwrap_or(0.0)
}

pub fn score_to_probability(score: f64) -> f64 {
    round_to(credit_probability_unrounded(score), 2)
}

/// Feature set posted to the scoring API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFeatureVector {
    pub no_of_dependents: u32,
    pub education: u8,
    pub self_employed: u8,
    pub income_annum: f64,
    pub loan_amount: f64,
    pub loan_term: f64,
    pub cibil_score: f64,
    pub residential_assets_value: f64,
    pub commercial_assets_value: f64,
    pub luxury_assets_value: f64,
    pub bank_asset_value: f64,
}

pub fn normalize(input: &ApplicantInput) -> NormalizedFeatureVector {
    NormalizedFeatureVector {
        no_of_dependents: input.no_of_dependents,
        education: input.education.into(),
        self_employed: input.self_employed.into(),
        income_annum: normalize_amount(input.income_annum),
        loan_amount: normalize_amount(input.loan_amount),
        loan_term: normalize_term(f64::from(input.loan_term)),
        cibil_score: score_to_probability(f64::from(input.cibil_score)),
        residential_assets_value: normalize_amount(input.residential_assets_value),
        commercial_assets_value: normalize_amount(input.commercial_assets_value),
        luxury_assets_value: normalize_amount(input.luxury_assets_value),
        bank_asset_value: normalize_amount(input.bank_asset_value),
    }
}

/// Live normalized projection shown beside a field while it is edited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldPreview {
    pub field: FieldName,
    pub normalized: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<CreditTier>,
}

/// Preview for fields that are normalized on submit; `None` for raw fields.
pub fn preview(field: FieldName, value: f64) -> Option<FieldPreview> {
    let (normalized, tier) = match descriptor(field).preview {
        PreviewKind::None => return None,
        PreviewKind::Amount => (normalize_amount(value), None),
        PreviewKind::Term => (normalize_term(value), None),
        PreviewKind::CreditScore => (
            score_to_probability(value),
            CreditTier::classify(finite_or_zero(value)),
        ),
    };

    Some(FieldPreview {
        field,
        normalized,
        tier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    #[test]
    fn amount_is_scaled_and_clamped() {
        assert_eq!(normalize_amount(0.0), 0.0);
        assert_eq!(normalize_amount(AMOUNT_CEILING), 1.0);
        assert_eq!(normalize_amount(2.0 * AMOUNT_CEILING), 1.0);
        assert_eq!(normalize_amount(33_333.0), 0.3333);
        assert_eq!(normalize_amount_with(250.0, 1_000.0), 0.25);
        assert_eq!(normalize_amount_with(5_000.0, 1_000.0), 1.0);
        assert_eq!(normalize_amount(f64::NAN), 0.0);
    }

    #[test]
    fn rounding_follows_the_stored_binary_value() {
        // 35 / 100_000 is stored just under 0.00035.
        assert_eq!(normalize_amount(35.0), 0.0003);
        assert_eq!(normalize_amount(95.0), 0.0009);
        assert_eq!(normalize_amount(105.0), 0.001);
        assert_eq!(score_to_probability(375.0), 0.1);
        assert_eq!(score_to_probability(475.0), 0.24);
    }

    #[test]
    fn exact_halves_round_away_from_zero() {
        assert_eq!(normalize_amount(3_125.0), 0.0313);
        assert_eq!(round_to(0.5, 0), 1.0);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(-0.00001, 4), 0.0);
        assert!(round_to(-0.00001, 4).is_sign_positive());
    }

    #[test]
    fn negative_amounts_are_not_rejected() {
        assert_eq!(normalize_amount(-5_000.0), -0.05);
    }

    #[test]
    fn term_spans_unit_interval_monotonically() {
        assert_eq!(normalize_term(1.0), 0.0);
        assert_eq!(normalize_term(12.0), 1.0);
        assert_eq!(normalize_term(6.0), 0.4545);
        let mut previous = f64::NEG_INFINITY;
        for months in 1..=12 {
            let value = normalize_term(f64::from(months));
            assert!(value > previous, "term {months} should increase");
            previous = value;
        }
    }

    #[test]
    fn probability_matches_tier_anchors() {
        assert_eq!(score_to_probability(750.0), 0.95);
        assert_eq!(score_to_probability(850.0), 0.99);
        assert_eq!(score_to_probability(800.0), 0.97);
        assert_eq!(score_to_probability(700.0), 0.8);
        assert_eq!(score_to_probability(650.0), 0.5);
        assert_eq!(score_to_probability(300.0), 0.0);
        assert_eq!(score_to_probability(720.0), 0.86);
    }

    #[test]
    fn unrounded_curve_exposes_tier_slopes() {
        assert!(close(credit_probability_unrounded(699.0), 0.7842));
        assert_eq!(score_to_probability(699.0), 0.78);
        assert!(close(credit_probability_unrounded(720.0), 0.856));
        assert!(close(credit_probability_unrounded(475.0), 0.245));
    }

    #[test]
    fn tier_boundaries_are_discontinuous() {
        // Each lower tier tops out one cent below the next tier's floor.
        assert!(close(CreditTier::Poor.probability_at(650.0), 0.49));
        assert!(close(CreditTier::Fair.probability_at(650.0), 0.50));
        assert!(close(CreditTier::Fair.probability_at(700.0), 0.79));
        assert!(close(CreditTier::Good.probability_at(700.0), 0.80));
        assert!(close(CreditTier::Good.probability_at(750.0), 0.94));
        assert!(close(CreditTier::Excellent.probability_at(750.0), 0.95));

        assert_eq!(score_to_probability(649.0), 0.49);
        assert_eq!(score_to_probability(749.0), 0.94);
    }

    #[test]
    fn scores_outside_tiers_map_to_zero() {
        assert_eq!(score_to_probability(299.0), 0.0);
        assert_eq!(score_to_probability(851.0), 0.0);
        assert_eq!(score_to_probability(900.0), 0.0);
        assert_eq!(score_to_probability(f64::NAN), 0.0);
        assert_eq!(CreditTier::classify(851.0), None);
    }

    #[test]
    fn classify_uses_half_open_bands() {
        assert_eq!(CreditTier::classify(850.0), Some(CreditTier::Excellent));
        assert_eq!(CreditTier::classify(750.0), Some(CreditTier::Excellent));
        assert_eq!(CreditTier::classify(749.0), Some(CreditTier::Good));
        assert_eq!(CreditTier::classify(699.0), Some(CreditTier::Fair));
        assert_eq!(CreditTier::classify(300.0), Some(CreditTier::Poor));
        assert_eq!(CreditTier::Fair.label(), "Fair");
    }

    #[test]
    fn preview_covers_normalized_fields_only() {
        assert_eq!(preview(FieldName::NoOfDependents, 3.0), None);
        assert_eq!(preview(FieldName::Education, 1.0), None);

        let income = preview(FieldName::IncomeAnnum, 50_000.0).expect("income preview");
        assert_eq!(income.normalized, 0.5);
        assert_eq!(income.tier, None);

        let term = preview(FieldName::LoanTerm, 12.0).expect("term preview");
        assert_eq!(term.normalized, 1.0);

        let score = preview(FieldName::CibilScore, 705.0).expect("score preview");
        assert_eq!(score.normalized, 0.81);
        assert_eq!(score.tier, Some(CreditTier::Good));
    }
}
