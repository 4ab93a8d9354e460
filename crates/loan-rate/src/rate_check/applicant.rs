use std::fmt;

use serde::{Deserialize, Serialize};

use super::fields::{descriptor, STEPS};

/// Number of questions asked by the rate check form.
pub const FIELD_COUNT: usize = 11;

/// Applicant fields in the order the form asks for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    NoOfDependents,
    Education,
    SelfEmployed,
    IncomeAnnum,
    LoanAmount,
    LoanTerm,
    CibilScore,
    ResidentialAssetsValue,
    CommercialAssetsValue,
    LuxuryAssetsValue,
    BankAssetValue,
}

impl FieldName {
    pub const ALL: [FieldName; FIELD_COUNT] = [
        FieldName::NoOfDependents,
        FieldName::Education,
        FieldName::SelfEmployed,
        FieldName::IncomeAnnum,
        FieldName::LoanAmount,
        FieldName::LoanTerm,
        FieldName::CibilScore,
        FieldName::ResidentialAssetsValue,
        FieldName::CommercialAssetsValue,
        FieldName::LuxuryAssetsValue,
        FieldName::BankAssetValue,
    ];

    /// Key used by the scoring API for this field.
    pub fn key(self) -> &'static str {
        match self {
            FieldName::NoOfDependents => "no_of_dependents",
            FieldName::Education => "education",
            FieldName::SelfEmployed => "self_employed",
            FieldName::IncomeAnnum => "income_annum",
            FieldName::LoanAmount => "loan_amount",
            FieldName::LoanTerm => "loan_term",
            FieldName::CibilScore => "cibil_score",
            FieldName::ResidentialAssetsValue => "residential_assets_value",
            FieldName::CommercialAssetsValue => "commercial_assets_value",
            FieldName::LuxuryAssetsValue => "luxury_assets_value",
            FieldName::BankAssetValue => "bank_asset_value",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key.trim())
    }

    pub fn label(self) -> &'static str {
        descriptor(self).label
    }

    /// Value substituted for blank, unparsable, or zero input.
    pub fn default_value(self) -> f64 {
        match self {
            FieldName::LoanTerm => 1.0,
            FieldName::CibilScore => 300.0,
            _ => 0.0,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Coerce raw form text into a number the way the form's input layer does:
/// anything that is not a finite, non-zero number becomes the field default.
pub fn coerce_raw(field: FieldName, raw: &str) -> f64 {
    coerce_number(field, raw.trim().parse::<f64>().unwrap_or(f64::NAN))
}

pub fn coerce_number(field: FieldName, value: f64) -> f64 {
    if value.is_finite() && value != 0.0 {
        value
    } else {
        field.default_value()
    }
}

/// Highest completed education.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EducationLevel {
    NotGraduate,
    Graduate,
}

impl From<EducationLevel> for u8 {
    fn from(value: EducationLevel) -> Self {
        match value {
            EducationLevel::NotGraduate => 0,
            EducationLevel::Graduate => 1,
        }
    }
}

impl TryFrom<u8> for EducationLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NotGraduate),
            1 => Ok(Self::Graduate),
            other => Err(format!("unknown education level {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SelfEmployment {
    No,
    Yes,
}

impl From<SelfEmployment> for u8 {
    fn from(value: SelfEmployment) -> Self {
        match value {
            SelfEmployment::No => 0,
            SelfEmployment::Yes => 1,
        }
    }
}

impl TryFrom<u8> for SelfEmployment {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::No),
            1 => Ok(Self::Yes),
            other => Err(format!("unknown self employment flag {other}")),
        }
    }
}

/// Validated applicant answers for one submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantInput {
    pub no_of_dependents: u32,
    pub education: EducationLevel,
    pub self_employed: SelfEmployment,
    pub income_annum: f64,
    pub loan_amount: f64,
    pub loan_term: u8,
    pub cibil_score: u16,
    pub residential_assets_value: f64,
    pub commercial_assets_value: f64,
    pub luxury_assets_value: f64,
    pub bank_asset_value: f64,
}

/// A field value that failed its declared constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: FieldName,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Partially filled answers, one coerced number per field.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantDraft {
    values: [f64; FIELD_COUNT],
}

impl Default for ApplicantDraft {
    fn default() -> Self {
        let mut values = [0.0; FIELD_COUNT];
        for field in FieldName::ALL {
            values[field.index()] = field.default_value();
        }
        Self { values }
    }
}

impl ApplicantDraft {
    pub fn get(&self, field: FieldName) -> f64 {
        self.values[field.index()]
    }

    /// Store a numeric value, applying the default-coalescing policy.
    pub fn set(&mut self, field: FieldName, value: f64) {
        self.values[field.index()] = coerce_number(field, value);
    }

    pub fn set_raw(&mut self, field: FieldName, raw: &str) -> f64 {
        let value = coerce_raw(field, raw);
        self.values[field.index()] = value;
        value
    }

    pub fn validate_field(&self, field: FieldName) -> Result<(), ValidationError> {
        descriptor(field).validate(self.get(field))
    }

    /// Validate every field in step order and build the typed record.
    pub fn validate(&self) -> Result<ApplicantInput, ValidationError> {
        for step in STEPS.iter() {
            step.validate(self.get(step.name))?;
        }

        Ok(ApplicantInput {
            no_of_dependents: self.get(FieldName::NoOfDependents) as u32,
            education: if self.get(FieldName::Education) == 1.0 {
                EducationLevel::Graduate
            } else {
                EducationLevel::NotGraduate
            },
            self_employed: if self.get(FieldName::SelfEmployed) == 1.0 {
                SelfEmployment::Yes
            } else {
                SelfEmployment::No
            },
            income_annum: self.get(FieldName::IncomeAnnum),
            loan_amount: self.get(FieldName::LoanAmount),
            loan_term: self.get(FieldName::LoanTerm) as u8,
            cibil_score: self.get(FieldName::CibilScore) as u16,
            residential_assets_value: self.get(FieldName::ResidentialAssetsValue),
            commercial_assets_value: self.get(FieldName::CommercialAssetsValue),
            luxury_assets_value: self.get(FieldName::LuxuryAssetsValue),
            bank_asset_value: self.get(FieldName::BankAssetValue),
        })
    }
}

impl From<&ApplicantInput> for ApplicantDraft {
    fn from(input: &ApplicantInput) -> Self {
        let mut draft = Self::default();
        draft.set(FieldName::NoOfDependents, f64::from(input.no_of_dependents));
        draft.set(FieldName::Education, f64::from(u8::from(input.education)));
        draft.set(FieldName::SelfEmployed, f64::from(u8::from(input.self_employed)));
        draft.set(FieldName::IncomeAnnum, input.income_annum);
        draft.set(FieldName::LoanAmount, input.loan_amount);
        draft.set(FieldName::LoanTerm, f64::from(input.loan_term));
        draft.set(FieldName::CibilScore, f64::from(input.cibil_score));
        draft.set(FieldName::ResidentialAssetsValue, input.residential_assets_value);
        draft.set(FieldName::CommercialAssetsValue, input.commercial_assets_value);
        draft.set(FieldName::LuxuryAssetsValue, input.luxury_assets_value);
        draft.set(FieldName::BankAssetValue, input.bank_asset_value);
        draft
    }
}

/// Form value as submitted over HTTP: a JSON number or the raw input text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    pub fn coerce(&self, field: FieldName) -> f64 {
        match self {
            RawValue::Number(value) => coerce_number(field, *value),
            RawValue::Text(raw) => coerce_raw(field, raw),
        }
    }
}

/// Wire shape of a draft; absent keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DraftPayload {
    no_of_dependents: Option<RawValue>,
    education: Option<RawValue>,
    self_employed: Option<RawValue>,
    income_annum: Option<RawValue>,
    loan_amount: Option<RawValue>,
    loan_term: Option<RawValue>,
    cibil_score: Option<RawValue>,
    residential_assets_value: Option<RawValue>,
    commercial_assets_value: Option<RawValue>,
    luxury_assets_value: Option<RawValue>,
    bank_asset_value: Option<RawValue>,
}

impl<'de> Deserialize<'de> for ApplicantDraft {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let payload = DraftPayload::deserialize(deserializer)?;
        let entries = [
            (FieldName::NoOfDependents, payload.no_of_dependents),
            (FieldName::Education, payload.education),
            (FieldName::SelfEmployed, payload.self_employed),
            (FieldName::IncomeAnnum, payload.income_annum),
            (FieldName::LoanAmount, payload.loan_amount),
            (FieldName::LoanTerm, payload.loan_term),
            (FieldName::CibilScore, payload.cibil_score),
            (FieldName::ResidentialAssetsValue, payload.residential_assets_value),
            (FieldName::CommercialAssetsValue, payload.commercial_assets_value),
            (FieldName::LuxuryAssetsValue, payload.luxury_assets_value),
            (FieldName::BankAssetValue, payload.bank_asset_value),
        ];

        let mut draft = ApplicantDraft::default();
        for (field, value) in entries {
            if let Some(value) = value {
                draft.values[field.index()] = value.coerce(field);
            }
        }
        Ok(draft)
    }
}
