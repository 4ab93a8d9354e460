//! Declarative table of the rate check questions.
//!
//! Every consumer (validation, live preview, the terminal renderer, the
//! `/steps` endpoint) walks [`STEPS`] instead of branching per field.

use serde::Serialize;

use super::applicant::{FieldName, ValidationError, FIELD_COUNT};

/// Largest dependents count the feature vector can carry.
const MAX_DEPENDENTS: f64 = u32::MAX as f64;

const AMOUNT_INFO: &str = "Will be normalized to a 0-1 scale (max: $100,000)";

/// One entry of a select input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChoiceOption {
    pub label: &'static str,
    pub value: u8,
}

const EDUCATION_OPTIONS: &[ChoiceOption] = &[
    ChoiceOption {
        label: "Not Graduate",
        value: 0,
    },
    ChoiceOption {
        label: "Graduate",
        value: 1,
    },
];

const YES_NO_OPTIONS: &[ChoiceOption] = &[
    ChoiceOption {
        label: "No",
        value: 0,
    },
    ChoiceOption {
        label: "Yes",
        value: 1,
    },
];

/// How the question is presented.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputKind {
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Select {
        options: &'static [ChoiceOption],
    },
}

/// Constraint a value must satisfy before the form may advance past it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Constraint {
    AtLeast {
        min: f64,
        message: &'static str,
    },
    Positive {
        message: &'static str,
    },
    Between {
        min: f64,
        max: f64,
        below: &'static str,
        above: &'static str,
    },
    OneOf {
        message: &'static str,
    },
}

/// Which normalization the live preview shows for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    None,
    Amount,
    Term,
    CreditScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: FieldName,
    pub label: &'static str,
    pub input: InputKind,
    pub constraint: Constraint,
    pub whole_number: bool,
    pub preview: PreviewKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<&'static str>,
}

impl FieldDescriptor {
    pub fn validate(&self, value: f64) -> Result<(), ValidationError> {
        let failure = match self.constraint {
            Constraint::AtLeast { min, message } if value.is_nan() || value < min => {
                Some(message.to_string())
            }
            Constraint::Positive { message } if value.is_nan() || value <= 0.0 => {
                Some(message.to_string())
            }
            Constraint::Between { min, below, .. } if value.is_nan() || value < min => {
                Some(below.to_string())
            }
            Constraint::Between { max, above, .. } if value > max => Some(above.to_string()),
            Constraint::OneOf { message } if !self.accepts_option(value) => {
                Some(message.to_string())
            }
            _ => None,
        };

        if let Some(message) = failure {
            return Err(ValidationError::new(self.name, message));
        }

        if self.whole_number && value.fract() != 0.0 {
            return Err(ValidationError::new(
                self.name,
                format!("{} must be a whole number", self.label),
            ));
        }

        Ok(())
    }

    fn accepts_option(&self, value: f64) -> bool {
        match self.input {
            InputKind::Select { options } => options
                .iter()
                .any(|option| f64::from(option.value) == value),
            InputKind::Number { .. } => false,
        }
    }

    /// Option label for select questions, if the value matches one.
    pub fn option_label(&self, value: f64) -> Option<&'static str> {
        match self.input {
            InputKind::Select { options } => options
                .iter()
                .find(|option| f64::from(option.value) == value)
                .map(|option| option.label),
            InputKind::Number { .. } => None,
        }
    }
}

const fn amount(name: FieldName, label: &'static str, constraint: Constraint) -> FieldDescriptor {
    FieldDescriptor {
        name,
        label,
        input: InputKind::Number {
            min: Some(0.0),
            max: Some(100_000.0),
        },
        constraint,
        whole_number: false,
        preview: PreviewKind::Amount,
        info: Some(AMOUNT_INFO),
    }
}

const ASSET_VALUE: Constraint = Constraint::AtLeast {
    min: 0.0,
    message: "Invalid asset value",
};

const SELECT_OPTION: Constraint = Constraint::OneOf {
    message: "Select a valid option",
};

/// The questions in the order they are asked.
pub static STEPS: [FieldDescriptor; FIELD_COUNT] = [
    FieldDescriptor {
        name: FieldName::NoOfDependents,
        label: "Number of Dependents",
        input: InputKind::Number {
            min: Some(0.0),
            max: None,
        },
        constraint: Constraint::Between {
            min: 0.0,
            max: MAX_DEPENDENTS,
            below: "Invalid number of dependents",
            above: "Invalid number of dependents",
        },
        whole_number: true,
        preview: PreviewKind::None,
        info: None,
    },
    FieldDescriptor {
        name: FieldName::Education,
        label: "Education Level",
        input: InputKind::Select {
            options: EDUCATION_OPTIONS,
        },
        constraint: SELECT_OPTION,
        whole_number: true,
        preview: PreviewKind::None,
        info: None,
    },
    FieldDescriptor {
        name: FieldName::SelfEmployed,
        label: "Self Employed",
        input: InputKind::Select {
            options: YES_NO_OPTIONS,
        },
        constraint: SELECT_OPTION,
        whole_number: true,
        preview: PreviewKind::None,
        info: None,
    },
    amount(
        FieldName::IncomeAnnum,
        "Annual Income ($)",
        Constraint::Positive {
            message: "Income must be positive",
        },
    ),
    amount(
        FieldName::LoanAmount,
        "Loan Amount ($)",
        Constraint::Positive {
            message: "Loan amount must be positive",
        },
    ),
    FieldDescriptor {
        name: FieldName::LoanTerm,
        label: "Loan Term (1-12 months)",
        input: InputKind::Number {
            min: Some(1.0),
            max: Some(12.0),
        },
        constraint: Constraint::Between {
            min: 1.0,
            max: 12.0,
            below: "Minimum term is 1 month",
            above: "Maximum term is 12 months",
        },
        whole_number: true,
        preview: PreviewKind::Term,
        info: Some("Will be normalized to a 0-1 scale"),
    },
    FieldDescriptor {
        name: FieldName::CibilScore,
        label: "Credit Score (300-900)",
        input: InputKind::Number {
            min: Some(300.0),
            max: Some(900.0),
        },
        constraint: Constraint::Between {
            min: 300.0,
            max: 900.0,
            below: "Invalid CIBIL score",
            above: "Invalid CIBIL score",
        },
        whole_number: true,
        preview: PreviewKind::CreditScore,
        info: Some("750-850: Excellent, 700-749: Good, 650-699: Fair, Below 650: Poor"),
    },
    amount(
        FieldName::ResidentialAssetsValue,
        "Residential Assets Value ($)",
        ASSET_VALUE,
    ),
    amount(
        FieldName::CommercialAssetsValue,
        "Commercial Assets Value ($)",
        ASSET_VALUE,
    ),
    amount(
        FieldName::LuxuryAssetsValue,
        "Luxury Assets Value ($)",
        ASSET_VALUE,
    ),
    amount(
        FieldName::BankAssetValue,
        "Bank Asset Value ($)",
        ASSET_VALUE,
    ),
];

pub fn descriptor(field: FieldName) -> &'static FieldDescriptor {
    &STEPS[field as usize]
}

pub fn last_step_index() -> usize {
    STEPS.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_follows_field_order() {
        for (index, step) in STEPS.iter().enumerate() {
            assert_eq!(step.name, FieldName::ALL[index]);
            assert_eq!(descriptor(step.name).name, step.name);
        }
        assert_eq!(last_step_index(), 10);
    }

    #[test]
    fn term_bounds_report_direction() {
        let term = descriptor(FieldName::LoanTerm);
        assert_eq!(
            term.validate(0.5).expect_err("too short").message,
            "Minimum term is 1 month"
        );
        assert_eq!(
            term.validate(13.0).expect_err("too long").message,
            "Maximum term is 12 months"
        );
        assert_eq!(
            term.validate(6.5).expect_err("fractional").message,
            "Loan Term (1-12 months) must be a whole number"
        );
        assert!(term.validate(1.0).is_ok());
        assert!(term.validate(12.0).is_ok());
    }

    #[test]
    fn credit_score_range_is_inclusive() {
        let score = descriptor(FieldName::CibilScore);
        assert!(score.validate(300.0).is_ok());
        assert!(score.validate(900.0).is_ok());
        assert!(score.validate(299.0).is_err());
        assert_eq!(
            score.validate(901.0).expect_err("too high").message,
            "Invalid CIBIL score"
        );
    }

    #[test]
    fn dependents_must_fit_the_wire_type() {
        let dependents = descriptor(FieldName::NoOfDependents);
        assert!(dependents.validate(f64::from(u32::MAX)).is_ok());
        assert_eq!(
            dependents
                .validate(5_000_000_000.0)
                .expect_err("too many dependents")
                .message,
            "Invalid number of dependents"
        );
        assert!(dependents.validate(-1.0).is_err());
    }

    #[test]
    fn select_questions_accept_only_listed_options() {
        let education = descriptor(FieldName::Education);
        assert!(education.validate(0.0).is_ok());
        assert!(education.validate(1.0).is_ok());
        assert_eq!(
            education.validate(2.0).expect_err("unknown option").message,
            "Select a valid option"
        );
        assert_eq!(education.option_label(1.0), Some("Graduate"));
        assert_eq!(descriptor(FieldName::SelfEmployed).option_label(0.0), Some("No"));
    }

    #[test]
    fn amounts_distinguish_positive_from_non_negative() {
        assert!(descriptor(FieldName::IncomeAnnum).validate(0.0).is_err());
        assert!(descriptor(FieldName::LoanAmount).validate(0.01).is_ok());
        assert!(descriptor(FieldName::BankAssetValue).validate(0.0).is_ok());
        assert_eq!(
            descriptor(FieldName::LuxuryAssetsValue)
                .validate(-1.0)
                .expect_err("negative asset")
                .message,
            "Invalid asset value"
        );
        assert!(descriptor(FieldName::NoOfDependents)
            .validate(f64::NAN)
            .is_err());
    }

    #[test]
    fn table_serializes_for_renderers() {
        let json = serde_json::to_value(descriptor(FieldName::Education)).expect("serializes");
        assert_eq!(json["name"], "education");
        assert_eq!(json["input"]["type"], "select");
        assert_eq!(json["input"]["options"][1]["label"], "Graduate");
        assert_eq!(json["constraint"]["rule"], "one_of");
    }
}
