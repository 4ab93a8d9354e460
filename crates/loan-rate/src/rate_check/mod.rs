//! Multi-step loan rate check.
//!
//! Raw answers are collected one question at a time by [`FormSession`],
//! validated against the [`STEPS`] table, normalized into the feature vector
//! the scoring API expects, and sent to a [`ScoringCollaborator`].

pub mod applicant;
pub mod fields;
pub mod normalizer;
pub mod router;
pub mod scoring;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use applicant::{
    coerce_raw, ApplicantDraft, ApplicantInput, EducationLevel, FieldName, RawValue,
    SelfEmployment, ValidationError,
};
pub use fields::{descriptor, FieldDescriptor, InputKind, STEPS};
pub use normalizer::{
    credit_probability_unrounded, normalize, normalize_amount, normalize_amount_with,
    normalize_term, preview, score_to_probability, CreditTier, FieldPreview,
    NormalizedFeatureVector, AMOUNT_CEILING,
};
pub use router::rate_check_router;
pub use scoring::{
    HttpScoringClient, LoanStatus, ResultOverlay, ScoringCollaborator, ScoringError,
    ScoringOutcome, SCORING_FAILURE_MESSAGE,
};
pub use service::{Quote, RateCheckError, RateCheckService};
pub use session::{FormError, FormSession, FormState, Key, KeyAction, KeyPress, SubmissionTicket};
