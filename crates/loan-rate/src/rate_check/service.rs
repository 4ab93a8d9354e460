use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::applicant::{ApplicantDraft, FieldName, RawValue, ValidationError};
use super::fields::{FieldDescriptor, STEPS};
use super::normalizer::{normalize, preview, FieldPreview, NormalizedFeatureVector};
use super::scoring::{
    LoanStatus, ResultOverlay, ScoringCollaborator, ScoringError, ScoringOutcome,
};

/// Stateless facade combining validation, normalization, and scoring.
pub struct RateCheckService<S> {
    scoring: Arc<S>,
}

impl<S> RateCheckService<S>
where
    S: ScoringCollaborator + 'static,
{
    pub fn new(scoring: Arc<S>) -> Self {
        Self { scoring }
    }

    pub fn steps(&self) -> &'static [FieldDescriptor] {
        &STEPS
    }

    pub fn preview(&self, field: FieldName, value: &RawValue) -> Option<FieldPreview> {
        preview(field, value.coerce(field))
    }

    pub fn normalize(
        &self,
        draft: &ApplicantDraft,
    ) -> Result<NormalizedFeatureVector, ValidationError> {
        let input = draft.validate()?;
        Ok(normalize(&input))
    }

    /// Validate, normalize, and score a complete set of answers.
    pub async fn quote(&self, draft: &ApplicantDraft) -> Result<Quote, RateCheckError> {
        let features = self.normalize(draft)?;

        let loan_status = match self.scoring.predict(&features).await {
            Ok(ScoringOutcome::Decided(status)) => {
                info!(loan_status = %status, "rate check scored");
                Some(status)
            }
            Ok(ScoringOutcome::Unrecognized) => {
                warn!("scoring response carried no loan_status");
                None
            }
            Err(error) => {
                warn!(%error, "rate check scoring failed");
                return Err(error.into());
            }
        };

        let overlay = loan_status.as_ref().map(ResultOverlay::for_status);
        Ok(Quote {
            loan_status,
            features,
            overlay,
        })
    }
}

/// Scored rate check returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub loan_status: Option<LoanStatus>,
    pub features: NormalizedFeatureVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<ResultOverlay>,
}

#[derive(Debug, thiserror::Error)]
pub enum RateCheckError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}
