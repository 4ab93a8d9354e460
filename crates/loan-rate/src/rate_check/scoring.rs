use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::normalizer::NormalizedFeatureVector;
use crate::config::ScoringConfig;

/// Message shown to the applicant for every scoring failure.
pub const SCORING_FAILURE_MESSAGE: &str = "Failed to get prediction. Try again.";

/// Decision label returned by the scoring API.
///
/// Labels other than `Approved`/`Rejected` are kept verbatim and displayed as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LoanStatus {
    Approved,
    Rejected,
    Other(String),
}

impl LoanStatus {
    pub fn label(&self) -> &str {
        match self {
            LoanStatus::Approved => "Approved",
            LoanStatus::Rejected => "Rejected",
            LoanStatus::Other(label) => label,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, LoanStatus::Approved)
    }
}

impl From<String> for LoanStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Approved" => LoanStatus::Approved,
            "Rejected" => LoanStatus::Rejected,
            _ => LoanStatus::Other(value),
        }
    }
}

impl From<LoanStatus> for String {
    fn from(value: LoanStatus) -> Self {
        match value {
            LoanStatus::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a successful round trip to the scoring API produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoringOutcome {
    Decided(LoanStatus),
    /// The body was a JSON object without a string `loan_status`.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("scoring request timed out")]
    Timeout,
    #[error("scoring request failed: {0}")]
    Transport(String),
    #[error("scoring service responded with HTTP {0}")]
    Status(u16),
    #[error("scoring response was malformed: {0}")]
    MalformedBody(String),
}

impl ScoringError {
    /// All failure causes collapse to the same retry prompt.
    pub fn user_message(&self) -> &'static str {
        SCORING_FAILURE_MESSAGE
    }
}

/// Read the decision out of a response body.
pub fn interpret_response(body: &Value) -> Result<ScoringOutcome, ScoringError> {
    let object = body
        .as_object()
        .ok_or_else(|| ScoringError::MalformedBody("expected a JSON object".to_string()))?;

    Ok(match object.get("loan_status").and_then(Value::as_str) {
        Some(label) => ScoringOutcome::Decided(LoanStatus::from(label.to_string())),
        None => ScoringOutcome::Unrecognized,
    })
}

/// External service that turns a feature vector into a loan decision.
#[async_trait]
pub trait ScoringCollaborator: Send + Sync {
    async fn predict(
        &self,
        features: &NormalizedFeatureVector,
    ) -> Result<ScoringOutcome, ScoringError>;
}

/// `POST`s the feature vector as JSON to the configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpScoringClient {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpScoringClient {
    pub fn new(config: &ScoringConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: &ScoringConfig, client: reqwest::Client) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            timeout: config.timeout(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn transport_error(err: reqwest::Error) -> ScoringError {
    if err.is_timeout() {
        ScoringError::Timeout
    } else {
        ScoringError::Transport(err.to_string())
    }
}

#[async_trait]
impl ScoringCollaborator for HttpScoringClient {
    async fn predict(
        &self,
        features: &NormalizedFeatureVector,
    ) -> Result<ScoringOutcome, ScoringError> {
        debug!(endpoint = %self.endpoint, "requesting loan prediction");

        let response = self
            .client
            .post(&self.endpoint)
            .json(features)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoringError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|err| ScoringError::MalformedBody(err.to_string()))?;

        interpret_response(&body)
    }
}

/// Copy for the result card shown once a decision arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultOverlay {
    pub approved: bool,
    pub headline: String,
    pub message: &'static str,
    pub follow_up: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_action: Option<&'static str>,
    pub dismiss_action: &'static str,
}

impl ResultOverlay {
    pub fn for_status(status: &LoanStatus) -> Self {
        let headline = format!("Loan {}", status.label());
        if status.is_approved() {
            Self {
                approved: true,
                headline,
                message: "Congratulations! Your loan application has been approved.",
                follow_up: "Our representative will contact you shortly with the next steps.",
                primary_action: Some("Continue Application"),
                dismiss_action: "View Details",
            }
        } else {
            Self {
                approved: false,
                headline,
                message: "We're sorry, your loan application was not approved at this time.",
                follow_up: "Consider improving your credit score or adjusting your loan requirements.",
                primary_action: None,
                dismiss_action: "Try Again",
            }
        }
    }
}
