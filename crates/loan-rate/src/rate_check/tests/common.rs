use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::rate_check::applicant::FieldName;
use crate::rate_check::normalizer::NormalizedFeatureVector;
use crate::rate_check::scoring::{
    LoanStatus, ScoringCollaborator, ScoringError, ScoringOutcome,
};
use crate::rate_check::session::FormSession;

/// Answers from the reference scenario, in step order.
pub(super) fn reference_answers() -> Vec<(FieldName, &'static str)> {
    vec![
        (FieldName::NoOfDependents, "2"),
        (FieldName::Education, "1"),
        (FieldName::SelfEmployed, "0"),
        (FieldName::IncomeAnnum, "50000"),
        (FieldName::LoanAmount, "20000"),
        (FieldName::LoanTerm, "6"),
        (FieldName::CibilScore, "720"),
        (FieldName::ResidentialAssetsValue, "10000"),
        (FieldName::CommercialAssetsValue, "0"),
        (FieldName::LuxuryAssetsValue, "0"),
        (FieldName::BankAssetValue, "5000"),
    ]
}

pub(super) fn reference_features() -> NormalizedFeatureVector {
    NormalizedFeatureVector {
        no_of_dependents: 2,
        education: 1,
        self_employed: 0,
        income_annum: 0.5,
        loan_amount: 0.2,
        loan_term: 0.4545,
        cibil_score: 0.86,
        residential_assets_value: 0.1,
        commercial_assets_value: 0.0,
        luxury_assets_value: 0.0,
        bank_asset_value: 0.05,
    }
}

/// Walk the form like a user: answer the question on screen, then advance.
pub(super) fn fill_reference_form(session: &mut FormSession) {
    for (field, raw) in reference_answers() {
        let on_screen = session.current_field().expect("question displayed").name;
        assert_eq!(on_screen, field, "steps follow the declared order");
        session.set_field(field, raw);
        if field != FieldName::BankAssetValue {
            session.next().expect("reference answer is valid");
        }
    }
}

/// Collaborator replaying scripted outcomes and recording every request.
#[derive(Default)]
pub(super) struct ScriptedScoring {
    responses: Mutex<VecDeque<Result<ScoringOutcome, ScoringError>>>,
    requests: Mutex<Vec<NormalizedFeatureVector>>,
}

impl ScriptedScoring {
    pub(super) fn replying(
        responses: impl IntoIterator<Item = Result<ScoringOutcome, ScoringError>>,
    ) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn approving() -> Self {
        Self::replying([Ok(ScoringOutcome::Decided(LoanStatus::Approved))])
    }

    pub(super) fn requests(&self) -> Vec<NormalizedFeatureVector> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }
}

#[async_trait]
impl ScoringCollaborator for ScriptedScoring {
    async fn predict(
        &self,
        features: &NormalizedFeatureVector,
    ) -> Result<ScoringOutcome, ScoringError> {
        self.requests
            .lock()
            .expect("requests mutex poisoned")
            .push(features.clone());
        self.responses
            .lock()
            .expect("responses mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(ScoringError::Transport("no scripted response".to_string())))
    }
}
