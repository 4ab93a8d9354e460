//! Step-form controller for one visit to the rate check page.

use tracing::{debug, info, warn};

use super::applicant::{ApplicantDraft, FieldName, ValidationError};
use super::fields::{last_step_index, FieldDescriptor, STEPS};
use super::normalizer::{normalize, preview, FieldPreview, NormalizedFeatureVector};
use super::scoring::{LoanStatus, ResultOverlay, ScoringCollaborator, ScoringError, ScoringOutcome};

/// Where the form currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Editing(usize),
    Submitting,
    Result(LoanStatus),
    /// Scoring failed; shown over the last step with the answers kept.
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

impl KeyPress {
    pub fn enter() -> Self {
        Self {
            key: Key::Enter,
            shift: false,
        }
    }

    pub fn shift_enter() -> Self {
        Self {
            key: Key::Enter,
            shift: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Next,
    Submit,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("submission is only available from the final step")]
    NotOnFinalStep,
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Handle for one in-flight scoring request.
///
/// Resolving a ticket issued before the last [`FormSession::reset`] is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionTicket {
    generation: u64,
    pub features: NormalizedFeatureVector,
}

#[derive(Debug, Clone)]
pub struct FormSession {
    state: FormState,
    draft: ApplicantDraft,
    field_error: Option<ValidationError>,
    generation: u64,
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FormSession {
    pub fn new() -> Self {
        Self {
            state: FormState::Editing(0),
            draft: ApplicantDraft::default(),
            field_error: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn draft(&self) -> &ApplicantDraft {
        &self.draft
    }

    pub fn field_error(&self) -> Option<&ValidationError> {
        self.field_error.as_ref()
    }

    /// Step whose question is on screen. The error banner sits on the last step.
    pub fn current_step(&self) -> Option<usize> {
        match self.state {
            FormState::Editing(step) => Some(step),
            FormState::Error(_) => Some(last_step_index()),
            FormState::Submitting | FormState::Result(_) => None,
        }
    }

    pub fn current_field(&self) -> Option<&'static FieldDescriptor> {
        self.current_step().map(|step| &STEPS[step])
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, FormState::Submitting)
    }

    /// Result card for the current decision, if one is displayed.
    pub fn overlay(&self) -> Option<ResultOverlay> {
        match &self.state {
            FormState::Result(status) => Some(ResultOverlay::for_status(status)),
            _ => None,
        }
    }

    /// Record an edit and return the live preview for it.
    ///
    /// Edits are ignored while a submission is in flight.
    pub fn set_field(&mut self, field: FieldName, raw: &str) -> Option<FieldPreview> {
        if self.is_submitting() {
            return None;
        }
        let value = self.draft.set_raw(field, raw);
        if self
            .field_error
            .as_ref()
            .is_some_and(|error| error.field == field)
        {
            self.field_error = None;
        }
        preview(field, value)
    }

    /// Live preview of the field on screen.
    pub fn preview(&self) -> Option<FieldPreview> {
        let field = self.current_field()?;
        preview(field.name, self.draft.get(field.name))
    }

    /// Advance one step if the current answer is valid.
    pub fn next(&mut self) -> Result<(), ValidationError> {
        let FormState::Editing(step) = self.state else {
            return Ok(());
        };
        if step >= last_step_index() {
            return Ok(());
        }

        let field = STEPS[step].name;
        if let Err(error) = self.draft.validate_field(field) {
            debug!(step, field = %field, reason = %error, "step advance blocked");
            self.field_error = Some(error.clone());
            return Err(error);
        }

        self.field_error = None;
        self.state = FormState::Editing(step + 1);
        debug!(step = step + 1, "advanced to next step");
        Ok(())
    }

    /// Go back one step without validating.
    pub fn previous(&mut self) {
        let Some(step) = self.current_step() else {
            return;
        };
        if step == 0 {
            return;
        }
        self.field_error = None;
        self.state = FormState::Editing(step - 1);
        debug!(step = step - 1, "returned to previous step");
    }

    /// Validate the full record and move to `Submitting`.
    ///
    /// On a validation failure the form jumps to the offending step.
    pub fn begin_submit(&mut self) -> Result<SubmissionTicket, FormError> {
        match self.state {
            FormState::Submitting => return Err(FormError::SubmissionInFlight),
            FormState::Editing(step) if step == last_step_index() => {}
            FormState::Error(_) => {}
            FormState::Editing(_) | FormState::Result(_) => return Err(FormError::NotOnFinalStep),
        }

        let input = match self.draft.validate() {
            Ok(input) => input,
            Err(error) => {
                let step = STEPS
                    .iter()
                    .position(|descriptor| descriptor.name == error.field)
                    .unwrap_or(0);
                self.state = FormState::Editing(step);
                self.field_error = Some(error.clone());
                return Err(FormError::Validation(error));
            }
        };

        self.generation += 1;
        self.field_error = None;
        self.state = FormState::Submitting;
        Ok(SubmissionTicket {
            generation: self.generation,
            features: normalize(&input),
        })
    }

    /// Apply the scoring result for `ticket`. Returns `false` for stale tickets.
    pub fn complete(
        &mut self,
        ticket: &SubmissionTicket,
        outcome: Result<ScoringOutcome, ScoringError>,
    ) -> bool {
        if ticket.generation != self.generation || !self.is_submitting() {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale scoring response"
            );
            return false;
        }

        self.state = match outcome {
            Ok(ScoringOutcome::Decided(status)) => {
                info!(loan_status = %status, "loan prediction received");
                FormState::Result(status)
            }
            Ok(ScoringOutcome::Unrecognized) => {
                warn!("scoring response carried no loan_status; nothing to display");
                FormState::Editing(last_step_index())
            }
            Err(error) => {
                warn!(%error, "loan prediction failed");
                FormState::Error(error.user_message().to_string())
            }
        };
        true
    }

    /// Submit to `collaborator` and wait for the decision.
    pub async fn submit(
        &mut self,
        collaborator: &dyn ScoringCollaborator,
    ) -> Result<&FormState, FormError> {
        let ticket = self.begin_submit()?;
        let outcome = collaborator.predict(&ticket.features).await;
        self.complete(&ticket, outcome);
        Ok(&self.state)
    }

    /// Close the result card or error banner.
    ///
    /// Closing a decision starts a fresh form; closing the error banner
    /// returns to the last step with the answers kept.
    pub fn dismiss_result(&mut self) {
        match self.state {
            FormState::Result(_) => self.reset(),
            FormState::Error(_) => self.state = FormState::Editing(last_step_index()),
            FormState::Editing(_) | FormState::Submitting => {}
        }
    }

    /// Clear every answer and start over. Any in-flight response is dropped.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.draft = ApplicantDraft::default();
        self.field_error = None;
        self.state = FormState::Editing(0);
        debug!("rate check form reset");
    }

    /// Enter without Shift advances, or submits from the last step.
    pub fn key_action(&self, key: KeyPress) -> KeyAction {
        if key.key != Key::Enter || key.shift {
            return KeyAction::Ignored;
        }
        match self.state {
            FormState::Editing(step) if step < last_step_index() => KeyAction::Next,
            FormState::Editing(_) | FormState::Error(_) => KeyAction::Submit,
            FormState::Submitting | FormState::Result(_) => KeyAction::Ignored,
        }
    }

    pub async fn handle_key(
        &mut self,
        key: KeyPress,
        collaborator: &dyn ScoringCollaborator,
    ) -> Result<KeyAction, FormError> {
        let action = self.key_action(key);
        match action {
            KeyAction::Next => self.next()?,
            KeyAction::Submit => {
                self.submit(collaborator).await?;
            }
            KeyAction::Ignored => {}
        }
        Ok(action)
    }
}
