//! # Submission Pipeline
//!
//! Delivers a completed form and guarantees it is never silently lost: any
//! failed delivery is persisted as a draft tagged with the failure reason.
//!
//! | API result        | Outcome                      | Draft written |
//! |-------------------|------------------------------|---------------|
//! | 2xx               | `Success`                    | no            |
//! | other status      | `SavedOffline` (server)      | yes           |
//! | no response       | `SavedOffline` (network)     | yes           |
//! | draft write fails | `Failed`                     | no            |
//!
//! Retrying an existing draft goes through [`SubmissionPipeline::retry_draft`],
//! which never writes a second copy of the draft.

use std::fmt;
use std::sync::Arc;

use crate::client::api::FormsApi;
use crate::client::offline::drafts::{DraftId, DraftStore};
use crate::client::validation;
use crate::shared::draft::{Draft, FailureReason, FormValues, SubmissionPayload};
use crate::shared::error::{ApiError, RetryError, StorageError, ValidationErrors};
use crate::shared::schema::{FieldType, FormDefinition};

#[derive(Debug)]
pub enum SubmitOutcome {
    /// The server accepted the submission.
    Success,
    /// Delivery failed and the submission was kept as a draft.
    SavedOffline {
        draft: DraftId,
        reason: FailureReason,
    },
    /// Delivery failed and so did writing the draft.
    Failed {
        reason: FailureReason,
        storage: StorageError,
    },
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Success)
    }

    pub fn draft(&self) -> Option<&DraftId> {
        match self {
            SubmitOutcome::SavedOffline { draft, .. } => Some(draft),
            _ => None,
        }
    }
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitOutcome::Success => f.write_str("Form submitted"),
            SubmitOutcome::SavedOffline { reason, .. } => {
                write!(f, "Form saved to drafts for later upload ({})", reason)
            }
            SubmitOutcome::Failed { reason, storage } => {
                write!(f, "{} (and failed to save draft: {})", reason, storage)
            }
        }
    }
}

/// Every field of `form` with a value: submitted values are kept, missing
/// text becomes `""` and missing booleans `"false"`.
pub fn complete_values(form: &FormDefinition, values: &FormValues) -> FormValues {
    let mut complete = values.clone();
    for field in form.fields() {
        complete.entry(field.id.clone()).or_insert_with(|| {
            match field.field_type {
                FieldType::Boolean => "false".to_string(),
                _ => String::new(),
            }
        });
    }
    complete
}

#[derive(Clone)]
pub struct SubmissionPipeline {
    api: Arc<dyn FormsApi>,
    drafts: Arc<DraftStore>,
}

impl SubmissionPipeline {
    pub fn new(api: Arc<dyn FormsApi>, drafts: Arc<DraftStore>) -> Self {
        Self { api, drafts }
    }

    pub fn drafts(&self) -> &Arc<DraftStore> {
        &self.drafts
    }

    /// Complete, validate and submit a form entry.
    ///
    /// Validation sees the completed values, so an absent checkbox counts as
    /// unchecked. Invalid input is returned before any network or disk access.
    pub async fn submit_form(
        &self,
        form_key: &str,
        form: &FormDefinition,
        values: &FormValues,
    ) -> Result<SubmitOutcome, ValidationErrors> {
        let complete = complete_values(form, values);
        validation::validate_form(form, &complete)?;
        Ok(self.submit(form_key, complete).await)
    }

    /// Submit already validated values.
    pub async fn submit(&self, form_key: &str, values: FormValues) -> SubmitOutcome {
        let payload = SubmissionPayload {
            form: form_key.to_string(),
            data: values,
        };

        let reason = match self.deliver(&payload).await {
            Ok(()) => {
                tracing::info!("[SUBMIT] '{}' delivered", form_key);
                return SubmitOutcome::Success;
            }
            Err(reason) => reason,
        };

        tracing::warn!("[SUBMIT] '{}' not delivered: {}", form_key, reason);
        let draft = Draft::failed(payload.form, payload.data, reason.clone());
        match self.drafts.save(&draft).await {
            Ok(id) => SubmitOutcome::SavedOffline { draft: id, reason },
            Err(storage) => {
                tracing::error!("[SUBMIT] Failed to save draft: {}", storage);
                SubmitOutcome::Failed { reason, storage }
            }
        }
    }

    /// Keep an entry for later without attempting delivery.
    pub async fn save_draft(
        &self,
        form_key: &str,
        values: FormValues,
    ) -> Result<DraftId, StorageError> {
        self.drafts.save(&Draft::manual(form_key, values)).await
    }

    /// Redeliver a stored draft; it is deleted only after a 2xx response.
    pub async fn retry_draft(&self, id: &DraftId) -> Result<(), RetryError> {
        let draft = self.drafts.read(id).await?;
        if draft.form.is_empty() || draft.data.is_empty() {
            return Err(RetryError::InvalidDraft {
                id: id.to_string(),
            });
        }

        self.deliver(&draft.payload())
            .await
            .map_err(RetryError::Delivery)?;

        self.drafts.delete(id).await?;
        tracing::info!("[SUBMIT] Draft {} uploaded and removed", id);
        Ok(())
    }

    async fn deliver(&self, payload: &SubmissionPayload) -> Result<(), FailureReason> {
        match self.api.submit(payload).await {
            Ok(response) if response.is_success() => Ok(()),
            Ok(response) => Err(FailureReason::server(response.status, response.body)),
            Err(ApiError::Network(message)) => Err(FailureReason::network(message)),
            Err(e) => Err(FailureReason::network(e.to_string())),
        }
    }
}
