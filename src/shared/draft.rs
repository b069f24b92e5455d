//! Draft Records
//!
//! A draft is a submission that has not reached the server yet, either because
//! delivery failed or because the user chose to save it for later. Drafts are
//! stored one per file by `client::offline::drafts::DraftStore`.
//!
//! # File Format
//!
//! ```json
//! {
//!   "form": "cases",
//!   "data": { "age": "42", "consent": "true", "onset": "2024-05-30" },
//!   "meta": { "saved_at": "2024-06-01T10:15:00Z", "source": "auto" },
//!   "error": { "type": "server", "code": 503, "message": "maintenance" }
//! }
//! ```
//!
//! `error` is omitted for drafts saved manually.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field id to canonical string value.
pub type FormValues = BTreeMap<String, String>;

/// Wire payload posted to the submission endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub form: String,
    pub data: FormValues,
}

/// Who created the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftSource {
    /// Saved by the submission pipeline after a failed delivery.
    Auto,
    /// Saved explicitly by the user.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftMeta {
    pub saved_at: DateTime<Utc>,
    pub source: DraftSource,
}

/// Why a submission was not delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FailureReason {
    /// The request never got an HTTP response.
    Network { message: String },
    /// The server answered with a non-2xx status.
    Server { code: u16, message: String },
}

impl FailureReason {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn server(code: u16, message: impl Into<String>) -> Self {
        Self::Server {
            code,
            message: message.into(),
        }
    }

    /// Short tag as written in the draft file.
    pub fn kind(&self) -> &'static str {
        match self {
            FailureReason::Network { .. } => "network",
            FailureReason::Server { .. } => "server",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Network { message } => write!(f, "network error: {}", message),
            FailureReason::Server { code, message } => {
                write!(f, "server error ({}): {}", code, message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub form: String,
    #[serde(default)]
    pub data: FormValues,
    pub meta: DraftMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureReason>,
}

impl Draft {
    /// Draft recorded by the pipeline after a failed delivery.
    pub fn failed(form: impl Into<String>, data: FormValues, reason: FailureReason) -> Self {
        Self {
            form: form.into(),
            data,
            meta: DraftMeta {
                saved_at: Utc::now(),
                source: DraftSource::Auto,
            },
            error: Some(reason),
        }
    }

    /// Draft saved on request, without failure metadata.
    pub fn manual(form: impl Into<String>, data: FormValues) -> Self {
        Self {
            form: form.into(),
            data,
            meta: DraftMeta {
                saved_at: Utc::now(),
                source: DraftSource::Manual,
            },
            error: None,
        }
    }

    pub fn payload(&self) -> SubmissionPayload {
        SubmissionPayload {
            form: self.form.clone(),
            data: self.data.clone(),
        }
    }
}
