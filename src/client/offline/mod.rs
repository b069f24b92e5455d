//! # Offline Submission
//!
//! Form entries survive a missing network: the submission pipeline turns any
//! failed delivery into a draft on disk, and the sync scheduler replays the
//! drafts once connectivity returns.
//!
//! ## Key Components
//!
//! - `drafts.rs`: durable one-file-per-draft store
//! - `submit.rs`: validate, deliver, and fall back to a draft
//!
//! ## Usage
//!
//! ```rust,no_run
//! use formsync::client::api::HttpFormsApi;
//! use formsync::client::offline::{DraftStore, SubmissionPipeline};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = HttpFormsApi::new(
//!     None,
//!     Some("https://forms.example.org/api/forms/submit".to_string()),
//!     Duration::from_secs(15),
//! )?;
//! let drafts = Arc::new(DraftStore::new("/tmp/forms-app/drafts"));
//! let pipeline = SubmissionPipeline::new(Arc::new(api), drafts);
//!
//! let outcome = pipeline.submit("case_report", Default::default()).await;
//! println!("{}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod drafts;
pub mod submit;

pub use drafts::{DraftId, DraftStore, DraftSummary};
pub use submit::{complete_values, SubmissionPipeline, SubmitOutcome};
