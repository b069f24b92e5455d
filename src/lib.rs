//! formsync - Offline-First Form Submission
//!
//! Core of a survey-forms client that keeps working without a network:
//! forms are validated locally, submissions that cannot be delivered are kept
//! as drafts on disk, and drafts are uploaded again once connectivity
//! returns.
//!
//! # Module Structure
//!
//! - **`shared`** - Schema, draft records, errors and configuration
//! - **`client`** - Validation, bundle cache, drafts, submission and sync
//!
//! # Usage
//!
//! ```rust,no_run
//! use formsync::client::{
//!     BundleCache, Config, DraftStore, FormRepository, HttpFormsApi, SubmissionPipeline,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let api = Arc::new(HttpFormsApi::from_config(&config)?);
//!
//! let repository = FormRepository::new(BundleCache::new(config.cache_path()));
//! let loaded = repository.load_or_fallback(api.as_ref()).await;
//! println!("{}", loaded.origin.banner());
//!
//! let drafts = Arc::new(DraftStore::new(config.drafts_dir()));
//! let pipeline = SubmissionPipeline::new(api, drafts);
//! if let Some(form) = loaded.bundle.get("case_report") {
//!     match pipeline.submit_form("case_report", form, &Default::default()).await {
//!         Ok(outcome) => println!("{}", outcome),
//!         Err(errors) => println!("{}", errors),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - Stores guard their files with async locks and are shared through `Arc`
//! - The sync service runs at most one background task
//! - Results reach observers through a `broadcast` channel; moving them onto
//!   a UI thread is the caller's concern
//!
//! # Error Handling
//!
//! Fallible operations return the classified errors in `shared::error`.

/// Shared types and data structures
pub mod shared;

/// Offline-first client
pub mod client;
