//! Offline-First Forms Client
//!
//! Everything between a filled-in form and the server: validation, the form
//! bundle cache, the draft store, the submission pipeline and the sync
//! service.
//!
//! # Architecture
//!
//! - **`config`** - Environment overrides and on-disk locations
//! - **`api`** - HTTP collaborator for bundles and submissions
//! - **`validation`** - Declarative field rules and formula evaluation
//! - **`bundle`** - Versioned bundle cache with embedded fallback
//! - **`offline`** - Draft store and submission pipeline
//! - **`preferences`** - Persistent user switches
//! - **`sync`** - Retry-all, the auto-sync loop and connectivity
//! - **`main`** - Command-line entry point (binary)
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - formsync binary
//! ├── config.rs       - Configuration wrapper
//! ├── api.rs          - FormsApi trait and reqwest client
//! ├── storage.rs      - Atomic JSON file helpers
//! ├── bundle.rs       - Form bundle cache
//! ├── preferences.rs  - Preference store
//! ├── validation/     - Rule engine, values, formulas
//! ├── offline/        - Drafts and submission
//! └── sync/           - Sync service, scheduler, network monitor
//! ```

pub mod api;
pub mod bundle;
pub mod config;
pub mod offline;
pub mod preferences;
pub mod storage;
pub mod sync;
pub mod validation;

// Re-export commonly used types
pub use api::{FormsApi, HttpFormsApi};
pub use bundle::{BundleCache, FormRepository, LoadedForms, Origin};
pub use config::Config;
pub use offline::{DraftId, DraftStore, SubmissionPipeline, SubmitOutcome};
pub use preferences::{JsonPreferences, MemoryPreferences, PreferenceStore};
pub use sync::{HttpProbe, SyncEvent, SyncReport, SyncService};
pub use validation::{validate, validate_form};
