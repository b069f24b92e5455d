//! Integration tests
//!
//! End-to-end flows against a stub forms API and temporary directories

mod bundle_cache;
mod submission;
mod sync_scheduler;
