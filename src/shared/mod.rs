//! Shared Module
//!
//! Plain data and error types used by every part of the client: the form
//! schema served by the API, the draft records kept on disk, the error
//! taxonomy and the application configuration.
//!
//! # Overview
//!
//! Nothing in here performs I/O except loading a config file. All types are
//! designed for serialization and comparison in tests.

/// Form definitions and bundles
pub mod schema;

/// Draft records and submission payloads
pub mod draft;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use draft::{Draft, FailureReason, FormValues, SubmissionPayload};
pub use error::{ApiError, BundleError, RetryError, StorageError, ValidationErrors};
pub use schema::{FieldType, FormBundle, FormDefinition, FormField, Validation};
