//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Form fixtures
//! - Stub HTTP server helpers
//! - In-process fakes for the connectivity probe

pub mod fixtures;
pub mod mock_server;

// Re-export commonly used utilities
pub use fixtures::*;
pub use mock_server::*;
