//! Property-based tests

mod validation_proptest;
