//! Test identifiers
//!
//! Canonical URIs for test results, built relative to a fixed base.

mod builder;

pub use builder::{UriBuilder, UriError};
