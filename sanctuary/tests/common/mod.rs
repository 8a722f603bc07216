//! Common test utilities for integration tests.
//!
//! - [`factories`] - Builders for `SanctuaryConfig` test data
//! - [`http_mock`] - Thin `wiremock` wrapper for stubbing the plan verifier

#![allow(dead_code)]

pub mod factories;
pub mod http_mock;
