//! Plan verifier client.
//!
//! The signing secret lives with the verifier; this side only forwards a
//! claim and reads back a yes or no. `PlanVerifier` is a trait so tests can
//! swap in [`mock::MockPlanVerifier`] or stub the HTTP endpoint.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{PlanClaim, VerifyResponse};

/// Errors that can occur when calling the verifier.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Verifier returned an error response
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
}

/// Trait for plan signature verification.
#[async_trait]
pub trait PlanVerifier: Send + Sync {
    /// Whether `claim.signature` is valid for its plan and names.
    async fn verify(&self, claim: &PlanClaim) -> Result<bool, VerifierError>;
}

/// HTTP implementation of `PlanVerifier`: `POST {base}/api/verify-premium`.
pub struct HttpPlanVerifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPlanVerifier {
    /// Create a new verifier client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a verifier with a custom `reqwest::Client` (timeouts, proxies).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PlanVerifier for HttpPlanVerifier {
    async fn verify(&self, claim: &PlanClaim) -> Result<bool, VerifierError> {
        let url = format!("{}/api/verify-premium", self.base_url);

        let response = self.client.post(&url).json(claim).send().await?;

        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VerifierError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: VerifyResponse = response.json().await?;
        Ok(body.success)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::missing_const_for_fn,
    clippy::must_use_candidate
)]
pub mod mock {
    //! Mock implementation for unit testing.

    use super::{PlanClaim, PlanVerifier, VerifierError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Mock implementation of `PlanVerifier`.
    ///
    /// Configure the answer with `set_result` and inspect what was sent with
    /// `calls()`. Without a configured result every claim is rejected.
    pub struct MockPlanVerifier {
        result: Mutex<Option<Result<bool, VerifierError>>>,
        calls: Mutex<Vec<PlanClaim>>,
    }

    impl MockPlanVerifier {
        pub fn new() -> Self {
            Self {
                result: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Set the result for the next `verify` call.
        pub fn set_result(&self, result: Result<bool, VerifierError>) {
            *self.result.lock().unwrap() = Some(result);
        }

        /// All claims passed to `verify`.
        pub fn calls(&self) -> Vec<PlanClaim> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Default for MockPlanVerifier {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl PlanVerifier for MockPlanVerifier {
        async fn verify(&self, claim: &PlanClaim) -> Result<bool, VerifierError> {
            self.calls.lock().unwrap().push(claim.clone());

            self.result.lock().unwrap().take().unwrap_or(Ok(false))
        }
    }
}
