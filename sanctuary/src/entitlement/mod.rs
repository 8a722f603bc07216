//! Plan entitlement verification.
//!
//! A configuration may carry an opaque `signature` proving its plan was paid
//! for. Only an external verifier can check it.
//!
//! - [`PlanVerifier`] - Trait defining the verification call
//! - [`HttpPlanVerifier`] - Real HTTP implementation using reqwest
//! - [`mock::MockPlanVerifier`] - Mock for unit tests (behind `test-utils` feature)
//!
//! Verification never feeds back into decryption or the reveal schedule;
//! an unverified configuration still opens, it just is not treated as paid.

mod client;
mod types;

pub use client::{HttpPlanVerifier, PlanVerifier, VerifierError};
pub use types::{Entitlement, PlanClaim, VerifyResponse};

#[cfg(any(test, feature = "test-utils"))]
pub use client::mock;

use tracing::{debug, warn};

use crate::model::{Names, SanctuaryConfig};

/// `"sender:recipient"`, exactly as entered. Signatures are issued over
/// the names as typed, so nothing is normalized here.
#[must_use]
pub fn partner_names(names: &Names) -> String {
    format!("{}:{}", names.sender, names.recipient)
}

/// Build the claim for a configuration, `None` if it carries no signature.
#[must_use]
pub fn plan_claim(config: &SanctuaryConfig) -> Option<PlanClaim> {
    let signature = config.signature.as_ref().filter(|s| !s.is_empty())?;
    Some(PlanClaim {
        plan: config.plan,
        partner_names: partner_names(&config.names),
        signature: signature.clone(),
    })
}

/// Check a configuration's plan signature.
///
/// Verifier failures are logged and reported as `Rejected`; they never
/// surface as errors to the viewer.
pub async fn check_entitlement(config: &SanctuaryConfig, verifier: &dyn PlanVerifier) -> Entitlement {
    let Some(claim) = plan_claim(config) else {
        return Entitlement::Unsigned;
    };

    match verifier.verify(&claim).await {
        Ok(true) => {
            debug!(plan = %claim.plan, "plan signature verified");
            Entitlement::Verified
        }
        Ok(false) => {
            debug!(plan = %claim.plan, "plan signature rejected");
            Entitlement::Rejected
        }
        Err(e) => {
            warn!(plan = %claim.plan, error = %e, "plan verification failed");
            Entitlement::Rejected
        }
    }
}
