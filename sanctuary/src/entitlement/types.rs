//! Wire types for the plan signature verifier.

use serde::{Deserialize, Serialize};

use crate::model::Plan;

/// What is sent for verification. The signature is forwarded exactly as it
/// appeared in the configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanClaim {
    pub plan: Plan,
    /// `"sender:recipient"`
    pub partner_names: String,
    pub signature: String,
}

/// Response from the verify endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
}

/// Outcome of checking a configuration's plan entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Entitlement {
    /// No signature to check.
    Unsigned,
    Verified,
    /// Verifier said no, or could not be reached.
    Rejected,
}
