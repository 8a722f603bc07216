//! Passcode entry state machine.
//!
//! ```text
//! Locked --4 digits, submit--> Verifying --ok--> Unlocked
//!                                  |
//!                                  +--fail--> Locked (input cleared)
//! ```
//!
//! No attempt counting or lockout happens here; repeated failures leave the
//! gate exactly where a single failure does.

use tracing::{debug, info};

use super::{NestedContent, PasscodeLock};
use crate::validation::PASSCODE_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Locked,
    Verifying,
    Unlocked,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnlockError {
    #[error("incorrect passcode")]
    IncorrectCode,
    #[error("passcode must be {PASSCODE_LEN} digits")]
    InvalidInput,
    #[error("nothing to unlock")]
    NotLocked,
    #[error("verification task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone)]
pub struct PasscodeGate {
    lock: Option<PasscodeLock>,
    input: String,
    state: GateState,
}

impl PasscodeGate {
    pub(crate) fn new(lock: Option<PasscodeLock>) -> Self {
        let state = if lock.is_some() {
            GateState::Locked
        } else {
            GateState::Unlocked
        };
        Self {
            lock,
            input: String::with_capacity(PASSCODE_LEN),
            state,
        }
    }

    /// Current state. A `submit` whose future was dropped mid-flight leaves
    /// `Verifying`; the next `clear` or `submit` recovers.
    #[must_use]
    pub const fn state(&self) -> GateState {
        self.state
    }

    /// The passcode tier, if the link has one.
    #[must_use]
    pub const fn lock(&self) -> Option<&PasscodeLock> {
        self.lock.as_ref()
    }

    /// Number of digits entered so far.
    #[must_use]
    pub fn input_len(&self) -> usize {
        self.input.len()
    }

    /// Append one digit. Returns `false` (and changes nothing) for a
    /// non-digit, a fifth digit, or a gate that is not locked.
    pub fn push_digit(&mut self, digit: char) -> bool {
        if self.state == GateState::Unlocked
            || !digit.is_ascii_digit()
            || self.input.len() >= PASSCODE_LEN
        {
            return false;
        }
        self.input.push(digit);
        true
    }

    pub fn clear(&mut self) {
        self.input.clear();
        if self.state == GateState::Verifying {
            self.state = GateState::Locked;
        }
    }

    /// Derive the key from the entered digits and open both envelopes.
    ///
    /// The entered digits are consumed whatever the outcome.
    pub(crate) async fn verify(&mut self) -> Result<NestedContent, UnlockError> {
        let lock = match (&self.lock, self.state) {
            (Some(_), GateState::Unlocked) | (None, _) => return Err(UnlockError::NotLocked),
            (Some(lock), _) => lock.clone(),
        };
        if self.input.len() != PASSCODE_LEN {
            return Err(UnlockError::InvalidInput);
        }

        self.state = GateState::Verifying;
        let passcode = std::mem::take(&mut self.input);
        let result = tokio::task::spawn_blocking(move || lock.open(passcode))
            .await
            .map_err(|e| UnlockError::Task(e.to_string()))
            .and_then(|opened| opened);

        match result {
            Ok(content) => {
                self.state = GateState::Unlocked;
                info!("passcode accepted");
                Ok(content)
            }
            Err(e) => {
                self.state = GateState::Locked;
                debug!(error = %e, "passcode rejected");
                Err(e)
            }
        }
    }
}
