//! Test data factories for reducing test setup boilerplate.
//!
//! # Usage
//!
//! ```ignore
//! use common::factories::{fast_seal_options, ConfigFactory};
//!
//! let config = ConfigFactory::new().with_passcode("2468").with_note(0, "hi").build();
//! let sealed = seal(&config, &fast_seal_options()).await?;
//! ```

mod config;

pub use config::ConfigFactory;

use sanctuary::payload::SealOptions;
use sanctuary_crypto::KdfParams;

/// Seal options with the weakest accepted KDF so tests stay fast.
pub fn fast_seal_options() -> SealOptions {
    SealOptions {
        kdf: KdfParams::MINIMUM,
        ..SealOptions::default()
    }
}
