#![cfg_attr(not(feature = "std"), no_std)]

//! # Repeater Core
//!
//! Tap-to-repeat engine for matrix keyboard firmware.
//! Tapping a configured action key starts auto-repeating its target key
//! until a cancel key is pressed; holding the action key past the tap
//! timeout does nothing.

pub mod engine;
pub mod hal;
pub mod pool;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use engine::*;
pub use hal::{Duration, Instant};
pub use pool::*;
pub use types::*;

/// Engine library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration: 150ms tap timeout, no layer restriction
pub fn default_config() -> RepeaterConfig {
    RepeaterConfig {
        tap_timeout: Duration::from_millis(150),
        limited_to_layer: None,
    }
}
