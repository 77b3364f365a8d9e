//! Courtside Script - RON definition loader
//!
//! Loads engine definitions from RON files:
//! - Achievement catalog (`achievements: [...]`)
//! - Unlock rules (`rules: [...]`)
//! - Tier thresholds (`tiers: [...]`)
//! - Engine settings such as rivalries (`engine: (...)`)
//!
//! Anything not loaded falls back to the built-in standard definitions.

mod error;
mod loader;

pub use error::{Error, Result};
pub use loader::Loader;
