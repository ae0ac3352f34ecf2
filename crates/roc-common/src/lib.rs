//! # ROC Common
//!
//! Shared types, errors, and constants used across the ROC handover crates.
//!
//! ## Modules
//! - `types` - Party identity and readiness, session phase, role, outcome
//! - `error` - Common error type
//! - `constants` - Wire tokens, payload markers, timing defaults

pub mod constants;
pub mod error;
pub mod types;

pub use error::HandoverError;
pub use types::*;
