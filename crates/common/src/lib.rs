//! Vigil Common Utilities
//!
//! Shared infrastructure for all Vigil crates:
//! - Error types and result aliases
//! - Monitor clock
//! - Tracing/logging initialization
//! - Configuration loading and credentials

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
