//! Shared types, errors, and configuration for the Parley assistant.
//!
//! Every other Parley crate depends on this one. It defines the
//! conversation data model (turns, intents, generation jobs), the
//! top-level error type, and the TOML configuration tree.

pub mod config;
pub mod error;
pub mod types;

pub use config::ParleyConfig;
pub use error::{ParleyError, Result};
pub use types::*;
