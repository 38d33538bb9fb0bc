//! Engine error types
//!
//! Façade operations report [`FacadeError`] from the object model; this
//! module adds the configuration errors raised before a registry exists.

pub use veneer_sdk::{FacadeError, FacadeResult};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration JSON could not be parsed
    #[error("Invalid facade configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The internal marker is empty and would hide every member
    #[error("Internal marker must not be empty")]
    EmptyMarker,
}
