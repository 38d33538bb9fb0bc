//! Façade configuration
//!
//! Controls which member names count as internal and how a registry retains
//! instance pairs. Loadable from JSON:
//!
//! ```json
//! { "internal_marker": "_", "reserved_names": ["constructor"], "retention": "strong" }
//! ```
//!
//! Every field is optional and falls back to its default.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default prefix marking a member as internal
pub const DEFAULT_INTERNAL_MARKER: &str = "_";

/// Structural names never exposed on a façade
pub const DEFAULT_RESERVED_NAMES: &[&str] = &["constructor", "prototype"];

/// How a registry holds the instances it pairs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retention {
    /// Entries never keep an instance alive; they vanish with the façade instance
    #[default]
    Weak,
    /// Both instances live as long as the registry
    Strong,
}

/// Façade compiler and registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacadeConfig {
    /// Name prefix of internal members
    pub internal_marker: String,
    /// Exact names that are never exposed
    pub reserved_names: Vec<String>,
    /// Instance retention policy
    pub retention: Retention,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            internal_marker: DEFAULT_INTERNAL_MARKER.to_string(),
            reserved_names: DEFAULT_RESERVED_NAMES.iter().map(|s| s.to_string()).collect(),
            retention: Retention::Weak,
        }
    }
}

impl FacadeConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: FacadeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.internal_marker.is_empty() {
            return Err(ConfigError::EmptyMarker);
        }
        Ok(())
    }

    /// Set the internal marker
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.internal_marker = marker.into();
        self
    }

    /// Set the retention policy
    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    /// Replace the reserved names
    pub fn with_reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Check if a member name is hidden from façades
    pub fn is_internal(&self, name: &str) -> bool {
        name.starts_with(&self.internal_marker) || self.reserved_names.iter().any(|r| r == name)
    }
}
