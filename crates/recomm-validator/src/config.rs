//! Validator configuration

use serde::{Deserialize, Serialize};

/// Configuration for candidate validation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Reject candidates referencing elements outside the context
    pub check_targets: bool,

    /// Reject candidates whose predicted value does not satisfy the clause
    pub check_resolution: bool,

    /// Reject changes to properties listed as locked on the element
    pub check_locked: bool,

    /// Reject numeric changes outside limits recorded on the element
    pub check_limits: bool,

    /// Text property holding a comma-separated list of locked property names
    pub locked_properties_key: String,

    /// Suffix of the property recording a lower structural limit
    pub min_suffix: String,

    /// Suffix of the property recording an upper structural limit
    pub max_suffix: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            check_targets: true,
            check_resolution: true,
            check_locked: true,
            check_limits: true,
            locked_properties_key: "locked_properties".to_string(),
            min_suffix: "_min".to_string(),
            max_suffix: "_max".to_string(),
        }
    }
}

impl ValidatorConfig {
    /// Create a strict configuration (all validations enabled)
    pub fn strict() -> Self {
        Self::default()
    }

    /// Create a permissive configuration (references and resolution only)
    ///
    /// Suitable for graphs that carry no locking or limit annotations.
    pub fn permissive() -> Self {
        Self {
            check_locked: false,
            check_limits: false,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.check_locked && self.locked_properties_key.trim().is_empty() {
            return Err("locked_properties_key must not be empty".to_string());
        }
        if self.check_limits {
            if self.min_suffix.is_empty() || self.max_suffix.is_empty() {
                return Err("limit suffixes must not be empty".to_string());
            }
            if self.min_suffix == self.max_suffix {
                return Err("min_suffix and max_suffix must differ".to_string());
            }
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
