//! Configuration for the Context Builder

use recomm_domain::RelationType;
use serde::{Deserialize, Serialize};

/// Configuration for context expansion
///
/// # Examples
///
/// ```
/// use recomm_context::ContextConfig;
///
/// let config = ContextConfig::default();
/// assert_eq!(config.hop_limit, 2);
/// assert_eq!(config.max_nodes, 64);
///
/// let config = ContextConfig::strict();
/// assert_eq!(config.hop_limit, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Maximum hops from the violated element
    pub hop_limit: u32,

    /// Relation types followed during expansion, in either direction
    pub relation_types: Vec<RelationType>,

    /// Hard cap on elements in a context, the violated element included
    pub max_nodes: usize,

    /// Attach earlier recommendations for the element
    pub include_history: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            hop_limit: 2,
            relation_types: vec![
                RelationType::Supports,
                RelationType::Adjacent,
                RelationType::Contained,
            ],
            max_nodes: 64,
            include_history: true,
        }
    }
}

impl ContextConfig {
    /// Strict preset: immediate neighbors only, small cap
    pub fn strict() -> Self {
        Self {
            hop_limit: 1,
            max_nodes: 32,
            ..Self::default()
        }
    }

    /// Lenient preset: wider radius over every relation type
    pub fn lenient() -> Self {
        Self {
            hop_limit: 3,
            relation_types: RelationType::ALL.to_vec(),
            max_nodes: 256,
            include_history: true,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_nodes == 0 {
            return Err("max_nodes must be greater than 0".to_string());
        }
        if self.relation_types.is_empty() && self.hop_limit > 0 {
            return Err("relation_types must not be empty when hop_limit > 0".to_string());
        }
        if self.hop_limit > 8 {
            return Err("hop_limit cannot exceed 8".to_string());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(ContextConfig::default().validate().is_ok());
        assert!(ContextConfig::strict().validate().is_ok());
        assert!(ContextConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ContextConfig::default();
        config.max_nodes = 0;
        assert!(config.validate().is_err());

        let mut config = ContextConfig::default();
        config.relation_types.clear();
        assert!(config.validate().is_err());
        config.hop_limit = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ContextConfig::lenient();
        let parsed = ContextConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml() {
        let config = ContextConfig::from_toml("hop_limit = 1\nrelation_types = [\"supports\"]").unwrap();
        assert_eq!(config.hop_limit, 1);
        assert_eq!(config.relation_types, vec![RelationType::Supports]);
        assert_eq!(config.max_nodes, 64);
    }
}
