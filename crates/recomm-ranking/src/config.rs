//! Merge configuration

use serde::{Deserialize, Serialize};

/// How numeric change values are compared during merging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToleranceMode {
    /// `|a - b| <= tolerance`
    #[default]
    Absolute,
    /// `|a - b| <= tolerance * max(|a|, |b|)`
    Relative,
}

/// Configuration for cross-violation aggregation
///
/// # Examples
///
/// ```
/// use recomm_ranking::{MergeConfig, ToleranceMode};
///
/// let config = MergeConfig::default();
/// assert!(config.enabled);
/// assert_eq!(config.value_tolerance, 0.0);
/// assert_eq!(config.tolerance_mode, ToleranceMode::Absolute);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Merge compatible proposals at all
    pub enabled: bool,

    /// Allowed difference between numeric values of a shared change
    pub value_tolerance: f64,

    /// How the tolerance is applied
    pub tolerance_mode: ToleranceMode,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            value_tolerance: 0.0,
            tolerance_mode: ToleranceMode::Absolute,
        }
    }
}

impl MergeConfig {
    /// Lenient preset: numeric values within 1% are treated as equal
    pub fn lenient() -> Self {
        Self {
            enabled: true,
            value_tolerance: 0.01,
            tolerance_mode: ToleranceMode::Relative,
        }
    }

    /// Whether two numbers are equal under this configuration
    pub fn numbers_match(&self, a: f64, b: f64) -> bool {
        let diff = (a - b).abs();
        let allowed = match self.tolerance_mode {
            ToleranceMode::Absolute => self.value_tolerance,
            ToleranceMode::Relative => self.value_tolerance * a.abs().max(b.abs()),
        };
        diff <= allowed.max(f64::EPSILON)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.value_tolerance.is_finite() || self.value_tolerance < 0.0 {
            return Err("value_tolerance must be a non-negative number".to_string());
        }
        if self.tolerance_mode == ToleranceMode::Relative && self.value_tolerance >= 1.0 {
            return Err("relative value_tolerance must be below 1.0".to_string());
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
    fn test_exact_by_default() {
        let config = MergeConfig::default();
        assert!(config.numbers_match(1.25, 1.25));
        assert!(!config.numbers_match(1.25, 1.26));
    }

    #[test]
    fn test_absolute_tolerance() {
        let config = MergeConfig {
            value_tolerance: 0.05,
            ..MergeConfig::default()
        };
        assert!(config.numbers_match(1.25, 1.29));
        assert!(!config.numbers_match(1.25, 1.31));
    }

    #[test]
    fn test_relative_tolerance() {
        let config = MergeConfig::lenient();
        assert!(config.numbers_match(100.0, 100.9));
        assert!(!config.numbers_match(1.0, 1.05));
    }

    #[test]
    fn test_validate() {
        assert!(MergeConfig::default().validate().is_ok());
        assert!(MergeConfig::lenient().validate().is_ok());
        let config = MergeConfig {
            value_tolerance: -0.1,
            ..MergeConfig::default()
        };
        assert!(config.validate().is_err());
        let config = MergeConfig {
            value_tolerance: 1.5,
            tolerance_mode: ToleranceMode::Relative,
            ..MergeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml() {
        let config = MergeConfig::from_toml("value_tolerance = 0.02\ntolerance_mode = \"relative\"").unwrap();
        assert_eq!(config.tolerance_mode, ToleranceMode::Relative);
        assert!(config.enabled);
        let parsed = MergeConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
