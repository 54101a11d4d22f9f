//! Configuration for the Reasoner

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for LLM-driven reasoning
///
/// # Examples
///
/// ```
/// use recomm_reasoner::ReasonerConfig;
///
/// let config = ReasonerConfig::default();
/// assert_eq!(config.standard_suggestions, 3);
/// assert_eq!(config.creative_suggestions(5), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// How many of the requested candidates should be conventional fixes
    pub standard_suggestions: usize,

    /// Per-call timeout (seconds)
    pub timeout_secs: u64,

    /// Retries after a transient failure
    pub max_retries: u32,

    /// Backoff before the first retry (milliseconds); doubles per attempt
    pub base_backoff_ms: u64,

    /// Upper bound on a single backoff (milliseconds)
    pub max_backoff_ms: u64,

    /// Maximum candidate description length (characters)
    pub max_description_len: usize,

    /// Provider calls allowed at once, counting timed-out calls that are
    /// still running on the blocking pool
    pub max_concurrent_calls: usize,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            standard_suggestions: 3,
            timeout_secs: 120,
            max_retries: 3,
            base_backoff_ms: 1_000,
            max_backoff_ms: 16_000,
            max_description_len: 500,
            max_concurrent_calls: 4,
        }
    }
}

impl ReasonerConfig {
    /// Strict preset: fewer, shorter candidates and a tight timeout
    pub fn strict() -> Self {
        Self {
            standard_suggestions: 2,
            timeout_secs: 60,
            max_retries: 1,
            base_backoff_ms: 500,
            max_backoff_ms: 2_000,
            max_description_len: 280,
            max_concurrent_calls: 2,
        }
    }

    /// Lenient preset: more candidates, longer timeout, more retries
    pub fn lenient() -> Self {
        Self {
            standard_suggestions: 4,
            timeout_secs: 300,
            max_retries: 5,
            base_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            max_description_len: 1_000,
            max_concurrent_calls: 8,
        }
    }

    /// Standard candidates to request out of `k`
    pub fn standard_suggestions(&self, k: usize) -> usize {
        self.standard_suggestions.min(k)
    }

    /// Creative candidates to request out of `k` (the remainder)
    pub fn creative_suggestions(&self, k: usize) -> usize {
        k - self.standard_suggestions(k)
    }

    /// Get the per-call timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff before retry number `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.base_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_description_len == 0 {
            return Err("max_description_len must be greater than 0".to_string());
        }
        if self.max_concurrent_calls == 0 {
            return Err("max_concurrent_calls must be greater than 0".to_string());
        }
        if self.base_backoff_ms > self.max_backoff_ms {
            return Err("base_backoff_ms cannot exceed max_backoff_ms".to_string());
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
        assert!(ReasonerConfig::default().validate().is_ok());
        assert!(ReasonerConfig::strict().validate().is_ok());
        assert!(ReasonerConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = ReasonerConfig::default();
        assert_eq!(config.backoff(0), Duration::from_millis(1_000));
        assert_eq!(config.backoff(1), Duration::from_millis(2_000));
        assert_eq!(config.backoff(3), Duration::from_millis(8_000));
        assert_eq!(config.backoff(10), Duration::from_millis(16_000));
        assert_eq!(config.backoff(200), Duration::from_millis(16_000));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ReasonerConfig::default();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ReasonerConfig::default();
        config.base_backoff_ms = 20_000;
        assert!(config.validate().is_err());

        let mut config = ReasonerConfig::default();
        config.max_concurrent_calls = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_style_split_clamped_to_k() {
        let config = ReasonerConfig::default();
        assert_eq!(config.standard_suggestions(5), 3);
        assert_eq!(config.creative_suggestions(5), 2);
        assert_eq!(config.standard_suggestions(2), 2);
        assert_eq!(config.creative_suggestions(2), 0);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ReasonerConfig::strict();
        let parsed = ReasonerConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
