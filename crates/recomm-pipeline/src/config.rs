//! Configuration for pipeline runs

use serde::{Deserialize, Serialize};

/// Configuration for the recommendation pipeline
///
/// # Examples
///
/// ```
/// use recomm_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.workers, 4);
/// assert_eq!(config.max_in_flight_reasoner_calls, 2);
///
/// let config = PipelineConfig::sequential();
/// assert_eq!(config.workers, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Violations processed concurrently
    pub workers: usize,

    /// Reasoner calls allowed in flight at once, across all workers
    pub max_in_flight_reasoner_calls: usize,

    /// Candidates requested per violation
    pub k: usize,

    /// Store lower-ranked candidates as proposed alternatives
    pub store_alternatives: bool,

    /// Upper bound on alternatives stored per violation
    pub max_alternatives: usize,

    /// Re-attempts after a write conflict on a still-open violation
    pub conflict_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_in_flight_reasoner_calls: 2,
            k: 5,
            store_alternatives: true,
            max_alternatives: 4,
            conflict_retries: 1,
        }
    }
}

impl PipelineConfig {
    /// One violation and one reasoner call at a time
    pub fn sequential() -> Self {
        Self {
            workers: 1,
            max_in_flight_reasoner_calls: 1,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }
        if self.max_in_flight_reasoner_calls == 0 {
            return Err("max_in_flight_reasoner_calls must be greater than 0".to_string());
        }
        if self.k == 0 {
            return Err("k must be greater than 0".to_string());
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
