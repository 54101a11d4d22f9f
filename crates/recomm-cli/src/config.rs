//! Configuration management for the CLI.
//!
//! One `recomm.toml` holds a section per component. String values may refer
//! to the environment as `${VAR}` or `${VAR:default}`; references are
//! resolved after parsing, so substituted text is never read as TOML.

use crate::error::{CliError, Result};
use recomm_context::ContextConfig;
use recomm_llm::LlmConfig;
use recomm_pipeline::PipelineConfig;
use recomm_ranking::MergeConfig;
use recomm_reasoner::ReasonerConfig;
use recomm_validator::ValidatorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "recomm.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Graph database and ingestion
    pub graph: GraphSettings,

    /// Context expansion
    pub context: ContextConfig,

    /// Reasoner retries, timeout, and style split
    pub reasoner: ReasonerConfig,

    /// Candidate validation checks
    pub validator: ValidatorConfig,

    /// Cross-violation merging
    pub merge: MergeConfig,

    /// Worker pool and write behavior
    pub pipeline: PipelineConfig,

    /// LLM provider
    pub llm: LlmConfig,

    /// Output settings
    pub output: OutputSettings,
}

/// Graph database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// SQLite database path
    pub database: PathBuf,

    /// Feed records implicating more elements than this are skipped
    pub max_elements_per_issue: usize,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Where `run` writes its report; a numbered sibling is used if taken
    pub report_path: Option<PathBuf>,

    /// Default output format
    pub format: OutputFormat,

    /// Enable colored output
    pub color: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            database: PathBuf::from("recomm.db"),
            max_elements_per_issue: 10,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            report_path: Some(PathBuf::from("report.json")),
            format: OutputFormat::Table,
            color: true,
        }
    }
}

impl Config {
    /// Default per-user configuration file path.
    pub fn user_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".recomm").join("config.toml"))
    }

    /// Locate the configuration file.
    ///
    /// An explicit path must exist. Otherwise `./recomm.toml` and then the
    /// per-user file are tried.
    pub fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(CliError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            return Ok(Some(path.to_path_buf()));
        }
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Ok(Some(local));
        }
        Ok(Self::user_path().filter(|p| p.exists()))
    }

    /// Load configuration, falling back to defaults when no file is found.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match Self::locate(explicit)? {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Self::from_toml(&fs::read_to_string(&path)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration, then substitute environment references into
    /// its string values.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut value: toml::Value = toml::from_str(content)?;
        substitute_values(&mut value, &|name| std::env::var(name).ok());
        let config: Config = value.try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        let sections = [
            ("context", self.context.validate()),
            ("reasoner", self.reasoner.validate()),
            ("validator", self.validator.validate()),
            ("merge", self.merge.validate()),
            ("pipeline", self.pipeline.validate()),
            ("llm", self.llm.validate()),
        ];
        for (section, result) in sections {
            result.map_err(|e| CliError::Config(format!("[{}] {}", section, e)))?;
        }
        // Let the HTTP request give up first so a timed-out call does not linger
        if self.llm.request_timeout_secs > self.reasoner.timeout_secs {
            return Err(CliError::Config(format!(
                "[llm] request_timeout_secs ({}) exceeds [reasoner] timeout_secs ({})",
                self.llm.request_timeout_secs, self.reasoner.timeout_secs
            )));
        }
        if self.graph.max_elements_per_issue == 0 {
            return Err(CliError::Config(
                "[graph] max_elements_per_issue must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Substitute environment references into every string in a TOML tree.
fn substitute_values<F>(value: &mut toml::Value, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        toml::Value::String(text) => *text = substitute_env(text, lookup),
        toml::Value::Array(items) => {
            for item in items {
                substitute_values(item, lookup);
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                substitute_values(item, lookup);
            }
        }
        _ => {}
    }
}

/// Replace `${VAR}` and `${VAR:default}` references in one string.
///
/// An unset variable without a default becomes the empty string. Text that
/// is not a well-formed reference is kept as written.
pub fn substitute_env<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            output.push_str(&rest[start..]);
            return output;
        };
        let reference = &after[..end];
        let (name, default) = match reference.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (reference, None),
        };
        if name.is_empty() {
            output.push_str(&rest[start..start + 2 + end + 1]);
        } else {
            match (lookup(name), default) {
                (Some(value), _) => output.push_str(&value),
                (None, Some(default)) => output.push_str(default),
                (None, None) => {
                    tracing::warn!(variable = name, "environment variable not set, using empty value");
                }
            }
        }
        rest = &after[end + 1..];
    }
    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        match name {
            "DB_DIR" => Some("/data".to_string()),
            "MODEL" => Some("qwen2.5".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_substitution() {
        assert_eq!(substitute_env("${DB_DIR}/graph.db", env), "/data/graph.db");
        assert_eq!(substitute_env("${MISSING:llama3.1}", env), "llama3.1");
        assert_eq!(substitute_env("${MODEL:other}", env), "qwen2.5");
        assert_eq!(substitute_env("no refs", env), "no refs");
        assert_eq!(substitute_env("${MISSING:}", env), "");
    }

    #[test]
    fn test_unset_and_malformed_references() {
        assert_eq!(substitute_env("a${MISSING}b", env), "ab");
        assert_eq!(substitute_env("${DB_DIR", env), "${DB_DIR");
        assert_eq!(substitute_env("x${}y", env), "x${}y");
    }

    #[test]
    fn test_substituted_values_are_not_reparsed() {
        let lookup = |name: &str| match name {
            "DB" => Some(r"C:\Users\data\graph.db".to_string()),
            "QUOTED" => Some(r#"ab"c"#.to_string()),
            _ => None,
        };
        let mut value: toml::Value = toml::from_str(
            r#"
# database = "${NOT_SET_ANYWHERE}"
[graph]
database = "${DB}"

[llm]
model = "${QUOTED}"
"#,
        )
        .unwrap();
        substitute_values(&mut value, &lookup);
        let config: Config = value.try_into().unwrap();
        assert_eq!(config.graph.database, PathBuf::from(r"C:\Users\data\graph.db"));
        assert_eq!(config.llm.model, r#"ab"c"#);
    }

    #[test]
    fn test_reference_in_comment_is_ignored() {
        let config = Config::from_toml(
            "# database = \"${RECOMM_TEST_NEVER_SET}\"\n[pipeline]\nworkers = 3\n",
        )
        .unwrap();
        assert_eq!(config.pipeline.workers, 3);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.graph.max_elements_per_issue, 10);
        assert_eq!(config.output.format, OutputFormat::Table);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
[graph]
database = "building.db"

[pipeline]
workers = 2

[merge]
value_tolerance = 0.01
tolerance_mode = "relative"
"#,
        )
        .unwrap();
        assert_eq!(config.graph.database, PathBuf::from("building.db"));
        assert_eq!(config.graph.max_elements_per_issue, 10);
        assert_eq!(config.pipeline.workers, 2);
        assert_eq!(config.pipeline.k, 5);
        assert_eq!(config.merge.value_tolerance, 0.01);
    }

    #[test]
    fn test_invalid_section_named() {
        let err = Config::from_toml("[pipeline]\nworkers = 0").unwrap_err();
        assert!(err.to_string().contains("[pipeline]"));
    }

    #[test]
    fn test_request_timeout_within_reasoner_timeout() {
        let err = Config::from_toml("[reasoner]\ntimeout_secs = 30\n\n[llm]\nrequest_timeout_secs = 90")
            .unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));

        let config =
            Config::from_toml("[reasoner]\ntimeout_secs = 90\n\n[llm]\nrequest_timeout_secs = 90")
                .unwrap();
        assert_eq!(config.reasoner.timeout_secs, 90);
    }

    #[test]
    fn test_roundtrip() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[graph]"));
        assert!(toml.contains("[llm]"));
        assert_eq!(Config::from_toml(&toml).unwrap(), config);
    }
}
