//! YAML configuration file support for tagmatch.
//!
//! One file configures the matcher, the default fuzzy index, and logging.
//! Every section and field is optional; missing values fall back to the same
//! defaults as [`MatchConfig::default`].
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "personal notes"
//!
//! matcher:
//!   fuzzy_threshold: 0.4
//!   fuzzy_fallback: true
//!   max_fuzzy_results: 5
//!   regex_size_limit: 1048576
//!
//! fuzzy:
//!   min_match_chars: 2
//!
//! logging:
//!   level: "info"
//!   json: false
//! ```

use std::fs;
use std::path::Path;

use matcher::{FuzzyConfig, MatchConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TagmatchConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub matcher: MatcherYamlConfig,

    #[serde(default)]
    pub fuzzy: FuzzyYamlConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TagmatchConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: TagmatchConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.to_match_config()
            .validate()
            .map_err(|err| ConfigLoadError::Validation(err.to_string()))?;
        self.logging.validate()?;
        Ok(())
    }

    /// Engine configuration described by the `matcher` and `fuzzy` sections.
    pub fn to_match_config(&self) -> MatchConfig {
        MatchConfig {
            fuzzy_threshold: self.matcher.fuzzy_threshold,
            fuzzy_fallback: self.matcher.fuzzy_fallback,
            max_fuzzy_results: self.matcher.max_fuzzy_results,
            regex_size_limit: self.matcher.regex_size_limit,
            fuzzy: FuzzyConfig {
                min_match_chars: self.fuzzy.min_match_chars,
            },
        }
    }
}

impl Default for TagmatchConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            matcher: MatcherYamlConfig::default(),
            fuzzy: FuzzyYamlConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Matcher YAML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherYamlConfig {
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    #[serde(default = "true_value")]
    pub fuzzy_fallback: bool,

    #[serde(default)]
    pub max_fuzzy_results: Option<usize>,

    #[serde(default = "default_regex_size_limit")]
    pub regex_size_limit: usize,
}

impl Default for MatcherYamlConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
            fuzzy_fallback: true,
            max_fuzzy_results: None,
            regex_size_limit: default_regex_size_limit(),
        }
    }
}

/// Default fuzzy index YAML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyYamlConfig {
    #[serde(default = "default_min_match_chars")]
    pub min_match_chars: usize,
}

impl Default for FuzzyYamlConfig {
    fn default() -> Self {
        Self {
            min_match_chars: default_min_match_chars(),
        }
    }
}

/// Logging YAML configuration, consumed by [`crate::init_tracing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"matcher=debug,info"`.
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit one JSON object per line instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.level.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Helper functions for serde defaults
fn true_value() -> bool {
    true
}
fn default_fuzzy_threshold() -> f64 {
    matcher::DEFAULT_FUZZY_THRESHOLD
}
fn default_regex_size_limit() -> usize {
    ontology::parse::DEFAULT_REGEX_SIZE_LIMIT
}
fn default_min_match_chars() -> usize {
    FuzzyConfig::default().min_match_chars
}
fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "test config"
matcher:
  fuzzy_threshold: 0.25
  max_fuzzy_results: 3
logging:
  level: "debug"
  json: true
"#;

        let config = TagmatchConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name, Some("test config".to_string()));
        assert_eq!(config.matcher.fuzzy_threshold, 0.25);
        assert_eq!(config.matcher.max_fuzzy_results, Some(3));
        assert!(config.matcher.fuzzy_fallback);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1"
fuzzy:
  min_match_chars: 2
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = TagmatchConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.version, "1");
        assert_eq!(config.fuzzy.min_match_chars, 2);
    }

    #[test]
    fn test_missing_file() {
        let err = TagmatchConfig::from_file("/no/such/tagmatch.yaml").unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileRead(_)));
    }

    #[test]
    fn test_default_config_matches_engine_defaults() {
        let config = TagmatchConfig::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.to_match_config(), MatchConfig::default());

        let parsed = TagmatchConfig::from_yaml("version: \"1.0\"\n").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unsupported_version() {
        let result = TagmatchConfig::from_yaml("version: \"2\"\n");
        assert!(matches!(result, Err(ConfigLoadError::UnsupportedVersion(v)) if v == "2"));
    }

    #[test]
    fn test_threshold_validation() {
        let yaml = r#"
version: "1.0"
matcher:
  fuzzy_threshold: 1.5
"#;

        let result = TagmatchConfig::from_yaml(yaml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("fuzzy_threshold"));
    }

    #[test]
    fn test_fuzzy_validation() {
        let yaml = r#"
version: "1.0"
fuzzy:
  min_match_chars: 0
"#;

        let result = TagmatchConfig::from_yaml(yaml);
        assert!(result.unwrap_err().to_string().contains("min_match_chars"));
    }

    #[test]
    fn test_engine_rules_reject_yaml_values() {
        for yaml in [
            "version: \"1\"\nmatcher:\n  max_fuzzy_results: 0\n",
            "version: \"1\"\nmatcher:\n  regex_size_limit: 0\n",
        ] {
            let err = TagmatchConfig::from_yaml(yaml).unwrap_err();
            assert!(matches!(err, ConfigLoadError::Validation(_)), "{yaml}");
        }
    }

    #[test]
    fn test_to_match_config() {
        let yaml = r#"
version: "1.0"
matcher:
  fuzzy_threshold: 0.3
  fuzzy_fallback: false
  max_fuzzy_results: 7
  regex_size_limit: 4096
fuzzy:
  min_match_chars: 3
"#;

        let cfg = TagmatchConfig::from_yaml(yaml).unwrap().to_match_config();
        assert_eq!(cfg.fuzzy_threshold, 0.3);
        assert!(!cfg.fuzzy_fallback);
        assert_eq!(cfg.max_fuzzy_results, Some(7));
        assert_eq!(cfg.regex_size_limit, 4096);
        assert_eq!(cfg.fuzzy.min_match_chars, 3);
        assert!(cfg.validate().is_ok());
    }
}
