//! Configuration for nexrad-inspect.
//!
//! Loaded from a YAML file when one is given, otherwise from environment
//! variables. YAML values support `${VAR}` and `${VAR:-default}` expansion.

use anyhow::{Context, Result};
use nexrad_decode::level2::ReassemblyConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: [&str; 2] = ["json", "pretty"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    pub logging: LoggingConfig,
    pub reassembly: ReassemblyConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// json or pretty
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON summaries
    pub pretty: bool,
}

impl InspectConfig {
    /// Load and validate a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;

        let expanded = expand_env_vars(&content)?;

        let config: InspectConfig = serde_yaml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config YAML from {:?}", path.as_ref()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let logging = LoggingConfig {
            level: env::var("NEXRAD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: env::var("NEXRAD_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
        };

        let mut reassembly = ReassemblyConfig::default();
        if let Ok(value) = env::var("NEXRAD_MIN_GROWTH_SEGMENTS") {
            reassembly.min_growth_segments = value
                .parse()
                .with_context(|| format!("Invalid NEXRAD_MIN_GROWTH_SEGMENTS: {}", value))?;
        }
        if let Ok(value) = env::var("NEXRAD_MAX_MESSAGE_BYTES") {
            reassembly.max_message_bytes = value
                .parse()
                .with_context(|| format!("Invalid NEXRAD_MAX_MESSAGE_BYTES: {}", value))?;
        }

        let config = Self {
            logging,
            reassembly,
            output: OutputConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            VALID_LEVELS.contains(&self.logging.level.as_str()),
            "Invalid log level: {}. Must be one of: {:?}",
            self.logging.level,
            VALID_LEVELS
        );

        anyhow::ensure!(
            VALID_FORMATS.contains(&self.logging.format.as_str()),
            "Invalid log format: {}. Must be one of: {:?}",
            self.logging.format,
            VALID_FORMATS
        );

        anyhow::ensure!(
            self.reassembly.min_growth_segments > 0,
            "reassembly.min_growth_segments must be greater than 0"
        );

        anyhow::ensure!(
            self.reassembly.max_message_bytes > 0,
            "reassembly.max_message_bytes must be greater than 0"
        );

        Ok(())
    }
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_expand_env_vars_simple() {
        env::set_var("NEXRAD_TEST_VAR", "debug");
        let result = expand_env_vars("level: ${NEXRAD_TEST_VAR}").unwrap();
        assert_eq!(result, "level: debug");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        env::remove_var("NEXRAD_NONEXISTENT_VAR");
        let result = expand_env_vars("format: ${NEXRAD_NONEXISTENT_VAR:-json}").unwrap();
        assert_eq!(result, "format: json");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        env::remove_var("NEXRAD_REQUIRED_VAR");
        assert!(expand_env_vars("${NEXRAD_REQUIRED_VAR}").is_err());
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }

    #[test]
    fn test_load_yaml() {
        env::remove_var("NEXRAD_UNSET_FORMAT");
        let file = write_config(
            "logging:\n  level: warn\n  format: ${NEXRAD_UNSET_FORMAT:-json}\nreassembly:\n  min_growth_segments: 4\n  max_message_bytes: 1048576\n",
        );

        let config = InspectConfig::load(file.path()).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.reassembly.min_growth_segments, 4);
        assert_eq!(config.reassembly.max_message_bytes, 1_048_576);
        assert!(!config.output.pretty);
    }

    #[test]
    fn test_load_yaml_defaults() {
        let file = write_config("output:\n  pretty: true\n");
        let config = InspectConfig::load(file.path()).unwrap();
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.reassembly, ReassemblyConfig::default());
        assert!(config.output.pretty);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let file = write_config("logging:\n  level: loud\n");
        assert!(InspectConfig::load(file.path()).is_err());

        let file = write_config("logging:\n  format: xml\n");
        assert!(InspectConfig::load(file.path()).is_err());

        let file = write_config("reassembly:\n  min_growth_segments: 0\n");
        assert!(InspectConfig::load(file.path()).is_err());

        let file = write_config("reassembly:\n  max_message_bytes: 0\n");
        assert!(InspectConfig::load(file.path()).is_err());
    }
}
