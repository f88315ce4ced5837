use crate::error::{Result, RotateError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default size threshold before rotation (10MB)
pub const DEFAULT_SIZE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Logger configuration for a single log target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Base filename (without leading underscore or extension)
    pub filename: String,

    /// Directory holding the live and rotated files
    pub directory: PathBuf,

    /// Extension of the live file
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Size in bytes above which the live file is rotated
    #[serde(default = "default_size_threshold")]
    pub size_threshold_bytes: u64,

    /// Whether to rotate when the calendar date changes
    #[serde(default = "default_rotate_daily")]
    pub rotate_daily: bool,

    /// Console mirror settings
    #[serde(default)]
    pub mirror: MirrorConfig,
}

/// Settings for the console mirror
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorConfig {
    #[serde(default = "default_mirror_enabled")]
    pub enabled: bool,

    /// Minimum severity shown; records are mirrored at `debug`
    #[serde(default)]
    pub level: MirrorLevel,
}

/// Severity threshold for the console mirror
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorLevel {
    #[default]
    Debug,
    Info,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: default_mirror_enabled(),
            level: MirrorLevel::default(),
        }
    }
}

// Default value functions for serde
fn default_extension() -> String {
    "csv".to_string()
}

fn default_size_threshold() -> u64 {
    DEFAULT_SIZE_THRESHOLD
}

fn default_rotate_daily() -> bool {
    true
}

fn default_mirror_enabled() -> bool {
    true
}

impl LoggerConfig {
    /// Create a configuration with default rotation settings
    pub fn new(filename: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            directory: directory.into(),
            extension: default_extension(),
            size_threshold_bytes: default_size_threshold(),
            rotate_daily: default_rotate_daily(),
            mirror: MirrorConfig::default(),
        }
    }

    pub fn with_size_threshold(mut self, bytes: u64) -> Self {
        self.size_threshold_bytes = bytes;
        self
    }

    pub fn with_rotate_daily(mut self, rotate_daily: bool) -> Self {
        self.rotate_daily = rotate_daily;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_mirror(mut self, mirror: MirrorConfig) -> Self {
        self.mirror = mirror;
        self
    }

    /// Load a logger configuration from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<LoggerConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RotateError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut config = match extension {
            "toml" => Self::parse_toml(&contents)?,
            "json" => Self::parse_json(&contents)?,
            _ => {
                return Err(RotateError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.expand_env_vars();
        config.validate()?;

        Ok(config)
    }

    fn parse_toml(contents: &str) -> Result<LoggerConfig> {
        toml::from_str(contents)
            .map_err(|e| RotateError::InvalidConfig(format!("Failed to parse TOML: {}", e)))
    }

    fn parse_json(contents: &str) -> Result<LoggerConfig> {
        serde_json::from_str(contents)
            .map_err(|e| RotateError::InvalidConfig(format!("Failed to parse JSON: {}", e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.filename.is_empty() {
            return Err(RotateError::MissingConfigField("filename".to_string()));
        }

        if self.directory.as_os_str().is_empty() {
            return Err(RotateError::MissingConfigField("directory".to_string()));
        }

        if self.filename.contains(['/', '\\']) {
            return Err(RotateError::ConfigValidationError(format!(
                "filename must not contain a path separator: {}",
                self.filename
            )));
        }

        if self.extension.is_empty() {
            return Err(RotateError::ConfigValidationError(
                "extension must not be empty".to_string(),
            ));
        }

        if self.size_threshold_bytes == 0 {
            return Err(RotateError::ConfigValidationError(
                "size_threshold_bytes must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Expand environment variables in the directory path
    fn expand_env_vars(&mut self) {
        let path_str = self.directory.to_string_lossy();
        let expanded = expand_env_in_string(&path_str);
        self.directory = PathBuf::from(expanded);
    }
}

/// Expand `$VAR` and `${VAR}` references in a string
fn expand_env_in_string(s: &str) -> String {
    let mut result = s.to_string();

    // Longest names first so $LOG_DIR is not clobbered by $LOG
    let mut vars: Vec<(String, String)> = std::env::vars().collect();
    vars.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    for (key, value) in vars {
        result = result.replace(&format!("${{{}}}", key), &value);
        result = result.replace(&format!("${}", key), &value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_logger_config_defaults() {
        let config = LoggerConfig::new("temp", "/var/log/sensors");

        assert_eq!(config.extension, "csv");
        assert_eq!(config.size_threshold_bytes, 10_485_760);
        assert!(config.rotate_daily);
        assert!(config.mirror.enabled);
        assert_eq!(config.mirror.level, MirrorLevel::Debug);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = LoggerConfig::new("temp", "/tmp");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_filename() {
        let config = LoggerConfig::new("", "/tmp");
        assert!(matches!(
            config.validate(),
            Err(RotateError::MissingConfigField(field)) if field == "filename"
        ));
    }

    #[test]
    fn test_validate_empty_directory() {
        let config = LoggerConfig::new("temp", "");
        assert!(matches!(
            config.validate(),
            Err(RotateError::MissingConfigField(field)) if field == "directory"
        ));
    }

    #[test]
    fn test_validate_zero_threshold() {
        let config = LoggerConfig::new("temp", "/tmp").with_size_threshold(0);
        assert!(matches!(
            config.validate(),
            Err(RotateError::ConfigValidationError(_))
        ));
    }

    #[test]
    fn test_validate_filename_with_separator() {
        let config = LoggerConfig::new("a/b", "/tmp");
        assert!(matches!(
            config.validate(),
            Err(RotateError::ConfigValidationError(_))
        ));
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("CSV_ROTATE_TEST_ROOT", "/srv/data");

        let mut config = LoggerConfig::new("temp", "${CSV_ROTATE_TEST_ROOT}/logs");
        config.expand_env_vars();
        assert_eq!(config.directory, PathBuf::from("/srv/data/logs"));

        let mut config = LoggerConfig::new("temp", "$CSV_ROTATE_TEST_ROOT/csv");
        config.expand_env_vars();
        assert_eq!(config.directory, PathBuf::from("/srv/data/csv"));
    }

    #[test]
    fn test_parse_toml() {
        let toml_content = r#"
            filename = "temp"
            directory = "/data"
            size_threshold_bytes = 1024
            rotate_daily = false

            [mirror]
            level = "info"
        "#;

        let config = LoggerConfig::parse_toml(toml_content).unwrap();
        assert_eq!(config.filename, "temp");
        assert_eq!(config.size_threshold_bytes, 1024);
        assert!(!config.rotate_daily);
        assert!(config.mirror.enabled);
        assert_eq!(config.mirror.level, MirrorLevel::Info);
    }

    #[test]
    fn test_parse_json() {
        let json_content = r#"
            {
                "filename": "temp",
                "directory": "/data",
                "mirror": { "enabled": false }
            }
        "#;

        let config = LoggerConfig::parse_json(json_content).unwrap();
        assert_eq!(config.directory, PathBuf::from("/data"));
        assert_eq!(config.size_threshold_bytes, DEFAULT_SIZE_THRESHOLD);
        assert!(!config.mirror.enabled);
    }

    #[test]
    fn test_from_file_unsupported_format() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        fs::write(&config_path, "filename: temp").unwrap();

        let result = LoggerConfig::from_file(&config_path);
        assert!(matches!(result, Err(RotateError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_file_rejects_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        fs::write(&config_path, r#"{ "filename": "temp", "directory": "" }"#).unwrap();

        let result = LoggerConfig::from_file(&config_path);
        assert!(matches!(result, Err(RotateError::MissingConfigField(_))));
    }
}
