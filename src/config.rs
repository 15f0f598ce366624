use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_EXPIRING_SOON_DAYS: i64 = 3;
const DEFAULT_LOW_STOCK_THRESHOLD: f64 = 1.0;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Window used by `item expiring` when no `--days` is given
    pub expiring_soon_days: ConfigValue<i64>,
    /// Amount at or below which `item low` reports stock
    pub low_stock_threshold: ConfigValue<f64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    expiring_soon_days: Option<i64>,
    low_stock_threshold: Option<f64>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("pantry.db"),
            ConfigSource::Default,
        );
        let mut expiring_soon_days =
            ConfigValue::new(DEFAULT_EXPIRING_SOON_DAYS, ConfigSource::Default);
        let mut low_stock_threshold =
            ConfigValue::new(DEFAULT_LOW_STOCK_THRESHOLD, ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(days) = file_config.expiring_soon_days {
                expiring_soon_days = ConfigValue::new(days, ConfigSource::File);
            }
            if let Some(threshold) = file_config.low_stock_threshold {
                low_stock_threshold = ConfigValue::new(threshold, ConfigSource::File);
            }

            tracing::debug!(path = %path.display(), "loaded config file");
            config_file = Some(path);
        }

        if let Ok(db_path) = std::env::var("PANTRY_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Some(days) = env_override("PANTRY_EXPIRING_SOON_DAYS")? {
            expiring_soon_days = ConfigValue::new(days, ConfigSource::Environment);
        }
        if let Some(threshold) = env_override("PANTRY_LOW_STOCK_THRESHOLD")? {
            low_stock_threshold = ConfigValue::new(threshold, ConfigSource::Environment);
        }

        let config = Self {
            database_path,
            expiring_soon_days,
            low_stock_threshold,
            config_file,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.expiring_soon_days.value < 0 {
            return Err(ConfigError::InvalidValue(
                "expiring_soon_days".to_string(),
                self.expiring_soon_days.value.to_string(),
            ));
        }
        let threshold = self.low_stock_threshold.value;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidValue(
                "low_stock_threshold".to_string(),
                threshold.to_string(),
            ));
        }
        Ok(())
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/pantry/
    /// - macOS: ~/Library/Application Support/pantry/
    /// - Windows: %APPDATA%/pantry/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pantry")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/pantry/
    /// - macOS: ~/Library/Application Support/pantry/
    /// - Windows: %APPDATA%/pantry/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pantry")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn env_override<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw)),
        Err(_) => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(key, value) => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
