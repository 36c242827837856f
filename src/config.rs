//! Configuration management module.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing (first run).
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub school: SchoolConfig,
    #[serde(default)]
    pub grading: GradingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Local SQLite store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path, or `:memory:`.
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Remote backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL; empty disables remote sync.
    pub base_url: String,
    pub api_key: String,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Sync operation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_enabled: bool,
    pub interval_seconds: u64,
    /// Push local mutations to the backend as they happen.
    #[serde(default = "default_true")]
    pub push_on_change: bool,
}

fn default_true() -> bool {
    true
}

/// Which school this installation works for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolConfig {
    pub school_id: String,
}

/// Weights and thresholds for the evaluation composite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    pub homework_weight: f64,
    pub activity_weight: f64,
    pub attendance_weight: f64,
    pub exam_weight: f64,
    /// Activity points that earn the full activity weight.
    pub activity_target: f64,
    /// Fraction of a present day credited for a late arrival.
    pub late_credit: f64,
    /// Attendance rate (percent) under which a student is flagged.
    pub at_risk_attendance: f64,
    /// Composite total under which a student is flagged.
    pub at_risk_total: f64,
}

/// Log output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for daily rolling log files; stdout only when unset.
    pub directory: Option<PathBuf>,
    /// Default filter directive when RUST_LOG is not set.
    pub level: Option<String>,
}

impl AppConfig {
    /// Get config file path (platform config dir, else next to the executable).
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = ProjectDirs::from("", "", "schoolhub") {
            return dirs.config_dir().join("config.toml");
        }
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(config) => match config.validate() {
                    Ok(()) => ConfigLoadResult::Loaded(config),
                    Err(e) => ConfigLoadResult::Invalid(e),
                },
                Err(e) => ConfigLoadResult::Invalid(ConfigError::Parse(e)),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("Database path cannot be empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "Database max_connections must be at least 1".to_string(),
            ));
        }
        if !self.remote.base_url.is_empty() && !self.remote.base_url.starts_with("http") {
            return Err(ConfigError::Validation(
                "Remote URL must start with http:// or https://".to_string(),
            ));
        }
        if self.remote.timeout_secs < 1 {
            return Err(ConfigError::Validation(
                "Remote timeout must be at least 1 second".to_string(),
            ));
        }
        if self.sync.interval_seconds < 10 {
            return Err(ConfigError::Validation(
                "Sync interval must be at least 10 seconds".to_string(),
            ));
        }
        if self.sync.auto_enabled && self.remote.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "Auto sync requires a remote URL".to_string(),
            ));
        }
        if self.school.school_id.trim().is_empty() {
            return Err(ConfigError::Validation("School id cannot be empty".to_string()));
        }
        self.grading.validate()
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl DatabaseConfig {
    /// Build connection string for SeaORM.
    pub fn connection_string(&self) -> String {
        if self.is_memory() {
            return "sqlite::memory:".to_string();
        }
        format!("sqlite://{}?mode=rwc", self.path.display())
    }

    /// Whether the store lives in memory only.
    pub fn is_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }
}

impl RemoteConfig {
    /// Remote sync is configured.
    pub fn is_enabled(&self) -> bool {
        !self.base_url.trim().is_empty()
    }
}

impl GradingConfig {
    /// Maximum composite score (sum of all weights).
    pub fn total_weight(&self) -> f64 {
        self.homework_weight + self.activity_weight + self.attendance_weight + self.exam_weight
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            self.homework_weight,
            self.activity_weight,
            self.attendance_weight,
            self.exam_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::Validation(
                "Grading weights must be non-negative numbers".to_string(),
            ));
        }
        if self.activity_target <= 0.0 {
            return Err(ConfigError::Validation(
                "Activity target must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.late_credit) {
            return Err(ConfigError::Validation(
                "Late credit must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("schoolhub.db"),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_enabled: false,
            interval_seconds: 300,
            push_on_change: true,
        }
    }
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            school_id: "default".to_string(),
        }
    }
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            homework_weight: 10.0,
            activity_weight: 15.0,
            attendance_weight: 15.0,
            exam_weight: 20.0,
            activity_target: 15.0,
            late_credit: 0.5,
            at_risk_attendance: 75.0,
            at_risk_total: 30.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_connection_string() {
        let db = DatabaseConfig {
            path: PathBuf::from("data/school.db"),
            max_connections: 5,
        };
        assert_eq!(db.connection_string(), "sqlite://data/school.db?mode=rwc");
    }

    #[test]
    fn test_memory_connection_string() {
        let db = DatabaseConfig {
            path: PathBuf::from(":memory:"),
            max_connections: 5,
        };
        assert!(db.is_memory());
        assert_eq!(db.connection_string(), "sqlite::memory:");
    }

    #[test]
    fn test_default_weights_total_sixty() {
        assert_eq!(GradingConfig::default().total_weight(), 60.0);
    }

    #[test]
    fn test_validation_invalid_remote_url() {
        let mut config = AppConfig::default();
        config.remote.base_url = "ftp://invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_auto_sync_needs_remote() {
        let mut config = AppConfig::default();
        config.sync.auto_enabled = true;
        assert!(config.validate().is_err());

        config.remote.base_url = "https://api.example.org".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_interval_bounds() {
        let mut config = AppConfig::default();
        config.sync.interval_seconds = 5;
        assert!(config.validate().is_err());

        config.sync.interval_seconds = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_late_credit_range() {
        let mut config = AppConfig::default();
        config.grading.late_credit = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let content = r#"
            [database]
            path = "school.db"

            [remote]
            base_url = "https://api.example.org"
            api_key = "secret"

            [sync]
            auto_enabled = true
            interval_seconds = 120

            [school]
            school_id = "sch-1"
        "#;
        let config: AppConfig = toml::from_str(content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.remote.timeout_secs, 30);
        assert!(config.sync.push_on_change);
        assert_eq!(config.grading.exam_weight, 20.0);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("schoolhub-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");
        let mut config = AppConfig::default();
        config.school.school_id = "sch-42".to_string();
        config.save(&path).unwrap();

        match AppConfig::try_load(&path) {
            ConfigLoadResult::Loaded(loaded) => assert_eq!(loaded.school.school_id, "sch-42"),
            other => panic!("unexpected load result: {other:?}"),
        }
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_missing_config() {
        let path = std::env::temp_dir().join("schoolhub-definitely-missing.toml");
        assert!(matches!(AppConfig::try_load(&path), ConfigLoadResult::Missing));
    }
}
