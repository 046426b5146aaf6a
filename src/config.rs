//! Configuration management for callshield
//!
//! Settings are stored as JSON in `~/.callshield/config.json` with a schema
//! version and sequential migrations. The configuration is loaded explicitly
//! and passed to the components that need it.

use crate::audio::vad::{SupportedSampleRate, VadAggressiveness};
use crate::scam::RiskThresholds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current config schema version
const CURRENT_VERSION: u32 = 1;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema version for migrations
    pub version: u32,
    /// Speech segmentation settings
    pub vad: VadSettings,
    /// Audio file ingest settings
    pub ingest: IngestConfig,
    /// Transcription settings
    pub transcription: TranscriptionConfig,
    /// Risk scoring settings
    pub risk: RiskConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            vad: VadSettings::default(),
            ingest: IngestConfig::default(),
            transcription: TranscriptionConfig::default(),
            risk: RiskConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Speech segmentation configuration
///
/// Frame length and padding window are fixed by the engine; only the
/// classifier aggressiveness is tunable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VadSettings {
    pub aggressiveness: VadAggressiveness,
}

/// Audio ingest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Rate uploads are converted to before analysis (default: 16000)
    pub target_sample_rate: u32,
    /// Largest accepted upload in megabytes
    pub max_file_size_mb: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16_000,
            max_file_size_mb: 500,
        }
    }
}

impl IngestConfig {
    /// Size limit in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

/// Transcription engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Path to a ggml whisper model; transcription is skipped when unset
    pub model_path: Option<PathBuf>,
    /// Transcription language code
    pub language: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            language: "en".to_string(),
        }
    }
}

/// Risk scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Label boundaries on the 0-100 scale
    pub thresholds: RiskThresholds,
    /// Weight of the spoof probability when blending with keyword risk
    pub spoof_weight: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            thresholds: RiskThresholds::default(),
            spoof_weight: 0.5,
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write logs to ~/.callshield/logs/callshield.log
    pub log_to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { log_to_file: true }
    }
}

/// Errors raised while loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown config version: {0}")]
    UnknownVersion(u32),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        SupportedSampleRate::from_hz(self.ingest.target_sample_rate)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let t = self.risk.thresholds;
        if t.suspicious >= t.scam || t.scam > 100 {
            return Err(ConfigError::Invalid(format!(
                "risk thresholds must satisfy suspicious < scam <= 100 (got {} and {})",
                t.suspicious, t.scam
            )));
        }

        if !(0.0..=1.0).contains(&self.risk.spoof_weight) {
            return Err(ConfigError::Invalid(format!(
                "spoof_weight must be between 0 and 1 (got {})",
                self.risk.spoof_weight
            )));
        }

        if self.ingest.max_file_size_mb == 0 {
            return Err(ConfigError::Invalid(
                "max_file_size_mb must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Get the path to the config directory (~/.callshield)
pub fn get_config_dir() -> PathBuf {
    home_dir_or_fallback().join(".callshield")
}

/// Get the path to the config file (~/.callshield/config.json)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.json")
}

/// Get the home directory, falling back to /tmp if unavailable
fn home_dir_or_fallback() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        tracing::error!("Could not determine home directory, using /tmp");
        PathBuf::from("/tmp")
    })
}

/// Load configuration from `path`
///
/// A missing file yields the defaults. Older schema versions are migrated and
/// written back.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::info!("Config file not found at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&contents)?;

    let original_version = config.version;
    let config = migrate_config(config)?;
    if config.version != original_version {
        tracing::info!(
            "Migrated config from version {} to {}",
            original_version,
            config.version
        );
        save_config_to(path, &config)?;
    }

    config.validate()?;
    Ok(config)
}

/// Save configuration to `path`, creating parent directories
pub fn save_config_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }

    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents)?;

    tracing::info!("Config saved to {}", path.display());
    Ok(())
}

/// Load configuration from the default location
///
/// A missing file yields the defaults; an unreadable or invalid one is an
/// error rather than being silently replaced.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&get_config_path())
}

/// Migrate configuration from older schema versions
fn migrate_config(mut config: Config) -> Result<Config, ConfigError> {
    while config.version < CURRENT_VERSION {
        config = apply_migration(config)?;
    }
    if config.version > CURRENT_VERSION {
        return Err(ConfigError::UnknownVersion(config.version));
    }
    Ok(config)
}

/// Apply a single migration step
fn apply_migration(config: Config) -> Result<Config, ConfigError> {
    match config.version {
        // Version 0 predates the ingest section; serde defaults fill it in
        0 => {
            let mut migrated = config;
            migrated.version = 1;
            Ok(migrated)
        }
        v => Err(ConfigError::UnknownVersion(v)),
    }
}
