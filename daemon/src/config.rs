//! Daemon configuration with TOML file support.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use groundtruth_ledger::LedgerConfig;
use groundtruth_types::{Roster, ValidationError};
use groundtruth_utils::LogFormat;
use groundtruth_verification::ConsensusPolicy;

/// Configuration for a Groundtruth daemon.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; CLI flags
/// and environment variables are applied on top in `main`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Data directory for ledger storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Address the HTTP API binds to.
    #[serde(default = "default_http_bind")]
    pub http_bind: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Directory uploaded media is written to.
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    /// Prefix of the URLs handed out for uploaded media.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub consensus: ConsensusPolicy,

    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Admin and flagged user ids.
    #[serde(default)]
    pub roster: Roster,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid roster: {0}")]
    Roster(#[from] ValidationError),
}

// Serde defaults

fn default_data_dir() -> PathBuf {
    PathBuf::from("./groundtruth_data")
}

fn default_map_size() -> usize {
    groundtruth_store_lmdb::environment::DEFAULT_MAP_SIZE
}

fn default_http_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("./groundtruth_data/media")
}

fn default_public_base_url() -> String {
    "http://localhost:8080/media".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.roster.validate()?;
        Ok(config)
    }

    /// `host:port` for the HTTP listener.
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_bind, self.http_port)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            http_bind: default_http_bind(),
            http_port: default_http_port(),
            media_dir: default_media_dir(),
            public_base_url: default_public_base_url(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            consensus: ConsensusPolicy::default(),
            ledger: LedgerConfig::default(),
            roster: Roster::default(),
        }
    }
}
