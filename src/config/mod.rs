//! Config file handling
//!
//! The config lives at `~/.dataproc/config` (YAML) and supplies the
//! project, region, endpoint, credentials and the tunables a
//! [`ClusterManager`](crate::manager::ClusterManager) is built with.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::DEFAULT_ENDPOINT;
use crate::cluster::{ClusterDefaults, ClusterState, PollConfig, DEFAULT_POLL_INTERVAL_SECS};
use crate::manager::{DeleteWait, ManagerConfig, DEFAULT_REGION};

/// Default config file location: ~/.dataproc/config
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dataproc")
        .join("config")
}

/// Errors that can occur during config operations
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Failed to write config: {0}")]
    WriteError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("No project configured (set `project` in the config or DATAPROC_PROJECT)")]
    MissingProject,

    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    #[error("Failed to expand access token: {0}")]
    TokenExpansion(String),
}

/// Poll pacing as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PollSettings {
    pub interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_polls: Option<u32>,
    /// Stop waiting when the cluster reports ERROR
    pub fail_on_error: bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            timeout_secs: None,
            max_polls: None,
            fail_on_error: true,
        }
    }
}

impl PollSettings {
    pub fn to_poll_config(&self) -> PollConfig {
        let mut config = PollConfig::unbounded().with_interval(Duration::from_secs(self.interval_secs));
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(polls) = self.max_polls {
            config = config.with_max_polls(polls);
        }
        if self.fail_on_error {
            config = config.with_fail_states(ClusterState::FAILED.to_vec());
        }
        config
    }
}

/// The complete configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    pub region: String,

    /// API endpoint override (tests, private endpoints)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// OAuth access token; `${VAR}` references are expanded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// File holding the access token; `~` is expanded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_file: Option<String>,

    pub delete_wait: DeleteWait,

    pub validate_requests: bool,

    pub defaults: ClusterDefaults,

    pub poll: PollSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: None,
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            access_token: None,
            access_token_file: None,
            delete_wait: DeleteWait::default(),
            validate_requests: true,
            defaults: ClusterDefaults::default(),
            poll: PollSettings::default(),
        }
    }
}

// ============================================================================
// SBIO: Pure business logic (no I/O)
// ============================================================================

/// Parse config from YAML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Serialize config to YAML string
pub fn serialize_config(config: &Config) -> Result<String, ConfigError> {
    serde_yaml::to_string(config).map_err(|e| ConfigError::WriteError(e.to_string()))
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl Config {
    pub fn project(&self) -> Result<&str, ConfigError> {
        self.project.as_deref().ok_or(ConfigError::MissingProject)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            defaults: self.defaults.clone(),
            poll: self.poll.to_poll_config(),
            delete_wait: self.delete_wait,
            validate_requests: self.validate_requests,
        }
    }

    /// Set a single dotted key, as used by `dpctl config set`
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "project" => self.project = Some(value.to_string()),
            "region" => self.region = value.to_string(),
            "endpoint" => self.endpoint = Some(value.to_string()),
            "access-token" => self.access_token = Some(value.to_string()),
            "access-token-file" => self.access_token_file = Some(value.to_string()),
            "delete-wait" => {
                self.delete_wait = match value {
                    "deleting" => DeleteWait::Deleting,
                    "absent" => DeleteWait::Absent,
                    _ => {
                        return Err(ConfigError::InvalidValue {
                            key: key.to_string(),
                            value: value.to_string(),
                        })
                    }
                }
            }
            "validate-requests" => self.validate_requests = parse_value(key, value)?,
            "poll.interval-secs" => self.poll.interval_secs = parse_value(key, value)?,
            "poll.timeout-secs" => self.poll.timeout_secs = Some(parse_value(key, value)?),
            "poll.max-polls" => self.poll.max_polls = Some(parse_value(key, value)?),
            "poll.fail-on-error" => self.poll.fail_on_error = parse_value(key, value)?,
            "defaults.machine-type" => self.defaults.machine_type = value.to_string(),
            "defaults.boot-disk-size-gb" => {
                self.defaults.boot_disk_size_gb = parse_value(key, value)?
            }
            "defaults.num-local-ssds" => self.defaults.num_local_ssds = parse_value(key, value)?,
            "defaults.master-instance-name" => {
                self.defaults.master_instance_name = value.to_string()
            }
            "defaults.zone-suffix" => self.defaults.zone_suffix = value.to_string(),
            "defaults.subnetwork" => self.defaults.subnetwork = value.to_string(),
            "defaults.config-bucket" => self.defaults.config_bucket = value.to_string(),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Expand `${VAR}` references in the inline token
    pub fn expanded_access_token(&self) -> Result<Option<String>, ConfigError> {
        self.access_token
            .as_deref()
            .map(|raw| {
                shellexpand::env(raw)
                    .map(|s| s.into_owned())
                    .map_err(|e| ConfigError::TokenExpansion(e.to_string()))
            })
            .transpose()
    }
}

// ============================================================================
// I/O boundary functions
// ============================================================================

/// Resolve the access token: inline value first, then the token file
pub fn resolve_access_token(config: &Config) -> Result<Option<String>, ConfigError> {
    if let Some(token) = config.expanded_access_token()? {
        return Ok(Some(token));
    }
    match config.access_token_file.as_deref() {
        Some(path) => {
            let expanded = shellexpand::tilde(path);
            let token = std::fs::read_to_string(Path::new(expanded.as_ref()))?;
            Ok(Some(token.trim().to_string()))
        }
        None => Ok(None),
    }
}

/// Load config from a specific path; a missing file yields defaults
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Save config to a specific path
pub fn save_config_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serialize_config(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
