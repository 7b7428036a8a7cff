//! Command implementations for the CLI
//!
//! SBIO pattern: settings resolution is pure; the async helpers only talk
//! to the manager and return data for the caller to print.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::Cli;
use crate::config::{self, resolve_access_token, Config, ConfigError};
use crate::manager::ClusterManager;

/// Environment variable naming the project
pub const PROJECT_ENV: &str = "DATAPROC_PROJECT";

/// Environment variable naming the region
pub const REGION_ENV: &str = "DATAPROC_REGION";

/// Environment variable holding an access token
pub const ACCESS_TOKEN_ENV: &str = "DATAPROC_ACCESS_TOKEN";

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load env file {0}: {1}")]
    EnvFile(PathBuf, String),
}

/// Result type for commands
pub type CommandResult<T> = Result<T, CommandError>;

// ============================================================================
// Settings resolution (pure)
// ============================================================================

/// Layer settings: command-line flags win, then the environment, then the file
pub fn apply_overrides<F>(mut config: Config, cli: &Cli, env: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(project) = cli.project.clone().or_else(|| env(PROJECT_ENV)) {
        config.project = Some(project);
    }
    if let Some(region) = cli.region.clone().or_else(|| env(REGION_ENV)) {
        config.region = region;
    }
    if let Some(ref endpoint) = cli.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(token) = env(ACCESS_TOKEN_ENV) {
        config.access_token = Some(token);
    }
    config
}

/// Apply a per-command wait timeout
pub fn with_timeout(mut config: Config, timeout_secs: Option<u64>) -> Config {
    if timeout_secs.is_some() {
        config.poll.timeout_secs = timeout_secs;
    }
    config
}

// ============================================================================
// I/O boundary
// ============================================================================

/// Config file path in effect for this invocation
pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(config::default_config_path)
}

/// Load the .env file (if any), the config file, and layer the overrides
pub fn load_effective_config(cli: &Cli) -> CommandResult<Config> {
    if let Some(ref env_file) = cli.env_file {
        dotenvy::from_path(env_file)
            .map_err(|e| CommandError::EnvFile(env_file.clone(), e.to_string()))?;
    }
    let config = config::load_config_from(&config_path(cli))?;
    Ok(apply_overrides(config, cli, |key| std::env::var(key).ok()))
}

/// Build a manager against the configured endpoint
pub fn build_manager(config: &Config, cancel: CancellationToken) -> CommandResult<ClusterManager> {
    let project = config.project()?;
    let token = resolve_access_token(config)?;

    Ok(
        ClusterManager::dataproc(project, &config.region, config.endpoint(), token)
            .with_config(config.manager_config())
            .with_cancellation(cancel),
    )
}

/// Set a key in the config file and write it back
pub fn config_set(path: &Path, key: &str, value: &str) -> CommandResult<Config> {
    let mut config = config::load_config_from(path)?;
    config.set(key, value)?;
    config::save_config_to(&config, path)?;
    Ok(config)
}
