//! CLI module for dpctl
//!
//! Subcommands:
//! - `dpctl list` - List clusters (page by page)
//! - `dpctl get` - Show one cluster's status
//! - `dpctl create` - Create a cluster and wait until it is RUNNING
//! - `dpctl delete` - Delete a cluster and wait for teardown
//! - `dpctl wait` - Wait for a cluster to reach a state
//! - `dpctl config` - View or edit the config file

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::cluster::ClusterState;
use crate::manager::DeleteWait;

mod commands;
mod display;

pub use commands::*;
pub use display::*;

#[derive(Parser, Debug)]
#[command(name = "dpctl")]
#[command(about = "Create, list and delete Dataproc clusters")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: ~/.dataproc/config)
    #[arg(long, global = true, env = "DPCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// GCP project id (overrides DATAPROC_PROJECT and the config file)
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Region (overrides DATAPROC_REGION and the config file)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// API endpoint override
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Path to a .env file for loading DATAPROC_* variables
    #[arg(long, value_name = "FILE", global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List clusters in the project and region
    #[command(visible_alias = "ls")]
    List,

    /// Show the status of a cluster
    Get {
        /// Cluster name
        name: String,
    },

    /// Create a cluster and wait until it is RUNNING
    Create(CreateArgs),

    /// Delete a cluster and wait for teardown
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),

    /// Wait for a cluster to reach a state
    Wait(WaitArgs),

    /// View or edit the config file
    Config(ConfigArgs),
}

/// Arguments for the create command
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Cluster name
    pub name: String,

    /// Number of worker nodes [default: number of --worker-name values]
    #[arg(short = 'n', long)]
    pub workers: Option<u32>,

    /// Worker instance name (repeat once per worker)
    #[arg(short = 'w', long = "worker-name")]
    pub worker_names: Vec<String>,

    /// Give up waiting after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip local name/worker validation and let the API decide
    #[arg(long)]
    pub no_validate: bool,
}

impl CreateArgs {
    /// Worker count to request; follows the named workers unless `-n` is given
    pub fn worker_count(&self) -> u32 {
        self.workers
            .unwrap_or_else(|| u32::try_from(self.worker_names.len()).unwrap_or(u32::MAX))
    }
}

/// Arguments for the delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Cluster name
    pub name: String,

    /// What to wait for after the delete is accepted
    #[arg(long, value_enum)]
    pub until: Option<DeleteWait>,

    /// Give up waiting after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Arguments for the wait command
#[derive(Parser, Debug)]
pub struct WaitArgs {
    /// Cluster name
    pub name: String,

    /// Target state (e.g. RUNNING, DELETING)
    pub state: ClusterState,

    /// Poll interval in seconds
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Give up waiting after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective config
    View,

    /// Print the config file path
    Path,

    /// Set a key (e.g. project, region, poll.interval-secs, defaults.machine-type)
    Set {
        /// Dotted key
        key: String,

        /// New value
        value: String,
    },
}
