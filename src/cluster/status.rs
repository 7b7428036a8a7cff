//! Response-side cluster types
//!
//! These mirror the subset of the Dataproc `Cluster` resource the manager
//! reads back: the cluster name and its lifecycle status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle state reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterState {
    Creating,
    Running,
    Error,
    ErrorDueToUpdate,
    Deleting,
    Updating,
    Stopping,
    Stopped,
    Starting,
    Repairing,
    /// Also used for any state string this crate does not recognise
    #[serde(other)]
    Unknown,
}

impl ClusterState {
    pub const ALL: [ClusterState; 11] = [
        ClusterState::Unknown,
        ClusterState::Creating,
        ClusterState::Running,
        ClusterState::Error,
        ClusterState::ErrorDueToUpdate,
        ClusterState::Deleting,
        ClusterState::Updating,
        ClusterState::Stopping,
        ClusterState::Stopped,
        ClusterState::Starting,
        ClusterState::Repairing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterState::Unknown => "UNKNOWN",
            ClusterState::Creating => "CREATING",
            ClusterState::Running => "RUNNING",
            ClusterState::Error => "ERROR",
            ClusterState::ErrorDueToUpdate => "ERROR_DUE_TO_UPDATE",
            ClusterState::Deleting => "DELETING",
            ClusterState::Updating => "UPDATING",
            ClusterState::Stopping => "STOPPING",
            ClusterState::Stopped => "STOPPED",
            ClusterState::Starting => "STARTING",
            ClusterState::Repairing => "REPAIRING",
        }
    }

    /// States the provider will not leave without operator action
    pub const FAILED: [ClusterState; 2] = [ClusterState::Error, ClusterState::ErrorDueToUpdate];

    pub fn is_failed(&self) -> bool {
        Self::FAILED.contains(self)
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusterState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        ClusterState::ALL
            .iter()
            .find(|state| state.as_str() == upper)
            .copied()
            .ok_or_else(|| format!("unknown cluster state: {}", s))
    }
}

/// The `status` block of a cluster resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub state: ClusterState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_start_time: Option<DateTime<Utc>>,
}

impl StatusInfo {
    pub fn new(state: ClusterState) -> Self {
        Self {
            state,
            detail: None,
            state_start_time: None,
        }
    }
}

/// A cluster as returned by list and get
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    pub cluster_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_uuid: Option<String>,

    pub status: StatusInfo,
}

impl ClusterStatus {
    pub fn new(name: impl Into<String>, state: ClusterState) -> Self {
        Self {
            cluster_name: name.into(),
            cluster_uuid: None,
            status: StatusInfo::new(state),
        }
    }

    pub fn state(&self) -> ClusterState {
        self.status.state
    }
}

/// One response of the paged list endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClustersPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clusters: Option<Vec<ClusterStatus>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl ListClustersPage {
    /// Continuation token, with the empty string treated as absent
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Long-running operation returned by create and delete
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}
