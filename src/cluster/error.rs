use std::time::Duration;

use thiserror::Error;

use super::descriptor::ValidationError;
use super::status::ClusterState;
use crate::client::ClientError;

/// Errors surfaced by lifecycle operations and state waits
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ManagerError {
    #[error("Remote call failed: {0}")]
    Client(#[from] ClientError),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Timed out after {waited:?} waiting for cluster '{cluster}'")]
    Timeout { cluster: String, waited: Duration },

    #[error("Cluster '{cluster}' did not settle within {polls} polls")]
    PollLimitExceeded { cluster: String, polls: u32 },

    #[error("Cluster '{cluster}' entered {state} while waiting for {expected}")]
    UnexpectedState {
        cluster: String,
        state: ClusterState,
        expected: String,
    },

    #[error("Wait for cluster '{0}' was cancelled")]
    Cancelled(String),
}

impl ManagerError {
    /// Whether the provider reported the cluster as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, ManagerError::Client(ClientError::NotFound(_)))
    }
}
