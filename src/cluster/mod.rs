//! # Cluster lifecycle building blocks
//!
//! Everything here is independent of how the provider is reached; the
//! remote side is a [`ClusterService`](crate::client::ClusterService).
//!
//! - [`descriptor`]: build the create request body from a few parameters
//! - [`pagination`]: walk the paged list endpoint
//! - [`poller`]: wait until a cluster reaches a state (or disappears)
//! - [`status`]: cluster state, status and operation types
//!
//! ```text
//!   create ──► submit ──► poll(RUNNING)  ──► submission result
//!   delete ──► submit ──► poll(DELETING) ──► submission result
//!   list   ──► page ──► page ──► ... (until no token)
//! ```

pub mod descriptor;
pub mod error;
pub mod pagination;
pub mod poller;
pub mod status;

pub use descriptor::{
    build_create_request, validate_create_request, ClusterConfig, ClusterDefaults,
    ClusterDescriptor, DiskConfig, GceClusterConfig, InstanceGroupConfig, ValidationError,
};
pub use error::ManagerError;
pub use pagination::{cluster_pages, list_all};
pub use poller::{wait_for_absence, wait_for_state, PollConfig, DEFAULT_POLL_INTERVAL_SECS};
pub use status::{ClusterState, ClusterStatus, ListClustersPage, Operation, StatusInfo};
