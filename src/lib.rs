//! Drive Dataproc cluster create/delete operations to completion.
//!
//! ```no_run
//! use dataproc_manager::manager::ClusterManager;
//! use dataproc_manager::client::DEFAULT_ENDPOINT;
//!
//! # async fn demo() -> Result<(), dataproc_manager::cluster::ManagerError> {
//! let manager = ClusterManager::dataproc("my-project", "us-east1", DEFAULT_ENDPOINT, None);
//! let workers = vec!["w-0".to_string(), "w-1".to_string()];
//! let op = manager.create_cluster("etl", 2, &workers).await?;
//! println!("submitted {}", op.name);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod cluster;
pub mod config;
pub mod manager;

pub use client::{ClientError, ClusterService, DataprocClient};
pub use cluster::{ClusterState, ClusterStatus, ManagerError, Operation, PollConfig};
pub use manager::{ClusterManager, DeleteWait, ManagerConfig};
