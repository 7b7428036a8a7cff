pub mod dataproc;

pub use dataproc::{ClientError, ClusterService, DataprocClient, DEFAULT_ENDPOINT};

#[cfg(test)]
pub use dataproc::mock;
