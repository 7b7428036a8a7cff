//! Lifecycle orchestration
//!
//! [`ClusterManager`] ties the building blocks in [`crate::cluster`] to one
//! project and region: create and delete submit a single mutating request
//! and then wait for the cluster to settle; list walks every page.
//!
//! The manager holds no cluster state. Every call is a fresh remote query.
//! If a wait fails after the mutation was accepted, the remote cluster is
//! left wherever the provider takes it; the caller sees only the error.

use std::sync::Arc;

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument, Span};

use crate::client::{ClientError, ClusterService, DataprocClient};
use crate::cluster::{
    self, build_create_request, validate_create_request, ClusterDefaults, ClusterDescriptor,
    ClusterState, ClusterStatus, ManagerError, Operation, PollConfig,
};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east1";

/// What `delete_cluster` waits for after the delete is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeleteWait {
    /// The cluster reports DELETING (teardown has started)
    #[default]
    Deleting,
    /// The provider no longer knows the cluster
    Absent,
}

/// Tunables for a manager
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    pub defaults: ClusterDefaults,
    pub poll: PollConfig,
    pub delete_wait: DeleteWait,
    /// Reject malformed names and worker lists before submitting
    pub validate_requests: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            defaults: ClusterDefaults::default(),
            poll: PollConfig::default(),
            delete_wait: DeleteWait::default(),
            validate_requests: true,
        }
    }
}

pub struct ClusterManager {
    project: String,
    region: String,
    service: Arc<dyn ClusterService>,
    config: ManagerConfig,
    cancel: CancellationToken,
    span: Span,
}

impl ClusterManager {
    pub fn new(
        project: impl Into<String>,
        region: impl Into<String>,
        service: Arc<dyn ClusterService>,
    ) -> Self {
        let project = project.into();
        let region = region.into();
        let span = info_span!("cluster_manager", project = %project, region = %region);

        Self {
            project,
            region,
            service,
            config: ManagerConfig::default(),
            cancel: CancellationToken::new(),
            span,
        }
    }

    /// Manager backed by the Dataproc REST API
    pub fn dataproc(
        project: impl Into<String>,
        region: impl Into<String>,
        endpoint: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        let client = DataprocClient::new(endpoint, access_token);
        Self::new(project, region, Arc::new(client))
    }

    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Cancelling `token` aborts any wait in progress on this manager
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Every non-empty page of the listing, in order
    pub async fn list_clusters(&self) -> Result<Vec<Vec<ClusterStatus>>, ManagerError> {
        let pages = cluster::list_all(self.service.as_ref(), &self.project, &self.region)
            .instrument(self.span.clone())
            .await?;
        Ok(pages)
    }

    /// Lazy form of [`list_clusters`](Self::list_clusters)
    pub fn pages(&self) -> impl Stream<Item = Result<Vec<ClusterStatus>, ClientError>> + Send + '_ {
        cluster::cluster_pages(self.service.as_ref(), &self.project, &self.region)
    }

    pub async fn get_cluster(&self, name: &str) -> Result<ClusterStatus, ManagerError> {
        let status = self
            .service
            .get(&self.project, &self.region, name)
            .instrument(self.span.clone())
            .await?;
        Ok(status)
    }

    pub fn build_create_request(
        &self,
        name: &str,
        worker_count: u32,
        worker_names: &[String],
    ) -> ClusterDescriptor {
        build_create_request(
            &self.project,
            &self.region,
            &self.config.defaults,
            name,
            worker_count,
            worker_names,
        )
    }

    // ========================================================================
    // Waits
    // ========================================================================

    pub async fn wait_for_state(
        &self,
        name: &str,
        target: ClusterState,
    ) -> Result<bool, ManagerError> {
        self.wait_for_state_with(name, target, &self.config.poll).await
    }

    pub async fn wait_for_state_with(
        &self,
        name: &str,
        target: ClusterState,
        poll: &PollConfig,
    ) -> Result<bool, ManagerError> {
        cluster::wait_for_state(
            self.service.as_ref(),
            &self.project,
            &self.region,
            name,
            target,
            poll,
            &self.cancel,
        )
        .instrument(self.span.clone())
        .await
    }

    pub async fn wait_for_absence(&self, name: &str) -> Result<bool, ManagerError> {
        cluster::wait_for_absence(
            self.service.as_ref(),
            &self.project,
            &self.region,
            name,
            &self.config.poll,
            &self.cancel,
        )
        .instrument(self.span.clone())
        .await
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a cluster and wait until it is RUNNING.
    ///
    /// Returns the create call's own response, not a re-fetch.
    pub async fn create_cluster(
        &self,
        name: &str,
        worker_count: u32,
        worker_names: &[String],
    ) -> Result<Operation, ManagerError> {
        if self.config.validate_requests {
            validate_create_request(name, worker_count, worker_names)?;
        }

        let body = self.build_create_request(name, worker_count, worker_names);

        async {
            info!(cluster = %name, workers = worker_count, "Submitting cluster create");
            let operation = self
                .service
                .create(&self.project, &self.region, &body)
                .await?;
            info!(cluster = %name, operation = %operation.name, "Create accepted");

            self.wait_for_state(name, ClusterState::Running).await?;
            Ok::<_, ManagerError>(operation)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Delete a cluster and wait according to [`DeleteWait`].
    ///
    /// Returns the delete call's own response.
    pub async fn delete_cluster(&self, name: &str) -> Result<Operation, ManagerError> {
        async {
            info!(cluster = %name, "Submitting cluster delete");
            let operation = self.service.delete(&self.project, &self.region, name).await?;
            info!(cluster = %name, operation = %operation.name, "Delete accepted");

            match self.config.delete_wait {
                DeleteWait::Deleting => self.wait_for_state(name, ClusterState::Deleting).await?,
                DeleteWait::Absent => self.wait_for_absence(name).await?,
            };
            Ok::<_, ManagerError>(operation)
        }
        .instrument(self.span.clone())
        .await
    }
}
