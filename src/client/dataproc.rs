use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::cluster::{ClusterDescriptor, ClusterStatus, ListClustersPage, Operation};

/// Public Dataproc REST endpoint
pub const DEFAULT_ENDPOINT: &str = "https://dataproc.googleapis.com";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Parse(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Cluster '{0}' not found")]
    NotFound(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

// ============================================================================
// SBIO: Trait for abstraction (allows mocking in tests)
// ============================================================================

/// The four remote operations the manager drives
#[async_trait]
pub trait ClusterService: Send + Sync {
    async fn list(
        &self,
        project: &str,
        region: &str,
        page_token: Option<&str>,
    ) -> Result<ListClustersPage, ClientError>;

    async fn get(
        &self,
        project: &str,
        region: &str,
        cluster_name: &str,
    ) -> Result<ClusterStatus, ClientError>;

    async fn create(
        &self,
        project: &str,
        region: &str,
        body: &ClusterDescriptor,
    ) -> Result<Operation, ClientError>;

    async fn delete(
        &self,
        project: &str,
        region: &str,
        cluster_name: &str,
    ) -> Result<Operation, ClientError>;
}

// ============================================================================
// SBIO: I/O implementation (real HTTP client)
// ============================================================================

#[derive(Clone)]
pub struct DataprocClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl DataprocClient {
    pub fn new(endpoint: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            access_token,
        }
    }

    /// Use a preconfigured transport (proxies, timeouts, test servers)
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn clusters_url(&self, project: &str, region: &str) -> String {
        format!(
            "{}/v1/projects/{}/regions/{}/clusters",
            self.endpoint.trim_end_matches('/'),
            project,
            region
        )
    }

    /// URL of one cluster; the name is percent-encoded as a single path segment
    fn cluster_url(
        &self,
        project: &str,
        region: &str,
        cluster_name: &str,
    ) -> Result<Url, ClientError> {
        if matches!(cluster_name, "" | "." | "..") {
            return Err(ClientError::InvalidUrl(format!(
                "'{}' is not a cluster name",
                cluster_name
            )));
        }

        let mut url = Url::parse(&self.clusters_url(project, region))
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidUrl(format!("endpoint '{}' cannot be a base", self.endpoint))
            })?
            .push(cluster_name);
        Ok(url)
    }

    fn build_request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut req = self.client.request(method, url);
        if let Some(ref token) = self.access_token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ClientError> {
        req.send().await.map_err(|e| ClientError::Http(e.to_string()))
    }
}

/// Turn a response into `T`, mapping 404 to `NotFound` when a cluster is named
async fn decode<T: DeserializeOwned>(
    response: Response,
    cluster_name: Option<&str>,
) -> Result<T, ClientError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        if let Some(name) = cluster_name {
            return Err(ClientError::NotFound(name.to_string()));
        }
    }

    if !status.is_success() {
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: text,
        });
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::Parse(e.to_string()))
}

#[async_trait]
impl ClusterService for DataprocClient {
    async fn list(
        &self,
        project: &str,
        region: &str,
        page_token: Option<&str>,
    ) -> Result<ListClustersPage, ClientError> {
        let url = self.clusters_url(project, region);
        let mut req = self.build_request(Method::GET, &url);
        if let Some(token) = page_token {
            req = req.query(&[("pageToken", token)]);
        }

        debug!(url = %url, page_token = ?page_token, "Listing clusters");
        decode(self.send(req).await?, None).await
    }

    async fn get(
        &self,
        project: &str,
        region: &str,
        cluster_name: &str,
    ) -> Result<ClusterStatus, ClientError> {
        let url = self.cluster_url(project, region, cluster_name)?;
        let req = self.build_request(Method::GET, url.as_str());
        decode(self.send(req).await?, Some(cluster_name)).await
    }

    async fn create(
        &self,
        project: &str,
        region: &str,
        body: &ClusterDescriptor,
    ) -> Result<Operation, ClientError> {
        let url = self.clusters_url(project, region);
        let request_id = Uuid::new_v4().to_string();
        let req = self
            .build_request(Method::POST, &url)
            .query(&[("requestId", request_id.as_str())])
            .json(body);

        debug!(cluster = %body.cluster_name, request_id = %request_id, "Submitting create");
        decode(self.send(req).await?, None).await
    }

    async fn delete(
        &self,
        project: &str,
        region: &str,
        cluster_name: &str,
    ) -> Result<Operation, ClientError> {
        let url = self.cluster_url(project, region, cluster_name)?;
        let request_id = Uuid::new_v4().to_string();
        let req = self
            .build_request(Method::DELETE, url.as_str())
            .query(&[("requestId", request_id.as_str())]);

        debug!(cluster = %cluster_name, request_id = %request_id, "Submitting delete");
        decode(self.send(req).await?, Some(cluster_name)).await
    }
}

// ============================================================================
// SBIO: Mock implementation for testing (no I/O)
// ============================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterState;

    #[test]
    fn test_clusters_url() {
        let client = DataprocClient::new("https://dataproc.example.com/", None);
        assert_eq!(
            client.clusters_url("proj", "us-east1"),
            "https://dataproc.example.com/v1/projects/proj/regions/us-east1/clusters"
        );
    }

    #[test]
    fn test_cluster_url_encodes_name() {
        let client = DataprocClient::new("https://dataproc.example.com", None);

        let url = client.cluster_url("proj", "us-east1", "c1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://dataproc.example.com/v1/projects/proj/regions/us-east1/clusters/c1"
        );

        let url = client.cluster_url("proj", "us-east1", "x?pageToken=1#").unwrap();
        assert_eq!(
            url.path(),
            "/v1/projects/proj/regions/us-east1/clusters/x%3FpageToken=1%23"
        );
        assert_eq!(url.query(), None);

        let url = client.cluster_url("proj", "us-east1", "a/b").unwrap();
        assert!(url.path().ends_with("/clusters/a%2Fb"));
    }

    #[test]
    fn test_cluster_url_rejects_dot_segments() {
        let client = DataprocClient::new("https://dataproc.example.com", None);
        for name in ["", ".", ".."] {
            assert!(matches!(
                client.cluster_url("proj", "us-east1", name),
                Err(ClientError::InvalidUrl(_))
            ));
        }
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::Api {
            status: 403,
            message: "permission denied".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 403 - permission denied");
        assert_eq!(
            ClientError::NotFound("c1".to_string()).to_string(),
            "Cluster 'c1' not found"
        );
    }

    #[tokio::test]
    async fn test_mock_replays_then_repeats_last_state() {
        let service = mock::MockClusterService::new()
            .with_states(&[ClusterState::Creating, ClusterState::Running]);

        let first = service.get("p", "r", "c1").await.unwrap();
        let second = service.get("p", "r", "c1").await.unwrap();
        let third = service.get("p", "r", "c1").await.unwrap();

        assert_eq!(first.state(), ClusterState::Creating);
        assert_eq!(second.state(), ClusterState::Running);
        assert_eq!(third.state(), ClusterState::Running);
        assert_eq!(service.get_calls(), 3);
    }
}
