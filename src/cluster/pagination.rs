//! Paged listing
//!
//! The list endpoint returns clusters in batches with an opaque
//! continuation token. [`cluster_pages`] walks the tokens lazily;
//! [`list_all`] drains it into one result.

use futures::stream::{self, Stream, TryStreamExt};
use tracing::trace;

use super::status::ClusterStatus;
use crate::client::{ClientError, ClusterService};

#[derive(Debug, Clone)]
enum PageCursor {
    First,
    Token(String),
    Exhausted,
}

/// Lazily walk the list endpoint, one item per non-empty batch.
///
/// Responses without clusters produce no item but their token is still
/// followed. The stream ends after the first response without a token and
/// yields the error of the first failing call, then ends.
pub fn cluster_pages<'a>(
    service: &'a dyn ClusterService,
    project: &'a str,
    region: &'a str,
) -> impl Stream<Item = Result<Vec<ClusterStatus>, ClientError>> + Send + 'a {
    stream::try_unfold(PageCursor::First, move |mut cursor| async move {
        loop {
            let token = match cursor {
                PageCursor::First => None,
                PageCursor::Token(token) => Some(token),
                PageCursor::Exhausted => return Ok(None),
            };

            let page = service.list(project, region, token.as_deref()).await?;
            cursor = match page.continuation() {
                Some(next) => PageCursor::Token(next.to_string()),
                None => PageCursor::Exhausted,
            };

            match page.clusters {
                Some(batch) if !batch.is_empty() => {
                    trace!(clusters = batch.len(), "Received cluster page");
                    return Ok(Some((batch, cursor)));
                }
                _ => trace!("Skipping empty cluster page"),
            }
        }
    })
}

/// Collect every page; any failure discards what was collected so far
pub async fn list_all(
    service: &dyn ClusterService,
    project: &str,
    region: &str,
) -> Result<Vec<Vec<ClusterStatus>>, ClientError> {
    cluster_pages(service, project, region).try_collect().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockClusterService;
    use crate::cluster::{ClusterState, ListClustersPage};
    use futures::StreamExt;

    fn page(names: &[&str], token: Option<&str>) -> Result<ListClustersPage, ClientError> {
        Ok(ListClustersPage {
            clusters: if names.is_empty() {
                None
            } else {
                Some(
                    names
                        .iter()
                        .map(|n| ClusterStatus::new(*n, ClusterState::Running))
                        .collect(),
                )
            },
            next_page_token: token.map(str::to_string),
        })
    }

    fn page_names(pages: &[Vec<ClusterStatus>]) -> Vec<Vec<String>> {
        pages
            .iter()
            .map(|p| p.iter().map(|c| c.cluster_name.clone()).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_single_page() {
        let service = MockClusterService::new().with_pages(vec![page(&["a", "b"], None)]);

        let pages = list_all(&service, "p", "r").await.unwrap();
        assert_eq!(page_names(&pages), vec![vec!["a", "b"]]);
        assert_eq!(service.list_calls(), 1);
        assert_eq!(service.tokens_seen(), vec![None]);
    }

    #[tokio::test]
    async fn test_k_pages_preserved_in_order() {
        let service = MockClusterService::new().with_pages(vec![
            page(&["a"], Some("t1")),
            page(&["b", "c"], Some("t2")),
            page(&["d"], None),
        ]);

        let pages = list_all(&service, "p", "r").await.unwrap();
        assert_eq!(
            page_names(&pages),
            vec![vec!["a"], vec!["b", "c"], vec!["d"]]
        );
        assert_eq!(
            service.tokens_seen(),
            vec![None, Some("t1".to_string()), Some("t2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_batch_skipped_but_token_followed() {
        let service = MockClusterService::new().with_pages(vec![
            page(&[], Some("t1")),
            page(&["a"], Some("t2")),
            page(&[], None),
        ]);

        let pages = list_all(&service, "p", "r").await.unwrap();
        assert_eq!(page_names(&pages), vec![vec!["a"]]);
        assert_eq!(service.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_no_clusters_at_all() {
        let service = MockClusterService::new().with_pages(vec![page(&[], None)]);
        let pages = list_all(&service, "p", "r").await.unwrap();
        assert!(pages.is_empty());
    }

    #[tokio::test]
    async fn test_error_discards_collected_pages() {
        let service = MockClusterService::new().with_pages(vec![
            page(&["a"], Some("t1")),
            Err(ClientError::Http("connection reset".to_string())),
            page(&["b"], None),
        ]);

        let result = list_all(&service, "p", "r").await;
        assert_eq!(
            result,
            Err(ClientError::Http("connection reset".to_string()))
        );
        assert_eq!(service.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_stream_keeps_pages_before_error() {
        let service = MockClusterService::new().with_pages(vec![
            page(&["a"], Some("t1")),
            Err(ClientError::Http("boom".to_string())),
        ]);

        let items: Vec<_> = cluster_pages(&service, "p", "r").collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_stream_stops_early() {
        let service = MockClusterService::new().with_pages(vec![
            page(&["a"], Some("t1")),
            page(&["b"], Some("t2")),
            page(&["c"], None),
        ]);

        let first: Vec<_> = cluster_pages(&service, "p", "r").take(1).collect().await;
        assert_eq!(first.len(), 1);
        assert_eq!(service.list_calls(), 1);
    }
}
