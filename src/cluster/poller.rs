//! Wait for a cluster to reach a state
//!
//! The provider accepts create and delete immediately and then moves the
//! cluster through intermediate states. The poller re-fetches the status
//! on a fixed interval until the expected state is observed.

use std::time::Duration;

use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::error::ManagerError;
use super::status::{ClusterState, ClusterStatus};
use crate::client::{ClientError, ClusterService};

/// Interval between status polls in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// How a wait is paced and when it gives up
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Sleep between two status fetches
    pub interval: Duration,
    /// Overall limit for the wait, remote calls included
    pub timeout: Option<Duration>,
    /// Maximum number of status fetches
    pub max_polls: Option<u32>,
    /// Observing one of these (other than the target) fails the wait
    pub fail_states: Vec<ClusterState>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            timeout: None,
            max_polls: None,
            fail_states: ClusterState::FAILED.to_vec(),
        }
    }
}

impl PollConfig {
    /// Poll forever, ignoring failure states
    pub fn unbounded() -> Self {
        Self {
            fail_states: vec![],
            ..Default::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_polls(mut self, polls: u32) -> Self {
        self.max_polls = Some(polls);
        self
    }

    pub fn with_fail_states(mut self, states: Vec<ClusterState>) -> Self {
        self.fail_states = states;
        self
    }
}

/// A single status fetch and its interpretation
#[derive(Debug, Clone, Copy, PartialEq)]
enum Observation {
    Reached,
    Pending,
}

async fn until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// Shared loop: fetch, observe, sleep. Every exit other than `Reached` is an error.
async fn poll_loop<F>(
    service: &dyn ClusterService,
    project: &str,
    region: &str,
    cluster_name: &str,
    config: &PollConfig,
    cancel: &CancellationToken,
    mut observe: F,
) -> Result<bool, ManagerError>
where
    F: FnMut(Result<ClusterStatus, ClientError>) -> Result<Observation, ManagerError>,
{
    let started = Instant::now();
    let deadline = config.timeout.map(|t| started + t);
    let cancelled = || ManagerError::Cancelled(cluster_name.to_string());
    let timed_out = || ManagerError::Timeout {
        cluster: cluster_name.to_string(),
        waited: started.elapsed(),
    };

    let mut polls = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            _ = until_deadline(deadline) => return Err(timed_out()),
            fetched = service.get(project, region, cluster_name) => fetched,
        };
        polls += 1;

        if observe(fetched)? == Observation::Reached {
            debug!(cluster = %cluster_name, polls, "Wait finished");
            return Ok(true);
        }

        if config.max_polls.is_some_and(|max| polls >= max) {
            return Err(ManagerError::PollLimitExceeded {
                cluster: cluster_name.to_string(),
                polls,
            });
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            _ = until_deadline(deadline) => return Err(timed_out()),
            _ = sleep(config.interval) => {}
        }
    }
}

/// Poll until the cluster reports `target`.
///
/// Returns `Ok(true)` once the state matches; never returns `Ok(false)`.
/// A failed status fetch aborts the wait without further polls.
pub async fn wait_for_state(
    service: &dyn ClusterService,
    project: &str,
    region: &str,
    cluster_name: &str,
    target: ClusterState,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<bool, ManagerError> {
    poll_loop(
        service,
        project,
        region,
        cluster_name,
        config,
        cancel,
        |fetched| {
            let state = fetched?.state();
            info!(cluster = %cluster_name, state = %state, "Polled cluster state");

            if state == target {
                Ok(Observation::Reached)
            } else if config.fail_states.contains(&state) {
                Err(ManagerError::UnexpectedState {
                    cluster: cluster_name.to_string(),
                    state,
                    expected: target.to_string(),
                })
            } else {
                Ok(Observation::Pending)
            }
        },
    )
    .await
}

/// Poll until the provider no longer knows the cluster
pub async fn wait_for_absence(
    service: &dyn ClusterService,
    project: &str,
    region: &str,
    cluster_name: &str,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<bool, ManagerError> {
    poll_loop(
        service,
        project,
        region,
        cluster_name,
        config,
        cancel,
        |fetched| match fetched {
            Err(ClientError::NotFound(_)) => {
                info!(cluster = %cluster_name, "Cluster no longer exists");
                Ok(Observation::Reached)
            }
            Err(e) => Err(e.into()),
            Ok(status) => {
                let state = status.state();
                info!(cluster = %cluster_name, state = %state, "Polled cluster state");
                if config.fail_states.contains(&state) {
                    Err(ManagerError::UnexpectedState {
                        cluster: cluster_name.to_string(),
                        state,
                        expected: "absent".to_string(),
                    })
                } else {
                    Ok(Observation::Pending)
                }
            }
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockClusterService, StatusReply};
    use ClusterState::*;

    fn fast() -> PollConfig {
        PollConfig::default().with_interval(Duration::from_millis(1))
    }

    #[test]
    fn test_default_config() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(5));
        assert!(config.timeout.is_none());
        assert!(config.max_polls.is_none());
        assert!(config.fail_states.contains(&Error));
        assert!(config.fail_states.iter().all(ClusterState::is_failed));
    }

    #[test]
    fn test_unbounded_config() {
        let config = PollConfig::unbounded();
        assert_eq!(config.interval, Duration::from_secs(5));
        assert!(config.fail_states.is_empty());
        assert!(config.timeout.is_none());
    }

    #[tokio::test]
    async fn test_polls_until_target() {
        let service = MockClusterService::new().with_states(&[Creating, Creating, Running]);

        let reached = wait_for_state(
            &service,
            "p",
            "r",
            "c1",
            Running,
            &fast(),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(reached, Ok(true));
        assert_eq!(service.get_calls(), 3);
    }

    #[tokio::test]
    async fn test_immediate_match_polls_once() {
        let service = MockClusterService::new().with_states(&[Deleting]);

        let reached = wait_for_state(
            &service,
            "p",
            "r",
            "c1",
            Deleting,
            &fast(),
            &CancellationToken::new(),
        )
        .await;

        tokio_test::assert_ok!(reached);
        assert_eq!(service.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_stops_polling() {
        let service = MockClusterService::new().with_replies(vec![
            StatusReply::State(Creating),
            StatusReply::Fail(ClientError::Http("timeout".to_string())),
            StatusReply::State(Running),
        ]);

        let result = wait_for_state(
            &service,
            "p",
            "r",
            "c1",
            Running,
            &fast(),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(
            result,
            Err(ManagerError::Client(ClientError::Http("timeout".to_string())))
        );
        assert_eq!(service.get_calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_state_fails_fast() {
        let service = MockClusterService::new().with_states(&[Creating, Error, Running]);

        let result = wait_for_state(
            &service,
            "p",
            "r",
            "c1",
            Running,
            &fast(),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(
            result,
            Err(ManagerError::UnexpectedState { state: Error, .. })
        ));
        assert_eq!(service.get_calls(), 2);
    }

    #[tokio::test]
    async fn test_unbounded_polls_through_error() {
        let service = MockClusterService::new().with_states(&[Creating, Error, Running]);
        let config = PollConfig::unbounded().with_interval(Duration::from_millis(1));

        let reached = wait_for_state(
            &service,
            "p",
            "r",
            "c1",
            Running,
            &config,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(reached, Ok(true));
        assert_eq!(service.get_calls(), 3);
    }

    #[tokio::test]
    async fn test_target_may_be_a_failure_state() {
        let service = MockClusterService::new().with_states(&[Creating, Error]);

        let reached = wait_for_state(
            &service,
            "p",
            "r",
            "c1",
            Error,
            &fast(),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(reached, Ok(true));
    }

    #[tokio::test]
    async fn test_max_polls() {
        let service = MockClusterService::new().with_states(&[Creating]);
        let config = fast().with_max_polls(4);

        let result = wait_for_state(
            &service,
            "p",
            "r",
            "c1",
            Running,
            &config,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(
            result,
            Err(ManagerError::PollLimitExceeded {
                cluster: "c1".to_string(),
                polls: 4
            })
        );
        assert_eq!(service.get_calls(), 4);
    }

    #[tokio::test]
    async fn test_timeout() {
        let service = MockClusterService::new().with_states(&[Creating]);
        let config = PollConfig::default()
            .with_interval(Duration::from_millis(5))
            .with_timeout(Duration::from_millis(40));

        let result = wait_for_state(
            &service,
            "p",
            "r",
            "c1",
            Running,
            &config,
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(ManagerError::Timeout { .. })));
        assert!(service.get_calls() >= 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let service = MockClusterService::new().with_states(&[Running]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result =
            wait_for_state(&service, "p", "r", "c1", Running, &fast(), &cancel).await;

        assert_eq!(result, Err(ManagerError::Cancelled("c1".to_string())));
        assert_eq!(service.get_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_while_waiting() {
        let service = MockClusterService::new().with_states(&[Creating]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let config = PollConfig::default().with_interval(Duration::from_millis(5));
        let result = wait_for_state(&service, "p", "r", "c1", Running, &config, &cancel).await;

        assert_eq!(result, Err(ManagerError::Cancelled("c1".to_string())));
    }

    #[tokio::test]
    async fn test_wait_for_absence() {
        let service = MockClusterService::new().with_replies(vec![
            StatusReply::State(Deleting),
            StatusReply::State(Deleting),
            StatusReply::Fail(ClientError::NotFound("c1".to_string())),
        ]);

        let gone = wait_for_absence(&service, "p", "r", "c1", &fast(), &CancellationToken::new())
            .await;

        assert_eq!(gone, Ok(true));
        assert_eq!(service.get_calls(), 3);
    }

    #[tokio::test]
    async fn test_wait_for_absence_propagates_other_errors() {
        let service = MockClusterService::new().with_replies(vec![StatusReply::Fail(
            ClientError::Api {
                status: 500,
                message: "internal".to_string(),
            },
        )]);

        let result =
            wait_for_absence(&service, "p", "r", "c1", &fast(), &CancellationToken::new()).await;

        tokio_test::assert_err!(&result);
        assert!(!result.unwrap_err().is_not_found());
        assert_eq!(service.get_calls(), 1);
    }
}
