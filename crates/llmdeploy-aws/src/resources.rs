//! Existence checks and status polling for hosting resources.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::error::{CloudError, CloudResult};
use crate::hosting::{EndpointStatus, HostingSession};

/// Polling behaviour while waiting for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployTimings {
    /// Delay between status checks.
    pub poll_interval: Duration,
    /// Give up after this long.
    pub timeout: Duration,
}

impl Default for DeployTimings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Queries the provider for resources the deployment depends on.
#[derive(Clone)]
pub struct ResourceManager {
    session: Arc<dyn HostingSession>,
}

impl ResourceManager {
    /// Create a resource manager over an open session.
    pub fn new(session: Arc<dyn HostingSession>) -> Self {
        Self { session }
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &dyn HostingSession {
        self.session.as_ref()
    }

    /// Returns true if the endpoint exists, whatever its status.
    pub async fn endpoint_exists(&self, endpoint_name: &str) -> CloudResult<bool> {
        Ok(self.session.describe_endpoint(endpoint_name).await?.is_some())
    }

    /// Returns true if the endpoint configuration exists.
    pub async fn endpoint_config_exists(&self, endpoint_config_name: &str) -> CloudResult<bool> {
        self.session
            .endpoint_config_exists(endpoint_config_name)
            .await
    }

    /// Poll until the endpoint is `InService`.
    ///
    /// Fails fast if the endpoint reports `Failed` or disappears.
    pub async fn wait_for_endpoint(
        &self,
        endpoint_name: &str,
        timings: &DeployTimings,
    ) -> CloudResult<()> {
        let started = Instant::now();

        loop {
            match self.session.describe_endpoint(endpoint_name).await? {
                Some(EndpointStatus::InService) => return Ok(()),
                Some(EndpointStatus::Failed { reason }) => {
                    return Err(CloudError::EndpointFailed {
                        endpoint: endpoint_name.to_owned(),
                        reason,
                    });
                }
                None => {
                    return Err(CloudError::EndpointFailed {
                        endpoint: endpoint_name.to_owned(),
                        reason: "endpoint no longer exists".to_owned(),
                    });
                }
                Some(status) => {
                    debug!(endpoint = %endpoint_name, status = %status, "waiting for endpoint");
                }
            }

            let waited = started.elapsed();
            if waited >= timings.timeout {
                return Err(CloudError::Timeout {
                    endpoint: endpoint_name.to_owned(),
                    waited,
                });
            }

            tokio::time::sleep(timings.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::MockHostingSession;

    fn fast() -> DeployTimings {
        DeployTimings {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn missing_resources_do_not_exist() {
        let manager = ResourceManager::new(Arc::new(MockHostingSession::default()));
        assert!(!manager.endpoint_exists("twin").await.unwrap());
        assert!(!manager.endpoint_config_exists("twin").await.unwrap());
    }

    #[tokio::test]
    async fn seeded_resources_exist() {
        let session = MockHostingSession::default()
            .with_endpoint_config("twin")
            .with_endpoint("twin", EndpointStatus::InService);
        let manager = ResourceManager::new(Arc::new(session));

        assert!(manager.endpoint_exists("twin").await.unwrap());
        assert!(manager.endpoint_config_exists("twin").await.unwrap());
    }

    #[tokio::test]
    async fn wait_returns_once_in_service() {
        let session = MockHostingSession::default()
            .with_endpoint_config("twin")
            .with_polls_until_ready(3);
        let manager = ResourceManager::new(Arc::new(session));
        manager.session().create_endpoint("twin", "twin").await.unwrap();

        manager.wait_for_endpoint("twin", &fast()).await.unwrap();
    }

    #[tokio::test]
    async fn wait_reports_failure_reason() {
        let session = MockHostingSession::default()
            .with_endpoint_config("twin")
            .with_endpoint_failure("CUDA out of memory");
        let manager = ResourceManager::new(Arc::new(session));
        manager.session().create_endpoint("twin", "twin").await.unwrap();

        let err = manager.wait_for_endpoint("twin", &fast()).await.unwrap_err();
        assert!(matches!(
            err,
            CloudError::EndpointFailed { ref reason, .. } if reason == "CUDA out of memory"
        ));
    }

    #[tokio::test]
    async fn wait_times_out() {
        let session = MockHostingSession::default()
            .with_endpoint("twin", EndpointStatus::Updating);
        let manager = ResourceManager::new(Arc::new(session));
        let timings = DeployTimings {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_millis(5),
        };

        let err = manager.wait_for_endpoint("twin", &timings).await.unwrap_err();
        assert!(matches!(err, CloudError::Timeout { .. }));
    }
}
