//! Common test utilities for llmdeploy-aws integration tests.

pub mod fixtures;

use std::time::Duration;

use llmdeploy_aws::hosting::{MockHostingConnector, MockHostingSession};
use llmdeploy_aws::{DeployTimings, EndpointRequest, EndpointType};
use llmdeploy_settings::Settings;

/// Polling fast enough for tests that wait on an endpoint.
pub fn fast_timings() -> DeployTimings {
    DeployTimings {
        poll_interval: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
    }
}

/// Deploy request built from `settings` with fast polling.
pub fn endpoint_request(settings: &Settings, endpoint_type: EndpointType) -> EndpointRequest {
    EndpointRequest {
        timings: fast_timings(),
        ..EndpointRequest::from_settings(settings, endpoint_type)
    }
}

/// Connector over a fresh mock session whose endpoints come up after two polls.
pub fn connector() -> MockHostingConnector {
    MockHostingConnector::new(MockHostingSession::default().with_polls_until_ready(2))
}
