//! Typestate for an endpoint deployment.
//!
//! Deployment is fire-and-forget from the caller's side: once SageMaker
//! accepts the requests the endpoint is tracked by AWS, not by this process.
//! So the only transition is `NotDeployed -> DeployRequested`.
//!
//! ```ignore
//! let endpoint = Endpoint::<NotDeployed>::new(request);
//! let requested = endpoint.deploy_requested(resources);
//! // requested.deploy_requested(..) would not compile
//! ```

use crate::service::{DeployedResources, DeploymentRequest};

/// Marker trait for endpoint states.
pub trait EndpointState: private::Sealed + Send + Sync {
    /// Get the state name for log lines.
    fn name() -> &'static str;
}

mod private {
    pub trait Sealed {}
}

/// Nothing has been sent to the provider yet.
#[derive(Debug, Clone, Copy)]
pub struct NotDeployed;

/// The provider accepted the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequested {
    resources: DeployedResources,
}

impl private::Sealed for NotDeployed {}
impl private::Sealed for DeployRequested {}

impl EndpointState for NotDeployed {
    fn name() -> &'static str {
        "not_deployed"
    }
}

impl EndpointState for DeployRequested {
    fn name() -> &'static str {
        "deploy_requested"
    }
}

/// An endpoint deployment with its state encoded in the type.
#[derive(Debug, Clone)]
pub struct Endpoint<S: EndpointState> {
    request: DeploymentRequest,
    state: S,
}

impl<S: EndpointState> Endpoint<S> {
    /// The request this endpoint was built from.
    #[must_use]
    pub const fn request(&self) -> &DeploymentRequest {
        &self.request
    }

    /// Name of the current state.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        S::name()
    }
}

impl Endpoint<NotDeployed> {
    /// Create an endpoint that has not been deployed.
    #[must_use]
    pub const fn new(request: DeploymentRequest) -> Self {
        Self {
            request,
            state: NotDeployed,
        }
    }

    /// Record that the provider accepted the deployment.
    #[must_use]
    pub fn deploy_requested(self, resources: DeployedResources) -> Endpoint<DeployRequested> {
        Endpoint {
            request: self.request,
            state: DeployRequested { resources },
        }
    }
}

impl Endpoint<DeployRequested> {
    /// Resources created or reused by the deployment.
    #[must_use]
    pub const fn resources(&self) -> &DeployedResources {
        &self.state.resources
    }
}
