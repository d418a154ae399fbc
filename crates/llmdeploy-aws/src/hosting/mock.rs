//! In-memory hosting provider for testing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use llmdeploy_settings::DeployCredentials;

use super::{
    EndpointConfigSpec, EndpointStatus, HostingConnector, HostingSession, InferenceComponentSpec,
    ModelSpec,
};
use crate::error::{CloudError, CloudResult};
use crate::image::{huggingface_llm_image_uri, ImageQuery};

/// A call recorded by [`MockHostingSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostingCall {
    /// Image resolution.
    ResolveImage(ImageQuery),
    /// `DescribeEndpoint`
    DescribeEndpoint(String),
    /// `DescribeEndpointConfig`
    DescribeEndpointConfig(String),
    /// `CreateModel`
    CreateModel(ModelSpec),
    /// `CreateEndpointConfig`
    CreateEndpointConfig(EndpointConfigSpec),
    /// `CreateEndpoint`
    CreateEndpoint {
        /// Endpoint name.
        endpoint_name: String,
        /// Endpoint configuration name.
        config_name: String,
    },
    /// `CreateInferenceComponent`
    CreateInferenceComponent(InferenceComponentSpec),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<HostingCall>,
    models: HashSet<String>,
    configs: HashSet<String>,
    endpoints: HashMap<String, MockEndpoint>,
}

#[derive(Debug)]
struct MockEndpoint {
    status: EndpointStatus,
    polls_left: u32,
}

/// Mock hosting session that mimics SageMaker's resource bookkeeping.
///
/// New endpoints report `Creating` for a configurable number of describe
/// calls before turning `InService` (or `Failed`).
#[derive(Debug)]
pub struct MockHostingSession {
    region: String,
    state: Mutex<State>,
    image_uri: Option<String>,
    failing_operation: Option<&'static str>,
    polls_until_ready: u32,
    endpoint_failure: Option<String>,
}

impl Default for MockHostingSession {
    fn default() -> Self {
        Self::new("eu-central-1")
    }
}

impl MockHostingSession {
    /// Creates an empty session in `region`.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            state: Mutex::new(State::default()),
            image_uri: None,
            failing_operation: None,
            polls_until_ready: 0,
            endpoint_failure: None,
        }
    }

    /// Return this URI from image resolution instead of the real lookup.
    #[must_use]
    pub fn with_image_uri(mut self, uri: impl Into<String>) -> Self {
        self.image_uri = Some(uri.into());
        self
    }

    /// Seed an existing endpoint configuration.
    #[must_use]
    pub fn with_endpoint_config(self, name: &str) -> Self {
        self.lock().configs.insert(name.to_owned());
        self
    }

    /// Seed an existing endpoint in the given status.
    #[must_use]
    pub fn with_endpoint(self, name: &str, status: EndpointStatus) -> Self {
        self.lock().endpoints.insert(
            name.to_owned(),
            MockEndpoint {
                status,
                polls_left: 0,
            },
        );
        self
    }

    /// Reject the named operation (e.g. `"CreateEndpoint"`) with a provider error.
    #[must_use]
    pub const fn failing(mut self, operation: &'static str) -> Self {
        self.failing_operation = Some(operation);
        self
    }

    /// Number of describe calls a new endpoint stays in `Creating`.
    #[must_use]
    pub const fn with_polls_until_ready(mut self, polls: u32) -> Self {
        self.polls_until_ready = polls;
        self
    }

    /// New endpoints end up `Failed` with this reason.
    #[must_use]
    pub fn with_endpoint_failure(mut self, reason: impl Into<String>) -> Self {
        self.endpoint_failure = Some(reason.into());
        self
    }

    /// All calls received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<HostingCall> {
        self.lock().calls.clone()
    }

    /// Models registered during the session.
    #[must_use]
    pub fn created_models(&self) -> Vec<ModelSpec> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostingCall::CreateModel(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check(&self, operation: &'static str) -> CloudResult<()> {
        if self.failing_operation == Some(operation) {
            return Err(CloudError::provider(
                operation,
                "ResourceLimitExceeded",
                format!("{operation} rejected by mock"),
            ));
        }
        Ok(())
    }
}

fn already_exists(operation: &'static str, kind: &str, name: &str) -> CloudError {
    CloudError::provider(
        operation,
        "ValidationException",
        format!("Cannot create already existing {kind} \"{name}\"."),
    )
}

#[async_trait]
impl HostingSession for MockHostingSession {
    fn region(&self) -> &str {
        &self.region
    }

    fn resolve_image(&self, query: &ImageQuery) -> CloudResult<String> {
        self.lock().calls.push(HostingCall::ResolveImage(query.clone()));
        match &self.image_uri {
            Some(uri) => Ok(uri.clone()),
            None => huggingface_llm_image_uri(&self.region, query),
        }
    }

    async fn describe_endpoint(&self, name: &str) -> CloudResult<Option<EndpointStatus>> {
        let mut state = self.lock();
        state
            .calls
            .push(HostingCall::DescribeEndpoint(name.to_owned()));
        self.check("DescribeEndpoint")?;

        let Some(endpoint) = state.endpoints.get_mut(name) else {
            return Ok(None);
        };

        if endpoint.status == EndpointStatus::Creating {
            if endpoint.polls_left == 0 {
                endpoint.status = match &self.endpoint_failure {
                    Some(reason) => EndpointStatus::Failed {
                        reason: reason.clone(),
                    },
                    None => EndpointStatus::InService,
                };
            } else {
                endpoint.polls_left -= 1;
            }
        }

        Ok(Some(endpoint.status.clone()))
    }

    async fn endpoint_config_exists(&self, name: &str) -> CloudResult<bool> {
        let mut state = self.lock();
        state
            .calls
            .push(HostingCall::DescribeEndpointConfig(name.to_owned()));
        self.check("DescribeEndpointConfig")?;
        Ok(state.configs.contains(name))
    }

    async fn create_model(&self, spec: &ModelSpec) -> CloudResult<()> {
        let mut state = self.lock();
        state.calls.push(HostingCall::CreateModel(spec.clone()));
        self.check("CreateModel")?;

        if !state.models.insert(spec.name.clone()) {
            return Err(already_exists("CreateModel", "model", &spec.name));
        }
        Ok(())
    }

    async fn create_endpoint_config(&self, spec: &EndpointConfigSpec) -> CloudResult<()> {
        let mut state = self.lock();
        state
            .calls
            .push(HostingCall::CreateEndpointConfig(spec.clone()));
        self.check("CreateEndpointConfig")?;

        if !state.configs.insert(spec.name.clone()) {
            return Err(already_exists(
                "CreateEndpointConfig",
                "endpoint configuration",
                &spec.name,
            ));
        }
        Ok(())
    }

    async fn create_endpoint(&self, endpoint_name: &str, config_name: &str) -> CloudResult<()> {
        let mut state = self.lock();
        state.calls.push(HostingCall::CreateEndpoint {
            endpoint_name: endpoint_name.to_owned(),
            config_name: config_name.to_owned(),
        });
        self.check("CreateEndpoint")?;

        if !state.configs.contains(config_name) {
            return Err(CloudError::provider(
                "CreateEndpoint",
                "ValidationException",
                format!("Could not find endpoint configuration \"{config_name}\"."),
            ));
        }
        if state.endpoints.contains_key(endpoint_name) {
            return Err(already_exists("CreateEndpoint", "endpoint", endpoint_name));
        }

        state.endpoints.insert(
            endpoint_name.to_owned(),
            MockEndpoint {
                status: EndpointStatus::Creating,
                polls_left: self.polls_until_ready,
            },
        );
        Ok(())
    }

    async fn create_inference_component(&self, spec: &InferenceComponentSpec) -> CloudResult<()> {
        let mut state = self.lock();
        state
            .calls
            .push(HostingCall::CreateInferenceComponent(spec.clone()));
        self.check("CreateInferenceComponent")?;

        match state.endpoints.get(&spec.endpoint_name) {
            Some(endpoint) if endpoint.status == EndpointStatus::InService => Ok(()),
            Some(endpoint) => Err(CloudError::provider(
                "CreateInferenceComponent",
                "ValidationException",
                format!(
                    "Endpoint \"{}\" is in status {}; expected InService.",
                    spec.endpoint_name, endpoint.status
                ),
            )),
            None => Err(CloudError::provider(
                "CreateInferenceComponent",
                "ValidationException",
                format!("Could not find endpoint \"{}\".", spec.endpoint_name),
            )),
        }
    }
}

/// Mock connector handing out one shared [`MockHostingSession`].
#[derive(Debug)]
pub struct MockHostingConnector {
    session: Arc<MockHostingSession>,
    connects: Mutex<Vec<DeployCredentials>>,
}

impl Default for MockHostingConnector {
    fn default() -> Self {
        Self::new(MockHostingSession::default())
    }
}

impl MockHostingConnector {
    /// Creates a connector around `session`.
    #[must_use]
    pub fn new(session: MockHostingSession) -> Self {
        Self {
            session: Arc::new(session),
            connects: Mutex::new(Vec::new()),
        }
    }

    /// The session every `connect` returns.
    #[must_use]
    pub fn session(&self) -> &MockHostingSession {
        &self.session
    }

    /// Credentials passed to each `connect` call.
    #[must_use]
    pub fn connects(&self) -> Vec<DeployCredentials> {
        self.connects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl HostingConnector for MockHostingConnector {
    async fn connect(
        &self,
        credentials: &DeployCredentials,
    ) -> CloudResult<Arc<dyn HostingSession>> {
        self.connects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(credentials.clone());
        let session: Arc<dyn HostingSession> = self.session.clone();
        Ok(session)
    }
}
