//! Deployment of a serving container onto a SageMaker endpoint.

use tracing::info;
use ulid::Ulid;

use crate::error::CloudResult;
use crate::hosting::{
    EndpointConfigSpec, InferenceComponentSpec, ModelSpec, VariantSpec, DEFAULT_VARIANT,
    STARTUP_HEALTH_CHECK_TIMEOUT_SECS,
};
use crate::resources::{DeployTimings, ResourceManager};
use crate::strategy::EndpointType;
use crate::types::{DeployConfig, ResourceConfig};

/// Longest resource name SageMaker accepts.
const MAX_NAME_LEN: usize = 63;

/// Everything needed to deploy one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    /// Role SageMaker assumes to run the container.
    pub role_arn: String,
    /// Serving container image.
    pub image_uri: String,
    /// Container environment.
    pub config: DeployConfig,
    /// Inference component resources.
    pub resources: ResourceConfig,
    /// Endpoint name.
    pub endpoint_name: String,
    /// Endpoint configuration name.
    pub endpoint_config_name: String,
    /// Instance type hosting the endpoint.
    pub instance_type: String,
    /// Endpoint topology.
    pub endpoint_type: EndpointType,
}

/// Names of the resources a deployment created or reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedResources {
    /// Model registered for this deployment. `None` when a model-based
    /// deployment reused an existing endpoint configuration, which keeps
    /// serving the model it was created with.
    pub model_name: Option<String>,
    /// Endpoint configuration in use.
    pub endpoint_config_name: String,
    /// Endpoint in use.
    pub endpoint_name: String,
    /// Inference component, for component-based endpoints.
    pub inference_component_name: Option<String>,
}

/// Turns a [`DeploymentRequest`] into SageMaker resources.
pub struct DeploymentService {
    resource_manager: ResourceManager,
    timings: DeployTimings,
}

impl DeploymentService {
    /// Create a new deployment service.
    #[must_use]
    pub const fn new(resource_manager: ResourceManager, timings: DeployTimings) -> Self {
        Self {
            resource_manager,
            timings,
        }
    }

    /// Deploy a model.
    ///
    /// 1. Register a model with the image, environment and role, unless a
    ///    model-based deployment reuses an existing endpoint configuration
    /// 2. Create the endpoint configuration unless it already exists
    /// 3. Create the endpoint
    /// 4. For component-based endpoints, wait for `InService` and place an
    ///    inference component with the requested resources
    pub async fn deploy(&self, request: &DeploymentRequest) -> CloudResult<DeployedResources> {
        let config_exists = self
            .resource_manager
            .endpoint_config_exists(&request.endpoint_config_name)
            .await?;

        if config_exists {
            info!(
                endpoint_config = %request.endpoint_config_name,
                "endpoint configuration exists; reusing it"
            );
        } else {
            info!(
                endpoint_config = %request.endpoint_config_name,
                "endpoint configuration does not exist; creating it"
            );
        }

        let (model_name, inference_component_name) = match request.endpoint_type {
            EndpointType::ModelBased if config_exists => {
                info!(
                    endpoint_config = %request.endpoint_config_name,
                    "model-based endpoint reuses the configured model; no model registered"
                );
                self.create_endpoint(request).await?;
                (None, None)
            }
            EndpointType::ModelBased => {
                let model_name = self.create_model(request).await?;
                self.create_endpoint_config(request, Some(&model_name))
                    .await?;
                self.create_endpoint(request).await?;
                (Some(model_name), None)
            }
            EndpointType::InferenceComponentBased => {
                let model_name = self.create_model(request).await?;
                if !config_exists {
                    self.create_endpoint_config(request, None).await?;
                }
                if self
                    .resource_manager
                    .endpoint_exists(&request.endpoint_name)
                    .await?
                {
                    info!(endpoint = %request.endpoint_name, "endpoint exists; adding component");
                } else {
                    self.create_endpoint(request).await?;
                }

                self.resource_manager
                    .wait_for_endpoint(&request.endpoint_name, &self.timings)
                    .await?;

                let component = self.create_inference_component(request, &model_name).await?;
                (Some(model_name), Some(component))
            }
        };

        info!(
            endpoint = %request.endpoint_name,
            model = model_name.as_deref().unwrap_or("(from existing configuration)"),
            "model deployed to endpoint"
        );

        Ok(DeployedResources {
            model_name,
            endpoint_config_name: request.endpoint_config_name.clone(),
            endpoint_name: request.endpoint_name.clone(),
            inference_component_name,
        })
    }

    async fn create_model(&self, request: &DeploymentRequest) -> CloudResult<String> {
        let spec = ModelSpec {
            name: resource_name(&request.endpoint_name, "model"),
            image_uri: request.image_uri.clone(),
            environment: request.config.clone(),
            execution_role_arn: request.role_arn.clone(),
        };

        info!(model = %spec.name, image = %spec.image_uri, "registering model");
        self.resource_manager.session().create_model(&spec).await?;
        Ok(spec.name)
    }

    async fn create_endpoint_config(
        &self,
        request: &DeploymentRequest,
        model_name: Option<&str>,
    ) -> CloudResult<()> {
        let spec = EndpointConfigSpec {
            name: request.endpoint_config_name.clone(),
            variant: VariantSpec {
                name: DEFAULT_VARIANT.to_owned(),
                model_name: model_name.map(str::to_owned),
                instance_type: request.instance_type.clone(),
                initial_instance_count: 1,
                startup_health_check_timeout_secs: STARTUP_HEALTH_CHECK_TIMEOUT_SECS,
            },
            execution_role_arn: request
                .endpoint_type
                .uses_inference_components()
                .then(|| request.role_arn.clone()),
        };

        self.resource_manager
            .session()
            .create_endpoint_config(&spec)
            .await
    }

    async fn create_endpoint(&self, request: &DeploymentRequest) -> CloudResult<()> {
        info!(
            endpoint = %request.endpoint_name,
            instance_type = %request.instance_type,
            "creating endpoint"
        );
        self.resource_manager
            .session()
            .create_endpoint(&request.endpoint_name, &request.endpoint_config_name)
            .await
    }

    async fn create_inference_component(
        &self,
        request: &DeploymentRequest,
        model_name: &str,
    ) -> CloudResult<String> {
        let spec = InferenceComponentSpec {
            name: resource_name(&request.endpoint_name, "component"),
            endpoint_name: request.endpoint_name.clone(),
            variant_name: DEFAULT_VARIANT.to_owned(),
            model_name: model_name.to_owned(),
            resources: request.resources,
        };

        info!(
            component = %spec.name,
            copies = spec.resources.copies,
            "creating inference component"
        );
        self.resource_manager
            .session()
            .create_inference_component(&spec)
            .await?;
        Ok(spec.name)
    }
}

/// Unique SageMaker resource name derived from `base`.
fn resource_name(base: &str, kind: &str) -> String {
    let suffix = Ulid::new().to_string().to_lowercase();
    let budget = MAX_NAME_LEN.saturating_sub(kind.len() + suffix.len() + 2);
    let base: String = base.chars().take(budget).collect();
    let base = base.trim_end_matches('-');
    format!("{base}-{kind}-{suffix}")
}
