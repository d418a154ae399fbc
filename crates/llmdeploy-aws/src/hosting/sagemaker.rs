//! SageMaker-backed hosting session.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_sagemaker::types::{
    ContainerDefinition, EndpointStatus as SdkEndpointStatus,
    InferenceComponentComputeResourceRequirements, InferenceComponentRuntimeConfig,
    InferenceComponentSpecification, ProductionVariant, ProductionVariantInstanceType,
};
use aws_sdk_sagemaker::Client;
use llmdeploy_settings::DeployCredentials;
use tracing::debug;

use super::{
    is_not_found, EndpointConfigSpec, EndpointStatus, HostingConnector, HostingSession,
    InferenceComponentSpec, ModelSpec, VariantSpec,
};
use crate::error::{CloudError, CloudResult};
use crate::identity::SETTINGS_PROVIDER;

/// Opens [`SageMakerSession`]s from settings credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct SageMakerConnector;

#[async_trait]
impl HostingConnector for SageMakerConnector {
    async fn connect(
        &self,
        credentials: &DeployCredentials,
    ) -> CloudResult<Arc<dyn HostingSession>> {
        let keys = &credentials.keys;
        let provider = Credentials::new(
            keys.access_key_id.clone(),
            keys.secret_access_key.expose().to_owned(),
            None,
            None,
            SETTINGS_PROVIDER,
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(credentials.region.clone()))
            .credentials_provider(provider)
            .load()
            .await;

        debug!(region = %credentials.region, "SageMaker session opened");
        Ok(Arc::new(SageMakerSession::new(
            Client::new(&sdk_config),
            credentials.region.clone(),
        )))
    }
}

/// Hosting session backed by the SageMaker API.
#[derive(Debug, Clone)]
pub struct SageMakerSession {
    client: Client,
    region: String,
}

impl SageMakerSession {
    /// Wrap an existing SageMaker client.
    #[must_use]
    pub const fn new(client: Client, region: String) -> Self {
        Self { client, region }
    }
}

fn to_i32(field: &str, value: u32) -> CloudResult<i32> {
    i32::try_from(value)
        .map_err(|_| CloudError::InvalidRequest(format!("{field} out of range: {value}")))
}

#[allow(clippy::cast_precision_loss)]
fn to_f32(value: u32) -> f32 {
    value as f32
}

fn production_variant(variant: &VariantSpec) -> ProductionVariant {
    ProductionVariant::builder()
        .variant_name(&variant.name)
        .set_model_name(variant.model_name.clone())
        .instance_type(ProductionVariantInstanceType::from(
            variant.instance_type.as_str(),
        ))
        .initial_instance_count(variant.initial_instance_count)
        .container_startup_health_check_timeout_in_seconds(
            variant.startup_health_check_timeout_secs,
        )
        .build()
}

fn component_parts(
    spec: &InferenceComponentSpec,
) -> CloudResult<(InferenceComponentSpecification, InferenceComponentRuntimeConfig)> {
    let resources = &spec.resources;
    let requirements = InferenceComponentComputeResourceRequirements::builder()
        .number_of_cpu_cores_required(to_f32(resources.num_cpus))
        .number_of_accelerator_devices_required(to_f32(resources.num_accelerators))
        .min_memory_required_in_mb(to_i32("memory_mb", resources.memory_mb)?)
        .build();

    let specification = InferenceComponentSpecification::builder()
        .model_name(&spec.model_name)
        .compute_resource_requirements(requirements)
        .build();

    let runtime = InferenceComponentRuntimeConfig::builder()
        .copy_count(to_i32("copies", resources.copies)?)
        .build();

    Ok((specification, runtime))
}

#[async_trait]
impl HostingSession for SageMakerSession {
    fn region(&self) -> &str {
        &self.region
    }

    async fn describe_endpoint(&self, name: &str) -> CloudResult<Option<EndpointStatus>> {
        let output = match self.client.describe_endpoint().endpoint_name(name).send().await {
            Ok(output) => output,
            Err(e) => {
                let err = CloudError::from_sdk("DescribeEndpoint", e);
                return if is_not_found(&err) { Ok(None) } else { Err(err) };
            }
        };

        let status = match output.endpoint_status() {
            Some(SdkEndpointStatus::Creating) => EndpointStatus::Creating,
            Some(SdkEndpointStatus::Updating) => EndpointStatus::Updating,
            Some(SdkEndpointStatus::InService) => EndpointStatus::InService,
            Some(SdkEndpointStatus::Failed) => EndpointStatus::Failed {
                reason: output.failure_reason().unwrap_or("unknown").to_owned(),
            },
            Some(other) => EndpointStatus::Other(other.as_str().to_owned()),
            None => EndpointStatus::Other("Unknown".to_owned()),
        };

        Ok(Some(status))
    }

    async fn endpoint_config_exists(&self, name: &str) -> CloudResult<bool> {
        match self
            .client
            .describe_endpoint_config()
            .endpoint_config_name(name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = CloudError::from_sdk("DescribeEndpointConfig", e);
                if is_not_found(&err) {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn create_model(&self, spec: &ModelSpec) -> CloudResult<()> {
        let container = ContainerDefinition::builder()
            .image(&spec.image_uri)
            .set_environment(Some(spec.environment.to_environment()))
            .build();

        self.client
            .create_model()
            .model_name(&spec.name)
            .execution_role_arn(&spec.execution_role_arn)
            .primary_container(container)
            .send()
            .await
            .map_err(|e| CloudError::from_sdk("CreateModel", e))?;
        Ok(())
    }

    async fn create_endpoint_config(&self, spec: &EndpointConfigSpec) -> CloudResult<()> {
        let variant = production_variant(&spec.variant);

        self.client
            .create_endpoint_config()
            .endpoint_config_name(&spec.name)
            .production_variants(variant)
            .set_execution_role_arn(spec.execution_role_arn.clone())
            .send()
            .await
            .map_err(|e| CloudError::from_sdk("CreateEndpointConfig", e))?;
        Ok(())
    }

    async fn create_endpoint(&self, endpoint_name: &str, config_name: &str) -> CloudResult<()> {
        self.client
            .create_endpoint()
            .endpoint_name(endpoint_name)
            .endpoint_config_name(config_name)
            .send()
            .await
            .map_err(|e| CloudError::from_sdk("CreateEndpoint", e))?;
        Ok(())
    }

    async fn create_inference_component(&self, spec: &InferenceComponentSpec) -> CloudResult<()> {
        let (specification, runtime) = component_parts(spec)?;

        self.client
            .create_inference_component()
            .inference_component_name(&spec.name)
            .endpoint_name(&spec.endpoint_name)
            .variant_name(&spec.variant_name)
            .specification(specification)
            .runtime_config(runtime)
            .send()
            .await
            .map_err(|e| CloudError::from_sdk("CreateInferenceComponent", e))?;
        Ok(())
    }
}
