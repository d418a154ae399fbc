//! Entry point for deploying a Hugging Face model to SageMaker.

use llmdeploy_settings::Settings;
use tracing::info;

use crate::error::CloudResult;
use crate::hosting::HostingConnector;
use crate::image::ImageQuery;
use crate::resources::{DeployTimings, ResourceManager};
use crate::service::{DeploymentRequest, DeploymentService};
use crate::state::{DeployRequested, Endpoint};
use crate::strategy::{EndpointType, SagemakerHuggingfaceStrategy};
use crate::types::{DeployConfig, ResourceConfig};

/// Caller-supplied inputs of a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRequest {
    /// Container environment, forwarded unmodified.
    pub config: DeployConfig,
    /// Inference component resources, forwarded unmodified.
    pub resources: ResourceConfig,
    /// Endpoint topology.
    pub endpoint_type: EndpointType,
    /// Status polling for component-based endpoints.
    pub timings: DeployTimings,
}

impl EndpointRequest {
    /// Request built from settings, with the TGI environment and resources.
    #[must_use]
    pub fn from_settings(settings: &Settings, endpoint_type: EndpointType) -> Self {
        Self {
            config: DeployConfig::huggingface_tgi(settings),
            resources: ResourceConfig::from_settings(settings),
            endpoint_type,
            timings: DeployTimings::default(),
        }
    }
}

/// Deploy the configured model.
///
/// Required settings are checked before anything is sent to AWS. The
/// returned receipt means SageMaker accepted the deployment; endpoint
/// creation itself continues asynchronously on the AWS side.
pub async fn create_endpoint(
    connector: &dyn HostingConnector,
    settings: &Settings,
    request: EndpointRequest,
) -> CloudResult<Endpoint<DeployRequested>> {
    let credentials = settings.deploy_credentials()?;

    info!(
        endpoint_type = %request.endpoint_type,
        model_id = %settings.hf_model_id,
        "creating endpoint"
    );

    let session = connector.connect(&credentials).await?;
    let image_uri = session.resolve_image(&ImageQuery::huggingface_tgi())?;
    info!(region = %credentials.region, image = %image_uri, "resolved serving image");

    let strategy = SagemakerHuggingfaceStrategy::new(DeploymentService::new(
        ResourceManager::new(session),
        request.timings,
    ));

    let endpoint = Endpoint::new(DeploymentRequest {
        role_arn: credentials.role_arn,
        image_uri,
        config: request.config,
        resources: request.resources,
        endpoint_name: settings.sagemaker_endpoint_inference.clone(),
        endpoint_config_name: settings.sagemaker_endpoint_config_inference.clone(),
        instance_type: settings.gpu_instance_type.clone(),
        endpoint_type: request.endpoint_type,
    });

    let resources = strategy.deploy(endpoint.request()).await?;
    Ok(endpoint.deploy_requested(resources))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CloudError;
    use crate::hosting::{HostingCall, MockHostingConnector};

    fn settings() -> Settings {
        Settings::parse(
            r#"
            aws_arn_role = "arn:aws:iam::123456789012:role/exec"
            aws_region = "eu-central-1"
            aws_access_key = "AKIAEXAMPLE"
            aws_secret_key = "secret"
            "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn missing_role_fails_before_connecting() {
        let mut settings = settings();
        settings.aws_arn_role = None;
        let connector = MockHostingConnector::default();

        let err = create_endpoint(
            &connector,
            &settings,
            EndpointRequest::from_settings(&settings, EndpointType::ModelBased),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CloudError::Settings(_)));
        assert!(connector.connects().is_empty());
        assert!(connector.session().calls().is_empty());
    }

    #[tokio::test]
    async fn receipt_carries_settings_names() {
        let settings = settings();
        let connector = MockHostingConnector::default();

        let endpoint = create_endpoint(
            &connector,
            &settings,
            EndpointRequest::from_settings(&settings, EndpointType::ModelBased),
        )
        .await
        .unwrap();

        assert_eq!(endpoint.state_name(), "deploy_requested");
        assert_eq!(endpoint.request().endpoint_name, "twin");
        assert_eq!(endpoint.request().instance_type, "ml.g5.2xlarge");
        assert_eq!(endpoint.resources().endpoint_name, "twin");
        assert!(matches!(
            connector.session().calls().first(),
            Some(HostingCall::ResolveImage(_))
        ));
    }
}
