//! ML hosting provider abstraction.
//!
//! [`HostingConnector`] opens an authenticated [`HostingSession`]; the
//! session exposes the SageMaker operations the deployment service needs.
//! The real implementation lives behind the `sagemaker` cargo feature, and
//! [`connector`] reports [`CloudError::FeatureUnavailable`] at startup when
//! it is compiled out.

mod mock;
#[cfg(feature = "sagemaker")]
mod sagemaker;

pub use mock::{HostingCall, MockHostingConnector, MockHostingSession};
#[cfg(feature = "sagemaker")]
pub use sagemaker::{SageMakerConnector, SageMakerSession};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use llmdeploy_settings::DeployCredentials;

use crate::error::{CloudError, CloudResult};
use crate::image::{huggingface_llm_image_uri, ImageQuery};
use crate::types::{DeployConfig, ResourceConfig};

/// Variant name used for every production variant.
pub const DEFAULT_VARIANT: &str = "AllTraffic";

/// Seconds SageMaker waits for the container health check on startup.
pub const STARTUP_HEALTH_CHECK_TIMEOUT_SECS: i32 = 900;

/// Lifecycle status of an endpoint as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointStatus {
    /// Being created.
    Creating,
    /// Being updated.
    Updating,
    /// Serving traffic.
    InService,
    /// Creation or update failed.
    Failed {
        /// Failure reason reported by the provider.
        reason: String,
    },
    /// Any other provider status (rolling back, deleting, ...).
    Other(String),
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creating => f.write_str("Creating"),
            Self::Updating => f.write_str("Updating"),
            Self::InService => f.write_str("InService"),
            Self::Failed { .. } => f.write_str("Failed"),
            Self::Other(status) => f.write_str(status),
        }
    }
}

/// A model registered with the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    /// Model name.
    pub name: String,
    /// Serving container image.
    pub image_uri: String,
    /// Container environment.
    pub environment: DeployConfig,
    /// Role SageMaker assumes to run the container.
    pub execution_role_arn: String,
}

/// The single production variant of an endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    /// Variant name.
    pub name: String,
    /// Model served by the variant; `None` for inference-component endpoints.
    pub model_name: Option<String>,
    /// Instance type.
    pub instance_type: String,
    /// Initial instance count.
    pub initial_instance_count: i32,
    /// Container startup health check timeout.
    pub startup_health_check_timeout_secs: i32,
}

/// An endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfigSpec {
    /// Configuration name.
    pub name: String,
    /// Production variant.
    pub variant: VariantSpec,
    /// Execution role, required for inference-component endpoints.
    pub execution_role_arn: Option<String>,
}

/// An inference component placed on an existing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceComponentSpec {
    /// Component name.
    pub name: String,
    /// Hosting endpoint.
    pub endpoint_name: String,
    /// Variant of the hosting endpoint.
    pub variant_name: String,
    /// Model served by the component.
    pub model_name: String,
    /// Resources per copy and copy count.
    pub resources: ResourceConfig,
}

/// An authenticated session against the hosting provider.
#[async_trait]
pub trait HostingSession: Send + Sync {
    /// Region the session is bound to.
    fn region(&self) -> &str;

    /// Resolve a serving image URI for this session's region.
    fn resolve_image(&self, query: &ImageQuery) -> CloudResult<String> {
        huggingface_llm_image_uri(self.region(), query)
    }

    /// Status of an endpoint, or `None` if it does not exist.
    async fn describe_endpoint(&self, name: &str) -> CloudResult<Option<EndpointStatus>>;

    /// Returns true if the endpoint configuration exists.
    async fn endpoint_config_exists(&self, name: &str) -> CloudResult<bool>;

    /// Register a model.
    async fn create_model(&self, spec: &ModelSpec) -> CloudResult<()>;

    /// Create an endpoint configuration.
    async fn create_endpoint_config(&self, spec: &EndpointConfigSpec) -> CloudResult<()>;

    /// Create an endpoint from an existing configuration.
    async fn create_endpoint(&self, endpoint_name: &str, config_name: &str) -> CloudResult<()>;

    /// Place an inference component on an endpoint.
    async fn create_inference_component(&self, spec: &InferenceComponentSpec) -> CloudResult<()>;
}

/// Opens hosting sessions.
#[async_trait]
pub trait HostingConnector: Send + Sync {
    /// Open a session signed with `credentials`.
    async fn connect(&self, credentials: &DeployCredentials)
        -> CloudResult<Arc<dyn HostingSession>>;
}

/// The hosting connector compiled into this build.
#[cfg(feature = "sagemaker")]
pub fn connector() -> CloudResult<Box<dyn HostingConnector>> {
    Ok(Box::new(SageMakerConnector))
}

/// The hosting connector compiled into this build.
#[cfg(not(feature = "sagemaker"))]
pub fn connector() -> CloudResult<Box<dyn HostingConnector>> {
    Err(CloudError::FeatureUnavailable("sagemaker"))
}

/// Returns true if a "Could not find" validation error means the resource is absent.
pub(crate) fn is_not_found(err: &CloudError) -> bool {
    match err {
        CloudError::Provider { code, message, .. } => {
            code.as_deref() == Some("ValidationException") && message.contains("Could not find")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_not_found_is_absent() {
        let err = CloudError::provider(
            "DescribeEndpoint",
            "ValidationException",
            "Could not find endpoint \"twin\".",
        );
        assert!(is_not_found(&err));

        let other = CloudError::provider("DescribeEndpoint", "AccessDeniedException", "denied");
        assert!(!is_not_found(&other));
    }

    #[test]
    fn status_display() {
        assert_eq!(EndpointStatus::InService.to_string(), "InService");
        assert_eq!(
            EndpointStatus::Other("RollingBack".to_owned()).to_string(),
            "RollingBack"
        );
    }

    #[cfg(feature = "sagemaker")]
    #[test]
    fn sagemaker_connector_available() {
        assert!(connector().is_ok());
    }

    #[cfg(not(feature = "sagemaker"))]
    #[test]
    fn connector_unavailable_without_feature() {
        let err = connector().err().unwrap();
        assert!(matches!(err, CloudError::FeatureUnavailable("sagemaker")));
    }
}
