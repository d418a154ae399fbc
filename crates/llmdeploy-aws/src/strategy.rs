//! Endpoint types and the Hugging Face deployment strategy.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::CloudResult;
use crate::service::{DeployedResources, DeploymentRequest, DeploymentService};

/// How served models map onto physical endpoint capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndpointType {
    /// Several inference components share the endpoint's instances.
    #[default]
    InferenceComponentBased,
    /// One model per endpoint.
    ModelBased,
}

impl EndpointType {
    /// Get the endpoint type name as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InferenceComponentBased => "inference-component-based",
            Self::ModelBased => "model-based",
        }
    }

    /// Check if models are placed as inference components.
    #[must_use]
    pub const fn uses_inference_components(&self) -> bool {
        matches!(self, Self::InferenceComponentBased)
    }
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deploys Hugging Face LLM containers through a [`DeploymentService`].
pub struct SagemakerHuggingfaceStrategy {
    service: DeploymentService,
}

impl SagemakerHuggingfaceStrategy {
    /// Create a strategy around a deployment service.
    #[must_use]
    pub const fn new(service: DeploymentService) -> Self {
        Self { service }
    }

    /// Deploy the model described by `request`.
    pub async fn deploy(&self, request: &DeploymentRequest) -> CloudResult<DeployedResources> {
        info!(
            endpoint = %request.endpoint_name,
            endpoint_type = %request.endpoint_type,
            instance_type = %request.instance_type,
            "deploying Hugging Face model to SageMaker"
        );

        match self.service.deploy(request).await {
            Ok(resources) => Ok(resources),
            Err(e) => {
                error!(endpoint = %request.endpoint_name, error = %e, "deployment to SageMaker failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_inference_component_based() {
        assert_eq!(EndpointType::default(), EndpointType::InferenceComponentBased);
        assert!(EndpointType::default().uses_inference_components());
        assert!(!EndpointType::ModelBased.uses_inference_components());
    }

    #[test]
    fn serde_from_string() {
        let model: EndpointType = serde_json::from_str(r#""model-based""#).unwrap();
        assert_eq!(model, EndpointType::ModelBased);

        let component: EndpointType =
            serde_json::from_str(r#""inference-component-based""#).unwrap();
        assert_eq!(component, EndpointType::InferenceComponentBased);
    }

    #[test]
    fn display_matches_serde() {
        for endpoint_type in [EndpointType::ModelBased, EndpointType::InferenceComponentBased] {
            let json = serde_json::to_string(&endpoint_type).unwrap();
            assert_eq!(json, format!("\"{endpoint_type}\""));
        }
    }
}
