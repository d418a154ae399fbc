//! Process-wide settings for the llmdeploy tools.

use std::path::Path;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::{SettingsError, SettingsResult};
use crate::secret::SecretValue;

/// Settings file read when no explicit path is given.
pub const DEFAULT_SETTINGS_FILE: &str = "llmdeploy.toml";

/// Environment keys that feed the settings record.
pub const ENV_KEYS: [&str; 16] = [
    "AWS_ARN_ROLE",
    "AWS_REGION",
    "AWS_ACCESS_KEY",
    "AWS_SECRET_KEY",
    "HF_MODEL_ID",
    "HUGGINGFACE_ACCESS_TOKEN",
    "SAGEMAKER_ENDPOINT_INFERENCE",
    "SAGEMAKER_ENDPOINT_CONFIG_INFERENCE",
    "GPU_INSTANCE_TYPE",
    "SM_NUM_GPUS",
    "MAX_INPUT_LENGTH",
    "MAX_TOTAL_TOKENS",
    "MAX_BATCH_TOTAL_TOKENS",
    "COPIES",
    "GPUS",
    "CPUS",
];

/// Region used when `AWS_REGION` is not provided.
pub const DEFAULT_REGION: &str = "eu-central-1";

/// Read-only record of deployment parameters.
///
/// Every field has a default except the credentials and the execution role,
/// which must come from the environment or the settings file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// IAM role assumed by SageMaker to run the model.
    pub aws_arn_role: Option<String>,
    /// AWS region for every client.
    pub aws_region: Option<String>,
    /// Access key ID of the operator.
    pub aws_access_key: Option<String>,
    /// Secret access key of the operator.
    pub aws_secret_key: Option<SecretValue>,

    /// Hugging Face Hub model identifier to serve.
    pub hf_model_id: String,
    /// Token for gated Hub models.
    pub huggingface_access_token: Option<SecretValue>,

    /// Name of the SageMaker endpoint.
    pub sagemaker_endpoint_inference: String,
    /// Name of the SageMaker endpoint configuration.
    pub sagemaker_endpoint_config_inference: String,
    /// Instance type hosting the endpoint.
    pub gpu_instance_type: String,

    /// GPUs visible to the serving container.
    pub sm_num_gpus: u32,
    /// Maximum prompt length in tokens.
    pub max_input_length: u32,
    /// Maximum prompt plus generation length in tokens.
    pub max_total_tokens: u32,
    /// Token budget for a whole batch.
    pub max_batch_total_tokens: u32,

    /// Copies of the inference component.
    pub copies: u32,
    /// Accelerators per inference component copy.
    pub gpus: u32,
    /// CPU cores per inference component copy.
    pub cpus: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aws_arn_role: None,
            aws_region: Some(DEFAULT_REGION.to_owned()),
            aws_access_key: None,
            aws_secret_key: None,
            hf_model_id: "mlabonne/TwinLlama-3.1-8B-DPO".to_owned(),
            huggingface_access_token: None,
            sagemaker_endpoint_inference: "twin".to_owned(),
            sagemaker_endpoint_config_inference: "twin".to_owned(),
            gpu_instance_type: "ml.g5.2xlarge".to_owned(),
            sm_num_gpus: 1,
            max_input_length: 2048,
            max_total_tokens: 4096,
            max_batch_total_tokens: 4096,
            copies: 1,
            gpus: 1,
            cpus: 2,
        }
    }
}

impl Settings {
    /// Load settings from the default sources.
    ///
    /// Sources in order (later sources override earlier):
    /// 1. Default values
    /// 2. The TOML file at `path`, or `llmdeploy.toml` (if present)
    /// 3. The environment keys listed in [`ENV_KEYS`]
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> SettingsResult<Self> {
        let file = match path {
            Some(path) if !path.exists() => {
                return Err(SettingsError::FileNotFound(path.display().to_string()));
            }
            Some(path) => path,
            None => Path::new(DEFAULT_SETTINGS_FILE),
        };

        Self::from_figment(
            Figment::new()
                .merge(Toml::file(file))
                .merge(Env::raw().only(&ENV_KEYS)),
        )
    }

    /// Parse settings from a TOML string, ignoring the environment.
    pub fn parse(content: &str) -> SettingsResult<Self> {
        Self::from_figment(Figment::new().merge(Toml::string(content)))
    }

    /// Extract settings from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> SettingsResult<Self> {
        figment.extract().map_err(SettingsError::from)
    }

    /// Returns the operator's access key pair.
    pub fn access_keys(&self) -> SettingsResult<AccessKeys> {
        let access_key_id = require("AWS_ACCESS_KEY", self.aws_access_key.as_deref())?;
        let secret_access_key = self
            .aws_secret_key
            .as_ref()
            .filter(|secret| !secret.expose().trim().is_empty())
            .cloned()
            .ok_or(SettingsError::Missing {
                name: "AWS_SECRET_KEY",
            })?;

        Ok(AccessKeys {
            access_key_id: access_key_id.to_owned(),
            secret_access_key,
        })
    }

    /// Validates the values the endpoint deployer cannot run without.
    ///
    /// Checks `AWS_ARN_ROLE`, `AWS_REGION`, `AWS_ACCESS_KEY` and
    /// `AWS_SECRET_KEY` in that order and reports the first one that is
    /// unset or empty.
    pub fn deploy_credentials(&self) -> SettingsResult<DeployCredentials> {
        let role_arn = require("AWS_ARN_ROLE", self.aws_arn_role.as_deref())?;
        let region = require("AWS_REGION", self.aws_region.as_deref())?;
        let keys = self.access_keys()?;

        Ok(DeployCredentials {
            role_arn: role_arn.to_owned(),
            region: region.to_owned(),
            keys,
        })
    }
}

fn require<'a>(name: &'static str, value: Option<&'a str>) -> SettingsResult<&'a str> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SettingsError::Missing { name }),
    }
}

/// An access key pair used to sign AWS requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKeys {
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: SecretValue,
}

/// Everything the endpoint deployer needs to open a hosting session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployCredentials {
    /// Execution role ARN passed to SageMaker.
    pub role_arn: String,
    /// AWS region.
    pub region: String,
    /// Operator access keys.
    pub keys: AccessKeys,
}
