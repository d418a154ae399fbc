//! Parameter bundles forwarded to the hosting provider.

use std::collections::{BTreeMap, HashMap};

use llmdeploy_settings::Settings;

/// Container environment for the model server.
///
/// Treated as opaque by the deployer: whatever the caller builds is passed
/// to the provider unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployConfig(BTreeMap<String, String>);

impl DeployConfig {
    /// Creates an empty config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment for the Hugging Face TGI container.
    #[must_use]
    pub fn huggingface_tgi(settings: &Settings) -> Self {
        let mut config = Self::new()
            .with("HF_MODEL_ID", &settings.hf_model_id)
            .with("SM_NUM_GPUS", settings.sm_num_gpus.to_string())
            .with("MAX_INPUT_LENGTH", settings.max_input_length.to_string())
            .with("MAX_TOTAL_TOKENS", settings.max_total_tokens.to_string())
            .with(
                "MAX_BATCH_TOTAL_TOKENS",
                settings.max_batch_total_tokens.to_string(),
            )
            .with("MAX_BATCH_PREFILL_TOKENS", "10000");

        if let Some(token) = settings
            .huggingface_access_token
            .as_ref()
            .filter(|t| !t.is_empty())
        {
            config = config.with("HUGGING_FACE_HUB_TOKEN", token.expose());
        }

        config
    }

    /// Set a variable, returning the updated config.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a variable.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no variables are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy into the map shape the SageMaker SDK expects.
    #[must_use]
    pub fn to_environment(&self) -> HashMap<String, String> {
        self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// Compute resources reserved for each inference component copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Number of component copies.
    pub copies: u32,
    /// Accelerator devices per copy.
    pub num_accelerators: u32,
    /// CPU cores per copy.
    pub num_cpus: u32,
    /// Minimum memory per copy in MiB.
    pub memory_mb: u32,
}

impl ResourceConfig {
    /// Memory reserved per copy when none is configured.
    pub const DEFAULT_MEMORY_MB: u32 = 5 * 1024;

    /// Resources taken from the settings record.
    #[must_use]
    pub const fn from_settings(settings: &Settings) -> Self {
        Self {
            copies: settings.copies,
            num_accelerators: settings.gpus,
            num_cpus: settings.cpus,
            memory_mb: Self::DEFAULT_MEMORY_MB,
        }
    }
}
