//! Test fixtures for llmdeploy-aws integration tests.

use llmdeploy_settings::{SecretValue, Settings};

/// Builder for settings with every deployer key present.
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Settings with test credentials and all other values at their defaults.
    pub fn complete() -> Self {
        Self {
            settings: Settings {
                aws_arn_role: Some("arn:aws:iam::123456789012:role/sagemaker-exec".to_string()),
                aws_region: Some("eu-central-1".to_string()),
                aws_access_key: Some("AKIATESTOPERATOR".to_string()),
                aws_secret_key: Some(SecretValue::from("operator-secret")),
                ..Settings::default()
            },
        }
    }

    /// Sets the region.
    pub fn with_region(mut self, region: &str) -> Self {
        self.settings.aws_region = Some(region.to_string());
        self
    }

    /// Sets the Hugging Face model.
    pub fn with_model(mut self, model_id: &str) -> Self {
        self.settings.hf_model_id = model_id.to_string();
        self
    }

    /// Sets the Hub token for gated models.
    pub fn with_hub_token(mut self, token: &str) -> Self {
        self.settings.huggingface_access_token = Some(SecretValue::from(token));
        self
    }

    /// Unsets one of the four required deployer keys by environment name.
    pub fn without(mut self, key: &str) -> Self {
        match key {
            "AWS_ARN_ROLE" => self.settings.aws_arn_role = None,
            "AWS_REGION" => self.settings.aws_region = None,
            "AWS_ACCESS_KEY" => self.settings.aws_access_key = None,
            "AWS_SECRET_KEY" => self.settings.aws_secret_key = None,
            other => panic!("not a required key: {other}"),
        }
        self
    }

    /// Sets one of the four required deployer keys to an empty string.
    pub fn blank(mut self, key: &str) -> Self {
        match key {
            "AWS_ARN_ROLE" => self.settings.aws_arn_role = Some(String::new()),
            "AWS_REGION" => self.settings.aws_region = Some(String::new()),
            "AWS_ACCESS_KEY" => self.settings.aws_access_key = Some(String::new()),
            "AWS_SECRET_KEY" => self.settings.aws_secret_key = Some(SecretValue::from("")),
            other => panic!("not a required key: {other}"),
        }
        self
    }

    /// Builds the settings.
    pub fn build(self) -> Settings {
        self.settings
    }
}
