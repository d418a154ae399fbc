//! Error types for llmdeploy-aws.

use std::time::Duration;

use aws_sdk_iam::error::{DisplayErrorContext, ProvideErrorMetadata};
use llmdeploy_settings::SettingsError;

/// Result type alias using [`CloudError`].
pub type CloudResult<T> = Result<T, CloudError>;

/// IAM error code for an entity that already exists.
pub const ENTITY_ALREADY_EXISTS: &str = "EntityAlreadyExists";

/// Errors raised while talking to IAM or SageMaker.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// Required settings are missing. Raised before any remote call.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The provider rejected a request.
    #[error("{operation} failed: {}{message}", code_prefix(.code))]
    Provider {
        /// API operation that failed.
        operation: &'static str,
        /// Provider error code, if one was returned.
        code: Option<String>,
        /// Provider error message.
        message: String,
    },

    /// A cloud capability was compiled out of this build.
    #[error("{0} support is unavailable in this build; rebuild with the `{0}` feature")]
    FeatureUnavailable(&'static str),

    /// No serving image is known for the requested framework, version or region.
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    /// The provider returned a response missing a required field.
    #[error("invalid response from {operation}: {reason}")]
    InvalidResponse {
        /// API operation that returned the response.
        operation: &'static str,
        /// What was missing or malformed.
        reason: String,
    },

    /// A request could not be assembled.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The endpoint entered a terminal failure state.
    #[error("endpoint {endpoint} failed: {reason}")]
    EndpointFailed {
        /// Endpoint name.
        endpoint: String,
        /// Failure reason reported by the provider.
        reason: String,
    },

    /// Waiting for the endpoint took too long.
    #[error("endpoint {endpoint} not in service after {waited:?}")]
    Timeout {
        /// Endpoint name.
        endpoint: String,
        /// Time spent waiting.
        waited: Duration,
    },

    /// Local filesystem error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialisation error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn code_prefix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!("{c}: ")).unwrap_or_default()
}

impl CloudError {
    /// Create a provider error with an explicit code.
    #[must_use]
    pub fn provider(
        operation: &'static str,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            operation,
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Convert an AWS SDK error, keeping the provider's code and message.
    pub fn from_sdk<E>(operation: &'static str, err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        let code = err.code().map(str::to_owned);
        let message = err
            .message()
            .map_or_else(|| DisplayErrorContext(&err).to_string(), str::to_owned);

        Self::Provider {
            operation,
            code,
            message,
        }
    }

    /// Returns the provider error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Provider { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Returns true if the provider reported a duplicate entity.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        self.code() == Some(ENTITY_ALREADY_EXISTS)
    }
}
