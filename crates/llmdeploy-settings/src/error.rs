//! Error types for settings loading and validation.

use thiserror::Error;

/// Result type alias using [`SettingsError`].
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors that can occur while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A required setting is unset or empty.
    #[error("{name} is not set")]
    Missing {
        /// The environment key of the missing setting.
        name: &'static str,
    },

    /// An explicitly requested settings file does not exist.
    #[error("settings file not found: {0}")]
    FileNotFound(String),

    /// Error from the Figment configuration library.
    #[error("configuration error: {0}")]
    Figment(Box<figment::Error>),
}

impl SettingsError {
    /// Returns the key of the missing setting, if this is a `Missing` error.
    #[must_use]
    pub const fn missing_key(&self) -> Option<&'static str> {
        match self {
            Self::Missing { name } => Some(*name),
            Self::FileNotFound(_) | Self::Figment(_) => None,
        }
    }
}

impl From<figment::Error> for SettingsError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}
