//! Settings record for the llmdeploy operator tools.
//!
//! Settings are layered with `figment`: built-in defaults, then an optional
//! TOML file, then a fixed list of unprefixed environment variables such as
//! `AWS_REGION` and `HF_MODEL_ID`. Credentials are held as [`SecretValue`]s
//! so they never reach a log line.

#![forbid(unsafe_code)]

mod config;
mod error;
mod secret;

pub use config::{
    AccessKeys, DeployCredentials, Settings, DEFAULT_REGION, DEFAULT_SETTINGS_FILE, ENV_KEYS,
};
pub use error::{SettingsError, SettingsResult};
pub use secret::SecretValue;
