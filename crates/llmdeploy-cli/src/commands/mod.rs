//! Subcommand implementations.

pub mod create_user;
pub mod deploy;

use std::path::Path;

use anyhow::Context;
use llmdeploy_settings::Settings;

/// Load settings from `path` (or the default file) and the environment.
fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    Settings::load(path).context("failed to load settings")
}
