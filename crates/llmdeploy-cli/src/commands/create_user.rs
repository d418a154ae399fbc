//! Implementation of the `llmdeploy create-user` command.

use std::path::{Path, PathBuf};

use anyhow::Context;
use llmdeploy_aws::{
    create_sagemaker_user, write_credentials, IamIdentity, OnFailure, SAGEMAKER_DEPLOYER_POLICIES,
};
use llmdeploy_settings::DEFAULT_REGION;
use tracing::info;

/// Arguments for the create-user command.
pub struct CreateUserArgs {
    /// IAM user to create.
    pub username: String,
    /// Region override.
    pub region: Option<String>,
    /// Credentials file to write.
    pub output: PathBuf,
    /// Roll back a half-configured user on failure.
    pub rollback: bool,
}

pub async fn run(config: Option<&Path>, args: CreateUserArgs) -> anyhow::Result<()> {
    let settings = super::load_settings(config)?;
    let keys = settings.access_keys()?;
    let region = args
        .region
        .or_else(|| settings.aws_region.clone())
        .unwrap_or_else(|| DEFAULT_REGION.to_owned());

    let on_failure = if args.rollback {
        OnFailure::Rollback
    } else {
        OnFailure::Leave
    };

    info!(
        username = %args.username,
        region = %region,
        policy_set = %SAGEMAKER_DEPLOYER_POLICIES,
        "provisioning SageMaker deployer user"
    );

    let identity = IamIdentity::connect(&keys, &region).await;
    let record = create_sagemaker_user(
        &identity,
        &args.username,
        &SAGEMAKER_DEPLOYER_POLICIES,
        on_failure,
    )
    .await
    .with_context(|| format!("failed to provision user {}", args.username))?;

    write_credentials(&args.output, &record)
        .await
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!("User {} created.", args.username);
    println!("Access key ID: {}", record.access_key_id);
    println!("Credentials saved to {}", args.output.display());
    Ok(())
}
