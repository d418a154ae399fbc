//! Credential provisioning for SageMaker deployer users.
//!
//! Creates an IAM user, attaches a [`PolicySet`] and mints one access key.
//! Nothing is retried and nothing is idempotent: provisioning an existing
//! username fails with the provider's `EntityAlreadyExists` error.

use tracing::{error, info, warn};

use crate::credentials::CredentialRecord;
use crate::error::{CloudError, CloudResult};
use crate::identity::IdentityApi;
use crate::policy::PolicySet;

/// Username provisioned when none is given.
pub const DEFAULT_USERNAME: &str = "sagemaker-deployer-3";

/// What to do with a half-configured user when provisioning fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnFailure {
    /// Leave the user and any attached policies in place.
    #[default]
    Leave,
    /// Detach the policies attached so far and delete the user.
    Rollback,
}

/// Create `username`, attach every policy in `policies` and mint an access key.
///
/// A failure after the user exists is handled according to `on_failure`;
/// the original provider error is returned either way.
pub async fn create_sagemaker_user(
    identity: &dyn IdentityApi,
    username: &str,
    policies: &PolicySet,
    on_failure: OnFailure,
) -> CloudResult<CredentialRecord> {
    identity.create_user(username).await?;
    info!(username = %username, "user created");

    let mut attached: Vec<&str> = Vec::with_capacity(policies.len());
    for policy_arn in policies.iter() {
        if let Err(e) = identity.attach_user_policy(username, policy_arn).await {
            abandon(identity, username, &attached, on_failure, &e).await;
            return Err(e);
        }
        attached.push(policy_arn);
    }

    info!(
        username = %username,
        policy_set = %policies,
        count = attached.len(),
        "policies attached"
    );

    match identity.create_access_key(username).await {
        Ok(record) => {
            info!(
                username = %username,
                access_key_id = %record.access_key_id,
                "access key created"
            );
            Ok(record)
        }
        Err(e) => {
            abandon(identity, username, &attached, on_failure, &e).await;
            Err(e)
        }
    }
}

async fn abandon(
    identity: &dyn IdentityApi,
    username: &str,
    attached: &[&str],
    on_failure: OnFailure,
    cause: &CloudError,
) {
    match on_failure {
        OnFailure::Leave => {
            error!(
                username = %username,
                attached = ?attached,
                error = %cause,
                "provisioning failed; user left partially configured"
            );
        }
        OnFailure::Rollback => {
            warn!(username = %username, error = %cause, "provisioning failed; rolling back");
            rollback(identity, username, attached).await;
        }
    }
}

async fn rollback(identity: &dyn IdentityApi, username: &str, attached: &[&str]) {
    for policy_arn in attached.iter().rev() {
        if let Err(e) = identity.detach_user_policy(username, policy_arn).await {
            error!(username = %username, policy = %policy_arn, error = %e, "rollback: detach failed");
        }
    }

    match identity.delete_user(username).await {
        Ok(()) => info!(username = %username, "rollback: user deleted"),
        Err(e) => error!(username = %username, error = %e, "rollback: delete failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdentityCall, MockIdentityApi};
    use crate::policy::SAGEMAKER_DEPLOYER_POLICIES;

    #[tokio::test]
    async fn creates_user_then_policies_then_key() {
        let identity = MockIdentityApi::new();

        create_sagemaker_user(
            &identity,
            "deployer",
            &SAGEMAKER_DEPLOYER_POLICIES,
            OnFailure::Leave,
        )
        .await
        .unwrap();

        let calls = identity.calls();
        assert_eq!(calls.len(), 7);
        assert_eq!(calls[0], IdentityCall::CreateUser("deployer".to_owned()));
        assert_eq!(calls[6], IdentityCall::CreateAccessKey("deployer".to_owned()));
    }

    #[tokio::test]
    async fn duplicate_user_stops_before_policies() {
        let identity = MockIdentityApi::new().with_existing_user("deployer");

        let err = create_sagemaker_user(
            &identity,
            "deployer",
            &SAGEMAKER_DEPLOYER_POLICIES,
            OnFailure::Rollback,
        )
        .await
        .unwrap_err();

        assert!(err.is_already_exists());
        assert_eq!(
            identity.calls(),
            vec![IdentityCall::CreateUser("deployer".to_owned())]
        );
        assert!(identity.user_exists("deployer"));
    }
}
