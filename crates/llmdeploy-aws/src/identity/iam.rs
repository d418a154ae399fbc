//! IAM-backed identity provider.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_iam::Client;
use llmdeploy_settings::AccessKeys;
use tracing::debug;

use super::IdentityApi;
use crate::credentials::CredentialRecord;
use crate::error::{CloudError, CloudResult};

/// Provider name recorded on credentials built from settings.
pub(crate) const SETTINGS_PROVIDER: &str = "llmdeploy-settings";

/// Identity provider backed by the AWS IAM API.
#[derive(Debug, Clone)]
pub struct IamIdentity {
    client: Client,
}

impl IamIdentity {
    /// Build an IAM client signed with the given keys.
    pub async fn connect(keys: &AccessKeys, region: &str) -> Self {
        let credentials = Credentials::new(
            keys.access_key_id.clone(),
            keys.secret_access_key.expose().to_owned(),
            None,
            None,
            SETTINGS_PROVIDER,
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_owned()))
            .credentials_provider(credentials)
            .load()
            .await;

        debug!(region = %region, "IAM client initialised");
        Self::from_client(Client::new(&sdk_config))
    }

    /// Wrap an existing IAM client.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityApi for IamIdentity {
    async fn create_user(&self, username: &str) -> CloudResult<()> {
        self.client
            .create_user()
            .user_name(username)
            .send()
            .await
            .map_err(|e| CloudError::from_sdk("CreateUser", e))?;
        Ok(())
    }

    async fn attach_user_policy(&self, username: &str, policy_arn: &str) -> CloudResult<()> {
        self.client
            .attach_user_policy()
            .user_name(username)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| CloudError::from_sdk("AttachUserPolicy", e))?;
        Ok(())
    }

    async fn create_access_key(&self, username: &str) -> CloudResult<CredentialRecord> {
        let output = self
            .client
            .create_access_key()
            .user_name(username)
            .send()
            .await
            .map_err(|e| CloudError::from_sdk("CreateAccessKey", e))?;

        let key = output
            .access_key()
            .ok_or_else(|| CloudError::InvalidResponse {
                operation: "CreateAccessKey",
                reason: "response has no access key".to_owned(),
            })?;

        Ok(CredentialRecord::new(
            key.access_key_id(),
            key.secret_access_key(),
        ))
    }

    async fn detach_user_policy(&self, username: &str, policy_arn: &str) -> CloudResult<()> {
        self.client
            .detach_user_policy()
            .user_name(username)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| CloudError::from_sdk("DetachUserPolicy", e))?;
        Ok(())
    }

    async fn delete_user(&self, username: &str) -> CloudResult<()> {
        self.client
            .delete_user()
            .user_name(username)
            .send()
            .await
            .map_err(|e| CloudError::from_sdk("DeleteUser", e))?;
        Ok(())
    }
}
