//! Identity provider abstraction.
//!
//! The provisioner only needs a handful of IAM user operations. They sit
//! behind [`IdentityApi`] so the orchestration can run against the real IAM
//! client or an in-memory mock.

mod iam;
mod mock;

#[cfg(feature = "sagemaker")]
pub(crate) use iam::SETTINGS_PROVIDER;
pub use iam::IamIdentity;
pub use mock::{IdentityCall, MockIdentityApi};

use async_trait::async_trait;

use crate::credentials::CredentialRecord;
use crate::error::CloudResult;

/// IAM user operations consumed by the credential provisioner.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Create a user. Fails if the name is taken.
    async fn create_user(&self, username: &str) -> CloudResult<()>;

    /// Attach a managed policy to a user.
    async fn attach_user_policy(&self, username: &str, policy_arn: &str) -> CloudResult<()>;

    /// Mint a new access key for a user.
    async fn create_access_key(&self, username: &str) -> CloudResult<CredentialRecord>;

    /// Detach a managed policy from a user.
    async fn detach_user_policy(&self, username: &str, policy_arn: &str) -> CloudResult<()>;

    /// Delete a user. The user must have no attached policies or keys.
    async fn delete_user(&self, username: &str) -> CloudResult<()>;
}
