//! In-memory identity provider for testing.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::IdentityApi;
use crate::credentials::CredentialRecord;
use crate::error::{CloudError, CloudResult, ENTITY_ALREADY_EXISTS};

/// A call recorded by [`MockIdentityApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityCall {
    /// `CreateUser`
    CreateUser(String),
    /// `AttachUserPolicy`
    AttachUserPolicy {
        /// Target user.
        username: String,
        /// Policy ARN.
        policy_arn: String,
    },
    /// `CreateAccessKey`
    CreateAccessKey(String),
    /// `DetachUserPolicy`
    DetachUserPolicy {
        /// Target user.
        username: String,
        /// Policy ARN.
        policy_arn: String,
    },
    /// `DeleteUser`
    DeleteUser(String),
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, BTreeSet<String>>,
    calls: Vec<IdentityCall>,
    keys_issued: u32,
}

/// Mock identity provider that mimics IAM's user bookkeeping.
///
/// Users persist across calls, so creating the same user twice fails with
/// `EntityAlreadyExists` just like IAM.
#[derive(Debug, Default)]
pub struct MockIdentityApi {
    state: Mutex<State>,
    failing_policy: Option<String>,
    fail_access_key: bool,
}

impl MockIdentityApi {
    /// Creates an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user that already exists.
    #[must_use]
    pub fn with_existing_user(self, username: &str) -> Self {
        self.lock().users.insert(username.to_owned(), BTreeSet::new());
        self
    }

    /// Reject attaching the given policy with a quota error.
    #[must_use]
    pub fn failing_policy(mut self, policy_arn: &str) -> Self {
        self.failing_policy = Some(policy_arn.to_owned());
        self
    }

    /// Reject access key creation with a quota error.
    #[must_use]
    pub const fn failing_access_key(mut self) -> Self {
        self.fail_access_key = true;
        self
    }

    /// All calls received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<IdentityCall> {
        self.lock().calls.clone()
    }

    /// Policies currently attached to a user, or `None` if the user does not exist.
    #[must_use]
    pub fn attached_policies(&self, username: &str) -> Option<BTreeSet<String>> {
        self.lock().users.get(username).cloned()
    }

    /// Returns true if the user exists.
    #[must_use]
    pub fn user_exists(&self, username: &str) -> bool {
        self.lock().users.contains_key(username)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn no_such_entity(operation: &'static str, username: &str) -> CloudError {
    CloudError::provider(
        operation,
        "NoSuchEntity",
        format!("The user with name {username} cannot be found."),
    )
}

#[async_trait]
impl IdentityApi for MockIdentityApi {
    async fn create_user(&self, username: &str) -> CloudResult<()> {
        let mut state = self.lock();
        state.calls.push(IdentityCall::CreateUser(username.to_owned()));

        if state.users.contains_key(username) {
            return Err(CloudError::provider(
                "CreateUser",
                ENTITY_ALREADY_EXISTS,
                format!("User with name {username} already exists."),
            ));
        }

        state.users.insert(username.to_owned(), BTreeSet::new());
        Ok(())
    }

    async fn attach_user_policy(&self, username: &str, policy_arn: &str) -> CloudResult<()> {
        let mut state = self.lock();
        state.calls.push(IdentityCall::AttachUserPolicy {
            username: username.to_owned(),
            policy_arn: policy_arn.to_owned(),
        });

        if self.failing_policy.as_deref() == Some(policy_arn) {
            return Err(CloudError::provider(
                "AttachUserPolicy",
                "LimitExceeded",
                "Cannot exceed quota for PoliciesPerUser: 10",
            ));
        }

        let policies = state
            .users
            .get_mut(username)
            .ok_or_else(|| no_such_entity("AttachUserPolicy", username))?;
        policies.insert(policy_arn.to_owned());
        Ok(())
    }

    async fn create_access_key(&self, username: &str) -> CloudResult<CredentialRecord> {
        let mut state = self.lock();
        state
            .calls
            .push(IdentityCall::CreateAccessKey(username.to_owned()));

        if self.fail_access_key {
            return Err(CloudError::provider(
                "CreateAccessKey",
                "LimitExceeded",
                "Cannot exceed quota for AccessKeysPerUser: 2",
            ));
        }
        if !state.users.contains_key(username) {
            return Err(no_such_entity("CreateAccessKey", username));
        }

        state.keys_issued += 1;
        let n = state.keys_issued;
        Ok(CredentialRecord::new(
            format!("AKIAMOCK{n:012}"),
            format!("mock-secret-{username}-{n}"),
        ))
    }

    async fn detach_user_policy(&self, username: &str, policy_arn: &str) -> CloudResult<()> {
        let mut state = self.lock();
        state.calls.push(IdentityCall::DetachUserPolicy {
            username: username.to_owned(),
            policy_arn: policy_arn.to_owned(),
        });

        let policies = state
            .users
            .get_mut(username)
            .ok_or_else(|| no_such_entity("DetachUserPolicy", username))?;
        policies.remove(policy_arn);
        Ok(())
    }

    async fn delete_user(&self, username: &str) -> CloudResult<()> {
        let mut state = self.lock();
        state.calls.push(IdentityCall::DeleteUser(username.to_owned()));

        match state.users.get(username) {
            None => Err(no_such_entity("DeleteUser", username)),
            Some(policies) if !policies.is_empty() => Err(CloudError::provider(
                "DeleteUser",
                "DeleteConflict",
                "Cannot delete entity, must detach all policies first.",
            )),
            Some(_) => {
                state.users.remove(username);
                Ok(())
            }
        }
    }
}
