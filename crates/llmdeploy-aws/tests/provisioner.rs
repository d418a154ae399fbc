//! Integration tests for IAM user provisioning and the credentials file.

use std::collections::BTreeSet;

use llmdeploy_aws::identity::{IdentityCall, MockIdentityApi};
use llmdeploy_aws::{
    create_sagemaker_user, read_credentials, write_credentials, OnFailure,
    SAGEMAKER_DEPLOYER_POLICIES,
};

const USERNAME: &str = "sagemaker-deployer-3";

#[tokio::test]
async fn attaches_exactly_the_deployer_policies() {
    let identity = MockIdentityApi::new();

    create_sagemaker_user(
        &identity,
        USERNAME,
        &SAGEMAKER_DEPLOYER_POLICIES,
        OnFailure::Leave,
    )
    .await
    .unwrap();

    let expected: BTreeSet<String> = [
        "arn:aws:iam::aws:policy/AmazonSageMakerFullAccess",
        "arn:aws:iam::aws:policy/AWSCloudFormationFullAccess",
        "arn:aws:iam::aws:policy/IAMFullAccess",
        "arn:aws:iam::aws:policy/AmazonEC2ContainerRegistryFullAccess",
        "arn:aws:iam::aws:policy/AmazonS3FullAccess",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    assert_eq!(identity.attached_policies(USERNAME), Some(expected));

    let attach_calls = identity
        .calls()
        .iter()
        .filter(|call| matches!(call, IdentityCall::AttachUserPolicy { .. }))
        .count();
    assert_eq!(attach_calls, 5);
}

#[tokio::test]
async fn calls_happen_in_provisioning_order() {
    let identity = MockIdentityApi::new();

    create_sagemaker_user(
        &identity,
        USERNAME,
        &SAGEMAKER_DEPLOYER_POLICIES,
        OnFailure::Leave,
    )
    .await
    .unwrap();

    let calls = identity.calls();
    assert_eq!(calls.first(), Some(&IdentityCall::CreateUser(USERNAME.to_string())));
    assert_eq!(
        calls.last(),
        Some(&IdentityCall::CreateAccessKey(USERNAME.to_string()))
    );
    assert_eq!(calls.len(), 7);
}

#[tokio::test]
async fn written_file_matches_returned_record() {
    let identity = MockIdentityApi::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sagemaker_user_credentials.json");

    let record = create_sagemaker_user(
        &identity,
        USERNAME,
        &SAGEMAKER_DEPLOYER_POLICIES,
        OnFailure::Leave,
    )
    .await
    .unwrap();
    write_credentials(&path, &record).await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["AccessKeyId"], record.access_key_id);
    assert_eq!(raw["SecretAccessKey"], record.secret_access_key.expose());
    assert_eq!(raw.as_object().map(serde_json::Map::len), Some(2));

    assert_eq!(read_credentials(&path).await.unwrap(), record);
}

#[tokio::test]
async fn rewriting_overwrites_previous_file() {
    let identity = MockIdentityApi::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "stale contents that are longer than the new record ...........................................").unwrap();

    let record = create_sagemaker_user(
        &identity,
        USERNAME,
        &SAGEMAKER_DEPLOYER_POLICIES,
        OnFailure::Leave,
    )
    .await
    .unwrap();
    write_credentials(&path, &record).await.unwrap();

    assert_eq!(read_credentials(&path).await.unwrap(), record);
}

#[tokio::test]
async fn existing_user_is_rejected() {
    let identity = MockIdentityApi::new().with_existing_user(USERNAME);

    let err = create_sagemaker_user(
        &identity,
        USERNAME,
        &SAGEMAKER_DEPLOYER_POLICIES,
        OnFailure::Leave,
    )
    .await
    .unwrap_err();

    assert!(err.is_already_exists());
    assert_eq!(identity.calls().len(), 1);
}

#[tokio::test]
async fn provisioning_twice_fails_the_second_time() {
    let identity = MockIdentityApi::new();

    create_sagemaker_user(
        &identity,
        USERNAME,
        &SAGEMAKER_DEPLOYER_POLICIES,
        OnFailure::Leave,
    )
    .await
    .unwrap();
    let err = create_sagemaker_user(
        &identity,
        USERNAME,
        &SAGEMAKER_DEPLOYER_POLICIES,
        OnFailure::Leave,
    )
    .await
    .unwrap_err();

    assert_eq!(err.code(), Some("EntityAlreadyExists"));
}

#[tokio::test]
async fn leave_keeps_half_configured_user() {
    let identity = MockIdentityApi::new()
        .failing_policy("arn:aws:iam::aws:policy/IAMFullAccess");

    let err = create_sagemaker_user(
        &identity,
        USERNAME,
        &SAGEMAKER_DEPLOYER_POLICIES,
        OnFailure::Leave,
    )
    .await
    .unwrap_err();

    assert_eq!(err.code(), Some("LimitExceeded"));
    assert_eq!(
        identity.attached_policies(USERNAME).map(|p| p.len()),
        Some(2)
    );
}

#[tokio::test]
async fn rollback_removes_user_and_keeps_original_error() {
    let identity = MockIdentityApi::new().failing_access_key();

    let err = create_sagemaker_user(
        &identity,
        USERNAME,
        &SAGEMAKER_DEPLOYER_POLICIES,
        OnFailure::Rollback,
    )
    .await
    .unwrap_err();

    assert_eq!(err.code(), Some("LimitExceeded"));
    assert!(!identity.user_exists(USERNAME));

    let detached = identity
        .calls()
        .iter()
        .filter(|call| matches!(call, IdentityCall::DetachUserPolicy { .. }))
        .count();
    assert_eq!(detached, 5);
    assert_eq!(
        identity.calls().last(),
        Some(&IdentityCall::DeleteUser(USERNAME.to_string()))
    );
}
