//! Access key records and the local credentials file.

use std::path::Path;

use llmdeploy_settings::SecretValue;
use serde::{Deserialize, Serialize, Serializer};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::CloudResult;

/// File the provisioner writes when no path is given.
pub const DEFAULT_CREDENTIALS_FILE: &str = "sagemaker_user_credentials.json";

/// An access key pair minted for a provisioned user.
///
/// Serialises as `{"AccessKeyId": ..., "SecretAccessKey": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Access key ID.
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,
    /// Secret access key.
    #[serde(rename = "SecretAccessKey", serialize_with = "expose_secret")]
    pub secret_access_key: SecretValue,
}

impl CredentialRecord {
    /// Creates a new record.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<SecretValue>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

fn expose_secret<S: Serializer>(secret: &SecretValue, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose())
}

/// Write the record as JSON, replacing any existing file.
///
/// The secret is stored in clear text. On unix the file is restricted to the
/// owner.
pub async fn write_credentials(path: impl AsRef<Path>, record: &CredentialRecord) -> CloudResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_vec(record)?;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path).await?;

    // An existing file keeps its old mode on open.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }

    file.write_all(&json).await?;
    file.flush().await?;

    info!(path = %path.display(), "credentials saved");
    Ok(())
}

/// Read a record previously written by [`write_credentials`].
pub async fn read_credentials(path: impl AsRef<Path>) -> CloudResult<CredentialRecord> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
