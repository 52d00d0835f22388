use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::Result;

/// Lifecycle state of one secret version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionState {
    Enabled,
    Disabled,
    Destroyed,
    #[serde(other)]
    StateUnspecified,
}

/// Metadata of one version in a secret's version chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretVersion {
    /// Full resource name, `projects/*/secrets/*/versions/*`.
    pub name: String,
    pub create_time: DateTime<Utc>,
    pub state: VersionState,
}

impl SecretVersion {
    pub fn is_destroyed(&self) -> bool {
        self.state == VersionState::Destroyed
    }
}

/// An append-only log of versions for a single logical secret.
///
/// Versions are never updated in place. Writers append a new version and
/// readers take the most recent one that has not been destroyed.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Human-readable name of the logical secret, used in logs and errors.
    fn secret_name(&self) -> &str;

    /// Payload of the latest version.
    ///
    /// Fails with `AppError::TokenNotFound` when the secret has no accessible
    /// version.
    async fn access_latest(&self) -> Result<Vec<u8>>;

    /// Appends a new version holding `payload`.
    async fn add_version(&self, payload: &[u8]) -> Result<SecretVersion>;

    /// Metadata of the version the `latest` alias currently resolves to.
    async fn latest_version(&self) -> Result<SecretVersion>;

    /// Every version of the secret, in any state.
    async fn list_versions(&self) -> Result<Vec<SecretVersion>>;

    /// Irreversibly destroys one version's payload.
    ///
    /// Fails with `AppError::VersionAlreadyDestroyed` when the version is
    /// already in the destroyed state.
    async fn destroy_version(&self, name: &str) -> Result<()>;
}
