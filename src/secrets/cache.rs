use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::secrets::store::SecretStore;

/// Latest-wins token cache layered over an append-only secret store.
///
/// The token record is stored verbatim as JSON. Every save appends a new
/// version, and the older versions are then destroyed so only one usable
/// generation is kept around.
pub struct CredentialCache<S> {
    store: S,
}

impl<S: SecretStore> CredentialCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn get_cached_token<T: DeserializeOwned>(&self) -> Result<T> {
        let payload = self.store.access_latest().await?;
        let token = serde_json::from_slice(&payload)?;
        Ok(token)
    }

    /// Appends `token` as the new latest version.
    ///
    /// The save succeeds as soon as the version is created. Pruning failures
    /// are logged and never reported to the caller.
    pub async fn save_token_to_cache<T: Serialize>(
        &self,
        token: &T,
        prune_old: bool,
    ) -> Result<()> {
        info!("Saving token to cache");
        let payload = serde_json::to_vec(token)?;
        let created = self.store.add_version(&payload).await?;
        debug!("Created version {}", created.name);

        if prune_old {
            self.prune_old_versions().await;
        }

        Ok(())
    }

    /// Destroys every non-destroyed version other than the latest one and
    /// returns how many were destroyed.
    pub async fn prune_old_versions(&self) -> usize {
        debug!("Deleting old versions of {}", self.store.secret_name());

        let latest = match self.store.latest_version().await {
            Ok(version) => version,
            Err(e) => {
                warn!("Skipping pruning, could not resolve latest version: {}", e);
                return 0;
            }
        };
        debug!("Latest version is {}", latest.name);

        let versions = match self.store.list_versions().await {
            Ok(versions) => versions,
            Err(e) => {
                warn!("Skipping pruning, could not list versions: {}", e);
                return 0;
            }
        };

        let mut destroyed = 0;
        for version in versions
            .iter()
            .filter(|v| v.name != latest.name && !v.is_destroyed())
        {
            debug!("Deleting version {}", version.name);
            match self.store.destroy_version(&version.name).await {
                Ok(()) => destroyed += 1,
                Err(AppError::VersionAlreadyDestroyed(_)) => {
                    debug!("Version {} was already destroyed", version.name);
                }
                Err(e) => {
                    warn!("Failed to delete version {}: {}", version.name, e);
                }
            }
        }

        destroyed
    }
}
