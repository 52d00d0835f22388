//! In-memory secret store with failure injection, for tests.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{AppError, Result};
use crate::secrets::store::{SecretStore, SecretVersion, VersionState};

#[derive(Debug, Clone, Copy)]
enum DestroyFailure {
    AlreadyDestroyed,
    Unavailable,
}

#[derive(Default)]
struct Inner {
    versions: Vec<(SecretVersion, Vec<u8>)>,
    destroy_failures: HashMap<String, DestroyFailure>,
    destroy_calls: usize,
    unavailable: bool,
}

pub struct InMemorySecretStore {
    name: String,
    inner: Mutex<Inner>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self {
            name: "projects/test/secrets/token".to_string(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Appends a version directly and returns its name.
    pub fn push_version(&self, payload: &[u8]) -> String {
        let mut inner = self.inner.lock().unwrap();
        Self::append(&self.name, &mut inner, payload).name
    }

    /// The next destroy of `name` marks it destroyed, as a concurrent pruner
    /// would, and then reports it as already destroyed.
    pub fn fail_destroy_as_already_destroyed(&self, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .destroy_failures
            .insert(name.to_string(), DestroyFailure::AlreadyDestroyed);
    }

    pub fn fail_destroy_unavailable(&self, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .destroy_failures
            .insert(name.to_string(), DestroyFailure::Unavailable);
    }

    /// Makes every call fail as if the store could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unwrap().unavailable = unavailable;
    }

    pub fn version_count(&self) -> usize {
        self.inner.lock().unwrap().versions.len()
    }

    pub fn live_versions(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.versions.iter().filter(|(v, _)| !v.is_destroyed()).count()
    }

    pub fn destroy_calls(&self) -> usize {
        self.inner.lock().unwrap().destroy_calls
    }

    fn append(secret: &str, inner: &mut Inner, payload: &[u8]) -> SecretVersion {
        let number = inner.versions.len() + 1;
        // Deterministic, strictly increasing creation times.
        let create_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + Duration::seconds(number as i64);
        let version = SecretVersion {
            name: format!("{}/versions/{}", secret, number),
            create_time,
            state: VersionState::Enabled,
        };
        inner.versions.push((version.clone(), payload.to_vec()));
        version
    }

    fn check_available(&self, inner: &Inner) -> Result<()> {
        if inner.unavailable {
            return Err(AppError::SecretStore(format!("{} is unreachable", self.name)));
        }
        Ok(())
    }

    fn latest(inner: &Inner) -> Option<&(SecretVersion, Vec<u8>)> {
        inner
            .versions
            .iter()
            .filter(|(v, _)| !v.is_destroyed())
            .max_by_key(|(v, _)| v.create_time)
    }
}

impl Default for InMemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    fn secret_name(&self) -> &str {
        &self.name
    }

    async fn access_latest(&self) -> Result<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        self.check_available(&inner)?;
        Self::latest(&inner)
            .map(|(_, payload)| payload.clone())
            .ok_or_else(|| AppError::TokenNotFound(self.name.clone()))
    }

    async fn add_version(&self, payload: &[u8]) -> Result<SecretVersion> {
        let mut inner = self.inner.lock().unwrap();
        self.check_available(&inner)?;
        Ok(Self::append(&self.name, &mut inner, payload))
    }

    async fn latest_version(&self) -> Result<SecretVersion> {
        let inner = self.inner.lock().unwrap();
        self.check_available(&inner)?;
        Self::latest(&inner)
            .map(|(v, _)| v.clone())
            .ok_or_else(|| AppError::SecretStore(format!("{} has no versions", self.name)))
    }

    async fn list_versions(&self) -> Result<Vec<SecretVersion>> {
        let inner = self.inner.lock().unwrap();
        self.check_available(&inner)?;
        Ok(inner.versions.iter().map(|(v, _)| v.clone()).collect())
    }

    async fn destroy_version(&self, name: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        self.check_available(&inner)?;
        inner.destroy_calls += 1;

        let failure = inner.destroy_failures.remove(name);
        let (version, payload) = inner
            .versions
            .iter_mut()
            .find(|(v, _)| v.name == name)
            .ok_or_else(|| AppError::SecretStore(format!("{} not found", name)))?;

        match failure {
            Some(DestroyFailure::Unavailable) => {
                Err(AppError::SecretStore(format!("{} is unreachable", self.name)))
            }
            Some(DestroyFailure::AlreadyDestroyed) => {
                version.state = VersionState::Destroyed;
                payload.clear();
                Err(AppError::VersionAlreadyDestroyed(name.to_string()))
            }
            None if version.is_destroyed() => {
                Err(AppError::VersionAlreadyDestroyed(name.to_string()))
            }
            None => {
                version.state = VersionState::Destroyed;
                payload.clear();
                Ok(())
            }
        }
    }
}
