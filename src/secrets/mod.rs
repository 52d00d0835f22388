pub mod cache;
pub mod gcp;
#[cfg(test)]
pub mod memory;
pub mod store;

pub use cache::CredentialCache;
pub use gcp::GoogleSecretManager;
pub use store::{SecretStore, SecretVersion, VersionState};
