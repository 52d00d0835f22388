pub mod config;
pub mod error;
pub mod secrets;
pub mod spotify;
pub mod sync;
pub mod trigger;

pub use config::{Config, PlaylistPair};
pub use error::{AppError, Result};
pub use secrets::{CredentialCache, GoogleSecretManager, SecretStore};
pub use spotify::{SpotifyAuth, SpotifyClient, TrackRef};
pub use sync::{SpotifySyncJob, SyncJob, SyncReport, TrackSynchronizer};
