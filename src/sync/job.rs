use async_trait::async_trait;
use tracing::info;

use crate::config::PlaylistPair;
use crate::error::Result;
use crate::secrets::SecretStore;
use crate::spotify::{SpotifyAuth, SpotifyClient};
use crate::sync::report::SyncReport;
use crate::sync::synchronizer::TrackSynchronizer;

/// One complete synchronization run for a fixed playlist pair.
#[async_trait]
pub trait SyncJob: Send + Sync {
    async fn run(&self) -> Result<SyncReport>;
}

/// Authenticates against Spotify through the token cache on every run and
/// copies new tracks between the configured playlists.
pub struct SpotifySyncJob<S> {
    auth: SpotifyAuth<S>,
    playlists: PlaylistPair,
}

impl<S: SecretStore> SpotifySyncJob<S> {
    pub fn new(auth: SpotifyAuth<S>, playlists: PlaylistPair) -> Self {
        Self { auth, playlists }
    }
}

#[async_trait]
impl<S: SecretStore> SyncJob for SpotifySyncJob<S> {
    async fn run(&self) -> Result<SyncReport> {
        let client = self.auth.authorized_client().await?;
        let synchronizer = TrackSynchronizer::new(SpotifyClient::new(client));

        let report = synchronizer
            .copy_tracks(
                &self.playlists.source_playlist_id,
                &self.playlists.destination_playlist_id,
            )
            .await?;

        info!(
            "Synchronized {} -> {}: {} new of {} source tracks in {} requests",
            report.source_playlist_id,
            report.destination_playlist_id,
            report.new_tracks,
            report.source_tracks,
            report.chunks_sent
        );
        Ok(report)
    }
}
