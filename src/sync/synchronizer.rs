use std::collections::HashSet;
use tracing::info;

use crate::error::Result;
use crate::spotify::{MAX_ITEMS_PER_REQUEST, PlaylistService, TrackRef};
use crate::sync::reader::get_playlist_tracks;
use crate::sync::report::SyncReport;

/// URIs of `source` entries whose URI is not in `destination`, in source
/// order. Repeats within the source are kept.
pub fn new_track_uris(source: &[TrackRef], destination: &[TrackRef]) -> Vec<String> {
    let existing: HashSet<&str> = destination.iter().map(|t| t.uri.as_str()).collect();

    source
        .iter()
        .filter(|t| !existing.contains(t.uri.as_str()))
        .map(|t| t.uri.clone())
        .collect()
}

/// Copies tracks missing from a destination playlist out of a source one.
///
/// Each chunk is committed by the remote independently. If a write fails the
/// chunks already sent stay applied and the error is returned; running again
/// recomputes the remaining difference.
pub struct TrackSynchronizer<P> {
    service: P,
}

impl<P: PlaylistService> TrackSynchronizer<P> {
    pub fn new(service: P) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &P {
        &self.service
    }

    pub async fn copy_tracks(
        &self,
        source_playlist_id: &str,
        destination_playlist_id: &str,
    ) -> Result<SyncReport> {
        info!("Copying tracks");
        let mut report = SyncReport::new(source_playlist_id, destination_playlist_id);

        let destination_tracks = get_playlist_tracks(&self.service, destination_playlist_id).await?;
        let source_tracks = get_playlist_tracks(&self.service, source_playlist_id).await?;
        report.destination_tracks = destination_tracks.len();
        report.source_tracks = source_tracks.len();

        let new_tracks = new_track_uris(&source_tracks, &destination_tracks);
        report.new_tracks = new_tracks.len();
        info!(
            "Found {}/{} new tracks",
            new_tracks.len(),
            source_tracks.len()
        );

        for chunk in new_tracks.chunks(MAX_ITEMS_PER_REQUEST) {
            info!(
                "Sending chunk of {} tracks to {}",
                chunk.len(),
                destination_playlist_id
            );
            self.service.add_items(destination_playlist_id, chunk).await?;
            report.chunks_sent += 1;
        }

        info!("Done. Copied {} tracks", new_tracks.len());
        Ok(report)
    }
}
