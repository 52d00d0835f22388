use tracing::info;

use crate::error::Result;
use crate::spotify::{PlaylistService, TrackRef};

/// Fetches every entry of `playlist_id`, following pages until the service
/// reports no further page. The whole playlist is held in memory.
pub async fn get_playlist_tracks<P>(service: &P, playlist_id: &str) -> Result<Vec<TrackRef>>
where
    P: PlaylistService + ?Sized,
{
    let mut page = service.playlist_items_page(playlist_id, 0).await?;
    let mut tracks = std::mem::take(&mut page.items);

    while let Some(offset) = page.next_offset {
        info!("Fetching more tracks");
        page = service.playlist_items_page(playlist_id, offset).await?;
        tracks.append(&mut page.items);
    }

    info!("Playlist {} contains {} tracks", playlist_id, tracks.len());
    Ok(tracks)
}
