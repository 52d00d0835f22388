use async_trait::async_trait;
use rspotify::{
    AuthCodeSpotify,
    model::{EpisodeId, PlayableId, PlaylistId, TrackId},
    prelude::*,
};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::spotify::models::{Page, TrackRef, track_ref_from_item};
use crate::spotify::service::{MAX_ITEMS_PER_REQUEST, PlaylistService};

pub struct SpotifyClient {
    client: AuthCodeSpotify,
}

impl SpotifyClient {
    /// Wraps an rspotify client that already holds a valid user token.
    pub fn new(client: AuthCodeSpotify) -> Self {
        Self { client }
    }
}

/// Accepts a bare playlist id or a `spotify:playlist:` URI.
pub fn parse_playlist_id(playlist_id: &str) -> Result<PlaylistId<'static>> {
    PlaylistId::from_id_or_uri(playlist_id)
        .map(|id| id.into_static())
        .map_err(|e| AppError::InvalidId(format!("{}: {}", playlist_id, e)))
}

pub fn parse_playable_uri(uri: &str) -> Result<PlayableId<'static>> {
    let parsed = if uri.starts_with("spotify:episode:") {
        EpisodeId::from_uri(uri).map(|id| PlayableId::Episode(id.into_static()))
    } else {
        TrackId::from_uri(uri).map(|id| PlayableId::Track(id.into_static()))
    };
    parsed.map_err(|e| AppError::InvalidId(format!("{}: {}", uri, e)))
}

#[async_trait]
impl PlaylistService for SpotifyClient {
    async fn playlist_items_page(&self, playlist_id: &str, offset: u32) -> Result<Page> {
        let id = parse_playlist_id(playlist_id)?;
        let page = self
            .client
            .playlist_items_manual(
                id,
                None,
                None,
                Some(MAX_ITEMS_PER_REQUEST as u32),
                Some(offset),
            )
            .await?;

        let items: Vec<TrackRef> = page
            .items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| track_ref_from_item(item, offset as usize + i))
            .collect();

        debug!(
            "Fetched {} items of {} from playlist {} at offset {}",
            page.items.len(),
            page.total,
            playlist_id,
            offset
        );

        Ok(Page {
            items,
            next_offset: page.next.as_ref().map(|_| page.offset + page.limit),
        })
    }

    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        if uris.is_empty() {
            return Ok(());
        }
        if uris.len() > MAX_ITEMS_PER_REQUEST {
            return Err(AppError::InvalidId(format!(
                "cannot add {} items in one request, the limit is {}",
                uris.len(),
                MAX_ITEMS_PER_REQUEST
            )));
        }

        let id = parse_playlist_id(playlist_id)?;
        let items = uris
            .iter()
            .map(|uri| parse_playable_uri(uri))
            .collect::<Result<Vec<_>>>()?;

        self.client.playlist_add_items(id, items, None).await?;
        Ok(())
    }
}
