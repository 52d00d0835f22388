use rspotify::model::{PlayableItem, PlaylistItem};
use rspotify::prelude::*;
use tracing::debug;

/// One entry of a playlist, identified by its Spotify URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRef {
    pub uri: String,
    pub position: usize,
}

impl TrackRef {
    pub fn new(uri: impl Into<String>, position: usize) -> Self {
        Self {
            uri: uri.into(),
            position,
        }
    }
}

/// One batch of playlist entries and the offset of the next batch, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<TrackRef>,
    pub next_offset: Option<u32>,
}

/// Maps a playlist item to a reference that can be written back through the
/// API. Local files and removed items have no Spotify id and are skipped.
pub fn track_ref_from_item(item: &PlaylistItem, position: usize) -> Option<TrackRef> {
    match &item.track {
        Some(PlayableItem::Track(track)) => match &track.id {
            Some(id) => Some(TrackRef::new(id.uri(), position)),
            None => {
                debug!("Skipping local track: {}", track.name);
                None
            }
        },
        Some(PlayableItem::Episode(episode)) => Some(TrackRef::new(episode.id.uri(), position)),
        _ => {
            debug!("Skipping unavailable item at position {}", position);
            None
        }
    }
}

#[cfg(test)]
impl TrackRef {
    pub fn mock(n: usize) -> Self {
        Self::new(format!("spotify:track:track{:018}", n), n)
    }
}
