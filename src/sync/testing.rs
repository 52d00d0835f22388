//! Recording playlist service double.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::{AppError, Result};
use crate::spotify::{MAX_ITEMS_PER_REQUEST, Page, PlaylistService, TrackRef};

#[derive(Default)]
struct Inner {
    playlists: HashMap<String, Vec<String>>,
    page_requests: Vec<u32>,
    add_calls: Vec<(String, Vec<String>)>,
    failing_pages: HashSet<u32>,
    fail_add_call: Option<usize>,
}

/// Serves playlists from memory in pages of [`MAX_ITEMS_PER_REQUEST`] and
/// applies "add items" calls to them, recording every call.
pub struct FakePlaylistService {
    inner: Mutex<Inner>,
}

impl FakePlaylistService {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn set_playlist(&self, playlist_id: &str, tracks: Vec<TrackRef>) {
        let uris = tracks.into_iter().map(|t| t.uri).collect();
        self.inner
            .lock()
            .unwrap()
            .playlists
            .insert(playlist_id.to_string(), uris);
    }

    pub fn playlist(&self, playlist_id: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .playlists
            .get(playlist_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_page_at(&self, offset: u32) {
        self.inner.lock().unwrap().failing_pages.insert(offset);
    }

    /// Fails the `n`th add call (zero-based) once, without applying it.
    pub fn fail_add_call(&self, n: usize) {
        self.inner.lock().unwrap().fail_add_call = Some(n);
    }

    pub fn page_requests(&self) -> Vec<u32> {
        self.inner.lock().unwrap().page_requests.clone()
    }

    pub fn add_calls(&self) -> Vec<(String, Vec<String>)> {
        self.inner.lock().unwrap().add_calls.clone()
    }

    pub fn reset_calls(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.page_requests.clear();
        inner.add_calls.clear();
    }
}

fn remote_failure() -> AppError {
    AppError::SpotifyApi(rspotify::ClientError::Io(std::io::Error::other(
        "connection reset",
    )))
}

#[async_trait]
impl PlaylistService for FakePlaylistService {
    async fn playlist_items_page(&self, playlist_id: &str, offset: u32) -> Result<Page> {
        let mut inner = self.inner.lock().unwrap();
        inner.page_requests.push(offset);
        if inner.failing_pages.contains(&offset) {
            return Err(remote_failure());
        }

        let uris = inner.playlists.get(playlist_id).cloned().unwrap_or_default();
        let start = (offset as usize).min(uris.len());
        let end = (start + MAX_ITEMS_PER_REQUEST).min(uris.len());

        Ok(Page {
            items: uris[start..end]
                .iter()
                .enumerate()
                .map(|(i, uri)| TrackRef::new(uri.clone(), start + i))
                .collect(),
            next_offset: (end < uris.len()).then_some(end as u32),
        })
    }

    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let call = inner.add_calls.len();
        inner.add_calls.push((playlist_id.to_string(), uris.to_vec()));
        if inner.fail_add_call == Some(call) {
            inner.fail_add_call = None;
            return Err(remote_failure());
        }

        inner
            .playlists
            .entry(playlist_id.to_string())
            .or_default()
            .extend(uris.iter().cloned());
        Ok(())
    }
}
