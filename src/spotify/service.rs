use async_trait::async_trait;

use crate::error::Result;
use crate::spotify::models::Page;

/// Maximum number of items Spotify accepts in one "add items" request, and
/// the page size used when listing.
pub const MAX_ITEMS_PER_REQUEST: usize = 100;

/// The two playlist calls a synchronization run needs.
#[async_trait]
pub trait PlaylistService: Send + Sync {
    /// Fetches the page of `playlist_id` starting at `offset`.
    async fn playlist_items_page(&self, playlist_id: &str, offset: u32) -> Result<Page>;

    /// Appends `uris` to the end of `playlist_id`, in order. At most
    /// [`MAX_ITEMS_PER_REQUEST`] entries.
    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<()>;
}
