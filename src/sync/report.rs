/// Outcome of one synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub source_playlist_id: String,
    pub destination_playlist_id: String,
    pub source_tracks: usize,
    pub destination_tracks: usize,
    pub new_tracks: usize,
    pub chunks_sent: usize,
}

impl SyncReport {
    pub const STATUS_OK: &'static str = "OK";

    pub fn new(source_playlist_id: &str, destination_playlist_id: &str) -> Self {
        Self {
            source_playlist_id: source_playlist_id.to_string(),
            destination_playlist_id: destination_playlist_id.to_string(),
            ..Default::default()
        }
    }

    /// A finished run always reports the same status; failures are errors.
    pub fn status(&self) -> &'static str {
        Self::STATUS_OK
    }
}
