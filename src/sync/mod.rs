pub mod job;
pub mod reader;
pub mod report;
pub mod synchronizer;
#[cfg(test)]
pub mod testing;

pub use job::{SpotifySyncJob, SyncJob};
pub use reader::get_playlist_tracks;
pub use report::SyncReport;
pub use synchronizer::{TrackSynchronizer, new_track_uris};
