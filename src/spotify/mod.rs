pub mod auth;
pub mod client;
pub mod models;
pub mod service;

pub use auth::SpotifyAuth;
pub use client::SpotifyClient;
pub use models::{Page, TrackRef};
pub use service::{MAX_ITEMS_PER_REQUEST, PlaylistService};
