use url::Url;

use crate::error::{AppError, Result};

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/callback";
pub const DEFAULT_PORT: u16 = 8080;

/// Credentials and secret location shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Config {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_redirect_uri: String,
    pub gcp_project_id: String,
    pub gcp_secret_id: String,
    pub gcp_access_token: Option<String>,
}

/// The source and destination of a synchronization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistPair {
    pub source_playlist_id: String,
    pub destination_playlist_id: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut required = |key: &str| match lookup(key).filter(|v| !v.is_empty()) {
            Some(value) => value,
            None => {
                missing.push(key.to_string());
                String::new()
            }
        };

        let spotify_client_id = required("SPOTIFY_CLIENT_ID");
        let spotify_client_secret = required("SPOTIFY_CLIENT_SECRET");
        let gcp_project_id = required("GCP_PROJECT_ID");
        let gcp_secret_id = required("GCP_SECRET_ID");

        if !missing.is_empty() {
            return Err(AppError::Config(format!("missing {}", missing.join(", "))));
        }

        let spotify_redirect_uri = lookup("SPOTIFY_REDIRECT_URI")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());
        Url::parse(&spotify_redirect_uri).map_err(|e| {
            AppError::Config(format!("SPOTIFY_REDIRECT_URI is not a valid URL: {}", e))
        })?;

        Ok(Self {
            spotify_client_id,
            spotify_client_secret,
            spotify_redirect_uri,
            gcp_project_id,
            gcp_secret_id,
            gcp_access_token: lookup("GCP_ACCESS_TOKEN").filter(|v| !v.is_empty()),
        })
    }

    /// Full resource name of the logical secret holding the token.
    pub fn secret_name(&self) -> String {
        format!(
            "projects/{}/secrets/{}",
            self.gcp_project_id, self.gcp_secret_id
        )
    }
}

impl PlaylistPair {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = lookup("SOURCE_PLAYLIST_ID").filter(|v| !v.is_empty());
        let destination = lookup("DESTINATION_PLAYLIST_ID").filter(|v| !v.is_empty());

        match (source, destination) {
            (Some(source_playlist_id), Some(destination_playlist_id)) => Ok(Self {
                source_playlist_id,
                destination_playlist_id,
            }),
            (None, Some(_)) => Err(AppError::Config("missing SOURCE_PLAYLIST_ID".into())),
            (Some(_), None) => Err(AppError::Config("missing DESTINATION_PLAYLIST_ID".into())),
            (None, None) => Err(AppError::Config(
                "missing SOURCE_PLAYLIST_ID, DESTINATION_PLAYLIST_ID".into(),
            )),
        }
    }
}
