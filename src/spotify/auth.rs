use chrono::{Duration, Utc};
use rspotify::{
    AuthCodeSpotify, Config as SpotifyConfig, Credentials, OAuth, Token, prelude::*, scopes,
};
use std::io::{self, Write};
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::secrets::{CredentialCache, SecretStore};

/// Tokens this close to expiry are refreshed before a run starts.
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// rspotify authorization-code client backed by the secret-store token cache.
pub struct SpotifyAuth<S> {
    creds: Credentials,
    oauth: OAuth,
    spotify_config: SpotifyConfig,
    cache: CredentialCache<S>,
}

impl<S: SecretStore> SpotifyAuth<S> {
    pub fn new(config: &Config, store: S) -> Self {
        let creds = Credentials::new(&config.spotify_client_id, &config.spotify_client_secret);

        let oauth = OAuth {
            redirect_uri: config.spotify_redirect_uri.clone(),
            scopes: scopes!("playlist-read-private", "playlist-modify-private"),
            ..Default::default()
        };

        Self {
            creds,
            oauth,
            spotify_config: SpotifyConfig {
                token_refreshing: false,
                ..Default::default()
            },
            cache: CredentialCache::new(store),
        }
    }

    /// Replaces rspotify's client settings, e.g. to use another accounts
    /// endpoint. Automatic refreshing stays off, since a token rspotify
    /// refreshes on its own never reaches the cache.
    pub fn with_spotify_config(mut self, config: SpotifyConfig) -> Self {
        self.spotify_config = SpotifyConfig {
            token_refreshing: false,
            ..config
        };
        self
    }

    pub fn cache(&self) -> &CredentialCache<S> {
        &self.cache
    }

    /// Loads the cached token, refreshing and re-saving it when it is
    /// expired or about to expire, and returns a client holding it.
    pub async fn authorized_client(&self) -> Result<AuthCodeSpotify> {
        let cached: Token = self.cache.get_cached_token().await?;
        let client = AuthCodeSpotify::from_token_with_config(
            cached.clone(),
            self.creds.clone(),
            self.oauth.clone(),
            self.spotify_config.clone(),
        );

        if needs_refresh(&cached) {
            info!("Cached Spotify token expired, refreshing");
            client.refresh_token().await?;

            let refreshed = keep_refresh_token(current_token(&client).await?, &cached);
            self.cache.save_token_to_cache(&refreshed, true).await?;
        }

        Ok(client)
    }

    pub async fn get_access_token(&self) -> Result<String> {
        let client = self.authorized_client().await?;
        Ok(current_token(&client).await?.access_token)
    }

    /// One-time bootstrap: runs the authorization-code flow on the terminal
    /// and stores the resulting token, ignoring whatever is cached.
    pub async fn authorize_interactive(&self) -> Result<()> {
        let client = AuthCodeSpotify::with_config(
            self.creds.clone(),
            self.oauth.clone(),
            self.spotify_config.clone(),
        );

        let auth_url = client.get_authorize_url(true)?;
        println!("\nOpen this URL in your browser to authorize Spotify:");
        println!("{}\n", auth_url);

        print!("Enter the URL you were redirected to: ");
        io::stdout().flush()?;

        let mut redirect_url = String::new();
        io::stdin().read_line(&mut redirect_url)?;

        let code = client
            .parse_response_code(redirect_url.trim())
            .ok_or_else(|| AppError::Auth("Failed to parse authorization code".into()))?;

        client.request_token(&code).await?;

        let token = current_token(&client).await?;
        self.cache.save_token_to_cache(&token, true).await?;

        info!(
            "Stored Spotify token in {}",
            self.cache.store().secret_name()
        );
        Ok(())
    }
}

fn needs_refresh(token: &Token) -> bool {
    let deadline = Utc::now() + Duration::minutes(REFRESH_MARGIN_MINUTES);
    token.expires_at.is_none_or(|expires_at| expires_at <= deadline)
}

/// Spotify may omit the refresh token from a refresh response; the previous
/// one then stays valid.
fn keep_refresh_token(mut refreshed: Token, previous: &Token) -> Token {
    if refreshed.refresh_token.is_none() {
        refreshed.refresh_token = previous.refresh_token.clone();
    }
    refreshed
}

async fn current_token(client: &AuthCodeSpotify) -> Result<Token> {
    let token = client.get_token();
    let guard = token
        .lock()
        .await
        .map_err(|_| AppError::Auth("Spotify token lock poisoned".into()))?;
    guard
        .clone()
        .ok_or_else(|| AppError::Auth("Spotify client holds no token".into()))
}
