use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::secrets::store::{SecretStore, SecretVersion};

const SECRET_MANAGER_API_BASE: &str = "https://secretmanager.googleapis.com/v1";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const LIST_PAGE_SIZE: &str = "100";

#[derive(Debug, Deserialize)]
struct AccessResponse {
    payload: Payload,
}

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListVersionsResponse {
    #[serde(default)]
    versions: Vec<SecretVersion>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

/// Where Secret Manager bearer tokens come from.
enum TokenSource {
    /// A token supplied out of band, e.g. `gcloud auth print-access-token`.
    Static(String),
    /// The GCE metadata server of the runtime's service account.
    Metadata(Mutex<Option<(String, Instant)>>),
}

/// Secret Manager v1 REST client bound to one logical secret.
pub struct GoogleSecretManager {
    http_client: Client,
    api_base: String,
    secret: String,
    tokens: TokenSource,
}

impl GoogleSecretManager {
    pub fn new(config: &Config) -> Self {
        let tokens = match &config.gcp_access_token {
            Some(token) => TokenSource::Static(token.clone()),
            None => TokenSource::Metadata(Mutex::new(None)),
        };

        Self {
            http_client: Client::new(),
            api_base: SECRET_MANAGER_API_BASE.to_string(),
            secret: config.secret_name(),
            tokens,
        }
    }

    /// Points the client at another endpoint, such as a local emulator.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    async fn bearer_token(&self) -> Result<String> {
        match &self.tokens {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Metadata(cached) => {
                let mut cached = cached.lock().await;
                if let Some((token, expires_at)) = cached.as_ref() {
                    if Instant::now() + TOKEN_EXPIRY_MARGIN < *expires_at {
                        return Ok(token.clone());
                    }
                }

                debug!("Fetching access token from metadata server");
                let response = self
                    .http_client
                    .get(METADATA_TOKEN_URL)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| AppError::SecretStore(format!("metadata server: {}", e)))?;

                if !response.status().is_success() {
                    return Err(AppError::SecretStore(format!(
                        "metadata server returned {}",
                        response.status()
                    )));
                }

                let token: MetadataToken = response.json().await.map_err(unavailable)?;
                let expires_at = Instant::now() + Duration::from_secs(token.expires_in);
                *cached = Some((token.access_token.clone(), expires_at));
                Ok(token.access_token)
            }
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        let token = self.bearer_token().await?;
        self.http_client
            .get(self.url(path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(unavailable)
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<Response> {
        let token = self.bearer_token().await?;
        self.http_client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(unavailable)
    }
}

fn unavailable(e: reqwest::Error) -> AppError {
    AppError::SecretStore(format!("request failed: {}", e))
}

/// Status and message of a failed call, read from Google's error envelope.
async fn read_error(response: Response) -> (StatusCode, String, String) {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let (code, message) = parse_error_body(&text);
    (status, code, message)
}

fn parse_error_body(text: &str) -> (String, String) {
    match serde_json::from_str::<ErrorResponse>(text) {
        Ok(body) => (body.error.status, body.error.message),
        Err(_) => (String::new(), text.to_string()),
    }
}

#[async_trait]
impl SecretStore for GoogleSecretManager {
    fn secret_name(&self) -> &str {
        &self.secret
    }

    async fn access_latest(&self) -> Result<Vec<u8>> {
        let response = self
            .get(&format!("{}/versions/latest:access", self.secret), &[])
            .await?;

        if !response.status().is_success() {
            let (status, code, message) = read_error(response).await;
            if status == StatusCode::NOT_FOUND || code == "NOT_FOUND" {
                return Err(AppError::TokenNotFound(self.secret.clone()));
            }
            return Err(AppError::SecretStore(format!(
                "access latest version failed ({}): {}",
                status, message
            )));
        }

        let body: AccessResponse = response.json().await.map_err(unavailable)?;
        Ok(STANDARD.decode(body.payload.data)?)
    }

    async fn add_version(&self, payload: &[u8]) -> Result<SecretVersion> {
        let body = serde_json::json!({ "payload": { "data": STANDARD.encode(payload) } });
        let response = self
            .post(&format!("{}:addVersion", self.secret), body)
            .await?;

        if !response.status().is_success() {
            let (status, _, message) = read_error(response).await;
            return Err(AppError::SecretStore(format!(
                "add version failed ({}): {}",
                status, message
            )));
        }

        response.json().await.map_err(unavailable)
    }

    async fn latest_version(&self) -> Result<SecretVersion> {
        let response = self
            .get(&format!("{}/versions/latest", self.secret), &[])
            .await?;

        if !response.status().is_success() {
            let (status, _, message) = read_error(response).await;
            return Err(AppError::SecretStore(format!(
                "get latest version failed ({}): {}",
                status, message
            )));
        }

        response.json().await.map_err(unavailable)
    }

    async fn list_versions(&self) -> Result<Vec<SecretVersion>> {
        let path = format!("{}/versions", self.secret);
        let mut versions = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", LIST_PAGE_SIZE)];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let response = self.get(&path, &query).await?;
            if !response.status().is_success() {
                let (status, _, message) = read_error(response).await;
                return Err(AppError::SecretStore(format!(
                    "list versions failed ({}): {}",
                    status, message
                )));
            }

            let page: ListVersionsResponse = response.json().await.map_err(unavailable)?;
            versions.extend(page.versions);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(versions)
    }

    async fn destroy_version(&self, name: &str) -> Result<()> {
        let response = self
            .post(&format!("{}:destroy", name), serde_json::json!({}))
            .await?;

        if !response.status().is_success() {
            let (status, code, message) = read_error(response).await;
            if code == "FAILED_PRECONDITION" {
                return Err(AppError::VersionAlreadyDestroyed(name.to_string()));
            }
            return Err(AppError::SecretStore(format!(
                "destroy {} failed ({}): {}",
                name, status, message
            )));
        }

        Ok(())
    }
}
