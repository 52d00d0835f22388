use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::{AppError, Result};
use crate::sync::SyncJob;

/// Shared by every request. The lock serializes runs handled by this
/// process; separate processes are not coordinated.
#[derive(Clone)]
pub struct TriggerState {
    job: Arc<dyn SyncJob>,
    run_lock: Arc<Mutex<()>>,
}

impl TriggerState {
    pub fn new(job: Arc<dyn SyncJob>) -> Self {
        Self {
            job,
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::SecretStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

pub fn router(state: TriggerState) -> Router {
    Router::new()
        .route("/", get(copy_tracks).post(copy_tracks))
        .route("/health", get(health))
        .with_state(state)
}

async fn copy_tracks(State(state): State<TriggerState>) -> Result<&'static str> {
    let _guard = state.run_lock.lock().await;
    info!("Synchronization triggered");

    match state.job.run().await {
        Ok(report) => Ok(report.status()),
        Err(e) => {
            error!("Synchronization failed: {}", e);
            Err(e)
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn serve(state: TriggerState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
