mod handlers;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{extract::DefaultBodyLimit, routing::post, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::{Summarizer, Transcriber};

/// Shared state behind the HTTP handlers. Handlers are generic over the
/// two client seams so tests can drive the router with mocks.
pub struct AppState<S, T> {
    pub summarizer: S,
    pub transcriber: T,
    pub audio_dir: PathBuf,
}

pub fn router<S, T>(state: AppState<S, T>, max_upload_bytes: usize) -> Router
where
    S: Summarizer + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/summarize", post(handlers::summarize::<S, T>))
        .route("/transcribe", post(handlers::transcribe::<S, T>))
        .route("/transcribe_blob", post(handlers::transcribe_blob::<S, T>))
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(Arc::new(state))
}

pub async fn serve(addr: SocketAddr, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening for requests...");
    axum::serve(listener, app).await?;
    Ok(())
}
