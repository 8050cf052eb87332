use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{error::ApiError, RecognitionConfig, Summarizer, Transcriber, TranscriptResult};

#[derive(Debug, Deserialize)]
pub(super) struct SummarizeRequest {
    text: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SummarizeResponse {
    original: String,
    summary: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct TranscribeRequest {
    filename: String,
}

pub(super) async fn summarize<S, T>(
    State(state): State<Arc<AppState<S, T>>>,
    Json(payload): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiError>
where
    S: Summarizer + Send + Sync,
    T: Transcriber + Send + Sync,
{
    let summary = state
        .summarizer
        .summarize(payload.text.as_str())
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "Failed to summarize text");
            ApiError::internal()
        })?;

    Ok(Json(SummarizeResponse {
        original: payload.text,
        summary,
    }))
}

/// Transcribes a file already present in the audio directory. Files on
/// disk are uncompressed wav, so the LINEAR16 config is always used here.
pub(super) async fn transcribe<S, T>(
    State(state): State<Arc<AppState<S, T>>>,
    Json(payload): Json<TranscribeRequest>,
) -> Result<Json<TranscriptResult>, ApiError>
where
    S: Summarizer + Send + Sync,
    T: Transcriber + Send + Sync,
{
    let path = audio_file_path(&state.audio_dir, &payload.filename)?;

    let transcript = state
        .transcriber
        .transcribe(&path, RecognitionConfig::wav())
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "Failed to transcribe audio");
            ApiError::internal()
        })?;

    Ok(Json(transcript))
}

/// Accepts a multipart upload in the `file` field, stores it under the
/// audio directory with the client-supplied name, and transcribes it with
/// a config chosen by file extension.
pub(super) async fn transcribe_blob<S, T>(
    State(state): State<Arc<AppState<S, T>>>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptResult>, ApiError>
where
    S: Summarizer + Send + Sync,
    T: Transcriber + Send + Sync,
{
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .ok_or_else(|| ApiError::bad_request("file field is missing a filename"))?
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
            upload = Some((filename, bytes));
            break;
        }
    }

    let Some((filename, bytes)) = upload else {
        return Err(ApiError::bad_request("multipart field `file` is required"));
    };

    let path = audio_file_path(&state.audio_dir, &filename)?;
    tokio::fs::write(&path, &bytes).await.map_err(|e| {
        tracing::error!(error = %e, path = %path.display(), "Failed to store uploaded audio");
        ApiError::internal()
    })?;
    tracing::info!(path = %path.display(), size = bytes.len(), "Stored uploaded audio");

    let transcript = state
        .transcriber
        .transcribe(&path, recognition_config_for(&path))
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "Failed to transcribe audio");
            ApiError::internal()
        })?;

    Ok(Json(transcript))
}

/// Joins `filename` under the audio directory. Anything other than a bare
/// file name (separators, `..`, absolute paths) is rejected.
fn audio_file_path(audio_dir: &Path, filename: &str) -> Result<PathBuf, ApiError> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Ok(audio_dir.join(name)),
        _ => Err(ApiError::bad_request(format!(
            "invalid filename: {filename:?}"
        ))),
    }
}

fn recognition_config_for(path: &Path) -> RecognitionConfig {
    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    if is_wav {
        RecognitionConfig::wav()
    } else {
        RecognitionConfig::webm()
    }
}
