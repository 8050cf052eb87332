use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use response_store::{ResponseStore, StoreError};
use serde::{Deserialize, Serialize};

use crate::{RecognitionConfig, Transcriber, TranscriptResult, TranscriptWord};

/// Google Cloud Speech recognition client with an on-disk response store.
///
/// Responses are memoized on the audio path before the file is even read,
/// so a stored path never touches the filesystem or the API again.
pub struct GoogleSpeechClient<S: ResponseStore> {
    client: Client,
    access_token: String,
    base_url: String,
    store: S,
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to read audio file {path}: {source}")]
    Audio {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("malformed duration in response: {0:?}")]
    MalformedDuration(String),
}

impl<S: ResponseStore> GoogleSpeechClient<S> {
    pub fn new(access_token: impl Into<String>, store: S) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            base_url: "https://speech.googleapis.com".into(),
            store,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn send_recognize_request(
        &self,
        config: &RecognitionConfig,
        content: String,
    ) -> Result<RecognizeResponse, SpeechError> {
        let body = RecognizeRequest {
            config,
            audio: RecognitionAudio { content },
        };

        let resp = self
            .client
            .post(format!("{}/v1/speech:recognize", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SpeechError::Api { status, message });
        }

        Ok(resp.json::<RecognizeResponse>().await?)
    }
}

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    config: &'a RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SpeechRecognitionResult>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRecognitionResult {
    #[serde(default)]
    pub alternatives: Vec<SpeechRecognitionAlternative>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRecognitionAlternative {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<WordInfo>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordInfo {
    pub word: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// Collapses a recognize response to a single transcript.
///
/// Segments are visited in order and each one replaces the accumulated text
/// and word list, so only the last segment with an alternative survives.
/// Segments without alternatives are skipped, and an empty result list
/// collapses to an empty transcript rather than an error.
fn flatten_response(response: &RecognizeResponse) -> Result<TranscriptResult, SpeechError> {
    let mut flattened = TranscriptResult::default();

    for result in response.results.as_deref().unwrap_or_default() {
        let Some(alternative) = result.alternatives.first() else {
            continue;
        };

        flattened.text = alternative.transcript.clone().unwrap_or_default();
        flattened.words = alternative
            .words
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(word_timing)
            .collect::<Result<_, _>>()?;
    }

    Ok(flattened)
}

fn word_timing(word: &WordInfo) -> Result<TranscriptWord, SpeechError> {
    Ok(TranscriptWord {
        word: word.word.clone(),
        confidence: word.confidence,
        start_time: duration_ms(word.start_time.as_deref())?,
        stop_time: duration_ms(word.end_time.as_deref())?,
    })
}

/// Offsets arrive as duration strings like `"1.300s"`. The API omits
/// zero-valued offsets entirely, so a missing string is zero.
fn duration_ms(value: Option<&str>) -> Result<f64, SpeechError> {
    let Some(value) = value else {
        return Ok(0.0);
    };
    let seconds = value
        .strip_suffix('s')
        .and_then(|raw| raw.parse::<f64>().ok())
        .ok_or_else(|| SpeechError::MalformedDuration(value.to_string()))?;
    Ok(seconds * 1000.0)
}

impl<S: ResponseStore + Send + Sync> Transcriber for GoogleSpeechClient<S> {
    type Error = SpeechError;

    #[tracing::instrument(skip(self, config))]
    async fn transcribe(
        &self,
        audio_path: &Path,
        config: RecognitionConfig,
    ) -> Result<TranscriptResult, SpeechError> {
        let key = audio_path.as_os_str().as_encoded_bytes();

        let response: RecognizeResponse = self
            .store
            .get_or_compute(key, || async {
                let bytes =
                    tokio::fs::read(audio_path)
                        .await
                        .map_err(|source| SpeechError::Audio {
                            path: audio_path.to_path_buf(),
                            source,
                        })?;
                let content = general_purpose::STANDARD.encode(&bytes);
                self.send_recognize_request(&config, content).await
            })
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to transcribe audio"))?;

        flatten_response(&response)
    }
}
