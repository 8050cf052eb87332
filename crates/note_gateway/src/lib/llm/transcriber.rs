use std::{fmt::Debug, future::Future, path::Path};

use serde::{Deserialize, Serialize};

pub trait Transcriber {
    type Error: Debug;

    /// Transcribes the audio file at `audio_path` using the given
    /// recognition parameters. Implementations are expected to memoize on
    /// the path, so repeat calls for the same file must not hit the
    /// recognition API again.
    fn transcribe(
        &self,
        audio_path: &Path,
        config: RecognitionConfig,
    ) -> impl Future<Output = Result<TranscriptResult, Self::Error>> + Send;
}

/// Recognition parameters in the shape the speech API expects on the wire.
///
/// Use [`RecognitionConfig::wav`] for raw LINEAR16 uploads and
/// [`RecognitionConfig::webm`] for containers that carry their own encoding
/// parameters in the header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<AudioEncoding>,
    pub sample_rate_hertz: u32,
    pub language_code: String,
    pub audio_channel_count: u32,
    pub enable_automatic_punctuation: bool,
    pub enable_word_time_offsets: bool,
    pub enable_word_confidence: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AudioEncoding {
    #[serde(rename = "LINEAR16")]
    Linear16,
}

impl RecognitionConfig {
    pub fn wav() -> Self {
        Self {
            encoding: Some(AudioEncoding::Linear16),
            ..Self::container_default()
        }
    }

    /// No explicit encoding; the service reads it from the container header.
    pub fn webm() -> Self {
        Self::container_default()
    }

    fn container_default() -> Self {
        Self {
            encoding: None,
            sample_rate_hertz: 48_000,
            language_code: "en-US".to_string(),
            audio_channel_count: 1,
            enable_automatic_punctuation: true,
            enable_word_time_offsets: true,
            enable_word_confidence: true,
        }
    }
}

/// A single recognized word with its confidence and time offsets in
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptWord {
    pub word: String,
    pub confidence: f32,
    pub start_time: f64,
    pub stop_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub text: String,
    pub words: Vec<TranscriptWord>,
}
