use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use note_gateway::{RecognitionConfig, Transcriber, TranscriptResult, TranscriptWord};

#[derive(Clone)]
pub struct MockTranscriber {
    pub result: TranscriptResult,
    pub calls: Arc<Mutex<Vec<(PathBuf, RecognitionConfig)>>>,
    pub fail_with: Option<String>,
}

impl MockTranscriber {
    pub fn new(text: &str) -> Self {
        let first_word = text.split_whitespace().next().unwrap_or_default();
        Self {
            result: TranscriptResult {
                text: text.to_string(),
                words: vec![TranscriptWord {
                    word: first_word.to_string(),
                    confidence: 0.97,
                    start_time: 0.0,
                    stop_time: 450.0,
                }],
            },
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            result: TranscriptResult::default(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl Transcriber for MockTranscriber {
    type Error = anyhow::Error;

    async fn transcribe(
        &self,
        audio_path: &Path,
        config: RecognitionConfig,
    ) -> Result<TranscriptResult, Self::Error> {
        self.calls
            .lock()
            .unwrap()
            .push((audio_path.to_path_buf(), config));
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.result.clone())
    }
}
