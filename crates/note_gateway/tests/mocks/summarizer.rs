use std::sync::{Arc, Mutex};

use note_gateway::Summarizer;

#[derive(Clone)]
pub struct MockSummarizer {
    pub response_text: String,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockSummarizer {
    pub fn new(response_text: &str) -> Self {
        Self {
            response_text: response_text.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            response_text: String::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl Summarizer for MockSummarizer {
    const SUMMARIZER_MODEL: &'static str = "mock-jumbo";
    type Error = anyhow::Error;

    async fn summarize(&self, text: impl Into<String> + Send) -> Result<String, Self::Error> {
        self.calls.lock().unwrap().push(text.into());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.response_text.clone())
    }
}
