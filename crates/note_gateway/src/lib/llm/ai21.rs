use std::path::PathBuf;

use reqwest::Client;
use response_store::{ResponseStore, StoreError};
use serde::{Deserialize, Serialize};

use crate::Summarizer;

/// AI21 Studio completion client with an on-disk response store.
///
/// Summaries are memoized on the raw input text, not the rendered prompt,
/// so editing the template file does not invalidate stored entries.
pub struct Ai21Client<S: ResponseStore> {
    client: Client,
    api_key: String,
    base_url: String,
    template_path: PathBuf,
    store: S,
}

#[derive(Debug, thiserror::Error)]
pub enum Ai21Error {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to read summary template {path}: {source}")]
    Template {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("completion response contained no completions")]
    EmptyCompletion,
}

impl<S: ResponseStore> Ai21Client<S> {
    pub fn new(
        api_key: impl Into<String>,
        template_path: impl Into<PathBuf>,
        store: S,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.ai21.com".into(),
            template_path: template_path.into(),
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

    async fn build_prompt(&self, text: &str) -> Result<String, Ai21Error> {
        let template = tokio::fs::read_to_string(&self.template_path)
            .await
            .map_err(|source| Ai21Error::Template {
                path: self.template_path.clone(),
                source,
            })?;
        Ok(format!("{template}{text}\nsummary:"))
    }

    async fn send_completion_request(
        &self,
        model_name: &str,
        prompt: &str,
    ) -> Result<CompletionResponse, Ai21Error> {
        let body = CompletionRequest {
            prompt,
            params: &GenerationParams::default(),
        };

        let resp = self
            .client
            .post(format!(
                "{}/studio/v1/{}/complete",
                self.base_url, model_name
            ))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(Ai21Error::Api { status, message });
        }

        Ok(resp.json::<CompletionResponse>().await?)
    }
}

/// Completion parameters in the shape the AI21 API expects on the wire.
/// The defaults are the only values this service ever sends.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub num_results: u32,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_k_return: u32,
    pub top_p: f64,
    pub stop_sequences: Vec<String>,
    pub count_penalty: Penalty,
    pub frequency_penalty: Penalty,
    pub presence_penalty: Penalty,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            num_results: 1,
            max_tokens: 49,
            temperature: 0.1,
            top_k_return: 0,
            top_p: 1.0,
            stop_sequences: vec!["---".to_string()],
            count_penalty: Penalty::none(),
            frequency_penalty: Penalty::none(),
            presence_penalty: Penalty::none(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Penalty {
    pub scale: f64,
    pub apply_to_whitespaces: bool,
    pub apply_to_punctuations: bool,
    pub apply_to_numbers: bool,
    pub apply_to_stopwords: bool,
    pub apply_to_emojis: bool,
}

impl Penalty {
    pub fn none() -> Self {
        Self {
            scale: 0.0,
            apply_to_whitespaces: false,
            apply_to_punctuations: false,
            apply_to_numbers: false,
            apply_to_stopwords: false,
            apply_to_emojis: false,
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    #[serde(flatten)]
    params: &'a GenerationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub completions: Vec<Completion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub data: CompletionData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionData {
    pub text: String,
}

/// The API pads completions with a single leading space; strip exactly
/// that one space and leave everything else untouched.
fn normalize_completion_text(text: &str) -> String {
    text.strip_prefix(' ').unwrap_or(text).to_string()
}

impl<S: ResponseStore + Send + Sync> Summarizer for Ai21Client<S> {
    const SUMMARIZER_MODEL: &'static str = "j1-jumbo";
    type Error = Ai21Error;

    #[tracing::instrument(skip(self, text))]
    async fn summarize(&self, text: impl Into<String> + Send) -> Result<String, Ai21Error> {
        let text = text.into();

        let response: CompletionResponse = self
            .store
            .get_or_compute(text.as_bytes(), || async {
                let prompt = self.build_prompt(&text).await?;
                self.send_completion_request(Self::SUMMARIZER_MODEL, &prompt)
                    .await
            })
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize text"))?;

        let completion = response
            .completions
            .first()
            .ok_or(Ai21Error::EmptyCompletion)?;

        Ok(normalize_completion_text(&completion.data.text))
    }
}
