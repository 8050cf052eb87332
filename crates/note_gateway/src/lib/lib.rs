mod error;
mod llm;

pub mod api;
pub mod tracing;

pub use llm::{ai21, speech};
pub use llm::{
    summarizer::Summarizer,
    transcriber::{
        AudioEncoding, RecognitionConfig, Transcriber, TranscriptResult, TranscriptWord,
    },
};
