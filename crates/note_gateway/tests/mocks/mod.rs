pub mod summarizer;
pub mod transcriber;
