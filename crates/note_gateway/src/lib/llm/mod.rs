pub mod ai21;
pub mod speech;
pub mod summarizer;
pub mod transcriber;
