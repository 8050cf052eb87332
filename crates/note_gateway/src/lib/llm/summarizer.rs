use std::{fmt::Debug, future::Future};

pub trait Summarizer {
    const SUMMARIZER_MODEL: &'static str;

    type Error: Debug;

    /// Produces a short summary of `text`. Implementations are expected to
    /// memoize on the raw text, so repeat calls with the same input must
    /// not hit the completion API again.
    fn summarize(
        &self,
        text: impl Into<String> + Send,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}
