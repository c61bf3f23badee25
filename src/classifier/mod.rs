mod client;
pub mod contract;

use futures::future::BoxFuture;
use thiserror::Error;

pub use client::RemoteClassifier;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classification request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("classification response is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("classification response has {actual} verdicts for {expected} titles")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Remote verdict source. Verdicts are positionally aligned with `titles`.
pub trait Classifier: Send + Sync {
    fn classify<'a>(&'a self, titles: &'a [String])
        -> BoxFuture<'a, Result<Vec<bool>, ClassifyError>>;
}
