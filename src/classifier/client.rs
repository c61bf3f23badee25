use futures::future::BoxFuture;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;

use crate::config::{ClassifierConfig, ClassifierMode};

use super::{
    contract::{build_batch_request, parse_batch_response, parse_single_response, SingleRequest},
    Classifier, ClassifyError,
};

#[derive(Clone)]
pub struct RemoteClassifier {
    http: Client,
    config: ClassifierConfig,
}

impl RemoteClassifier {
    pub fn new(http: Client, config: ClassifierConfig) -> Self {
        Self { http, config }
    }

    async fn classify_batch(&self, titles: &[String]) -> Result<Vec<bool>, ClassifyError> {
        let body = self.post(&build_batch_request(titles)).await?;
        parse_batch_response(&body, titles.len())
    }

    /// Legacy contract: one request per title, in order. The first failure aborts the batch.
    async fn classify_each(&self, titles: &[String]) -> Result<Vec<bool>, ClassifyError> {
        let mut verdicts = Vec::with_capacity(titles.len());
        for title in titles {
            let body = self.post(&SingleRequest { title }).await?;
            verdicts.push(parse_single_response(&body)?);
        }
        Ok(verdicts)
    }

    async fn post<T: Serialize + ?Sized>(&self, payload: &T) -> Result<String, ClassifyError> {
        let response = self
            .request()
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    fn request(&self) -> RequestBuilder {
        let builder = self.http.post(&self.config.endpoint);
        match self.config.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }
}

impl Classifier for RemoteClassifier {
    fn classify<'a>(&'a self, titles: &'a [String]) -> BoxFuture<'a, Result<Vec<bool>, ClassifyError>> {
        Box::pin(async move {
            tracing::debug!(
                target: "classifier",
                mode = ?self.config.mode,
                total = titles.len(),
                "sending titles for classification"
            );
            match self.config.mode {
                ClassifierMode::Batched => self.classify_batch(titles).await,
                ClassifierMode::Single => self.classify_each(titles).await,
            }
        })
    }
}
