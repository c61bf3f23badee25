use std::{collections::HashSet, path::PathBuf, time::Duration};

use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::{
    config::SourceConfig,
    dom::{parse_html, Document, SharedDocument},
    locator::{title_of, ItemLocator},
};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unsupported feed source {0:?}")]
    Unsupported(String),
    #[error("failed to fetch {url}: {source}")]
    Http {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Remote(Url),
    Local(PathBuf),
}

impl SourceLocation {
    pub fn parse(raw: &str) -> Result<Self, SourceError> {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Remote(url)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|_| SourceError::Unsupported(raw.to_string())),
            // single-letter schemes are Windows drive letters
            Ok(url) if url.scheme().len() > 1 => Err(SourceError::Unsupported(raw.to_string())),
            _ => Ok(Self::Local(PathBuf::from(raw))),
        }
    }
}

/// Where the feed page comes from.
pub struct PageSource {
    client: Client,
    location: SourceLocation,
    fetch_timeout: Duration,
}

impl PageSource {
    pub fn new(client: Client, config: &SourceConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client,
            location: SourceLocation::parse(&config.location)?,
            fetch_timeout: config.fetch_timeout,
        })
    }

    pub fn label(&self) -> String {
        match &self.location {
            SourceLocation::Remote(url) => url.to_string(),
            SourceLocation::Local(path) => path.display().to_string(),
        }
    }

    pub async fn fetch(&self) -> Result<String, SourceError> {
        match &self.location {
            SourceLocation::Remote(url) => {
                let http_err = |source| SourceError::Http {
                    url: url.clone(),
                    source,
                };
                let response = self
                    .client
                    .get(url.clone())
                    .timeout(self.fetch_timeout)
                    .send()
                    .await
                    .map_err(http_err)?
                    .error_for_status()
                    .map_err(http_err)?;
                response.text().await.map_err(http_err)
            }
            SourceLocation::Local(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| SourceError::Io {
                        path: path.clone(),
                        source,
                    })
            }
        }
    }
}

/// Re-fetches the source and appends items the live page does not show yet.
pub struct FeedRefresher {
    source: PageSource,
    document: SharedDocument,
    locator: ItemLocator,
}

impl FeedRefresher {
    pub fn new(source: PageSource, document: SharedDocument) -> Self {
        Self {
            source,
            document,
            locator: ItemLocator::default(),
        }
    }

    pub async fn refresh(&self) -> Result<usize, SourceError> {
        let html = self.source.fetch().await?;
        let fresh = parse_html(&html);
        let added = {
            let mut live = self.document.lock();
            merge_new_items(&mut live, &fresh, &self.locator)
        };
        tracing::debug!(target: "source", added, "feed refreshed");
        Ok(added)
    }
}

/// Imports every item of `fresh` whose title the live page lacks, hidden
/// items included, as one mutation batch under `<body>`.
pub fn merge_new_items(live: &mut Document, fresh: &Document, locator: &ItemLocator) -> usize {
    let mut known: HashSet<String> = locator.all_titles(live).into_iter().collect();
    let mut imported = Vec::new();
    for element in locator.item_elements(fresh) {
        let Some(title) = title_of(fresh, element) else {
            continue;
        };
        if known.insert(title) {
            imported.push(live.import_subtree(fresh, element));
        }
    }
    let added = imported.len();
    let body = live.body();
    live.append_children(body, imported);
    added
}
