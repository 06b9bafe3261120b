use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Catalog source {url} returned status {status}")]
    StatusError { url: String, status: StatusCode },

    #[error("Failed to read catalog file {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of the raw catalog document.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<String, FetchError>;
}

/// Default location of the catalog document.
pub const DEFAULT_SOURCE: &str =
    "https://raw.githubusercontent.com/modelcontextprotocol/servers/main/README.md";

/// Fetches the catalog over HTTP(S).
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, source: &str) -> Result<String, FetchError> {
        let url = Url::parse(source)?;
        tracing::info!("Fetching catalog from: {}", url);

        let response = self
            .client
            .get(url.clone())
            .header("Accept", "text/plain, text/markdown")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::StatusError {
                url: url.to_string(),
                status: response.status(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Reads the catalog from a local markdown file.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileFetcher;

#[async_trait]
impl ContentFetcher for FileFetcher {
    async fn fetch(&self, source: &str) -> Result<String, FetchError> {
        tracing::info!("Reading catalog from file: {}", source);
        tokio::fs::read_to_string(source)
            .await
            .map_err(|source_err| FetchError::IoError {
                path: PathBuf::from(source),
                source: source_err,
            })
    }
}

/// Returns true if `source` should be fetched over the network.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Picks the fetcher matching the shape of `source`.
pub fn fetcher_for(source: &str) -> Arc<dyn ContentFetcher> {
    if is_remote(source) {
        Arc::new(HttpFetcher::new())
    } else {
        Arc::new(FileFetcher)
    }
}
