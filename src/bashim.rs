use std::{sync::Arc, time::Duration};

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT},
    StatusCode,
};

use crate::{
    constants::bashim::{BASH_URL, LISTING_LIMIT, USER_AGENT_STR},
    models::quote::Quote,
};

mod extractor;

pub use extractor::QuoteExtractor;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("bash.im responded with status {status}")]
    BadStatus { status: StatusCode },

    #[error("request to bash.im failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct BashClient {
    client: reqwest::Client,
    base_url: String,
    extractor: Arc<QuoteExtractor>,
}

impl BashClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Self::with_base_url(BASH_URL, timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STR));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(BashClient {
            client,
            extractor: Arc::new(QuoteExtractor::new(base_url.clone())),
            base_url,
        })
    }

    /// Fetches `path` relative to the site root and extracts up to `max_items` quotes
    /// from it (zero means all of them).
    ///
    /// Anything other than `200 OK` is an error, even if the body happens to contain
    /// quotes.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, path: &str, max_items: usize) -> Result<Vec<Quote>, FetchError> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self.client.get(&url).send().await.inspect_err(
            |e| tracing::error!(err = ?e, url = %url, "an error occurred when fetching quotes"),
        )?;

        let status = resp.status();

        if status != StatusCode::OK {
            tracing::warn!(status = %status, url = %url, "bash.im responded with an unexpected status");

            return Err(FetchError::BadStatus { status });
        }

        let body = resp.text().await.inspect_err(
            |e| tracing::error!(err = ?e, url = %url, "an error occurred when receiving response body"),
        )?;

        let quotes = self.extractor.extract(&body, max_items);
        tracing::debug!(count = quotes.len(), "extracted quotes");

        Ok(quotes)
    }

    pub async fn latest(&self) -> Result<Vec<Quote>, FetchError> {
        self.fetch("/", LISTING_LIMIT).await
    }

    pub async fn abyss(&self) -> Result<Vec<Quote>, FetchError> {
        self.fetch("/abyss/", LISTING_LIMIT).await
    }

    pub async fn quote(&self, id: u64) -> Result<Option<Quote>, FetchError> {
        let quotes = self.fetch(&format!("/quote/{id}"), 1).await?;

        Ok(quotes.into_iter().next())
    }

    pub async fn search(&self, text: &str, max_items: usize) -> Result<Vec<Quote>, FetchError> {
        self.fetch(
            &format!("/search?text={}", urlencoding::encode(text)),
            max_items,
        )
        .await
    }
}
