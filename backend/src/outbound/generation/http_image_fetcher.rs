//! Reqwest-backed downloader for generated images.
//!
//! The body is read chunk by chunk and abandoned as soon as it passes the
//! size limit, so an oversized or endless response cannot exhaust memory.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::domain::ports::{ImageFetcher, ImageFetcherError};

/// Largest accepted image body: 10 MiB.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Image fetcher backed by a plain HTTP client.
pub struct HttpImageFetcher {
    client: Client,
    max_bytes: usize,
}

impl HttpImageFetcher {
    /// Build a fetcher with a request timeout and the default size limit.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_limit(timeout, MAX_IMAGE_BYTES)
    }

    /// Build a fetcher with an explicit size limit.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_limit(timeout: Duration, max_bytes: usize) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, max_bytes })
    }
}

fn map_transport_error(error: reqwest::Error) -> ImageFetcherError {
    if error.is_timeout() {
        ImageFetcherError::timeout(error.to_string())
    } else {
        ImageFetcherError::transport(error.to_string())
    }
}

fn declared_too_large(content_length: Option<u64>, max_bytes: usize) -> bool {
    content_length
        .and_then(|length| usize::try_from(length).ok().or(Some(usize::MAX)))
        .is_some_and(|length| length > max_bytes)
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, ImageFetcherError> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageFetcherError::status(status.as_u16()));
        }
        if declared_too_large(response.content_length(), self.max_bytes) {
            return Err(ImageFetcherError::too_large(self.max_bytes));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(map_transport_error)? {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(ImageFetcherError::too_large(self.max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            return Err(ImageFetcherError::empty());
        }
        Ok(bytes)
    }
}
