//! Reqwest-backed object storage adapter for a Supabase-style storage API.
//!
//! Objects live under `{base}/storage/v1/object/{bucket}/{path}`. Uploads send
//! `x-upsert: false` so an existing object is never replaced.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use crate::domain::ports::{ObjectStorage, ObjectStorageError};
use crate::domain::{EMOJI_CONTENT_TYPE, StoragePath, StoredImage};
use crate::outbound::http_support::{StatusClass, body_preview, classify_status, status_message};

const UPSERT_HEADER: &str = "x-upsert";
const API_KEY_HEADER: &str = "apikey";

/// Connection settings for [`HttpObjectStorage`].
#[derive(Clone)]
pub struct HttpObjectStorageConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub base_url: Url,
    /// Service-role key used for bucket access.
    pub service_key: Zeroizing<String>,
    /// Bucket holding emoji images.
    pub bucket: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Object storage adapter speaking the storage REST API.
pub struct HttpObjectStorage {
    client: Client,
    base_url: Url,
    service_key: Zeroizing<String>,
    bucket: String,
}

impl HttpObjectStorage {
    /// Build an adapter with a client honouring `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: HttpObjectStorageConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
            service_key: config.service_key,
            bucket: config.bucket,
        })
    }

    fn object_url(&self, path: &StoragePath) -> Result<Url, ObjectStorageError> {
        object_url(&self.base_url, &self.bucket, path)
    }

    fn authorised(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(self.service_key.as_str())
            .header(API_KEY_HEADER, self.service_key.as_str())
    }
}

fn object_url(base: &Url, bucket: &str, path: &StoragePath) -> Result<Url, ObjectStorageError> {
    let mut url = base.clone();
    {
        let mut segments = url.path_segments_mut().map_err(|()| {
            ObjectStorageError::rejected(format!("storage base URL cannot be a base: {base}"))
        })?;
        segments
            .pop_if_empty()
            .extend(["storage", "v1", "object", bucket])
            .extend(path.as_str().split('/'));
    }
    Ok(url)
}

fn map_transport_error(error: reqwest::Error) -> ObjectStorageError {
    ObjectStorageError::transport(error.to_string())
}

fn mentions(body: &[u8], needles: &[&str]) -> bool {
    let text = String::from_utf8_lossy(body).to_lowercase();
    needles.iter().any(|needle| text.contains(needle))
}

fn map_status_error(status: StatusCode, body: &[u8], path: &StoragePath) -> ObjectStorageError {
    if status == StatusCode::CONFLICT || mentions(body, &["duplicate", "already exists"]) {
        return ObjectStorageError::already_exists(path.as_str());
    }
    if status == StatusCode::NOT_FOUND || mentions(body, &["not_found", "not found"]) {
        return ObjectStorageError::not_found(path.as_str());
    }
    let message = status_message(status, body);
    match classify_status(status) {
        StatusClass::Client => ObjectStorageError::rejected(message),
        StatusClass::RateLimited | StatusClass::Timeout | StatusClass::Server => {
            ObjectStorageError::transport(message)
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(
        &self,
        path: &StoragePath,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStorageError> {
        let url = self.object_url(path)?;
        let response = self
            .authorised(self.client.post(url))
            .header(CONTENT_TYPE, content_type)
            .header(UPSERT_HEADER, "false")
            .body(bytes)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, body.as_ref(), path))
    }

    async fn download(&self, path: &StoragePath) -> Result<StoredImage, ObjectStorageError> {
        let url = self.object_url(path)?;
        let response = self
            .authorised(self.client.get(url))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(EMOJI_CONTENT_TYPE)
            .to_owned();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref(), path));
        }
        Ok(StoredImage {
            bytes: body.to_vec(),
            content_type,
        })
    }

    async fn remove(&self, path: &StoragePath) -> Result<(), ObjectStorageError> {
        let url = self.object_url(path)?;
        let response = self
            .authorised(self.client.delete(url))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        tracing::debug!(body = %body_preview(body.as_ref()), "storage delete refused");
        Err(map_status_error(status, body.as_ref(), path))
    }
}
