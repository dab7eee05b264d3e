//! Reqwest-backed adapter for the Replicate predictions API.
//!
//! Predictions are created with `Prefer: wait` so most runs complete in one
//! round trip. A prediction still pending after that is polled through its
//! `urls.get` link until it settles or the configured timeout elapses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{PredictionDto, PredictionInputDto, PredictionRequestDto, PredictionStatus};
use crate::domain::ports::{ImageGenerator, ImageGeneratorError};
use crate::outbound::http_support::{StatusClass, classify_status, status_message};

/// Replicate API root.
pub const DEFAULT_REPLICATE_ENDPOINT: &str = "https://api.replicate.com/v1/";
/// `owner/model:version` of the emoji model.
pub const DEFAULT_EMOJI_MODEL: &str =
    "fofr/sdxl-emoji:dee76b5afde21b0f01ed7925f0665b7e879c50ee718c5f78a9d38e04d523cc5e";

const POLL_INTERVAL: Duration = Duration::from_millis(750);

/// Connection settings for [`ReplicateImageGenerator`].
#[derive(Clone)]
pub struct ReplicateConfig {
    /// API root, normally [`DEFAULT_REPLICATE_ENDPOINT`].
    pub endpoint: Url,
    /// Bearer token.
    pub api_token: Zeroizing<String>,
    /// Model reference; either a bare version hash or `owner/model:version`.
    pub model: String,
    /// Upper bound for one generation including polling.
    pub timeout: Duration,
}

/// Image generator backed by a hosted Replicate model.
pub struct ReplicateImageGenerator {
    client: Client,
    predictions_url: Url,
    api_token: Zeroizing<String>,
    version: String,
    timeout: Duration,
}

impl ReplicateImageGenerator {
    /// Build an adapter with a client honouring `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed or the
    /// endpoint cannot be joined with `predictions`.
    pub fn new(config: ReplicateConfig) -> Result<Self, ReplicateSetupError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let predictions_url = predictions_url(&config.endpoint)?;
        Ok(Self {
            client,
            predictions_url,
            api_token: config.api_token,
            version: model_version(&config.model).to_owned(),
            timeout: config.timeout,
        })
    }

    async fn create(&self, input: &str) -> Result<PredictionDto, ImageGeneratorError> {
        let body = PredictionRequestDto {
            version: &self.version,
            input: PredictionInputDto {
                prompt: input,
                apply_watermark: false,
            },
        };
        let response = self
            .client
            .post(self.predictions_url.clone())
            .bearer_auth(self.api_token.as_str())
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;
        decode_prediction(response).await
    }

    async fn poll(&self, url: &str) -> Result<PredictionDto, ImageGeneratorError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(self.api_token.as_str())
            .send()
            .await
            .map_err(map_transport_error)?;
        decode_prediction(response).await
    }
}

/// Errors raised while building [`ReplicateImageGenerator`].
#[derive(Debug, thiserror::Error)]
pub enum ReplicateSetupError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    /// The endpoint is not a usable base URL.
    #[error("invalid Replicate endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

fn predictions_url(endpoint: &Url) -> Result<Url, url::ParseError> {
    let mut base = endpoint.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("predictions")
}

fn model_version(model: &str) -> &str {
    model
        .rsplit_once(':')
        .map_or(model, |(_, version)| version)
        .trim()
}

async fn decode_prediction(
    response: reqwest::Response,
) -> Result<PredictionDto, ImageGeneratorError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    serde_json::from_slice(body.as_ref()).map_err(|err| {
        ImageGeneratorError::decode(format!("invalid prediction payload: {err}"))
    })
}

fn map_transport_error(error: reqwest::Error) -> ImageGeneratorError {
    if error.is_timeout() {
        ImageGeneratorError::timeout(error.to_string())
    } else {
        ImageGeneratorError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ImageGeneratorError {
    let message = status_message(status, body);
    match classify_status(status) {
        StatusClass::RateLimited => ImageGeneratorError::rate_limited(message),
        StatusClass::Timeout => ImageGeneratorError::timeout(message),
        StatusClass::Client => ImageGeneratorError::rejected(message),
        StatusClass::Server => ImageGeneratorError::transport(message),
    }
}

fn settled_output(prediction: PredictionDto) -> Result<Value, ImageGeneratorError> {
    match prediction.status {
        PredictionStatus::Succeeded => Ok(prediction.output),
        PredictionStatus::Failed | PredictionStatus::Canceled => {
            let reason = prediction
                .error
                .map_or_else(|| "no error detail".to_owned(), |err| err.to_string());
            Err(ImageGeneratorError::rejected(format!(
                "prediction {} {:?}: {reason}",
                prediction.id, prediction.status
            )))
        }
        PredictionStatus::Starting | PredictionStatus::Processing | PredictionStatus::Unknown => {
            Err(ImageGeneratorError::decode(format!(
                "prediction {} did not settle",
                prediction.id
            )))
        }
    }
}

#[async_trait]
impl ImageGenerator for ReplicateImageGenerator {
    async fn generate(&self, input: &str) -> Result<Value, ImageGeneratorError> {
        let deadline = Instant::now() + self.timeout;
        let mut prediction = self.create(input).await?;

        while prediction.status.is_pending() {
            let Some(poll_url) = prediction.urls.as_ref().and_then(|urls| urls.get.clone()) else {
                return Err(ImageGeneratorError::decode(
                    "pending prediction has no poll URL",
                ));
            };
            if Instant::now() + POLL_INTERVAL > deadline {
                return Err(ImageGeneratorError::timeout(format!(
                    "prediction {} still {:?} after {}s",
                    prediction.id,
                    prediction.status,
                    self.timeout.as_secs()
                )));
            }
            debug!(prediction_id = %prediction.id, status = ?prediction.status, "polling prediction");
            tokio::time::sleep(POLL_INTERVAL).await;
            prediction = self.poll(&poll_url).await?;
        }

        settled_output(prediction)
    }
}
