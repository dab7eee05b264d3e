//! Driven ports for the hosted image model and for downloading its output.

use async_trait::async_trait;
use serde_json::{Value, json};
use url::Url;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced while calling the image model.
    pub enum ImageGeneratorError {
        /// Network transport failed before receiving a response.
        Transport { message: String } => "image model transport failed: {message}",
        /// The call exceeded its timeout.
        Timeout { message: String } => "image model timeout: {message}",
        /// The provider rate-limited the request.
        RateLimited { message: String } => "image model rate limited request: {message}",
        /// The provider rejected the request or the prediction failed.
        Rejected { message: String } => "image model rejected request: {message}",
        /// The response could not be decoded.
        Decode { message: String } => "image model response decode failed: {message}",
    }
}

/// Port for running the emoji model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Run the model on `input` and return its raw output value.
    ///
    /// The output shape is not trusted here; callers validate it with
    /// [`crate::domain::resolve_image_url`].
    async fn generate(&self, input: &str) -> Result<Value, ImageGeneratorError>;
}

/// Output URL returned by [`FixtureImageGenerator`].
pub const FIXTURE_IMAGE_URL: &str = "https://fixtures.emoji.invalid/output-0.png";

/// Generator used when no model token is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureImageGenerator;

#[async_trait]
impl ImageGenerator for FixtureImageGenerator {
    async fn generate(&self, _input: &str) -> Result<Value, ImageGeneratorError> {
        Ok(json!([FIXTURE_IMAGE_URL]))
    }
}

define_port_error! {
    /// Errors surfaced while downloading generated images.
    pub enum ImageFetcherError {
        /// Network transport failed before receiving a response.
        Transport { message: String } => "image download transport failed: {message}",
        /// The download exceeded its timeout.
        Timeout { message: String } => "image download timeout: {message}",
        /// The server answered with a non-success status.
        Status { status: u16 } => "image download returned status {status}",
        /// The body exceeded the size limit.
        TooLarge { limit: usize } => "image larger than {limit} bytes",
        /// The body was empty.
        Empty => "image download returned an empty body",
    }
}

/// Port for fetching image bytes by URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download the body at `url`.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, ImageFetcherError>;
}

/// Eight-byte PNG signature served by [`FixtureImageFetcher`].
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Fetcher used alongside [`FixtureImageGenerator`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureImageFetcher;

#[async_trait]
impl ImageFetcher for FixtureImageFetcher {
    async fn fetch(&self, _url: &Url) -> Result<Vec<u8>, ImageFetcherError> {
        Ok(PNG_SIGNATURE.to_vec())
    }
}
