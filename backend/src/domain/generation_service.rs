//! Emoji generation domain service.
//!
//! Runs the model, downloads its output, stores the image, and records the
//! metadata row. The upload is removed again when the row cannot be written,
//! so a failed request leaves no orphaned object behind.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{error, info, warn};

use crate::domain::ports::{
    EmojiGeneration, EmojiRepository, ImageFetcher, ImageGenerator, ObjectStorage,
};
use crate::domain::{
    EMOJI_CONTENT_TYPE, Emoji, EmojiId, Error, GeneratedEmoji, Prompt, StoragePath, UserId,
    Visibility, resolve_image_url,
};

/// User-facing message for every failure after validation.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate emoji";

/// Driven ports used by [`EmojiGenerationService`].
#[derive(Clone)]
pub struct GenerationPorts {
    /// Hosted image model.
    pub generator: Arc<dyn ImageGenerator>,
    /// Downloader for model output.
    pub fetcher: Arc<dyn ImageFetcher>,
    /// Image bucket.
    pub storage: Arc<dyn ObjectStorage>,
    /// Metadata store.
    pub repository: Arc<dyn EmojiRepository>,
}

/// Generation service implementing [`EmojiGeneration`].
#[derive(Clone)]
pub struct EmojiGenerationService {
    ports: GenerationPorts,
    clock: Arc<dyn Clock>,
}

impl EmojiGenerationService {
    /// Create a service over the given ports.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use emoji_backend::domain::EmojiGenerationService;
    /// use emoji_backend::domain::GenerationPorts;
    /// use emoji_backend::domain::ports::{
    ///     FixtureEmojiRepository, FixtureImageFetcher, FixtureImageGenerator,
    ///     FixtureObjectStorage,
    /// };
    /// use mockable::DefaultClock;
    ///
    /// let ports = GenerationPorts {
    ///     generator: Arc::new(FixtureImageGenerator),
    ///     fetcher: Arc::new(FixtureImageFetcher),
    ///     storage: Arc::new(FixtureObjectStorage),
    ///     repository: Arc::new(FixtureEmojiRepository),
    /// };
    /// let _service = EmojiGenerationService::new(ports, Arc::new(DefaultClock));
    /// ```
    pub fn new(ports: GenerationPorts, clock: Arc<dyn Clock>) -> Self {
        Self { ports, clock }
    }

    async fn produce_image(&self, prompt: &Prompt) -> Result<Vec<u8>, Error> {
        let output = self
            .ports
            .generator
            .generate(&prompt.generation_input())
            .await
            .map_err(|err| {
                error!(error = %err, "image model call failed");
                Self::failure()
            })?;
        let url = resolve_image_url(&output).map_err(|err| {
            error!(error = %err, "image model returned unusable output");
            Self::failure()
        })?;
        self.ports.fetcher.fetch(&url).await.map_err(|err| {
            error!(error = %err, url = %url, "generated image download failed");
            Self::failure()
        })
    }

    async fn discard_upload(&self, path: &StoragePath) {
        if let Err(err) = self.ports.storage.remove(path).await {
            warn!(error = %err, path = %path, "failed to remove orphaned upload");
        }
    }

    fn failure() -> Error {
        Error::internal(GENERATION_FAILED_MESSAGE)
    }
}

#[async_trait]
impl EmojiGeneration for EmojiGenerationService {
    async fn generate(
        &self,
        owner: &UserId,
        prompt: Prompt,
        visibility: Visibility,
    ) -> Result<GeneratedEmoji, Error> {
        let bytes = self.produce_image(&prompt).await?;

        let emoji_id = EmojiId::random();
        let storage_path = StoragePath::for_emoji(owner, &emoji_id);
        self.ports
            .storage
            .upload(&storage_path, bytes, EMOJI_CONTENT_TYPE)
            .await
            .map_err(|err| {
                error!(error = %err, path = %storage_path, "emoji upload failed");
                Self::failure()
            })?;

        let emoji = Emoji {
            id: emoji_id,
            owner: owner.clone(),
            prompt: prompt.as_str().to_owned(),
            storage_path: storage_path.clone(),
            visibility,
            created_at: self.clock.utc(),
            likes_count: 0,
        };
        if let Err(err) = self.ports.repository.insert(&emoji).await {
            error!(error = %err, emoji_id = %emoji_id, "emoji metadata insert failed");
            self.discard_upload(&storage_path).await;
            return Err(Self::failure());
        }

        info!(emoji_id = %emoji_id, owner = %owner, "emoji generated");
        Ok(GeneratedEmoji {
            emoji_id,
            storage_path,
        })
    }
}

#[cfg(test)]
#[path = "generation_service_tests.rs"]
mod tests;
