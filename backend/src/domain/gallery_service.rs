//! Gallery domain service: listing, image reads, and like toggles.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use tracing::{debug, error};

use crate::domain::ports::{
    EmojiGalleryQuery, EmojiLikesCommand, EmojiRepository, ObjectStorage, ObjectStorageError,
};
use crate::domain::{EmojiId, EmojiListing, Error, LikeToggle, StoredImage, UserId};

/// Message returned when listing fails.
pub const LIST_FAILED_MESSAGE: &str = "Failed to fetch emojis";
/// Message returned when a toggle fails.
pub const TOGGLE_FAILED_MESSAGE: &str = "Failed to toggle like";
/// Message returned when an emoji is missing or hidden from the caller.
pub const EMOJI_NOT_FOUND_MESSAGE: &str = "Emoji not found";

const IMAGE_FAILED_MESSAGE: &str = "Failed to load emoji image";

/// Service implementing [`EmojiGalleryQuery`] and [`EmojiLikesCommand`].
pub struct EmojiGalleryService<R: ?Sized> {
    repository: Arc<R>,
    storage: Arc<dyn ObjectStorage>,
}

impl<R: ?Sized> Clone for EmojiGalleryService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<R: ?Sized> EmojiGalleryService<R> {
    /// Create a service over a repository and the image bucket.
    pub fn new(repository: Arc<R>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            repository,
            storage,
        }
    }
}

#[async_trait]
impl<R> EmojiGalleryQuery for EmojiGalleryService<R>
where
    R: EmojiRepository + ?Sized,
{
    async fn list_emojis(
        &self,
        viewer: &UserId,
        request: PageRequest,
    ) -> Result<Page<EmojiListing>, Error> {
        self.repository
            .list_for_owner(viewer, request)
            .await
            .map_err(|err| {
                error!(error = %err, page = request.page(), "emoji listing failed");
                Error::internal(LIST_FAILED_MESSAGE)
            })
    }

    async fn emoji_image(&self, viewer: &UserId, emoji: &EmojiId) -> Result<StoredImage, Error> {
        let found = self.repository.find_by_id(emoji).await.map_err(|err| {
            error!(error = %err, emoji_id = %emoji, "emoji lookup failed");
            Error::internal(IMAGE_FAILED_MESSAGE)
        })?;
        let Some(found) = found.filter(|row| row.is_visible_to(viewer)) else {
            debug!(emoji_id = %emoji, "emoji missing or not visible to caller");
            return Err(Error::not_found(EMOJI_NOT_FOUND_MESSAGE));
        };
        self.storage
            .download(&found.storage_path)
            .await
            .map_err(|err| match err {
                ObjectStorageError::NotFound { .. } => Error::not_found(EMOJI_NOT_FOUND_MESSAGE),
                other => {
                    error!(error = %other, emoji_id = %emoji, "emoji image download failed");
                    Error::internal(IMAGE_FAILED_MESSAGE)
                }
            })
    }
}

#[async_trait]
impl<R> EmojiLikesCommand for EmojiGalleryService<R>
where
    R: EmojiRepository + ?Sized,
{
    async fn toggle_like(&self, user: &UserId, emoji: &EmojiId) -> Result<LikeToggle, Error> {
        match self.repository.toggle_like(emoji, user).await {
            Ok(Some(toggle)) => Ok(toggle),
            Ok(None) => Err(Error::not_found(EMOJI_NOT_FOUND_MESSAGE)),
            Err(err) => {
                error!(error = %err, emoji_id = %emoji, "like toggle failed");
                Err(Error::internal(TOGGLE_FAILED_MESSAGE))
            }
        }
    }
}
