//! Driving port for reading the caller's gallery.
//!
//! Handlers use this port to list emojis page by page and to read image
//! bytes through the authorised channel.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{EmojiId, EmojiListing, Error, StoredImage, UserId};

/// Domain use-case port for gallery reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmojiGalleryQuery: Send + Sync {
    /// List the viewer's own emojis, newest first.
    async fn list_emojis(
        &self,
        viewer: &UserId,
        request: PageRequest,
    ) -> Result<Page<EmojiListing>, Error>;

    /// Read the image of an emoji the viewer owns or that is public.
    async fn emoji_image(&self, viewer: &UserId, emoji: &EmojiId) -> Result<StoredImage, Error>;
}

/// Fixture query with an empty gallery.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEmojiGalleryQuery;

#[async_trait]
impl EmojiGalleryQuery for FixtureEmojiGalleryQuery {
    async fn list_emojis(
        &self,
        _viewer: &UserId,
        request: PageRequest,
    ) -> Result<Page<EmojiListing>, Error> {
        Ok(Page::new(Vec::new(), request, 0))
    }

    async fn emoji_image(&self, _viewer: &UserId, _emoji: &EmojiId) -> Result<StoredImage, Error> {
        Err(Error::not_found("Emoji not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EMOJI_PAGE_SIZE, ErrorCode};
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn fixture_gallery_is_empty() {
        let request = PageRequest::new(3, EMOJI_PAGE_SIZE).expect("valid request");
        let page = FixtureEmojiGalleryQuery
            .list_emojis(&UserId::random(), request)
            .await
            .expect("fixture list");

        assert!(page.items().is_empty());
        assert_eq!(page.request().page(), 3);
        assert_eq!(page.total(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_image_is_not_found() {
        let err = FixtureEmojiGalleryQuery
            .emoji_image(&UserId::random(), &EmojiId::random())
            .await
            .expect_err("no images");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
