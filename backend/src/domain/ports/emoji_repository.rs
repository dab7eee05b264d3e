//! Driven port for emoji metadata and like persistence.
//!
//! The repository owns the like-toggle invariant: a toggle inserts or removes
//! the caller's like row and adjusts `likes_count` in one atomic step, so
//! concurrent toggles never leave the counter out of step with the rows.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use super::define_port_error;
use crate::domain::{Emoji, EmojiId, EmojiListing, LikeToggle, UserId};

define_port_error! {
    /// Errors raised by emoji repository adapters.
    pub enum EmojiRepositoryError {
        /// Connection could not be established.
        Connection { message: String } => "emoji repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "emoji repository query failed: {message}",
        /// A unique constraint rejected the write.
        Conflict { message: String } => "emoji repository conflict: {message}",
    }
}

/// Port for reading and writing emoji rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmojiRepository: Send + Sync {
    /// Insert a freshly generated emoji.
    async fn insert(&self, emoji: &Emoji) -> Result<(), EmojiRepositoryError>;

    /// Fetch one emoji by id regardless of visibility.
    async fn find_by_id(&self, id: &EmojiId) -> Result<Option<Emoji>, EmojiRepositoryError>;

    /// List the owner's emojis, newest first, with the owner's like flags.
    async fn list_for_owner(
        &self,
        owner: &UserId,
        request: PageRequest,
    ) -> Result<Page<EmojiListing>, EmojiRepositoryError>;

    /// Toggle `user`'s like on `emoji`.
    ///
    /// Returns `None` when the emoji does not exist or is neither owned by
    /// `user` nor public.
    async fn toggle_like(
        &self,
        emoji: &EmojiId,
        user: &UserId,
    ) -> Result<Option<LikeToggle>, EmojiRepositoryError>;
}

/// Repository used when no database is configured: stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEmojiRepository;

#[async_trait]
impl EmojiRepository for FixtureEmojiRepository {
    async fn insert(&self, _emoji: &Emoji) -> Result<(), EmojiRepositoryError> {
        Ok(())
    }

    async fn find_by_id(&self, _id: &EmojiId) -> Result<Option<Emoji>, EmojiRepositoryError> {
        Ok(None)
    }

    async fn list_for_owner(
        &self,
        _owner: &UserId,
        request: PageRequest,
    ) -> Result<Page<EmojiListing>, EmojiRepositoryError> {
        Ok(Page::new(Vec::new(), request, 0))
    }

    async fn toggle_like(
        &self,
        _emoji: &EmojiId,
        _user: &UserId,
    ) -> Result<Option<LikeToggle>, EmojiRepositoryError> {
        Ok(None)
    }
}
