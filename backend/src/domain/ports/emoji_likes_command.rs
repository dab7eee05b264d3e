//! Driving port for like toggles.

use async_trait::async_trait;

use crate::domain::{EmojiId, Error, LikeToggle, UserId};

/// Domain use-case port for toggling a like.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmojiLikesCommand: Send + Sync {
    /// Flip `user`'s like on `emoji` and report the new state.
    async fn toggle_like(&self, user: &UserId, emoji: &EmojiId) -> Result<LikeToggle, Error>;
}

/// Fixture command that always reports a first like.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEmojiLikesCommand;

#[async_trait]
impl EmojiLikesCommand for FixtureEmojiLikesCommand {
    async fn toggle_like(&self, _user: &UserId, _emoji: &EmojiId) -> Result<LikeToggle, Error> {
        Ok(LikeToggle {
            liked: true,
            likes_count: 1,
        })
    }
}
