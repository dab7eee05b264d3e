//! Driving port for emoji generation.
//!
//! The HTTP handler passes an already validated prompt; implementations run
//! the model, store the image, and record the metadata row.

use async_trait::async_trait;

use crate::domain::{EmojiId, Error, GeneratedEmoji, Prompt, StoragePath, UserId, Visibility};

/// Domain use-case port for generating and storing an emoji.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmojiGeneration: Send + Sync {
    /// Generate an emoji for `owner` from `prompt`.
    async fn generate(
        &self,
        owner: &UserId,
        prompt: Prompt,
        visibility: Visibility,
    ) -> Result<GeneratedEmoji, Error>;
}

/// Fixture generation that allocates an id and path without side effects.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEmojiGeneration;

#[async_trait]
impl EmojiGeneration for FixtureEmojiGeneration {
    async fn generate(
        &self,
        owner: &UserId,
        _prompt: Prompt,
        _visibility: Visibility,
    ) -> Result<GeneratedEmoji, Error> {
        let emoji_id = EmojiId::random();
        Ok(GeneratedEmoji {
            storage_path: StoragePath::for_emoji(owner, &emoji_id),
            emoji_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_generation_uses_owner_scoped_path() {
        let owner = UserId::random();
        let prompt = Prompt::new("a happy cat").expect("valid prompt");

        let generated = FixtureEmojiGeneration
            .generate(&owner, prompt, Visibility::Private)
            .await
            .expect("fixture generation");

        assert_eq!(
            generated.storage_path.as_str(),
            format!("{owner}/{}.png", generated.emoji_id)
        );
    }
}
