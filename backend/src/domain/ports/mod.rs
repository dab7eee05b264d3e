//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, storage, the model, the identity provider)
//! are implemented in `outbound`; driving ports are implemented by the
//! domain services and consumed by `inbound::http`.

mod macros;
pub(crate) use macros::define_port_error;

mod emoji_gallery_query;
mod emoji_generation;
mod emoji_likes_command;
mod emoji_repository;
mod identity_provider;
mod image_generator;
mod object_storage;

#[cfg(test)]
pub use emoji_gallery_query::MockEmojiGalleryQuery;
pub use emoji_gallery_query::{EmojiGalleryQuery, FixtureEmojiGalleryQuery};
#[cfg(test)]
pub use emoji_generation::MockEmojiGeneration;
pub use emoji_generation::{EmojiGeneration, FixtureEmojiGeneration};
#[cfg(test)]
pub use emoji_likes_command::MockEmojiLikesCommand;
pub use emoji_likes_command::{EmojiLikesCommand, FixtureEmojiLikesCommand};
#[cfg(test)]
pub use emoji_repository::MockEmojiRepository;
pub use emoji_repository::{EmojiRepository, EmojiRepositoryError, FixtureEmojiRepository};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{
    FIXTURE_ACCESS_TOKEN, FIXTURE_EMAIL, FIXTURE_PASSWORD, FIXTURE_REFRESH_TOKEN, FIXTURE_USER_ID,
    FixtureIdentityProvider, IdentityProvider, IdentityProviderError,
};
#[cfg(test)]
pub use image_generator::{MockImageFetcher, MockImageGenerator};
pub use image_generator::{
    FIXTURE_IMAGE_URL, FixtureImageFetcher, FixtureImageGenerator, ImageFetcher,
    ImageFetcherError, ImageGenerator, ImageGeneratorError, PNG_SIGNATURE,
};
#[cfg(test)]
pub use object_storage::MockObjectStorage;
pub use object_storage::{FixtureObjectStorage, ObjectStorage, ObjectStorageError};
