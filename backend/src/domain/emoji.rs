//! Emoji aggregate and its value types.
//!
//! An emoji is created once by the generation flow and afterwards only its
//! like counter changes, through the repository's toggle operation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserId;

/// Fixed page size of the personal gallery listing.
pub const EMOJI_PAGE_SIZE: u32 = 8;
/// Maximum prompt length in characters after trimming.
pub const PROMPT_MAX_CHARS: usize = 500;
/// Content type used for every stored emoji image.
pub const EMOJI_CONTENT_TYPE: &str = "image/png";

const PROMPT_TEMPLATE_PREFIX: &str = "A TOK emoji of ";

/// Identifier of a generated emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmojiId(Uuid);

/// Raised when an emoji identifier is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("emoji id must be a valid UUID")]
pub struct EmojiIdError;

impl EmojiId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for EmojiId {
    type Err = EmojiIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| EmojiIdError)
    }
}

impl fmt::Display for EmojiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who may see an emoji besides its owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to every authenticated user.
    Public,
    /// Visible to the owner only.
    #[default]
    Private,
}

/// Raised when a stored visibility value is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown visibility '{0}'")]
pub struct VisibilityParseError(pub String);

impl Visibility {
    /// Stable lowercase representation used in storage and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl FromStr for Visibility {
    type Err = VisibilityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(VisibilityParseError(other.to_owned())),
        }
    }
}

/// Validation failures for [`Prompt`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptValidationError {
    /// Nothing left after trimming.
    #[error("prompt must not be empty")]
    Empty,
    /// Longer than [`PROMPT_MAX_CHARS`].
    #[error("prompt must be at most {max} characters")]
    TooLong {
        /// Permitted maximum.
        max: usize,
    },
}

/// A trimmed, non-empty generation prompt.
///
/// # Examples
/// ```
/// use emoji_backend::domain::Prompt;
///
/// let prompt = Prompt::new("  a happy cat ").expect("valid prompt");
/// assert_eq!(prompt.as_str(), "a happy cat");
/// assert_eq!(prompt.generation_input(), "A TOK emoji of a happy cat");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    /// Validate raw user input.
    pub fn new(raw: &str) -> Result<Self, PromptValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PromptValidationError::Empty);
        }
        if trimmed.chars().count() > PROMPT_MAX_CHARS {
            return Err(PromptValidationError::TooLong {
                max: PROMPT_MAX_CHARS,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The prompt as entered, without surrounding whitespace.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Model input built from the fixed emoji template.
    pub fn generation_input(&self) -> String {
        format!("{PROMPT_TEMPLATE_PREFIX}{}", self.0)
    }
}

/// Object-store key of an emoji image: `"{owner}/{emoji}.png"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoragePath(String);

impl StoragePath {
    /// Derive the canonical path for a new emoji.
    ///
    /// # Examples
    /// ```
    /// use emoji_backend::domain::{EmojiId, StoragePath, UserId};
    ///
    /// let owner = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("uuid");
    /// let emoji: EmojiId = "9b2f6c1e-7d4a-4f5e-8a1b-2c3d4e5f6a7b".parse().expect("uuid");
    /// let path = StoragePath::for_emoji(&owner, &emoji);
    /// assert_eq!(
    ///     path.as_str(),
    ///     "3fa85f64-5717-4562-b3fc-2c963f66afa6/9b2f6c1e-7d4a-4f5e-8a1b-2c3d4e5f6a7b.png"
    /// );
    /// ```
    pub fn for_emoji(owner: &UserId, emoji: &EmojiId) -> Self {
        Self(format!("{owner}/{emoji}.png"))
    }

    /// Wrap a path read back from storage metadata.
    pub fn from_stored(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Path as stored.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Emoji metadata row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emoji {
    /// Primary key.
    pub id: EmojiId,
    /// Creator.
    pub owner: UserId,
    /// Prompt as entered by the owner.
    pub prompt: String,
    /// Object-store key of the image.
    pub storage_path: StoragePath,
    /// Sharing policy.
    pub visibility: Visibility,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Number of like rows for this emoji.
    pub likes_count: u32,
}

impl Emoji {
    /// Whether `viewer` may see this emoji.
    pub fn is_visible_to(&self, viewer: &UserId) -> bool {
        self.owner == *viewer || self.visibility == Visibility::Public
    }
}

/// An emoji together with whether the viewer has liked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiListing {
    /// The emoji row.
    pub emoji: Emoji,
    /// Whether a like row exists for the viewer.
    pub liked: bool,
}

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    /// Whether the viewer likes the emoji after the toggle.
    pub liked: bool,
    /// Like count after the toggle.
    pub likes_count: u32,
}

/// Result of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedEmoji {
    /// Identifier of the new emoji.
    pub emoji_id: EmojiId,
    /// Where its image was stored.
    pub storage_path: StoragePath,
}

/// Image bytes read back from object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Raw image body.
    pub bytes: Vec<u8>,
    /// Content type reported by the store.
    pub content_type: String,
}

/// Reasons a model output cannot be turned into an image URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageOutputError {
    /// The output was not a JSON array.
    #[error("model output is not an array")]
    NotAnArray,
    /// The array was empty.
    #[error("model output is empty")]
    Empty,
    /// The first element was not a string.
    #[error("first model output is not a string")]
    NotAString,
    /// The first element was not an absolute http(s) URL.
    #[error("first model output is not an http(s) URL: {0}")]
    NotAUrl(String),
}

/// Extract the image URL from raw model output.
///
/// The output must be a non-empty array whose first element is an absolute
/// `http` or `https` URL.
///
/// # Examples
/// ```
/// use emoji_backend::domain::resolve_image_url;
/// use serde_json::json;
///
/// let url = resolve_image_url(&json!(["https://cdn.example/out-0.png"])).expect("url");
/// assert_eq!(url.as_str(), "https://cdn.example/out-0.png");
/// assert!(resolve_image_url(&json!([])).is_err());
/// ```
pub fn resolve_image_url(output: &Value) -> Result<Url, ImageOutputError> {
    let items = output.as_array().ok_or(ImageOutputError::NotAnArray)?;
    let first = items.first().ok_or(ImageOutputError::Empty)?;
    let raw = first.as_str().ok_or(ImageOutputError::NotAString)?;
    let url = Url::parse(raw).map_err(|_| ImageOutputError::NotAUrl(raw.to_owned()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ImageOutputError::NotAUrl(raw.to_owned())),
    }
}
