//! User identity as issued by the identity provider.
//!
//! The backend stores no credentials; a user is the opaque UUID the provider
//! returns plus whatever e-mail address it reports.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned when parsing a [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserIdError {
    /// The identifier was empty.
    #[error("user id must not be empty")]
    Empty,
    /// The identifier was not a canonical UUID.
    #[error("user id must be a valid UUID")]
    Invalid,
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    ///
    /// # Examples
    /// ```
    /// use emoji_backend::domain::UserId;
    ///
    /// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("uuid");
    /// assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    /// assert!(UserId::new(" 3fa85f64-5717-4562-b3fc-2c963f66afa6").is_err());
    /// ```
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserIdError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(UserIdError::Empty);
        }
        if raw.trim() != raw {
            return Err(UserIdError::Invalid);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserIdError::Invalid)
    }

    /// Wrap an existing UUID, e.g. one read back from the database.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// The caller resolved from a valid provider session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Provider-issued identifier.
    pub id: UserId,
    /// E-mail reported by the provider, when present.
    pub email: Option<String>,
}

impl AuthenticatedUser {
    /// Build a user with an optional e-mail address.
    pub fn new(id: UserId, email: Option<String>) -> Self {
        Self { id, email }
    }
}
