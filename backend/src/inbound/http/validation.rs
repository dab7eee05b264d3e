//! Request validation helpers shared by handlers.
//!
//! Every failure is an `invalid_request` error whose details name the
//! offending field and a machine-readable reason.

use serde_json::json;

use crate::domain::{CredentialsValidationError, EmojiId, Error, PromptValidationError};

/// Machine-readable validation reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reason {
    Empty,
    TooLong,
    TooShort,
    Malformed,
    InvalidUuid,
}

impl Reason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::TooLong => "too_long",
            Self::TooShort => "too_short",
            Self::Malformed => "malformed",
            Self::InvalidUuid => "invalid_uuid",
        }
    }
}

/// Build an `invalid_request` error for `field`.
pub(crate) fn field_error(field: &str, reason: Reason, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": reason.as_str(),
    }))
}

/// Parse an emoji identifier supplied in `field`.
pub(crate) fn parse_emoji_id(field: &str, raw: &str) -> Result<EmojiId, Error> {
    raw.parse()
        .map_err(|_| field_error(field, Reason::InvalidUuid, "Invalid emoji id"))
}

/// Map prompt validation failures onto the `prompt` field.
pub(crate) fn prompt_error(err: &PromptValidationError) -> Error {
    let reason = match err {
        PromptValidationError::Empty => Reason::Empty,
        PromptValidationError::TooLong { .. } => Reason::TooLong,
    };
    field_error("prompt", reason, err.to_string())
}

/// Map credential validation failures onto `email` or `password`.
pub(crate) fn credentials_error(err: &CredentialsValidationError) -> Error {
    let (field, reason) = match err {
        CredentialsValidationError::EmptyEmail => ("email", Reason::Empty),
        CredentialsValidationError::InvalidEmail => ("email", Reason::Malformed),
        CredentialsValidationError::EmptyPassword => ("password", Reason::Empty),
        CredentialsValidationError::PasswordTooShort { .. } => ("password", Reason::TooShort),
    };
    field_error(field, reason, err.to_string())
}
