//! Wire types for the GoTrue-style auth API.

use serde::{Deserialize, Serialize};

use crate::domain::{AuthSession, AuthenticatedUser, SessionTokens, SignUpOutcome, UserId};

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub(super) id: String,
    #[serde(default)]
    pub(super) email: Option<String>,
}

impl UserDto {
    pub(super) fn into_domain(self) -> Result<AuthenticatedUser, String> {
        let id = UserId::new(&self.id).map_err(|err| format!("user id '{}': {err}", self.id))?;
        Ok(AuthenticatedUser::new(id, self.email))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SessionDto {
    pub(super) access_token: String,
    pub(super) refresh_token: String,
    pub(super) user: UserDto,
}

impl SessionDto {
    pub(super) fn into_domain(self) -> Result<AuthSession, String> {
        Ok(AuthSession {
            user: self.user.into_domain()?,
            tokens: SessionTokens::new(self.access_token, self.refresh_token),
        })
    }
}

/// Sign-up answers with a session when confirmation is disabled and with the
/// bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum SignUpResponseDto {
    Session(SessionDto),
    User(UserDto),
}

impl SignUpResponseDto {
    /// A pending user must still carry a valid id even though no session is
    /// issued yet.
    pub(super) fn into_outcome(self) -> Result<SignUpOutcome, String> {
        match self {
            Self::Session(session) => session.into_domain().map(SignUpOutcome::SignedIn),
            Self::User(user) => user
                .into_domain()
                .map(|_| SignUpOutcome::ConfirmationRequired),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorDto {
    #[serde(default)]
    pub(super) error_description: Option<String>,
    #[serde(default)]
    pub(super) msg: Option<String>,
    #[serde(default)]
    pub(super) message: Option<String>,
    #[serde(default)]
    pub(super) error: Option<String>,
}

impl ErrorDto {
    pub(super) fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshRequestDto<'a> {
    pub(super) refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct PasswordRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct PkceRequestDto<'a> {
    pub(super) auth_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) code_verifier: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(super) struct VerifyRequestDto<'a> {
    #[serde(rename = "type")]
    pub(super) kind: &'a str,
    pub(super) token_hash: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RecoverRequestDto<'a> {
    pub(super) email: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct UpdatePasswordRequestDto<'a> {
    pub(super) password: &'a str,
}
