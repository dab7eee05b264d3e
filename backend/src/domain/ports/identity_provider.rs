//! Driven port for the hosted identity provider.
//!
//! The provider issues sessions (access plus refresh token) and owns every
//! credential; the backend only relays requests and keeps the tokens in its
//! encrypted session cookie.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{
    AuthSession, AuthenticatedUser, CodeExchange, Credentials, EmailAddress, OtpVerification,
    Password, SessionTokens, SignUpOutcome, UserId,
};

define_port_error! {
    /// Errors surfaced by identity provider adapters.
    pub enum IdentityProviderError {
        /// The token is expired, revoked, or malformed.
        InvalidToken => "identity token is invalid or expired",
        /// The provider refused the request (bad credentials, used code).
        Rejected { message: String } => "identity provider rejected request: {message}",
        /// Network transport failed before receiving a response.
        Transport { message: String } => "identity provider transport failed: {message}",
        /// The response could not be decoded.
        Decode { message: String } => "identity provider response decode failed: {message}",
    }
}

impl IdentityProviderError {
    /// Whether the failure says the presented credentials are not usable,
    /// as opposed to the provider being unreachable.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::InvalidToken | Self::Rejected { .. })
    }
}

/// Port for provider-backed authentication flows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the user behind an access token.
    async fn user_for_token(
        &self,
        access_token: &str,
    ) -> Result<AuthenticatedUser, IdentityProviderError>;

    /// Exchange a refresh token for a new session.
    async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<AuthSession, IdentityProviderError>;

    /// Exchange an authorisation code from the callback redirect.
    async fn exchange_code(
        &self,
        exchange: &CodeExchange,
    ) -> Result<AuthSession, IdentityProviderError>;

    /// Verify a token hash from an e-mail link.
    async fn verify_otp(
        &self,
        verification: &OtpVerification,
    ) -> Result<AuthSession, IdentityProviderError>;

    /// Sign in with e-mail and password.
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, IdentityProviderError>;

    /// Create an account; confirmation links land on `email_redirect_to`.
    async fn sign_up(
        &self,
        credentials: &Credentials,
        email_redirect_to: &str,
    ) -> Result<SignUpOutcome, IdentityProviderError>;

    /// Send a password reset e-mail whose link lands on `redirect_to`.
    async fn send_password_reset(
        &self,
        email: &EmailAddress,
        redirect_to: &str,
    ) -> Result<(), IdentityProviderError>;

    /// Change the password of the user behind `access_token`.
    async fn update_password(
        &self,
        access_token: &str,
        password: &Password,
    ) -> Result<(), IdentityProviderError>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityProviderError>;
}

/// E-mail accepted by [`FixtureIdentityProvider`].
pub const FIXTURE_EMAIL: &str = "demo@emoji.local";
/// Password accepted by [`FixtureIdentityProvider`].
pub const FIXTURE_PASSWORD: &str = "password";
/// User id issued by [`FixtureIdentityProvider`].
pub const FIXTURE_USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";
/// Access token issued by [`FixtureIdentityProvider`].
pub const FIXTURE_ACCESS_TOKEN: &str = "fixture-access-token";
/// Refresh token issued by [`FixtureIdentityProvider`].
pub const FIXTURE_REFRESH_TOKEN: &str = "fixture-refresh-token";

/// Development provider with a single account and static tokens.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityProvider;

impl FixtureIdentityProvider {
    fn session() -> Result<AuthSession, IdentityProviderError> {
        let id = UserId::new(FIXTURE_USER_ID)
            .map_err(|err| IdentityProviderError::decode(format!("fixture user id: {err}")))?;
        Ok(AuthSession {
            user: AuthenticatedUser::new(id, Some(FIXTURE_EMAIL.to_owned())),
            tokens: SessionTokens::new(FIXTURE_ACCESS_TOKEN, FIXTURE_REFRESH_TOKEN),
        })
    }
}

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    async fn user_for_token(
        &self,
        access_token: &str,
    ) -> Result<AuthenticatedUser, IdentityProviderError> {
        if access_token == FIXTURE_ACCESS_TOKEN {
            Self::session().map(|session| session.user)
        } else {
            Err(IdentityProviderError::invalid_token())
        }
    }

    async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<AuthSession, IdentityProviderError> {
        if refresh_token == FIXTURE_REFRESH_TOKEN {
            Self::session()
        } else {
            Err(IdentityProviderError::invalid_token())
        }
    }

    async fn exchange_code(
        &self,
        _exchange: &CodeExchange,
    ) -> Result<AuthSession, IdentityProviderError> {
        Err(IdentityProviderError::rejected("code exchange unavailable"))
    }

    async fn verify_otp(
        &self,
        _verification: &OtpVerification,
    ) -> Result<AuthSession, IdentityProviderError> {
        Err(IdentityProviderError::rejected("otp verification unavailable"))
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, IdentityProviderError> {
        if credentials.email().as_str() == FIXTURE_EMAIL
            && credentials.password().expose() == FIXTURE_PASSWORD
        {
            Self::session()
        } else {
            Err(IdentityProviderError::rejected("Invalid login credentials"))
        }
    }

    async fn sign_up(
        &self,
        _credentials: &Credentials,
        _email_redirect_to: &str,
    ) -> Result<SignUpOutcome, IdentityProviderError> {
        Ok(SignUpOutcome::ConfirmationRequired)
    }

    async fn send_password_reset(
        &self,
        _email: &EmailAddress,
        _redirect_to: &str,
    ) -> Result<(), IdentityProviderError> {
        Ok(())
    }

    async fn update_password(
        &self,
        access_token: &str,
        _password: &Password,
    ) -> Result<(), IdentityProviderError> {
        if access_token == FIXTURE_ACCESS_TOKEN {
            Ok(())
        } else {
            Err(IdentityProviderError::invalid_token())
        }
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), IdentityProviderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FIXTURE_EMAIL, FIXTURE_PASSWORD, true)]
    #[case(FIXTURE_EMAIL, "wrong", false)]
    #[case("other@emoji.local", FIXTURE_PASSWORD, false)]
    #[tokio::test]
    async fn fixture_accepts_only_the_demo_account(
        #[case] email: &str,
        #[case] password: &str,
        #[case] should_succeed: bool,
    ) {
        let creds = Credentials::for_sign_in(email, password).expect("credentials shape");
        let result = FixtureIdentityProvider.sign_in_with_password(&creds).await;
        match (should_succeed, result) {
            (true, Ok(session)) => {
                assert_eq!(session.user.id.to_string(), FIXTURE_USER_ID);
                assert_eq!(session.tokens.access_token, FIXTURE_ACCESS_TOKEN);
            }
            (false, Err(err)) => assert!(err.is_rejection()),
            (true, Err(err)) => panic!("expected success, got error: {err:?}"),
            (false, Ok(session)) => panic!("expected failure, got session for {:?}", session.user),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_rejects_unknown_tokens() {
        let err = FixtureIdentityProvider
            .user_for_token("stale")
            .await
            .expect_err("unknown token");
        assert_eq!(err, IdentityProviderError::InvalidToken);
    }

    #[rstest]
    #[case(IdentityProviderError::invalid_token(), true)]
    #[case(IdentityProviderError::rejected("no"), true)]
    #[case(IdentityProviderError::transport("down"), false)]
    #[case(IdentityProviderError::decode("junk"), false)]
    fn rejection_classification(#[case] err: IdentityProviderError, #[case] expected: bool) {
        assert_eq!(err.is_rejection(), expected);
    }
}
