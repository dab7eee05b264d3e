//! Session resolution for the auth gateway.
//!
//! Turning the cookie's provider tokens into a caller is a pure step: the
//! outcome says which user (if any) made the request and how the cookie must
//! change, and the middleware applies that change afterwards.

use tracing::{debug, warn};

use super::ports::{IdentityProvider, IdentityProviderError};
use super::{AuthenticatedUser, SessionTokens};

/// How the session cookie must change after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// Leave the cookie as it is.
    Unchanged,
    /// Store refreshed tokens.
    Replace(SessionTokens),
    /// Drop the stored tokens.
    Clear,
}

/// Result of [`resolve_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResolution {
    /// The caller, when the tokens identify one.
    pub user: Option<AuthenticatedUser>,
    /// Cookie change to apply.
    pub update: SessionUpdate,
}

impl SessionResolution {
    fn anonymous(update: SessionUpdate) -> Self {
        Self { user: None, update }
    }
}

/// Resolve the caller behind `tokens`.
///
/// A rejected access token is retried once through the refresh token. A
/// rejected refresh token clears the cookie. Transport or decoding failures
/// leave the cookie untouched and treat the request as anonymous.
pub async fn resolve_session(
    provider: &dyn IdentityProvider,
    tokens: Option<&SessionTokens>,
) -> SessionResolution {
    let Some(tokens) = tokens else {
        return SessionResolution::anonymous(SessionUpdate::Unchanged);
    };

    match provider.user_for_token(&tokens.access_token).await {
        Ok(user) => {
            return SessionResolution {
                user: Some(user),
                update: SessionUpdate::Unchanged,
            };
        }
        Err(err) if err.is_rejection() => {
            debug!(error = %err, "access token rejected; attempting refresh");
        }
        Err(err) => {
            warn!(error = %err, "identity provider unavailable during session check");
            return SessionResolution::anonymous(SessionUpdate::Unchanged);
        }
    }

    match provider.refresh_session(&tokens.refresh_token).await {
        Ok(session) => SessionResolution {
            user: Some(session.user),
            update: SessionUpdate::Replace(session.tokens),
        },
        Err(err) => refresh_failure(&err),
    }
}

fn refresh_failure(err: &IdentityProviderError) -> SessionResolution {
    if err.is_rejection() {
        debug!(error = %err, "refresh token rejected; clearing session");
        SessionResolution::anonymous(SessionUpdate::Clear)
    } else {
        warn!(error = %err, "identity provider unavailable during refresh");
        SessionResolution::anonymous(SessionUpdate::Unchanged)
    }
}

#[cfg(test)]
mod tests {
    //! Token refresh and failure handling.
    use super::*;
    use crate::domain::ports::MockIdentityProvider;
    use crate::domain::{AuthSession, UserId};
    use mockall::predicate::eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tokens() -> SessionTokens {
        SessionTokens::new("access", "refresh")
    }

    #[fixture]
    fn user() -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::random(), Some("ada@example.com".to_owned()))
    }

    #[rstest]
    #[tokio::test]
    async fn missing_tokens_resolve_to_anonymous() {
        let provider = MockIdentityProvider::new();
        let resolution = resolve_session(&provider, None).await;
        assert_eq!(
            resolution,
            SessionResolution::anonymous(SessionUpdate::Unchanged)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn valid_access_token_keeps_cookie(tokens: SessionTokens, user: AuthenticatedUser) {
        let mut provider = MockIdentityProvider::new();
        let expected = user.clone();
        provider
            .expect_user_for_token()
            .with(eq("access"))
            .times(1)
            .return_once(move |_| Ok(user));
        provider.expect_refresh_session().never();

        let resolution = resolve_session(&provider, Some(&tokens)).await;
        assert_eq!(resolution.user, Some(expected));
        assert_eq!(resolution.update, SessionUpdate::Unchanged);
    }

    #[rstest]
    #[tokio::test]
    async fn rejected_access_token_is_refreshed(tokens: SessionTokens, user: AuthenticatedUser) {
        let mut provider = MockIdentityProvider::new();
        let refreshed = SessionTokens::new("access-2", "refresh-2");
        let session = AuthSession {
            user: user.clone(),
            tokens: refreshed.clone(),
        };
        provider
            .expect_user_for_token()
            .return_once(|_| Err(IdentityProviderError::invalid_token()));
        provider
            .expect_refresh_session()
            .with(eq("refresh"))
            .times(1)
            .return_once(move |_| Ok(session));

        let resolution = resolve_session(&provider, Some(&tokens)).await;
        assert_eq!(resolution.user, Some(user));
        assert_eq!(resolution.update, SessionUpdate::Replace(refreshed));
    }

    #[rstest]
    #[tokio::test]
    async fn rejected_refresh_clears_cookie(tokens: SessionTokens) {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_user_for_token()
            .return_once(|_| Err(IdentityProviderError::invalid_token()));
        provider
            .expect_refresh_session()
            .return_once(|_| Err(IdentityProviderError::rejected("refresh token revoked")));

        let resolution = resolve_session(&provider, Some(&tokens)).await;
        assert_eq!(resolution, SessionResolution::anonymous(SessionUpdate::Clear));
    }

    #[rstest]
    #[case(IdentityProviderError::transport("connection reset"))]
    #[case(IdentityProviderError::decode("unexpected body"))]
    #[tokio::test]
    async fn provider_outage_leaves_cookie_untouched(
        tokens: SessionTokens,
        #[case] failure: IdentityProviderError,
    ) {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_user_for_token()
            .return_once(move |_| Err(failure));
        provider.expect_refresh_session().never();

        let resolution = resolve_session(&provider, Some(&tokens)).await;
        assert_eq!(
            resolution,
            SessionResolution::anonymous(SessionUpdate::Unchanged)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn refresh_outage_leaves_cookie_untouched(tokens: SessionTokens) {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_user_for_token()
            .return_once(|_| Err(IdentityProviderError::invalid_token()));
        provider
            .expect_refresh_session()
            .return_once(|_| Err(IdentityProviderError::transport("timeout")));

        let resolution = resolve_session(&provider, Some(&tokens)).await;
        assert_eq!(
            resolution,
            SessionResolution::anonymous(SessionUpdate::Unchanged)
        );
    }
}
