//! Session helpers keeping handlers free of framework-specific logic.
//!
//! The encrypted cookie session holds only the identity provider's token
//! pair. The signed-in user is resolved per request by the auth gateway and
//! handed to handlers through request extensions.

use actix_session::Session;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::warn;

use crate::domain::{AuthenticatedUser, Error, SessionTokens, SessionUpdate};

pub(crate) const TOKENS_KEY: &str = "provider_tokens";

/// Message returned when a protected handler runs without a session.
pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";

/// Newtype wrapper exposing token-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Provider tokens stored in the cookie.
    ///
    /// Unreadable or tampered session data is treated as no tokens.
    pub fn tokens(&self) -> Option<SessionTokens> {
        match self.0.get::<SessionTokens>(TOKENS_KEY) {
            Ok(tokens) => tokens,
            Err(error) => {
                warn!(%error, "discarding unreadable session tokens");
                None
            }
        }
    }

    /// Persist a token pair in the session cookie.
    pub fn store_tokens(&self, tokens: &SessionTokens) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(TOKENS_KEY, tokens)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Drop every session entry and expire the cookie.
    pub fn clear(&self) {
        self.0.purge();
    }

    /// Apply the outcome of session resolution to the cookie.
    pub fn apply(&self, update: &SessionUpdate) -> Result<(), Error> {
        match update {
            SessionUpdate::Unchanged => Ok(()),
            SessionUpdate::Replace(tokens) => self.store_tokens(tokens),
            SessionUpdate::Clear => {
                self.clear();
                Ok(())
            }
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

/// Extracts the user attached by the auth gateway, or fails with `401`.
impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Self>()
                .cloned()
                .ok_or_else(|| Error::unauthorized(AUTHENTICATION_REQUIRED)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::inbound::http::session_config::SESSION_COOKIE_NAME;
    use crate::inbound::http::test_utils::test_session_middleware;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    fn session_test_app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(test_session_middleware())
            .route(
                "/store",
                web::get().to(|session: SessionContext| async move {
                    session.store_tokens(&SessionTokens::new("access", "refresh"))?;
                    Ok::<_, Error>(HttpResponse::Ok())
                }),
            )
            .route(
                "/read",
                web::get().to(|session: SessionContext| async move {
                    let body = session
                        .tokens()
                        .map(|tokens| format!("{}|{}", tokens.access_token, tokens.refresh_token))
                        .unwrap_or_default();
                    HttpResponse::Ok().body(body)
                }),
            )
            .route(
                "/tamper",
                web::get().to(|session: Session| async move {
                    session
                        .insert(TOKENS_KEY, "not a token pair")
                        .expect("insert raw string");
                    HttpResponse::Ok()
                }),
            )
            .route(
                "/clear",
                web::get().to(|session: SessionContext| async move {
                    session.apply(&SessionUpdate::Clear)?;
                    Ok::<_, Error>(HttpResponse::Ok())
                }),
            )
    }

    fn session_cookie(res: &actix_web::dev::ServiceResponse) -> actix_web::cookie::Cookie<'static> {
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
            .map(|cookie| cookie.into_owned())
            .expect("session cookie set")
    }

    #[rstest]
    #[actix_web::test]
    async fn stored_tokens_round_trip_through_the_cookie() {
        let app = test::init_service(session_test_app()).await;
        let seeded =
            test::call_service(&app, test::TestRequest::get().uri("/store").to_request()).await;
        let cookie = session_cookie(&seeded);

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/read").cookie(cookie).to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, "access|refresh");
    }

    #[rstest]
    #[actix_web::test]
    async fn tampered_tokens_read_as_absent() {
        let app = test::init_service(session_test_app()).await;
        let seeded =
            test::call_service(&app, test::TestRequest::get().uri("/tamper").to_request()).await;
        let cookie = session_cookie(&seeded);

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/read").cookie(cookie).to_request(),
        )
        .await;

        assert_eq!(test::read_body(res).await, "");
    }

    #[rstest]
    #[actix_web::test]
    async fn clearing_expires_the_cookie() {
        let app = test::init_service(session_test_app()).await;
        let seeded =
            test::call_service(&app, test::TestRequest::get().uri("/store").to_request()).await;
        let cookie = session_cookie(&seeded);

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/clear").cookie(cookie).to_request(),
        )
        .await;

        let removal = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
            .expect("removal cookie");
        assert_eq!(removal.value(), "");
    }

    #[rstest]
    #[actix_web::test]
    async fn user_extractor_requires_gateway_attachment() {
        let app = test::init_service(App::new().route(
            "/me",
            web::get().to(|user: AuthenticatedUser| async move {
                HttpResponse::Ok().body(user.id.to_string())
            }),
        ))
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let user = AuthenticatedUser::new(UserId::random(), None);
        let expected = user.id.to_string();
        let req = test::TestRequest::get().uri("/me").to_request();
        req.extensions_mut().insert(user);
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, expected.as_str());
    }
}
