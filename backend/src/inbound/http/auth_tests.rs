//! Tests for the authentication routes.

use std::sync::Arc;

use super::*;
use crate::domain::ports::{
    FIXTURE_EMAIL, FIXTURE_PASSWORD, FIXTURE_USER_ID, FixtureIdentityProvider, IdentityProvider,
    MockIdentityProvider,
};
use crate::domain::{SessionTokens, UserId};
use crate::inbound::http::error::extractor_config;
use crate::inbound::http::session_config::SESSION_COOKIE_NAME;
use crate::inbound::http::state::HttpStatePorts;
use crate::inbound::http::test_utils::{fixture_ports, signed_in_user, test_session_middleware, test_site};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, HttpMessage, test as actix_test};
use rstest::rstest;
use serde_json::{Value, json};

fn test_app(
    identity: Arc<dyn IdentityProvider>,
    development: bool,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let ports = HttpStatePorts {
        identity,
        ..fixture_ports()
    };
    App::new()
        .wrap(test_session_middleware())
        .configure(extractor_config)
        .app_data(web::Data::new(HttpState::new(ports, test_site(development))))
        .service(web::scope("/auth").configure(configure))
        .service(web::scope("/api").configure(configure_api))
}

fn provider_session() -> AuthSession {
    AuthSession {
        user: AuthenticatedUser::new(UserId::random(), Some("ada@example.com".to_owned())),
        tokens: SessionTokens::new("access", "refresh"),
    }
}

fn location(res: &ServiceResponse) -> Option<&str> {
    res.headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
}

fn session_cookie(res: &ServiceResponse) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.into_owned())
}

fn credentials(email: &str, password: &str) -> Value {
    json!({ "email": email, "password": password })
}

#[rstest]
#[actix_web::test]
async fn fixture_account_signs_in_and_sets_cookie() {
    let app = actix_test::init_service(test_app(Arc::new(FixtureIdentityProvider), true)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_json(credentials(FIXTURE_EMAIL, FIXTURE_PASSWORD))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(session_cookie(&res).is_some());
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["user"]["id"], json!(FIXTURE_USER_ID));
    assert_eq!(body["user"]["email"], json!(FIXTURE_EMAIL));
}

#[rstest]
#[actix_web::test]
async fn wrong_password_is_unauthorised() {
    let app = actix_test::init_service(test_app(Arc::new(FixtureIdentityProvider), true)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_json(credentials(FIXTURE_EMAIL, "not-the-password"))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&res).is_none());
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["error"], json!(INVALID_LOGIN_MESSAGE));
    assert_eq!(body["code"], json!("unauthorized"));
}

#[rstest]
#[case::malformed_email("ada", "password", "email", "malformed")]
#[case::empty_password("ada@example.com", "", "password", "empty")]
#[actix_web::test]
async fn malformed_login_is_rejected_before_the_provider(
    #[case] email: &str,
    #[case] password: &str,
    #[case] field: &str,
    #[case] code: &str,
) {
    let mut identity = MockIdentityProvider::new();
    identity.expect_sign_in_with_password().never();
    let app = actix_test::init_service(test_app(Arc::new(identity), true)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_json(credentials(email, password))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], json!(field));
    assert_eq!(body["details"]["code"], json!(code));
}

#[rstest]
#[actix_web::test]
async fn unreachable_provider_is_an_internal_error() {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_sign_in_with_password()
        .returning(|_| Err(IdentityProviderError::transport("connection refused")));
    let app = actix_test::init_service(test_app(Arc::new(identity), true)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_json(credentials("ada@example.com", "password"))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["error"], json!(PROVIDER_UNAVAILABLE_MESSAGE));
}

#[rstest]
#[case::confirmation(false, true)]
#[case::immediate(true, false)]
#[actix_web::test]
async fn signup_reports_whether_confirmation_is_needed(
    #[case] signed_in_immediately: bool,
    #[case] confirmation_required: bool,
) {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_sign_up()
        .withf(|creds, redirect| {
            creds.email().as_str() == "ada@example.com"
                && redirect == "http://localhost:3000/auth/confirm"
        })
        .times(1)
        .returning(move |_, _| {
            Ok(if signed_in_immediately {
                SignUpOutcome::SignedIn(provider_session())
            } else {
                SignUpOutcome::ConfirmationRequired
            })
        });
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/signup")
            .set_json(credentials("ada@example.com", "correct horse"))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(session_cookie(&res).is_some(), signed_in_immediately);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(
        body,
        json!({"success": true, "confirmationRequired": confirmation_required})
    );
}

#[rstest]
#[actix_web::test]
async fn signup_enforces_password_length() {
    let mut identity = MockIdentityProvider::new();
    identity.expect_sign_up().never();
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/signup")
            .set_json(credentials("ada@example.com", "short"))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["code"], json!("too_short"));
}

#[rstest]
#[actix_web::test]
async fn signup_refusal_passes_provider_message() {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_sign_up()
        .returning(|_, _| Err(IdentityProviderError::rejected("User already registered")));
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/signup")
            .set_json(credentials("ada@example.com", "correct horse"))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["error"], json!("User already registered"));
}

#[rstest]
#[case::sent(Ok(()), StatusCode::OK)]
#[case::refused(Err(IdentityProviderError::rejected("unknown user")), StatusCode::OK)]
#[case::unreachable(
    Err(IdentityProviderError::transport("timeout")),
    StatusCode::INTERNAL_SERVER_ERROR
)]
#[actix_web::test]
async fn recovery_links_land_on_password_update(
    #[case] outcome: Result<(), IdentityProviderError>,
    #[case] status: StatusCode,
) {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_send_password_reset()
        .withf(|email, redirect| {
            email.as_str() == "ada@example.com"
                && redirect == "http://localhost:3000/auth/confirm?next=/update-password"
        })
        .times(1)
        .return_once(move |_, _| outcome);
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/recover")
            .set_json(json!({"email": "ada@example.com"}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), status);
}

#[rstest]
#[actix_web::test]
async fn callback_exchanges_code_with_verifier_and_redirects() {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_exchange_code()
        .withf(|exchange| {
            exchange.code == "abc" && exchange.code_verifier.as_deref() == Some("pkce-verifier")
        })
        .times(1)
        .returning(|_| Ok(provider_session()));
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/auth/callback?code=abc&next=/gallery")
            .cookie(Cookie::new(CODE_VERIFIER_COOKIE, "pkce-verifier"))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), Some("http://localhost:3000/gallery"));
    assert!(session_cookie(&res).is_some());
    let removal = res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == CODE_VERIFIER_COOKIE)
        .expect("verifier removal cookie");
    assert_eq!(removal.value(), "");
}

#[rstest]
#[case::forwarded_in_production(false, Some("emoji.example"), "https://emoji.example/")]
#[case::ignored_in_development(true, Some("emoji.example"), "http://localhost:3000/")]
#[case::malformed_forwarded_host(false, Some("evil.example/path"), "http://localhost:3000/")]
#[case::no_forwarded_host(false, None, "http://localhost:3000/")]
#[actix_web::test]
async fn callback_origin_follows_forwarded_host(
    #[case] development: bool,
    #[case] forwarded: Option<&str>,
    #[case] expected: &str,
) {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_exchange_code()
        .returning(|_| Ok(provider_session()));
    let app = actix_test::init_service(test_app(Arc::new(identity), development)).await;

    let mut request = actix_test::TestRequest::get().uri("/auth/callback?code=abc");
    if let Some(host) = forwarded {
        request = request.insert_header(("x-forwarded-host", host));
    }
    let res = actix_test::call_service(&app, request.to_request()).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), Some(expected));
}

#[rstest]
#[case::unsafe_next("/auth/callback?code=abc&next=//evil.example", "http://localhost:3000/")]
#[case::absolute_next(
    "/auth/callback?code=abc&next=https://evil.example",
    "http://localhost:3000/"
)]
#[actix_web::test]
async fn callback_never_redirects_off_site(#[case] uri: &str, #[case] expected: &str) {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_exchange_code()
        .returning(|_| Ok(provider_session()));
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let res =
        actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;

    assert_eq!(location(&res), Some(expected));
}

#[rstest]
#[actix_web::test]
async fn callback_without_code_goes_to_error_page() {
    let mut identity = MockIdentityProvider::new();
    identity.expect_exchange_code().never();
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/auth/callback?next=/gallery")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(
        location(&res),
        Some("http://localhost:3000/auth/auth-code-error")
    );
}

#[rstest]
#[actix_web::test]
async fn failed_exchange_goes_to_error_page() {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_exchange_code()
        .returning(|_| Err(IdentityProviderError::rejected("code already used")));
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/auth/callback?code=used")
            .to_request(),
    )
    .await;

    assert_eq!(
        location(&res),
        Some("http://localhost:3000/auth/auth-code-error")
    );
    assert!(session_cookie(&res).is_none());
}

#[rstest]
#[actix_web::test]
async fn confirm_verifies_token_hash_and_redirects() {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_verify_otp()
        .withf(|verification| {
            verification.token_hash == "hash" && verification.kind == OtpKind::Recovery
        })
        .times(1)
        .returning(|_| Ok(provider_session()));
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/auth/confirm?token_hash=hash&type=recovery&next=/update-password")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(
        location(&res),
        Some("http://localhost:3000/update-password")
    );
    assert!(session_cookie(&res).is_some());
}

#[rstest]
#[actix_web::test]
async fn confirm_accepts_a_code_instead_of_a_token_hash() {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_exchange_code()
        .withf(|exchange| exchange.code == "xyz")
        .times(1)
        .returning(|_| Ok(provider_session()));
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/auth/confirm?code=xyz")
            .to_request(),
    )
    .await;

    assert_eq!(location(&res), Some("http://localhost:3000/"));
}

#[rstest]
#[case::unknown_type("/auth/confirm?token_hash=hash&type=telepathy")]
#[case::nothing_to_verify("/auth/confirm?next=/gallery")]
#[actix_web::test]
async fn unusable_confirm_links_go_to_error_page(#[case] uri: &str) {
    let mut identity = MockIdentityProvider::new();
    identity.expect_verify_otp().never();
    identity.expect_exchange_code().never();
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let res =
        actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;

    assert_eq!(
        location(&res),
        Some("http://localhost:3000/auth/auth-code-error")
    );
}

#[rstest]
#[actix_web::test]
async fn error_page_is_an_invalid_request_envelope() {
    let app = actix_test::init_service(test_app(Arc::new(FixtureIdentityProvider), false)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/auth/auth-code-error")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!(AUTH_LINK_INVALID_MESSAGE));
    assert_eq!(body["code"], json!("invalid_request"));
}

async fn signed_in_cookie<S>(app: &S) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_json(credentials("ada@example.com", "password"))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    session_cookie(&res).expect("session cookie")
}

#[rstest]
#[actix_web::test]
async fn logout_revokes_and_clears_the_session() {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_sign_in_with_password()
        .returning(|_| Ok(provider_session()));
    identity
        .expect_sign_out()
        .withf(|token| token == "access")
        .times(1)
        .returning(|_| Err(IdentityProviderError::transport("down")));
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;
    let cookie = signed_in_cookie(&app).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/logout")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let removal = session_cookie(&res).expect("removal cookie");
    assert_eq!(removal.value(), "");
}

#[rstest]
#[actix_web::test]
async fn logout_without_session_skips_the_provider() {
    let mut identity = MockIdentityProvider::new();
    identity.expect_sign_out().never();
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post().uri("/auth/logout").to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn password_update_uses_the_session_token() {
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_sign_in_with_password()
        .returning(|_| Ok(provider_session()));
    identity
        .expect_update_password()
        .withf(|token, password| token == "access" && password.expose() == "brand new secret")
        .times(1)
        .returning(|_, _| Ok(()));
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;
    let cookie = signed_in_cookie(&app).await;

    let req = actix_test::TestRequest::post()
        .uri("/api/auth/password")
        .cookie(cookie)
        .set_json(json!({"password": "brand new secret"}))
        .to_request();
    req.extensions_mut().insert(signed_in_user());
    let res = app.call(req).await.expect("service call");

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body, json!({"success": true}));
}

#[rstest]
#[actix_web::test]
async fn password_update_requires_a_user() {
    let mut identity = MockIdentityProvider::new();
    identity.expect_update_password().never();
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/auth/password")
            .set_json(json!({"password": "brand new secret"}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn password_update_rejects_short_passwords() {
    let mut identity = MockIdentityProvider::new();
    identity.expect_update_password().never();
    let app = actix_test::init_service(test_app(Arc::new(identity), false)).await;

    let req = actix_test::TestRequest::post()
        .uri("/api/auth/password")
        .set_json(json!({"password": "abc"}))
        .to_request();
    req.extensions_mut().insert(signed_in_user());
    let res = app.call(req).await.expect("service call");

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
fn verifier_expiry_failures_hide_the_cause() {
    let err = verifier_expiry_failed(&"invalid header value: emoji-code-verifier");

    assert_eq!(err.code(), crate::domain::ErrorCode::InternalError);
    assert_eq!(err.message(), SIGN_IN_INCOMPLETE_MESSAGE);
}
