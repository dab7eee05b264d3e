//! Authentication routes relaying to the identity provider.
//!
//! ```text
//! GET  /auth/callback?code=...&next=/gallery
//! GET  /auth/confirm?token_hash=...&type=recovery&next=/update-password
//! GET  /auth/auth-code-error
//! POST /auth/login {"email":"ada@example.com","password":"..."}
//! POST /auth/signup {"email":"ada@example.com","password":"..."}
//! POST /auth/recover {"email":"ada@example.com"}
//! POST /auth/logout
//! POST /api/auth/password {"password":"..."}
//! ```
//!
//! The provider owns every credential. These handlers validate input, relay
//! it, and keep the returned token pair in the encrypted session cookie.

use actix_web::cookie::Cookie;
use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::IdentityProviderError;
use crate::domain::{
    AUTH_ERROR_PATH, AuthSession, AuthenticatedUser, CodeExchange, Credentials, EmailAddress,
    Error, ErrorEnvelope, OtpKind, OtpVerification, Password, SignUpOutcome, callback_origin,
    safe_next_path,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::no_store_header;
use crate::inbound::http::session::{AUTHENTICATION_REQUIRED, SessionContext};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::credentials_error;

/// Cookie holding the PKCE verifier written when an OAuth flow starts.
pub const CODE_VERIFIER_COOKIE: &str = "emoji-code-verifier";
/// Message returned when the provider refuses a password sign-in.
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid login credentials";
/// Message returned when the provider cannot be reached.
pub const PROVIDER_UNAVAILABLE_MESSAGE: &str = "Authentication service unavailable";
/// Message served by the auth error page.
pub const AUTH_LINK_INVALID_MESSAGE: &str = "Authentication link is invalid or has expired";
/// Message returned when the signed-in response cannot be assembled.
pub const SIGN_IN_INCOMPLETE_MESSAGE: &str = "Failed to complete sign-in";

const FORWARDED_HOST_HEADER: &str = "x-forwarded-host";
const CONFIRM_PATH: &str = "/auth/confirm";
const RECOVERY_CONFIRM_PATH: &str = "/auth/confirm?next=/update-password";

/// Query parameters of the OAuth callback.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    /// One-time authorisation code.
    pub code: Option<String>,
    /// Relative path to land on afterwards.
    pub next: Option<String>,
}

/// Query parameters of an e-mail confirmation link.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConfirmQuery {
    /// Hashed one-time token.
    pub token_hash: Option<String>,
    /// OTP flavour, e.g. `signup` or `recovery`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Authorisation code, used instead of a token hash by some links.
    pub code: Option<String>,
    /// Relative path to land on afterwards.
    pub next: Option<String>,
}

/// E-mail and password submitted by the login and sign-up forms.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct CredentialsRequest {
    /// Account e-mail address.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Body of `POST /auth/recover`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RecoverRequest {
    /// Address to send the reset link to.
    pub email: String,
}

/// Body of `POST /api/auth/password`.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct UpdatePasswordRequest {
    /// The new password.
    pub password: String,
}

/// The signed-in user as reported to the client.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SessionUserResponse {
    /// Provider user identifier.
    pub id: String,
    /// E-mail address, when known.
    pub email: Option<String>,
}

/// Response of a successful sign-in.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignInResponse {
    /// Always `true`.
    pub success: bool,
    /// The signed-in user.
    pub user: SessionUserResponse,
}

/// Response of `POST /auth/signup`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    /// Always `true`.
    pub success: bool,
    /// Whether the user must follow an e-mail link before signing in.
    pub confirmation_required: bool,
}

/// Bare success acknowledgement.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AckResponse {
    /// Always `true`.
    pub success: bool,
}

impl AckResponse {
    fn ok() -> web::Json<Self> {
        web::Json(Self { success: true })
    }
}

fn redirect_to(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, location))
        .insert_header(no_store_header())
        .finish()
}

fn code_verifier(req: &HttpRequest) -> Option<String> {
    req.cookie(CODE_VERIFIER_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

fn verifier_removal() -> Cookie<'static> {
    let mut cookie = Cookie::new(CODE_VERIFIER_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

fn verifier_expiry_failed(err: &dyn std::fmt::Display) -> Error {
    error!(error = %err, "failed to expire the code verifier cookie");
    Error::internal(SIGN_IN_INCOMPLETE_MESSAGE)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Map a provider failure; refusals become the error built by `rejected`.
fn provider_error(err: &IdentityProviderError, rejected: impl FnOnce() -> Error) -> Error {
    if err.is_rejection() {
        warn!(error = %err, "identity provider refused request");
        rejected()
    } else {
        error!(error = %err, "identity provider request failed");
        Error::internal(PROVIDER_UNAVAILABLE_MESSAGE)
    }
}

fn signed_in(session: &SessionContext, auth: AuthSession) -> ApiResult<web::Json<SignInResponse>> {
    session.store_tokens(&auth.tokens)?;
    Ok(web::Json(SignInResponse {
        success: true,
        user: SessionUserResponse {
            id: auth.user.id.to_string(),
            email: auth.user.email,
        },
    }))
}

/// Complete an OAuth or PKCE sign-in and redirect to `next`.
#[utoipa::path(
    get,
    path = "/auth/callback",
    params(CallbackQuery),
    responses(
        (status = 302, description = "Redirect to `next`, or to the auth error page on failure")
    ),
    tags = ["auth"],
    operation_id = "authCallback",
    security([])
)]
#[get("/callback")]
pub async fn callback(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<CallbackQuery>,
) -> ApiResult<HttpResponse> {
    let CallbackQuery { code, next } = query.into_inner();
    let forwarded_host = req
        .headers()
        .get(FORWARDED_HOST_HEADER)
        .and_then(|value| value.to_str().ok());
    let origin = callback_origin(
        state.site.site_url().as_str(),
        state.site.development(),
        forwarded_host,
    );
    let failure = format!("{origin}{AUTH_ERROR_PATH}");

    let Some(code) = non_empty(code) else {
        return Ok(redirect_to(&failure));
    };
    let exchange = CodeExchange {
        code,
        code_verifier: code_verifier(&req),
    };
    match state.identity.exchange_code(&exchange).await {
        Ok(auth) => {
            session.store_tokens(&auth.tokens)?;
            let mut response = redirect_to(&format!("{origin}{}", safe_next_path(next.as_deref())));
            if exchange.code_verifier.is_some() {
                response
                    .add_removal_cookie(&verifier_removal())
                    .map_err(|err| verifier_expiry_failed(&err))?;
            }
            Ok(response)
        }
        Err(err) => {
            warn!(error = %err, "authorisation code exchange failed");
            Ok(redirect_to(&failure))
        }
    }
}

/// Verify an e-mail link and redirect to `next` on this site.
#[utoipa::path(
    get,
    path = "/auth/confirm",
    params(ConfirmQuery),
    responses(
        (status = 302, description = "Redirect to `next`, or to the auth error page on failure")
    ),
    tags = ["auth"],
    operation_id = "authConfirm",
    security([])
)]
#[get("/confirm")]
pub async fn confirm(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ConfirmQuery>,
) -> ApiResult<HttpResponse> {
    let ConfirmQuery {
        token_hash,
        kind,
        code,
        next,
    } = query.into_inner();
    let origin = state.site.origin();
    let failure = format!("{origin}{AUTH_ERROR_PATH}");

    let outcome = match (non_empty(token_hash), kind, non_empty(code)) {
        (Some(token_hash), Some(kind), _) => match kind.parse::<OtpKind>() {
            Ok(kind) => {
                state
                    .identity
                    .verify_otp(&OtpVerification { token_hash, kind })
                    .await
            }
            Err(err) => {
                warn!(error = %err, "confirmation link has unknown type");
                return Ok(redirect_to(&failure));
            }
        },
        (_, _, Some(code)) => {
            state
                .identity
                .exchange_code(&CodeExchange {
                    code,
                    code_verifier: code_verifier(&req),
                })
                .await
        }
        _ => return Ok(redirect_to(&failure)),
    };

    match outcome {
        Ok(auth) => {
            session.store_tokens(&auth.tokens)?;
            Ok(redirect_to(&format!(
                "{origin}{}",
                safe_next_path(next.as_deref())
            )))
        }
        Err(err) => {
            warn!(error = %err, "e-mail confirmation failed");
            Ok(redirect_to(&failure))
        }
    }
}

/// Landing page for failed callbacks and confirmations.
#[utoipa::path(
    get,
    path = "/auth/auth-code-error",
    responses((status = 400, description = "The link could not be used", body = ErrorEnvelope)),
    tags = ["auth"],
    operation_id = "authCodeError",
    security([])
)]
#[get("/auth-code-error")]
pub async fn auth_code_error() -> ApiResult<HttpResponse> {
    Err(Error::invalid_request(AUTH_LINK_INVALID_MESSAGE))
}

/// Sign in with e-mail and password.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Malformed credentials", body = ErrorEnvelope),
        (status = 401, description = "Invalid login credentials", body = ErrorEnvelope),
        (status = 500, description = "Identity provider unavailable", body = ErrorEnvelope)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<web::Json<SignInResponse>> {
    let credentials = Credentials::for_sign_in(&payload.email, &payload.password)
        .map_err(|err| credentials_error(&err))?;
    let auth = state
        .identity
        .sign_in_with_password(&credentials)
        .await
        .map_err(|err| provider_error(&err, || Error::unauthorized(INVALID_LOGIN_MESSAGE)))?;
    signed_in(&session, auth)
}

/// Create an account. Confirmation links land on `/auth/confirm`.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Account created", body = SignUpResponse),
        (status = 400, description = "Malformed or refused credentials", body = ErrorEnvelope),
        (status = 500, description = "Identity provider unavailable", body = ErrorEnvelope)
    ),
    tags = ["auth"],
    operation_id = "signUp",
    security([])
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<web::Json<SignUpResponse>> {
    let credentials = Credentials::for_sign_up(&payload.email, &payload.password)
        .map_err(|err| credentials_error(&err))?;
    let redirect = state.site.url_for(CONFIRM_PATH);
    let outcome = state
        .identity
        .sign_up(&credentials, redirect.as_str())
        .await
        .map_err(|err| {
            provider_error(&err, || match &err {
                IdentityProviderError::Rejected { message } => Error::invalid_request(message),
                _ => Error::invalid_request("Sign up failed"),
            })
        })?;
    let confirmation_required = match outcome {
        SignUpOutcome::ConfirmationRequired => true,
        SignUpOutcome::SignedIn(auth) => {
            session.store_tokens(&auth.tokens)?;
            false
        }
    };
    Ok(web::Json(SignUpResponse {
        success: true,
        confirmation_required,
    }))
}

/// Send a password reset e-mail.
///
/// Refusals are acknowledged like successes so the endpoint does not reveal
/// which addresses have accounts.
#[utoipa::path(
    post,
    path = "/auth/recover",
    request_body = RecoverRequest,
    responses(
        (status = 200, description = "Reset e-mail requested", body = AckResponse),
        (status = 400, description = "Malformed e-mail address", body = ErrorEnvelope),
        (status = 500, description = "Identity provider unavailable", body = ErrorEnvelope)
    ),
    tags = ["auth"],
    operation_id = "recoverPassword",
    security([])
)]
#[post("/recover")]
pub async fn recover(
    state: web::Data<HttpState>,
    payload: web::Json<RecoverRequest>,
) -> ApiResult<web::Json<AckResponse>> {
    let email = EmailAddress::parse(&payload.email).map_err(|err| credentials_error(&err))?;
    let redirect = state.site.url_for(RECOVERY_CONFIRM_PATH);
    match state
        .identity
        .send_password_reset(&email, redirect.as_str())
        .await
    {
        Ok(()) => Ok(AckResponse::ok()),
        Err(err) if err.is_rejection() => {
            warn!(error = %err, "password reset refused");
            Ok(AckResponse::ok())
        }
        Err(err) => Err(provider_error(&err, || Error::internal(PROVIDER_UNAVAILABLE_MESSAGE))),
    }
}

/// Revoke the provider session and clear the cookie.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Signed out", body = AckResponse)),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AckResponse>> {
    if let Some(tokens) = session.tokens() {
        if let Err(err) = state.identity.sign_out(&tokens.access_token).await {
            warn!(error = %err, "provider sign-out failed; clearing session anyway");
        }
    }
    session.clear();
    Ok(AckResponse::ok())
}

/// Change the signed-in user's password.
#[utoipa::path(
    post,
    path = "/api/auth/password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = AckResponse),
        (status = 400, description = "Password too short", body = ErrorEnvelope),
        (status = 401, description = "Authentication required", body = ErrorEnvelope),
        (status = 500, description = "Identity provider unavailable", body = ErrorEnvelope)
    ),
    tags = ["auth"],
    operation_id = "updatePassword"
)]
#[post("/auth/password")]
pub async fn update_password(
    state: web::Data<HttpState>,
    _user: AuthenticatedUser,
    session: SessionContext,
    payload: web::Json<UpdatePasswordRequest>,
) -> ApiResult<web::Json<AckResponse>> {
    let password = Password::new_secret(&payload.password).map_err(|err| credentials_error(&err))?;
    let tokens = session
        .tokens()
        .ok_or_else(|| Error::unauthorized(AUTHENTICATION_REQUIRED))?;
    state
        .identity
        .update_password(&tokens.access_token, &password)
        .await
        .map_err(|err| provider_error(&err, || Error::unauthorized(AUTHENTICATION_REQUIRED)))?;
    Ok(AckResponse::ok())
}

/// Register the public routes on an `/auth` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(callback)
        .service(confirm)
        .service(auth_code_error)
        .service(login)
        .service(signup)
        .service(recover)
        .service(logout);
}

/// Register the protected routes on an `/api` scope.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(update_password);
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
