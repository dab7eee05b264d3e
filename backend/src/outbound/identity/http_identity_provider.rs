//! Reqwest-backed identity provider speaking the GoTrue auth API.
//!
//! All endpoints live under `{base}/auth/v1/`. Every request carries the
//! project's anon key in `apikey`; user-scoped calls add the access token as
//! a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use zeroize::Zeroizing;

use super::dto::{
    ErrorDto, PasswordRequestDto, PkceRequestDto, RecoverRequestDto, RefreshRequestDto,
    SessionDto, SignUpResponseDto, UpdatePasswordRequestDto, UserDto, VerifyRequestDto,
};
use crate::domain::ports::{IdentityProvider, IdentityProviderError};
use crate::domain::{
    AuthSession, AuthenticatedUser, CodeExchange, Credentials, EmailAddress, OtpVerification,
    Password, SignUpOutcome,
};
use crate::outbound::http_support::{StatusClass, body_preview, classify_status, status_message};

const API_KEY_HEADER: &str = "apikey";
const INVALID_LOGIN_MESSAGE: &str = "Invalid login credentials";

/// Connection settings for [`HttpIdentityProvider`].
#[derive(Clone)]
pub struct HttpIdentityProviderConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub base_url: Url,
    /// Public anon key.
    pub anon_key: Zeroizing<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Identity provider adapter.
pub struct HttpIdentityProvider {
    client: Client,
    auth_url: Url,
    anon_key: Zeroizing<String>,
}

/// Errors raised while building [`HttpIdentityProvider`].
#[derive(Debug, thiserror::Error)]
pub enum IdentitySetupError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    /// The base URL cannot carry the auth path.
    #[error("invalid identity provider URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

/// How a non-success status should be read for a given call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    /// The request carried a token; 4xx means the token is unusable.
    TokenBearing,
    /// The request carried user input; 4xx means the input was refused.
    UserInput,
}

impl HttpIdentityProvider {
    /// Build an adapter with a client honouring `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed or the
    /// base URL cannot be extended with `auth/v1/`.
    pub fn new(config: HttpIdentityProviderConfig) -> Result<Self, IdentitySetupError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            auth_url: auth_url(&config.base_url)?,
            anon_key: config.anon_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityProviderError> {
        self.auth_url
            .join(path)
            .map_err(|err| IdentityProviderError::transport(format!("bad endpoint {path}: {err}")))
    }

    fn token_endpoint(&self, grant_type: &str) -> Result<Url, IdentityProviderError> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        Ok(url)
    }

    fn redirecting_endpoint(
        &self,
        path: &str,
        redirect_to: &str,
    ) -> Result<Url, IdentityProviderError> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        Ok(url)
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(API_KEY_HEADER, self.anon_key.as_str())
    }

    async fn send(
        &self,
        request: RequestBuilder,
        kind: CallKind,
    ) -> Result<Vec<u8>, IdentityProviderError> {
        let response = self
            .with_key(request)
            .send()
            .await
            .map_err(|err| IdentityProviderError::transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| IdentityProviderError::transport(err.to_string()))?;
        if status.is_success() {
            Ok(body.to_vec())
        } else {
            Err(map_status_error(status, body.as_ref(), kind))
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        kind: CallKind,
    ) -> Result<T, IdentityProviderError> {
        let body = self.send(request, kind).await?;
        serde_json::from_slice(&body).map_err(|err| {
            IdentityProviderError::decode(format!("{err}; body: {}", body_preview(&body)))
        })
    }

    async fn session(
        &self,
        request: RequestBuilder,
        kind: CallKind,
    ) -> Result<AuthSession, IdentityProviderError> {
        let dto: SessionDto = self.send_json(request, kind).await?;
        dto.into_domain().map_err(IdentityProviderError::decode)
    }
}

fn auth_url(base: &Url) -> Result<Url, url::ParseError> {
    let mut root = base.clone();
    if !root.path().ends_with('/') {
        let path = format!("{}/", root.path());
        root.set_path(&path);
    }
    root.join("auth/v1/")
}

fn provider_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorDto>(body)
        .ok()
        .and_then(ErrorDto::into_message)
}

fn map_status_error(status: StatusCode, body: &[u8], kind: CallKind) -> IdentityProviderError {
    match (classify_status(status), kind) {
        (StatusClass::Client, CallKind::TokenBearing) => IdentityProviderError::invalid_token(),
        (StatusClass::Client, CallKind::UserInput) => IdentityProviderError::rejected(
            provider_message(body).unwrap_or_else(|| status_message(status, body)),
        ),
        (StatusClass::RateLimited | StatusClass::Timeout | StatusClass::Server, _) => {
            IdentityProviderError::transport(status_message(status, body))
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn user_for_token(
        &self,
        access_token: &str,
    ) -> Result<AuthenticatedUser, IdentityProviderError> {
        let request = self
            .client
            .get(self.endpoint("user")?)
            .bearer_auth(access_token);
        let dto: UserDto = self.send_json(request, CallKind::TokenBearing).await?;
        dto.into_domain().map_err(IdentityProviderError::decode)
    }

    async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<AuthSession, IdentityProviderError> {
        let request = self
            .client
            .post(self.token_endpoint("refresh_token")?)
            .json(&RefreshRequestDto { refresh_token });
        self.session(request, CallKind::TokenBearing).await
    }

    async fn exchange_code(
        &self,
        exchange: &CodeExchange,
    ) -> Result<AuthSession, IdentityProviderError> {
        let request = self
            .client
            .post(self.token_endpoint("pkce")?)
            .json(&PkceRequestDto {
                auth_code: &exchange.code,
                code_verifier: exchange.code_verifier.as_deref(),
            });
        self.session(request, CallKind::UserInput).await
    }

    async fn verify_otp(
        &self,
        verification: &OtpVerification,
    ) -> Result<AuthSession, IdentityProviderError> {
        let request = self
            .client
            .post(self.endpoint("verify")?)
            .json(&VerifyRequestDto {
                kind: verification.kind.as_str(),
                token_hash: &verification.token_hash,
            });
        self.session(request, CallKind::UserInput).await
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, IdentityProviderError> {
        let request = self
            .client
            .post(self.token_endpoint("password")?)
            .json(&PasswordRequestDto {
                email: credentials.email().as_str(),
                password: credentials.password().expose(),
            });
        self.session(request, CallKind::UserInput)
            .await
            .map_err(|err| match err {
                IdentityProviderError::Rejected { .. } => {
                    IdentityProviderError::rejected(INVALID_LOGIN_MESSAGE)
                }
                other => other,
            })
    }

    async fn sign_up(
        &self,
        credentials: &Credentials,
        email_redirect_to: &str,
    ) -> Result<SignUpOutcome, IdentityProviderError> {
        let request = self
            .client
            .post(self.redirecting_endpoint("signup", email_redirect_to)?)
            .json(&PasswordRequestDto {
                email: credentials.email().as_str(),
                password: credentials.password().expose(),
            });
        let response: SignUpResponseDto = self.send_json(request, CallKind::UserInput).await?;
        response
            .into_outcome()
            .map_err(IdentityProviderError::decode)
    }

    async fn send_password_reset(
        &self,
        email: &EmailAddress,
        redirect_to: &str,
    ) -> Result<(), IdentityProviderError> {
        let request = self
            .client
            .post(self.redirecting_endpoint("recover", redirect_to)?)
            .json(&RecoverRequestDto {
                email: email.as_str(),
            });
        self.send(request, CallKind::UserInput).await.map(|_| ())
    }

    async fn update_password(
        &self,
        access_token: &str,
        password: &Password,
    ) -> Result<(), IdentityProviderError> {
        let request = self
            .client
            .put(self.endpoint("user")?)
            .bearer_auth(access_token)
            .json(&UpdatePasswordRequestDto {
                password: password.expose(),
            });
        let result = self.send(request, CallKind::UserInput).await.map(|_| ());
        match result {
            Err(IdentityProviderError::Rejected { message })
                if message.to_lowercase().contains("jwt") =>
            {
                Err(IdentityProviderError::invalid_token())
            }
            other => other,
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityProviderError> {
        let request = self
            .client
            .post(self.endpoint("logout")?)
            .bearer_auth(access_token);
        self.send(request, CallKind::TokenBearing).await.map(|_| ())
    }
}
