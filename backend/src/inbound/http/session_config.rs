//! Session cookie settings read from the process environment.
//!
//! Release builds insist on explicit, valid values for every toggle. Debug
//! builds fall back to permissive defaults and log each fallback so local
//! runs work without provisioning secrets.

pub mod fingerprint;

use std::fmt::Debug;
use std::path::PathBuf;

use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Key, SameSite, time::Duration};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroizing;

/// Environment variable naming the session key file.
pub const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
/// Environment variable toggling the `Secure` cookie attribute.
pub const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
/// Environment variable selecting the `SameSite` policy.
pub const SAMESITE_ENV: &str = "SESSION_SAMESITE";
/// Environment variable permitting a generated key when the file is missing.
pub const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";

/// Name of the encrypted session cookie.
pub const SESSION_COOKIE_NAME: &str = "emoji-session";
/// Minimum key file length accepted in release builds.
pub const SESSION_KEY_MIN_LEN: usize = 64;
/// Session cookie lifetime.
pub const SESSION_TTL_DAYS: i64 = 7;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/emoji_session_key";
// `Key::derive_from` panics below this length.
const DERIVE_MIN_LEN: usize = 32;
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|on|off";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Which validation rules apply.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Defaults are tolerated with a warning.
    Debug,
    /// Every toggle must be present and valid.
    Release,
}

impl BuildMode {
    /// Mode matching how this binary was compiled.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Validated cookie session settings.
#[derive(Clone)]
pub struct SessionSettings {
    /// Signing and encryption key.
    pub key: Key,
    /// Whether cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
    /// `SameSite` policy.
    pub same_site: SameSite,
}

impl SessionSettings {
    /// Non-secret fingerprint of the active key for startup logs.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint::key_fingerprint(&self.key)
    }

    /// Build the cookie session middleware described by these settings.
    #[must_use]
    pub fn middleware(&self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(SESSION_COOKIE_NAME.to_owned())
            .cookie_path("/".to_owned())
            .cookie_secure(self.cookie_secure)
            .cookie_http_only(true)
            .cookie_content_security(CookieContentSecurity::Private)
            .cookie_same_site(self.same_site)
            .session_lifecycle(PersistentSession::default().session_ttl(Duration::days(SESSION_TTL_DAYS)))
            .build()
    }
}

/// Errors raised while validating session settings.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    /// A required variable is unset.
    #[error("missing required environment variable: {name}")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },
    /// A variable holds an unrecognised value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Rejected value.
        value: String,
        /// Accepted spellings.
        expected: &'static str,
    },
    /// The key file could not be read.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        /// Key file location.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The key file holds too little material.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        /// Key file location.
        path: PathBuf,
        /// Bytes found.
        length: usize,
        /// Bytes required.
        min_len: usize,
    },
    /// `SameSite=None` without `Secure` in a release build.
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    /// Ephemeral keys requested in a release build.
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Read and validate session settings.
///
/// # Errors
///
/// In [`BuildMode::Release`] any missing or malformed toggle, an unreadable
/// or short key file, `SameSite=None` without `Secure`, or an ephemeral key
/// request is an error. [`BuildMode::Debug`] only fails on short key files
/// that were explicitly provided and cannot derive a key.
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let reader = EnvReader { env, mode };
    let cookie_secure = reader.flag(COOKIE_SECURE_ENV, true)?;
    let same_site = reader.same_site(cookie_secure)?;
    let allow_ephemeral = reader.flag(ALLOW_EPHEMERAL_ENV, false)?;
    if allow_ephemeral && mode == BuildMode::Release {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let key = reader.key(allow_ephemeral)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

struct EnvReader<'a, E> {
    env: &'a E,
    mode: BuildMode,
}

impl<E: Env> EnvReader<'_, E> {
    /// Release builds surface `error`; debug builds log it and use `fallback`.
    fn tolerate<T: Debug>(&self, error: SessionConfigError, fallback: T) -> Result<T, SessionConfigError> {
        match self.mode {
            BuildMode::Release => Err(error),
            BuildMode::Debug => {
                warn!(%error, ?fallback, "session setting defaulted");
                Ok(fallback)
            }
        }
    }

    fn flag(&self, name: &'static str, fallback: bool) -> Result<bool, SessionConfigError> {
        let Some(value) = self.env.string(name) else {
            return self.tolerate(SessionConfigError::MissingEnv { name }, fallback);
        };
        match parse_bool(&value) {
            Some(flag) => Ok(flag),
            None => self.tolerate(
                SessionConfigError::InvalidEnv {
                    name,
                    value,
                    expected: BOOL_EXPECTED,
                },
                fallback,
            ),
        }
    }

    fn same_site(&self, cookie_secure: bool) -> Result<SameSite, SessionConfigError> {
        let fallback = match self.mode {
            BuildMode::Debug => SameSite::Lax,
            BuildMode::Release => SameSite::Strict,
        };
        let Some(value) = self.env.string(SAMESITE_ENV) else {
            return self.tolerate(SessionConfigError::MissingEnv { name: SAMESITE_ENV }, fallback);
        };
        match value.to_ascii_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" if cookie_secure => Ok(SameSite::None),
            "none" => self.tolerate(SessionConfigError::InsecureSameSiteNone, SameSite::None),
            _ => self.tolerate(
                SessionConfigError::InvalidEnv {
                    name: SAMESITE_ENV,
                    value,
                    expected: SAMESITE_EXPECTED,
                },
                fallback,
            ),
        }
    }

    fn key(&self, allow_ephemeral: bool) -> Result<Key, SessionConfigError> {
        let path = PathBuf::from(
            self.env
                .string(KEY_FILE_ENV)
                .unwrap_or_else(|| SESSION_KEY_DEFAULT_PATH.to_owned()),
        );
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(source) if self.mode == BuildMode::Debug || allow_ephemeral => {
                warn!(path = %path.display(), error = %source, "using temporary session key (dev only)");
                return Ok(Key::generate());
            }
            Err(source) => return Err(SessionConfigError::KeyRead { path, source }),
        };

        let length = bytes.len();
        let min_len = match self.mode {
            BuildMode::Release => SESSION_KEY_MIN_LEN,
            BuildMode::Debug => DERIVE_MIN_LEN,
        };
        if length < min_len {
            return Err(SessionConfigError::KeyTooShort {
                path,
                length,
                min_len,
            });
        }
        Ok(Key::derive_from(&bytes))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
