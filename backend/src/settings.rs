//! Application settings loaded via OrthoConfig.
//!
//! Every value comes from `EMOJI_*` environment variables (or the matching
//! command-line flags). Adapter groups are all-or-nothing: a group left
//! entirely unset falls back to fixtures, a half-configured group is an
//! error.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::outbound::generation::{DEFAULT_EMOJI_MODEL, DEFAULT_REPLICATE_ENDPOINT, ReplicateConfig};
use crate::outbound::identity::HttpIdentityProviderConfig;
use crate::outbound::persistence::PoolConfig;
use crate::outbound::storage::HttpObjectStorageConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SITE_URL: &str = "http://localhost:3000";
const DEFAULT_BUCKET: &str = "emojis";
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A value could not be parsed.
    #[error("invalid {name}: {message}")]
    Invalid {
        /// Environment variable carrying the value.
        name: &'static str,
        /// Parse failure text.
        message: String,
    },
    /// Part of an adapter group is set but a required value is missing.
    #[error("{group} is partially configured; set {missing}")]
    Incomplete {
        /// Adapter group, e.g. `identity provider`.
        group: &'static str,
        /// Environment variable that must also be set.
        missing: &'static str,
    },
}

/// Configuration values for the HTTP server and its adapters.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "EMOJI")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// Public origin used for redirects and pagination links.
    pub site_url: Option<String>,
    /// Local development mode; callback redirects ignore forwarded hosts.
    #[ortho_config(default = false)]
    pub development: bool,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Apply embedded migrations before serving.
    #[ortho_config(default = false)]
    pub run_migrations: bool,
    /// Identity provider project URL.
    pub identity_url: Option<String>,
    /// Identity provider public key.
    pub identity_anon_key: Option<String>,
    /// Object storage project URL.
    pub storage_url: Option<String>,
    /// Object storage service key.
    pub storage_service_key: Option<String>,
    /// Bucket holding emoji images.
    pub storage_bucket: Option<String>,
    /// Replicate API token.
    pub replicate_api_token: Option<String>,
    /// Replicate model reference.
    pub replicate_model: Option<String>,
    /// Replicate API root override.
    pub replicate_endpoint: Option<String>,
    /// Upper bound for one generation, in seconds.
    pub generation_timeout_secs: Option<u64>,
    /// Timeout for other outbound calls, in seconds.
    pub http_timeout_secs: Option<u64>,
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|err| SettingsError::Invalid {
        name,
        message: err.to_string(),
    })
}

fn pair<'a>(
    group: &'static str,
    first: (&'static str, Option<&'a str>),
    second: (&'static str, Option<&'a str>),
) -> Result<Option<(&'a str, &'a str)>, SettingsError> {
    match (first.1, second.1) {
        (Some(a), Some(b)) => Ok(Some((a, b))),
        (None, None) => Ok(None),
        (Some(_), None) => Err(SettingsError::Incomplete {
            group,
            missing: second.0,
        }),
        (None, Some(_)) => Err(SettingsError::Incomplete {
            group,
            missing: first.0,
        }),
    }
}

impl AppSettings {
    /// Socket address to bind, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
            .map_err(|err: std::net::AddrParseError| SettingsError::Invalid {
                name: "EMOJI_BIND_ADDR",
                message: err.to_string(),
            })
    }

    /// Public site URL, defaulting to `http://localhost:3000`.
    pub fn site_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "EMOJI_SITE_URL",
            self.site_url.as_deref().unwrap_or(DEFAULT_SITE_URL),
        )
    }

    /// Timeout applied to generation including polling.
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(
            self.generation_timeout_secs
                .unwrap_or(DEFAULT_GENERATION_TIMEOUT_SECS),
        )
    }

    /// Timeout applied to storage, identity, and download calls.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    /// Database pool settings when a database URL is set.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.database_url.as_deref().map(|url| {
            let config = PoolConfig::new(url);
            match self.db_max_connections {
                Some(max) => config.with_max_size(max),
                None => config,
            }
        })
    }

    /// Identity provider settings when both URL and key are set.
    pub fn identity_config(&self) -> Result<Option<HttpIdentityProviderConfig>, SettingsError> {
        let Some((url, key)) = pair(
            "identity provider",
            ("EMOJI_IDENTITY_URL", self.identity_url.as_deref()),
            ("EMOJI_IDENTITY_ANON_KEY", self.identity_anon_key.as_deref()),
        )?
        else {
            return Ok(None);
        };
        Ok(Some(HttpIdentityProviderConfig {
            base_url: parse_url("EMOJI_IDENTITY_URL", url)?,
            anon_key: Zeroizing::new(key.to_owned()),
            timeout: self.http_timeout(),
        }))
    }

    /// Object storage settings when both URL and service key are set.
    pub fn storage_config(&self) -> Result<Option<HttpObjectStorageConfig>, SettingsError> {
        let Some((url, key)) = pair(
            "object storage",
            ("EMOJI_STORAGE_URL", self.storage_url.as_deref()),
            (
                "EMOJI_STORAGE_SERVICE_KEY",
                self.storage_service_key.as_deref(),
            ),
        )?
        else {
            return Ok(None);
        };
        Ok(Some(HttpObjectStorageConfig {
            base_url: parse_url("EMOJI_STORAGE_URL", url)?,
            service_key: Zeroizing::new(key.to_owned()),
            bucket: self
                .storage_bucket
                .clone()
                .unwrap_or_else(|| DEFAULT_BUCKET.to_owned()),
            timeout: self.http_timeout(),
        }))
    }

    /// Image model settings when an API token is set.
    pub fn generator_config(&self) -> Result<Option<ReplicateConfig>, SettingsError> {
        let Some(token) = self.replicate_api_token.as_deref() else {
            return Ok(None);
        };
        Ok(Some(ReplicateConfig {
            endpoint: parse_url(
                "EMOJI_REPLICATE_ENDPOINT",
                self.replicate_endpoint
                    .as_deref()
                    .unwrap_or(DEFAULT_REPLICATE_ENDPOINT),
            )?,
            api_token: Zeroizing::new(token.to_owned()),
            model: self
                .replicate_model
                .clone()
                .unwrap_or_else(|| DEFAULT_EMOJI_MODEL.to_owned()),
            timeout: self.generation_timeout(),
        }))
    }
}
