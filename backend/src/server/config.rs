//! HTTP server configuration object and helpers.

use emoji_backend::inbound::http::session_config::{BuildMode, SessionSettings};
use emoji_backend::inbound::http::state::SiteConfig;
use emoji_backend::outbound::generation::ReplicateConfig;
use emoji_backend::outbound::identity::HttpIdentityProviderConfig;
use emoji_backend::outbound::persistence::DbPool;
use emoji_backend::outbound::storage::HttpObjectStorageConfig;
use std::net::SocketAddr;
use std::time::Duration;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Outbound adapter settings; any group left `None` is served by fixtures,
/// except the identity provider, which release builds require.
#[derive(Default)]
pub struct AdapterConfig {
    pub(crate) identity: Option<HttpIdentityProviderConfig>,
    pub(crate) storage: Option<HttpObjectStorageConfig>,
    pub(crate) generator: Option<ReplicateConfig>,
    pub(crate) download_timeout: Option<Duration>,
}

impl AdapterConfig {
    /// Use the hosted identity provider.
    #[must_use]
    pub fn with_identity(mut self, config: Option<HttpIdentityProviderConfig>) -> Self {
        self.identity = config;
        self
    }

    /// Use the hosted image bucket.
    #[must_use]
    pub fn with_storage(mut self, config: Option<HttpObjectStorageConfig>) -> Self {
        self.storage = config;
        self
    }

    /// Use the hosted image model.
    #[must_use]
    pub fn with_generator(mut self, config: Option<ReplicateConfig>) -> Self {
        self.generator = config;
        self
    }

    /// Timeout for downloading model output.
    #[must_use]
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = Some(timeout);
        self
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) site: SiteConfig,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) adapters: AdapterConfig,
    pub(crate) build_mode: BuildMode,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a server configuration from validated settings.
    #[must_use]
    pub fn new(session: SessionSettings, site: SiteConfig, bind_addr: SocketAddr) -> Self {
        Self {
            session,
            bind_addr,
            site,
            db_pool: None,
            adapters: AdapterConfig::default(),
            build_mode: BuildMode::current(),
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool for the emoji repository.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Attach outbound adapter settings.
    #[must_use]
    pub fn with_adapters(mut self, adapters: AdapterConfig) -> Self {
        self.adapters = adapters;
        self
    }

    /// Override the build mode deciding which fixture fallbacks are allowed.
    #[must_use]
    pub fn with_build_mode(mut self, build_mode: BuildMode) -> Self {
        self.build_mode = build_mode;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
