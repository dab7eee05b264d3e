//! Shared HTTP adapter state.
//!
//! Handlers receive this state through `actix_web::web::Data` and depend only
//! on domain ports, so they stay testable without I/O.

use std::sync::Arc;

use url::Url;

use crate::domain::ports::{EmojiGalleryQuery, EmojiGeneration, EmojiLikesCommand, IdentityProvider};

/// Parameter object bundling the ports handlers call.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// Emoji generation use-case.
    pub generation: Arc<dyn EmojiGeneration>,
    /// Gallery listing and image reads.
    pub gallery: Arc<dyn EmojiGalleryQuery>,
    /// Like toggling.
    pub likes: Arc<dyn EmojiLikesCommand>,
    /// Identity provider used by the auth routes.
    pub identity: Arc<dyn IdentityProvider>,
}

/// Where the site is served from.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    site_url: Url,
    development: bool,
}

impl SiteConfig {
    /// Describe a deployment served from `site_url`.
    pub fn new(site_url: Url, development: bool) -> Self {
        Self {
            site_url,
            development,
        }
    }

    /// Public origin, e.g. `https://emoji.example`.
    pub fn site_url(&self) -> &Url {
        &self.site_url
    }

    /// Origin without a trailing slash, for string concatenation.
    pub fn origin(&self) -> String {
        self.site_url.as_str().trim_end_matches('/').to_owned()
    }

    /// Whether this is a local development deployment.
    pub fn development(&self) -> bool {
        self.development
    }

    /// Absolute URL for `path` on this site, falling back to the site root
    /// when `path` cannot be joined.
    pub fn url_for(&self, path: &str) -> Url {
        self.site_url
            .join(path)
            .unwrap_or_else(|_| self.site_url.clone())
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Emoji generation use-case.
    pub generation: Arc<dyn EmojiGeneration>,
    /// Gallery listing and image reads.
    pub gallery: Arc<dyn EmojiGalleryQuery>,
    /// Like toggling.
    pub likes: Arc<dyn EmojiLikesCommand>,
    /// Identity provider used by the auth routes.
    pub identity: Arc<dyn IdentityProvider>,
    /// Deployment origin for redirects and pagination links.
    pub site: SiteConfig,
}

impl HttpState {
    /// Construct state from a ports bundle and site configuration.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use emoji_backend::domain::ports::{
    ///     FixtureEmojiGalleryQuery, FixtureEmojiGeneration, FixtureEmojiLikesCommand,
    ///     FixtureIdentityProvider,
    /// };
    /// use emoji_backend::inbound::http::state::{HttpState, HttpStatePorts, SiteConfig};
    /// use url::Url;
    ///
    /// let ports = HttpStatePorts {
    ///     generation: Arc::new(FixtureEmojiGeneration),
    ///     gallery: Arc::new(FixtureEmojiGalleryQuery),
    ///     likes: Arc::new(FixtureEmojiLikesCommand),
    ///     identity: Arc::new(FixtureIdentityProvider),
    /// };
    /// let site = SiteConfig::new(Url::parse("http://localhost:3000").expect("url"), true);
    /// let state = HttpState::new(ports, site);
    /// assert_eq!(state.site.origin(), "http://localhost:3000");
    /// ```
    pub fn new(ports: HttpStatePorts, site: SiteConfig) -> Self {
        let HttpStatePorts {
            generation,
            gallery,
            likes,
            identity,
        } = ports;
        Self {
            generation,
            gallery,
            likes,
            identity,
            site,
        }
    }
}
