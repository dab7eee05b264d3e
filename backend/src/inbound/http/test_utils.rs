//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Key, SameSite};
use url::Url;

use super::session_config::SessionSettings;
use super::state::{HttpState, HttpStatePorts, SiteConfig};
use crate::domain::ports::{
    FixtureEmojiGalleryQuery, FixtureEmojiGeneration, FixtureEmojiLikesCommand,
    FixtureIdentityProvider,
};
use crate::domain::{AuthenticatedUser, UserId};

/// Site URL used by handler tests.
pub const TEST_SITE_URL: &str = "http://localhost:3000";

/// Cookie session middleware with a fresh key and no `Secure` flag.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionSettings {
        key: Key::generate(),
        cookie_secure: false,
        same_site: SameSite::Lax,
    }
    .middleware()
}

/// Site configuration pointing at [`TEST_SITE_URL`].
pub fn test_site(development: bool) -> SiteConfig {
    SiteConfig::new(
        Url::parse(TEST_SITE_URL).expect("test site url"),
        development,
    )
}

/// Ports backed entirely by fixtures; tests override the fields they need.
pub fn fixture_ports() -> HttpStatePorts {
    HttpStatePorts {
        generation: Arc::new(FixtureEmojiGeneration),
        gallery: Arc::new(FixtureEmojiGalleryQuery),
        likes: Arc::new(FixtureEmojiLikesCommand),
        identity: Arc::new(FixtureIdentityProvider),
    }
}

/// Handler state from `ports` with a production-like site configuration.
pub fn state_from(ports: HttpStatePorts) -> HttpState {
    HttpState::new(ports, test_site(false))
}

/// A signed-in caller with a random id.
pub fn signed_in_user() -> AuthenticatedUser {
    AuthenticatedUser::new(UserId::random(), Some("ada@example.com".to_owned()))
}
