//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint (emojis, auth, health), the error
//! envelope schema, and the session cookie security scheme. Request and
//! response bodies referenced by the paths are collected automatically.
//!
//! The generated document is served by Swagger UI in debug builds and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::domain::{ErrorCode, ErrorEnvelope};
use crate::inbound::http::session_config::SESSION_COOKIE_NAME;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                SESSION_COOKIE_NAME,
                "Encrypted session cookie issued by POST /auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Emoji generator API",
        description = "Generate emojis from prompts, browse the gallery, and manage sessions."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::emojis::generate_emoji,
        crate::inbound::http::emojis::list_emojis,
        crate::inbound::http::emojis::toggle_like,
        crate::inbound::http::emojis::emoji_image,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::signup,
        crate::inbound::http::auth::recover,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::update_password,
        crate::inbound::http::auth::callback,
        crate::inbound::http::auth::confirm,
        crate::inbound::http::auth::auth_code_error,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorEnvelope, ErrorCode)),
    tags(
        (name = "emojis", description = "Generation, gallery, and likes"),
        (name = "auth", description = "Sign-in, sign-up, and auth redirects"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
