//! Cache-control policies shared by handlers.

use actix_web::http::header::{CACHE_CONTROL, HeaderName};

/// Probe and auth responses are never cached.
pub const NO_STORE: &str = "no-store";

/// Emoji images may be cached by the caller's browser only.
pub const PRIVATE_IMAGE: &str = "private, max-age=3600";

/// Header tuple for [`NO_STORE`].
pub const fn no_store_header() -> (HeaderName, &'static str) {
    (CACHE_CONTROL, NO_STORE)
}

/// Header tuple for [`PRIVATE_IMAGE`].
pub const fn private_image_header() -> (HeaderName, &'static str) {
    (CACHE_CONTROL, PRIVATE_IMAGE)
}
