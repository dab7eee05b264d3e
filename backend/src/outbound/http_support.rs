//! Response classification shared by the reqwest adapters.
//!
//! Each adapter maps a [`StatusClass`] onto its own port error so callers see
//! one taxonomy per port while status handling stays uniform.

use reqwest::StatusCode;

/// Coarse category of a non-success status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusClass {
    /// `429 Too Many Requests`.
    RateLimited,
    /// `408` or `504`.
    Timeout,
    /// Any other `4xx`.
    Client,
    /// Everything else.
    Server,
}

/// Classify a non-success status.
pub(crate) fn classify_status(status: StatusCode) -> StatusClass {
    match status {
        StatusCode::TOO_MANY_REQUESTS => StatusClass::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => StatusClass::Timeout,
        _ if status.is_client_error() => StatusClass::Client,
        _ => StatusClass::Server,
    }
}

/// `status N` plus a compact preview of the body when there is one.
pub(crate) fn status_message(status: StatusCode, body: &[u8]) -> String {
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), preview)
    }
}

/// Whitespace-collapsed body text, cut to 160 characters.
pub(crate) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
