//! Redirect target rules for the auth callback routes.
//!
//! Both helpers refuse anything that could send the browser off-site.

/// Route users land on when `next` is missing or unsafe.
pub const DEFAULT_NEXT_PATH: &str = "/";
/// Route shown when a code exchange or OTP verification fails.
pub const AUTH_ERROR_PATH: &str = "/auth/auth-code-error";
/// Route unauthenticated page requests are redirected to.
pub const LOGIN_PATH: &str = "/login";

/// Return `raw` when it is a same-site relative path, else `/`.
///
/// # Examples
/// ```
/// use emoji_backend::domain::safe_next_path;
///
/// assert_eq!(safe_next_path(Some("/gallery?page=2")), "/gallery?page=2");
/// assert_eq!(safe_next_path(Some("//evil.example")), "/");
/// assert_eq!(safe_next_path(Some("https://evil.example")), "/");
/// assert_eq!(safe_next_path(None), "/");
/// ```
pub fn safe_next_path(raw: Option<&str>) -> String {
    match raw {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path.to_owned()
        }
        _ => DEFAULT_NEXT_PATH.to_owned(),
    }
}

/// Build an `https` origin from an `x-forwarded-host` value.
///
/// Returns `None` unless the value is a bare host with an optional port.
///
/// # Examples
/// ```
/// use emoji_backend::domain::forwarded_origin;
///
/// assert_eq!(forwarded_origin("emoji.example").as_deref(), Some("https://emoji.example"));
/// assert_eq!(forwarded_origin("emoji.example:8443").as_deref(), Some("https://emoji.example:8443"));
/// assert!(forwarded_origin("evil.example/path").is_none());
/// assert!(forwarded_origin("").is_none());
/// ```
pub fn forwarded_origin(host: &str) -> Option<String> {
    let host = host.split(',').next().unwrap_or_default().trim();
    if host.is_empty() || host.starts_with('.') || host.starts_with('-') {
        return None;
    }
    let (name, port) = match host.rsplit_once(':') {
        Some((name, port)) => (name, Some(port)),
        None => (host, None),
    };
    let name_ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let port_ok = port.is_none_or(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    (name_ok && port_ok).then(|| format!("https://{host}"))
}

/// Pick the origin for a post-authentication redirect.
///
/// Development builds always use `site_url`. Otherwise a valid forwarded host
/// wins, falling back to `site_url`.
pub fn callback_origin(site_url: &str, development: bool, forwarded_host: Option<&str>) -> String {
    let site = site_url.trim_end_matches('/').to_owned();
    if development {
        return site;
    }
    forwarded_host.and_then(forwarded_origin).unwrap_or(site)
}
