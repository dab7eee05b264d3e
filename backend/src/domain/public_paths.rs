//! Allow-list of paths reachable without a session.

/// Route prefixes that never require authentication.
pub const PUBLIC_ROUTES: [&str; 8] = [
    "/",
    "/login",
    "/signup",
    "/auth",
    "/update-password",
    "/health",
    "/docs",
    "/api-docs",
];

/// File extensions served as static assets.
pub const STATIC_EXTENSIONS: [&str; 7] = ["ico", "png", "jpg", "jpeg", "svg", "css", "js"];

/// Decides whether a request path bypasses authentication.
///
/// A path is public when it equals a listed route, starts with a listed route
/// followed by `/`, or ends in a static asset extension.
///
/// # Examples
/// ```
/// use emoji_backend::domain::PublicPaths;
///
/// let paths = PublicPaths::default();
/// assert!(paths.is_public("/auth/callback"));
/// assert!(paths.is_public("/favicon.ico"));
/// assert!(!paths.is_public("/api/emojis"));
/// assert!(!paths.is_public("/authz"));
/// ```
#[derive(Debug, Clone)]
pub struct PublicPaths {
    routes: Vec<String>,
    extensions: Vec<String>,
}

impl Default for PublicPaths {
    fn default() -> Self {
        Self::new(PUBLIC_ROUTES, STATIC_EXTENSIONS)
    }
}

impl PublicPaths {
    /// Build an allow-list from explicit routes and extensions.
    pub fn new<R, E>(routes: R, extensions: E) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            routes: routes.into_iter().map(Into::into).collect(),
            extensions: extensions
                .into_iter()
                .map(|ext| ext.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether `path` may be served without a session.
    pub fn is_public(&self, path: &str) -> bool {
        self.matches_route(path) || self.is_static_asset(path)
    }

    fn matches_route(&self, path: &str) -> bool {
        self.routes.iter().any(|route| {
            path == route
                || path
                    .strip_prefix(route.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    fn is_static_asset(&self, path: &str) -> bool {
        path.rsplit_once('.').is_some_and(|(stem, ext)| {
            !stem.is_empty()
                && !ext.contains('/')
                && self
                    .extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
    }
}

#[cfg(test)]
mod tests {
    //! Allow-list matching rules.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/", true)]
    #[case("/login", true)]
    #[case("/login/", true)]
    #[case("/signup", true)]
    #[case("/auth/callback", true)]
    #[case("/auth/confirm", true)]
    #[case("/update-password", true)]
    #[case("/health/ready", true)]
    #[case("/docs/index.html", true)]
    #[case("/logo.svg", true)]
    #[case("/static/app.JS", true)]
    #[case("/authorised", false)]
    #[case("/loginx", false)]
    #[case("/api/emojis", false)]
    #[case("/api/generate", false)]
    #[case("/dashboard", false)]
    #[case("/file.png/evil", false)]
    #[case("/archive.tar", false)]
    fn default_allow_list(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(PublicPaths::default().is_public(path), expected, "{path}");
    }

    #[rstest]
    fn root_route_does_not_open_everything() {
        let paths = PublicPaths::new(["/"], Vec::<String>::new());
        assert!(paths.is_public("/"));
        assert!(!paths.is_public("/api/emojis"));
    }
}
