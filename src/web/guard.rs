use anyhow::{Result, bail};
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::web::ApiError;
use crate::web::session::TOKEN_COOKIE;

pub const PUBLIC_PAGES: &[&str] = &["/", "/login", "/signup", "/privacy", "/terms", "/contact"];
pub const PROTECTED_PAGES: &[&str] = &["/welcome", "/dashboard", "/map", "/camera"];
pub const PROTECTED_APIS: &[&str] = &["/api/analyze-image", "/api/analysis-history", "/api/user"];

/// Route classification used by both the guard middleware and the page
/// router, so the two can never disagree about which paths exist.
pub static ROUTE_TABLE: RouteTable = RouteTable {
    public_pages: PUBLIC_PAGES,
    protected_pages: PROTECTED_PAGES,
    protected_apis: PROTECTED_APIS,
};

pub struct RouteTable {
    /// Exact-match paths anyone may view.
    public_pages: &'static [&'static str],
    /// Prefix-match paths that require a session cookie.
    protected_pages: &'static [&'static str],
    /// Prefix-match API paths that reject instead of redirect.
    protected_apis: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    PublicPage,
    ProtectedPage,
    ProtectedApi,
    Unlisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Serve,
    RedirectLogin,
    RedirectWelcome,
    Unauthorized,
}

impl RouteTable {
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.public_pages.contains(&path) {
            return RouteClass::PublicPage;
        }
        if starts_with_any(path, self.protected_apis) {
            return RouteClass::ProtectedApi;
        }
        if starts_with_any(path, self.protected_pages) {
            return RouteClass::ProtectedPage;
        }
        RouteClass::Unlisted
    }

    /// The decision looks only at cookie presence. A stale or forged cookie
    /// gets past the guard and is rejected by the handler it reaches.
    pub fn decide(&self, path: &str, has_token: bool) -> GuardDecision {
        match (self.classify(path), has_token) {
            (RouteClass::PublicPage, true) if path != "/" => GuardDecision::RedirectWelcome,
            (RouteClass::PublicPage, _) => GuardDecision::Serve,
            (RouteClass::ProtectedPage, false) => GuardDecision::RedirectLogin,
            (RouteClass::ProtectedApi, false) => GuardDecision::Unauthorized,
            _ => GuardDecision::Serve,
        }
    }

    /// Consistency check run once at startup.
    pub fn verify(&self) -> Result<()> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in self.entries() {
            if !entry.starts_with('/') {
                bail!("route table entry `{entry}` must start with `/`");
            }
            if seen.contains(&entry) {
                bail!("route table lists `{entry}` twice");
            }
            seen.push(entry);
        }

        for page in self.public_pages {
            let prefixes = self.protected_pages.iter().chain(self.protected_apis);
            for prefix in prefixes {
                if page.starts_with(prefix) {
                    bail!("public page `{page}` is shadowed by protected prefix `{prefix}`");
                }
            }
        }

        Ok(())
    }

    /// Every page path the table names, public first.
    pub fn pages(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.public_pages
            .iter()
            .chain(self.protected_pages.iter())
            .copied()
    }

    fn entries(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.public_pages
            .iter()
            .chain(self.protected_pages.iter())
            .chain(self.protected_apis.iter())
            .copied()
    }
}

fn starts_with_any(path: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix))
}

/// Gate placed in front of every route.
pub async fn guard(jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let has_token = jar.get(TOKEN_COOKIE).is_some();

    match ROUTE_TABLE.decide(&path, has_token) {
        GuardDecision::Serve => next.run(request).await,
        GuardDecision::RedirectLogin => Redirect::to("/login").into_response(),
        GuardDecision::RedirectWelcome => Redirect::to("/welcome").into_response(),
        GuardDecision::Unauthorized => ApiError::AuthenticationRequired.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_page_without_cookie_redirects_to_login() {
        assert_eq!(
            ROUTE_TABLE.decide("/dashboard", false),
            GuardDecision::RedirectLogin
        );
    }

    #[test]
    fn protected_page_with_cookie_is_served() {
        assert_eq!(ROUTE_TABLE.decide("/dashboard", true), GuardDecision::Serve);
    }

    #[test]
    fn public_page_with_cookie_redirects_to_welcome() {
        assert_eq!(
            ROUTE_TABLE.decide("/login", true),
            GuardDecision::RedirectWelcome
        );
    }

    #[test]
    fn root_is_served_even_with_a_cookie() {
        assert_eq!(ROUTE_TABLE.decide("/", true), GuardDecision::Serve);
        assert_eq!(ROUTE_TABLE.decide("/", false), GuardDecision::Serve);
    }

    #[test]
    fn protected_api_without_cookie_is_unauthorized() {
        assert_eq!(
            ROUTE_TABLE.decide("/api/analysis-history", false),
            GuardDecision::Unauthorized
        );
    }

    #[test]
    fn protected_api_with_cookie_passes_through() {
        assert_eq!(
            ROUTE_TABLE.decide("/api/analyze-image", true),
            GuardDecision::Serve
        );
    }

    #[test]
    fn unlisted_paths_are_served_either_way() {
        assert_eq!(
            ROUTE_TABLE.decide("/guest-dashboard", false),
            GuardDecision::Serve
        );
        assert_eq!(
            ROUTE_TABLE.decide("/guest-dashboard", true),
            GuardDecision::Serve
        );
    }

    #[test]
    fn protection_extends_to_sub_paths() {
        assert_eq!(
            ROUTE_TABLE.classify("/dashboard/settings"),
            RouteClass::ProtectedPage
        );
        assert_eq!(
            ROUTE_TABLE.classify("/api/user/profile"),
            RouteClass::ProtectedApi
        );
    }

    #[test]
    fn shipped_table_verifies() {
        ROUTE_TABLE.verify().unwrap();
    }

    #[test]
    fn duplicate_entries_fail_verification() {
        let table = RouteTable {
            public_pages: &["/a", "/a"],
            protected_pages: &[],
            protected_apis: &[],
        };
        assert!(table.verify().is_err());
    }

    #[test]
    fn shadowed_public_pages_fail_verification() {
        let table = RouteTable {
            public_pages: &["/welcome-tour"],
            protected_pages: &["/welcome"],
            protected_apis: &[],
        };
        assert!(table.verify().is_err());
    }

    #[test]
    fn relative_entries_fail_verification() {
        let table = RouteTable {
            public_pages: &["login"],
            protected_pages: &[],
            protected_apis: &[],
        };
        assert!(table.verify().is_err());
    }
}
