use axum::{http::Uri, response::Html};
use chrono::{Datelike, Utc};

const PAGE_BASE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f0fdf4; color: #14532d; }
        header { background: #ffffff; padding: 2rem 1.5rem; border-bottom: 1px solid #bbf7d0; }
        header h1 { margin: 0 0 0.35rem; font-size: 1.6rem; }
        .tagline { margin: 0; color: #166534; }
        main { padding: 2rem 1.5rem; max-width: 960px; margin: 0 auto; box-sizing: border-box; min-height: 50vh; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #4d7c0f; }
"#;

/// Copy for one page shell. The interactive views are rendered by the
/// frontend bundle; the server only ships the frame it mounts into.
struct PageCopy {
    path: &'static str,
    title: &'static str,
    tagline: &'static str,
}

const PAGES: &[PageCopy] = &[
    PageCopy {
        path: "/",
        title: "ECo-logic",
        tagline: "Scan a product, see its footprint.",
    },
    PageCopy {
        path: "/login",
        title: "Log in",
        tagline: "Welcome back. Sessions last 24 hours.",
    },
    PageCopy {
        path: "/signup",
        title: "Create an account",
        tagline: "One account for analyses and history.",
    },
    PageCopy {
        path: "/privacy",
        title: "Privacy policy",
        tagline: "What we store and for how long.",
    },
    PageCopy {
        path: "/terms",
        title: "Terms of service",
        tagline: "The conditions for using ECo-logic.",
    },
    PageCopy {
        path: "/contact",
        title: "Contact",
        tagline: "Questions, feedback, corrections.",
    },
    PageCopy {
        path: "/welcome",
        title: "Welcome",
        tagline: "Pick a tool to get started.",
    },
    PageCopy {
        path: "/dashboard",
        title: "Dashboard",
        tagline: "Your recent analyses at a glance.",
    },
    PageCopy {
        path: "/map",
        title: "Recycling map",
        tagline: "Drop-off points near you.",
    },
    PageCopy {
        path: "/camera",
        title: "Camera",
        tagline: "Snap or record a product to analyze it.",
    },
    PageCopy {
        path: "/guest-dashboard",
        title: "Guest dashboard",
        tagline: "Browse without an account.",
    },
];

const FALLBACK: PageCopy = PageCopy {
    path: "",
    title: "ECo-logic",
    tagline: "Scan a product, see its footprint.",
};

pub async fn page(uri: Uri) -> Html<String> {
    let copy = PAGES
        .iter()
        .find(|page| page.path == uri.path())
        .unwrap_or(&FALLBACK);
    Html(render_page(copy))
}

fn render_page(copy: &PageCopy) -> String {
    let footer = render_footer();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} · ECo-logic</title>
    <style>{styles}</style>
</head>
<body>
    <header>
        <h1>{title}</h1>
        <p class="tagline">{tagline}</p>
    </header>
    <main id="app" data-page="{path}"></main>
    {footer}
</body>
</html>"#,
        title = escape_html(copy.title),
        tagline = escape_html(copy.tagline),
        path = escape_html(copy.path),
        styles = PAGE_BASE_STYLES,
        footer = footer,
    )
}

fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(r#"<footer class="app-footer">© {current_year} ECo-logic</footer>"#)
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::guard::ROUTE_TABLE;

    #[test]
    fn every_guarded_page_has_copy() {
        for path in ROUTE_TABLE.pages() {
            assert!(
                PAGES.iter().any(|page| page.path == path),
                "missing page copy for {path}"
            );
        }
    }

    #[test]
    fn guest_dashboard_stays_reachable() {
        assert!(PAGES.iter().any(|page| page.path == "/guest-dashboard"));
    }

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("1")</script>"#),
            "&lt;script&gt;alert(&quot;1&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("a & b"), "a &amp; b");
    }

    #[test]
    fn shells_embed_their_page_path() {
        let shell = render_page(&PAGES[1]);
        assert!(shell.contains(r#"data-page="/login""#));
        assert!(shell.contains("Log in"));
    }
}
