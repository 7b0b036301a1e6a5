use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};

use crate::web::{AppState, analyze, auth, guard, history, pages};

const ROBOTS_TXT_BODY: &str = include_str!("../../robots.txt");

/// Sits above the 10 MiB upload cap so multipart framing overhead never
/// trips the framework before validation sees the file.
const BODY_LIMIT_BYTES: usize = 12 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new();
    for path in guard::ROUTE_TABLE.pages() {
        router = router.route(path, get(pages::page));
    }

    router
        .route("/guest-dashboard", get(pages::page))
        .route("/healthz", get(healthz))
        .route("/robots.txt", get(robots_txt))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/user/profile", get(auth::profile))
        .route("/api/analyze-image", post(analyze::analyze_image))
        .route(
            "/api/eco-agent/product-details",
            post(analyze::product_details),
        )
        .route("/api/analysis-history", get(history::analysis_history))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(middleware::from_fn(guard::guard))
        .with_state(state)
}

async fn robots_txt() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ROBOTS_TXT_BODY,
    )
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
