// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{health, quiz},
    rate_limit::rate_limit_middleware,
    state::AppState,
};

/// CORS policy for the Mini App clients.
/// Origins are matched by prefix, so `https://warpcast.com` also admits its paths.
fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|origin| allowed_origins.iter().any(|allowed| origin.starts_with(allowed.as_str())))
                .unwrap_or(false)
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(86_400))
}

/// Assembles the main application router.
///
/// * Quiz routes: list, detail, leaderboard, submit.
/// * Rate limiting runs before any handler; health checks bypass it.
/// * Applies global middleware (Trace, CORS, security headers).
pub fn create_router(state: AppState) -> Router {
    let quiz_routes = Router::new()
        .route("/list", get(quiz::list_quizzes))
        .route("/submit", post(quiz::submit_quiz))
        .route("/{id}", get(quiz::get_quiz))
        .route("/{id}/leaderboard", get(quiz::get_leaderboard));

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/status", get(health::health))
        .nest("/api/quizzes", quiz_routes)
        // Global Middleware (applied from outside in)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(security_headers)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(state.config.allowed_origins.clone()))
        .with_state(state)
}
