use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Defines the endpoints accessible to any caller, anonymous or signed in.
/// Navigations here complete without a single session or role lookup; that is
/// part of the route table's contract, not an optimization.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness endpoint for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // The login view. Also the destination of every signed-out redirect,
        // so it must stay requirement-free for the redirect chain to terminate.
        .route("/", get(handlers::login_page))
        // GET/POST /registrarse
        // The registration view, and the registration API handling signup via
        // the external auth service plus the local `usuarios` mirror insert.
        .route(
            "/registrarse",
            get(handlers::register_page).post(handlers::register_usuario),
        )
        // GET /manifest.webmanifest
        // Installable-web-app manifest with the clinic branding.
        .route("/manifest.webmanifest", get(handlers::get_manifest))
}
