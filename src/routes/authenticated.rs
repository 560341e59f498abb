use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes for any signed-in user, regardless of role. The `require_auth`
/// layer above this module performs exactly one session lookup per
/// navigation and redirects signed-out callers to `/`; handlers here never
/// see an unauthenticated request. No role lookup happens on this tier.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /visitas
        // The home view: the client's visit history.
        .route("/visitas", get(handlers::visitas_page))
        // GET /inicio
        // Landing page, and the defined target of admin-denied redirects.
        .route("/inicio", get(handlers::inicio_page))
        // GET /api/me
        // Profile of the authenticated user, resolved from the role table.
        .route("/api/me", get(handlers::get_me))
}
