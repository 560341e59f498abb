use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Routes restricted to users whose `usuarios.rol` is exactly "admin". The
/// `require_admin` layer above this module performs the session lookup and
/// then re-reads the role table on every navigation; a lookup failure is
/// treated the same as a missing admin role and redirects to `/inicio`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // The administration view (staff, clients, clinic management).
        .route("/admin", get(handlers::admin_page))
        // GET /recordatorios
        // The reminders view: vaccination and appointment reminders.
        .route("/recordatorios", get(handlers::recordatorios_page))
        // GET /dashboard
        // The metrics dashboard view.
        .route("/dashboard", get(handlers::dashboard_page))
}
