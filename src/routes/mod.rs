/// Router Module Index
///
/// Organizes the route table into security-segregated modules, one per access
/// requirement. The requirement is applied once, as a layer on the module's
/// router, so no individual page can accidentally ship without its guard.
///
/// Matching order (first match wins): public, authenticated, admin, then the
/// catch-all fallback registered in `create_router`.

/// Routes with no access requirement. The guard never runs for these.
pub mod public;

/// Routes requiring an authenticated session, gated by `guard::require_auth`.
pub mod authenticated;

/// Routes requiring the admin role, gated by `guard::require_admin`.
pub mod admin;
