use crate::{
    AppState,
    guard::CurrentUser,
    models::{RegisterUserRequest, UserProfile, Usuario, WebAppManifest},
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{Html, Redirect},
};
use serde::Deserialize;
use uuid::Uuid;

/// SupabaseAuthResponse
///
/// Minimal struct to deserialize the response from the external Supabase
/// /auth/v1/signup endpoint, capturing the newly created user's UUID.
#[derive(Deserialize)]
struct SupabaseAuthResponse {
    id: Uuid,
}

// --- View Shells ---

/// view_shell
///
/// Renders the minimal document for a named view. The frontend bundle mounts
/// the actual component; the server only identifies which view a path maps to
/// (`data-view`) and wires up the installable-app manifest.
fn view_shell(view: &str, title: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"es\">\n<head>\n  <meta charset=\"utf-8\">\n  <link rel=\"manifest\" href=\"/manifest.webmanifest\">\n  <title>{title} · Veterinaria El Almendro</title>\n</head>\n<body data-view=\"{view}\"></body>\n</html>\n"
    ))
}

/// [Public Route] GET / — the login view.
pub async fn login_page() -> Html<String> {
    view_shell("login", "Iniciar sesión")
}

/// [Public Route] GET /registrarse — the registration view.
pub async fn register_page() -> Html<String> {
    view_shell("register", "Registrarse")
}

/// [Authenticated Route] GET /visitas — the home view listing visits.
pub async fn visitas_page() -> Html<String> {
    view_shell("home", "Visitas")
}

/// [Authenticated Route] GET /inicio — landing page, also the target callers
/// are sent to when an admin-gated navigation is denied. Serves the home view.
pub async fn inicio_page() -> Html<String> {
    view_shell("home", "Inicio")
}

/// [Admin Route] GET /admin — the administration view.
pub async fn admin_page() -> Html<String> {
    view_shell("admin", "Administración")
}

/// [Admin Route] GET /recordatorios — the reminders view.
pub async fn recordatorios_page() -> Html<String> {
    view_shell("recordatorio", "Recordatorios")
}

/// [Admin Route] GET /dashboard — the dashboard view.
pub async fn dashboard_page() -> Html<String> {
    view_shell("dashboard", "Dashboard")
}

/// fallback_redirect
///
/// Catch-all for unmatched paths: redirect to the login page. `/` itself has
/// no requirement, so the redirect chain always terminates there.
pub async fn fallback_redirect() -> Redirect {
    Redirect::to("/")
}

// --- API Handlers ---

/// get_manifest
///
/// [Public Route] Serves the installable-web-app manifest with the clinic's
/// fixed branding.
#[utoipa::path(
    get,
    path = "/manifest.webmanifest",
    responses((status = 200, description = "Web app manifest", body = WebAppManifest))
)]
pub async fn get_manifest() -> Json<WebAppManifest> {
    Json(WebAppManifest::clinic())
}

/// get_me
///
/// [Authenticated Route] Provides the authenticated user's profile. The
/// identity was resolved by the navigation guard; only the profile row is
/// fetched here.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 404, description = "No profile row for this user")
    )
)]
pub async fn get_me(
    Extension(current): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, StatusCode> {
    match state.repo.get_usuario(current.id).await {
        Some(usuario) => Ok(Json(UserProfile {
            id: usuario.id,
            email: usuario.email,
            nombre: usuario.nombre,
            rol: usuario.rol,
        })),
        // A session without a profile row: authenticated upstream, but never mirrored.
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// register_usuario
///
/// [Public Route] Handles user registration via the external Supabase Auth
/// service.
///
/// Calls the signup endpoint, retrieves the canonical `auth.users.id`, and
/// mirrors it into the local `usuarios` table so both stores share primary
/// keys. Every registration is created with rol 'cliente'; the admin role is
/// only ever granted directly in the role table.
#[utoipa::path(
    post,
    path = "/registrarse",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered", body = Usuario),
        (status = 400, description = "Signup rejected by the auth service")
    )
)]
pub async fn register_usuario(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<Usuario>, StatusCode> {
    // Step 1: Call the external auth provider.
    let client = reqwest::Client::new();
    let auth_url = format!(
        "{}/auth/v1/signup",
        state.config.supabase_url.trim_end_matches('/')
    );

    let response = client
        .post(auth_url)
        .header("apikey", &state.config.supabase_anon_key)
        .header("Content-Type", "application/json")
        .json(&serde_json::json!({ "email": payload.email, "password": payload.password }))
        .send()
        .await
        .map_err(|e| {
            tracing::error!("signup call failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if !response.status().is_success() {
        // The auth service rejected the signup (email taken, weak password).
        return Err(StatusCode::BAD_REQUEST);
    }

    // Step 2: Extract the canonical user id from the external response.
    let supabase_user = response
        .json::<SupabaseAuthResponse>()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Step 3: Mirror the profile into `public.usuarios`.
    let nuevo = Usuario {
        id: supabase_user.id,
        email: payload.email,
        nombre: payload.nombre,
        rol: "cliente".to_string(),
        ..Usuario::default()
    };

    let created = state.repo.create_usuario(nuevo).await.map_err(|e| {
        tracing::error!("usuario mirror insert failed: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(created))
}
