use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use uuid::Uuid;
use vet_portal::{
    AppState,
    config::AppConfig,
    create_router,
    models::Usuario,
    repository::{Repository, RolLookupError},
    session::MockSessionService,
};

// --- Mock Directory (role store) ---

// In-memory stand-in for the `usuarios` table. Counts role lookups so the
// per-tier lookup contracts can be asserted end-to-end.
struct MockDirectory {
    usuarios: HashMap<Uuid, Usuario>,
    fail_rol: bool,
    rol_calls: AtomicUsize,
}

impl MockDirectory {
    fn with_usuarios(usuarios: Vec<Usuario>) -> Self {
        Self {
            usuarios: usuarios.into_iter().map(|u| (u.id, u)).collect(),
            fail_rol: false,
            rol_calls: AtomicUsize::new(0),
        }
    }

    fn failing_rol() -> Self {
        Self {
            usuarios: HashMap::new(),
            fail_rol: true,
            rol_calls: AtomicUsize::new(0),
        }
    }

    fn rol_calls(&self) -> usize {
        self.rol_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Repository for MockDirectory {
    async fn get_rol(&self, id: Uuid) -> Result<String, RolLookupError> {
        self.rol_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_rol {
            return Err(RolLookupError::Database(sqlx::Error::PoolClosed));
        }
        self.usuarios
            .get(&id)
            .map(|u| u.rol.clone())
            .ok_or(RolLookupError::NotFound(id))
    }

    async fn get_usuario(&self, id: Uuid) -> Option<Usuario> {
        self.usuarios.get(&id).cloned()
    }

    async fn create_usuario(&self, usuario: Usuario) -> Result<Usuario, sqlx::Error> {
        Ok(usuario)
    }
}

// --- Test Utilities ---

const ADMIN_ID: Uuid = Uuid::from_u128(1);
const CLIENTE_ID: Uuid = Uuid::from_u128(2);

fn usuario(id: Uuid, rol: &str) -> Usuario {
    Usuario {
        id,
        email: format!("{rol}@almendro.test"),
        nombre: rol.to_string(),
        rol: rol.to_string(),
        ..Usuario::default()
    }
}

fn both_usuarios() -> Vec<Usuario> {
    vec![usuario(ADMIN_ID, "admin"), usuario(CLIENTE_ID, "cliente")]
}

// Spawns the full router on an ephemeral port, mock services injected.
async fn spawn_app(sessions: Arc<MockSessionService>, repo: Arc<MockDirectory>) -> String {
    let state = AppState {
        repo,
        sessions,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

// Redirects must stay observable, so the client never follows them.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get("location")
        .expect("redirect without location header")
        .to_str()
        .unwrap()
}

// --- Public Tier ---

#[tokio::test]
async fn test_health_check() {
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_out()),
        Arc::new(MockDirectory::with_usuarios(vec![])),
    )
    .await;

    let response = client()
        .get(format!("{addr}/health"))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_login_view_allowed_without_lookups() {
    let sessions = Arc::new(MockSessionService::signed_out());
    let addr = spawn_app(
        sessions.clone(),
        Arc::new(MockDirectory::with_usuarios(vec![])),
    )
    .await;

    let response = client().get(format!("{addr}/")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains(r#"data-view="login""#));
    assert_eq!(sessions.calls(), 0, "public navigation must not hit the auth service");
}

#[tokio::test]
async fn test_register_view_is_public() {
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_out()),
        Arc::new(MockDirectory::with_usuarios(vec![])),
    )
    .await;

    let response = client()
        .get(format!("{addr}/registrarse"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains(r#"data-view="register""#));
}

#[tokio::test]
async fn test_manifest_fields_match_branding() {
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_out()),
        Arc::new(MockDirectory::with_usuarios(vec![])),
    )
    .await;

    let response = client()
        .get(format!("{addr}/manifest.webmanifest"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let manifest: serde_json::Value = response.json().await.unwrap();
    assert_eq!(manifest["name"], "Veterinaria EL Almendro");
    assert_eq!(manifest["short_name"], "Vet. El Almendro");
    assert_eq!(manifest["start_url"], "/");
    assert_eq!(manifest["display"], "standalone");
    assert_eq!(manifest["background_color"], "#ffffff");
    let icons = manifest["icons"].as_array().unwrap();
    assert_eq!(icons.len(), 2);
    assert_eq!(icons[0]["src"], "logovet.jpg");
    assert_eq!(icons[0]["sizes"], "192x192");
    assert_eq!(icons[1]["sizes"], "512x512");
    assert_eq!(icons[1]["type"], "image/png");
}

// --- Authenticated Tier ---

#[tokio::test]
async fn test_visitas_redirects_to_login_without_session() {
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_out()),
        Arc::new(MockDirectory::with_usuarios(both_usuarios())),
    )
    .await;

    let response = client()
        .get(format!("{addr}/visitas"))
        .bearer_auth("expired-token")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_visitas_allowed_with_session_and_no_role_check() {
    let repo = Arc::new(MockDirectory::with_usuarios(both_usuarios()));
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_in(CLIENTE_ID)),
        repo.clone(),
    )
    .await;

    let response = client()
        .get(format!("{addr}/visitas"))
        .bearer_auth("valid-token")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains(r#"data-view="home""#));
    assert_eq!(repo.rol_calls(), 0, "auth-only navigation must not read the role table");
}

#[tokio::test]
async fn test_inicio_is_a_defined_route_for_signed_in_users() {
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_in(CLIENTE_ID)),
        Arc::new(MockDirectory::with_usuarios(both_usuarios())),
    )
    .await;

    let response = client()
        .get(format!("{addr}/inicio"))
        .bearer_auth("valid-token")
        .send()
        .await
        .unwrap();

    // The restricted-access fallback target is a real page, not a dead end.
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains(r#"data-view="home""#));
}

#[tokio::test]
async fn test_api_me_returns_profile() {
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_in(CLIENTE_ID)),
        Arc::new(MockDirectory::with_usuarios(both_usuarios())),
    )
    .await;

    let response = client()
        .get(format!("{addr}/api/me"))
        .bearer_auth("valid-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let profile: serde_json::Value = response.json().await.unwrap();
    assert_eq!(profile["id"], CLIENTE_ID.to_string());
    assert_eq!(profile["rol"], "cliente");
}

// --- Admin Tier ---

#[tokio::test]
async fn test_admin_allowed_for_admin_rol() {
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_in(ADMIN_ID)),
        Arc::new(MockDirectory::with_usuarios(both_usuarios())),
    )
    .await;

    let response = client()
        .get(format!("{addr}/admin"))
        .bearer_auth("valid-token")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains(r#"data-view="admin""#));
}

#[tokio::test]
async fn test_admin_redirects_cliente_to_inicio() {
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_in(CLIENTE_ID)),
        Arc::new(MockDirectory::with_usuarios(both_usuarios())),
    )
    .await;

    let response = client()
        .get(format!("{addr}/admin"))
        .bearer_auth("valid-token")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/inicio");
}

#[tokio::test]
async fn test_admin_tier_applies_to_all_three_routes() {
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_in(ADMIN_ID)),
        Arc::new(MockDirectory::with_usuarios(both_usuarios())),
    )
    .await;
    let http = client();

    for (path, view) in [
        ("/admin", "admin"),
        ("/recordatorios", "recordatorio"),
        ("/dashboard", "dashboard"),
    ] {
        let response = http
            .get(format!("{addr}{path}"))
            .bearer_auth("valid-token")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "{path} should be allowed for admin");
        let body = response.text().await.unwrap();
        assert!(body.contains(&format!(r#"data-view="{view}""#)), "{path}");
    }
}

#[tokio::test]
async fn test_admin_routes_redirect_signed_out_to_login() {
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_out()),
        Arc::new(MockDirectory::with_usuarios(both_usuarios())),
    )
    .await;
    let http = client();

    for path in ["/admin", "/recordatorios", "/dashboard"] {
        let response = http.get(format!("{addr}{path}")).send().await.unwrap();
        assert_eq!(response.status(), 303, "{path}");
        assert_eq!(location(&response), "/", "{path}");
    }
}

#[tokio::test]
async fn test_role_lookup_failure_redirects_to_inicio() {
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_in(ADMIN_ID)),
        Arc::new(MockDirectory::failing_rol()),
    )
    .await;

    let response = client()
        .get(format!("{addr}/dashboard"))
        .bearer_auth("valid-token")
        .send()
        .await
        .unwrap();

    // A broken role store denies quietly, exactly like a non-admin role.
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/inicio");
}

// --- Catch-all ---

#[tokio::test]
async fn test_unknown_path_redirects_to_login() {
    let sessions = Arc::new(MockSessionService::signed_out());
    let addr = spawn_app(
        sessions.clone(),
        Arc::new(MockDirectory::with_usuarios(vec![])),
    )
    .await;

    let response = client()
        .get(format!("{addr}/unknown/path"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/");
    assert_eq!(sessions.calls(), 0);
}

// --- Local Development Bypass ---

#[tokio::test]
async fn test_local_bypass_authenticates_known_usuario() {
    let sessions = Arc::new(MockSessionService::signed_out());
    let addr = spawn_app(
        sessions.clone(),
        Arc::new(MockDirectory::with_usuarios(both_usuarios())),
    )
    .await;

    let response = client()
        .get(format!("{addr}/admin"))
        .header("x-user-id", ADMIN_ID.to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(sessions.calls(), 0, "bypass must not hit the auth service");
}

#[tokio::test]
async fn test_local_bypass_still_enforces_admin_rol() {
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_out()),
        Arc::new(MockDirectory::with_usuarios(both_usuarios())),
    )
    .await;

    let response = client()
        .get(format!("{addr}/admin"))
        .header("x-user-id", CLIENTE_ID.to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/inicio");
}

#[tokio::test]
async fn test_local_bypass_with_unknown_id_falls_through() {
    let addr = spawn_app(
        Arc::new(MockSessionService::signed_out()),
        Arc::new(MockDirectory::with_usuarios(both_usuarios())),
    )
    .await;

    let response = client()
        .get(format!("{addr}/visitas"))
        .header("x-user-id", Uuid::from_u128(999).to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/");
}
