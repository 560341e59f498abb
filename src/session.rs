use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use uuid::Uuid;

/// SessionError
///
/// A failed session lookup, as opposed to a successful lookup that found no
/// session. The guard maps this to "signed out"; see DESIGN.md.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("auth service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("auth service returned status {0}")]
    Service(reqwest::StatusCode),
}

// 1. SessionService Contract
/// SessionService
///
/// Abstract contract for the remote session store. One operation: resolve the
/// caller's access token to the currently authenticated user, if any. The
/// trait boundary lets the navigation guard run against an in-memory mock in
/// tests, with the real Supabase client (SupabaseSessionClient) in production.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Resolves the current session. `Ok(None)` is the normal signed-out state;
    /// `Err` means the lookup itself failed (network or service error).
    async fn current_user(&self, access_token: &str) -> Result<Option<Uuid>, SessionError>;
}

/// SessionState
///
/// The concrete type used to share the session service across the application state.
pub type SessionState = Arc<dyn SessionService>;

// 2. The Real Implementation (Supabase Auth)

/// SupabaseAuthUser
///
/// Minimal deserialization target for the Supabase /auth/v1/user response;
/// only the canonical user id is of interest here.
#[derive(Deserialize)]
struct SupabaseAuthUser {
    id: Uuid,
}

/// SupabaseSessionClient
///
/// Session resolution against the Supabase Auth API: a GET to /auth/v1/user
/// with the project `apikey` and the caller's bearer token. The token itself is
/// never inspected locally; the auth service owns validation.
#[derive(Clone)]
pub struct SupabaseSessionClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseSessionClient {
    /// new
    ///
    /// Constructs the client from the configured project URL and anon key.
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }
}

#[async_trait]
impl SessionService for SupabaseSessionClient {
    /// current_user
    ///
    /// One request per navigation; no caching between navigations. A 401/403
    /// answer is the regular "no session" case, every other non-success status
    /// is surfaced as a service error.
    async fn current_user(&self, access_token: &str) -> Result<Option<Uuid>, SessionError> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self
            .http
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SessionError::Service(status));
        }

        let user = response.json::<SupabaseAuthUser>().await?;
        Ok(Some(user.id))
    }
}

// 3. The Mock Implementation (For Unit Tests)
/// MockSessionService
///
/// In-memory implementation of `SessionService` used by unit and integration
/// tests. Records how many lookups were issued so tests can assert the guard's
/// zero-call and single-call contracts.
pub struct MockSessionService {
    /// The user id returned for any token. None simulates a signed-out caller.
    pub user_to_return: Option<Uuid>,
    /// When true, every lookup returns a simulated service failure.
    pub should_fail: bool,
    calls: AtomicUsize,
}

impl MockSessionService {
    pub fn signed_in(user: Uuid) -> Self {
        Self {
            user_to_return: Some(user),
            should_fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user_to_return: None,
            should_fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            user_to_return: None,
            should_fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of lookups issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionService for MockSessionService {
    async fn current_user(&self, _access_token: &str) -> Result<Option<Uuid>, SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(SessionError::Service(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
            ));
        }
        Ok(self.user_to_return)
    }
}
