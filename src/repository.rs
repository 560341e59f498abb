use crate::models::Usuario;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// RolLookupError
///
/// Failure modes of the single-record role lookup. The navigation guard treats
/// both variants the same way (denial), but callers keep the distinction for
/// logging.
#[derive(Debug, Error)]
pub enum RolLookupError {
    #[error("no usuarios row for id {0}")]
    NotFound(Uuid),
    #[error("role lookup failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository Trait
///
/// Abstract contract for the user-role store. The navigation guard and the
/// profile handlers interact with the data layer through this trait only, so
/// tests can substitute an in-memory implementation for Postgres.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Role of a user, looked up by exact identifier. One row, one column.
    async fn get_rol(&self, id: Uuid) -> Result<String, RolLookupError>;

    /// Full profile record, used by /api/me and the local dev bypass.
    async fn get_usuario(&self, id: Uuid) -> Option<Usuario>;

    /// Creates the mirroring profile record after external signup succeeds.
    async fn create_usuario(&self, usuario: Usuario) -> Result<Usuario, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the role store across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// `public.usuarios` table in PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// get_rol
    ///
    /// Mirrors the frontend's `select rol from usuarios where id = $1` single-row
    /// query. A missing row and a transport failure are distinct errors here;
    /// the guard collapses them into the same denial.
    async fn get_rol(&self, id: Uuid) -> Result<String, RolLookupError> {
        let rol: Option<String> = sqlx::query_scalar("SELECT rol FROM usuarios WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("get_rol error: {:?}", e);
                RolLookupError::Database(e)
            })?;

        rol.ok_or(RolLookupError::NotFound(id))
    }

    /// get_usuario
    ///
    /// Retrieves the full profile record needed for /api/me and the bypass.
    async fn get_usuario(&self, id: Uuid) -> Option<Usuario> {
        sqlx::query_as::<_, Usuario>(
            "SELECT id, email, nombre, rol, created_at FROM usuarios WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_usuario error: {:?}", e);
            None
        })
    }

    /// create_usuario
    ///
    /// Creates the mirroring profile record in `public.usuarios` after the
    /// external auth provider accepted the signup.
    async fn create_usuario(&self, usuario: Usuario) -> Result<Usuario, sqlx::Error> {
        sqlx::query_as::<_, Usuario>(
            r#"
            INSERT INTO usuarios (id, email, nombre, rol, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, email, nombre, rol, created_at
            "#,
        )
        .bind(usuario.id)
        .bind(usuario.email)
        .bind(usuario.nombre)
        .bind(usuario.rol)
        .fetch_one(&self.pool)
        .await
    }
}
