use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Usuario
///
/// Represents the user's canonical identity record stored in the `public.usuarios`
/// table. The `rol` column is the single source of truth for authorization and is
/// re-read on every admin-gated navigation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Usuario {
    // Primary key, also the foreign key to the external auth.users table.
    pub id: Uuid,
    pub email: String,
    // Display name collected at registration.
    pub nombre: String,
    // The RBAC field: 'cliente' or 'admin'.
    pub rol: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for the public registration endpoint (POST /registrarse).
/// The password is only passed through to the external auth provider (Supabase)
/// and never persisted or logged by this application. There is deliberately no
/// role field: every new registration is created as 'cliente'.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
    pub nombre: String,
}

// --- Profile Schemas (Output) ---

/// UserProfile
///
/// Output schema for the authenticated user's profile (GET /api/me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub nombre: String,
    pub rol: String,
}

// --- Installable Web App Manifest ---

/// WebAppManifest
///
/// Payload served at /manifest.webmanifest so browsers can install the portal
/// as a standalone app. Field values are the clinic's fixed branding.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebAppManifest {
    pub name: String,
    pub short_name: String,
    pub start_url: String,
    pub display: String,
    pub background_color: String,
    pub icons: Vec<ManifestIcon>,
}

/// ManifestIcon
///
/// A single icon entry of the web app manifest.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub icon_type: String,
}

impl WebAppManifest {
    /// clinic
    ///
    /// The manifest for Veterinaria El Almendro. Values are literals by
    /// contract; they must round-trip unchanged to the browser.
    pub fn clinic() -> Self {
        Self {
            name: "Veterinaria EL Almendro".to_string(),
            short_name: "Vet. El Almendro".to_string(),
            start_url: "/".to_string(),
            display: "standalone".to_string(),
            background_color: "#ffffff".to_string(),
            icons: vec![
                ManifestIcon {
                    src: "logovet.jpg".to_string(),
                    sizes: "192x192".to_string(),
                    icon_type: "image/png".to_string(),
                },
                ManifestIcon {
                    src: "logovet.jpg".to_string(),
                    sizes: "512x512".to_string(),
                    icon_type: "image/png".to_string(),
                },
            ],
        }
    }
}
