// --- File: crates/agenda_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite://data/agenda.db, overridable via AGENDA__DATABASE__URL
    #[serde(default)]
    pub max_connections: Option<u32>,
}

// --- Booking Config ---
/// Tunables for slot computation and the booking guard.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    /// Upper bound for every single store call; a timeout counts as the store being unavailable.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Number of days returned by the week view when the caller does not ask for a count.
    #[serde(default = "default_week_view_days")]
    pub week_view_days: u32,
    /// IANA zone used to decide what "today" is for the week view.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_week_view_days() -> u32 {
    7
}

fn default_time_zone() -> String {
    "America/Sao_Paulo".to_string()
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            week_view_days: default_week_view_days(),
            time_zone: default_time_zone(),
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub booking: BookingConfig,
}
