// =============================================================================
// Process configuration — environment variables, read once at startup.
// =============================================================================
// Distinct from `settings` (src/settings.rs), which is polled from the
// database every batch cycle. This module covers the infra the process
// needs before it can even reach the database: connection strings, the
// cloud forward target, and the ingress port.
// =============================================================================

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub ingress_port: u16,
    pub cf_backend_url: Option<String>,
    pub cf_api_key: Option<String>,
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Loads configuration from the environment. Discrete `DB_*` variables
    /// are honored only when `DATABASE_URL` is absent; same for `CACHE_*`
    /// vs `REDIS_URL`.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            let host = std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".into());
            let port = std::env::var("DB_PORT").unwrap_or_else(|_| "5432".into());
            let user = std::env::var("DB_USER").unwrap_or_else(|_| "sms_user".into());
            let password = std::env::var("DB_PASSWORD").unwrap_or_default();
            let name = std::env::var("DB_NAME").unwrap_or_else(|_| "sms_gateway".into());
            format!("postgres://{user}:{password}@{host}:{port}/{name}")
        });

        let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| {
            let host = std::env::var("CACHE_HOST").unwrap_or_else(|_| "localhost".into());
            let port = std::env::var("CACHE_PORT").unwrap_or_else(|_| "6379".into());
            match std::env::var("CACHE_PASSWORD") {
                Ok(pw) if !pw.is_empty() => format!("redis://:{pw}@{host}:{port}"),
                _ => format!("redis://{host}:{port}"),
            }
        });

        let ingress_port: u16 = std::env::var("INGRESS_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let db_max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Self {
            database_url,
            redis_url,
            ingress_port,
            cf_backend_url: std::env::var("CF_BACKEND_URL").ok(),
            cf_api_key: std::env::var("CF_API_KEY").ok(),
            db_max_connections,
        }
    }
}

/// Total timeout budget for a single cloud-forward POST (§4.8).
pub const CLOUD_FORWARD_TIMEOUT: Duration = Duration::from_secs(5);

/// How long the pipeline sleeps after draining an empty batch (§4.7 step 3).
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
