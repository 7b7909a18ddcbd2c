//! Service configuration.

use std::path::Path;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the `RocksDB` data directory (default: "./data/ledger").
    pub data_dir: String,

    /// Secret for validating user JWTs (HS256).
    pub jwt_secret: Option<String>,

    /// Service API key for service-to-service auth.
    pub service_api_key: Option<String>,

    /// Stripe secret API key (optional; checkout is disabled without it).
    pub stripe_secret_key: Option<String>,

    /// Stripe webhook signing secret (optional; webhooks are rejected without it).
    pub stripe_webhook_secret: Option<String>,

    /// Stripe API base URL (overridable for hermetic tests).
    pub stripe_api_url: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Secrets can also be supplied via `*_FILE` variants pointing at a file
    /// whose contents hold the secret (the usual mounted-secret convention).
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LEDGER_LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("LEDGER_DATA_DIR").unwrap_or_else(|_| "./data/ledger".into()),
            jwt_secret: env_or_file("LEDGER_JWT_SECRET"),
            service_api_key: env_or_file("LEDGER_SERVICE_API_KEY"),
            stripe_secret_key: env_or_file("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: env_or_file("STRIPE_WEBHOOK_SECRET"),
            stripe_api_url: std::env::var("STRIPE_API_URL")
                .unwrap_or_else(|_| "https://api.stripe.com/v1".into()),
            cors_origins: std::env::var("LEDGER_CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("LEDGER_MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("LEDGER_REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

/// Read a secret from `NAME`, falling back to the file named by `NAME_FILE`.
fn env_or_file(name: &str) -> Option<String> {
    if let Ok(value) = std::env::var(name) {
        if !value.is_empty() {
            return Some(value);
        }
    }

    let file_var = format!("{name}_FILE");
    if let Ok(path) = std::env::var(&file_var) {
        match std::fs::read_to_string(Path::new(&path)) {
            Ok(contents) => {
                tracing::debug!(var = %file_var, path = %path, "Loaded secret from file");
                let trimmed = contents.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            Err(e) => {
                tracing::warn!(var = %file_var, path = %path, error = %e, "Failed to read secret file");
            }
        }
    }

    None
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "./data/ledger".into(),
            jwt_secret: None,
            service_api_key: None,
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            stripe_api_url: "https://api.stripe.com/v1".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
