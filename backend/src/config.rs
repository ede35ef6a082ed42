use shuttle_runtime::SecretStore;
use tracing::{info, warn};
use poll_shared::session::SESSION_COOKIE;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Full origins (scheme, host and port) allowed to make credentialed cross-origin requests.
    pub allowed_origins: Vec<String>,
    pub session_cookie: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.into()],
            session_cookie: SESSION_COOKIE.into(),
        }
    }
}

impl AppConfig {
    pub fn from_secrets(secrets: &SecretStore) -> Self {
        let defaults = Self::default();
        let origins = secret_or(secrets, "ALLOWED_ORIGINS", defaults.allowed_origins.join(","));
        Self {
            allowed_origins: parse_origins(&origins),
            session_cookie: secret_or(secrets, "SESSION_COOKIE", defaults.session_cookie),
        }
    }
}

/// Splits a comma-separated origin list, dropping blanks and trailing slashes.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn secret_or(secrets: &SecretStore, key: &str, default: String) -> String {
    match secrets.get(key).map(|v| v.trim().to_string()) {
        Some(value) if !value.is_empty() => {
            info!("{key} loaded from secrets");
            value
        }
        Some(_) => {
            warn!("{key} is blank, using default: {default}");
            default
        }
        None => {
            warn!("{key} not found, using default: {default}");
            default
        }
    }
}
