use std::collections::HashMap;
use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Path of the sessions database; `:memory:` keeps sessions in process
    pub db_path: String,
    /// Base URL share links are constructed from, `<base>/<sessionId>`
    pub share_link_base_url: String,
    /// Fixed lifetime of a session from creation
    pub session_ttl: Duration,
    /// Window after which inactive participants and stale update-log entries
    /// are pruned on poll
    pub inactivity_window: Duration,
}

impl Default for AppConfig {
    /// Built-in defaults, the same values `from_env` falls back to
    fn default() -> Self {
        Self::from_lookup(|_| None).expect("defaults are valid")
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "RIGSHEET_API_BIND_ADDR", "127.0.0.1:8080");
        let db_path = value_or_default(&lookup, "RIGSHEET_SESSIONS_DB", "rigsheet-sessions.db");

        let share_link_base_url = value_or_default(
            &lookup,
            "RIGSHEET_SHARE_LINK_BASE_URL",
            "http://localhost:8080/s",
        );
        if !is_http_url(&share_link_base_url) {
            return Err(ConfigError::Invalid(
                "RIGSHEET_SHARE_LINK_BASE_URL must start with http:// or https://".to_string(),
            ));
        }

        let session_ttl_secs = value_or_default(&lookup, "RIGSHEET_SESSION_TTL_SECS", "86400")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::Invalid(
                    "RIGSHEET_SESSION_TTL_SECS must be an integer in [3600, 604800]".to_string(),
                )
            })?;
        if !(3_600..=604_800).contains(&session_ttl_secs) {
            return Err(ConfigError::Invalid(
                "RIGSHEET_SESSION_TTL_SECS must be in [3600, 604800]".to_string(),
            ));
        }

        let inactivity_window_secs =
            value_or_default(&lookup, "RIGSHEET_INACTIVITY_WINDOW_SECS", "300")
                .parse::<u64>()
                .map_err(|_| {
                    ConfigError::Invalid(
                        "RIGSHEET_INACTIVITY_WINDOW_SECS must be an integer in [30, 3600]"
                            .to_string(),
                    )
                })?;
        if !(30..=3_600).contains(&inactivity_window_secs) {
            return Err(ConfigError::Invalid(
                "RIGSHEET_INACTIVITY_WINDOW_SECS must be in [30, 3600]".to_string(),
            ));
        }

        Ok(Self {
            bind_addr,
            db_path,
            share_link_base_url: trim_trailing(&share_link_base_url).to_string(),
            session_ttl: Duration::from_secs(session_ttl_secs),
            inactivity_window: Duration::from_secs(inactivity_window_secs),
        })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn trim_trailing(value: &str) -> &str {
    value.trim_end_matches('/')
}
