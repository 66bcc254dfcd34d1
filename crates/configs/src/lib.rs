//! Layered runtime configuration.
//!
//! Values resolve in order: builtin defaults, then an optional `quill.toml`
//! next to the binary, then environment variables (`QUILL_` prefix, `__`
//! separating nested keys, e.g. `QUILL_SERVER__BIND`). A `.env` file is
//! loaded into the environment first when present.

use std::net::SocketAddr;

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid bind address `{addr}`: {source}")]
    BindAddr {
        addr: String,
        source: std::net::AddrParseError,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub pagination: PaginationSettings,
    pub session: SessionSettings,

    /// Registrations with this email receive the Administrator role.
    pub admin_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// The address the HTTP server binds to.
    pub bind: String,

    /// Directory served under `/static`.
    pub static_dir: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            static_dir: "static".to_string(),
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.bind.parse().map_err(|source| SettingsError::BindAddr {
            addr: self.bind.clone(),
            source,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// The log level to use, this is a tracing env filter.
    pub level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// The database URL to use.
    pub url: String,

    /// Statements slower than this many milliseconds are logged at WARN.
    pub slow_query_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite:quill.db?mode=rwc".to_string(),
            slow_query_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    /// Posts per page on the feed, profile and moderation listings.
    pub posts_per_page: u32,

    /// Comments per page under a post.
    pub comments_per_page: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            posts_per_page: 20,
            comments_per_page: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Key for signing session cookies. Override outside development.
    pub secret: SecretString,

    /// Session lifetime in hours.
    pub ttl_hours: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            secret: SecretString::from("insecure-dev-session-secret".to_string()),
            ttl_hours: 168,
        }
    }
}

impl Settings {
    /// Loads `.env`, then resolves the layered sources.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let settings: Settings = config::Config::builder()
            .add_source(config::File::with_name("quill").required(false))
            .add_source(config::Environment::with_prefix("QUILL").separator("__"))
            .build()?
            .try_deserialize()?;

        tracing::debug!(bind = %settings.server.bind, "configuration resolved");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn from_overrides(
        pairs: &[(&str, config::Value)],
    ) -> Settings {
        let mut builder = config::Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, value.clone()).unwrap();
        }
        builder.build().unwrap().try_deserialize().unwrap()
    }

    #[test]
    fn empty_sources_yield_defaults() {
        let settings = from_overrides(&[]);
        assert_eq!(settings.server.bind, "127.0.0.1:8000");
        assert_eq!(settings.database.url, "sqlite:quill.db?mode=rwc");
        assert_eq!(settings.database.slow_query_ms, 500);
        assert_eq!(settings.pagination.posts_per_page, 20);
        assert_eq!(settings.pagination.comments_per_page, 30);
        assert_eq!(settings.session.ttl_hours, 168);
        assert!(!settings.session.secret.expose_secret().is_empty());
        assert_eq!(settings.admin_email, None);
    }

    #[test]
    fn overrides_leave_other_keys_at_defaults() {
        let settings = from_overrides(&[
            ("pagination.posts_per_page", 5.into()),
            ("server.bind", "0.0.0.0:9000".into()),
            ("admin_email", "boss@example.com".into()),
        ]);
        assert_eq!(settings.pagination.posts_per_page, 5);
        assert_eq!(settings.pagination.comments_per_page, 30);
        assert_eq!(settings.server.bind, "0.0.0.0:9000");
        assert_eq!(settings.admin_email.as_deref(), Some("boss@example.com"));
    }

    #[test]
    fn bind_addr_parses() {
        let settings = from_overrides(&[]);
        let addr = settings.server.bind_addr().unwrap();
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn bind_addr_reports_the_bad_value() {
        let settings = from_overrides(&[("server.bind", "not-an-addr".into())]);
        let err = settings.server.bind_addr().unwrap_err();
        assert!(err.to_string().contains("not-an-addr"));
    }
}
