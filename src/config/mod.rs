use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Path the admin is mounted under
    pub mount_prefix: String,
    /// Route overrides, e.g. `list=/browse/,detail=/show/`
    pub routes: Option<String>,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    /// Collections (`schema.table`) to introspect before serving
    pub collections: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub session_secret: String,
    pub session_ttl_hours: u64,
    pub require_auth: bool,
    /// When non-empty only these usernames may use the admin
    pub admin_users: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = var("ADMIN_PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = var("ADMIN_PREFIX") {
            self.server.mount_prefix = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = var("ADMIN_ROUTES") {
            self.server.routes = Some(v);
        }
        if let Some(v) = var("ADMIN_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Database overrides
        if let Some(v) = var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = var("ADMIN_COLLECTIONS") {
            self.database.collections = split_list(&v);
        }

        // Security overrides
        if let Some(v) = var("ADMIN_SESSION_SECRET") {
            self.security.session_secret = v;
        }
        if let Some(v) = var("ADMIN_SESSION_TTL_HOURS") {
            self.security.session_ttl_hours = v.parse().unwrap_or(self.security.session_ttl_hours);
        }
        if let Some(v) = var("ADMIN_REQUIRE_AUTH") {
            self.security.require_auth = v.parse().unwrap_or(self.security.require_auth);
        }
        if let Some(v) = var("ADMIN_USERS") {
            self.security.admin_users = split_list(&v);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                mount_prefix: "/admin".to_string(),
                routes: None,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
                collections: Vec::new(),
            },
            security: SecurityConfig {
                session_secret: String::new(),
                session_ttl_hours: 24 * 7, // 1 week
                require_auth: false,
                admin_users: Vec::new(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                mount_prefix: "/admin".to_string(),
                routes: None,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
                collections: Vec::new(),
            },
            security: SecurityConfig {
                session_secret: String::new(),
                session_ttl_hours: 24,
                require_auth: true,
                admin_users: Vec::new(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                mount_prefix: "/admin".to_string(),
                routes: None,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
                collections: Vec::new(),
            },
            security: SecurityConfig {
                session_secret: String::new(),
                session_ttl_hours: 4,
                require_auth: true,
                admin_users: Vec::new(),
            },
        }
    }
}

impl SecurityConfig {
    /// Session lifetime, or `None` when the configured hours do not fit a duration
    pub fn session_ttl(&self) -> Option<chrono::Duration> {
        i64::try_from(self.session_ttl_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.mount_prefix, "/admin");
        assert!(!config.security.require_auth);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.require_auth);
        assert_eq!(config.security.session_ttl_hours, 4);
    }

    #[test]
    fn test_session_ttl_range() {
        let mut security = AppConfig::production().security;
        assert_eq!(security.session_ttl(), Some(chrono::Duration::hours(4)));

        security.session_ttl_hours = u64::MAX;
        assert_eq!(security.session_ttl(), None);

        // Fits in i64 but not in a chrono duration
        security.session_ttl_hours = i64::MAX as u64;
        assert_eq!(security.session_ttl(), None);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ADMIN_PREFIX", "/manage/"),
            ("ADMIN_COLLECTIONS", "public.orders, public.customers,"),
            ("ADMIN_PORT", "not-a-port"),
            ("ADMIN_REQUIRE_AUTH", "true"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::development().with_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.server.mount_prefix, "/manage");
        assert_eq!(config.database.collections, vec!["public.orders", "public.customers"]);
        // Unparseable values keep the default
        assert_eq!(config.server.port, 3000);
        assert!(config.security.require_auth);
    }
}
