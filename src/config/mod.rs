use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

/// Upper bound on any page of results, whatever the configuration says.
pub const PAGE_SIZE_CAP: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub query: QueryConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_upload_bytes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Bcrypt cost factor for stored passwords.
    pub password_hash_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from `var`, which looks up a setting by environment variable name.
    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        // Query overrides
        if let Some(v) = var("QUERY_DEFAULT_PAGE_SIZE") {
            self.query.default_page_size = v.parse().unwrap_or(self.query.default_page_size);
        }
        if let Some(v) = var("QUERY_MAX_PAGE_SIZE") {
            self.query.max_page_size = v.parse().unwrap_or(self.query.max_page_size);
        }
        self.query.max_page_size = self.query.max_page_size.clamp(1, PAGE_SIZE_CAP);
        self.query.default_page_size = self.query.default_page_size.clamp(1, self.query.max_page_size);
        if let Some(v) = var("QUERY_DEBUG_LOGGING") {
            self.query.debug_logging = v.parse().unwrap_or(self.query.debug_logging);
        }

        // Database overrides
        if let Some(v) = var("DATABASE_BACKEND") {
            self.database.backend = match v.to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "postgres" | "postgresql" => StorageBackend::Postgres,
                _ => self.database.backend,
            };
        }
        if let Some(v) = var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Some(port) = var("ARSIP_API_PORT")
            .or_else(|| var("PORT"))
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Some(v) = var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = var("API_MAX_UPLOAD_BYTES") {
            self.api.max_upload_bytes = v.parse().unwrap_or(self.api.max_upload_bytes);
        }

        // Security overrides
        if let Some(v) = var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Some(v) = var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = var("SECURITY_PASSWORD_HASH_COST") {
            self.security.password_hash_cost = v.parse().unwrap_or(self.security.password_hash_cost);
        }
        self.security.password_hash_cost = self.security.password_hash_cost.clamp(crate::services::credentials::MIN_COST, crate::services::credentials::MAX_COST);

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            query: QueryConfig {
                default_page_size: 20,
                max_page_size: 100,
                debug_logging: true,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 2022,
                enable_request_logging: true,
                max_upload_bytes: 50 * 1024 * 1024, // 50MB
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "arsip-development-secret".to_string(),
                jwt_expiry_hours: 24 * 7,
                password_hash_cost: 10,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            query: QueryConfig {
                default_page_size: 20,
                max_page_size: 100,
                debug_logging: false,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 2022,
                enable_request_logging: true,
                max_upload_bytes: 50 * 1024 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec![],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                password_hash_cost: bcrypt::DEFAULT_COST,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            query: QueryConfig {
                default_page_size: 20,
                max_page_size: 100,
                debug_logging: false,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 2022,
                enable_request_logging: false,
                max_upload_bytes: 50 * 1024 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec![],
                jwt_secret: String::new(),
                jwt_expiry_hours: 8,
                password_hash_cost: bcrypt::DEFAULT_COST,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.query.default_page_size, 20);
        assert_eq!(config.query.max_page_size, 100);
        assert_eq!(config.api.max_upload_bytes, 50 * 1024 * 1024);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn production_requires_explicit_secret() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.query.debug_logging);
        assert_eq!(config.database.backend, StorageBackend::Postgres);
    }

    fn overrides(pairs: &[(&str, &str)]) -> AppConfig {
        let pairs: Vec<(String, String)> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::development()
            .with_overrides(|key| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
    }

    #[test]
    fn max_page_size_cannot_exceed_cap() {
        let config = overrides(&[("QUERY_MAX_PAGE_SIZE", "500"), ("QUERY_DEFAULT_PAGE_SIZE", "250")]);
        assert_eq!(config.query.max_page_size, PAGE_SIZE_CAP);
        assert_eq!(config.query.default_page_size, PAGE_SIZE_CAP);

        let config = overrides(&[("QUERY_MAX_PAGE_SIZE", "50")]);
        assert_eq!(config.query.max_page_size, 50);
        assert_eq!(config.query.default_page_size, 20);

        let config = overrides(&[("QUERY_MAX_PAGE_SIZE", "0")]);
        assert_eq!(config.query.max_page_size, 1);
        assert_eq!(config.query.default_page_size, 1);
    }

    #[test]
    fn port_and_hash_cost_overrides() {
        let config = overrides(&[("PORT", "8080"), ("SECURITY_PASSWORD_HASH_COST", "2")]);
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.security.password_hash_cost, crate::services::credentials::MIN_COST);

        let config = overrides(&[("ARSIP_API_PORT", "9000"), ("PORT", "8080")]);
        assert_eq!(config.api.port, 9000);
    }

    #[test]
    fn jwt_secret_is_not_serialized() {
        let value = serde_json::to_value(AppConfig::development()).unwrap();
        assert!(value["security"].get("jwt_secret").is_none());
    }
}
