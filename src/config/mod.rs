use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub filter: FilterConfig,
    pub uploads: UploadConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL. When absent it is assembled from the DB_* parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
    pub enable_slow_query_warning: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub max_limit: Option<i32>,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    pub max_upload_bytes: usize,
    pub template_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
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
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PMIS_API_HOST") {
            self.server.host = v;
        }
        if let Some(v) = env::var("PMIS_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DB_HOST") {
            self.database.host = v;
        }
        if let Ok(v) = env::var("DB_PORT") {
            self.database.port = v.parse().unwrap_or(self.database.port);
        }
        if let Ok(v) = env::var("DB_USER") {
            self.database.user = v;
        }
        if let Ok(v) = env::var("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Ok(v) = env::var("DB_NAME") {
            self.database.name = v;
        }
        if let Ok(v) = env::var("DB_POOL_SIZE") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_SLOW_QUERY_WARNING") {
            self.database.enable_slow_query_warning = v.parse().unwrap_or(self.database.enable_slow_query_warning);
        }
        if let Ok(v) = env::var("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = v.parse().unwrap_or(self.database.slow_query_threshold_ms);
        }

        // Filter overrides
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok();
        }
        if let Ok(v) = env::var("FILTER_DEBUG_LOGGING") {
            self.filter.debug_logging = v.parse().unwrap_or(self.filter.debug_logging);
        }

        // Upload overrides
        if let Ok(v) = env::var("UPLOAD_DIR") {
            self.uploads.dir = v;
        }
        if let Ok(v) = env::var("UPLOAD_MAX_BYTES") {
            self.uploads.max_upload_bytes = v.parse().unwrap_or(self.uploads.max_upload_bytes);
        }
        if let Ok(v) = env::var("IMPORT_TEMPLATE_PATH") {
            self.uploads.template_path = v;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: String::new(),
                name: "pmis".to_string(),
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 100,
            },
            filter: FilterConfig {
                max_limit: Some(1000),
                debug_logging: true,
            },
            uploads: UploadConfig {
                dir: "uploads".to_string(),
                max_upload_bytes: 25 * 1024 * 1024, // 25MB
                template_path: "templates/cidp_import_template.xlsx".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                user: "pmis".to_string(),
                password: String::new(),
                name: "pmis".to_string(),
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 500,
            },
            filter: FilterConfig {
                max_limit: Some(500),
                debug_logging: false,
            },
            uploads: UploadConfig {
                dir: "uploads".to_string(),
                max_upload_bytes: 10 * 1024 * 1024, // 10MB
                template_path: "templates/cidp_import_template.xlsx".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                user: "pmis".to_string(),
                password: String::new(),
                name: "pmis".to_string(),
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 1000,
            },
            filter: FilterConfig {
                max_limit: Some(500),
                debug_logging: false,
            },
            uploads: UploadConfig {
                dir: "/var/lib/pmis/uploads".to_string(),
                max_upload_bytes: 10 * 1024 * 1024, // 10MB
                template_path: "templates/cidp_import_template.xlsx".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.filter.max_limit, Some(1000));
        assert!(config.database.run_migrations);
        assert_eq!(config.uploads.dir, "uploads");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.database.run_migrations);
        assert_eq!(config.database.max_connections, 50);
        assert!(!config.filter.debug_logging);
    }
}
