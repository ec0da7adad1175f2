use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub query: QueryConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub ai: AiConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub default_limit: u32,
    pub max_limit: Option<u32>,
    pub debug_logging: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry: Duration,
    pub bcrypt_cost: u32,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub allow_admin_registration: bool,
    pub default_employee_password: String,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Absent key disables every AI endpoint (503) without an outbound call.
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub analysis_model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub public_path: String,
    pub max_file_bytes: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set in {0:?}")]
    MissingJwtSecret(Environment),

    #[error("DATABASE_URL must be set when STORE_BACKEND=postgres")]
    MissingDatabaseUrl,
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

    /// Startup checks that presets and overrides cannot express on their own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::MissingJwtSecret(self.environment));
        }
        if self.database.backend == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Query builder overrides
        if let Ok(v) = env::var("QUERY_DEFAULT_LIMIT") {
            self.query.default_limit = v.parse().unwrap_or(self.query.default_limit);
        }
        if let Ok(v) = env::var("QUERY_MAX_LIMIT") {
            self.query.max_limit = v.parse().ok();
        }
        if let Ok(v) = env::var("QUERY_DEBUG_LOGGING") {
            self.query.debug_logging = v.parse().unwrap_or(self.query.debug_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.is_empty() {
                self.database.url = Some(v);
                self.database.backend = StoreBackend::Postgres;
            }
        }
        match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => self.database.backend = StoreBackend::Memory,
            Ok("postgres") | Ok("pg") => self.database.backend = StoreBackend::Postgres,
            _ => {}
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRE") {
            self.security.jwt_expiry = parse_lifetime(&v).unwrap_or(self.security.jwt_expiry);
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_ALLOW_ADMIN_REGISTRATION") {
            self.security.allow_admin_registration = v.parse().unwrap_or(self.security.allow_admin_registration);
        }
        if let Ok(v) = env::var("DEFAULT_EMPLOYEE_PASSWORD") {
            self.security.default_employee_password = v;
        }

        // AI overrides
        if let Ok(v) = env::var("GROQ_API_KEY") {
            self.ai.api_key = if v.trim().is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("AI_BASE_URL") {
            self.ai.base_url = v;
        }
        if let Ok(v) = env::var("AI_CHAT_MODEL") {
            self.ai.chat_model = v;
        }
        if let Ok(v) = env::var("AI_ANALYSIS_MODEL") {
            self.ai.analysis_model = v;
        }
        if let Ok(v) = env::var("AI_TIMEOUT_SECS") {
            self.ai.timeout_secs = v.parse().unwrap_or(self.ai.timeout_secs);
        }

        // Storage overrides
        if let Ok(v) = env::var("UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("UPLOAD_MAX_BYTES") {
            self.storage.max_file_bytes = v.parse().unwrap_or(self.storage.max_file_bytes);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            query: QueryConfig {
                default_limit: 25,
                max_limit: Some(1000),
                debug_logging: true,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 5000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: "development-only-secret".to_string(),
                jwt_expiry: Duration::from_secs(30 * 24 * 3600),
                bcrypt_cost: 10,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                allow_admin_registration: true,
                default_employee_password: "defaultpassword123".to_string(),
            },
            ai: AiConfig::default(),
            storage: StorageConfig {
                upload_dir: PathBuf::from("uploads"),
                public_path: "/uploads".to_string(),
                max_file_bytes: 5 * 1024 * 1024,
            },
        }
    }

    pub fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.query = QueryConfig {
            default_limit: 25,
            max_limit: Some(500),
            debug_logging: false,
        };
        config.database = DatabaseConfig {
            backend: StoreBackend::Postgres,
            url: None,
            max_connections: 20,
            connection_timeout: 10,
        };
        config.api.max_request_size_bytes = 5 * 1024 * 1024;
        config.security.jwt_secret = String::new();
        config.security.jwt_expiry = Duration::from_secs(24 * 3600);
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config.security.allow_admin_registration = false;
        config
    }

    pub fn production() -> Self {
        let mut config = Self::staging();
        config.environment = Environment::Production;
        config.query.max_limit = Some(100);
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.api.enable_request_logging = false;
        config.api.max_request_size_bytes = 2 * 1024 * 1024;
        config.security.bcrypt_cost = 12;
        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        config
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            chat_model: "openai/gpt-oss-20b".to_string(),
            analysis_model: "llama-3.1-8b-instant".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Parses token lifetimes in the `30d` / `12h` / `45m` / `90s` shorthand.
/// A bare number is taken as seconds.
pub fn parse_lifetime(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let (digits, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], c),
        _ => (value, 's'),
    };
    let amount: u64 = digits.trim().parse().ok()?;
    let secs = match unit {
        's' => amount,
        'm' => amount.checked_mul(60)?,
        'h' => amount.checked_mul(3600)?,
        'd' => amount.checked_mul(86_400)?,
        'w' => amount.checked_mul(604_800)?,
        _ => return None,
    };
    if secs == 0 {
        return None;
    }
    Some(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.query.default_limit, 25);
        assert_eq!(config.query.max_limit, Some(1000));
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.query.max_limit, Some(100));
        assert!(!config.security.allow_admin_registration);
        assert!(matches!(config.validate(), Err(ConfigError::MissingJwtSecret(_))));
    }

    #[test]
    fn production_requires_database_url() {
        let mut config = AppConfig::production();
        config.security.jwt_secret = "s3cret".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingDatabaseUrl)));
        config.database.url = Some("postgres://localhost/workforce".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_lifetime_shorthand() {
        assert_eq!(parse_lifetime("30d"), Some(Duration::from_secs(30 * 86_400)));
        assert_eq!(parse_lifetime("12h"), Some(Duration::from_secs(12 * 3600)));
        assert_eq!(parse_lifetime("45m"), Some(Duration::from_secs(45 * 60)));
        assert_eq!(parse_lifetime("90"), Some(Duration::from_secs(90)));
        assert_eq!(parse_lifetime("0d"), None);
        assert_eq!(parse_lifetime("soon"), None);
        assert_eq!(parse_lifetime(""), None);
        assert_eq!(parse_lifetime("18446744073709551615d"), None);
        assert_eq!(parse_lifetime("18446744073709551615"), Some(Duration::from_secs(u64::MAX)));
    }
}
