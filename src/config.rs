//! Configuration management.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub authz: AuthzConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub metrics_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub request_timeout_secs: u64,
    pub max_body_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_secs: u64,
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AuthzConfig {
    /// Guard assigned to roles and permissions created without one.
    pub default_guard_name: String,
}

impl AuthzConfig {
    /// Unset or blank values fall back to `web`.
    fn guard_or_web(raw: Option<String>) -> String {
        raw.map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| "web".to_string())
    }
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            default_guard_name: Self::guard_or_web(None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let environment = Self::parse_environment();

        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                environment: environment.clone(),
                request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("REQUEST_TIMEOUT_SECS must be a valid number"),
                max_body_size: env::var("MAX_BODY_SIZE")
                    .unwrap_or_else(|_| "1048576".to_string())
                    .parse()
                    .expect("MAX_BODY_SIZE must be a valid number"),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "hospice_rbac.db".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("DATABASE_MAX_CONNECTIONS must be a valid number"),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()
                    .expect("DATABASE_MIN_CONNECTIONS must be a valid number"),
                connection_timeout_secs: env::var("DATABASE_CONNECTION_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("DATABASE_CONNECTION_TIMEOUT_SECS must be a valid number"),
                busy_timeout_ms: env::var("DATABASE_BUSY_TIMEOUT_MS")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .expect("DATABASE_BUSY_TIMEOUT_MS must be a valid number"),
            },
            authz: AuthzConfig {
                default_guard_name: AuthzConfig::guard_or_web(env::var("AUTHZ_DEFAULT_GUARD").ok()),
            },
            cors: Self::parse_cors_config(&environment),
            logging: Self::parse_logging_config(&environment),
            telemetry: Self::parse_telemetry_config(),
        }
    }

    fn parse_telemetry_config() -> TelemetryConfig {
        TelemetryConfig {
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "hospice-rbac".to_string()),
            metrics_enabled: env::var("METRICS_ENABLED")
                .map(|v| v.parse().unwrap_or(true))
                .unwrap_or(true),
        }
    }

    fn parse_environment() -> Environment {
        match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }

    fn parse_cors_config(environment: &Environment) -> CorsConfig {
        let default_origins = if environment.is_development() {
            vec!["*".to_string()]
        } else {
            vec![]
        };

        CorsConfig {
            allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default_origins),
            allowed_methods: env::var("CORS_ALLOWED_METHODS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| {
                    vec![
                        "GET".to_string(),
                        "POST".to_string(),
                        "PUT".to_string(),
                        "DELETE".to_string(),
                        "OPTIONS".to_string(),
                    ]
                }),
            allowed_headers: env::var("CORS_ALLOWED_HEADERS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| {
                    vec![
                        "Content-Type".to_string(),
                        "Authorization".to_string(),
                        "X-Request-ID".to_string(),
                    ]
                }),
            allow_credentials: env::var("CORS_ALLOW_CREDENTIALS")
                .map(|v| v.parse().unwrap_or(false))
                .unwrap_or(false),
            max_age_secs: env::var("CORS_MAX_AGE_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .expect("CORS_MAX_AGE_SECS must be a valid number"),
        }
    }

    fn parse_logging_config(environment: &Environment) -> LoggingConfig {
        let is_dev = environment.is_development();

        LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| {
                if is_dev {
                    "debug".to_string()
                } else {
                    "info".to_string()
                }
            }),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| {
                    if is_dev {
                        "pretty".to_string()
                    } else {
                        "json".to_string()
                    }
                })
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }

    pub fn validate_for_production(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.server.environment.is_production() {
            if self.cors.allowed_origins.contains(&"*".to_string()) {
                issues.push("CORS should not allow all origins (*) in production".to_string());
            }

            if self.database.url.contains(":memory:") {
                issues.push("Database URL points to an in-memory database in production".to_string());
            }

            if self.authz.default_guard_name.trim().is_empty() {
                issues.push("Default guard name should not be empty".to_string());
            }
        }

        issues
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Config {
    pub fn default_for_testing() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                environment: Environment::Development,
                request_timeout_secs: 30,
                max_body_size: 1048576,
            },
            database: DatabaseConfig {
                url: ":memory:".to_string(),
                max_connections: 5,
                min_connections: 1,
                connection_timeout_secs: 10,
                busy_timeout_ms: 5000,
            },
            authz: AuthzConfig::default(),
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
                allowed_methods: vec![
                    "GET".to_string(),
                    "POST".to_string(),
                    "PUT".to_string(),
                    "DELETE".to_string(),
                ],
                allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
                allow_credentials: false,
                max_age_secs: 3600,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
            telemetry: TelemetryConfig {
                service_name: "hospice-rbac-test".to_string(),
                metrics_enabled: false,
            },
        }
    }
}
