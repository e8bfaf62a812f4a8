/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 characters)
/// - `APP_URL`: Public base URL used in mail links (default: http://localhost:8080)
/// - `MAIL_DRIVER`: `log` or `http` (default: log)
/// - `MAIL_API_URL`: Relay endpoint (required when `MAIL_DRIVER=http`)
/// - `MAIL_API_KEY`: Bearer key for the relay (optional)
/// - `MAIL_FROM`: Sender address (default: noreply@taskgate.local)
/// - `MAIL_FROM_NAME`: Sender display name (default: TaskGate)
/// - `ADMIN_EMAIL`, `ADMIN_PASSWORD`, `ADMIN_NAME`: Bootstrap administrator
/// - `RUST_LOG`: Log filter; `LOG_FORMAT=json` switches to JSON output
///
/// # Example
///
/// ```no_run
/// use taskgate_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::{env, str::FromStr};

use taskgate_shared::{auth::password::MIN_PASSWORD_LENGTH, db::seed::AdminSeed};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Outgoing mail configuration
    pub mail: MailConfig,

    /// Bootstrap administrator, when configured
    pub admin: Option<AdminConfig>,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Public base URL of the application
    pub app_url: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Mail delivery backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailDriver {
    /// Write mail to the log
    Log,

    /// Post mail to an HTTP relay
    Http,
}

impl FromStr for MailDriver {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(MailDriver::Log),
            "http" => Ok(MailDriver::Http),
            other => anyhow::bail!("Unknown MAIL_DRIVER '{}', expected 'log' or 'http'", other),
        }
    }
}

/// Mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub driver: MailDriver,

    /// Relay endpoint for the `http` driver
    pub api_url: Option<String>,

    /// Relay bearer key
    pub api_key: Option<String>,

    /// Sender address
    pub from_address: String,

    /// Sender display name
    pub from_name: String,
}

/// Bootstrap administrator credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl AdminConfig {
    /// Converts into the seed input
    pub fn to_seed(&self) -> AdminSeed {
        AdminSeed {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    ///
    /// # Example
    ///
    /// ```no_run
    /// use taskgate_api::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = Config::from_env()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = var("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is not a valid port: {}", e))?;

        let cors_origins = var("API_CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let app_url = var("APP_URL").unwrap_or_else(|| format!("http://localhost:{}", api_port));

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is not a number: {}", e))?;

        let jwt_secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let driver = match var("MAIL_DRIVER") {
            Some(value) => value.parse::<MailDriver>()?,
            None => MailDriver::Log,
        };

        let api_url = var("MAIL_API_URL");
        if driver == MailDriver::Http && api_url.is_none() {
            anyhow::bail!("MAIL_API_URL is required when MAIL_DRIVER=http");
        }

        let admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => {
                if password.len() < MIN_PASSWORD_LENGTH {
                    anyhow::bail!(
                        "ADMIN_PASSWORD must be at least {} characters long",
                        MIN_PASSWORD_LENGTH
                    );
                }
                Some(AdminConfig {
                    name: var("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                    email,
                    password,
                })
            }
            (None, None) => None,
            _ => anyhow::bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                app_url,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            mail: MailConfig {
                driver,
                api_url,
                api_key: var("MAIL_API_KEY"),
                from_address: var("MAIL_FROM")
                    .unwrap_or_else(|| "noreply@taskgate.local".to_string()),
                from_name: var("MAIL_FROM_NAME").unwrap_or_else(|| "TaskGate".to_string()),
            },
            admin,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
