//! Environment-driven configuration, loaded once at startup.

use std::net::{IpAddr, SocketAddr};

/// Everything the service reads from its environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: IpAddr,
    pub server_port: u16,
    pub environment: Environment,
    pub log_level: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    /// Root directory of the asset store; uploaded game files live beneath it.
    pub upload_dir: String,
    /// Stock cover image used when an upload carries no thumbnail.
    pub placeholder_image: String,
    pub frontend_url: String,
}

/// Deployment environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn required_var(key: &str) -> anyhow::Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("{key} must be set"))
}

impl Config {
    /// Load configuration from environment variables (and a `.env` file when
    /// present).
    ///
    /// Required: `DATABASE_URL`, `JWT_SECRET`. Everything else has a default;
    /// hosting platforms may supply `PORT` in place of `SERVER_PORT`.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a host/port
    /// value does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let environment = match var_or("ENVIRONMENT", "development").as_str() {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let server_port = std::env::var("PORT")
            .or_else(|_| std::env::var("SERVER_PORT"))
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("SERVER_PORT / PORT must be a valid u16"))?;

        // Bind loopback during development, all interfaces when deployed.
        let default_host = if environment == Environment::Production {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };
        let server_host = var_or("SERVER_HOST", default_host)
            .parse::<IpAddr>()
            .map_err(|_| anyhow::anyhow!("SERVER_HOST must be a valid IP address"))?;

        let jwt_expiration_secs = var_or("JWT_EXPIRATION_SECS", "86400")
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("JWT_EXPIRATION_SECS must be a valid u64"))?;

        Ok(Self {
            database_url: required_var("DATABASE_URL")?,
            server_host,
            server_port,
            environment,
            log_level: var_or("LOG_LEVEL", "info"),
            jwt_secret: required_var("JWT_SECRET")?,
            jwt_expiration_secs,
            upload_dir: var_or("UPLOAD_DIR", "public/uploads"),
            placeholder_image: var_or("PLACEHOLDER_IMAGE", "https://picsum.photos/400/225"),
            frontend_url: var_or("FRONTEND_URL", "http://localhost:3001"),
        })
    }

    /// The socket address the server binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_host, self.server_port)
    }
}
