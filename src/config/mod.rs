//! Server configuration
//!
//! Every setting can be given as a command-line flag or an environment
//! variable; a `.env` file in the working directory is loaded first.
//!
//! ```text
//! DATABASE=mongodb+srv://natours:<PASSWORD>@cluster0.example.net/?retryWrites=true
//! DATABASE_PASSWORD=s3cret
//! PORT=3000
//! APP_ENV=development
//! ```

use crate::core::error::ConfigError;
use clap::Parser;
use std::path::PathBuf;

/// Placeholder replaced by the database password in the connection string
pub const PASSWORD_PLACEHOLDER: &str = "<PASSWORD>";

/// Connection string schemes understood by the MongoDB driver
pub const DATABASE_SCHEMES: [&str; 2] = ["mongodb://", "mongodb+srv://"];

/// Tours API server configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "tours-api", about = "Tours REST API server", long_about = None)]
pub struct ServerConfig {
    /// MongoDB connection string, may contain `<PASSWORD>`
    #[arg(long, env = "DATABASE")]
    pub database: Option<String>,

    /// Password substituted into the connection string
    #[arg(long, env = "DATABASE_PASSWORD", hide_env_values = true)]
    pub database_password: Option<String>,

    /// MongoDB database name
    #[arg(long, env = "DATABASE_NAME", default_value = "natours")]
    pub database_name: String,

    /// Server host address
    #[arg(short = 'H', long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Runtime environment; `development` logs every request
    #[arg(long, env = "APP_ENV", default_value = "development")]
    pub app_env: String,

    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Directory of static assets served at `/`
    #[arg(long, env = "PUBLIC_DIR")]
    pub public_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from `.env`, the environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }

    /// Connection string with the password substituted, `None` when no
    /// database is configured
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a MongoDB URI, or carries the
    /// placeholder but no password is set
    pub fn connection_string(&self) -> Result<Option<String>, ConfigError> {
        let Some(database) = self.database.as_deref().map(str::trim).filter(|d| !d.is_empty())
        else {
            return Ok(None);
        };

        if !DATABASE_SCHEMES.iter().any(|scheme| database.starts_with(scheme)) {
            return Err(ConfigError::InvalidValue {
                field: "DATABASE".to_string(),
                value: database.to_string(),
                message: "expected a mongodb:// or mongodb+srv:// connection string".to_string(),
            });
        }

        if !database.contains(PASSWORD_PLACEHOLDER) {
            return Ok(Some(database.to_string()));
        }

        match &self.database_password {
            Some(password) => Ok(Some(database.replace(PASSWORD_PLACEHOLDER, password))),
            None => Err(ConfigError::MissingField {
                field: "DATABASE_PASSWORD".to_string(),
                context: "database connection string".to_string(),
            }),
        }
    }
}
