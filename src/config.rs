use std::env;
use std::fmt;

use anyhow::Context;

/// Deployment environment, read from `NODE_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MySQL connection settings
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

// Keep the password out of startup logs.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("name", &self.name)
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            name: "netzero".to_string(),
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_prefix: String,
    pub api_version: String,
    pub environment: Environment,
    pub jwt_secret: Option<String>,
    pub database: DatabaseConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_prefix", &self.api_prefix)
            .field("api_version", &self.api_version)
            .field("environment", &self.environment)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .finish()
    }
}

impl Config {
    /// Reads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match var("CHAT_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("CHAT_PORT must be a valid port number, got {raw:?}"))?,
            None => defaults.port,
        };

        let db_port = match var("DB_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("DB_PORT must be a valid port number, got {raw:?}"))?,
            None => defaults.database.port,
        };

        Ok(Self {
            host: defaults.host,
            port,
            api_prefix: var("API_PREFIX").unwrap_or(defaults.api_prefix),
            api_version: var("API_VERSION").unwrap_or(defaults.api_version),
            environment: var("NODE_ENV")
                .map(|value| Environment::parse(&value))
                .unwrap_or_default(),
            jwt_secret: var("JWT_SECRET"),
            database: DatabaseConfig {
                host: var("DB_HOST").unwrap_or(defaults.database.host),
                port: db_port,
                user: var("DB_USER").unwrap_or(defaults.database.user),
                // An empty password is legitimate for local MySQL.
                password: lookup("DB_PASSWORD").unwrap_or(defaults.database.password),
                name: var("DB_NAME").unwrap_or(defaults.database.name),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Mount point of the chat routes, e.g. `/api/v1/chat`
    pub fn chat_base_path(&self) -> String {
        let prefix = self.api_prefix.trim_end_matches('/');
        let version = self.api_version.trim_matches('/');
        if prefix.starts_with('/') || prefix.is_empty() {
            format!("{prefix}/{version}/chat")
        } else {
            format!("/{prefix}/{version}/chat")
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3004,
            api_prefix: "/api".to_string(),
            api_version: "v1".to_string(),
            environment: Environment::Development,
            jwt_secret: None,
            database: DatabaseConfig::default(),
        }
    }
}
