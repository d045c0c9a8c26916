//! Application configuration module
//!
//! Provides configuration types for the application. Values are normally read
//! from the environment by `backend::server::config::load_config`; tests build
//! them directly through [`AppConfigBuilder`].

use thiserror::Error;

/// Port used when `SERVER_PORT` is unset
pub const DEFAULT_PORT: u16 = 3000;
/// Page size used when a listing request does not specify one
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Upper bound for any listing request
pub const MAX_PAGE_SIZE: u32 = 200;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP/WebSocket server binds to
    pub port: u16,
    /// PostgreSQL connection string; `None` selects the in-memory store
    pub database_url: Option<String>,
    /// HS256 secret used to verify bearer tokens
    pub jwt_secret: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if self.default_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DEFAULT_PAGE_SIZE",
                message: "must be greater than zero".into(),
            });
        }
        if self.max_page_size < self.default_page_size {
            return Err(ConfigError::InvalidValue {
                key: "MAX_PAGE_SIZE",
                message: format!(
                    "must be at least DEFAULT_PAGE_SIZE ({})",
                    self.default_page_size
                ),
            });
        }
        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        Ok(())
    }

    /// Clamp a requested page size into `1..=max_page_size`
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    port: Option<u16>,
    database_url: Option<String>,
    jwt_secret: Option<String>,
    default_page_size: Option<u32>,
    max_page_size: Option<u32>,
}

impl AppConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the database URL
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    pub fn default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = Some(size);
        self
    }

    pub fn max_page_size(mut self, size: u32) -> Self {
        self.max_page_size = Some(size);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            port: self.port.unwrap_or(DEFAULT_PORT),
            database_url: self.database_url,
            jwt_secret: self.jwt_secret.ok_or(ConfigError::MissingValue("JWT_SECRET"))?,
            default_page_size: self.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            max_page_size: self.max_page_size.unwrap_or(MAX_PAGE_SIZE),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = AppConfig::builder().jwt_secret("secret").build().unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.default_page_size, 50);
        assert_eq!(config.max_page_size, 200);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_missing_secret() {
        let err = AppConfig::builder().build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue("JWT_SECRET")));
    }

    #[test]
    fn test_rejects_non_postgres_url() {
        let err = AppConfig::builder()
            .jwt_secret("secret")
            .database_url("mysql://localhost/chat")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(_)));
    }

    #[test]
    fn test_page_size_clamped() {
        let config = AppConfig::builder()
            .jwt_secret("secret")
            .max_page_size(100)
            .build()
            .unwrap();
        assert_eq!(config.page_size(None), 50);
        assert_eq!(config.page_size(Some(0)), 1);
        assert_eq!(config.page_size(Some(1_000)), 100);
    }
}
