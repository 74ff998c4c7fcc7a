// Configuration management

use crate::core::errors::ProxyError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
///
/// All configuration is validated on load with clear error messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub listen_address: String,
    pub port: u16,

    // PuppetDB backend
    pub puppetdb_url: String,
    pub puppetdb_insecure: bool,
    pub backend_timeout_secs: Option<u64>,

    // Values synthesized into modern command payloads
    pub environment: String,
    pub producer: String,

    // Middleware configuration
    pub body_size_limit_bytes: usize,

    // Logging configuration
    pub log_level: String,
    pub log_format: String, // "json" or "text"
    pub log_file: Option<PathBuf>,

    // Payload dumps for a single troubleshooting host
    pub dump_hostname: Option<String>,
    pub dump_facts: bool,
    pub dump_catalog: bool,
    pub dump_report: bool,
    pub dump_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Supports `.env` file loading in development (via dotenv crate).
    pub fn from_env() -> Result<Self, ProxyError> {
        #[cfg(not(test))]
        {
            dotenv::dotenv().ok();
        }

        let config = Self {
            listen_address: Self::get_env_or_default("LISTEN_ADDRESS", "127.0.0.1")?,
            port: Self::parse_port("PORT", 8088)?,
            puppetdb_url: Self::get_env_or_default("PUPPETDB_URL", "https://puppetdb.example.com")?,
            puppetdb_insecure: Self::parse_bool_or_default("PUPPETDB_INSECURE", false)?,
            backend_timeout_secs: Self::parse_optional_u64("BACKEND_TIMEOUT_SECS")?,
            environment: Self::get_env_or_default("PUPPETDB_ENVIRONMENT", "production")?,
            producer: Self::get_env_or_default("PUPPETDB_PRODUCER", "puppet.example.com")?,
            body_size_limit_bytes: Self::parse_usize_or_default("BODY_SIZE_LIMIT_BYTES", 64 * 1024 * 1024)?,
            log_level: Self::get_env_or_default("LOG_LEVEL", "info")?,
            log_format: Self::get_env_or_default("LOG_FORMAT", "json")?,
            log_file: Self::get_optional_env("LOG_FILE")?.map(PathBuf::from),
            dump_hostname: Self::get_optional_env("DUMP_HOSTNAME")?,
            dump_facts: Self::parse_bool_or_default("DUMP_FACTS", false)?,
            dump_catalog: Self::parse_bool_or_default("DUMP_CATALOG", false)?,
            dump_report: Self::parse_bool_or_default("DUMP_REPORT", false)?,
            dump_dir: PathBuf::from(Self::get_env_or_default("DUMP_DIR", "/tmp")?),
        };

        config.validate()?;

        Ok(config)
    }

    /// Get environment variable or return default value
    fn get_env_or_default(key: &str, default: &str) -> Result<String, ProxyError> {
        Ok(env::var(key).unwrap_or_else(|_| default.to_string()))
    }

    /// Get optional environment variable; empty counts as unset
    fn get_optional_env(key: &str) -> Result<Option<String>, ProxyError> {
        match env::var(key) {
            Ok(value) if !value.is_empty() => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    fn parse_port(key: &str, default: u16) -> Result<u16, ProxyError> {
        let port_str = env::var(key).unwrap_or_else(|_| default.to_string());
        let port = port_str.parse::<u16>().map_err(|e| {
            ProxyError::ConfigurationError(format!("Invalid {} value '{}': {}", key, port_str, e))
        })?;

        if port == 0 {
            return Err(ProxyError::ConfigurationError(format!(
                "{} must be between 1 and 65535",
                key
            )));
        }

        Ok(port)
    }

    /// Parse a boolean flag (`true`/`false`, `1`/`0`, `yes`/`no`)
    fn parse_bool_or_default(key: &str, default: bool) -> Result<bool, ProxyError> {
        match env::var(key) {
            Ok(value) => match value.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" | "" => Ok(false),
                _ => Err(ProxyError::ConfigurationError(format!(
                    "Invalid {} value '{}': expected true or false",
                    key, value
                ))),
            },
            Err(_) => Ok(default),
        }
    }

    /// Parse a positive u64, unset or empty means `None`
    fn parse_optional_u64(key: &str) -> Result<Option<u64>, ProxyError> {
        match Self::get_optional_env(key)? {
            Some(value) => Self::parse_u64(&value, key).map(Some),
            None => Ok(None),
        }
    }

    /// Parse usize from environment variable or return default
    fn parse_usize_or_default(key: &str, default: usize) -> Result<usize, ProxyError> {
        match env::var(key) {
            Ok(value) => {
                let parsed = value.parse::<usize>().map_err(|e| {
                    ProxyError::ConfigurationError(format!("Invalid {} value '{}': {}", key, value, e))
                })?;

                if parsed == 0 {
                    return Err(ProxyError::ConfigurationError(format!(
                        "{} must be greater than 0",
                        key
                    )));
                }

                Ok(parsed)
            }
            _ => Ok(default),
        }
    }

    fn parse_u64(value: &str, env_key: &str) -> Result<u64, ProxyError> {
        let parsed = value.parse::<u64>().map_err(|e| {
            ProxyError::ConfigurationError(format!("Invalid {} value '{}': {}", env_key, value, e))
        })?;

        if parsed == 0 {
            return Err(ProxyError::ConfigurationError(format!(
                "{} must be greater than 0",
                env_key
            )));
        }

        Ok(parsed)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ProxyError> {
        if self.port == 0 {
            return Err(ProxyError::ConfigurationError(format!(
                "Invalid PORT value '{}': must be between 1 and 65535",
                self.port
            )));
        }

        Self::validate_url(&self.puppetdb_url, "PuppetDB")?;

        if self.environment.is_empty() {
            return Err(ProxyError::ConfigurationError(
                "PUPPETDB_ENVIRONMENT must not be empty".to_string(),
            ));
        }
        if self.producer.is_empty() {
            return Err(ProxyError::ConfigurationError(
                "PUPPETDB_PRODUCER must not be empty".to_string(),
            ));
        }

        let dumping = self.dump_facts || self.dump_catalog || self.dump_report;
        if dumping && self.dump_hostname.is_none() {
            return Err(ProxyError::ConfigurationError(
                "DUMP_FACTS, DUMP_CATALOG and DUMP_REPORT require DUMP_HOSTNAME".to_string(),
            ));
        }

        Self::validate_log_level(&self.log_level)?;
        Self::validate_log_format(&self.log_format)?;

        Ok(())
    }

    /// Validate URL format; only http and https backends are reachable
    fn validate_url(url: &str, description: &str) -> Result<(), ProxyError> {
        let parsed = url::Url::parse(url).map_err(|e| {
            ProxyError::ConfigurationError(format!("Invalid {} URL '{}': {}", description, url, e))
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ProxyError::ConfigurationError(format!(
                "Invalid {} URL '{}': scheme must be http or https",
                description, url
            )));
        }
        Ok(())
    }

    fn validate_log_level(level: &str) -> Result<(), ProxyError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&level.to_lowercase().as_str()) {
            return Err(ProxyError::ConfigurationError(format!(
                "Invalid LOG_LEVEL '{}': must be one of {}",
                level,
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_log_format(format: &str) -> Result<(), ProxyError> {
        if format != "json" && format != "text" {
            return Err(ProxyError::ConfigurationError(format!(
                "Invalid LOG_FORMAT '{}': must be 'json' or 'text'",
                format
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Create a test configuration for unit tests
    ///
    /// This bypasses environment variable loading for use in tests that
    /// don't need real configuration.
    pub fn test_config() -> Self {
        Self {
            listen_address: "127.0.0.1".to_string(),
            port: 8088,
            puppetdb_url: "http://127.0.0.1:8080".to_string(),
            puppetdb_insecure: false,
            backend_timeout_secs: None,
            environment: "production".to_string(),
            producer: "puppet.example.com".to_string(),
            body_size_limit_bytes: 64 * 1024 * 1024,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            log_file: None,
            dump_hostname: None,
            dump_facts: false,
            dump_catalog: false,
            dump_report: false,
            dump_dir: PathBuf::from("/tmp"),
        }
    }
}
