//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use std::net::Ipv4Addr;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "rulegate-dev-secret-change-in-production";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0), // Bind to 0.0.0.0 for Docker
            port: 3000,
            request_timeout_secs: 30,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Token validation configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// JWT_SECRET was missing and the development secret is in use
    pub insecure_default: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let server = ServerConfig {
            host: parse_or("HOST", lookup("HOST"), defaults.host)?,
            port: parse_or("PORT", lookup("PORT"), defaults.port)?,
            request_timeout_secs: parse_or(
                "REQUEST_TIMEOUT_SECS",
                lookup("REQUEST_TIMEOUT_SECS"),
                defaults.request_timeout_secs,
            )?,
        };

        let cors = CorsConfig {
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        let auth = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => AuthConfig {
                jwt_secret: secret,
                insecure_default: false,
            },
            _ => AuthConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                insecure_default: true,
            },
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("") | Some("compact") => LogFormat::Compact,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            server,
            cors,
            auth,
            log_format,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.auth.jwt_secret, DEV_JWT_SECRET);
        assert!(settings.auth.insecure_default);
        assert_eq!(settings.log_format, LogFormat::Compact);
        assert_eq!(settings.cors.allowed_origins, vec!["http://localhost:3001"]);
    }

    #[test]
    fn test_values_from_environment() {
        let settings = settings(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("JWT_SECRET", "s3cret"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, Ipv4Addr::new(127, 0, 0, 1));
        assert_eq!(settings.auth.jwt_secret, "s3cret");
        assert!(!settings.auth.insecure_default);
        assert_eq!(
            settings.cors.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = settings(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));
    }
}
