//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use tollgate_observability::LogFormat;

/// Signing secret used when `JWT_SECRET` is unset. Never use in production.
pub const DEV_JWT_SECRET: &str = "dev-secret";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_COOKIE_KEY: &str = "session";
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 30;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be a socket address, got '{value}'")]
    InvalidAddr { var: &'static str, value: String },

    #[error("LOG_FORMAT: {0}")]
    InvalidLogFormat(String),

    #[error("ADMIN_EMAIL and ADMIN_PASSWORD must be set together")]
    PartialAdminSeed,
}

/// Credentials for an administrator created at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Name of the session cookie set on login.
    pub cookie_key: String,
    pub session_ttl: Duration,
    /// Deadline for one dispatched request, policies included.
    pub request_timeout: Duration,
    pub log_format: LogFormat,
    pub admin: Option<AdminSeed>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Unset and empty variables
    /// take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let raw_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let mut bind_addr: SocketAddr = raw_addr.trim().parse().map_err(|_| ConfigError::InvalidAddr {
            var: "BIND_ADDR",
            value: raw_addr.clone(),
        })?;
        if let Some(port) = var("PORT") {
            let port = port.trim().parse::<u16>().map_err(|_| ConfigError::InvalidNumber {
                var: "PORT",
                value: port.clone(),
            })?;
            bind_addr.set_port(port);
        }

        let session_ttl = parse_u64(&var, "SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        let request_timeout = parse_u64(&var, "REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;

        let log_format = match var("LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(ConfigError::InvalidLogFormat)?,
            None => LogFormat::default(),
        };

        let admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: var("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                email,
                password,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialAdminSeed),
        };

        Ok(Self {
            bind_addr,
            jwt_secret: var("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            cookie_key: var("COOKIE_KEY").unwrap_or_else(|| DEFAULT_COOKIE_KEY.to_string()),
            session_ttl: Duration::from_secs(session_ttl),
            request_timeout: Duration::from_millis(request_timeout),
            log_format,
            admin,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            cookie_key: DEFAULT_COOKIE_KEY.to_string(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            log_format: LogFormat::default(),
            admin: None,
        }
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("cookie_key", &self.cookie_key)
            .field("session_ttl", &self.session_ttl)
            .field("request_timeout", &self.request_timeout)
            .field("log_format", &self.log_format)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

fn parse_u64(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match var(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            var: name,
            value: raw,
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(cfg.uses_dev_secret());
    }

    #[test]
    fn port_overrides_bind_addr_port() {
        let cfg = config(&[("BIND_ADDR", "127.0.0.1:8080"), ("PORT", "9090")]).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9090".parse().unwrap());
    }

    #[test]
    fn malformed_numbers_are_errors() {
        assert_eq!(
            config(&[("REQUEST_TIMEOUT_MS", "soon")]).unwrap_err(),
            ConfigError::InvalidNumber {
                var: "REQUEST_TIMEOUT_MS",
                value: "soon".to_string()
            }
        );
        assert!(matches!(
            config(&[("PORT", "70000")]),
            Err(ConfigError::InvalidNumber { var: "PORT", .. })
        ));
    }

    #[test]
    fn admin_seed_needs_both_halves() {
        assert_eq!(
            config(&[("ADMIN_EMAIL", "root@example.com")]).unwrap_err(),
            ConfigError::PartialAdminSeed
        );

        let cfg = config(&[("ADMIN_EMAIL", "root@example.com"), ("ADMIN_PASSWORD", "hunter22")]).unwrap();
        assert_eq!(cfg.admin.unwrap().name, "Administrator");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = config(&[
            ("JWT_SECRET", "super-secret-value"),
            ("ADMIN_EMAIL", "root@example.com"),
            ("ADMIN_PASSWORD", "hunter22"),
        ])
        .unwrap();

        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("hunter22"));
    }
}
