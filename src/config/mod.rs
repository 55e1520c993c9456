use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use thiserror::Error;

use crate::models::PageLimits;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/planner";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SESSION_COOKIE: &str = "session_token";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub backend: StoreBackend,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub page_limits: PageLimits,
    pub session_cookie_name: String,
    /// `token=owner` pairs, only used by the memory backend.
    pub static_sessions: String,
    pub cors_allowed_origins: Option<String>,
    pub production: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            backend: StoreBackend::Postgres,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            page_limits: PageLimits::default(),
            session_cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            static_sessions: String::new(),
            cors_allowed_origins: None,
            production: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let backend = match var("STORE_BACKEND") {
            None => defaults.backend,
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "STORE_BACKEND",
                value,
            })?,
        };

        let host: IpAddr = parse_or(var("HOST"), "HOST", DEFAULT_HOST.parse().ok())?;
        let port: u16 = parse_or(var("PORT"), "PORT", Some(DEFAULT_PORT))?;

        let max_take: u32 = parse_or(
            var("EVENTS_MAX_PAGE_SIZE"),
            "EVENTS_MAX_PAGE_SIZE",
            Some(defaults.page_limits.max_take),
        )?;
        if max_take == 0 {
            return Err(ConfigError::InvalidValue {
                name: "EVENTS_MAX_PAGE_SIZE",
                value: max_take.to_string(),
            });
        }
        let default_take: u32 = parse_or(
            var("EVENTS_DEFAULT_PAGE_SIZE"),
            "EVENTS_DEFAULT_PAGE_SIZE",
            Some(defaults.page_limits.default_take),
        )?;

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            backend,
            bind_addr: SocketAddr::new(host, port),
            max_connections: parse_or(
                var("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                Some(defaults.max_connections),
            )?,
            page_limits: PageLimits {
                default_take: default_take.min(max_take),
                max_take,
            },
            session_cookie_name: var("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.session_cookie_name),
            static_sessions: var("STATIC_SESSIONS").unwrap_or_default(),
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS"),
            production: var("RUST_ENV")
                .map(|v| v.to_lowercase() == "production")
                .unwrap_or(false),
        })
    }
}

fn parse_or<T: FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: Option<T>,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => default.ok_or(ConfigError::InvalidValue {
            name,
            value: String::new(),
        }),
    }
}
