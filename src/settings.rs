//! Process settings read from the environment once at startup.

use crate::config::{NamespaceMode, RegistrationEncoding, RegistrySource};
use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_CONFIG_PATH: &str = "conf.d";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shape of emitted log lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidSetting {
                key: "BRIDGE_LOG_FORMAT",
                reason: format!("{} (expected plain or json)", s),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BridgeSettings {
    pub bind: SocketAddr,
    pub config_path: PathBuf,
    pub namespace: NamespaceMode,
    pub encoding: RegistrationEncoding,
    pub cache_ttl: Duration,
    /// Double every `%` before execution (`BRIDGE_ESCAPE_PERCENT`, on by default).
    /// Statements run verbatim with no placeholder substitution, so this changes
    /// literals: `SET note='50%'` stores `50%%`. Turn it off to send `%` unchanged.
    pub escape_percent: bool,
    pub max_body_bytes: usize,
    pub log_format: LogFormat,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        BridgeSettings {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            namespace: NamespaceMode::Flat,
            encoding: RegistrationEncoding::Fields,
            cache_ttl: Duration::ZERO,
            escape_percent: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            log_format: LogFormat::Plain,
        }
    }
}

impl BridgeSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = BridgeSettings::default();

        let bind = match get("BRIDGE_BIND") {
            Some(raw) => raw.parse().map_err(|e| invalid("BRIDGE_BIND", &raw, e))?,
            None => defaults.bind,
        };
        let namespace = match get("BRIDGE_NAMESPACE") {
            Some(raw) => raw.parse()?,
            None => defaults.namespace,
        };
        let encoding = match get("BRIDGE_ENCODING") {
            Some(raw) => raw.parse()?,
            None => defaults.encoding,
        };
        let cache_ttl = match get("BRIDGE_CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse().map_err(|e| invalid("BRIDGE_CACHE_TTL_SECS", &raw, e))?,
            ),
            None => defaults.cache_ttl,
        };
        let escape_percent = match get("BRIDGE_ESCAPE_PERCENT") {
            Some(raw) => parse_flag("BRIDGE_ESCAPE_PERCENT", &raw)?,
            None => defaults.escape_percent,
        };
        let max_body_bytes = match get("BRIDGE_MAX_BODY_BYTES") {
            Some(raw) => raw.parse().map_err(|e| invalid("BRIDGE_MAX_BODY_BYTES", &raw, e))?,
            None => defaults.max_body_bytes,
        };
        let log_format = match get("BRIDGE_LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => defaults.log_format,
        };

        Ok(BridgeSettings {
            bind,
            config_path: get("BRIDGE_CONFIG_PATH").map(PathBuf::from).unwrap_or(defaults.config_path),
            namespace,
            encoding,
            cache_ttl,
            escape_percent,
            max_body_bytes,
            log_format,
        })
    }

    pub fn registry_source(&self) -> RegistrySource {
        RegistrySource {
            path: self.config_path.clone(),
            mode: self.namespace,
            encoding: self.encoding,
        }
    }
}

fn invalid(key: &'static str, raw: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidSetting {
        key,
        reason: format!("{}: {}", raw, err),
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidSetting {
            key,
            reason: format!("{} (expected true or false)", raw),
        }),
    }
}
