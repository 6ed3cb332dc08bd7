//! # Server Configuration
//!
//! Settings come from environment variables with fixed defaults. Parsing goes
//! through [`ServerConfig::from_lookup`] so tests supply their own variables
//! instead of mutating the process environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;

pub const PORT_VAR: &str = "TRACKING_SERVER_PORT";
pub const BIND_ADDR_VAR: &str = "TRACKING_BIND_ADDR";
pub const BUFFER_SIZE_VAR: &str = "TRACKING_BUFFER_SIZE";
pub const SEED_DEFAULTS_VAR: &str = "TRACKING_SEED_DEFAULTS";

pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for the listener and sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to listen on.
    pub bind_addr: IpAddr,
    /// Port to listen on; `0` picks an ephemeral port.
    pub port: u16,
    /// Bytes requested per socket read. Only affects how many reads a
    /// message takes, never what it means.
    pub buffer_size: usize,
    /// Write the demo routes at startup when the trip collection is empty.
    pub seed_defaults: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            seed_defaults: true,
        }
    }
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads configuration through `lookup`; unset or blank variables keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ServerConfig::default();
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        if let Some(value) = get(PORT_VAR) {
            config.port = parse(PORT_VAR, &value)?;
        }
        if let Some(value) = get(BIND_ADDR_VAR) {
            config.bind_addr = parse(BIND_ADDR_VAR, &value)?;
        }
        if let Some(value) = get(BUFFER_SIZE_VAR) {
            config.buffer_size = parse(BUFFER_SIZE_VAR, &value)?;
            if config.buffer_size == 0 {
                return Err(ConfigError::Invalid {
                    var: BUFFER_SIZE_VAR,
                    value,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if let Some(value) = get(SEED_DEFAULTS_VAR) {
            config.seed_defaults = parse_flag(SEED_DEFAULTS_VAR, &value)?;
        }

        Ok(config)
    }

    /// Returns the socket address to bind.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 8888);
        assert_eq!(config.buffer_size, 4096);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[
            (PORT_VAR, "9000"),
            (BIND_ADDR_VAR, "127.0.0.1"),
            (BUFFER_SIZE_VAR, "16"),
            (SEED_DEFAULTS_VAR, "off"),
        ]))
        .unwrap();
        assert_eq!(config.socket_addr(), "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.buffer_size, 16);
        assert!(!config.seed_defaults);
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[(PORT_VAR, "  ")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = ServerConfig::from_lookup(lookup(&[(PORT_VAR, "eighty")])).unwrap_err();
        assert!(err.to_string().contains(PORT_VAR));

        let err = ServerConfig::from_lookup(lookup(&[(BUFFER_SIZE_VAR, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: BUFFER_SIZE_VAR, .. }));
    }
}
