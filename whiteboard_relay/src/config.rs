use crate::{error::RelayError, relay::RelayPolicy};
use std::{env, net::IpAddr, path::PathBuf, str::FromStr};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;
pub const DEFAULT_ROOM: &str = "lobby";

/// Relay settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub bind_host: IpAddr,
    pub port: u16,
    /// Root of the static client: `index.html` plus `css/`, `js/` and `assets/`.
    pub static_dir: PathBuf,
    pub policy: RelayPolicy,
    /// Messages buffered per room before slow receivers start missing some.
    pub channel_capacity: usize,
    /// Room served at `/ws`.
    pub default_room: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            // Listen on all interfaces so the relay is reachable from other hosts/containers.
            bind_host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("client"),
            policy: RelayPolicy::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            default_room: DEFAULT_ROOM.to_string(),
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source; missing keys keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RelayError> {
        let defaults = Self::default();

        let channel_capacity = parse_or("CHANNEL_CAPACITY", &lookup, defaults.channel_capacity)?;
        if channel_capacity == 0 {
            return Err(RelayError::Config {
                key: "CHANNEL_CAPACITY",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            bind_host: parse_or("BIND_HOST", &lookup, defaults.bind_host)?,
            port: parse_or("PORT", &lookup, defaults.port)?,
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            policy: parse_or("RELAY_POLICY", &lookup, defaults.policy)?,
            channel_capacity,
            default_room: lookup("DEFAULT_ROOM")
                .filter(|room| !room.is_empty())
                .unwrap_or(defaults.default_room),
        })
    }

    pub fn bind_addr(&self) -> (IpAddr, u16) {
        (self.bind_host, self.port)
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, RelayError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| RelayError::Config { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = RelayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.port, 3000);
        assert_eq!(config.policy, RelayPolicy::Broadcast);
    }

    #[test]
    fn reads_overrides() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("BIND_HOST", "127.0.0.1"),
            ("RELAY_POLICY", "echo"),
            ("STATIC_DIR", "/srv/whiteboard"),
            ("CHANNEL_CAPACITY", "16"),
            ("DEFAULT_ROOM", "studio"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr(), (IpAddr::from([127, 0, 0, 1]), 8080));
        assert_eq!(config.policy, RelayPolicy::Echo);
        assert_eq!(config.static_dir, PathBuf::from("/srv/whiteboard"));
        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.default_room, "studio");
    }

    #[test]
    fn rejects_bad_values() {
        for (key, value) in [
            ("PORT", "eighty"),
            ("RELAY_POLICY", "multicast"),
            ("CHANNEL_CAPACITY", "0"),
            ("BIND_HOST", "localhost:3000"),
        ] {
            let err = RelayConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(
                matches!(err, RelayError::Config { key: k, .. } if k == key),
                "{key}={value} gave {err:?}"
            );
        }
    }
}
