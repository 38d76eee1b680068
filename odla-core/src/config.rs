use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use odla_net::{Endpoint, Protocol, DEFAULT_RECONNECT_INTERVAL, DEFAULT_SERVER_NAME};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    link: LinkConfig,
    #[serde(default)]
    driver: DriverConfig,
}

#[derive(Deserialize, Default)]
struct LinkConfig {
    mode: Option<String>,
    endpoint: Option<String>,
    listen_addr: Option<String>,
    protocol: Option<String>,
    post_state: Option<bool>,
    reconnect_interval_ms: Option<u64>,
}

#[derive(Deserialize, Default)]
struct DriverConfig {
    raise_window: Option<bool>,
    default_bpm: Option<u16>,
}

/// Which side opens the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkMode {
    /// Dial the device companion and keep redialing while it is down.
    #[default]
    Connect,
    /// Accept device companions on a TCP address.
    Listen,
}

/// Settings the driver reads on every dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSettings {
    pub raise_window: bool,
    pub default_bpm: u16,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            raise_window: true,
            default_bpm: 120,
        }
    }
}

pub struct Config {
    link: LinkConfig,
    driver: DriverConfig,
}

impl Config {
    pub fn load() -> Self {
        Self::load_with_user(user_config_path().as_deref())
    }

    /// Embedded defaults overridden by the file at `user`, when it exists.
    pub fn load_with_user(user: Option<&Path>) -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user {
            if path.exists() {
                match std::fs::read_to_string(path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_link(&mut base.link, user.link);
                            merge_driver(&mut base.driver, user.driver);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            link: base.link,
            driver: base.driver,
        }
    }

    pub fn link_mode(&self) -> LinkMode {
        self.link
            .mode
            .as_deref()
            .and_then(parse_link_mode)
            .unwrap_or_default()
    }

    /// Endpoint dialed in connect mode. Anything with a port is TCP.
    pub fn endpoint(&self) -> Endpoint {
        let raw = self.link.endpoint.as_deref().unwrap_or(DEFAULT_SERVER_NAME);
        parse_endpoint(raw)
    }

    pub fn listen_addr(&self) -> &str {
        self.link.listen_addr.as_deref().unwrap_or("127.0.0.1:7789")
    }

    pub fn protocol(&self) -> Protocol {
        let protocol = match self.link.protocol.as_deref() {
            Some(name) => name.parse().unwrap_or_else(|e| {
                log::warn!(target: "config", "{}, using binary", e);
                Protocol::Binary
            }),
            None => Protocol::Binary,
        };
        if protocol == Protocol::Binary && self.link.post_state.unwrap_or(false) {
            Protocol::BinaryPostState
        } else {
            protocol
        }
    }

    /// Fixed delay between connection attempts (clamped to 100ms..60s).
    pub fn reconnect_interval(&self) -> Duration {
        self.link
            .reconnect_interval_ms
            .map(|ms| Duration::from_millis(ms.clamp(100, 60_000)))
            .unwrap_or(DEFAULT_RECONNECT_INTERVAL)
    }

    pub fn driver_settings(&self) -> DriverSettings {
        let fallback = DriverSettings::default();
        DriverSettings {
            raise_window: self.driver.raise_window.unwrap_or(fallback.raise_window),
            default_bpm: self
                .driver
                .default_bpm
                .filter(|bpm| *bpm > 0)
                .unwrap_or(fallback.default_bpm),
        }
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("odla").join("config.toml"))
}

fn merge_link(base: &mut LinkConfig, user: LinkConfig) {
    if user.mode.is_some() {
        base.mode = user.mode;
    }
    if user.endpoint.is_some() {
        base.endpoint = user.endpoint;
    }
    if user.listen_addr.is_some() {
        base.listen_addr = user.listen_addr;
    }
    if user.protocol.is_some() {
        base.protocol = user.protocol;
    }
    if user.post_state.is_some() {
        base.post_state = user.post_state;
    }
    if user.reconnect_interval_ms.is_some() {
        base.reconnect_interval_ms = user.reconnect_interval_ms;
    }
}

fn merge_driver(base: &mut DriverConfig, user: DriverConfig) {
    if user.raise_window.is_some() {
        base.raise_window = user.raise_window;
    }
    if user.default_bpm.is_some() {
        base.default_bpm = user.default_bpm;
    }
}

fn parse_link_mode(s: &str) -> Option<LinkMode> {
    match s {
        "connect" => Some(LinkMode::Connect),
        "listen" => Some(LinkMode::Listen),
        _ => None,
    }
}

pub fn parse_endpoint(s: &str) -> Endpoint {
    match s.strip_prefix("tcp:") {
        Some(addr) => Endpoint::Tcp(addr.to_string()),
        None if s.rsplit_once(':').is_some_and(|(_, port)| port.parse::<u16>().is_ok()) => {
            Endpoint::Tcp(s.to_string())
        }
        None => Endpoint::Local(s.strip_prefix("local:").unwrap_or(s).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_embedded_config() {
        let config = Config::load_with_user(None);
        assert_eq!(config.link_mode(), LinkMode::Connect);
        assert_eq!(config.endpoint(), Endpoint::Local("ODLA_MSCORE_SERVER".into()));
        assert_eq!(config.listen_addr(), "127.0.0.1:7789");
        assert_eq!(config.protocol(), Protocol::Binary);
        assert_eq!(config.reconnect_interval(), Duration::from_millis(2000));
        assert_eq!(config.driver_settings(), DriverSettings::default());
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[link]\nmode = \"listen\"\nprotocol = \"text\"\nreconnect_interval_ms = 5\n\n[driver]\ndefault_bpm = 90"
        )
        .unwrap();

        let config = Config::load_with_user(Some(file.path()));
        assert_eq!(config.link_mode(), LinkMode::Listen);
        assert_eq!(config.protocol(), Protocol::Text);
        // Clamped
        assert_eq!(config.reconnect_interval(), Duration::from_millis(100));
        assert_eq!(config.driver_settings().default_bpm, 90);
        // Untouched keys keep their defaults
        assert!(config.driver_settings().raise_window);
        assert_eq!(config.listen_addr(), "127.0.0.1:7789");
    }

    #[test]
    fn test_malformed_user_file_is_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[link\nmode = ").unwrap();

        let config = Config::load_with_user(Some(file.path()));
        assert_eq!(config.link_mode(), LinkMode::Connect);
    }

    #[test]
    fn test_post_state_selects_binary_revision() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[link]\npost_state = true").unwrap();

        let config = Config::load_with_user(Some(file.path()));
        assert_eq!(config.protocol(), Protocol::BinaryPostState);
    }

    #[test]
    fn test_parse_endpoint() {
        assert_eq!(parse_endpoint("127.0.0.1:7789"), Endpoint::Tcp("127.0.0.1:7789".into()));
        assert_eq!(parse_endpoint("tcp:device.local:9"), Endpoint::Tcp("device.local:9".into()));
        assert_eq!(parse_endpoint("ODLA_MSCORE_SERVER"), Endpoint::Local("ODLA_MSCORE_SERVER".into()));
        assert_eq!(parse_endpoint("local:odla"), Endpoint::Local("odla".into()));
    }
}
