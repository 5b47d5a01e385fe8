use failure::Fail;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Fail)]
pub enum ConfigError {
    #[fail(display = "Can not read config `{}`: {}", _0, _1)]
    Read(String, #[cause] io::Error),
    #[fail(display = "Invalid config `{}`: {}", _0, _1)]
    Parse(String, #[cause] toml::de::Error),
    #[fail(display = "Invalid config: {}", _0)]
    Invalid(String),
}

/// Terminal configuration, read from a TOML file. Every field has a default,
/// so an empty file (or no file at all) describes the stock wiring.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sensor: SensorConfig,
    pub server: ServerConfig,
    pub link: LinkConfig,
    pub outputs: OutputConfig,
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorConfig {
    /// Serial device; probe the usual ports when unset.
    pub port: Option<PathBuf>,
    pub baud: u32,
    pub address: u32,
    pub password: u32,
    /// Number of library slots; ids run `1..=capacity`.
    pub capacity: u16,
    /// How long to wait for a reply packet.
    pub reply_timeout_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: fpm_rs::DEFAULT_BAUD,
            address: fpm_rs::DEFAULT_ADDRESS,
            password: fpm_rs::DEFAULT_PASSWORD,
            capacity: fpm_rs::DEFAULT_CAPACITY,
            reply_timeout_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enroll_path: String,
    pub login_path: String,
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.12".to_string(),
            port: 8000,
            enroll_path: "/fingerprint_enroll".to_string(),
            login_path: "/fingerprint_login".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl ServerConfig {
    pub fn url(&self, path: &str) -> String {
        let separator = if path.starts_with('/') { "" } else { "/" };

        format!("http://{}:{}{}{}", self.host, self.port, separator, path)
    }

    pub fn enroll_url(&self) -> String {
        self.url(&self.enroll_path)
    }

    pub fn login_url(&self) -> String {
        self.url(&self.login_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkConfig {
    /// Network interface that must be up before reporting, e.g. `wlan0`.
    /// When unset the link is assumed to be up.
    pub interface: Option<String>,
    pub connect_attempts: u32,
    pub connect_interval_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            interface: None,
            connect_attempts: 20,
            connect_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// GPIO line of the door relay; log-only when unset.
    pub relay_gpio: Option<u32>,
    pub relay_active_low: bool,
    /// GPIO line of the feedback LED; log-only when unset.
    pub status_led_gpio: Option<u32>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            relay_gpio: None,
            relay_active_low: true,
            status_led_gpio: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub finger_timeout_ms: u64,
    pub removal_timeout_ms: u64,
    /// Pause after asking for the finger to be lifted, before polling.
    pub removal_settle_ms: u64,
    pub poll_interval_ms: u64,
    pub relay_hold_ms: u64,
    /// How long a success or failure colour stays on the sensor ring.
    pub feedback_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            finger_timeout_ms: 10_000,
            removal_timeout_ms: 5_000,
            removal_settle_ms: 1_000,
            poll_interval_ms: 50,
            relay_hold_ms: 3_000,
            feedback_ms: 1_000,
        }
    }
}

impl TimingConfig {
    /// All waits zero and all timeouts short, for driving the loop against a
    /// simulated module.
    pub fn instant() -> Self {
        Self {
            finger_timeout_ms: 20,
            removal_timeout_ms: 20,
            removal_settle_ms: 0,
            poll_interval_ms: 0,
            relay_hold_ms: 0,
            feedback_ms: 0,
        }
    }

    pub fn finger_timeout(&self) -> Duration {
        Duration::from_millis(self.finger_timeout_ms)
    }

    pub fn removal_timeout(&self) -> Duration {
        Duration::from_millis(self.removal_timeout_ms)
    }

    pub fn removal_settle(&self) -> Duration {
        Duration::from_millis(self.removal_settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn relay_hold(&self) -> Duration {
        Duration::from_millis(self.relay_hold_ms)
    }

    pub fn feedback(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }
}

impl Config {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e))?;
        let config = Self::from_toml(&content)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e))?;
        config.validate()?;
        log::info!("Config loaded from: {}", path.display());

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor.capacity == 0 {
            return Err(ConfigError::Invalid("sensor.capacity must be at least 1".into()));
        }
        if self.server.host.is_empty() {
            return Err(ConfigError::Invalid("server.host is empty".into()));
        }

        Ok(())
    }
}
