//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Minutes between pledge page checks
    #[serde(default = "default_delay_minutes")]
    pub delay_minutes: u64,

    /// Print a message before each wait
    #[serde(default)]
    pub verbose: bool,

    /// Seconds to wait after a failed fetch before trying again
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Seconds to wait after the last notification before exiting
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Mail relay used by the email notifier
    #[serde(default)]
    pub smtp: SmtpConfig,
}

fn default_delay_minutes() -> u64 {
    1
}

fn default_retry_delay_secs() -> u64 {
    60
}

fn default_grace_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delay_minutes: default_delay_minutes(),
            verbose: false,
            retry_delay_secs: default_retry_delay_secs(),
            grace_secs: default_grace_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            proxy: None,
            smtp: SmtpConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("ks-watch").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(delay) = std::env::var("KSWATCH_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_minutes = d;
            }
        }

        if let Ok(proxy) = std::env::var("KSWATCH_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(password) = std::env::var("KSWATCH_SMTP_PASSWORD") {
            self.smtp.password = Some(password);
        }

        if let Ok(tls) = std::env::var("KSWATCH_SMTP_TLS") {
            match tls.parse::<TlsMode>() {
                Ok(mode) => self.smtp.tls = mode,
                Err(e) => warn!("Ignoring KSWATCH_SMTP_TLS: {}", e),
            }
        }

        self
    }

    /// Interval between polling cycles. Never shorter than one minute.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(60 * self.delay_minutes.max(1))
    }

    /// Delay between fetch attempts after a transport failure.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Pause after the final notification.
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

/// SMTP relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_server")]
    pub server: String,

    /// Port; `None` uses the default for the TLS mode
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default = "default_sender")]
    pub sender: String,

    #[serde(default = "default_receiver")]
    pub receiver: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub tls: TlsMode,
}

fn default_smtp_server() -> String {
    "localhost".to_string()
}

fn default_sender() -> String {
    "kswatch@kswatch".to_string()
}

fn default_receiver() -> String {
    "youremail@yourprovider.com".to_string()
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: default_smtp_server(),
            port: None,
            sender: default_sender(),
            receiver: default_receiver(),
            username: None,
            password: None,
            tls: TlsMode::None,
        }
    }
}

/// Transport security for the SMTP connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain connection
    #[default]
    None,
    /// Upgrade with STARTTLS
    Starttls,
    /// TLS from the first byte (SMTPS)
    Implicit,
}

impl TlsMode {
    /// Conventional port for this mode.
    pub fn default_port(&self) -> u16 {
        match self {
            TlsMode::None => 25,
            TlsMode::Starttls => 587,
            TlsMode::Implicit => 465,
        }
    }
}

impl std::str::FromStr for TlsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "plain" => Ok(TlsMode::None),
            "starttls" => Ok(TlsMode::Starttls),
            "implicit" | "tls" | "smtps" => Ok(TlsMode::Implicit),
            _ => Err(format!("Unknown TLS mode: {}. Use: none, starttls, implicit", s)),
        }
    }
}
