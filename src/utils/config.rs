use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::client::Timing;

pub const DEFAULT_CONFIG_FILE: &str = "irc-conformance.toml";
pub const ENV_PREFIX: &str = "IRC_CONFORMANCE";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TesterConfig {
    pub server: ServerSettings,
    pub timing: TimingSettings,
    pub report: ReportSettings,
    pub scenario: ScenarioSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub address: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimingSettings {
    /// Window for replies to ordinary commands
    pub reply_window_ms: u64,
    /// Window used when asserting that nothing is sent
    pub silence_window_ms: u64,
    pub connect_timeout_ms: u64,
    pub max_line_length: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReportSettings {
    pub format: ReportFormat,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScenarioSettings {
    /// TOML scenario file; the built-in scenario runs when unset
    pub path: Option<String>,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                address: "127.0.0.1".to_string(),
                port: 6666,
            },
            timing: TimingSettings {
                reply_window_ms: 1000,
                silence_window_ms: 5000,
                connect_timeout_ms: 5000,
                max_line_length: crate::protocol::codec::MAX_LINE_LENGTH,
            },
            report: ReportSettings {
                format: ReportFormat::Text,
            },
            scenario: ScenarioSettings { path: None },
        }
    }
}

impl TesterConfig {
    pub fn load_with_defaults(path: Option<impl AsRef<Path>>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Start with defaults
        builder = builder.add_source(Config::try_from(&Self::default())?);

        // Override with file if provided
        if let Some(p) = path {
            builder = builder.add_source(File::from(p.as_ref()).required(false));
        }

        // Environment wins over both, e.g. IRC_CONFORMANCE__SERVER__PORT=6667
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.address.trim().is_empty() {
            return Err(ConfigError::Message("server.address must not be empty".into()));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Message("server.port must not be 0".into()));
        }
        if self.timing.reply_window_ms == 0 || self.timing.silence_window_ms == 0 {
            return Err(ConfigError::Message("timing windows must be positive".into()));
        }
        if self.timing.max_line_length == 0 {
            return Err(ConfigError::Message("timing.max_line_length must be positive".into()));
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.address, self.server.port)
    }

    pub fn timing(&self) -> Timing {
        Timing {
            reply_window: Duration::from_millis(self.timing.reply_window_ms),
            silence_window: Duration::from_millis(self.timing.silence_window_ms),
            connect_timeout: Duration::from_millis(self.timing.connect_timeout_ms),
            max_line_length: self.timing.max_line_length,
        }
    }
}
