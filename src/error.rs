//! Error handling for the conformance tester

use thiserror::Error;

/// Faults that stop a run. A reply that does not match the expected
/// grammar is not one of these; that is a failed `Verdict`.
#[derive(Error, Debug)]
pub enum ConformanceError {
    /// Network/connection error
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Client {0} is not connected")]
    NotConnected(String),

    #[error("Unknown client: {0}")]
    UnknownClient(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Cannot read scenario {path}: {source}")]
    ScenarioFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed scenario file: {0}")]
    ScenarioFormat(#[from] toml::de::Error),

    #[error("Invalid scenario: {0}")]
    Scenario(String),

    /// The server sent something the line framing cannot accept
    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, ConformanceError>;
