//! Black-box conformance tester for IRC servers.
//!
//! Simulated clients drive a scripted conversation against a running
//! server and check each reply against the expected grammar. A run stops
//! at the first failed step and reports the score earned up to it.

pub mod assertions;
pub mod client;
pub mod error;
pub mod orchestrator;
pub mod protocol;
pub mod utils;

pub use crate::assertions::Verdict;
pub use crate::client::{SimulatedClient, Timing};
pub use crate::error::{ConformanceError, Result};
pub use crate::orchestrator::{
    Orchestrator, Reporter, RunOutcome, RunState, RunStatus, Scenario, StepEvent,
};
pub use crate::utils::config::TesterConfig;
