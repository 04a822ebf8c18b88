//! Scenario description: an ordered list of named, scored steps.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConformanceError, Result};
use crate::utils::validation::{
    validate_channel_name, validate_client_label, validate_message, validate_nickname,
};

static STANDARD_SCENARIO: &str = include_str!("../../scenarios/standard.toml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<TestStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStep {
    pub name: String,
    #[serde(default = "default_points")]
    pub points: u32,
    /// Label of the client the check runs on
    pub client: String,
    /// Overrides the configured window for this step's check
    #[serde(default)]
    pub window_ms: Option<u64>,
    #[serde(default)]
    pub setup: Vec<SetupOp>,
    pub check: Check,
}

fn default_points() -> u32 {
    1
}

/// An unscored action run before a step's check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupOp {
    pub client: String,
    #[serde(flatten)]
    pub action: ClientAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ClientAction {
    Connect,
    Disconnect,
    /// One command; the delimiter is appended
    Send { line: String },
    /// Bytes as given, no delimiter
    SendRaw { data: String },
    /// `count` copies of `fill` followed by `tail`, in a single write
    Flood {
        count: usize,
        #[serde(default = "default_fill")]
        fill: char,
        #[serde(default)]
        tail: String,
    },
    Nick { nick: String },
    User {
        username: String,
        hostname: String,
        servername: String,
        realname: String,
    },
    Privmsg { target: String, text: String },
    /// JOIN and drop whatever comes back
    Join { channel: String },
    /// Collect one reply window and drop it
    Ignore,
}

fn default_fill() -> char {
    '0'
}

impl ClientAction {
    /// Payload for `Flood`.
    pub fn flood_payload(count: usize, fill: char, tail: &str) -> String {
        let mut payload: String = std::iter::repeat(fill).take(count).collect();
        payload.push_str(tail);
        payload
    }
}

/// The scored expectation of a step. `from` fields name another client by
/// label; its nickname at the time of the check is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "expect", rename_all = "snake_case")]
pub enum Check {
    Silence,
    Motd,
    Join { channel: String },
    Who { mask: String, username: String },
    List { channel: String, users: u32 },
    Message { from: String, to: String, text: String },
    MultiMessage { from: String, targets: Vec<String>, text: String },
    EchoJoin { from: String, channel: String },
    Part { channel: String },
    PartEcho { from: String },
    ErroneousNick { nick: String },
    NickInUse { nick: String },
    NoNickGiven,
    NeedMoreParams { command: String },
    AlreadyRegistered,
    NoSuchChannel { command: String, channel: String },
    NotOnChannel { channel: String },
    NoRecipient,
    NoTextToSend { target: String },
    NoSuchTargets { targets: Vec<String> },
}

impl Check {
    /// Client labels this check refers to besides the step's own client.
    pub fn peer(&self) -> Option<&str> {
        match self {
            Check::Message { from, .. }
            | Check::MultiMessage { from, .. }
            | Check::EchoJoin { from, .. }
            | Check::PartEcho { from } => Some(from.as_str()),
            _ => None,
        }
    }

    /// Silence checks wait for the longer silence window.
    pub fn is_silence(&self) -> bool {
        matches!(self, Check::Silence)
    }
}

impl Scenario {
    /// The scenario shipped with the binary.
    pub fn standard() -> Result<Self> {
        Self::from_toml(STANDARD_SCENARIO)
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(source)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|source| ConformanceError::ScenarioFile {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_toml(&source)
    }

    /// Sum of every step's points, whether or not a run reaches it.
    pub fn max_score(&self) -> u32 {
        self.steps
            .iter()
            .fold(0u32, |total, step| total.saturating_add(step.points))
    }

    /// Walks the steps in order, tracking which clients are connected, and
    /// rejects anything that could only fail at run time for reasons that
    /// have nothing to do with the server.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(invalid(format!("scenario '{}' has no steps", self.name)));
        }

        let mut names = HashSet::new();
        let mut known = HashSet::new();
        let mut connected = HashSet::new();
        let mut total: u32 = 0;

        for step in &self.steps {
            if step.name.trim().is_empty() {
                return Err(invalid("step with an empty name".to_string()));
            }
            total = total.checked_add(step.points).ok_or_else(|| {
                invalid(format!(
                    "step '{}': total points exceed {}",
                    step.name,
                    u32::MAX
                ))
            })?;
            if !names.insert(step.name.as_str()) {
                return Err(invalid(format!("duplicate step name '{}'", step.name)));
            }

            for op in &step.setup {
                if !validate_client_label(&op.client) {
                    return Err(invalid(format!(
                        "step '{}': bad client label '{}'",
                        step.name, op.client
                    )));
                }
                match &op.action {
                    ClientAction::Connect => {
                        known.insert(op.client.as_str());
                        connected.insert(op.client.as_str());
                        continue;
                    }
                    ClientAction::Disconnect => {
                        connected.remove(op.client.as_str());
                        continue;
                    }
                    _ => {}
                }
                if !connected.contains(op.client.as_str()) {
                    return Err(invalid(format!(
                        "step '{}': client '{}' is used before it connects",
                        step.name, op.client
                    )));
                }
                validate_action(&step.name, &op.action)?;
            }

            if !connected.contains(step.client.as_str()) {
                return Err(invalid(format!(
                    "step '{}': client '{}' is not connected",
                    step.name, step.client
                )));
            }
            if let Some(peer) = step.check.peer() {
                if !known.contains(peer) {
                    return Err(invalid(format!(
                        "step '{}': unknown client '{}'",
                        step.name, peer
                    )));
                }
            }
            validate_check(&step.name, &step.check)?;
        }

        Ok(())
    }
}

fn invalid(reason: String) -> ConformanceError {
    ConformanceError::Scenario(reason)
}

fn validate_action(step: &str, action: &ClientAction) -> Result<()> {
    match action {
        ClientAction::Nick { nick } if !validate_nickname(nick) => Err(invalid(format!(
            "step '{step}': '{nick}' is not a valid nickname"
        ))),
        ClientAction::Join { channel } if !validate_channel_name(channel) => Err(invalid(
            format!("step '{step}': '{channel}' is not a valid channel"),
        )),
        ClientAction::Send { line } if !validate_message(line) => Err(invalid(format!(
            "step '{step}': a send line must not contain line breaks"
        ))),
        ClientAction::Privmsg { text, .. } if !validate_message(text) => Err(invalid(format!(
            "step '{step}': message text must not contain line breaks"
        ))),
        _ => Ok(()),
    }
}

fn validate_check(step: &str, check: &Check) -> Result<()> {
    match check {
        Check::Join { channel } if !validate_channel_name(channel) => Err(invalid(format!(
            "step '{step}': '{channel}' is not a valid channel"
        ))),
        Check::MultiMessage { targets, .. } if targets.len() != 2 => Err(invalid(format!(
            "step '{step}': multi_message takes exactly two targets, got {}",
            targets.len()
        ))),
        Check::NoSuchTargets { targets } if targets.is_empty() => Err(invalid(format!(
            "step '{step}': no_such_targets needs at least one target"
        ))),
        _ => Ok(()),
    }
}
