//! Runs a scenario step by step across several simulated clients.
//!
//! Steps never overlap. The first failed check or fault stops the run,
//! and every connected client is disconnected before the outcome is
//! reported, whichever way the run ended.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::assertions::Verdict;
use crate::client::{SimulatedClient, Timing};
use crate::error::{ConformanceError, Result};

pub mod report;
pub mod scenario;

pub use self::report::{ConsoleReporter, JsonReporter, Reporter, TracingReporter};
pub use self::scenario::{Check, ClientAction, Scenario, SetupOp, TestStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AbortReason {
    /// The server's reply did not match
    Failed(String),
    /// The step could not be carried out at all
    Fault(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Aborted { step: String, reason: AbortReason },
    /// The scenario was refused before any step ran
    Rejected { reason: String },
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }
}

/// Pass/fail event for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepEvent {
    pub step: String,
    pub passed: bool,
    pub explanation: String,
    /// Points awarded by this step
    pub points: u32,
    /// Running total after this step
    pub score: u32,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub score: u32,
    pub max_score: u32,
    pub steps_run: usize,
    pub status: RunStatus,
}

/// Score bookkeeping for one run, free of any I/O.
///
/// Points are only ever added, and nothing is recorded once the run has
/// left `Running`.
#[derive(Debug, Clone)]
pub struct RunLedger {
    state: RunState,
    score: u32,
    steps_run: usize,
    aborted: Option<(String, AbortReason)>,
    rejected: Option<String>,
}

impl Default for RunLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLedger {
    pub fn new() -> Self {
        Self {
            state: RunState::NotStarted,
            score: 0,
            steps_run: 0,
            aborted: None,
            rejected: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn steps_run(&self) -> usize {
        self.steps_run
    }

    pub fn start(&mut self) {
        if self.state == RunState::NotStarted {
            self.state = RunState::Running;
        }
    }

    /// Records a step's verdict. Returns whether the run goes on.
    pub fn record(&mut self, step: &str, points: u32, verdict: &Verdict) -> bool {
        if self.state != RunState::Running {
            return false;
        }
        self.steps_run += 1;

        match verdict {
            Verdict::Pass(_) => {
                self.score = self.score.saturating_add(points);
                true
            }
            Verdict::Fail(explanation) => {
                self.abort(step, AbortReason::Failed(explanation.clone()));
                false
            }
        }
    }

    /// A step that could not be carried out. Always stops the run.
    pub fn fault(&mut self, step: &str, error: &ConformanceError) {
        if self.state == RunState::Running {
            self.steps_run += 1;
        }
        self.abort(step, AbortReason::Fault(error.to_string()));
    }

    /// Refuses a run that has not started. No step is charged for it.
    pub fn reject(&mut self, error: &ConformanceError) {
        if self.state != RunState::NotStarted {
            return;
        }
        self.state = RunState::Aborted;
        self.rejected = Some(error.to_string());
    }

    fn abort(&mut self, step: &str, reason: AbortReason) {
        if matches!(self.state, RunState::Completed | RunState::Aborted) {
            return;
        }
        self.state = RunState::Aborted;
        self.aborted = Some((step.to_string(), reason));
    }

    /// Moves a run that is still going to `Completed` and returns the
    /// terminal status.
    pub fn finish(&mut self) -> RunStatus {
        if matches!(self.state, RunState::NotStarted | RunState::Running) {
            self.state = RunState::Completed;
        }
        if let Some(reason) = &self.rejected {
            return RunStatus::Rejected {
                reason: reason.clone(),
            };
        }
        match &self.aborted {
            Some((step, reason)) => RunStatus::Aborted {
                step: step.clone(),
                reason: reason.clone(),
            },
            None => RunStatus::Completed,
        }
    }
}

pub struct Orchestrator<R: Reporter> {
    addr: String,
    timing: Timing,
    clients: BTreeMap<String, SimulatedClient>,
    reporter: R,
}

impl<R: Reporter> Orchestrator<R> {
    pub fn new(addr: impl Into<String>, timing: Timing, reporter: R) -> Self {
        Self {
            addr: addr.into(),
            timing,
            clients: BTreeMap::new(),
            reporter,
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn client(&self, label: &str) -> Option<&SimulatedClient> {
        self.clients.get(label)
    }

    pub async fn run(&mut self, scenario: &Scenario) -> RunOutcome {
        let run_id = Uuid::new_v4();
        let max_score = scenario.max_score();
        let mut ledger = RunLedger::new();

        info!(
            "Run {} of scenario '{}' against {} ({} steps)",
            run_id,
            scenario.name,
            self.addr,
            scenario.steps.len()
        );

        if let Err(e) = scenario.validate() {
            warn!("Scenario '{}' rejected: {}", scenario.name, e);
            ledger.reject(&e);
        } else {
            ledger.start();
            for step in &scenario.steps {
                if !self.execute(step, &mut ledger).await {
                    break;
                }
            }
        }

        self.cleanup().await;

        let outcome = RunOutcome {
            run_id,
            score: ledger.score(),
            max_score,
            steps_run: ledger.steps_run(),
            status: ledger.finish(),
        };
        self.reporter.run_finished(&outcome);
        outcome
    }

    async fn execute(&mut self, step: &TestStep, ledger: &mut RunLedger) -> bool {
        self.reporter.step_started(&step.name);

        let (passed, explanation, proceed) = match self.run_step(step).await {
            Ok(verdict) => {
                let proceed = ledger.record(&step.name, step.points, &verdict);
                (verdict.is_pass(), verdict.explanation().to_string(), proceed)
            }
            Err(e) => {
                ledger.fault(&step.name, &e);
                (false, e.to_string(), false)
            }
        };

        if passed {
            info!("(+) {} passed: {}", step.name, explanation);
        } else {
            warn!("(-) {} failed: {}", step.name, explanation);
        }

        let event = StepEvent {
            step: step.name.clone(),
            passed,
            explanation,
            points: if passed { step.points } else { 0 },
            score: ledger.score(),
            at: Utc::now(),
        };
        self.reporter.step_finished(&event);

        proceed
    }

    async fn run_step(&mut self, step: &TestStep) -> Result<Verdict> {
        for op in &step.setup {
            self.apply(op).await?;
        }

        let window = match step.window_ms {
            Some(ms) => Duration::from_millis(ms),
            None if step.check.is_silence() => self.timing.silence_window,
            None => self.timing.reply_window,
        };
        let from = match step.check.peer() {
            Some(label) => self.peer_nick(label)?,
            None => String::new(),
        };
        let client = self.client_mut(&step.client)?;

        match &step.check {
            Check::Silence => client.test_silence(window).await,
            Check::Motd => client.get_motd(window).await,
            Check::Join { channel } => client.join_channel(channel, window).await,
            Check::Who { mask, username } => client.who(mask, username, window).await,
            Check::List { channel, users } => client.list(channel, *users, window).await,
            Check::Message { to, text, .. } => client.check_msg(&from, to, text, window).await,
            Check::MultiMessage { targets, text, .. } => match targets.as_slice() {
                [first, second] => {
                    client
                        .check_two_msgs(&from, first, second, text, window)
                        .await
                }
                _ => Err(ConformanceError::Scenario(format!(
                    "step '{}' needs exactly two targets",
                    step.name
                ))),
            },
            Check::EchoJoin { channel, .. } => client.check_echo_join(&from, channel, window).await,
            Check::Part { channel } => client.part_channel(channel, window).await,
            Check::PartEcho { .. } => client.check_part(&from, window).await,
            Check::ErroneousNick { nick } => client.invalid_nick(nick, window).await,
            Check::NickInUse { nick } => client.used_nick(nick, window).await,
            Check::NoNickGiven => client.no_nick(window).await,
            Check::NeedMoreParams { command } => client.less_params(command, window).await,
            Check::AlreadyRegistered => client.reset_user(window).await,
            Check::NoSuchChannel { command, channel } => {
                client.invalid_chan(command, channel, window).await
            }
            Check::NotOnChannel { channel } => client.not_on_chan(channel, window).await,
            Check::NoRecipient => client.no_recipient(window).await,
            Check::NoTextToSend { target } => client.no_text(target, window).await,
            Check::NoSuchTargets { targets } => client.nonexistent_targets(targets, window).await,
        }
    }

    async fn apply(&mut self, op: &SetupOp) -> Result<()> {
        let window = self.timing.reply_window;

        if op.action == ClientAction::Connect && !self.clients.contains_key(&op.client) {
            let client = SimulatedClient::new(op.client.clone(), self.addr.clone(), self.timing);
            self.clients.insert(op.client.clone(), client);
        }

        let client = self.client_mut(&op.client)?;
        match &op.action {
            ClientAction::Connect => client.connect().await,
            ClientAction::Disconnect => {
                client.disconnect().await;
                Ok(())
            }
            ClientAction::Send { line } => client.send(line).await,
            ClientAction::SendRaw { data } => client.send_raw(data.as_bytes()).await,
            ClientAction::Flood { count, fill, tail } => {
                let payload = ClientAction::flood_payload(*count, *fill, tail);
                client.send_raw(payload.as_bytes()).await
            }
            ClientAction::Nick { nick } => client.send_nick(nick).await,
            ClientAction::User {
                username,
                hostname,
                servername,
                realname,
            } => {
                client
                    .send_user(username, hostname, servername, realname)
                    .await
            }
            ClientAction::Privmsg { target, text } => client.send_privmsg(target, text).await,
            ClientAction::Join { channel } => client.raw_join_channel(channel, window).await,
            ClientAction::Ignore => client.ignore_reply(window).await,
        }
    }

    fn client_mut(&mut self, label: &str) -> Result<&mut SimulatedClient> {
        self.clients
            .get_mut(label)
            .ok_or_else(|| ConformanceError::UnknownClient(label.to_string()))
    }

    /// The current nickname of another client, used as an expected sender.
    fn peer_nick(&self, label: &str) -> Result<String> {
        let client = self
            .clients
            .get(label)
            .ok_or_else(|| ConformanceError::UnknownClient(label.to_string()))?;
        client
            .nick()
            .map(str::to_string)
            .ok_or_else(|| ConformanceError::Scenario(format!("client {label} has no nickname")))
    }

    async fn cleanup(&mut self) {
        for client in self.clients.values_mut() {
            if client.is_connected() {
                client.disconnect().await;
            }
        }
    }
}
