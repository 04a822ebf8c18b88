use std::error::Error;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use irc_conformance::orchestrator::{ConsoleReporter, JsonReporter, Reporter};
use irc_conformance::utils::config::{ReportFormat, DEFAULT_CONFIG_FILE};
use irc_conformance::{Orchestrator, Scenario, TesterConfig};

const USAGE: &str = "Usage: irc-conformance [servAddr] [servPort] [scenario.toml]";

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "irc_conformance=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = TesterConfig::load_with_defaults(Some(DEFAULT_CONFIG_FILE))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        println!("{USAGE}");
    }
    if let Some(address) = args.first() {
        config.server.address = address.clone();
    }
    if let Some(port) = args.get(1) {
        config.server.port = match port.parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                println!("The port number must be an integer!");
                return Ok(ExitCode::from(2));
            }
        };
    }
    if let Some(path) = args.get(2) {
        config.scenario.path = Some(path.clone());
    }
    config.validate()?;

    let scenario = match &config.scenario.path {
        Some(path) => Scenario::load(path)?,
        None => Scenario::standard()?,
    };

    let addr = config.server_addr();
    println!("Server address - {addr}");
    info!("Running scenario '{}' against {}", scenario.name, addr);

    let reporter: Box<dyn Reporter> = match config.report.format {
        ReportFormat::Text => Box::new(ConsoleReporter::stdout()),
        ReportFormat::Json => Box::new(JsonReporter::stdout()),
    };

    let mut orchestrator = Orchestrator::new(addr, config.timing(), reporter);
    let outcome = orchestrator.run(&scenario).await;

    if outcome.status.is_completed() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("Run aborted with score {} / {}", outcome.score, outcome.max_score);
        Ok(ExitCode::FAILURE)
    }
}
