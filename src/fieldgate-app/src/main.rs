//! Interactive front-end for the session orchestrator.
//!
//! Maps operator input onto orchestrator commands and renders the structured
//! outcomes; the core never prints. Runs either an interactive shell or a
//! single command given on the command line.

use anyhow::{Context, Result};
use clap::Parser;
use fieldgate_core::config::Config;
use fieldgate_core::session::{
    Command, CommandOutcome, SessionOrchestrator, ShipOutcome, SpeedReport, StartVpnOutcome,
};
use fieldgate_core::throughput::SampleOrigin;
use fieldgate_core::vpn::{StartOutcome, StopOutcome};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "fieldgate",
    about = "Location-gated VPN session manager",
    version
)]
struct Args {
    /// Configuration file
    #[arg(long, default_value = "fieldgate.json")]
    config: PathBuf,
    /// Run a single command and exit instead of starting the shell
    #[arg(value_enum)]
    command: Option<CliCommand>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CliCommand {
    StartVpn,
    StopVpn,
    TestSpeed,
    SendData,
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::StartVpn => Command::StartVpn,
            CliCommand::StopVpn => Command::StopVpn,
            CliCommand::TestSpeed => Command::TestSpeed,
            CliCommand::SendData => Command::SendData,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config).context("configuration load failed")?;
    let orchestrator = SessionOrchestrator::new(config);

    if let Some(command) = args.command {
        let outcome = orchestrator
            .dispatch(command.into())
            .await
            .context("command failed")?;
        render(&outcome);
        return Ok(());
    }

    shell(&orchestrator).await
}

async fn shell(orchestrator: &SessionOrchestrator) -> Result<()> {
    println!("fieldgate - commands: start, stop, test, send, exit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match line.trim() {
            "" => continue,
            "start" => Command::StartVpn,
            "stop" => Command::StopVpn,
            "test" => Command::TestSpeed,
            "send" => Command::SendData,
            "exit" | "quit" => break,
            other => {
                println!("unknown command: {other}");
                continue;
            }
        };
        // failures abort the command, never the shell
        match orchestrator.dispatch(command).await {
            Ok(outcome) => render(&outcome),
            Err(err) => println!("Command failed: {err}"),
        }
    }

    println!("Closing down.");
    Ok(())
}

fn render(outcome: &CommandOutcome) {
    match outcome {
        CommandOutcome::VpnStart(start) => render_start(start),
        CommandOutcome::VpnStop(StopOutcome::Down) => println!("VPN stopped."),
        CommandOutcome::VpnStop(StopOutcome::Failed { stderr }) => {
            println!("Failed to stop the VPN.\n{}", stderr.trim());
        }
        CommandOutcome::SpeedTest(report) => render_report(report),
        CommandOutcome::DataSend(ship) => render_ship(ship),
    }
}

fn render_start(outcome: &StartVpnOutcome) {
    match outcome {
        StartVpnOutcome::NoFix(reason) => {
            println!("Location unknown ({reason}); VPN not started.");
        }
        StartVpnOutcome::OutsideGeofence { position } => {
            println!(
                "Coordinates {:.6}, {:.6} are outside the permitted area; VPN not started.",
                position.latitude, position.longitude
            );
        }
        StartVpnOutcome::Tunnel { position, outcome } => {
            println!(
                "Coordinates {:.6}, {:.6} are inside the permitted area.",
                position.latitude, position.longitude
            );
            match outcome {
                StartOutcome::Up { latency_ms } => {
                    println!("VPN connected. Ping time: {latency_ms} ms.");
                }
                StartOutcome::Unreachable { detail } => {
                    println!("VPN is up, but the probe went unanswered ({detail}).");
                }
                StartOutcome::Failed { stderr } => {
                    println!("Failed to connect the VPN.\n{}", stderr.trim());
                }
            }
        }
    }
}

fn render_report(report: &SpeedReport) {
    for sample in &report.samples {
        match sample.origin {
            SampleOrigin::Measured => println!(
                "Test {}: {} MB/s",
                sample.round + 1,
                sample.megabytes_per_second
            ),
            SampleOrigin::MissingMetric => println!(
                "Test {}: 0 MB/s (sender metric missing from report)",
                sample.round + 1
            ),
        }
    }
    println!(
        "Average transfer speed over {} tests: {:.1} MB/s.",
        report.samples.len(),
        report.verdict.average
    );
    if report.verdict.stable {
        println!("Link stable.");
    } else if let Some(reason) = &report.verdict.reason {
        println!("Link unstable: {reason}.");
    }
    if let Some(ship) = &report.shipped {
        render_ship(ship);
    }
}

fn render_ship(outcome: &ShipOutcome) {
    match outcome {
        ShipOutcome::Sent { stdout } => {
            if !stdout.trim().is_empty() {
                println!("{}", stdout.trim());
            }
            println!("Data sent.");
        }
        ShipOutcome::Failed { code, stderr } => {
            println!("Data transmission failed (exit {code:?}).\n{}", stderr.trim());
        }
    }
}
