use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use omni_bridge::config::BridgeConfig;
use omni_bridge::logging::init_logging;
use omni_bridge::signal::SignalValidator;
use omni_bridge::telemetry::TelemetryHub;
use serde::Serialize;

#[cfg(not(target_os = "android"))]
use omni_bridge::platform::{parse_script, DesktopHost, RunSummary};
#[cfg(not(target_os = "android"))]
use omni_bridge::{DemoRuntime, SurfaceBridge};

const DEFAULT_SCRIPT: &str = "created,resume,frame*10,pause,frame*2,resume,frame*10,terminate";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.into());
    match cli.execute() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("omni-bridge error: {err:?}");
            ExitCode::from(1)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "omni-bridge",
    about = "Headless harness for the surface lifecycle bridge"
)]
struct Cli {
    /// Log verbosity written to stderr.
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn execute(self) -> Result<ExitCode> {
        match self.command {
            Command::Run(args) => run_command(args),
            Command::Signals(args) => signals_command(args),
            Command::Config(args) => config_command(args),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a lifecycle script against the demo runtime.
    Run(RunArgs),
    /// Feed values through the monotonic validator.
    Signals(SignalsArgs),
    /// Print the effective configuration as JSON.
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// JSON config file (defaults to OMNI_BRIDGE_CONFIG or assets/bridge_config.json).
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> BridgeConfig {
        match &self.config {
            Some(path) => BridgeConfig::load_from_file(path),
            None => load_platform_config(),
        }
    }
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Comma-separated events: created, resume, pause, frame, frame*N, terminate.
    #[arg(long, default_value = DEFAULT_SCRIPT)]
    script: String,
    /// Override the demo app's per-update signal step.
    #[arg(long, allow_negative_numbers = true)]
    signal_step: Option<f32>,
    /// Override how many engines the demo runtime may create.
    #[arg(long)]
    engine_budget: Option<u32>,
    /// Output format for the run summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
struct SignalsArgs {
    /// Values in delivery order.
    #[arg(required = true, allow_negative_numbers = true)]
    values: Vec<f32>,
    /// Starting high-water mark.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    initial: f32,
    /// Output format for the verdicts.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[cfg(not(target_os = "android"))]
fn load_platform_config() -> BridgeConfig {
    BridgeConfig::load()
}

#[cfg(target_os = "android")]
fn load_platform_config() -> BridgeConfig {
    BridgeConfig::load_android()
}

#[cfg(not(target_os = "android"))]
fn run_command(args: RunArgs) -> Result<ExitCode> {
    let mut config = args.config.load();
    if let Some(step) = args.signal_step {
        config.demo.signal_step = step;
    }
    if let Some(budget) = args.engine_budget {
        config.demo.engine_budget = Some(budget);
    }
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;

    let events = parse_script(&args.script).context("parsing --script")?;
    let bridge = SurfaceBridge::new(DemoRuntime::new(config.demo.clone()), &config);
    let mut host = DesktopHost::new(bridge);
    let summary = host.run(&events);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(&summary),
    }

    Ok(exit_code(summary.exit_status))
}

#[cfg(target_os = "android")]
fn run_command(_args: RunArgs) -> Result<ExitCode> {
    anyhow::bail!("the run harness is only available on desktop targets")
}

#[cfg(not(target_os = "android"))]
fn print_summary(summary: &RunSummary) {
    println!("events applied : {}", summary.events_applied);
    println!("frames drawn   : {}", summary.frames_drawn);
    println!("updates issued : {}", summary.updates_issued);
    println!("final state    : {}", summary.final_state);
    println!("high-water mark: {}", summary.high_water_mark);
    println!("signals        : {}", summary.signals_accepted);
    println!(
        "telemetry      : {} events ({} dropped from history)",
        summary.telemetry.total_events, summary.telemetry.dropped_events
    );
    if let Some(fatal) = &summary.fatal {
        println!("fatal          : {}", fatal);
    }
}

#[derive(Serialize)]
struct SignalVerdict {
    value: f32,
    accepted: bool,
    high_water_mark: f32,
}

#[derive(Serialize)]
struct SignalsReport {
    verdicts: Vec<SignalVerdict>,
    high_water_mark: f32,
    exit_status: i32,
}

fn signals_command(args: SignalsArgs) -> Result<ExitCode> {
    let validator = SignalValidator::new(args.initial, Arc::new(TelemetryHub::default()));
    let mut verdicts = Vec::with_capacity(args.values.len());
    let mut exit_status = 0;

    for value in args.values {
        let result = validator.validate(value);
        verdicts.push(SignalVerdict {
            value,
            accepted: result.is_ok(),
            high_water_mark: validator.high_water_mark(),
        });
        if let Err(err) = result {
            exit_status = err.exit_status();
            break;
        }
    }

    let report = SignalsReport {
        verdicts,
        high_water_mark: validator.high_water_mark(),
        exit_status,
    };
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            for verdict in &report.verdicts {
                let label = if verdict.accepted { "accepted" } else { "REJECTED" };
                println!(
                    "{:>10} {} (high-water mark {})",
                    verdict.value, label, verdict.high_water_mark
                );
            }
        }
    }

    Ok(exit_code(exit_status))
}

fn config_command(args: ConfigArgs) -> Result<ExitCode> {
    let config = args.load();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(ExitCode::SUCCESS)
}

fn exit_code(status: i32) -> ExitCode {
    ExitCode::from(u8::try_from(status).unwrap_or(1))
}
