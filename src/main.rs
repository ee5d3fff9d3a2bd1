//! Application entry point for `get-sensor-thresholds`.
//!
//! Finds the sensor thresholds of a metric property, or of every metric
//! property in a metric report, on an iDRAC over Redfish, and prints them
//! scaled by each sensor's `UnitModifier`. The binary:
//! - Parses the positional arguments (`ip user password metricproperty`)
//! - Loads transport settings from environment variables or `.env`
//! - Initializes structured logging/tracing on stderr
//! - Runs the `resolver` against a `redfish` client, writing to an `output` sink
//! - Turns any fatal error into a logged message and a non-zero exit status
//!
//! # Environment Variables
//! - `REDFISH_SCHEME`, `REDFISH_TIMEOUT_SECS`, `REDFISH_VERIFY_TLS`,
//!   `REDFISH_REPORT_BASE` – see `config`
//! - `THRESHOLDS_LOG_LEVEL` (optional) – log verbosity (default: `warn`)
//! - `THRESHOLDS_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! # Examples
//! ```text
//! get-sensor-thresholds 10.1.10.10 root calvin \
//!     '/redfish/v1/Systems/System.Embedded.1/Oem/Dell/DellNumericSensors/iDRAC.Embedded.1_0x23_SystemBoardSYSUsage#CurrentReading'
//! get-sensor-thresholds 10.1.10.10 root calvin Sensor
//! get-sensor-thresholds 10.1.10.10 root calvin /redfish/v1/TelemetryService/MetricReports/Sensor
//! ```
use std::{env, process::ExitCode};

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

mod config;
mod error;
mod models;
mod output;
mod redfish;
mod resolver;

pub use config::Config;

use error::ThresholdError;
use output::{JsonSink, OutputFormat, ReportSink, TextSink};
use redfish::RedfishClient;
use resolver::ThresholdResolver;

// ---

#[derive(Parser, Debug)]
#[command(version)]
#[command(about = "Find the sensor thresholds of a metric property or of every property in a metric report")]
struct Cli {
    /// iDRAC IP address (optionally with :port)
    ip: String,

    /// iDRAC username
    user: String,

    /// iDRAC password
    password: String,

    /// Metric property (with #Fragment) or metric report id/path
    metricproperty: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    // ---
    let cli = Cli::parse();
    dotenv().ok();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ThresholdError>() {
                Some(te) => tracing::error!(kind = ?te.kind(), "{}", te),
                None => tracing::error!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    // ---
    let cfg = config::load_from_env()?;
    cfg.log_config(&cli.ip, &cli.user);

    let client = RedfishClient::new(&cfg, &cli.ip, &cli.user, &cli.password)?;
    let resolver = ThresholdResolver::new(&client, cfg.report_base.clone());

    let mut sink: Box<dyn ReportSink> = match cli.format {
        OutputFormat::Text => Box::new(TextSink::new(std::io::stdout())),
        OutputFormat::Json => Box::new(JsonSink::new(std::io::stdout())),
    };

    resolver.run(&cli.metricproperty, sink.as_mut()).await?;
    Ok(())
}

// ---

/// Initialize the global tracing subscriber for diagnostics on stderr.
///
/// Threshold output goes to stdout through the report sink; this subscriber
/// only carries warnings, errors and debug detail.
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY on stderr
/// - Span event emission mode controlled by the `THRESHOLDS_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: no span events (default)
/// - Level priority: `RUST_LOG` > `-v`/`-vv` > `THRESHOLDS_LOG_LEVEL` > `warn`
fn init_tracing(verbose: u8) {
    // ---
    let span_events = match env::var("THRESHOLDS_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::NONE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stderr().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => match env::var("THRESHOLDS_LOG_LEVEL").ok().as_deref() {
                Some("trace") => "trace",
                Some("debug") => "debug",
                Some("info") => "info",
                Some("error") => "error",
                _ => "warn",
            },
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("{level},reqwest=warn,hyper_util=warn"))
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
