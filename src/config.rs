//! Configuration loader for the `get-sensor-thresholds` tool.
//!
//! The positional CLI arguments say *what* to look up; this module holds the
//! transport settings that say *how* to reach the iDRAC. Values come from
//! environment variables (with optional `.env` support provided by the
//! caller) so that `env::var` calls stay in one place.
use std::env;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};

/// Default Redfish collection holding the metric reports.
pub const DEFAULT_REPORT_BASE: &str = "/redfish/v1/TelemetryService/MetricReports/";

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional boolean environment variable with a default value.
macro_rules! parse_env_bool {
    ($var_name:expr, $default:expr) => {
        match env::var($var_name).ok().as_deref() {
            None => $default,
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(other) => bail!("Invalid {}: expected true/false, got '{}'", $var_name, other),
        }
    };
}

/// Read an optional string environment variable with a default value.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

/// Strongly typed transport configuration.
///
/// Immutable after loading.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// URL scheme used to reach the iDRAC (`https` or `http`).
    pub scheme: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Whether the server certificate is validated. iDRACs ship with
    /// self-signed certificates, so this is off unless asked for.
    pub verify_tls: bool,

    /// Path of the metric report collection, with trailing slash.
    pub report_base: String,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `REDFISH_SCHEME` – `https` or `http` (default: `https`)
/// - `REDFISH_TIMEOUT_SECS` – request timeout in seconds (default: 30)
/// - `REDFISH_VERIFY_TLS` – validate server certificates (default: false)
/// - `REDFISH_REPORT_BASE` – metric report collection path
///
/// Returns an error if any variable holds an invalid value.
pub fn load_from_env() -> Result<Config> {
    // ---
    let scheme = env_or!("REDFISH_SCHEME", "https").to_lowercase();
    if scheme != "https" && scheme != "http" {
        bail!("Invalid REDFISH_SCHEME: expected https or http, got '{}'", scheme);
    }

    let timeout_secs = parse_env_u64!("REDFISH_TIMEOUT_SECS", 30);
    if timeout_secs == 0 {
        bail!("Invalid REDFISH_TIMEOUT_SECS: must be greater than zero");
    }

    let verify_tls = parse_env_bool!("REDFISH_VERIFY_TLS", false);

    let mut report_base = env_or!("REDFISH_REPORT_BASE", DEFAULT_REPORT_BASE);
    if !report_base.ends_with('/') {
        report_base.push('/');
    }

    Ok(Config {
        scheme,
        timeout: Duration::from_secs(timeout_secs),
        verify_tls,
        report_base,
    })
}

impl Config {
    /// Log the loaded configuration together with the target host and user.
    ///
    /// The password never reaches the log.
    pub fn log_config(&self, host: &str, user: &str) {
        // ---
        tracing::debug!("Configuration loaded:");
        tracing::debug!("  TARGET               : {}://{}", self.scheme, host);
        tracing::debug!("  USER                 : {}", user);
        tracing::debug!("  PASSWORD             : ****");
        tracing::debug!("  REDFISH_TIMEOUT_SECS : {}", self.timeout.as_secs());
        tracing::debug!("  REDFISH_VERIFY_TLS   : {}", self.verify_tls);
        tracing::debug!("  REDFISH_REPORT_BASE  : {}", self.report_base);
    }
}
