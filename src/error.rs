//! Error types for threshold resolution.
//!
//! Every variant is fatal for the run. Non-fatal data quality problems
//! (null thresholds, `CurrentState: Unknown`) are logged, never returned.

use std::fmt;

use thiserror::Error;

/// Result type alias using the resolver's error type.
pub type Result<T> = std::result::Result<T, ThresholdError>;

/// Which kind of Redfish document a request was fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// A metric report under the telemetry service.
    Report,
    /// The threshold attributes of one metric property.
    Attributes,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Report => f.write_str("report"),
            Resource::Attributes => f.write_str("attributes"),
        }
    }
}

/// Broad classification of a [`ThresholdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The iDRAC could not be reached or answered with a non-success status.
    Transport,
    /// The iDRAC answered, but the document is not what the tool expects.
    Format,
    /// The results could not be written out.
    Output,
}

/// Fatal errors raised while resolving and fetching thresholds.
#[derive(Error, Debug)]
pub enum ThresholdError {
    /// Non-success HTTP status
    #[error("FAIL, status code for reading {resource} is not 200, code is: {status} ({url})")]
    Status {
        resource: Resource,
        url: String,
        status: u16,
    },

    /// Connection failure, timeout, or unreadable body
    #[error("FAIL, request for {resource} at {url} failed: {source}")]
    Request {
        resource: Resource,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Body is not valid JSON
    #[error("FAIL, {resource} at {url} is not valid JSON: {source}")]
    Json {
        resource: Resource,
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Body is JSON but not an object
    #[error("FAIL, {resource} document is not a JSON object")]
    NotAnObject { resource: Resource },

    /// `MetricValues` is present but not a list
    #[error("FAIL, MetricValues in metric report is not a list")]
    MetricValuesNotList,

    /// Report entry without `MetricProperty`
    #[error(
        "FAIL, MetricValues entry {index} has no MetricProperty. \
         The iDRAC firmware version is not compatible with this tool"
    )]
    MissingMetricProperty { index: usize },

    /// Report entry whose `MetricProperty` is not a string
    #[error("FAIL, MetricProperty of MetricValues entry {index} is not a string: {value}")]
    InvalidMetricProperty {
        index: usize,
        value: serde_json::Value,
    },

    /// `UnitModifier` absent or null
    #[error("FAIL,No Unit Modifier")]
    NoUnitModifier,

    /// `UnitModifier` present but not an integer
    #[error("FAIL, UnitModifier is not an integer: {0}")]
    InvalidUnitModifier(serde_json::Value),

    /// A threshold key missing from the attributes document
    #[error("FAIL,No {0} property")]
    MissingThreshold(&'static str),

    /// A threshold present with a non-numeric value
    #[error("FAIL, {name} is not numeric: {value}")]
    NonNumericThreshold {
        name: &'static str,
        value: serde_json::Value,
    },

    /// A threshold that cannot be represented once scaled
    #[error("FAIL, {name} value {raw} scaled by 10^{modifier} is out of range")]
    ScaleOutOfRange {
        name: &'static str,
        raw: f64,
        modifier: i32,
    },

    /// Writing the results failed
    #[error("FAIL, could not write output: {0}")]
    Output(#[from] std::io::Error),
}

impl ThresholdError {
    /// Classify the error as a transport, format, or output problem.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ThresholdError::Status { .. } | ThresholdError::Request { .. } => ErrorKind::Transport,
            ThresholdError::Output(_) => ErrorKind::Output,
            _ => ErrorKind::Format,
        }
    }
}
