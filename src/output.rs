//! Where resolved thresholds go.
//!
//! The resolver never prints directly; it hands notes and reports to a
//! [`ReportSink`] chosen by `main` from the `--format` flag.

use std::io::{self, Write};

use clap::ValueEnum;

use crate::models::ThresholdReport;

// ---

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per metric property
    Json,
}

/// Receiver for everything the resolver wants the user to see.
///
/// A write failure is returned so the run fails instead of exiting 0
/// with lost output.
pub trait ReportSink {
    /// A progress line such as the report or property being processed.
    fn note(&mut self, line: &str) -> io::Result<()>;

    /// The thresholds of one metric property.
    fn report(&mut self, report: &ThresholdReport) -> io::Result<()>;
}

/// Writes plain text lines to any writer (stdout in the binary).
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ReportSink for TextSink<W> {
    fn note(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }

    fn report(&mut self, report: &ThresholdReport) -> io::Result<()> {
        for line in report.lines() {
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()
    }
}

/// Writes one JSON document per report; notes go to the debug log only.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn note(&mut self, line: &str) -> io::Result<()> {
        tracing::debug!("{}", line);
        Ok(())
    }

    fn report(&mut self, report: &ThresholdReport) -> io::Result<()> {
        let json = serde_json::to_string(report).map_err(io::Error::from)?;
        writeln!(self.out, "{}", json)?;
        self.out.flush()
    }
}
