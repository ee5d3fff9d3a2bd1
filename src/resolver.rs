//! Sensor threshold resolution.
//!
//! [`ThresholdResolver`] turns the user's `metricproperty` argument into a
//! set of metric property paths, fetches the threshold attributes of each
//! one, and hands normalized [`ThresholdReport`]s to a [`ReportSink`].
//!
//! Any error aborts the whole run; reports already handed to the sink stay
//! emitted.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{Resource, Result, ThresholdError};
use crate::models::{strip_fragment, unknown_state_warning, ThresholdAttributes, ThresholdReport};
use crate::output::ReportSink;
use crate::redfish::RedfishSource;

// ---

/// Marker that an argument names a metric report by path rather than by id.
const REPORT_PATH_MARKER: &str = "MetricReports/";

/// Metric property paths to query, fragment-stripped and in first-seen order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TargetSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl TargetSet {
    /// Insert a reference, stripping any `#Fragment`; duplicates collapse.
    pub fn insert(&mut self, reference: &str) -> bool {
        let path = strip_fragment(reference);
        if self.seen.contains(path) {
            return false;
        }
        self.seen.insert(path.to_string());
        self.order.push(path.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// Resolves and reports sensor thresholds against one Redfish source.
pub struct ThresholdResolver<'a, S> {
    source: &'a S,
    report_base: String,
}

impl<'a, S: RedfishSource + Sync> ThresholdResolver<'a, S> {
    /// `report_base` is the metric report collection path, with trailing slash.
    pub fn new(source: &'a S, report_base: impl Into<String>) -> Self {
        Self {
            source,
            report_base: report_base.into(),
        }
    }

    /// Resolve `input`, then fetch and report every target in order.
    pub async fn run(&self, input: &str, sink: &mut dyn ReportSink) -> Result<()> {
        // ---
        let targets = self.resolve_targets(input, sink).await?;
        debug!("Resolved {} metric properties from '{}'", targets.len(), input);
        if targets.is_empty() {
            warn!("Metric report '{}' lists no metric properties", input);
        }

        for target in targets.iter() {
            self.fetch_and_report(target, sink).await?;
        }

        sink.note(&format!("Successfully found the thresholds for '{}'.", input))?;
        Ok(())
    }

    /// Turn the user argument into the set of metric property paths.
    ///
    /// An argument containing `#` is a single metric property. Anything else
    /// names a metric report, either by id (`Sensor`) or by path
    /// (`/redfish/v1/TelemetryService/MetricReports/Sensor`).
    pub async fn resolve_targets(&self, input: &str, sink: &mut dyn ReportSink) -> Result<TargetSet> {
        // ---
        let mut targets = TargetSet::default();

        if input.contains('#') {
            targets.insert(input);
            return Ok(targets);
        }

        sink.note(&format!("For metric report: {}", input))?;

        let path = if input.contains(REPORT_PATH_MARKER) {
            input.to_string()
        } else {
            format!("{}{}", self.report_base, input)
        };

        let report = self.source.get_json(&path, Resource::Report).await?;
        debug!("Successfully pulled metric report");
        if !report.is_object() {
            return Err(ThresholdError::NotAnObject {
                resource: Resource::Report,
            });
        }

        let values = match report.get("MetricValues") {
            None | Some(Value::Null) => return Ok(targets),
            Some(Value::Array(values)) => values,
            Some(_) => return Err(ThresholdError::MetricValuesNotList),
        };

        for (index, metric) in values.iter().enumerate() {
            match metric.get("MetricProperty") {
                None | Some(Value::Null) => {
                    return Err(ThresholdError::MissingMetricProperty { index });
                }
                Some(Value::String(property)) => {
                    if !targets.insert(property) {
                        debug!("Skipping duplicate metric property {}", property);
                    }
                }
                Some(other) => {
                    return Err(ThresholdError::InvalidMetricProperty {
                        index,
                        value: other.clone(),
                    });
                }
            }
        }

        Ok(targets)
    }

    /// Fetch the threshold attributes of one metric property and report them.
    #[instrument(skip(self, sink))]
    pub async fn fetch_and_report(&self, target: &str, sink: &mut dyn ReportSink) -> Result<ThresholdReport> {
        // ---
        let path = strip_fragment(target);
        sink.note(&format!("Thresholds for mp:'{}' are below:", path))?;

        let document = self.source.get_json(path, Resource::Attributes).await?;
        let doc = document.as_object().ok_or(ThresholdError::NotAnObject {
            resource: Resource::Attributes,
        })?;

        if let Some(warning) = unknown_state_warning(doc) {
            warn!("{}", warning);
        }

        let attrs = ThresholdAttributes::from_document(doc)?;
        debug!(
            "ReadingUnits: {:?}, UnitModifier: {}",
            attrs.reading_units, attrs.unit_modifier
        );

        let report = ThresholdReport::new(path, &attrs)?;
        sink.report(&report)?;
        Ok(report)
    }
}
