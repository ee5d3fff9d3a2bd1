//! Data models for metric reports and sensor threshold attributes.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, ThresholdError};

// ---

/// Reading units whose thresholds are displayed as decimals.
const DECIMAL_UNITS: [&str; 3] = ["Amps", "Watts", "Volts"];

/// Strip a `#Fragment` suffix from a metric property reference.
///
/// `/redfish/.../SystemBoardSYSUsage#CurrentReading` becomes
/// `/redfish/.../SystemBoardSYSUsage`; references without `#` are returned as is.
pub fn strip_fragment(reference: &str) -> &str {
    match reference.split_once('#') {
        Some((path, _)) => path,
        None => reference,
    }
}

/// Presence of a key in a JSON object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    // ---
    /// The key does not appear at all.
    Absent,
    /// The key is present with `null`.
    Null,
    /// The key is present with a non-null value.
    Present(&'a Value),
}

impl<'a> Field<'a> {
    /// Look up `key` in `doc`.
    pub fn lookup(doc: &'a Map<String, Value>, key: &str) -> Self {
        match doc.get(key) {
            None => Field::Absent,
            Some(Value::Null) => Field::Null,
            Some(value) => Field::Present(value),
        }
    }
}

/// The four thresholds of a numeric sensor, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    LowerCritical,
    LowerWarning,
    UpperCritical,
    UpperWarning,
}

impl ThresholdKind {
    pub const ALL: [ThresholdKind; 4] = [
        ThresholdKind::LowerCritical,
        ThresholdKind::LowerWarning,
        ThresholdKind::UpperCritical,
        ThresholdKind::UpperWarning,
    ];

    /// Redfish property name.
    pub fn key(self) -> &'static str {
        match self {
            ThresholdKind::LowerCritical => "LowerThresholdCritical",
            ThresholdKind::LowerWarning => "LowerThresholdNonCritical",
            ThresholdKind::UpperCritical => "UpperThresholdCritical",
            ThresholdKind::UpperWarning => "UpperThresholdNonCritical",
        }
    }

    /// Human-readable label used in the text output.
    pub fn label(self) -> &'static str {
        match self {
            ThresholdKind::LowerCritical => "Lower Threshold Critical",
            ThresholdKind::LowerWarning => "Lower Threshold Warning",
            ThresholdKind::UpperCritical => "Upper Threshold Critical",
            ThresholdKind::UpperWarning => "Upper Threshold Warning",
        }
    }
}

/// Validated threshold attributes of one metric property.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdAttributes {
    // ---
    pub unit_modifier: i32,
    pub reading_units: Option<String>,
    /// Raw (unscaled) values in [`ThresholdKind::ALL`] order; `None` when null.
    pub raw: [Option<f64>; 4],
}

impl ThresholdAttributes {
    /// Validate a threshold attributes document.
    ///
    /// `UnitModifier` must be integral (`-3` or `-3.0`). Each threshold key must be present;
    /// a null value is kept as `None`, anything else must be a number.
    pub fn from_document(doc: &Map<String, Value>) -> Result<Self> {
        // ---
        let unit_modifier = match Field::lookup(doc, "UnitModifier") {
            Field::Absent | Field::Null => return Err(ThresholdError::NoUnitModifier),
            Field::Present(value) => parse_unit_modifier(value)
                .ok_or_else(|| ThresholdError::InvalidUnitModifier(value.clone()))?,
        };

        let reading_units = doc
            .get("ReadingUnits")
            .and_then(Value::as_str)
            .map(String::from);

        let mut raw = [None; 4];
        for (slot, kind) in raw.iter_mut().zip(ThresholdKind::ALL) {
            *slot = match Field::lookup(doc, kind.key()) {
                Field::Absent => return Err(ThresholdError::MissingThreshold(kind.key())),
                Field::Null => None,
                Field::Present(value) => {
                    Some(
                        value
                            .as_f64()
                            .ok_or_else(|| ThresholdError::NonNumericThreshold {
                                name: kind.key(),
                                value: value.clone(),
                            })?,
                    )
                }
            };
        }

        Ok(ThresholdAttributes {
            unit_modifier,
            reading_units,
            raw,
        })
    }

    /// Whether thresholds in these units are shown with decimals.
    pub fn is_decimal(&self) -> bool {
        self.reading_units
            .as_deref()
            .is_some_and(|units| DECIMAL_UNITS.contains(&units))
    }
}

/// An integral JSON number within `i32`, written as an integer or a float.
fn parse_unit_modifier(value: &Value) -> Option<i32> {
    if let Some(m) = value.as_i64() {
        return i32::try_from(m).ok();
    }
    let m = value.as_f64()?;
    if m.fract() != 0.0 || m < i32::MIN as f64 || m > i32::MAX as f64 {
        return None;
    }
    Some(m as i32)
}

/// Warning text for a sensor whose `CurrentState` is `Unknown`.
pub fn unknown_state_warning(doc: &Map<String, Value>) -> Option<String> {
    // ---
    if doc.get("CurrentState").and_then(Value::as_str) != Some("Unknown") {
        return None;
    }
    let odata_type = doc
        .get("@odata.type")
        .and_then(Value::as_str)
        .unwrap_or("<no @odata.type>");
    Some(format!(
        "CurrentState of {} is Unknown, thresholds may not be meaningful",
        odata_type
    ))
}

/// Apply a decimal unit modifier: `raw * 10^modifier`.
///
/// Negative modifiers divide by the matching power of ten, which keeps
/// values such as `1100 * 10^-3` at exactly `1.1`. Returns `None` when the
/// exponent does not fit or the result is not finite.
pub fn scale(raw: f64, modifier: i32) -> Option<f64> {
    // ---
    let exponent = i32::try_from(modifier.unsigned_abs()).ok()?;
    let factor = 10f64.powi(exponent);
    let scaled = if modifier >= 0 { raw * factor } else { raw / factor };
    scaled.is_finite().then_some(scaled)
}

/// Whether `value` truncates to an `i64` without saturating.
fn fits_i64(value: f64) -> bool {
    let truncated = value.trunc();
    truncated >= i64::MIN as f64 && truncated < i64::MAX as f64
}

/// Render a float the way a human expects to read it back: `1.1`, `12.0`.
fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// One scaled threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdValue {
    pub name: &'static str,
    #[serde(skip)]
    pub kind: ThresholdKind,
    /// Scaled value; `None` when the property is null on the iDRAC.
    pub value: Option<f64>,
}

/// Normalized thresholds of one metric property, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdReport {
    // ---
    pub metric_property: String,
    pub reading_units: Option<String>,
    pub unit_modifier: i32,
    pub decimal: bool,
    pub thresholds: Vec<ThresholdValue>,
}

impl ThresholdReport {
    /// Scale every non-null threshold of `attrs`.
    ///
    /// A scaled value that is not finite, or that does not fit an `i64` when
    /// shown as an integer, is a [`ThresholdError::ScaleOutOfRange`].
    pub fn new(metric_property: &str, attrs: &ThresholdAttributes) -> Result<Self> {
        // ---
        let decimal = attrs.is_decimal();
        let modifier = attrs.unit_modifier;

        let thresholds = ThresholdKind::ALL
            .iter()
            .zip(attrs.raw)
            .map(|(&kind, raw)| -> Result<ThresholdValue> {
                let value = match raw {
                    None => None,
                    Some(r) => Some(
                        scale(r, modifier)
                            .filter(|&v| decimal || fits_i64(v))
                            .ok_or_else(|| ThresholdError::ScaleOutOfRange {
                                name: kind.key(),
                                raw: r,
                                modifier,
                            })?,
                    ),
                };
                Ok(ThresholdValue {
                    name: kind.key(),
                    kind,
                    value,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ThresholdReport {
            metric_property: metric_property.to_string(),
            reading_units: attrs.reading_units.clone(),
            unit_modifier: modifier,
            decimal,
            thresholds,
        })
    }

    /// Text lines, one per threshold.
    ///
    /// Integer display truncates toward zero; [`ThresholdReport::new`] has
    /// already checked that every value fits an `i64`.
    pub fn lines(&self) -> Vec<String> {
        // ---
        self.thresholds
            .iter()
            .map(|t| match t.value {
                None => format!("{} property is null", t.kind.label()),
                Some(v) if self.decimal => format!("{} :{}", t.kind.label(), format_decimal(v)),
                Some(v) => format!("{}:{}", t.kind.label(), v.trunc() as i64),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    fn volts_doc() -> Map<String, Value> {
        doc(json!({
            "@odata.type": "#DellNumericSensor.v1_0_0.DellNumericSensor",
            "UnitModifier": -3,
            "ReadingUnits": "Volts",
            "LowerThresholdCritical": 1100,
            "LowerThresholdNonCritical": null,
            "UpperThresholdCritical": 1300,
            "UpperThresholdNonCritical": 1250
        }))
    }

    #[test]
    fn test_strip_fragment() {
        // ---
        assert_eq!(strip_fragment("/path/to/sensor#CurrentReading"), "/path/to/sensor");
        assert_eq!(strip_fragment("/path/to/sensor"), "/path/to/sensor");
        assert_eq!(strip_fragment("/a#b#c"), "/a");
        assert_eq!(strip_fragment("#only"), "");
    }

    #[test]
    fn test_field_tri_state() {
        // ---
        let d = doc(json!({"a": null, "b": 3, "c": {}}));
        assert_eq!(Field::lookup(&d, "a"), Field::Null);
        assert_eq!(Field::lookup(&d, "b"), Field::Present(&json!(3)));
        assert_eq!(Field::lookup(&d, "c"), Field::Present(&json!({})));
        assert_eq!(Field::lookup(&d, "missing"), Field::Absent);
    }

    #[test]
    fn test_volts_report_lines() {
        // ---
        let attrs = ThresholdAttributes::from_document(&volts_doc()).unwrap();
        assert!(attrs.is_decimal());

        let report = ThresholdReport::new("/path/to/sensor", &attrs).unwrap();
        assert_eq!(
            report.lines(),
            vec![
                "Lower Threshold Critical :1.1",
                "Lower Threshold Warning property is null",
                "Upper Threshold Critical :1.3",
                "Upper Threshold Warning :1.25",
            ]
        );
    }

    #[test]
    fn test_integer_units_truncate() {
        // ---
        let attrs = ThresholdAttributes::from_document(&doc(json!({
            "UnitModifier": -1,
            "ReadingUnits": "Cel",
            "LowerThresholdCritical": 37,
            "LowerThresholdNonCritical": -37,
            "UpperThresholdCritical": 900,
            "UpperThresholdNonCritical": null
        })))
        .unwrap();
        assert!(!attrs.is_decimal());

        let lines = ThresholdReport::new("/t", &attrs).unwrap().lines();
        assert_eq!(lines[0], "Lower Threshold Critical:3");
        assert_eq!(lines[1], "Lower Threshold Warning:-3");
        assert_eq!(lines[2], "Upper Threshold Critical:90");
        assert_eq!(lines[3], "Upper Threshold Warning property is null");
    }

    #[test]
    fn test_whole_decimal_keeps_one_place() {
        // ---
        let attrs = ThresholdAttributes::from_document(&doc(json!({
            "UnitModifier": 0,
            "ReadingUnits": "Watts",
            "LowerThresholdCritical": 12,
            "LowerThresholdNonCritical": 12.5,
            "UpperThresholdCritical": null,
            "UpperThresholdNonCritical": null
        })))
        .unwrap();

        let lines = ThresholdReport::new("/t", &attrs).unwrap().lines();
        assert_eq!(lines[0], "Lower Threshold Critical :12.0");
        assert_eq!(lines[1], "Lower Threshold Warning :12.5");
    }

    #[test]
    fn test_scale() {
        // ---
        assert_eq!(scale(1100.0, -3), Some(1.1));
        assert_eq!(scale(1250.0, -3), Some(1.25));
        assert_eq!(scale(7.0, 0), Some(7.0));
        assert_eq!(scale(7.0, 3), Some(7000.0));
        assert_eq!(scale(-42.0, 2), Some(-4200.0));
        assert_eq!(scale(123456789.0, 6), Some(123456789000000.0));
    }

    #[test]
    fn test_scale_rejects_unrepresentable_results() {
        // ---
        assert_eq!(scale(1.0, 400), None);
        assert_eq!(scale(-1.0, 400), None);
        assert_eq!(scale(5.0, i32::MIN), None);
        assert_eq!(scale(5.0, i32::MIN + 1), Some(0.0));
    }

    #[test]
    fn test_huge_modifier_is_out_of_range() {
        // ---
        let mut d = doc(json!({
            "UnitModifier": 400,
            "ReadingUnits": "RPM",
            "LowerThresholdCritical": 1,
            "LowerThresholdNonCritical": null,
            "UpperThresholdCritical": null,
            "UpperThresholdNonCritical": null
        }));
        let attrs = ThresholdAttributes::from_document(&d).unwrap();
        assert!(matches!(
            ThresholdReport::new("/t", &attrs),
            Err(ThresholdError::ScaleOutOfRange {
                name: "LowerThresholdCritical",
                modifier: 400,
                ..
            })
        ));

        // Decimal display has no i64 limit, but infinity is still rejected
        d.insert("ReadingUnits".into(), json!("Volts"));
        let attrs = ThresholdAttributes::from_document(&d).unwrap();
        assert!(matches!(
            ThresholdReport::new("/t", &attrs),
            Err(ThresholdError::ScaleOutOfRange { .. })
        ));
    }

    #[test]
    fn test_integer_display_beyond_i64_is_out_of_range() {
        // ---
        let mut d = doc(json!({
            "UnitModifier": 19,
            "ReadingUnits": "RPM",
            "LowerThresholdCritical": null,
            "LowerThresholdNonCritical": null,
            "UpperThresholdCritical": 1,
            "UpperThresholdNonCritical": null
        }));
        let attrs = ThresholdAttributes::from_document(&d).unwrap();
        assert!(matches!(
            ThresholdReport::new("/t", &attrs),
            Err(ThresholdError::ScaleOutOfRange {
                name: "UpperThresholdCritical",
                ..
            })
        ));

        d.insert("UnitModifier".into(), json!(18));
        let attrs = ThresholdAttributes::from_document(&d).unwrap();
        let lines = ThresholdReport::new("/t", &attrs).unwrap().lines();
        assert_eq!(lines[2], "Upper Threshold Critical:1000000000000000000");

        d.insert("UnitModifier".into(), json!(19));
        d.insert("ReadingUnits".into(), json!("Watts"));
        let attrs = ThresholdAttributes::from_document(&d).unwrap();
        assert!(ThresholdReport::new("/t", &attrs).is_ok());
    }

    #[test]
    fn test_unit_modifier_missing_or_null() {
        // ---
        let mut d = volts_doc();
        d.remove("UnitModifier");
        assert!(matches!(
            ThresholdAttributes::from_document(&d),
            Err(ThresholdError::NoUnitModifier)
        ));

        d.insert("UnitModifier".into(), Value::Null);
        assert!(matches!(
            ThresholdAttributes::from_document(&d),
            Err(ThresholdError::NoUnitModifier)
        ));

        d.insert("UnitModifier".into(), json!("-3"));
        assert!(matches!(
            ThresholdAttributes::from_document(&d),
            Err(ThresholdError::InvalidUnitModifier(_))
        ));
    }

    #[test]
    fn test_unit_modifier_accepts_integral_floats() {
        // ---
        let mut d = volts_doc();
        d.insert("UnitModifier".into(), json!(-3.0));
        let attrs = ThresholdAttributes::from_document(&d).unwrap();
        assert_eq!(attrs.unit_modifier, -3);
        assert_eq!(
            ThresholdReport::new("/s", &attrs).unwrap().lines()[0],
            "Lower Threshold Critical :1.1"
        );

        d.insert("UnitModifier".into(), json!(-2.5));
        assert!(matches!(
            ThresholdAttributes::from_document(&d),
            Err(ThresholdError::InvalidUnitModifier(_))
        ));

        d.insert("UnitModifier".into(), json!(1e12));
        assert!(matches!(
            ThresholdAttributes::from_document(&d),
            Err(ThresholdError::InvalidUnitModifier(_))
        ));
    }

    #[test]
    fn test_each_threshold_key_required() {
        // ---
        for kind in ThresholdKind::ALL {
            let mut d = volts_doc();
            d.remove(kind.key());
            match ThresholdAttributes::from_document(&d) {
                Err(ThresholdError::MissingThreshold(name)) => assert_eq!(name, kind.key()),
                other => panic!("expected MissingThreshold for {}, got {:?}", kind.key(), other),
            }
        }
    }

    #[test]
    fn test_non_numeric_threshold_rejected() {
        // ---
        let mut d = volts_doc();
        d.insert("UpperThresholdCritical".into(), json!("high"));
        assert!(matches!(
            ThresholdAttributes::from_document(&d),
            Err(ThresholdError::NonNumericThreshold {
                name: "UpperThresholdCritical",
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_state_warning() {
        // ---
        let mut d = volts_doc();
        assert_eq!(unknown_state_warning(&d), None);

        d.insert("CurrentState".into(), json!("Normal"));
        assert_eq!(unknown_state_warning(&d), None);

        d.insert("CurrentState".into(), json!("Unknown"));
        let warning = unknown_state_warning(&d).unwrap();
        assert!(warning.contains("#DellNumericSensor.v1_0_0.DellNumericSensor"));
    }

    #[test]
    fn test_report_serializes_nulls() {
        // ---
        let attrs = ThresholdAttributes::from_document(&volts_doc()).unwrap();
        let report = ThresholdReport::new("/path/to/sensor", &attrs).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["metric_property"], "/path/to/sensor");
        assert_eq!(json["decimal"], true);
        assert_eq!(json["thresholds"][0]["name"], "LowerThresholdCritical");
        assert_eq!(json["thresholds"][0]["value"], 1.1);
        assert!(json["thresholds"][1]["value"].is_null());
    }
}
