//! Rectifier (SMR) acceptance engine
//!
//! Covers three switched-mode rectifier variants:
//! - SMPS: 110 V DC systems
//! - Telecom RE: 48 V DC, railway-electrified sections (input starts ~165 V)
//! - Telecom Non-RE: 48 V DC, non-electrified sections (input starts ~90 V)
//!
//! The variant is detected from the grid itself (mean output voltage, then
//! the first row's input voltage) and selects the limit table for every
//! check. An empty grid evaluates to a failing "No Data" result instead of
//! an error.

use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::engine::AcceptanceEngine;
use crate::result::{merge_outcomes, AcceptanceResult, CheckOutcome};
use crate::row_ids::row_ids;
use crate::rows::{columns, RectifierRow};
use crate::tolerance::{within_absolute, within_percent};

// ============================================================================
// Fixed limits
// ============================================================================

/// Mean output voltage above this is an SMPS unit (V)
pub const SUBTYPE_VOLTAGE_THRESHOLD: f64 = 100.0;

/// First-row input voltage of a railway-electrified telecom test (V)
pub const RE_START_VOLTAGE: f64 = 165.0;

/// First-row input voltage of a non-electrified telecom test (V)
pub const NON_RE_START_VOLTAGE: f64 = 90.0;

/// Tolerance on the first-row input voltage for detection (%)
pub const DETECTION_TOL: f64 = 10.0;

/// Nominal input voltage (V)
pub const NOMINAL_INPUT_VOLTAGE: f64 = 230.0;

/// Input voltage tolerance around nominal (%)
pub const INPUT_VOLTAGE_TOL: f64 = 5.0;

/// Absolute tolerance on output current around rated (A)
pub const RATED_CURRENT_TOL: f64 = 1.0;

/// Telecom "high load" starts at this fraction of rated current
pub const HIGH_LOAD_FRACTION: f64 = 0.75;

/// Current THD is only judged from this fraction of rated current
pub const ITHD_LOAD_FRACTION: f64 = 0.5;

/// Input current THD limit (%)
pub const ITHD_LIMIT: f64 = 10.0;

/// Output ripple limit, peak to peak (mV)
pub const RIPPLE_LIMIT_MV: f64 = 300.0;

/// Efficiency above this is flagged abnormal (%)
pub const EFFICIENCY_ABNORMAL: f64 = 96.0;

/// General power factor limit (all variants)
pub const PF_GENERAL: f64 = 0.90;

/// SMPS power factor limit at nominal input and rated current
pub const SMPS_PF_NOMINAL: f64 = 0.95;

/// Telecom leading power factor limit at nominal input and high load
pub const TELECOM_PF_LEAD: f64 = 0.98;

/// Telecom lagging power factor limit at nominal input and high load
pub const TELECOM_PF_LAG: f64 = 0.95;

/// Per-variant limit table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubtypeLimits {
    /// Rated output current (A)
    pub rated_current: f64,

    /// Efficiency limit at nominal input and rated current (%)
    pub efficiency_rated: f64,

    /// Efficiency limit elsewhere (%)
    pub efficiency_general: f64,

    /// Input voltage THD limit (%)
    pub vthd_limit: f64,

    /// Lowest acceptable output voltage (V)
    pub output_under: f64,

    /// Highest acceptable output voltage (V)
    pub output_over: f64,
}

const SMPS_LIMITS: SubtypeLimits = SubtypeLimits {
    rated_current: 20.0,
    efficiency_rated: 90.0,
    efficiency_general: 85.0,
    vthd_limit: 8.0,
    output_under: 101.09,
    output_over: 138.16,
};

const TELECOM_LIMITS: SubtypeLimits = SubtypeLimits {
    rated_current: 25.0,
    efficiency_rated: 85.0,
    efficiency_general: 80.0,
    vthd_limit: 10.0,
    output_under: 44.4,
    output_over: 66.0,
};

// ============================================================================
// Subtype detection
// ============================================================================

/// Rectifier variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RectifierSubtype {
    #[serde(rename = "SMPS")]
    Smps,
    #[serde(rename = "Telecom RE")]
    TelecomRe,
    #[serde(rename = "Telecom Non-RE")]
    TelecomNonRe,
}

impl RectifierSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smps => "SMPS",
            Self::TelecomRe => "Telecom RE",
            Self::TelecomNonRe => "Telecom Non-RE",
        }
    }

    pub fn limits(&self) -> &'static SubtypeLimits {
        match self {
            Self::Smps => &SMPS_LIMITS,
            Self::TelecomRe | Self::TelecomNonRe => &TELECOM_LIMITS,
        }
    }
}

impl fmt::Display for RectifierSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of variant detection
#[derive(Debug, Clone, PartialEq)]
pub struct SubtypeDetection {
    pub subtype: RectifierSubtype,

    /// Mean output voltage over the grid (V)
    pub mean_output_voltage: f64,

    /// Set when neither telecom band matched and Telecom RE was assumed
    pub fallback: Option<String>,
}

/// Detect the rectifier variant from a grid; `None` for an empty grid
pub fn detect_subtype(rows: &[RectifierRow]) -> Option<SubtypeDetection> {
    let first = rows.first()?;
    let mean_output_voltage =
        rows.iter().map(|r| r.output_voltage).sum::<f64>() / rows.len() as f64;

    let mut fallback = None;
    let subtype = if mean_output_voltage > SUBTYPE_VOLTAGE_THRESHOLD {
        RectifierSubtype::Smps
    } else if within_percent(first.input_voltage, RE_START_VOLTAGE, DETECTION_TOL) {
        RectifierSubtype::TelecomRe
    } else if within_percent(first.input_voltage, NON_RE_START_VOLTAGE, DETECTION_TOL) {
        RectifierSubtype::TelecomNonRe
    } else {
        let message = format!(
            "First-row input voltage {} V matches neither the RE ({} V) nor the Non-RE ({} V) band; assuming {}",
            first.input_voltage,
            RE_START_VOLTAGE,
            NON_RE_START_VOLTAGE,
            RectifierSubtype::TelecomRe
        );
        warn!("{}", message);
        fallback = Some(message);
        RectifierSubtype::TelecomRe
    };

    info!(
        "SMR type detected: {} (mean V out {:.2} V)",
        subtype, mean_output_voltage
    );
    Some(SubtypeDetection {
        subtype,
        mean_output_voltage,
        fallback,
    })
}

fn is_nominal_input(input_voltage: f64) -> bool {
    within_percent(input_voltage, NOMINAL_INPUT_VOLTAGE, INPUT_VOLTAGE_TOL)
}

// ============================================================================
// Engine
// ============================================================================

/// Rectifier acceptance engine over one captured grid
#[derive(Debug, Clone)]
pub struct RectifierEngine {
    rows: Vec<RectifierRow>,
    detection: Option<SubtypeDetection>,
}

impl RectifierEngine {
    /// Create an engine for a grid; detection runs once here
    pub fn new(rows: Vec<RectifierRow>) -> Self {
        let detection = detect_subtype(&rows);
        Self { rows, detection }
    }

    /// Detected variant (`None` for an empty grid)
    pub fn detection(&self) -> Option<&SubtypeDetection> {
        self.detection.as_ref()
    }

    pub fn subtype(&self) -> Option<RectifierSubtype> {
        self.detection.as_ref().map(|d| d.subtype)
    }

    fn flags(&self, predicate: impl Fn(&RectifierRow) -> bool) -> Vec<bool> {
        self.rows.iter().map(predicate).collect()
    }

    /// Power factor
    ///
    /// SMPS: |PF| ≥ 0.95 at nominal input and rated current, else ≥ 0.90.
    /// Telecom at nominal input and high load: leading PF ≥ 0.98, lagging
    /// |PF| ≥ 0.95; elsewhere |PF| ≥ 0.90.
    pub fn check_power_factor(&self, subtype: RectifierSubtype) -> CheckOutcome {
        let rated = subtype.limits().rated_current;
        let invalid = match subtype {
            RectifierSubtype::Smps => self.flags(|r| {
                let nominal = is_nominal_input(r.input_voltage)
                    && within_absolute(r.output_current, rated, RATED_CURRENT_TOL);
                let limit = if nominal { SMPS_PF_NOMINAL } else { PF_GENERAL };
                r.power_factor.abs() < limit
            }),
            RectifierSubtype::TelecomRe | RectifierSubtype::TelecomNonRe => self.flags(|r| {
                let high_load = is_nominal_input(r.input_voltage)
                    && r.output_current >= HIGH_LOAD_FRACTION * rated;
                if !high_load {
                    r.power_factor.abs() < PF_GENERAL
                } else if r.power_factor >= 0.0 {
                    r.power_factor < TELECOM_PF_LEAD
                } else {
                    r.power_factor.abs() < TELECOM_PF_LAG
                }
            }),
        };
        CheckOutcome::new().invalid(columns::PF_IN, row_ids(&invalid))
    }

    /// Efficiency, with a stricter limit at nominal input and rated current
    pub fn check_efficiency(&self, subtype: RectifierSubtype) -> CheckOutcome {
        let limits = subtype.limits();
        let invalid = self.flags(|r| {
            let rated_point = is_nominal_input(r.input_voltage)
                && within_absolute(r.output_current, limits.rated_current, RATED_CURRENT_TOL);
            let limit = if rated_point {
                limits.efficiency_rated
            } else {
                limits.efficiency_general
            };
            r.efficiency < limit
        });
        CheckOutcome::new().invalid(columns::EFFICIENCY, row_ids(&invalid))
    }

    /// Input current THD (from half rated load up) and input voltage THD
    pub fn check_thd(&self, subtype: RectifierSubtype) -> CheckOutcome {
        let limits = subtype.limits();
        let current = self.flags(|r| {
            r.output_current >= ITHD_LOAD_FRACTION * limits.rated_current
                && r.input_ithd >= ITHD_LIMIT
        });
        let voltage = self.flags(|r| r.input_vthd >= limits.vthd_limit);
        CheckOutcome::new()
            .invalid(columns::ITHD_IN, row_ids(&current))
            .invalid(columns::VTHD_IN, row_ids(&voltage))
    }

    /// Output voltage within the variant's band
    pub fn check_output_voltage(&self, subtype: RectifierSubtype) -> CheckOutcome {
        let limits = subtype.limits();
        let invalid = self.flags(|r| {
            r.output_voltage < limits.output_under || r.output_voltage > limits.output_over
        });
        CheckOutcome::new().invalid(columns::V_OUT, row_ids(&invalid))
    }

    /// Ripple above 300 mV fails
    pub fn check_ripple(&self) -> CheckOutcome {
        let invalid = self.flags(|r| r.ripple_mv > RIPPLE_LIMIT_MV);
        CheckOutcome::new().invalid(columns::RIPPLE_OUT, row_ids(&invalid))
    }

    /// Efficiency above 96 % is flagged, never failed
    pub fn check_abnormal(&self) -> CheckOutcome {
        let abnormal = self.flags(|r| r.efficiency > EFFICIENCY_ABNORMAL);
        CheckOutcome::new().abnormal(columns::EFFICIENCY, row_ids(&abnormal))
    }
}

impl AcceptanceEngine for RectifierEngine {
    fn evaluate(&self) -> AcceptanceResult {
        let Some(detection) = &self.detection else {
            info!("SMR evaluation: no data");
            return AcceptanceResult::no_data();
        };
        let subtype = detection.subtype;

        let outcomes = [
            self.check_power_factor(subtype),
            self.check_efficiency(subtype),
            self.check_thd(subtype),
            self.check_output_voltage(subtype),
            self.check_ripple(),
            self.check_abnormal(),
        ];
        for outcome in &outcomes {
            for (column, ids) in &outcome.invalid {
                debug!("SMR check {}: {} invalid", column, ids.len());
            }
        }

        let (invalid, abnormal) = merge_outcomes(outcomes);
        let result = AcceptanceResult::from_cells(
            invalid,
            abnormal,
            Some(format!("Mode: {}", subtype)),
            false,
        )
        .with_warnings(detection.fallback.iter().cloned().collect());

        info!(
            "SMR evaluation ({}): {} ({} rows)",
            subtype,
            if result.passed { "PASS" } else { "FAIL" },
            self.rows.len()
        );
        result
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    /// Telecom point at nominal input and rated current, all within limits
    fn telecom_row() -> RectifierRow {
        RectifierRow {
            input_voltage: 230.0,
            input_current: 6.5,
            input_power: 1.45,
            power_factor: 0.99,
            input_vthd: 2.0,
            input_ithd: 4.0,
            output_voltage: 54.0,
            output_current: 25.0,
            output_power: 1.35,
            ripple_mv: 100.0,
            efficiency: 90.0,
        }
    }

    /// SMPS point at nominal input and rated current, all within limits
    fn smps_row() -> RectifierRow {
        RectifierRow {
            input_voltage: 230.0,
            power_factor: 0.97,
            output_voltage: 110.0,
            output_current: 20.0,
            efficiency: 92.0,
            ..telecom_row()
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn with_first_input(first_vin: f64, output_voltage: f64) -> Vec<RectifierRow> {
        let mut rows = vec![
            RectifierRow {
                output_voltage,
                ..telecom_row()
            };
            3
        ];
        rows[0].input_voltage = first_vin;
        rows
    }

    #[test]
    fn test_detect_smps() {
        let detection = detect_subtype(&with_first_input(230.0, 110.0)).unwrap();
        assert_eq!(detection.subtype, RectifierSubtype::Smps);
        assert_eq!(detection.mean_output_voltage, 110.0);
        assert!(detection.fallback.is_none());
    }

    #[test]
    fn test_detect_telecom_bands() {
        let re = detect_subtype(&with_first_input(165.0, 48.0)).unwrap();
        assert_eq!(re.subtype, RectifierSubtype::TelecomRe);
        assert!(re.fallback.is_none());

        let non_re = detect_subtype(&with_first_input(90.0, 48.0)).unwrap();
        assert_eq!(non_re.subtype, RectifierSubtype::TelecomNonRe);
        assert!(non_re.fallback.is_none());
    }

    #[test]
    #[traced_test]
    fn test_detect_fallback_is_reported() {
        let detection = detect_subtype(&with_first_input(40.0, 48.0)).unwrap();
        assert_eq!(detection.subtype, RectifierSubtype::TelecomRe);
        assert!(detection.fallback.is_some());
        assert!(logs_contain("matches neither"));

        let result = RectifierEngine::new(with_first_input(40.0, 48.0)).evaluate();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.summary.starts_with("Mode: Telecom RE\n"));
    }

    #[test]
    fn test_detect_mean_at_threshold_is_telecom() {
        let detection = detect_subtype(&with_first_input(165.0, 100.0)).unwrap();
        assert_eq!(detection.mean_output_voltage, 100.0);
        assert_eq!(detection.subtype, RectifierSubtype::TelecomRe);
    }

    #[test]
    fn test_detect_uses_mean_output_voltage() {
        let mut rows = with_first_input(165.0, 48.0);
        rows[2].output_voltage = 250.0; // mean (48 + 48 + 250) / 3 > 100
        assert_eq!(
            detect_subtype(&rows).map(|d| d.subtype),
            Some(RectifierSubtype::Smps)
        );
    }

    #[test]
    fn test_empty_grid_is_no_data() {
        let engine = RectifierEngine::new(vec![]);
        assert!(engine.subtype().is_none());
        let result = engine.evaluate();
        assert!(!result.passed);
        assert_eq!(result.summary, "No Data");
        assert!(result.invalid_cells.is_empty());
        assert!(result.abnormal_cells.is_empty());
    }

    #[test]
    fn test_smps_power_factor() {
        let rows = vec![
            smps_row(),
            RectifierRow {
                power_factor: -0.94,
                ..smps_row()
            }, // nominal point needs 0.95
            RectifierRow {
                power_factor: 0.92,
                output_current: 10.0,
                ..smps_row()
            }, // general point needs 0.90
            RectifierRow {
                power_factor: 0.89,
                input_voltage: 190.0,
                ..smps_row()
            },
        ];
        let outcome = RectifierEngine::new(rows).check_power_factor(RectifierSubtype::Smps);
        assert_eq!(outcome.invalid_ids("PF (in)"), Some(ids(&["3", "5"]).as_slice()));
    }

    #[test]
    fn test_telecom_power_factor_lead_lag() {
        let rows = vec![
            RectifierRow {
                power_factor: 0.97,
                ..telecom_row()
            }, // leading below 0.98
            RectifierRow {
                power_factor: -0.96,
                ..telecom_row()
            }, // lagging, |PF| ≥ 0.95
            RectifierRow {
                power_factor: -0.94,
                ..telecom_row()
            }, // lagging below 0.95
            RectifierRow {
                power_factor: 0.91,
                output_current: 10.0,
                ..telecom_row()
            }, // light load, general limit
            RectifierRow {
                power_factor: -0.89,
                output_current: 18.75,
                input_voltage: 200.0,
                ..telecom_row()
            }, // off-nominal input, general limit
            RectifierRow {
                power_factor: 0.98,
                output_current: 18.75,
                ..telecom_row()
            },
        ];
        let outcome = RectifierEngine::new(rows).check_power_factor(RectifierSubtype::TelecomRe);
        assert_eq!(
            outcome.invalid_ids("PF (in)"),
            Some(ids(&["2", "4", "6"]).as_slice())
        );
    }

    #[test]
    fn test_efficiency_limits_by_subtype() {
        let rows = vec![
            RectifierRow {
                efficiency: 84.0,
                ..telecom_row()
            }, // rated point → 85
            RectifierRow {
                efficiency: 81.0,
                output_current: 12.0,
                ..telecom_row()
            }, // general → 80
            RectifierRow {
                efficiency: 79.5,
                output_current: 12.0,
                ..telecom_row()
            },
        ];
        let engine = RectifierEngine::new(rows);
        let telecom = engine.check_efficiency(RectifierSubtype::TelecomNonRe);
        assert_eq!(telecom.invalid_ids("Efficiency"), Some(ids(&["2", "4"]).as_slice()));

        let smps_rows = vec![
            RectifierRow {
                efficiency: 89.0,
                ..smps_row()
            }, // rated point → 90
            RectifierRow {
                efficiency: 86.0,
                output_current: 12.0,
                ..smps_row()
            }, // general → 85
        ];
        let smps = RectifierEngine::new(smps_rows).check_efficiency(RectifierSubtype::Smps);
        assert_eq!(smps.invalid_ids("Efficiency"), Some(ids(&["2"]).as_slice()));
    }

    #[test]
    fn test_thd_checks() {
        let rows = vec![
            RectifierRow {
                input_ithd: 12.0,
                output_current: 12.0,
                ..telecom_row()
            }, // below half load → ignored
            RectifierRow {
                input_ithd: 10.0,
                output_current: 12.5,
                ..telecom_row()
            },
            RectifierRow {
                input_vthd: 9.0,
                ..telecom_row()
            },
        ];
        let engine = RectifierEngine::new(rows);

        let telecom = engine.check_thd(RectifierSubtype::TelecomRe);
        assert_eq!(telecom.invalid_ids("Ithd % (in)"), Some(ids(&["3"]).as_slice()));
        assert_eq!(telecom.invalid_ids("Vthd % (in)"), Some(&[][..]));

        let smps = engine.check_thd(RectifierSubtype::Smps);
        // SMPS half load is 10 A, so row 2 now counts too
        assert_eq!(smps.invalid_ids("Ithd % (in)"), Some(ids(&["2", "3"]).as_slice()));
        assert_eq!(smps.invalid_ids("Vthd % (in)"), Some(ids(&["4"]).as_slice()));
    }

    #[test]
    fn test_vthd_limit_is_inclusive() {
        let rows = [8.0, 9.99, 10.0]
            .into_iter()
            .map(|input_vthd| RectifierRow {
                input_vthd,
                ..telecom_row()
            })
            .collect();
        let engine = RectifierEngine::new(rows);

        let smps = engine.check_thd(RectifierSubtype::Smps);
        assert_eq!(smps.invalid_ids("Vthd % (in)"), Some(ids(&["2", "3", "4"]).as_slice()));

        let telecom = engine.check_thd(RectifierSubtype::TelecomNonRe);
        assert_eq!(telecom.invalid_ids("Vthd % (in)"), Some(ids(&["4"]).as_slice()));
    }

    #[test]
    fn test_output_voltage_bands() {
        let rows = vec![
            RectifierRow {
                output_voltage: 44.4,
                ..telecom_row()
            },
            RectifierRow {
                output_voltage: 44.3,
                ..telecom_row()
            },
            RectifierRow {
                output_voltage: 66.0,
                ..telecom_row()
            },
            RectifierRow {
                output_voltage: 66.1,
                ..telecom_row()
            },
        ];
        let outcome = RectifierEngine::new(rows).check_output_voltage(RectifierSubtype::TelecomRe);
        assert_eq!(outcome.invalid_ids("V (out)"), Some(ids(&["3", "5"]).as_slice()));

        let smps_rows = vec![
            RectifierRow {
                output_voltage: 101.0,
                ..smps_row()
            },
            RectifierRow {
                output_voltage: 138.16,
                ..smps_row()
            },
            RectifierRow {
                output_voltage: 138.2,
                ..smps_row()
            },
        ];
        let outcome = RectifierEngine::new(smps_rows).check_output_voltage(RectifierSubtype::Smps);
        assert_eq!(outcome.invalid_ids("V (out)"), Some(ids(&["2", "4"]).as_slice()));
    }

    #[test]
    fn test_ripple_boundary() {
        let rows = vec![
            RectifierRow {
                ripple_mv: 300.0,
                ..telecom_row()
            },
            RectifierRow {
                ripple_mv: 300.01,
                ..telecom_row()
            },
        ];
        let outcome = RectifierEngine::new(rows).check_ripple();
        assert_eq!(outcome.invalid_ids("Ripple (out)"), Some(ids(&["3"]).as_slice()));
    }

    #[test]
    fn test_evaluate_summary_and_order() {
        let mut rows = with_first_input(165.0, 54.0);
        rows.push(RectifierRow {
            ripple_mv: 450.0,
            efficiency: 97.0,
            ..telecom_row()
        });
        let engine = RectifierEngine::new(rows);
        let result = engine.evaluate();

        assert!(!result.passed);
        assert_eq!(
            result.summary,
            "Mode: Telecom RE\n\
             Invalid Ripple (out) in rows: 5\n\
             Abnormal Efficiency in rows: 5\n\
             RESULT: FAIL"
        );
        let columns: Vec<&str> = result.invalid_cells.iter().map(|(c, _)| c).collect();
        assert_eq!(
            columns,
            vec!["PF (in)", "Efficiency", "Ithd % (in)", "Vthd % (in)", "V (out)", "Ripple (out)"]
        );
        assert!(result.warnings.is_empty());
        assert_eq!(engine.evaluate(), result);
    }
}
