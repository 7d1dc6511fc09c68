//! Regulator (AVR) acceptance engine
//!
//! Evaluates a unidirectional AC regulator grid against fixed limits:
//! output distortion, efficiency, output voltage regulation, no-load
//! consumption and load/line regulation.
//!
//! The third row (index 2) is the rated reference point: rated power comes
//! from its output kW and rated input current is its measured input current.
//! At least three rows are therefore required.
//!
//! All checks run on every evaluation, in a fixed order, regardless of
//! earlier failures. Each check returns its own [`CheckOutcome`] and
//! [`RegulatorEngine::evaluate`] merges them.

use tracing::{debug, info};

use crate::engine::AcceptanceEngine;
use crate::error::{AcceptanceError, Result};
use crate::result::{merge_outcomes, AcceptanceResult, CheckOutcome};
use crate::row_ids::{row_ids, union_row_ids};
use crate::rows::{columns, RegulatorRow};
use crate::tolerance::{round_to, within_percent};

// ============================================================================
// Fixed limits
// ============================================================================

/// Nominal output voltage (V)
pub const RATED_OUTPUT_VOLTAGE: f64 = 230.0;

/// Minimum grid size; row index 2 is the rated reference
pub const MIN_ROWS: usize = 3;

/// Index of the rated reference row
pub const REFERENCE_ROW: usize = 2;

/// Output voltage THD limit (%)
pub const VTHD_LIMIT: f64 = 8.0;

/// Minimum efficiency at full load (%)
pub const EFFICIENCY_MIN: f64 = 85.0;

/// Efficiency above this is flagged abnormal (%)
pub const EFFICIENCY_ABNORMAL: f64 = 96.0;

/// Input voltage tolerance (%)
pub const INPUT_VOLTAGE_TOL: f64 = 5.0;

/// Output voltage tolerance at nominal input or full load (%)
pub const OUTPUT_VOLTAGE_TOL: f64 = 1.0;

/// Load current tolerance for the full-load band (%)
pub const LOAD_CURRENT_TOL: f64 = 10.0;

/// General output band: 230 V −4 % / +4 %
pub const UNDER_VOLTAGE_FACTOR: f64 = 0.96;
pub const OVER_VOLTAGE_FACTOR: f64 = 1.04;

/// Input voltage at which load regulation is relaxed (V)
pub const LOW_LINE_VOLTAGE: f64 = 160.0;

/// Load regulation limit at low line (%)
pub const LOW_LINE_LOAD_REGULATION_LIMIT: f64 = 4.0;

/// Load regulation limit otherwise (%)
pub const LOAD_REGULATION_LIMIT: f64 = 1.0;

/// Line regulation limit (%)
pub const LINE_REGULATION_LIMIT: f64 = 1.0;

/// No-load input power limit as a fraction of rated power
pub const NO_LOAD_POWER_FRACTION: f64 = 0.1;

/// No-load input current limit as a fraction of rated input current
pub const NO_LOAD_CURRENT_FRACTION: f64 = 0.25;

// ============================================================================
// Evaluation context
// ============================================================================

/// Ratings derived once from the reference row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegulatorContext {
    /// Rated output power (W)
    pub rated_power: f64,

    /// Rated load current (A), rated power / 230 V rounded to 2 decimals
    pub rated_load_current: f64,

    /// Input current measured at the reference row (A)
    pub rated_input_current: f64,
}

impl RegulatorContext {
    fn from_reference(reference: &RegulatorRow) -> Self {
        let rated_power = reference.output_power_kw.abs() * 1000.0;
        Self {
            rated_power,
            rated_load_current: round_to(rated_power / RATED_OUTPUT_VOLTAGE, 2),
            rated_input_current: reference.input_current,
        }
    }

    /// Output current within ±10 % of rated load current
    pub fn is_full_load(&self, output_current: f64) -> bool {
        within_percent(output_current, self.rated_load_current, LOAD_CURRENT_TOL)
    }
}

/// Integer-truncated output current is zero
fn is_no_load(output_current: f64) -> bool {
    output_current.trunc() == 0.0
}

fn output_in_band(output_voltage: f64) -> bool {
    within_percent(output_voltage, RATED_OUTPUT_VOLTAGE, OUTPUT_VOLTAGE_TOL)
}

// ============================================================================
// Engine
// ============================================================================

/// Regulator acceptance engine over one captured grid
#[derive(Debug, Clone)]
pub struct RegulatorEngine {
    rows: Vec<RegulatorRow>,
    context: RegulatorContext,
}

impl RegulatorEngine {
    /// Create an engine for a grid
    ///
    /// Fails with [`AcceptanceError::InsufficientData`] for fewer than
    /// three rows.
    pub fn new(rows: Vec<RegulatorRow>) -> Result<Self> {
        if rows.len() < MIN_ROWS {
            return Err(AcceptanceError::insufficient_data(MIN_ROWS, rows.len()));
        }
        let context = RegulatorContext::from_reference(&rows[REFERENCE_ROW]);
        debug!(
            "Regulator context: rated_power={}W rated_load_current={}A rated_input_current={}A",
            context.rated_power, context.rated_load_current, context.rated_input_current
        );
        Ok(Self { rows, context })
    }

    pub fn context(&self) -> &RegulatorContext {
        &self.context
    }

    fn flags(&self, predicate: impl Fn(&RegulatorRow) -> bool) -> Vec<bool> {
        self.rows.iter().map(predicate).collect()
    }

    /// Output voltage THD ≥ 8 % fails
    pub fn check_output_distortion(&self) -> CheckOutcome {
        let invalid = self.flags(|r| r.output_vthd >= VTHD_LIMIT);
        CheckOutcome::new().invalid(columns::VTHD_OUT, row_ids(&invalid))
    }

    /// Efficiency < 85 % fails at full load; > 96 % is abnormal anywhere
    pub fn check_efficiency(&self) -> CheckOutcome {
        let ctx = &self.context;
        let invalid =
            self.flags(|r| ctx.is_full_load(r.output_current) && r.efficiency < EFFICIENCY_MIN);
        let abnormal = self.flags(|r| r.efficiency > EFFICIENCY_ABNORMAL);
        CheckOutcome::new()
            .invalid(columns::EFFICIENCY, row_ids(&invalid))
            .abnormal(columns::EFFICIENCY, row_ids(&abnormal))
    }

    /// Output voltage: ±4 % band everywhere, ±1 % at nominal input or full load
    pub fn check_output_voltage(&self) -> CheckOutcome {
        let ctx = &self.context;

        let under = self.flags(|r| r.output_voltage < RATED_OUTPUT_VOLTAGE * UNDER_VOLTAGE_FACTOR);
        let over = self.flags(|r| r.output_voltage > RATED_OUTPUT_VOLTAGE * OVER_VOLTAGE_FACTOR);
        let nominal_input = self.flags(|r| {
            within_percent(r.input_voltage, RATED_OUTPUT_VOLTAGE, INPUT_VOLTAGE_TOL)
                && !output_in_band(r.output_voltage)
        });
        let full_load = self.flags(|r| {
            ctx.is_full_load(r.output_current) && !output_in_band(r.output_voltage)
        });

        let sets = [
            row_ids(&under),
            row_ids(&over),
            row_ids(&nominal_input),
            row_ids(&full_load),
        ];
        CheckOutcome::new().invalid(
            columns::V_OUT,
            union_row_ids(sets.iter().map(Vec::as_slice)),
        )
    }

    /// No-load input power and input current
    ///
    /// The no-load current flag is reported under the `I (out)` column.
    pub fn check_no_load(&self) -> CheckOutcome {
        let ctx = &self.context;
        let power_limit_kw = NO_LOAD_POWER_FRACTION * ctx.rated_power / 1000.0;
        let current_limit = NO_LOAD_CURRENT_FRACTION * ctx.rated_input_current;

        let power = self.flags(|r| is_no_load(r.output_current) && r.input_power_kw > power_limit_kw);
        let current =
            self.flags(|r| is_no_load(r.output_current) && r.input_current > current_limit);

        CheckOutcome::new()
            .invalid(columns::KW_IN, row_ids(&power))
            .invalid(columns::I_OUT, row_ids(&current))
    }

    /// Load and line regulation; unmeasured points are skipped
    pub fn check_regulation(&self) -> CheckOutcome {
        let load = self.flags(|r| match r.load_regulation {
            Some(value) => {
                let limit = if within_percent(r.input_voltage, LOW_LINE_VOLTAGE, INPUT_VOLTAGE_TOL) {
                    LOW_LINE_LOAD_REGULATION_LIMIT
                } else {
                    LOAD_REGULATION_LIMIT
                };
                value.abs() > limit
            },
            None => false,
        });
        let line = self.flags(|r| {
            r.line_regulation
                .is_some_and(|value| value.abs() > LINE_REGULATION_LIMIT)
        });

        CheckOutcome::new()
            .invalid(columns::LOAD_REGULATION, row_ids(&load))
            .invalid(columns::LINE_REGULATION, row_ids(&line))
    }
}

impl AcceptanceEngine for RegulatorEngine {
    fn evaluate(&self) -> AcceptanceResult {
        let outcomes = [
            self.check_output_distortion(),
            self.check_efficiency(),
            self.check_output_voltage(),
            self.check_no_load(),
            self.check_regulation(),
        ];
        for outcome in &outcomes {
            for (column, ids) in &outcome.invalid {
                debug!("Regulator check {}: {} invalid", column, ids.len());
            }
        }

        let (invalid, abnormal) = merge_outcomes(outcomes);
        let result = AcceptanceResult::from_cells(invalid, abnormal, None, true);
        info!(
            "Regulator evaluation: {} ({} rows)",
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

    /// A clean point: nominal input, full load on a 2 kW unit
    fn row() -> RegulatorRow {
        RegulatorRow {
            frequency: 50.0,
            input_voltage: 230.0,
            input_current: 9.0,
            input_power_kw: 2.2,
            output_voltage: 230.0,
            output_current: 8.7,
            output_power_kw: 2.0,
            output_vthd: 1.5,
            efficiency: 91.0,
            load_regulation: None,
            line_regulation: None,
        }
    }

    /// Light-load point away from nominal input: only the ±4 % band applies
    fn off_nominal_row() -> RegulatorRow {
        RegulatorRow {
            input_voltage: 180.0,
            output_current: 4.0,
            ..row()
        }
    }

    fn engine(rows: Vec<RegulatorRow>) -> RegulatorEngine {
        RegulatorEngine::new(rows).unwrap()
    }

    #[test]
    fn test_requires_three_rows() {
        let err = RegulatorEngine::new(vec![row(), row()]).unwrap_err();
        assert_eq!(err, AcceptanceError::insufficient_data(3, 2));
        assert!(RegulatorEngine::new(vec![]).is_err());
    }

    #[test]
    fn test_context_from_reference_row() {
        let mut rows = vec![row(), row(), row()];
        rows[0].output_power_kw = -1.0;
        rows[2].output_power_kw = -2.0;
        rows[2].input_current = 9.0;
        let engine = engine(rows);
        let ctx = engine.context();
        assert_eq!(ctx.rated_power, 2000.0);
        assert_eq!(ctx.rated_load_current, 8.7);
        assert_eq!(ctx.rated_input_current, 9.0);
    }

    #[test]
    fn test_output_distortion_limit_inclusive() {
        let mut rows = vec![row(); 4];
        rows[1].output_vthd = 8.0;
        rows[3].output_vthd = 7.99;
        let outcome = engine(rows).check_output_distortion();
        assert_eq!(outcome.invalid_ids("VTHD (out)"), Some(&["3".to_string()][..]));
    }

    #[test]
    fn test_efficiency_fail_only_at_full_load() {
        let mut rows = vec![row(); 4];
        rows[0].efficiency = 80.0; // full load → invalid
        rows[1] = RegulatorRow {
            efficiency: 80.0,
            ..off_nominal_row()
        }; // light load → ignored
        let outcome = engine(rows).check_efficiency();
        assert_eq!(outcome.invalid_ids("Efficiency"), Some(&["2".to_string()][..]));
        assert_eq!(outcome.abnormal_ids("Efficiency"), Some(&[][..]));
    }

    #[test]
    fn test_abnormal_efficiency_independent_of_fail() {
        let mut rows = vec![row(); 3];
        rows[1] = RegulatorRow {
            efficiency: 97.0,
            ..off_nominal_row()
        };
        let result = engine(rows).evaluate();
        assert_eq!(result.abnormal_cells.get("Efficiency"), Some(&["3".to_string()][..]));
        assert_eq!(result.invalid_cells.get("Efficiency"), Some(&[][..]));
        assert!(result.passed);
    }

    #[test]
    fn test_over_voltage_boundary() {
        let mut rows = vec![row(); 4];
        rows[1] = RegulatorRow {
            output_voltage: 239.2,
            ..off_nominal_row()
        };
        rows[3] = RegulatorRow {
            output_voltage: 239.21,
            ..off_nominal_row()
        };
        let outcome = engine(rows).check_output_voltage();
        assert_eq!(outcome.invalid_ids("V (out)"), Some(&["5".to_string()][..]));
    }

    #[test]
    fn test_under_voltage() {
        let mut rows = vec![row(); 4];
        rows[3] = RegulatorRow {
            output_voltage: 220.0,
            ..off_nominal_row()
        };
        let outcome = engine(rows).check_output_voltage();
        assert_eq!(outcome.invalid_ids("V (out)"), Some(&["5".to_string()][..]));
    }

    #[test]
    fn test_output_voltage_sub_rules_union() {
        let mut rows = vec![row(); 12];
        // nominal input, light load: outside ±1 %
        rows[0] = RegulatorRow {
            input_voltage: 230.0,
            output_current: 4.0,
            output_voltage: 233.0,
            ..row()
        };
        // off-nominal input, full load: outside ±1 %
        rows[1] = RegulatorRow {
            input_voltage: 180.0,
            output_voltage: 226.0,
            ..row()
        };
        // nominal input and full load and over-voltage: all rules hit one row
        rows[10] = RegulatorRow {
            output_voltage: 240.0,
            ..row()
        };
        let outcome = engine(rows).check_output_voltage();
        let expected: Vec<String> = vec!["2".into(), "3".into(), "12".into()];
        assert_eq!(outcome.invalid_ids("V (out)"), Some(expected.as_slice()));
    }

    #[test]
    fn test_no_load_checks() {
        let mut rows = vec![row(); 5];
        // rated power 2000 W → limit 0.2 kW; rated input current 9 A → limit 2.25 A
        rows[3] = RegulatorRow {
            output_current: 0.6,
            input_power_kw: 0.25,
            input_current: 1.0,
            ..row()
        };
        rows[4] = RegulatorRow {
            output_current: 0.0,
            input_power_kw: 0.1,
            input_current: 3.0,
            ..row()
        };
        let outcome = engine(rows).check_no_load();
        assert_eq!(outcome.invalid_ids("kW (in)"), Some(&["5".to_string()][..]));
        assert_eq!(outcome.invalid_ids("I (out)"), Some(&["6".to_string()][..]));
    }

    #[test]
    fn test_no_load_ignores_loaded_rows() {
        let mut rows = vec![row(); 3];
        rows[0].input_power_kw = 5.0;
        rows[0].input_current = 30.0;
        let outcome = engine(rows).check_no_load();
        assert_eq!(outcome.invalid_ids("kW (in)"), Some(&[][..]));
        assert_eq!(outcome.invalid_ids("I (out)"), Some(&[][..]));
    }

    #[test]
    fn test_regulation_limits() {
        let mut rows = vec![row(); 6];
        rows[0].load_regulation = Some(1.5); // 230 V → limit 1 %
        rows[1] = RegulatorRow {
            input_voltage: 160.0,
            load_regulation: Some(-3.5),
            ..off_nominal_row()
        }; // low line → limit 4 %
        rows[2] = RegulatorRow {
            input_voltage: 160.0,
            load_regulation: Some(4.5),
            ..off_nominal_row()
        };
        rows[3].line_regulation = Some(-1.2);
        rows[4].line_regulation = Some(1.0);
        let outcome = engine(rows).check_regulation();
        assert_eq!(
            outcome.invalid_ids("Load"),
            Some(&["2".to_string(), "4".to_string()][..])
        );
        assert_eq!(outcome.invalid_ids("Line"), Some(&["5".to_string()][..]));
    }

    #[test]
    fn test_clean_grid_passes() {
        let result = engine(vec![row(); 6]).evaluate();
        assert!(result.passed);
        assert_eq!(
            result.summary,
            "RESULT: PASS\nLEGEND: [RED: FAIL, YELLOW: PASS BUT ABNORMAL, GREEN: PASS]"
        );
        let columns: Vec<&str> = result.invalid_cells.iter().map(|(c, _)| c).collect();
        assert_eq!(
            columns,
            vec!["VTHD (out)", "Efficiency", "V (out)", "kW (in)", "I (out)", "Load", "Line"]
        );
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut rows = vec![row(); 6];
        rows[2].output_vthd = 9.0;
        rows[5].efficiency = 98.0;
        let engine = engine(rows);
        let first = engine.evaluate();
        let second = engine.evaluate();
        assert_eq!(first, second);
        assert!(!first.passed);
        assert_eq!(
            first.summary,
            "Invalid VTHD (out) in rows: 4\n\
             Abnormal Efficiency in rows: 7\n\
             RESULT: FAIL\n\
             LEGEND: [RED: FAIL, YELLOW: PASS BUT ABNORMAL, GREEN: PASS]"
        );
    }
}
