//! Typed measurement rows
//!
//! One struct per device class. Field names on the wire are the grid column
//! headers, so rows serialize straight back into report columns.

use serde::{Deserialize, Serialize};

// ============================================================================
// Column names
// ============================================================================

/// Grid column headers, as shown to the operator and in reports
pub mod columns {
    pub const FREQUENCY: &str = "Frequency";
    pub const V_IN: &str = "V (in)";
    pub const I_IN: &str = "I (in)";
    pub const KW_IN: &str = "kW (in)";
    pub const P_IN: &str = "P (in)";
    pub const PF_IN: &str = "PF (in)";
    pub const VTHD_IN: &str = "Vthd % (in)";
    pub const ITHD_IN: &str = "Ithd % (in)";
    pub const V_OUT: &str = "V (out)";
    pub const I_OUT: &str = "I (out)";
    pub const KW_OUT: &str = "kW (out)";
    pub const P_OUT: &str = "P (out)";
    pub const VTHD_OUT: &str = "VTHD (out)";
    pub const RIPPLE_OUT: &str = "Ripple (out)";
    pub const EFFICIENCY: &str = "Efficiency";
    pub const LOAD_REGULATION: &str = "Load";
    pub const LINE_REGULATION: &str = "Line";
}

/// Regulator grid headers in report order
pub const REGULATOR_COLUMNS: [&str; 11] = [
    columns::FREQUENCY,
    columns::V_IN,
    columns::I_IN,
    columns::KW_IN,
    columns::V_OUT,
    columns::I_OUT,
    columns::KW_OUT,
    columns::VTHD_OUT,
    columns::EFFICIENCY,
    columns::LOAD_REGULATION,
    columns::LINE_REGULATION,
];

/// Rectifier grid headers in report order
pub const RECTIFIER_COLUMNS: [&str; 11] = [
    columns::V_IN,
    columns::I_IN,
    columns::P_IN,
    columns::PF_IN,
    columns::VTHD_IN,
    columns::ITHD_IN,
    columns::V_OUT,
    columns::I_OUT,
    columns::P_OUT,
    columns::RIPPLE_OUT,
    columns::EFFICIENCY,
];

// ============================================================================
// Regulator (AVR)
// ============================================================================

/// One AC regulator test point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegulatorRow {
    #[serde(rename = "Frequency")]
    pub frequency: f64,

    #[serde(rename = "V (in)")]
    pub input_voltage: f64,

    #[serde(rename = "I (in)")]
    pub input_current: f64,

    /// Input power (kW)
    #[serde(rename = "kW (in)")]
    pub input_power_kw: f64,

    #[serde(rename = "V (out)")]
    pub output_voltage: f64,

    #[serde(rename = "I (out)")]
    pub output_current: f64,

    /// Output power (kW)
    #[serde(rename = "kW (out)")]
    pub output_power_kw: f64,

    /// Output voltage THD (%)
    #[serde(rename = "VTHD (out)")]
    pub output_vthd: f64,

    /// Efficiency (%)
    #[serde(rename = "Efficiency")]
    pub efficiency: f64,

    /// Load regulation (%), `None` when not measured at this point
    #[serde(rename = "Load")]
    pub load_regulation: Option<f64>,

    /// Line regulation (%), `None` when not measured at this point
    #[serde(rename = "Line")]
    pub line_regulation: Option<f64>,
}

// ============================================================================
// Rectifier (SMR)
// ============================================================================

/// One DC rectifier test point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RectifierRow {
    #[serde(rename = "V (in)")]
    pub input_voltage: f64,

    #[serde(rename = "I (in)")]
    pub input_current: f64,

    #[serde(rename = "P (in)")]
    pub input_power: f64,

    /// Signed input power factor (negative = lagging)
    #[serde(rename = "PF (in)")]
    pub power_factor: f64,

    /// Input voltage THD (%)
    #[serde(rename = "Vthd % (in)")]
    pub input_vthd: f64,

    /// Input current THD (%)
    #[serde(rename = "Ithd % (in)")]
    pub input_ithd: f64,

    #[serde(rename = "V (out)")]
    pub output_voltage: f64,

    #[serde(rename = "I (out)")]
    pub output_current: f64,

    #[serde(rename = "P (out)")]
    pub output_power: f64,

    /// Output ripple, peak to peak (mV)
    #[serde(rename = "Ripple (out)")]
    pub ripple_mv: f64,

    /// Efficiency (%)
    #[serde(rename = "Efficiency")]
    pub efficiency: f64,
}
