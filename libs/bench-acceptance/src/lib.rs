//! bench-acceptance - Acceptance rule engines for the power test bench
//!
//! Turns a captured measurement grid into a PASS/FAIL verdict with per-cell
//! annotations. Two device classes are supported:
//!
//! - **Regulator (AVR)**: output distortion, efficiency, output voltage,
//!   no-load consumption and regulation checks
//! - **Rectifier (SMR)**: variant detection (SMPS / Telecom RE / Telecom
//!   Non-RE), then power factor, efficiency, THD, output voltage and ripple
//!
//! All limits are fixed by the acceptance standard and are not configurable.
//! Engines are pure: no I/O, no state shared between evaluations.
//!
//! # Example
//!
//! ```rust
//! use bench_acceptance::{AcceptanceEngine, RectifierEngine, RectifierRow};
//!
//! let row = RectifierRow {
//!     input_voltage: 230.0,
//!     power_factor: 0.99,
//!     output_voltage: 54.0,
//!     output_current: 25.0,
//!     ripple_mv: 120.0,
//!     efficiency: 91.0,
//!     ..Default::default()
//! };
//! let result = RectifierEngine::new(vec![row; 4]).evaluate();
//! assert!(result.passed);
//! assert!(result.summary.starts_with("Mode: Telecom RE"));
//! ```
//!
//! # Row numbering
//!
//! Row ids in results are spreadsheet rows: grid index 0 is reported as
//! `"2"` because row 1 of an exported sheet is the header.

pub mod annotate;
pub mod device;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod rectifier;
pub mod regulator;
pub mod result;
pub mod row_ids;
pub mod rows;
pub mod tolerance;

// Re-exports for convenience
pub use annotate::{annotate, CellStatus};
pub use device::DeviceClass;
pub use engine::AcceptanceEngine;
pub use error::{AcceptanceError, Result};
pub use ingest::{rectifier_rows, regulator_rows, GridRecord, GridValue, NOT_APPLICABLE};
pub use rectifier::{detect_subtype, RectifierEngine, RectifierSubtype, SubtypeDetection};
pub use regulator::{RegulatorContext, RegulatorEngine};
pub use result::{AcceptanceResult, CellMap, CheckOutcome};
pub use row_ids::{row_ids, union_row_ids};
pub use rows::{columns, RectifierRow, RegulatorRow, RECTIFIER_COLUMNS, REGULATOR_COLUMNS};
