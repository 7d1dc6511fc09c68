//! Common engine interface

use crate::result::AcceptanceResult;

/// An acceptance engine bound to one captured grid
///
/// Evaluation is pure: it reads only the rows and context fixed at
/// construction, so repeated calls return identical results.
pub trait AcceptanceEngine: Send + Sync {
    fn evaluate(&self) -> AcceptanceResult;
}
