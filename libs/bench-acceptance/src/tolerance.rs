//! Tolerance predicates used by the acceptance checks
//!
//! All bounds are inclusive. Comparisons involving NaN are false.

/// `expected·(1−tol/100) ≤ measured ≤ expected·(1+tol/100)`
pub fn within_percent(measured: f64, expected: f64, tol_percent: f64) -> bool {
    let tol = tol_percent / 100.0;
    expected * (1.0 - tol) <= measured && measured <= expected * (1.0 + tol)
}

/// `target − tol ≤ measured ≤ target + tol`
pub fn within_absolute(measured: f64, target: f64, tol: f64) -> bool {
    target - tol <= measured && measured <= target + tol
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
