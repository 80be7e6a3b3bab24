//! Net present value and Internal Rate of Return (IRR)
//!
//! Cash flows are indexed by period, index 0 being the initial outflow.

/// Initial bisection bracket
const IRR_LOWER_BOUND: f64 = -0.999;
const IRR_UPPER_BOUND: f64 = 10.0;

/// Successive upper bounds tried when the initial bracket holds no sign change
const IRR_WIDENED_UPPER_BOUNDS: [f64; 3] = [20.0, 50.0, 100.0];

const IRR_TOLERANCE: f64 = 1e-9;
const IRR_MAX_ITERATIONS: usize = 200;

/// Below this every cash flow counts as zero
const ZERO_CASHFLOW: f64 = 1e-12;

/// Net present value `Σ CF_t / (1 + rate)^t`, t = 0..N
pub fn npv(rate: f64, cashflows: &[f64]) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// Calculate the Internal Rate of Return of a periodic cash-flow series
/// using bracketed bisection.
///
/// # Returns
/// * `Option<f64>` - Rate per period, or None when the series has no IRR
///   (all flows zero, or no sign change of the NPV within the widest bracket)
pub fn irr(cashflows: &[f64]) -> Option<f64> {
    if cashflows.iter().all(|cf| cf.abs() < ZERO_CASHFLOW) {
        return None;
    }

    let mut low = IRR_LOWER_BOUND;
    let mut high = IRR_UPPER_BOUND;
    let mut npv_low = npv(low, cashflows);
    let npv_high = npv(high, cashflows);

    if npv_low * npv_high > 0.0 {
        high = *IRR_WIDENED_UPPER_BOUNDS
            .iter()
            .find(|&&candidate| npv_low * npv(candidate, cashflows) <= 0.0)?;
    }

    for _ in 0..IRR_MAX_ITERATIONS {
        let mid = (low + high) / 2.0;
        let npv_mid = npv(mid, cashflows);

        if npv_mid.abs() < IRR_TOLERANCE {
            return Some(mid);
        }

        if npv_low * npv_mid <= 0.0 {
            high = mid;
        } else {
            low = mid;
            npv_low = npv_mid;
        }
    }

    Some((low + high) / 2.0)
}
