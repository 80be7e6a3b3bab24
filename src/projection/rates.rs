//! Rate conversions and compounding helpers
//!
//! Reinvested capital compounds at the effective monthly equivalent of an
//! annual rate, unlike debt service which uses the nominal `r / 12`.

use serde::{Deserialize, Serialize};

/// Effective monthly rate `(1 + r)^(1/12) - 1`.
/// A rate of -100% or below gives 0.
pub fn monthly_rate_from_annual(annual_rate: f64) -> f64 {
    if annual_rate <= -1.0 {
        return 0.0;
    }
    (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0
}

/// Compound `value` at `annual_rate` for `years` (identity for years <= 0)
pub fn grow(value: f64, annual_rate: f64, years: i32) -> f64 {
    if years <= 0 {
        return value;
    }
    value * (1.0 + annual_rate).powi(years)
}

/// Capital compounded monthly while a monthly payment is withdrawn.
///
/// The withdrawal itself grows each month at the effective monthly
/// equivalent of `payment_growth_annual`.
pub fn future_value_with_monthly_withdrawals(
    capital: f64,
    annual_rate: f64,
    monthly_payment: f64,
    months: u32,
    payment_growth_annual: f64,
) -> f64 {
    let r_m = monthly_rate_from_annual(annual_rate);
    let g_m = monthly_rate_from_annual(payment_growth_annual);

    let mut value = capital;
    let mut payment = monthly_payment;
    for _ in 0..months {
        value = value * (1.0 + r_m) - payment;
        payment *= 1.0 + g_m;
    }
    value
}

/// One year of the reference benchmark: capital left invested versus rent paid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRow {
    pub year: u32,
    /// Capital compounded yearly, rent not withdrawn
    pub invested_value: f64,
    /// Rent paid up to the end of the year, indexed on inflation
    pub cumulative_rent: f64,
    pub net: f64,
}

/// Benchmark table for years 0..=years.
///
/// Annual rent in year y is `12 * monthly_rent * (1 + inflation)^(y - 1)`.
pub fn benchmark_table(
    capital: f64,
    annual_rate: f64,
    monthly_rent: f64,
    years: u32,
    inflation_rate: f64,
) -> Vec<BenchmarkRow> {
    let mut cumulative_rent = 0.0;
    (0..=years)
        .map(|year| {
            if year > 0 {
                cumulative_rent += grow(12.0 * monthly_rent, inflation_rate, year as i32 - 1);
            }
            let invested_value = grow(capital, annual_rate, year as i32);
            BenchmarkRow {
                year,
                invested_value,
                cumulative_rent,
                net: invested_value - cumulative_rent,
            }
        })
        .collect()
}
