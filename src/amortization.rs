//! Fixed-payment loan amortization
//!
//! Debt service uses the nominal monthly convention `annual_rate / 12`.

use serde::{Deserialize, Serialize};

pub const MONTHS_IN_YEAR: u32 = 12;

/// Longest loan term given a schedule
pub const MAX_TERM_YEARS: u32 = 100;

/// Residual balance below which the last period is trued up to zero
const FINAL_BALANCE_EPSILON: f64 = 1e-6;

/// Same tolerance relative to the principal, for large loans
const FINAL_BALANCE_RELATIVE_EPSILON: f64 = 1e-9;

/// Constant monthly payment of a fully amortizing loan.
///
/// Returns 0 for a non-positive principal, an empty term or a term longer
/// than `MAX_TERM_YEARS`.
pub fn fixed_monthly_payment(principal: f64, annual_rate: f64, years: u32) -> f64 {
    if principal <= 0.0 || years == 0 || years > MAX_TERM_YEARS {
        return 0.0;
    }
    let n_months = years * MONTHS_IN_YEAR;

    let monthly_rate = annual_rate / MONTHS_IN_YEAR as f64;
    if monthly_rate == 0.0 {
        return principal / n_months as f64;
    }

    let factor = (1.0 + monthly_rate).powi(n_months as i32);
    principal * monthly_rate * factor / (factor - 1.0)
}

/// One month of the schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// Loan month (1-indexed)
    pub month: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    /// Balance after this month's payment
    pub balance: f64,
}

/// One loan year of the schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualScheduleRow {
    /// Loan year (1-indexed)
    pub year: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub end_balance: f64,
}

/// Month-by-month amortization schedule with its annual roll-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: f64,
    pub annual_rate: f64,
    pub years: u32,

    /// Constant monthly payment (the last month may differ by the rounding true-up)
    pub payment: f64,

    /// Monthly rows, `rows[m - 1]` is loan month `m`
    pub rows: Vec<ScheduleRow>,

    annual: Vec<AnnualScheduleRow>,
}

impl AmortizationSchedule {
    /// Build the full schedule. A non-positive principal, a zero term or a
    /// term beyond `MAX_TERM_YEARS` gives an empty schedule with a zero payment.
    pub fn new(principal: f64, annual_rate: f64, years: u32) -> Self {
        let payment = fixed_monthly_payment(principal, annual_rate, years);
        let rows = if payment > 0.0 {
            build_rows(principal, annual_rate, years, payment)
        } else {
            Vec::new()
        };
        let annual = aggregate_yearly(&rows);

        Self {
            principal,
            annual_rate,
            years,
            payment,
            rows,
            annual,
        }
    }

    /// Number of scheduled months
    pub fn term_months(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Annual roll-up, `annual()[y - 1]` is loan year `y`
    pub fn annual(&self) -> &[AnnualScheduleRow] {
        &self.annual
    }

    /// Row for a loan month, `None` outside `1..=term_months()`
    pub fn row(&self, month: u32) -> Option<&ScheduleRow> {
        if month == 0 {
            return None;
        }
        self.rows.get((month - 1) as usize)
    }

    /// Roll-up for a loan year, `None` outside the term
    pub fn year(&self, year: u32) -> Option<&AnnualScheduleRow> {
        if year == 0 {
            return None;
        }
        self.annual.get((year - 1) as usize)
    }

    /// Debt service due in a month: the constant payment while the loan runs,
    /// zero once the schedule is exhausted.
    pub fn payment_at(&self, month: u32) -> f64 {
        if month >= 1 && month <= self.term_months() {
            self.payment
        } else {
            0.0
        }
    }

    /// Balance after the given month's payment.
    /// Month 0 is the original principal; past the term the loan is repaid.
    pub fn balance_at_month(&self, month: u32) -> f64 {
        if month == 0 {
            return self.principal.max(0.0);
        }
        self.row(month).map(|r| r.balance).unwrap_or(0.0)
    }

    /// Balance at the end of a loan year (year 0 is the original principal)
    pub fn balance_at_year(&self, year: u32) -> f64 {
        if year == 0 {
            return self.principal.max(0.0);
        }
        self.year(year).map(|r| r.end_balance).unwrap_or(0.0)
    }

    pub fn total_interest(&self) -> f64 {
        self.rows.iter().map(|r| r.interest).sum()
    }
}

fn build_rows(principal: f64, annual_rate: f64, years: u32, payment: f64) -> Vec<ScheduleRow> {
    let n_months = years * MONTHS_IN_YEAR;
    let monthly_rate = annual_rate / MONTHS_IN_YEAR as f64;

    let tolerance = FINAL_BALANCE_EPSILON.max(principal * FINAL_BALANCE_RELATIVE_EPSILON);

    let mut rows = Vec::with_capacity(n_months as usize);
    let mut balance = principal;

    for month in 1..=n_months {
        let interest = balance * monthly_rate;
        // Extreme rates would otherwise produce negative amortization
        let mut principal_component = (payment - interest).max(0.0);
        let mut month_payment = payment;
        let mut new_balance = balance - principal_component;

        if month == n_months && new_balance.abs() < tolerance {
            principal_component += new_balance;
            month_payment = interest + principal_component;
            new_balance = 0.0;
        }

        let new_balance = new_balance.max(0.0);
        rows.push(ScheduleRow {
            month,
            payment: month_payment,
            interest,
            principal: principal_component,
            balance: new_balance,
        });
        balance = new_balance;
    }

    rows
}

/// Group monthly rows by loan year: flows summed, balance taken at year end.
pub fn aggregate_yearly(rows: &[ScheduleRow]) -> Vec<AnnualScheduleRow> {
    rows.chunks(MONTHS_IN_YEAR as usize)
        .enumerate()
        .map(|(i, chunk)| AnnualScheduleRow {
            year: i as u32 + 1,
            payment: chunk.iter().map(|r| r.payment).sum(),
            interest: chunk.iter().map(|r| r.interest).sum(),
            principal: chunk.iter().map(|r| r.principal).sum(),
            end_balance: chunk.last().map(|r| r.balance).unwrap_or(0.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_fixed_payment_known_case() {
        // 100k at 5% over 20 years
        let payment = fixed_monthly_payment(100_000.0, 0.05, 20);
        assert_abs_diff_eq!(payment, 659.96, epsilon = 0.1);
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let schedule = AmortizationSchedule::new(120_000.0, 0.0, 10);
        assert_abs_diff_eq!(schedule.payment, 1_000.0, epsilon = 1e-9);
        assert!(schedule.rows.iter().all(|r| r.interest == 0.0));
        assert_eq!(schedule.rows.last().unwrap().balance, 0.0);
    }

    #[test]
    fn test_degenerate_inputs_give_empty_schedule() {
        for schedule in [
            AmortizationSchedule::new(0.0, 0.04, 25),
            AmortizationSchedule::new(-5_000.0, 0.04, 25),
            AmortizationSchedule::new(200_000.0, 0.04, 0),
            AmortizationSchedule::new(200_000.0, 0.04, MAX_TERM_YEARS + 1),
            AmortizationSchedule::new(200_000.0, 0.04, 400_000_000),
        ] {
            assert!(schedule.is_empty());
            assert_eq!(schedule.payment, 0.0);
            assert!(schedule.annual().is_empty());
            assert_eq!(schedule.payment_at(1), 0.0);
        }
    }

    #[test]
    fn test_longest_term_is_scheduled() {
        let schedule = AmortizationSchedule::new(200_000.0, 0.04, MAX_TERM_YEARS);
        assert_eq!(schedule.term_months(), MAX_TERM_YEARS * 12);
        assert_eq!(schedule.rows.last().unwrap().balance, 0.0);
    }

    #[test]
    fn test_schedule_ends_at_zero() {
        let schedule = AmortizationSchedule::new(200_000.0, 0.04, 25);
        assert_eq!(schedule.term_months(), 300);
        assert_eq!(schedule.rows.last().unwrap().balance, 0.0);
        assert_eq!(schedule.balance_at_year(25), 0.0);
    }

    #[test]
    fn test_true_up_only_touches_last_month() {
        let schedule = AmortizationSchedule::new(200_000.0, 0.04, 25);
        let n = schedule.rows.len();
        for row in &schedule.rows[..n - 1] {
            assert_eq!(row.payment, schedule.payment);
        }
        assert_abs_diff_eq!(schedule.rows[n - 1].payment, schedule.payment, epsilon = 1e-5);
    }

    #[test]
    fn test_annual_rollup() {
        let schedule = AmortizationSchedule::new(200_000.0, 0.04, 25);
        let annual = schedule.annual();
        assert_eq!(annual.len(), 25);

        let first = &annual[0];
        assert_eq!(first.year, 1);
        assert_abs_diff_eq!(first.payment, schedule.payment * 12.0, epsilon = 1e-6);
        assert_abs_diff_eq!(first.interest + first.principal, first.payment, epsilon = 1e-6);
        assert_eq!(first.end_balance, schedule.rows[11].balance);

        let total_principal: f64 = annual.iter().map(|y| y.principal).sum();
        assert_abs_diff_eq!(total_principal, 200_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_out_of_range_lookups_fall_back_to_zero() {
        let schedule = AmortizationSchedule::new(100_000.0, 0.03, 1);
        assert!(schedule.row(0).is_none());
        assert!(schedule.row(13).is_none());
        assert_eq!(schedule.payment_at(13), 0.0);
        assert_eq!(schedule.balance_at_month(40), 0.0);
        assert_eq!(schedule.balance_at_year(2), 0.0);
        assert_eq!(schedule.balance_at_month(0), 100_000.0);
        assert_eq!(schedule.balance_at_year(0), 100_000.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_balance_non_increasing_and_ends_at_zero(
            principal in 1_000u32..1_000_000,
            rate_bp in 0u32..1000,
            years in 1u32..31,
        ) {
            let schedule = AmortizationSchedule::new(principal as f64, rate_bp as f64 / 10_000.0, years);
            prop_assert_eq!(schedule.rows.len() as u32, years * 12);
            prop_assert_eq!(schedule.rows.last().unwrap().balance, 0.0);

            let mut previous = principal as f64;
            for row in &schedule.rows {
                prop_assert!(row.balance <= previous);
                prop_assert!(row.balance >= 0.0);
                previous = row.balance;
            }
        }
    }
}
