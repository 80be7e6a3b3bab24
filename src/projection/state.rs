//! Running state carried month to month through a scenario simulation

use crate::amortization::MONTHS_IN_YEAR;

/// State of a scenario at a point in time during simulation
#[derive(Debug, Clone)]
pub struct ScenarioState {
    /// Current simulation month (1-indexed, 0 before the first month)
    pub global_month: u32,

    /// Simulation year (1-indexed, 0 before the first month)
    pub year: u32,

    /// Month within the year (1-12)
    pub month_in_year: u32,

    /// Running sum of every period cash flow, opening outflow included
    pub cumulative_cash: f64,

    /// Compounded value of the investment account
    pub invested_value: f64,

    /// Capital contributed to the investment account (gains-tax basis)
    pub invested_principal: f64,
}

impl ScenarioState {
    /// State at purchase: the down payment has left, nothing is invested
    pub fn purchase(down_payment: f64) -> Self {
        Self {
            global_month: 0,
            year: 0,
            month_in_year: 0,
            cumulative_cash: -down_payment,
            invested_value: 0.0,
            invested_principal: 0.0,
        }
    }

    /// State of a renter who invests the down payment instead of spending it
    pub fn invested(capital: f64) -> Self {
        Self {
            invested_value: capital,
            invested_principal: capital,
            ..Self::purchase(capital)
        }
    }

    /// Advance to next month
    pub fn advance_month(&mut self) {
        self.global_month += 1;
        self.year = (self.global_month - 1) / MONTHS_IN_YEAR + 1;
        self.month_in_year = (self.global_month - 1) % MONTHS_IN_YEAR + 1;
    }

    pub fn is_year_end(&self) -> bool {
        self.month_in_year == MONTHS_IN_YEAR
    }

    /// Whether this is the last month of a `horizon_years` simulation
    pub fn is_final_month(&self, horizon_years: u32) -> bool {
        self.global_month == horizon_years * MONTHS_IN_YEAR
    }

    /// Apply one month of growth to the investment account
    pub fn compound(&mut self, monthly_rate: f64) {
        self.invested_value += self.invested_value * monthly_rate;
    }

    /// Add fresh capital to the investment account
    pub fn deposit(&mut self, amount: f64) {
        self.invested_value += amount;
        self.invested_principal += amount;
    }

    /// Route a monthly net flow: a surplus is invested as new principal and
    /// leaves nothing in the period; a shortfall is the period's cash flow
    /// and is never drawn from invested capital.
    pub fn sweep(&mut self, flow: f64) -> f64 {
        if flow >= 0.0 {
            self.deposit(flow);
            0.0
        } else {
            flow
        }
    }

    /// Cash returned by liquidating the account, gains taxed at `tax_rate`
    pub fn realize(&self, tax_rate: f64) -> f64 {
        let gains = self.invested_value - self.invested_principal;
        gains * (1.0 - tax_rate) + self.invested_principal
    }

    /// Book a period cash flow
    pub fn record(&mut self, cash_flow: f64) {
        self.cumulative_cash += cash_flow;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_timing() {
        let mut state = ScenarioState::purchase(50_000.0);
        for _ in 0..13 {
            state.advance_month();
        }
        assert_eq!(state.global_month, 13);
        assert_eq!(state.year, 2);
        assert_eq!(state.month_in_year, 1);
        assert!(!state.is_year_end());

        for _ in 0..11 {
            state.advance_month();
        }
        assert!(state.is_year_end());
        assert!(state.is_final_month(2));
    }

    #[test]
    fn test_sweep_invests_surplus_only() {
        let mut state = ScenarioState::purchase(10_000.0);
        assert_eq!(state.sweep(250.0), 0.0);
        assert_eq!(state.sweep(-400.0), -400.0);
        assert_eq!(state.invested_value, 250.0);
        assert_eq!(state.invested_principal, 250.0);
    }

    #[test]
    fn test_realize_taxes_gains_only() {
        let mut state = ScenarioState::invested(1_000.0);
        state.compound(0.10);
        assert_abs_diff_eq!(state.invested_value, 1_100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(state.realize(0.30), 1_070.0, epsilon = 1e-9);
        assert_abs_diff_eq!(state.realize(0.0), 1_100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invested_opening() {
        let state = ScenarioState::invested(50_000.0);
        assert_eq!(state.cumulative_cash, -50_000.0);
        assert_eq!(state.invested_value, 50_000.0);
        assert_eq!(state.invested_principal, 50_000.0);
    }
}
