//! Ledger structures for scenario simulations
//!
//! Flow columns are signed from the household's point of view
//! (negative = money out).

use serde::{Deserialize, Serialize};

use super::engine::Scenario;
use super::state::ScenarioState;
use crate::amortization::MONTHS_IN_YEAR;

/// A single row of a scenario ledger for one month.
///
/// Row 0 of a monthly ledger is the opening position at purchase.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerRow {
    // Timing
    pub year: u32,
    pub month: u32,
    pub global_month: u32,

    // Flows
    pub loan_payment: f64,
    /// Recurring charges, plus management fee and rental tax while let
    pub charges: f64,
    pub rent_received: f64,
    /// Reference rent not paid while occupying the property
    pub rent_avoided: f64,
    /// Rent paid by a renter
    pub rent_paid: f64,
    /// Outlay of the mirrored buying scenario net of the renter's rent
    pub delta_buying: f64,
    pub sale_proceeds: f64,
    pub cash_flow: f64,

    // Stocks
    pub cumulative_cash: f64,
    pub invested_value: f64,
    pub invested_principal: f64,
    pub property_value: f64,
    pub outstanding_balance: f64,
}

impl LedgerRow {
    /// Row for the current month of `state`, flows zeroed
    pub fn new(state: &ScenarioState) -> Self {
        Self {
            year: state.year,
            month: state.month_in_year,
            global_month: state.global_month,
            ..Default::default()
        }
    }

    /// Opening row: the initial outflow and the starting stocks
    pub fn opening(state: &ScenarioState, outstanding_balance: f64) -> Self {
        let mut row = Self::new(state);
        row.cash_flow = state.cumulative_cash;
        row.outstanding_balance = outstanding_balance;
        row.capture_stocks(state);
        row
    }

    /// Copy the running stocks from `state`
    pub fn capture_stocks(&mut self, state: &ScenarioState) {
        self.cumulative_cash = state.cumulative_cash;
        self.invested_value = state.invested_value;
        self.invested_principal = state.invested_principal;
    }

    /// Flow of the month excluding sale proceeds and investment realization
    pub fn operating_flow(&self) -> f64 {
        self.loan_payment + self.charges + self.rent_received + self.rent_avoided + self.rent_paid
    }
}

/// Ledger aggregated by year: flows summed, stocks taken at year end
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnualRow {
    pub year: u32,

    pub loan_payment: f64,
    pub charges: f64,
    pub rent_received: f64,
    pub rent_avoided: f64,
    pub rent_paid: f64,
    pub delta_buying: f64,
    pub sale_proceeds: f64,
    pub cash_flow: f64,

    pub cumulative_cash: f64,
    pub invested_value: f64,
    pub invested_principal: f64,
    pub property_value: f64,
    pub outstanding_balance: f64,
}

impl AnnualRow {
    fn from_months(year: u32, months: &[LedgerRow]) -> Self {
        let sum = |f: fn(&LedgerRow) -> f64| months.iter().map(f).sum::<f64>();
        let last = months.last().copied().unwrap_or_default();

        Self {
            year,
            loan_payment: sum(|r| r.loan_payment),
            charges: sum(|r| r.charges),
            rent_received: sum(|r| r.rent_received),
            rent_avoided: sum(|r| r.rent_avoided),
            rent_paid: sum(|r| r.rent_paid),
            delta_buying: sum(|r| r.delta_buying),
            sale_proceeds: sum(|r| r.sale_proceeds),
            cash_flow: sum(|r| r.cash_flow),
            cumulative_cash: last.cumulative_cash,
            invested_value: last.invested_value,
            invested_principal: last.invested_principal,
            property_value: last.property_value,
            outstanding_balance: last.outstanding_balance,
        }
    }
}

/// Roll a monthly ledger (opening row first) up to years 0..=H
pub fn aggregate_annual(monthly: &[LedgerRow]) -> Vec<AnnualRow> {
    let Some((opening, months)) = monthly.split_first() else {
        return Vec::new();
    };

    std::iter::once(AnnualRow::from_months(0, std::slice::from_ref(opening)))
        .chain(
            months
                .chunks(MONTHS_IN_YEAR as usize)
                .enumerate()
                .map(|(i, chunk)| AnnualRow::from_months(i as u32 + 1, chunk)),
        )
        .collect()
}

/// What a buying scenario spends in one month, as positive amounts.
///
/// A renting counterpart compares this against its own rent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyCost {
    pub loan_payment: f64,
    pub charges: f64,
    /// Rent paid for housing while the property is not occupied
    pub rent_paid: f64,
    pub rent_received: f64,
}

impl MonthlyCost {
    pub fn total(&self) -> f64 {
        self.loan_payment + self.charges + self.rent_paid - self.rent_received
    }
}

/// Complete scenario result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,

    /// Monthly ledger, `monthly[m]` is simulation month `m` (0 = opening)
    pub monthly: Vec<LedgerRow>,

    /// Annual roll-up, `annual[y]` is year `y` (0 = opening)
    pub annual: Vec<AnnualRow>,

    /// Annual net cash flows, index 0 = initial outflow
    pub cashflows: Vec<f64>,

    /// None when the cash flows have no IRR
    pub irr: Option<f64>,

    pub npv: f64,

    /// Net sale proceeds of the property (0 for renting scenarios)
    pub sale_proceeds: f64,

    pub monthly_payment: f64,

    /// Per-month outlay of a buying scenario, indexed like `monthly`
    #[serde(skip)]
    pub cost_profile: Vec<MonthlyCost>,
}

impl ScenarioResult {
    pub fn month(&self, global_month: u32) -> Option<&LedgerRow> {
        self.monthly.get(global_month as usize)
    }

    pub fn year(&self, year: u32) -> Option<&AnnualRow> {
        self.annual.get(year as usize)
    }

    /// Get summary statistics
    pub fn summary(&self) -> ScenarioSummary {
        let last = self.monthly.last().copied().unwrap_or_default();

        ScenarioSummary {
            scenario: self.scenario,
            label: self.scenario.label().to_string(),
            years: self.annual.len().saturating_sub(1) as u32,
            irr: self.irr,
            npv: self.npv,
            cumulative_cash: last.cumulative_cash,
            final_invested_value: last.invested_value,
            final_invested_principal: last.invested_principal,
            sale_proceeds: self.sale_proceeds,
            total_loan_payments: -self.monthly.iter().map(|r| r.loan_payment).sum::<f64>(),
        }
    }
}

/// Summary statistics for a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub scenario: Scenario,
    pub label: String,
    pub years: u32,
    pub irr: Option<f64>,
    pub npv: f64,
    pub cumulative_cash: f64,
    pub final_invested_value: f64,
    pub final_invested_principal: f64,
    pub sale_proceeds: f64,
    pub total_loan_payments: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(global_month: u32, cash_flow: f64, invested_value: f64) -> LedgerRow {
        LedgerRow {
            year: if global_month == 0 { 0 } else { (global_month - 1) / 12 + 1 },
            global_month,
            cash_flow,
            invested_value,
            ..Default::default()
        }
    }

    #[test]
    fn test_aggregate_sums_flows_and_keeps_year_end_stocks() {
        let mut monthly = vec![row(0, -100.0, 0.0)];
        monthly.extend((1..=24).map(|m| row(m, 1.0, m as f64)));

        let annual = aggregate_annual(&monthly);
        assert_eq!(annual.len(), 3);
        assert_eq!(annual[0].year, 0);
        assert_eq!(annual[0].cash_flow, -100.0);
        assert_eq!(annual[1].cash_flow, 12.0);
        assert_eq!(annual[1].invested_value, 12.0);
        assert_eq!(annual[2].year, 2);
        assert_eq!(annual[2].invested_value, 24.0);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate_annual(&[]).is_empty());
    }

    #[test]
    fn test_monthly_cost_total() {
        let cost = MonthlyCost {
            loan_payment: 1_000.0,
            charges: 300.0,
            rent_paid: 800.0,
            rent_received: 1_100.0,
        };
        assert_eq!(cost.total(), 1_000.0);
    }
}
