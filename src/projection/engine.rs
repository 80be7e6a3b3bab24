//! Core scenario engine for month-by-month ownership and renting simulations

use std::cell::OnceCell;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::cashflows::{aggregate_annual, LedgerRow, MonthlyCost, ScenarioResult};
use super::irr::{irr, npv};
use super::rates::{benchmark_table, future_value_with_monthly_withdrawals, grow, monthly_rate_from_annual, BenchmarkRow};
use super::state::ScenarioState;
use crate::amortization::{AmortizationSchedule, MAX_TERM_YEARS, MONTHS_IN_YEAR};
use crate::assumptions::{Assumptions, MAX_HORIZON_YEARS};
use crate::taxes::{capital_gains_tax, rental_tax};

/// Early repayment penalty: six months of interest...
const PENALTY_INTEREST_YEARS: f64 = 0.5;
/// ...capped at this share of the outstanding balance
const PENALTY_BALANCE_CAP: f64 = 0.03;

/// What the owner does with the property once the sale horizon is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuyingScenario {
    /// Occupy until the sale horizon, sell, invest the proceeds ("buying_1")
    OccupyThenSell,
    /// Occupy until the sale horizon, then let it until the evaluation horizon ("buying_2")
    OccupyThenLet,
}

/// One of the four simulated scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Buying(BuyingScenario),
    /// Rent and invest, mirroring the given buying scenario's outlays
    Renting(BuyingScenario),
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Buying(BuyingScenario::OccupyThenSell),
        Scenario::Renting(BuyingScenario::OccupyThenSell),
        Scenario::Buying(BuyingScenario::OccupyThenLet),
        Scenario::Renting(BuyingScenario::OccupyThenLet),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Scenario::Buying(BuyingScenario::OccupyThenSell) => "buying_1",
            Scenario::Renting(BuyingScenario::OccupyThenSell) => "renting_1",
            Scenario::Buying(BuyingScenario::OccupyThenLet) => "buying_2",
            Scenario::Renting(BuyingScenario::OccupyThenLet) => "renting_2",
        }
    }

    /// The buying scenario this one is, or mirrors
    pub fn buying(&self) -> BuyingScenario {
        match *self {
            Scenario::Buying(kind) | Scenario::Renting(kind) => kind,
        }
    }

    /// Renting counterpart of a buying scenario and vice versa
    pub fn counterpart(&self) -> Scenario {
        match *self {
            Scenario::Buying(kind) => Scenario::Renting(kind),
            Scenario::Renting(kind) => Scenario::Buying(kind),
        }
    }

    fn cache_slot(&self) -> usize {
        match self {
            Scenario::Buying(BuyingScenario::OccupyThenSell) => 0,
            Scenario::Renting(BuyingScenario::OccupyThenSell) => 1,
            Scenario::Buying(BuyingScenario::OccupyThenLet) => 2,
            Scenario::Renting(BuyingScenario::OccupyThenLet) => 3,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.label() == s)
            .ok_or_else(|| format!("unknown scenario `{s}`, expected one of buying_1, renting_1, buying_2, renting_2"))
    }
}

/// Main scenario engine.
///
/// Built once per set of assumptions; scenario ledgers are computed on first
/// request and cached for the lifetime of the engine.
#[derive(Debug, Clone)]
pub struct ScenarioEngine {
    assumptions: Assumptions,
    initial_costs: f64,
    loan_principal: f64,
    schedule: AmortizationSchedule,
    sale_horizon: u32,
    evaluation_horizon: u32,
    /// Effective monthly return of the investment account
    monthly_return: f64,
    results: [OnceCell<ScenarioResult>; 4],
}

impl ScenarioEngine {
    /// Create a new scenario engine with given assumptions
    pub fn new(assumptions: Assumptions) -> Self {
        let initial_costs = assumptions.initial_costs();
        let loan_principal = assumptions.loan_principal();
        let schedule = AmortizationSchedule::new(loan_principal, assumptions.loan_rate, assumptions.loan_years);
        let sale_horizon = assumptions.sale_horizon();
        let evaluation_horizon = assumptions.evaluation_horizon();
        let monthly_return = monthly_rate_from_annual(assumptions.reference_return_rate);

        if assumptions.evaluation_years < sale_horizon {
            log::warn!(
                "Evaluation horizon of {} years is shorter than the sale horizon, using {} years",
                assumptions.evaluation_years,
                sale_horizon
            );
        }
        if assumptions.horizon_clamped() {
            log::warn!("Horizons clamped to {} years", MAX_HORIZON_YEARS);
        }
        if assumptions.loan_years > MAX_TERM_YEARS && loan_principal > 0.0 {
            log::warn!(
                "Loan term of {} years exceeds {} years, no debt service is scheduled",
                assumptions.loan_years,
                MAX_TERM_YEARS
            );
        }
        if sale_horizon < 2 {
            log::warn!("Sale {} year(s) after purchase: the flat tax model ignores short holding rules", sale_horizon);
        }
        log::debug!(
            "Engine: principal {:.2}, payment {:.2}/month, sale after {} years, evaluation over {} years",
            loan_principal,
            schedule.payment,
            sale_horizon,
            evaluation_horizon
        );

        Self {
            assumptions,
            initial_costs,
            loan_principal,
            schedule,
            sale_horizon,
            evaluation_horizon,
            monthly_return,
            results: Default::default(),
        }
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn schedule(&self) -> &AmortizationSchedule {
        &self.schedule
    }

    pub fn monthly_payment(&self) -> f64 {
        self.schedule.payment
    }

    pub fn initial_costs(&self) -> f64 {
        self.initial_costs
    }

    pub fn loan_principal(&self) -> f64 {
        self.loan_principal
    }

    pub fn sale_horizon(&self) -> u32 {
        self.sale_horizon
    }

    pub fn evaluation_horizon(&self) -> u32 {
        self.evaluation_horizon
    }

    // ----- Yearly drivers (year 1 is the first year after purchase) -----

    pub fn property_value(&self, year: u32) -> f64 {
        grow(self.assumptions.price, self.assumptions.price_growth_rate, year as i32)
    }

    pub fn maintenance_cost(&self, year: u32) -> f64 {
        self.assumptions.maintenance_rate * self.property_value(year)
    }

    pub fn copro_charges(&self, year: u32) -> f64 {
        grow(
            self.assumptions.copro_charges_annual,
            self.assumptions.copro_growth_rate,
            year as i32 - 1,
        )
    }

    /// Loan insurance, a fixed share of the principal
    pub fn annual_insurance(&self) -> f64 {
        self.assumptions.insurance_rate * self.loan_principal
    }

    /// Non-debt charges of ownership for a year
    pub fn annual_charges(&self, year: u32) -> f64 {
        self.assumptions.property_tax_annual
            + self.assumptions.other_taxes_annual
            + self.copro_charges(year)
            + self.maintenance_cost(year)
            + self.annual_insurance()
    }

    /// Rent collected from tenants for a year, net of vacancy
    pub fn gross_rental_revenue(&self, year: u32) -> f64 {
        let base = self.assumptions.rent_monthly * 12.0 * self.assumptions.occupancy_rate;
        grow(base, self.assumptions.rent_growth_rate, year as i32 - 1)
    }

    /// Yearly letting income before debt service and before rental tax
    pub fn rental_income_before_tax(&self, year: u32) -> f64 {
        let gross = self.gross_rental_revenue(year);
        gross - self.assumptions.management_fee_rate * gross - self.annual_charges(year)
    }

    /// Yearly letting income before debt service, after rental tax
    pub fn rental_income_after_tax(&self, year: u32) -> f64 {
        let before_tax = self.rental_income_before_tax(year);
        before_tax - rental_tax(before_tax, self.assumptions.rental_tax_rate)
    }

    /// Reference rent for a year: paid by renters, avoided by occupiers
    pub fn reference_rent(&self, year: u32) -> f64 {
        grow(
            12.0 * self.assumptions.reference_rent_monthly,
            self.assumptions.rent_growth_rate,
            year as i32 - 1,
        )
    }

    /// Loan balance at the end of a year (0 once repaid)
    pub fn outstanding_balance(&self, year: u32) -> f64 {
        self.schedule.balance_at_year(year)
    }

    /// Penalty for repaying the loan at the end of `year`, if enabled
    pub fn early_repayment_penalty(&self, year: u32) -> f64 {
        let balance = self.outstanding_balance(year);
        if !self.assumptions.early_repayment_penalty || balance <= 0.0 {
            return 0.0;
        }
        let six_months_interest = PENALTY_INTEREST_YEARS * self.assumptions.loan_rate * balance;
        six_months_interest.min(PENALTY_BALANCE_CAP * balance)
    }

    /// Cash left after selling at the end of `year`: price less selling fees,
    /// loan repayment, capital-gains tax and early repayment penalty
    pub fn sale_proceeds(&self, year: u32) -> f64 {
        let sale_price = self.property_value(year);
        let selling_fees = self.assumptions.selling_fee_rate * sale_price;
        let gain = (sale_price - self.assumptions.price).max(0.0);
        let gains_tax = capital_gains_tax(gain, self.assumptions.capital_gains_rate);

        sale_price - selling_fees - self.outstanding_balance(year) - gains_tax - self.early_repayment_penalty(year)
    }

    // ----- Scenario runs -----

    /// Run (or fetch the cached run of) a scenario
    pub fn run(&self, scenario: Scenario) -> &ScenarioResult {
        self.results[scenario.cache_slot()].get_or_init(|| {
            log::debug!("Simulating {} over {} years", scenario, self.evaluation_horizon);
            match scenario {
                Scenario::Buying(kind) => self.simulate_buying(kind),
                Scenario::Renting(kind) => self.simulate_renting(kind),
            }
        })
    }

    pub fn irr(&self, scenario: Scenario) -> Option<f64> {
        self.run(scenario).irr
    }

    /// NPV at the assumptions' discount rate
    pub fn npv(&self, scenario: Scenario) -> f64 {
        self.run(scenario).npv
    }

    pub fn npv_at(&self, scenario: Scenario, discount_rate: f64) -> f64 {
        npv(discount_rate, &self.run(scenario).cashflows)
    }

    /// NPV of a buying scenario minus NPV of its renting counterpart
    pub fn npv_advantage(&self, kind: BuyingScenario) -> f64 {
        self.npv(Scenario::Buying(kind)) - self.npv(Scenario::Renting(kind))
    }

    /// Down payment left invested yearly while inflation-indexed rent is paid
    /// separately, for years 0..=evaluation horizon
    pub fn benchmark_table(&self) -> Vec<BenchmarkRow> {
        benchmark_table(
            self.assumptions.down_payment,
            self.assumptions.reference_return_rate,
            self.assumptions.reference_rent_monthly,
            self.evaluation_horizon,
            self.assumptions.inflation_rate,
        )
    }

    /// Down payment compounded monthly with a flat reference rent withdrawn
    /// from it every month, valued at the end of `year` (at most
    /// `MAX_HORIZON_YEARS`)
    pub fn benchmark_wealth(&self, year: u32) -> f64 {
        future_value_with_monthly_withdrawals(
            self.assumptions.down_payment,
            self.assumptions.reference_return_rate,
            self.assumptions.reference_rent_monthly.max(0.0),
            year.min(MAX_HORIZON_YEARS) * MONTHS_IN_YEAR,
            0.0,
        )
    }

    fn total_months(&self) -> u32 {
        self.evaluation_horizon * MONTHS_IN_YEAR
    }

    /// Simulate a buying scenario month by month
    fn simulate_buying(&self, kind: BuyingScenario) -> ScenarioResult {
        let mut state = ScenarioState::purchase(self.assumptions.down_payment);
        let months = self.total_months() as usize;

        let mut monthly = Vec::with_capacity(months + 1);
        let mut cost_profile = Vec::with_capacity(months + 1);
        monthly.push(LedgerRow::opening(&state, self.loan_principal));
        cost_profile.push(MonthlyCost::default());

        for _ in 0..months {
            state.advance_month();
            let (row, cost) = self.calculate_buying_month(kind, &mut state);
            monthly.push(row);
            cost_profile.push(cost);
        }

        let sale_proceeds = match kind {
            BuyingScenario::OccupyThenSell if self.sale_horizon > 0 => self.sale_proceeds(self.sale_horizon),
            BuyingScenario::OccupyThenLet if self.evaluation_horizon > 0 => {
                self.sale_proceeds(self.evaluation_horizon)
            }
            _ => 0.0,
        };

        self.finish(Scenario::Buying(kind), monthly, cost_profile, sale_proceeds)
    }

    /// Calculate one month of a buying scenario
    fn calculate_buying_month(&self, kind: BuyingScenario, state: &mut ScenarioState) -> (LedgerRow, MonthlyCost) {
        let year = state.year;
        let mut row = LedgerRow::new(state);
        let mut cost = MonthlyCost::default();

        let occupying = year <= self.sale_horizon;
        let owned = occupying || kind == BuyingScenario::OccupyThenLet;

        if owned {
            cost.loan_payment = self.schedule.payment_at(state.global_month);
            row.property_value = self.property_value(year);
            row.outstanding_balance = self.schedule.balance_at_month(state.global_month);
        }

        if occupying {
            cost.charges = self.annual_charges(year) / 12.0;
            row.rent_avoided = self.reference_rent(year) / 12.0;
        } else {
            // Living elsewhere, at the reference rent
            cost.rent_paid = self.reference_rent(year) / 12.0;

            if kind == BuyingScenario::OccupyThenLet {
                let gross = self.gross_rental_revenue(year);
                let management = self.assumptions.management_fee_rate * gross;
                let base_charges = self.annual_charges(year);
                let tax = rental_tax(gross - management - base_charges, self.assumptions.rental_tax_rate);

                cost.charges = (management + base_charges + tax) / 12.0;
                cost.rent_received = gross / 12.0;
            }
        }

        row.loan_payment = -cost.loan_payment;
        row.charges = -cost.charges;
        row.rent_received = cost.rent_received;

        state.compound(self.monthly_return);

        // Sale proceeds go straight into the investment account
        if kind == BuyingScenario::OccupyThenSell && year == self.sale_horizon && state.is_year_end() {
            row.sale_proceeds = self.sale_proceeds(year);
            state.deposit(row.sale_proceeds);
        }

        let mut cash_flow = state.sweep(row.operating_flow());

        if state.is_final_month(self.evaluation_horizon) {
            if kind == BuyingScenario::OccupyThenLet {
                row.sale_proceeds = self.sale_proceeds(year);
                cash_flow += row.sale_proceeds;
            }
            cash_flow += state.realize(self.assumptions.investment_tax_rate);
        }

        state.record(cash_flow);
        row.cash_flow = cash_flow;
        row.capture_stocks(state);

        (row, cost)
    }

    /// Simulate the renting counterpart of a buying scenario.
    ///
    /// Whenever the buyer would spend more than the renter's rent, the renter
    /// invests the difference; when the buyer spends less, the renter's excess
    /// rent is a period outflow.
    fn simulate_renting(&self, kind: BuyingScenario) -> ScenarioResult {
        let buying = self.run(Scenario::Buying(kind));
        let mut state = ScenarioState::invested(self.assumptions.down_payment);
        let months = self.total_months() as usize;

        let mut monthly = Vec::with_capacity(months + 1);
        monthly.push(LedgerRow::opening(&state, 0.0));

        for _ in 0..months {
            state.advance_month();
            let mut row = LedgerRow::new(&state);

            let rent = self.reference_rent(state.year) / 12.0;
            let buyer_outlay = buying
                .cost_profile
                .get(state.global_month as usize)
                .map(MonthlyCost::total)
                .unwrap_or(0.0);

            state.compound(self.monthly_return);

            row.rent_paid = -rent;
            row.delta_buying = buyer_outlay - rent;
            let mut cash_flow = state.sweep(row.delta_buying);

            if state.is_final_month(self.evaluation_horizon) {
                cash_flow += state.realize(self.assumptions.investment_tax_rate);
            }

            state.record(cash_flow);
            row.cash_flow = cash_flow;
            row.capture_stocks(&state);
            monthly.push(row);
        }

        self.finish(Scenario::Renting(kind), monthly, Vec::new(), 0.0)
    }

    fn finish(
        &self,
        scenario: Scenario,
        monthly: Vec<LedgerRow>,
        cost_profile: Vec<MonthlyCost>,
        sale_proceeds: f64,
    ) -> ScenarioResult {
        let annual = aggregate_annual(&monthly);
        let cashflows: Vec<f64> = annual.iter().map(|row| row.cash_flow).collect();
        let irr = irr(&cashflows);
        let npv = npv(self.assumptions.discount_rate, &cashflows);

        if irr.is_none() {
            log::debug!("{}: cash flows have no IRR", scenario);
        }

        ScenarioResult {
            scenario,
            monthly,
            annual,
            cashflows,
            irr,
            npv,
            sale_proceeds,
            monthly_payment: self.schedule.payment,
            cost_profile,
        }
    }
}
