//! Month-by-month scenario simulation: engine, ledgers and return metrics

mod state;
mod engine;
mod cashflows;
pub mod irr;
pub mod rates;

pub use state::ScenarioState;
pub use engine::{BuyingScenario, Scenario, ScenarioEngine};
pub use cashflows::{aggregate_annual, AnnualRow, LedgerRow, MonthlyCost, ScenarioResult, ScenarioSummary};
pub use irr::{irr, npv};
pub use rates::BenchmarkRow;
