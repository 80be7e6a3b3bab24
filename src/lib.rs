//! Property Scenarios - month-by-month cash-flow model of housing decisions
//!
//! This library provides:
//! - Fixed-payment loan amortization and flat-rate tax helpers
//! - Buy-and-occupy, buy-and-let and rent-and-invest scenario simulations
//! - IRR / NPV on annualized cash flows
//! - Side-by-side comparisons and sensitivity sweeps

pub mod amortization;
pub mod assumptions;
pub mod projection;
pub mod scenario;
pub mod sensitivity;
pub mod taxes;

// Re-export commonly used types
pub use amortization::AmortizationSchedule;
pub use assumptions::{AssumptionError, Assumptions, LoadError};
pub use projection::{BuyingScenario, Scenario, ScenarioEngine, ScenarioResult, ScenarioSummary};
pub use scenario::{ScenarioComparison, ScenarioRunner};
