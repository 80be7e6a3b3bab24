//! Scenario runner for side-by-side comparisons and batch runs
//!
//! Holds one set of base assumptions and builds a fresh engine per run, so
//! variants never share cached results.

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assumptions::{Assumptions, LoadError};
use crate::projection::{BuyingScenario, Scenario, ScenarioEngine, ScenarioResult, ScenarioSummary};

/// Headline figures of all four scenarios for one set of assumptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub monthly_payment: f64,
    pub loan_principal: f64,
    pub initial_costs: f64,
    pub sale_horizon: u32,
    pub evaluation_horizon: u32,
    /// In `Scenario::ALL` order
    pub summaries: Vec<ScenarioSummary>,
}

impl ScenarioComparison {
    pub fn summary(&self, scenario: Scenario) -> Option<&ScenarioSummary> {
        self.summaries.iter().find(|s| s.scenario == scenario)
    }

    /// NPV of buying minus NPV of renting the same way
    pub fn npv_advantage(&self, kind: BuyingScenario) -> Option<f64> {
        let buying = self.summary(Scenario::Buying(kind))?;
        let renting = self.summary(Scenario::Renting(kind))?;
        Some(buying.npv - renting.npv)
    }
}

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_path(Path::new("data/assumptions.csv"))?;
/// let comparison = runner.compare();
/// println!("{}", serde_json::to_string_pretty(&comparison)?);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base_assumptions: Assumptions,
}

impl ScenarioRunner {
    /// Runner on the reference case
    pub fn new() -> Self {
        Self {
            base_assumptions: Assumptions::default_case(),
        }
    }

    pub fn with_assumptions(assumptions: Assumptions) -> Self {
        Self {
            base_assumptions: assumptions,
        }
    }

    /// Runner on assumptions read from a CSV or JSON file
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        Ok(Self {
            base_assumptions: Assumptions::from_path(path)?,
        })
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.base_assumptions
    }

    pub fn assumptions_mut(&mut self) -> &mut Assumptions {
        &mut self.base_assumptions
    }

    /// Fresh engine on a copy of the base assumptions
    pub fn engine(&self) -> ScenarioEngine {
        ScenarioEngine::new(self.base_assumptions.clone())
    }

    /// Run one scenario to completion
    pub fn run(&self, scenario: Scenario) -> ScenarioResult {
        self.engine().run(scenario).clone()
    }

    /// Run all four scenarios on one engine
    pub fn compare(&self) -> ScenarioComparison {
        compare_engine(&self.engine())
    }

    /// Compare variants of the base assumptions in parallel
    pub fn compare_batch<F>(&self, variants: &[F]) -> Vec<ScenarioComparison>
    where
        F: Fn(&mut Assumptions) + Sync,
    {
        variants
            .par_iter()
            .map(|tweak| {
                let mut assumptions = self.base_assumptions.clone();
                tweak(&mut assumptions);
                compare_engine(&ScenarioEngine::new(assumptions))
            })
            .collect()
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Summaries of every scenario of an engine
pub fn compare_engine(engine: &ScenarioEngine) -> ScenarioComparison {
    ScenarioComparison {
        monthly_payment: engine.monthly_payment(),
        loan_principal: engine.loan_principal(),
        initial_costs: engine.initial_costs(),
        sale_horizon: engine.sale_horizon(),
        evaluation_horizon: engine.evaluation_horizon(),
        summaries: Scenario::ALL
            .iter()
            .map(|&scenario| engine.run(scenario).summary())
            .collect(),
    }
}
