//! Property Scenarios CLI
//!
//! Compares buying and renting scenarios for one set of assumptions

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;

use property_scenarios::{
    projection::ScenarioResult,
    scenario::{compare_engine, ScenarioComparison},
    Assumptions, BuyingScenario, Scenario, ScenarioEngine,
};

#[derive(Parser, Debug)]
#[command(name = "property-scenarios")]
#[command(about = "Month-by-month comparison of buying and renting a home")]
struct Args {
    /// Assumptions file (key,value CSV or JSON); the reference case when omitted
    #[arg(short, long)]
    assumptions: Option<PathBuf>,

    /// Print the comparison as JSON
    #[arg(long)]
    json: bool,

    /// Print the monthly ledger of one scenario (buying_1, renting_1, buying_2, renting_2)
    #[arg(long, value_name = "SCENARIO")]
    monthly: Option<Scenario>,

    /// Write the monthly ledger to a CSV file instead of the console
    #[arg(long, value_name = "FILE", requires = "monthly")]
    output: Option<PathBuf>,

    /// Move the purchase to the current year, keeping the holding period
    #[arg(long)]
    start_this_year: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut assumptions = match &args.assumptions {
        Some(path) => Assumptions::from_path(path)
            .with_context(|| format!("Failed to load assumptions from {}", path.display()))?,
        None => Assumptions::default_case(),
    };

    if args.start_this_year {
        let horizon = assumptions.sale_horizon();
        assumptions.purchase_year = chrono::Local::now().year();
        assumptions = assumptions.with_sale_horizon(horizon);
    }
    assumptions.validate().context("Invalid assumptions")?;

    let engine = ScenarioEngine::new(assumptions);

    if let Some(scenario) = args.monthly {
        let result = engine.run(scenario);
        return match &args.output {
            Some(path) => write_ledger_csv(result, path),
            None => {
                print_ledger(result);
                Ok(())
            }
        };
    }

    let comparison = compare_engine(&engine);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print_comparison(&engine, &comparison);
    }

    Ok(())
}

fn print_comparison(engine: &ScenarioEngine, comparison: &ScenarioComparison) {
    let a = engine.assumptions();

    println!("Property Scenarios v0.1.0");
    println!("=========================\n");

    println!("Purchase {} -> sale {} ({} years), evaluated over {} years",
        a.purchase_year, a.sale_year, comparison.sale_horizon, comparison.evaluation_horizon);
    println!("  Price:           {:>12.2}", a.price);
    println!("  Initial costs:   {:>12.2}", comparison.initial_costs);
    println!("  Down payment:    {:>12.2}", a.down_payment);
    println!("  Loan principal:  {:>12.2}", comparison.loan_principal);
    println!("  Monthly payment: {:>12.2} ({} years at {:.2}%)",
        comparison.monthly_payment, a.loan_years, a.loan_rate * 100.0);
    println!("  Total interest:  {:>12.2}", engine.schedule().total_interest());
    println!();

    println!("{:<10} {:>10} {:>14} {:>14} {:>14} {:>14}",
        "Scenario", "IRR", "NPV", "Cum. cash", "Invested", "Sale");
    println!("{}", "-".repeat(81));
    for s in &comparison.summaries {
        let irr = s.irr.map(|r| format!("{:.2}%", r * 100.0)).unwrap_or_else(|| "-".to_string());
        println!("{:<10} {:>10} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
            s.label, irr, s.npv, s.cumulative_cash, s.final_invested_value, s.sale_proceeds);
    }
    println!();

    for kind in [BuyingScenario::OccupyThenSell, BuyingScenario::OccupyThenLet] {
        if let Some(delta) = comparison.npv_advantage(kind) {
            println!("  ΔNPV {} vs {}: {:.2}",
                Scenario::Buying(kind), Scenario::Renting(kind), delta);
        }
    }

    println!("\nReference benchmark (down payment invested, rent paid):");
    println!("{:>5} {:>14} {:>14} {:>14}", "Year", "Invested", "Cum. rent", "Net");
    for row in engine.benchmark_table() {
        println!("{:>5} {:>14.2} {:>14.2} {:>14.2}",
            row.year, row.invested_value, row.cumulative_rent, row.net);
    }
}

fn print_ledger(result: &ScenarioResult) {
    println!("{} monthly ledger ({} months):", result.scenario, result.monthly.len().saturating_sub(1));
    println!("{:>5} {:>4} {:>3} {:>11} {:>11} {:>11} {:>11} {:>11} {:>12} {:>12} {:>13} {:>13}",
        "Month", "Year", "M", "Loan", "Charges", "RentIn", "RentAvoid", "RentPaid", "DeltaBuy", "CashFlow", "CumCash", "Invested");
    println!("{}", "-".repeat(137));

    for row in &result.monthly {
        println!("{:>5} {:>4} {:>3} {:>11.2} {:>11.2} {:>11.2} {:>11.2} {:>11.2} {:>12.2} {:>12.2} {:>13.2} {:>13.2}",
            row.global_month,
            row.year,
            row.month,
            row.loan_payment,
            row.charges,
            row.rent_received,
            row.rent_avoided,
            row.rent_paid,
            row.delta_buying,
            row.cash_flow,
            row.cumulative_cash,
            row.invested_value,
        );
    }

    let irr = result.irr.map(|r| format!("{:.4}%", r * 100.0)).unwrap_or_else(|| "-".to_string());
    println!("\nIRR: {}  NPV: {:.2}  Sale proceeds: {:.2}", irr, result.npv, result.sale_proceeds);
}

fn write_ledger_csv(result: &ScenarioResult, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Unable to create {}", path.display()))?;
    for row in &result.monthly {
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!("{} ledger written to: {}", result.scenario, path.display());
    Ok(())
}
