//! Sensitivity of ΔNPV (buying minus renting) to key assumptions
//!
//! Prints one sweep, every sweep, or the price growth × reference return
//! grid as CSV on stdout

use std::io;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use property_scenarios::{
    sensitivity::{default_grid, default_sweep, SweepParameter},
    Assumptions, BuyingScenario, Scenario,
};

#[derive(Parser, Debug)]
#[command(name = "sensitivity")]
#[command(about = "ΔNPV sweeps of a buying scenario against its renting counterpart")]
struct Args {
    /// Assumptions file (key,value CSV or JSON); the reference case when omitted
    #[arg(short, long)]
    assumptions: Option<PathBuf>,

    /// Buying scenario to compare (buying_1 or buying_2)
    #[arg(short, long, default_value = "buying_1")]
    scenario: Scenario,

    /// Single parameter to sweep (price_growth, sale_horizon, reference_return)
    #[arg(short, long, conflicts_with = "grid")]
    parameter: Option<SweepParameter>,

    /// Price growth × reference return grid instead of one-dimensional sweeps
    #[arg(long)]
    grid: bool,
}

#[derive(Debug, serde::Serialize)]
struct SweepRecord {
    parameter: &'static str,
    value: f64,
    buying_npv: f64,
    renting_npv: f64,
    delta_npv: f64,
}

#[derive(Debug, serde::Serialize)]
struct GridRecord {
    price_growth: f64,
    reference_return: f64,
    delta_npv: f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let assumptions = match &args.assumptions {
        Some(path) => Assumptions::from_path(path)
            .with_context(|| format!("Failed to load assumptions from {}", path.display()))?,
        None => Assumptions::default_case(),
    };
    assumptions.validate().context("Invalid assumptions")?;

    let kind = match args.scenario {
        Scenario::Buying(kind) => kind,
        Scenario::Renting(_) => anyhow::bail!("expected a buying scenario, got {}", args.scenario),
    };

    let start = Instant::now();
    let mut writer = csv::Writer::from_writer(io::stdout().lock());

    if args.grid {
        let grid = default_grid(&assumptions, kind);
        for (price_growth, reference_return, delta_npv) in grid.points() {
            writer.serialize(GridRecord { price_growth, reference_return, delta_npv })?;
        }
    } else {
        let parameters = match args.parameter {
            Some(parameter) => vec![parameter],
            None => SweepParameter::ALL.to_vec(),
        };
        for parameter in parameters {
            write_sweep(&mut writer, &assumptions, kind, parameter)?;
        }
    }

    writer.flush()?;
    log::info!("Sensitivity computed in {:?}", start.elapsed());
    Ok(())
}

fn write_sweep<W: io::Write>(
    writer: &mut csv::Writer<W>,
    assumptions: &Assumptions,
    kind: BuyingScenario,
    parameter: SweepParameter,
) -> Result<()> {
    for point in default_sweep(assumptions, kind, parameter) {
        writer.serialize(SweepRecord {
            parameter: parameter.name(),
            value: point.value,
            buying_npv: point.buying_npv,
            renting_npv: point.renting_npv,
            delta_npv: point.delta_npv,
        })?;
    }
    Ok(())
}
