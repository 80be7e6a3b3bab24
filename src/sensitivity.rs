//! Sensitivity of the buy-versus-rent decision to single assumptions
//!
//! Every sample point builds its own engine from a modified copy of the base
//! assumptions, so points are independent and computed with rayon.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assumptions::Assumptions;
use crate::projection::{BuyingScenario, Scenario, ScenarioEngine};

/// Samples per rate sweep
pub const RATE_STEPS: usize = 9;
/// Half-width of a rate sweep around the base value
pub const RATE_SPAN: f64 = 0.02;
/// Half-width of a sale horizon sweep, in years
pub const HORIZON_SPAN: u32 = 2;

const PRICE_GROWTH_FLOOR: f64 = -0.10;
const REFERENCE_RETURN_FLOOR: f64 = 0.0;
const HORIZON_FLOOR: u32 = 1;

/// Assumption varied by a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    PriceGrowth,
    /// Years between purchase and sale
    SaleHorizon,
    ReferenceReturn,
}

impl SweepParameter {
    pub const ALL: [SweepParameter; 3] = [
        SweepParameter::PriceGrowth,
        SweepParameter::SaleHorizon,
        SweepParameter::ReferenceReturn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SweepParameter::PriceGrowth => "price_growth",
            SweepParameter::SaleHorizon => "sale_horizon",
            SweepParameter::ReferenceReturn => "reference_return",
        }
    }

    /// Copy of `base` with this parameter set to `value`
    pub fn apply(&self, base: &Assumptions, value: f64) -> Assumptions {
        match self {
            SweepParameter::PriceGrowth => Assumptions {
                price_growth_rate: value,
                ..base.clone()
            },
            SweepParameter::SaleHorizon => base.with_sale_horizon(value.round().max(0.0) as u32),
            SweepParameter::ReferenceReturn => Assumptions {
                reference_return_rate: value,
                ..base.clone()
            },
        }
    }

    /// Default sample values around the base assumptions
    pub fn default_values(&self, base: &Assumptions) -> Vec<f64> {
        match self {
            SweepParameter::PriceGrowth => rate_range(base.price_growth_rate, PRICE_GROWTH_FLOOR),
            SweepParameter::ReferenceReturn => {
                rate_range(base.reference_return_rate, REFERENCE_RETURN_FLOOR)
            }
            SweepParameter::SaleHorizon => {
                let centre = base.sale_horizon();
                let low = centre.saturating_sub(HORIZON_SPAN).max(HORIZON_FLOOR);
                (low..=centre + HORIZON_SPAN).map(f64::from).collect()
            }
        }
    }
}

impl fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SweepParameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SweepParameter::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("unknown sweep parameter `{s}`, expected price_growth, sale_horizon or reference_return"))
    }
}

/// `RATE_STEPS` evenly spaced values from `max(floor, base - span)` to `base + span`
fn rate_range(base: f64, floor: f64) -> Vec<f64> {
    linspace((base - RATE_SPAN).max(floor), base + RATE_SPAN, RATE_STEPS)
}

fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (steps - 1) as f64;
            (0..steps).map(|i| start + step * i as f64).collect()
        }
    }
}

/// NPVs of a buying scenario and its renting counterpart at one sample point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub value: f64,
    pub buying_npv: f64,
    pub renting_npv: f64,
    /// `buying_npv - renting_npv`; positive favours buying
    pub delta_npv: f64,
}

impl SweepPoint {
    fn evaluate(assumptions: Assumptions, kind: BuyingScenario, value: f64) -> Self {
        let engine = ScenarioEngine::new(assumptions);
        let buying_npv = engine.npv(Scenario::Buying(kind));
        let renting_npv = engine.npv(Scenario::Renting(kind));

        Self {
            value,
            buying_npv,
            renting_npv,
            delta_npv: buying_npv - renting_npv,
        }
    }
}

/// ΔNPV of `kind` against its renting counterpart for one set of assumptions
pub fn delta_npv(assumptions: &Assumptions, kind: BuyingScenario) -> f64 {
    SweepPoint::evaluate(assumptions.clone(), kind, 0.0).delta_npv
}

/// One-dimensional sweep, points in the order of `values`
pub fn sweep(
    base: &Assumptions,
    kind: BuyingScenario,
    parameter: SweepParameter,
    values: &[f64],
) -> Vec<SweepPoint> {
    log::debug!("Sweeping {} over {} values for {:?}", parameter, values.len(), kind);

    values
        .par_iter()
        .map(|&value| SweepPoint::evaluate(parameter.apply(base, value), kind, value))
        .collect()
}

/// Sweep over the default range of `parameter`
pub fn default_sweep(base: &Assumptions, kind: BuyingScenario, parameter: SweepParameter) -> Vec<SweepPoint> {
    sweep(base, kind, parameter, &parameter.default_values(base))
}

/// ΔNPV over price growth × reference return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub price_growth: Vec<f64>,
    pub reference_return: Vec<f64>,
    /// `delta_npv[i][j]` is at `reference_return[i]`, `price_growth[j]`
    pub delta_npv: Vec<Vec<f64>>,
}

impl SensitivityGrid {
    pub fn get(&self, reference_return_index: usize, price_growth_index: usize) -> Option<f64> {
        self.delta_npv
            .get(reference_return_index)
            .and_then(|row| row.get(price_growth_index))
            .copied()
    }

    /// Flattened `(price_growth, reference_return, delta_npv)` triples
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.reference_return
            .iter()
            .zip(&self.delta_npv)
            .flat_map(move |(&ret, row)| {
                self.price_growth
                    .iter()
                    .zip(row)
                    .map(move |(&growth, &delta)| (growth, ret, delta))
            })
    }
}

pub fn grid(
    base: &Assumptions,
    kind: BuyingScenario,
    price_growth: &[f64],
    reference_return: &[f64],
) -> SensitivityGrid {
    log::debug!(
        "Computing {}x{} sensitivity grid for {:?}",
        reference_return.len(),
        price_growth.len(),
        kind
    );

    let rows = reference_return
        .par_iter()
        .map(|&ret| {
            price_growth
                .par_iter()
                .map(|&growth| {
                    let assumptions = Assumptions {
                        price_growth_rate: growth,
                        reference_return_rate: ret,
                        ..base.clone()
                    };
                    delta_npv(&assumptions, kind)
                })
                .collect::<Vec<f64>>()
        })
        .collect::<Vec<_>>();

    SensitivityGrid {
        price_growth: price_growth.to_vec(),
        reference_return: reference_return.to_vec(),
        delta_npv: rows,
    }
}

/// Grid over the default price growth and reference return ranges
pub fn default_grid(base: &Assumptions, kind: BuyingScenario) -> SensitivityGrid {
    grid(
        base,
        kind,
        &SweepParameter::PriceGrowth.default_values(base),
        &SweepParameter::ReferenceReturn.default_values(base),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SELL: BuyingScenario = BuyingScenario::OccupyThenSell;

    #[test]
    fn test_default_rate_ranges() {
        let base = Assumptions::default_case();

        let growth = SweepParameter::PriceGrowth.default_values(&base);
        assert_eq!(growth.len(), 9);
        assert_relative_eq!(growth[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(growth[4], 0.02, epsilon = 1e-12);
        assert_relative_eq!(growth[8], 0.04, epsilon = 1e-12);

        let returns = SweepParameter::ReferenceReturn.default_values(&base);
        assert_relative_eq!(returns[0], 0.03, epsilon = 1e-12);
        assert_relative_eq!(returns[8], 0.07, epsilon = 1e-12);
    }

    #[test]
    fn test_rate_range_floors() {
        let base = Assumptions {
            reference_return_rate: 0.01,
            price_growth_rate: -0.09,
            ..Assumptions::default_case()
        };
        let returns = SweepParameter::ReferenceReturn.default_values(&base);
        assert_eq!(returns[0], 0.0);
        assert_relative_eq!(returns[8], 0.03, epsilon = 1e-12);

        let growth = SweepParameter::PriceGrowth.default_values(&base);
        assert_eq!(growth[0], -0.10);
        assert_relative_eq!(growth[8], -0.07, epsilon = 1e-12);
    }

    #[test]
    fn test_default_horizon_range() {
        let base = Assumptions::default_case();
        assert_eq!(
            SweepParameter::SaleHorizon.default_values(&base),
            vec![8.0, 9.0, 10.0, 11.0, 12.0]
        );

        let short = base.with_sale_horizon(2);
        assert_eq!(
            SweepParameter::SaleHorizon.default_values(&short),
            vec![1.0, 2.0, 3.0, 4.0]
        );
    }

    #[test]
    fn test_apply_leaves_base_untouched() {
        let base = Assumptions::default_case();
        let moved = SweepParameter::SaleHorizon.apply(&base, 12.0);
        assert_eq!(moved.sale_horizon(), 12);
        assert_eq!(base.sale_horizon(), 10);

        let faster = SweepParameter::PriceGrowth.apply(&base, 0.035);
        assert_eq!(faster.price_growth_rate, 0.035);
        assert_eq!(faster.reference_return_rate, base.reference_return_rate);
    }

    #[test]
    fn test_sweep_matches_direct_engine() {
        let base = Assumptions::default_case();
        let values = [0.0, 0.02, 0.04];
        let points = sweep(&base, SELL, SweepParameter::PriceGrowth, &values);

        assert_eq!(points.len(), 3);
        for (point, &value) in points.iter().zip(&values) {
            assert_eq!(point.value, value);
            let engine = ScenarioEngine::new(SweepParameter::PriceGrowth.apply(&base, value));
            assert_relative_eq!(point.delta_npv, engine.npv_advantage(SELL), epsilon = 1e-9);
            assert_relative_eq!(point.delta_npv, point.buying_npv - point.renting_npv, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_price_growth_favours_buying() {
        let points = default_sweep(&Assumptions::default_case(), SELL, SweepParameter::PriceGrowth);
        for pair in points.windows(2) {
            assert!(pair[1].delta_npv > pair[0].delta_npv);
        }
    }

    #[test]
    fn test_grid_layout() {
        let base = Assumptions::default_case();
        let growth = [0.0, 0.02];
        let returns = [0.03, 0.05, 0.07];
        let grid = grid(&base, SELL, &growth, &returns);

        assert_eq!(grid.delta_npv.len(), 3);
        assert!(grid.delta_npv.iter().all(|row| row.len() == 2));

        let at = Assumptions {
            price_growth_rate: 0.02,
            reference_return_rate: 0.07,
            ..base.clone()
        };
        assert_relative_eq!(grid.get(2, 1).unwrap(), delta_npv(&at, SELL), epsilon = 1e-9);
        assert!(grid.get(3, 0).is_none());

        let points: Vec<_> = grid.points().collect();
        assert_eq!(points.len(), 6);
        assert_eq!((points[5].0, points[5].1), (0.02, 0.07));
    }

    #[test]
    fn test_parameter_names() {
        for parameter in SweepParameter::ALL {
            assert_eq!(parameter.name().parse::<SweepParameter>().unwrap(), parameter);
        }
        assert!("loan_rate".parse::<SweepParameter>().is_err());
    }
}
