//! Economic assumptions shared by every scenario of a simulation

pub mod loader;

pub use loader::{LoadError, DEFAULT_ASSUMPTIONS_PATH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amortization::MAX_TERM_YEARS;

/// Longest simulated period; longer horizons are clamped to it
pub const MAX_HORIZON_YEARS: u32 = 100;

/// Invalid assumption value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssumptionError {
    #[error("invalid assumption `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Container for all simulation assumptions.
///
/// Rates are decimals (0.04, not 4). The record is treated as immutable input:
/// sweeps clone and mutate a copy, never a live engine's inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Assumptions {
    // Purchase & costs
    pub price: f64,
    pub notary_pct: f64,
    pub agency_pct: f64,
    pub renovation_costs: f64,
    pub extra_fees: f64,

    // Loan
    pub loan_rate: f64,
    pub loan_years: u32,
    pub down_payment: f64,

    // Recurring charges
    pub property_tax_annual: f64,
    pub other_taxes_annual: f64,
    /// Yearly insurance as a share of the loan principal
    pub insurance_rate: f64,
    pub copro_charges_annual: f64,
    pub copro_growth_rate: f64,
    /// Yearly maintenance as a share of the property value
    pub maintenance_rate: f64,

    // Growth & timeline
    pub price_growth_rate: f64,
    pub inflation_rate: f64,
    pub discount_rate: f64,
    pub purchase_year: i32,
    pub sale_year: i32,
    /// Years over which scenarios are compared, raised to the sale horizon if shorter
    pub evaluation_years: u32,

    // Letting
    pub occupancy_rate: f64,
    pub rent_monthly: f64,
    pub rent_growth_rate: f64,
    pub management_fee_rate: f64,
    pub rental_tax_rate: f64,

    // Exit
    pub selling_fee_rate: f64,
    pub capital_gains_rate: f64,
    pub early_repayment_penalty: bool,

    // Reference investment (the renter's alternative)
    /// Rent paid when not occupying an owned home, avoided while occupying
    pub reference_rent_monthly: f64,
    pub reference_return_rate: f64,
    /// Flat tax on investment gains, paid at the evaluation horizon
    pub investment_tax_rate: f64,
}

impl Assumptions {
    /// Reference case used as the default configuration
    pub fn default_case() -> Self {
        Self {
            price: 250_000.0,
            notary_pct: 0.075,
            agency_pct: 0.03,
            renovation_costs: 10_000.0,
            extra_fees: 2_000.0,

            loan_rate: 0.04,
            loan_years: 25,
            down_payment: 50_000.0,

            property_tax_annual: 1_200.0,
            other_taxes_annual: 0.0,
            insurance_rate: 0.0025,
            copro_charges_annual: 1_200.0,
            copro_growth_rate: 0.02,
            maintenance_rate: 0.01,

            price_growth_rate: 0.02,
            inflation_rate: 0.02,
            discount_rate: 0.02,
            purchase_year: 2026,
            sale_year: 2036,
            evaluation_years: 10,

            occupancy_rate: 0.92,
            rent_monthly: 1_100.0,
            rent_growth_rate: 0.02,
            management_fee_rate: 0.06,
            rental_tax_rate: 0.30,

            selling_fee_rate: 0.05,
            capital_gains_rate: 0.0,
            early_repayment_penalty: false,

            reference_rent_monthly: 800.0,
            reference_return_rate: 0.05,
            investment_tax_rate: 0.0,
        }
    }

    /// Notary and agency fees plus renovation and extra costs
    pub fn initial_costs(&self) -> f64 {
        self.notary_pct * self.price
            + self.agency_pct * self.price
            + self.renovation_costs
            + self.extra_fees
    }

    /// Amount borrowed: price plus initial costs, less the down payment
    pub fn loan_principal(&self) -> f64 {
        (self.price + self.initial_costs() - self.down_payment).max(0.0)
    }

    /// Whole years between purchase and sale, within `0..=MAX_HORIZON_YEARS`
    pub fn sale_horizon(&self) -> u32 {
        self.sale_span().clamp(0, i64::from(MAX_HORIZON_YEARS)) as u32
    }

    /// Simulated years, never shorter than the sale horizon nor longer
    /// than `MAX_HORIZON_YEARS`
    pub fn evaluation_horizon(&self) -> u32 {
        self.evaluation_years
            .min(MAX_HORIZON_YEARS)
            .max(self.sale_horizon())
    }

    /// Whether a horizon had to be clamped to `MAX_HORIZON_YEARS`
    pub fn horizon_clamped(&self) -> bool {
        self.sale_span() > i64::from(MAX_HORIZON_YEARS) || self.evaluation_years > MAX_HORIZON_YEARS
    }

    /// Copy with the sale year moved to `years` after purchase
    pub fn with_sale_horizon(&self, years: u32) -> Self {
        let years = i32::try_from(years).unwrap_or(i32::MAX);
        Self {
            sale_year: self.purchase_year.saturating_add(years),
            ..self.clone()
        }
    }

    fn sale_span(&self) -> i64 {
        i64::from(self.sale_year) - i64::from(self.purchase_year)
    }

    /// Check value ranges.
    ///
    /// The engine accepts anything and degrades gracefully; this is for
    /// inputs coming from files or the command line.
    pub fn validate(&self) -> Result<(), AssumptionError> {
        let amounts = [
            ("price", self.price),
            ("renovation_costs", self.renovation_costs),
            ("extra_fees", self.extra_fees),
            ("down_payment", self.down_payment),
            ("property_tax_annual", self.property_tax_annual),
            ("other_taxes_annual", self.other_taxes_annual),
            ("copro_charges_annual", self.copro_charges_annual),
            ("rent_monthly", self.rent_monthly),
            ("reference_rent_monthly", self.reference_rent_monthly),
        ];
        for (field, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("expected a non-negative amount, got {value}")));
            }
        }

        let fractions = [
            ("notary_pct", self.notary_pct),
            ("agency_pct", self.agency_pct),
            ("loan_rate", self.loan_rate),
            ("insurance_rate", self.insurance_rate),
            ("maintenance_rate", self.maintenance_rate),
            ("occupancy_rate", self.occupancy_rate),
            ("management_fee_rate", self.management_fee_rate),
            ("rental_tax_rate", self.rental_tax_rate),
            ("selling_fee_rate", self.selling_fee_rate),
            ("capital_gains_rate", self.capital_gains_rate),
            ("investment_tax_rate", self.investment_tax_rate),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("expected a decimal rate in [0, 1], got {value}")));
            }
        }

        // Growth and discount rates may be negative, but not a total loss
        let growth = [
            ("copro_growth_rate", self.copro_growth_rate),
            ("price_growth_rate", self.price_growth_rate),
            ("inflation_rate", self.inflation_rate),
            ("discount_rate", self.discount_rate),
            ("rent_growth_rate", self.rent_growth_rate),
            ("reference_return_rate", self.reference_return_rate),
        ];
        for (field, value) in growth {
            if !value.is_finite() || value <= -1.0 {
                return Err(invalid(field, format!("expected a rate above -1, got {value}")));
            }
        }

        if self.sale_year < self.purchase_year {
            return Err(invalid(
                "sale_year",
                format!("sale year {} precedes purchase year {}", self.sale_year, self.purchase_year),
            ));
        }
        if self.sale_span() > i64::from(MAX_HORIZON_YEARS) {
            return Err(invalid(
                "sale_year",
                format!("sale more than {MAX_HORIZON_YEARS} years after purchase"),
            ));
        }
        if self.evaluation_years > MAX_HORIZON_YEARS {
            return Err(invalid(
                "evaluation_years",
                format!("expected at most {MAX_HORIZON_YEARS} years, got {}", self.evaluation_years),
            ));
        }
        if self.loan_years > MAX_TERM_YEARS {
            return Err(invalid(
                "loan_years",
                format!("expected at most {MAX_TERM_YEARS} years, got {}", self.loan_years),
            ));
        }

        Ok(())
    }
}

impl Default for Assumptions {
    fn default() -> Self {
        Self::default_case()
    }
}

fn invalid(field: &'static str, reason: String) -> AssumptionError {
    AssumptionError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_case_is_valid() {
        assert_eq!(Assumptions::default_case().validate(), Ok(()));
    }

    #[test]
    fn test_derived_amounts() {
        let a = Assumptions::default_case();
        // 7.5% + 3% of 250k, plus 10k + 2k
        assert_abs_diff_eq!(a.initial_costs(), 38_250.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a.loan_principal(), 238_250.0, epsilon = 1e-9);
        assert_eq!(a.sale_horizon(), 10);
        assert_eq!(a.evaluation_horizon(), 10);
    }

    #[test]
    fn test_loan_principal_floored_at_zero() {
        let a = Assumptions {
            down_payment: 1_000_000.0,
            ..Assumptions::default_case()
        };
        assert_eq!(a.loan_principal(), 0.0);
    }

    #[test]
    fn test_horizons() {
        let a = Assumptions {
            sale_year: 2020,
            evaluation_years: 0,
            ..Assumptions::default_case()
        };
        assert_eq!(a.sale_horizon(), 0);
        assert_eq!(a.evaluation_horizon(), 0);

        let a = Assumptions {
            evaluation_years: 5,
            ..Assumptions::default_case()
        };
        assert_eq!(a.evaluation_horizon(), 10);

        let a = Assumptions::default_case().with_sale_horizon(3);
        assert_eq!(a.sale_year, 2029);
        assert_eq!(a.sale_horizon(), 3);
    }

    #[test]
    fn test_extreme_years_are_clamped() {
        let a = Assumptions {
            purchase_year: i32::MIN,
            sale_year: i32::MAX,
            evaluation_years: u32::MAX,
            ..Assumptions::default_case()
        };
        assert_eq!(a.sale_horizon(), MAX_HORIZON_YEARS);
        assert_eq!(a.evaluation_horizon(), MAX_HORIZON_YEARS);
        assert!(a.horizon_clamped());
        assert!(!Assumptions::default_case().horizon_clamped());

        let moved = Assumptions::default_case().with_sale_horizon(u32::MAX);
        assert_eq!(moved.sale_year, i32::MAX);
        assert_eq!(moved.sale_horizon(), MAX_HORIZON_YEARS);
    }

    #[test]
    fn test_validation_rejects_long_terms() {
        let a = Assumptions {
            loan_years: 400_000_000,
            ..Assumptions::default_case()
        };
        assert!(matches!(a.validate(), Err(AssumptionError::Invalid { field: "loan_years", .. })));

        let a = Assumptions {
            evaluation_years: 101,
            ..Assumptions::default_case()
        };
        assert!(matches!(a.validate(), Err(AssumptionError::Invalid { field: "evaluation_years", .. })));

        let a = Assumptions::default_case().with_sale_horizon(150);
        assert!(matches!(a.validate(), Err(AssumptionError::Invalid { field: "sale_year", .. })));

        let a = Assumptions {
            loan_years: MAX_TERM_YEARS,
            evaluation_years: MAX_HORIZON_YEARS,
            ..Assumptions::default_case()
        };
        assert_eq!(a.validate(), Ok(()));
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let a = Assumptions {
            occupancy_rate: 1.5,
            ..Assumptions::default_case()
        };
        assert!(matches!(
            a.validate(),
            Err(AssumptionError::Invalid { field: "occupancy_rate", .. })
        ));

        let a = Assumptions {
            price_growth_rate: -0.05,
            ..Assumptions::default_case()
        };
        assert_eq!(a.validate(), Ok(()));

        let a = Assumptions {
            sale_year: 2020,
            ..Assumptions::default_case()
        };
        assert!(a.validate().is_err());

        let a = Assumptions {
            price: f64::NAN,
            ..Assumptions::default_case()
        };
        assert!(a.validate().is_err());
    }
}
