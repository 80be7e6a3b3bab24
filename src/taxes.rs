//! Flat effective-rate tax model
//!
//! A single rate stands in for the full tax code. Losses are never taxed and
//! never refunded.

/// Tax on net rental income
pub fn rental_tax(net_income: f64, rate: f64) -> f64 {
    if rate <= 0.0 || net_income <= 0.0 {
        return 0.0;
    }
    net_income * rate
}

/// Tax on a capital gain (callers pass `max(0, sale_price - purchase_price)`)
pub fn capital_gains_tax(gain: f64, rate: f64) -> f64 {
    if rate <= 0.0 || gain <= 0.0 {
        return 0.0;
    }
    gain * rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_rental_tax() {
        assert_abs_diff_eq!(rental_tax(10_000.0, 0.30), 3_000.0, epsilon = 1e-9);
        assert_eq!(rental_tax(-2_500.0, 0.30), 0.0);
        assert_eq!(rental_tax(10_000.0, 0.0), 0.0);
    }

    #[test]
    fn test_capital_gains_tax() {
        assert_abs_diff_eq!(capital_gains_tax(50_000.0, 0.19), 9_500.0, epsilon = 1e-9);
        assert_eq!(capital_gains_tax(0.0, 0.19), 0.0);
        assert_eq!(capital_gains_tax(-1.0, 0.19), 0.0);
        assert_eq!(capital_gains_tax(50_000.0, -0.1), 0.0);
    }

    proptest! {
        #[test]
        fn prop_taxes_are_monotonic_in_base(
            base in -100_000.0f64..1_000_000.0,
            extra in 0.0f64..100_000.0,
            rate in 0.0f64..1.0,
        ) {
            prop_assert!(rental_tax(base + extra, rate) >= rental_tax(base, rate));
            prop_assert!(capital_gains_tax(base + extra, rate) >= capital_gains_tax(base, rate));
            prop_assert!(rental_tax(base, rate) >= 0.0);
            prop_assert!(capital_gains_tax(base, rate) >= 0.0);
        }

        #[test]
        fn prop_zero_rate_or_base_means_no_tax(base in -100_000.0f64..0.0, rate in 0.0f64..1.0) {
            prop_assert_eq!(rental_tax(base, rate), 0.0);
            prop_assert_eq!(capital_gains_tax(base, rate), 0.0);
            prop_assert_eq!(rental_tax(-base, 0.0), 0.0);
            prop_assert_eq!(capital_gains_tax(-base, 0.0), 0.0);
        }
    }
}
