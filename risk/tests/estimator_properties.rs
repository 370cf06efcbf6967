//! Property tests for the historical risk estimator

use pfm_risk::{
    expected_shortfall, historical_var, max_drawdown, percentile, RiskEstimator, MIN_OBSERVATIONS,
};
use proptest::prelude::*;

fn returns_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.5f64..0.5, MIN_OBSERVATIONS..300)
}

proptest! {
    #[test]
    fn var_is_interpolated_percentile(returns in returns_strategy(), level in 0.5f64..0.999) {
        let mut sorted = returns.clone();
        sorted.sort_by(f64::total_cmp);

        let var = historical_var(&returns, level).unwrap();
        prop_assert_eq!(var, percentile(&sorted, (1.0 - level) * 100.0));
        prop_assert!(var >= sorted[0] && var <= sorted[sorted.len() - 1]);
    }

    #[test]
    fn shortfall_never_exceeds_var(returns in returns_strategy(), level in 0.5f64..0.999) {
        let var = historical_var(&returns, level).unwrap();
        let es = expected_shortfall(&returns, level).unwrap();
        prop_assert!(es <= var + 1e-12);
    }

    #[test]
    fn var_decreases_with_confidence(returns in returns_strategy(), low in 0.5f64..0.9, gap in 0.0f64..0.09) {
        let high = low + gap;
        let var_low = historical_var(&returns, low).unwrap();
        let var_high = historical_var(&returns, high).unwrap();
        prop_assert!(var_high <= var_low + 1e-12);
    }

    #[test]
    fn drawdown_is_a_fraction(returns in returns_strategy()) {
        let dd = max_drawdown(&returns);
        prop_assert!((0.0..1.0).contains(&dd));
    }

    #[test]
    fn constant_returns_have_zero_volatility(value in -0.1f64..0.1, len in MIN_OBSERVATIONS..100usize) {
        let returns = vec![value; len];
        let estimate = RiskEstimator::default().estimate(&returns, &[0.95]).unwrap();
        prop_assert_eq!(estimate.metrics.volatility, 0.0);
        prop_assert_eq!(estimate.metrics.sharpe_ratio, 0.0);
    }

    #[test]
    fn estimate_is_order_independent(returns in returns_strategy()) {
        let mut reversed = returns.clone();
        reversed.reverse();

        let estimator = RiskEstimator::default();
        let forward = estimator.estimate(&returns, &[0.95, 0.99]).unwrap();
        let backward = estimator.estimate(&reversed, &[0.95, 0.99]).unwrap();
        prop_assert_eq!(forward.tail_risks, backward.tail_risks);
    }
}
