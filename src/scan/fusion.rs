//! Confluence fusion of the four signal scores.
//!
//! A fixed weighted sum rounded to one decimal, ties away from zero
//! (`0.25 -> 0.3`, `-0.25 -> -0.3`). The weights are process-wide constants.
//! Flow and liquidity are unbounded magnitudes and are not clamped, so a large
//! flow value can dominate the result.

use crate::utils::round_to;

pub const TA_WEIGHT: f64 = 0.4;
pub const SOCIAL_WEIGHT: f64 = 0.3;
pub const FLOW_WEIGHT: f64 = 0.2;
pub const LIQUIDITY_WEIGHT: f64 = 0.1;

/// Weighted sum before rounding.
pub fn weighted_sum(ta: f64, social: f64, flow: f64, liquidity: f64) -> f64 {
    TA_WEIGHT * ta + SOCIAL_WEIGHT * social + FLOW_WEIGHT * flow + LIQUIDITY_WEIGHT * liquidity
}

/// Confluence score: `round(0.4*ta + 0.3*social + 0.2*flow + 0.1*liquidity, 1)`.
pub fn confluence(ta: f64, social: f64, flow: f64, liquidity: f64) -> f64 {
    round_to(weighted_sum(ta, social, flow, liquidity), 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rstest::rstest;

    #[test]
    fn test_weights_sum_to_one() {
        let total = TA_WEIGHT + SOCIAL_WEIGHT + FLOW_WEIGHT + LIQUIDITY_WEIGHT;
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[rstest]
    #[case(0.0, 0.0, 0.0, 0.0, 0.0)]
    #[case(1.0, 1.0, 1.0, 1.0, 1.0)]
    #[case(0.5, 0.0, 0.0, 0.0, 0.2)]
    #[case(-1.0, -1.0, 0.0, 0.0, -0.7)]
    #[case(0.0, 0.0, 500.0, 0.0, 100.0)]
    #[case(0.1, 0.2, 3.0, 0.0, 0.7)]
    fn test_confluence_cases(
        #[case] ta: f64, #[case] social: f64, #[case] flow: f64, #[case] liquidity: f64,
        #[case] expected: f64,
    ) {
        assert_eq!(confluence(ta, social, flow, liquidity), expected);
    }

    #[test]
    fn test_ties_round_away_from_zero() {
        // 0.4 * 0.625 == 0.25 exactly in f64
        assert_eq!(confluence(0.625, 0.0, 0.0, 0.0), 0.3);
        assert_eq!(confluence(-0.625, 0.0, 0.0, 0.0), -0.3);
    }

    #[test]
    fn test_matches_closed_form_for_random_inputs() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let ta = rng.gen_range(-1.0..=1.0);
            let social = rng.gen_range(-1.0..=1.0);
            let flow = rng.gen_range(0.0..1_000.0);
            let liquidity = rng.gen_range(0.0..10.0);
            let exact = 0.4 * ta + 0.3 * social + 0.2 * flow + 0.1 * liquidity;
            let got = confluence(ta, social, flow, liquidity);
            assert!((got - exact).abs() <= 0.05 + 1e-9, "{} vs {}", got, exact);
        }
    }

    #[test]
    fn test_linear_in_each_argument() {
        let mut rng = rand::thread_rng();
        for _ in 0..1_000 {
            let base: [f64; 4] = [
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(0.0..100.0),
                rng.gen_range(0.0..1.0),
            ];
            let delta = rng.gen_range(-5.0..5.0);
            let weights = [TA_WEIGHT, SOCIAL_WEIGHT, FLOW_WEIGHT, LIQUIDITY_WEIGHT];
            for (i, w) in weights.iter().enumerate() {
                let mut moved = base;
                moved[i] += delta;
                let before = weighted_sum(base[0], base[1], base[2], base[3]);
                let after = weighted_sum(moved[0], moved[1], moved[2], moved[3]);
                assert!((after - before - w * delta).abs() < 1e-9);
            }
        }
    }
}
