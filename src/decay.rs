//! # Decay-weighted aggregation
//! Combines per-article polarity scores into one number, weighting later
//! entries exponentially more than earlier ones. Article sources return
//! most-relevant-or-recent ordering, so the aggregation is deliberately
//! order-sensitive rather than a plain mean.

/// Returned (and cached) when no article yields a signal.
pub const NEUTRAL_DEFAULT: f64 = 0.5;

/// Half-life of the positional decay, in sequence positions: an entry two
/// positions before the last carries half the weight of the last.
pub const HALF_LIFE: f64 = 2.0;

/// Adjusted exponentially weighted mean evaluated through the last element.
///
/// Weights are `d^(n-1-i)` with `d = 0.5^(1/HALF_LIFE)`, normalized to sum
/// to 1 across the present observations. An empty slice returns
/// [`NEUTRAL_DEFAULT`] verbatim; the default is never averaged with anything.
pub fn aggregate(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return NEUTRAL_DEFAULT;
    }

    let decay = 0.5_f64.powf(1.0 / HALF_LIFE);
    let n = scores.len();

    let mut num = 0.0;
    let mut denom = 0.0;
    for (i, &s) in scores.iter().enumerate() {
        let w = decay.powi((n - 1 - i) as i32);
        num += w * s;
        denom += w;
    }

    num / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_returns_neutral_default() {
        assert_eq!(aggregate(&[]), NEUTRAL_DEFAULT);
    }

    #[test]
    fn single_element_has_weight_one() {
        assert!((aggregate(&[1.0]) - 1.0).abs() < 1e-12);
        assert!((aggregate(&[-0.25]) + 0.25).abs() < 1e-12);
    }

    #[test]
    fn later_elements_dominate() {
        // With half-life 2, weights for [0.0, 1.0] are [2^-1/2, 1]:
        // aggregate = 1 / (1 + 2^-1/2) ≈ 0.5858, strictly above the
        // arithmetic mean of 0.5.
        let agg = aggregate(&[0.0, 1.0]);
        assert!(agg > 0.5, "got {agg}");
        assert!((agg - 1.0 / (1.0 + 0.5_f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn order_matters() {
        let ascending = aggregate(&[-1.0, 0.0, 1.0]);
        let descending = aggregate(&[1.0, 0.0, -1.0]);
        assert!(ascending > 0.0);
        assert!(descending < 0.0);
        assert!((ascending + descending).abs() < 1e-12);
    }

    #[test]
    fn constant_sequence_is_fixed_point() {
        let agg = aggregate(&[0.3, 0.3, 0.3, 0.3]);
        assert!((agg - 0.3).abs() < 1e-12);
    }

    #[test]
    fn weight_halves_every_two_positions() {
        // [x, 0, 0] vs [0, 0, x]: the first position should carry exactly
        // half the weight of the last.
        let early = aggregate(&[1.0, 0.0, 0.0]);
        let late = aggregate(&[0.0, 0.0, 1.0]);
        assert!((late / early - 2.0).abs() < 1e-9);
    }
}
