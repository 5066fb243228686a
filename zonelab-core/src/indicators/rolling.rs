//! Trailing-window aggregates with `min_periods = 1`.
//!
//! NaN inputs are skipped. A window with no valid value yields NaN.

use std::collections::VecDeque;

/// Mean of the valid values in `values[t-window+1..=t]`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut result = vec![f64::NAN; values.len()];
    let mut sum = 0.0;
    let mut count = 0usize;

    for (i, &v) in values.iter().enumerate() {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
        if i >= window {
            let old = values[i - window];
            if !old.is_nan() {
                sum -= old;
                count -= 1;
            }
        }
        if count > 0 {
            result[i] = sum / count as f64;
        }
    }

    result
}

/// Max of the valid values in `values[t-window+1..=t]`.
///
/// Monotonic deque of candidate indices, O(n) overall.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut result = vec![f64::NAN; values.len()];
    let mut candidates: VecDeque<usize> = VecDeque::new();

    for (i, &v) in values.iter().enumerate() {
        while candidates.front().is_some_and(|&j| j + window <= i) {
            candidates.pop_front();
        }
        if !v.is_nan() {
            while candidates.back().is_some_and(|&j| values[j] <= v) {
                candidates.pop_back();
            }
            candidates.push_back(i);
        }
        if let Some(&j) = candidates.front() {
            result[i] = values[j];
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn mean_with_partial_window() {
        let m = rolling_mean(&[2.0, 4.0, 6.0, 8.0], 3);
        assert_approx(m[0], 2.0, DEFAULT_EPSILON);
        assert_approx(m[1], 3.0, DEFAULT_EPSILON);
        assert_approx(m[2], 4.0, DEFAULT_EPSILON);
        assert_approx(m[3], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn mean_skips_nan() {
        let m = rolling_mean(&[f64::NAN, 4.0, f64::NAN, 8.0], 2);
        assert!(m[0].is_nan());
        assert_approx(m[1], 4.0, DEFAULT_EPSILON);
        assert_approx(m[2], 4.0, DEFAULT_EPSILON);
        assert_approx(m[3], 8.0, DEFAULT_EPSILON);
    }

    #[test]
    fn max_tracks_window() {
        let m = rolling_max(&[1.0, 5.0, 3.0, 2.0, 4.0], 2);
        assert_eq!(m, vec![1.0, 5.0, 5.0, 3.0, 4.0]);
    }

    #[test]
    fn max_skips_nan_and_leading_gap() {
        let m = rolling_max(&[f64::NAN, f64::NAN, 0.7, -0.3, 0.1], 2000);
        assert!(m[0].is_nan());
        assert!(m[1].is_nan());
        assert_eq!(&m[2..], &[0.7, 0.7, 0.7]);
    }

    #[test]
    fn max_matches_naive_scan() {
        let values: Vec<f64> = (0..60)
            .map(|i| ((i * 37 % 23) as f64) - 11.0)
            .collect();
        let window = 7;
        let fast = rolling_max(&values, window);
        for i in 0..values.len() {
            let start = (i + 1).saturating_sub(window);
            let naive = values[start..=i]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            assert_approx(fast[i], naive, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn empty_input() {
        assert!(rolling_mean(&[], 5).is_empty());
        assert!(rolling_max(&[], 5).is_empty());
    }
}
