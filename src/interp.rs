//! Generic monotonic-x lookup and linear interpolation.
//!
//! The single entry point [`interpolate`] serves both the sector timer and
//! the track map synthesizer. It never extrapolates and never fabricates
//! values across missing channels: a query outside the key range, or a
//! bracket with an absent value, yields `None`.

/// Linearly interpolate a value at `x` over points sorted ascending by key.
///
/// Binary-searches for the greatest index whose key is `<= x` (O(log n)).
/// Returns `None` when `x` lies outside `[min, max]` of the keys. An exact
/// hit on the last point returns that point's value directly; otherwise the
/// bracketing pair is interpolated, and `None` is returned if either
/// bracket's value is absent.
pub fn interpolate<T>(
    points: &[T],
    x: f64,
    key: impl Fn(&T) -> f64,
    value: impl Fn(&T) -> Option<f64>,
) -> Option<f64> {
    if points.is_empty() || !x.is_finite() {
        return None;
    }

    let min = key(&points[0]);
    let max = key(&points[points.len() - 1]);
    if x < min || x > max {
        return None;
    }

    // Greatest index with key <= x; x >= min guarantees at least one
    let upper = points.partition_point(|p| key(p) <= x);
    let idx = upper.saturating_sub(1);

    if idx == points.len() - 1 {
        // Exact hit on the last point
        return value(&points[idx]);
    }

    let x0 = key(&points[idx]);
    let x1 = key(&points[idx + 1]);
    let y0 = value(&points[idx])?;
    let y1 = value(&points[idx + 1])?;

    let dx = x1 - x0;
    if dx == 0.0 {
        return Some(y0);
    }

    let t = (x - x0) / dx;
    Some(y0 + t * (y1 - y0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pts(pairs: &[(f64, f64)]) -> Vec<(f64, f64)> {
        pairs.to_vec()
    }

    fn query(points: &[(f64, f64)], x: f64) -> Option<f64> {
        interpolate(points, x, |p| p.0, |p| Some(p.1))
    }

    #[test]
    fn exact_hit_returns_stored_value() {
        let points = pts(&[(0.0, 10.0), (1.0, 20.0), (2.0, 40.0)]);
        assert_eq!(query(&points, 0.0), Some(10.0));
        assert_eq!(query(&points, 1.0), Some(20.0));
        assert_eq!(query(&points, 2.0), Some(40.0));
    }

    #[test]
    fn midpoint_interpolates_linearly() {
        let points = pts(&[(0.0, 0.0), (10.0, 100.0)]);
        assert_eq!(query(&points, 5.0), Some(50.0));
        assert_eq!(query(&points, 2.5), Some(25.0));
    }

    #[test]
    fn out_of_range_returns_none() {
        let points = pts(&[(1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(query(&points, 0.999), None);
        assert_eq!(query(&points, 2.001), None);
        assert_eq!(query(&points, f64::NAN), None);
    }

    #[test]
    fn empty_and_single_point() {
        let empty: Vec<(f64, f64)> = vec![];
        assert_eq!(query(&empty, 0.0), None);

        let single = pts(&[(3.0, 7.0)]);
        assert_eq!(query(&single, 3.0), Some(7.0));
        assert_eq!(query(&single, 2.9), None);
    }

    #[test]
    fn missing_bracket_value_returns_none() {
        let points = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let result = interpolate(&points, 0.5, |p| p.0, |p| {
            if p.0 == 1.0 { None } else { Some(p.1) }
        });
        assert_eq!(result, None);

        // Exact hit on the last point ignores interior gaps
        let result = interpolate(&points, 2.0, |p| p.0, |p| {
            if p.0 == 1.0 { None } else { Some(p.1) }
        });
        assert_eq!(result, Some(2.0));
    }

    #[test]
    fn duplicate_keys_resolve_to_latest() {
        let points = pts(&[(0.0, 1.0), (1.0, 5.0), (1.0, 9.0), (2.0, 11.0)]);
        // Greatest index with key <= x wins the bracket
        assert_eq!(query(&points, 1.0), Some(9.0));
    }

    proptest! {
        #[test]
        fn interpolated_value_stays_within_bracket(
            xs in proptest::collection::vec(0.0f64..1000.0, 2..40),
            t in 0.0f64..1.0
        ) {
            let mut keys = xs;
            keys.sort_by(|a, b| a.total_cmp(b));
            keys.dedup();
            prop_assume!(keys.len() >= 2);

            let points: Vec<(f64, f64)> =
                keys.iter().map(|&k| (k, k * 2.0 + 1.0)).collect();

            let min = points[0].0;
            let max = points[points.len() - 1].0;
            let x = (min + t * (max - min)).min(max);

            let y = query(&points, x).unwrap();
            let expected = x * 2.0 + 1.0;
            prop_assert!((y - expected).abs() < 1e-6);
        }

        #[test]
        fn never_extrapolates(offset in 1e-6f64..1e6) {
            let points = pts(&[(0.0, 0.0), (1.0, 1.0)]);
            prop_assert_eq!(query(&points, -offset), None);
            prop_assert_eq!(query(&points, 1.0 + offset), None);
        }
    }
}
