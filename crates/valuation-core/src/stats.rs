//! Numeric helpers shared by the context builders, optimizer and scorer.
//!
//! Every score in the pipeline is clamped to a declared range and every ratio is
//! guarded against zero denominators, so these helpers never produce NaN or
//! infinity for finite inputs.

/// Compute the mean of a data slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Compute population standard deviation.
pub fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

/// Clamp `value` into `[lo, hi]`. NaN maps to `lo`.
pub fn clamp_score(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return lo;
    }
    value.max(lo).min(hi)
}

/// Divide, treating a zero or non-finite denominator as 1.
pub fn safe_div(num: f64, den: f64) -> f64 {
    let den = if den == 0.0 || !den.is_finite() { 1.0 } else { den };
    finite_or(num / den, 0.0)
}

/// `part` as a percentage of `whole`; 0 when `whole` is zero.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 || !whole.is_finite() {
        return 0.0;
    }
    finite_or(part / whole * 100.0, 0.0)
}

pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Round to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std_dev() {
        let data = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&data) - 5.0).abs() < 1e-9);
        assert!((std_dev(&data) - 2.0).abs() < 1e-9);
        assert_eq!(std_dev(&[3.0]), 0.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_safe_div_guards_zero() {
        assert_eq!(safe_div(5.0, 0.0), 5.0);
        assert_eq!(safe_div(5.0, f64::NAN), 5.0);
        assert!((safe_div(1.0, 4.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_percent_of_zero_whole() {
        assert_eq!(percent_of(10.0, 0.0), 0.0);
        assert!((percent_of(11_250_000.0, 15_000_000.0) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_score_nan() {
        assert_eq!(clamp_score(f64::NAN, 0.0, 1.0), 0.0);
        assert_eq!(clamp_score(1.4, 0.0, 1.0), 1.0);
        assert_eq!(clamp_score(-3.0, 0.0, 100.0), 0.0);
    }
}
