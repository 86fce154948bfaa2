use valuation_core::stats::{clamp_score, mean, safe_div, std_dev};

use crate::types::{InflectionKind, InflectionPoint, TrendAnalysis, TrendDirection};

/// Average relative change above which a series counts as moving.
const DIRECTION_THRESHOLD: f64 = 0.1;

pub const DEFAULT_FORECAST_PERIODS: usize = 3;

/// Period-over-period relative changes, measured against the magnitude of the
/// previous value so a shrinking loss counts as an improvement. A zero previous
/// value divides by 1.
pub fn period_deltas(series: &[f64]) -> Vec<f64> {
    series
        .windows(2)
        .map(|w| safe_div(w[1] - w[0], w[0].abs()))
        .collect()
}

/// Analyze a historical series (oldest first).
pub fn analyze_trend(series: &[f64], forecast_periods: usize) -> TrendAnalysis {
    let values: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();

    if values.len() < 2 {
        return TrendAnalysis {
            direction: TrendDirection::Stable,
            strength: 0.0,
            consistency: 0.0,
            inflection_points: Vec::new(),
            forecast: values
                .last()
                .map(|&v| vec![v; forecast_periods])
                .unwrap_or_default(),
        };
    }

    let deltas = period_deltas(&values);
    let avg_delta = mean(&deltas);

    let direction = if avg_delta > DIRECTION_THRESHOLD {
        TrendDirection::Improving
    } else if avg_delta < -DIRECTION_THRESHOLD {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };

    let normalized_std = std_dev(&deltas) / avg_delta.abs().max(0.01);
    let consistency = clamp_score(100.0 - normalized_std * 100.0, 0.0, 100.0);

    TrendAnalysis {
        direction,
        strength: avg_delta.abs(),
        consistency,
        inflection_points: find_inflection_points(&values),
        forecast: linear_forecast(&values, forecast_periods),
    }
}

fn find_inflection_points(values: &[f64]) -> Vec<InflectionPoint> {
    values
        .windows(3)
        .enumerate()
        .filter_map(|(i, w)| {
            let kind = if w[1] > w[0] && w[1] > w[2] {
                InflectionKind::Peak
            } else if w[1] < w[0] && w[1] < w[2] {
                InflectionKind::Trough
            } else {
                return None;
            };
            Some(InflectionPoint {
                index: i + 1,
                kind,
                value: w[1],
            })
        })
        .collect()
}

/// Extend the series by its average absolute step, floored at zero.
fn linear_forecast(values: &[f64], periods: usize) -> Vec<f64> {
    let Some(&last) = values.last() else {
        return Vec::new();
    };
    let steps: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let avg_step = mean(&steps);
    (1..=periods)
        .map(|k| (last + avg_step * k as f64).max(0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increasing_series_is_improving() {
        let trend = analyze_trend(&[10_000_000.0, 12_000_000.0, 15_000_000.0], 3);
        assert_eq!(trend.direction, TrendDirection::Improving);
        assert!((trend.strength - 0.225).abs() < 1e-9);
        assert_eq!(trend.forecast.len(), 3);
        assert!((trend.forecast[0] - 17_500_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_decreasing_series_is_declining() {
        let trend = analyze_trend(&[100.0, 80.0, 60.0, 45.0], 2);
        assert_eq!(trend.direction, TrendDirection::Declining);
    }

    #[test]
    fn test_small_changes_are_stable() {
        let trend = analyze_trend(&[100.0, 105.0, 110.0], 1);
        assert_eq!(trend.direction, TrendDirection::Stable);

        let flat = analyze_trend(&[100.0, 100.0, 100.0], 1);
        assert_eq!(flat.direction, TrendDirection::Stable);
        assert_eq!(flat.strength, 0.0);
    }

    #[test]
    fn test_exact_threshold_is_stable() {
        // +10% then +10%: average delta is exactly 0.1
        let trend = analyze_trend(&[100.0, 110.0, 121.0], 1);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_inflection_points() {
        let trend = analyze_trend(&[10.0, 20.0, 15.0, 5.0, 12.0], 1);
        let kinds: Vec<_> = trend.inflection_points.iter().map(|p| (p.index, p.kind)).collect();
        assert_eq!(kinds, vec![(1, InflectionKind::Peak), (3, InflectionKind::Trough)]);
    }

    #[test]
    fn test_insufficient_data() {
        let single = analyze_trend(&[42.0], 3);
        assert_eq!(single.direction, TrendDirection::Stable);
        assert_eq!(single.consistency, 0.0);
        assert_eq!(single.forecast, vec![42.0, 42.0, 42.0]);

        let empty = analyze_trend(&[], 3);
        assert!(empty.forecast.is_empty());
    }

    #[test]
    fn test_zero_start_is_finite() {
        let trend = analyze_trend(&[0.0, 50.0, 100.0], 2);
        assert!(trend.strength.is_finite());
        assert!(trend.consistency >= 0.0 && trend.consistency <= 100.0);
    }

    #[test]
    fn test_steady_growth_is_consistent() {
        let steady = analyze_trend(&[100.0, 150.0, 225.0, 337.5], 1);
        assert!(steady.consistency > 99.0);
        let erratic = analyze_trend(&[100.0, 300.0, 120.0, 400.0], 1);
        assert!(erratic.consistency < steady.consistency);
    }

    #[test]
    fn test_negative_series_uses_magnitude() {
        assert_eq!(period_deltas(&[-100.0, -50.0]), vec![0.5]);

        let narrowing_losses = analyze_trend(&[-100.0, -50.0, -25.0], 1);
        assert_eq!(narrowing_losses.direction, TrendDirection::Improving);
        assert!((narrowing_losses.strength - 0.5).abs() < 1e-9);

        let deepening_losses = analyze_trend(&[-50.0, -100.0, -200.0], 1);
        assert_eq!(deepening_losses.direction, TrendDirection::Declining);
        assert!((deepening_losses.strength - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_floored_at_zero() {
        let trend = analyze_trend(&[30.0, 20.0, 10.0], 3);
        assert_eq!(trend.forecast, vec![0.0, 0.0, 0.0]);
    }
}
