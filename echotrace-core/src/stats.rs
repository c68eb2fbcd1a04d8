//! Statistics kernel - pure functions over ordered timestamp sequences
//!
//! Everything here is deterministic and side-effect free. Inputs are small
//! (interactions per account per time frame), so nothing is cached.

use chrono::{DateTime, Utc};

use crate::{MAX_ACTIONS_PER_MINUTE, SUSTAINED_BONUS, SUSTAINED_THRESHOLD, ZERO_DIVISION_DEFAULT};

const MS_PER_MINUTE: f64 = 60_000.0;

/// Consecutive differences between timestamps, in milliseconds, sorted
/// ascending. Never empty: fewer than two timestamps yields `[0]`.
pub fn intervals(timestamps: &[DateTime<Utc>]) -> Vec<i64> {
    if timestamps.len() < 2 {
        return vec![0];
    }
    let mut sorted: Vec<i64> = timestamps.iter().map(|t| t.timestamp_millis()).collect();
    sorted.sort_unstable();
    sorted.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Arithmetic mean; callers guard against empty input
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; callers guard against empty input
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Interval regularity: `max(0, 1 - sigma/mu)` over consecutive intervals,
/// with the sustained bonus above [`SUSTAINED_THRESHOLD`]. The bonus is not
/// clamped, so the result may slightly exceed 1.0; consumers clamp their
/// combined scores. A zero mean interval resolves to the zero-division
/// default.
pub fn regularity(timestamps: &[DateTime<Utc>]) -> f64 {
    let gaps: Vec<f64> = intervals(timestamps).iter().map(|&g| g as f64).collect();
    let mu = mean(&gaps);
    if mu == 0.0 {
        return ZERO_DIVISION_DEFAULT;
    }
    let raw = (1.0 - std_dev(&gaps) / mu).max(0.0);
    sustained(raw)
}

/// Action velocity: actions per minute over the observed span, normalized
/// by [`MAX_ACTIONS_PER_MINUTE`] and capped at 1.0, with the sustained bonus
/// above [`SUSTAINED_THRESHOLD`]. A zero span resolves to the zero-division
/// default.
pub fn velocity(timestamps: &[DateTime<Utc>]) -> f64 {
    if timestamps.len() < 2 {
        return ZERO_DIVISION_DEFAULT;
    }
    let first = timestamps.iter().min().expect("non-empty");
    let last = timestamps.iter().max().expect("non-empty");
    let span_minutes = (*last - *first).num_milliseconds() as f64 / MS_PER_MINUTE;
    if span_minutes == 0.0 {
        return ZERO_DIVISION_DEFAULT;
    }
    let per_minute = timestamps.len() as f64 / span_minutes;
    let raw = (per_minute / MAX_ACTIONS_PER_MINUTE).min(1.0);
    sustained(raw)
}

fn sustained(raw: f64) -> f64 {
    if raw > SUSTAINED_THRESHOLD {
        raw + SUSTAINED_BONUS
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, second).unwrap()
    }

    #[test]
    fn test_intervals_sorts_before_differencing() {
        let stamps = vec![ts(10, 0), ts(0, 0), ts(5, 0)];
        assert_eq!(intervals(&stamps), vec![300_000, 300_000]);
    }

    #[test]
    fn test_intervals_never_empty() {
        assert_eq!(intervals(&[]), vec![0]);
        assert_eq!(intervals(&[ts(0, 0)]), vec![0]);
    }

    #[test]
    fn test_mean_and_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_regularity_exact_spacing_earns_bonus() {
        let stamps: Vec<_> = (0..4).map(|i| ts(i * 5, 0)).collect();
        // sigma is zero, raw score 1.0, plus the sustained bonus
        let r = regularity(&stamps);
        assert!((r - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_regularity_irregular_spacing_scores_low() {
        let stamps = vec![ts(0, 0), ts(0, 10), ts(20, 0), ts(21, 0)];
        let r = regularity(&stamps);
        assert!(r < 0.5, "irregular spacing scored {r}");
    }

    #[test]
    fn test_regularity_simultaneous_resolves_to_default() {
        let stamps = vec![ts(0, 0), ts(0, 0), ts(0, 0)];
        assert_eq!(regularity(&stamps), ZERO_DIVISION_DEFAULT);
    }

    #[test]
    fn test_velocity_normalized_by_cap() {
        // 4 actions over 15 minutes: well under 2 actions/minute
        let stamps: Vec<_> = (0..4).map(|i| ts(i * 5, 0)).collect();
        let v = velocity(&stamps);
        let expected = (4.0 / 15.0) / MAX_ACTIONS_PER_MINUTE;
        assert!((v - expected).abs() < 1e-12);
    }

    #[test]
    fn test_velocity_sustained_burst_earns_bonus() {
        // 10 actions in 2.25 minutes: over 4 actions/minute, capped at 1.0 + bonus
        let stamps: Vec<_> = (0u32..10)
            .map(|i| ts((i * 15) / 60, (i * 15) % 60))
            .collect();
        let v = velocity(&stamps);
        assert!((v - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_velocity_zero_span_resolves_to_default() {
        let stamps = vec![ts(0, 0), ts(0, 0)];
        assert_eq!(velocity(&stamps), ZERO_DIVISION_DEFAULT);
    }
}
