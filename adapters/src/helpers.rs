//! Shared per-source time-series math. Grounded in
//! `extract/src/platforms/helpers.rs` (the teacher's probability-segment
//! arithmetic): small, sorted-input-assuming functions with a one-line doc
//! comment apiece, returning `anyhow::Result` so a malformed input window is
//! a propagated error rather than a silent default.

use anyhow::Result;
use chrono::NaiveDate;
use forecastbench_core::dates::day_index;
use forecastbench_core::SeriesPoint;

/// Forward-fill a sparse set of observations into a dense daily series from
/// `epoch` to `today` (exclusive — the last row is yesterday UTC, per
/// `spec.md` §4.B). Assumes `observations` is sorted by date ascending.
/// This is the O(1)-per-day implementation of the §9 redesign note:
/// "forward-fill and range queries become O(1) given an epoch anchor."
pub fn forward_fill_daily(
    epoch: NaiveDate,
    today: NaiveDate,
    observations: &[SeriesPoint],
) -> Vec<SeriesPoint> {
    let yesterday = today - chrono::Duration::days(1);
    if epoch > yesterday {
        return Vec::new();
    }
    let len = day_index(epoch, yesterday) as usize + 1;
    let mut dense = vec![f64::NAN; len];
    for obs in observations {
        if obs.date < epoch || obs.date > yesterday {
            continue;
        }
        let idx = day_index(epoch, obs.date) as usize;
        dense[idx] = obs.value;
    }
    let mut last = f64::NAN;
    for v in dense.iter_mut() {
        if v.is_nan() {
            *v = last;
        } else {
            last = *v;
        }
    }
    dense
        .into_iter()
        .enumerate()
        .map(|(i, value)| SeriesPoint {
            date: epoch + chrono::Duration::days(i as i64),
            value,
        })
        .collect()
}

/// Densify a sparse set of observations into a daily series from `epoch` to
/// `today` (exclusive) *without* carrying a value forward across missing
/// days. Unlike [`forward_fill_daily`], a day with no observation stays
/// `NaN` — used by sources where "no longer reported" is semantically
/// distinct from "unchanged" (`spec.md` §4.A "Encyclopedic-table source":
/// "records that disappear from the upstream table between the two dates
/// are treated as NaN").
pub fn dense_daily_no_fill(
    epoch: NaiveDate,
    today: NaiveDate,
    observations: &[SeriesPoint],
) -> Vec<SeriesPoint> {
    let yesterday = today - chrono::Duration::days(1);
    if epoch > yesterday {
        return Vec::new();
    }
    let len = day_index(epoch, yesterday) as usize + 1;
    let mut dense = vec![f64::NAN; len];
    for obs in observations {
        if obs.date < epoch || obs.date > yesterday {
            continue;
        }
        let idx = day_index(epoch, obs.date) as usize;
        dense[idx] = obs.value;
    }
    dense
        .into_iter()
        .enumerate()
        .map(|(i, value)| SeriesPoint {
            date: epoch + chrono::Duration::days(i as i64),
            value,
        })
        .collect()
}

/// Look up the value at a specific date in a dense daily series built by
/// [`forward_fill_daily`]. `O(1)` given the series' own epoch.
pub fn value_at(series: &[SeriesPoint], epoch: NaiveDate, date: NaiveDate) -> Option<f64> {
    if date < epoch {
        return None;
    }
    let idx = day_index(epoch, date) as usize;
    series.get(idx).map(|p| p.value).filter(|v| !v.is_nan())
}

/// Sum of daily values in `[end - window_days + 1, end]` inclusive.
pub fn rolling_sum(series: &[SeriesPoint], epoch: NaiveDate, end: NaiveDate, window_days: i64) -> Result<f64> {
    let start = end - chrono::Duration::days(window_days - 1);
    let mut total = 0.0;
    let mut any = false;
    for p in series {
        if p.date >= start && p.date <= end && !p.value.is_nan() {
            total += p.value;
            any = true;
        }
    }
    if !any {
        anyhow::bail!("no data in rolling window ending {end}");
    }
    let _ = epoch;
    Ok(total)
}

/// 30-day average of 30-day rolling sums, over the 360 days preceding
/// `reference_end` — the event-count source's baseline computation
/// (grounded in `original_source/src/resolve_forecasts/acled.py`'s
/// `_30_day_avg_over_past_360_days`).
pub fn avg_30_day_over_360(series: &[SeriesPoint], epoch: NaiveDate, reference_end: NaiveDate) -> f64 {
    let window_start = reference_end - chrono::Duration::days(360);
    let mut sums = Vec::new();
    let mut cursor = window_start;
    while cursor <= reference_end {
        if let Ok(s) = rolling_sum(series, epoch, cursor, 30) {
            sums.push(s);
        }
        cursor += chrono::Duration::days(30);
    }
    if sums.is_empty() {
        f64::NAN
    } else {
        sums.iter().sum::<f64>() / sums.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(y: i32, m: u32, d: u32, v: f64) -> SeriesPoint {
        SeriesPoint {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            value: v,
        }
    }

    #[test]
    fn forward_fill_carries_last_observation() {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let obs = vec![pt(2024, 1, 1, 10.0), pt(2024, 1, 3, 20.0)];
        let dense = forward_fill_daily(epoch, today, &obs);
        // series runs epoch..=yesterday (2024-01-04), 4 days
        assert_eq!(dense.len(), 4);
        assert_eq!(dense[0].value, 10.0);
        assert_eq!(dense[1].value, 10.0);
        assert_eq!(dense[2].value, 20.0);
        assert_eq!(dense[3].value, 20.0);
    }

    #[test]
    fn dense_daily_no_fill_leaves_gaps_as_nan() {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let obs = vec![pt(2024, 1, 1, 10.0), pt(2024, 1, 3, 20.0)];
        let dense = dense_daily_no_fill(epoch, today, &obs);
        assert_eq!(dense[0].value, 10.0);
        assert!(dense[1].value.is_nan());
        assert_eq!(dense[2].value, 20.0);
        assert!(dense[3].value.is_nan());
    }

    #[test]
    fn rolling_sum_over_window() {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series: Vec<SeriesPoint> = (0..40)
            .map(|i| SeriesPoint {
                date: epoch + chrono::Duration::days(i),
                value: 1.0,
            })
            .collect();
        let end = epoch + chrono::Duration::days(39);
        let sum = rolling_sum(&series, epoch, end, 30).unwrap();
        assert_eq!(sum, 30.0);
    }
}
