// ABOUTME: Pure aggregation over food entries: daily totals, range windows, period presets
// ABOUTME: All bucketing uses the device-local calendar day derived from entry timestamps
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Nutrition Statistics
//!
//! Stateless helpers that fold a slice of [`FoodEntry`] values into daily
//! and multi-day summaries. Nothing here touches storage; the tracker
//! hands in whatever entry set is currently loaded.
//!
//! Days are bucketed by the *local* calendar day of each entry's
//! timestamp, so an entry logged at 23:59 and one at 00:01 the next
//! morning land in different buckets even though they are two minutes
//! apart.

use crate::models::{FoodEntry, NutrientTotals};
use chrono::{Days, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Aggregated nutrition for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStats {
    /// The local calendar day being summarized
    pub date: NaiveDate,
    /// Sum of nutrients over the day's entries
    pub totals: NutrientTotals,
    /// The entries that fell on this day
    pub entries: Vec<FoodEntry>,
}

/// Aggregated nutrition over a contiguous window of days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeStats {
    /// One bucket per day in the window, oldest first
    pub days: Vec<DailyStats>,
    /// Per-day averages over the window, rounded to whole numbers.
    ///
    /// Averages divide by the number of *active* days (days with at
    /// least one entry), so a quiet week does not dilute the numbers.
    pub averages: NutrientTotals,
    /// Number of days in the window with at least one entry
    pub active_days: usize,
    /// The requested window length in days
    pub window_days: u32,
}

/// Preset aggregation windows offered by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsPeriod {
    /// Trailing 7 days
    Week,
    /// Trailing 30 days
    Month,
    /// Trailing 90 days
    Quarter,
    /// From the earliest logged entry through today
    AllTime,
}

impl StatsPeriod {
    /// Window length in days for this period over the given entries.
    ///
    /// [`StatsPeriod::AllTime`] spans from the earliest entry's local
    /// day through today, and is a single day when nothing is logged.
    #[must_use]
    pub fn window_days(self, entries: &[FoodEntry]) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::AllTime => all_time_window(entries),
        }
    }
}

/// Current instant as Unix epoch milliseconds, the timestamp format
/// stored on every [`FoodEntry`].
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// The local calendar day an epoch-millisecond timestamp falls on.
///
/// Returns `None` for timestamps outside the representable date range
/// or inside a local-time gap, which cannot occur for timestamps this
/// crate itself produced.
#[must_use]
pub fn local_day(timestamp_ms: i64) -> Option<NaiveDate> {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.date_naive())
}

/// Canonical `YYYY-MM-DD` key for a calendar day, zero-padded.
#[must_use]
pub fn date_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// The subset of `entries` whose timestamps fall on `day` in local time.
#[must_use]
pub fn entries_on(entries: &[FoodEntry], day: NaiveDate) -> Vec<FoodEntry> {
    entries
        .iter()
        .filter(|entry| local_day(entry.timestamp) == Some(day))
        .cloned()
        .collect()
}

/// Summarize the entries that fall on `day` in local time.
///
/// A day without entries yields zero totals and an empty entry list.
#[must_use]
pub fn daily_stats_for(entries: &[FoodEntry], day: NaiveDate) -> DailyStats {
    let day_entries = entries_on(entries, day);
    let totals = day_entries.iter().map(FoodEntry::totals).sum();
    DailyStats {
        date: day,
        totals,
        entries: day_entries,
    }
}

/// Summarize a trailing window of `days` days ending today.
#[must_use]
pub fn range_stats(entries: &[FoodEntry], days: u32) -> RangeStats {
    range_stats_ending(entries, Local::now().date_naive(), days)
}

/// Summarize the `days`-day window ending on `end_day` inclusive.
///
/// The window always contains exactly `days` buckets, oldest first;
/// days without entries appear as zero buckets. A zero-length window
/// yields no buckets and zero averages.
#[must_use]
pub fn range_stats_ending(entries: &[FoodEntry], end_day: NaiveDate, days: u32) -> RangeStats {
    if days == 0 {
        return RangeStats {
            days: Vec::new(),
            averages: NutrientTotals::ZERO,
            active_days: 0,
            window_days: 0,
        };
    }

    let start = end_day
        .checked_sub_days(Days::new(u64::from(days - 1)))
        .unwrap_or(NaiveDate::MIN);
    let buckets: Vec<DailyStats> = start
        .iter_days()
        .take(days as usize)
        .map(|day| daily_stats_for(entries, day))
        .collect();

    let active_days = buckets
        .iter()
        .filter(|bucket| !bucket.entries.is_empty())
        .count();
    let total: NutrientTotals = buckets.iter().map(|bucket| bucket.totals).sum();
    let divisor = active_days.max(1) as f64;

    RangeStats {
        days: buckets,
        averages: total.scaled(1.0 / divisor).rounded(),
        active_days,
        window_days: days,
    }
}

/// Summarize one of the preset windows ending today.
#[must_use]
pub fn period_stats(entries: &[FoodEntry], period: StatsPeriod) -> RangeStats {
    range_stats(entries, period.window_days(entries))
}

fn all_time_window(entries: &[FoodEntry]) -> u32 {
    let today = Local::now().date_naive();
    entries
        .iter()
        .filter_map(|entry| local_day(entry.timestamp))
        .min()
        .map_or(1, |earliest| {
            let span = (today - earliest).num_days().max(0);
            u32::try_from(span).unwrap_or(u32::MAX).saturating_add(1)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_key_is_zero_padded() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(date_key(day), "2025-03-07");
    }

    #[test]
    fn local_day_round_trips_through_local_noon() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let noon = day.and_hms_opt(12, 0, 0).unwrap();
        let ts = Local
            .from_local_datetime(&noon)
            .single()
            .unwrap()
            .timestamp_millis();
        assert_eq!(local_day(ts), Some(day));
    }

    #[test]
    fn zero_length_window_is_empty() {
        let stats = range_stats(&[], 0);
        assert!(stats.days.is_empty());
        assert_eq!(stats.active_days, 0);
        assert_eq!(stats.window_days, 0);
        assert!(stats.averages.calories.abs() < f64::EPSILON);
    }

    #[test]
    fn window_always_has_requested_bucket_count() {
        let end = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
        let stats = range_stats_ending(&[], end, 7);
        assert_eq!(stats.window_days, 7);
        assert_eq!(stats.days.len(), 7);
        assert_eq!(
            stats.days.first().map(|bucket| bucket.date),
            NaiveDate::from_ymd_opt(2025, 2, 4)
        );
        assert_eq!(stats.days.last().map(|bucket| bucket.date), Some(end));
    }

    #[test]
    fn all_time_window_covers_today_when_empty() {
        assert_eq!(StatsPeriod::AllTime.window_days(&[]), 1);
    }

    #[test]
    fn preset_windows_have_fixed_lengths() {
        assert_eq!(StatsPeriod::Week.window_days(&[]), 7);
        assert_eq!(StatsPeriod::Month.window_days(&[]), 30);
        assert_eq!(StatsPeriod::Quarter.window_days(&[]), 90);
    }
}
