// ABOUTME: Tests for daily and range statistics aggregation
// ABOUTME: Validates per-day bucketing, window shapes, and active-day averaging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::float_cmp)]
#![allow(missing_docs)]

mod common;

use chrono::{Days, Local, NaiveDate};
use nutrilog::stats::{daily_stats_for, date_key, entries_on, range_stats_ending};
use nutrilog::{FoodEntry, StatsPeriod};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn entry_at(day: NaiveDate, name: &str, calories: f64, protein: f64, carbs: f64, fat: f64) -> FoodEntry {
    FoodEntry {
        id: name.to_owned(),
        name: name.to_owned(),
        calories,
        protein,
        carbs,
        fat,
        timestamp: common::millis_on(day),
        meal_type: None,
        template_origin: None,
    }
}

#[test]
fn test_daily_totals_sum_each_nutrient() {
    common::init_test_logging();
    let d = day(2025, 5, 10);
    let entries = vec![
        entry_at(d, "oatmeal", 150.0, 5.0, 27.0, 3.0),
        entry_at(d, "yogurt", 100.0, 10.0, 8.0, 2.5),
        entry_at(day(2025, 5, 11), "elsewhere", 999.0, 9.0, 9.0, 9.0),
    ];

    let stats = daily_stats_for(&entries, d);
    assert_eq!(stats.date, d);
    assert_eq!(stats.entries.len(), 2);
    assert_eq!(stats.totals.calories, 250.0);
    assert_eq!(stats.totals.protein, 15.0);
    assert_eq!(stats.totals.carbs, 35.0);
    assert_eq!(stats.totals.fat, 5.5);
}

#[test]
fn test_daily_stats_for_empty_day_is_zero() {
    common::init_test_logging();
    let stats = daily_stats_for(&[], day(2025, 5, 10));
    assert!(stats.entries.is_empty());
    assert_eq!(stats.totals.calories, 0.0);
}

#[test]
fn test_entries_on_filters_by_local_day() {
    common::init_test_logging();
    let d = day(2025, 5, 10);
    let entries = vec![
        entry_at(d, "kept", 100.0, 1.0, 1.0, 1.0),
        entry_at(day(2025, 5, 9), "dropped", 100.0, 1.0, 1.0, 1.0),
    ];

    let on_day = entries_on(&entries, d);
    assert_eq!(on_day.len(), 1);
    assert_eq!(on_day[0].name, "kept");
}

#[test]
fn test_range_window_is_oldest_first_with_zero_gap_days() {
    common::init_test_logging();
    let end = day(2025, 5, 12);
    let entries = vec![
        entry_at(day(2025, 5, 10), "monday", 300.0, 10.0, 30.0, 5.0),
        entry_at(end, "wednesday", 450.0, 20.0, 40.0, 12.0),
    ];

    let stats = range_stats_ending(&entries, end, 3);
    assert_eq!(stats.window_days, 3);
    assert_eq!(stats.days.len(), 3);
    assert_eq!(stats.days[0].date, day(2025, 5, 10));
    assert_eq!(stats.days[1].date, day(2025, 5, 11));
    assert_eq!(stats.days[2].date, end);

    // the gap day is present but empty
    assert!(stats.days[1].entries.is_empty());
    assert_eq!(stats.days[1].totals.calories, 0.0);
    assert_eq!(stats.active_days, 2);
}

#[test]
fn test_averages_divide_by_active_days_not_window_length() {
    common::init_test_logging();
    let end = day(2025, 5, 12);
    let entries = vec![
        entry_at(day(2025, 5, 7), "a", 300.0, 10.4, 30.0, 5.0),
        entry_at(end, "b", 450.0, 20.3, 40.0, 12.0),
    ];

    // 7-day window, only 2 active days: averages use 2 as the divisor
    let stats = range_stats_ending(&entries, end, 7);
    assert_eq!(stats.active_days, 2);
    assert_eq!(stats.averages.calories, 375.0);
    assert_eq!(stats.averages.protein, 15.0); // 30.7 / 2 = 15.35, rounded
    assert_eq!(stats.averages.carbs, 35.0);
    assert_eq!(stats.averages.fat, 9.0); // 17.0 / 2 = 8.5, rounded up
}

#[test]
fn test_averages_are_zero_for_an_inactive_window() {
    common::init_test_logging();
    let stats = range_stats_ending(&[], day(2025, 5, 12), 5);
    assert_eq!(stats.active_days, 0);
    assert_eq!(stats.averages.calories, 0.0);
    assert_eq!(stats.days.len(), 5);
}

#[test]
fn test_daily_buckets_carry_their_date_key() {
    common::init_test_logging();
    let end = day(2025, 3, 7);
    let stats = range_stats_ending(&[], end, 1);
    assert_eq!(date_key(stats.days[0].date), "2025-03-07");
}

#[test]
fn test_all_time_period_spans_earliest_entry_through_today() {
    common::init_test_logging();
    let today = Local::now().date_naive();
    let earliest = today.checked_sub_days(Days::new(9)).unwrap();
    let entries = vec![
        entry_at(earliest, "old", 100.0, 1.0, 1.0, 1.0),
        entry_at(today, "new", 100.0, 1.0, 1.0, 1.0),
    ];

    assert_eq!(StatsPeriod::AllTime.window_days(&entries), 10);
    assert_eq!(StatsPeriod::Week.window_days(&entries), 7);
}
