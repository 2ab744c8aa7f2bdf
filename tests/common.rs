// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides tracker construction, sample data builders, and polling helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `nutrilog`
//!
//! Common setup to reduce duplication across integration tests: every
//! tracker is built over a fresh temp directory and an in-memory
//! document store, with a short ready timeout so timeout paths stay
//! fast.

use chrono::{Local, NaiveDate, TimeZone};
use nutrilog::{
    FoodTracker, MemoryStore, NewFoodEntry, NewFoodTemplate, NutrientTotals, TemplateNutrition,
    TrackerConfig,
};
use std::sync::{Arc, Once};
use std::time::Duration;
use tempfile::TempDir;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Config rooted in a fresh temp directory with a short ready timeout.
///
/// The returned [`TempDir`] must outlive the tracker or the vault
/// writes into a deleted directory.
pub fn temp_config() -> (TrackerConfig, TempDir) {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let config = TrackerConfig::default()
        .with_data_dir(dir.path())
        .with_ready_timeout(Duration::from_millis(500));
    (config, dir)
}

/// Tracker over an in-memory store, plus handles to both.
pub fn memory_tracker() -> (FoodTracker, Arc<MemoryStore>, TempDir) {
    let (config, dir) = temp_config();
    let store = Arc::new(MemoryStore::new());
    let tracker = FoodTracker::new(config, store.clone());
    (tracker, store, dir)
}

/// A plausible entry payload with the given name and calories.
pub fn sample_entry(name: &str, calories: f64) -> NewFoodEntry {
    NewFoodEntry {
        name: name.to_owned(),
        calories,
        protein: 1.0,
        carbs: 10.0,
        fat: 0.5,
        meal_type: None,
    }
}

/// A gram-based template payload (nutrition per 100 g).
pub fn gram_template(name: &str, per_100g: NutrientTotals) -> NewFoodTemplate {
    NewFoodTemplate {
        name: name.to_owned(),
        nutrition: TemplateNutrition::Gram { per_100g },
    }
}

/// A piece-based template payload (nutrition per piece).
pub fn piece_template(name: &str, per_piece: NutrientTotals) -> NewFoodTemplate {
    NewFoodTemplate {
        name: name.to_owned(),
        nutrition: TemplateNutrition::Piece { per_piece },
    }
}

/// Epoch milliseconds of local noon on the given day.
pub fn millis_on(day: NaiveDate) -> i64 {
    let noon = day.and_hms_opt(12, 0, 0).unwrap();
    Local
        .from_local_datetime(&noon)
        .single()
        .unwrap()
        .timestamp_millis()
}

/// Poll `check` every 10 ms until it holds, panicking after 2 s.
///
/// Remote-session effects land asynchronously through snapshot pumps,
/// so tests observe them by polling the view.
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}
