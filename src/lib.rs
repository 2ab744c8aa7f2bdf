// ABOUTME: Main library entry point for the Nutrilog nutrition tracker core
// ABOUTME: Exposes dual-mode storage, realtime sync, statistics, and migration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Nutrilog
//!
//! The storage and statistics core of a personal nutrition tracker.
//! Applications log food entries, keep a daily goal and reusable food
//! templates, and read aggregated daily and multi-day statistics, all
//! through one session-aware facade.
//!
//! ## Features
//!
//! - **Guest mode**: data lives in a local on-disk vault, loaded once
//!   and written through on every change
//! - **Authenticated mode**: data lives in a per-user partition of a
//!   remote document store and streams back in realtime snapshots
//! - **Statistics**: pure daily and range aggregation over whatever the
//!   active session has loaded
//! - **Migration**: a one-shot, retry-safe move of guest data into a
//!   signed-in user's partition
//!
//! ## Architecture
//!
//! - [`tracker`]: the [`FoodTracker`] facade tying sessions, backends,
//!   and the in-memory view together
//! - [`backend`]: the mode-agnostic write interface and its local and
//!   remote implementations
//! - [`local`]: the JSON file vault used by guest sessions
//! - [`remote`]: the document-store abstraction, the per-user gateway,
//!   and an in-memory store
//! - [`stats`]: stateless aggregation helpers
//! - [`migration`]: the guest-to-account data move
//!
//! ## Example
//!
//! ```rust,no_run
//! use nutrilog::{FoodTracker, MemoryStore, NewFoodEntry, TrackerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> nutrilog::TrackerResult<()> {
//!     let tracker = FoodTracker::new(TrackerConfig::from_env(), Arc::new(MemoryStore::new()));
//!     tracker.connect_guest();
//!
//!     tracker
//!         .add_entry(
//!             NewFoodEntry {
//!                 name: "Elma".to_owned(),
//!                 calories: 95.0,
//!                 protein: 0.5,
//!                 carbs: 25.0,
//!                 fat: 0.3,
//!                 meal_type: None,
//!             },
//!             None,
//!         )
//!         .await?;
//!
//!     let today = tracker.daily_stats();
//!     println!("today: {} kcal", today.totals.calories);
//!     Ok(())
//! }
//! ```

/// Mode-agnostic write interface with local and remote implementations
pub mod backend;

/// Data directory and ready-timeout configuration
pub mod config;

/// Unified error types for tracker, storage, and migration operations
pub mod errors;

/// On-disk JSON vault backing guest sessions
pub mod local;

/// Structured logging setup built on `tracing`
pub mod logging;

/// One-shot migration of guest data into a user's remote partition
pub mod migration;

/// Food entries, goals, templates, and their patch types
pub mod models;

/// Document-store abstraction, per-user gateway, and in-memory store
pub mod remote;

/// Session modes: signed out, guest, or an authenticated user
pub mod session;

/// Pure statistics aggregation over food entries
pub mod stats;

/// The session-aware tracker facade
pub mod tracker;

pub use config::TrackerConfig;
pub use errors::{TrackerError, TrackerResult};
pub use migration::MigrationSummary;
pub use models::{
    DailyGoal, FoodEntry, FoodEntryPatch, FoodTemplate, FoodTemplatePatch, MealType, NewFoodEntry,
    NewFoodTemplate, NutrientTotals, TemplateNutrition, TemplateOrigin, TemplateUnit,
};
pub use remote::{DocumentStore, MemoryStore, RemoteGateway};
pub use session::SessionMode;
pub use stats::{DailyStats, RangeStats, StatsPeriod};
pub use tracker::FoodTracker;
