// ABOUTME: Session-aware facade routing reads and writes to the active backend
// ABOUTME: Owns the in-memory view, the loading flag, and the snapshot pump tasks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Food Tracker Facade
//!
//! [`FoodTracker`] is the crate's front door. Callers pick a session with
//! [`FoodTracker::connect_guest`] or [`FoodTracker::connect_user`], mutate
//! through mode-agnostic entry, goal, and template operations, and read
//! from an always-warm in-memory view.
//!
//! In guest mode the view is loaded from the local vault once and every
//! write updates vault and view together. In an authenticated session the
//! view is fed by realtime snapshot streams, so a write becomes visible
//! only when the store echoes it back; [`FoodTracker::is_loading`] stays
//! raised until every stream has delivered its first snapshot or the
//! configured ready timeout passes.

use crate::backend::{ActiveBackend, LocalBackend, RemoteBackend, TrackerBackend};
use crate::config::TrackerConfig;
use crate::errors::{TrackerError, TrackerResult};
use crate::local::{LocalVault, StorageKey};
use crate::migration::{self, MigrationSummary};
use crate::models::{
    DailyGoal, FoodEntry, FoodEntryPatch, FoodTemplate, FoodTemplatePatch, MealType, NewFoodEntry,
    NewFoodTemplate, TemplateOrigin,
};
use crate::remote::{DocumentStore, RemoteGateway, Subscription};
use crate::session::SessionMode;
use crate::stats::{self, DailyStats, RangeStats, StatsPeriod};
use chrono::Local;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The data a session exposes: entries, the daily goal, and templates.
///
/// Guest sessions fill this from the vault; authenticated sessions
/// overwrite each field wholesale as snapshots arrive.
#[derive(Debug, Default)]
pub(crate) struct TrackerState {
    pub entries: Vec<FoodEntry>,
    pub goal: Option<DailyGoal>,
    pub templates: Vec<FoodTemplate>,
}

/// Shared handle to the in-memory view, written by backends and pumps.
pub(crate) type SharedState = Arc<RwLock<TrackerState>>;

/// Dual-mode nutrition tracker over a local vault and a remote document store.
pub struct FoodTracker {
    config: TrackerConfig,
    store: Arc<dyn DocumentStore>,
    vault: Arc<LocalVault>,
    state: SharedState,
    mode: RwLock<SessionMode>,
    backend: RwLock<Option<ActiveBackend>>,
    loading_tx: watch::Sender<bool>,
    loading_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl FoodTracker {
    /// Create a tracker over `store` with no active session.
    ///
    /// Every operation that writes data fails with
    /// [`TrackerError::NotAuthenticated`] until a session is opened.
    #[must_use]
    pub fn new(config: TrackerConfig, store: Arc<dyn DocumentStore>) -> Self {
        let vault = Arc::new(LocalVault::new(config.data_dir.clone()));
        let (loading_tx, loading_rx) = watch::channel(false);
        Self {
            config,
            store,
            vault,
            state: Arc::new(RwLock::new(TrackerState::default())),
            mode: RwLock::new(SessionMode::SignedOut),
            backend: RwLock::new(None),
            loading_tx,
            loading_rx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// The configuration this tracker was built with.
    #[must_use]
    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    // ================================================================
    // Session lifecycle
    // ================================================================

    /// Start a guest session backed by the local vault.
    ///
    /// Loads entries, goal, and templates from disk into the view. The
    /// vault read is synchronous, so the loading flag is never raised
    /// and the view is complete when this returns.
    pub fn connect_guest(&self) {
        self.teardown();

        let entries: Vec<FoodEntry> = self.vault.read(StorageKey::Entries, Vec::new());
        let goal: Option<DailyGoal> = self.vault.read(StorageKey::Goal, None);
        let templates: Vec<FoodTemplate> = self.vault.read(StorageKey::Templates, Vec::new());
        {
            let mut state = self.write_state();
            state.entries = entries;
            state.goal = goal;
            state.templates = templates;
        }

        let backend = ActiveBackend::Local(LocalBackend::new(
            Arc::clone(&self.vault),
            Arc::clone(&self.state),
        ));
        info!(backend = backend.backend_info(), "guest session started");
        *self.backend_slot() = Some(backend);
        *self.mode_slot() = SessionMode::Guest;
    }

    /// Start an authenticated session for `user_id`.
    ///
    /// Opens realtime subscriptions on the user's entries, goal, and
    /// templates, raises the loading flag, and lowers it once every
    /// stream has delivered its first snapshot (or after the configured
    /// ready timeout, whichever comes first). Writes route to the
    /// remote store from the moment this returns.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Remote`] if any subscription could not be
    /// opened; no session is established in that case.
    pub async fn connect_user(&self, user_id: Uuid) -> TrackerResult<()> {
        self.teardown();
        self.loading_tx.send_replace(true);

        let gateway = RemoteGateway::new(Arc::clone(&self.store), user_id);
        if let Err(err) = self.start_snapshot_pumps(&gateway).await {
            self.loading_tx.send_replace(false);
            return Err(err);
        }

        let backend = ActiveBackend::Remote(RemoteBackend::new(gateway));
        info!(backend = backend.backend_info(), %user_id, "user session started");
        *self.backend_slot() = Some(backend);
        *self.mode_slot() = SessionMode::Authenticated(user_id);
        Ok(())
    }

    /// End the current session, if any.
    ///
    /// Cancels snapshot pumps (which releases their store listeners),
    /// clears the in-memory view, and returns the tracker to the
    /// signed-out mode. Vault contents are untouched.
    pub fn disconnect(&self) {
        info!(mode = %self.mode(), "session closed");
        self.teardown();
    }

    fn teardown(&self) {
        for task in self.tasks_slot().drain(..) {
            task.abort();
        }
        *self.backend_slot() = None;
        *self.mode_slot() = SessionMode::SignedOut;
        *self.write_state() = TrackerState::default();
        self.loading_tx.send_replace(false);
    }

    async fn start_snapshot_pumps(&self, gateway: &RemoteGateway) -> TrackerResult<()> {
        let entries_sub = gateway.subscribe_entries().await?;
        let goal_sub = gateway.subscribe_goal().await?;
        let templates_sub = gateway.subscribe_templates().await?;

        let (entries_ready, entries_first) = oneshot::channel();
        let (goal_ready, goal_first) = oneshot::channel();
        let (templates_ready, templates_first) = oneshot::channel();

        let mut tasks = self.tasks_slot();
        tasks.push(tokio::spawn(pump_snapshots(
            Arc::clone(&self.state),
            entries_sub,
            entries_ready,
            |state, entries| state.entries = entries,
        )));
        tasks.push(tokio::spawn(pump_snapshots(
            Arc::clone(&self.state),
            goal_sub,
            goal_ready,
            |state, goal| state.goal = goal,
        )));
        tasks.push(tokio::spawn(pump_snapshots(
            Arc::clone(&self.state),
            templates_sub,
            templates_ready,
            |state, templates| state.templates = templates,
        )));
        tasks.push(tokio::spawn(lower_loading_flag(
            self.loading_tx.clone(),
            [entries_first, goal_first, templates_first],
            self.config.ready_timeout,
        )));
        Ok(())
    }

    /// The current session mode.
    #[must_use]
    pub fn mode(&self) -> SessionMode {
        *self.mode.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Human-readable label of the active backend, if a session is open.
    #[must_use]
    pub fn backend_info(&self) -> Option<&'static str> {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(ActiveBackend::backend_info)
    }

    /// `true` while an authenticated session is waiting for its first
    /// snapshots.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.loading_rx.borrow()
    }

    /// Wait until the view has finished its initial load.
    ///
    /// Returns immediately when no load is in progress, including in
    /// guest mode and when signed out.
    pub async fn ready(&self) {
        let mut loading = self.loading_rx.clone();
        let _ = loading.wait_for(|loading| !*loading).await;
    }

    // ================================================================
    // Entry, goal, and template operations
    // ================================================================

    /// Log a food entry, timestamped `at` (epoch milliseconds) or now.
    ///
    /// Returns the stored entry with its backend-assigned id. In an
    /// authenticated session the returned entry reaches the view only
    /// once the store echoes it back through the snapshot stream.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NotAuthenticated`] without an active session, or
    /// [`TrackerError::Remote`] if the store rejects the write.
    pub async fn add_entry(&self, entry: NewFoodEntry, at: Option<i64>) -> TrackerResult<FoodEntry> {
        let backend = self.active_backend()?;
        let timestamp = at.unwrap_or_else(stats::now_millis);
        backend.add_entry(entry.into_entry(timestamp)).await
    }

    /// Log an entry derived from a stored food template.
    ///
    /// `amount` is grams for per-100g templates and a piece count for
    /// per-piece templates; nutrients are scaled accordingly and the
    /// entry records its template origin. Returns `Ok(None)` without
    /// logging anything when no session is active or the template id is
    /// unknown.
    ///
    /// # Errors
    ///
    /// [`TrackerError::Remote`] if the store rejects the write.
    pub async fn add_entry_from_template(
        &self,
        template_id: &str,
        amount: f64,
        meal_type: Option<MealType>,
    ) -> TrackerResult<Option<FoodEntry>> {
        let Ok(backend) = self.active_backend() else {
            debug!(template_id, "ignoring template entry, no active session");
            return Ok(None);
        };
        let Some(template) = self.find_template(template_id) else {
            debug!(template_id, "ignoring template entry, unknown template");
            return Ok(None);
        };

        let portion = template.nutrition.portion(amount);
        let entry = FoodEntry {
            id: String::new(),
            name: template.portion_name(amount),
            calories: portion.calories,
            protein: portion.protein,
            carbs: portion.carbs,
            fat: portion.fat,
            timestamp: stats::now_millis(),
            meal_type,
            template_origin: Some(TemplateOrigin {
                template_id: template.id.clone(),
                amount,
                unit: template.nutrition.unit(),
            }),
        };
        backend.add_entry(entry).await.map(Some)
    }

    /// Delete the entry with `entry_id`.
    ///
    /// Deleting an id that does not exist is a successful no-op.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NotAuthenticated`] without an active session, or
    /// [`TrackerError::Remote`] if the store rejects the delete.
    pub async fn delete_entry(&self, entry_id: &str) -> TrackerResult<()> {
        self.active_backend()?.delete_entry(entry_id).await
    }

    /// Apply `patch` to the entry with `entry_id`, leaving absent
    /// fields untouched.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NotAuthenticated`] without an active session, or
    /// [`TrackerError::Remote`] when the remote store rejects the edit,
    /// including edits addressing an id that does not exist there.
    pub async fn edit_entry(&self, entry_id: &str, patch: FoodEntryPatch) -> TrackerResult<()> {
        self.active_backend()?.edit_entry(entry_id, patch).await
    }

    /// Set or replace the daily nutrition goal.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NotAuthenticated`] without an active session, or
    /// [`TrackerError::Remote`] if the store rejects the write.
    pub async fn set_goal(&self, goal: DailyGoal) -> TrackerResult<()> {
        self.active_backend()?.set_goal(goal).await
    }

    /// Save a reusable food template.
    ///
    /// Returns the stored template with its backend-assigned id.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NotAuthenticated`] without an active session, or
    /// [`TrackerError::Remote`] if the store rejects the write.
    pub async fn add_template(&self, template: NewFoodTemplate) -> TrackerResult<FoodTemplate> {
        self.active_backend()?
            .add_template(template.into_template())
            .await
    }

    /// Apply `patch` to the template with `template_id`.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NotAuthenticated`] without an active session, or
    /// [`TrackerError::Remote`] when the remote store rejects the edit.
    pub async fn edit_template(
        &self,
        template_id: &str,
        patch: FoodTemplatePatch,
    ) -> TrackerResult<()> {
        self.active_backend()?.edit_template(template_id, patch).await
    }

    /// Delete the template with `template_id`; unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NotAuthenticated`] without an active session, or
    /// [`TrackerError::Remote`] if the store rejects the delete.
    pub async fn delete_template(&self, template_id: &str) -> TrackerResult<()> {
        self.active_backend()?.delete_template(template_id).await
    }

    /// Delete several templates in one operation.
    ///
    /// Against the remote store the batch is atomic: either every named
    /// template is removed or none are.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NotAuthenticated`] without an active session, or
    /// [`TrackerError::Remote`] if the store rejects the batch.
    pub async fn delete_templates(&self, template_ids: &[String]) -> TrackerResult<()> {
        self.active_backend()?.delete_templates(template_ids).await
    }

    /// Move all guest data from the vault into the signed-in user's
    /// remote partition, then clear the vault.
    ///
    /// Document ids are derived deterministically from the local ids,
    /// so a retry after a partial failure overwrites rather than
    /// duplicates. The migrated data reaches the view through the
    /// session's snapshot streams.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NotAuthenticated`] unless an authenticated
    /// session is active, or [`TrackerError::Migration`] wrapping the
    /// first remote write that failed; the vault is left intact on
    /// failure.
    pub async fn migrate_guest_data(&self) -> TrackerResult<MigrationSummary> {
        let SessionMode::Authenticated(user_id) = self.mode() else {
            return Err(TrackerError::NotAuthenticated);
        };
        let gateway = RemoteGateway::new(Arc::clone(&self.store), user_id);
        migration::migrate_guest_data(&self.vault, &gateway).await
    }

    // ================================================================
    // Views and statistics
    // ================================================================

    /// All entries currently in the view, in the backend's order.
    #[must_use]
    pub fn entries(&self) -> Vec<FoodEntry> {
        self.read_state().entries.clone()
    }

    /// The current daily goal, if one is set.
    #[must_use]
    pub fn goal(&self) -> Option<DailyGoal> {
        self.read_state().goal
    }

    /// All saved food templates currently in the view.
    #[must_use]
    pub fn templates(&self) -> Vec<FoodTemplate> {
        self.read_state().templates.clone()
    }

    /// The entries logged on the current local calendar day.
    #[must_use]
    pub fn today_entries(&self) -> Vec<FoodEntry> {
        stats::entries_on(&self.read_state().entries, Local::now().date_naive())
    }

    /// Totals and entries for the current local calendar day.
    #[must_use]
    pub fn daily_stats(&self) -> DailyStats {
        stats::daily_stats_for(&self.read_state().entries, Local::now().date_naive())
    }

    /// Per-day buckets and averages for the trailing `days`-day window.
    #[must_use]
    pub fn range_stats(&self, days: u32) -> RangeStats {
        stats::range_stats(&self.read_state().entries, days)
    }

    /// Range statistics for one of the preset windows.
    #[must_use]
    pub fn period_stats(&self, period: StatsPeriod) -> RangeStats {
        stats::period_stats(&self.read_state().entries, period)
    }

    // ================================================================
    // Internals
    // ================================================================

    fn active_backend(&self) -> TrackerResult<ActiveBackend> {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(TrackerError::NotAuthenticated)
    }

    fn find_template(&self, template_id: &str) -> Option<FoodTemplate> {
        self.read_state()
            .templates
            .iter()
            .find(|template| template.id == template_id)
            .cloned()
    }

    fn read_state(&self) -> RwLockReadGuard<'_, TrackerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, TrackerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn mode_slot(&self) -> RwLockWriteGuard<'_, SessionMode> {
        self.mode.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn backend_slot(&self) -> RwLockWriteGuard<'_, Option<ActiveBackend>> {
        self.backend.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn tasks_slot(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for FoodTracker {
    fn drop(&mut self) {
        for task in self.tasks_slot().drain(..) {
            task.abort();
        }
    }
}

impl fmt::Debug for FoodTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FoodTracker")
            .field("mode", &self.mode())
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

/// Apply every snapshot from `subscription` to the shared view,
/// signalling `ready` after the first one.
async fn pump_snapshots<P: Send + 'static>(
    state: SharedState,
    mut subscription: Subscription<P>,
    ready: oneshot::Sender<()>,
    apply: fn(&mut TrackerState, P),
) {
    let mut ready = Some(ready);
    while let Some(payload) = subscription.recv().await {
        {
            let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
            apply(&mut guard, payload);
        }
        if let Some(ready) = ready.take() {
            let _ = ready.send(());
        }
    }
    debug!("snapshot stream closed");
}

/// Lower the loading flag once every stream has delivered its first
/// snapshot, or after `ready_timeout` if some never do.
async fn lower_loading_flag(
    loading_tx: watch::Sender<bool>,
    first_snapshots: [oneshot::Receiver<()>; 3],
    ready_timeout: Duration,
) {
    let all_arrived = async {
        for first in first_snapshots {
            let _ = first.await;
        }
    };
    if time::timeout(ready_timeout, all_arrived).await.is_err() {
        warn!(
            timeout_secs = ready_timeout.as_secs(),
            "initial snapshots incomplete, leaving the loading state anyway"
        );
    }
    loading_tx.send_replace(false);
}
