// ABOUTME: Tests for the one-shot guest-to-account data migration
// ABOUTME: Validates counts, vault clearing, failure rollback, and retry convergence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::float_cmp)]
#![allow(missing_docs)]

mod common;

use anyhow::{bail, Result};
use async_trait::async_trait;
use nutrilog::local::StorageKey;
use nutrilog::remote::{Collection, Snapshot, StoreSubscription};
use nutrilog::{
    DailyGoal, DocumentStore, FoodTracker, MemoryStore, NutrientTotals, SessionMode, TrackerError,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

async fn seed_guest_data(tracker: &FoodTracker) {
    tracker.connect_guest();
    for (name, calories) in [("Elma", 95.0), ("Ekmek", 80.0), ("Yumurta", 70.0)] {
        tracker
            .add_entry(common::sample_entry(name, calories), None)
            .await
            .unwrap();
    }
    tracker
        .set_goal(DailyGoal {
            calories: 2000.0,
            protein: 100.0,
            carbs: 250.0,
            fat: 70.0,
        })
        .await
        .unwrap();
    tracker
        .add_template(common::gram_template(
            "Tavuk",
            NutrientTotals::new(165.0, 31.0, 0.0, 3.6),
        ))
        .await
        .unwrap();
    tracker
        .add_template(common::piece_template(
            "Yumurta",
            NutrientTotals::new(70.0, 6.0, 0.5, 5.0),
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_migration_moves_everything_and_clears_the_vault() {
    let (tracker, store, dir) = common::memory_tracker();
    seed_guest_data(&tracker).await;

    tracker.connect_user(Uuid::new_v4()).await.unwrap();
    tracker.ready().await;
    assert!(tracker.entries().is_empty());

    let summary = tracker.migrate_guest_data().await.unwrap();
    assert_eq!(summary.entries, 3);
    assert!(summary.goal_migrated);
    assert_eq!(summary.templates, 2);

    assert_eq!(store.len(Collection::Foods), 3);
    assert_eq!(store.len(Collection::Goals), 1);
    assert_eq!(store.len(Collection::Templates), 2);

    // the vault files are gone once everything is safely remote
    for key in StorageKey::ALL {
        assert!(!dir.path().join(key.file_name()).exists());
    }

    // the migrated data flows back into the view through snapshots
    common::wait_until(|| tracker.entries().len() == 3).await;
    common::wait_until(|| tracker.goal().is_some()).await;
    common::wait_until(|| tracker.templates().len() == 2).await;
}

#[tokio::test]
async fn test_migrating_an_empty_vault_is_a_no_op() {
    let (tracker, store, _dir) = common::memory_tracker();
    tracker.connect_user(Uuid::new_v4()).await.unwrap();
    tracker.ready().await;

    let summary = tracker.migrate_guest_data().await.unwrap();
    assert!(summary.is_empty());
    assert!(store.is_empty(Collection::Foods));
    assert!(store.is_empty(Collection::Goals));
    assert!(store.is_empty(Collection::Templates));
}

#[tokio::test]
async fn test_migration_requires_an_authenticated_session() {
    let (tracker, _store, _dir) = common::memory_tracker();

    let err = tracker.migrate_guest_data().await.unwrap_err();
    assert!(matches!(err, TrackerError::NotAuthenticated));

    tracker.connect_guest();
    let err = tracker.migrate_guest_data().await.unwrap_err();
    assert!(err.is_not_authenticated());
}

/// Delegates to a [`MemoryStore`] but fails the nth `put` call.
struct FlakyPuts {
    inner: MemoryStore,
    fail_at: usize,
    calls: AtomicUsize,
}

impl FlakyPuts {
    fn new(fail_at: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_at,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyPuts {
    async fn create(&self, collection: Collection, owner_id: Uuid, data: Value) -> Result<String> {
        self.inner.create(collection, owner_id, data).await
    }

    async fn put(
        &self,
        collection: Collection,
        owner_id: Uuid,
        doc_id: &str,
        data: Value,
    ) -> Result<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_at {
            bail!("injected put failure");
        }
        self.inner.put(collection, owner_id, doc_id, data).await
    }

    async fn update(&self, collection: Collection, doc_id: &str, fields: Value) -> Result<()> {
        self.inner.update(collection, doc_id, fields).await
    }

    async fn delete(&self, collection: Collection, doc_id: &str) -> Result<()> {
        self.inner.delete(collection, doc_id).await
    }

    async fn delete_many(&self, collection: Collection, doc_ids: &[String]) -> Result<()> {
        self.inner.delete_many(collection, doc_ids).await
    }

    async fn fetch(&self, collection: Collection, owner_id: Uuid) -> Result<Snapshot> {
        self.inner.fetch(collection, owner_id).await
    }

    async fn subscribe(
        &self,
        collection: Collection,
        owner_id: Uuid,
    ) -> Result<StoreSubscription> {
        self.inner.subscribe(collection, owner_id).await
    }
}

#[tokio::test]
async fn test_partial_failure_keeps_the_vault_and_retry_converges() {
    let (config, dir) = common::temp_config();
    let store = Arc::new(FlakyPuts::new(2));
    let tracker = FoodTracker::new(config, store.clone());
    seed_guest_data(&tracker).await;

    let user_id = Uuid::new_v4();
    tracker.connect_user(user_id).await.unwrap();
    tracker.ready().await;
    assert_eq!(tracker.mode(), SessionMode::Authenticated(user_id));

    // third entry put fails; two entries are already remote
    let err = tracker.migrate_guest_data().await.unwrap_err();
    assert!(matches!(err, TrackerError::Migration { .. }));
    assert_eq!(store.inner.len(Collection::Foods), 2);
    assert!(store.inner.is_empty(Collection::Goals));

    // the vault is untouched, so nothing was lost
    for key in StorageKey::ALL {
        assert!(dir.path().join(key.file_name()).exists());
    }

    // deterministic document ids make the retry overwrite, not duplicate
    let summary = tracker.migrate_guest_data().await.unwrap();
    assert_eq!(summary.entries, 3);
    assert!(summary.goal_migrated);
    assert_eq!(summary.templates, 2);

    assert_eq!(store.inner.len(Collection::Foods), 3);
    assert_eq!(store.inner.len(Collection::Goals), 1);
    assert_eq!(store.inner.len(Collection::Templates), 2);
    for key in StorageKey::ALL {
        assert!(!dir.path().join(key.file_name()).exists());
    }

    common::wait_until(|| tracker.entries().len() == 3).await;
}
