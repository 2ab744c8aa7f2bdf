// ABOUTME: In-memory DocumentStore used by tests, demos, and offline development
// ABOUTME: DashMap-backed collections with owner-scoped snapshot fan-out and failure injection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # In-Memory Document Store
//!
//! A complete [`DocumentStore`] that lives entirely in process memory.
//! It reproduces the contract a hosted document database gives us:
//! store-assigned ids, owner-scoped reads, all-or-nothing batch
//! deletes, and snapshot subscriptions that start with the current
//! contents.
//!
//! [`MemoryStore::fail_next`] arms a one-shot failure for a chosen
//! operation, which fires *before* any data changes. Tests use it to
//! prove that callers do not apply optimistic mutations and that batch
//! deletes never commit partially.

use super::{Collection, Document, DocumentStore, Snapshot, StoreSubscription};
use anyhow::{bail, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Store operations a failure can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// [`DocumentStore::create`]
    Create,
    /// [`DocumentStore::put`]
    Put,
    /// [`DocumentStore::update`]
    Update,
    /// [`DocumentStore::delete`]
    Delete,
    /// [`DocumentStore::delete_many`]
    DeleteMany,
    /// [`DocumentStore::fetch`]
    Fetch,
    /// [`DocumentStore::subscribe`]
    Subscribe,
}

struct Listener {
    id: u64,
    collection: Collection,
    owner_id: Uuid,
    tx: mpsc::UnboundedSender<Snapshot>,
}

/// In-memory [`DocumentStore`] implementation.
pub struct MemoryStore {
    collections: DashMap<Collection, HashMap<String, Document>>,
    listeners: Arc<Mutex<Vec<Listener>>>,
    next_listener_id: AtomicU64,
    armed_failures: Mutex<HashSet<StoreOp>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let collections = DashMap::new();
        for collection in Collection::ALL {
            collections.insert(collection, HashMap::new());
        }
        Self {
            collections,
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener_id: AtomicU64::new(0),
            armed_failures: Mutex::new(HashSet::new()),
        }
    }

    /// Arm a one-shot failure: the next call of `op` fails before
    /// touching any data, then the store behaves normally again.
    pub fn fail_next(&self, op: StoreOp) {
        self.lock_failures().insert(op);
    }

    /// Number of documents currently stored in `collection`, across
    /// all owners.
    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        self.collections
            .get(&collection)
            .map_or(0, |docs| docs.len())
    }

    /// `true` when `collection` holds no documents at all.
    #[must_use]
    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    fn check_failure(&self, op: StoreOp) -> Result<()> {
        if self.lock_failures().remove(&op) {
            bail!("injected failure for {op:?}");
        }
        Ok(())
    }

    fn lock_failures(&self) -> MutexGuard<'_, HashSet<StoreOp>> {
        self.armed_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<Listener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn collection_docs(&self, collection: Collection) -> Vec<Document> {
        self.collections
            .get(&collection)
            .map_or_else(Vec::new, |docs| docs.values().cloned().collect())
    }

    fn owner_snapshot(docs: &[Document], owner_id: Uuid) -> Snapshot {
        docs.iter()
            .filter(|doc| doc.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Push fresh owner-scoped snapshots to every listener of
    /// `collection`, dropping listeners whose receiver went away.
    fn broadcast(&self, collection: Collection) {
        let docs = self.collection_docs(collection);
        let mut listeners = self.lock_listeners();
        listeners.retain(|listener| {
            if listener.collection != collection {
                return true;
            }
            let snapshot = Self::owner_snapshot(&docs, listener.owner_id);
            listener.tx.send(snapshot).is_ok()
        });
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: Collection, owner_id: Uuid, data: Value) -> Result<String> {
        self.check_failure(StoreOp::Create)?;
        let id = Uuid::new_v4().to_string();
        let document = Document {
            id: id.clone(),
            owner_id,
            data,
        };
        self.collections
            .entry(collection)
            .or_default()
            .insert(id.clone(), document);
        debug!(collection = %collection, doc_id = %id, "created document");
        self.broadcast(collection);
        Ok(id)
    }

    async fn put(
        &self,
        collection: Collection,
        owner_id: Uuid,
        doc_id: &str,
        data: Value,
    ) -> Result<()> {
        self.check_failure(StoreOp::Put)?;
        let document = Document {
            id: doc_id.to_owned(),
            owner_id,
            data,
        };
        self.collections
            .entry(collection)
            .or_default()
            .insert(doc_id.to_owned(), document);
        debug!(collection = %collection, doc_id = %doc_id, "put document");
        self.broadcast(collection);
        Ok(())
    }

    async fn update(&self, collection: Collection, doc_id: &str, fields: Value) -> Result<()> {
        self.check_failure(StoreOp::Update)?;
        {
            let mut docs = self.collections.entry(collection).or_default();
            let Some(document) = docs.get_mut(doc_id) else {
                bail!("document '{doc_id}' not found in {collection}");
            };
            match (&mut document.data, fields) {
                (Value::Object(body), Value::Object(patch)) => {
                    for (key, value) in patch {
                        body.insert(key, value);
                    }
                }
                // Non-object bodies are replaced wholesale.
                (body, fields) => *body = fields,
            }
        }
        debug!(collection = %collection, doc_id = %doc_id, "updated document");
        self.broadcast(collection);
        Ok(())
    }

    async fn delete(&self, collection: Collection, doc_id: &str) -> Result<()> {
        self.check_failure(StoreOp::Delete)?;
        let removed = self
            .collections
            .entry(collection)
            .or_default()
            .remove(doc_id)
            .is_some();
        if removed {
            debug!(collection = %collection, doc_id = %doc_id, "deleted document");
            self.broadcast(collection);
        }
        Ok(())
    }

    async fn delete_many(&self, collection: Collection, doc_ids: &[String]) -> Result<()> {
        self.check_failure(StoreOp::DeleteMany)?;
        let removed = {
            let mut docs = self.collections.entry(collection).or_default();
            doc_ids
                .iter()
                .filter(|doc_id| docs.remove(doc_id.as_str()).is_some())
                .count()
        };
        if removed > 0 {
            debug!(collection = %collection, removed, "batch-deleted documents");
            self.broadcast(collection);
        }
        Ok(())
    }

    async fn fetch(&self, collection: Collection, owner_id: Uuid) -> Result<Snapshot> {
        self.check_failure(StoreOp::Fetch)?;
        let docs = self.collection_docs(collection);
        Ok(Self::owner_snapshot(&docs, owner_id))
    }

    async fn subscribe(
        &self,
        collection: Collection,
        owner_id: Uuid,
    ) -> Result<StoreSubscription> {
        self.check_failure(StoreOp::Subscribe)?;
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        let docs = self.collection_docs(collection);
        {
            let mut listeners = self.lock_listeners();
            // Initial snapshot goes out while the registry is locked so
            // no broadcast can slip in between.
            let _ = tx.send(Self::owner_snapshot(&docs, owner_id));
            listeners.push(Listener {
                id,
                collection,
                owner_id,
                tx,
            });
        }
        debug!(collection = %collection, listener = id, "opened subscription");

        let registry = Arc::clone(&self.listeners);
        Ok(StoreSubscription::new(rx, move || {
            let mut listeners = registry.lock().unwrap_or_else(PoisonError::into_inner);
            listeners.retain(|listener| listener.id != id);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn owner() -> Uuid {
        Uuid::new_v4()
    }

    #[tokio::test]
    async fn create_assigns_id_and_fetch_returns_owned_docs() {
        let store = MemoryStore::new();
        let alice = owner();
        let bob = owner();

        let id = store
            .create(Collection::Foods, alice, json!({"name": "Elma"}))
            .await
            .unwrap();
        store
            .create(Collection::Foods, bob, json!({"name": "Armut"}))
            .await
            .unwrap();

        let snapshot = store.fetch(Collection::Foods, alice).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);
        assert_eq!(snapshot[0].data["name"], "Elma");
    }

    #[tokio::test]
    async fn put_overwrites_and_keeps_the_caller_id() {
        let store = MemoryStore::new();
        let user = owner();

        store
            .put(Collection::Goals, user, "goal-1", json!({"calories": 2000}))
            .await
            .unwrap();
        store
            .put(Collection::Goals, user, "goal-1", json!({"calories": 1800}))
            .await
            .unwrap();

        let snapshot = store.fetch(Collection::Goals, user).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].data["calories"], 1800);
    }

    #[tokio::test]
    async fn update_merges_fields_and_rejects_unknown_ids() {
        let store = MemoryStore::new();
        let user = owner();
        let id = store
            .create(
                Collection::Foods,
                user,
                json!({"name": "Elma", "calories": 95.0}),
            )
            .await
            .unwrap();

        store
            .update(Collection::Foods, &id, json!({"calories": 100.0}))
            .await
            .unwrap();
        let snapshot = store.fetch(Collection::Foods, user).await.unwrap();
        assert_eq!(snapshot[0].data["calories"], 100.0);
        assert_eq!(snapshot[0].data["name"], "Elma");

        let err = store
            .update(Collection::Foods, "missing", json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        let user = owner();
        let id = store
            .create(Collection::Foods, user, json!({}))
            .await
            .unwrap();

        store.delete(Collection::Foods, &id).await.unwrap();
        store.delete(Collection::Foods, &id).await.unwrap();
        assert!(store.is_empty(Collection::Foods));
    }

    #[tokio::test]
    async fn subscription_starts_with_current_state_and_follows_changes() {
        let store = MemoryStore::new();
        let user = owner();
        store
            .create(Collection::Templates, user, json!({"name": "Yumurta"}))
            .await
            .unwrap();

        let mut sub = store.subscribe(Collection::Templates, user).await.unwrap();
        let initial = sub.recv().await.unwrap();
        assert_eq!(initial.len(), 1);

        store
            .create(Collection::Templates, user, json!({"name": "Süt"}))
            .await
            .unwrap();
        let next = sub.recv().await.unwrap();
        assert_eq!(next.len(), 2);
    }

    #[tokio::test]
    async fn subscriptions_are_owner_scoped() {
        let store = MemoryStore::new();
        let alice = owner();
        let bob = owner();

        let mut sub = store.subscribe(Collection::Foods, alice).await.unwrap();
        assert!(sub.recv().await.unwrap().is_empty());

        store
            .create(Collection::Foods, bob, json!({"name": "Armut"}))
            .await
            .unwrap();
        let for_alice = sub.recv().await.unwrap();
        assert!(for_alice.is_empty());
    }

    #[tokio::test]
    async fn injected_failure_fires_once_before_any_mutation() {
        let store = MemoryStore::new();
        let user = owner();
        store.fail_next(StoreOp::Create);

        let err = store.create(Collection::Foods, user, json!({})).await;
        assert!(err.is_err());
        assert!(store.is_empty(Collection::Foods));

        // Next call succeeds again.
        store
            .create(Collection::Foods, user, json!({}))
            .await
            .unwrap();
        assert_eq!(store.len(Collection::Foods), 1);
    }

    #[tokio::test]
    async fn failed_batch_delete_commits_nothing() {
        let store = MemoryStore::new();
        let user = owner();
        let a = store
            .create(Collection::Templates, user, json!({}))
            .await
            .unwrap();
        let b = store
            .create(Collection::Templates, user, json!({}))
            .await
            .unwrap();

        store.fail_next(StoreOp::DeleteMany);
        let err = store
            .delete_many(Collection::Templates, &[a, b])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("injected"));
        assert_eq!(store.len(Collection::Templates), 2);
    }

    #[tokio::test]
    async fn dropped_subscription_detaches_its_listener() {
        let store = MemoryStore::new();
        let user = owner();

        let sub = store.subscribe(Collection::Foods, user).await.unwrap();
        assert_eq!(store.lock_listeners().len(), 1);

        sub.unsubscribe();
        assert!(store.lock_listeners().is_empty());
    }
}
