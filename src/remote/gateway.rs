// ABOUTME: User-scoped facade over a DocumentStore, translating domain types to documents
// ABOUTME: Handles id placement, goal addressing, snapshot decoding, and error labelling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Remote Gateway
//!
//! [`RemoteGateway`] is the only way the rest of the crate talks to a
//! [`DocumentStore`]. It pins every call to one user id, so no code
//! path can read or write another user's partition, and owns the
//! normalization rules:
//!
//! - a document body never contains the document id; ids are injected
//!   when decoding and stripped when encoding
//! - absent optional fields are not serialized, keeping remote
//!   documents byte-compatible with the local vault's JSON
//! - the daily goal lives at a deterministic per-user document id, so
//!   goal writes are upserts of a singleton
//! - malformed documents in a snapshot are logged and skipped instead
//!   of poisoning the whole feed
//! - entry snapshots are ordered by `(timestamp, id)` so equal feeds
//!   render identically everywhere

use super::{Collection, Document, DocumentStore, Snapshot, StoreSubscription};
use crate::errors::{TrackerError, TrackerResult};
use crate::models::{DailyGoal, FoodEntry, FoodEntryPatch, FoodTemplate, FoodTemplatePatch};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Typed snapshot feed produced by the gateway's `subscribe_*` calls.
///
/// Wraps a raw [`StoreSubscription`] and decodes every snapshot into
/// the collection's domain shape. Dropping the handle releases the
/// underlying listener.
pub struct Subscription<P> {
    inner: StoreSubscription,
    decode: fn(Snapshot) -> P,
}

impl<P> Subscription<P> {
    /// Wait for the next decoded snapshot. Returns `None` once the
    /// store side hangs up.
    pub async fn recv(&mut self) -> Option<P> {
        self.inner.recv().await.map(self.decode)
    }

    /// Detach the listener. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<P> fmt::Debug for Subscription<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// User-scoped domain facade over a [`DocumentStore`].
#[derive(Clone)]
pub struct RemoteGateway {
    store: Arc<dyn DocumentStore>,
    user_id: Uuid,
}

impl fmt::Debug for RemoteGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteGateway")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl RemoteGateway {
    /// Bind a store to one user's data partition.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, user_id: Uuid) -> Self {
        Self { store, user_id }
    }

    /// The user every call of this gateway is scoped to.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Document id the user's singleton goal lives at.
    #[must_use]
    pub fn goal_doc_id(user_id: Uuid) -> String {
        user_id.to_string()
    }

    // ================================
    // Food entries
    // ================================

    /// Store a new entry and return its store-assigned id.
    pub async fn create_entry(&self, entry: &FoodEntry) -> TrackerResult<String> {
        let body = body_without_id(entry)?;
        self.store
            .create(Collection::Foods, self.user_id, body)
            .await
            .map_err(|e| TrackerError::remote("create entry", e))
    }

    /// Store an entry under a caller-chosen document id, replacing any
    /// existing document. Used by migration for idempotent replays.
    pub async fn put_entry(&self, doc_id: &str, entry: &FoodEntry) -> TrackerResult<()> {
        let body = body_without_id(entry)?;
        self.store
            .put(Collection::Foods, self.user_id, doc_id, body)
            .await
            .map_err(|e| TrackerError::remote("store entry", e))
    }

    /// Merge the populated patch fields into a stored entry.
    pub async fn update_entry(&self, entry_id: &str, patch: &FoodEntryPatch) -> TrackerResult<()> {
        let fields = serde_json::to_value(patch)?;
        self.store
            .update(Collection::Foods, entry_id, fields)
            .await
            .map_err(|e| TrackerError::remote("update entry", e))
    }

    /// Remove an entry. Removing an absent entry succeeds.
    pub async fn delete_entry(&self, entry_id: &str) -> TrackerResult<()> {
        self.store
            .delete(Collection::Foods, entry_id)
            .await
            .map_err(|e| TrackerError::remote("delete entry", e))
    }

    /// Fetch the user's entries, ordered by `(timestamp, id)`.
    pub async fn fetch_entries(&self) -> TrackerResult<Vec<FoodEntry>> {
        let snapshot = self
            .store
            .fetch(Collection::Foods, self.user_id)
            .await
            .map_err(|e| TrackerError::remote("fetch entries", e))?;
        Ok(decode_entry_snapshot(snapshot))
    }

    /// Open a live feed of the user's entries.
    pub async fn subscribe_entries(&self) -> TrackerResult<Subscription<Vec<FoodEntry>>> {
        let inner = self
            .store
            .subscribe(Collection::Foods, self.user_id)
            .await
            .map_err(|e| TrackerError::remote("subscribe to entries", e))?;
        Ok(Subscription {
            inner,
            decode: decode_entry_snapshot,
        })
    }

    // ================================
    // Daily goal
    // ================================

    /// Replace the user's goal wholesale at its fixed document id.
    pub async fn set_goal(&self, goal: &DailyGoal) -> TrackerResult<()> {
        let body = serde_json::to_value(goal)?;
        let doc_id = Self::goal_doc_id(self.user_id);
        self.store
            .put(Collection::Goals, self.user_id, &doc_id, body)
            .await
            .map_err(|e| TrackerError::remote("set goal", e))
    }

    /// Fetch the user's goal, if one was ever set.
    pub async fn fetch_goal(&self) -> TrackerResult<Option<DailyGoal>> {
        let snapshot = self
            .store
            .fetch(Collection::Goals, self.user_id)
            .await
            .map_err(|e| TrackerError::remote("fetch goal", e))?;
        Ok(decode_goal_snapshot(snapshot))
    }

    /// Open a live feed of the user's goal.
    pub async fn subscribe_goal(&self) -> TrackerResult<Subscription<Option<DailyGoal>>> {
        let inner = self
            .store
            .subscribe(Collection::Goals, self.user_id)
            .await
            .map_err(|e| TrackerError::remote("subscribe to goal", e))?;
        Ok(Subscription {
            inner,
            decode: decode_goal_snapshot,
        })
    }

    // ================================
    // Food templates
    // ================================

    /// Store a new template and return its store-assigned id.
    pub async fn create_template(&self, template: &FoodTemplate) -> TrackerResult<String> {
        let body = body_without_id(template)?;
        self.store
            .create(Collection::Templates, self.user_id, body)
            .await
            .map_err(|e| TrackerError::remote("create template", e))
    }

    /// Store a template under a caller-chosen document id. Used by
    /// migration for idempotent replays.
    pub async fn put_template(&self, doc_id: &str, template: &FoodTemplate) -> TrackerResult<()> {
        let body = body_without_id(template)?;
        self.store
            .put(Collection::Templates, self.user_id, doc_id, body)
            .await
            .map_err(|e| TrackerError::remote("store template", e))
    }

    /// Merge the populated patch fields into a stored template.
    pub async fn update_template(
        &self,
        template_id: &str,
        patch: &FoodTemplatePatch,
    ) -> TrackerResult<()> {
        let fields = serde_json::to_value(patch)?;
        self.store
            .update(Collection::Templates, template_id, fields)
            .await
            .map_err(|e| TrackerError::remote("update template", e))
    }

    /// Remove a template. Removing an absent template succeeds.
    pub async fn delete_template(&self, template_id: &str) -> TrackerResult<()> {
        self.store
            .delete(Collection::Templates, template_id)
            .await
            .map_err(|e| TrackerError::remote("delete template", e))
    }

    /// Remove several templates in one atomic batch.
    pub async fn delete_templates(&self, template_ids: &[String]) -> TrackerResult<()> {
        self.store
            .delete_many(Collection::Templates, template_ids)
            .await
            .map_err(|e| TrackerError::remote("batch-delete templates", e))
    }

    /// Fetch the user's templates, ordered by `(name, id)`.
    pub async fn fetch_templates(&self) -> TrackerResult<Vec<FoodTemplate>> {
        let snapshot = self
            .store
            .fetch(Collection::Templates, self.user_id)
            .await
            .map_err(|e| TrackerError::remote("fetch templates", e))?;
        Ok(decode_template_snapshot(snapshot))
    }

    /// Open a live feed of the user's templates.
    pub async fn subscribe_templates(&self) -> TrackerResult<Subscription<Vec<FoodTemplate>>> {
        let inner = self
            .store
            .subscribe(Collection::Templates, self.user_id)
            .await
            .map_err(|e| TrackerError::remote("subscribe to templates", e))?;
        Ok(Subscription {
            inner,
            decode: decode_template_snapshot,
        })
    }
}

/// Serialize a domain value and strip its `id` field; the document id
/// is addressing metadata, not body content.
fn body_without_id<T: Serialize>(value: &T) -> TrackerResult<Value> {
    let mut body = serde_json::to_value(value)?;
    if let Value::Object(map) = &mut body {
        map.remove("id");
    }
    Ok(body)
}

/// Decode a document body into a domain type carrying an `id` field,
/// injecting the document id first.
fn decode_with_id<T: DeserializeOwned>(doc: &Document) -> Result<T, serde_json::Error> {
    let mut body = doc.data.clone();
    if let Value::Object(map) = &mut body {
        map.insert("id".to_owned(), Value::String(doc.id.clone()));
    }
    serde_json::from_value(body)
}

fn decode_entry_snapshot(snapshot: Snapshot) -> Vec<FoodEntry> {
    let mut entries: Vec<FoodEntry> = snapshot
        .iter()
        .filter_map(|doc| skip_malformed(Collection::Foods, doc, decode_with_id(doc)))
        .collect();
    entries.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
    entries
}

fn decode_goal_snapshot(snapshot: Snapshot) -> Option<DailyGoal> {
    snapshot.iter().find_map(|doc| {
        skip_malformed(
            Collection::Goals,
            doc,
            serde_json::from_value(doc.data.clone()),
        )
    })
}

fn decode_template_snapshot(snapshot: Snapshot) -> Vec<FoodTemplate> {
    let mut templates: Vec<FoodTemplate> = snapshot
        .iter()
        .filter_map(|doc| skip_malformed(Collection::Templates, doc, decode_with_id(doc)))
        .collect();
    templates.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    templates
}

/// One malformed document must not poison a whole snapshot: log it and
/// keep the rest.
fn skip_malformed<T>(
    collection: Collection,
    doc: &Document,
    decoded: Result<T, serde_json::Error>,
) -> Option<T> {
    match decoded {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                collection = %collection,
                doc_id = %doc.id,
                error = %e,
                "skipping malformed document in snapshot"
            );
            None
        }
    }
}
