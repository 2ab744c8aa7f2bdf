// ABOUTME: Remote document store abstraction with per-user collections and realtime feeds
// ABOUTME: DocumentStore trait, Document/Snapshot types, and the subscription handle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Remote Document Store
//!
//! Authenticated sessions read and write through a [`DocumentStore`]: a
//! schemaless, collection-oriented backend where every document belongs
//! to exactly one owner and subscriptions push full owner-scoped
//! snapshots whenever a collection changes.
//!
//! The trait is implemented by [`memory::MemoryStore`] for tests and
//! offline use; applications bind their hosted document database by
//! implementing it over their own SDK. [`gateway::RemoteGateway`] sits
//! on top and translates between domain types and raw documents.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

pub mod gateway;
pub mod memory;

pub use gateway::{RemoteGateway, Subscription};
pub use memory::MemoryStore;

/// The three collections the tracker stores per-user data in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Logged food entries
    Foods,
    /// Daily goals, one document per user
    Goals,
    /// Reusable food templates
    Templates,
}

impl Collection {
    /// Every collection the tracker uses.
    pub const ALL: [Self; 3] = [Self::Foods, Self::Goals, Self::Templates];

    /// Canonical collection name as used by store implementations.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Foods => "foods",
            Self::Goals => "goals",
            Self::Templates => "templates",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One stored document: an id, its owner, and an arbitrary JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-wide unique identifier within its collection
    pub id: String,
    /// User the document belongs to
    pub owner_id: Uuid,
    /// JSON body; the gateway defines its shape per collection
    pub data: Value,
}

/// The full owner-scoped contents of one collection at some instant.
pub type Snapshot = Vec<Document>;

/// Live feed of snapshots for one owner's slice of a collection.
///
/// The first snapshot describes the current contents; later ones arrive
/// after every change. Dropping the handle releases the underlying
/// listener exactly once.
pub struct StoreSubscription {
    rx: mpsc::UnboundedReceiver<Snapshot>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl StoreSubscription {
    /// Wrap a snapshot channel together with the callback that detaches
    /// the listener feeding it.
    #[must_use]
    pub fn new(
        rx: mpsc::UnboundedReceiver<Snapshot>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            rx,
            release: Some(Box::new(release)),
        }
    }

    /// Wait for the next snapshot. Returns `None` once the store side
    /// hangs up.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// Detach the listener. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for StoreSubscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for StoreSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSubscription")
            .field("released", &self.release.is_none())
            .finish_non_exhaustive()
    }
}

/// Core remote storage abstraction.
///
/// All store implementations must provide these operations so the
/// gateway can treat hosted and in-memory backends interchangeably.
/// Documents are addressed by collection and id; reads and
/// subscriptions are always filtered to a single owner.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ================================
    // Writes
    // ================================

    /// Store a new document and return its store-assigned id.
    async fn create(&self, collection: Collection, owner_id: Uuid, data: Value) -> Result<String>;

    /// Store a document under a caller-chosen id, replacing any
    /// existing document with that id.
    async fn put(
        &self,
        collection: Collection,
        owner_id: Uuid,
        doc_id: &str,
        data: Value,
    ) -> Result<()>;

    /// Merge `fields` into an existing document's body. Fails when the
    /// document does not exist.
    async fn update(&self, collection: Collection, doc_id: &str, fields: Value) -> Result<()>;

    /// Remove a document. Removing an absent document succeeds.
    async fn delete(&self, collection: Collection, doc_id: &str) -> Result<()>;

    /// Remove several documents atomically: either every listed
    /// document is gone afterwards or none are.
    async fn delete_many(&self, collection: Collection, doc_ids: &[String]) -> Result<()>;

    // ================================
    // Reads & realtime
    // ================================

    /// Fetch the owner's current slice of a collection.
    async fn fetch(&self, collection: Collection, owner_id: Uuid) -> Result<Snapshot>;

    /// Open a snapshot feed for the owner's slice of a collection.
    /// The current contents are delivered as the first snapshot.
    async fn subscribe(&self, collection: Collection, owner_id: Uuid)
        -> Result<StoreSubscription>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn collection_names_are_canonical() {
        assert_eq!(Collection::Foods.name(), "foods");
        assert_eq!(Collection::Goals.to_string(), "goals");
        assert_eq!(Collection::ALL.len(), 3);
    }

    #[tokio::test]
    async fn subscription_releases_exactly_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();

        let counter = Arc::clone(&released);
        let mut sub = StoreSubscription::new(rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tx.send(Vec::new()).unwrap();
        assert_eq!(sub.recv().await, Some(Vec::new()));

        sub.unsubscribe();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
