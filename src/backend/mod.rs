// ABOUTME: Data-access backends behind the tracker, selected by the active session mode
// ABOUTME: TrackerBackend trait with local (vault) and remote (document store) implementations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Tracker Backends
//!
//! Every data-modifying tracker operation funnels through a
//! [`TrackerBackend`]. Which implementation is live depends on the
//! session: guest sessions get [`local::LocalBackend`] (vault +
//! in-memory view, applied synchronously), authenticated sessions get
//! [`remote::RemoteBackend`] (document store writes whose effects come
//! back through subscriptions).
//!
//! [`ActiveBackend`] wraps the two in an enum and delegates, so the
//! tracker switches backends by swapping one value.

use crate::errors::TrackerResult;
use crate::models::{DailyGoal, FoodEntry, FoodEntryPatch, FoodTemplate, FoodTemplatePatch};
use async_trait::async_trait;

pub mod local;
pub mod remote;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

/// Uniform write interface over guest and authenticated storage.
///
/// Backends assign entry and template ids themselves; ids carried on
/// the inputs are replaced. Reads never appear here: the tracker serves
/// them from its in-memory view.
#[async_trait]
pub trait TrackerBackend: Send + Sync {
    /// Store a new entry and return it with its assigned id.
    async fn add_entry(&self, entry: FoodEntry) -> TrackerResult<FoodEntry>;

    /// Remove an entry. Removing an absent entry is a silent no-op.
    async fn delete_entry(&self, entry_id: &str) -> TrackerResult<()>;

    /// Merge a patch into a stored entry.
    ///
    /// Guest mode ignores unknown ids; remote mode surfaces them as a
    /// [`TrackerError::Remote`](crate::errors::TrackerError::Remote).
    async fn edit_entry(&self, entry_id: &str, patch: FoodEntryPatch) -> TrackerResult<()>;

    /// Replace the daily goal wholesale.
    async fn set_goal(&self, goal: DailyGoal) -> TrackerResult<()>;

    /// Store a new template and return it with its assigned id.
    async fn add_template(&self, template: FoodTemplate) -> TrackerResult<FoodTemplate>;

    /// Merge a patch into a stored template.
    async fn edit_template(&self, template_id: &str, patch: FoodTemplatePatch)
        -> TrackerResult<()>;

    /// Remove a template. Removing an absent template is a silent no-op.
    async fn delete_template(&self, template_id: &str) -> TrackerResult<()>;

    /// Remove several templates at once. Remote mode performs this as
    /// one atomic batch: either all listed templates go or none do.
    async fn delete_templates(&self, template_ids: &[String]) -> TrackerResult<()>;
}

/// The backend currently wired to the tracker, delegating every call to
/// the live implementation.
#[derive(Clone)]
pub enum ActiveBackend {
    /// Guest session: vault-backed storage
    Local(LocalBackend),
    /// Authenticated session: remote document store
    Remote(RemoteBackend),
}

impl ActiveBackend {
    /// Descriptive label for logging.
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::Local(_) => "local vault (guest)",
            Self::Remote(_) => "remote document store",
        }
    }
}

#[async_trait]
impl TrackerBackend for ActiveBackend {
    async fn add_entry(&self, entry: FoodEntry) -> TrackerResult<FoodEntry> {
        match self {
            Self::Local(backend) => backend.add_entry(entry).await,
            Self::Remote(backend) => backend.add_entry(entry).await,
        }
    }

    async fn delete_entry(&self, entry_id: &str) -> TrackerResult<()> {
        match self {
            Self::Local(backend) => backend.delete_entry(entry_id).await,
            Self::Remote(backend) => backend.delete_entry(entry_id).await,
        }
    }

    async fn edit_entry(&self, entry_id: &str, patch: FoodEntryPatch) -> TrackerResult<()> {
        match self {
            Self::Local(backend) => backend.edit_entry(entry_id, patch).await,
            Self::Remote(backend) => backend.edit_entry(entry_id, patch).await,
        }
    }

    async fn set_goal(&self, goal: DailyGoal) -> TrackerResult<()> {
        match self {
            Self::Local(backend) => backend.set_goal(goal).await,
            Self::Remote(backend) => backend.set_goal(goal).await,
        }
    }

    async fn add_template(&self, template: FoodTemplate) -> TrackerResult<FoodTemplate> {
        match self {
            Self::Local(backend) => backend.add_template(template).await,
            Self::Remote(backend) => backend.add_template(template).await,
        }
    }

    async fn edit_template(
        &self,
        template_id: &str,
        patch: FoodTemplatePatch,
    ) -> TrackerResult<()> {
        match self {
            Self::Local(backend) => backend.edit_template(template_id, patch).await,
            Self::Remote(backend) => backend.edit_template(template_id, patch).await,
        }
    }

    async fn delete_template(&self, template_id: &str) -> TrackerResult<()> {
        match self {
            Self::Local(backend) => backend.delete_template(template_id).await,
            Self::Remote(backend) => backend.delete_template(template_id).await,
        }
    }

    async fn delete_templates(&self, template_ids: &[String]) -> TrackerResult<()> {
        match self {
            Self::Local(backend) => backend.delete_templates(template_ids).await,
            Self::Remote(backend) => backend.delete_templates(template_ids).await,
        }
    }
}
