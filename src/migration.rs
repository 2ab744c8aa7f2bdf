// ABOUTME: One-shot move of guest vault data into a signed-in user's remote partition
// ABOUTME: Deterministic document ids make a retried migration converge instead of duplicating
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Guest Data Migration
//!
//! When a guest signs in for the first time, whatever lives in the
//! local vault is copied into their remote partition and then removed
//! locally. The routine is all-or-nothing from the vault's point of
//! view: local data is cleared only after every remote write succeeded,
//! so a failed migration can simply be retried.
//!
//! Retries are safe because each local record maps to a *deterministic*
//! remote document id (UUIDv5 of the local id in the user's namespace).
//! A rerun overwrites the documents the first attempt already created
//! instead of duplicating them.

use crate::errors::{TrackerError, TrackerResult};
use crate::local::{LocalVault, StorageKey};
use crate::models::{DailyGoal, FoodEntry, FoodTemplate};
use crate::remote::RemoteGateway;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// What a completed migration moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationSummary {
    /// Number of food entries copied to the remote store
    pub entries: usize,
    /// Whether a stored goal was copied
    pub goal_migrated: bool,
    /// Number of food templates copied to the remote store
    pub templates: usize,
}

impl MigrationSummary {
    const EMPTY: Self = Self {
        entries: 0,
        goal_migrated: false,
        templates: 0,
    };

    /// `true` when the vault held nothing and the migration was a no-op.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries == 0 && !self.goal_migrated && self.templates == 0
    }
}

/// Remote document id a local record migrates to: UUIDv5 of the local
/// id within the user's namespace. Stable across retries, distinct
/// across users.
#[must_use]
pub fn derived_doc_id(user_id: Uuid, local_id: &str) -> String {
    Uuid::new_v5(&user_id, local_id.as_bytes()).to_string()
}

/// Copy the vault's contents into the gateway's user partition, then
/// clear the vault.
///
/// An empty vault returns an empty summary without touching anything.
/// On failure the vault is left intact and the error reports which
/// write aborted the run; retrying converges thanks to deterministic
/// document ids.
///
/// # Errors
///
/// Returns [`TrackerError::Migration`] wrapping the first remote write
/// that failed.
pub async fn migrate_guest_data(
    vault: &LocalVault,
    gateway: &RemoteGateway,
) -> TrackerResult<MigrationSummary> {
    let entries: Vec<FoodEntry> = vault.read(StorageKey::Entries, Vec::new());
    let goal: Option<DailyGoal> = vault.read(StorageKey::Goal, None);
    let templates: Vec<FoodTemplate> = vault.read(StorageKey::Templates, Vec::new());

    if entries.is_empty() && goal.is_none() && templates.is_empty() {
        debug!("vault is empty, nothing to migrate");
        return Ok(MigrationSummary::EMPTY);
    }

    let user_id = gateway.user_id();

    for entry in &entries {
        let doc_id = derived_doc_id(user_id, &entry.id);
        gateway
            .put_entry(&doc_id, entry)
            .await
            .map_err(abort("entry"))?;
    }

    if let Some(goal) = &goal {
        gateway.set_goal(goal).await.map_err(abort("goal"))?;
    }

    for template in &templates {
        let doc_id = derived_doc_id(user_id, &template.id);
        gateway
            .put_template(&doc_id, template)
            .await
            .map_err(abort("template"))?;
    }

    // Every remote write landed; only now is it safe to drop the local copy.
    for key in StorageKey::ALL {
        vault.clear(key);
    }

    let summary = MigrationSummary {
        entries: entries.len(),
        goal_migrated: goal.is_some(),
        templates: templates.len(),
    };
    info!(
        user_id = %user_id,
        entries = summary.entries,
        goal = summary.goal_migrated,
        templates = summary.templates,
        "guest data migrated to remote store"
    );
    Ok(summary)
}

fn abort(record: &'static str) -> impl Fn(TrackerError) -> TrackerError {
    move |e| {
        TrackerError::migration(anyhow::Error::new(e).context(format!("migrating a {record}")))
    }
}
