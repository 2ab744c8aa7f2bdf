// ABOUTME: Guest-mode backend: synchronous writes to the vault and the in-memory view
// ABOUTME: Mutations happen under one write lock so no partial state is ever observable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Local Backend
//!
//! Guest-session storage. Every mutation updates the tracker's
//! in-memory view and persists the affected vault key while holding the
//! state write lock, so readers either see the state from before the
//! call or from after it, never in between. Nothing here awaits; the
//! async signatures exist only to satisfy the shared backend trait.

use super::TrackerBackend;
use crate::errors::TrackerResult;
use crate::local::{LocalVault, StorageKey};
use crate::models::{DailyGoal, FoodEntry, FoodEntryPatch, FoodTemplate, FoodTemplatePatch};
use crate::tracker::{SharedState, TrackerState};
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

/// Vault-backed guest storage.
#[derive(Clone)]
pub struct LocalBackend {
    vault: Arc<LocalVault>,
    state: SharedState,
}

impl LocalBackend {
    pub(crate) fn new(vault: Arc<LocalVault>, state: SharedState) -> Self {
        Self { vault, state }
    }

    /// Locally generated unique token for new entries and templates.
    fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, TrackerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TrackerBackend for LocalBackend {
    async fn add_entry(&self, mut entry: FoodEntry) -> TrackerResult<FoodEntry> {
        entry.id = Self::generate_id();
        let mut state = self.write_state();
        state.entries.push(entry.clone());
        self.vault.write(StorageKey::Entries, &state.entries);
        debug!(entry_id = %entry.id, "added entry to local vault");
        Ok(entry)
    }

    async fn delete_entry(&self, entry_id: &str) -> TrackerResult<()> {
        let mut state = self.write_state();
        let before = state.entries.len();
        state.entries.retain(|entry| entry.id != entry_id);
        if state.entries.len() != before {
            self.vault.write(StorageKey::Entries, &state.entries);
        }
        Ok(())
    }

    async fn edit_entry(&self, entry_id: &str, patch: FoodEntryPatch) -> TrackerResult<()> {
        let mut state = self.write_state();
        // Unknown ids are ignored in guest mode.
        if let Some(entry) = state.entries.iter_mut().find(|entry| entry.id == entry_id) {
            patch.apply(entry);
            self.vault.write(StorageKey::Entries, &state.entries);
        }
        Ok(())
    }

    async fn set_goal(&self, goal: DailyGoal) -> TrackerResult<()> {
        let mut state = self.write_state();
        state.goal = Some(goal);
        self.vault.write(StorageKey::Goal, &state.goal);
        Ok(())
    }

    async fn add_template(&self, mut template: FoodTemplate) -> TrackerResult<FoodTemplate> {
        template.id = Self::generate_id();
        let mut state = self.write_state();
        state.templates.push(template.clone());
        self.vault.write(StorageKey::Templates, &state.templates);
        debug!(template_id = %template.id, "added template to local vault");
        Ok(template)
    }

    async fn edit_template(
        &self,
        template_id: &str,
        patch: FoodTemplatePatch,
    ) -> TrackerResult<()> {
        let mut state = self.write_state();
        if let Some(template) = state
            .templates
            .iter_mut()
            .find(|template| template.id == template_id)
        {
            patch.apply(template);
            self.vault.write(StorageKey::Templates, &state.templates);
        }
        Ok(())
    }

    async fn delete_template(&self, template_id: &str) -> TrackerResult<()> {
        let mut state = self.write_state();
        let before = state.templates.len();
        state.templates.retain(|template| template.id != template_id);
        if state.templates.len() != before {
            self.vault.write(StorageKey::Templates, &state.templates);
        }
        Ok(())
    }

    async fn delete_templates(&self, template_ids: &[String]) -> TrackerResult<()> {
        let mut state = self.write_state();
        let before = state.templates.len();
        state
            .templates
            .retain(|template| !template_ids.contains(&template.id));
        if state.templates.len() != before {
            self.vault.write(StorageKey::Templates, &state.templates);
        }
        Ok(())
    }
}
