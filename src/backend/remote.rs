// ABOUTME: Authenticated-mode backend: writes go to the document store via the gateway
// ABOUTME: Never touches the in-memory view; effects flow back through snapshot subscriptions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Remote Backend
//!
//! Authenticated-session storage. Each call forwards to the
//! [`RemoteGateway`] and returns once the store acknowledges the write.
//! There is deliberately no optimistic echo into the tracker's view: a
//! failed write must leave the view exactly as it was, and a successful
//! one is reflected when the store's snapshot arrives.

use super::TrackerBackend;
use crate::errors::TrackerResult;
use crate::models::{DailyGoal, FoodEntry, FoodEntryPatch, FoodTemplate, FoodTemplatePatch};
use crate::remote::RemoteGateway;
use async_trait::async_trait;
use tracing::debug;

/// Document-store backed storage for a signed-in user.
#[derive(Clone)]
pub struct RemoteBackend {
    gateway: RemoteGateway,
}

impl RemoteBackend {
    pub(crate) const fn new(gateway: RemoteGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl TrackerBackend for RemoteBackend {
    async fn add_entry(&self, mut entry: FoodEntry) -> TrackerResult<FoodEntry> {
        let id = self.gateway.create_entry(&entry).await?;
        entry.id = id;
        debug!(entry_id = %entry.id, "created entry in remote store");
        Ok(entry)
    }

    async fn delete_entry(&self, entry_id: &str) -> TrackerResult<()> {
        self.gateway.delete_entry(entry_id).await
    }

    async fn edit_entry(&self, entry_id: &str, patch: FoodEntryPatch) -> TrackerResult<()> {
        self.gateway.update_entry(entry_id, &patch).await
    }

    async fn set_goal(&self, goal: DailyGoal) -> TrackerResult<()> {
        self.gateway.set_goal(&goal).await
    }

    async fn add_template(&self, mut template: FoodTemplate) -> TrackerResult<FoodTemplate> {
        let id = self.gateway.create_template(&template).await?;
        template.id = id;
        debug!(template_id = %template.id, "created template in remote store");
        Ok(template)
    }

    async fn edit_template(
        &self,
        template_id: &str,
        patch: FoodTemplatePatch,
    ) -> TrackerResult<()> {
        self.gateway.update_template(template_id, &patch).await
    }

    async fn delete_template(&self, template_id: &str) -> TrackerResult<()> {
        self.gateway.delete_template(template_id).await
    }

    async fn delete_templates(&self, template_ids: &[String]) -> TrackerResult<()> {
        self.gateway.delete_templates(template_ids).await
    }
}
