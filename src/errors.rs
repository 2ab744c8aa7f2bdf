// ABOUTME: Unified error types for tracker, storage, and migration operations
// ABOUTME: Distinguishes business-rule failures from transport and serialization faults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Tracker Error Types
//!
//! Every fallible operation in this crate surfaces a [`TrackerError`], so a
//! presentation layer can match on the variant and decide whether to prompt
//! for sign-in, retry, or show a generic failure message:
//! - [`TrackerError::NotAuthenticated`] - business rule: no active session
//! - [`TrackerError::Remote`] - transport: the backing document store rejected a call
//! - [`TrackerError::Serialization`] - data shape mismatch while encoding or decoding
//! - [`TrackerError::Migration`] - the guest-to-account data move was aborted

use thiserror::Error;

/// Result alias used throughout the crate.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors produced by tracker, storage, and migration operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A data-modifying call was made while no guest or user session is active.
    #[error("not authenticated: no guest or user session is active")]
    NotAuthenticated,

    /// The remote document store rejected or failed an operation.
    #[error("remote {operation} failed")]
    Remote {
        /// Short label of the store call that failed, e.g. `"create entry"`.
        operation: &'static str,
        /// Underlying store error.
        #[source]
        source: anyhow::Error,
    },

    /// A value could not be encoded to or decoded from its document form.
    #[error("serialization failed")]
    Serialization(#[from] serde_json::Error),

    /// The local-to-remote migration stopped before completion.
    ///
    /// Local data is left untouched so the migration can be retried.
    #[error("guest data migration failed")]
    Migration {
        /// The write that aborted the migration.
        #[source]
        source: anyhow::Error,
    },
}

impl TrackerError {
    /// Wrap a document-store failure with the operation that triggered it.
    #[must_use]
    pub fn remote(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Remote { operation, source }
    }

    /// Wrap the failure that aborted a guest-data migration.
    #[must_use]
    pub fn migration(source: anyhow::Error) -> Self {
        Self::Migration { source }
    }

    /// `true` when the operation was refused because no session is active.
    ///
    /// Callers typically react by prompting for sign-in or guest mode rather
    /// than reporting a fault.
    #[must_use]
    pub const fn is_not_authenticated(&self) -> bool {
        matches!(self, Self::NotAuthenticated)
    }

    /// `true` when the error came from the remote store rather than a
    /// business rule, meaning a retry may succeed.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. } | Self::Migration { .. })
    }
}
