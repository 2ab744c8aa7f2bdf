// ABOUTME: Session modes the tracker can operate in and how they map to data access
// ABOUTME: SignedOut rejects writes; Guest uses the vault; Authenticated uses the remote store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Session Modes
//!
//! The tracker does not perform authentication itself; the embedding
//! application tells it which session is active via
//! [`FoodTracker::connect_guest`](crate::tracker::FoodTracker::connect_guest)
//! and [`FoodTracker::connect_user`](crate::tracker::FoodTracker::connect_user).
//! [`SessionMode`] records that choice and decides which backend handles
//! data access.

use std::fmt;
use uuid::Uuid;

/// The identity context the tracker is currently operating under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// No session: every data-modifying call is rejected.
    SignedOut,
    /// Anonymous local session backed by the on-device vault.
    Guest,
    /// Signed-in session backed by the remote store, scoped to one user.
    Authenticated(Uuid),
}

impl SessionMode {
    /// `true` when some session (guest or authenticated) is active.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::SignedOut)
    }

    /// `true` for the anonymous local session.
    #[must_use]
    pub const fn is_guest(self) -> bool {
        matches!(self, Self::Guest)
    }

    /// The signed-in user's id, when authenticated.
    #[must_use]
    pub const fn user_id(self) -> Option<Uuid> {
        match self {
            Self::Authenticated(user_id) => Some(user_id),
            Self::SignedOut | Self::Guest => None,
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignedOut => f.write_str("signed-out"),
            Self::Guest => f.write_str("guest"),
            Self::Authenticated(user_id) => write!(f, "user {user_id}"),
        }
    }
}
