// ABOUTME: Durable local storage for guest-mode data, one JSON file per storage key
// ABOUTME: Reads never fail (fallback on missing or corrupt data); writes are atomic and best-effort
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Local Vault
//!
//! Guest-mode persistence over plain JSON files, one per [`StorageKey`].
//! The vault is deliberately forgiving: a missing or corrupt file reads
//! as the caller's fallback value, and a failed write keeps the previous
//! file contents instead of surfacing an error. Both outcomes are logged
//! so data loss is visible without breaking the tracking flow.
//!
//! Writes go through a sibling temp file followed by a rename, so a
//! crash mid-write can never leave a half-written file behind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The three value slots the vault persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// The guest's logged food entries
    Entries,
    /// The guest's daily goal
    Goal,
    /// The guest's food templates
    Templates,
}

impl StorageKey {
    /// Every storage key, in migration order.
    pub const ALL: [Self; 3] = [Self::Entries, Self::Goal, Self::Templates];

    /// File name backing this key inside the vault directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Entries => "entries.json",
            Self::Goal => "goal.json",
            Self::Templates => "templates.json",
        }
    }
}

/// Durable key-value store for guest-mode data.
#[derive(Debug, Clone)]
pub struct LocalVault {
    dir: PathBuf,
}

impl LocalVault {
    /// Open a vault rooted at `dir`. The directory is created lazily on
    /// the first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the vault stores its files in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read and decode the value stored under `key`.
    ///
    /// A missing file silently yields `fallback`; unreadable or corrupt
    /// data is logged at `warn` and also yields `fallback`.
    #[must_use]
    pub fn read<T: DeserializeOwned>(&self, key: StorageKey, fallback: T) -> T {
        let path = self.path(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return fallback,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to read vault file, using fallback");
                return fallback;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "vault file is corrupt, using fallback");
                fallback
            }
        }
    }

    /// Encode and store `value` under `key`.
    ///
    /// Failures are logged at `warn` and otherwise masked; the previous
    /// file contents survive a failed write.
    pub fn write<T: Serialize>(&self, key: StorageKey, value: &T) {
        let path = self.path(key);
        let text = match serde_json::to_string_pretty(value) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to encode vault value, keeping previous contents");
                return;
            }
        };
        if let Err(e) = self.write_atomic(&path, &text) {
            warn!(file = %path.display(), error = %e, "failed to persist vault file, keeping previous contents");
        }
    }

    /// Remove the value stored under `key`. Removing an absent value is
    /// a no-op.
    pub fn clear(&self, key: StorageKey) {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => debug!(file = %path.display(), "cleared vault file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to clear vault file");
            }
        }
    }

    fn path(&self, key: StorageKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    fn write_atomic(&self, path: &Path, text: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, path)
    }
}
