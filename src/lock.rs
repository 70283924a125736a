// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Advisory run lock.
//!
//! Only one run may work on a given working copy at a time. Before touching
//! anything, a run creates `streak.lock` inside the Git directory, recording
//! its PID and the time it started. The lock lives in the Git directory rather
//! than the working tree so it never shows up as a change to commit.
//!
//! The holder is written to a private staging file first, which is then hard
//! linked into place. Linking fails if the lock already exists, so the lock
//! file is never observed half written.
//!
//! A lock older than the configured staleness limit is assumed to belong to a
//! run that died without cleaning up, and is replaced with a warning. A lock
//! that cannot be read back counts as held until its modification time is
//! older than the same limit. The lock is released when [`RunLock`] drops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs::{hard_link, metadata, read_to_string, remove_file, rename, write},
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, instrument, warn};

/// File name of lock inside Git directory.
pub const LOCK_FILE_NAME: &str = "streak.lock";

/// Contents of lock file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LockHolder {
    /// Process that holds the lock.
    pub pid: u32,

    /// When the lock was taken.
    pub acquired: DateTime<Utc>,
}

impl LockHolder {
    fn current() -> Self {
        Self {
            pid: std::process::id(),
            acquired: Utc::now(),
        }
    }

    fn is_stale(&self, stale_after: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.acquired);
        age.to_std().is_ok_and(|age| age > stale_after)
    }
}

/// Held run lock, released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquire lock inside target directory.
    ///
    /// # Errors
    ///
    /// - Return [`LockError::Held`] if another run holds a fresh lock.
    /// - Return [`LockError::Unreadable`] if a fresh lock cannot be read.
    /// - Return [`LockError::Encode`] if lock holder cannot be serialized.
    /// - Return [`LockError::Io`] if lock file cannot be created or removed.
    #[instrument(skip(dir), level = "debug")]
    pub fn acquire(dir: impl AsRef<Path>, stale_after: Duration) -> Result<Self> {
        let holder = LockHolder::current();
        let path = dir.as_ref().join(LOCK_FILE_NAME);
        let staged = dir
            .as_ref()
            .join(format!("{LOCK_FILE_NAME}.{}.tmp", holder.pid));

        write(&staged, toml::to_string(&holder)?).map_err(|err| LockError::Io {
            source: err,
            path: staged.clone(),
        })?;

        let result = link_into_place(&staged, path, stale_after);
        if let Err(err) = remove_file(&staged) {
            warn!("failed to remove staged lock {:?}: {err}", staged.display());
        }

        result
    }

    /// Path of lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(err) = remove_file(&self.path) {
            warn!("failed to release run lock {:?}: {err}", self.path.display());
        }
    }
}

fn link_into_place(staged: &Path, path: PathBuf, stale_after: Duration) -> Result<RunLock> {
    // INVARIANT: At most one stale lock is cleared per acquisition.
    for attempt in 0..2 {
        match hard_link(staged, &path) {
            Ok(()) => {
                debug!("acquired run lock {:?}", path.display());
                return Ok(RunLock { path });
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists && attempt == 0 => {
                clear_stale(&path, stale_after)?;
            }
            Err(err) => return Err(LockError::Io { source: err, path }),
        }
    }

    Err(LockError::Io {
        source: ErrorKind::AlreadyExists.into(),
        path,
    })
}

/// Remove existing lock if it is stale, or report who holds it.
fn clear_stale(path: &Path, stale_after: Duration) -> Result<()> {
    let contents = match read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(_) => None,
    };

    match contents.as_deref().and_then(parse_holder) {
        Some(holder) if !holder.is_stale(stale_after) => {
            return Err(held(holder, path));
        }
        Some(holder) => warn!(
            "replacing stale run lock of pid {} from {}",
            holder.pid, holder.acquired
        ),
        None if !modified_before(path, stale_after) => {
            return Err(LockError::Unreadable {
                path: path.to_path_buf(),
            });
        }
        None => warn!("replacing unreadable run lock {:?}", path.display()),
    }

    // INVARIANT: Only the exact lock judged stale above is removed.
    //   - Move it aside first, then confirm it is still the same lock. If a
    //     concurrent run replaced it in the meantime, link it back.
    let aside = path.with_extension(format!("lock.{}.stale", std::process::id()));
    match rename(path, &aside) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(LockError::Io {
                source: err,
                path: path.to_path_buf(),
            })
        }
    }

    let moved = read_to_string(&aside).ok();
    if moved != contents {
        let restored = hard_link(&aside, path);
        let _ = remove_file(&aside);
        if let Err(err) = restored {
            warn!("failed to restore run lock {:?}: {err}", path.display());
        }

        return Err(match moved.as_deref().and_then(parse_holder) {
            Some(holder) => held(holder, path),
            None => LockError::Unreadable {
                path: path.to_path_buf(),
            },
        });
    }

    remove_file(&aside).map_err(|err| LockError::Io {
        source: err,
        path: aside,
    })
}

fn parse_holder(data: &str) -> Option<LockHolder> {
    toml::from_str(data).ok()
}

fn held(holder: LockHolder, path: &Path) -> LockError {
    LockError::Held {
        pid: holder.pid,
        acquired: holder.acquired,
        path: path.to_path_buf(),
    }
}

fn modified_before(path: &Path, limit: Duration) -> bool {
    metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .is_some_and(|age| age > limit)
}

/// Run lock error types.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another run holds the lock.
    #[error("another run (pid {pid}) holds {:?} since {acquired}", path.display())]
    Held {
        pid: u32,
        acquired: DateTime<Utc>,
        path: PathBuf,
    },

    /// Lock exists but its holder cannot be read, and it is not stale yet.
    #[error("run lock {:?} is held by an unknown run", path.display())]
    Unreadable { path: PathBuf },

    /// Lock holder cannot be serialized.
    #[error(transparent)]
    Encode(#[from] toml::ser::Error),

    /// Lock file cannot be managed.
    #[error("failed to manage run lock {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = LockError> = std::result::Result<T, E>;
