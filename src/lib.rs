// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Synthetic daily activity for Git repositories.
//!
//! Streak keeps a repository's history ticking over without manual upkeep.
//! Every run pulls the latest remote state, appends plausible filler to one or
//! two tracked files, commits the result with a randomly phrased message, and
//! pushes it back. Something external, e.g., cron or a systemd timer, decides
//! when a run happens.
//!
//! # Run Anatomy
//!
//! 1. [`vcs`]: pull remote state so local writes never diverge.
//! 2. [`select`]: pick which target files to touch, by weight.
//! 3. [`content`]: generate new content for each target's category.
//! 4. [`mutate`]: append or rewrite the files on disk.
//! 5. [`message`]: phrase a commit message from the configured templates.
//! 6. [`vcs`]: stage, commit, and push.
//!
//! [`run::Runner`] sequences all of this. Every random decision flows through
//! one [`entropy::Entropy`] source, and every setting comes from one immutable
//! [`config::Config`].

pub mod config;
pub mod content;
pub mod entropy;
pub mod lock;
pub mod message;
pub mod mutate;
pub mod path;
pub mod run;
pub mod select;
pub mod template;
pub mod vcs;

pub use config::{Category, Config, TargetFile};
pub use run::{RunOutcome, RunStatus, Runner};
