// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Run orchestration.
//!
//! A __run__ is one best-effort attempt at publishing synthetic activity. It
//! moves through a fixed sequence of stages:
//!
//! ```text
//! Pulling -> Selecting -> Mutating -> Staging -> Diffing -> Composing
//!         -> Committing -> Pushing -> Done
//! ```
//!
//! Any failing stage ends the run right there. Nothing is retried, and nothing
//! is rolled back: a failed commit leaves the mutated working tree behind, and
//! a failed push leaves the commit unpublished. The next run picks up from
//! whatever state the working copy is in.
//!
//! Pulling comes first on purpose, so a run never writes on top of a stale
//! checkout. If the pull fails, no file is touched.

use crate::{
    config::Config,
    content::ContentGenerator,
    entropy::Entropy,
    message::MessageComposer,
    mutate::Mutator,
    select::select_targets,
    vcs::{Vcs, VcsError},
};

use chrono::{DateTime, Local};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};
use tracing::{debug, error, info, instrument, warn};

/// Stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pulling,
    Selecting,
    Mutating,
    Staging,
    Diffing,
    Composing,
    Committing,
    Pushing,
}

impl Display for Stage {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Pulling => "pulling",
            Self::Selecting => "selecting",
            Self::Mutating => "mutating",
            Self::Staging => "staging",
            Self::Diffing => "diffing",
            Self::Composing => "composing",
            Self::Committing => "committing",
            Self::Pushing => "pushing",
        };
        fmt.write_str(name)
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunStatus {
    /// Commit created and pushed.
    Published,

    /// Nothing to commit.
    NoOp,

    /// Run aborted.
    Failed(RunError),
}

/// Summary of one run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Targets the run tried to update, relative to repository root.
    pub attempted: Vec<PathBuf>,

    /// Targets actually updated.
    pub updated: Vec<PathBuf>,

    /// Commit message, once composed.
    pub message: Option<String>,

    pub status: RunStatus,
}

impl RunOutcome {
    fn new() -> Self {
        Self {
            attempted: Vec::new(),
            updated: Vec::new(),
            message: None,
            status: RunStatus::NoOp,
        }
    }

    fn finish(mut self, status: RunStatus) -> Self {
        match &status {
            RunStatus::Published => info!(
                "published {:?} with {} updated file(s)",
                self.message.as_deref().unwrap_or_default(),
                self.updated.len()
            ),
            RunStatus::NoOp => info!("nothing to commit"),
            RunStatus::Failed(err) => error!("run failed: {}", report(err)),
        }

        self.status = status;
        self
    }

    /// Did the run publish a commit?
    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Published)
    }

    /// Process exit code for outcome.
    ///
    /// Zero only when a commit got published. No-op runs count as failure.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Published => 0,
            RunStatus::NoOp | RunStatus::Failed(_) => 1,
        }
    }
}

/// Drive a run against a repository.
#[derive(Debug)]
pub struct Runner<'a, V, E>
where
    V: Vcs,
    E: Entropy,
{
    config: &'a Config,
    vcs: V,
    entropy: E,
}

impl<'a, V, E> Runner<'a, V, E>
where
    V: Vcs,
    E: Entropy,
{
    /// Construct new runner.
    pub fn new(config: &'a Config, vcs: V, entropy: E) -> Self {
        Self {
            config,
            vcs,
            entropy,
        }
    }

    /// Access version control collaborator.
    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Perform run at current local time.
    pub async fn run(&mut self) -> RunOutcome {
        self.run_at(Local::now()).await
    }

    /// Perform run as if the clock read `now`.
    #[instrument(skip_all, level = "debug")]
    pub async fn run_at(&mut self, now: DateTime<Local>) -> RunOutcome {
        let config = self.config;
        let repository = &config.repository;
        let mut outcome = RunOutcome::new();
        info!("starting run in {:?}", repository.path.display());

        // INVARIANT: Nothing configured means nothing to do, not even a pull.
        if config.targets.is_empty() {
            warn!("no target files configured");
            return outcome.finish(RunStatus::NoOp);
        }

        enter(Stage::Pulling);
        if let Err(err) = self.vcs.pull(&repository.remote, &repository.branch).await {
            return outcome.finish(RunStatus::Failed(RunError::Pull {
                source: err,
                remote: repository.remote.clone(),
                branch: repository.branch.clone(),
            }));
        }

        enter(Stage::Selecting);
        let targets = select_targets(
            &config.targets,
            &config.selection.count_weights,
            &mut self.entropy,
        );
        outcome.attempted = targets.iter().map(|target| target.path.clone()).collect();
        info!("selected files to update: {:?}", outcome.attempted);

        enter(Stage::Mutating);
        let generator =
            ContentGenerator::new(&repository.path, config.generation, &config.vocabulary);
        let mutator = Mutator::new(&repository.path);
        for target in targets {
            let written = generator
                .generate(target, &now, &mut self.entropy)
                .map_err(|err| report(&err))
                .and_then(|fragment| {
                    mutator
                        .apply(target, &fragment)
                        .map_err(|err| report(&err))
                });

            match written {
                Ok(_) => outcome.updated.push(target.path.clone()),
                Err(err) => warn!("skip {:?}: {err}", target.path.display()),
            }
        }

        if outcome.updated.is_empty() {
            return outcome.finish(RunStatus::Failed(RunError::NothingUpdated));
        }

        enter(Stage::Staging);
        if let Err(err) = self.vcs.stage_all().await {
            return outcome.finish(RunStatus::Failed(RunError::Stage(err)));
        }

        enter(Stage::Diffing);
        match self.vcs.has_pending_changes().await {
            Ok(true) => {}
            Ok(false) => return outcome.finish(RunStatus::NoOp),
            Err(err) => return outcome.finish(RunStatus::Failed(RunError::Status(err))),
        }

        enter(Stage::Composing);
        let file = outcome.updated[0].to_string_lossy().into_owned();
        let message =
            MessageComposer::new(&config.vocabulary).compose(&file, &now, &mut self.entropy);
        outcome.message = Some(message.clone());

        enter(Stage::Committing);
        if let Err(err) = self.vcs.commit(&message).await {
            return outcome.finish(RunStatus::Failed(RunError::Commit {
                source: err,
                message,
            }));
        }
        info!("committed: {message}");

        enter(Stage::Pushing);
        if let Err(err) = self.vcs.push(&repository.remote, &repository.branch).await {
            return outcome.finish(RunStatus::Failed(RunError::Push {
                source: err,
                remote: repository.remote.clone(),
                branch: repository.branch.clone(),
            }));
        }

        outcome.finish(RunStatus::Published)
    }
}

fn enter(stage: Stage) {
    debug!("enter stage {stage}");
}

/// Flatten error and its sources into one line.
fn report(err: &dyn std::error::Error) -> String {
    let mut line = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        line.push_str(": ");
        line.push_str(&cause.to_string());
        source = cause.source();
    }

    line
}

/// Reasons a run fails.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Remote state could not be pulled, nothing was touched.
    #[error("failed to pull {remote}/{branch}")]
    Pull {
        #[source]
        source: VcsError,
        remote: String,
        branch: String,
    },

    /// Every selected file failed to update.
    #[error("no target file could be updated")]
    NothingUpdated,

    /// Working tree changes could not be staged.
    #[error("failed to stage working tree changes")]
    Stage(#[source] VcsError),

    /// Working tree status could not be queried.
    #[error("failed to query working tree status")]
    Status(#[source] VcsError),

    /// Commit failed, mutated files stay uncommitted.
    #[error("failed to commit {message:?}")]
    Commit {
        #[source]
        source: VcsError,
        message: String,
    },

    /// Push failed, commit stays local.
    #[error("failed to push to {remote}/{branch}")]
    Push {
        #[source]
        source: VcsError,
        remote: String,
        branch: String,
    },
}
