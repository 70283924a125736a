// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Version control collaborator.
//!
//! A run only needs five things from version control: pull, stage everything,
//! ask whether anything changed, commit, and push. The [`Vcs`] trait models
//! exactly that, so the orchestrator can be driven by a test double as easily
//! as by real Git.
//!
//! [`GitCli`] is the real thing. The working copy is validated through libgit2
//! when it is opened, while the operations themselves shell out to the Git
//! binary so that the user's own credentials, hooks, and configuration apply.
//! Every invocation is bounded by a timeout, and a command that outlives it is
//! killed.

use git2::Repository;
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};
use tokio::{process::Command, time::timeout};
use tracing::{debug, instrument};

/// Operations a run needs from version control.
#[allow(async_fn_in_trait)]
pub trait Vcs {
    /// Synchronize local branch with remote branch.
    async fn pull(&self, remote: &str, branch: &str) -> Result<()>;

    /// Stage every working tree change.
    async fn stage_all(&self) -> Result<()>;

    /// Check for any staged, unstaged, or untracked change.
    async fn has_pending_changes(&self) -> Result<bool>;

    /// Commit staged changes.
    async fn commit(&self, message: &str) -> Result<()>;

    /// Publish local branch to remote branch.
    async fn push(&self, remote: &str, branch: &str) -> Result<()>;
}

/// Version control through the Git binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    work_tree: PathBuf,
    git_dir: PathBuf,
    timeout: Duration,
}

impl GitCli {
    /// Open working copy at target path.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::MissingRoot`] if path is not a directory.
    /// - Return [`VcsError::Open`] if path is not a Git repository.
    /// - Return [`VcsError::Bare`] if repository has no working tree.
    #[instrument(skip(path), level = "debug")]
    pub fn open(path: impl AsRef<Path>, timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(VcsError::MissingRoot {
                path: path.to_path_buf(),
            });
        }

        let repository = Repository::open(path).map_err(|err| VcsError::Open {
            source: err,
            path: path.to_path_buf(),
        })?;

        let work_tree = repository
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| VcsError::Bare {
                path: path.to_path_buf(),
            })?;

        debug!("opened working copy {:?}", work_tree.display());
        Ok(Self {
            work_tree,
            git_dir: repository.path().to_path_buf(),
            timeout,
        })
    }

    /// Root of working tree.
    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// Path to Git directory, e.g., `.git/`.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    async fn git(&self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> Result<String> {
        let mut bin_args: Vec<OsString> = vec!["-C".into(), self.work_tree.clone().into()];
        bin_args.extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        syscall_non_interactive("git", bin_args, self.timeout).await
    }
}

impl Vcs for GitCli {
    async fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        let output = self.git(["pull", "--ff-only", remote, branch]).await?;
        debug!("{output}");
        Ok(())
    }

    async fn stage_all(&self) -> Result<()> {
        self.git(["add", "--all"]).await?;
        Ok(())
    }

    async fn has_pending_changes(&self) -> Result<bool> {
        let output = self.git(["status", "--porcelain"]).await?;
        Ok(!output.trim().is_empty())
    }

    async fn commit(&self, message: &str) -> Result<()> {
        let output = self.git(["commit", "--quiet", "-m", message]).await?;
        debug!("{output}");
        Ok(())
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<()> {
        let output = self.git(["push", remote, branch]).await?;
        debug!("{output}");
        Ok(())
    }
}

async fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: Vec<OsString>,
    limit: Duration,
) -> Result<String> {
    let command_line = format!(
        "{} {}",
        cmd.as_ref().to_string_lossy(),
        args.iter()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );
    debug!("run {command_line:?}");

    let mut command = Command::new(cmd.as_ref());
    command
        .args(&args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .kill_on_drop(true);

    // INVARIANT: Dropping the timed out future kills the child.
    let output = timeout(limit, command.output())
        .await
        .map_err(|_| VcsError::Timeout {
            command: command_line.clone(),
            limit,
        })?
        .map_err(|err| VcsError::Spawn {
            source: err,
            command: command_line.clone(),
        })?;

    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();

    if !output.status.success() {
        let mut message = String::new();
        if !stdout.trim().is_empty() {
            message.push_str(format!("stdout: {}", stdout.trim_end()).as_str());
        }

        if !stderr.trim().is_empty() {
            if !message.is_empty() {
                message.push('\n');
            }
            message.push_str(format!("stderr: {}", stderr.trim_end()).as_str());
        }

        return Err(VcsError::Failed {
            command: command_line,
            status: output.status.code(),
            message,
        });
    }

    // INVARIANT: Chomp trailing newlines.
    Ok(stdout.trim_end_matches(['\r', '\n']).to_string())
}

/// Version control error types.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// Repository root does not exist.
    #[error("repository path {:?} does not exist", path.display())]
    MissingRoot { path: PathBuf },

    /// Repository root is not a Git repository.
    #[error("{:?} is not a git repository", path.display())]
    Open {
        #[source]
        source: git2::Error,
        path: PathBuf,
    },

    /// Repository has no working tree.
    #[error("{:?} is a bare repository", path.display())]
    Bare { path: PathBuf },

    /// Git binary could not be started.
    #[error("failed to run {command:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        command: String,
    },

    /// Git command did not finish in time.
    #[error("command {command:?} timed out after {limit:?}")]
    Timeout { command: String, limit: Duration },

    /// Git command exited unsuccessfully.
    #[error("command {command:?} failed with status {status:?}:\n{message}")]
    Failed {
        command: String,
        status: Option<i32>,
        message: String,
    },
}

/// Friendly result alias :3
pub type Result<T, E = VcsError> = std::result::Result<T, E>;
