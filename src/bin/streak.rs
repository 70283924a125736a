// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use streak::{
    config::Config,
    entropy::RandEntropy,
    lock::RunLock,
    path::default_config_path,
    run::Runner,
    vcs::GitCli,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "streak [options] <streak-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<i32> {
        match self.command {
            Command::Run(opts) => run_once(opts).await,
            Command::Check(opts) => run_check(opts),
            Command::Config => run_config(),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Pull, update target files, commit, and push once.
    #[command(override_usage = "streak run [options]")]
    Run(RunOptions),

    /// Validate configuration and working copy without touching anything.
    #[command(override_usage = "streak check [options]")]
    Check(SourceOptions),

    /// Print default configuration.
    #[command(override_usage = "streak config")]
    Config,
}

#[derive(Args, Clone, Debug)]
struct SourceOptions {
    /// Path to configuration file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Path to repository, overrides configuration.
    #[arg(short, long, value_name = "path")]
    pub repo: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
struct RunOptions {
    #[command(flatten)]
    pub source: SourceOptions,

    /// Seed random choices for a reproducible run.
    #[arg(long, value_name = "number")]
    pub seed: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_ascii_lowercase()));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    match cli.run().await {
        Ok(code) => exit(code),
        Err(error) => {
            error!("{error:?}");
            exit(1);
        }
    }
}

fn load_config(opts: &SourceOptions) -> Result<Config> {
    let config = match &opts.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(default_config_path()?)?,
    };

    match &opts.repo {
        Some(repo) => Ok(config.with_repository_path(repo)?),
        None => Ok(config),
    }
}

async fn run_once(opts: RunOptions) -> Result<i32> {
    let config = load_config(&opts.source)?;
    let repository = &config.repository;
    let vcs = GitCli::open(&repository.path, repository.command_timeout())
        .context("repository is not usable")?;
    let _lock = RunLock::acquire(vcs.git_dir(), repository.lock_stale_after())?;

    let entropy = match opts.seed {
        Some(seed) => RandEntropy::seeded(seed),
        None => RandEntropy::from_entropy(),
    };

    let outcome = Runner::new(&config, vcs, entropy).run().await;
    Ok(outcome.exit_code())
}

fn run_check(opts: SourceOptions) -> Result<i32> {
    let config = load_config(&opts)?;
    let repository = &config.repository;
    let vcs = GitCli::open(&repository.path, repository.command_timeout())
        .context("repository is not usable")?;

    info!(
        "working copy {:?}, publishing to {}/{}",
        vcs.work_tree().display(),
        repository.remote,
        repository.branch
    );
    for target in &config.targets {
        info!(
            "target {:?} as {:?} (weight {}, max units {})",
            target.path.display(),
            target.category(),
            target.weight,
            target.max_units.unwrap_or(config.generation.max_lines)
        );
    }

    Ok(0)
}

fn run_config() -> Result<i32> {
    print!("{}", Config::default());
    Ok(0)
}
