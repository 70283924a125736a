// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the configuration file that streak reads at startup.
//! The configuration is loaded once, validated, and then handed out by
//! reference to every component of a run. Nothing reads configuration from
//! global state.
//!
//! Every section is optional. Missing sections fall back to the defaults
//! below, which describe a small daily log repository with five tracked files.

use crate::{entropy::Entropy, template::Template};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Component, Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::{debug, instrument};

const DEFAULT_ACTIVITIES: &[&str] = &[
    "code review",
    "bug fixes",
    "feature development",
    "documentation",
    "testing",
    "refactoring",
    "optimization",
    "research",
    "planning",
    "debugging",
    "cleanup",
    "maintenance",
    "learning",
    "experimentation",
];

const DEFAULT_NOTES: &[&str] = &[
    "Quick update",
    "Minor changes",
    "Small improvement",
    "Tiny fix",
    "Quick note",
    "Brief update",
    "Small addition",
    "Minor tweak",
    "Quick edit",
    "Small change",
    "Brief note",
    "Minor update",
];

const DEFAULT_TAGS: &[&str] = &[
    "🚀", "✨", "📝", "🔧", "💡", "🎯", "⚡", "🔥", "💪", "🎉", "📚", "🛠️",
];

const DEFAULT_MESSAGES: &[&str] = &[
    "Daily update: {date}",
    "Progress log for {date}",
    "Update: {activity} - {date}",
    "Daily commit: {tag} {date}",
    "Log entry: {timestamp}",
    "Daily sync: {file}",
    "Update {file}: {note}",
    "Daily progress: {activity}",
    "Commit: {tag} {activity}",
    "Update: {note} - {date}",
];

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Repository to mutate and publish.
    pub repository: RepositorySettings,

    /// How many files get touched per run.
    pub selection: SelectionSettings,

    /// Bounds on generated content.
    pub generation: GenerationBounds,

    /// Files that may be updated.
    #[serde(rename = "target")]
    pub targets: Vec<TargetFile>,

    /// Word lists for synthetic content and commit messages.
    pub vocabulary: Vocabulary,
}

impl Config {
    /// Load configuration file at target path.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if file is not valid TOML, or
    ///   contains a malformed message template.
    /// - Return [`ConfigError::ShellExpansion`] if repository path cannot be
    ///   expanded.
    /// - Return [`ConfigError::Invalid`] if validation fails.
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        debug!("load configuration from {:?}", path.as_ref().display());
        let data = read_to_string(path.as_ref()).map_err(|err| ConfigError::Read {
            source: err,
            path: path.as_ref().to_path_buf(),
        })?;

        data.parse()
    }

    /// Load configuration file, or use defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// - Same as [`Config::load`] when the file exists.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if !path.as_ref().exists() {
            debug!(
                "no configuration at {:?}, using defaults",
                path.as_ref().display()
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Replace repository path, applying shell expansion.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ShellExpansion`] if path cannot be expanded.
    pub fn with_repository_path(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.repository.path = expand_path(path.as_ref())?;
        Ok(self)
    }

    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Invalid`] describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        let repository = &self.repository;
        if repository.remote.trim().is_empty() || repository.branch.trim().is_empty() {
            return Err(invalid("repository remote and branch must not be empty"));
        }

        if repository.command_timeout == 0 || repository.lock_stale_after == 0 {
            return Err(invalid("repository timeouts must be positive"));
        }

        let weights = &self.selection.count_weights;
        if weights.is_empty() {
            return Err(invalid("selection.count_weights must not be empty"));
        }

        if weights.iter().any(|weight| !weight.is_finite() || *weight < 0.0)
            || weights.iter().sum::<f64>() <= 0.0
        {
            return Err(invalid(
                "selection.count_weights must be non-negative with a positive sum",
            ));
        }

        let bounds = &self.generation;
        if bounds.min_lines == 0 || bounds.min_lines > bounds.max_lines {
            return Err(invalid(
                "generation bounds must satisfy 1 <= min_lines <= max_lines",
            ));
        }

        for target in &self.targets {
            let escapes = target.path.components().any(|component| {
                !matches!(component, Component::Normal(_) | Component::CurDir)
            });
            if escapes || target.path.as_os_str().is_empty() {
                return Err(invalid(format!(
                    "target path {:?} must be relative to the repository root",
                    target.path.display()
                )));
            }

            if !target.weight.is_finite() || target.weight < 0.0 {
                return Err(invalid(format!(
                    "target {:?} has invalid weight {}",
                    target.path.display(),
                    target.weight
                )));
            }

            if target.max_units == Some(0) {
                return Err(invalid(format!(
                    "target {:?} must allow at least one unit per update",
                    target.path.display()
                )));
            }
        }

        let vocabulary = &self.vocabulary;
        if vocabulary.activities.is_empty()
            || vocabulary.notes.is_empty()
            || vocabulary.tags.is_empty()
            || vocabulary.messages.is_empty()
        {
            return Err(invalid("vocabulary lists must not be empty"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: RepositorySettings::default(),
            selection: SelectionSettings::default(),
            generation: GenerationBounds::default(),
            targets: vec![
                TargetFile::new("daily_log.md", 3.0),
                TargetFile::new("README.md", 1.0),
                TargetFile::new("progress.json", 2.0),
                TargetFile::new("notes.txt", 2.0),
                TargetFile::new("activities.md", 2.0),
            ],
            vocabulary: Vocabulary::default(),
        }
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: Config = toml::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on repository path.
        config.repository.path = expand_path(&config.repository.path)?;
        config.validate()?;

        Ok(config)
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Repository settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RepositorySettings {
    /// Root of the working copy.
    pub path: PathBuf,

    /// Remote to pull from and push to.
    pub remote: String,

    /// Branch to pull and push.
    pub branch: String,

    /// Upper bound for a single git invocation in seconds.
    pub command_timeout: u64,

    /// Age in seconds after which a leftover run lock is ignored.
    pub lock_stale_after: u64,
}

impl RepositorySettings {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }

    pub fn lock_stale_after(&self) -> Duration {
        Duration::from_secs(self.lock_stale_after)
    }
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            remote: "origin".into(),
            branch: "main".into(),
            command_timeout: 120,
            lock_stale_after: 3600,
        }
    }
}

/// File count selection settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionSettings {
    /// Relative odds of touching 1, 2, ... files in one run.
    ///
    /// The length of this list is the maximum number of files per run.
    pub count_weights: Vec<f64>,
}

impl SelectionSettings {
    /// Largest number of files a single run may touch.
    pub fn max_files(&self) -> usize {
        self.count_weights.len()
    }
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            count_weights: vec![0.6, 0.4],
        }
    }
}

/// Bounds on lines or entries written per update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationBounds {
    pub min_lines: usize,
    pub max_lines: usize,
}

impl Default for GenerationBounds {
    fn default() -> Self {
        Self {
            min_lines: 1,
            max_lines: 5,
        }
    }
}

/// Kind of file, decides content generator and update strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Markdown,
    Json,
    Text,
    Other,
}

impl Category {
    /// Infer category from file extension.
    pub fn infer(path: impl AsRef<Path>) -> Self {
        let extension = path
            .as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

        match extension.as_deref() {
            Some("md" | "markdown") => Self::Markdown,
            Some("json") => Self::Json,
            Some("txt") => Self::Text,
            _ => Self::Other,
        }
    }
}

/// File that may be updated by a run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TargetFile {
    /// Path relative to repository root.
    pub path: PathBuf,

    /// Explicit category, inferred from extension when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    /// Relative selection weight.
    #[serde(default = "default_weight")]
    pub weight: f64,

    /// Most lines or entries written per update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_units: Option<usize>,
}

impl TargetFile {
    /// Construct new target with inferred category.
    pub fn new(path: impl Into<PathBuf>, weight: f64) -> Self {
        Self {
            path: path.into(),
            category: None,
            weight,
            max_units: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_max_units(mut self, max_units: usize) -> Self {
        self.max_units = Some(max_units);
        self
    }

    /// Effective category of target.
    pub fn category(&self) -> Category {
        self.category.unwrap_or_else(|| Category::infer(&self.path))
    }
}

fn default_weight() -> f64 {
    1.0
}

/// Word lists used for synthetic content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Names of plausible pieces of work.
    pub activities: Vec<String>,

    /// Short free-form remarks.
    pub notes: Vec<String>,

    /// Decorative tags, usually emoji.
    pub tags: Vec<String>,

    /// Commit message templates.
    pub messages: Vec<Template>,
}

impl Vocabulary {
    /// Draw random activity.
    pub fn activity<E: Entropy>(&self, entropy: &mut E) -> &str {
        pick(&self.activities, entropy)
    }

    /// Draw random note.
    pub fn note<E: Entropy>(&self, entropy: &mut E) -> &str {
        pick(&self.notes, entropy)
    }

    /// Draw random decorative tag.
    pub fn tag<E: Entropy>(&self, entropy: &mut E) -> &str {
        pick(&self.tags, entropy)
    }
}

fn pick<'a, E: Entropy>(words: &'a [String], entropy: &mut E) -> &'a str {
    entropy.choose(words).map_or("", String::as_str)
}

impl Default for Vocabulary {
    fn default() -> Self {
        let owned = |words: &[&str]| -> Vec<String> {
            words.iter().map(|word| (*word).to_owned()).collect()
        };

        Self {
            activities: owned(DEFAULT_ACTIVITIES),
            notes: owned(DEFAULT_NOTES),
            tags: owned(DEFAULT_TAGS),
            messages: DEFAULT_MESSAGES
                .iter()
                .filter_map(|source| source.parse().ok())
                .collect(),
        }
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let expanded = shellexpand::full(path.to_string_lossy().as_ref())
        .map_err(ConfigError::ShellExpansion)?
        .into_owned();

    Ok(PathBuf::from(expanded))
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(reason.into())
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Configuration values break an invariant.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
