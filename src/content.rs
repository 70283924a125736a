// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Synthetic content generation.
//!
//! Every target category has its own generator that produces a
//! [`Fragment`], i.e., the new content for one file in one run:
//!
//! - __Markdown__: a handful of distinct lines drawn from a fixed catalog of
//!   headings and bullets, see [`MarkdownLine`].
//! - __Text__: timestamped log lines, one per unit of the line budget.
//! - __JSON__: today's entry upserted into the file's [`ProgressRecord`]. The
//!   fragment is the whole rewritten document.
//! - __Other__: a short heading plus a single note.
//!
//! Generated content is filler by nature. It only has to look plausible.

pub mod progress;

use crate::{
    config::{Category, GenerationBounds, TargetFile, Vocabulary},
    content::progress::{ProgressEntry, ProgressRecord, ProgressStatus},
    entropy::Entropy,
};

use chrono::{DateTime, Local, SecondsFormat};
use std::path::Path;
use tracing::{debug, instrument};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const CLOCK_FORMAT: &str = "%H:%M";
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// New content for one target file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Lines to append after existing content.
    Append(Vec<String>),

    /// Document replacing existing content.
    Replace(String),
}

impl Fragment {
    /// Render fragment as text to write.
    pub fn to_text(&self) -> String {
        match self {
            Self::Append(lines) => {
                let mut text = lines.join("\n");
                text.push('\n');
                text
            }
            Self::Replace(document) => document.clone(),
        }
    }
}

/// Line templates for markdown targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkdownLine {
    /// `## Update 2025-06-01`
    DateHeading,
    /// `## Daily Progress - June 01`
    MonthHeading,
    /// `### Quick Update 🚀`
    TagHeading,
    /// `### Notes for Sunday`
    WeekdayHeading,
    /// `- Quick update at 09:30`
    NoteAtTime,
    /// `- testing in progress`
    ActivityInProgress,
    /// `- 🚀 Quick update`
    TaggedNote,
    /// `- Daily update: 2025-06-01 09:30`
    Stamp,
    /// `- testing`
    ActivityBullet,
    /// `🚀 Quick update`
    Decorative,
}

impl MarkdownLine {
    pub const ALL: [Self; 10] = [
        Self::DateHeading,
        Self::MonthHeading,
        Self::TagHeading,
        Self::WeekdayHeading,
        Self::NoteAtTime,
        Self::ActivityInProgress,
        Self::TaggedNote,
        Self::Stamp,
        Self::ActivityBullet,
        Self::Decorative,
    ];

    /// Render line with fresh random words.
    pub fn render<E>(
        self,
        now: &DateTime<Local>,
        vocabulary: &Vocabulary,
        entropy: &mut E,
    ) -> String
    where
        E: Entropy,
    {
        let date = now.format(DATE_FORMAT);
        let clock = now.format(CLOCK_FORMAT);
        match self {
            Self::DateHeading => format!("## Update {date}"),
            Self::MonthHeading => format!("## Daily Progress - {}", now.format("%B %d")),
            Self::TagHeading => format!("### Quick Update {}", vocabulary.tag(entropy)),
            Self::WeekdayHeading => format!("### Notes for {}", now.format("%A")),
            Self::NoteAtTime => format!("- {} at {clock}", vocabulary.note(entropy)),
            Self::ActivityInProgress => format!("- {} in progress", vocabulary.activity(entropy)),
            Self::TaggedNote => {
                let tag = vocabulary.tag(entropy);
                format!("- {tag} {}", vocabulary.note(entropy))
            }
            Self::Stamp => format!("- Daily update: {date} {clock}"),
            Self::ActivityBullet => format!("- {}", vocabulary.activity(entropy)),
            Self::Decorative => {
                let tag = vocabulary.tag(entropy);
                format!("{tag} {}", vocabulary.note(entropy))
            }
        }
    }
}

/// Generate content fragments for target files.
#[derive(Debug, Clone, Copy)]
pub struct ContentGenerator<'a> {
    root: &'a Path,
    bounds: GenerationBounds,
    vocabulary: &'a Vocabulary,
}

impl<'a> ContentGenerator<'a> {
    /// Construct new content generator.
    ///
    /// JSON targets are read relative to `root`.
    pub fn new(root: &'a Path, bounds: GenerationBounds, vocabulary: &'a Vocabulary) -> Self {
        Self {
            root,
            bounds,
            vocabulary,
        }
    }

    /// Generate fragment for target.
    ///
    /// # Errors
    ///
    /// - Return [`GenerateError::Progress`] if existing JSON document cannot be
    ///   read.
    /// - Return [`GenerateError::Serialize`] if JSON document cannot be
    ///   serialized.
    #[instrument(skip_all, fields(path = %target.path.display()), level = "debug")]
    pub fn generate<E>(
        &self,
        target: &TargetFile,
        now: &DateTime<Local>,
        entropy: &mut E,
    ) -> Result<Fragment>
    where
        E: Entropy,
    {
        let category = target.category();
        debug!("generate {category:?} content");

        let fragment = match category {
            Category::Markdown => Fragment::Append(self.markdown(target, now, entropy)),
            Category::Text => Fragment::Append(self.text(target, now, entropy)),
            Category::Json => Fragment::Replace(self.progress(target, now, entropy)?),
            Category::Other => Fragment::Append(self.fallback(now, entropy)),
        };

        Ok(fragment)
    }

    /// Draw number of lines or entries to write for target.
    ///
    /// Uniform in `min_lines..=max`, where `max` is the target's own bound or
    /// the global `max_lines`. The lower bound is clamped to `max`.
    pub fn line_budget<E>(&self, target: &TargetFile, entropy: &mut E) -> usize
    where
        E: Entropy,
    {
        let max = target.max_units.unwrap_or(self.bounds.max_lines).max(1);
        let min = self.bounds.min_lines.clamp(1, max);
        entropy.between(min, max)
    }

    fn markdown<E>(
        &self,
        target: &TargetFile,
        now: &DateTime<Local>,
        entropy: &mut E,
    ) -> Vec<String>
    where
        E: Entropy,
    {
        let count = self.line_budget(target, entropy).min(MarkdownLine::ALL.len());

        // INVARIANT: No line template repeats within one fragment.
        let mut pool = MarkdownLine::ALL.to_vec();
        (0..count)
            .map(|_| {
                let line = pool.remove(entropy.index(pool.len()));
                line.render(now, self.vocabulary, entropy)
            })
            .collect()
    }

    fn text<E>(&self, target: &TargetFile, now: &DateTime<Local>, entropy: &mut E) -> Vec<String>
    where
        E: Entropy,
    {
        let stamp = now.format(&format!("{DATE_FORMAT} {CLOCK_FORMAT}")).to_string();
        let count = self.line_budget(target, entropy);
        (0..count)
            .map(|_| format!("[{stamp}] {} - update", self.vocabulary.activity(entropy)))
            .collect()
    }

    fn progress<E>(
        &self,
        target: &TargetFile,
        now: &DateTime<Local>,
        entropy: &mut E,
    ) -> Result<String>
    where
        E: Entropy,
    {
        let mut record = ProgressRecord::load(self.root.join(&target.path))?;
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, false);
        let status = *entropy
            .choose(&ProgressStatus::ALL)
            .unwrap_or(&ProgressStatus::InProgress);

        let entry = ProgressEntry {
            timestamp: timestamp.clone(),
            activity: self.vocabulary.activity(entropy).into(),
            status,
            notes: self.vocabulary.note(entropy).into(),
            emoji: self.vocabulary.tag(entropy).into(),
        };
        record.upsert(now.format(DATE_FORMAT).to_string(), entry, timestamp);

        Ok(record.to_document()?)
    }

    fn fallback<E>(&self, now: &DateTime<Local>, entropy: &mut E) -> Vec<String>
    where
        E: Entropy,
    {
        vec![
            format!("# Update {}", now.format(&format!("{DATE_FORMAT} {CLOCK_FORMAT}"))),
            self.vocabulary.note(entropy).into(),
        ]
    }
}

/// Content generation error types.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Existing progress record cannot be read.
    #[error(transparent)]
    Progress(#[from] crate::content::progress::ProgressError),

    /// Progress record cannot be serialized.
    #[error("failed to serialize progress record")]
    Serialize(#[from] serde_json::Error),
}

/// Friendly result alias :3
type Result<T, E = GenerateError> = std::result::Result<T, E>;
