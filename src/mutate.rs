// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository mutation.
//!
//! Persist freshly generated fragments into the working copy. Append fragments
//! go after existing content, separated by a line break if the file does not
//! already end with one. Replace fragments become the entire file.

use crate::{config::TargetFile, content::Fragment};

use std::{
    fs::{create_dir_all, read, write, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Write fragments into files under a repository root.
#[derive(Debug, Clone, Copy)]
pub struct Mutator<'a> {
    root: &'a Path,
}

impl<'a> Mutator<'a> {
    /// Construct new mutator for repository root.
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Persist fragment for target.
    ///
    /// Creates missing parent directories. Returns the absolute path written.
    ///
    /// # Errors
    ///
    /// - Return [`MutateError`] if any filesystem operation fails.
    #[instrument(skip(self, fragment), fields(path = %target.path.display()), level = "debug")]
    pub fn apply(&self, target: &TargetFile, fragment: &Fragment) -> Result<PathBuf> {
        let path = self.root.join(&target.path);
        if let Some(parent) = path.parent() {
            create_dir_all(parent).map_err(|err| MutateError::new(err, parent))?;
        }

        match fragment {
            Fragment::Append(_) => append(&path, fragment)?,
            Fragment::Replace(_) => {
                debug!("replace content of {:?}", path.display());
                write(&path, fragment.to_text()).map_err(|err| MutateError::new(err, &path))?;
            }
        }

        info!("updated file: {}", target.path.display());
        Ok(path)
    }
}

fn append(path: &Path, fragment: &Fragment) -> Result<()> {
    // INVARIANT: Existing content always ends with a line break before appending.
    let needs_break = match read(path) {
        Ok(bytes) => bytes.last().is_some_and(|last| *last != b'\n'),
        Err(err) if err.kind() == ErrorKind::NotFound => false,
        Err(err) => return Err(MutateError::new(err, path)),
    };

    let mut text = String::new();
    if needs_break {
        text.push('\n');
    }
    text.push_str(&fragment.to_text());

    debug!("append {} bytes to {:?}", text.len(), path.display());
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(text.as_bytes()))
        .map_err(|err| MutateError::new(err, path))
}

/// Fragment cannot be persisted.
#[derive(Debug, thiserror::Error)]
#[error("failed to write {:?}", path.display())]
pub struct MutateError {
    #[source]
    source: std::io::Error,
    path: PathBuf,
}

impl MutateError {
    fn new(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = MutateError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::fs::read_to_string;
    use tempfile::TempDir;

    fn lines(lines: &[&str]) -> Fragment {
        Fragment::Append(lines.iter().map(|line| (*line).to_owned()).collect())
    }

    #[test]
    fn append_inserts_missing_line_break() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path().join("notes.txt"), "first")?;
        let mutator = Mutator::new(dir.path());

        mutator.apply(&TargetFile::new("notes.txt", 1.0), &lines(&["second", "third"]))?;

        let result = read_to_string(dir.path().join("notes.txt"))?;
        let expect = indoc! {"
            first
            second
            third
        "};
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn append_is_monotonic() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mutator = Mutator::new(dir.path());
        let target = TargetFile::new("log.md", 1.0);

        mutator.apply(&target, &lines(&["one"]))?;
        let before = read_to_string(dir.path().join("log.md"))?.lines().count();
        mutator.apply(&target, &lines(&["two"]))?;
        let after = read_to_string(dir.path().join("log.md"))?;

        assert!(after.lines().count() > before);
        assert!(after.starts_with("one\n"));

        Ok(())
    }

    #[test]
    fn replace_truncates_and_creates_parents() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mutator = Mutator::new(dir.path());
        let target = TargetFile::new("data/progress.json", 1.0);

        mutator.apply(&target, &Fragment::Replace("{\"a\": 1}\n".into()))?;
        mutator.apply(&target, &Fragment::Replace("{}\n".into()))?;

        let result = read_to_string(dir.path().join("data/progress.json"))?;
        assert_eq!(result, "{}\n");

        Ok(())
    }

    #[test]
    fn unwritable_target_reports_path() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        create_dir_all(dir.path().join("taken"))?;
        let mutator = Mutator::new(dir.path());

        let result = mutator.apply(&TargetFile::new("taken", 1.0), &lines(&["x"]));
        let error = result.expect_err("directory cannot be appended to");
        assert!(error.to_string().contains("taken"));

        Ok(())
    }
}
