// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Commit message composition.

use crate::{
    config::Vocabulary,
    content::{CLOCK_FORMAT, DATE_FORMAT, TIMESTAMP_FORMAT},
    entropy::Entropy,
    template::Placeholder,
};

use chrono::{DateTime, Local};

/// Compose one-line commit messages from configured templates.
#[derive(Debug, Clone, Copy)]
pub struct MessageComposer<'a> {
    vocabulary: &'a Vocabulary,
}

impl<'a> MessageComposer<'a> {
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Compose message mentioning an updated file.
    ///
    /// Picks one template uniformly, then resolves only the placeholders that
    /// template contains. Each occurrence draws a fresh random word.
    pub fn compose<E>(&self, file: &str, now: &DateTime<Local>, entropy: &mut E) -> String
    where
        E: Entropy,
    {
        let Some(template) = entropy.choose(&self.vocabulary.messages) else {
            return format!("Update {file}");
        };

        let message = template.render(|placeholder| match placeholder {
            Placeholder::Activity => self.vocabulary.activity(entropy).into(),
            Placeholder::Date => now.format(DATE_FORMAT).to_string(),
            Placeholder::Time => now.format(CLOCK_FORMAT).to_string(),
            Placeholder::Timestamp => now.format(TIMESTAMP_FORMAT).to_string(),
            Placeholder::File => file.into(),
            Placeholder::Tag => self.vocabulary.tag(entropy).into(),
            Placeholder::Note => self.vocabulary.note(entropy).into(),
        });

        // INVARIANT: Commit messages stay on one line.
        message.lines().collect::<Vec<_>>().join(" ")
    }
}
