// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Commit message templates.
//!
//! A message template is plain text with named placeholders wrapped in curly
//! braces, e.g., `"Update {file}: {note}"`. Templates are parsed once when the
//! configuration is loaded, so an unknown or unclosed placeholder is caught
//! before any run is attempted.
//!
//! # Placeholders
//!
//! | Name          | Expands to                                  |
//! |---------------|---------------------------------------------|
//! | `{activity}`  | random entry of the activity vocabulary     |
//! | `{date}`      | current date as `YYYY-MM-DD`                |
//! | `{time}`      | current time as `HH:MM`                     |
//! | `{timestamp}` | current date and time `YYYY-MM-DD HH:MM:SS` |
//! | `{file}`      | name of the first updated file              |
//! | `{tag}`       | random entry of the tag vocabulary          |
//! | `{note}`      | random entry of the note vocabulary         |

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Named placeholder inside a message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Activity,
    Date,
    Time,
    Timestamp,
    File,
    Tag,
    Note,
}

impl Placeholder {
    /// Name of placeholder as written between braces.
    pub fn name(self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::File => "file",
            Self::Tag => "tag",
            Self::Note => "note",
        }
    }
}

impl FromStr for Placeholder {
    type Err = TemplateError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "activity" => Ok(Self::Activity),
            "date" => Ok(Self::Date),
            "time" => Ok(Self::Time),
            "timestamp" => Ok(Self::Timestamp),
            "file" => Ok(Self::File),
            "tag" => Ok(Self::Tag),
            "note" => Ok(Self::Note),
            _ => Err(TemplateError::UnknownPlaceholder(name.into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// Parsed commit message template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Placeholders referenced by template in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(placeholder) => Some(*placeholder),
            Segment::Literal(_) => None,
        })
    }

    /// Render template into a message.
    ///
    /// The resolver is only invoked for placeholders that actually appear in
    /// the template, once per occurrence.
    pub fn render(&self, mut resolve: impl FnMut(Placeholder) -> String) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(placeholder) => out.push_str(&resolve(*placeholder)),
            }
        }

        out
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            let literal = &rest[..open];
            if literal.contains('}') {
                return Err(TemplateError::Unopened(source.into()));
            }

            if !literal.is_empty() {
                segments.push(Segment::Literal(literal.into()));
            }

            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| TemplateError::Unclosed(source.into()))?;
            let name = &after[..close];
            if name.contains('{') {
                return Err(TemplateError::Unclosed(source.into()));
            }

            segments.push(Segment::Placeholder(name.trim().parse()?));
            rest = &after[close + 1..];
        }

        if rest.contains('}') {
            return Err(TemplateError::Unopened(source.into()));
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.into()));
        }

        Ok(Self {
            source: source.into(),
            segments,
        })
    }
}

impl TryFrom<String> for Template {
    type Error = TemplateError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        source.parse()
    }
}

impl From<Template> for String {
    fn from(template: Template) -> Self {
        template.source
    }
}

impl Display for Template {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(&self.source)
    }
}

/// Template parsing error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Placeholder name is not recognized.
    #[error("unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),

    /// Opening brace without matching closing brace.
    #[error("unclosed placeholder in template {0:?}")]
    Unclosed(String),

    /// Closing brace without matching opening brace.
    #[error("stray closing brace in template {0:?}")]
    Unopened(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test]
    fn render_only_resolves_present_placeholders() -> anyhow::Result<()> {
        let template: Template = "Update {file}: {note}".parse()?;
        let mut asked = Vec::new();

        let result = template.render(|placeholder| {
            asked.push(placeholder);
            placeholder.name().to_uppercase()
        });

        pretty_assertions::assert_eq!(result, "Update FILE: NOTE");
        pretty_assertions::assert_eq!(asked, vec![Placeholder::File, Placeholder::Note]);

        Ok(())
    }

    #[test]
    fn literal_only_template() -> anyhow::Result<()> {
        let template: Template = "Routine maintenance".parse()?;

        pretty_assertions::assert_eq!(template.placeholders().count(), 0);
        pretty_assertions::assert_eq!(
            template.render(|_| unreachable!()),
            "Routine maintenance"
        );

        Ok(())
    }

    #[test_case("Update {mood}", TemplateError::UnknownPlaceholder("mood".into()); "unknown name")]
    #[test_case("Update {date", TemplateError::Unclosed("Update {date".into()); "missing close")]
    #[test_case("Update {da{te}", TemplateError::Unclosed("Update {da{te}".into()); "nested open")]
    #[test_case("Update date}", TemplateError::Unopened("Update date}".into()); "stray close")]
    #[test]
    fn reject_malformed_template(source: &str, expect: TemplateError) {
        let result = source.parse::<Template>();
        pretty_assertions::assert_eq!(result, Err(expect));
    }

    #[test]
    fn template_serializes_as_source() -> anyhow::Result<()> {
        let template: Template = serde_json::from_str(r#""Daily commit: {tag} {date}""#)?;

        pretty_assertions::assert_eq!(
            template.placeholders().collect::<Vec<_>>(),
            vec![Placeholder::Tag, Placeholder::Date]
        );
        pretty_assertions::assert_eq!(
            serde_json::to_string(&template)?,
            r#""Daily commit: {tag} {date}""#
        );

        Ok(())
    }
}
