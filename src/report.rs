//! Report documents and their structural checks.
//!
//! Reports are markdown documents the assistant embeds in fenced blocks. Each
//! non-terminal phase yields one report; the terminal phase yields the brand
//! strategy summary, which must carry a fixed set of sections and a comparison table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phase::Phase;

/// Headings the terminal report must contain, in any order.
pub const REQUIRED_TERMINAL_SECTIONS: &[&str] = &[
    "Executive Summary",
    "Brand Foundation",
    "Audience & Market",
    "Voice & Identity",
    "Competitive Comparison",
    "Recommended Next Steps",
];

/// Header row of the terminal report's comparison table.
pub const COMPARISON_TABLE_HEADER: &str = "| Dimension | Your Brand | Competitors | Opportunity |";

/// An accepted report, as persisted under `reports.<phase>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub phase: Phase,
    pub content: String,
    pub accepted_at: DateTime<Utc>,
}

impl Report {
    pub fn new(phase: Phase, content: impl Into<String>) -> Self {
        Self {
            phase,
            content: content.into(),
            accepted_at: Utc::now(),
        }
    }

    /// First heading of the document, without the leading `#` marks.
    pub fn title(&self) -> Option<&str> {
        self.content
            .lines()
            .find_map(heading_text)
    }
}

/// Result of checking a terminal report's structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalCheck {
    pub missing_sections: Vec<&'static str>,
    pub missing_table: bool,
}

impl TerminalCheck {
    pub fn is_valid(&self) -> bool {
        self.missing_sections.is_empty() && !self.missing_table
    }

    /// Short list of problems, used in logs and the corrective request.
    pub fn describe(&self) -> String {
        let mut problems: Vec<String> = self
            .missing_sections
            .iter()
            .map(|section| format!("missing section \"## {}\"", section))
            .collect();
        if self.missing_table {
            problems.push(format!(
                "missing comparison table with header `{}`",
                COMPARISON_TABLE_HEADER
            ));
        }
        problems.join("; ")
    }
}

/// Check the terminal report for required headings and the comparison table header.
pub fn validate_terminal(content: &str) -> TerminalCheck {
    let headings: Vec<String> = content
        .lines()
        .filter_map(heading_text)
        .map(|h| h.to_lowercase())
        .collect();

    let missing_sections = REQUIRED_TERMINAL_SECTIONS
        .iter()
        .copied()
        .filter(|section| !headings.iter().any(|h| h == &section.to_lowercase()))
        .collect();

    let expected = squash_table_row(COMPARISON_TABLE_HEADER);
    let missing_table = !content
        .lines()
        .any(|line| squash_table_row(line) == expected);

    TerminalCheck {
        missing_sections,
        missing_table,
    }
}

/// Whether a line is a markdown heading (`#` through `######` followed by text).
pub fn is_heading(line: &str) -> bool {
    heading_text(line).is_some()
}

fn heading_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() { None } else { Some(text) }
}

fn squash_table_row(line: &str) -> String {
    line.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// A terminal report that passes `validate_terminal`.
#[cfg(test)]
pub(crate) fn complete_terminal_report() -> String {
    format!(
        "# Brand Strategy Summary\n\n## Executive Summary\nText\n\n## Brand Foundation\nText\n\n\
         ## Audience & Market\nText\n\n## Voice & Identity\nText\n\n## Competitive Comparison\n\
         {}\n|---|---|---|---|\n| Price | Mid | Low | Value |\n\n## Recommended Next Steps\nText\n",
        COMPARISON_TABLE_HEADER
    )
}
