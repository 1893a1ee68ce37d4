//! Assistant response parsing.
//!
//! Splits a raw assistant reply into:
//!
//! - fenced report blocks tagged `markdown`, `md` or `report` that contain a heading
//! - an optional `PHASE_COMPLETE:<phase>` completion marker
//! - the remaining conversational prose, with promotional phrases turned into links
//!
//! Parsing is a pure function of the input text and the configured links, so parsing
//! the same reply twice gives identical results.

mod links;
mod types;

pub use links::{LinkRewriter, PromoLink};
pub use types::{Classification, CompletionMarker, ParsedReport, ParsedResponse};

use regex::Regex;
use std::sync::LazyLock;

use crate::phase::Phase;
use crate::report::is_heading;

static FENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^[ \t]*```[ \t]*([A-Za-z0-9_-]*)[^\n]*\n(.*?)^[ \t]*```[ \t]*(?:\n|\z)")
        .unwrap()
});

static MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)PHASE_COMPLETE\s*:\s*([A-Za-z0-9_-]+)").unwrap());

static EXTRA_BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Fence tags that mark a structured document.
const REPORT_TAGS: &[&str] = &["markdown", "md", "report"];

/// Phrases that name a report's phase outright.
const PHASE_PHRASES: &[(Phase, &[&str])] = &[
    (Phase::Phase1, &["brand foundation report"]),
    (
        Phase::Phase2,
        &["audience & market report", "audience and market report"],
    ),
    (
        Phase::Phase3,
        &["voice & identity report", "voice and identity report"],
    ),
    (Phase::Terminal, &["brand strategy summary"]),
];

/// Content that only the terminal summary carries.
const TERMINAL_ONLY_PHRASES: &[&str] = &[
    "competitive comparison",
    "recommended next steps",
    "| dimension |",
];

/// Parser for assistant replies.
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    links: LinkRewriter,
}

impl ResponseParser {
    /// Create a parser that rewrites the given promotional phrases.
    pub fn new(links: &[PromoLink]) -> Self {
        Self {
            links: LinkRewriter::new(links),
        }
    }

    /// Extract reports, completion marker and remaining prose from a reply.
    pub fn parse(&self, raw: &str) -> ParsedResponse {
        let raw = raw.replace("\r\n", "\n");
        let marker = detect_marker(&raw);
        let marker_phase = marker.as_ref().and_then(|m| m.phase);

        let mut reports = Vec::new();
        let mut discarded_reports = 0;
        let mut remaining = String::with_capacity(raw.len());
        let mut last = 0;

        for cap in FENCE_REGEX.captures_iter(&raw) {
            let (Some(whole), Some(tag), Some(body)) = (cap.get(0), cap.get(1), cap.get(2)) else {
                continue;
            };
            let tag = tag.as_str().to_lowercase();
            if !REPORT_TAGS.contains(&tag.as_str()) {
                continue;
            }
            let content = strip_marker_lines(body.as_str()).trim().to_string();
            if !content.lines().any(is_heading) {
                tracing::debug!("fenced {} block has no heading, leaving it in the text", tag);
                continue;
            }

            remaining.push_str(&raw[last..whole.start()]);
            last = whole.end();

            match classify(&content, marker_phase) {
                Some((phase, classified_by)) => {
                    tracing::debug!(phase = %phase, ?classified_by, "extracted report block");
                    reports.push(ParsedReport {
                        phase,
                        content,
                        classified_by,
                    });
                }
                None => {
                    discarded_reports += 1;
                    tracing::warn!(
                        chars = content.len(),
                        "discarding report block that names no phase and has no completion marker"
                    );
                }
            }
        }
        remaining.push_str(&raw[last..]);

        let remaining = strip_marker_lines(&remaining);
        let remaining = EXTRA_BLANK_LINES.replace_all(&remaining, "\n\n");
        let remaining_text = self.links.rewrite(remaining.trim());

        ParsedResponse {
            reports,
            marker,
            remaining_text,
            discarded_reports,
        }
    }
}

/// Convenience function to parse without promotional links.
pub fn parse_response(raw: &str) -> ParsedResponse {
    ResponseParser::default().parse(raw)
}

fn detect_marker(text: &str) -> Option<CompletionMarker> {
    let cap = MARKER_REGEX.captures(text)?;
    let raw_name = cap.get(1)?.as_str().to_string();
    let phase = Phase::from_marker_name(&raw_name);
    if phase.is_none() {
        tracing::warn!(name = %raw_name, "completion marker names an unknown phase");
    }
    Some(CompletionMarker { phase, raw_name })
}

/// Drop every line carrying a completion marker along with the blank lines after it.
fn strip_marker_lines(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut skipping_blanks = false;
    for line in text.split('\n') {
        if MARKER_REGEX.is_match(line) {
            skipping_blanks = true;
            continue;
        }
        if skipping_blanks && line.trim().is_empty() {
            continue;
        }
        skipping_blanks = false;
        kept.push(line);
    }
    kept.join("\n")
}

/// Decide a report's phase: explicit phrase, then terminal-only content, then the marker.
fn classify(content: &str, marker_phase: Option<Phase>) -> Option<(Phase, Classification)> {
    let lower = content.to_lowercase();

    let explicit = PHASE_PHRASES
        .iter()
        .filter_map(|(phase, phrases)| {
            phrases
                .iter()
                .filter_map(|phrase| lower.find(phrase))
                .min()
                .map(|pos| (pos, *phase))
        })
        .min_by_key(|(pos, _)| *pos);
    if let Some((_, phase)) = explicit {
        return Some((phase, Classification::PhasePhrase));
    }

    if TERMINAL_ONLY_PHRASES.iter().any(|p| lower.contains(p)) {
        return Some((Phase::Terminal, Classification::TerminalPhrase));
    }

    marker_phase.map(|phase| (phase, Classification::Marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::complete_terminal_report;

    const PHASE1_REPLY: &str = "Thank you, that gives me a clear picture.\n\n\
PHASE_COMPLETE:phase1\n\n\
```markdown\n\
# Brand Foundation Report\n\
## Purpose\n\
Helping parents cook.\n\
```\n\n\
Let's move on to your audience. Describe your ideal customer in as much detail as you can.";

    #[test]
    fn test_parse_extracts_report_and_marker() {
        let parsed = parse_response(PHASE1_REPLY);
        assert_eq!(parsed.marker_phase(), Some(Phase::Phase1));
        assert_eq!(parsed.reports.len(), 1);
        assert_eq!(parsed.reports[0].phase, Phase::Phase1);
        assert_eq!(parsed.reports[0].classified_by, Classification::PhasePhrase);
        assert!(parsed.reports[0].content.starts_with("# Brand Foundation Report"));
        assert!(!parsed.reports[0].content.contains("```"));
    }

    #[test]
    fn test_parse_remaining_text_has_no_marker_or_fence() {
        let parsed = parse_response(PHASE1_REPLY);
        assert!(!parsed.remaining_text.contains("PHASE_COMPLETE"));
        assert!(!parsed.remaining_text.contains("```"));
        assert!(!parsed.remaining_text.contains("\n\n\n"));
        assert!(parsed.remaining_text.starts_with("Thank you"));
        assert!(parsed.remaining_text.ends_with("as much detail as you can."));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = ResponseParser::new(&[PromoLink {
            phrase: "brand workshop".to_string(),
            url: "https://workshop.test".to_string(),
        }]);
        let text = format!("{}\nJoin our brand workshop.", PHASE1_REPLY);
        assert_eq!(parser.parse(&text), parser.parse(&text));
    }

    #[test]
    fn test_block_without_heading_is_not_a_report() {
        let text = "Here is a list:\n```markdown\n- one\n- two\n```\nDone.";
        let parsed = parse_response(text);
        assert!(parsed.reports.is_empty());
        assert_eq!(parsed.discarded_reports, 0);
        assert!(parsed.remaining_text.contains("- one"));
    }

    #[test]
    fn test_non_report_fence_left_in_text() {
        let text = "Example:\n```json\n{\"a\": 1}\n```\nEnd.";
        let parsed = parse_response(text);
        assert!(parsed.reports.is_empty());
        assert!(parsed.remaining_text.contains("```json"));
    }

    #[test]
    fn test_report_tag_case_insensitive() {
        let text = "```Markdown\n# Voice & Identity Report\nBody\n```";
        let parsed = parse_response(text);
        assert_eq!(parsed.reports.len(), 1);
        assert_eq!(parsed.reports[0].phase, Phase::Phase3);
        assert_eq!(parsed.remaining_text, "");
    }

    #[test]
    fn test_terminal_only_phrase_classifies_terminal() {
        let text = "```md\n# Final thoughts\n## Competitive Comparison\n| Dimension | A |\n```";
        let parsed = parse_response(text);
        assert_eq!(parsed.reports.len(), 1);
        assert_eq!(parsed.reports[0].phase, Phase::Terminal);
        assert_eq!(parsed.reports[0].classified_by, Classification::TerminalPhrase);
    }

    #[test]
    fn test_complete_terminal_report_classified_by_title() {
        let text = format!("```markdown\n{}```\n", complete_terminal_report());
        let parsed = parse_response(&text);
        assert_eq!(parsed.reports.len(), 1);
        assert_eq!(parsed.reports[0].phase, Phase::Terminal);
        assert_eq!(parsed.reports[0].classified_by, Classification::PhasePhrase);
    }

    #[test]
    fn test_unclassified_report_inherits_marker() {
        let text = "PHASE_COMPLETE: phase2\n```markdown\n# Summary\nAudience notes\n```";
        let parsed = parse_response(text);
        assert_eq!(parsed.reports.len(), 1);
        assert_eq!(parsed.reports[0].phase, Phase::Phase2);
        assert_eq!(parsed.reports[0].classified_by, Classification::Marker);
    }

    #[test]
    fn test_unclassified_report_without_marker_is_discarded() {
        let text = "Intro\n```markdown\n# Notes\nSomething\n```\nOutro";
        let parsed = parse_response(text);
        assert!(parsed.reports.is_empty());
        assert_eq!(parsed.discarded_reports, 1);
        assert!(!parsed.remaining_text.contains("# Notes"));
    }

    #[test]
    fn test_explicit_phrase_beats_marker() {
        let text = "PHASE_COMPLETE:phase2\n```markdown\n# Brand Foundation Report\nBody\n```";
        let parsed = parse_response(text);
        assert_eq!(parsed.reports[0].phase, Phase::Phase1);
    }

    #[test]
    fn test_earliest_explicit_phrase_wins() {
        let text = "```markdown\n# Audience & Market Report\nBuilds on the Brand Foundation Report.\n```";
        let parsed = parse_response(text);
        assert_eq!(parsed.reports[0].phase, Phase::Phase2);
    }

    #[test]
    fn test_marker_line_and_following_blanks_stripped() {
        let text = "Great answer.\nPHASE_COMPLETE:phase3\n\n\nNext question here.";
        let parsed = parse_response(text);
        assert_eq!(parsed.remaining_text, "Great answer.\nNext question here.");
        assert_eq!(parsed.marker_phase(), Some(Phase::Phase3));
    }

    #[test]
    fn test_unknown_marker_name_kept_raw() {
        let parsed = parse_response("PHASE_COMPLETE:discovery\nHello");
        let marker = parsed.marker.unwrap();
        assert_eq!(marker.phase, None);
        assert_eq!(marker.raw_name, "discovery");
        assert_eq!(parsed.remaining_text, "Hello");
    }

    #[test]
    fn test_marker_inside_report_block_is_detected_and_stripped() {
        let text = "```markdown\n# Brand Foundation Report\nBody\nPHASE_COMPLETE:phase1\n```";
        let parsed = parse_response(text);
        assert_eq!(parsed.marker_phase(), Some(Phase::Phase1));
        assert!(!parsed.reports[0].content.contains("PHASE_COMPLETE"));
    }

    #[test]
    fn test_multiple_reports_in_order() {
        let text = format!(
            "```markdown\n# Voice & Identity Report\nBody\n```\nAnd the summary:\n```markdown\n{}```",
            complete_terminal_report()
        );
        let parsed = parse_response(&text);
        let phases: Vec<Phase> = parsed.reports.iter().map(|r| r.phase).collect();
        assert_eq!(phases, vec![Phase::Phase3, Phase::Terminal]);
        assert_eq!(parsed.remaining_text, "And the summary:");
    }

    #[test]
    fn test_links_rewritten_in_prose_only() {
        let parser = ResponseParser::new(&[PromoLink {
            phrase: "Brand Studio".to_string(),
            url: "https://studio.test".to_string(),
        }]);
        let text = "```markdown\n# Brand Foundation Report\nUse Brand Studio.\n```\nTry Brand Studio.";
        let parsed = parser.parse(text);
        assert_eq!(parsed.remaining_text, "Try [Brand Studio](https://studio.test).");
        assert!(parsed.reports[0].content.contains("Use Brand Studio."));
    }

    #[test]
    fn test_crlf_input_normalised() {
        let text = "Hi\r\nPHASE_COMPLETE:phase1\r\n\r\nBye";
        let parsed = parse_response(text);
        assert_eq!(parsed.remaining_text, "Hi\nBye");
    }
}
