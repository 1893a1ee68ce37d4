//! Splitting a transition reply into acknowledgement and opener.

use crate::interview::NEXT_PHASE_SEPARATOR;

/// Paragraph openings that introduce the next phase.
const TRANSITION_PHRASES: &[&str] = &[
    "let's move on",
    "moving on to",
    "now let's",
    "next, we'll",
    "let's now",
    "now that we",
    "let's turn to",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReply {
    /// Closes the finished phase.
    pub acknowledgement: String,
    /// Opens the next phase.
    pub opener: String,
}

/// Split a reply at the explicit separator line, else at the first paragraph that
/// starts with a transition phrase, else before the last paragraph.
pub fn split_reply(text: &str) -> SplitReply {
    if let Some((before, after)) = split_at_separator(text) {
        return SplitReply {
            acknowledgement: before.trim().to_string(),
            opener: after.trim().to_string(),
        };
    }

    let paragraphs = paragraphs(text);
    if paragraphs.is_empty() {
        return SplitReply::default();
    }

    let at = paragraphs
        .iter()
        .position(|p| starts_with_transition(p))
        .unwrap_or(paragraphs.len() - 1);
    SplitReply {
        acknowledgement: paragraphs[..at].join("\n\n"),
        opener: paragraphs[at..].join("\n\n"),
    }
}

/// Remove separator lines from a reply that does not change phase.
pub fn strip_separator(text: &str) -> String {
    text.lines()
        .filter(|line| !is_separator(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn is_separator(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(NEXT_PHASE_SEPARATOR)
}

fn split_at_separator(text: &str) -> Option<(String, String)> {
    let lines: Vec<&str> = text.lines().collect();
    let at = lines.iter().position(|line| is_separator(line))?;
    let before = lines[..at].join("\n");
    let after = lines[at + 1..]
        .iter()
        .filter(|line| !is_separator(line))
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    Some((before, after))
}

fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current.join("\n"));
    }
    out
}

fn starts_with_transition(paragraph: &str) -> bool {
    let lower = paragraph
        .trim_start()
        .trim_start_matches(['*', '_', '#', ' '])
        .to_lowercase()
        .replace('\u{2019}', "'");
    TRANSITION_PHRASES.iter().any(|phrase| lower.starts_with(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_separator() {
        let text = "Great work on the foundation.\n\n---NEXT PHASE---\n\nDescribe your ideal customer.";
        let split = split_reply(text);
        assert_eq!(split.acknowledgement, "Great work on the foundation.");
        assert_eq!(split.opener, "Describe your ideal customer.");
    }

    #[test]
    fn test_separator_wins_over_phrases() {
        let text = "Now let's recap.\n---next phase---\nWho are your main competitors?";
        let split = split_reply(text);
        assert_eq!(split.acknowledgement, "Now let's recap.");
        assert_eq!(split.opener, "Who are your main competitors?");
    }

    #[test]
    fn test_split_on_transition_phrase() {
        let text = "Thanks, that was helpful.\n\nYour values are clear.\n\nNow let's talk about your audience.\n\nDescribe your ideal customer.";
        let split = split_reply(text);
        assert_eq!(
            split.acknowledgement,
            "Thanks, that was helpful.\n\nYour values are clear."
        );
        assert_eq!(
            split.opener,
            "Now let's talk about your audience.\n\nDescribe your ideal customer."
        );
    }

    #[test]
    fn test_transition_phrase_with_typographic_apostrophe() {
        let text = "Lovely.\n\nLet\u{2019}s move on to voice.";
        assert_eq!(split_reply(text).opener, "Let\u{2019}s move on to voice.");
    }

    #[test]
    fn test_falls_back_to_last_paragraph() {
        let text = "Great answers.\n\nWhat makes your brand different?";
        let split = split_reply(text);
        assert_eq!(split.acknowledgement, "Great answers.");
        assert_eq!(split.opener, "What makes your brand different?");
    }

    #[test]
    fn test_single_paragraph_is_opener() {
        let split = split_reply("Describe your ideal customer.");
        assert_eq!(split.acknowledgement, "");
        assert_eq!(split.opener, "Describe your ideal customer.");
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(split_reply("  \n "), SplitReply::default());
    }

    #[test]
    fn test_strip_separator() {
        assert_eq!(
            strip_separator("Almost there.\n---NEXT PHASE---\nOne more question?"),
            "Almost there.\nOne more question?"
        );
    }
}
