//! Rewrites promotional phrases into inline markdown links.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::LazyLock;

/// Existing inline links and bare URLs.
static PROTECTED_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\[\]]*\]\([^()\s]*\)|https?://[^\s()\[\]<>]+").unwrap()
});

/// A phrase that should link to a URL wherever the assistant mentions it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoLink {
    pub phrase: String,
    pub url: String,
}

/// Compiled set of promotional links.
#[derive(Debug, Clone, Default)]
pub struct LinkRewriter {
    rules: Vec<(Regex, String)>,
}

impl LinkRewriter {
    pub fn new(links: &[PromoLink]) -> Self {
        let rules = links
            .iter()
            .filter(|link| !link.phrase.trim().is_empty())
            .filter_map(|link| {
                let phrase = link.phrase.trim();
                let mut pattern = String::from("(?i)");
                if phrase.starts_with(|c: char| c.is_alphanumeric()) {
                    pattern.push_str(r"\b");
                }
                pattern.push_str(&regex::escape(phrase));
                if phrase.ends_with(|c: char| c.is_alphanumeric()) {
                    pattern.push_str(r"\b");
                }
                match Regex::new(&pattern) {
                    Ok(re) => Some((re, link.url.clone())),
                    Err(e) => {
                        tracing::warn!(phrase, error = %e, "skipping promotional link");
                        None
                    }
                }
            })
            .collect();
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Replace every unlinked occurrence of each phrase with `[original text](url)`.
    ///
    /// All phrases are matched against the original text in one pass. Where matches
    /// overlap, the leftmost wins, then the longest, then the earlier rule. Matching
    /// is case-insensitive and keeps the text's own casing. Occurrences inside an
    /// existing markdown link (text or URL) or a bare URL are left alone.
    pub fn rewrite(&self, text: &str) -> String {
        if self.rules.is_empty() {
            return text.to_string();
        }
        let protected: Vec<Range<usize>> =
            PROTECTED_SPAN.find_iter(text).map(|m| m.range()).collect();

        let mut hits: Vec<(Range<usize>, &str)> = self
            .rules
            .iter()
            .flat_map(|(re, url)| re.find_iter(text).map(move |m| (m.range(), url.as_str())))
            .collect();
        hits.sort_by(|a, b| a.0.start.cmp(&b.0.start).then(b.0.end.cmp(&a.0.end)));

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for (range, url) in hits {
            if range.start < last || protected.iter().any(|p| overlaps(p, &range)) {
                continue;
            }
            out.push_str(&text[last..range.start]);
            out.push('[');
            out.push_str(&text[range.clone()]);
            out.push_str("](");
            out.push_str(url);
            out.push(')');
            last = range.end;
        }
        out.push_str(&text[last..]);
        out
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}
