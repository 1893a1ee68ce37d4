//! Strategies for recognising which question an assistant message asks.
//!
//! Strategies are tried in priority order by a [`StrategyChain`]. The first strategy
//! that recognises any still-unmatched question decides the match, so a strict
//! strategy always wins over a looser one for the same message.

use crate::interview::Question;

/// A way of deciding whether an assistant message renders a question.
///
/// `text` is the message content already lowercased.
pub trait MatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn matches(&self, question: &Question, text: &str) -> bool;
}

/// The message contains one of the question's verbatim signatures.
pub struct ExactSignature;

impl MatchStrategy for ExactSignature {
    fn name(&self) -> &'static str {
        "exact_signature"
    }

    fn matches(&self, question: &Question, text: &str) -> bool {
        question
            .signatures
            .iter()
            .any(|sig| text.contains(&sig.to_lowercase()))
    }
}

/// The message contains one of the question's shorter key phrases.
pub struct KeyPhrase;

impl MatchStrategy for KeyPhrase {
    fn name(&self) -> &'static str {
        "key_phrase"
    }

    fn matches(&self, question: &Question, text: &str) -> bool {
        question
            .key_phrases
            .iter()
            .any(|phrase| text.contains(&phrase.to_lowercase()))
    }
}

/// Enough of the question's keywords appear, and the message asks something.
pub struct KeywordDensity {
    /// Fraction of keywords (0.0-1.0) that must be present.
    pub threshold: f64,
}

impl MatchStrategy for KeywordDensity {
    fn name(&self) -> &'static str {
        "keyword_density"
    }

    fn matches(&self, question: &Question, text: &str) -> bool {
        if question.keywords.is_empty() || !text.contains('?') {
            return false;
        }
        let hits = question
            .keywords
            .iter()
            .filter(|kw| text.contains(&kw.to_lowercase()))
            .count();
        hits as f64 / question.keywords.len() as f64 >= self.threshold
    }
}

/// Ordered list of strategies.
pub struct StrategyChain {
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn MatchStrategy>>) -> Self {
        Self { strategies }
    }

    /// Signature, then key phrase.
    pub fn strict() -> Self {
        Self::new(vec![Box::new(ExactSignature), Box::new(KeyPhrase)])
    }

    /// Strict chain followed by keyword density.
    pub fn lenient(threshold: f64) -> Self {
        Self::new(vec![
            Box::new(ExactSignature),
            Box::new(KeyPhrase),
            Box::new(KeywordDensity { threshold }),
        ])
    }

    /// Find the first question among `candidates` (in the order given) recognised in
    /// `text`, trying each strategy in priority order.
    pub fn find<'q>(
        &self,
        candidates: &[&'q Question],
        text: &str,
    ) -> Option<(&'q Question, &'static str)> {
        let lower = text.to_lowercase();
        self.strategies.iter().find_map(|strategy| {
            candidates
                .iter()
                .find(|q| strategy.matches(q, &lower))
                .map(|q| (*q, strategy.name()))
        })
    }
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::strict()
    }
}
