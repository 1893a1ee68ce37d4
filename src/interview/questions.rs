//! The fixed question catalog.
//!
//! Nine questions, three per non-terminal phase, in contiguous blocks. Each question
//! carries detection data used by the tracker:
//! - `signatures`: phrases the assistant is instructed to use verbatim
//! - `key_phrases`: shorter distinctive fragments for paraphrased renderings
//! - `keywords`: loose vocabulary for the optional keyword-density fallback
//!
//! and a canned `example_answer` that the presentation layer may offer as a suggestion.

use crate::phase::Phase;

/// Total number of questions in the interview.
pub const TOTAL_QUESTIONS: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub index: usize,
    pub phase: Phase,
    pub prompt: &'static str,
    pub signatures: &'static [&'static str],
    pub key_phrases: &'static [&'static str],
    pub keywords: &'static [&'static str],
    pub example_answer: &'static str,
}

pub static QUESTIONS: [Question; TOTAL_QUESTIONS] = [
    Question {
        index: 0,
        phase: Phase::Phase1,
        prompt: "What problem does your brand solve, and who feels that problem most?",
        signatures: &["what problem does your brand solve"],
        key_phrases: &["problem does your brand", "problem your brand solves"],
        keywords: &["problem", "solve", "feels"],
        example_answer: "We help busy parents plan healthy weeknight dinners without spending hours on recipes and shopping lists.",
    },
    Question {
        index: 1,
        phase: Phase::Phase1,
        prompt: "Why did you start this brand? Tell me the origin story.",
        signatures: &["why did you start this brand", "tell me the origin story"],
        key_phrases: &["origin story", "why did you start"],
        keywords: &["start", "origin", "story"],
        example_answer: "I started it after years of cooking for my own family and realising how much time meal planning stole from us.",
    },
    Question {
        index: 2,
        phase: Phase::Phase1,
        prompt: "What are the three core values your brand will never compromise on?",
        signatures: &["three core values", "never compromise on"],
        key_phrases: &["core values", "values your brand"],
        keywords: &["values", "compromise", "core"],
        example_answer: "Honesty about ingredients, respect for people's time, and making healthy food feel genuinely joyful.",
    },
    Question {
        index: 3,
        phase: Phase::Phase2,
        prompt: "Describe your ideal customer in as much detail as you can.",
        signatures: &["describe your ideal customer"],
        key_phrases: &["ideal customer", "dream customer"],
        keywords: &["ideal", "customer", "describe"],
        example_answer: "A working parent in their thirties, juggling two kids, who values nutrition but has maybe twenty minutes to cook.",
    },
    Question {
        index: 4,
        phase: Phase::Phase2,
        prompt: "Who are your main competitors, and what do they do well?",
        signatures: &["who are your main competitors"],
        key_phrases: &["main competitors", "your competitors"],
        keywords: &["competitors", "competition", "well"],
        example_answer: "Meal kit services like HelloFresh do convenience well, and recipe apps win on variety, but neither plans the whole week.",
    },
    Question {
        index: 5,
        phase: Phase::Phase2,
        prompt: "What makes your brand different from everyone else in your market?",
        signatures: &["what makes your brand different"],
        key_phrases: &["makes your brand different", "sets your brand apart"],
        keywords: &["different", "market", "apart"],
        example_answer: "We plan around what is already in your fridge, so families waste less food and spend less money every week.",
    },
    Question {
        index: 6,
        phase: Phase::Phase3,
        prompt: "If your brand were a person, how would it speak?",
        signatures: &["if your brand were a person"],
        key_phrases: &["brand were a person", "brand's personality"],
        keywords: &["person", "speak", "personality"],
        example_answer: "Like a warm, slightly funny friend who happens to be a nutritionist and never makes you feel guilty.",
    },
    Question {
        index: 7,
        phase: Phase::Phase3,
        prompt: "Which three words should customers use to describe your brand?",
        signatures: &["which three words should customers"],
        key_phrases: &["three words", "words should customers use"],
        keywords: &["words", "customers", "describe"],
        example_answer: "Reliable, cheerful and clever, in that order, because trust comes before everything else for parents.",
    },
    Question {
        index: 8,
        phase: Phase::Phase3,
        prompt: "What visual style, colours or imagery feel right for your brand?",
        signatures: &["what visual style"],
        key_phrases: &["visual style", "colours or imagery", "colors or imagery"],
        keywords: &["visual", "colours", "colors", "imagery"],
        example_answer: "Bright greens and warm oranges, hand-drawn illustrations, and real photos of messy family kitchens.",
    },
];

/// All questions in interview order.
pub fn questions() -> &'static [Question] {
    &QUESTIONS
}

/// Look up a question by index.
pub fn question(index: usize) -> Option<&'static Question> {
    QUESTIONS.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_indices_match_positions() {
        for (position, question) in questions().iter().enumerate() {
            assert_eq!(question.index, position);
        }
    }

    #[test]
    fn test_catalog_phases_are_contiguous_blocks() {
        for question in questions() {
            assert_eq!(Phase::for_question(question.index), Some(question.phase));
        }
        assert_eq!(QUESTIONS[Phase::Phase2.question_range()].len(), 3);
        assert!(QUESTIONS[Phase::Terminal.question_range()].is_empty());
    }

    #[test]
    fn test_signatures_appear_in_prompts() {
        for question in questions() {
            let prompt = question.prompt.to_lowercase();
            assert!(!question.signatures.is_empty());
            assert!(
                question.signatures.iter().any(|sig| prompt.contains(sig)),
                "question {} prompt does not contain any of its signatures",
                question.index
            );
        }
    }

    #[test]
    fn test_example_answers_are_distinct_and_long() {
        for question in questions() {
            assert!(question.example_answer.len() >= 20);
            let duplicates = questions()
                .iter()
                .filter(|other| other.example_answer == question.example_answer)
                .count();
            assert_eq!(duplicates, 1);
        }
    }

    #[test]
    fn test_question_lookup() {
        assert_eq!(question(4).map(|q| q.phase), Some(Phase::Phase2));
        assert!(question(TOTAL_QUESTIONS).is_none());
    }
}
