//! Question progress derived from conversation history.
//!
//! The history is the only source of truth: [`PhaseTracker::compute_progress`] walks it
//! once, recognises which assistant messages ask which catalog question, and counts a
//! question as answered when the next spoken message is a substantive user reply.
//!
//! Each assistant message matches at most one question, and matching consumes that
//! question: a later message can never match it again, whether or not the reply to it
//! was substantive.

pub mod matcher;

use tracing::debug;

use crate::interview::{TOTAL_QUESTIONS, questions};
use crate::message::{Message, Role};
use crate::phase::Phase;

pub use matcher::{ExactSignature, KeyPhrase, KeywordDensity, MatchStrategy, StrategyChain};

/// Default minimum length (in characters, after trimming) of a substantive reply.
pub const DEFAULT_MIN_REPLY_CHARS: usize = 20;

/// Answer state of the question catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: [bool; TOTAL_QUESTIONS],
    pub answered_count: usize,
    pub next_question_index: usize,
}

impl Progress {
    fn from_flags(answered: [bool; TOTAL_QUESTIONS]) -> Self {
        let answered_count = answered.iter().filter(|a| **a).count();
        Self {
            answered,
            answered_count,
            next_question_index: answered_count.min(TOTAL_QUESTIONS - 1),
        }
    }

    /// Number of answered questions that belong to `phase`.
    pub fn answered_in_phase(&self, phase: Phase) -> usize {
        self.answered[phase.question_range()]
            .iter()
            .filter(|a| **a)
            .count()
    }

    /// Whether every question has been answered.
    pub fn is_complete(&self) -> bool {
        self.answered_count == TOTAL_QUESTIONS
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::from_flags([false; TOTAL_QUESTIONS])
    }
}

pub struct PhaseTracker {
    chain: StrategyChain,
    min_reply_chars: usize,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_REPLY_CHARS, None)
    }
}

impl PhaseTracker {
    /// Create a tracker. `keyword_density` enables the keyword fallback strategy with
    /// the given threshold.
    pub fn new(min_reply_chars: usize, keyword_density: Option<f64>) -> Self {
        let chain = match keyword_density {
            Some(threshold) => StrategyChain::lenient(threshold),
            None => StrategyChain::strict(),
        };
        Self::with_chain(chain, min_reply_chars)
    }

    pub fn with_chain(chain: StrategyChain, min_reply_chars: usize) -> Self {
        Self {
            chain,
            min_reply_chars,
        }
    }

    /// Compute which questions the history shows as answered.
    pub fn compute_progress(&self, history: &[Message]) -> Progress {
        let spoken: Vec<&Message> = history.iter().filter(|m| m.is_spoken()).collect();
        let mut answered = [false; TOTAL_QUESTIONS];
        let mut consumed = [false; TOTAL_QUESTIONS];

        for (position, message) in spoken.iter().enumerate() {
            if message.role != Role::Assistant {
                continue;
            }
            let candidates: Vec<_> = questions().iter().filter(|q| !consumed[q.index]).collect();
            let Some((question, strategy)) = self.chain.find(&candidates, &message.content)
            else {
                continue;
            };
            consumed[question.index] = true;

            match spoken.get(position + 1) {
                Some(reply)
                    if reply.role == Role::User
                        && self.is_substantive(&reply.content, question.index) =>
                {
                    answered[question.index] = true;
                }
                Some(reply) if reply.role == Role::User => {
                    debug!(
                        question = question.index,
                        strategy, "reply not substantive, question consumed unanswered"
                    );
                }
                _ => {}
            }
        }

        Progress::from_flags(answered)
    }

    /// Answered questions of `phase` in `history`.
    pub fn answered_in_phase(&self, history: &[Message], phase: Phase) -> usize {
        self.compute_progress(history).answered_in_phase(phase)
    }

    /// Whether `reply` counts as an answer to the question at `expected_index`.
    ///
    /// Short replies never count. A reply identical to another question's example
    /// answer does not count either; the expected question's own example does.
    pub fn is_substantive(&self, reply: &str, expected_index: usize) -> bool {
        let reply = reply.trim();
        if reply.chars().count() < self.min_reply_chars {
            return false;
        }
        !questions()
            .iter()
            .any(|q| q.index != expected_index && q.example_answer == reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::question;

    const REPLIES: [&str; 9] = [
        "We make budgeting painless for freelancers with irregular income.",
        "My co-founder and I kept missing tax deadlines and built a fix.",
        "Clarity, fairness, and never hiding fees from anyone we serve.",
        "Independent designers aged 25 to 40 who invoice several clients.",
        "Big accounting suites do reporting well but overwhelm solo workers.",
        "We forecast cash flow from past invoices instead of fixed salaries.",
        "Calm and plain spoken, like a patient friend who knows numbers.",
        "Trustworthy, calm, and quietly clever in everything we ship.",
        "Soft blues, generous white space, and simple line illustrations.",
    ];

    fn ask(index: usize) -> Message {
        let q = question(index).unwrap();
        Message::assistant(format!("Thanks! {}", q.prompt), q.phase)
    }

    fn answer(index: usize, text: &str) -> Message {
        Message::user(text, question(index).unwrap().phase)
    }

    fn full_history() -> Vec<Message> {
        let mut history = vec![Message::assistant("Welcome to your brand interview.", Phase::Phase1)];
        for (index, reply) in REPLIES.iter().enumerate() {
            history.push(ask(index));
            history.push(answer(index, reply));
        }
        history
    }

    #[test]
    fn test_empty_history() {
        let progress = PhaseTracker::default().compute_progress(&[]);
        assert_eq!(progress.answered_count, 0);
        assert_eq!(progress.next_question_index, 0);
    }

    #[test]
    fn test_full_history_answers_everything() {
        let progress = PhaseTracker::default().compute_progress(&full_history());
        assert_eq!(progress.answered_count, 9);
        assert!(progress.is_complete());
        assert_eq!(progress.next_question_index, 8);
        assert_eq!(progress.answered_in_phase(Phase::Phase2), 3);
        assert_eq!(progress.answered_in_phase(Phase::Terminal), 0);
    }

    #[test]
    fn test_answered_count_is_monotone_over_prefixes() {
        let tracker = PhaseTracker::default();
        let mut history = full_history();
        // Noise that must never reduce the count.
        history.insert(5, Message::user("ok", Phase::Phase1));
        history.insert(9, Message::notice("We still have a few more things.", Phase::Phase1));
        history.push(ask(0));
        history.push(Message::user("short", Phase::Phase3));

        let mut previous = 0;
        for end in 0..=history.len() {
            let count = tracker.compute_progress(&history[..end]).answered_count;
            assert!(count >= previous, "count dropped at prefix {end}");
            assert!(count <= TOTAL_QUESTIONS);
            previous = count;
        }
    }

    #[test]
    fn test_short_reply_is_not_an_answer() {
        let history = vec![ask(0), answer(0, "Not sure yet.")];
        let progress = PhaseTracker::default().compute_progress(&history);
        assert_eq!(progress.answered_count, 0);
    }

    #[test]
    fn test_matched_question_is_consumed_even_when_unanswered() {
        let history = vec![
            ask(0),
            answer(0, "Not sure yet."),
            ask(0),
            answer(0, REPLIES[0]),
        ];
        let progress = PhaseTracker::default().compute_progress(&history);
        assert!(!progress.answered[0]);
        assert_eq!(progress.answered_count, 0);
    }

    #[test]
    fn test_consumed_question_cannot_claim_a_later_reply() {
        let history = vec![
            ask(0),
            answer(0, REPLIES[0]),
            ask(1),
            answer(1, REPLIES[1]),
            ask(2),
            answer(2, "not sure"),
            Message::assistant(
                "No problem, we can return to your core values. Tell me about your dream customer.",
                Phase::Phase1,
            ),
            answer(3, REPLIES[3]),
        ];
        let progress = PhaseTracker::default().compute_progress(&history);
        assert_eq!(progress.answered_in_phase(Phase::Phase1), 2);
        assert!(!progress.answered[2]);
        assert!(progress.answered[3]);
    }

    #[test]
    fn test_answered_question_is_not_matched_twice() {
        let history = vec![
            ask(0),
            answer(0, REPLIES[0]),
            ask(0),
            answer(0, REPLIES[1]),
        ];
        let progress = PhaseTracker::default().compute_progress(&history);
        assert_eq!(progress.answered_count, 1);
    }

    #[test]
    fn test_one_message_matches_one_question() {
        let q0 = question(0).unwrap();
        let q1 = question(1).unwrap();
        let history = vec![
            Message::assistant(format!("{} {}", q0.prompt, q1.prompt), Phase::Phase1),
            answer(0, REPLIES[0]),
        ];
        let progress = PhaseTracker::default().compute_progress(&history);
        assert_eq!(progress.answered, {
            let mut flags = [false; TOTAL_QUESTIONS];
            flags[0] = true;
            flags
        });
    }

    #[test]
    fn test_report_ready_and_notice_are_skipped() {
        let history = vec![
            ask(2),
            Message::notice("Heads up.", Phase::Phase1),
            Message::report_ready(Phase::Phase1, Phase::Phase1),
            answer(2, REPLIES[2]),
        ];
        let progress = PhaseTracker::default().compute_progress(&history);
        assert!(progress.answered[2]);
    }

    #[test]
    fn test_assistant_follow_up_breaks_the_answer() {
        let history = vec![
            ask(0),
            Message::assistant("Take your time.", Phase::Phase1),
            answer(0, REPLIES[0]),
        ];
        let progress = PhaseTracker::default().compute_progress(&history);
        assert_eq!(progress.answered_count, 0);
    }

    #[test]
    fn test_is_substantive_rules() {
        let tracker = PhaseTracker::default();
        assert!(!tracker.is_substantive("   yes   ", 0));
        assert!(!tracker.is_substantive("nineteen characters", 0));
        assert!(tracker.is_substantive("twenty characters!!!", 0));

        let own = question(2).unwrap().example_answer;
        let foreign = question(5).unwrap().example_answer;
        assert!(tracker.is_substantive(own, 2));
        assert!(!tracker.is_substantive(foreign, 2));
        assert!(!tracker.is_substantive(&format!("  {foreign}\n"), 2));
        assert!(tracker.is_substantive(foreign, 5));
    }

    #[test]
    fn test_is_substantive_is_deterministic() {
        let tracker = PhaseTracker::default();
        let foreign = question(5).unwrap().example_answer;
        let first = tracker.is_substantive(foreign, 2);
        for _ in 0..5 {
            assert_eq!(tracker.is_substantive(foreign, 2), first);
        }
    }

    #[test]
    fn test_canned_answer_for_other_question_blocks_phase() {
        let history = vec![
            ask(0),
            answer(0, REPLIES[0]),
            ask(1),
            answer(1, REPLIES[1]),
            ask(2),
            answer(2, question(5).unwrap().example_answer),
        ];
        let tracker = PhaseTracker::default();
        assert_eq!(tracker.answered_in_phase(&history, Phase::Phase1), 2);
        assert_eq!(tracker.compute_progress(&history).next_question_index, 2);
    }

    #[test]
    fn test_custom_min_reply_chars() {
        let tracker = PhaseTracker::new(5, None);
        let history = vec![ask(0), answer(0, "Taxes")];
        assert_eq!(tracker.compute_progress(&history).answered_count, 1);
    }

    #[test]
    fn test_keyword_density_fallback_is_opt_in() {
        let history = vec![
            Message::assistant(
                "Picture your packaging: what visual colours and imagery come to mind?",
                Phase::Phase3,
            ),
            answer(8, REPLIES[8]),
        ];
        assert_eq!(
            PhaseTracker::default().compute_progress(&history).answered_count,
            0
        );
        let lenient = PhaseTracker::new(DEFAULT_MIN_REPLY_CHARS, Some(0.5));
        assert!(lenient.compute_progress(&history).answered[8]);
    }
}
