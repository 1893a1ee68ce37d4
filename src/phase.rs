//! Interview phase definitions.
//!
//! The interview walks a closed, ordered set of phases:
//!
//! ```text
//! phase1 (Brand Foundation) -> phase2 (Audience & Market) -> phase3 (Voice & Identity) -> terminal
//! ```
//!
//! Each non-terminal phase bundles three questions and produces one report. The
//! terminal phase produces the brand strategy summary and has no successor.

use serde::{Deserialize, Serialize};

/// Number of questions asked in each non-terminal phase.
pub const QUESTIONS_PER_PHASE: usize = 3;

/// One stage of the interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Phase1,
    Phase2,
    Phase3,
    Terminal,
}

impl Phase {
    /// All phases in interview order.
    pub const ALL: [Phase; 4] = [Phase::Phase1, Phase::Phase2, Phase::Phase3, Phase::Terminal];

    /// Storage key, also used in `reports.<key>` field paths.
    pub fn key(self) -> &'static str {
        match self {
            Phase::Phase1 => "phase1",
            Phase::Phase2 => "phase2",
            Phase::Phase3 => "phase3",
            Phase::Terminal => "terminal",
        }
    }

    /// Human-readable title.
    pub fn title(self) -> &'static str {
        match self {
            Phase::Phase1 => "Brand Foundation",
            Phase::Phase2 => "Audience & Market",
            Phase::Phase3 => "Voice & Identity",
            Phase::Terminal => "Brand Strategy Summary",
        }
    }

    /// Zero-based position in the ordering.
    pub fn ordinal(self) -> usize {
        match self {
            Phase::Phase1 => 0,
            Phase::Phase2 => 1,
            Phase::Phase3 => 2,
            Phase::Terminal => 3,
        }
    }

    /// The following phase, or `None` for the terminal phase.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Phase1 => Some(Phase::Phase2),
            Phase::Phase2 => Some(Phase::Phase3),
            Phase::Phase3 => Some(Phase::Terminal),
            Phase::Terminal => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Terminal
    }

    /// Questions that must be answered before this phase's report is accepted.
    pub fn required_answers(self) -> usize {
        if self.is_terminal() {
            0
        } else {
            QUESTIONS_PER_PHASE
        }
    }

    /// Range of question indices owned by this phase (empty for terminal).
    pub fn question_range(self) -> std::ops::Range<usize> {
        if self.is_terminal() {
            return 0..0;
        }
        let start = self.ordinal() * QUESTIONS_PER_PHASE;
        start..start + QUESTIONS_PER_PHASE
    }

    /// Phase that owns a question index.
    pub fn for_question(index: usize) -> Option<Phase> {
        Phase::ALL
            .iter()
            .copied()
            .find(|phase| phase.question_range().contains(&index))
    }

    /// Parse a phase name as the assistant writes it in completion markers.
    ///
    /// Accepts `phase1`..`phase3`, `terminal`, `final`, and `phase4` as an alias of
    /// the terminal phase, in any case and with optional `_`/`-`/space separators.
    pub fn from_marker_name(name: &str) -> Option<Phase> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "phase1" => Some(Phase::Phase1),
            "phase2" => Some(Phase::Phase2),
            "phase3" => Some(Phase::Phase3),
            "phase4" | "terminal" | "final" => Some(Phase::Terminal),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for Phase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::from_marker_name(s).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid phase '{}'. Valid values: phase1, phase2, phase3, terminal",
                s
            )
        })
    }
}
