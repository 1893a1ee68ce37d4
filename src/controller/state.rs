//! The controller's state value and the view published to presentation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::interview::question;
use crate::message::Message;
use crate::phase::Phase;
use crate::report::Report;
use crate::store::InterviewDocument;
use crate::tracker::{PhaseTracker, Progress};

/// What the engine is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    #[default]
    Idle,
    Sending,
    Thinking,
    Parsing,
    FixingReport,
    Saving,
    Failed,
}

impl ProcessingStage {
    pub fn is_busy(self) -> bool {
        !matches!(self, ProcessingStage::Idle | ProcessingStage::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            ProcessingStage::Idle => "Ready",
            ProcessingStage::Sending => "Sending your answer...",
            ProcessingStage::Thinking => "Thinking...",
            ProcessingStage::Parsing => "Reading the reply...",
            ProcessingStage::FixingReport => "Tidying up the final report...",
            ProcessingStage::Saving => "Saving...",
            ProcessingStage::Failed => "Something went wrong",
        }
    }
}

/// Observable snapshot of the interview.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InterviewView {
    pub interview_id: String,
    pub conversation_id: String,
    pub brand_name: String,
    pub messages: Vec<Message>,
    pub current_phase: Phase,
    pub question_count: usize,
    pub suggested_answer: Option<String>,
    pub processing_stage: ProcessingStage,
    pub last_error: Option<String>,
    /// Set once the terminal report has been accepted.
    pub complete: bool,
}

/// Everything the controller knows about one interview.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionState {
    pub interview_id: String,
    pub brand_name: String,
    pub conversation_id: String,
    pub current_phase: Phase,
    pub messages: Vec<Message>,
    pub reports: BTreeMap<Phase, Report>,
    pub progress: Progress,
}

impl ProgressionState {
    pub fn from_document(id: &str, doc: InterviewDocument, tracker: &PhaseTracker) -> Self {
        let progress = tracker.compute_progress(&doc.messages);
        Self {
            interview_id: id.to_string(),
            brand_name: doc.brand_name,
            conversation_id: doc.conversation_id,
            current_phase: doc.current_phase,
            messages: doc.messages,
            reports: doc.reports,
            progress,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.reports.contains_key(&Phase::Terminal)
    }

    /// Example answer for the question the user is expected to answer next.
    pub fn suggested_answer(&self) -> Option<String> {
        if self.current_phase.is_terminal() || self.progress.is_complete() {
            return None;
        }
        question(self.progress.next_question_index).map(|q| q.example_answer.to_string())
    }

    pub fn view(&self, stage: ProcessingStage, last_error: Option<String>) -> InterviewView {
        InterviewView {
            interview_id: self.interview_id.clone(),
            conversation_id: self.conversation_id.clone(),
            brand_name: self.brand_name.clone(),
            messages: self.messages.clone(),
            current_phase: self.current_phase,
            question_count: self.progress.answered_count,
            suggested_answer: self.suggested_answer(),
            processing_stage: stage,
            last_error,
            complete: self.is_complete(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state_suggests_first_answer() {
        let doc = InterviewDocument::new("Acme", "thread_1");
        let state = ProgressionState::from_document("id", doc, &PhaseTracker::default());
        let view = state.view(ProcessingStage::Idle, None);
        assert_eq!(view.question_count, 0);
        assert_eq!(
            view.suggested_answer.as_deref(),
            question(0).map(|q| q.example_answer)
        );
        assert!(!view.complete);
    }

    #[test]
    fn test_terminal_state_has_no_suggestion() {
        let mut doc = InterviewDocument::new("Acme", "thread_1");
        doc.current_phase = Phase::Terminal;
        let state = ProgressionState::from_document("id", doc, &PhaseTracker::default());
        assert!(state.suggested_answer().is_none());
    }

    #[test]
    fn test_stage_busy() {
        assert!(ProcessingStage::Thinking.is_busy());
        assert!(!ProcessingStage::Idle.is_busy());
        assert!(!ProcessingStage::Failed.is_busy());
    }
}
