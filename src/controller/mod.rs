//! The interview state machine.
//!
//! [`ProgressionController`] owns one interview. Each user reply goes through one
//! pipeline: post the message, run the assistant, read its output, parse it, reconcile
//! the claims in it against the tracked progress, and persist the result in a single
//! store write. The state sits behind an async mutex, so only one pipeline runs per
//! interview and message order always matches send order.
//!
//! Presentation observes the interview through [`ProgressionController::subscribe`].

pub mod reconcile;
pub mod split;
pub mod state;

pub use reconcile::{Decision, PREMATURE_COMPLETION_NOTICE, reconcile};
pub use split::{SplitReply, split_reply, strip_separator};
pub use state::{InterviewView, ProcessingStage, ProgressionState};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{debug, info, warn};

use crate::assistant::{ChatAssistant, run_output};
use crate::errors::EngineError;
use crate::interview::{fixup_request, kickoff_message, run_instructions};
use crate::message::{Message, Role};
use crate::orchestrator::{PollSchedule, RunOrchestrator};
use crate::parser::{ParsedReport, PromoLink, ResponseParser};
use crate::phase::Phase;
use crate::report::{Report, validate_terminal};
use crate::retry::{RetryPolicy, retry};
use crate::store::{DocumentStore, FieldUpdates, InterviewDocument};
use crate::tracker::{DEFAULT_MIN_REPLY_CHARS, PhaseTracker};

/// Tunables for the controller and the components it builds.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// End-to-end retry of send, run and read.
    pub retry: RetryPolicy,
    /// Retry of each single status poll.
    pub poll_retry: RetryPolicy,
    pub schedule: PollSchedule,
    pub min_reply_chars: usize,
    /// Threshold for the keyword-density fallback; `None` disables it.
    pub keyword_density: Option<f64>,
    pub links: Vec<PromoLink>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::new(3, std::time::Duration::from_secs(2)),
            poll_retry: RetryPolicy::new(3, std::time::Duration::from_millis(500)),
            schedule: PollSchedule::default(),
            min_reply_chars: DEFAULT_MIN_REPLY_CHARS,
            keyword_density: None,
            links: Vec::new(),
        }
    }
}

/// What gets posted to the thread for one exchange.
enum Outbound<'a> {
    /// A user reply, shown in the local history.
    Reply(&'a str),
    /// Engine-authored text that stays off the local history.
    Hidden(String),
}

pub struct ProgressionController {
    assistant: Arc<dyn ChatAssistant>,
    store: Arc<dyn DocumentStore>,
    orchestrator: RunOrchestrator,
    parser: ResponseParser,
    tracker: PhaseTracker,
    retry: RetryPolicy,
    state: Mutex<Option<ProgressionState>>,
    view_tx: watch::Sender<InterviewView>,
}

impl ProgressionController {
    pub fn new(
        assistant: Arc<dyn ChatAssistant>,
        store: Arc<dyn DocumentStore>,
        settings: ControllerSettings,
    ) -> Self {
        let orchestrator =
            RunOrchestrator::new(assistant.clone(), settings.schedule, settings.poll_retry);
        let (view_tx, _) = watch::channel(InterviewView::default());
        Self {
            assistant,
            store,
            orchestrator,
            parser: ResponseParser::new(&settings.links),
            tracker: PhaseTracker::new(settings.min_reply_chars, settings.keyword_density),
            retry: settings.retry,
            state: Mutex::new(None),
            view_tx,
        }
    }

    /// Observe the interview. The receiver always holds the latest view.
    pub fn subscribe(&self) -> watch::Receiver<InterviewView> {
        self.view_tx.subscribe()
    }

    /// Create a conversation and an interview document, then let the assistant open.
    /// Returns the new interview id.
    pub async fn start_interview(&self, brand_name: &str) -> Result<String, EngineError> {
        let brand_name = brand_name.trim();
        if brand_name.is_empty() {
            return Err(EngineError::Validation("brand name is empty".to_string()));
        }

        let mut guard = self.state.lock().await;
        let conversation_id = retry(self.retry, "create_conversation", |_| async {
            self.assistant
                .create_conversation()
                .await
                .map_err(EngineError::from)
        })
        .await?;

        let doc = InterviewDocument::new(brand_name, &conversation_id);
        let id = self.store.create(&doc).await?;
        info!(interview_id = %id, %conversation_id, "started interview");

        *guard = Some(ProgressionState::from_document(&id, doc, &self.tracker));
        self.kickoff_locked(&mut guard).await?;
        Ok(id)
    }

    /// Load an interview from the store and repair cached fields that disagree with
    /// its message history.
    pub async fn initialize_from_persisted(&self, id: &str) -> Result<(), EngineError> {
        let mut guard = self.state.lock().await;
        let doc = self
            .store
            .read(id)
            .await?
            .ok_or_else(|| EngineError::Validation(format!("interview {} does not exist", id)))?;
        if doc.conversation_id.trim().is_empty() {
            return Err(EngineError::Validation(format!(
                "interview {} has no conversation",
                id
            )));
        }

        let cached_count = doc.question_count;
        let mut state = ProgressionState::from_document(id, doc, &self.tracker);
        let mut updates = FieldUpdates::new();

        if cached_count != state.progress.answered_count {
            warn!(
                interview_id = %id,
                cached = cached_count,
                actual = state.progress.answered_count,
                "correcting stale question count"
            );
            updates = updates.question_count(state.progress.answered_count);
        }

        let mut advanced = false;
        while state.reports.contains_key(&state.current_phase) {
            let Some(next) = state.current_phase.next() else {
                break;
            };
            warn!(
                interview_id = %id,
                from = %state.current_phase,
                to = %next,
                "report stored without phase advance, advancing"
            );
            state.current_phase = next;
            advanced = true;
        }
        if advanced {
            updates = updates.current_phase(state.current_phase);
        }

        if !updates.is_empty() {
            self.store.update(id, updates).await?;
        }

        self.publish(&state, ProcessingStage::Idle, None);
        *guard = Some(state);
        Ok(())
    }

    /// Ask the assistant to open the interview if it has not spoken yet.
    pub async fn kickoff(&self) -> Result<(), EngineError> {
        let mut guard = self.state.lock().await;
        self.kickoff_locked(&mut guard).await
    }

    /// Send a user reply, waiting for any in-flight reply to finish first.
    pub async fn send_user_reply(&self, text: &str) -> Result<(), EngineError> {
        let mut guard = self.state.lock().await;
        self.reply_locked(&mut guard, text).await
    }

    /// Send a user reply, or fail with `Busy` if one is already being processed.
    pub async fn try_send_user_reply(&self, text: &str) -> Result<(), EngineError> {
        let mut guard = self.state.try_lock().map_err(|_| {
            EngineError::Busy(self.view_tx.borrow().conversation_id.clone())
        })?;
        self.reply_locked(&mut guard, text).await
    }

    async fn kickoff_locked(
        &self,
        guard: &mut MutexGuard<'_, Option<ProgressionState>>,
    ) -> Result<(), EngineError> {
        let state = loaded(guard)?;
        if state.messages.iter().any(|m| m.role == Role::Assistant) {
            return Ok(());
        }
        let text = kickoff_message(&state.brand_name);
        self.exchange(state, Outbound::Hidden(text)).await
    }

    async fn reply_locked(
        &self,
        guard: &mut MutexGuard<'_, Option<ProgressionState>>,
        text: &str,
    ) -> Result<(), EngineError> {
        let state = loaded(guard)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::Validation("reply is empty".to_string()));
        }
        if state.is_complete() {
            return Err(EngineError::Validation(
                "this interview is already complete".to_string(),
            ));
        }
        self.exchange(state, Outbound::Reply(text)).await
    }

    /// One full pipeline: post, run, read, reconcile, persist.
    async fn exchange(
        &self,
        state: &mut ProgressionState,
        outbound: Outbound<'_>,
    ) -> Result<(), EngineError> {
        let (text, optimistic) = match outbound {
            Outbound::Reply(text) => (text.to_string(), true),
            Outbound::Hidden(text) => (text, false),
        };

        if optimistic {
            state
                .messages
                .push(Message::user(text.as_str(), state.current_phase));
        }
        self.publish(state, ProcessingStage::Sending, None);

        let instructions = run_instructions(
            &state.brand_name,
            state.current_phase,
            self.tracker.compute_progress(&state.messages).next_question_index,
        );
        let output = self
            .round_trip(&state.conversation_id, &text, &instructions)
            .await;

        let result = match output {
            Ok(output) => self.apply_reply(state, &output).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!(
                interview_id = %state.interview_id,
                error = %e,
                "reply pipeline failed, keeping last good state"
            );
            if optimistic {
                state.messages.pop();
            }
            self.publish(state, ProcessingStage::Failed, Some(e.to_string()));
        }
        result
    }

    /// Post `text` once, run the assistant and return the run's output. Retried
    /// end-to-end; the message is never posted twice.
    async fn round_trip(
        &self,
        conversation_id: &str,
        text: &str,
        instructions: &str,
    ) -> Result<String, EngineError> {
        let posted = AtomicBool::new(false);
        retry(self.retry, "assistant round trip", |attempt| {
            self.round_trip_attempt(conversation_id, text, instructions, &posted, attempt)
        })
        .await
    }

    async fn round_trip_attempt(
        &self,
        conversation_id: &str,
        text: &str,
        instructions: &str,
        posted: &AtomicBool,
        attempt: u32,
    ) -> Result<String, EngineError> {
        if !posted.load(Ordering::SeqCst) {
            self.assistant
                .append_message(conversation_id, Role::User, text)
                .await?;
            posted.store(true, Ordering::SeqCst);
        }

        self.set_stage(ProcessingStage::Thinking);
        let summary = self
            .orchestrator
            .execute(conversation_id, instructions)
            .await?;

        let messages = self.assistant.list_messages(conversation_id).await?;
        let output = run_output(&messages, &summary.run_id);
        if output.trim().is_empty() {
            return Err(EngineError::Service(format!(
                "run {} produced no reply",
                summary.run_id
            )));
        }
        debug!(run_id = %summary.run_id, attempt, polls = summary.polls, "received reply");
        Ok(output)
    }

    /// Reconcile a reply against the state and persist the outcome in one write.
    async fn apply_reply(
        &self,
        state: &mut ProgressionState,
        output: &str,
    ) -> Result<(), EngineError> {
        self.set_stage(ProcessingStage::Parsing);
        let parsed = self.parser.parse(output);
        if parsed.has_structure() {
            info!(summary = %parsed.summary(), "parsed reply");
        } else {
            debug!(summary = %parsed.summary(), "parsed reply");
        }

        let pre_phase = state.current_phase;
        let answered = self
            .tracker
            .compute_progress(&state.messages)
            .answered_in_phase(pre_phase);
        let mut decision = reconcile(&parsed, pre_phase, answered, &state.reports);

        for report in decision.accepted.iter_mut() {
            if report.phase == Phase::Terminal {
                self.fix_terminal_report(state, report).await;
            }
        }

        let post_phase = decision.advance_to.unwrap_or(pre_phase);
        let mut new_messages = Vec::new();
        if decision.advance_to.is_some() {
            let split = split_reply(&parsed.remaining_text);
            if !split.acknowledgement.is_empty() {
                new_messages.push(Message::assistant(split.acknowledgement, pre_phase));
            }
            for report in &decision.accepted {
                new_messages.push(Message::report_ready(report.phase, pre_phase));
            }
            if !split.opener.is_empty() {
                new_messages.push(Message::assistant(split.opener, post_phase));
            }
        } else {
            let prose = strip_separator(&parsed.remaining_text);
            if !prose.is_empty() {
                new_messages.push(Message::assistant(prose, pre_phase));
            }
            for report in &decision.accepted {
                new_messages.push(Message::report_ready(report.phase, pre_phase));
            }
        }
        if decision.warn_user {
            new_messages.push(Message::notice(PREMATURE_COMPLETION_NOTICE, pre_phase));
        }

        let mut next = state.clone();
        next.messages.extend(new_messages);
        for report in &decision.accepted {
            next.reports
                .insert(report.phase, Report::new(report.phase, report.content.clone()));
        }
        next.current_phase = post_phase;
        next.progress = self.tracker.compute_progress(&next.messages);

        self.set_stage(ProcessingStage::Saving);
        let mut updates = FieldUpdates::new()
            .messages(&next.messages)?
            .question_count(next.progress.answered_count);
        for report in &decision.accepted {
            if let Some(stored) = next.reports.get(&report.phase) {
                updates = updates.report(stored)?;
            }
        }
        if post_phase != pre_phase {
            updates = updates.current_phase(post_phase);
        }
        self.store.update(&state.interview_id, updates).await?;

        if let Some(phase) = decision.completed_phase {
            info!(
                interview_id = %state.interview_id,
                completed = %phase,
                current = %post_phase,
                "phase completed"
            );
        }
        *state = next;
        self.publish(state, ProcessingStage::Idle, None);
        Ok(())
    }

    /// Validate a terminal report and, if it is malformed, ask for one corrected
    /// version. Keeps the original when the correction is missing or fails.
    async fn fix_terminal_report(&self, state: &ProgressionState, report: &mut ParsedReport) {
        let check = validate_terminal(&report.content);
        if check.is_valid() {
            return;
        }
        warn!(problems = %check.describe(), "terminal report is malformed, requesting a fix");
        self.set_stage(ProcessingStage::FixingReport);

        let instructions = run_instructions(&state.brand_name, Phase::Terminal, 0);
        let output = match self
            .round_trip(&state.conversation_id, &fixup_request(&check), &instructions)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "terminal report fix-up failed, keeping the original");
                return;
            }
        };

        let parsed = self.parser.parse(&output);
        match parsed.reports_for(Phase::Terminal).next() {
            Some(corrected) => {
                let recheck = validate_terminal(&corrected.content);
                if !recheck.is_valid() {
                    warn!(problems = %recheck.describe(), "corrected terminal report is still incomplete");
                }
                report.content = corrected.content.clone();
            }
            None => warn!("fix-up reply had no terminal report, keeping the original"),
        }
    }

    fn publish(&self, state: &ProgressionState, stage: ProcessingStage, error: Option<String>) {
        self.view_tx.send_replace(state.view(stage, error));
    }

    fn set_stage(&self, stage: ProcessingStage) {
        self.view_tx
            .send_modify(|view| view.processing_stage = stage);
    }
}

fn loaded<'a>(
    guard: &'a mut MutexGuard<'_, Option<ProgressionState>>,
) -> Result<&'a mut ProgressionState, EngineError> {
    guard
        .as_mut()
        .ok_or_else(|| EngineError::Validation("no interview is loaded".to_string()))
}
