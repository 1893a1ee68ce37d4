//! Scripted in-memory assistant for tests.
//!
//! Each started run takes the next [`RunScript`] from the queue: the statuses that
//! successive `get_run` calls report, and the reply posted once the run completes.
//! Every call is recorded so tests can assert on ordering.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatAssistant, Run, RunFailure, RunStatus, ThreadMessage};
use crate::errors::AssistantError;
use crate::message::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Append,
    StartRun,
    GetRun,
    CancelRun,
    ListRuns,
    ListMessages,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create,
    Append { role: Role, content: String },
    StartRun { run_id: String, instructions: String },
    GetRun { run_id: String },
    CancelRun { run_id: String },
    ListRuns,
    ListMessages,
}

/// Behaviour of one run.
#[derive(Debug, Clone)]
pub struct RunScript {
    pub statuses: Vec<RunStatus>,
    pub reply: Option<String>,
}

impl RunScript {
    /// Completes on the first poll and posts `reply`.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            statuses: vec![RunStatus::Completed],
            reply: Some(text.into()),
        }
    }

    /// Reports `in_progress` for `polls` polls, then completes with `reply`.
    pub fn slow(polls: usize, text: impl Into<String>) -> Self {
        let mut statuses = vec![RunStatus::InProgress; polls];
        statuses.push(RunStatus::Completed);
        Self {
            statuses,
            reply: Some(text.into()),
        }
    }

    /// Ends with the given terminal failure status.
    pub fn ending(status: RunStatus) -> Self {
        Self {
            statuses: vec![status],
            reply: None,
        }
    }
}

#[derive(Debug)]
struct MockRun {
    id: String,
    status: RunStatus,
    pending: VecDeque<RunStatus>,
    reply: Option<String>,
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u64,
    messages: Vec<ThreadMessage>,
    runs: Vec<MockRun>,
    scripts: VecDeque<RunScript>,
    failures: HashMap<Op, VecDeque<AssistantError>>,
    calls: Vec<Call>,
}

impl MockState {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{}", prefix, self.next_id)
    }

    fn injected(&mut self, op: Op) -> Result<(), AssistantError> {
        match self.failures.get_mut(&op).and_then(|q| q.pop_front()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn snapshot(run: &MockRun) -> Run {
        Run {
            id: run.id.clone(),
            status: run.status,
            last_error: match run.status {
                RunStatus::Failed => Some(RunFailure {
                    code: Some("server_error".to_string()),
                    message: "scripted failure".to_string(),
                }),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct MockAssistant {
    state: Mutex<MockState>,
}

impl MockAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the behaviour of the next started run.
    pub fn script(&self, script: RunScript) {
        self.state.lock().unwrap().scripts.push_back(script);
    }

    /// Make the next `times` calls of `op` fail with a transient network error.
    pub fn fail_next(&self, op: Op, times: usize) {
        for _ in 0..times {
            self.fail_next_with(op, AssistantError::Network("connection reset".to_string()));
        }
    }

    pub fn fail_next_with(&self, op: Op, err: AssistantError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(op)
            .or_default()
            .push_back(err);
    }

    /// Add a run that is already active on the thread, as if left over from a
    /// previous session. Returns its id.
    pub fn seed_active_run(&self, status: RunStatus) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.id("run");
        state.runs.push(MockRun {
            id: id.clone(),
            status,
            pending: VecDeque::new(),
            reply: None,
        });
        id
    }

    /// Add a message to the thread without recording a call.
    pub fn seed_message(&self, role: Role, content: &str, run_id: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        let id = state.id("msg");
        state.messages.push(ThreadMessage {
            id,
            role,
            content: content.to_string(),
            run_id: run_id.map(String::from),
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| matches(c)).count()
    }

    /// Contents of user messages appended through the trait, in order.
    pub fn appended(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Append { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn run_status(&self, run_id: &str) -> Option<RunStatus> {
        let state = self.state.lock().unwrap();
        state.runs.iter().find(|r| r.id == run_id).map(|r| r.status)
    }
}

#[async_trait]
impl ChatAssistant for MockAssistant {
    async fn create_conversation(&self) -> Result<String, AssistantError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create);
        state.injected(Op::Create)?;
        Ok(state.id("thread"))
    }

    async fn append_message(
        &self,
        _conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<String, AssistantError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Append {
            role,
            content: content.to_string(),
        });
        state.injected(Op::Append)?;
        let id = state.id("msg");
        state.messages.push(ThreadMessage {
            id: id.clone(),
            role,
            content: content.to_string(),
            run_id: None,
        });
        Ok(id)
    }

    async fn start_run(
        &self,
        _conversation_id: &str,
        instructions: &str,
    ) -> Result<Run, AssistantError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.injected(Op::StartRun)?;
        let id = state.id("run");
        state.calls.push(Call::StartRun {
            run_id: id.clone(),
            instructions: instructions.to_string(),
        });
        let script = state
            .scripts
            .pop_front()
            .unwrap_or_else(|| RunScript::reply("Thanks, let's keep going."));
        let run = MockRun {
            id,
            status: RunStatus::Queued,
            pending: script.statuses.into(),
            reply: script.reply,
        };
        let snapshot = MockState::snapshot(&run);
        state.runs.push(run);
        Ok(snapshot)
    }

    async fn get_run(&self, _conversation_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::GetRun {
            run_id: run_id.to_string(),
        });
        state.injected(Op::GetRun)?;

        let idx = state
            .runs
            .iter()
            .position(|r| r.id == run_id)
            .ok_or_else(|| AssistantError::Service {
                status: Some(404),
                message: format!("No run found with id '{}'", run_id),
            })?;
        if let Some(next) = state.runs[idx].pending.pop_front() {
            state.runs[idx].status = next;
        }
        let run = &state.runs[idx];
        let snapshot = MockState::snapshot(run);
        let delivery = match (run.status, &run.reply) {
            (RunStatus::Completed, Some(reply)) => Some((run.id.clone(), reply.clone())),
            _ => None,
        };
        if let Some((id, reply)) = delivery {
            state.runs[idx].reply = None;
            let msg_id = state.id("msg");
            state.messages.push(ThreadMessage {
                id: msg_id,
                role: Role::Assistant,
                content: reply,
                run_id: Some(id),
            });
        }
        Ok(snapshot)
    }

    async fn cancel_run(&self, _conversation_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CancelRun {
            run_id: run_id.to_string(),
        });
        state.injected(Op::CancelRun)?;
        let run = state
            .runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or_else(|| AssistantError::Service {
                status: Some(404),
                message: format!("No run found with id '{}'", run_id),
            })?;
        if run.status.is_terminal() {
            return Err(AssistantError::Service {
                status: Some(400),
                message: format!("Cannot cancel run with status '{}'", run.status),
            });
        }
        run.status = RunStatus::Cancelling;
        run.pending = VecDeque::from([RunStatus::Cancelling, RunStatus::Cancelled]);
        run.reply = None;
        Ok(MockState::snapshot(run))
    }

    async fn list_runs(&self, _conversation_id: &str) -> Result<Vec<Run>, AssistantError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListRuns);
        state.injected(Op::ListRuns)?;
        Ok(state.runs.iter().rev().map(MockState::snapshot).collect())
    }

    async fn list_messages(
        &self,
        _conversation_id: &str,
    ) -> Result<Vec<ThreadMessage>, AssistantError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListMessages);
        state.injected(Op::ListMessages)?;
        Ok(state.messages.iter().rev().cloned().collect())
    }
}
