//! Run orchestration: start runs on the assistant service and poll them to a terminal
//! status, cancelling stale runs first so no two runs overlap on one thread.

pub mod runner;
pub mod schedule;

pub use runner::{RunHandle, RunOrchestrator, RunSummary};
pub use schedule::PollSchedule;
