//! Deciding what a parsed reply is allowed to change.
//!
//! The assistant's completion marker and report blocks are claims. They are checked
//! against the locally computed answer count before anything is accepted:
//!
//! - a marker for the current phase with too few answers is rejected and the user is told
//! - a current-phase report is accepted only when the phase's questions are answered,
//!   and accepting it advances the phase one step
//! - a report for an earlier phase is stored if that phase has none yet, without advancing
//! - a report for a later phase is dropped

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::parser::{ParsedReport, ParsedResponse};
use crate::phase::Phase;
use crate::report::Report;

/// Notice shown when the assistant tries to close a phase too early.
pub const PREMATURE_COMPLETION_NOTICE: &str =
    "We still have a few more things to cover first before wrapping up this phase.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decision {
    /// Reports to persist, in phase order.
    pub accepted: Vec<ParsedReport>,
    /// Set when the current phase's report was accepted.
    pub completed_phase: Option<Phase>,
    /// Phase to move to; `None` when nothing advances or the terminal phase completed.
    pub advance_to: Option<Phase>,
    pub marker_rejected: bool,
    /// Whether the user should see [`PREMATURE_COMPLETION_NOTICE`].
    pub warn_user: bool,
    pub discarded: usize,
}

/// Decide which reports to accept and whether the phase advances.
///
/// `answered_in_current` must be computed on the history before this reply, including
/// the user message that triggered it.
pub fn reconcile(
    parsed: &ParsedResponse,
    current: Phase,
    answered_in_current: usize,
    stored: &BTreeMap<Phase, Report>,
) -> Decision {
    let mut decision = Decision::default();
    let required = current.required_answers();
    let under_answered = answered_in_current < required;

    if under_answered && parsed.marker_phase() == Some(current) {
        warn!(
            phase = %current,
            answered = answered_in_current,
            required,
            "discarding premature completion marker"
        );
        decision.marker_rejected = true;
        decision.warn_user = true;
    }

    let mut reports: Vec<&ParsedReport> = parsed.reports.iter().collect();
    reports.sort_by_key(|r| r.phase);

    for report in reports {
        let already_accepted = decision.accepted.iter().any(|a| a.phase == report.phase);
        match report.phase.cmp(&current) {
            Ordering::Less => {
                if stored.contains_key(&report.phase) || already_accepted {
                    debug!(phase = %report.phase, "ignoring report for a phase that already has one");
                    decision.discarded += 1;
                } else {
                    info!(phase = %report.phase, "storing late report for an earlier phase");
                    decision.accepted.push(report.clone());
                }
            }
            Ordering::Equal => {
                if under_answered {
                    warn!(
                        phase = %current,
                        answered = answered_in_current,
                        required,
                        "discarding report for a phase that is not finished"
                    );
                    decision.discarded += 1;
                    decision.warn_user = true;
                } else if already_accepted {
                    debug!(phase = %current, "ignoring duplicate report");
                    decision.discarded += 1;
                } else {
                    info!(phase = %current, "accepting phase report");
                    decision.accepted.push(report.clone());
                    decision.completed_phase = Some(current);
                    decision.advance_to = current.next();
                }
            }
            Ordering::Greater => {
                warn!(
                    phase = %report.phase,
                    current = %current,
                    "discarding report for a later phase"
                );
                decision.discarded += 1;
            }
        }
    }

    if decision.completed_phase.is_none()
        && !decision.marker_rejected
        && parsed.marker_phase() == Some(current)
    {
        debug!(phase = %current, "completion marker without a report, phase stays");
    }

    decision
}
