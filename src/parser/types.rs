//! Types produced by the response parser.

use serde::{Deserialize, Serialize};

use crate::phase::Phase;

/// How a report's phase was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// The report names its phase explicitly (e.g. "Brand Foundation Report").
    PhasePhrase,
    /// The report contains content only the terminal summary carries.
    TerminalPhrase,
    /// Nothing in the report identified it; the completion marker's phase was used.
    Marker,
}

/// A fenced report block that was extracted and classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReport {
    pub phase: Phase,
    pub content: String,
    pub classified_by: Classification,
}

/// An out-of-band `PHASE_COMPLETE:<name>` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMarker {
    /// The phase named by the marker, if the name was recognised.
    pub phase: Option<Phase>,
    /// The name exactly as written.
    pub raw_name: String,
}

/// Everything extracted from one assistant reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResponse {
    /// Accepted report blocks in the order they appeared.
    pub reports: Vec<ParsedReport>,
    /// The first completion marker found, if any.
    pub marker: Option<CompletionMarker>,
    /// Conversational prose with report blocks and marker lines removed.
    pub remaining_text: String,
    /// Report-tagged blocks that could not be classified and were dropped.
    pub discarded_reports: usize,
}

impl ParsedResponse {
    /// The phase named by the completion marker, if recognised.
    pub fn marker_phase(&self) -> Option<Phase> {
        self.marker.as_ref().and_then(|m| m.phase)
    }

    /// Reports classified to the given phase.
    pub fn reports_for(&self, phase: Phase) -> impl Iterator<Item = &ParsedReport> {
        self.reports.iter().filter(move |r| r.phase == phase)
    }

    /// Whether the reply carried anything beyond conversational text.
    pub fn has_structure(&self) -> bool {
        !self.reports.is_empty() || self.marker.is_some()
    }

    /// Get a summary string for logging.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(marker) = &self.marker {
            parts.push(format!("marker {}", marker.raw_name));
        }

        let report_count = self.reports.len();
        if report_count > 0 {
            let phases: Vec<&str> = self.reports.iter().map(|r| r.phase.key()).collect();
            parts.push(format!(
                "{} report{} ({})",
                report_count,
                if report_count == 1 { "" } else { "s" },
                phases.join(", ")
            ));
        }

        if self.discarded_reports > 0 {
            parts.push(format!("{} discarded", self.discarded_reports));
        }

        if parts.is_empty() {
            "plain text".to_string()
        } else {
            parts.join(", ")
        }
    }
}
