//! Text sent to the assistant: run instructions, the kickoff message and the
//! corrective request for a malformed terminal report.

use crate::interview::questions::{TOTAL_QUESTIONS, question, questions};
use crate::phase::Phase;
use crate::report::{COMPARISON_TABLE_HEADER, REQUIRED_TERMINAL_SECTIONS, TerminalCheck};

/// Separator line the assistant puts between its acknowledgement and the next phase.
pub const NEXT_PHASE_SEPARATOR: &str = "---NEXT PHASE---";

/// Base instructions sent with every run.
pub const INTERVIEW_INSTRUCTIONS: &str = r##"You are a brand strategist conducting a structured brand interview.

Ask the questions listed below one at a time, in order, using the exact wording given.
Wait for the user's answer before moving on. Acknowledge each answer briefly and ask a
short follow-up only when the answer is vague.

The interview has three phases of three questions each, followed by a final summary.
When all questions of a phase have been answered:
- write the phase report inside a ```markdown fenced block whose first heading names it
  (for example "# Brand Foundation Report")
- put the line PHASE_COMPLETE:<phase> on its own line (phase1, phase2, phase3 or terminal)
- write the line ---NEXT PHASE--- and then open the next phase with its first question

Never declare a phase complete before all of its questions have been answered."##;

/// Build the instructions for the next run.
pub fn run_instructions(brand_name: &str, current_phase: Phase, next_question: usize) -> String {
    let mut out = String::from(INTERVIEW_INSTRUCTIONS);
    out.push_str(&format!("\n\nThe brand is \"{}\".\n", brand_name));

    for phase in Phase::ALL.iter().filter(|p| !p.is_terminal()) {
        out.push_str(&format!("\n{} ({}):\n", phase.title(), phase.key()));
        for q in questions().iter().filter(|q| q.phase == *phase) {
            out.push_str(&format!("{}. {}\n", q.index + 1, q.prompt));
        }
    }

    out.push_str(&terminal_format());

    out.push_str(&format!(
        "\nThe interview is currently in {} ({}).",
        current_phase.title(),
        current_phase.key()
    ));
    if current_phase.is_terminal() {
        out.push_str(" All questions are answered; produce the final summary.");
    } else if let Some(q) = question(next_question.min(TOTAL_QUESTIONS - 1)) {
        out.push_str(&format!(" The next question to ask is {}.", q.index + 1));
    }
    out
}

fn terminal_format() -> String {
    let mut out = format!(
        "\n{} (terminal): a single ```markdown block titled \"# {}\" with these sections:\n",
        Phase::Terminal.title(),
        Phase::Terminal.title()
    );
    for section in REQUIRED_TERMINAL_SECTIONS {
        out.push_str(&format!("## {}\n", section));
    }
    out.push_str(&format!(
        "The Competitive Comparison section must contain a table with the header:\n{}\n",
        COMPARISON_TABLE_HEADER
    ));
    out
}

/// First user-side message of a new interview.
pub fn kickoff_message(brand_name: &str) -> String {
    format!(
        "Hi! I'd like to work through the brand interview for \"{}\". Please introduce \
         yourself briefly and ask the first question.",
        brand_name
    )
}

/// Corrective request for a terminal report that failed validation.
pub fn fixup_request(check: &TerminalCheck) -> String {
    let mut out = String::from(
        "The brand strategy summary you just wrote is not in the required format. Please \
         rewrite the complete summary in a single ```markdown block.\n\nProblems found:\n",
    );
    for section in &check.missing_sections {
        out.push_str(&format!("- missing section \"## {}\"\n", section));
    }
    if check.missing_table {
        out.push_str(&format!(
            "- the Competitive Comparison section needs a table with the header {}\n",
            COMPARISON_TABLE_HEADER
        ));
    }
    out.push_str("\nInclude every required section:\n");
    for section in REQUIRED_TERMINAL_SECTIONS {
        out.push_str(&format!("## {}\n", section));
    }
    out.push_str("\nEnd your reply with the line PHASE_COMPLETE:terminal");
    out
}
