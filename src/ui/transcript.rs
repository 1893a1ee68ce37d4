//! Rendering interview messages for the terminal.

use console::style;
use terminal_size::{Width, terminal_size};

use crate::interview::TOTAL_QUESTIONS;
use crate::message::{Message, MessageKind, Role};
use crate::phase::Phase;
use crate::ui::icons::{ASSISTANT, REPORT, USER, WARN};

const MIN_WIDTH: usize = 40;
const MAX_WIDTH: usize = 100;
const INDENT: &str = "   ";

/// Text width for wrapped messages, from the terminal size when available.
pub fn wrap_width() -> usize {
    terminal_size()
        .map(|(Width(w), _)| w as usize)
        .unwrap_or(80)
        .clamp(MIN_WIDTH, MAX_WIDTH)
}

fn wrap(text: &str, width: usize) -> String {
    let options = textwrap::Options::new(width.saturating_sub(INDENT.len()).max(20))
        .initial_indent(INDENT)
        .subsequent_indent(INDENT);
    textwrap::fill(text, options)
}

/// One message as a labelled, wrapped block.
pub fn render_message(message: &Message, width: usize) -> String {
    let header = match (message.kind, message.role) {
        (MessageKind::ReportReady { phase }, _) => {
            return format!(
                "{}{}",
                REPORT,
                style(format!("{} report saved", phase.title())).green().bold()
            );
        }
        (MessageKind::Notice, _) => {
            return format!("{}{}", WARN, style(&message.content).yellow());
        }
        (MessageKind::Text, Role::User) => format!("{}{}", USER, style("You").cyan().bold()),
        (MessageKind::Text, Role::Assistant) => {
            format!("{}{}", ASSISTANT, style("Interviewer").magenta().bold())
        }
    };
    format!("{}\n{}", header, wrap(&message.content, width))
}

/// Status line naming the phase and overall answer progress.
pub fn phase_banner(phase: Phase, answered: usize) -> String {
    let position = format!("step {} of {}", phase.ordinal() + 1, Phase::ALL.len());
    format!(
        "{} {} {} {}",
        style("──").dim(),
        style(phase.title()).bold(),
        style(format!("({}, {}/{} answered)", position, answered, TOTAL_QUESTIONS)).dim(),
        style("──").dim()
    )
}
