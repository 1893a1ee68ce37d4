//! The interview content: the fixed question catalog and the prompts sent to the
//! assistant.

pub mod prompts;
pub mod questions;

pub use prompts::{
    INTERVIEW_INSTRUCTIONS, NEXT_PHASE_SEPARATOR, fixup_request, kickoff_message,
    run_instructions,
};
pub use questions::{QUESTIONS, Question, TOTAL_QUESTIONS, question, questions};
