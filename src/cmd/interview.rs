//! Interactive interview commands: `interviewer start` and `interviewer chat`.

use anyhow::{Context, Result};
use console::style;
use std::sync::Arc;

use interviewer::config::InterviewerConfig;
use interviewer::controller::{InterviewView, ProgressionController};
use interviewer::store::JsonFileStore;
use interviewer::ui::icons::{CHECK, CROSS, HINT, SPARKLE};
use interviewer::ui::{StageSpinner, phase_banner, render_message, wrap_width};

/// One line of user input, interpreted.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput {
    Quit,
    Example,
    Help,
    Empty,
    Reply(String),
}

fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "" => ChatInput::Empty,
        "/quit" | "/exit" | "/q" => ChatInput::Quit,
        "/example" => ChatInput::Example,
        "/help" | "/?" => ChatInput::Help,
        _ => ChatInput::Reply(trimmed.to_string()),
    }
}

fn build_controller(config: &InterviewerConfig) -> Result<ProgressionController> {
    let assistant = config.assistant()?;
    let store = JsonFileStore::open(config.store_dir()).context("Failed to open interview store")?;
    Ok(ProgressionController::new(
        Arc::new(assistant),
        Arc::new(store),
        config.controller_settings(),
    ))
}

pub async fn cmd_start(config: &InterviewerConfig, brand: &str) -> Result<()> {
    let controller = build_controller(config)?;

    println!();
    println!(
        "{}Starting a brand interview for {}",
        SPARKLE,
        style(brand).bold()
    );
    println!();

    let spinner = StageSpinner::start(controller.subscribe());
    let result = controller.start_interview(brand).await;
    spinner.stop();

    match result {
        Ok(id) => {
            println!("Interview id: {}", style(&id).cyan());
            println!(
                "{}",
                style(format!("Resume any time with `interviewer chat {}`", id)).dim()
            );
            println!();
            run_session(&controller).await
        }
        Err(e) => {
            let id = controller.subscribe().borrow().interview_id.clone();
            if !id.is_empty() {
                println!("{}Interview {} was created but the assistant did not respond.", CROSS, id);
                println!("Resume it with `interviewer chat {}`.", id);
            }
            Err(e.into())
        }
    }
}

pub async fn cmd_chat(config: &InterviewerConfig, id: &str) -> Result<()> {
    let controller = build_controller(config)?;

    if let Err(e) = controller.initialize_from_persisted(id).await {
        if e.requires_new_interview() {
            println!("{}{}", CROSS, e);
            println!("Start a new interview with `interviewer start --brand <name>`.");
            return Ok(());
        }
        return Err(e.into());
    }

    // An interview whose opening never arrived is opened now.
    let spinner = StageSpinner::start(controller.subscribe());
    let opened = controller.kickoff().await;
    spinner.stop();
    opened?;

    run_session(&controller).await
}

fn print_transcript(view: &InterviewView) {
    let width = wrap_width();
    println!();
    println!("{}", phase_banner(view.current_phase, view.question_count));
    println!();
    for message in &view.messages {
        println!("{}", render_message(message, width));
        println!();
    }
}

fn print_help() {
    println!("  /example  answer with the suggested example");
    println!("  /help     show this help");
    println!("  /quit     leave; progress is saved after every answer");
    println!();
}

async fn read_line() -> Result<String> {
    tokio::task::spawn_blocking(|| {
        dialoguer::Input::<String>::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read user input")
    })
    .await
    .context("Input task failed")?
}

/// Read answers until the interview completes or the user quits.
async fn run_session(controller: &ProgressionController) -> Result<()> {
    let views = controller.subscribe();
    let width = wrap_width();

    let opening = views.borrow().clone();
    print_transcript(&opening);
    print_help();

    loop {
        let view = views.borrow().clone();
        if view.complete {
            println!("{}The interview is complete.", CHECK);
            println!(
                "Export your reports with `interviewer export {}`.",
                view.interview_id
            );
            return Ok(());
        }
        if let Some(example) = &view.suggested_answer {
            println!(
                "{}{}",
                HINT,
                style(format!("Type /example to answer: \"{}\"", example)).dim()
            );
        }

        let text = match parse_input(&read_line().await?) {
            ChatInput::Quit => {
                println!("Progress saved. Resume with `interviewer chat {}`.", view.interview_id);
                return Ok(());
            }
            ChatInput::Help => {
                print_help();
                continue;
            }
            ChatInput::Empty => continue,
            ChatInput::Example => match view.suggested_answer.clone() {
                Some(example) => {
                    println!("{}", style(&example).dim());
                    example
                }
                None => {
                    println!("No example answer for this step.");
                    continue;
                }
            },
            ChatInput::Reply(text) => text,
        };

        let before = view.messages.len();
        let spinner = StageSpinner::start(controller.subscribe());
        let result = controller.send_user_reply(&text).await;
        spinner.stop();

        match result {
            Ok(()) => {
                let after = views.borrow().clone();
                println!();
                // Skip the user's own message, already on screen.
                for message in after.messages.iter().skip(before + 1) {
                    println!("{}", render_message(message, width));
                    println!();
                }
                if after.current_phase != view.current_phase {
                    println!("{}", phase_banner(after.current_phase, after.question_count));
                    println!();
                }
            }
            Err(e) if e.requires_new_interview() => {
                println!("{}{}", CROSS, e);
                return Ok(());
            }
            Err(e) => {
                println!("{}{}", CROSS, e);
                println!("Your answer was not saved. Please try again.");
                println!();
            }
        }
    }
}
