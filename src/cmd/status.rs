//! Interview status and listing commands.

use anyhow::{Context, Result};
use console::style;

use interviewer::config::InterviewerConfig;
use interviewer::interview::TOTAL_QUESTIONS;
use interviewer::phase::Phase;
use interviewer::store::{DocumentStore, InterviewDocument, JsonFileStore};
use interviewer::tracker::PhaseTracker;
use interviewer::ui::icons::{CHECK, FOLDER};
use interviewer::ui::phase_banner;

fn tracker(config: &InterviewerConfig) -> PhaseTracker {
    let settings = config.controller_settings();
    PhaseTracker::new(settings.min_reply_chars, settings.keyword_density)
}

fn open_store(config: &InterviewerConfig) -> Result<JsonFileStore> {
    JsonFileStore::open(config.store_dir()).context("Failed to open interview store")
}

fn phase_label(doc: &InterviewDocument) -> String {
    if doc.reports.contains_key(&Phase::Terminal) {
        "complete".to_string()
    } else {
        doc.current_phase.key().to_string()
    }
}

pub async fn cmd_status(config: &InterviewerConfig, id: &str) -> Result<()> {
    let store = open_store(config)?;
    let Some(doc) = store.read(id).await? else {
        println!();
        println!("No interview with id {}.", id);
        println!("Run `interviewer list` to see stored interviews.");
        println!();
        return Ok(());
    };

    let progress = tracker(config).compute_progress(&doc.messages);

    println!();
    println!("{}", style(&doc.brand_name).bold());
    println!("{}", phase_banner(doc.current_phase, progress.answered_count));
    println!();
    println!("  Interview:     {}", id);
    println!("  Conversation:  {}", doc.conversation_id);
    println!("  Started:       {}", doc.created_at.format("%Y-%m-%d %H:%M"));
    println!("  Last updated:  {}", doc.last_updated.format("%Y-%m-%d %H:%M"));
    println!("  Messages:      {}", doc.messages.len());
    if progress.answered_count != doc.question_count {
        println!(
            "  {}",
            style(format!(
                "Stored answer count {} is stale; it is corrected on the next `chat`.",
                doc.question_count
            ))
            .yellow()
        );
    }
    println!();

    println!("Reports:");
    for phase in Phase::ALL {
        match doc.reports.get(&phase) {
            Some(report) => println!(
                "  {}{:<24} {}",
                CHECK,
                phase.title(),
                style(report.accepted_at.format("%Y-%m-%d %H:%M")).dim()
            ),
            None => println!(
                "  {:<3}{:<24} {}",
                "-",
                phase.title(),
                style(format!(
                    "{}/{} answered",
                    progress.answered_in_phase(phase),
                    phase.required_answers()
                ))
                .dim()
            ),
        }
    }
    println!();
    Ok(())
}

pub async fn cmd_list(config: &InterviewerConfig) -> Result<()> {
    let store = open_store(config)?;
    let interviews = store.list().await?;

    println!();
    if interviews.is_empty() {
        println!("No interviews found in {}", store.dir().display());
        println!("Start one with `interviewer start --brand <name>`.");
        println!();
        return Ok(());
    }

    println!("{}{}", FOLDER, store.dir().display());
    println!();
    println!(
        "{:<38} {:<24} {:<10} {:<9} Updated",
        "Interview", "Brand", "Phase", "Answered"
    );
    println!(
        "{:<38} {:<24} {:<10} {:<9} -------",
        "-".repeat(36),
        "-".repeat(22),
        "--------",
        "--------"
    );
    let tracker = tracker(config);
    for (id, doc) in &interviews {
        let answered = tracker.compute_progress(&doc.messages).answered_count;
        println!(
            "{:<38} {:<24} {:<10} {:<9} {}",
            id,
            truncate(&doc.brand_name, 24),
            phase_label(doc),
            format!("{}/{}", answered, TOTAL_QUESTIONS),
            doc.last_updated.format("%Y-%m-%d %H:%M")
        );
    }
    println!();
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
