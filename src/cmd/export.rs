//! Report export command.

use anyhow::{Context, Result};
use std::path::PathBuf;

use interviewer::config::InterviewerConfig;
use interviewer::export::export_reports;
use interviewer::phase::Phase;
use interviewer::store::{DocumentStore, JsonFileStore};
use interviewer::ui::icons::CHECK;

pub async fn cmd_export(
    config: &InterviewerConfig,
    id: &str,
    phase: Option<Phase>,
    out: Option<PathBuf>,
) -> Result<()> {
    let store =
        JsonFileStore::open(config.store_dir()).context("Failed to open interview store")?;
    let doc = store
        .read(id)
        .await?
        .with_context(|| format!("No interview with id {}", id))?;

    if doc.reports.is_empty() {
        println!();
        println!("No reports yet for {}.", doc.brand_name);
        println!("Reports are saved as each phase of the interview completes.");
        println!();
        return Ok(());
    }

    let out_dir = out.unwrap_or_else(|| config.project_dir.clone());
    let written = export_reports(&doc, phase, &out_dir)?;

    println!();
    for path in &written {
        println!("{}{}", CHECK, path.display());
    }
    println!();
    Ok(())
}
