//! Writing accepted reports to markdown files.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::phase::Phase;
use crate::store::InterviewDocument;

/// File-name-safe form of a brand name: lowercase ASCII alphanumerics joined by `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "brand".to_string()
    } else {
        slug
    }
}

/// `<brand>-<phase>.md`
pub fn report_file_name(brand_name: &str, phase: Phase) -> String {
    format!("{}-{}.md", slugify(brand_name), phase.key())
}

/// Write the document's accepted reports into `out_dir`, optionally only one phase.
///
/// Returns the written paths in phase order. Fails if the requested phase has no
/// report yet.
pub fn export_reports(
    doc: &InterviewDocument,
    phase: Option<Phase>,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if let Some(phase) = phase
        && !doc.reports.contains_key(&phase)
    {
        anyhow::bail!(
            "No {} report yet. Current phase: {}",
            phase.title(),
            doc.current_phase.title()
        );
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let mut written = Vec::new();
    for (report_phase, report) in &doc.reports {
        if phase.is_some_and(|p| p != *report_phase) {
            continue;
        }
        let path = out_dir.join(report_file_name(&doc.brand_name, *report_phase));
        let mut content = report.content.trim_end().to_string();
        content.push('\n');
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
