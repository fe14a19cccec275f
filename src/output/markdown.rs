//! Markdown summary generation
//!
//! This module generates a human-readable markdown index of the record store:
//! overall statistics, a per-host breakdown and one table row per record.

use crate::output::stats::StoreStatistics;
use crate::storage::Record;
use chrono::Utc;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Longest body excerpt shown in the record table
const EXCERPT_CHARS: usize = 80;

/// Writes a markdown summary of `records` to `output_path`
///
/// # Arguments
///
/// * `records` - Stored records, in store order
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(io::Error)` - Failed to write summary
pub fn generate_markdown_summary(records: &[Record], output_path: &Path) -> std::io::Result<()> {
    let generated_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let markdown = format_markdown_summary(records, &generated_at);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;
    file.sync_all()?;

    Ok(())
}

/// Formats the record summary as markdown
pub fn format_markdown_summary(records: &[Record], generated_at: &str) -> String {
    let stats = StoreStatistics::from_records(records);
    let mut md = String::new();

    md.push_str("# Sumi-Scribe Record Summary\n\n");
    md.push_str(&format!("- **Generated**: {}\n\n", generated_at));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Records**: {}\n", stats.total_records));
    md.push_str(&format!(
        "- **Outgoing Links**: {} ({:.1} per record)\n",
        stats.total_links,
        stats.average_links()
    ));
    md.push_str(&format!(
        "- **Distinct Link Targets**: {}\n",
        stats.unique_links
    ));
    md.push_str(&format!(
        "- **Targets Without a Record**: {}\n",
        stats.pending_links
    ));
    md.push_str(&format!(
        "- **With Provenance**: {} ({:.2}%)\n\n",
        stats.records_with_provenance,
        stats.provenance_rate()
    ));

    if !stats.records_by_host.is_empty() {
        md.push_str("## Records by Host\n\n");
        md.push_str("| Host | Records |\n");
        md.push_str("|------|---------|\n");
        for (host, count) in &stats.records_by_host {
            md.push_str(&format!("| {} | {} |\n", host, count));
        }
        md.push('\n');
    }

    if !records.is_empty() {
        md.push_str("## Records\n\n");
        md.push_str("| # | Title | Location | Links | Provenance | Excerpt |\n");
        md.push_str("|---|-------|----------|-------|------------|---------|\n");

        for (i, record) in records.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                i + 1,
                escape_cell(&record.title),
                record.location,
                record.outgoing.len(),
                escape_cell(record.provenance_timestamp.as_deref().unwrap_or("-")),
                escape_cell(&excerpt(&record.body)),
            ));
        }
        md.push('\n');
    }

    md
}

/// First line of the body, cut to a readable length
fn excerpt(body: &str) -> String {
    let first = body.lines().next().unwrap_or("").trim();
    if first.chars().count() <= EXCERPT_CHARS {
        first.to_string()
    } else {
        let cut: String = first.chars().take(EXCERPT_CHARS).collect();
        format!("{}...", cut.trim_end())
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
