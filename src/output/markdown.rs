//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a run,
//! including row and crawl statistics and the most common target errors.

use crate::output::traits::{OutputResult, RunSummary};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of a run
///
/// # Arguments
///
/// * `summary` - The run summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &RunSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary) -> String {
    let mut md = String::new();

    md.push_str("# Lead-Harvest Run Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    if let Some(mode) = summary.mode {
        md.push_str(&format!("- **Mode**: {}\n", mode.as_str()));
    }
    md.push_str(&format!("- **Concurrency**: {}\n", summary.concurrency));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Row statistics
    md.push_str("## Rows\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Input rows | {} |\n", summary.rows_total));
    md.push_str(&format!("| Rows written | {} |\n", summary.rows_written));
    md.push_str(&format!(
        "| Rows with emails | {} |\n",
        summary.rows_with_emails
    ));
    md.push_str(&format!("| Rows with errors | {} |\n", summary.rows_failed));
    md.push_str(&format!(
        "| Rows answered from hint | {} |\n",
        summary.rows_crawl_skipped
    ));
    md.push_str(&format!(
        "| Rows with selected email | {} |\n\n",
        summary.rows_with_best_email
    ));
    md.push_str(&format!(
        "- **Email Hit Rate**: {:.2}%\n\n",
        summary.email_hit_rate()
    ));

    // Crawl statistics
    md.push_str("## Crawl Statistics\n\n");
    md.push_str(&format!("- **Pages Visited**: {}\n", summary.pages_visited));
    md.push_str(&format!(
        "- **Pages Failed**: {} ({:.2}%)\n",
        summary.pages_failed,
        summary.page_error_rate()
    ));
    md.push_str(&format!("- **Emails Found**: {}\n", summary.emails_found));
    md.push_str(&format!(
        "- **Team Pages Found**: {}\n\n",
        summary.team_pages_found
    ));

    // Error summary
    let errors = summary.most_common_errors(20);
    if !errors.is_empty() {
        md.push_str("## Top 20 Errors\n\n");
        md.push_str("| Error | Rows |\n");
        md.push_str("|-------|------|\n");

        for (message, count) in errors {
            md.push_str(&format!("| {} | {} |\n", message.replace('|', "\\|"), count));
        }
        md.push('\n');
    }

    md
}
