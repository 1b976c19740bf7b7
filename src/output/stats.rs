//! End-of-run statistics printed to stdout

use crate::output::traits::RunSummary;

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The run summary to display
pub fn print_statistics(summary: &RunSummary) {
    println!("=== Harvest Statistics ===\n");

    println!("Rows:");
    println!("  Total rows: {}", summary.rows_total);
    println!("  Rows written: {}", summary.rows_written);
    println!(
        "  Rows with emails: {} ({:.1}%)",
        summary.rows_with_emails,
        summary.email_hit_rate()
    );
    println!("  Rows without a usable website or page: {}", summary.rows_failed);
    if summary.rows_crawl_skipped > 0 {
        println!(
            "  Rows answered from the hint column: {}",
            summary.rows_crawl_skipped
        );
    }
    if summary.rows_with_best_email > 0 {
        println!("  Rows with a selected email: {}", summary.rows_with_best_email);
    }
    println!();

    println!("Crawl:");
    println!("  Pages visited: {}", summary.pages_visited);
    println!(
        "  Pages failed: {} ({:.1}%)",
        summary.pages_failed,
        summary.page_error_rate()
    );
    println!("  Emails found: {}", summary.emails_found);
    if summary.team_pages_found > 0 {
        println!("  Team pages found: {}", summary.team_pages_found);
    }
    println!();

    let errors = summary.most_common_errors(5);
    if !errors.is_empty() {
        println!("Most Common Errors:");
        for (message, count) in errors {
            println!("  {}: {}", message, count);
        }
        println!();
    }

    if let Some(duration) = summary.duration_seconds {
        println!("Finished in {} seconds", duration);
    }
}
