//! Markdown run summary
//!
//! This module renders a [`RunReport`] as a human-readable markdown file:
//! run information, outcome counts, failed matches and matches that had no
//! box score.

use crate::output::report::RunReport;
use crate::output::{OutputError, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of the run to `output_path`
pub fn write_markdown_summary(report: &RunReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(report);

    let mut file = File::create(output_path).map_err(|source| OutputError::Io {
        path: output_path.display().to_string(),
        source,
    })?;
    file.write_all(markdown.as_bytes())
        .map_err(|source| OutputError::Io {
            path: output_path.display().to_string(),
            source,
        })?;

    Ok(())
}

/// Formats a run report as markdown
pub fn format_markdown_summary(report: &RunReport) -> String {
    let mut md = String::new();

    md.push_str("# Courtside Scrape Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **Started**: {}\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        report.duration().num_milliseconds() as f64 / 1000.0
    ));
    if let Some(hash) = &report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Matches Attempted**: {}\n", report.attempted));
    md.push_str(&format!("- **Succeeded**: {}\n", report.succeeded));
    md.push_str(&format!("- **Failed**: {}\n", report.failed));
    md.push_str(&format!(
        "- **Without Box Score**: {}\n",
        report.empty_matches.len()
    ));
    md.push_str(&format!(
        "- **Player Rows Written**: {}\n",
        report.records_written
    ));
    md.push_str(&format!("- **Game Rows Written**: {}\n", report.games_written));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        report.success_rate()
    ));

    if report.all_failed() {
        md.push_str(
            "> **Warning**: every match failed. Check the base URL and the site's availability.\n\n",
        );
    }

    if !report.failures.is_empty() {
        md.push_str("## Failed Matches\n\n");
        md.push_str("| Match | Cause | Kind | Attempts |\n");
        md.push_str("|-------|-------|------|----------|\n");
        for failure in &report.failures {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                failure.match_id,
                table_cell(&failure.cause.to_string()),
                failure.cause.category(),
                failure.attempts
            ));
        }
        md.push('\n');
    }

    if !report.empty_matches.is_empty() {
        md.push_str("## Matches Without Box Score\n\n");
        let ids: Vec<String> = report.empty_matches.iter().map(u32::to_string).collect();
        md.push_str(&ids.join(", "));
        md.push_str("\n\n");
    }

    md.push_str("---\n\n");
    md.push_str("*Generated by Courtside*\n");

    md
}

/// Keeps free text inside a single table cell
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::report::FailedMatch;
    use crate::pipeline::FetchError;
    use chrono::Utc;

    fn create_test_report() -> RunReport {
        let now = Utc::now();
        RunReport {
            attempted: 4,
            succeeded: 2,
            failed: 2,
            failures: vec![
                FailedMatch {
                    match_id: 2,
                    cause: FetchError::PermanentRequest { status: 404 },
                    attempts: 1,
                },
                FailedMatch {
                    match_id: 4,
                    cause: FetchError::ServerError { status: 503 },
                    attempts: 3,
                },
            ],
            empty_matches: vec![3],
            records_written: 5,
            games_written: 1,
            started_at: now,
            finished_at: now,
            config_hash: Some("abc123".to_string()),
        }
    }

    #[test]
    fn test_format_markdown_summary() {
        let md = format_markdown_summary(&create_test_report());

        assert!(md.contains("# Courtside Scrape Summary"));
        assert!(md.contains("- **Matches Attempted**: 4"));
        assert!(md.contains("- **Config Hash**: abc123"));
        assert!(md.contains("| 2 | Request rejected: HTTP 404 | permanent | 1 |"));
        assert!(md.contains("| 4 | Server error: HTTP 503 | transient | 3 |"));
        assert!(md.contains("## Matches Without Box Score\n\n3\n"));
        assert!(!md.contains("every match failed"));
    }

    #[test]
    fn test_failure_cause_escaped_in_table() {
        let mut report = create_test_report();
        report.failures[0].cause =
            FetchError::TransientNetwork("proxy | upstream\nreset".to_string());

        let md = format_markdown_summary(&report);
        assert!(md.contains("| 2 | Network error: proxy \\| upstream reset | transient | 1 |\n"));
    }

    #[test]
    fn test_all_failed_warning() {
        let mut report = create_test_report();
        report.succeeded = 0;
        report.failed = 4;

        let md = format_markdown_summary(&report);
        assert!(md.contains("every match failed"));
    }

    #[test]
    fn test_clean_run_has_no_failure_section() {
        let mut report = create_test_report();
        report.failures.clear();
        report.failed = 0;
        report.empty_matches.clear();

        let md = format_markdown_summary(&report);
        assert!(!md.contains("## Failed Matches"));
        assert!(!md.contains("## Matches Without Box Score"));
    }

    #[test]
    fn test_write_markdown_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");

        write_markdown_summary(&create_test_report(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Courtside Scrape Summary"));
    }
}
