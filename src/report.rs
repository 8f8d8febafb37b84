use crate::capture::StoredRecord;
use crate::filter::{Filter, Verdict};
use crate::routing::RouteOutcome;
use crate::store::Page;
use colored::Colorize;
use comfy_table::{Cell, ContentArrangement, Table};
use serde_json::{Value as Json, json};
use std::fmt::Write as _;

const MESSAGE_WIDTH: usize = 60;

pub fn create_styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h)));
    table
}

fn truncate(text: &str, width: usize) -> String {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.chars().count() <= width {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

/// Summary of the filters a rule document defines
pub fn format_filters(filters: &[Filter]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} filter(s) compiled", filters.len().to_string().green().bold());

    if filters.is_empty() {
        return out;
    }

    let mut table = create_styled_table(&["#", "Name", "Effect", "Test"]);
    for (index, filter) in filters.iter().enumerate() {
        let effect = if filter.dismisses_entirely() {
            "dismiss".to_string()
        } else {
            format!("skip {}", filter.channels())
        };
        table.add_row(vec![
            Cell::new(index),
            Cell::new(filter.name().unwrap_or("-")),
            Cell::new(effect),
            Cell::new(filter.assertion()),
        ]);
    }
    let _ = writeln!(out, "{table}");
    out
}

pub fn format_verdict(verdict: &Verdict) -> String {
    if verdict.suppress_recording {
        format!("{}", "DISMISSED: the error would not be recorded".red().bold())
    } else if verdict.suppressed_channels.is_empty() {
        format!("{}", "RECORDED: all channels notified".green().bold())
    } else {
        format!(
            "{} {}",
            "RECORDED: skipped channels:".yellow().bold(),
            verdict.suppressed_channels
        )
    }
}

pub fn format_outcome(outcome: &RouteOutcome) -> String {
    let mut out = String::new();
    match outcome {
        RouteOutcome::Dismissed { verdict } => {
            let _ = writeln!(out, "{}", format_verdict(verdict));
        }
        RouteOutcome::Recorded {
            record,
            verdict,
            delivery,
        } => {
            let _ = writeln!(out, "{}", format_verdict(verdict));
            let _ = writeln!(out, "Id:       {}", record.id);
            if !delivery.notified.is_empty() {
                let _ = writeln!(out, "Notified: {}", delivery.notified.join(", "));
            }
            if !delivery.skipped.is_empty() {
                let _ = writeln!(out, "Skipped:  {}", delivery.skipped.join(", "));
            }
            if !delivery.failed.is_empty() {
                let _ = writeln!(out, "Failed:   {}", delivery.failed.join(", ").red());
            }
        }
        RouteOutcome::Unrecorded { verdict, error } => {
            let _ = writeln!(out, "{}", format_verdict(verdict));
            let _ = writeln!(out, "{} {}", "Store failed:".red().bold(), error);
        }
    }
    out
}

pub fn outcome_json(outcome: &RouteOutcome) -> Json {
    match outcome {
        RouteOutcome::Dismissed { verdict } => json!({
            "outcome": "dismissed",
            "verdict": verdict,
        }),
        RouteOutcome::Recorded {
            record,
            verdict,
            delivery,
        } => json!({
            "outcome": "recorded",
            "id": record.id,
            "verdict": verdict,
            "delivery": delivery,
        }),
        RouteOutcome::Unrecorded { verdict, error } => json!({
            "outcome": "unrecorded",
            "verdict": verdict,
            "error": error.to_string(),
        }),
    }
}

pub fn format_page(page: &Page, offset: usize) -> String {
    let mut out = String::new();
    let shown = page.records.len();
    let first = if shown == 0 { 0 } else { offset + 1 };
    let _ = writeln!(
        out,
        "Showing {}-{} of {} matching error(s)",
        first,
        offset + shown,
        page.total.to_string().bold()
    );

    if shown == 0 {
        return out;
    }

    let mut table = create_styled_table(&["Id", "Time (UTC)", "Status", "Type", "Host", "Message"]);
    for record in &page.records {
        let e = &record.error;
        table.add_row(vec![
            Cell::new(record.id),
            Cell::new(e.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(e.effective_status_code()),
            Cell::new(e.type_name()),
            Cell::new(&e.host),
            Cell::new(truncate(e.message(), MESSAGE_WIDTH)),
        ]);
    }
    let _ = writeln!(out, "{table}");
    out
}

pub fn format_record(record: &StoredRecord) -> String {
    let e = &record.error;
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Error".red().bold(), record.id);
    let _ = writeln!(out, "Type:        {}", e.type_name());
    let _ = writeln!(out, "Message:     {}", e.message());
    let _ = writeln!(out, "Time:        {}", e.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out, "Application: {}", e.application);
    let _ = writeln!(out, "Host:        {}", e.host);
    let _ = writeln!(out, "Status:      {}", e.effective_status_code());
    if let Some(request) = &e.request {
        let _ = writeln!(out, "Request:     {} {}", request.method, request.url);
    }
    if !e.user().is_empty() {
        let _ = writeln!(out, "User:        {}", e.user());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", e.detail());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CapturedError, ExceptionInfo, RecordId};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_truncate_long_messages() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij-more", 5), "abcd…");
        assert_eq!(truncate("first\nsecond", 20), "first");
    }

    #[test]
    fn test_verdict_wording() {
        plain();
        let mut verdict = Verdict::default();
        assert!(format_verdict(&verdict).contains("all channels"));
        verdict.suppressed_channels = ["email"].into_iter().collect();
        assert!(format_verdict(&verdict).contains("email"));
        verdict.suppress_recording = true;
        assert!(format_verdict(&verdict).contains("DISMISSED"));
    }

    #[test]
    fn test_page_header_counts() {
        plain();
        let record = StoredRecord {
            id: RecordId::new(),
            sequence: 0,
            error: CapturedError::new(ExceptionInfo::new("E", "boom")),
        };
        let page = Page {
            records: vec![record],
            total: 12,
        };
        let text = format_page(&page, 10);
        assert!(text.contains("Showing 11-11 of 12"));
        assert!(text.contains("boom"));
    }
}
