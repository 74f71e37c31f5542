//! Console rendering of repository reports.
//!
//! Colours come from `console` and switch off on their own when stdout is not
//! a terminal. Everything renders to a `String` so the caller decides where
//! it goes.

use crate::fetcher::{GroupReport, RepoReport};
use crate::filter::RejectReason;
use crate::wait_time::WaitTimeRecord;
use chrono::{DateTime, Utc};
use console::style;
use std::collections::BTreeMap;
use std::fmt::Write;

const DIVIDER: &str = "--------------------------------------------------------";

const SECOND_MS: u64 = 1_000;
const MINUTE_MS: u64 = 60 * SECOND_MS;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;

/// `D days, H hours, M minutes, S seconds`; negative waits get a leading `-`.
pub fn format_duration(millis: i64) -> String {
    let sign = if millis < 0 { "-" } else { "" };
    let ms = millis.unsigned_abs();
    format!(
        "{sign}{} days, {} hours, {} minutes, {} seconds",
        ms / DAY_MS,
        ms % DAY_MS / HOUR_MS,
        ms % HOUR_MS / MINUTE_MS,
        ms % MINUTE_MS / SECOND_MS,
    )
}

/// e.g. `Mon, Jun 10, 2024, 2:00 PM`; `None` renders as `N/A`.
pub fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%a, %b %-d, %Y, %-I:%M %p").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn render_repo_report(report: &RepoReport) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_repo_report(&mut out, report)?;
    Ok(out)
}

fn write_repo_report(out: &mut String, report: &RepoReport) -> std::fmt::Result {
    writeln!(out, "{}", style(DIVIDER).cyan())?;
    writeln!(
        out,
        "{}",
        style(report.repo_id.to_string().to_uppercase()).cyan().bold()
    )?;
    writeln!(
        out,
        "{}",
        style(format!(
            "Date Range: {} to {}",
            report.range_start.format("%Y-%m-%d"),
            report.range_end.format("%Y-%m-%d")
        ))
        .cyan()
    )?;
    writeln!(out, "{}", style(DIVIDER).cyan())?;

    writeln!(
        out,
        "{}",
        style(format!(
            "Fetched {} PRs, {} matched the criteria.",
            report.fetched,
            report.eligible()
        ))
        .green()
    )?;

    let mut reasons: BTreeMap<RejectReason, usize> = BTreeMap::new();
    for rejection in &report.rejected {
        *reasons.entry(rejection.reason).or_default() += 1;
    }
    for (reason, count) in reasons {
        writeln!(out, "{}", style(format!("  excluded ({reason}): {count}")).dim())?;
    }

    for group in &report.groups {
        writeln!(out)?;
        write_group(out, group)?;
    }

    if let Some(difference) = report.comparison() {
        writeln!(out)?;
        let verdict = if difference >= 0 { "longer" } else { "shorter" };
        writeln!(
            out,
            "{}",
            style(format!(
                "{} waited {} {} on average than {}.",
                report.groups[0].label,
                format_duration(difference.abs()),
                verdict,
                report.groups[1].label,
            ))
            .magenta()
            .bold()
        )?;
    }

    writeln!(out, "{}", style(DIVIDER).cyan())
}

fn write_group(out: &mut String, group: &GroupReport) -> std::fmt::Result {
    writeln!(out, "{}", style(&group.label).white().bold().underlined())?;

    let Some(average) = group.summary.average_millis() else {
        return writeln!(
            out,
            "{}",
            style("No PRs found within the specified date range.").yellow()
        );
    };

    writeln!(
        out,
        "{}",
        style(format!("Total PRs in date range: {}", group.summary.count))
            .white()
            .bold()
    )?;
    writeln!(out, "{}", style("Average Waiting Time:").white().bold())?;
    writeln!(out, "{}", style(format_duration(average)).blue())?;

    if let Some(record) = &group.summary.most_delayed {
        writeln!(out, "\n{}", style("Most Delayed PR:").white().bold())?;
        write_record(out, record)?;
    }
    if let Some(record) = &group.summary.quickest {
        writeln!(out, "\n{}", style("Quickest PR:").white().bold())?;
        write_record(out, record)?;
    }
    Ok(())
}

fn write_record(out: &mut String, record: &WaitTimeRecord) -> std::fmt::Result {
    let url = format!(
        "https://github.com/{}/{}/pull/{}",
        record.owner, record.repo, record.pr_number
    );
    writeln!(
        out,
        "{}",
        style(format!("PR #{} - {}", record.pr_number, record.title)).cyan()
    )?;
    writeln!(out, "{}", style(format!("URL: {url}")).yellow())?;
    writeln!(
        out,
        "{}",
        style(format!("Created: {}", format_date(Some(record.created_at)))).yellow()
    )?;
    writeln!(
        out,
        "{}",
        style(format!(
            "Slack Message: {}",
            format_date(record.message_sent_at)
        ))
        .yellow()
    )?;
    writeln!(
        out,
        "{}",
        style(format!(
            "Second Review: {}",
            format_date(record.second_review_at)
        ))
        .yellow()
    )?;
    writeln!(
        out,
        "{}",
        style(format!(
            "Time Difference: {}",
            format_duration(record.wait_millis)
        ))
        .green()
    )
}
