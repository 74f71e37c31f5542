use crate::config::{AppConfig, DateRange, RepoId, ReviewerMode};
use crate::correlator::find_correlated_message;
use crate::filter::{self, Rejection};
use crate::github::{GitHubClient, PullRequest};
use crate::metrics::{self, Summary};
use crate::slack::ChatMessage;
use crate::wait_time::{self, WaitTimeRecord};
use serde::Serialize;

/// One reported group of PRs with its statistics.
#[derive(Debug, Serialize, Clone)]
pub struct GroupReport {
    pub label: String,
    pub records: Vec<WaitTimeRecord>,
    pub summary: Summary,
}

#[derive(Debug, Serialize, Clone)]
pub struct RepoReport {
    pub repo_id: RepoId,
    pub range_start: chrono::DateTime<chrono::Utc>,
    pub range_end: chrono::DateTime<chrono::Utc>,
    pub fetched: usize,
    pub rejected: Vec<Rejection>,
    /// With/without the reviewer when partitioning, otherwise a single group.
    pub groups: Vec<GroupReport>,
}

impl RepoReport {
    pub fn eligible(&self) -> usize {
        self.groups.iter().map(|group| group.records.len()).sum()
    }

    /// Difference of the average waits of the first two groups.
    pub fn comparison(&self) -> Option<i64> {
        match self.groups.as_slice() {
            [with, without] => metrics::compare(&with.summary, &without.summary),
            _ => None,
        }
    }
}

/// Filters, splits and measures already-fetched PRs.
///
/// This separates the calculation from data retrieval so it can run on
/// fixtures as well as live API data.
pub fn build_repo_report(
    repo_id: &RepoId,
    prs: &[PullRequest],
    messages: &[ChatMessage],
    range: &DateRange,
    reviewer: Option<&str>,
    mode: ReviewerMode,
) -> RepoReport {
    let required = match mode {
        ReviewerMode::Require => reviewer,
        ReviewerMode::Partition => None,
    };
    let outcome = filter::filter_eligible(prs, messages, range, required);

    tracing::info!(
        repo_id = %repo_id,
        fetched = prs.len(),
        eligible = outcome.eligible.len(),
        "Filtered pull requests"
    );

    let groups = match (reviewer, mode) {
        (Some(login), ReviewerMode::Partition) => {
            let (with, without) = filter::partition_by_reviewer(&outcome.eligible, login);
            vec![
                build_group(
                    format!("PRs approved by {login}"),
                    repo_id,
                    &with,
                    messages,
                ),
                build_group(
                    format!("PRs not approved by {login}"),
                    repo_id,
                    &without,
                    messages,
                ),
            ]
        }
        (Some(login), ReviewerMode::Require) => vec![build_group(
            format!("PRs approved by {login}"),
            repo_id,
            &outcome.eligible,
            messages,
        )],
        (None, _) => vec![build_group(
            "All PRs".to_string(),
            repo_id,
            &outcome.eligible,
            messages,
        )],
    };

    RepoReport {
        repo_id: repo_id.clone(),
        range_start: range.start,
        range_end: range.end,
        fetched: prs.len(),
        rejected: outcome.rejected,
        groups,
    }
}

fn build_group(
    label: String,
    repo_id: &RepoId,
    prs: &[&PullRequest],
    messages: &[ChatMessage],
) -> GroupReport {
    let records: Vec<WaitTimeRecord> = prs
        .iter()
        .map(|pr| {
            let message = find_correlated_message(pr.number, messages);
            wait_time::compute_wait_time(repo_id, pr, message)
        })
        .collect();
    let summary = metrics::aggregate(&records);

    GroupReport {
        label,
        records,
        summary,
    }
}

/// Fetches merged PRs from GitHub and builds the wait-time report.
pub async fn fetch_repo_report(
    client: &GitHubClient,
    config: &AppConfig,
    range: &DateRange,
    repo_id: &RepoId,
    messages: &[ChatMessage],
) -> anyhow::Result<RepoReport> {
    tracing::info!(repo_id = %repo_id, limit = config.pr_count, "Fetching merged pull requests");
    let prs = client
        .fetch_merged_pull_requests(repo_id, config.pr_count)
        .await?;

    Ok(build_repo_report(
        repo_id,
        &prs,
        messages,
        range,
        config.reviewer_login.as_deref(),
        config.reviewer_mode,
    ))
}
