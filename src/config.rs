//! Application configuration and environment variable parsing.
//!
//! Settings come from the environment (optionally seeded from a `.env` file).
//! `AppConfig` carries the repositories to report on, the reporting window,
//! the reviewer used to split results, and the chat snapshot location. The
//! pipeline never reads the environment itself: callers hand it a `DateRange`
//! and reviewer settings taken from here.

use anyhow::{ensure, Context};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A unique identifier for a GitHub repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// The owner of the repository (e.g., "purepm").
    pub owner: String,
    /// The name of the repository (e.g., "backend-monorepo").
    pub repo: String,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// An inclusive window of PR creation times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> anyhow::Result<Self> {
        ensure!(
            start <= end,
            "report start {} is after report end {}",
            start,
            end
        );
        Ok(Self { start, end })
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// How the configured reviewer shapes the report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerMode {
    /// Keep every eligible PR and split it into with/without-reviewer groups.
    #[default]
    Partition,
    /// Drop PRs the reviewer did not approve and report a single group.
    Require,
}

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// GitHub token used for the GraphQL API. Required by `report`.
    pub github_token: Option<String>,

    /// Repositories to report on.
    /// Expected format: comma-separated string of "owner/repo" pairs.
    /// Example: "purepm/backend-monorepo,purepm/frontend-monorepo"
    #[serde(deserialize_with = "deserialize_repositories")]
    pub repositories: Vec<RepoId>,

    /// Maximum number of merged PRs to fetch per repository.
    #[serde(default = "default_pr_count")]
    pub pr_count: usize,

    /// First instant of the reporting window, `YYYY-MM-DD` or RFC 3339.
    pub report_start_date: String,

    /// Last instant of the reporting window, `YYYY-MM-DD` or RFC 3339.
    pub report_end_date: String,

    /// Reviewer whose approvals split the report.
    pub reviewer_login: Option<String>,

    #[serde(default)]
    pub reviewer_mode: ReviewerMode,

    /// Where the chat history snapshot is read from and written to.
    #[serde(default = "default_snapshot_path")]
    pub slack_snapshot_path: PathBuf,

    pub slack_bot_token: Option<String>,

    pub slack_channel_id: Option<String>,

    #[serde(default = "default_slack_api_url")]
    pub slack_api_url: String,
}

fn default_pr_count() -> usize {
    1000
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("slack_messages.json")
}

fn default_slack_api_url() -> String {
    "https://slack.com/api".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Parses and validates the configured reporting window.
    pub fn date_range(&self) -> anyhow::Result<DateRange> {
        let start = parse_report_date(&self.report_start_date)
            .with_context(|| format!("invalid REPORT_START_DATE '{}'", self.report_start_date))?;
        let end = parse_report_date(&self.report_end_date)
            .with_context(|| format!("invalid REPORT_END_DATE '{}'", self.report_end_date))?;
        DateRange::new(start, end)
    }
}

/// Accepts RFC 3339 timestamps or plain dates; a plain date is midnight UTC.
pub fn parse_report_date(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
}

fn deserialize_repositories<'de, D>(deserializer: D) -> Result<Vec<RepoId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Ok(parse_repositories(&s))
}

/// Parses "owner/repo" pairs, also accepting full `https://github.com/` URLs.
pub fn parse_repositories(s: &str) -> Vec<RepoId> {
    s.split(',')
        .filter_map(|part| {
            let part = part.trim().trim_start_matches("https://github.com/");
            let (owner, repo) = part.trim_end_matches('/').split_once('/')?;
            let (owner, repo) = (owner.trim(), repo.trim());
            if owner.is_empty() || repo.is_empty() || repo.contains('/') {
                return None;
            }
            Some(RepoId {
                owner: owner.to_string(),
                repo: repo.to_string(),
            })
        })
        .collect()
}
