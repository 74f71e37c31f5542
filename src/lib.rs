//! Measures how long pull requests wait for review after being announced in
//! the team chat channel.
//!
//! Merged PRs come from the GitHub GraphQL API and announcements from a
//! snapshot of Slack channel history. Each PR is matched to the message that
//! linked it, and the time from that message to the second approval is
//! summarised per repository, optionally split by a named reviewer.

pub mod config;
pub mod correlator;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod github;
pub mod metrics;
pub mod report;
pub mod slack;
pub mod wait_time;

use config::AppConfig;
use github::GitHubClient;
use slack::SlackClient;

/// Fetches the configured channel history and writes it to the snapshot file.
pub async fn run_snapshot(config: &AppConfig) -> anyhow::Result<()> {
    let token = config
        .slack_bot_token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("SLACK_BOT_TOKEN must be set"))?;
    let channel_id = config
        .slack_channel_id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("SLACK_CHANNEL_ID must be set"))?;

    let client = SlackClient::new(&config.slack_api_url, token);
    let messages = client.fetch_history(channel_id).await?;
    slack::save_snapshot(&config.slack_snapshot_path, &messages)?;

    tracing::info!(
        count = messages.len(),
        path = %config.slack_snapshot_path.display(),
        "Messages have been saved"
    );
    Ok(())
}

/// Builds and prints a report for every configured repository.
///
/// A repository whose fetch fails is logged and skipped.
pub async fn run_report(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let token = config
        .github_token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("GITHUB_TOKEN must be set"))?;
    let range = config.date_range()?;
    let client = GitHubClient::new(Some(token))?;
    let messages = slack::load_snapshot(&config.slack_snapshot_path);

    for repo_id in &config.repositories {
        match fetcher::fetch_repo_report(&client, config, &range, repo_id, &messages).await {
            Ok(report) if json => println!("{}", serde_json::to_string_pretty(&report)?),
            Ok(report) => print!("{}", report::render_repo_report(&report)?),
            Err(e) => tracing::error!("Failed to fetch PR details for {}: {:#}", repo_id, e),
        }
    }

    Ok(())
}
