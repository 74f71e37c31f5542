//! Errors raised while pulling data from the GitHub and Slack APIs.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("GitHub API error: {0}")]
    GitHub(#[from] octocrab::Error),
    #[error("GitHub GraphQL query failed: {0}")]
    GraphQl(String),
    #[error("Repository {0} not found or not accessible")]
    RepositoryNotFound(String),
    #[error("Slack HTTP error: {0}")]
    SlackHttp(#[from] reqwest::Error),
    #[error("Slack API error: {0}")]
    SlackApi(String),
}
