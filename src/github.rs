use crate::config::RepoId;
use crate::error::FetchError;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use serde_json::json;

const PAGE_SIZE: usize = 100;
const APPROVED: &str = "APPROVED";
const GHOST_LOGIN: &str = "ghost";

const MERGED_PULL_REQUESTS_QUERY: &str = r#"
query($owner: String!, $name: String!, $first: Int!, $after: String) {
  repository(owner: $owner, name: $name) {
    name
    pullRequests(first: $first, after: $after, states: MERGED, orderBy: {field: CREATED_AT, direction: DESC}) {
      nodes {
        number
        title
        createdAt
        mergedAt
        reviews(first: 50) {
          nodes {
            createdAt
            state
            author { login }
          }
        }
      }
      pageInfo {
        hasNextPage
        endCursor
      }
    }
  }
}
"#;

/// A merged pull request with its approving reviews.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    /// Approved reviews only, in the order the API returned them.
    pub approved_reviews: Vec<Review>,
}

impl PullRequest {
    /// Approved reviews sorted by submission time, oldest first.
    pub fn sorted_reviews(&self) -> Vec<&Review> {
        let mut reviews: Vec<&Review> = self.approved_reviews.iter().collect();
        reviews.sort_by_key(|review| review.created_at);
        reviews
    }

    /// The second approval in chronological order, if there is one.
    pub fn second_approval(&self) -> Option<&Review> {
        self.sorted_reviews().get(1).copied()
    }

    pub fn approved_by(&self, login: &str) -> bool {
        self.approved_reviews
            .iter()
            .any(|review| review.author_login == login)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Review {
    pub author_login: String,
    pub created_at: DateTime<Utc>,
    pub state: ReviewState,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    pull_requests: Connection<PullRequestNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    nodes: Vec<T>,
    #[serde(default)]
    page_info: PageInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestNode {
    number: u64,
    title: String,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
    reviews: Connection<ReviewNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewNode {
    created_at: DateTime<Utc>,
    state: String,
    author: Option<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    login: String,
}

impl From<PullRequestNode> for PullRequest {
    fn from(node: PullRequestNode) -> Self {
        let approved_reviews = node
            .reviews
            .nodes
            .into_iter()
            .filter(|review| review.state == APPROVED)
            .map(|review| Review {
                author_login: review
                    .author
                    .map(|author| author.login)
                    .unwrap_or_else(|| GHOST_LOGIN.to_string()),
                created_at: review.created_at,
                state: ReviewState::Approved,
            })
            .collect();

        Self {
            number: node.number,
            title: node.title,
            created_at: node.created_at,
            merged_at: node.merged_at,
            approved_reviews,
        }
    }
}

pub struct GitHubClient {
    octocrab: Octocrab,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> anyhow::Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(token) = token {
            builder = builder.personal_token(token);
        }

        Ok(Self {
            octocrab: builder.build()?,
        })
    }

    /// Builds a client against a non-default API root (GitHub Enterprise, test servers).
    pub fn with_base_uri(token: Option<String>, base_uri: &str) -> anyhow::Result<Self> {
        let mut builder = Octocrab::builder().base_uri(base_uri)?;
        if let Some(token) = token {
            builder = builder.personal_token(token);
        }

        Ok(Self {
            octocrab: builder.build()?,
        })
    }

    /// Pages through merged PRs, newest first, until `limit` are collected
    /// or the repository runs out.
    pub async fn fetch_merged_pull_requests(
        &self,
        repo_id: &RepoId,
        limit: usize,
    ) -> Result<Vec<PullRequest>, FetchError> {
        let mut prs = Vec::new();
        let mut cursor: Option<String> = None;

        while prs.len() < limit {
            let payload = json!({
                "query": MERGED_PULL_REQUESTS_QUERY,
                "variables": {
                    "owner": repo_id.owner,
                    "name": repo_id.repo,
                    "first": PAGE_SIZE,
                    "after": cursor,
                },
            });

            let response: GraphQlResponse = self.octocrab.graphql(&payload).await?;
            let connection = parse_page(repo_id, response)?;

            tracing::debug!(
                repo_id = %repo_id,
                page_len = connection.nodes.len(),
                has_next_page = connection.page_info.has_next_page,
                "Fetched pull request page"
            );

            prs.extend(connection.nodes.into_iter().map(PullRequest::from));

            match connection.page_info.end_cursor {
                Some(next) if connection.page_info.has_next_page => cursor = Some(next),
                _ => break,
            }
        }

        prs.truncate(limit);
        Ok(prs)
    }
}

fn parse_page(
    repo_id: &RepoId,
    response: GraphQlResponse,
) -> Result<Connection<PullRequestNode>, FetchError> {
    if !response.errors.is_empty() {
        let messages = response
            .errors
            .into_iter()
            .map(|error| error.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(FetchError::GraphQl(messages));
    }

    response
        .data
        .and_then(|data| data.repository)
        .map(|repository| repository.pull_requests)
        .ok_or_else(|| FetchError::RepositoryNotFound(repo_id.to_string()))
}
