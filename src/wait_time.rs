use crate::config::RepoId;
use crate::github::PullRequest;
use crate::slack::ChatMessage;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// How long one PR waited for its second approval.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WaitTimeRecord {
    pub pr_number: u64,
    pub title: String,
    pub owner: String,
    pub repo: String,
    pub created_at: DateTime<Utc>,
    /// When the PR was announced in chat; `None` renders as "N/A".
    pub message_sent_at: Option<DateTime<Utc>>,
    pub second_review_at: Option<DateTime<Utc>>,
    /// Second approval minus the reference point. Zero when there was no
    /// second approval; negative when the approval predates the reference.
    pub wait_millis: i64,
}

impl WaitTimeRecord {
    /// Records with a zero wait carry no measurement.
    pub fn is_aggregable(&self) -> bool {
        self.wait_millis != 0
    }
}

/// Measures the time from the announcement (or PR creation, when the PR was
/// never announced) to the second approval.
pub fn compute_wait_time(
    repo_id: &RepoId,
    pr: &PullRequest,
    message: Option<&ChatMessage>,
) -> WaitTimeRecord {
    let second_review_at = pr.second_approval().map(|review| review.created_at);
    let message_sent_at = message.and_then(ChatMessage::sent_at);
    let reference = message_sent_at.unwrap_or(pr.created_at);

    let wait_millis = second_review_at
        .map(|reviewed_at| (reviewed_at - reference).num_milliseconds())
        .unwrap_or(0);

    WaitTimeRecord {
        pr_number: pr.number,
        title: pr.title.clone(),
        owner: repo_id.owner.clone(),
        repo: repo_id.repo.clone(),
        created_at: pr.created_at,
        message_sent_at,
        second_review_at,
        wait_millis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{Review, ReviewState};
    use chrono::TimeZone;

    fn repo() -> RepoId {
        RepoId {
            owner: "o".to_string(),
            repo: "r".to_string(),
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, hour, 0, 0).unwrap()
    }

    fn pr(number: u64, created_hour: u32, review_hours: &[u32]) -> PullRequest {
        PullRequest {
            number,
            title: format!("PR {number}"),
            created_at: at(created_hour),
            merged_at: None,
            approved_reviews: review_hours
                .iter()
                .map(|&hour| Review {
                    author_login: format!("reviewer{hour}"),
                    created_at: at(hour),
                    state: ReviewState::Approved,
                })
                .collect(),
        }
    }

    fn message_at(time: DateTime<Utc>) -> ChatMessage {
        ChatMessage::from_raw("svc <https://github.com/o/r/pull/100>", &time.timestamp().to_string())
    }

    #[test]
    fn test_wait_runs_from_message_to_second_approval() {
        let pr = pr(100, 8, &[10, 14]);
        let message = message_at(at(9));

        let record = compute_wait_time(&repo(), &pr, Some(&message));

        assert_eq!(record.wait_millis, 18_000_000);
        assert_eq!(record.message_sent_at, Some(at(9)));
        assert_eq!(record.second_review_at, Some(at(14)));
        assert_eq!(record.owner, "o");
    }

    #[test]
    fn test_reviews_are_sorted_before_picking_the_second() {
        let pr = pr(1, 0, &[5, 2, 8]);
        let record = compute_wait_time(&repo(), &pr, None);

        assert_eq!(record.second_review_at, Some(at(5)));
        assert_eq!(record.wait_millis, 5 * 3_600_000);
    }

    #[test]
    fn test_falls_back_to_creation_without_message() {
        let pr = pr(102, 6, &[10, 12]);
        let record = compute_wait_time(&repo(), &pr, None);

        assert_eq!(record.message_sent_at, None);
        assert_eq!(record.wait_millis, 6 * 3_600_000);
        assert!(record.is_aggregable());
    }

    #[test]
    fn test_single_approval_is_not_aggregable() {
        let pr = pr(101, 8, &[10]);
        let record = compute_wait_time(&repo(), &pr, Some(&message_at(at(9))));

        assert_eq!(record.second_review_at, None);
        assert_eq!(record.wait_millis, 0);
        assert!(!record.is_aggregable());
    }

    #[test]
    fn test_approval_before_announcement_is_negative() {
        let pr = pr(103, 8, &[9, 10]);
        let record = compute_wait_time(&repo(), &pr, Some(&message_at(at(12))));

        assert_eq!(record.wait_millis, -2 * 3_600_000);
        assert!(record.is_aggregable());
    }
}
