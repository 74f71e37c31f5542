//! Selection of the PRs that take part in the report, and the reviewer split.
//!
//! A PR is eligible when, checked in this order:
//! 1. it was created inside the reporting window (bounds inclusive),
//! 2. it has at least two approvals,
//! 3. it was announced in chat,
//! 4. its second approval came strictly after the announcement, at the
//!    millisecond granularity the wait is measured in,
//! 5. the required reviewer (if any) approved it.
//!
//! Rejected PRs are reported with the first check they failed.

use crate::config::DateRange;
use crate::correlator::find_correlated_message;
use crate::github::PullRequest;
use crate::slack::ChatMessage;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RejectReason {
    OutsideDateRange,
    TooFewApprovals,
    NoAnnouncement,
    UnparsableAnnouncementTime,
    ApprovedBeforeAnnouncement,
    MissingReviewer,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::OutsideDateRange => "created outside the date range",
            Self::TooFewApprovals => "fewer than two approvals",
            Self::NoAnnouncement => "no chat announcement",
            Self::UnparsableAnnouncementTime => "announcement timestamp not readable",
            Self::ApprovedBeforeAnnouncement => "second approval not after the announcement",
            Self::MissingReviewer => "not approved by the required reviewer",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub pr_number: u64,
    pub reason: RejectReason,
}

#[derive(Debug)]
pub struct FilterOutcome<'a> {
    /// Eligible PRs in input order.
    pub eligible: Vec<&'a PullRequest>,
    pub rejected: Vec<Rejection>,
}

pub fn filter_eligible<'a>(
    prs: &'a [PullRequest],
    messages: &[ChatMessage],
    range: &DateRange,
    required_reviewer: Option<&str>,
) -> FilterOutcome<'a> {
    let mut outcome = FilterOutcome {
        eligible: Vec::new(),
        rejected: Vec::new(),
    };

    for pr in prs {
        match check(pr, messages, range, required_reviewer) {
            Ok(()) => outcome.eligible.push(pr),
            Err(reason) => {
                tracing::debug!(pr_number = pr.number, %reason, "Excluding PR");
                outcome.rejected.push(Rejection {
                    pr_number: pr.number,
                    reason,
                });
            }
        }
    }

    outcome
}

fn check(
    pr: &PullRequest,
    messages: &[ChatMessage],
    range: &DateRange,
    required_reviewer: Option<&str>,
) -> Result<(), RejectReason> {
    if !range.contains(pr.created_at) {
        return Err(RejectReason::OutsideDateRange);
    }

    let second_approval = pr.second_approval().ok_or(RejectReason::TooFewApprovals)?;

    let message =
        find_correlated_message(pr.number, messages).ok_or(RejectReason::NoAnnouncement)?;

    let sent_at = message
        .sent_at()
        .ok_or(RejectReason::UnparsableAnnouncementTime)?;
    if (second_approval.created_at - sent_at).num_milliseconds() <= 0 {
        return Err(RejectReason::ApprovedBeforeAnnouncement);
    }

    if let Some(login) = required_reviewer {
        if !pr.approved_by(login) {
            return Err(RejectReason::MissingReviewer);
        }
    }

    Ok(())
}

/// Splits PRs by whether `reviewer` approved them, preserving order.
pub fn partition_by_reviewer<'a>(
    prs: &[&'a PullRequest],
    reviewer: &str,
) -> (Vec<&'a PullRequest>, Vec<&'a PullRequest>) {
    prs.iter().copied().partition(|pr| pr.approved_by(reviewer))
}
