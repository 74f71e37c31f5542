use chrono::{DateTime, TimeZone, Utc};
use review_wait::config::{DateRange, RepoId, ReviewerMode};
use review_wait::fetcher::build_repo_report;
use review_wait::filter::RejectReason;
use review_wait::github::{PullRequest, Review, ReviewState};
use review_wait::report::render_repo_report;
use review_wait::slack::ChatMessage;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
}

fn repo() -> RepoId {
    RepoId {
        owner: "purepm".to_string(),
        repo: "backend-monorepo".to_string(),
    }
}

fn range() -> DateRange {
    DateRange::new(at(1, 0), at(30, 0)).unwrap()
}

fn pr(number: u64, reviews: &[(&str, DateTime<Utc>)]) -> PullRequest {
    PullRequest {
        number,
        title: format!("Change #{number}"),
        created_at: at(10, 8),
        merged_at: Some(at(12, 8)),
        approved_reviews: reviews
            .iter()
            .map(|(login, created_at)| Review {
                author_login: login.to_string(),
                created_at: *created_at,
                state: ReviewState::Approved,
            })
            .collect(),
    }
}

fn announce(number: u64, sent_at: DateTime<Utc>) -> ChatMessage {
    ChatMessage::from_raw(
        &format!("backend <https://github.com/purepm/backend-monorepo/pull/{number}>"),
        &format!("{}.000000", sent_at.timestamp()),
    )
}

fn fixture() -> (Vec<PullRequest>, Vec<ChatMessage>) {
    let prs = vec![
        // Announced at 09:00, second approval at 14:00: waits five hours.
        pr(100, &[("ann", at(10, 10)), ("mopurepm", at(10, 14))]),
        // Only one approval.
        pr(101, &[("ann", at(10, 10))]),
        // Never announced.
        pr(102, &[("ann", at(10, 10)), ("bob", at(10, 11))]),
        // Announced at 09:00, second approval at 10:00: waits one hour.
        pr(103, &[("bob", at(10, 10)), ("ann", at(10, 9))]),
        // Announced at 09:00, second approval the next day at 09:00.
        pr(104, &[("mopurepm", at(11, 9)), ("bob", at(10, 9))]),
    ];
    let messages = vec![
        ChatMessage::from_raw("standup notes", "1718000000.000100"),
        announce(100, at(10, 9)),
        announce(101, at(10, 9)),
        announce(103, at(10, 9)),
        announce(104, at(10, 9)),
    ];
    (prs, messages)
}

#[test]
fn test_partitioned_report() {
    let (prs, messages) = fixture();

    let report = build_repo_report(
        &repo(),
        &prs,
        &messages,
        &range(),
        Some("mopurepm"),
        ReviewerMode::Partition,
    );

    assert_eq!(report.fetched, 5);
    assert_eq!(report.eligible(), 3);
    let reasons: Vec<(u64, RejectReason)> = report
        .rejected
        .iter()
        .map(|r| (r.pr_number, r.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (101, RejectReason::TooFewApprovals),
            (102, RejectReason::NoAnnouncement),
        ]
    );

    assert_eq!(report.groups.len(), 2);
    let with = &report.groups[0];
    let without = &report.groups[1];

    let numbers: Vec<u64> = with.records.iter().map(|r| r.pr_number).collect();
    assert_eq!(numbers, vec![100, 104]);
    assert_eq!(with.records[0].wait_millis, 18_000_000);
    assert_eq!(with.summary.most_delayed.as_ref().unwrap().pr_number, 104);
    assert_eq!(with.summary.quickest.as_ref().unwrap().pr_number, 100);

    assert_eq!(without.records.len(), 1);
    assert_eq!(without.records[0].pr_number, 103);
    assert_eq!(without.summary.average_millis(), Some(3_600_000));

    // (5h + 24h) / 2 - 1h
    assert_eq!(report.comparison(), Some(48_600_000));
}

#[test]
fn test_required_reviewer_report() {
    let (prs, messages) = fixture();

    let report = build_repo_report(
        &repo(),
        &prs,
        &messages,
        &range(),
        Some("mopurepm"),
        ReviewerMode::Require,
    );

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.eligible(), 2);
    assert!(report
        .rejected
        .iter()
        .any(|r| r.pr_number == 103 && r.reason == RejectReason::MissingReviewer));
    assert_eq!(report.comparison(), None);
}

#[test]
fn test_empty_snapshot_rejects_everything() {
    let (prs, _) = fixture();

    let report = build_repo_report(&repo(), &prs, &[], &range(), None, ReviewerMode::Partition);

    assert_eq!(report.eligible(), 0);
    let summary = &report.groups[0].summary;
    assert_eq!(summary.count, 0);
    assert_eq!(summary.total_wait_millis, 0);
    assert!(summary.most_delayed.is_none());
    assert!(summary.quickest.is_none());

    let rendered = render_repo_report(&report).unwrap();
    assert!(rendered.contains("No PRs found within the specified date range."));
}

#[test]
fn test_sub_millisecond_wait_is_excluded() {
    let prs = vec![pr(
        100,
        &[
            ("ann", at(10, 8)),
            ("bob", at(10, 9) + chrono::Duration::microseconds(500)),
        ],
    )];
    let messages = vec![announce(100, at(10, 9))];

    let report = build_repo_report(&repo(), &prs, &messages, &range(), None, ReviewerMode::Partition);

    assert_eq!(report.eligible(), 0);
    assert_eq!(report.rejected[0].reason, RejectReason::ApprovedBeforeAnnouncement);
    assert_eq!(report.groups[0].summary.count, 0);
}

#[test]
fn test_rendered_report_lists_extremes() {
    console::set_colors_enabled(false);
    let (prs, messages) = fixture();

    let report = build_repo_report(
        &repo(),
        &prs,
        &messages,
        &range(),
        Some("mopurepm"),
        ReviewerMode::Partition,
    );
    let rendered = render_repo_report(&report).unwrap();

    assert!(rendered.contains("PUREPM/BACKEND-MONOREPO"));
    assert!(rendered.contains("Date Range: 2024-06-01 to 2024-06-30"));
    assert!(rendered.contains("Fetched 5 PRs, 3 matched the criteria."));
    assert!(rendered.contains("excluded (fewer than two approvals): 1"));
    assert!(rendered.contains("URL: https://github.com/purepm/backend-monorepo/pull/104"));
    assert!(rendered.contains("Slack Message: Mon, Jun 10, 2024, 9:00 AM"));
    assert!(rendered.contains("Time Difference: 1 days, 0 hours, 0 minutes, 0 seconds"));
    assert!(rendered.contains(
        "PRs approved by mopurepm waited 0 days, 13 hours, 30 minutes, 0 seconds longer on average than PRs not approved by mopurepm."
    ));
}

#[test]
fn test_repo_report_json_contract() {
    // `report --json` output; field names are relied on by downstream scripts.
    let (prs, messages) = fixture();
    let report = build_repo_report(&repo(), &prs, &messages, &range(), None, ReviewerMode::Partition);

    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["repo_id"]["owner"], "purepm");
    assert_eq!(json["fetched"], 5);
    assert_eq!(json["rejected"][0]["reason"], "TooFewApprovals");
    let group = &json["groups"][0];
    assert_eq!(group["label"], "All PRs");
    assert_eq!(group["summary"]["count"], 3);
    assert_eq!(group["summary"]["total_wait_millis"], 18_000_000 + 3_600_000 + 86_400_000);
    assert_eq!(group["summary"]["most_delayed"]["pr_number"], 104);
    assert_eq!(group["records"][0]["message_sent_at"], "2024-06-10T09:00:00Z");
}
