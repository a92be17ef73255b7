use super::*;
use crate::stats::history::{CommitRecord, PullRequestRecord, ReleaseRecord};
use chrono::DateTime;

fn ts(s: &str) -> chrono::DateTime<chrono::FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn commit(author: &str, at: &str, added: u64, deleted: u64) -> CommitRecord {
    CommitRecord {
        author: author.into(),
        timestamp: ts(at),
        lines_added: added,
        lines_deleted: deleted,
    }
}

#[test]
fn monthly_series_always_has_twelve_entries() {
    let history = History {
        repo_name: "r".into(),
        commits: vec![commit("a", "2024-03-05T10:00:00+00:00", 1, 0)],
        ..History::default()
    };
    let snap = aggregate(&history, 2024);
    assert_eq!(snap.monthly.len(), 12);
    assert_eq!(snap.monthly_counts()[2], 1);
    assert_eq!(snap.monthly_counts().iter().sum::<u64>(), 1);
    snap.validate().unwrap();
}

#[test]
fn leaderboard_ties_keep_first_seen_order() {
    let history = History {
        repo_name: "r".into(),
        commits: vec![
            commit("carol", "2024-01-01T09:00:00+00:00", 0, 0),
            commit("bob", "2024-01-02T09:00:00+00:00", 0, 0),
            commit("alice", "2024-01-03T09:00:00+00:00", 0, 0),
            commit("alice", "2024-01-04T09:00:00+00:00", 0, 0),
            commit("bob", "2024-01-05T09:00:00+00:00", 0, 0),
        ],
        ..History::default()
    };
    let snap = aggregate(&history, 2024);
    let names = snap
        .leaderboard
        .iter()
        .map(|e| (e.name.as_str(), e.commits))
        .collect::<Vec<_>>();
    assert_eq!(names, vec![("bob", 2), ("alice", 2), ("carol", 1)]);
}

#[test]
fn other_years_are_ignored() {
    let history = History {
        repo_name: "r".into(),
        commits: vec![
            commit("a", "2023-12-31T23:00:00+00:00", 5, 5),
            commit("a", "2024-06-01T12:00:00+00:00", 7, 2),
        ],
        ..History::default()
    };
    let snap = aggregate(&history, 2024);
    assert_eq!(snap.total_commits, 1);
    assert_eq!(snap.lines_added, 7);
    assert_eq!(snap.lines_deleted, 2);
}

#[test]
fn busiest_and_weekend_facts() {
    // 2024-06-01 is a Saturday, 2024-06-04 a Tuesday.
    let history = History {
        repo_name: "r".into(),
        commits: vec![
            commit("a", "2024-06-01T14:00:00+02:00", 0, 0),
            commit("a", "2024-06-04T14:30:00+02:00", 0, 0),
            commit("a", "2024-06-04T09:00:00+02:00", 0, 0),
        ],
        ..History::default()
    };
    let snap = aggregate(&history, 2024);
    assert_eq!(snap.weekend_commits, 1);
    assert_eq!(snap.days_with_commits, 2);
    assert_eq!(snap.busiest.day.as_deref(), Some("Tuesday"));
    assert_eq!(snap.busiest.month.as_deref(), Some("June"));
    assert_eq!(snap.busiest.peak_hour, Some(14));
}

#[test]
fn no_commits_means_no_busiest_winners() {
    let snap = aggregate(&History::default(), 2024);
    assert_eq!(snap.busiest, BusiestTimes::default());
    assert_eq!(snap.total_commits, 0);
}

#[test]
fn prs_and_releases_are_summarized() {
    let history = History {
        repo_name: "r".into(),
        pull_requests: vec![
            PullRequestRecord {
                number: 1,
                title: "small".into(),
                author: "a".into(),
                merged_at: ts("2024-02-01T00:00:00+00:00"),
                lines: 10,
            },
            PullRequestRecord {
                number: 2,
                title: "huge".into(),
                author: "b".into(),
                merged_at: ts("2024-03-01T00:00:00+00:00"),
                lines: 900,
            },
            PullRequestRecord {
                number: 3,
                title: "last year".into(),
                author: "b".into(),
                merged_at: ts("2023-03-01T00:00:00+00:00"),
                lines: 5000,
            },
        ],
        releases: vec![
            ReleaseRecord {
                name: "v1.2.0".into(),
                created_at: ts("2024-09-01T00:00:00+00:00"),
            },
            ReleaseRecord {
                name: "v1.0.0".into(),
                created_at: ts("2024-01-15T00:00:00+00:00"),
            },
        ],
        ..History::default()
    };
    let snap = aggregate(&history, 2024);
    assert_eq!(snap.total_prs, 2);
    assert_eq!(snap.biggest_pr.as_ref().map(|p| p.number), Some(2));
    assert_eq!(snap.total_releases, 2);
    assert_eq!(snap.first_release.as_deref(), Some("v1.0.0"));
    assert_eq!(snap.last_release.as_deref(), Some("v1.2.0"));
}
