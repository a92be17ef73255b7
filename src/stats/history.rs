use chrono::{DateTime, FixedOffset};

/// One commit as reported by the history source.
///
/// `timestamp` keeps the author's UTC offset so weekday/hour buckets use the author's local
/// clock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitRecord {
    pub author: String,
    pub timestamp: DateTime<FixedOffset>,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

/// One merged pull request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PullRequestRecord {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub merged_at: DateTime<FixedOffset>,
    pub lines: u64,
}

/// One published release (a tag).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseRecord {
    pub name: String,
    pub created_at: DateTime<FixedOffset>,
}

/// Raw history for one repository.
///
/// Commits are listed in the order the source reported them. That order defines "first seen" for
/// leaderboard tie-breaking.
#[derive(Clone, Debug, Default)]
pub struct History {
    pub repo_name: String,
    pub commits: Vec<CommitRecord>,
    pub pull_requests: Vec<PullRequestRecord>,
    pub releases: Vec<ReleaseRecord>,
}
