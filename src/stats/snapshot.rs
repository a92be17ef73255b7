use std::path::Path;

use crate::foundation::error::{WrapError, WrapResult};

/// English month names indexed by `month - 1`.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Commit count for one calendar month (`month` is 1-based).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MonthlyCount {
    pub month: u8,
    pub commits: u64,
}

/// One contributor row of the leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub commits: u64,
}

/// Categorical "busiest" winners. All `None` when the year had no commits.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BusiestTimes {
    /// Weekday name, e.g. `"Tuesday"`.
    #[serde(default)]
    pub day: Option<String>,
    /// Month name, e.g. `"March"`.
    #[serde(default)]
    pub month: Option<String>,
    /// Hour of day in `0..24`.
    #[serde(default)]
    pub peak_hour: Option<u8>,
}

/// The largest merged pull request of the year.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PullRequestSummary {
    pub number: u64,
    pub title: String,
    /// Additions plus deletions.
    pub lines: u64,
}

/// Immutable year-in-review fact record.
///
/// Invariants checked by [`StatSnapshot::validate`]:
/// - `monthly` has exactly 12 entries, months `1..=12` in order (zero months present, never
///   omitted);
/// - `leaderboard` is non-increasing by commit count.
///
/// Counts are unsigned, so non-negativity holds by construction.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StatSnapshot {
    pub repo_name: String,
    pub year: i32,
    pub total_commits: u64,
    #[serde(default)]
    pub total_prs: u64,
    #[serde(default)]
    pub total_releases: u64,
    #[serde(default)]
    pub lines_added: u64,
    #[serde(default)]
    pub lines_deleted: u64,
    #[serde(default)]
    pub weekend_commits: u64,
    #[serde(default)]
    pub days_with_commits: u64,
    #[serde(default)]
    pub busiest: BusiestTimes,
    pub monthly: Vec<MonthlyCount>,
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub biggest_pr: Option<PullRequestSummary>,
    #[serde(default)]
    pub first_release: Option<String>,
    #[serde(default)]
    pub last_release: Option<String>,
}

impl StatSnapshot {
    /// Snapshot with every count zero and a full 12-month series.
    pub fn empty(repo_name: impl Into<String>, year: i32) -> Self {
        Self {
            repo_name: repo_name.into(),
            year,
            total_commits: 0,
            total_prs: 0,
            total_releases: 0,
            lines_added: 0,
            lines_deleted: 0,
            weekend_commits: 0,
            days_with_commits: 0,
            busiest: BusiestTimes::default(),
            monthly: (1..=12)
                .map(|month| MonthlyCount { month, commits: 0 })
                .collect(),
            leaderboard: Vec::new(),
            biggest_pr: None,
            first_release: None,
            last_release: None,
        }
    }

    /// Parse and validate a snapshot from JSON text.
    pub fn from_json_str(s: &str) -> WrapResult<Self> {
        let snap: Self = serde_json::from_str(s).map_err(|e| WrapError::serde(e.to_string()))?;
        snap.validate()?;
        Ok(snap)
    }

    /// Parse and validate a snapshot from a JSON file.
    pub fn from_json_path(path: &Path) -> WrapResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            WrapError::config(format!(
                "failed to read stats file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> WrapResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| WrapError::serde(e.to_string()))
    }

    pub fn validate(&self) -> WrapResult<()> {
        if self.monthly.len() != 12 {
            return Err(WrapError::validation(format!(
                "monthly series must have 12 entries, got {}",
                self.monthly.len()
            )));
        }
        for (i, m) in self.monthly.iter().enumerate() {
            if usize::from(m.month) != i + 1 {
                return Err(WrapError::validation(format!(
                    "monthly series entry {i} has month {}, expected {}",
                    m.month,
                    i + 1
                )));
            }
        }
        for pair in self.leaderboard.windows(2) {
            if pair[1].commits > pair[0].commits {
                return Err(WrapError::validation(format!(
                    "leaderboard is not sorted: '{}' ({}) before '{}' ({})",
                    pair[0].name, pair[0].commits, pair[1].name, pair[1].commits
                )));
            }
        }
        if let Some(h) = self.busiest.peak_hour
            && h >= 24
        {
            return Err(WrapError::validation(format!("peak_hour {h} out of range")));
        }
        Ok(())
    }

    /// Monthly commit counts as a fixed array, January first.
    pub fn monthly_counts(&self) -> [u64; 12] {
        let mut out = [0u64; 12];
        for m in &self.monthly {
            if (1..=12).contains(&m.month) {
                out[usize::from(m.month - 1)] = m.commits;
            }
        }
        out
    }

    /// Commits in the busiest month, if one is named.
    pub fn busiest_month_commits(&self) -> Option<u64> {
        let name = self.busiest.month.as_deref()?;
        let idx = MONTH_NAMES.iter().position(|m| *m == name)?;
        Some(self.monthly_counts()[idx])
    }

    /// Signed net line change.
    pub fn net_lines(&self) -> i64 {
        let added = i64::try_from(self.lines_added).unwrap_or(i64::MAX);
        let deleted = i64::try_from(self.lines_deleted).unwrap_or(i64::MAX);
        added.saturating_sub(deleted)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stats/snapshot.rs"]
mod tests;
