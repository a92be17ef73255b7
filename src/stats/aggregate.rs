use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use std::collections::{BTreeSet, HashMap};

use crate::stats::history::History;
use crate::stats::snapshot::{
    BusiestTimes, LeaderboardEntry, MONTH_NAMES, MonthlyCount, PullRequestSummary, StatSnapshot,
};

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Reduce raw history to the facts of calendar year `year`.
///
/// Records outside the year are ignored. Ties for "busiest" winners resolve to the earliest
/// bucket (Monday, January, hour 0). Leaderboard ties keep first-seen order.
#[tracing::instrument(skip(history), fields(repo = %history.repo_name))]
pub fn aggregate(history: &History, year: i32) -> StatSnapshot {
    let mut snap = StatSnapshot::empty(history.repo_name.clone(), year);

    let mut monthly = [0u64; 12];
    let mut weekdays = [0u64; 7];
    let mut hours = [0u64; 24];
    let mut days = BTreeSet::<NaiveDate>::new();
    let mut author_slots = HashMap::<&str, usize>::new();
    let mut leaderboard = Vec::<LeaderboardEntry>::new();

    for c in history.commits.iter().filter(|c| c.timestamp.year() == year) {
        snap.total_commits += 1;
        snap.lines_added += c.lines_added;
        snap.lines_deleted += c.lines_deleted;

        let ts = c.timestamp;
        monthly[ts.month0() as usize] += 1;
        weekdays[ts.weekday().num_days_from_monday() as usize] += 1;
        hours[ts.hour() as usize] += 1;
        if matches!(ts.weekday(), Weekday::Sat | Weekday::Sun) {
            snap.weekend_commits += 1;
        }
        days.insert(ts.date_naive());

        let slot = *author_slots.entry(c.author.as_str()).or_insert_with(|| {
            leaderboard.push(LeaderboardEntry {
                name: c.author.clone(),
                commits: 0,
            });
            leaderboard.len() - 1
        });
        leaderboard[slot].commits += 1;
    }

    snap.days_with_commits = days.len() as u64;
    snap.monthly = monthly
        .iter()
        .enumerate()
        .map(|(i, &commits)| MonthlyCount {
            month: (i + 1) as u8,
            commits,
        })
        .collect();

    // `sort_by` is stable, so equal counts keep first-seen order.
    leaderboard.sort_by(|a, b| b.commits.cmp(&a.commits));
    snap.leaderboard = leaderboard;

    if snap.total_commits > 0 {
        snap.busiest = BusiestTimes {
            day: argmax(&weekdays).map(|i| WEEKDAY_NAMES[i].to_string()),
            month: argmax(&monthly).map(|i| MONTH_NAMES[i].to_string()),
            peak_hour: argmax(&hours).map(|i| i as u8),
        };
    }

    let prs = history
        .pull_requests
        .iter()
        .filter(|p| p.merged_at.year() == year)
        .collect::<Vec<_>>();
    snap.total_prs = prs.len() as u64;
    let mut biggest: Option<&crate::stats::history::PullRequestRecord> = None;
    for p in &prs {
        if biggest.is_none_or(|b| p.lines > b.lines) {
            biggest = Some(p);
        }
    }
    snap.biggest_pr = biggest.map(|p| PullRequestSummary {
        number: p.number,
        title: p.title.clone(),
        lines: p.lines,
    });

    let mut releases = history
        .releases
        .iter()
        .filter(|r| r.created_at.year() == year)
        .collect::<Vec<_>>();
    releases.sort_by_key(|r| r.created_at);
    snap.total_releases = releases.len() as u64;
    snap.first_release = releases.first().map(|r| r.name.clone());
    snap.last_release = releases.last().map(|r| r.name.clone());

    tracing::debug!(
        commits = snap.total_commits,
        prs = snap.total_prs,
        releases = snap.total_releases,
        contributors = snap.leaderboard.len(),
        "aggregated history"
    );
    snap
}

/// Index of the first maximum, `None` when every bucket is zero.
fn argmax(buckets: &[u64]) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (i, &v) in buckets.iter().enumerate() {
        if v > 0 && best.is_none_or(|(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
#[path = "../../tests/unit/stats/aggregate.rs"]
mod tests;
