use super::*;

fn sample() -> StatSnapshot {
    let mut s = StatSnapshot::empty("acme/widgets", 2024);
    s.total_commits = 120;
    s.monthly[0].commits = 10;
    s.monthly[1].commits = 5;
    s.leaderboard = vec![
        LeaderboardEntry {
            name: "alice".into(),
            commits: 80,
        },
        LeaderboardEntry {
            name: "bob".into(),
            commits: 40,
        },
    ];
    s
}

#[test]
fn empty_snapshot_has_twelve_zero_months() {
    let s = StatSnapshot::empty("r", 2024);
    assert_eq!(s.monthly.len(), 12);
    assert!(s.monthly.iter().all(|m| m.commits == 0));
    assert_eq!(s.monthly[11].month, 12);
    s.validate().unwrap();
}

#[test]
fn validate_rejects_short_monthly_series() {
    let mut s = sample();
    s.monthly.pop();
    assert!(s.validate().is_err());
}

#[test]
fn validate_rejects_out_of_order_months() {
    let mut s = sample();
    s.monthly.swap(2, 3);
    assert!(s.validate().is_err());
}

#[test]
fn validate_rejects_increasing_leaderboard() {
    let mut s = sample();
    s.leaderboard.reverse();
    assert!(s.validate().is_err());
}

#[test]
fn json_round_trip_keeps_optional_defaults() {
    let json = r#"{
        "repo_name": "acme/widgets",
        "year": 2024,
        "total_commits": 3,
        "monthly": [
            {"month": 1, "commits": 3}, {"month": 2, "commits": 0},
            {"month": 3, "commits": 0}, {"month": 4, "commits": 0},
            {"month": 5, "commits": 0}, {"month": 6, "commits": 0},
            {"month": 7, "commits": 0}, {"month": 8, "commits": 0},
            {"month": 9, "commits": 0}, {"month": 10, "commits": 0},
            {"month": 11, "commits": 0}, {"month": 12, "commits": 0}
        ]
    }"#;
    let s = StatSnapshot::from_json_str(json).unwrap();
    assert_eq!(s.total_prs, 0);
    assert!(s.leaderboard.is_empty());
    assert_eq!(s.busiest, BusiestTimes::default());
    let again = StatSnapshot::from_json_str(&s.to_json_pretty().unwrap()).unwrap();
    assert_eq!(again, s);
}

#[test]
fn busiest_month_commits_looks_up_by_name() {
    let mut s = sample();
    s.busiest.month = Some("January".into());
    assert_eq!(s.busiest_month_commits(), Some(10));
    s.busiest.month = Some("Smarch".into());
    assert_eq!(s.busiest_month_commits(), None);
}

#[test]
fn net_lines_can_be_negative() {
    let mut s = sample();
    s.lines_added = 10;
    s.lines_deleted = 25;
    assert_eq!(s.net_lines(), -15);
}
