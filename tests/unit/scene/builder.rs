use super::*;
use crate::animation::anim::{ResolvedVisual, evaluate};
use crate::stats::snapshot::LeaderboardEntry;

fn scenario() -> StatSnapshot {
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
    s.busiest.day = Some("Tuesday".into());
    s.busiest.month = Some("January".into());
    s.busiest.peak_hour = Some(14);
    s
}

fn kinds(scenes: &[Scene]) -> Vec<SceneKind> {
    scenes.iter().map(|s| s.kind).collect()
}

#[test]
fn scenario_produces_non_empty_sequence() {
    let scenes = SceneBuilder::default().build(&scenario()).unwrap();
    assert!(!scenes.is_empty());
    // no PRs and no releases in the scenario
    assert_eq!(
        kinds(&scenes),
        vec![
            SceneKind::Intro,
            SceneKind::TotalCommits,
            SceneKind::Leaderboard,
            SceneKind::BusiestTimes,
            SceneKind::LinesOfCode,
            SceneKind::MonthlyChart,
            SceneKind::Outro,
        ]
    );
    for (i, s) in scenes.iter().enumerate() {
        assert_eq!(s.index, i);
        assert!(s.layers[0].is_background());
        assert!(s.narration.as_deref().is_some_and(|n| !n.is_empty()));
        assert!(!s.placeholder);
    }
}

#[test]
fn build_is_deterministic() {
    let b = SceneBuilder::default();
    assert_eq!(b.build(&scenario()).unwrap(), b.build(&scenario()).unwrap());
}

#[test]
fn empty_snapshot_uses_placeholders_not_blank_scenes() {
    let scenes = SceneBuilder::default()
        .build(&StatSnapshot::empty("r", 2024))
        .unwrap();
    let placeholders = scenes
        .iter()
        .filter(|s| s.placeholder)
        .map(|s| s.kind)
        .collect::<Vec<_>>();
    assert_eq!(
        placeholders,
        vec![
            SceneKind::Leaderboard,
            SceneKind::BusiestTimes,
            SceneKind::MonthlyChart
        ]
    );
    for s in &scenes {
        assert!(s.layers.len() > 1, "scene {:?} has only a background", s.kind);
    }
}

#[test]
fn prs_and_releases_appear_when_present() {
    let mut s = scenario();
    s.total_prs = 12;
    s.total_releases = 3;
    s.first_release = Some("v1.0".into());
    s.last_release = Some("v1.3".into());
    let k = kinds(&SceneBuilder::default().build(&s).unwrap());
    assert!(k.contains(&SceneKind::PullRequests));
    assert!(k.contains(&SceneKind::Releases));
}

#[test]
fn include_flags_and_explicit_order() {
    let opts = BuildOptions {
        scene_order: Some(vec![
            SceneKind::Outro,
            SceneKind::MonthlyChart,
            SceneKind::Leaderboard,
            SceneKind::Intro,
        ]),
        include_chart: false,
        ..BuildOptions::default()
    };
    let scenes = SceneBuilder::new(opts).build(&scenario()).unwrap();
    assert_eq!(
        kinds(&scenes),
        vec![SceneKind::Outro, SceneKind::Leaderboard, SceneKind::Intro]
    );
}

#[test]
fn duplicate_or_empty_selection_is_rejected() {
    let dup = BuildOptions {
        scene_order: Some(vec![SceneKind::Intro, SceneKind::Intro]),
        ..BuildOptions::default()
    };
    assert!(SceneBuilder::new(dup).build(&scenario()).is_err());

    let nothing = BuildOptions {
        scene_order: Some(vec![SceneKind::PullRequests]),
        ..BuildOptions::default()
    };
    assert!(SceneBuilder::new(nothing).build(&scenario()).is_err());
}

#[test]
fn short_duration_override_squeezes_animations() {
    let mut durations = HashMap::new();
    durations.insert(SceneKind::Leaderboard, 2.0);
    let opts = BuildOptions {
        durations,
        ..BuildOptions::default()
    };
    let scenes = SceneBuilder::new(opts).build(&scenario()).unwrap();
    let lb = scenes
        .iter()
        .find(|s| s.kind == SceneKind::Leaderboard)
        .unwrap();
    assert_eq!(lb.duration, 2.0);
    lb.validate().unwrap();

    let mut bad = HashMap::new();
    bad.insert(SceneKind::Intro, 0.0);
    let opts = BuildOptions {
        durations: bad,
        ..BuildOptions::default()
    };
    assert!(SceneBuilder::new(opts).build(&scenario()).is_err());
}

#[test]
fn static_mode_shows_end_state_from_time_zero() {
    let opts = BuildOptions {
        mode: RenderMode::Static,
        ..BuildOptions::default()
    };
    let scenes = SceneBuilder::new(opts).build(&scenario()).unwrap();
    let commits = scenes
        .iter()
        .find(|s| s.kind == SceneKind::TotalCommits)
        .unwrap();
    let counter = commits.layers.iter().find(|l| l.name == "commits").unwrap();
    let at_start = evaluate(counter, 0.0);
    let at_end = evaluate(counter, commits.duration);
    assert_eq!(at_start.visual, ResolvedVisual::Text("120".into()));
    assert_eq!(at_start, at_end);
    assert_eq!(at_end.opacity, 1.0);
}

#[test]
fn animated_mode_fades_content_out_at_scene_end() {
    let scenes = SceneBuilder::default().build(&scenario()).unwrap();
    let intro = &scenes[0];
    let title = intro.layers.iter().find(|l| l.name == "repo").unwrap();
    assert_eq!(evaluate(title, intro.duration).opacity, 0.0);
    assert_eq!(evaluate(title, intro.duration / 2.0).opacity, 1.0);
    // backgrounds never fade
    assert_eq!(evaluate(&intro.layers[0], intro.duration).opacity, 1.0);
}

#[test]
fn chart_has_twelve_bars() {
    let scenes = SceneBuilder::default().build(&scenario()).unwrap();
    let chart_scene = scenes
        .iter()
        .find(|s| s.kind == SceneKind::MonthlyChart)
        .unwrap();
    let chart = chart_scene
        .layers
        .iter()
        .find_map(|l| match &l.content {
            LayerContent::Chart(c) => Some(c),
            _ => None,
        })
        .unwrap();
    assert_eq!(chart.bars.len(), 12);
    assert_eq!(chart.axis_max(), 10.0);
    assert_eq!(chart.bars[0].label, "Jan");
}

#[test]
fn ellipsize_counts_chars() {
    assert_eq!(ellipsize("short", 10), "short");
    assert_eq!(ellipsize("abcdefghij", 5), "abcd…");
    assert_eq!(ellipsize("ünïcödé", 7), "ünïcödé");
}
