use super::*;
use crate::scene::model::SceneKind;

fn scenes(durations: &[f64]) -> Vec<Scene> {
    durations
        .iter()
        .enumerate()
        .map(|(index, &duration)| Scene {
            index,
            kind: SceneKind::DEFAULT_ORDER[index % SceneKind::DEFAULT_ORDER.len()],
            duration,
            layers: Vec::new(),
            narration: None,
            placeholder: false,
        })
        .collect()
}

#[test]
fn total_is_sum_minus_overlap() {
    let cases: [(&[f64], f64); 4] = [
        (&[5.0], 0.0),
        (&[5.0, 7.0, 6.0], 0.0),
        (&[5.0, 7.0, 6.0], 0.5),
        (&[2.0, 2.0, 2.0, 2.0], 1.0),
    ];
    for (durations, crossfade) in cases {
        let tl = Timeline::new(scenes(durations), crossfade).unwrap();
        let expected = durations.iter().sum::<f64>() - crossfade * (durations.len() - 1) as f64;
        assert!((tl.total_duration() - expected).abs() < 1e-9);
    }
}

#[test]
fn intervals_partition_the_timeline() {
    for crossfade in [0.0, 0.5] {
        let tl = Timeline::new(scenes(&[5.0, 7.0, 6.0]), crossfade).unwrap();
        let mut cursor = 0.0;
        for i in 0..3 {
            let (start, end) = tl.scene_interval(i).unwrap();
            assert!((start - cursor).abs() < 1e-9);
            assert!(end > start);
            cursor = end;
        }
        assert!((cursor - tl.total_duration()).abs() < 1e-9);
        assert!(tl.scene_interval(3).is_none());
    }
}

#[test]
fn at_returns_owner_with_local_time_in_range() {
    for crossfade in [0.0, 0.5] {
        let tl = Timeline::new(scenes(&[5.0, 7.0, 6.0]), crossfade).unwrap();
        for i in 0..3 {
            let (start, end) = tl.scene_interval(i).unwrap();
            let mut t = start;
            while t < end {
                let p = tl.at(t);
                assert_eq!(p.scene.index, i, "t={t} crossfade={crossfade}");
                assert!(p.local_time >= 0.0 && p.local_time < p.scene.duration);
                t += 0.05;
            }
        }
    }
}

#[test]
fn at_is_idempotent_and_monotonic() {
    let tl = Timeline::new(scenes(&[3.0, 4.0, 5.0]), 0.5).unwrap();
    let total = tl.total_duration();
    let mut prev_index = 0;
    for k in 0..=500 {
        let t = total * f64::from(k) / 500.0;
        let a = tl.at(t);
        let b = tl.at(t);
        assert_eq!(a, b);
        assert!(a.scene.index >= prev_index);
        prev_index = a.scene.index;
    }
    assert_eq!(tl.total_duration(), total);
}

#[test]
fn crossfade_reports_outgoing_scene() {
    let tl = Timeline::new(scenes(&[4.0, 4.0]), 1.0).unwrap();
    assert_eq!(tl.scene_start(1), Some(3.0));

    let p = tl.at(3.25);
    assert_eq!(p.scene.index, 1);
    assert!((p.local_time - 0.25).abs() < 1e-9);
    let out = p.outgoing.unwrap();
    assert_eq!(out.scene.index, 0);
    assert!((out.local_time - 3.25).abs() < 1e-9);
    assert!((out.progress - 0.25).abs() < 1e-9);

    assert!(tl.at(2.9).outgoing.is_none());
    assert!(tl.at(4.1).outgoing.is_none());
}

#[test]
fn hard_cuts_never_report_outgoing() {
    let tl = Timeline::new(scenes(&[1.0, 1.0]), 0.0).unwrap();
    assert!(tl.at(1.0).outgoing.is_none());
    assert_eq!(tl.at(1.0).scene.index, 1);
}

#[test]
fn end_and_out_of_range_clamp() {
    let tl = Timeline::new(scenes(&[2.0, 3.0]), 0.0).unwrap();
    let end = tl.at(10.0);
    assert_eq!(end.scene.index, 1);
    assert_eq!(end.local_time, 3.0);
    let before = tl.at(-1.0);
    assert_eq!(before.scene.index, 0);
    assert_eq!(before.local_time, 0.0);
}

#[test]
fn invalid_layouts_are_rejected() {
    assert!(Timeline::new(Vec::new(), 0.0).is_err());
    assert!(Timeline::new(scenes(&[2.0, 3.0]), 1.5).is_err());
    assert!(Timeline::new(scenes(&[2.0, 3.0]), -0.1).is_err());
    let mut bad = scenes(&[2.0, 3.0]);
    bad[1].index = 7;
    assert!(Timeline::new(bad, 0.0).is_err());
}

#[test]
fn max_crossfade_is_half_the_shortest_scene() {
    assert_eq!(Timeline::max_crossfade(&scenes(&[5.0, 7.0, 6.0])), 2.5);
    assert_eq!(Timeline::max_crossfade(&scenes(&[4.0])), f64::INFINITY);
    assert!(Timeline::new(scenes(&[5.0, 7.0]), 2.5).is_ok());
    assert!(Timeline::new(scenes(&[5.0, 7.0]), 2.6).is_err());
}
