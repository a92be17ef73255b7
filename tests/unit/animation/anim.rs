use super::*;
use crate::foundation::core::{Point, Rgba8};
use crate::scene::model::{ChartBar, ChartLayer, HAlign, TextLayer, TextStyle};

fn style() -> TextStyle {
    TextStyle {
        size_px: 40.0,
        color: Rgba8::rgb(255, 255, 255),
        align: HAlign::Center,
    }
}

fn counter(to: f64, start: f64, end: f64, ease: Ease) -> Layer {
    Layer::text("count", Point::new(540.0, 960.0), TextLayer::counter(style())).with(
        AnimationSpec::new(AnimKind::CountUp, 0.0, to, start, end, ease),
    )
}

fn text_of(r: &ResolvedLayer) -> &str {
    match &r.visual {
        ResolvedVisual::Text(s) => s,
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn count_up_midpoint_linear() {
    let layer = counter(120.0, 0.0, 2.0, Ease::Linear);
    assert_eq!(text_of(&evaluate(&layer, 1.0)), "60");
}

#[test]
fn boundaries_are_exact_for_every_kind() {
    let kinds = [
        AnimKind::Fade,
        AnimKind::Slide(Axis::X),
        AnimKind::Slide(Axis::Y),
        AnimKind::Scale,
        AnimKind::CountUp,
        AnimKind::BarGrow,
    ];
    for kind in kinds {
        let a = AnimationSpec::new(kind, 0.1, 0.7, 0.3, 2.3, Ease::InOutCubic);
        assert_eq!(a.value_at(0.3), 0.1, "{kind:?}");
        assert_eq!(a.value_at(2.3), 0.7, "{kind:?}");
        assert_eq!(a.value_at(0.0), 0.1, "{kind:?}");
        assert_eq!(a.value_at(9.0), 0.7, "{kind:?}");
    }
}

#[test]
fn layer_boundary_states() {
    let layer = Layer::text(
        "title",
        Point::new(100.0, 200.0),
        TextLayer::literal("hello", style()),
    )
    .with(AnimationSpec::fade_in(0.5, 1.0))
    .with(AnimationSpec::slide_in(Axis::Y, 50.0, 0.5, 1.0));

    let before = evaluate(&layer, 0.5);
    assert_eq!(before.opacity, 0.0);
    assert_eq!(before.offset, Vec2::new(0.0, 50.0));

    let after = evaluate(&layer, 1.5);
    assert_eq!(after.opacity, 1.0);
    assert_eq!(after.offset, Vec2::ZERO);
    assert_eq!(after.scale, 1.0);
}

#[test]
fn zero_length_window_is_settled_from_start() {
    let layer = counter(1234.0, 0.0, 0.0, Ease::OutCubic);
    assert_eq!(text_of(&evaluate(&layer, 0.0)), "1,234");
    assert_eq!(text_of(&evaluate(&layer, 3.0)), "1,234");
}

#[test]
fn evaluate_is_idempotent() {
    let layer = counter(987.0, 0.3, 2.3, Ease::OutCubic)
        .with(AnimationSpec::fade_in(0.0, 0.4))
        .with(AnimationSpec::scale_in(0.8, 0.0, 0.6));
    for i in 0..40 {
        let t = f64::from(i) * 0.07;
        let a = evaluate(&layer, t);
        let b = evaluate(&layer, t);
        assert_eq!(a, b);
    }
}

#[test]
fn fades_multiply_and_slides_add() {
    let layer = Layer::text("x", Point::ORIGIN, TextLayer::literal("x", style()))
        .with(AnimationSpec::new(AnimKind::Fade, 0.5, 0.5, 0.0, 1.0, Ease::Linear))
        .with(AnimationSpec::new(AnimKind::Fade, 0.5, 0.5, 0.0, 1.0, Ease::Linear))
        .with(AnimationSpec::new(AnimKind::Slide(Axis::X), 10.0, 10.0, 0.0, 1.0, Ease::Linear))
        .with(AnimationSpec::new(AnimKind::Slide(Axis::X), 5.0, 5.0, 0.0, 1.0, Ease::Linear));
    let r = evaluate(&layer, 0.5);
    assert!((r.opacity - 0.25).abs() < 1e-12);
    assert_eq!(r.offset.x, 15.0);
}

#[test]
fn bar_length_is_clamped_to_extent() {
    let bar = |value: f64| ChartBar {
        label: "x".into(),
        value,
        color: Rgba8::rgb(0, 200, 0),
        grow: Some(AnimationSpec::bar_grow(value, 0.0, 1.0)),
    };
    // nominal axis max 10 is raised to 40 before animation starts
    let chart = ChartLayer::new(vec![bar(20.0), bar(40.0)], 10.0, 800.0, 50.0, 10.0, style(), style());
    assert_eq!(chart.axis_max(), 40.0);
    let layer = Layer::new("chart", Point::ORIGIN, LayerContent::Chart(chart));

    let start = evaluate(&layer, 0.0);
    let end = evaluate(&layer, 1.0);
    let ResolvedVisual::Chart(start_bars) = start.visual else {
        panic!("chart expected")
    };
    let ResolvedVisual::Chart(end_bars) = end.visual else {
        panic!("chart expected")
    };
    assert_eq!(start_bars[1].length_px, 0.0);
    assert_eq!(start_bars[1].value_label, None);
    assert_eq!(end_bars[0].length_px, 400.0);
    assert_eq!(end_bars[1].length_px, 800.0);
    assert_eq!(end_bars[1].value_label.as_deref(), Some("40"));

    for i in 0..=20 {
        let r = evaluate(&layer, f64::from(i) / 20.0);
        let ResolvedVisual::Chart(bars) = r.visual else {
            panic!("chart expected")
        };
        assert!(bars.iter().all(|b| b.length_px <= 800.0 && b.length_px >= 0.0));
    }
}

#[test]
fn count_formatting() {
    assert_eq!(format_count(0, false), "0");
    assert_eq!(format_count(999, false), "999");
    assert_eq!(format_count(1000, false), "1,000");
    assert_eq!(format_count(1234567, true), "+1,234,567");
    assert_eq!(format_count(-4321, true), "-4,321");
    assert_eq!(display_count(2.5), 3);
    assert_eq!(display_count(-2.5), -3);
    assert_eq!(display_count(f64::NAN), 0);
}

#[test]
fn validate_rejects_bad_windows() {
    assert!(AnimationSpec::fade_in(-0.1, 1.0).validate(5.0).is_err());
    assert!(AnimationSpec::fade_in(4.5, 1.0).validate(5.0).is_err());
    assert!(
        AnimationSpec::new(AnimKind::Fade, 0.0, 1.0, 2.0, 1.0, Ease::Linear)
            .validate(5.0)
            .is_err()
    );
    assert!(AnimationSpec::fade_in(4.0, 1.0).validate(5.0).is_ok());
}
