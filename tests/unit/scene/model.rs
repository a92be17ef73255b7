use super::*;
use crate::animation::ease::Ease;

fn style() -> TextStyle {
    TextStyle::centered(48.0, Rgba8::rgb(255, 255, 255))
}

fn scene_with(layers: Vec<Layer>, duration: f64) -> Scene {
    Scene {
        index: 0,
        kind: SceneKind::Intro,
        duration,
        layers,
        narration: None,
        placeholder: false,
    }
}

#[test]
fn slugs_round_trip() {
    for k in SceneKind::DEFAULT_ORDER {
        assert_eq!(SceneKind::from_slug(k.slug()), Some(k));
        assert!(k.default_duration() > 0.0);
    }
    assert_eq!(SceneKind::from_slug(" Chart "), Some(SceneKind::MonthlyChart));
    assert_eq!(SceneKind::from_slug("nope"), None);
}

#[test]
fn counter_requires_a_single_count_up() {
    let bare = Layer::text("n", Point::ORIGIN, TextLayer::counter(style()));
    assert!(bare.validate(5.0).is_err());
    let ok = bare.clone().with(AnimationSpec::count_up(10.0, 0.3, 2.0));
    ok.validate(5.0).unwrap();
    let twice = ok.with(AnimationSpec::count_up(10.0, 0.3, 2.0));
    assert!(twice.validate(5.0).is_err());
}

#[test]
fn animation_past_scene_end_is_rejected() {
    let layer = Layer::text("t", Point::ORIGIN, TextLayer::literal("x", style()))
        .with(AnimationSpec::fade_in(4.0, 2.0));
    let err = scene_with(vec![layer], 5.0).validate().unwrap_err();
    assert!(err.to_string().contains("layer 't'"));
}

#[test]
fn non_positive_duration_is_rejected() {
    assert!(scene_with(Vec::new(), 0.0).validate().is_err());
    assert!(scene_with(Vec::new(), f64::NAN).validate().is_err());
}

#[test]
fn bar_animations_are_checked_against_scene_duration() {
    let chart = ChartLayer::new(
        vec![ChartBar {
            label: "Jan".into(),
            value: 3.0,
            color: Rgba8::rgb(1, 2, 3),
            grow: Some(AnimationSpec::bar_grow(3.0, 6.5, 1.0)),
        }],
        0.0,
        800.0,
        40.0,
        10.0,
        style(),
        style(),
    );
    let layer = Layer::new("chart", Point::ORIGIN, LayerContent::Chart(chart));
    assert!(layer.validate(7.0).is_err());
    assert!(layer.validate(7.5).is_ok());
}

#[test]
fn chart_axis_never_below_one() {
    let chart = ChartLayer::new(Vec::new(), 0.0, 800.0, 40.0, 10.0, style(), style());
    assert_eq!(chart.axis_max(), 1.0);
    assert_eq!(chart.width_px(), 0.0);
}

#[test]
fn settle_collapses_every_window() {
    let mut layer = Layer::text("n", Point::ORIGIN, TextLayer::counter(style()))
        .with(AnimationSpec::new(AnimKind::CountUp, 0.0, 9.0, 1.0, 3.0, Ease::Linear));
    layer.settle();
    assert!(layer.all_animations().all(|a| a.start == 0.0 && a.end == 0.0));
}

#[test]
fn background_image_decodes_and_premultiplies() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bg.png");
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 100, 50, 128]));
    img.save(&path).unwrap();

    let bg = BackgroundImage::from_path(&path).unwrap();
    assert_eq!((bg.width, bg.height), (2, 2));
    assert_eq!(&bg.rgba8_premul[..4], &[100, 50, 25, 128]);
    assert!(BackgroundImage::from_path(&dir.path().join("missing.png")).is_err());
}
