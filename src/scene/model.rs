use std::path::Path;
use std::sync::Arc;

use crate::animation::anim::{AnimKind, AnimationSpec};
use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::{WrapError, WrapResult};

/// The visual beats of a year-in-review video.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneKind {
    Intro,
    TotalCommits,
    PullRequests,
    Leaderboard,
    BusiestTimes,
    LinesOfCode,
    Releases,
    MonthlyChart,
    Outro,
}

impl SceneKind {
    pub const DEFAULT_ORDER: [SceneKind; 9] = [
        SceneKind::Intro,
        SceneKind::TotalCommits,
        SceneKind::PullRequests,
        SceneKind::Leaderboard,
        SceneKind::BusiestTimes,
        SceneKind::LinesOfCode,
        SceneKind::Releases,
        SceneKind::MonthlyChart,
        SceneKind::Outro,
    ];

    /// Default on-screen time in seconds.
    pub fn default_duration(self) -> f64 {
        match self {
            Self::Intro => 5.0,
            Self::TotalCommits => 5.0,
            Self::PullRequests => 5.0,
            Self::Leaderboard => 7.0,
            Self::BusiestTimes => 6.0,
            Self::LinesOfCode => 6.0,
            Self::Releases => 5.0,
            Self::MonthlyChart => 7.0,
            Self::Outro => 6.0,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::TotalCommits => "commits",
            Self::PullRequests => "prs",
            Self::Leaderboard => "leaderboard",
            Self::BusiestTimes => "busiest",
            Self::LinesOfCode => "lines",
            Self::Releases => "releases",
            Self::MonthlyChart => "chart",
            Self::Outro => "outro",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        Self::DEFAULT_ORDER
            .into_iter()
            .find(|k| k.slug().eq_ignore_ascii_case(s.trim()))
    }
}

/// One timed beat of the video: a duration and a back-to-front list of layers.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Position in the final sequence (0-based, unique).
    pub index: usize,
    pub kind: SceneKind,
    /// Seconds, `> 0`.
    pub duration: f64,
    pub layers: Vec<Layer>,
    /// Voice-over script for this scene.
    pub narration: Option<String>,
    /// `true` when the scene shows a "no data" placeholder instead of statistics.
    pub placeholder: bool,
}

impl Scene {
    pub fn validate(&self) -> WrapResult<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(WrapError::validation(format!(
                "scene {} ({}) duration must be finite and > 0, got {}",
                self.index,
                self.kind.slug(),
                self.duration
            )));
        }
        for layer in &self.layers {
            layer.validate(self.duration).map_err(|e| {
                WrapError::validation(format!(
                    "scene {} ({}) layer '{}': {e}",
                    self.index,
                    self.kind.slug(),
                    layer.name
                ))
            })?;
        }
        Ok(())
    }
}

/// A drawable element of a scene.
///
/// `position` is the layer anchor: text alignment point (vertically centered), shape center,
/// chart baseline origin (left end of the axis). Backgrounds ignore it.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub name: String,
    pub position: Point,
    pub animations: Vec<AnimationSpec>,
    pub content: LayerContent,
}

/// Closed set of layer variants. The compositor matches on every variant.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerContent {
    Text(TextLayer),
    Shape(ShapeLayer),
    Chart(ChartLayer),
    Background(ImageBackgroundLayer),
}

impl Layer {
    pub fn new(name: impl Into<String>, position: Point, content: LayerContent) -> Self {
        Self {
            name: name.into(),
            position,
            animations: Vec::new(),
            content,
        }
    }

    pub fn text(name: impl Into<String>, position: Point, text: TextLayer) -> Self {
        Self::new(name, position, LayerContent::Text(text))
    }

    pub fn background(fill: Background) -> Self {
        Self::new(
            "background",
            Point::ORIGIN,
            LayerContent::Background(ImageBackgroundLayer { fill }),
        )
    }

    pub fn with(mut self, anim: AnimationSpec) -> Self {
        self.animations.push(anim);
        self
    }

    pub fn is_background(&self) -> bool {
        matches!(self.content, LayerContent::Background(_))
    }

    /// Every animation window attached to this layer, including per-bar chart animations.
    pub fn all_animations(&self) -> impl Iterator<Item = &AnimationSpec> {
        let bars: &[ChartBar] = match &self.content {
            LayerContent::Chart(c) => &c.bars,
            _ => &[],
        };
        self.animations
            .iter()
            .chain(bars.iter().filter_map(|b| b.grow.as_ref()))
    }

    /// Collapse every animation window to its settled end state.
    pub fn settle(&mut self) {
        for a in &mut self.animations {
            *a = a.settled();
        }
        if let LayerContent::Chart(c) = &mut self.content {
            for b in &mut c.bars {
                if let Some(g) = b.grow.as_mut() {
                    *g = g.settled();
                }
            }
        }
    }

    pub fn validate(&self, scene_duration: f64) -> WrapResult<()> {
        if !self.position.x.is_finite() || !self.position.y.is_finite() {
            return Err(WrapError::validation("layer position must be finite"));
        }
        for anim in self.all_animations() {
            anim.validate(scene_duration)?;
        }
        for anim in &self.animations {
            if anim.kind == AnimKind::BarGrow {
                return Err(WrapError::animation(
                    "bar-grow animations belong to chart bars, not layers",
                ));
            }
        }
        let count_ups = self
            .animations
            .iter()
            .filter(|a| a.kind == AnimKind::CountUp)
            .count();
        match &self.content {
            LayerContent::Text(TextLayer {
                content: TextContent::Counter { .. },
                style,
            }) => {
                if count_ups != 1 {
                    return Err(WrapError::animation(format!(
                        "counter text needs exactly one count-up animation, found {count_ups}"
                    )));
                }
                style.validate()?;
            }
            LayerContent::Text(t) => {
                if count_ups != 0 {
                    return Err(WrapError::animation("count-up on literal text"));
                }
                t.style.validate()?;
            }
            LayerContent::Chart(c) => {
                c.label_style.validate()?;
                c.value_style.validate()?;
                for b in &c.bars {
                    if let Some(g) = &b.grow
                        && g.kind != AnimKind::BarGrow
                    {
                        return Err(WrapError::animation(format!(
                            "bar '{}' has a {:?} animation, expected bar-grow",
                            b.label, g.kind
                        )));
                    }
                }
            }
            LayerContent::Shape(_) | LayerContent::Background(_) => {}
        }
        if count_ups != 0 && !matches!(self.content, LayerContent::Text(_)) {
            return Err(WrapError::animation("count-up on a non-text layer"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub size_px: f32,
    pub color: Rgba8,
    pub align: HAlign,
}

impl TextStyle {
    pub fn centered(size_px: f32, color: Rgba8) -> Self {
        Self {
            size_px,
            color,
            align: HAlign::Center,
        }
    }

    fn validate(&self) -> WrapResult<()> {
        if !self.size_px.is_finite() || self.size_px <= 0.0 {
            return Err(WrapError::validation("text size_px must be finite and > 0"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TextContent {
    Literal(String),
    /// Number driven by the layer's count-up animation.
    Counter {
        prefix: String,
        suffix: String,
        explicit_sign: bool,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextLayer {
    pub content: TextContent,
    pub style: TextStyle,
}

impl TextLayer {
    pub fn literal(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            content: TextContent::Literal(text.into()),
            style,
        }
    }

    pub fn counter(style: TextStyle) -> Self {
        Self {
            content: TextContent::Counter {
                prefix: String::new(),
                suffix: String::new(),
                explicit_sign: false,
            },
            style,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Rect { width: f64, height: f64 },
    RoundedRect { width: f64, height: f64, radius: f64 },
    Circle { radius: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeLayer {
    pub shape: Shape,
    pub fill: Rgba8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartBar {
    pub label: String,
    /// Data value; non-negative.
    pub value: f64,
    pub color: Rgba8,
    pub grow: Option<AnimationSpec>,
}

/// Vertical bar chart growing upward from its baseline.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartLayer {
    pub bars: Vec<ChartBar>,
    axis_max: f64,
    /// Pixel length of a bar whose value equals the axis maximum.
    pub extent_px: f64,
    pub bar_width: f64,
    pub gap: f64,
    pub label_style: TextStyle,
    pub value_style: TextStyle,
}

impl ChartLayer {
    /// Build a chart. The axis maximum is `nominal_axis_max`, raised once to the largest bar
    /// value if any bar exceeds it (and never below 1).
    pub fn new(
        bars: Vec<ChartBar>,
        nominal_axis_max: f64,
        extent_px: f64,
        bar_width: f64,
        gap: f64,
        label_style: TextStyle,
        value_style: TextStyle,
    ) -> Self {
        let data_max = bars
            .iter()
            .map(|b| b.value)
            .filter(|v| v.is_finite())
            .fold(0.0f64, f64::max);
        let nominal = if nominal_axis_max.is_finite() {
            nominal_axis_max
        } else {
            0.0
        };
        Self {
            bars,
            axis_max: nominal.max(data_max).max(1.0),
            extent_px: extent_px.max(0.0),
            bar_width,
            gap,
            label_style,
            value_style,
        }
    }

    pub fn axis_max(&self) -> f64 {
        self.axis_max
    }

    /// Horizontal span covered by all bars.
    pub fn width_px(&self) -> f64 {
        let n = self.bars.len() as f64;
        if n == 0.0 {
            return 0.0;
        }
        n * self.bar_width + (n - 1.0) * self.gap
    }
}

/// Decoded background picture in premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackgroundImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

impl BackgroundImage {
    /// Decode any format the `image` crate understands.
    pub fn from_path(path: &Path) -> WrapResult<Self> {
        let img = image::open(path).map_err(|e| {
            WrapError::config(format!(
                "failed to decode background image '{}': {e}",
                path.display()
            ))
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut rgba8_premul = rgba.into_raw();
        for px in rgba8_premul.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            for c in &mut px[..3] {
                *c = (((u16::from(*c) * a) + 127) / 255) as u8;
            }
        }
        Ok(Self {
            width,
            height,
            rgba8_premul,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Background {
    Solid(Rgba8),
    VerticalGradient { top: Rgba8, bottom: Rgba8 },
    /// Scaled to cover the whole canvas, centered.
    Image(Arc<BackgroundImage>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageBackgroundLayer {
    pub fill: Background,
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
