use crate::animation::ease::Ease;
use crate::foundation::core::Vec2;
use crate::foundation::error::{WrapError, WrapResult};
use crate::foundation::math::lerp;
use crate::scene::model::{ChartLayer, Layer, LayerContent, Scene, TextContent};

/// Bars show their numeric value once their grow animation is this far along.
pub const VALUE_LABEL_PROGRESS: f64 = 0.8;

/// Slack allowed when comparing animation windows against scene durations.
const WINDOW_EPS: f64 = 1e-9;

/// Axis used by slide animations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// What an animation's interpolated value drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimKind {
    /// Displayed integer of a counter text layer.
    CountUp,
    /// Layer opacity in `[0, 1]`. Multiple fades multiply.
    Fade,
    /// Pixel offset along an axis. Multiple slides add.
    Slide(Axis),
    /// Uniform scale about the layer anchor. Multiple scales multiply.
    Scale,
    /// Bar value in chart data units.
    BarGrow,
}

/// A single keyframed property: `from` until `start`, eased toward `to`, `to` from `end` on.
///
/// Times are seconds relative to the owning scene's start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSpec {
    pub kind: AnimKind,
    pub from: f64,
    pub to: f64,
    pub start: f64,
    pub end: f64,
    pub ease: Ease,
}

impl AnimationSpec {
    pub fn new(kind: AnimKind, from: f64, to: f64, start: f64, end: f64, ease: Ease) -> Self {
        Self {
            kind,
            from,
            to,
            start,
            end,
            ease,
        }
    }

    pub fn fade_in(start: f64, duration: f64) -> Self {
        Self::new(AnimKind::Fade, 0.0, 1.0, start, start + duration, Ease::Linear)
    }

    pub fn fade_out(start: f64, duration: f64) -> Self {
        Self::new(AnimKind::Fade, 1.0, 0.0, start, start + duration, Ease::Linear)
    }

    pub fn count_up(to: f64, start: f64, duration: f64) -> Self {
        Self::new(AnimKind::CountUp, 0.0, to, start, start + duration, Ease::OutCubic)
    }

    /// Slide from `distance` px away back to the anchor.
    pub fn slide_in(axis: Axis, distance: f64, start: f64, duration: f64) -> Self {
        Self::new(
            AnimKind::Slide(axis),
            distance,
            0.0,
            start,
            start + duration,
            Ease::OutCubic,
        )
    }

    pub fn scale_in(from: f64, start: f64, duration: f64) -> Self {
        Self::new(AnimKind::Scale, from, 1.0, start, start + duration, Ease::OutQuad)
    }

    pub fn bar_grow(value: f64, start: f64, duration: f64) -> Self {
        Self::new(AnimKind::BarGrow, 0.0, value, start, start + duration, Ease::OutCubic)
    }

    /// Same animation with a zero-length window at `0`, i.e. settled for the whole scene.
    pub fn settled(self) -> Self {
        Self {
            start: 0.0,
            end: 0.0,
            ..self
        }
    }

    /// Check `0 <= start <= end <= scene_duration` with finite values.
    pub fn validate(&self, scene_duration: f64) -> WrapResult<()> {
        let finite = [self.from, self.to, self.start, self.end]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(WrapError::animation(format!(
                "{:?} animation has non-finite fields",
                self.kind
            )));
        }
        if self.start < 0.0 {
            return Err(WrapError::animation(format!(
                "{:?} animation starts before the scene ({})",
                self.kind, self.start
            )));
        }
        if self.start > self.end {
            return Err(WrapError::animation(format!(
                "{:?} animation start {} is after end {}",
                self.kind, self.start, self.end
            )));
        }
        if self.end > scene_duration + WINDOW_EPS {
            return Err(WrapError::animation(format!(
                "{:?} animation ends at {} past scene duration {}",
                self.kind, self.end, scene_duration
            )));
        }
        Ok(())
    }

    /// Un-eased elapsed fraction of the window at `t`, in `[0, 1]`.
    pub fn elapsed_fraction(&self, t: f64) -> f64 {
        if t >= self.end {
            return 1.0;
        }
        if t <= self.start {
            return 0.0;
        }
        ((t - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
    }

    /// Interpolated value at scene-local time `t`.
    ///
    /// Exactly `from` at `t == start` and exactly `to` at `t >= end`. A zero-length window is
    /// settled (`to`) from `start` on.
    pub fn value_at(&self, t: f64) -> f64 {
        if t >= self.end {
            return self.to;
        }
        if t <= self.start {
            return self.from;
        }
        lerp(self.from, self.to, self.ease.apply(self.elapsed_fraction(t)))
    }
}

/// Fully resolved visual state of one layer at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedLayer {
    pub opacity: f64,
    pub offset: Vec2,
    pub scale: f64,
    pub visual: ResolvedVisual,
}

/// Per-variant resolved content.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedVisual {
    /// Final text to draw (counters already formatted).
    Text(String),
    Shape,
    Chart(Vec<ResolvedBar>),
    Background,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedBar {
    /// Rendered bar length in pixels, within `[0, extent_px]`.
    pub length_px: f64,
    /// Formatted value shown above the bar, once the bar is mostly grown.
    pub value_label: Option<String>,
}

/// Resolve `layer` at scene-local time `local_time`.
pub fn evaluate(layer: &Layer, local_time: f64) -> ResolvedLayer {
    let mut opacity = 1.0f64;
    let mut offset = Vec2::ZERO;
    let mut scale = 1.0f64;
    let mut count = None;

    for anim in &layer.animations {
        let v = anim.value_at(local_time);
        match anim.kind {
            AnimKind::Fade => opacity *= v,
            AnimKind::Slide(Axis::X) => offset.x += v,
            AnimKind::Slide(Axis::Y) => offset.y += v,
            AnimKind::Scale => scale *= v,
            AnimKind::CountUp => count = Some(v),
            // Bars carry their own grow animations.
            AnimKind::BarGrow => {}
        }
    }

    let visual = match &layer.content {
        LayerContent::Text(t) => ResolvedVisual::Text(match &t.content {
            TextContent::Literal(s) => s.clone(),
            TextContent::Counter {
                prefix,
                suffix,
                explicit_sign,
            } => {
                let n = display_count(count.unwrap_or(0.0));
                format!("{prefix}{}{suffix}", format_count(n, *explicit_sign))
            }
        }),
        LayerContent::Shape(_) => ResolvedVisual::Shape,
        LayerContent::Chart(chart) => ResolvedVisual::Chart(resolve_bars(chart, local_time)),
        LayerContent::Background(_) => ResolvedVisual::Background,
    };

    ResolvedLayer {
        opacity: opacity.clamp(0.0, 1.0),
        offset,
        scale: scale.max(0.0),
        visual,
    }
}

/// Resolve every layer of `scene`, in declared order.
#[tracing::instrument(skip(scene), fields(scene = scene.index))]
pub fn evaluate_scene(scene: &Scene, local_time: f64) -> Vec<ResolvedLayer> {
    scene
        .layers
        .iter()
        .map(|l| evaluate(l, local_time))
        .collect()
}

fn resolve_bars(chart: &ChartLayer, t: f64) -> Vec<ResolvedBar> {
    let axis_max = chart.axis_max();
    chart
        .bars
        .iter()
        .map(|bar| {
            let (value, progress) = match &bar.grow {
                Some(g) => (g.value_at(t), g.elapsed_fraction(t)),
                None => (bar.value, 1.0),
            };
            let length_px = ((value / axis_max) * chart.extent_px).clamp(0.0, chart.extent_px);
            let value_label = (progress >= VALUE_LABEL_PROGRESS && bar.value > 0.0)
                .then(|| format_count(display_count(bar.value), false));
            ResolvedBar {
                length_px,
                value_label,
            }
        })
        .collect()
}

/// Round an interpolated count to the integer shown on screen (halves away from zero).
pub fn display_count(v: f64) -> i64 {
    if !v.is_finite() {
        return 0;
    }
    v.round() as i64
}

/// Format with `,` thousands separators; `explicit_sign` adds `+` to positive values.
pub fn format_count(n: i64, explicit_sign: bool) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if n < 0 {
        format!("-{grouped}")
    } else if explicit_sign && n > 0 {
        format!("+{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/anim.rs"]
mod tests;
