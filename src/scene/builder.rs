use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::animation::anim::{AnimKind, AnimationSpec, Axis, format_count};
use crate::animation::ease::Ease;
use crate::foundation::core::{Canvas, Point, Rgba8};
use crate::foundation::error::{WrapError, WrapResult};
use crate::scene::model::{
    Background, BackgroundImage, ChartBar, ChartLayer, HAlign, Layer, LayerContent, Scene,
    SceneKind, Shape, ShapeLayer, TextContent, TextLayer, TextStyle,
};
use crate::scene::theme::Theme;
use crate::stats::snapshot::{MONTH_NAMES, StatSnapshot};

const ENTER_FADE: f64 = 0.3;
const EXIT_FADE: f64 = 0.5;
const COUNT_START: f64 = 0.3;
const COUNT_DURATION: f64 = 2.0;
const LEADERBOARD_ROWS: usize = 5;
const CHART_EXTENT_PX: f64 = 800.0;
const CHART_BASELINE_Y: f64 = 1500.0;
const CHART_BAR_WIDTH: f64 = 60.0;
const CHART_GAP: f64 = 18.0;
const CHART_STAGGER: f64 = 0.15;
const CHART_GROW_START: f64 = 0.5;
const CHART_GROW: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Continuous animation sampled at the output frame rate.
    #[default]
    Animated,
    /// One still per scene showing its settled end state.
    Static,
}

/// Options recognized by [`SceneBuilder`].
#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub mode: RenderMode,
    /// Explicit scene order. `None` uses [`SceneKind::DEFAULT_ORDER`].
    pub scene_order: Option<Vec<SceneKind>>,
    pub include_chart: bool,
    pub include_leaderboard: bool,
    /// Per-kind duration overrides in seconds.
    pub durations: HashMap<SceneKind, f64>,
    pub theme: Theme,
    /// Replaces the gradient backdrop of every scene.
    pub background_image: Option<Arc<BackgroundImage>>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            mode: RenderMode::Animated,
            scene_order: None,
            include_chart: true,
            include_leaderboard: true,
            durations: HashMap::new(),
            theme: Theme::default(),
            background_image: None,
        }
    }
}

/// Turns a [`StatSnapshot`] into the ordered scene list.
///
/// Missing-data policy per scene kind:
///
/// | kind | without data |
/// |---|---|
/// | intro, total commits, lines of code, outro | always rendered (zeros are shown) |
/// | pull requests | skipped when no PR was merged |
/// | releases | skipped when no release was published |
/// | leaderboard | "no contributors" placeholder |
/// | busiest times | "no commits" placeholder |
/// | monthly chart | "no commits" placeholder when every month is zero |
///
/// The output depends only on the snapshot and the options.
#[derive(Clone, Debug, Default)]
pub struct SceneBuilder {
    options: BuildOptions,
}

impl SceneBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    #[tracing::instrument(skip_all, fields(repo = %snapshot.repo_name, year = snapshot.year))]
    pub fn build(&self, snapshot: &StatSnapshot) -> WrapResult<Vec<Scene>> {
        snapshot.validate()?;
        for (kind, d) in &self.options.durations {
            if !d.is_finite() || *d <= 0.0 {
                return Err(WrapError::validation(format!(
                    "duration override for '{}' must be > 0, got {d}",
                    kind.slug()
                )));
            }
        }

        let order = self
            .options
            .scene_order
            .clone()
            .unwrap_or_else(|| SceneKind::DEFAULT_ORDER.to_vec());
        let mut seen = HashSet::new();
        for kind in &order {
            if !seen.insert(*kind) {
                return Err(WrapError::validation(format!(
                    "scene '{}' appears more than once in the scene order",
                    kind.slug()
                )));
            }
        }

        let ctx = Ctx {
            snap: snapshot,
            theme: &self.options.theme,
        };
        let mut scenes = Vec::with_capacity(order.len());
        for kind in order {
            if (kind == SceneKind::MonthlyChart && !self.options.include_chart)
                || (kind == SceneKind::Leaderboard && !self.options.include_leaderboard)
            {
                continue;
            }
            let Some(draft) = ctx.draft(kind) else {
                tracing::info!(scene = kind.slug(), "skipping scene without data");
                continue;
            };
            if draft.placeholder {
                tracing::warn!(scene = kind.slug(), "no data for scene; showing placeholder");
            }
            scenes.push(self.finish(scenes.len(), kind, draft));
        }

        if scenes.is_empty() {
            return Err(WrapError::validation("scene selection produced no scenes"));
        }
        for s in &scenes {
            s.validate()?;
        }
        tracing::debug!(scenes = scenes.len(), "built scenes");
        Ok(scenes)
    }

    fn finish(&self, index: usize, kind: SceneKind, draft: Draft) -> Scene {
        let design = kind.default_duration();
        let duration = self
            .options
            .durations
            .get(&kind)
            .copied()
            .unwrap_or(design);
        // Shorter scenes replay the same choreography faster.
        let squeeze = (duration / design).min(1.0);

        let mut layers = Vec::with_capacity(draft.layers.len() + 1);
        layers.push(Layer::background(self.background()));
        for mut layer in draft.layers {
            for a in &mut layer.animations {
                a.start *= squeeze;
                a.end *= squeeze;
            }
            if let LayerContent::Chart(c) = &mut layer.content {
                for g in c.bars.iter_mut().filter_map(|b| b.grow.as_mut()) {
                    g.start *= squeeze;
                    g.end *= squeeze;
                }
            }
            match self.options.mode {
                RenderMode::Animated => {
                    let exit = EXIT_FADE.min(duration / 2.0);
                    layer = layer.with(AnimationSpec::fade_out(duration - exit, exit));
                }
                RenderMode::Static => layer.settle(),
            }
            layers.push(layer);
        }

        Scene {
            index,
            kind,
            duration,
            layers,
            narration: Some(draft.narration),
            placeholder: draft.placeholder,
        }
    }

    fn background(&self) -> Background {
        match &self.options.background_image {
            Some(img) => Background::Image(img.clone()),
            None => Background::VerticalGradient {
                top: self.options.theme.background_top,
                bottom: self.options.theme.background_bottom,
            },
        }
    }
}

struct Draft {
    layers: Vec<Layer>,
    narration: String,
    placeholder: bool,
}

struct Ctx<'a> {
    snap: &'a StatSnapshot,
    theme: &'a Theme,
}

fn center_x() -> f64 {
    f64::from(Canvas::PORTRAIT.width) / 2.0
}

impl Ctx<'_> {
    fn draft(&self, kind: SceneKind) -> Option<Draft> {
        match kind {
            SceneKind::Intro => Some(self.intro()),
            SceneKind::TotalCommits => Some(self.total_commits()),
            SceneKind::PullRequests => self.pull_requests(),
            SceneKind::Leaderboard => Some(self.leaderboard()),
            SceneKind::BusiestTimes => Some(self.busiest_times()),
            SceneKind::LinesOfCode => Some(self.lines_of_code()),
            SceneKind::Releases => self.releases(),
            SceneKind::MonthlyChart => Some(self.monthly_chart()),
            SceneKind::Outro => Some(self.outro()),
        }
    }

    fn label(&self, name: &str, text: impl Into<String>, y: f64, size: f32, color: Rgba8) -> Layer {
        Layer::text(
            name,
            Point::new(center_x(), y),
            TextLayer::literal(text, TextStyle::centered(size, color)),
        )
        .with(AnimationSpec::fade_in(0.0, ENTER_FADE))
    }

    fn counter(&self, name: &str, value: f64, y: f64, size: f32, color: Rgba8) -> Layer {
        Layer::text(
            name,
            Point::new(center_x(), y),
            TextLayer::counter(TextStyle::centered(size, color)),
        )
        .with(AnimationSpec::fade_in(0.0, ENTER_FADE))
        .with(AnimationSpec::count_up(value, COUNT_START, COUNT_DURATION))
    }

    fn title(&self, text: &str, y: f64) -> Layer {
        self.label("title", text, y, 72.0, self.theme.text)
            .with(AnimationSpec::slide_in(Axis::Y, -40.0, 0.0, 0.6))
    }

    fn placeholder(&self, title: &str, message: &str, narration: String) -> Draft {
        Draft {
            layers: vec![
                self.title(title, 760.0),
                self.label("no-data", message, 960.0, 48.0, self.theme.secondary),
            ],
            narration,
            placeholder: true,
        }
    }

    fn intro(&self) -> Draft {
        let s = self.snap;
        let t = self.theme;
        let layers = vec![
            self.label("year", s.year.to_string(), 700.0, 64.0, t.secondary),
            self.label("repo", ellipsize(&s.repo_name, 28), 860.0, 84.0, t.text)
                .with(AnimationSpec::slide_in(Axis::Y, 40.0, 0.2, 0.6)),
            Layer::text(
                "wrapped",
                Point::new(center_x(), 1010.0),
                TextLayer::literal("Wrapped", TextStyle::centered(140.0, t.primary)),
            )
            .with(AnimationSpec::fade_in(0.8, 0.4))
            .with(AnimationSpec::scale_in(0.6, 0.8, 0.6)),
            Layer::new(
                "badge",
                Point::new(center_x(), 1300.0),
                LayerContent::Shape(ShapeLayer {
                    shape: Shape::Circle { radius: 60.0 },
                    fill: t.primary.with_alpha(90),
                }),
            )
            .with(AnimationSpec::fade_in(1.2, 0.5))
            .with(AnimationSpec::scale_in(0.2, 1.2, 0.8)),
        ];
        Draft {
            layers,
            narration: format!(
                "Welcome to {} {} Wrapped. Let's see what your team shipped this year.",
                s.repo_name, s.year
            ),
            placeholder: false,
        }
    }

    fn total_commits(&self) -> Draft {
        let s = self.snap;
        let t = self.theme;
        let layers = vec![
            self.label("lead", "Your team made", 600.0, 56.0, t.secondary),
            self.counter("commits", s.total_commits as f64, 860.0, 200.0, t.primary),
            self.label("unit", "commits", 1060.0, 64.0, t.text),
            self.label(
                "days",
                format!("across {} different days", s.days_with_commits),
                1200.0,
                44.0,
                t.secondary,
            )
            .with(AnimationSpec::fade_in(1.5, 0.5)),
        ];
        Draft {
            layers,
            narration: format!(
                "Your team made {} commits this year, across {} different days.",
                format_count(s.total_commits as i64, false),
                s.days_with_commits
            ),
            placeholder: false,
        }
    }

    fn pull_requests(&self) -> Option<Draft> {
        let s = self.snap;
        if s.total_prs == 0 {
            return None;
        }
        let t = self.theme;
        let mut layers = vec![
            self.title("Pull Requests Merged", 620.0),
            self.counter("prs", s.total_prs as f64, 860.0, 200.0, t.primary),
        ];
        let mut narration = format!("{} pull requests were merged this year.", s.total_prs);
        if let Some(pr) = &s.biggest_pr {
            layers.push(
                self.label("biggest", "Biggest PR", 1100.0, 44.0, t.secondary)
                    .with(AnimationSpec::fade_in(2.0, 0.5)),
            );
            layers.push(
                self.label("biggest-title", ellipsize(&pr.title, 36), 1180.0, 40.0, t.text)
                    .with(AnimationSpec::fade_in(2.2, 0.5)),
            );
            layers.push(
                self.label(
                    "biggest-lines",
                    format!("{} lines", format_count(pr.lines as i64, false)),
                    1250.0,
                    40.0,
                    t.primary,
                )
                .with(AnimationSpec::fade_in(2.4, 0.5)),
            );
            narration.push_str(&format!(
                " The biggest one touched over {} lines of code.",
                format_count(pr.lines as i64, false)
            ));
        }
        Some(Draft {
            layers,
            narration,
            placeholder: false,
        })
    }

    fn leaderboard(&self) -> Draft {
        let s = self.snap;
        let t = self.theme;
        let Some(top) = s.leaderboard.first() else {
            return self.placeholder(
                "Top Contributors",
                "No contributors yet",
                "No contributors made commits this year.".to_string(),
            );
        };

        let mut layers = vec![self.title("Top Contributors", 360.0)];
        for (i, entry) in s.leaderboard.iter().take(LEADERBOARD_ROWS).enumerate() {
            let y = 560.0 + (i as f64) * 200.0;
            let reveal = 0.8 + (i as f64) * 0.5;
            let enter = |l: Layer| {
                l.with(AnimationSpec::fade_in(reveal, 0.4))
                    .with(AnimationSpec::slide_in(Axis::X, 50.0, reveal, 0.4))
            };
            let row_color = if i == 0 { t.primary } else { t.text };
            layers.push(enter(Layer::new(
                format!("row-{i}-panel"),
                Point::new(center_x(), y),
                LayerContent::Shape(ShapeLayer {
                    shape: Shape::RoundedRect {
                        width: 880.0,
                        height: 160.0,
                        radius: 24.0,
                    },
                    fill: t.panel,
                }),
            )));
            layers.push(enter(Layer::text(
                format!("row-{i}-rank"),
                Point::new(140.0, y),
                TextLayer::literal(
                    format!("#{}", i + 1),
                    TextStyle {
                        size_px: 52.0,
                        color: row_color,
                        align: HAlign::Left,
                    },
                ),
            )));
            layers.push(enter(Layer::text(
                format!("row-{i}-name"),
                Point::new(240.0, y),
                TextLayer::literal(
                    ellipsize(&entry.name, 18),
                    TextStyle {
                        size_px: 52.0,
                        color: t.text,
                        align: HAlign::Left,
                    },
                ),
            )));
            layers.push(enter(Layer::text(
                format!("row-{i}-count"),
                Point::new(940.0, y),
                TextLayer::literal(
                    format!("{} commits", format_count(entry.commits as i64, false)),
                    TextStyle {
                        size_px: 40.0,
                        color: t.primary,
                        align: HAlign::Right,
                    },
                ),
            )));
        }
        Draft {
            layers,
            narration: format!(
                "Your top contributor was {} with {} commits. Here's the full leaderboard.",
                top.name,
                format_count(top.commits as i64, false)
            ),
            placeholder: false,
        }
    }

    fn busiest_times(&self) -> Draft {
        let s = self.snap;
        let t = self.theme;
        let Some(day) = s.busiest.day.as_deref() else {
            return self.placeholder(
                "When You Coded",
                "No commits this year",
                "There were no commits to time this year.".to_string(),
            );
        };
        let month = s.busiest.month.as_deref().unwrap_or("Unknown");
        let month_value = match s.busiest_month_commits() {
            Some(n) => format!("{month} ({} commits)", format_count(n as i64, false)),
            None => month.to_string(),
        };
        let hour = s
            .busiest
            .peak_hour
            .map(|h| format!("{h}:00"))
            .unwrap_or_else(|| "Unknown".to_string());

        let mut layers = vec![self.title("When You Coded", 380.0)];
        let rows: [(&str, String, f64); 3] = [
            ("Busiest day", format!("{day}s"), 0.5),
            ("Busiest month", month_value, 1.2),
            ("Peak hour", hour, 1.9),
        ];
        for (i, (label, value, at)) in rows.into_iter().enumerate() {
            let y = 620.0 + (i as f64) * 240.0;
            layers.push(
                self.label(&format!("fact-{i}-label"), label, y, 40.0, t.secondary)
                    .with(AnimationSpec::fade_in(at, 0.4))
                    .with(AnimationSpec::slide_in(Axis::Y, 30.0, at, 0.4)),
            );
            layers.push(
                self.label(&format!("fact-{i}-value"), value, y + 70.0, 64.0, t.text)
                    .with(AnimationSpec::fade_in(at, 0.4))
                    .with(AnimationSpec::slide_in(Axis::Y, 30.0, at, 0.4)),
            );
        }
        layers.push(
            self.label("weekend-label", "Weekend commits", 1340.0, 40.0, t.secondary)
                .with(AnimationSpec::fade_in(2.6, 0.4)),
        );
        layers.push(
            Layer::text(
                "weekend",
                Point::new(center_x(), 1410.0),
                TextLayer::counter(TextStyle::centered(64.0, t.primary)),
            )
            .with(AnimationSpec::fade_in(2.6, 0.4))
            .with(AnimationSpec::count_up(s.weekend_commits as f64, 2.6, 1.5)),
        );

        let month_commits = s
            .busiest_month_commits()
            .map(|n| format!(" with {} commits", format_count(n as i64, false)))
            .unwrap_or_default();
        Draft {
            layers,
            narration: format!(
                "Your team coded the most on {day}s. {month} was the busiest month{month_commits}. \
                 Only {} commits happened on weekends.",
                s.weekend_commits
            ),
            placeholder: false,
        }
    }

    fn lines_of_code(&self) -> Draft {
        let s = self.snap;
        let t = self.theme;
        let signed = |name: &str, value: f64, prefix: &str, y: f64, color: Rgba8| {
            Layer::text(
                name,
                Point::new(center_x(), y),
                TextLayer {
                    content: TextContent::Counter {
                        prefix: prefix.to_string(),
                        suffix: String::new(),
                        explicit_sign: prefix.is_empty(),
                    },
                    style: TextStyle::centered(120.0, color),
                },
            )
            .with(AnimationSpec::fade_in(0.0, ENTER_FADE))
            .with(AnimationSpec::count_up(value, COUNT_START, COUNT_DURATION))
        };
        let net = s.net_lines();
        let layers = vec![
            self.title("Lines of Code", 420.0),
            signed("added", s.lines_added as f64, "+", 700.0, t.primary),
            self.label("added-label", "added", 810.0, 44.0, t.secondary),
            signed("deleted", s.lines_deleted as f64, "-", 1000.0, t.negative),
            self.label("deleted-label", "deleted", 1110.0, 44.0, t.secondary),
            signed("net", net as f64, "", 1330.0, t.text)
                .with(AnimationSpec::scale_in(0.8, COUNT_START, 0.6)),
            self.label("net-label", "net change", 1430.0, 44.0, t.secondary),
        ];
        Draft {
            layers,
            narration: format!(
                "Your team added {} lines and deleted {}. That's a net change of {} lines.",
                format_count(s.lines_added as i64, false),
                format_count(s.lines_deleted as i64, false),
                format_count(net.saturating_abs(), false)
            ),
            placeholder: false,
        }
    }

    fn releases(&self) -> Option<Draft> {
        let s = self.snap;
        if s.total_releases == 0 {
            return None;
        }
        let t = self.theme;
        let mut layers = vec![
            self.title("Releases Shipped", 600.0),
            self.counter("releases", s.total_releases as f64, 860.0, 200.0, t.primary),
        ];
        let mut narration = format!("You shipped {} releases this year", s.total_releases);
        if let (Some(first), Some(last)) = (&s.first_release, &s.last_release) {
            layers.push(
                self.label(
                    "span",
                    format!("From {first} to {last}"),
                    1100.0,
                    48.0,
                    t.text,
                )
                .with(AnimationSpec::fade_in(2.0, 0.5)),
            );
            narration.push_str(&format!(", from {first} all the way to {last}"));
        }
        narration.push('.');
        Some(Draft {
            layers,
            narration,
            placeholder: false,
        })
    }

    fn monthly_chart(&self) -> Draft {
        let s = self.snap;
        let t = self.theme;
        let counts = s.monthly_counts();
        if counts.iter().all(|&c| c == 0) {
            return self.placeholder(
                "Commits by Month",
                "No commits to chart",
                "There was no commit activity to chart this year.".to_string(),
            );
        }

        let bars = counts
            .iter()
            .enumerate()
            .map(|(i, &c)| ChartBar {
                label: MONTH_NAMES[i][..3].to_string(),
                value: c as f64,
                color: t.primary,
                grow: Some(AnimationSpec::new(
                    AnimKind::BarGrow,
                    0.0,
                    c as f64,
                    CHART_GROW_START + (i as f64) * CHART_STAGGER,
                    CHART_GROW_START + (i as f64) * CHART_STAGGER + CHART_GROW,
                    Ease::OutCubic,
                )),
            })
            .collect::<Vec<_>>();
        let chart = ChartLayer::new(
            bars,
            0.0,
            CHART_EXTENT_PX,
            CHART_BAR_WIDTH,
            CHART_GAP,
            TextStyle::centered(26.0, t.secondary),
            TextStyle::centered(26.0, t.text),
        );
        let origin_x = (f64::from(Canvas::PORTRAIT.width) - chart.width_px()) / 2.0;

        let busiest = s.busiest.month.as_deref().unwrap_or("One month");
        Draft {
            layers: vec![
                self.title("Commits by Month", 300.0),
                Layer::new(
                    "chart",
                    Point::new(origin_x, CHART_BASELINE_Y),
                    LayerContent::Chart(chart),
                )
                .with(AnimationSpec::fade_in(0.0, ENTER_FADE)),
            ],
            narration: format!(
                "Here's how your commit activity looked throughout the year. {busiest} was \
                 clearly the most productive month."
            ),
            placeholder: false,
        }
    }

    fn outro(&self) -> Draft {
        let s = self.snap;
        let t = self.theme;
        let commits = format_count(s.total_commits as i64, false);
        let lines = [
            format!("{commits} commits"),
            format!("{} PRs merged", s.total_prs),
            format!("{} releases", s.total_releases),
        ];
        let mut layers = vec![self.label(
            "wrap",
            format!("That's a wrap on {}!", s.year),
            700.0,
            72.0,
            t.text,
        )];
        for (i, line) in lines.into_iter().enumerate() {
            let at = 0.6 + (i as f64) * 0.4;
            layers.push(
                self.label(&format!("summary-{i}"), line, 900.0 + (i as f64) * 80.0, 48.0, t.text)
                    .with(AnimationSpec::fade_in(at, 0.4)),
            );
        }
        layers.push(
            self.label("farewell", "See you next year", 1300.0, 56.0, t.primary)
                .with(AnimationSpec::fade_in(2.0, 0.6))
                .with(AnimationSpec::scale_in(0.9, 2.0, 0.6)),
        );
        Draft {
            layers,
            narration: format!(
                "That's a wrap on {}! {commits} commits, {} pull requests, and {} releases. \
                 Here's to shipping even more next year.",
                s.year, s.total_prs, s.total_releases
            ),
            placeholder: false,
        }
    }
}

/// Shorten `s` to at most `max_chars` characters, marking the cut with an ellipsis.
fn ellipsize(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out = s
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

#[cfg(test)]
#[path = "../../tests/unit/scene/builder.rs"]
mod tests;
