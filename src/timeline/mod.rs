//! Global-time layout of scenes.
//!
//! Scenes play back to back. With a crossfade window `c`, each scene after the first starts
//! `c` seconds before its predecessor ends, and the two are dissolved linearly over that overlap.

use crate::foundation::error::{WrapError, WrapResult};
use crate::scene::model::Scene;

/// Sequenced scenes with cached start times.
#[derive(Clone, Debug)]
pub struct Timeline {
    scenes: Vec<Scene>,
    starts: Vec<f64>,
    crossfade: f64,
    total: f64,
}

/// Scene dissolving out during a crossfade overlap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outgoing<'a> {
    pub scene: &'a Scene,
    pub local_time: f64,
    /// Dissolve progress in `[0, 1)`: `0` shows only the outgoing scene.
    pub progress: f64,
}

/// Result of [`Timeline::at`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelinePoint<'a> {
    /// Scene owning the queried instant.
    pub scene: &'a Scene,
    pub local_time: f64,
    /// Set while the previous scene is still dissolving out.
    pub outgoing: Option<Outgoing<'a>>,
}

impl Timeline {
    /// Lay out `scenes` with a symmetric crossfade of `crossfade` seconds (`0` for hard cuts).
    ///
    /// The crossfade may not exceed half of the shortest scene, so overlaps never chain.
    pub fn new(scenes: Vec<Scene>, crossfade: f64) -> WrapResult<Self> {
        if scenes.is_empty() {
            return Err(WrapError::validation("timeline needs at least one scene"));
        }
        if !crossfade.is_finite() || crossfade < 0.0 {
            return Err(WrapError::validation(format!(
                "crossfade must be finite and >= 0, got {crossfade}"
            )));
        }
        for (i, s) in scenes.iter().enumerate() {
            if s.index != i {
                return Err(WrapError::validation(format!(
                    "scene at position {i} has index {}",
                    s.index
                )));
            }
            if !s.duration.is_finite() || s.duration <= 0.0 {
                return Err(WrapError::validation(format!(
                    "scene {i} duration must be > 0"
                )));
            }
        }
        let limit = Self::max_crossfade(&scenes);
        if crossfade > limit {
            return Err(WrapError::validation(format!(
                "crossfade {crossfade}s exceeds half of the shortest scene ({limit}s allowed)"
            )));
        }
        let crossfade = if scenes.len() > 1 { crossfade } else { 0.0 };

        let mut starts = Vec::with_capacity(scenes.len());
        let mut cursor = 0.0f64;
        for s in &scenes {
            starts.push(cursor);
            cursor += s.duration - crossfade;
        }
        let sum = scenes.iter().map(|s| s.duration).sum::<f64>();
        let total = sum - crossfade * (scenes.len() - 1) as f64;

        Ok(Self {
            scenes,
            starts,
            crossfade,
            total,
        })
    }

    /// Largest crossfade `scenes` can take: half the shortest scene, unbounded for one scene.
    pub fn max_crossfade(scenes: &[Scene]) -> f64 {
        if scenes.len() < 2 {
            return f64::INFINITY;
        }
        scenes.iter().map(|s| s.duration).fold(f64::INFINITY, f64::min) / 2.0
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn crossfade(&self) -> f64 {
        self.crossfade
    }

    /// Sum of scene durations minus the total crossfade overlap.
    pub fn total_duration(&self) -> f64 {
        self.total
    }

    /// Global start time of scene `i`.
    pub fn scene_start(&self, i: usize) -> Option<f64> {
        self.starts.get(i).copied()
    }

    /// Half-open interval `[start_i, start_{i+1})` during which scene `i` owns the output.
    ///
    /// The last scene owns `[start_last, total_duration)`.
    pub fn scene_interval(&self, i: usize) -> Option<(f64, f64)> {
        let start = self.scene_start(i)?;
        let end = self.starts.get(i + 1).copied().unwrap_or(self.total);
        Some((start, end))
    }

    /// Map a global time to the owning scene and its local time.
    ///
    /// `t` is clamped to `[0, total_duration]`. At or past the end the last scene is returned at
    /// its full duration, which is the settled end state used by static sampling. Inside a
    /// crossfade overlap the incoming scene owns the instant and the previous scene is reported
    /// as [`Outgoing`].
    pub fn at(&self, t: f64) -> TimelinePoint<'_> {
        let last = self.scenes.len() - 1;
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, self.total) };
        if t >= self.total {
            let scene = &self.scenes[last];
            return TimelinePoint {
                scene,
                local_time: scene.duration,
                outgoing: None,
            };
        }

        // Last scene whose start is <= t.
        let i = self.starts.partition_point(|&s| s <= t).saturating_sub(1);
        let scene = &self.scenes[i];
        let local_time = (t - self.starts[i]).clamp(0.0, scene.duration);

        let outgoing = (self.crossfade > 0.0 && i > 0 && local_time < self.crossfade).then(|| {
            let prev = &self.scenes[i - 1];
            Outgoing {
                scene: prev,
                local_time: (t - self.starts[i - 1]).clamp(0.0, prev.duration),
                progress: local_time / self.crossfade,
            }
        });

        TimelinePoint {
            scene,
            local_time,
            outgoing,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/timeline.rs"]
mod tests;
