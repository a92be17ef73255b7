use std::path::PathBuf;
use std::sync::Arc;

use crate::audio::pcm::AudioPcm;
use crate::foundation::error::{WrapError, WrapResult};

/// Slack allowed between one cue's end and the next cue's start.
pub const CUE_OVERLAP_TOLERANCE_SECS: f64 = 0.05;

/// Where background music comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MusicSource {
    #[default]
    None,
    File(PathBuf),
    Url(String),
}

impl std::fmt::Display for MusicSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::File(p) => write!(f, "file '{}'", p.display()),
            Self::Url(u) => write!(f, "url '{u}'"),
        }
    }
}

/// One narrated line, placed on the global timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct NarrationCue {
    pub scene_index: usize,
    pub text: String,
    /// Global start time in seconds.
    pub start: f64,
    /// End of the owning scene; audio past this point is faded and cut.
    pub budget_end: f64,
    /// `None` when synthesis failed or was disabled; the cue then plays as silence.
    pub clip: Option<Arc<AudioPcm>>,
}

impl NarrationCue {
    pub fn clip_duration(&self) -> f64 {
        self.clip.as_ref().map_or(0.0, |c| c.duration_secs())
    }

    /// Whether the clip runs past the scene budget.
    pub fn overruns_budget(&self) -> bool {
        self.start + self.clip_duration() > self.budget_end
    }

    /// Where the audible part of this cue ends, after clipping to the budget.
    pub fn audible_end(&self) -> f64 {
        (self.start + self.clip_duration()).min(self.budget_end)
    }
}

/// Ordered narration cues.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Narration {
    cues: Vec<NarrationCue>,
}

impl Narration {
    pub fn new(cues: Vec<NarrationCue>) -> WrapResult<Self> {
        for cue in &cues {
            if !cue.start.is_finite() || cue.start < 0.0 {
                return Err(WrapError::audio(format!(
                    "narration cue for scene {} has invalid start {}",
                    cue.scene_index, cue.start
                )));
            }
            if !cue.budget_end.is_finite() || cue.budget_end < cue.start {
                return Err(WrapError::audio(format!(
                    "narration cue for scene {} ends before it starts",
                    cue.scene_index
                )));
            }
        }
        for pair in cues.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if b.start < a.start {
                return Err(WrapError::audio("narration cue starts must be non-decreasing"));
            }
            if a.audible_end() > b.start + CUE_OVERLAP_TOLERANCE_SECS {
                return Err(WrapError::audio(format!(
                    "narration cue for scene {} overlaps the next cue by {:.3}s",
                    a.scene_index,
                    a.audible_end() - b.start
                )));
            }
        }
        Ok(Self { cues })
    }

    pub fn cues(&self) -> &[NarrationCue] {
        &self.cues
    }

    /// Cues that actually carry audio.
    pub fn audible(&self) -> impl Iterator<Item = &NarrationCue> {
        self.cues.iter().filter(|c| c.clip.is_some())
    }

    pub fn is_silent(&self) -> bool {
        self.audible().next().is_none()
    }
}

/// Background music clip and its playback policy.
#[derive(Clone, Debug, PartialEq)]
pub struct MusicTrack {
    pub clip: Arc<AudioPcm>,
    /// Repeat the clip when it is shorter than the timeline.
    pub looped: bool,
    pub fade_in_secs: f64,
    pub fade_out_secs: f64,
}

impl MusicTrack {
    pub fn new(clip: Arc<AudioPcm>) -> Self {
        Self {
            clip,
            looped: true,
            fade_in_secs: 2.0,
            fade_out_secs: 3.0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/track.rs"]
mod tests;
