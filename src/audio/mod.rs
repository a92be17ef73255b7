//! Audio tracks and the mixer.
//!
//! Narration cues are synthesized (or skipped) per scene, music is decoded through `ffmpeg`, and
//! [`mix::mix`] folds both into one interleaved stereo stream exactly as long as the timeline.

pub(crate) mod media;
pub(crate) mod mix;
pub(crate) mod narration;
pub(crate) mod pcm;
pub(crate) mod track;
