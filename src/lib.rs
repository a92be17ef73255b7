//! wrapreel turns a year of repository history into a narrated portrait video.
//!
//! The pipeline is a straight line of pure stages followed by one effectful sink:
//!
//! - [`StatSnapshot`] holds the year's facts (collected from git or loaded from JSON)
//! - [`SceneBuilder`] derives an ordered list of [`Scene`]s from it
//! - [`Timeline`] places scenes on a global clock, optionally crossfading between them
//! - [`Compositor`] rasterizes any timestamp into an RGBA frame
//! - [`mix`] folds narration and music into one stereo track
//! - [`render_video`] encodes frames through `ffmpeg` and muxes the audio
//!
//! [`run`] wires all of it together for one [`RunConfig`].
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod audio;
pub mod config;
/// Encoding sinks.
pub mod encode;
pub(crate) mod pipeline;
pub(crate) mod render;
pub(crate) mod scene;
pub(crate) mod stats;
pub(crate) mod timeline;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Point, Rgba8, Rgba8Premul, Vec2};
pub use crate::foundation::error::{WrapError, WrapResult};

pub use crate::animation::anim::{
    AnimKind, AnimationSpec, Axis, ResolvedBar, ResolvedLayer, ResolvedVisual, evaluate,
    evaluate_scene,
};
pub use crate::animation::ease::Ease;
pub use crate::audio::mix::{MixOptions, mix};
pub use crate::audio::narration::{
    ElevenLabsSynthesizer, NarrationSynthesizer, narration_for_timeline,
};
pub use crate::audio::pcm::{AudioPcm, MIX_CHANNELS, MIX_SAMPLE_RATE};
pub use crate::audio::track::{MusicSource, MusicTrack, Narration, NarrationCue};
pub use crate::config::{Credentials, RunConfig};
pub use crate::encode::ffmpeg::is_ffmpeg_on_path;
pub use crate::encode::preview::PreviewOptions;
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::pipeline::job::{build_timeline, load_snapshot, prepare_audio, run, run_with_snapshot};
pub use crate::pipeline::render::{
    OutputArtifact, RenderOptions, RenderStats, render_frames, render_video,
};
pub use crate::render::compositor::{Compositor, FrameRasterizer};
pub use crate::render::frame::FrameRGBA;
pub use crate::render::text::FontSource;
pub use crate::scene::builder::{BuildOptions, RenderMode, SceneBuilder};
pub use crate::scene::model::{
    Background, BackgroundImage, ChartBar, ChartLayer, HAlign, ImageBackgroundLayer, Layer,
    LayerContent, Scene, SceneKind, Shape, ShapeLayer, TextContent, TextLayer, TextStyle,
};
pub use crate::scene::theme::Theme;
pub use crate::stats::aggregate::aggregate;
pub use crate::stats::git::GitHistorySource;
pub use crate::stats::history::{CommitRecord, History, PullRequestRecord, ReleaseRecord};
pub use crate::stats::snapshot::{LeaderboardEntry, MonthlyCount, StatSnapshot};
pub use crate::timeline::{Timeline, TimelinePoint};
