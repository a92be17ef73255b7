use std::sync::Arc;

use crate::audio::media::load_music;
use crate::audio::mix::{MixOptions, mix};
use crate::audio::narration::{ElevenLabsSynthesizer, NarrationSynthesizer, narration_for_timeline};
use crate::audio::pcm::MIX_SAMPLE_RATE;
use crate::config::{Credentials, RunConfig};
use crate::encode::preview::PreviewOptions;
use crate::foundation::core::Canvas;
use crate::foundation::error::{WrapError, WrapResult};
use crate::pipeline::render::{OutputArtifact, RenderOptions, render_video};
use crate::render::compositor::Compositor;
use crate::render::text::FontSource;
use crate::scene::builder::{BuildOptions, RenderMode, SceneBuilder};
use crate::scene::model::BackgroundImage;
use crate::stats::aggregate::aggregate;
use crate::stats::git::{GitHistorySource, is_git_repo};
use crate::stats::snapshot::{MONTH_NAMES, StatSnapshot};
use crate::timeline::Timeline;

/// Run one invocation: validate, gather statistics, build scenes, mix audio, render and mux.
///
/// A missing API key or a failed synthesis only costs narration; everything else that goes wrong
/// is returned with its stage. A missing font is a configuration error here.
pub fn run(config: &RunConfig, credentials: &Credentials) -> WrapResult<OutputArtifact> {
    config.validate()?;
    let font = config.resolve_font()?.ok_or_else(|| {
        WrapError::config(format!(
            "no usable font found; pass --font or set {}",
            crate::config::FONT_ENV
        ))
    })?;
    let snapshot = load_snapshot(config)?;
    log_summary(&snapshot);

    let synth = narration_synthesizer(config, credentials)?;
    run_with_snapshot(
        config,
        &snapshot,
        Some(font),
        synth.as_ref().map(|s| s as &dyn NarrationSynthesizer),
    )
}

/// Everything after statistics are known.
#[tracing::instrument(skip_all, fields(repo = %snapshot.repo_name, year = snapshot.year))]
pub fn run_with_snapshot(
    config: &RunConfig,
    snapshot: &StatSnapshot,
    font: Option<FontSource>,
    synth: Option<&dyn NarrationSynthesizer>,
) -> WrapResult<OutputArtifact> {
    let timeline = build_timeline(config, snapshot)?;
    tracing::info!(
        scenes = timeline.scenes().len(),
        secs = timeline.total_duration(),
        "timeline built"
    );

    let compositor = Compositor::new(Canvas::PORTRAIT, font)?;
    tracing::debug!(text = compositor.has_font(), "compositor ready");
    let audio = prepare_audio(config, &timeline, synth)?;

    let artifact = render_video(
        &timeline,
        &compositor,
        &audio,
        &render_options(config),
        &config.output_path(),
    )?;
    tracing::info!(
        path = %artifact.video_path.display(),
        secs = artifact.duration_secs,
        frames = artifact.frames,
        "video written"
    );
    Ok(artifact)
}

/// Snapshot from `--stats` JSON, or collected from the repository history.
pub fn load_snapshot(config: &RunConfig) -> WrapResult<StatSnapshot> {
    if let Some(path) = &config.stats_path {
        let snapshot = StatSnapshot::from_json_path(path)?;
        if snapshot.year != config.year {
            tracing::warn!(
                file_year = snapshot.year,
                year = config.year,
                "stats file covers a different year than requested"
            );
        }
        return Ok(snapshot);
    }

    if !is_git_repo(&config.repo_path) {
        return Err(WrapError::history(format!(
            "'{}' is not a git repository",
            config.repo_path.display()
        )));
    }
    let source = GitHistorySource {
        fetch_pull_requests: config.fetch_pull_requests,
        ..GitHistorySource::new(&config.repo_path)
    };
    let history = source.collect(config.year)?;
    Ok(aggregate(&history, config.year))
}

/// Scenes for `snapshot`, laid out with the configured crossfade.
pub fn build_timeline(config: &RunConfig, snapshot: &StatSnapshot) -> WrapResult<Timeline> {
    let background_image = config
        .background_image
        .as_deref()
        .map(BackgroundImage::from_path)
        .transpose()?
        .map(Arc::new);
    let options = BuildOptions {
        mode: render_mode(config),
        background_image,
        ..BuildOptions::default()
    };
    let scenes = SceneBuilder::new(options).build(snapshot)?;
    let limit = Timeline::max_crossfade(&scenes);
    if config.crossfade > limit {
        return Err(WrapError::config(format!(
            "crossfade {}s is longer than half of the shortest scene ({limit}s allowed)",
            config.crossfade
        )));
    }
    Timeline::new(scenes, config.crossfade)
}

/// Mixed soundtrack for the whole timeline. With audio disabled this is silence of the same
/// length, so the video always carries an audio stream.
pub fn prepare_audio(
    config: &RunConfig,
    timeline: &Timeline,
    synth: Option<&dyn NarrationSynthesizer>,
) -> WrapResult<Vec<f32>> {
    let total = timeline.total_duration();
    let opts = MixOptions::default();
    if !config.audio_enabled {
        tracing::info!("audio disabled, using a silent track");
        return mix(None, None, total, &opts);
    }

    // Synthesis and the music download are both network bound.
    let (narration, music) = std::thread::scope(|scope| {
        let music = scope.spawn(|| load_music(&config.music, MIX_SAMPLE_RATE, config.network_timeout));
        let narration = narration_for_timeline(timeline, synth);
        let music = music.join().unwrap_or_else(|_| {
            tracing::warn!(track = "music", "music loader panicked, continuing without music");
            None
        });
        (narration, music)
    });
    let narration = narration?;
    mix(Some(&narration), music.as_ref(), total, &opts)
}

fn narration_synthesizer(
    config: &RunConfig,
    credentials: &Credentials,
) -> WrapResult<Option<ElevenLabsSynthesizer>> {
    if !config.audio_enabled {
        return Ok(None);
    }
    let Some(key) = credentials.elevenlabs_api_key.as_deref() else {
        tracing::warn!(
            track = "narration",
            "ELEVENLABS_API_KEY is not set, rendering without narration"
        );
        return Ok(None);
    };
    ElevenLabsSynthesizer::new(
        key,
        config.voice_id.as_str(),
        config.network_timeout,
        MIX_SAMPLE_RATE,
    )
    .map(Some)
}

fn render_mode(config: &RunConfig) -> RenderMode {
    if config.static_mode {
        RenderMode::Static
    } else {
        RenderMode::Animated
    }
}

/// Render knobs derived from the run configuration.
pub fn render_options(config: &RunConfig) -> RenderOptions {
    RenderOptions {
        mode: render_mode(config),
        parallel: config.parallel,
        threads: config.threads,
        preview: config.emit_preview.then(PreviewOptions::default),
        ..RenderOptions::default()
    }
}

fn log_summary(s: &StatSnapshot) {
    let busiest_month = s
        .monthly
        .iter()
        .max_by_key(|m| m.commits)
        .filter(|m| m.commits > 0)
        .and_then(|m| MONTH_NAMES.get(usize::from(m.month).saturating_sub(1)))
        .copied()
        .unwrap_or("-");
    tracing::info!(
        repo = %s.repo_name,
        year = s.year,
        commits = s.total_commits,
        prs = s.total_prs,
        releases = s.total_releases,
        added = s.lines_added,
        deleted = s.lines_deleted,
        contributors = s.leaderboard.len(),
        active_days = s.days_with_commits,
        busiest_month,
        "year in numbers"
    );
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/job.rs"]
mod tests;
