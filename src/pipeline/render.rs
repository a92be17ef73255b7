use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};

use rayon::prelude::*;

use crate::audio::pcm::{MIX_CHANNELS, MIX_SAMPLE_RATE, frames_for_secs, write_f32le};
use crate::encode::ffmpeg::{AudioInputConfig, FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, mux};
use crate::encode::preview::{GifPreviewSink, PreviewOptions};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{WrapError, WrapResult};
use crate::render::compositor::{Compositor, FrameRasterizer};
use crate::render::frame::FrameRGBA;
use crate::scene::builder::RenderMode;
use crate::timeline::Timeline;

const MAX_REORDER_BUFFER_BYTES: u64 = 128 * 1024 * 1024;

/// Options controlling how the timeline is sampled and encoded.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub mode: RenderMode,
    pub fps: Fps,
    /// Enable frame-level parallelism (rayon), using a dedicated thread pool.
    pub parallel: bool,
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Frames handed to the pool at once.
    pub chunk_size: usize,
    /// Bounded channel capacity between render workers and the encoder thread.
    pub channel_capacity: usize,
    /// Also write a looping preview next to the video.
    pub preview: Option<PreviewOptions>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mode: RenderMode::Animated,
            fps: Fps::DEFAULT,
            parallel: true,
            threads: None,
            chunk_size: 32,
            channel_capacity: 4,
            preview: None,
        }
    }
}

/// Range render statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames delivered to the sink.
    pub frames_total: u64,
    /// Frames actually rasterized (static mode reuses one still per scene).
    pub frames_rendered: u64,
}

/// The files a successful run leaves behind.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputArtifact {
    pub video_path: PathBuf,
    pub preview_path: Option<PathBuf>,
    pub duration_secs: f64,
    pub frames: u64,
}

/// Frames needed to cover `secs` at `fps`, never fewer than one.
pub fn frame_count(secs: f64, fps: Fps) -> u64 {
    fps.secs_to_frames_round(secs).max(1)
}

/// Render the timeline to `output_path` as an MP4 carrying `audio` (interleaved stereo at
/// [`MIX_SAMPLE_RATE`]).
///
/// Video is encoded to a scratch file, muxed with the audio (padded or trimmed to the exact
/// video length) into a second scratch file, and only then renamed onto `output_path`. A failed
/// run removes its scratch files and leaves any previous output untouched.
#[tracing::instrument(skip_all, fields(out = %output_path.display(), mode = ?opts.mode))]
pub fn render_video(
    timeline: &Timeline,
    compositor: &Compositor,
    audio: &[f32],
    opts: &RenderOptions,
    output_path: &Path,
) -> WrapResult<OutputArtifact> {
    ensure_parent_dir(output_path).map_err(|e| WrapError::encode(e.to_string()))?;
    let frames = frame_count(timeline.total_duration(), opts.fps);
    let duration_secs = frames as f64 * opts.fps.frame_duration_secs();

    let video_tmp = TempFileGuard(Some(scratch_path(output_path, "video.mp4")));
    let audio_tmp = TempFileGuard(Some(scratch_path(output_path, "audio.f32le")));
    let muxed_tmp = TempFileGuard(Some(scratch_path(output_path, "muxed.mp4")));

    tracing::info!(frames, secs = duration_secs, "encoding video");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(video_tmp.path()?));
    let stats = render_frames(timeline, compositor, opts, opts.fps, frames, &mut sink)?;
    drop(sink);
    tracing::debug!(
        rendered = stats.frames_rendered,
        total = stats.frames_total,
        "video stream encoded"
    );

    let fitted = fit_audio(audio, frames_for_secs(duration_secs, MIX_SAMPLE_RATE));
    write_f32le(&fitted, audio_tmp.path()?)?;
    tracing::info!("muxing audio");
    mux(
        video_tmp.path()?,
        &AudioInputConfig {
            path: audio_tmp.path()?.to_path_buf(),
            sample_rate: MIX_SAMPLE_RATE,
            channels: MIX_CHANNELS,
        },
        duration_secs,
        muxed_tmp.path()?,
    )?;
    std::fs::rename(muxed_tmp.path()?, output_path).map_err(|e| {
        WrapError::mux(format!(
            "failed to move muxed output into '{}': {e}",
            output_path.display()
        ))
    })?;

    let preview_path = opts.preview.and_then(|p| {
        let path = output_path.with_extension("gif");
        match render_preview(timeline, compositor, opts, &p, &path) {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(track = "preview", error = %e, "preview failed, keeping the video");
                None
            }
        }
    });

    Ok(OutputArtifact {
        video_path: output_path.to_path_buf(),
        preview_path,
        duration_secs,
        frames,
    })
}

/// Re-sample the leading span of the timeline into a looping GIF.
pub fn render_preview(
    timeline: &Timeline,
    compositor: &Compositor,
    opts: &RenderOptions,
    preview: &PreviewOptions,
    out_path: &Path,
) -> WrapResult<()> {
    preview.validate()?;
    let secs = preview.seconds.min(timeline.total_duration());
    let frames = frame_count(secs, preview.fps);
    let mut sink = GifPreviewSink::new(out_path, preview.scale);
    render_frames(timeline, compositor, opts, preview.fps, frames, &mut sink)?;
    tracing::info!(path = %out_path.display(), frames, "preview written");
    Ok(())
}

/// Sample `frames` frames at `fps` and push them to `sink` in strictly increasing order.
///
/// Animated mode samples the timeline at `k / fps`. Static mode holds each scene's settled end
/// state for every frame the scene owns, rasterizing one still per scene.
pub fn render_frames(
    timeline: &Timeline,
    compositor: &Compositor,
    opts: &RenderOptions,
    fps: Fps,
    frames: u64,
    sink: &mut dyn FrameSink,
) -> WrapResult<RenderStats> {
    if frames == 0 {
        return Err(WrapError::validation("render needs at least one frame"));
    }
    let canvas = compositor.canvas();
    let cfg = SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps,
    };

    let cap = opts.channel_capacity.max(1);
    let bytes_per_frame = (cfg.width as u64)
        .saturating_mul(cfg.height as u64)
        .saturating_mul(4)
        .max(1);
    let max_chunk_by_mem = (MAX_REORDER_BUFFER_BYTES / bytes_per_frame).max(1);
    let chunk_size = normalized_chunk_size(opts.chunk_size)
        .min(max_chunk_by_mem)
        .min(frames);

    let pool = if opts.parallel {
        Some(build_thread_pool(opts.threads)?)
    } else {
        None
    };

    // Encoder thread: in-order delivery to the sink regardless of render completion order.
    std::thread::scope(|scope| -> WrapResult<RenderStats> {
        let (tx, rx) = mpsc::sync_channel::<FrameMsg>(cap);
        let sink_ref: &mut dyn FrameSink = sink;

        let enc = scope.spawn(move || -> WrapResult<()> {
            sink_ref.begin(cfg)?;

            let mut next = 0u64;
            let mut pending = HashMap::<u64, Arc<FrameRGBA>>::new();
            while next < frames {
                if let Some(frame) = pending.remove(&next) {
                    sink_ref.push_frame(FrameIndex(next), &frame)?;
                    next += 1;
                    continue;
                }

                // A closed channel means the producer failed; its error is the one reported.
                let Ok(msg) = rx.recv() else {
                    return Ok(());
                };
                pending.insert(msg.idx.0, msg.frame);
            }

            sink_ref.end()
        });

        let ctx = ProduceCtx {
            timeline,
            compositor,
            fps,
            tx: &tx,
        };
        let produce_res = match opts.mode {
            RenderMode::Static => produce_static(&ctx, pool.as_ref(), frames),
            RenderMode::Animated => produce_animated(&ctx, pool.as_ref(), frames, chunk_size),
        };

        drop(tx);
        let enc_res = enc
            .join()
            .map_err(|_| WrapError::render("encoder thread panicked"))?;

        // Producer send failures follow from the encoder stopping, so its error goes first.
        enc_res?;
        let rendered = produce_res?;
        Ok(RenderStats {
            frames_total: frames,
            frames_rendered: rendered,
        })
    })
}

#[derive(Debug)]
struct FrameMsg {
    idx: FrameIndex,
    frame: Arc<FrameRGBA>,
}

#[derive(Clone, Copy)]
struct ProduceCtx<'a> {
    timeline: &'a Timeline,
    compositor: &'a Compositor,
    fps: Fps,
    tx: &'a mpsc::SyncSender<FrameMsg>,
}

impl ProduceCtx<'_> {
    fn send(&self, idx: u64, frame: Arc<FrameRGBA>) -> WrapResult<()> {
        self.tx
            .send(FrameMsg {
                idx: FrameIndex(idx),
                frame,
            })
            .map_err(|_| WrapError::render("encoder thread is not accepting frames"))
    }

    fn time_of(&self, idx: u64) -> f64 {
        self.fps.frame_to_secs(FrameIndex(idx))
    }
}

fn produce_animated(
    ctx: &ProduceCtx<'_>,
    pool: Option<&rayon::ThreadPool>,
    frames: u64,
    chunk_size: u64,
) -> WrapResult<u64> {
    let Some(pool) = pool else {
        let mut raster = ctx.compositor.rasterizer()?;
        for f in 0..frames {
            let frame = raster.render_at(ctx.timeline, ctx.time_of(f))?;
            ctx.send(f, Arc::new(frame))?;
        }
        return Ok(frames);
    };

    let mut chunk_start = 0u64;
    while chunk_start < frames {
        let chunk_end = (chunk_start + chunk_size).min(frames);
        let tx = ctx.tx.clone();
        pool.install(|| {
            (chunk_start..chunk_end).into_par_iter().try_for_each_init(
                || ctx.compositor.rasterizer(),
                move |raster, f| -> WrapResult<()> {
                    let raster = worker(raster)?;
                    let frame = raster.render_at(ctx.timeline, ctx.time_of(f))?;
                    tx.send(FrameMsg {
                        idx: FrameIndex(f),
                        frame: Arc::new(frame),
                    })
                    .map_err(|_| WrapError::render("encoder thread is not accepting frames"))
                },
            )
        })?;
        tracing::debug!(start = chunk_start, end = chunk_end, "chunk rendered");
        chunk_start = chunk_end;
    }
    Ok(frames)
}

fn produce_static(
    ctx: &ProduceCtx<'_>,
    pool: Option<&rayon::ThreadPool>,
    frames: u64,
) -> WrapResult<u64> {
    let scenes = ctx.timeline.scenes();
    let owners: Vec<usize> = (0..frames)
        .map(|f| ctx.timeline.at(ctx.time_of(f)).scene.index)
        .collect();

    let mut needed: Vec<usize> = owners.clone();
    needed.dedup();

    let render_still = |raster: &mut FrameRasterizer, i: usize| -> WrapResult<(usize, Arc<FrameRGBA>)> {
        let scene = &scenes[i];
        Ok((i, Arc::new(raster.compose(scene, scene.duration)?)))
    };

    let stills: Vec<(usize, Arc<FrameRGBA>)> = match pool {
        Some(pool) => pool.install(|| {
            needed
                .par_iter()
                .map_init(
                    || ctx.compositor.rasterizer(),
                    |raster, &i| render_still(worker(raster)?, i),
                )
                .collect::<WrapResult<Vec<_>>>()
        })?,
        None => {
            let mut raster = ctx.compositor.rasterizer()?;
            needed
                .iter()
                .map(|&i| render_still(&mut raster, i))
                .collect::<WrapResult<Vec<_>>>()?
        }
    };
    let stills: HashMap<usize, Arc<FrameRGBA>> = stills.into_iter().collect();

    for (f, owner) in owners.iter().enumerate() {
        let frame = stills
            .get(owner)
            .cloned()
            .ok_or_else(|| WrapError::render(format!("missing still for scene {owner}")))?;
        ctx.send(f as u64, frame)?;
    }
    Ok(stills.len() as u64)
}

fn worker(raster: &mut WrapResult<FrameRasterizer>) -> WrapResult<&mut FrameRasterizer> {
    raster
        .as_mut()
        .map_err(|e| WrapError::render(format!("failed to set up render worker: {e}")))
}

/// Pad with silence or trim so the stream holds exactly `frames` stereo frames.
pub fn fit_audio(audio: &[f32], frames: usize) -> Vec<f32> {
    let len = frames * usize::from(MIX_CHANNELS);
    let mut out = audio[..audio.len().min(len)].to_vec();
    out.resize(len, 0.0);
    out
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

fn build_thread_pool(threads: Option<usize>) -> WrapResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(WrapError::validation("'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| WrapError::render(format!("failed to build rayon thread pool: {e}")))
}

/// Scratch file next to `output` so the final rename stays on one filesystem.
fn scratch_path(output: &Path, tag: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!(".{stem}.{}.{tag}", std::process::id()))
}

struct TempFileGuard(Option<PathBuf>);

impl TempFileGuard {
    fn path(&self) -> WrapResult<&Path> {
        self.0
            .as_deref()
            .ok_or_else(|| WrapError::render("scratch path already released"))
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/render.rs"]
mod tests;
