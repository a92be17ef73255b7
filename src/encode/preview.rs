use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};

use crate::encode::ffmpeg::ensure_parent_dir;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{WrapError, WrapResult};
use crate::render::composite::flatten_over_bg;
use crate::render::frame::FrameRGBA;

/// What the looping preview covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewOptions {
    /// Leading span of the video, in seconds.
    pub seconds: f64,
    pub fps: Fps,
    /// Size relative to the video canvas.
    pub scale: f64,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            seconds: 6.0,
            fps: Fps { num: 10, den: 1 },
            scale: 0.5,
        }
    }
}

impl PreviewOptions {
    pub fn validate(&self) -> WrapResult<()> {
        if !self.seconds.is_finite() || self.seconds <= 0.0 {
            return Err(WrapError::validation("preview seconds must be finite and > 0"));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(WrapError::validation("preview fps must be non-zero"));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > 1.0 {
            return Err(WrapError::validation("preview scale must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Writes frames into an infinitely looping GIF, downscaled by `scale`.
///
/// Frames go to `<out>.partial` and are renamed into place by `end`.
pub struct GifPreviewSink {
    out_path: PathBuf,
    partial_path: PathBuf,
    scale: f64,
    encoder: Option<GifEncoder<BufWriter<File>>>,
    cfg: Option<SinkConfig>,
    out_size: Canvas,
    scratch: Vec<u8>,
    frames: u64,
}

impl GifPreviewSink {
    pub fn new(out_path: impl Into<PathBuf>, scale: f64) -> Self {
        let out_path = out_path.into();
        let partial_path = partial_path_for(&out_path);
        Self {
            out_path,
            partial_path,
            scale,
            encoder: None,
            cfg: None,
            out_size: Canvas {
                width: 0,
                height: 0,
            },
            scratch: Vec::new(),
            frames: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }
}

impl FrameSink for GifPreviewSink {
    fn begin(&mut self, cfg: SinkConfig) -> WrapResult<()> {
        if cfg.width == 0 || cfg.height == 0 || cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(WrapError::encode("preview needs a non-empty canvas and fps"));
        }
        ensure_parent_dir(&self.out_path).map_err(|e| WrapError::encode(e.to_string()))?;
        let file = File::create(&self.partial_path).map_err(|e| {
            WrapError::encode(format!(
                "failed to create preview '{}': {e}",
                self.partial_path.display()
            ))
        })?;
        let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), 10);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| WrapError::encode(format!("gif setup failed: {e}")))?;

        self.out_size = Canvas {
            width: cfg.width,
            height: cfg.height,
        }
        .scaled(self.scale);
        self.scratch = vec![0; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.frames = 0;
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, frame: &FrameRGBA) -> WrapResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| WrapError::encode("preview sink not started"))?;
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(WrapError::encode("preview frame size mismatch"));
        }
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| WrapError::encode("preview sink is already finalized"))?;

        flatten_over_bg(&mut self.scratch, &frame.data, [0, 0, 0])?;
        let full = image::RgbaImage::from_raw(cfg.width, cfg.height, self.scratch.clone())
            .ok_or_else(|| WrapError::encode("preview frame buffer has the wrong size"))?;
        let small = image::imageops::resize(
            &full,
            self.out_size.width,
            self.out_size.height,
            image::imageops::FilterType::Triangle,
        );

        let delay = image::Delay::from_numer_denom_ms(1000 * cfg.fps.den, cfg.fps.num);
        encoder
            .encode_frame(image::Frame::from_parts(small, 0, 0, delay))
            .map_err(|e| WrapError::encode(format!("gif frame encode failed: {e}")))?;
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> WrapResult<()> {
        // Dropping the encoder writes the GIF trailer.
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| WrapError::encode("preview sink not started"))?;
        drop(encoder);
        self.cfg = None;

        std::fs::rename(&self.partial_path, &self.out_path).map_err(|e| {
            WrapError::encode(format!(
                "failed to move preview into '{}': {e}",
                self.out_path.display()
            ))
        })?;
        Ok(())
    }
}

impl Drop for GifPreviewSink {
    fn drop(&mut self) {
        if self.encoder.take().is_some() {
            let _ = std::fs::remove_file(&self.partial_path);
        }
    }
}

fn partial_path_for(out: &Path) -> PathBuf {
    let mut name = out
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    out.with_file_name(name)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/preview.rs"]
mod tests;
