use std::path::Path;

use crate::foundation::error::{WrapError, WrapResult};

/// Sample rate of the mixed output stream.
pub const MIX_SAMPLE_RATE: u32 = 48_000;
/// Channel count of the mixed output stream.
pub const MIX_CHANNELS: u16 = 2;

/// Decoded interleaved `f32` PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    pub fn new(sample_rate: u32, channels: u16, interleaved_f32: Vec<f32>) -> WrapResult<Self> {
        let pcm = Self {
            sample_rate,
            channels,
            interleaved_f32,
        };
        pcm.validate()?;
        Ok(pcm)
    }

    pub fn validate(&self) -> WrapResult<()> {
        if self.sample_rate == 0 {
            return Err(WrapError::audio("pcm sample_rate must be > 0"));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(WrapError::audio("pcm must be mono or stereo"));
        }
        if !self
            .interleaved_f32
            .len()
            .is_multiple_of(usize::from(self.channels))
        {
            return Err(WrapError::audio(
                "pcm sample count is not a multiple of the channel count",
            ));
        }
        Ok(())
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Linearly interpolated stereo sample at fractional frame position `pos`.
    /// Positions outside the clip read as silence.
    pub(crate) fn stereo_at(&self, pos: f64) -> (f32, f32) {
        let frames = self.frames();
        if frames == 0 || !pos.is_finite() || pos < 0.0 {
            return (0.0, 0.0);
        }
        let f0 = pos.floor() as usize;
        if f0 >= frames {
            return (0.0, 0.0);
        }
        let f1 = (f0 + 1).min(frames - 1);
        let frac = (pos - f0 as f64) as f32;
        let src = &self.interleaved_f32;

        if self.channels == 1 {
            let v = src[f0] + (src[f1] - src[f0]) * frac;
            (v, v)
        } else {
            let ch = usize::from(self.channels);
            let (i0, i1) = (f0 * ch, f1 * ch);
            (
                src[i0] + (src[i1] - src[i0]) * frac,
                src[i0 + 1] + (src[i1 + 1] - src[i0 + 1]) * frac,
            )
        }
    }
}

/// Sample frames covering `secs` at `sample_rate`, rounded to nearest.
pub fn frames_for_secs(secs: f64, sample_rate: u32) -> usize {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * f64::from(sample_rate)).round() as usize
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub fn write_f32le(samples_interleaved: &[f32], out_path: &Path) -> WrapResult<()> {
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            WrapError::audio(format!(
                "failed to create audio output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        WrapError::audio(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

pub(crate) fn f32le_bytes_to_samples(bytes: &[u8]) -> WrapResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(WrapError::audio(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/pcm.rs"]
mod tests;
