use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use crate::audio::pcm::{AudioPcm, MIX_CHANNELS, f32le_bytes_to_samples};
use crate::audio::track::{MusicSource, MusicTrack};
use crate::foundation::error::{WrapError, WrapResult};

fn decode_args(sample_rate: u32) -> Vec<String> {
    [
        "-vn",
        "-f",
        "f32le",
        "-acodec",
        "pcm_f32le",
        "-ac",
        "2",
        "-ar",
        &sample_rate.to_string(),
        "pipe:1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn pcm_from_ffmpeg_output(
    out: std::process::Output,
    what: &str,
    sample_rate: u32,
) -> WrapResult<AudioPcm> {
    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        // A source without an audio stream decodes to empty PCM.
        if msg.contains("Stream specifier")
            || msg.contains("matches no streams")
            || msg.contains("Output file #0 does not contain any stream")
        {
            return AudioPcm::new(sample_rate, MIX_CHANNELS, Vec::new());
        }
        return Err(WrapError::audio(format!(
            "ffmpeg audio decode failed for {what}: {}",
            msg.trim()
        )));
    }
    AudioPcm::new(
        sample_rate,
        MIX_CHANNELS,
        f32le_bytes_to_samples(&out.stdout)?,
    )
}

/// Decode any audio file `ffmpeg` understands into stereo `f32` PCM at `sample_rate`.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> WrapResult<AudioPcm> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args(decode_args(sample_rate))
        .output()
        .map_err(|e| WrapError::audio(format!("failed to run ffmpeg for audio decode: {e}")))?;
    pcm_from_ffmpeg_output(out, &format!("'{}'", path.display()), sample_rate)
}

/// Decode an in-memory encoded clip (MP3, WAV, ...) by piping it through `ffmpeg`.
pub fn decode_audio_bytes(bytes: &[u8], sample_rate: u32) -> WrapResult<AudioPcm> {
    if bytes.is_empty() {
        return Err(WrapError::audio("cannot decode an empty audio payload"));
    }

    let mut child = Command::new("ffmpeg")
        .args(["-v", "error", "-i", "pipe:0"])
        .args(decode_args(sample_rate))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| WrapError::audio(format!("failed to run ffmpeg for audio decode: {e}")))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| WrapError::audio("ffmpeg stdin not available"))?;
    let payload = bytes.to_vec();
    // ffmpeg may stop reading early; a broken pipe here surfaces through its exit status.
    let writer = std::thread::spawn(move || {
        let _ = stdin.write_all(&payload);
    });

    let out = child
        .wait_with_output()
        .map_err(|e| WrapError::audio(format!("failed to wait for ffmpeg: {e}")))?;
    let _ = writer.join();
    pcm_from_ffmpeg_output(out, "in-memory clip", sample_rate)
}

/// Download `url` with a hard timeout.
pub fn fetch_url(url: &str, timeout: Duration) -> WrapResult<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| WrapError::audio(format!("failed to build http client: {e}")))?;
    let resp = client
        .get(url)
        .send()
        .map_err(|e| WrapError::audio(format!("request to '{url}' failed: {e}")))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(WrapError::audio(format!(
            "request to '{url}' returned {status}"
        )));
    }
    let bytes = resp
        .bytes()
        .map_err(|e| WrapError::audio(format!("reading body from '{url}' failed: {e}")))?;
    Ok(bytes.to_vec())
}

/// Load the configured music track. Any failure degrades to no music with a warning.
#[tracing::instrument(skip(source))]
pub fn load_music(source: &MusicSource, sample_rate: u32, timeout: Duration) -> Option<MusicTrack> {
    let decoded = match source {
        MusicSource::None => return None,
        MusicSource::File(path) => decode_audio_f32_stereo(path, sample_rate),
        MusicSource::Url(url) => {
            fetch_url(url, timeout).and_then(|bytes| decode_audio_bytes(&bytes, sample_rate))
        }
    };

    match decoded {
        Ok(pcm) if pcm.frames() > 0 => {
            tracing::info!(
                track = "music",
                secs = pcm.duration_secs(),
                "music track loaded"
            );
            Some(MusicTrack::new(Arc::new(pcm)))
        }
        Ok(_) => {
            tracing::warn!(track = "music", source = %source, "music source has no audio, continuing without music");
            None
        }
        Err(e) => {
            tracing::warn!(track = "music", source = %source, error = %e, "music unavailable, continuing without music");
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/media.rs"]
mod tests;
