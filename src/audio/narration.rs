use std::sync::Arc;
use std::time::Duration;

use crate::audio::media::decode_audio_bytes;
use crate::audio::pcm::AudioPcm;
use crate::audio::track::{Narration, NarrationCue};
use crate::foundation::error::{WrapError, WrapResult};
use crate::timeline::Timeline;

/// Delay between a scene's start and its narration.
pub const NARRATION_LEAD_IN_SECS: f64 = 0.5;

pub const ELEVENLABS_DEFAULT_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";
const ELEVENLABS_MODEL: &str = "eleven_turbo_v2";
const ELEVENLABS_OUTPUT_FORMAT: &str = "mp3_44100_128";
const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Text-to-speech boundary. Implementations must bound every call with a timeout.
pub trait NarrationSynthesizer: Send + Sync {
    fn synthesize(&self, text: &str) -> WrapResult<AudioPcm>;
}

/// ElevenLabs text-to-speech over HTTPS.
pub struct ElevenLabsSynthesizer {
    client: reqwest::blocking::Client,
    api_key: String,
    voice_id: String,
    base_url: String,
    sample_rate: u32,
}

#[derive(serde::Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

impl ElevenLabsSynthesizer {
    pub fn new(
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        timeout: Duration,
        sample_rate: u32,
    ) -> WrapResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(WrapError::config("ElevenLabs api key is empty"));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WrapError::audio(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            voice_id: voice_id.into(),
            base_url: ELEVENLABS_BASE_URL.to_string(),
            sample_rate,
        })
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/text-to-speech/{}?output_format={ELEVENLABS_OUTPUT_FORMAT}",
            self.base_url.trim_end_matches('/'),
            self.voice_id
        )
    }
}

impl NarrationSynthesizer for ElevenLabsSynthesizer {
    fn synthesize(&self, text: &str) -> WrapResult<AudioPcm> {
        let resp = self
            .client
            .post(self.endpoint())
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&TtsRequest {
                text,
                model_id: ELEVENLABS_MODEL,
            })
            .send()
            .map_err(|e| WrapError::audio(format!("text-to-speech request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(WrapError::audio(format!(
                "text-to-speech returned {status}: {}",
                body.trim()
            )));
        }
        let mp3 = resp
            .bytes()
            .map_err(|e| WrapError::audio(format!("reading text-to-speech audio failed: {e}")))?;
        decode_audio_bytes(&mp3, self.sample_rate)
    }
}

/// Place one cue per narrated scene, synthesizing clips when a synthesizer is available.
///
/// A cue starts [`NARRATION_LEAD_IN_SECS`] into its scene and may run until the scene's
/// interval ends. Synthesis failures leave the cue silent and log which scene lost audio.
#[tracing::instrument(skip_all, fields(scenes = timeline.scenes().len()))]
pub fn narration_for_timeline(
    timeline: &Timeline,
    synth: Option<&dyn NarrationSynthesizer>,
) -> WrapResult<Narration> {
    let mut cues = Vec::new();
    for (i, scene) in timeline.scenes().iter().enumerate() {
        let Some(text) = scene.narration.as_deref() else {
            continue;
        };
        let (start, end) = timeline
            .scene_interval(i)
            .ok_or_else(|| WrapError::audio(format!("scene {i} is not on the timeline")))?;

        let clip = match synth {
            None => None,
            Some(synth) => match synth.synthesize(text) {
                Ok(pcm) => Some(Arc::new(pcm)),
                Err(e) => {
                    tracing::warn!(
                        scene = i,
                        kind = scene.kind.slug(),
                        error = %e,
                        "narration unavailable for scene, continuing with silence"
                    );
                    None
                }
            },
        };

        cues.push(NarrationCue {
            scene_index: i,
            text: text.to_string(),
            start: (start + NARRATION_LEAD_IN_SECS).min(end),
            budget_end: end,
            clip,
        });
    }

    let narration = Narration::new(cues)?;
    tracing::debug!(
        cues = narration.cues().len(),
        audible = narration.audible().count(),
        "narration placed"
    );
    Ok(narration)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/narration.rs"]
mod tests;
