use crate::audio::pcm::{MIX_CHANNELS, MIX_SAMPLE_RATE, frames_for_secs};
use crate::audio::track::{MusicTrack, Narration, NarrationCue};
use crate::foundation::error::{WrapError, WrapResult};

/// Gains and ramps applied by [`mix`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixOptions {
    pub sample_rate: u32,
    /// Music gain while no narration is speaking.
    pub music_gain: f32,
    /// Music gain under narration.
    pub ducked_gain: f32,
    /// Ramp down ahead of each cue so music is fully ducked when the cue starts.
    pub duck_attack_secs: f64,
    /// Ramp back up after each cue ends.
    pub duck_release_secs: f64,
    /// Fade applied to a cue clipped at its scene boundary.
    pub cue_fade_out_secs: f64,
}

impl Default for MixOptions {
    fn default() -> Self {
        Self {
            sample_rate: MIX_SAMPLE_RATE,
            music_gain: 0.30,
            ducked_gain: 0.12,
            duck_attack_secs: 0.15,
            duck_release_secs: 0.5,
            cue_fade_out_secs: 0.25,
        }
    }
}

/// Mix optional narration and music into interleaved stereo PCM.
///
/// The result always holds `round(total_duration * sample_rate)` frames, whichever tracks are
/// present; with neither it is silence. Output is clamped to `[-1, 1]`.
#[tracing::instrument(skip(narration, music, opts))]
pub fn mix(
    narration: Option<&Narration>,
    music: Option<&MusicTrack>,
    total_duration: f64,
    opts: &MixOptions,
) -> WrapResult<Vec<f32>> {
    if !total_duration.is_finite() || total_duration < 0.0 {
        return Err(WrapError::audio(format!(
            "mix duration must be finite and >= 0, got {total_duration}"
        )));
    }
    if opts.sample_rate == 0 {
        return Err(WrapError::audio("mix sample_rate must be > 0"));
    }

    let frames = frames_for_secs(total_duration, opts.sample_rate);
    let ch = usize::from(MIX_CHANNELS);
    let mut out = vec![0.0f32; frames * ch];

    let cues: Vec<&NarrationCue> = narration.map(|n| n.audible().collect()).unwrap_or_default();

    if let Some(music) = music {
        mix_music(&mut out, music, &cues, total_duration, opts);
    }
    for cue in &cues {
        mix_cue(&mut out, cue, opts);
    }

    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }

    tracing::debug!(
        frames,
        cues = cues.len(),
        music = music.is_some(),
        "audio mixed"
    );
    Ok(out)
}

fn mix_music(
    out: &mut [f32],
    music: &MusicTrack,
    cues: &[&NarrationCue],
    total_duration: f64,
    opts: &MixOptions,
) {
    let clip = music.clip.as_ref();
    let src_frames = clip.frames();
    if src_frames == 0 {
        return;
    }
    let sr = f64::from(opts.sample_rate);
    let ch = usize::from(MIX_CHANNELS);

    for (k, frame) in out.chunks_exact_mut(ch).enumerate() {
        let t = k as f64 / sr;
        let mut pos = t * f64::from(clip.sample_rate);
        if music.looped {
            pos %= src_frames as f64;
        } else if pos >= src_frames as f64 {
            break;
        }

        let fade = edge_fade(t, total_duration, music.fade_in_secs, music.fade_out_secs);
        let duck = duck_amount(t, cues, opts);
        let gain = fade * (opts.music_gain - (opts.music_gain - opts.ducked_gain) * duck);

        let (l, r) = clip.stereo_at(pos);
        frame[0] += l * gain;
        frame[1] += r * gain;
    }
}

fn mix_cue(out: &mut [f32], cue: &NarrationCue, opts: &MixOptions) {
    let Some(clip) = cue.clip.as_ref() else {
        return;
    };
    let sr = f64::from(opts.sample_rate);
    let ch = usize::from(MIX_CHANNELS);
    let total_frames = out.len() / ch;

    let start = frames_for_secs(cue.start, opts.sample_rate);
    let end = frames_for_secs(cue.audible_end(), opts.sample_rate).min(total_frames);
    let clipped = cue.overruns_budget();
    let fade_len = opts.cue_fade_out_secs.max(0.0);

    for k in start..end {
        let t = k as f64 / sr;
        let rel = t - cue.start;
        let mut gain = 1.0f32;
        if clipped && fade_len > 0.0 {
            let remaining = (cue.budget_end - t).max(0.0);
            gain = (remaining / fade_len).clamp(0.0, 1.0) as f32;
        }
        let (l, r) = clip.stereo_at(rel.max(0.0) * f64::from(clip.sample_rate));
        out[k * ch] += l * gain;
        out[k * ch + 1] += r * gain;
    }
}

/// Linear fade-in from the start and fade-out into the end of the stream.
fn edge_fade(t: f64, total: f64, fade_in: f64, fade_out: f64) -> f32 {
    let mut gain = 1.0f64;
    if fade_in > 0.0 {
        gain *= (t / fade_in).clamp(0.0, 1.0);
    }
    if fade_out > 0.0 {
        gain *= ((total - t).max(0.0) / fade_out).clamp(0.0, 1.0);
    }
    gain as f32
}

/// How far music is pulled toward the ducked gain at `t`: 0 untouched, 1 fully ducked.
fn duck_amount(t: f64, cues: &[&NarrationCue], opts: &MixOptions) -> f32 {
    let attack = opts.duck_attack_secs.max(0.0);
    let release = opts.duck_release_secs.max(0.0);
    let mut amount = 0.0f64;
    for cue in cues {
        let (s, e) = (cue.start, cue.audible_end());
        let d = if t >= s && t <= e {
            1.0
        } else if t < s && attack > 0.0 && t >= s - attack {
            1.0 - (s - t) / attack
        } else if t > e && release > 0.0 && t <= e + release {
            1.0 - (t - e) / release
        } else {
            0.0
        };
        amount = amount.max(d);
        if amount >= 1.0 {
            break;
        }
    }
    amount as f32
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
