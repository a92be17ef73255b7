use super::*;
use crate::scene::model::{Scene, SceneKind};

struct FakeSynth {
    secs: f64,
    fail_on: &'static str,
}

impl NarrationSynthesizer for FakeSynth {
    fn synthesize(&self, text: &str) -> WrapResult<AudioPcm> {
        if text.contains(self.fail_on) {
            return Err(WrapError::audio("quota exceeded"));
        }
        let frames = (self.secs * 1000.0).round() as usize;
        AudioPcm::new(1000, 2, vec![0.5; frames * 2])
    }
}

fn timeline(narrations: &[Option<&str>]) -> Timeline {
    let scenes = narrations
        .iter()
        .enumerate()
        .map(|(index, n)| Scene {
            index,
            kind: SceneKind::DEFAULT_ORDER[index],
            duration: 5.0,
            layers: Vec::new(),
            narration: n.map(str::to_string),
            placeholder: false,
        })
        .collect();
    Timeline::new(scenes, 0.0).unwrap()
}

#[test]
fn cues_start_after_lead_in_and_end_at_scene_boundary() {
    let tl = timeline(&[Some("hello"), None, Some("bye")]);
    let n = narration_for_timeline(&tl, None).unwrap();
    let cues = n.cues();
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].scene_index, 0);
    assert!((cues[0].start - 0.5).abs() < 1e-9);
    assert!((cues[0].budget_end - 5.0).abs() < 1e-9);
    assert_eq!(cues[1].scene_index, 2);
    assert!((cues[1].start - 10.5).abs() < 1e-9);
    assert!((cues[1].budget_end - 15.0).abs() < 1e-9);
    assert!(n.is_silent());
}

#[test]
fn failed_synthesis_degrades_that_cue_only() {
    let tl = timeline(&[Some("intro line"), Some("broken line"), Some("outro line")]);
    let synth = FakeSynth {
        secs: 2.0,
        fail_on: "broken",
    };
    let n = narration_for_timeline(&tl, Some(&synth)).unwrap();
    let clips: Vec<bool> = n.cues().iter().map(|c| c.clip.is_some()).collect();
    assert_eq!(clips, vec![true, false, true]);
}

#[test]
fn overlong_clips_are_accepted_and_clipped_later() {
    let tl = timeline(&[Some("a"), Some("b")]);
    let synth = FakeSynth {
        secs: 8.0,
        fail_on: "never",
    };
    let n = narration_for_timeline(&tl, Some(&synth)).unwrap();
    assert!(n.cues()[0].overruns_budget());
    assert!((n.cues()[0].audible_end() - 5.0).abs() < 1e-9);
}

#[test]
fn elevenlabs_endpoint_carries_voice_and_format() {
    let s = ElevenLabsSynthesizer::new("key", "voice123", Duration::from_secs(1), 48_000)
        .unwrap()
        .with_base_url("http://localhost:1/v1/");
    assert_eq!(
        s.endpoint(),
        "http://localhost:1/v1/text-to-speech/voice123?output_format=mp3_44100_128"
    );
    assert!(ElevenLabsSynthesizer::new(" ", "v", Duration::from_secs(1), 48_000).is_err());
}

#[test]
fn unreachable_service_is_an_audio_error() {
    let s = ElevenLabsSynthesizer::new("key", "v", Duration::from_millis(300), 48_000)
        .unwrap()
        .with_base_url("http://127.0.0.1:9");
    let err = s.synthesize("hi").unwrap_err();
    assert_eq!(err.stage(), "audio");
}
