use super::*;
use crate::encode::ffmpeg::is_ffmpeg_on_path;

#[test]
fn no_music_source_loads_nothing() {
    assert!(load_music(&MusicSource::None, 48_000, Duration::from_secs(1)).is_none());
}

#[test]
fn unreachable_music_url_degrades_to_none() {
    let src = MusicSource::Url("http://127.0.0.1:9/nothing.mp3".to_string());
    assert!(load_music(&src, 48_000, Duration::from_millis(500)).is_none());
}

#[test]
fn empty_payload_is_an_audio_error() {
    assert!(decode_audio_bytes(&[], 48_000).is_err());
}

#[test]
fn undecodable_music_file_degrades_to_none() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.mp3");
    std::fs::write(&path, b"definitely not audio").unwrap();
    assert!(load_music(&MusicSource::File(path), 48_000, Duration::from_secs(5)).is_none());
}

#[test]
fn decodes_generated_tone() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let status = Command::new("ffmpeg")
        .args(["-v", "error", "-f", "lavfi", "-i", "sine=frequency=440:duration=1"])
        .arg(&path)
        .status()
        .unwrap();
    assert!(status.success());

    let pcm = decode_audio_f32_stereo(&path, 48_000).unwrap();
    assert_eq!(pcm.channels, 2);
    assert!((pcm.duration_secs() - 1.0).abs() < 0.05);

    let bytes = std::fs::read(&path).unwrap();
    let from_bytes = decode_audio_bytes(&bytes, 48_000).unwrap();
    assert!((from_bytes.duration_secs() - 1.0).abs() < 0.05);
}
