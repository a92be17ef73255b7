use super::*;

#[test]
fn validate_rejects_ragged_stereo() {
    assert!(AudioPcm::new(48_000, 2, vec![0.0; 3]).is_err());
    assert!(AudioPcm::new(0, 2, vec![]).is_err());
    assert!(AudioPcm::new(48_000, 6, vec![]).is_err());
    let pcm = AudioPcm::new(48_000, 2, vec![0.0; 96_000]).unwrap();
    assert_eq!(pcm.frames(), 48_000);
    assert!((pcm.duration_secs() - 1.0).abs() < 1e-12);
}

#[test]
fn stereo_at_interpolates_and_silences_outside() {
    let pcm = AudioPcm::new(10, 1, vec![0.0, 1.0]).unwrap();
    assert_eq!(pcm.stereo_at(0.5), (0.5, 0.5));
    assert_eq!(pcm.stereo_at(2.0), (0.0, 0.0));
    assert_eq!(pcm.stereo_at(-1.0), (0.0, 0.0));

    let st = AudioPcm::new(10, 2, vec![0.0, 1.0, 1.0, 0.0]).unwrap();
    assert_eq!(st.stereo_at(0.0), (0.0, 1.0));
    assert_eq!(st.stereo_at(0.5), (0.5, 0.5));
}

#[test]
fn frames_for_secs_rounds() {
    assert_eq!(frames_for_secs(1.0, 48_000), 48_000);
    assert_eq!(frames_for_secs(0.000_01, 48_000), 0);
    assert_eq!(frames_for_secs(-1.0, 48_000), 0);
    assert_eq!(frames_for_secs(f64::NAN, 48_000), 0);
}

#[test]
fn f32le_file_roundtrips_through_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/mix.f32le");
    write_f32le(&[0.25, -1.0], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(f32le_bytes_to_samples(&bytes).unwrap(), vec![0.25, -1.0]);
    assert!(f32le_bytes_to_samples(&bytes[..3]).is_err());
}
