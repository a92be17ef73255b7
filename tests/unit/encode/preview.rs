use super::*;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 40,
        height: 60,
        fps: Fps { num: 10, den: 1 },
    }
}

fn frame(v: u8) -> FrameRGBA {
    let mut f = FrameRGBA::transparent(Canvas {
        width: 40,
        height: 60,
    });
    for px in f.data.chunks_exact_mut(4) {
        px.copy_from_slice(&[v, 0, 255 - v, 255]);
    }
    f
}

#[test]
fn default_options_cover_six_seconds_at_ten_fps() {
    let o = PreviewOptions::default();
    assert_eq!(o.fps, Fps { num: 10, den: 1 });
    assert!((o.seconds - 6.0).abs() < 1e-12);
    assert!(o.validate().is_ok());
    assert!(
        PreviewOptions {
            scale: 1.5,
            ..o
        }
        .validate()
        .is_err()
    );
}

#[test]
fn writes_a_looping_half_size_gif() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("preview.gif");
    let mut sink = GifPreviewSink::new(&out, 0.5);
    sink.begin(cfg()).unwrap();
    for i in 0..5u64 {
        sink.push_frame(FrameIndex(i), &frame((i * 50) as u8)).unwrap();
    }
    sink.end().unwrap();
    assert_eq!(sink.frames_written(), 5);
    assert!(!dir.path().join("preview.gif.partial").exists());

    let decoded = image::open(&out).unwrap();
    assert_eq!(decoded.width(), 20);
    assert_eq!(decoded.height(), 30);
}

#[test]
fn abandoned_preview_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("preview.gif");
    {
        let mut sink = GifPreviewSink::new(&out, 0.5);
        sink.begin(cfg()).unwrap();
        sink.push_frame(FrameIndex(0), &frame(0)).unwrap();
    }
    assert!(!out.exists());
    assert!(!dir.path().join("preview.gif.partial").exists());
}
