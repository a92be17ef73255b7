use super::*;

fn valid() -> RunConfig {
    RunConfig::new(2024)
}

#[test]
fn defaults_validate() {
    valid().validate().unwrap();
    assert_eq!(valid().output_path(), PathBuf::from("./github-wrapped-2024.mp4"));
}

#[test]
fn year_out_of_range_is_a_config_error() {
    for year in [2004, 1999, chrono::Local::now().year() + 1] {
        let err = RunConfig::new(year).validate().unwrap_err();
        assert_eq!(err.exit_code(), 2, "year {year}");
    }
}

#[test]
fn output_name_must_be_plain() {
    for name in ["", "  ", "a/b", "..", "x\\y"] {
        let cfg = RunConfig {
            output_name: name.to_string(),
            ..valid()
        };
        assert!(cfg.validate().is_err(), "name {name:?}");
    }
    let cfg = RunConfig {
        output_name: "wrapped.MP4".to_string(),
        output_dir: PathBuf::from("out"),
        ..valid()
    };
    assert_eq!(cfg.output_path(), PathBuf::from("out/wrapped.MP4"));
}

#[test]
fn unreadable_music_file_fails_fast() {
    let cfg = RunConfig {
        music: MusicSource::File(PathBuf::from("/no/such/song.mp3")),
        ..valid()
    };
    let err = cfg.validate().unwrap_err();
    assert_eq!(err.stage(), "configuration");

    let dir = tempfile::tempdir().unwrap();
    let cfg = RunConfig {
        music: MusicSource::File(dir.path().to_path_buf()),
        ..valid()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn music_url_must_be_http() {
    let cfg = RunConfig {
        music: MusicSource::Url("ftp://x/y.mp3".to_string()),
        ..valid()
    };
    assert!(cfg.validate().is_err());
    let cfg = RunConfig {
        music: MusicSource::Url("https://x/y.mp3".to_string()),
        ..valid()
    };
    assert!(cfg.validate().is_ok());
}

#[test]
fn bad_numbers_are_rejected() {
    for crossfade in [-0.1, f64::NAN, f64::INFINITY] {
        let cfg = RunConfig {
            crossfade,
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }
    let cfg = RunConfig {
        threads: Some(0),
        ..valid()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn crossfade_longer_than_half_a_scene_is_a_config_error() {
    let ok = RunConfig {
        crossfade: 2.5,
        ..valid()
    };
    ok.validate().unwrap();
    let err = RunConfig {
        crossfade: 30.0,
        ..valid()
    }
    .validate()
    .unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn explicit_font_path_wins_and_must_exist() {
    let cfg = RunConfig {
        font_path: Some(PathBuf::from("/no/font.ttf")),
        ..valid()
    };
    assert!(cfg.validate().is_err());
    assert!(cfg.resolve_font_with(|_| None).is_err());
}

#[test]
fn font_env_is_consulted_before_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.ttf");
    std::fs::write(&path, b"fontish").unwrap();
    let p = path.to_string_lossy().into_owned();

    let font = valid()
        .resolve_font_with(|k| (k == FONT_ENV).then(|| p.clone()))
        .unwrap()
        .unwrap();
    assert_eq!(font.path, path);
    assert_eq!(font.bytes.as_slice(), b"fontish");
}

#[test]
fn credentials_ignore_blank_keys_and_redact_debug() {
    assert_eq!(Credentials::from_lookup(|_| Some("  ".into())).elevenlabs_api_key, None);
    let creds = Credentials::from_lookup(|k| (k == ELEVENLABS_KEY_ENV).then(|| "sk-1 ".into()));
    assert_eq!(creds.elevenlabs_api_key.as_deref(), Some("sk-1"));
    assert!(!format!("{creds:?}").contains("sk-1"));
}
