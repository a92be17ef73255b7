use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        WrapError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(WrapError::encode("x").to_string().contains("encode failed:"));
    assert!(WrapError::mux("x").to_string().contains("mux failed:"));
    assert!(
        WrapError::config("x")
            .to_string()
            .contains("configuration error:")
    );
}

#[test]
fn exit_codes_are_distinct_per_fatal_class() {
    let codes = [
        WrapError::config("c").exit_code(),
        WrapError::history("h").exit_code(),
        WrapError::encode("e").exit_code(),
        WrapError::mux("m").exit_code(),
    ];
    for (i, a) in codes.iter().enumerate() {
        assert_ne!(*a, 0);
        for b in &codes[i + 1..] {
            assert_ne!(a, b);
        }
    }
    assert_eq!(WrapError::render("r").exit_code(), 1);
}

#[test]
fn stage_names_encode_and_mux() {
    assert_eq!(WrapError::encode("x").stage(), "encode");
    assert_eq!(WrapError::mux("x").stage(), "mux");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = WrapError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
