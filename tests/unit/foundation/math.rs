use super::*;

#[test]
fn mul_div255_is_exact_at_extremes() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(0, 255), 0);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(255, 128), 128);
}

#[test]
fn lerp_endpoints_are_exact() {
    assert_eq!(lerp(3.0, 9.0, 0.0), 3.0);
    assert_eq!(lerp(3.0, 9.0, 1.0), 9.0);
    assert_eq!(lerp(0.0, 120.0, 0.5), 60.0);
}

#[test]
fn lerp_endpoints_exact_for_inexact_spans() {
    assert_eq!(lerp(0.1, 0.7, 1.0), 0.7);
    assert_eq!(lerp(0.1, 0.7, 1.5), 0.7);
    assert_eq!(lerp(0.1, 0.7, -0.2), 0.1);
}
