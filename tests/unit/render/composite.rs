use super::*;

#[test]
fn crossfade_endpoints() {
    let a = [255, 0, 0, 255];
    let b = [0, 0, 255, 255];
    assert_eq!(crossfade(a, b, 0.0), a);
    assert_eq!(crossfade(a, b, 1.0), b);
    let mid = crossfade(a, b, 0.5);
    assert!((126..=129).contains(&mid[0]));
    assert!((126..=129).contains(&mid[2]));
    assert_eq!(mid[3], 255);
}

#[test]
fn crossfade_clamps_progress() {
    let a = [10, 20, 30, 40];
    let b = [50, 60, 70, 80];
    assert_eq!(crossfade(a, b, -1.0), a);
    assert_eq!(crossfade(a, b, 7.0), b);
}

#[test]
fn in_place_ops_reject_mismatched_buffers() {
    let mut a = vec![0u8; 8];
    assert!(crossfade_in_place(&mut a, &[0u8; 12], 0.5).is_err());
    assert!(flatten_over_bg(&mut a, &[0u8; 4], [0, 0, 0]).is_err());
    let mut odd = vec![0u8; 6];
    assert!(crossfade_in_place(&mut odd, &[0u8; 6], 0.5).is_err());
}

#[test]
fn crossfade_in_place_blends_every_pixel() {
    let mut a = [0u8, 0, 0, 255].repeat(3);
    let b = [255u8, 255, 255, 255].repeat(3);
    crossfade_in_place(&mut a, &b, 1.0).unwrap();
    assert_eq!(a, b);
}

#[test]
fn flatten_transparent_returns_bg() {
    let mut dst = vec![0u8; 4];
    flatten_over_bg(&mut dst, &[0, 0, 0, 0], [10, 20, 30]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
    flatten_over_bg(&mut dst, &[1, 2, 3, 255], [10, 20, 30]).unwrap();
    assert_eq!(dst, vec![1, 2, 3, 255]);
}
