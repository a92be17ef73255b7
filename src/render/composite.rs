//! Whole-frame pixel operations on premultiplied RGBA8 buffers.

use crate::foundation::error::{WrapError, WrapResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// Linear dissolve from `a` (`t = 0`) to `b` (`t = 1`).
pub fn crossfade(a: PremulRgba8, b: PremulRgba8, t: f32) -> PremulRgba8 {
    let t = t.clamp(0.0, 1.0);
    let tt = ((t * 255.0).round() as i32).clamp(0, 255) as u16;
    let it = 255u16 - tt;

    let mut out = [0u8; 4];
    for i in 0..4 {
        let av = mul_div255_u8(u16::from(a[i]), it);
        let bv = mul_div255_u8(u16::from(b[i]), tt);
        out[i] = av.saturating_add(bv);
    }
    out
}

fn check_lengths(a: &[u8], b: &[u8], op: &str) -> WrapResult<()> {
    if a.len() != b.len() || !a.len().is_multiple_of(4) {
        return Err(WrapError::render(format!(
            "{op} expects equal-length rgba8 buffers, got {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

/// Replace `a` with the dissolve of `a` toward `b` at progress `t`.
pub fn crossfade_in_place(a: &mut [u8], b: &[u8], t: f32) -> WrapResult<()> {
    check_lengths(a, b, "crossfade")?;
    for (a, b) in a.chunks_exact_mut(4).zip(b.chunks_exact(4)) {
        let out = crossfade([a[0], a[1], a[2], a[3]], [b[0], b[1], b[2], b[3]], t);
        a.copy_from_slice(&out);
    }
    Ok(())
}

/// Flatten premultiplied RGBA8 over an opaque background color.
pub fn flatten_over_bg(dst: &mut [u8], src_premul: &[u8], bg_rgb: [u8; 3]) -> WrapResult<()> {
    check_lengths(dst, src_premul, "flatten")?;
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let inv = 255u16 - u16::from(s[3]);
        for i in 0..3 {
            d[i] = s[i].saturating_add(mul_div255_u8(u16::from(bg_rgb[i]), inv));
        }
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
