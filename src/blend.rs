//! Source-over compositing of one channel sequence onto another.

use crate::buffer::PixelDescriptor;
use crate::channels::Channels;

/// Composite `src` over `dst` (Porter-Duff source-over, straight alpha).
///
/// Both sequences must have the same length. Opaque formats have no real
/// alpha, so `src` simply replaces `dst`. An opaque `src` also replaces
/// `dst`; a fully transparent one leaves it untouched.
pub fn composite(descriptor: PixelDescriptor, dst: &Channels, src: &Channels) -> Channels {
    if !descriptor.has_alpha() {
        return *src;
    }
    let (Some(src_alpha), Some(dst_alpha)) = (src.alpha(), dst.alpha()) else {
        return *dst;
    };

    let max = descriptor.max_value();
    if src_alpha == 0 {
        return *dst;
    }
    if src_alpha >= max {
        return *src;
    }

    let max_f = f32::from(max);
    let fg_a = f32::from(src_alpha) / max_f;
    let bg_a = f32::from(dst_alpha) / max_f;
    let out_a = fg_a + bg_a * (1.0 - fg_a);
    if out_a <= 0.0 {
        return *dst;
    }

    let mut out = *dst;
    for ((o, &fg), &bg) in out.iter_mut().zip(src.color()).zip(dst.color()) {
        let fg = f32::from(fg) / max_f;
        let bg = f32::from(bg) / max_f;
        let c = (fg * fg_a + bg * bg_a * (1.0 - fg_a)) / out_a;
        *o = to_channel(c, max_f);
    }
    if let Some(a) = out.last_mut() {
        *a = to_channel(out_a, max_f);
    }
    out
}

/// Scale a normalized value back to the channel range, rounding half up.
#[inline]
fn to_channel(v: f32, max: f32) -> u16 {
    (v.clamp(0.0, 1.0) * max + 0.5) as u16
}
