//! Per-pixel fallback for any pair of non-indexed formats.
//!
//! Every pixel is unpacked to 8-bit channels through the descriptors, then
//! modulated, composited with the destination and packed again. Always
//! iterates with nearest-neighbour sampling; unscaled blits sample every
//! column once.

use super::pixel::{fetch, mul_div_255, pack_rgba, store, unpack_rgba};
use super::{BlitFn, BlitInfo, BlitRequest, CopyFlags};
use pixel_blit_common::color_8888::Color8888;

pub(super) fn select(request: &BlitRequest<'_>) -> Option<(&'static str, BlitFn)> {
    let (src, dst) = (request.src, request.dst);
    if src.is_indexed() || dst.is_indexed() || src.format.is_fourcc() || dst.format.is_fourcc() {
        return None;
    }
    Some(("slow", blit_slow as BlitFn))
}

/// Applies the colour and alpha modulation requested in `flags`.
#[inline(always)]
pub(super) fn modulate(color: Color8888, flags: CopyFlags, by: Color8888) -> Color8888 {
    let mut out = color;
    if flags.contains(CopyFlags::MODULATE_COLOR) {
        out.r = mul_div_255(out.r as u32, by.r as u32) as u8;
        out.g = mul_div_255(out.g as u32, by.g as u32) as u8;
        out.b = mul_div_255(out.b as u32, by.b as u32) as u8;
    }
    if flags.contains(CopyFlags::MODULATE_ALPHA) {
        out.a = mul_div_255(out.a as u32, by.a as u32) as u8;
    }
    out
}

/// Combines `src` with `dst` under the blend mode in `flags`.
///
/// `BLEND` and `ADD` premultiply translucent sources first. Only `BLEND`
/// writes a new destination alpha.
#[inline(always)]
pub(super) fn composite(src: Color8888, dst: Color8888, flags: CopyFlags) -> Color8888 {
    let mut s = src;
    if flags.intersects(CopyFlags::BLEND | CopyFlags::ADD) && s.a < 255 {
        s.r = mul_div_255(s.r as u32, s.a as u32) as u8;
        s.g = mul_div_255(s.g as u32, s.a as u32) as u8;
        s.b = mul_div_255(s.b as u32, s.a as u32) as u8;
    }

    if flags.contains(CopyFlags::BLEND) {
        let inv = 255 - s.a as u32;
        let over = |s: u8, d: u8| (s as u32 + mul_div_255(inv, d as u32)).min(255) as u8;
        Color8888::new(over(s.r, dst.r), over(s.g, dst.g), over(s.b, dst.b), over(s.a, dst.a))
    } else if flags.contains(CopyFlags::ADD) {
        Color8888::new(
            s.r.saturating_add(dst.r),
            s.g.saturating_add(dst.g),
            s.b.saturating_add(dst.b),
            dst.a,
        )
    } else if flags.contains(CopyFlags::MOD) {
        let product = |s: u8, d: u8| mul_div_255(s as u32, d as u32) as u8;
        Color8888::new(product(s.r, dst.r), product(s.g, dst.g), product(s.b, dst.b), dst.a)
    } else if flags.contains(CopyFlags::MUL) {
        let inv = 255 - s.a as u32;
        let mul = |s: u8, d: u8| ((s as u32 * d as u32 + d as u32 * inv) / 255).min(255) as u8;
        Color8888::new(mul(s.r, dst.r), mul(s.g, dst.g), mul(s.b, dst.b), dst.a)
    } else {
        s
    }
}

fn blit_slow(info: &mut BlitInfo<'_>) {
    let (src_fmt, dst_fmt) = (info.src_fmt, info.dst_fmt);
    let (sbpp, dbpp) = (info.src_bpp(), info.dst_bpp());
    let (flags, modulation) = (info.flags, info.modulation);
    let keyed = flags.contains(CopyFlags::COLORKEY);
    let rgb_mask = !src_fmt.a.mask;
    let key = info.colorkey & rgb_mask;
    let reads_dst = flags.intersects(CopyFlags::BLEND_MASK);

    info.for_each_scaled_row(|src, dst, columns| {
        for (d, &x) in dst.chunks_exact_mut(dbpp).zip(columns) {
            let pixel = fetch(&src[x * sbpp..], sbpp);
            if keyed && pixel & rgb_mask == key {
                continue;
            }
            let mut color = modulate(unpack_rgba(src_fmt, pixel), flags, modulation);
            if reads_dst {
                color = composite(color, unpack_rgba(dst_fmt, fetch(d, dbpp)), flags);
            }
            store(d, dbpp, pack_rgba(dst_fmt, color));
        }
    });
}
