//! Blending kernels.
//!
//! Three shapes of blend reach this family:
//!
//! - `BLEND`: per-pixel alpha taken from the source.
//! - `MODULATE_ALPHA | BLEND` on a source without alpha: one alpha for the whole surface.
//! - The same with `COLORKEY`: surface alpha, skipping keyed pixels.
//!
//! 8-bit indexed destinations blend against their palette colour and are then
//! re-quantised through the 3-3-2 ramp and the blit map's table.

use super::pixel::{blend_channel, blend_over, fetch, pack_rgba, quantize_332, store, unpack_rgba};
use super::{BlitFn, BlitInfo, BlitRequest, CopyFlags};
use crate::descriptor::PixelFormatDescriptor;
use pixel_blit_common::color_8888::Color8888;

fn same_rgb(a: &PixelFormatDescriptor, b: &PixelFormatDescriptor) -> bool {
    a.r.mask == b.r.mask && a.g.mask == b.g.mask && a.b.mask == b.b.mask
}

pub(super) fn select(request: &BlitRequest<'_>) -> Option<(&'static str, BlitFn)> {
    let (src, dst) = (request.src, request.dst);
    let flags = request.flags.difference(CopyFlags::RLE_MASK);
    let surface_alpha = CopyFlags::MODULATE_ALPHA | CopyFlags::BLEND;
    let indexed_dst = dst.bytes_per_pixel == 1 && dst.is_indexed();

    if flags == CopyFlags::BLEND {
        if indexed_dst {
            return Some(("blit_n_to_1_pixel_alpha", blit_n_to_1_pixel_alpha as BlitFn));
        }
        if dst.bytes_per_pixel == 4
            && src.bytes_per_pixel == 4
            && src.a.is_present()
            && same_rgb(src, dst)
        {
            return Some(("blit_rgb_to_rgb_pixel_alpha", blit_rgb_to_rgb_pixel_alpha as BlitFn));
        }
        return Some(("blit_n_to_n_pixel_alpha", blit_n_to_n_pixel_alpha as BlitFn));
    }

    if src.a.is_present() {
        return None;
    }

    if flags == surface_alpha {
        if indexed_dst {
            return Some(("blit_n_to_1_surface_alpha", blit_n_to_1_surface_alpha::<false> as BlitFn));
        }
        if dst.bytes_per_pixel == 2 && request.identity {
            match dst.g.mask {
                0x07E0 => return Some(("blit_565_to_565_surface_alpha", blit_565_to_565_surface_alpha as BlitFn)),
                0x03E0 => return Some(("blit_555_to_555_surface_alpha", blit_555_to_555_surface_alpha as BlitFn)),
                _ => {}
            }
        }
        if dst.bytes_per_pixel == 4 && src.bytes_per_pixel == 4 && same_rgb(src, dst) {
            return Some(("blit_rgb_to_rgb_surface_alpha", blit_rgb_to_rgb_surface_alpha as BlitFn));
        }
        return Some(("blit_n_to_n_surface_alpha", blit_n_to_n_surface_alpha::<false> as BlitFn));
    }

    if flags == surface_alpha | CopyFlags::COLORKEY {
        if indexed_dst {
            return Some(("blit_n_to_1_surface_alpha_key", blit_n_to_1_surface_alpha::<true> as BlitFn));
        }
        return Some(("blit_n_to_n_surface_alpha_key", blit_n_to_n_surface_alpha::<true> as BlitFn));
    }
    None
}

/// Blends with the destination palette entry, then maps back to an index.
#[inline(always)]
fn blend_into_index(d: &mut u8, color: Color8888, alpha: u8, palette: &[Color8888], table: Option<&[u8]>) {
    let under = palette.get(*d as usize).copied().unwrap_or_default();
    let r = blend_channel(color.r, under.r, alpha);
    let g = blend_channel(color.g, under.g, alpha);
    let b = blend_channel(color.b, under.b, alpha);
    let index = quantize_332(r, g, b);
    *d = table.map_or(index, |table| table[index as usize]);
}

fn blit_n_to_1_pixel_alpha(info: &mut BlitInfo<'_>) {
    let (src_fmt, palette, table) = (info.src_fmt, info.dst_palette, info.table);
    let sbpp = info.src_bpp();
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(sbpp).zip(dst.iter_mut()) {
            let color = unpack_rgba(src_fmt, fetch(s, sbpp));
            if color.a != 0 {
                blend_into_index(d, color, color.a, palette, table);
            }
        }
    });
}

fn blit_n_to_1_surface_alpha<const KEYED: bool>(info: &mut BlitInfo<'_>) {
    let (src_fmt, palette, table) = (info.src_fmt, info.dst_palette, info.table);
    let rgbmask = !src_fmt.a.mask;
    let key = info.colorkey & rgbmask;
    let alpha = info.modulation.a;
    let sbpp = info.src_bpp();
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(sbpp).zip(dst.iter_mut()) {
            let pixel = fetch(s, sbpp);
            if KEYED && pixel & rgbmask == key {
                continue;
            }
            blend_into_index(d, unpack_rgba(src_fmt, pixel), alpha, palette, table);
        }
    });
}

/// Four-byte formats sharing their colour bytes; the remaining byte is alpha
/// in the source and alpha or padding in the destination.
fn blit_rgb_to_rgb_pixel_alpha(info: &mut BlitInfo<'_>) {
    let (src_fmt, dst_fmt) = (info.src_fmt, info.dst_fmt);
    let rgb = src_fmt.r.mask | src_fmt.g.mask | src_fmt.b.mask;
    let dst_alpha = dst_fmt.a.mask;
    let ashift = src_fmt.a.shift;
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
            let sp = fetch(s, 4);
            let alpha = (sp >> ashift) as u8;
            if alpha == 0 {
                continue;
            }
            let dp = fetch(d, 4);
            let mut out = 0;
            for shift in [0, 8, 16, 24] {
                let lane = 0xFFu32 << shift;
                let (sv, dv) = ((sp >> shift) as u8, (dp >> shift) as u8);
                let value = if rgb & lane != 0 {
                    blend_channel(sv, dv, alpha)
                } else if dst_alpha & lane != 0 {
                    blend_channel(255, dv, alpha)
                } else {
                    dv
                };
                out |= (value as u32) << shift;
            }
            store(d, 4, out);
        }
    });
}

fn blit_n_to_n_pixel_alpha(info: &mut BlitInfo<'_>) {
    let (src_fmt, dst_fmt) = (info.src_fmt, info.dst_fmt);
    let (sbpp, dbpp) = (info.src_bpp(), info.dst_bpp());
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(sbpp).zip(dst.chunks_exact_mut(dbpp)) {
            let color = unpack_rgba(src_fmt, fetch(s, sbpp));
            if color.a == 0 {
                continue;
            }
            let under = unpack_rgba(dst_fmt, fetch(d, dbpp));
            store(d, dbpp, pack_rgba(dst_fmt, blend_over(color, under, color.a)));
        }
    });
}

/// Blends two 16-bit pixels spread as `0x0G0R0B` style lanes; `mask` selects
/// the lanes and `alpha` is in 0..=31.
#[inline(always)]
fn blend_16_spread(s: u16, d: u16, alpha: u32, mask: u32) -> u16 {
    let s = ((s as u32) | ((s as u32) << 16)) & mask;
    let d = ((d as u32) | ((d as u32) << 16)) & mask;
    let d = d.wrapping_add(s.wrapping_sub(d).wrapping_mul(alpha) >> 5) & mask;
    (d | (d >> 16)) as u16
}

/// Averages two 16-bit pixels; `mask` clears the low bit of every channel.
#[inline(always)]
const fn blend_16_half(s: u16, d: u16, mask: u16) -> u16 {
    (((s & mask) as u32 + (d & mask) as u32) >> 1) as u16 + (s & d & !mask)
}

fn blit_16_surface_alpha<const SPREAD: u32, const HALF: u16>(info: &mut BlitInfo<'_>) {
    let alpha = info.modulation.a as u32;
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(2).zip(dst.chunks_exact_mut(2)) {
            let sp = u16::from_ne_bytes([s[0], s[1]]);
            let dp = u16::from_ne_bytes([d[0], d[1]]);
            let out = if alpha == 128 {
                blend_16_half(sp, dp, HALF)
            } else {
                blend_16_spread(sp, dp, alpha >> 3, SPREAD)
            };
            d.copy_from_slice(&out.to_ne_bytes());
        }
    });
}

fn blit_565_to_565_surface_alpha(info: &mut BlitInfo<'_>) {
    blit_16_surface_alpha::<0x07E0_F81F, 0xF7DE>(info);
}

fn blit_555_to_555_surface_alpha(info: &mut BlitInfo<'_>) {
    blit_16_surface_alpha::<0x03E0_7C1F, 0xFBDE>(info);
}

fn blit_rgb_to_rgb_surface_alpha(info: &mut BlitInfo<'_>) {
    let rgb = info.src_fmt.r.mask | info.src_fmt.g.mask | info.src_fmt.b.mask;
    let opaque = info.dst_fmt.a.mask;
    let alpha = info.modulation.a as u32;
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
            let (sp, dp) = (fetch(s, 4), fetch(d, 4));
            let blended = if alpha == 128 {
                (((sp & 0xFEFE_FEFE) >> 1) + ((dp & 0xFEFE_FEFE) >> 1)) + (sp & dp & 0x0101_0101)
            } else {
                let (s1, d1) = (sp & 0x00FF_00FF, dp & 0x00FF_00FF);
                let lo = d1.wrapping_add(s1.wrapping_sub(d1).wrapping_mul(alpha) >> 8) & 0x00FF_00FF;
                let (s2, d2) = ((sp >> 8) & 0x00FF_00FF, (dp >> 8) & 0x00FF_00FF);
                let hi = d2.wrapping_add(s2.wrapping_sub(d2).wrapping_mul(alpha) >> 8) & 0x00FF_00FF;
                lo | (hi << 8)
            };
            store(d, 4, (blended & rgb) | opaque);
        }
    });
}

fn blit_n_to_n_surface_alpha<const KEYED: bool>(info: &mut BlitInfo<'_>) {
    let (src_fmt, dst_fmt) = (info.src_fmt, info.dst_fmt);
    let rgbmask = !src_fmt.a.mask;
    let key = info.colorkey & rgbmask;
    let alpha = info.modulation.a;
    let (sbpp, dbpp) = (info.src_bpp(), info.dst_bpp());
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(sbpp).zip(dst.chunks_exact_mut(dbpp)) {
            let pixel = fetch(s, sbpp);
            if KEYED && pixel & rgbmask == key {
                continue;
            }
            let under = unpack_rgba(dst_fmt, fetch(d, dbpp));
            let over = blend_over(unpack_rgba(src_fmt, pixel), under, alpha);
            store(d, dbpp, pack_rgba(dst_fmt, over));
        }
    });
}
