//! Conversions between packed formats without blending.
//!
//! Plain copies walk a rule table keyed on the source byte count. A rule
//! matches when every non-zero mask it lists equals the format's mask, the
//! destination size matches, the rule can produce the alpha the destination
//! needs, and the CPU has the features it requires. The last resort is
//! [`blit_n_to_n`], refined for a few 4-byte cases.

use super::pixel::{fetch, pack_rgba, quantize_332, store, unpack_rgba};
use super::{BlitFn, BlitInfo, BlitRequest, CopyFlags};
use crate::cpu::CpuFeatures;
use crate::descriptor::PixelFormatDescriptor;
use pixel_blit_common::color_565::{expand_565_row_to_8888, Shifts8888};

const NO_ALPHA: u8 = 1;
const SET_ALPHA: u8 = 2;
const COPY_ALPHA: u8 = 4;

#[derive(Clone, Copy)]
enum Kernel {
    Rgb565To8888,
    SameRgb,
    InverseRgb,
    Rgb888To565,
    Rgb888To555,
}

struct Rule {
    src: [u32; 3],
    dst_bytes: u8,
    dst: [u32; 3],
    cpu: CpuFeatures,
    alpha: u8,
    kernel: Kernel,
}

const ARGB: [u32; 3] = [0x00FF_0000, 0x0000_FF00, 0x0000_00FF];
const ABGR: [u32; 3] = [0x0000_00FF, 0x0000_FF00, 0x00FF_0000];
const RGBA: [u32; 3] = [0xFF00_0000, 0x00FF_0000, 0x0000_FF00];
const BGRA: [u32; 3] = [0x0000_FF00, 0x00FF_0000, 0xFF00_0000];
const RGB565: [u32; 3] = [0xF800, 0x07E0, 0x001F];
const RGB555: [u32; 3] = [0x7C00, 0x03E0, 0x001F];

const fn rule(src: [u32; 3], dst_bytes: u8, dst: [u32; 3], alpha: u8, kernel: Kernel) -> Rule {
    Rule {
        src,
        dst_bytes,
        dst,
        cpu: CpuFeatures::ANY,
        alpha,
        kernel,
    }
}

const ANY_ALPHA: u8 = NO_ALPHA | SET_ALPHA | COPY_ALPHA;

static RULES_2: &[Rule] = &[
    rule(RGB565, 4, ARGB, ANY_ALPHA, Kernel::Rgb565To8888),
    rule(RGB565, 4, ABGR, ANY_ALPHA, Kernel::Rgb565To8888),
    rule(RGB565, 4, RGBA, ANY_ALPHA, Kernel::Rgb565To8888),
    rule(RGB565, 4, BGRA, ANY_ALPHA, Kernel::Rgb565To8888),
];

static RULES_3: &[Rule] = &[
    rule(ARGB, 4, ARGB, NO_ALPHA | SET_ALPHA, Kernel::SameRgb),
    rule(ABGR, 4, ABGR, NO_ALPHA | SET_ALPHA, Kernel::SameRgb),
    rule(ARGB, 4, ABGR, NO_ALPHA | SET_ALPHA, Kernel::InverseRgb),
    rule(ABGR, 4, ARGB, NO_ALPHA | SET_ALPHA, Kernel::InverseRgb),
    rule(ARGB, 3, ABGR, NO_ALPHA, Kernel::InverseRgb),
    rule(ABGR, 3, ARGB, NO_ALPHA, Kernel::InverseRgb),
];

static RULES_4: &[Rule] = &[
    rule(ARGB, 2, RGB565, NO_ALPHA, Kernel::Rgb888To565),
    rule(ARGB, 2, RGB555, NO_ALPHA, Kernel::Rgb888To555),
    rule(ARGB, 3, ARGB, NO_ALPHA | SET_ALPHA, Kernel::SameRgb),
    rule(ABGR, 3, ABGR, NO_ALPHA | SET_ALPHA, Kernel::SameRgb),
    rule(ARGB, 3, ABGR, NO_ALPHA | SET_ALPHA, Kernel::InverseRgb),
    rule(ABGR, 3, ARGB, NO_ALPHA | SET_ALPHA, Kernel::InverseRgb),
    rule(ARGB, 4, ABGR, ANY_ALPHA, Kernel::InverseRgb),
    rule(ABGR, 4, ARGB, ANY_ALPHA, Kernel::InverseRgb),
];

/// A zero mask in a rule accepts anything.
const fn mask_ok(format: u32, rule: u32) -> bool {
    format == rule || rule == 0
}

fn masks_ok(format: &PixelFormatDescriptor, rule: [u32; 3]) -> bool {
    mask_ok(format.r.mask, rule[0]) && mask_ok(format.g.mask, rule[1]) && mask_ok(format.b.mask, rule[2])
}

fn same_rgb(a: &PixelFormatDescriptor, b: &PixelFormatDescriptor) -> bool {
    a.r.mask == b.r.mask && a.g.mask == b.g.mask && a.b.mask == b.b.mask
}

pub(super) fn select(request: &BlitRequest<'_>, features: CpuFeatures) -> Option<(&'static str, BlitFn)> {
    let (src, dst) = (request.src, request.dst);
    let flags = request.flags.difference(CopyFlags::RLE_MASK);

    if flags.is_empty() {
        return Some(select_copy(src, dst, features));
    }
    if flags != CopyFlags::COLORKEY {
        return None;
    }

    if src.bytes_per_pixel == 2 && request.identity {
        Some(("blit_2_to_2_key", blit_2_to_2_key as BlitFn))
    } else if dst.bytes_per_pixel == 1 {
        Some(("blit_n_to_1_key", blit_n_to_1::<true> as BlitFn))
    } else if src.a.is_present() && dst.a.is_present() {
        Some(("blit_n_to_n_key_copy_alpha", blit_n_to_n_copy_alpha::<true> as BlitFn))
    } else {
        Some(("blit_n_to_n_key", blit_n_to_n::<true> as BlitFn))
    }
}

fn select_copy(
    src: &PixelFormatDescriptor,
    dst: &PixelFormatDescriptor,
    features: CpuFeatures,
) -> (&'static str, BlitFn) {
    if dst.bytes_per_pixel == 1 {
        if src.bytes_per_pixel == 4 && masks_ok(src, ARGB) {
            return ("blit_rgb888_index8", blit_rgb888_index8 as BlitFn);
        }
        return ("blit_n_to_1", blit_n_to_1::<false> as BlitFn);
    }

    let need = match (src.a.is_present(), dst.a.is_present()) {
        (_, false) => NO_ALPHA,
        (true, true) => COPY_ALPHA,
        (false, true) => SET_ALPHA,
    };

    let rules = match src.bytes_per_pixel {
        2 => RULES_2,
        3 => RULES_3,
        4 => RULES_4,
        _ => &[],
    };
    let matched = rules.iter().find(|rule| {
        masks_ok(src, rule.src)
            && masks_ok(dst, rule.dst)
            && dst.bytes_per_pixel == rule.dst_bytes
            && rule.alpha & need == need
            && features.contains(rule.cpu)
    });

    if let Some(rule) = matched {
        return match (rule.kernel, need) {
            (Kernel::Rgb565To8888, _) => ("blit_rgb565_to_8888", blit_rgb565_to_8888 as BlitFn),
            (Kernel::Rgb888To565, _) => ("blit_rgb888_to_rgb565", blit_rgb888_to_rgb565 as BlitFn),
            (Kernel::Rgb888To555, _) => ("blit_rgb888_to_rgb555", blit_rgb888_to_rgb555 as BlitFn),
            (Kernel::SameRgb, COPY_ALPHA) => ("blit_3or4_same_rgb_copy_alpha", blit_3or4::<false, COPY_ALPHA> as BlitFn),
            (Kernel::SameRgb, SET_ALPHA) => ("blit_3or4_same_rgb_set_alpha", blit_3or4::<false, SET_ALPHA> as BlitFn),
            (Kernel::SameRgb, _) => ("blit_3or4_same_rgb", blit_3or4::<false, NO_ALPHA> as BlitFn),
            (Kernel::InverseRgb, COPY_ALPHA) => ("blit_3or4_inverse_rgb_copy_alpha", blit_3or4::<true, COPY_ALPHA> as BlitFn),
            (Kernel::InverseRgb, SET_ALPHA) => ("blit_3or4_inverse_rgb_set_alpha", blit_3or4::<true, SET_ALPHA> as BlitFn),
            (Kernel::InverseRgb, _) => ("blit_3or4_inverse_rgb", blit_3or4::<true, NO_ALPHA> as BlitFn),
        };
    }

    if src.bytes_per_pixel == 4 && dst.bytes_per_pixel == 4 && same_rgb(src, dst) {
        if need == COPY_ALPHA {
            if src.a.mask == dst.a.mask {
                return ("blit_4_to_4_copy_alpha", blit_4_to_4_copy_alpha as BlitFn);
            }
            return ("blit_n_to_n_copy_alpha", blit_n_to_n_copy_alpha::<false> as BlitFn);
        }
        return ("blit_4_to_4_mask_alpha", blit_4_to_4_mask_alpha as BlitFn);
    }
    if need == COPY_ALPHA {
        return ("blit_n_to_n_copy_alpha", blit_n_to_n_copy_alpha::<false> as BlitFn);
    }
    ("blit_n_to_n", blit_n_to_n::<false> as BlitFn)
}

fn blit_rgb565_to_8888(info: &mut BlitInfo<'_>) {
    let dst = info.dst_fmt;
    let shifts = Shifts8888 {
        r: dst.r.shift as u32,
        g: dst.g.shift as u32,
        b: dst.b.shift as u32,
        a: dst.a.is_present().then_some(dst.a.shift as u32),
    };
    info.for_each_row(|src, dst| expand_565_row_to_8888(src, dst, shifts, 0xFF));
}

fn blit_rgb888_to_rgb565(info: &mut BlitInfo<'_>) {
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(2)) {
            let p = fetch(s, 4);
            let out = ((p & 0x00F8_0000) >> 8) | ((p & 0x0000_FC00) >> 5) | ((p & 0x0000_00F8) >> 3);
            store(d, 2, out);
        }
    });
}

fn blit_rgb888_to_rgb555(info: &mut BlitInfo<'_>) {
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(2)) {
            let p = fetch(s, 4);
            let out = ((p & 0x00F8_0000) >> 9) | ((p & 0x0000_F800) >> 6) | ((p & 0x0000_00F8) >> 3);
            store(d, 2, out);
        }
    });
}

/// Copies (or swaps R and B of) the low three bytes between 3- and 4-byte
/// pixels. A 4-byte destination gets `ALPHA` in its top byte.
fn blit_3or4<const INVERSE: bool, const ALPHA: u8>(info: &mut BlitInfo<'_>) {
    let (sbpp, dbpp) = (info.src_bpp(), info.dst_bpp());
    let set_alpha = (info.modulation.a as u32) << 24;
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(sbpp).zip(dst.chunks_exact_mut(dbpp)) {
            let p = fetch(s, sbpp);
            let mut out = p & 0x00FF_FFFF;
            if INVERSE {
                out = ((out & 0xFF) << 16) | (out & 0xFF00) | (out >> 16);
            }
            if dbpp == 4 {
                out |= match ALPHA {
                    COPY_ALPHA => p & 0xFF00_0000,
                    SET_ALPHA => set_alpha,
                    _ => 0,
                };
            }
            store(d, dbpp, out);
        }
    });
}

fn blit_rgb888_index8(info: &mut BlitInfo<'_>) {
    let table = info.table;
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(4).zip(dst.iter_mut()) {
            let p = fetch(s, 4);
            let index = (((p & 0x00E0_0000) >> 16) | ((p & 0x0000_E000) >> 11) | ((p & 0x0000_00C0) >> 6)) as u8;
            *d = table.map_or(index, |table| table[index as usize]);
        }
    });
}

/// Quantises to the 3-3-2 ramp and maps through the table, if any.
fn blit_n_to_1<const KEYED: bool>(info: &mut BlitInfo<'_>) {
    let (src_fmt, table) = (info.src_fmt, info.table);
    let rgbmask = !src_fmt.a.mask;
    let key = info.colorkey & rgbmask;
    let sbpp = info.src_bpp();
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(sbpp).zip(dst.iter_mut()) {
            let pixel = fetch(s, sbpp);
            if KEYED && pixel & rgbmask == key {
                continue;
            }
            let color = unpack_rgba(src_fmt, pixel);
            let index = quantize_332(color.r, color.g, color.b);
            *d = table.map_or(index, |table| table[index as usize]);
        }
    });
}

fn blit_2_to_2_key(info: &mut BlitInfo<'_>) {
    let rgbmask = !info.src_fmt.a.mask;
    let key = info.colorkey & rgbmask;
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(2).zip(dst.chunks_exact_mut(2)) {
            if fetch(s, 2) & rgbmask != key {
                d.copy_from_slice(s);
            }
        }
    });
}

fn blit_4_to_4_copy_alpha(info: &mut BlitInfo<'_>) {
    info.for_each_row(|src, dst| dst.copy_from_slice(src));
}

/// Keeps the colour bits and sets (or clears) the destination alpha byte.
fn blit_4_to_4_mask_alpha(info: &mut BlitInfo<'_>) {
    let src_fmt = info.src_fmt;
    let rgb = src_fmt.r.mask | src_fmt.g.mask | src_fmt.b.mask;
    let alpha = info.dst_fmt.a.pack(info.modulation.a);
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
            store(d, 4, (fetch(s, 4) & rgb) | alpha);
        }
    });
}

/// Converts through 8-bit channels. Destinations with alpha receive the
/// surface alpha.
fn blit_n_to_n<const KEYED: bool>(info: &mut BlitInfo<'_>) {
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
            let mut color = unpack_rgba(src_fmt, pixel);
            color.a = alpha;
            store(d, dbpp, pack_rgba(dst_fmt, color));
        }
    });
}

fn blit_n_to_n_copy_alpha<const KEYED: bool>(info: &mut BlitInfo<'_>) {
    let (src_fmt, dst_fmt) = (info.src_fmt, info.dst_fmt);
    let rgbmask = !src_fmt.a.mask;
    let key = info.colorkey & rgbmask;
    let (sbpp, dbpp) = (info.src_bpp(), info.dst_bpp());
    info.for_each_row(|src, dst| {
        for (s, d) in src.chunks_exact(sbpp).zip(dst.chunks_exact_mut(dbpp)) {
            let pixel = fetch(s, sbpp);
            if KEYED && pixel & rgbmask == key {
                continue;
            }
            store(d, dbpp, pack_rgba(dst_fmt, unpack_rgba(src_fmt, pixel)));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blit::BlitTier;
    use crate::format::PixelFormat;
    use crate::test_prelude::*;

    fn run(
        src: PixelFormat,
        dst: PixelFormat,
        pixel: u32,
        flags: CopyFlags,
    ) -> (&'static str, u32) {
        let mut fixture = KernelFixture::new(src, dst, 1, 1);
        fixture.flags = flags;
        fixture.modulation.a = 0x80;
        fixture.set_src(0, 0, pixel);
        let selection = fixture.select_and_run(src == dst, CpuFeatures::empty());
        assert_eq!(selection.tier, BlitTier::Normal);
        (selection.name, fixture.dst_pixel(0, 0))
    }

    #[rstest]
    #[case(PixelFormat::RGB565, PixelFormat::ARGB8888, 0xF81F, "blit_rgb565_to_8888", 0xFFFF_00FF)]
    #[case(PixelFormat::RGB565, PixelFormat::XBGR8888, 0x07E0, "blit_rgb565_to_8888", 0x0000_FF00)]
    #[case(PixelFormat::RGB565, PixelFormat::BGRA8888, 0xF800, "blit_rgb565_to_8888", 0x0000_FFFF)]
    #[case(PixelFormat::XRGB8888, PixelFormat::RGB565, 0x00FF_8040, "blit_rgb888_to_rgb565", 0xFC08)]
    #[case(PixelFormat::XRGB8888, PixelFormat::XRGB1555, 0x00FF_8040, "blit_rgb888_to_rgb555", 0x7E08)]
    #[case(PixelFormat::ARGB8888, PixelFormat::ABGR8888, 0x1122_3344, "blit_3or4_inverse_rgb_copy_alpha", 0x1144_3322)]
    #[case(PixelFormat::XRGB8888, PixelFormat::ABGR8888, 0x1122_3344, "blit_3or4_inverse_rgb_set_alpha", 0x8044_3322)]
    #[case(PixelFormat::XRGB8888, PixelFormat::XBGR8888, 0x1122_3344, "blit_3or4_inverse_rgb", 0x0044_3322)]
    #[case(PixelFormat::ARGB8888, PixelFormat::XRGB8888, 0x1122_3344, "blit_4_to_4_mask_alpha", 0x0022_3344)]
    #[case(PixelFormat::XRGB8888, PixelFormat::ARGB8888, 0x0022_3344, "blit_4_to_4_mask_alpha", 0x8022_3344)]
    #[case(PixelFormat::ARGB8888, PixelFormat::RGBA8888, 0x1122_3344, "blit_n_to_n_copy_alpha", 0x2233_4411)]
    #[case(PixelFormat::RGBA8888, PixelFormat::RGB565, 0xFF00_00FF, "blit_n_to_n", 0xF800)]
    #[case(PixelFormat::RGB565, PixelFormat::ARGB4444, 0xFFFF, "blit_n_to_n", 0x8FFF)]
    #[case(PixelFormat::XRGB8888, PixelFormat::RGB332, 0x00FF_FF00, "blit_rgb888_index8", 0xFC)]
    #[case(PixelFormat::RGB565, PixelFormat::RGB332, 0x001F, "blit_n_to_1", 0x03)]
    fn plain_conversions(
        #[case] src: PixelFormat,
        #[case] dst: PixelFormat,
        #[case] pixel: u32,
        #[case] name: &str,
        #[case] expected: u32,
    ) {
        assert_eq!(run(src, dst, pixel, CopyFlags::empty()), (name, expected));
    }

    #[test]
    fn twenty_four_bit_swizzles() {
        let mut fixture = KernelFixture::new(PixelFormat::RGB24, PixelFormat::BGR24, 1, 1);
        fixture.src = vec![1, 2, 3];
        let selection = fixture.select_and_run(false, CpuFeatures::empty());
        assert_eq!(selection.name, "blit_3or4_inverse_rgb");
        assert_eq!(fixture.dst, vec![3, 2, 1]);

        let mut fixture = KernelFixture::new(PixelFormat::RGB24, PixelFormat::XBGR8888, 1, 1);
        fixture.src = vec![1, 2, 3];
        let selection = fixture.select_and_run(false, CpuFeatures::empty());
        assert_eq!(selection.name, "blit_3or4_same_rgb");
        assert_eq!(fixture.dst_pixel(0, 0), 0x0003_0201);
    }

    #[rstest]
    #[case(PixelFormat::RGB565, PixelFormat::RGB565, "blit_2_to_2_key")]
    #[case(PixelFormat::XRGB8888, PixelFormat::RGB332, "blit_n_to_1_key")]
    #[case(PixelFormat::ARGB8888, PixelFormat::ABGR8888, "blit_n_to_n_key_copy_alpha")]
    #[case(PixelFormat::XRGB8888, PixelFormat::RGB565, "blit_n_to_n_key")]
    fn colour_key_skips_key(#[case] src: PixelFormat, #[case] dst: PixelFormat, #[case] name: &str) {
        let mut fixture = KernelFixture::new(src, dst, 2, 1);
        fixture.flags = CopyFlags::COLORKEY;
        fixture.colorkey = 0x0000_001F & !fixture.src_fmt.a.mask;
        fixture.set_src(0, 0, 0x0000_001F);
        fixture.set_src(1, 0, 0x0000_0000);
        fixture.set_dst(0, 0, 0x5A);
        fixture.set_dst(1, 0, 0x5A);

        let selection = fixture.select_and_run(src == dst, CpuFeatures::empty());
        assert_eq!(selection.name, name);
        assert_eq!(fixture.dst_pixel(0, 0), 0x5A);
        assert_ne!(fixture.dst_pixel(1, 0), 0x5A);
    }

    #[test]
    fn key_ignores_source_alpha() {
        let (name, pixel) = {
            let mut fixture = KernelFixture::new(PixelFormat::ARGB8888, PixelFormat::XRGB8888, 1, 1);
            fixture.flags = CopyFlags::COLORKEY;
            fixture.colorkey = 0xFF12_3456;
            fixture.set_src(0, 0, 0x0012_3456);
            fixture.set_dst(0, 0, 7);
            let selection = fixture.select_and_run(false, CpuFeatures::empty());
            (selection.name, fixture.dst_pixel(0, 0))
        };
        assert_eq!((name, pixel), ("blit_n_to_n_key", 7));
    }

    #[test]
    fn other_flags_leave_the_family() {
        let src = PixelFormatDescriptor::new(PixelFormat::XRGB8888).unwrap();
        let request = BlitRequest {
            src: &src,
            dst: &src,
            flags: CopyFlags::MODULATE_COLOR,
            identity: true,
        };
        assert!(select(&request, CpuFeatures::empty()).is_none());
    }
}
