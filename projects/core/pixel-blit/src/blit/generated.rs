//! Dispatch table for pairs of 32-bit RGB formats.
//!
//! Every ordered pair of the six 8888 formats gets seven kernels, one per
//! combination of modulation, blending and scaling. The kernels are
//! monomorphised from [`blit_8888`] by the [`generated_table`] macro. On
//! `x86_64`, SSE2 modulation kernels for same-format pairs are listed first.
//!
//! An entry matches when the formats are equal and, for each flag group
//! (modulation, blend mode, colour key, scaling), the requested flags are a
//! subset of the entry's flags. The entry's CPU features must be available.

use super::pixel::{fetch, store};
use super::slow::{composite, modulate};
use super::{BlitFn, BlitInfo, CopyFlags};
use crate::cpu::CpuFeatures;
use crate::format::PixelFormat;
use pixel_blit_common::color_8888::Color8888;

struct GeneratedEntry {
    src: PixelFormat,
    dst: PixelFormat,
    flags: CopyFlags,
    cpu: CpuFeatures,
    name: &'static str,
    func: BlitFn,
}

const GROUPS: [CopyFlags; 4] = [
    CopyFlags::MODULATE_MASK,
    CopyFlags::BLEND_MASK,
    CopyFlags::COLORKEY,
    CopyFlags::NEAREST,
];

impl GeneratedEntry {
    fn matches(&self, src: PixelFormat, dst: PixelFormat, flags: CopyFlags, features: CpuFeatures) -> bool {
        self.src == src
            && self.dst == dst
            && GROUPS
                .iter()
                .all(|&group| self.flags.contains(flags.intersection(group)))
            && features.contains(self.cpu)
    }
}

/// Looks up a kernel for `src -> dst` with `flags`, using only kernels whose
/// CPU requirements are in `features`.
pub fn select(
    src: PixelFormat,
    dst: PixelFormat,
    flags: CopyFlags,
    features: CpuFeatures,
) -> Option<(&'static str, BlitFn)> {
    let flags = flags.difference(CopyFlags::RLE_MASK);
    accelerated_entries()
        .iter()
        .chain(GENERATED.iter().flatten().flatten())
        .find(|entry| entry.matches(src, dst, flags, features))
        .map(|entry| (entry.name, entry.func))
}

/// Bit offsets of each channel within a 32-bit pixel.
#[derive(Clone, Copy)]
struct Layout {
    r: u32,
    g: u32,
    b: u32,
    a: Option<u32>,
}

impl Layout {
    const fn of(raw: u32) -> Self {
        let (r, g, b, a) = if raw == PixelFormat::XBGR8888.raw() {
            (0, 8, 16, None)
        } else if raw == PixelFormat::ARGB8888.raw() {
            (16, 8, 0, Some(24))
        } else if raw == PixelFormat::RGBA8888.raw() {
            (24, 16, 8, Some(0))
        } else if raw == PixelFormat::ABGR8888.raw() {
            (0, 8, 16, Some(24))
        } else if raw == PixelFormat::BGRA8888.raw() {
            (8, 16, 24, Some(0))
        } else {
            (16, 8, 0, None)
        };
        Self { r, g, b, a }
    }

    #[inline(always)]
    fn unpack(self, pixel: u32) -> Color8888 {
        Color8888::new(
            (pixel >> self.r) as u8,
            (pixel >> self.g) as u8,
            (pixel >> self.b) as u8,
            self.a.map_or(255, |a| (pixel >> a) as u8),
        )
    }

    #[inline(always)]
    fn pack(self, color: Color8888) -> u32 {
        ((color.r as u32) << self.r)
            | ((color.g as u32) << self.g)
            | ((color.b as u32) << self.b)
            | self.a.map_or(0, |a| (color.a as u32) << a)
    }
}

fn blit_8888<const SRC: u32, const DST: u32, const MODULATE: bool, const BLEND: bool, const SCALE: bool>(
    info: &mut BlitInfo<'_>,
) {
    let (src_layout, dst_layout) = (Layout::of(SRC), Layout::of(DST));
    let (flags, modulation) = (info.flags, info.modulation);
    let convert = move |s: u32, d: u32| {
        let mut color = src_layout.unpack(s);
        if MODULATE {
            color = modulate(color, flags, modulation);
        }
        if BLEND {
            color = composite(color, dst_layout.unpack(d), flags);
        }
        dst_layout.pack(color)
    };

    if SCALE {
        info.for_each_scaled_row(|src, dst, columns| {
            for (d, &x) in dst.chunks_exact_mut(4).zip(columns) {
                let s = fetch(&src[x * 4..], 4);
                store(d, 4, convert(s, fetch(d, 4)));
            }
        });
    } else {
        info.for_each_row(|src, dst| {
            for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
                store(d, 4, convert(fetch(s, 4), fetch(d, 4)));
            }
        });
    }
}

macro_rules! generated_table {
    ($(($format:ident, $name:literal)),* $(,)?) => {
        generated_table!(@src [$(($format, $name)),*] [$(($format, $name)),*])
    };
    (@src [$(($src:ident, $src_name:literal)),*] $dsts:tt) => {
        [$(generated_table!(@dst $src, $src_name, $dsts)),*]
    };
    (@dst $src:ident, $src_name:literal, [$(($dst:ident, $dst_name:literal)),*]) => {
        [$(generated_table!(@pair $src, $src_name, $dst, $dst_name)),*]
    };
    (@pair $src:ident, $src_name:literal, $dst:ident, $dst_name:literal) => {
        [
            generated_table!(@entry $src, $src_name, $dst, $dst_name, "_scale",
                CopyFlags::NEAREST, false, false, true),
            generated_table!(@entry $src, $src_name, $dst, $dst_name, "_blend",
                CopyFlags::BLEND_MASK, false, true, false),
            generated_table!(@entry $src, $src_name, $dst, $dst_name, "_blend_scale",
                CopyFlags::BLEND_MASK.union(CopyFlags::NEAREST), false, true, true),
            generated_table!(@entry $src, $src_name, $dst, $dst_name, "_modulate",
                CopyFlags::MODULATE_MASK, true, false, false),
            generated_table!(@entry $src, $src_name, $dst, $dst_name, "_modulate_scale",
                CopyFlags::MODULATE_MASK.union(CopyFlags::NEAREST), true, false, true),
            generated_table!(@entry $src, $src_name, $dst, $dst_name, "_modulate_blend",
                CopyFlags::MODULATE_MASK.union(CopyFlags::BLEND_MASK), true, true, false),
            generated_table!(@entry $src, $src_name, $dst, $dst_name, "_modulate_blend_scale",
                CopyFlags::MODULATE_MASK.union(CopyFlags::BLEND_MASK).union(CopyFlags::NEAREST), true, true, true),
        ]
    };
    (@entry $src:ident, $src_name:literal, $dst:ident, $dst_name:literal, $suffix:literal,
        $flags:expr, $modulate:literal, $blend:literal, $scale:literal) => {
        GeneratedEntry {
            src: PixelFormat::$src,
            dst: PixelFormat::$dst,
            flags: $flags,
            cpu: CpuFeatures::ANY,
            name: concat!("blit_", $src_name, "_to_", $dst_name, $suffix),
            func: blit_8888::<
                { PixelFormat::$src.raw() },
                { PixelFormat::$dst.raw() },
                $modulate,
                $blend,
                $scale,
            >,
        }
    };
}

static GENERATED: [[[GeneratedEntry; 7]; 6]; 6] = generated_table![
    (XRGB8888, "xrgb8888"),
    (XBGR8888, "xbgr8888"),
    (ARGB8888, "argb8888"),
    (RGBA8888, "rgba8888"),
    (ABGR8888, "abgr8888"),
    (BGRA8888, "bgra8888"),
];

#[cfg(target_arch = "x86_64")]
fn accelerated_entries() -> &'static [GeneratedEntry] {
    &sse2::ENTRIES
}

#[cfg(not(target_arch = "x86_64"))]
fn accelerated_entries() -> &'static [GeneratedEntry] {
    &[]
}

#[cfg(target_arch = "x86_64")]
mod sse2 {
    use super::{BlitInfo, CopyFlags, CpuFeatures, GeneratedEntry, Layout, PixelFormat};
    use core::arch::x86_64::*;

    macro_rules! sse2_entry {
        ($format:ident, $name:literal) => {
            GeneratedEntry {
                src: PixelFormat::$format,
                dst: PixelFormat::$format,
                flags: CopyFlags::MODULATE_MASK,
                cpu: CpuFeatures::SSE2,
                name: concat!("blit_", $name, "_to_", $name, "_modulate_sse2"),
                func: modulate_same_format::<{ PixelFormat::$format.raw() }>,
            }
        };
    }

    pub(super) static ENTRIES: [GeneratedEntry; 4] = [
        sse2_entry!(ARGB8888, "argb8888"),
        sse2_entry!(RGBA8888, "rgba8888"),
        sse2_entry!(ABGR8888, "abgr8888"),
        sse2_entry!(BGRA8888, "bgra8888"),
    ];

    fn modulate_same_format<const FORMAT: u32>(info: &mut BlitInfo<'_>) {
        let layout = Layout::of(FORMAT);
        let flags = info.flags;
        let m = info.modulation;
        let (r, g, b) = if flags.contains(CopyFlags::MODULATE_COLOR) {
            (m.r, m.g, m.b)
        } else {
            (255, 255, 255)
        };
        let a = if flags.contains(CopyFlags::MODULATE_ALPHA) { m.a } else { 255 };
        let multiplier = layout.pack(pixel_blit_common::color_8888::Color8888::new(r, g, b, a));

        info.for_each_row(|src, dst| {
            let len = src.len().min(dst.len());
            // SAFETY: SSE2 is part of the x86_64 baseline and both slices hold `len` bytes.
            unsafe { modulate_row(src.as_ptr(), dst.as_mut_ptr(), len, multiplier) }
        });
    }

    /// Multiplies every byte of 32-bit pixels by the matching byte of
    /// `multiplier`, dividing by 255 with the same rounding as the portable
    /// kernels.
    ///
    /// # Safety
    ///
    /// - `src` must be valid for reads of `len` bytes
    /// - `dst` must be valid for writes of `len` bytes
    #[target_feature(enable = "sse2")]
    unsafe fn modulate_row(src: *const u8, dst: *mut u8, len: usize, multiplier: u32) {
        let zero = _mm_setzero_si128();
        let one = _mm_set1_epi16(1);
        let factors = _mm_unpacklo_epi8(_mm_set1_epi32(multiplier as i32), zero);

        let aligned_len = len - (len % 16);
        let mut offset = 0;
        while offset < aligned_len {
            let pixels = _mm_loadu_si128(src.add(offset) as *const __m128i);
            let lo = scale_lanes(_mm_unpacklo_epi8(pixels, zero), factors, one);
            let hi = scale_lanes(_mm_unpackhi_epi8(pixels, zero), factors, one);
            _mm_storeu_si128(dst.add(offset) as *mut __m128i, _mm_packus_epi16(lo, hi));
            offset += 16;
        }

        let factor_bytes = multiplier.to_ne_bytes();
        while offset + 4 <= len {
            for lane in 0..4 {
                let t = *src.add(offset + lane) as u32 * factor_bytes[lane] as u32 + 1;
                *dst.add(offset + lane) = ((t + (t >> 8)) >> 8) as u8;
            }
            offset += 4;
        }
    }

    #[inline(always)]
    unsafe fn scale_lanes(values: __m128i, factors: __m128i, one: __m128i) -> __m128i {
        let t = _mm_add_epi16(_mm_mullo_epi16(values, factors), one);
        _mm_srli_epi16(_mm_add_epi16(t, _mm_srli_epi16(t, 8)), 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    const FORMATS: [PixelFormat; 6] = [
        PixelFormat::XRGB8888,
        PixelFormat::XBGR8888,
        PixelFormat::ARGB8888,
        PixelFormat::RGBA8888,
        PixelFormat::ABGR8888,
        PixelFormat::BGRA8888,
    ];

    #[test]
    fn table_covers_every_pair_once_per_variant() {
        let entries: Vec<_> = GENERATED.iter().flatten().flatten().collect();
        assert_eq!(entries.len(), 6 * 6 * 7);
        for src in FORMATS {
            for dst in FORMATS {
                let count = entries.iter().filter(|e| e.src == src && e.dst == dst).count();
                assert_eq!(count, 7, "{src} -> {dst}");
            }
        }
    }

    #[rstest]
    #[case(CopyFlags::NEAREST, "blit_xrgb8888_to_bgra8888_scale")]
    #[case(CopyFlags::BLEND, "blit_xrgb8888_to_bgra8888_blend")]
    #[case(CopyFlags::MUL | CopyFlags::NEAREST, "blit_xrgb8888_to_bgra8888_blend_scale")]
    #[case(CopyFlags::MODULATE_ALPHA, "blit_xrgb8888_to_bgra8888_modulate")]
    #[case(CopyFlags::MODULATE_COLOR | CopyFlags::NEAREST, "blit_xrgb8888_to_bgra8888_modulate_scale")]
    #[case(CopyFlags::MODULATE_COLOR | CopyFlags::ADD, "blit_xrgb8888_to_bgra8888_modulate_blend")]
    #[case(CopyFlags::MODULATE_ALPHA | CopyFlags::MOD | CopyFlags::NEAREST, "blit_xrgb8888_to_bgra8888_modulate_blend_scale")]
    #[case(CopyFlags::MODULATE_COLOR | CopyFlags::RLE_DESIRED, "blit_xrgb8888_to_bgra8888_modulate")]
    fn picks_narrowest_variant(#[case] flags: CopyFlags, #[case] name: &str) {
        let selected = select(PixelFormat::XRGB8888, PixelFormat::BGRA8888, flags, CpuFeatures::empty());
        assert_eq!(selected.map(|(name, _)| name), Some(name));
    }

    #[rstest]
    #[case(PixelFormat::RGB565, PixelFormat::ARGB8888, CopyFlags::BLEND)]
    #[case(PixelFormat::ARGB8888, PixelFormat::RGBX8888, CopyFlags::BLEND)]
    #[case(PixelFormat::ARGB8888, PixelFormat::ABGR8888, CopyFlags::COLORKEY)]
    #[case(PixelFormat::ARGB8888, PixelFormat::ABGR8888, CopyFlags::COLORKEY | CopyFlags::BLEND)]
    fn no_entry_outside_the_table(#[case] src: PixelFormat, #[case] dst: PixelFormat, #[case] flags: CopyFlags) {
        assert!(select(src, dst, flags, CpuFeatures::all()).is_none());
    }

    #[test]
    fn accelerated_entries_need_their_features() {
        let flags = CopyFlags::MODULATE_COLOR;
        let (portable, _) = select(PixelFormat::ARGB8888, PixelFormat::ARGB8888, flags, CpuFeatures::empty()).unwrap();
        assert_eq!(portable, "blit_argb8888_to_argb8888_modulate");

        let (accelerated, _) = select(PixelFormat::ARGB8888, PixelFormat::ARGB8888, flags, CpuFeatures::SSE2).unwrap();
        if cfg!(target_arch = "x86_64") {
            assert_eq!(accelerated, "blit_argb8888_to_argb8888_modulate_sse2");
        } else {
            assert_eq!(accelerated, portable);
        }
    }

    #[rstest]
    #[case(PixelFormat::ARGB8888, CopyFlags::MODULATE_COLOR)]
    #[case(PixelFormat::RGBA8888, CopyFlags::MODULATE_ALPHA)]
    #[case(PixelFormat::ABGR8888, CopyFlags::MODULATE_MASK)]
    #[case(PixelFormat::BGRA8888, CopyFlags::MODULATE_MASK)]
    fn accelerated_and_portable_modulation_agree(#[case] format: PixelFormat, #[case] flags: CopyFlags) {
        let run = |features: CpuFeatures| {
            let mut fixture = KernelFixture::new(format, format, 7, 3);
            for (i, byte) in fixture.src.iter_mut().enumerate() {
                *byte = (i * 37 + 11) as u8;
            }
            fixture.flags = flags;
            fixture.modulation = Color8888::new(200, 17, 255, 99);
            let (_, func) = select(format, format, flags, features).unwrap();
            fixture.run(func);
            fixture.dst
        };
        assert_eq!(run(CpuFeatures::SSE2), run(CpuFeatures::empty()));
    }

    #[test]
    fn blends_translucent_source_over_destination() {
        let mut fixture = KernelFixture::new(PixelFormat::ARGB8888, PixelFormat::XBGR8888, 1, 1);
        fixture.flags = CopyFlags::BLEND;
        fixture.set_src(0, 0, 0x80FF_0000);
        fixture.set_dst(0, 0, 0x00FF_0000);

        let (name, func) = select(PixelFormat::ARGB8888, PixelFormat::XBGR8888, fixture.flags, CpuFeatures::empty()).unwrap();
        assert_eq!(name, "blit_argb8888_to_xbgr8888_blend");
        fixture.run(func);
        assert_eq!(fixture.dst_pixel(0, 0), 0x007F_0080);
    }

    #[test]
    fn opaque_x_source_modulates_alpha_from_255() {
        let mut fixture = KernelFixture::new(PixelFormat::XRGB8888, PixelFormat::RGBA8888, 1, 1);
        fixture.flags = CopyFlags::MODULATE_ALPHA;
        fixture.modulation.a = 51;
        fixture.set_src(0, 0, 0x0011_2233);

        let (_, func) = select(PixelFormat::XRGB8888, PixelFormat::RGBA8888, fixture.flags, CpuFeatures::empty()).unwrap();
        fixture.run(func);
        assert_eq!(fixture.dst_pixel(0, 0), 0x1122_3333);
    }
}
