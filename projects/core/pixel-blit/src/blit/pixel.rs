//! Single-pixel access and channel arithmetic shared by the kernels.

use crate::descriptor::PixelFormatDescriptor;
use pixel_blit_common::color_8888::Color8888;

/// Reads one pixel of `bpp` bytes in native byte order.
///
/// Three-byte pixels are assembled so that the first byte in memory is the
/// lowest byte on little-endian targets and the highest on big-endian ones.
#[inline(always)]
pub(crate) fn fetch(bytes: &[u8], bpp: usize) -> u32 {
    match bpp {
        1 => bytes[0] as u32,
        2 => u16::from_ne_bytes([bytes[0], bytes[1]]) as u32,
        3 => {
            let (b0, b1, b2) = (bytes[0] as u32, bytes[1] as u32, bytes[2] as u32);
            if cfg!(target_endian = "little") {
                b0 | (b1 << 8) | (b2 << 16)
            } else {
                (b0 << 16) | (b1 << 8) | b2
            }
        }
        4 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        _ => 0,
    }
}

/// Writes one pixel of `bpp` bytes; the inverse of [`fetch`].
#[inline(always)]
pub(crate) fn store(bytes: &mut [u8], bpp: usize, value: u32) {
    match bpp {
        1 => bytes[0] = value as u8,
        2 => bytes[..2].copy_from_slice(&(value as u16).to_ne_bytes()),
        3 => {
            if cfg!(target_endian = "little") {
                bytes[..3].copy_from_slice(&value.to_le_bytes()[..3]);
            } else {
                bytes[..3].copy_from_slice(&value.to_be_bytes()[1..4]);
            }
        }
        4 => bytes[..4].copy_from_slice(&value.to_ne_bytes()),
        _ => {}
    }
}

/// Unpacks a non-indexed pixel. Missing alpha reads as 255.
#[inline(always)]
pub(crate) fn unpack_rgba(format: &PixelFormatDescriptor, pixel: u32) -> Color8888 {
    Color8888::new(
        format.r.expand(pixel, 0),
        format.g.expand(pixel, 0),
        format.b.expand(pixel, 0),
        format.a.expand(pixel, 255),
    )
}

/// Packs a colour into a non-indexed pixel. Alpha is dropped if the format has none.
#[inline(always)]
pub(crate) fn pack_rgba(format: &PixelFormatDescriptor, color: Color8888) -> u32 {
    format.r.pack(color.r) | format.g.pack(color.g) | format.b.pack(color.b) | format.a.pack(color.a)
}

/// `a * b / 255`, rounded down, for `a, b <= 255`.
#[inline(always)]
pub(crate) const fn mul_div_255(a: u32, b: u32) -> u32 {
    let t = a * b + 1;
    (t + (t >> 8)) >> 8
}

/// `(s * a + d * (255 - a)) / 255` with the usual shift approximation.
#[inline(always)]
pub(crate) const fn blend_channel(s: u8, d: u8, a: u8) -> u8 {
    let a = a as u32;
    let mut x = s as u32 * a + d as u32 * (255 - a) + 1;
    x += x >> 8;
    (x >> 8) as u8
}

/// Blends `src` over `dst` with coverage `alpha`; the result alpha is
/// `alpha + dst.a * (255 - alpha) / 255`.
#[inline(always)]
pub(crate) fn blend_over(src: Color8888, dst: Color8888, alpha: u8) -> Color8888 {
    Color8888::new(
        blend_channel(src.r, dst.r, alpha),
        blend_channel(src.g, dst.g, alpha),
        blend_channel(src.b, dst.b, alpha),
        blend_channel(255, dst.a, alpha),
    )
}

/// Index of a colour in the 3-3-2 dither ramp.
#[inline(always)]
pub(crate) const fn quantize_332(r: u8, g: u8, b: u8) -> u8 {
    ((r >> 5) << 5) | ((g >> 5) << 2) | (b >> 6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;
    use crate::test_prelude::*;

    #[rstest]
    #[case(1, 0x0000_00AB)]
    #[case(2, 0x0000_ABCD)]
    #[case(3, 0x00AB_CDEF)]
    #[case(4, 0x89AB_CDEF)]
    fn store_then_fetch(#[case] bpp: usize, #[case] value: u32) {
        let mut bytes = [0u8; 4];
        store(&mut bytes, bpp, value);
        assert_eq!(fetch(&bytes, bpp), value);
        assert!(bytes[bpp..].iter().all(|&b| b == 0));
    }

    #[test]
    fn three_byte_pixels_follow_rgb24_masks() {
        let format = PixelFormatDescriptor::new(PixelFormat::RGB24).unwrap();
        let color = unpack_rgba(&format, fetch(&[10, 20, 30], 3));
        assert_eq!(color, Color8888::new(10, 20, 30, 255));
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(255, 255, 255)]
    #[case(128, 255, 128)]
    #[case(255, 1, 1)]
    #[case(254, 254, 253)]
    fn mul_div_255_rounds_down(#[case] a: u32, #[case] b: u32, #[case] expected: u32) {
        assert_eq!(mul_div_255(a, b), expected);
    }

    #[test]
    fn mul_div_255_is_exact_floor() {
        for a in 0..=255 {
            for b in 0..=255 {
                assert_eq!(mul_div_255(a, b), a * b / 255, "{a} * {b}");
            }
        }
    }

    #[rstest]
    #[case(200, 100, 255, 200)]
    #[case(200, 100, 0, 100)]
    #[case(255, 0, 128, 128)]
    #[case(0, 255, 128, 127)]
    fn blend_channel_interpolates(
        #[case] s: u8,
        #[case] d: u8,
        #[case] a: u8,
        #[case] expected: u8,
    ) {
        assert_eq!(blend_channel(s, d, a), expected);
    }

    #[rstest]
    #[case(255, 255, 255, 0xFF)]
    #[case(255, 0, 0, 0xE0)]
    #[case(0, 255, 0, 0x1C)]
    #[case(0, 0, 255, 0x03)]
    #[case(0x24, 0x24, 0x55, 0x25)]
    fn quantize_matches_dither_ramp(#[case] r: u8, #[case] g: u8, #[case] b: u8, #[case] index: u8) {
        assert_eq!(quantize_332(r, g, b), index);
    }
}
