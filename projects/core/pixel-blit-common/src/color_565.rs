//! # RGB565 Color Format Support
//!
//! RGB565 is a 16-bit colour format that packs red, green, and blue colour components
//! into a single 16-bit value:
//!
//! - **Red**: 5 bits (bits 15-11)
//! - **Green**: 6 bits (bits 10-5)
//! - **Blue**: 5 bits (bits 4-0)
//!
//! ## Color Expansion
//!
//! When converting RGB565 colours back to 8-bit components, the top bits of each
//! channel are replicated into the freed low bits, so that full intensity in
//! 565 (`0x1F`/`0x3F`) maps to full intensity (`0xFF`) in 8888.
//!
//! ## Batch Expansion
//!
//! [`expand_565_row_to_8888`] converts a row of native-endian RGB565 pixels into
//! any 32-bit layout described by [`Shifts8888`]. It is compiled for several
//! x86-64 microarchitecture levels and picks the best one at runtime.
//!
//! ```rust
//! use pixel_blit_common::color_565::{expand_565_row_to_8888, Shifts8888};
//!
//! let src = 0xF800u16.to_ne_bytes();
//! let mut dst = [0u8; 4];
//! expand_565_row_to_8888(&src, &mut dst, Shifts8888::ARGB, 0xFF);
//! assert_eq!(u32::from_ne_bytes(dst), 0xFFFF0000);
//! ```

use crate::color_8888::Color8888;
use multiversion::multiversion;

/// Represents a 16-bit RGB565 colour (5 bits red, 6 bits green, 5 bits blue)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct Color565 {
    value: u16,
}

impl Color565 {
    /// Creates a new [`Color565`] from the raw 16-bit value
    #[inline]
    pub const fn from_raw(value: u16) -> Self {
        Self { value }
    }

    /// Creates a new [`Color565`] from separate RGB components.
    ///
    /// The low bits of each 8-bit component are discarded.
    ///
    /// ```
    /// use pixel_blit_common::color_565::Color565;
    ///
    /// let color = Color565::from_rgb(255, 128, 64);
    /// assert_eq!(color.raw_value(), 0xFC08);
    /// ```
    #[inline]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            value: ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3),
        }
    }

    /// Returns the raw 16-bit value
    #[inline]
    pub const fn raw_value(&self) -> u16 {
        self.value
    }

    /// Extracts the red component as an 8-bit value (0-255)
    #[inline]
    pub const fn red(&self) -> u8 {
        let r5 = (self.value >> 11) & 0x1F;
        ((r5 << 3) | (r5 >> 2)) as u8
    }

    /// Extracts the green component as an 8-bit value (0-255)
    #[inline]
    pub const fn green(&self) -> u8 {
        let g6 = (self.value >> 5) & 0x3F;
        ((g6 << 2) | (g6 >> 4)) as u8
    }

    /// Extracts the blue component as an 8-bit value (0-255)
    #[inline]
    pub const fn blue(&self) -> u8 {
        let b5 = self.value & 0x1F;
        ((b5 << 3) | (b5 >> 2)) as u8
    }

    /// Converts this RGB565 colour to an opaque RGBA8888 colour.
    ///
    /// # Examples
    ///
    /// ```
    /// use pixel_blit_common::color_565::Color565;
    ///
    /// let rgba8888 = Color565::from_rgb(255, 0, 0).to_color_8888();
    /// assert_eq!(rgba8888.r, 255);
    /// assert_eq!(rgba8888.g, 0);
    /// assert_eq!(rgba8888.a, 255);
    /// ```
    #[inline]
    pub fn to_color_8888(&self) -> Color8888 {
        self.to_color_8888_with_alpha(255)
    }

    /// Converts this RGB565 colour to an RGBA8888 colour with the specified alpha value
    #[inline]
    pub fn to_color_8888_with_alpha(&self, alpha: u8) -> Color8888 {
        Color8888::new(self.red(), self.green(), self.blue(), alpha)
    }
}

/// Bit positions of each channel inside a 32-bit pixel with 8 bits per channel.
///
/// `a` is [`None`] for layouts without an alpha channel (e.g. XRGB8888), in which
/// case the padding byte is written as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shifts8888 {
    /// Shift of the red byte.
    pub r: u32,
    /// Shift of the green byte.
    pub g: u32,
    /// Shift of the blue byte.
    pub b: u32,
    /// Shift of the alpha byte, if the layout stores alpha.
    pub a: Option<u32>,
}

impl Shifts8888 {
    /// `0xAARRGGBB`
    pub const ARGB: Self = Self {
        r: 16,
        g: 8,
        b: 0,
        a: Some(24),
    };
    /// `0xAABBGGRR`
    pub const ABGR: Self = Self {
        r: 0,
        g: 8,
        b: 16,
        a: Some(24),
    };
    /// `0x00RRGGBB`
    pub const XRGB: Self = Self {
        r: 16,
        g: 8,
        b: 0,
        a: None,
    };
    /// `0x00BBGGRR`
    pub const XBGR: Self = Self {
        r: 0,
        g: 8,
        b: 16,
        a: None,
    };
}

/// Expands a row of native-endian RGB565 pixels into native-endian 32-bit pixels.
///
/// Processes `min(src.len() / 2, dst.len() / 4)` pixels. `alpha` is stored in the
/// alpha byte when `shifts.a` is set.
///
/// # Parameters
///
/// - `src`: RGB565 pixels, two bytes each
/// - `dst`: Output 32-bit pixels, four bytes each
/// - `shifts`: Where each channel lands in the output pixel
/// - `alpha`: Constant alpha written to every output pixel
#[multiversion(targets(
    // x86-64-v3 without lahfsahf
    "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    // x86-64-v2 without lahfsahf
    "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
))]
pub fn expand_565_row_to_8888(src: &[u8], dst: &mut [u8], shifts: Shifts8888, alpha: u8) {
    let alpha_bits = match shifts.a {
        Some(shift) => (alpha as u32) << shift,
        None => 0,
    };

    for (input, output) in src.chunks_exact(2).zip(dst.chunks_exact_mut(4)) {
        let color = Color565::from_raw(u16::from_ne_bytes([input[0], input[1]]));
        let pixel = ((color.red() as u32) << shifts.r)
            | ((color.green() as u32) << shifts.g)
            | ((color.blue() as u32) << shifts.b)
            | alpha_bits;
        output.copy_from_slice(&pixel.to_ne_bytes());
    }
}
