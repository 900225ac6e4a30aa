//! Per-format channel layout derived from the mask codec.

use crate::error::PixelFormatError;
use crate::format::{Masks, PixelFormat};
use crate::palette_map::find_color;
use crate::registry::PaletteHandle;
use pixel_blit_common::color_8888::Color8888;

/// Position and precision of one colour channel inside a pixel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelInfo {
    /// Bits covered by the channel.
    pub mask: u32,
    /// Trailing zero bits below the channel.
    pub shift: u8,
    /// Width of the channel in bits.
    pub bits: u8,
    /// Bits dropped when storing an 8-bit value, `8 - min(bits, 8)`.
    pub loss: u8,
}

impl ChannelInfo {
    /// Derives shift, width and loss from a contiguous mask. A zero mask
    /// describes an absent channel: shift 0, bits 0, loss 8.
    pub const fn from_mask(mask: u32) -> Self {
        if mask == 0 {
            return Self {
                mask: 0,
                shift: 0,
                bits: 0,
                loss: 8,
            };
        }
        let shift = mask.trailing_zeros();
        let bits = (mask >> shift).trailing_ones();
        let kept = if bits < 8 { bits } else { 8 };
        Self {
            mask,
            shift: shift as u8,
            bits: bits as u8,
            loss: (8 - kept) as u8,
        }
    }

    /// Whether the format stores this channel.
    #[inline]
    pub const fn is_present(&self) -> bool {
        self.mask != 0
    }

    /// Extracts the raw channel value from a pixel.
    #[inline]
    pub const fn extract(&self, pixel: u32) -> u32 {
        (pixel & self.mask) >> self.shift
    }

    /// Extracts the channel and widens it to 8 bits. Absent channels read as `absent`.
    #[inline]
    pub fn expand(&self, pixel: u32, absent: u8) -> u8 {
        if self.bits == 0 {
            return absent;
        }
        channel_expand(self.extract(pixel), self.bits)
    }

    /// Places an 8-bit value into this channel, truncating to the channel width.
    #[inline]
    pub const fn pack(&self, value: u8) -> u32 {
        if self.bits == 0 {
            return 0;
        }
        let stored = if self.bits > 8 {
            let max = (1u32 << self.bits) - 1;
            (value as u32 * max + 127) / 255
        } else {
            (value as u32) >> self.loss
        };
        (stored << self.shift) & self.mask
    }
}

/// Widens an `bits`-wide channel value to 8 bits, rounding to nearest.
///
/// ```
/// use pixel_blit::descriptor::channel_expand;
///
/// assert_eq!(channel_expand(0x1F, 5), 255);
/// assert_eq!(channel_expand(0x10, 5), 132);
/// assert_eq!(channel_expand(1, 1), 255);
/// ```
#[inline]
pub fn channel_expand(value: u32, bits: u8) -> u8 {
    match bits {
        0 => 0,
        8 => value as u8,
        _ => {
            let max = (1u32 << bits) - 1;
            ((value.min(max) * 255 + max / 2) / max) as u8
        }
    }
}

/// Derived layout metadata for one pixel format.
///
/// Indexed descriptors carry a palette binding; every other descriptor is shared
/// between all users of the format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFormatDescriptor {
    pub format: PixelFormat,
    pub bits_per_pixel: u8,
    pub bytes_per_pixel: u8,
    pub r: ChannelInfo,
    pub g: ChannelInfo,
    pub b: ChannelInfo,
    pub a: ChannelInfo,
    pub palette: Option<PaletteHandle>,
}

impl PixelFormatDescriptor {
    /// Builds the descriptor of `format` from its masks.
    ///
    /// # Errors
    ///
    /// - [`PixelFormatError::InvalidParameter`] for [`PixelFormat::UNKNOWN`]
    /// - [`PixelFormatError::UnsupportedFormat`] for formats without masks
    pub fn new(format: PixelFormat) -> Result<Self, PixelFormatError> {
        if format == PixelFormat::UNKNOWN {
            return Err(PixelFormatError::InvalidParameter("format"));
        }
        let masks = format.to_masks()?;
        Ok(Self::from_masks(format, masks))
    }

    fn from_masks(format: PixelFormat, masks: Masks) -> Self {
        Self {
            format,
            bits_per_pixel: masks.bpp,
            bytes_per_pixel: masks.bpp.div_ceil(8),
            r: ChannelInfo::from_mask(masks.r),
            g: ChannelInfo::from_mask(masks.g),
            b: ChannelInfo::from_mask(masks.b),
            a: ChannelInfo::from_mask(masks.a),
            palette: None,
        }
    }

    /// The channel masks, with the descriptor's bits per pixel.
    pub fn masks(&self) -> Masks {
        Masks::new(
            self.bits_per_pixel,
            self.r.mask,
            self.g.mask,
            self.b.mask,
            self.a.mask,
        )
    }

    /// Whether any channel is wider than 8 bits (e.g. ARGB2101010).
    pub fn is_wide(&self) -> bool {
        [self.r, self.g, self.b, self.a].iter().any(|c| c.bits > 8)
    }

    /// Whether the format is palette based.
    pub fn is_indexed(&self) -> bool {
        self.format.is_indexed()
    }

    /// Packs an opaque colour into a pixel value.
    pub fn map_rgb(&self, palette: Option<&[Color8888]>, r: u8, g: u8, b: u8) -> u32 {
        self.map_rgba(palette, r, g, b, 255)
    }

    /// Packs a colour into a pixel value.
    ///
    /// Indexed formats return the nearest palette index; without a palette they
    /// return 0. Formats without alpha drop `a`.
    pub fn map_rgba(&self, palette: Option<&[Color8888]>, r: u8, g: u8, b: u8, a: u8) -> u32 {
        if self.is_indexed() {
            return palette
                .map(|colors| find_color(colors, Color8888::new(r, g, b, a)) as u32)
                .unwrap_or(0);
        }
        self.r.pack(r) | self.g.pack(g) | self.b.pack(b) | self.a.pack(a)
    }

    /// Unpacks a pixel value, ignoring alpha.
    pub fn get_rgb(&self, palette: Option<&[Color8888]>, pixel: u32) -> (u8, u8, u8) {
        let color = self.get_rgba(palette, pixel);
        (color.r, color.g, color.b)
    }

    /// Unpacks a pixel value into 8-bit channels.
    ///
    /// Missing alpha reads as 255. Indexed pixels outside the palette (or with
    /// no palette) read as transparent black.
    pub fn get_rgba(&self, palette: Option<&[Color8888]>, pixel: u32) -> Color8888 {
        if self.is_indexed() {
            return palette
                .and_then(|colors| colors.get(pixel as usize).copied())
                .unwrap_or_default();
        }
        Color8888::new(
            self.r.expand(pixel, 0),
            self.g.expand(pixel, 0),
            self.b.expand(pixel, 0),
            self.a.expand(pixel, 255),
        )
    }
}
