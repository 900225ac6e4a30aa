//! # Pixel Format Identifiers and the Mask Codec
//!
//! A [`PixelFormat`] is a 32-bit identifier. Non-FourCC formats pack their whole
//! structure into the value:
//!
//! ```text
//! bits:  31..28  27..24  23..20  19..16   15..8            7..0
//!        0b0001  type    order   layout   bits per pixel   bytes per pixel
//! ```
//!
//! FourCC formats (YUV and external textures) are four ASCII bytes instead, and
//! carry no channel masks.
//!
//! The codec converts between formats and their channel masks:
//!
//! - [`PixelFormat::to_masks`] decodes a format into [`Masks`].
//! - [`PixelFormat::from_masks`] finds the canonical format for a mask tuple.
//!
//! The mapping is not a bijection. Several formats (and several mask tuples)
//! collapse onto the same canonical format; the known cases are listed in
//! [`EQUIVALENCE_CLASSES`].
//!
//! ```
//! use pixel_blit::format::{Masks, PixelFormat};
//!
//! let masks = PixelFormat::RGB565.to_masks().unwrap();
//! assert_eq!(masks, Masks::new(16, 0xF800, 0x07E0, 0x001F, 0));
//! assert_eq!(PixelFormat::from_masks(masks), PixelFormat::RGB565);
//! ```

use crate::error::PixelFormatError;
use core::fmt;
use derive_enum_all_values::AllValues;

/// Storage class of a pixel format.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, AllValues)]
#[repr(u8)]
pub enum PixelType {
    Unknown = 0,
    Index1 = 1,
    Index4 = 2,
    Index8 = 3,
    Packed8 = 4,
    Packed16 = 5,
    Packed32 = 6,
    ArrayU8 = 7,
    ArrayU16 = 8,
    ArrayU32 = 9,
    ArrayF16 = 10,
    ArrayF32 = 11,
}

/// Bit order of sub-byte indexed formats.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, AllValues)]
#[repr(u8)]
pub enum BitmapOrder {
    None = 0,
    /// First pixel in the least significant bits.
    Order4321 = 1,
    /// First pixel in the most significant bits.
    Order1234 = 2,
}

/// Channel order of packed formats, most significant channel first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, AllValues)]
#[repr(u8)]
pub enum PackedOrder {
    None = 0,
    Xrgb = 1,
    Rgbx = 2,
    Argb = 3,
    Rgba = 4,
    Xbgr = 5,
    Bgrx = 6,
    Abgr = 7,
    Bgra = 8,
}

/// Channel order of array formats, in memory order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, AllValues)]
#[repr(u8)]
pub enum ArrayOrder {
    None = 0,
    Rgb = 1,
    Rgba = 2,
    Argb = 3,
    Bgr = 4,
    Bgra = 5,
    Abgr = 6,
}

/// Bit widths of the four slots of a packed format.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, AllValues)]
#[repr(u8)]
pub enum PackedLayout {
    None = 0,
    L332 = 1,
    L4444 = 2,
    L1555 = 3,
    L5551 = 4,
    L565 = 5,
    L8888 = 6,
    L2101010 = 7,
    L1010102 = 8,
}

impl PackedLayout {
    /// Masks of the four slots `[m0, m1, m2, m3]`, most significant slot first.
    ///
    /// The channel order decides which colour lands in which slot.
    pub const fn template(self) -> Option<[u32; 4]> {
        Some(match self {
            PackedLayout::None => return None,
            PackedLayout::L332 => [0x00, 0xE0, 0x1C, 0x03],
            PackedLayout::L4444 => [0xF000, 0x0F00, 0x00F0, 0x000F],
            PackedLayout::L1555 => [0x8000, 0x7C00, 0x03E0, 0x001F],
            PackedLayout::L5551 => [0xF800, 0x07C0, 0x003E, 0x0001],
            PackedLayout::L565 => [0x0000, 0xF800, 0x07E0, 0x001F],
            PackedLayout::L8888 => [0xFF00_0000, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF],
            PackedLayout::L2101010 => [0xC000_0000, 0x3FF0_0000, 0x000F_FC00, 0x0000_03FF],
            PackedLayout::L1010102 => [0xFFC0_0000, 0x003F_F000, 0x0000_0FFC, 0x0000_0003],
        })
    }
}

macro_rules! impl_from_raw {
    ($($ty:ty),*) => {
        $(
            impl $ty {
                /// Converts the raw field value, returning [`None`] when out of range.
                pub fn from_raw(raw: u32) -> Option<Self> {
                    Self::all_values().iter().copied().find(|value| *value as u32 == raw)
                }
            }
        )*
    };
}

impl_from_raw!(PixelType, BitmapOrder, PackedOrder, ArrayOrder, PackedLayout);

/// Channel masks of a pixel format, plus its bits per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Masks {
    /// Bits per pixel used by the masks.
    pub bpp: u8,
    /// Red mask.
    pub r: u32,
    /// Green mask.
    pub g: u32,
    /// Blue mask.
    pub b: u32,
    /// Alpha mask. Zero when the format has no alpha channel.
    pub a: u32,
}

impl Masks {
    /// Creates a new [`Masks`] value.
    pub const fn new(bpp: u8, r: u32, g: u32, b: u32, a: u32) -> Self {
        Self { bpp, r, g, b, a }
    }

    const fn equals(&self, r: u32, g: u32, b: u32, a: u32) -> bool {
        self.r == r && self.g == g && self.b == b && self.a == a
    }
}

/// A canonical pixel format identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PixelFormat(u32);

const fn define(ty: PixelType, order: u8, layout: PackedLayout, bits: u8, bytes: u8) -> PixelFormat {
    PixelFormat(
        (1 << 28)
            | ((ty as u32) << 24)
            | ((order as u32) << 20)
            | ((layout as u32) << 16)
            | ((bits as u32) << 8)
            | bytes as u32,
    )
}

const fn fourcc(code: &[u8; 4]) -> PixelFormat {
    PixelFormat(
        (code[0] as u32) | ((code[1] as u32) << 8) | ((code[2] as u32) << 16) | ((code[3] as u32) << 24),
    )
}

const fn packed(ty: PixelType, order: PackedOrder, layout: PackedLayout, bits: u8, bytes: u8) -> PixelFormat {
    define(ty, order as u8, layout, bits, bytes)
}

impl PixelFormat {
    pub const UNKNOWN: Self = Self(0);

    pub const INDEX1LSB: Self = define(PixelType::Index1, BitmapOrder::Order4321 as u8, PackedLayout::None, 1, 0);
    pub const INDEX1MSB: Self = define(PixelType::Index1, BitmapOrder::Order1234 as u8, PackedLayout::None, 1, 0);
    pub const INDEX4LSB: Self = define(PixelType::Index4, BitmapOrder::Order4321 as u8, PackedLayout::None, 4, 0);
    pub const INDEX4MSB: Self = define(PixelType::Index4, BitmapOrder::Order1234 as u8, PackedLayout::None, 4, 0);
    pub const INDEX8: Self = define(PixelType::Index8, 0, PackedLayout::None, 8, 1);

    pub const RGB332: Self = packed(PixelType::Packed8, PackedOrder::Xrgb, PackedLayout::L332, 8, 1);
    pub const XRGB4444: Self = packed(PixelType::Packed16, PackedOrder::Xrgb, PackedLayout::L4444, 12, 2);
    pub const XBGR4444: Self = packed(PixelType::Packed16, PackedOrder::Xbgr, PackedLayout::L4444, 12, 2);
    pub const XRGB1555: Self = packed(PixelType::Packed16, PackedOrder::Xrgb, PackedLayout::L1555, 15, 2);
    pub const XBGR1555: Self = packed(PixelType::Packed16, PackedOrder::Xbgr, PackedLayout::L1555, 15, 2);
    pub const ARGB4444: Self = packed(PixelType::Packed16, PackedOrder::Argb, PackedLayout::L4444, 16, 2);
    pub const RGBA4444: Self = packed(PixelType::Packed16, PackedOrder::Rgba, PackedLayout::L4444, 16, 2);
    pub const ABGR4444: Self = packed(PixelType::Packed16, PackedOrder::Abgr, PackedLayout::L4444, 16, 2);
    pub const BGRA4444: Self = packed(PixelType::Packed16, PackedOrder::Bgra, PackedLayout::L4444, 16, 2);
    pub const ARGB1555: Self = packed(PixelType::Packed16, PackedOrder::Argb, PackedLayout::L1555, 16, 2);
    pub const RGBA5551: Self = packed(PixelType::Packed16, PackedOrder::Rgba, PackedLayout::L5551, 16, 2);
    pub const ABGR1555: Self = packed(PixelType::Packed16, PackedOrder::Abgr, PackedLayout::L1555, 16, 2);
    pub const BGRA5551: Self = packed(PixelType::Packed16, PackedOrder::Bgra, PackedLayout::L5551, 16, 2);
    pub const RGB565: Self = packed(PixelType::Packed16, PackedOrder::Xrgb, PackedLayout::L565, 16, 2);
    pub const BGR565: Self = packed(PixelType::Packed16, PackedOrder::Xbgr, PackedLayout::L565, 16, 2);
    pub const RGB24: Self = define(PixelType::ArrayU8, ArrayOrder::Rgb as u8, PackedLayout::None, 24, 3);
    pub const BGR24: Self = define(PixelType::ArrayU8, ArrayOrder::Bgr as u8, PackedLayout::None, 24, 3);
    pub const XRGB8888: Self = packed(PixelType::Packed32, PackedOrder::Xrgb, PackedLayout::L8888, 24, 4);
    pub const RGBX8888: Self = packed(PixelType::Packed32, PackedOrder::Rgbx, PackedLayout::L8888, 24, 4);
    pub const XBGR8888: Self = packed(PixelType::Packed32, PackedOrder::Xbgr, PackedLayout::L8888, 24, 4);
    pub const BGRX8888: Self = packed(PixelType::Packed32, PackedOrder::Bgrx, PackedLayout::L8888, 24, 4);
    pub const ARGB8888: Self = packed(PixelType::Packed32, PackedOrder::Argb, PackedLayout::L8888, 32, 4);
    pub const RGBA8888: Self = packed(PixelType::Packed32, PackedOrder::Rgba, PackedLayout::L8888, 32, 4);
    pub const ABGR8888: Self = packed(PixelType::Packed32, PackedOrder::Abgr, PackedLayout::L8888, 32, 4);
    pub const BGRA8888: Self = packed(PixelType::Packed32, PackedOrder::Bgra, PackedLayout::L8888, 32, 4);
    pub const ARGB2101010: Self = packed(PixelType::Packed32, PackedOrder::Argb, PackedLayout::L2101010, 32, 4);

    /// Planar mode: Y + V + U (3 planes)
    pub const YV12: Self = fourcc(b"YV12");
    /// Planar mode: Y + U + V (3 planes)
    pub const IYUV: Self = fourcc(b"IYUV");
    /// Packed mode: Y0+U0+Y1+V0 (1 plane)
    pub const YUY2: Self = fourcc(b"YUY2");
    /// Packed mode: U0+Y0+V0+Y1 (1 plane)
    pub const UYVY: Self = fourcc(b"UYVY");
    /// Packed mode: Y0+V0+Y1+U0 (1 plane)
    pub const YVYU: Self = fourcc(b"YVYU");
    /// Planar mode: Y + U/V interleaved (2 planes)
    pub const NV12: Self = fourcc(b"NV12");
    /// Planar mode: Y + V/U interleaved (2 planes)
    pub const NV21: Self = fourcc(b"NV21");
    /// Android video texture format
    pub const EXTERNAL_OES: Self = fourcc(b"OES ");

    pub const RGB444: Self = Self::XRGB4444;
    pub const BGR444: Self = Self::XBGR4444;
    pub const RGB555: Self = Self::XRGB1555;
    pub const BGR555: Self = Self::XBGR1555;
    pub const RGB888: Self = Self::XRGB8888;
    pub const BGR888: Self = Self::XBGR8888;

    /// Byte-order alias: bytes `R, G, B, A` in memory.
    #[cfg(target_endian = "little")]
    pub const RGBA32: Self = Self::ABGR8888;
    /// Byte-order alias: bytes `A, R, G, B` in memory.
    #[cfg(target_endian = "little")]
    pub const ARGB32: Self = Self::BGRA8888;
    /// Byte-order alias: bytes `B, G, R, A` in memory.
    #[cfg(target_endian = "little")]
    pub const BGRA32: Self = Self::ARGB8888;
    /// Byte-order alias: bytes `A, B, G, R` in memory.
    #[cfg(target_endian = "little")]
    pub const ABGR32: Self = Self::RGBA8888;

    /// Byte-order alias: bytes `R, G, B, A` in memory.
    #[cfg(target_endian = "big")]
    pub const RGBA32: Self = Self::RGBA8888;
    /// Byte-order alias: bytes `A, R, G, B` in memory.
    #[cfg(target_endian = "big")]
    pub const ARGB32: Self = Self::ARGB8888;
    /// Byte-order alias: bytes `B, G, R, A` in memory.
    #[cfg(target_endian = "big")]
    pub const BGRA32: Self = Self::BGRA8888;
    /// Byte-order alias: bytes `A, B, G, R` in memory.
    #[cfg(target_endian = "big")]
    pub const ABGR32: Self = Self::ABGR8888;

    /// Every enumerated format, excluding [`PixelFormat::UNKNOWN`] and aliases.
    pub const ALL: &'static [PixelFormat] = &[
        Self::INDEX1LSB,
        Self::INDEX1MSB,
        Self::INDEX4LSB,
        Self::INDEX4MSB,
        Self::INDEX8,
        Self::RGB332,
        Self::XRGB4444,
        Self::XBGR4444,
        Self::XRGB1555,
        Self::XBGR1555,
        Self::ARGB4444,
        Self::RGBA4444,
        Self::ABGR4444,
        Self::BGRA4444,
        Self::ARGB1555,
        Self::RGBA5551,
        Self::ABGR1555,
        Self::BGRA5551,
        Self::RGB565,
        Self::BGR565,
        Self::RGB24,
        Self::BGR24,
        Self::XRGB8888,
        Self::RGBX8888,
        Self::XBGR8888,
        Self::BGRX8888,
        Self::ARGB8888,
        Self::RGBA8888,
        Self::ABGR8888,
        Self::BGRA8888,
        Self::ARGB2101010,
        Self::YV12,
        Self::IYUV,
        Self::YUY2,
        Self::UYVY,
        Self::YVYU,
        Self::NV12,
        Self::NV21,
        Self::EXTERNAL_OES,
    ];

    /// Wraps a raw identifier without validating it.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw 32-bit identifier.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this is a FourCC format (four ASCII bytes, no masks).
    #[inline]
    pub const fn is_fourcc(self) -> bool {
        self.0 != 0 && ((self.0 >> 28) & 0x0F) != 1
    }

    /// Storage class; [`PixelType::Unknown`] for FourCC and invalid ids.
    pub fn pixel_type(self) -> PixelType {
        if self.is_fourcc() {
            return PixelType::Unknown;
        }
        PixelType::from_raw((self.0 >> 24) & 0x0F).unwrap_or(PixelType::Unknown)
    }

    /// The raw order field. Interpret it with [`Self::packed_order`],
    /// [`Self::array_order`] or [`Self::bitmap_order`].
    #[inline]
    pub const fn order(self) -> u8 {
        ((self.0 >> 20) & 0x0F) as u8
    }

    /// Channel order of a packed format.
    pub fn packed_order(self) -> Option<PackedOrder> {
        self.is_packed().then(|| PackedOrder::from_raw(self.order() as u32)).flatten()
    }

    /// Channel order of an array format.
    pub fn array_order(self) -> Option<ArrayOrder> {
        self.is_array().then(|| ArrayOrder::from_raw(self.order() as u32)).flatten()
    }

    /// Bit order of a sub-byte indexed format.
    pub fn bitmap_order(self) -> Option<BitmapOrder> {
        matches!(self.pixel_type(), PixelType::Index1 | PixelType::Index4)
            .then(|| BitmapOrder::from_raw(self.order() as u32))
            .flatten()
    }

    /// Packed layout; [`PackedLayout::None`] for everything but packed formats.
    pub fn layout(self) -> PackedLayout {
        if self.is_fourcc() {
            return PackedLayout::None;
        }
        PackedLayout::from_raw((self.0 >> 16) & 0x0F).unwrap_or(PackedLayout::None)
    }

    /// Significant bits per pixel (e.g. 15 for XRGB1555, 24 for XRGB8888).
    #[inline]
    pub const fn bits_per_pixel(self) -> u8 {
        if self.is_fourcc() {
            0
        } else {
            ((self.0 >> 8) & 0xFF) as u8
        }
    }

    /// Bytes per pixel. Sub-byte formats report 0; packed YUV FourCC formats report 2.
    #[inline]
    pub const fn bytes_per_pixel(self) -> u8 {
        if self.is_fourcc() {
            if self.0 == Self::YUY2.0 || self.0 == Self::UYVY.0 || self.0 == Self::YVYU.0 {
                2
            } else {
                1
            }
        } else {
            (self.0 & 0xFF) as u8
        }
    }

    /// Whether pixels are palette indices.
    pub fn is_indexed(self) -> bool {
        matches!(
            self.pixel_type(),
            PixelType::Index1 | PixelType::Index4 | PixelType::Index8
        )
    }

    /// Whether pixels are packed into an integer.
    pub fn is_packed(self) -> bool {
        matches!(
            self.pixel_type(),
            PixelType::Packed8 | PixelType::Packed16 | PixelType::Packed32
        )
    }

    /// Whether pixels are arrays of per-channel components.
    pub fn is_array(self) -> bool {
        matches!(
            self.pixel_type(),
            PixelType::ArrayU8
                | PixelType::ArrayU16
                | PixelType::ArrayU32
                | PixelType::ArrayF16
                | PixelType::ArrayF32
        )
    }

    /// Whether the format stores an alpha channel.
    pub fn is_alpha(self) -> bool {
        matches!(
            self.packed_order(),
            Some(PackedOrder::Argb | PackedOrder::Rgba | PackedOrder::Abgr | PackedOrder::Bgra)
        ) || matches!(
            self.array_order(),
            Some(ArrayOrder::Rgba | ArrayOrder::Argb | ArrayOrder::Bgra | ArrayOrder::Abgr)
        )
    }

    /// Name of an enumerated format, e.g. `"ARGB8888"`.
    pub fn name(self) -> Option<&'static str> {
        NAMES
            .iter()
            .find(|(format, _)| *format == self)
            .map(|(_, name)| *name)
    }

    /// Parses a format name or alias, ignoring ASCII case.
    ///
    /// ```
    /// use pixel_blit::format::PixelFormat;
    ///
    /// assert_eq!(PixelFormat::from_name("rgb888"), Some(PixelFormat::XRGB8888));
    /// assert_eq!(PixelFormat::from_name("nope"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        NAMES
            .iter()
            .chain(ALIASES.iter())
            .find(|(_, candidate)| candidate.eq_ignore_ascii_case(name))
            .map(|(format, _)| *format)
    }

    /// Decodes a format into its channel masks.
    ///
    /// - `bpp` is the bit count for formats up to 2 bytes wide, otherwise
    ///   `bytes * 8` (so XRGB8888 reports 32).
    /// - Indexed and non-24-bit array formats have all-zero masks.
    ///
    /// # Errors
    ///
    /// [`PixelFormatError::UnsupportedFormat`] for FourCC formats and packed
    /// formats with an unknown layout or order.
    pub fn to_masks(self) -> Result<Masks, PixelFormatError> {
        if self.is_fourcc() {
            return Err(PixelFormatError::UnsupportedFormat(self));
        }

        let bpp = if self.bytes_per_pixel() <= 2 {
            self.bits_per_pixel()
        } else {
            self.bytes_per_pixel().saturating_mul(8)
        };
        let mut masks = Masks {
            bpp,
            ..Masks::default()
        };

        if self == Self::RGB24 {
            #[cfg(target_endian = "big")]
            {
                (masks.r, masks.g, masks.b) = (0xFF0000, 0x00FF00, 0x0000FF);
            }
            #[cfg(target_endian = "little")]
            {
                (masks.r, masks.g, masks.b) = (0x0000FF, 0x00FF00, 0xFF0000);
            }
            return Ok(masks);
        }

        if self == Self::BGR24 {
            #[cfg(target_endian = "big")]
            {
                (masks.r, masks.g, masks.b) = (0x0000FF, 0x00FF00, 0xFF0000);
            }
            #[cfg(target_endian = "little")]
            {
                (masks.r, masks.g, masks.b) = (0xFF0000, 0x00FF00, 0x0000FF);
            }
            return Ok(masks);
        }

        if !self.is_packed() {
            return Ok(masks);
        }

        let [m0, m1, m2, m3] = self
            .layout()
            .template()
            .ok_or(PixelFormatError::UnsupportedFormat(self))?;

        let (r, g, b, a) = match self.packed_order() {
            Some(PackedOrder::Xrgb) => (m1, m2, m3, 0),
            Some(PackedOrder::Rgbx) => (m0, m1, m2, 0),
            Some(PackedOrder::Argb) => (m1, m2, m3, m0),
            Some(PackedOrder::Rgba) => (m0, m1, m2, m3),
            Some(PackedOrder::Xbgr) => (m3, m2, m1, 0),
            Some(PackedOrder::Bgrx) => (m2, m1, m0, 0),
            Some(PackedOrder::Bgra) => (m2, m1, m0, m3),
            Some(PackedOrder::Abgr) => (m3, m2, m1, m0),
            Some(PackedOrder::None) | None => return Err(PixelFormatError::UnsupportedFormat(self)),
        };

        masks.r = r;
        masks.g = g;
        masks.b = b;
        masks.a = a;
        Ok(masks)
    }

    /// Finds the canonical format for a set of masks, or [`PixelFormat::UNKNOWN`].
    ///
    /// Candidates are tried in a fixed priority order per bit depth. All-zero
    /// masks select the default format of that depth.
    pub fn from_masks(masks: Masks) -> Self {
        let m = masks;
        match m.bpp {
            1 => return Self::INDEX1MSB,
            4 => return Self::INDEX4MSB,
            8 => {
                if m.r == 0 {
                    return Self::INDEX8;
                }
                if m.equals(0xE0, 0x1C, 0x03, 0) {
                    return Self::RGB332;
                }
            }
            12 => {
                if m.r == 0 || m.equals(0x0F00, 0x00F0, 0x000F, 0) {
                    return Self::XRGB4444;
                }
                if m.equals(0x000F, 0x00F0, 0x0F00, 0) {
                    return Self::XBGR4444;
                }
            }
            15 if m.r == 0 => return Self::XRGB1555,
            15 | 16 => return Self::from_masks_16(m),
            24 => match m.r {
                #[cfg(target_endian = "big")]
                0 | 0x00FF_0000 => return Self::RGB24,
                #[cfg(target_endian = "little")]
                0 | 0x00FF_0000 => return Self::BGR24,
                #[cfg(target_endian = "big")]
                0x0000_00FF => return Self::BGR24,
                #[cfg(target_endian = "little")]
                0x0000_00FF => return Self::RGB24,
                _ => {}
            },
            32 => return Self::from_masks_32(m),
            _ => {}
        }
        Self::UNKNOWN
    }

    fn from_masks_16(m: Masks) -> Self {
        const CANDIDATES: &[(PixelFormat, [u32; 4])] = &[
            (PixelFormat::XRGB1555, [0x7C00, 0x03E0, 0x001F, 0x0000]),
            (PixelFormat::XBGR1555, [0x001F, 0x03E0, 0x7C00, 0x0000]),
            (PixelFormat::ARGB4444, [0x0F00, 0x00F0, 0x000F, 0xF000]),
            (PixelFormat::RGBA4444, [0xF000, 0x0F00, 0x00F0, 0x000F]),
            (PixelFormat::ABGR4444, [0x000F, 0x00F0, 0x0F00, 0xF000]),
            (PixelFormat::BGRA4444, [0x00F0, 0x0F00, 0xF000, 0x000F]),
            (PixelFormat::ARGB1555, [0x7C00, 0x03E0, 0x001F, 0x8000]),
            (PixelFormat::RGBA5551, [0xF800, 0x07C0, 0x003E, 0x0001]),
            (PixelFormat::ABGR1555, [0x001F, 0x03E0, 0x7C00, 0x8000]),
            (PixelFormat::BGRA5551, [0x003E, 0x07C0, 0xF800, 0x0001]),
            (PixelFormat::RGB565, [0xF800, 0x07E0, 0x001F, 0x0000]),
            (PixelFormat::BGR565, [0x001F, 0x07E0, 0xF800, 0x0000]),
            // BGR556 has no format of its own and historically decodes as 565
            (PixelFormat::RGB565, [0x003F, 0x07C0, 0xF800, 0x0000]),
        ];

        if m.r == 0 {
            return Self::RGB565;
        }
        find_candidate(m, CANDIDATES)
    }

    fn from_masks_32(m: Masks) -> Self {
        const CANDIDATES: &[(PixelFormat, [u32; 4])] = &[
            (PixelFormat::XRGB8888, [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0x0000_0000]),
            (PixelFormat::RGBX8888, [0xFF00_0000, 0x00FF_0000, 0x0000_FF00, 0x0000_0000]),
            (PixelFormat::XBGR8888, [0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0x0000_0000]),
            (PixelFormat::BGRX8888, [0x0000_FF00, 0x00FF_0000, 0xFF00_0000, 0x0000_0000]),
            (PixelFormat::ARGB8888, [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000]),
            (PixelFormat::RGBA8888, [0xFF00_0000, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF]),
            (PixelFormat::ABGR8888, [0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000]),
            (PixelFormat::BGRA8888, [0x0000_FF00, 0x00FF_0000, 0xFF00_0000, 0x0000_00FF]),
            (PixelFormat::ARGB2101010, [0x3FF0_0000, 0x000F_FC00, 0x0000_03FF, 0xC000_0000]),
        ];

        if m.r == 0 {
            return Self::XRGB8888;
        }
        find_candidate(m, CANDIDATES)
    }
}

fn find_candidate(m: Masks, candidates: &[(PixelFormat, [u32; 4])]) -> PixelFormat {
    candidates
        .iter()
        .find(|(_, [r, g, b, a])| m.equals(*r, *g, *b, *a))
        .map(|(format, _)| *format)
        .unwrap_or(PixelFormat::UNKNOWN)
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.name() {
            return f.write_str(name);
        }
        if *self == Self::UNKNOWN {
            return f.write_str("UNKNOWN");
        }
        write!(f, "0x{:08X}", self.0)
    }
}

impl fmt::Debug for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelFormat({self})")
    }
}

const NAMES: &[(PixelFormat, &str)] = &[
    (PixelFormat::INDEX1LSB, "INDEX1LSB"),
    (PixelFormat::INDEX1MSB, "INDEX1MSB"),
    (PixelFormat::INDEX4LSB, "INDEX4LSB"),
    (PixelFormat::INDEX4MSB, "INDEX4MSB"),
    (PixelFormat::INDEX8, "INDEX8"),
    (PixelFormat::RGB332, "RGB332"),
    (PixelFormat::XRGB4444, "XRGB4444"),
    (PixelFormat::XBGR4444, "XBGR4444"),
    (PixelFormat::XRGB1555, "XRGB1555"),
    (PixelFormat::XBGR1555, "XBGR1555"),
    (PixelFormat::ARGB4444, "ARGB4444"),
    (PixelFormat::RGBA4444, "RGBA4444"),
    (PixelFormat::ABGR4444, "ABGR4444"),
    (PixelFormat::BGRA4444, "BGRA4444"),
    (PixelFormat::ARGB1555, "ARGB1555"),
    (PixelFormat::RGBA5551, "RGBA5551"),
    (PixelFormat::ABGR1555, "ABGR1555"),
    (PixelFormat::BGRA5551, "BGRA5551"),
    (PixelFormat::RGB565, "RGB565"),
    (PixelFormat::BGR565, "BGR565"),
    (PixelFormat::RGB24, "RGB24"),
    (PixelFormat::BGR24, "BGR24"),
    (PixelFormat::XRGB8888, "XRGB8888"),
    (PixelFormat::RGBX8888, "RGBX8888"),
    (PixelFormat::XBGR8888, "XBGR8888"),
    (PixelFormat::BGRX8888, "BGRX8888"),
    (PixelFormat::ARGB8888, "ARGB8888"),
    (PixelFormat::RGBA8888, "RGBA8888"),
    (PixelFormat::ABGR8888, "ABGR8888"),
    (PixelFormat::BGRA8888, "BGRA8888"),
    (PixelFormat::ARGB2101010, "ARGB2101010"),
    (PixelFormat::YV12, "YV12"),
    (PixelFormat::IYUV, "IYUV"),
    (PixelFormat::YUY2, "YUY2"),
    (PixelFormat::UYVY, "UYVY"),
    (PixelFormat::YVYU, "YVYU"),
    (PixelFormat::NV12, "NV12"),
    (PixelFormat::NV21, "NV21"),
    (PixelFormat::EXTERNAL_OES, "EXTERNAL_OES"),
];

const ALIASES: &[(PixelFormat, &str)] = &[
    (PixelFormat::UNKNOWN, "UNKNOWN"),
    (PixelFormat::RGB444, "RGB444"),
    (PixelFormat::BGR444, "BGR444"),
    (PixelFormat::RGB555, "RGB555"),
    (PixelFormat::BGR555, "BGR555"),
    (PixelFormat::RGB888, "RGB888"),
    (PixelFormat::BGR888, "BGR888"),
    (PixelFormat::RGBA32, "RGBA32"),
    (PixelFormat::ARGB32, "ARGB32"),
    (PixelFormat::BGRA32, "BGRA32"),
    (PixelFormat::ABGR32, "ABGR32"),
];

/// A set of formats or mask tuples that [`PixelFormat::from_masks`] collapses onto
/// one canonical format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquivalenceClass {
    /// What the class groups together.
    pub description: &'static str,
    /// The mask tuple shared by the class.
    pub masks: Masks,
    /// What [`PixelFormat::from_masks`] returns for [`Self::masks`].
    pub decodes_to: PixelFormat,
    /// Formats whose [`PixelFormat::to_masks`] produces [`Self::masks`].
    pub members: &'static [PixelFormat],
}

#[cfg(target_endian = "little")]
const NATIVE_24: PixelFormat = PixelFormat::BGR24;
#[cfg(target_endian = "big")]
const NATIVE_24: PixelFormat = PixelFormat::RGB24;

/// The known many-to-one cases of the mask codec.
pub const EQUIVALENCE_CLASSES: &[EquivalenceClass] = &[
    EquivalenceClass {
        description: "1-bit indexed formats differ only in bit order",
        masks: Masks::new(1, 0, 0, 0, 0),
        decodes_to: PixelFormat::INDEX1MSB,
        members: &[PixelFormat::INDEX1LSB, PixelFormat::INDEX1MSB],
    },
    EquivalenceClass {
        description: "4-bit indexed formats differ only in bit order",
        masks: Masks::new(4, 0, 0, 0, 0),
        decodes_to: PixelFormat::INDEX4MSB,
        members: &[PixelFormat::INDEX4LSB, PixelFormat::INDEX4MSB],
    },
    EquivalenceClass {
        description: "BGR556 masks decode as RGB565",
        masks: Masks::new(16, 0x003F, 0x07C0, 0xF800, 0),
        decodes_to: PixelFormat::RGB565,
        members: &[],
    },
    EquivalenceClass {
        description: "zero masks at 12 bpp select the default 12-bit format",
        masks: Masks::new(12, 0, 0, 0, 0),
        decodes_to: PixelFormat::XRGB4444,
        members: &[],
    },
    EquivalenceClass {
        description: "zero masks at 15 bpp select the default 15-bit format",
        masks: Masks::new(15, 0, 0, 0, 0),
        decodes_to: PixelFormat::XRGB1555,
        members: &[],
    },
    EquivalenceClass {
        description: "zero masks at 16 bpp select the default 16-bit format",
        masks: Masks::new(16, 0, 0, 0, 0),
        decodes_to: PixelFormat::RGB565,
        members: &[],
    },
    EquivalenceClass {
        description: "zero masks at 24 bpp select the native-order 24-bit format",
        masks: Masks::new(24, 0, 0, 0, 0),
        decodes_to: NATIVE_24,
        members: &[],
    },
    EquivalenceClass {
        description: "zero masks at 32 bpp select the default 32-bit format",
        masks: Masks::new(32, 0, 0, 0, 0),
        decodes_to: PixelFormat::XRGB8888,
        members: &[],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    #[test]
    fn rgb565_masks_match_layout() {
        let masks = PixelFormat::RGB565.to_masks().unwrap();
        assert_eq!(masks, Masks::new(16, 0xF800, 0x07E0, 0x001F, 0x0000));
    }

    #[rstest]
    #[case(PixelFormat::XRGB8888, Masks::new(32, 0x00FF0000, 0x0000FF00, 0x000000FF, 0))]
    #[case(PixelFormat::ARGB8888, Masks::new(32, 0x00FF0000, 0x0000FF00, 0x000000FF, 0xFF000000))]
    #[case(PixelFormat::RGBA8888, Masks::new(32, 0xFF000000, 0x00FF0000, 0x0000FF00, 0x000000FF))]
    #[case(PixelFormat::ABGR8888, Masks::new(32, 0x000000FF, 0x0000FF00, 0x00FF0000, 0xFF000000))]
    #[case(PixelFormat::BGRA8888, Masks::new(32, 0x0000FF00, 0x00FF0000, 0xFF000000, 0x000000FF))]
    #[case(PixelFormat::BGRX8888, Masks::new(32, 0x0000FF00, 0x00FF0000, 0xFF000000, 0))]
    #[case(PixelFormat::RGB332, Masks::new(8, 0xE0, 0x1C, 0x03, 0))]
    #[case(PixelFormat::XRGB4444, Masks::new(12, 0x0F00, 0x00F0, 0x000F, 0))]
    #[case(PixelFormat::XRGB1555, Masks::new(15, 0x7C00, 0x03E0, 0x001F, 0))]
    #[case(PixelFormat::ARGB1555, Masks::new(16, 0x7C00, 0x03E0, 0x001F, 0x8000))]
    #[case(PixelFormat::RGBA5551, Masks::new(16, 0xF800, 0x07C0, 0x003E, 0x0001))]
    #[case(PixelFormat::ARGB2101010, Masks::new(32, 0x3FF00000, 0x000FFC00, 0x000003FF, 0xC0000000))]
    #[case(PixelFormat::INDEX8, Masks::new(8, 0, 0, 0, 0))]
    #[case(PixelFormat::INDEX1LSB, Masks::new(1, 0, 0, 0, 0))]
    fn to_masks_decodes_known_formats(#[case] format: PixelFormat, #[case] expected: Masks) {
        assert_eq!(format.to_masks().unwrap(), expected);
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn rgb24_masks_follow_byte_order() {
        assert_eq!(
            PixelFormat::RGB24.to_masks().unwrap(),
            Masks::new(24, 0x0000FF, 0x00FF00, 0xFF0000, 0)
        );
        assert_eq!(
            PixelFormat::BGR24.to_masks().unwrap(),
            Masks::new(24, 0xFF0000, 0x00FF00, 0x0000FF, 0)
        );
    }

    #[rstest]
    #[case(PixelFormat::YV12)]
    #[case(PixelFormat::NV21)]
    #[case(PixelFormat::YUY2)]
    #[case(PixelFormat::EXTERNAL_OES)]
    fn fourcc_has_no_masks(#[case] format: PixelFormat) {
        assert!(format.is_fourcc());
        assert_eq!(
            format.to_masks(),
            Err(PixelFormatError::UnsupportedFormat(format))
        );
    }

    #[test]
    fn packed_format_with_unknown_layout_is_rejected() {
        let bogus = define(PixelType::Packed16, PackedOrder::Xrgb as u8, PackedLayout::None, 16, 2);
        assert!(matches!(
            bogus.to_masks(),
            Err(PixelFormatError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn masks_round_trip_for_every_packed_and_array_format() {
        for &format in PixelFormat::ALL {
            if format.is_fourcc() || format.is_indexed() {
                continue;
            }
            let masks = format.to_masks().unwrap();
            let decoded = PixelFormat::from_masks(masks);
            assert_ne!(decoded, PixelFormat::UNKNOWN, "{format} decoded to UNKNOWN");
            assert_eq!(decoded.to_masks().unwrap(), masks, "{format} -> {decoded}");
        }
    }

    #[test]
    fn equivalence_classes_hold() {
        for class in EQUIVALENCE_CLASSES {
            assert_eq!(
                PixelFormat::from_masks(class.masks),
                class.decodes_to,
                "{}",
                class.description
            );
            for member in class.members {
                assert_eq!(member.to_masks().unwrap(), class.masks, "{}", class.description);
            }
        }
    }

    #[rstest]
    #[case(Masks::new(8, 0xE0, 0x1C, 0x03, 0), PixelFormat::RGB332)]
    #[case(Masks::new(12, 0x000F, 0x00F0, 0x0F00, 0), PixelFormat::XBGR4444)]
    #[case(Masks::new(15, 0x7C00, 0x03E0, 0x001F, 0), PixelFormat::XRGB1555)]
    #[case(Masks::new(16, 0x001F, 0x07E0, 0xF800, 0), PixelFormat::BGR565)]
    #[case(Masks::new(16, 0x0F00, 0x00F0, 0x000F, 0xF000), PixelFormat::ARGB4444)]
    #[case(Masks::new(32, 0, 0, 0, 0), PixelFormat::XRGB8888)]
    #[case(Masks::new(16, 0x1234, 0, 0, 0), PixelFormat::UNKNOWN)]
    #[case(Masks::new(7, 0, 0, 0, 0), PixelFormat::UNKNOWN)]
    #[case(Masks::new(8, 0xC0, 0x30, 0x0C, 0x03), PixelFormat::UNKNOWN)]
    fn from_masks_picks_canonical_format(#[case] masks: Masks, #[case] expected: PixelFormat) {
        assert_eq!(PixelFormat::from_masks(masks), expected);
    }

    #[test]
    fn aliases_share_ids() {
        assert_eq!(PixelFormat::RGB888, PixelFormat::XRGB8888);
        assert_eq!(PixelFormat::BGR555, PixelFormat::XBGR1555);
        assert_eq!(PixelFormat::from_name("rgba32"), Some(PixelFormat::RGBA32));
        assert_eq!(PixelFormat::from_name("Argb8888"), Some(PixelFormat::ARGB8888));
    }

    #[test]
    fn accessors_decode_fields() {
        let format = PixelFormat::ARGB8888;
        assert_eq!(format.pixel_type(), PixelType::Packed32);
        assert_eq!(format.packed_order(), Some(PackedOrder::Argb));
        assert_eq!(format.layout(), PackedLayout::L8888);
        assert_eq!(format.bits_per_pixel(), 32);
        assert_eq!(format.bytes_per_pixel(), 4);
        assert!(format.is_alpha());
        assert!(!PixelFormat::XRGB8888.is_alpha());
        assert_eq!(PixelFormat::INDEX4LSB.bitmap_order(), Some(BitmapOrder::Order4321));
        assert_eq!(PixelFormat::RGB24.array_order(), Some(ArrayOrder::Rgb));
        assert_eq!(PixelFormat::YUY2.bytes_per_pixel(), 2);
        assert_eq!(PixelFormat::NV12.bytes_per_pixel(), 1);
    }

    #[test]
    fn display_uses_names() {
        assert_eq!(PixelFormat::RGB565.to_string(), "RGB565");
        assert_eq!(PixelFormat::UNKNOWN.to_string(), "UNKNOWN");
        assert_eq!(PixelFormat::from_raw(0x1500_0000).to_string(), "0x15000000");
    }
}
