//! Colour palettes for indexed formats.

use crate::error::PixelFormatError;
use pixel_blit_common::color_8888::Color8888;

/// An ordered list of colours plus a version counter.
///
/// The version changes on every write so blit maps can tell when their cached
/// lookup tables went stale. It is never zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color8888>,
    version: u32,
}

impl Palette {
    /// Creates a palette of `count` opaque white entries at version 1.
    ///
    /// # Errors
    ///
    /// - [`PixelFormatError::InvalidParameter`] if `count` is zero
    /// - [`PixelFormatError::OutOfMemory`] if the entries cannot be allocated
    pub fn new(count: usize) -> Result<Self, PixelFormatError> {
        if count == 0 {
            return Err(PixelFormatError::InvalidParameter("palette size"));
        }
        let mut colors = Vec::new();
        colors
            .try_reserve_exact(count)
            .map_err(|_| PixelFormatError::OutOfMemory)?;
        colors.resize(count, Color8888::OPAQUE_WHITE);
        Ok(Self { colors, version: 1 })
    }

    /// Number of entries.
    #[allow(clippy::len_without_is_empty)] // palettes always hold at least one colour
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// The palette entries.
    pub fn colors(&self) -> &[Color8888] {
        &self.colors
    }

    /// Current version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Writes `colors` starting at `first_index`.
    ///
    /// Entries that would land past the end are dropped. The in-range part is
    /// always applied, and the version advances once if anything was written.
    ///
    /// # Errors
    ///
    /// [`PixelFormatError::PartialWrite`] when the write was clamped.
    pub fn set_colors(
        &mut self,
        colors: &[Color8888],
        first_index: usize,
    ) -> Result<(), PixelFormatError> {
        let available = self.colors.len().saturating_sub(first_index);
        let written = colors.len().min(available);

        if written > 0 {
            self.colors[first_index..first_index + written].copy_from_slice(&colors[..written]);
            self.bump_version();
        }

        if written < colors.len() {
            return Err(PixelFormatError::PartialWrite {
                written,
                requested: colors.len(),
            });
        }
        Ok(())
    }

    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
        if self.version == 0 {
            self.version = 1;
        }
    }
}

/// The 256-entry 3-3-2 colour ramp used to quantise true colour to 8 bits.
///
/// Index bits `RRRGGGBB` are widened by bit replication. Only 8-bit ramps are
/// defined; other depths return [`None`].
pub fn dither_colors(bpp: u8) -> Option<[Color8888; 256]> {
    if bpp != 8 {
        return None;
    }

    let mut colors = [Color8888::OPAQUE_WHITE; 256];
    for (index, color) in colors.iter_mut().enumerate() {
        let i = index as u8;
        let mut r = i & 0xE0;
        r |= (r >> 3) | (r >> 6);
        let mut g = (i << 3) & 0xE0;
        g |= (g >> 3) | (g >> 6);
        let mut b = i & 0x03;
        b |= b << 2;
        b |= b << 4;
        *color = Color8888::opaque(r, g, b);
    }
    Some(colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    #[test]
    fn new_palette_is_opaque_white() {
        let palette = Palette::new(3).unwrap();
        assert_eq!(palette.colors(), &[Color8888::OPAQUE_WHITE; 3]);
        assert_eq!(palette.version(), 1);
    }

    #[test]
    fn empty_palette_is_rejected() {
        assert_eq!(
            Palette::new(0),
            Err(PixelFormatError::InvalidParameter("palette size"))
        );
    }

    #[test]
    fn clamped_write_applies_in_range_part() {
        let mut palette = Palette::new(256).unwrap();
        let colors = vec![Color8888::new(1, 2, 3, 4); 300];

        assert_eq!(
            palette.set_colors(&colors, 100),
            Err(PixelFormatError::PartialWrite {
                written: 156,
                requested: 300
            })
        );
        assert_eq!(palette.version(), 2);
        assert_eq!(palette.colors()[99], Color8888::OPAQUE_WHITE);
        assert!(palette.colors()[100..].iter().all(|c| *c == colors[0]));
    }

    #[rstest]
    #[case(4, 0)]
    #[case(7, 0)]
    #[case(100, 0)]
    fn write_past_end_changes_nothing(#[case] first_index: usize, #[case] written: usize) {
        let mut palette = Palette::new(4).unwrap();
        let result = palette.set_colors(&[Color8888::default()], first_index);
        assert_eq!(
            result,
            Err(PixelFormatError::PartialWrite {
                written,
                requested: 1
            })
        );
        assert_eq!(palette.version(), 1);
    }

    #[test]
    fn version_skips_zero() {
        let mut palette = Palette::new(1).unwrap();
        palette.version = u32::MAX;
        palette.set_colors(&[Color8888::default()], 0).unwrap();
        assert_eq!(palette.version(), 1);
    }

    #[rstest]
    #[case(0x00, Color8888::opaque(0, 0, 0))]
    #[case(0xFF, Color8888::opaque(255, 255, 255))]
    #[case(0xE0, Color8888::opaque(255, 0, 0))]
    #[case(0x1C, Color8888::opaque(0, 255, 0))]
    #[case(0x03, Color8888::opaque(0, 0, 255))]
    #[case(0x25, Color8888::opaque(0x24, 0x24, 0x55))]
    fn dither_ramp_replicates_bits(#[case] index: usize, #[case] expected: Color8888) {
        let colors = dither_colors(8).unwrap();
        assert_eq!(colors[index], expected);
    }

    #[test]
    fn dither_ramp_is_eight_bit_only() {
        assert!(dither_colors(4).is_none());
        assert!(dither_colors(16).is_none());
    }
}
