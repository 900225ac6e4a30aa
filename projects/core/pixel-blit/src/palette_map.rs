//! Lookup tables translating between palettes and packed pixels.
//!
//! - [`map_palette_to_palette`]: index to index, or identity when the palettes agree.
//! - [`map_palette_to_truecolor`]: index to packed destination pixel.
//! - [`map_truecolor_to_palette`]: 3-3-2 quantised colour to destination index.

use crate::descriptor::PixelFormatDescriptor;
use crate::error::PixelFormatError;
use crate::palette::dither_colors;
use pixel_blit_common::color_8888::Color8888;

/// Result of mapping one palette onto another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteMapping {
    /// Every source index means the same colour in the destination.
    Identity,
    /// 256-entry table from source index to destination index.
    Table(Vec<u8>),
}

impl PaletteMapping {
    /// Whether no translation is needed.
    pub fn is_identity(&self) -> bool {
        matches!(self, PaletteMapping::Identity)
    }

    /// The translation table, if any.
    pub fn table(&self) -> Option<&[u8]> {
        match self {
            PaletteMapping::Identity => None,
            PaletteMapping::Table(table) => Some(table),
        }
    }
}

/// Index of the palette entry closest to `color` (squared RGBA distance).
///
/// Ties go to the lowest index; an exact match ends the search.
pub fn find_color(palette: &[Color8888], color: Color8888) -> u8 {
    let mut smallest = u32::MAX;
    let mut pixel = 0;
    for (index, candidate) in palette.iter().enumerate() {
        let distance = candidate.distance_squared(&color);
        if distance < smallest {
            pixel = index;
            if distance == 0 {
                break;
            }
            smallest = distance;
        }
    }
    pixel as u8
}

fn zeroed_table(len: usize) -> Result<Vec<u8>, PixelFormatError> {
    let mut table = Vec::new();
    table
        .try_reserve_exact(len)
        .map_err(|_| PixelFormatError::OutOfMemory)?;
    table.resize(len, 0);
    Ok(table)
}

fn nearest_table(src: &[Color8888], dst: &[Color8888]) -> Result<Vec<u8>, PixelFormatError> {
    let mut table = zeroed_table(256)?;
    for (entry, color) in table.iter_mut().zip(src) {
        *entry = find_color(dst, *color);
    }
    Ok(table)
}

/// Maps source palette indices onto a destination palette.
///
/// Returns [`PaletteMapping::Identity`] when `src` is a prefix of `dst`.
/// Otherwise every source colour is matched to its nearest destination colour.
pub fn map_palette_to_palette(
    src: &[Color8888],
    dst: &[Color8888],
) -> Result<PaletteMapping, PixelFormatError> {
    if !src.is_empty() && src.len() <= dst.len() && src == &dst[..src.len()] {
        return Ok(PaletteMapping::Identity);
    }
    nearest_table(src, dst).map(PaletteMapping::Table)
}

/// Bytes per entry of a [`map_palette_to_truecolor`] table for a destination
/// of `bytes_per_pixel`. Three-byte pixels are padded to four.
pub const fn truecolor_entry_size(bytes_per_pixel: u8) -> usize {
    if bytes_per_pixel == 3 {
        4
    } else {
        bytes_per_pixel as usize
    }
}

/// Builds a 256-entry table of packed destination pixels for each source index.
///
/// Each colour is modulated by `modulation` (`c * m / 255`) before packing.
/// Entries are stored in native byte order; unused entries are zero.
pub fn map_palette_to_truecolor(
    src: &[Color8888],
    modulation: Color8888,
    dst: &PixelFormatDescriptor,
) -> Result<Vec<u8>, PixelFormatError> {
    let bytes = dst.bytes_per_pixel;
    let stride = truecolor_entry_size(bytes);
    if stride == 0 {
        return Err(PixelFormatError::InvalidParameter("destination format"));
    }

    let mut table = zeroed_table(256 * stride)?;
    for (entry, color) in table.chunks_exact_mut(stride).zip(src) {
        let c = color.modulate(modulation);
        let pixel = dst.r.pack(c.r) | dst.g.pack(c.g) | dst.b.pack(c.b) | dst.a.pack(c.a);
        crate::blit::pixel::store(entry, bytes as usize, pixel);
    }
    Ok(table)
}

/// Builds the table that quantises true colour onto `dst_palette`.
///
/// Source pixels are first reduced to a 3-3-2 index; the table maps that index
/// to the nearest destination entry. The result is always a table, even when
/// the destination happens to be the 3-3-2 ramp itself.
pub fn map_truecolor_to_palette(dst_palette: &[Color8888]) -> Result<Vec<u8>, PixelFormatError> {
    let ramp = dither_colors(8).ok_or(PixelFormatError::InvalidParameter("dither depth"))?;
    nearest_table(&ramp, dst_palette)
}
