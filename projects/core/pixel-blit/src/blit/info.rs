use super::CopyFlags;
use crate::descriptor::PixelFormatDescriptor;
use crate::error::{BlitError, PixelFormatError};
use crate::palette_map::truecolor_entry_size;
use crate::rle::RleSurface;
use pixel_blit_common::color_8888::Color8888;

/// A rectangle of pixels inside a buffer, already clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Area {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Area {
    /// Creates an area.
    pub const fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        Self { x, y, w, h }
    }

    /// Whether the area covers no pixels.
    pub const fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// Everything a blit kernel reads or writes for one blit.
///
/// Source and destination areas have the same size unless
/// [`CopyFlags::NEAREST`] is set.
pub struct BlitInfo<'a> {
    pub(crate) src: &'a [u8],
    pub(crate) src_pitch: usize,
    pub(crate) src_area: Area,
    pub(crate) dst: &'a mut [u8],
    pub(crate) dst_pitch: usize,
    pub(crate) dst_area: Area,
    pub(crate) src_fmt: &'a PixelFormatDescriptor,
    pub(crate) dst_fmt: &'a PixelFormatDescriptor,
    /// Colours of the source palette; empty for non-indexed sources.
    pub(crate) src_palette: &'a [Color8888],
    /// Colours of the destination palette; empty for non-indexed destinations.
    pub(crate) dst_palette: &'a [Color8888],
    /// Remap table built by the blit map, if the pair needs one.
    pub(crate) table: Option<&'a [u8]>,
    pub(crate) rle: Option<&'a RleSurface>,
    pub(crate) flags: CopyFlags,
    pub(crate) colorkey: u32,
    pub(crate) modulation: Color8888,
}

/// Bytes spanned by the first `x + w` pixels of a row.
fn row_extent(format: &PixelFormatDescriptor, x: usize, w: usize) -> Option<usize> {
    let pixels = x.checked_add(w)?;
    if format.bits_per_pixel < 8 {
        Some(pixels.checked_mul(format.bits_per_pixel as usize)?.div_ceil(8))
    } else {
        pixels.checked_mul(format.bytes_per_pixel as usize)
    }
}

fn fits(len: usize, pitch: usize, format: &PixelFormatDescriptor, area: Area) -> bool {
    if area.is_empty() {
        return true;
    }
    let Some(extent) = row_extent(format, area.x, area.w) else {
        return false;
    };
    let last_row = (area.y + area.h - 1).checked_mul(pitch);
    extent <= pitch && matches!(last_row.and_then(|row| row.checked_add(extent)), Some(end) if end <= len)
}

impl<'a> BlitInfo<'a> {
    /// Whether the kernel expands source indices through a table of packed
    /// destination pixels (see [`truecolor_entry_size`]).
    fn expands_through_table(&self) -> bool {
        self.src_fmt.is_indexed()
            && self.dst_bpp() > 1
            && self.rle.is_none()
            && CopyFlags::COLORKEY.contains(self.flags.difference(CopyFlags::RLE_MASK))
    }

    /// Checks that both areas lie inside their buffers, and that indexed
    /// sources expanding to wider pixels carry a full remap table.
    pub(crate) fn validate(&self) -> Result<(), BlitError> {
        if self.expands_through_table() {
            let needed = 256 * truecolor_entry_size(self.dst_fmt.bytes_per_pixel);
            if !self.table.is_some_and(|table| table.len() >= needed) {
                return Err(PixelFormatError::InvalidParameter("remap table").into());
            }
        }
        let src_ok = self.rle.is_some()
            || fits(self.src.len(), self.src_pitch, self.src_fmt, self.src_area);
        let dst_ok = fits(self.dst.len(), self.dst_pitch, self.dst_fmt, self.dst_area);
        if !self.flags.contains(CopyFlags::NEAREST)
            && (self.src_area.w != self.dst_area.w || self.src_area.h != self.dst_area.h)
        {
            return Err(PixelFormatError::InvalidParameter("blit rectangle").into());
        }
        if src_ok && dst_ok {
            Ok(())
        } else {
            Err(PixelFormatError::InvalidParameter("blit rectangle").into())
        }
    }

    pub(crate) fn src_bpp(&self) -> usize {
        self.src_fmt.bytes_per_pixel as usize
    }

    pub(crate) fn dst_bpp(&self) -> usize {
        self.dst_fmt.bytes_per_pixel as usize
    }

    /// Calls `f` with each source row and the matching destination row.
    pub(crate) fn for_each_row(&mut self, mut f: impl FnMut(&[u8], &mut [u8])) {
        let (sbpp, dbpp) = (self.src_bpp(), self.dst_bpp());
        let (sa, da) = (self.src_area, self.dst_area);
        let (w, h) = (sa.w.min(da.w), sa.h.min(da.h));
        for row in 0..h {
            let s = (sa.y + row) * self.src_pitch + sa.x * sbpp;
            let d = (da.y + row) * self.dst_pitch + da.x * dbpp;
            f(&self.src[s..s + w * sbpp], &mut self.dst[d..d + w * dbpp]);
        }
    }

    /// Like [`Self::for_each_row`] for sources packing several pixels per
    /// byte. The source row starts at the row's first byte; the second
    /// argument is the index of the first pixel to read.
    pub(crate) fn for_each_bit_row(&mut self, mut f: impl FnMut(&[u8], usize, &mut [u8])) {
        let dbpp = self.dst_bpp();
        let (sa, da) = (self.src_area, self.dst_area);
        let (w, h) = (sa.w.min(da.w), sa.h.min(da.h));
        let Some(extent) = row_extent(self.src_fmt, sa.x, w) else {
            return;
        };
        for row in 0..h {
            let s = (sa.y + row) * self.src_pitch;
            let d = (da.y + row) * self.dst_pitch + da.x * dbpp;
            f(&self.src[s..s + extent], sa.x, &mut self.dst[d..d + w * dbpp]);
        }
    }

    /// Nearest-neighbour iteration in 16.16 fixed point.
    ///
    /// `f` receives the source row, the destination row and, for every
    /// destination column, the source column it samples.
    pub(crate) fn for_each_scaled_row(&mut self, mut f: impl FnMut(&[u8], &mut [u8], &[usize])) {
        let (sbpp, dbpp) = (self.src_bpp(), self.dst_bpp());
        let (sa, da) = (self.src_area, self.dst_area);
        if sa.is_empty() || da.is_empty() {
            return;
        }

        let incx = ((sa.w as u64) << 16) / da.w as u64;
        let incy = ((sa.h as u64) << 16) / da.h as u64;
        let columns: Vec<usize> = (0..da.w as u64)
            .map(|i| ((incx / 2 + i * incx) >> 16) as usize)
            .collect();

        let mut posy = incy / 2;
        for row in 0..da.h {
            let srcy = (posy >> 16) as usize;
            let s = (sa.y + srcy) * self.src_pitch + sa.x * sbpp;
            let d = (da.y + row) * self.dst_pitch + da.x * dbpp;
            f(
                &self.src[s..s + sa.w * sbpp],
                &mut self.dst[d..d + da.w * dbpp],
                &columns,
            );
            posy += incy;
        }
    }
}
