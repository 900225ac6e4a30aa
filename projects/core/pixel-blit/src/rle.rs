//! # Run-length Encoded Sources
//!
//! Surfaces that are blitted many times with a colour key or per-pixel alpha
//! can be encoded once into rows of spans. Each span skips a number of
//! invisible pixels and then stores a run of visible ones, so blits touch
//! only the pixels that change the destination.
//!
//! - Colour-key encoding drops pixels equal to the key and copies the rest
//!   verbatim. The destination must share the source format.
//! - Alpha encoding drops fully transparent 32-bit pixels and blends the rest.

use crate::blit::pixel::{blend_over, fetch, pack_rgba, store, unpack_rgba};
use crate::blit::{BlitInfo, CopyFlags};
use crate::descriptor::PixelFormatDescriptor;
use crate::error::PixelFormatError;
use core::ops::Range;

/// How the visible pixels of an [`RleSurface`] are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RleKind {
    /// Pixels equal to the colour key were dropped; runs are copied.
    ColorKey,
    /// Pixels with zero alpha were dropped; runs are blended.
    Alpha,
}

/// Invisible pixels followed by a run of stored pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RleSpan {
    pub skip: usize,
    pub len: usize,
}

#[derive(Debug, Clone)]
struct RleRow {
    spans: Range<usize>,
    data: usize,
}

/// A run-length encoded copy of a surface's pixels.
#[derive(Debug, Clone)]
pub struct RleSurface {
    kind: RleKind,
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
    rows: Vec<RleRow>,
    spans: Vec<RleSpan>,
    data: Vec<u8>,
}

/// Which encoding, if any, a source with `flags` should get.
///
/// Encoding is skipped when the source has fewer than 8 bits per pixel or
/// when modulation, additive or multiplicative blending, or scaling is
/// requested. Colour-key encoding also needs `identity`, since runs are
/// copied without conversion.
pub(crate) fn plan(
    src: &PixelFormatDescriptor,
    dst: &PixelFormatDescriptor,
    flags: CopyFlags,
    identity: bool,
) -> Option<RleKind> {
    let src_alpha = src.a.is_present();
    if !flags.contains(CopyFlags::RLE_DESIRED) || src.bits_per_pixel < 8 {
        return None;
    }
    if !flags.contains(CopyFlags::COLORKEY) && !(flags.contains(CopyFlags::BLEND) && src_alpha) {
        return None;
    }
    // Runs are copied or blended with their own alpha only, so any surface
    // modulation has to go through the regular kernels.
    let unsupported = CopyFlags::MODULATE_MASK | CopyFlags::ADD | CopyFlags::MOD | CopyFlags::MUL | CopyFlags::NEAREST;
    if flags.intersects(unsupported) {
        return None;
    }

    if src_alpha && flags.contains(CopyFlags::BLEND) {
        let dst_ok = dst.bytes_per_pixel >= 2 && !dst.is_indexed() && !dst.is_wide();
        (src.bytes_per_pixel == 4 && dst_ok).then_some(RleKind::Alpha)
    } else {
        (identity && flags.contains(CopyFlags::COLORKEY)).then_some(RleKind::ColorKey)
    }
}

fn check_source(pixels: &[u8], pitch: usize, width: usize, height: usize, bpp: usize) -> Result<(), PixelFormatError> {
    let row = width.checked_mul(bpp);
    let last = height.checked_sub(1).and_then(|h| h.checked_mul(pitch));
    let fits = match (row, last) {
        (Some(row), Some(last)) => row <= pitch && last.checked_add(row).is_some_and(|end| end <= pixels.len()),
        _ => false,
    };
    if width == 0 || !fits || bpp == 0 {
        return Err(PixelFormatError::InvalidParameter("rle source"));
    }
    Ok(())
}

impl RleSurface {
    /// Encodes `pixels`, dropping every pixel whose colour bits equal `key`.
    /// Alpha bits are ignored when comparing.
    ///
    /// # Errors
    ///
    /// [`PixelFormatError::InvalidParameter`] if the image does not fit in
    /// `pixels` or the format is narrower than a byte.
    pub fn encode_colorkey(
        pixels: &[u8],
        pitch: usize,
        width: usize,
        height: usize,
        format: &PixelFormatDescriptor,
        key: u32,
    ) -> Result<Self, PixelFormatError> {
        let bpp = format.bytes_per_pixel as usize;
        if format.bits_per_pixel < 8 {
            return Err(PixelFormatError::InvalidParameter("rle source"));
        }
        check_source(pixels, pitch, width, height, bpp)?;
        let rgb_mask = !format.a.mask;
        let key = key & rgb_mask;
        Self::encode(RleKind::ColorKey, pixels, pitch, width, height, bpp, |pixel| {
            pixel & rgb_mask != key
        })
    }

    /// Encodes a 32-bit source with alpha, dropping fully transparent pixels.
    ///
    /// # Errors
    ///
    /// [`PixelFormatError::InvalidParameter`] if the format is not 32-bit
    /// with an alpha channel, or the image does not fit in `pixels`.
    pub fn encode_alpha(
        pixels: &[u8],
        pitch: usize,
        width: usize,
        height: usize,
        format: &PixelFormatDescriptor,
    ) -> Result<Self, PixelFormatError> {
        if format.bytes_per_pixel != 4 || !format.a.is_present() {
            return Err(PixelFormatError::InvalidParameter("rle source"));
        }
        check_source(pixels, pitch, width, height, 4)?;
        let alpha = format.a;
        Self::encode(RleKind::Alpha, pixels, pitch, width, height, 4, |pixel| {
            alpha.extract(pixel) != 0
        })
    }

    fn encode(
        kind: RleKind,
        pixels: &[u8],
        pitch: usize,
        width: usize,
        height: usize,
        bpp: usize,
        visible: impl Fn(u32) -> bool,
    ) -> Result<Self, PixelFormatError> {
        let mut rows = Vec::new();
        rows.try_reserve_exact(height)
            .map_err(|_| PixelFormatError::OutOfMemory)?;
        let mut spans = Vec::new();
        let mut data = Vec::new();

        for y in 0..height {
            let row = &pixels[y * pitch..y * pitch + width * bpp];
            let first_span = spans.len();
            let row_data = data.len();
            let mut x = 0;
            let mut last_end = 0;
            while x < width {
                while x < width && !visible(fetch(&row[x * bpp..], bpp)) {
                    x += 1;
                }
                let start = x;
                while x < width && visible(fetch(&row[x * bpp..], bpp)) {
                    x += 1;
                }
                if x > start {
                    spans.try_reserve(1).map_err(|_| PixelFormatError::OutOfMemory)?;
                    data.try_reserve((x - start) * bpp)
                        .map_err(|_| PixelFormatError::OutOfMemory)?;
                    spans.push(RleSpan {
                        skip: start - last_end,
                        len: x - start,
                    });
                    data.extend_from_slice(&row[start * bpp..x * bpp]);
                    last_end = x;
                }
            }
            rows.push(RleRow {
                spans: first_span..spans.len(),
                data: row_data,
            });
        }

        Ok(Self {
            kind,
            width,
            height,
            bytes_per_pixel: bpp,
            rows,
            spans,
            data,
        })
    }

    pub fn kind(&self) -> RleKind {
        self.kind
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes of stored pixel data.
    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }

    /// Spans of row `y`, or `None` past the last row.
    pub fn row_spans(&self, y: usize) -> Option<&[RleSpan]> {
        self.rows.get(y).map(|row| &self.spans[row.spans.clone()])
    }

    /// Writes the visible pixels inside `info`'s source area to its
    /// destination area.
    ///
    /// The source bytes of `info` are not read. Colour-key surfaces need a
    /// destination with the same pixel size; other destinations are left
    /// untouched.
    pub fn blit(&self, info: &mut BlitInfo<'_>) {
        let dbpp = info.dst_bpp();
        let bpp = self.bytes_per_pixel;
        if self.kind == RleKind::ColorKey && dbpp != bpp {
            return;
        }
        let (sa, da) = (info.src_area, info.dst_area);
        let (w, h) = (sa.w.min(da.w), sa.h.min(da.h));
        let (src_fmt, dst_fmt) = (info.src_fmt, info.dst_fmt);

        for row in 0..h {
            let Some(encoded) = self.rows.get(sa.y + row) else {
                break;
            };
            let dst_row = (da.y + row) * info.dst_pitch;
            let mut x = 0;
            let mut cursor = encoded.data;
            for span in &self.spans[encoded.spans.clone()] {
                x += span.skip;
                let start = x.max(sa.x);
                let end = (x + span.len).min(sa.x + w);
                if start < end {
                    let src = &self.data[cursor + (start - x) * bpp..cursor + (end - x) * bpp];
                    let offset = dst_row + (da.x + start - sa.x) * dbpp;
                    let dst = &mut info.dst[offset..offset + (end - start) * dbpp];
                    match self.kind {
                        RleKind::ColorKey => dst.copy_from_slice(src),
                        RleKind::Alpha => {
                            for (s, d) in src.chunks_exact(bpp).zip(dst.chunks_exact_mut(dbpp)) {
                                let color = unpack_rgba(src_fmt, fetch(s, bpp));
                                let under = unpack_rgba(dst_fmt, fetch(d, dbpp));
                                store(d, dbpp, pack_rgba(dst_fmt, blend_over(color, under, color.a)));
                            }
                        }
                    }
                }
                cursor += span.len * bpp;
                x += span.len;
            }
        }
    }
}

/// Kernel for RLE sources; a no-op when the blit carries no encoded surface.
pub(crate) fn blit_rle(info: &mut BlitInfo<'_>) {
    if let Some(rle) = info.rle {
        rle.blit(info);
    }
}
