//! # Surface Blit Map
//!
//! A [`BlitMap`] remembers how one source surface was last mapped onto a
//! destination: whether the pixels can be copied verbatim, the palette remap
//! table, the chosen kernel and any run-length encoding of the source.
//!
//! The map is rebuilt when the destination surface, its format, the copy
//! flags, or the handle or version of either palette differ from what was
//! recorded. Surface setters call [`BlitMap::invalidate`] directly.

use crate::blit::{select_blit, BlitRequest, BlitSelection, BlitTier, CopyFlags};
use crate::context::{PaletteKey, PixelContext};
use crate::descriptor::PixelFormatDescriptor;
use crate::error::{BlitError, PixelFormatError};
use crate::palette_map::{map_palette_to_palette, map_palette_to_truecolor, map_truecolor_to_palette};
use crate::registry::FormatHandle;
use crate::rle::{self, RleKind, RleSurface};
use crate::surface::SurfaceId;
use log::{debug, trace};
use pixel_blit_common::color_8888::Color8888;

/// What a [`BlitMap`] was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MapKey {
    pub(crate) dst: SurfaceId,
    pub(crate) dst_format: FormatHandle,
    pub(crate) src_palette: PaletteKey,
    pub(crate) dst_palette: PaletteKey,
    pub(crate) flags: CopyFlags,
}

/// The source side of a mapping.
pub(crate) struct MapSource<'a> {
    pub(crate) format: FormatHandle,
    pub(crate) pixels: &'a [u8],
    pub(crate) pitch: usize,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) colorkey: u32,
    pub(crate) modulation: Color8888,
}

#[derive(Debug)]
pub(crate) struct Mapped {
    pub(crate) key: MapKey,
    pub(crate) identity: bool,
    pub(crate) table: Option<Vec<u8>>,
    pub(crate) selection: BlitSelection,
    pub(crate) rle: Option<RleSurface>,
    pub(crate) src_fmt: PixelFormatDescriptor,
    pub(crate) dst_fmt: PixelFormatDescriptor,
    pub(crate) src_colors: Vec<Color8888>,
    pub(crate) dst_colors: Vec<Color8888>,
}

/// Cached blit setup of a source surface.
#[derive(Debug, Default)]
pub struct BlitMap {
    mapped: Option<Mapped>,
}

impl BlitMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the table, kernel and encoded source.
    pub fn invalidate(&mut self) {
        if self.mapped.take().is_some() {
            trace!("Invalidated blit map");
        }
    }

    /// Whether a mapping is cached.
    pub fn is_valid(&self) -> bool {
        self.mapped.is_some()
    }

    /// Whether the cached mapping copies pixels unchanged.
    pub fn identity(&self) -> bool {
        self.mapped.as_ref().is_some_and(|m| m.identity)
    }

    /// The cached remap table.
    pub fn table(&self) -> Option<&[u8]> {
        self.mapped.as_ref().and_then(|m| m.table.as_deref())
    }

    /// The cached kernel.
    pub fn selection(&self) -> Option<BlitSelection> {
        self.mapped.as_ref().map(|m| m.selection)
    }

    /// The run-length encoded source, if the cached kernel uses one.
    pub fn rle(&self) -> Option<&RleSurface> {
        self.mapped.as_ref().and_then(|m| m.rle.as_ref())
    }

    /// The cached mapping if it was built for `key`.
    pub(crate) fn current(&self, key: &MapKey) -> Option<&Mapped> {
        self.mapped.as_ref().filter(|m| m.key == *key)
    }

    /// Returns the mapping for `key`, rebuilding it when stale.
    ///
    /// # Errors
    ///
    /// Whatever [`map_surface`] reports; the map is left invalid.
    pub(crate) fn prepare(
        &mut self,
        context: &PixelContext,
        source: &MapSource<'_>,
        key: MapKey,
    ) -> Result<&Mapped, BlitError> {
        if self.current(&key).is_none() {
            self.invalidate();
            let mapped = map_surface(context, source, key)?;
            self.mapped = Some(mapped);
        }
        self.mapped
            .as_ref()
            .ok_or(BlitError::Format(PixelFormatError::InvalidParameter("blit map")))
    }
}

/// Builds the remap table for a source and destination, then picks a kernel.
pub(crate) fn map_surface(context: &PixelContext, source: &MapSource<'_>, key: MapKey) -> Result<Mapped, BlitError> {
    let (src_fmt, src_colors) = context.snapshot(source.format)?;
    let (dst_fmt, dst_colors) = context.snapshot(key.dst_format)?;

    let (identity, table) = match (src_fmt.is_indexed(), dst_fmt.is_indexed()) {
        (true, true) => {
            let src = src_colors.as_deref().ok_or(PixelFormatError::InvalidParameter("source palette"))?;
            let dst = dst_colors.as_deref().ok_or(PixelFormatError::InvalidParameter("destination palette"))?;
            let mapping = map_palette_to_palette(src, dst)?;
            let same_depth = src_fmt.bits_per_pixel == dst_fmt.bits_per_pixel;
            (mapping.is_identity() && same_depth, mapping.table().map(<[u8]>::to_vec))
        }
        (true, false) => {
            let src = src_colors.as_deref().ok_or(PixelFormatError::InvalidParameter("source palette"))?;
            (false, Some(map_palette_to_truecolor(src, source.modulation, &dst_fmt)?))
        }
        (false, true) => {
            let dst = dst_colors.as_deref().ok_or(PixelFormatError::InvalidParameter("destination palette"))?;
            (false, Some(map_truecolor_to_palette(dst)?))
        }
        (false, false) => (src_fmt.format == dst_fmt.format, None),
    };

    let (selection, rle) = calculate_blit(context, source, &src_fmt, &dst_fmt, key.flags, identity)?;
    Ok(Mapped {
        key,
        identity,
        table,
        selection,
        rle,
        src_fmt,
        dst_fmt,
        src_colors: src_colors.unwrap_or_default(),
        dst_colors: dst_colors.unwrap_or_default(),
    })
}

/// Chooses a kernel: run-length encoding first when requested and possible,
/// then [`select_blit`].
pub(crate) fn calculate_blit(
    context: &PixelContext,
    source: &MapSource<'_>,
    src_fmt: &PixelFormatDescriptor,
    dst_fmt: &PixelFormatDescriptor,
    flags: CopyFlags,
    identity: bool,
) -> Result<(BlitSelection, Option<RleSurface>), BlitError> {
    let request = BlitRequest {
        src: src_fmt,
        dst: dst_fmt,
        flags,
        identity,
    };
    if dst_fmt.bits_per_pixel < 8 {
        return select_blit(&request, context.cpu_features()).map(|selection| (selection, None));
    }

    let degenerate = source.width == 0 || source.height == 0;
    if let Some(kind) = rle::plan(src_fmt, dst_fmt, flags, identity).filter(|_| !degenerate) {
        let encoded = match kind {
            RleKind::ColorKey => RleSurface::encode_colorkey(
                source.pixels,
                source.pitch,
                source.width,
                source.height,
                src_fmt,
                source.colorkey,
            ),
            RleKind::Alpha => {
                RleSurface::encode_alpha(source.pixels, source.pitch, source.width, source.height, src_fmt)
            }
        };
        match encoded {
            Ok(encoded) => {
                let name = match kind {
                    RleKind::ColorKey => "rle_colorkey",
                    RleKind::Alpha => "rle_alpha",
                };
                debug!(
                    "Selected {} blit {name} for {} -> {}",
                    BlitTier::Rle,
                    src_fmt.format,
                    dst_fmt.format
                );
                return Ok((BlitSelection::new(BlitTier::Rle, name, rle::blit_rle), Some(encoded)));
            }
            Err(err) => trace!("Run-length encoding skipped: {err}"),
        }
    }

    select_blit(&request, context.cpu_features()).map(|selection| (selection, None))
}
