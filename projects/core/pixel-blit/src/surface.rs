//! # Surfaces
//!
//! A [`Surface`] is an owned pixel buffer in one registered format, plus the
//! state that decides how it is drawn onto other surfaces: colour key,
//! colour and alpha modulation, blend mode and run-length encoding. Each
//! surface keeps a [`BlitMap`] describing how it was last mapped onto a
//! destination.

use crate::blit::pixel::{fetch, store};
use crate::blit::{Area, BlitInfo, BlitSelection, CopyFlags};
use crate::blit_map::{BlitMap, MapKey, MapSource};
use crate::context::PixelContext;
use crate::error::{BlitError, PixelFormatError};
use crate::format::{BitmapOrder, PixelFormat};
use crate::registry::{FormatHandle, PaletteHandle};
use derive_enum_all_values::AllValues;
use log::warn;
use pixel_blit_common::color_8888::Color8888;
use std::sync::Arc;

/// Identifies a surface within its context. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// A rectangle in surface coordinates. May extend outside the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Whether the rectangle covers no pixels.
    pub const fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// The overlap of two rectangles, or [`None`] if they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x) as i64;
        let y0 = self.y.max(other.y) as i64;
        let x1 = (self.x as i64 + self.w as i64).min(other.x as i64 + other.w as i64);
        let y1 = (self.y as i64 + self.h as i64).min(other.y as i64 + other.h as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::new(x0 as i32, y0 as i32, (x1 - x0) as i32, (y1 - y0) as i32))
    }
}

/// How source pixels combine with the destination.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, AllValues)]
pub enum BlendMode {
    /// Overwrite the destination.
    #[default]
    None,
    /// Alpha blending.
    Blend,
    /// Additive blending.
    Add,
    /// Colour modulation.
    Mod,
    /// Colour multiplication.
    Mul,
}

impl BlendMode {
    /// The copy flag implementing this mode.
    pub const fn copy_flags(self) -> CopyFlags {
        match self {
            BlendMode::None => CopyFlags::empty(),
            BlendMode::Blend => CopyFlags::BLEND,
            BlendMode::Add => CopyFlags::ADD,
            BlendMode::Mod => CopyFlags::MOD,
            BlendMode::Mul => CopyFlags::MUL,
        }
    }

    /// The mode named by the blend flags in `flags`; `BLEND` wins over the others.
    pub fn from_copy_flags(flags: CopyFlags) -> Self {
        [BlendMode::Blend, BlendMode::Add, BlendMode::Mod, BlendMode::Mul]
            .into_iter()
            .find(|mode| flags.contains(mode.copy_flags()))
            .unwrap_or(BlendMode::None)
    }

    pub const fn name(self) -> &'static str {
        match self {
            BlendMode::None => "none",
            BlendMode::Blend => "blend",
            BlendMode::Add => "add",
            BlendMode::Mod => "mod",
            BlendMode::Mul => "mul",
        }
    }

    /// Parses a name produced by [`Self::name`], ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all_values()
            .iter()
            .copied()
            .find(|mode| mode.name().eq_ignore_ascii_case(name))
    }
}

impl core::fmt::Display for BlendMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// An owned image in a registered pixel format.
pub struct Surface {
    id: SurfaceId,
    context: Arc<PixelContext>,
    format: FormatHandle,
    pixel_format: PixelFormat,
    bits_per_pixel: u8,
    bytes_per_pixel: usize,
    width: usize,
    height: usize,
    pitch: usize,
    pixels: Vec<u8>,
    color_key: Option<u32>,
    color_mod: [u8; 3],
    alpha_mod: u8,
    blend_mode: BlendMode,
    rle: bool,
    clip: Rect,
    map: BlitMap,
}

impl core::fmt::Debug for Surface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.id)
            .field("format", &self.pixel_format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pitch", &self.pitch)
            .field("flags", &self.copy_flags())
            .finish_non_exhaustive()
    }
}

/// Bytes per row: bit-packed formats round up to a byte, then every row is
/// padded to a multiple of 4.
fn calculate_pitch(width: usize, bits_per_pixel: u8, bytes_per_pixel: u8) -> Option<usize> {
    let row = if bits_per_pixel < 8 {
        width.checked_mul(bits_per_pixel as usize)?.div_ceil(8)
    } else {
        width.checked_mul(bytes_per_pixel as usize)?
    };
    row.checked_add(3).map(|padded| padded & !3)
}

impl Surface {
    /// Creates a zeroed surface.
    ///
    /// Indexed surfaces get their own palette with `2^bpp` entries (black and
    /// white for 1-bit surfaces, opaque white otherwise). Surfaces whose format
    /// has alpha default to [`BlendMode::Blend`].
    ///
    /// # Errors
    ///
    /// - [`BlitError::SurfaceTooLarge`] if the pixel buffer size overflows
    /// - [`BlitError::Format`] if the format cannot be registered or the
    ///   buffer cannot be allocated
    pub fn new(context: &Arc<PixelContext>, width: usize, height: usize, format: PixelFormat) -> Result<Self, BlitError> {
        let handle = context.acquire_format(format)?;
        Self::with_handle(context, width, height, handle).inspect_err(|_| {
            if let Err(err) = context.release_format(handle) {
                warn!("Could not release format {format} after failed surface creation: {err}");
            }
        })
    }

    fn with_handle(
        context: &Arc<PixelContext>,
        width: usize,
        height: usize,
        format: FormatHandle,
    ) -> Result<Self, BlitError> {
        let descriptor = context.format(format)?;
        let pitch = calculate_pitch(width, descriptor.bits_per_pixel, descriptor.bytes_per_pixel)
            .ok_or(BlitError::SurfaceTooLarge)?;
        let len = pitch.checked_mul(height).ok_or(BlitError::SurfaceTooLarge)?;
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(BlitError::SurfaceTooLarge);
        }

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| PixelFormatError::OutOfMemory)?;
        pixels.resize(len, 0);

        if descriptor.is_indexed() {
            let palette = context.allocate_palette(1usize << descriptor.bits_per_pixel)?;
            if descriptor.bits_per_pixel == 1 {
                context.set_palette_colors(palette, &[Color8888::OPAQUE_WHITE, Color8888::opaque(0, 0, 0)], 0)?;
            }
            let bound = context.bind_palette(format, Some(palette));
            context.release_palette(palette)?;
            bound?;
        }

        let blend_mode = if descriptor.a.is_present() {
            BlendMode::Blend
        } else {
            BlendMode::None
        };
        Ok(Self {
            id: SurfaceId::from_raw(context.next_surface_id()),
            context: Arc::clone(context),
            format,
            pixel_format: descriptor.format,
            bits_per_pixel: descriptor.bits_per_pixel,
            bytes_per_pixel: descriptor.bytes_per_pixel as usize,
            width,
            height,
            pitch,
            pixels,
            color_key: None,
            color_mod: [255; 3],
            alpha_mod: 255,
            blend_mode,
            rle: false,
            clip: Rect::new(0, 0, width as i32, height as i32),
            map: BlitMap::new(),
        })
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn context(&self) -> &Arc<PixelContext> {
        &self.context
    }

    /// Handle of the surface's descriptor.
    pub fn format(&self) -> FormatHandle {
        self.format
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes between the starts of consecutive rows.
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable pixel access. Drops any run-length encoding built from the
    /// old contents.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        self.drop_stale_encoding();
        &mut self.pixels
    }

    /// The whole surface as a rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Restricts blits onto this surface to `rect`, or removes the restriction.
    /// Returns whether the clip rectangle overlaps the surface.
    pub fn set_clip_rect(&mut self, rect: Option<Rect>) -> bool {
        let bounds = self.bounds();
        match rect {
            None => {
                self.clip = bounds;
                true
            }
            Some(rect) => match rect.intersect(&bounds) {
                Some(clip) => {
                    self.clip = clip;
                    true
                }
                None => {
                    self.clip = Rect::new(0, 0, 0, 0);
                    false
                }
            },
        }
    }

    pub fn clip_rect(&self) -> Rect {
        self.clip
    }

    /// Pixels equal to `key` (ignoring alpha bits) are skipped when blitting.
    pub fn set_color_key(&mut self, key: Option<u32>) {
        if self.color_key != key {
            self.color_key = key;
            self.map.invalidate();
        }
    }

    pub fn color_key(&self) -> Option<u32> {
        self.color_key
    }

    /// Multiplies source colour channels by `r, g, b / 255` when blitting.
    pub fn set_color_mod(&mut self, r: u8, g: u8, b: u8) {
        if self.color_mod != [r, g, b] {
            self.color_mod = [r, g, b];
            self.map.invalidate();
        }
    }

    pub fn color_mod(&self) -> (u8, u8, u8) {
        let [r, g, b] = self.color_mod;
        (r, g, b)
    }

    /// Multiplies source alpha by `alpha / 255` when blitting.
    pub fn set_alpha_mod(&mut self, alpha: u8) {
        if self.alpha_mod != alpha {
            self.alpha_mod = alpha;
            self.map.invalidate();
        }
    }

    pub fn alpha_mod(&self) -> u8 {
        self.alpha_mod
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        if self.blend_mode != mode {
            self.blend_mode = mode;
            self.map.invalidate();
        }
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Requests run-length encoding of this surface when it is blitted.
    pub fn set_rle(&mut self, enabled: bool) {
        if self.rle != enabled {
            self.rle = enabled;
            self.map.invalidate();
        }
    }

    /// Whether the last blit used a run-length encoded copy of this surface.
    pub fn has_rle(&self) -> bool {
        self.map.rle().is_some()
    }

    /// Binds a palette to this surface's indexed format.
    ///
    /// # Errors
    ///
    /// - [`PixelFormatError::InvalidParameter`] for non-indexed surfaces
    /// - [`PixelFormatError::IncompatiblePalette`] if the palette is too large
    pub fn set_palette(&mut self, palette: Option<PaletteHandle>) -> Result<(), BlitError> {
        if !self.pixel_format.is_indexed() {
            return Err(PixelFormatError::InvalidParameter("palette on non-indexed surface").into());
        }
        self.context.bind_palette(self.format, palette)?;
        self.map.invalidate();
        Ok(())
    }

    pub fn palette(&self) -> Option<PaletteHandle> {
        self.context.format(self.format).ok().and_then(|d| d.palette)
    }

    /// Flags used when this surface is the source of a blit.
    pub fn copy_flags(&self) -> CopyFlags {
        let mut flags = self.blend_mode.copy_flags();
        flags.set(CopyFlags::COLORKEY, self.color_key.is_some());
        flags.set(CopyFlags::MODULATE_COLOR, self.color_mod != [255; 3]);
        flags.set(CopyFlags::MODULATE_ALPHA, self.alpha_mod != 255);
        flags.set(CopyFlags::RLE_DESIRED, self.rle);
        flags
    }

    /// The kernel cached by the last successful blit from this surface.
    pub fn blit_selection(&self) -> Option<BlitSelection> {
        self.map.selection()
    }

    pub fn blit_map(&self) -> &BlitMap {
        &self.map
    }

    fn modulation(&self) -> Color8888 {
        let [r, g, b] = self.color_mod;
        Color8888::new(r, g, b, self.alpha_mod)
    }

    fn drop_stale_encoding(&mut self) {
        if self.map.rle().is_some() {
            self.map.invalidate();
        }
    }

    /// Copies `src_rect` of this surface to `dst` at the position of
    /// `dst_rect` (its size is ignored).
    ///
    /// [`None`] rectangles mean the whole source and the destination origin.
    /// Both rectangles are clipped to the source bounds and the destination
    /// clip rectangle; a blit clipped to nothing succeeds without drawing.
    ///
    /// # Errors
    ///
    /// - [`BlitError::UnsupportedBlit`] if no kernel handles the combination
    /// - [`BlitError::Format`] if the surfaces belong to different contexts or
    ///   a palette is missing
    pub fn blit(&mut self, src_rect: Option<Rect>, dst: &mut Surface, dst_rect: Option<Rect>) -> Result<(), BlitError> {
        let src = src_rect.unwrap_or_else(|| self.bounds());
        let (mut sx, mut sy) = (src.x as i64, src.y as i64);
        let (mut w, mut h) = (src.w as i64, src.h as i64);
        let (mut dx, mut dy) = dst_rect.map_or((0, 0), |r| (r.x as i64, r.y as i64));

        if sx < 0 {
            w += sx;
            dx -= sx;
            sx = 0;
        }
        w = w.min(self.width as i64 - sx);
        if sy < 0 {
            h += sy;
            dy -= sy;
            sy = 0;
        }
        h = h.min(self.height as i64 - sy);

        let clip = dst.clip;
        let over = clip.x as i64 - dx;
        if over > 0 {
            w -= over;
            dx += over;
            sx += over;
        }
        let over = dx + w - (clip.x as i64 + clip.w as i64);
        if over > 0 {
            w -= over;
        }
        let over = clip.y as i64 - dy;
        if over > 0 {
            h -= over;
            dy += over;
            sy += over;
        }
        let over = dy + h - (clip.y as i64 + clip.h as i64);
        if over > 0 {
            h -= over;
        }

        if w <= 0 || h <= 0 {
            return Ok(());
        }
        let (w, h) = (w as usize, h as usize);
        let src_area = Area::new(sx as usize, sy as usize, w, h);
        let dst_area = Area::new(dx as usize, dy as usize, w, h);
        self.lower_blit(src_area, dst, dst_area, false)
    }

    /// Stretches `src_rect` of this surface over `dst_rect` of `dst` with
    /// nearest-neighbour sampling.
    ///
    /// [`None`] rectangles mean the whole surface. Equal sizes fall back to
    /// [`Self::blit`].
    pub fn blit_scaled(
        &mut self,
        src_rect: Option<Rect>,
        dst: &mut Surface,
        dst_rect: Option<Rect>,
    ) -> Result<(), BlitError> {
        let src = src_rect.unwrap_or_else(|| self.bounds());
        let target = dst_rect.unwrap_or_else(|| dst.bounds());
        if src.is_empty() || target.is_empty() {
            return Ok(());
        }
        if src.w == target.w && src.h == target.h {
            return self.blit(Some(src), dst, Some(target));
        }

        let clip = dst.clip;
        let x = clip_scaled_axis(
            (src.x as i64, src.w as i64, self.width as i64),
            (target.x as i64, target.w as i64),
            (clip.x as i64, clip.w as i64),
        );
        let y = clip_scaled_axis(
            (src.y as i64, src.h as i64, self.height as i64),
            (target.y as i64, target.h as i64),
            (clip.y as i64, clip.h as i64),
        );
        let (Some((sx, sw, dx, dw)), Some((sy, sh, dy, dh))) = (x, y) else {
            return Ok(());
        };
        let src_area = Area::new(sx, sy, sw, sh);
        let dst_area = Area::new(dx, dy, dw, dh);
        self.lower_blit(src_area, dst, dst_area, true)
    }

    fn lower_blit(&mut self, src_area: Area, dst: &mut Surface, dst_area: Area, scaled: bool) -> Result<(), BlitError> {
        if !Arc::ptr_eq(&self.context, &dst.context) {
            return Err(PixelFormatError::InvalidParameter("surface context").into());
        }

        let mut flags = self.copy_flags();
        flags.set(CopyFlags::NEAREST, scaled);
        let colorkey = self.color_key.unwrap_or(0);
        let modulation = self.modulation();
        let (src_palette, dst_palette) = self.context.palette_keys(self.format, dst.format)?;
        let key = MapKey {
            dst: dst.id,
            dst_format: dst.format,
            src_palette,
            dst_palette,
            flags,
        };
        let source = MapSource {
            format: self.format,
            pixels: &self.pixels,
            pitch: self.pitch,
            width: self.width,
            height: self.height,
            colorkey,
            modulation,
        };
        let mapped = self.map.prepare(&self.context, &source, key)?;

        let mut info = BlitInfo {
            src: &self.pixels,
            src_pitch: self.pitch,
            src_area,
            dst: &mut dst.pixels,
            dst_pitch: dst.pitch,
            dst_area,
            src_fmt: &mapped.src_fmt,
            dst_fmt: &mapped.dst_fmt,
            src_palette: &mapped.src_colors,
            dst_palette: &mapped.dst_colors,
            table: mapped.table.as_deref(),
            rle: mapped.rle.as_ref(),
            flags,
            colorkey,
            modulation,
        };
        info.validate()?;
        (mapped.selection.func)(&mut info);
        dst.drop_stale_encoding();
        Ok(())
    }

    /// Sets every pixel of `rect` (clipped to the clip rectangle) to `pixel`.
    ///
    /// # Errors
    ///
    /// [`PixelFormatError::InvalidParameter`] for formats below 8 bits per pixel.
    pub fn fill_rect(&mut self, rect: Option<Rect>, pixel: u32) -> Result<(), BlitError> {
        if self.bits_per_pixel < 8 {
            return Err(PixelFormatError::InvalidParameter("fill on sub-byte format").into());
        }
        let area = match rect {
            Some(rect) => rect.intersect(&self.clip),
            None => Some(self.clip).filter(|clip| !clip.is_empty()),
        };
        let Some(area) = area else {
            return Ok(());
        };

        self.drop_stale_encoding();
        let bpp = self.bytes_per_pixel;
        for y in area.y as usize..(area.y + area.h) as usize {
            let row = &mut self.pixels[y * self.pitch..];
            for x in area.x as usize..(area.x + area.w) as usize {
                store(&mut row[x * bpp..], bpp, pixel);
            }
        }
        Ok(())
    }

    /// Packs a colour in this surface's format. See [`PixelContext::map_rgba`].
    pub fn map_rgba(&self, r: u8, g: u8, b: u8, a: u8) -> Result<u32, BlitError> {
        Ok(self.context.map_rgba(self.format, r, g, b, a)?)
    }

    /// Raw pixel value at `(x, y)`, or [`None`] outside the surface.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let row = &self.pixels[y * self.pitch..];
        if self.bits_per_pixel < 8 {
            let (byte, shift, mask) = self.bit_position(x);
            return Some(((row[byte] >> shift) & mask) as u32);
        }
        Some(fetch(&row[x * self.bytes_per_pixel..], self.bytes_per_pixel))
    }

    /// Colour of the pixel at `(x, y)`.
    pub fn read_rgba(&self, x: usize, y: usize) -> Result<Color8888, BlitError> {
        let pixel = self
            .read_pixel(x, y)
            .ok_or(PixelFormatError::InvalidParameter("pixel position"))?;
        Ok(self.context.get_rgba(self.format, pixel)?)
    }

    /// Stores a raw pixel value at `(x, y)`.
    pub fn write_pixel(&mut self, x: usize, y: usize, value: u32) -> Result<(), BlitError> {
        if x >= self.width || y >= self.height {
            return Err(PixelFormatError::InvalidParameter("pixel position").into());
        }
        self.drop_stale_encoding();
        let offset = y * self.pitch;
        if self.bits_per_pixel < 8 {
            let (byte, shift, mask) = self.bit_position(x);
            let slot = &mut self.pixels[offset + byte];
            *slot = (*slot & !(mask << shift)) | (((value as u8) & mask) << shift);
            return Ok(());
        }
        let bpp = self.bytes_per_pixel;
        store(&mut self.pixels[offset + x * bpp..], bpp, value);
        Ok(())
    }

    /// Byte index, shift and value mask of pixel `x` in a bit-packed row.
    fn bit_position(&self, x: usize) -> (usize, u8, u8) {
        let bits = self.bits_per_pixel as usize;
        let per_byte = 8 / bits;
        let slot = x % per_byte;
        let shift = if self.pixel_format.bitmap_order() == Some(BitmapOrder::Order4321) {
            bits * slot
        } else {
            8 - bits * (slot + 1)
        };
        (x / per_byte, shift as u8, ((1u16 << bits) - 1) as u8)
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        if let Err(err) = self.context.release_format(self.format) {
            warn!("Surface {:?} could not release its format: {err}", self.id);
        }
    }
}

/// Clips one axis of a scaled blit.
///
/// Takes `(start, len, limit)` of the source, `(start, len)` of the target
/// and `(start, len)` of the destination clip. Returns the clipped source
/// start and length followed by the destination start and length.
fn clip_scaled_axis(src: (i64, i64, i64), dst: (i64, i64), clip: (i64, i64)) -> Option<(usize, usize, usize, usize)> {
    let (s0, sw, limit) = src;
    let (d0, dw) = dst;
    let (c0, cw) = clip;

    let (mut s_start, mut s_end) = (s0, s0 + sw);
    let (mut d_start, mut d_end) = (d0, d0 + dw);
    if s_start < 0 {
        d_start = d0 + (-s0 * dw) / sw;
        s_start = 0;
    }
    if s_end > limit {
        d_end = d0 + ((limit - s0) * dw) / sw;
        s_end = limit;
    }
    if d_start < c0 {
        s_start = s_start.max(s0 + ((c0 - d0) * sw) / dw);
        d_start = c0;
    }
    if d_end > c0 + cw {
        s_end = s_end.min(s0 + ((c0 + cw - d0) * sw + dw - 1) / dw);
        d_end = c0 + cw;
    }

    if s_end <= s_start || d_end <= d_start {
        return None;
    }
    Some((
        s_start as usize,
        (s_end - s_start) as usize,
        d_start as usize,
        (d_end - d_start) as usize,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blit::BlitTier;
    use crate::context::ContextOptions;
    use crate::cpu::CpuFeatures;
    use crate::test_prelude::*;

    fn context() -> Arc<PixelContext> {
        Arc::new(PixelContext::with_options(
            ContextOptions::new().with_cpu_features(CpuFeatures::empty()),
        ))
    }

    #[rstest]
    #[case(Rect::new(0, 0, 4, 4), Rect::new(2, 2, 4, 4), Some(Rect::new(2, 2, 2, 2)))]
    #[case(Rect::new(0, 0, 4, 4), Rect::new(4, 0, 4, 4), None)]
    #[case(Rect::new(-3, -3, 4, 4), Rect::new(0, 0, 8, 8), Some(Rect::new(0, 0, 1, 1)))]
    #[case(Rect::new(0, 0, 0, 4), Rect::new(0, 0, 8, 8), None)]
    fn intersects_rectangles(#[case] a: Rect, #[case] b: Rect, #[case] expected: Option<Rect>) {
        assert_eq!(a.intersect(&b), expected);
    }

    #[rstest]
    #[case(3, 1, 1, 4)]
    #[case(3, 4, 1, 4)]
    #[case(9, 1, 1, 4)]
    #[case(3, 15, 2, 8)]
    #[case(3, 24, 3, 12)]
    #[case(3, 32, 4, 12)]
    fn pitch_is_padded_to_four_bytes(#[case] width: usize, #[case] bits: u8, #[case] bytes: u8, #[case] pitch: usize) {
        assert_eq!(calculate_pitch(width, bits, bytes), Some(pitch));
    }

    #[test]
    fn blend_mode_round_trips_through_flags() {
        for &mode in BlendMode::all_values() {
            assert_eq!(BlendMode::from_copy_flags(mode.copy_flags()), mode);
            assert_eq!(BlendMode::from_name(mode.name()), Some(mode));
        }
        assert_eq!(BlendMode::from_name("BLEND"), Some(BlendMode::Blend));
        assert_eq!(BlendMode::from_name("screen"), None);
    }

    #[test]
    fn new_surfaces_pick_defaults_from_format() {
        let context = context();
        let argb = Surface::new(&context, 2, 2, PixelFormat::ARGB8888).unwrap();
        assert_eq!(argb.blend_mode(), BlendMode::Blend);
        assert_eq!(argb.copy_flags(), CopyFlags::BLEND);

        let bitmap = Surface::new(&context, 9, 2, PixelFormat::INDEX1MSB).unwrap();
        assert_eq!(bitmap.pitch(), 4);
        let palette = bitmap.palette().unwrap();
        assert_eq!(
            context.palette_colors(palette).unwrap(),
            vec![Color8888::OPAQUE_WHITE, Color8888::opaque(0, 0, 0)]
        );
        assert_eq!(context.live_palettes(), 1);
        drop(bitmap);
        assert_eq!(context.live_palettes(), 0);
    }

    #[test]
    fn setters_update_flags_and_invalidate() {
        let context = context();
        let mut src = Surface::new(&context, 2, 2, PixelFormat::XRGB8888).unwrap();
        let mut dst = Surface::new(&context, 2, 2, PixelFormat::XRGB8888).unwrap();
        src.blit(None, &mut dst, None).unwrap();
        assert_eq!(src.blit_selection().map(|s| s.tier), Some(BlitTier::Copy));

        src.set_color_key(Some(0));
        src.set_color_mod(1, 2, 3);
        src.set_alpha_mod(4);
        src.set_blend_mode(BlendMode::Add);
        src.set_rle(true);
        assert!(src.blit_selection().is_none());
        assert_eq!(
            src.copy_flags(),
            CopyFlags::COLORKEY
                | CopyFlags::MODULATE_COLOR
                | CopyFlags::MODULATE_ALPHA
                | CopyFlags::ADD
                | CopyFlags::RLE_DESIRED
        );
    }

    #[test]
    fn blit_clips_to_source_and_destination() {
        let context = context();
        let mut src = Surface::new(&context, 4, 4, PixelFormat::RGB565).unwrap();
        let mut dst = Surface::new(&context, 4, 4, PixelFormat::RGB565).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                src.write_pixel(x, y, (y * 4 + x + 1) as u32).unwrap();
            }
        }
        dst.set_clip_rect(Some(Rect::new(1, 1, 2, 2)));

        src.blit(Some(Rect::new(-1, 0, 4, 4)), &mut dst, Some(Rect::new(0, 0, 0, 0)))
            .unwrap();
        let rows: Vec<Vec<u32>> = (0..4)
            .map(|y| (0..4).map(|x| dst.read_pixel(x, y).unwrap()).collect())
            .collect();
        assert_eq!(
            rows,
            vec![vec![0, 0, 0, 0], vec![0, 5, 6, 0], vec![0, 9, 10, 0], vec![0, 0, 0, 0]]
        );
    }

    #[test]
    fn blit_outside_clip_draws_nothing() {
        let context = context();
        let mut src = Surface::new(&context, 2, 2, PixelFormat::RGB565).unwrap();
        let mut dst = Surface::new(&context, 2, 2, PixelFormat::RGB565).unwrap();
        src.fill_rect(None, 0xFFFF).unwrap();
        src.blit(None, &mut dst, Some(Rect::new(5, 5, 0, 0))).unwrap();
        assert!(dst.pixels().iter().all(|&b| b == 0));
        assert!(src.blit_selection().is_none());
    }

    #[test]
    fn surfaces_from_different_contexts_do_not_mix() {
        let mut src = Surface::new(&context(), 1, 1, PixelFormat::RGB565).unwrap();
        let mut dst = Surface::new(&context(), 1, 1, PixelFormat::RGB565).unwrap();
        assert_eq!(
            src.blit(None, &mut dst, None),
            Err(BlitError::Format(PixelFormatError::InvalidParameter("surface context")))
        );
    }

    #[test]
    fn fill_rect_respects_clip() {
        let context = context();
        let mut surface = Surface::new(&context, 3, 1, PixelFormat::RGB24).unwrap();
        surface.set_clip_rect(Some(Rect::new(1, 0, 5, 5)));
        surface.fill_rect(None, 0x0012_3456).unwrap();
        assert_eq!(surface.read_pixel(0, 0), Some(0));
        assert_eq!(surface.read_pixel(1, 0), Some(0x0012_3456));
        assert_eq!(surface.read_pixel(2, 0), Some(0x0012_3456));
        assert_eq!(surface.read_pixel(3, 0), None);

        let mut bitmap = Surface::new(&context, 8, 1, PixelFormat::INDEX4LSB).unwrap();
        assert!(bitmap.fill_rect(None, 1).is_err());
    }

    #[rstest]
    #[case(PixelFormat::INDEX1MSB, 3, 1, 0b0001_0000)]
    #[case(PixelFormat::INDEX1LSB, 3, 1, 0b0000_1000)]
    #[case(PixelFormat::INDEX4MSB, 1, 0xA, 0x0A)]
    #[case(PixelFormat::INDEX4LSB, 1, 0xA, 0xA0)]
    fn bit_packed_pixels_follow_bitmap_order(
        #[case] format: PixelFormat,
        #[case] x: usize,
        #[case] value: u32,
        #[case] first_byte: u8,
    ) {
        let context = context();
        let mut surface = Surface::new(&context, 8, 1, format).unwrap();
        surface.write_pixel(x, 0, value).unwrap();
        assert_eq!(surface.pixels()[0], first_byte);
        assert_eq!(surface.read_pixel(x, 0), Some(value));
    }

    #[test]
    fn scaled_blit_doubles_pixels() {
        let context = context();
        let mut src = Surface::new(&context, 2, 1, PixelFormat::XRGB8888).unwrap();
        let mut dst = Surface::new(&context, 4, 2, PixelFormat::XRGB8888).unwrap();
        src.write_pixel(0, 0, 0x0011_1111).unwrap();
        src.write_pixel(1, 0, 0x0022_2222).unwrap();

        src.blit_scaled(None, &mut dst, None).unwrap();
        assert_eq!(
            src.blit_selection().map(|s| (s.tier, s.name)),
            Some((BlitTier::Generated, "blit_xrgb8888_to_xrgb8888_scale"))
        );
        for y in 0..2 {
            let row: Vec<u32> = (0..4).map(|x| dst.read_pixel(x, y).unwrap()).collect();
            assert_eq!(row, vec![0x0011_1111, 0x0011_1111, 0x0022_2222, 0x0022_2222]);
        }
    }

    #[rstest]
    #[case::colour_key(PixelFormat::XRGB8888, [0, 0x00FF_0000, 0, 0x0012_3456], Some(0), BlendMode::None, 255, true)]
    #[case::colour_key_blended(PixelFormat::XRGB8888, [0, 0x00FF_0000, 0x0012_3456, 0], Some(0), BlendMode::Blend, 255, true)]
    #[case::colour_key_with_alpha_mod(PixelFormat::XRGB8888, [0x00FF_0000, 0x00FF_0000, 0, 0x0040_8020], Some(0), BlendMode::Blend, 128, false)]
    #[case::alpha_mod_without_key(PixelFormat::ARGB8888, [0xFFFF_0000, 0x80FF_0000, 0, 0x4012_3456], None, BlendMode::Blend, 200, false)]
    #[case::per_pixel_alpha(PixelFormat::ARGB8888, [0, 0xFFFF_0000, 0x8000_FF00, 0x4012_3456], None, BlendMode::Blend, 255, true)]
    fn encoded_blit_matches_plain_blit(
        #[case] format: PixelFormat,
        #[case] row: [u32; 4],
        #[case] key: Option<u32>,
        #[case] mode: BlendMode,
        #[case] alpha: u8,
        #[case] encoded: bool,
    ) {
        let context = context();
        let mut src = Surface::new(&context, 4, 2, format).unwrap();
        for (x, &pixel) in row.iter().enumerate() {
            src.write_pixel(x, 0, pixel).unwrap();
            src.write_pixel(3 - x, 1, pixel).unwrap();
        }
        src.set_color_key(key);
        src.set_blend_mode(mode);
        src.set_alpha_mod(alpha);

        let mut plain = Surface::new(&context, 5, 3, PixelFormat::XRGB8888).unwrap();
        plain.fill_rect(None, 0x0010_2030).unwrap();
        plain.fill_rect(Some(Rect::new(2, 1, 3, 2)), 0x00C0_8040).unwrap();
        let mut rle = Surface::new(&context, 5, 3, PixelFormat::XRGB8888).unwrap();
        rle.pixels_mut().copy_from_slice(plain.pixels());

        src.blit(None, &mut plain, Some(Rect::new(1, 1, 0, 0))).unwrap();
        assert!(!src.has_rle());
        src.set_rle(true);
        src.blit(None, &mut rle, Some(Rect::new(1, 1, 0, 0))).unwrap();

        assert_eq!(src.has_rle(), encoded);
        assert_eq!(
            src.blit_selection().map(|s| s.tier == BlitTier::Rle),
            Some(encoded)
        );
        assert_eq!(rle.pixels(), plain.pixels());
    }

    #[rstest]
    #[case((0, 4, 4), (0, 8), (0, 8), Some((0, 4, 0, 8)))]
    #[case((-2, 4, 4), (0, 8), (0, 8), Some((0, 2, 4, 4)))]
    #[case((0, 4, 4), (0, 8), (2, 4), Some((1, 3, 2, 4)))]
    #[case((0, 4, 4), (10, 8), (0, 8), None)]
    fn clips_scaled_axis(
        #[case] src: (i64, i64, i64),
        #[case] dst: (i64, i64),
        #[case] clip: (i64, i64),
        #[case] expected: Option<(usize, usize, usize, usize)>,
    ) {
        assert_eq!(clip_scaled_axis(src, dst, clip), expected);
    }
}
