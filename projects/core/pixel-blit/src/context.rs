//! # Pixel Context
//!
//! [`PixelContext`] owns every descriptor and palette and the cached CPU
//! feature set. All registry state sits behind a single [`parking_lot::Mutex`];
//! descriptors are built outside the lock and inserted with a re-check, so
//! concurrent acquires of the same format share one descriptor.
//!
//! Create one context per process (or per test) and share it through an
//! [`Arc`] with every [`crate::Surface`]. [`PixelContext::shutdown`] reports
//! handles that were never released.

use crate::blit::{select_blit, BlitRequest, BlitSelection, CopyFlags};
use crate::cpu::{features_from_env, CpuFeatures, CpuProbe, HostCpu};
use crate::descriptor::PixelFormatDescriptor;
use crate::error::{BlitError, PixelFormatError};
use crate::format::PixelFormat;
use crate::palette::Palette;
use crate::palette_map::map_palette_to_palette;
use crate::registry::{FormatHandle, PaletteHandle, Registry};
use core::sync::atomic::{AtomicU64, Ordering};
use log::{debug, warn};
use parking_lot::Mutex;
use pixel_blit_common::color_8888::Color8888;
use std::sync::{Arc, OnceLock};

/// Settings for [`PixelContext::with_options`].
pub struct ContextOptions {
    cpu_features: Option<CpuFeatures>,
    probe: Box<dyn CpuProbe>,
    use_environment: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            cpu_features: None,
            probe: Box::new(HostCpu),
            use_environment: true,
        }
    }
}

impl core::fmt::Debug for ContextOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContextOptions")
            .field("cpu_features", &self.cpu_features)
            .field("use_environment", &self.use_environment)
            .finish_non_exhaustive()
    }
}

impl ContextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `features` instead of probing or reading the environment.
    pub fn with_cpu_features(mut self, features: CpuFeatures) -> Self {
        self.cpu_features = Some(features);
        self
    }

    /// Replaces the host probe.
    pub fn with_probe(mut self, probe: Box<dyn CpuProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Ignores [`crate::cpu::CPU_FEATURES_ENV`].
    pub fn ignore_environment(mut self) -> Self {
        self.use_environment = false;
        self
    }
}

/// Palette handle and version as seen by a blit map.
pub(crate) type PaletteKey = Option<(PaletteHandle, u32)>;

/// Owner of descriptors, palettes and the CPU feature cache.
pub struct PixelContext {
    registry: Mutex<Registry>,
    features: OnceLock<CpuFeatures>,
    options: ContextOptions,
    next_surface: AtomicU64,
}

impl Default for PixelContext {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for PixelContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixelContext")
            .field("features", &self.features.get())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PixelContext {
    /// Creates a context that probes the host CPU.
    pub fn new() -> Self {
        Self::with_options(ContextOptions::default())
    }

    pub fn with_options(options: ContextOptions) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            features: OnceLock::new(),
            options,
            next_surface: AtomicU64::new(1),
        }
    }

    /// Convenience for `Arc::new(PixelContext::new())`.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Drops every descriptor and palette, warning about the ones still referenced.
    pub fn shutdown(self) {
        let mut registry = self.registry.lock();
        let (formats, palettes) = (registry.formats.len(), registry.palettes.len());
        if formats > 0 || palettes > 0 {
            warn!("Pixel context shut down with {formats} live descriptors and {palettes} live palettes");
        }
        registry.clear();
    }

    /// Features available to blit kernels.
    ///
    /// Resolved once: [`ContextOptions::with_cpu_features`] wins, then
    /// [`crate::cpu::CPU_FEATURES_ENV`], then the probe.
    pub fn cpu_features(&self) -> CpuFeatures {
        *self.features.get_or_init(|| {
            let features = self
                .options
                .cpu_features
                .or_else(|| self.options.use_environment.then(features_from_env).flatten())
                .unwrap_or_else(|| self.options.probe.features());
            debug!("Blit CPU features: {features:?}");
            features
        })
    }

    /// Number of live descriptors.
    pub fn live_formats(&self) -> usize {
        self.registry.lock().formats.len()
    }

    /// Number of live palettes.
    pub fn live_palettes(&self) -> usize {
        self.registry.lock().palettes.len()
    }

    /// The shared descriptor of a non-indexed format, if one is alive.
    pub fn shared_format(&self, format: PixelFormat) -> Option<FormatHandle> {
        self.registry.lock().shared_handle(format)
    }

    /// Returns a descriptor for `format`, shared with other users unless the
    /// format is indexed.
    ///
    /// # Errors
    ///
    /// - [`PixelFormatError::InvalidParameter`] for [`PixelFormat::UNKNOWN`]
    /// - [`PixelFormatError::UnsupportedFormat`] for FourCC formats
    /// - [`PixelFormatError::OutOfMemory`] if the pool cannot grow
    pub fn acquire_format(&self, format: PixelFormat) -> Result<FormatHandle, PixelFormatError> {
        if !format.is_indexed() {
            if let Some(handle) = self.registry.lock().acquire_shared(format) {
                return Ok(handle);
            }
        }
        let descriptor = PixelFormatDescriptor::new(format)?;
        self.registry.lock().insert_descriptor(descriptor)
    }

    /// Adds a reference to a descriptor.
    pub fn retain_format(&self, handle: FormatHandle) -> Result<(), PixelFormatError> {
        if self.registry.lock().formats.retain(handle) {
            Ok(())
        } else {
            Err(PixelFormatError::InvalidParameter("format handle"))
        }
    }

    /// Drops a reference; the last one frees the descriptor and its palette binding.
    ///
    /// # Errors
    ///
    /// [`PixelFormatError::InvalidParameter`] for a handle that is already freed.
    pub fn release_format(&self, handle: FormatHandle) -> Result<(), PixelFormatError> {
        self.registry.lock().release_format(handle)
    }

    /// A copy of the descriptor behind `handle`.
    pub fn format(&self, handle: FormatHandle) -> Result<PixelFormatDescriptor, PixelFormatError> {
        self.registry
            .lock()
            .formats
            .get(handle)
            .cloned()
            .ok_or(PixelFormatError::InvalidParameter("format handle"))
    }

    /// Attaches `palette` to a descriptor, or detaches with [`None`].
    ///
    /// # Errors
    ///
    /// - [`PixelFormatError::IncompatiblePalette`] if the palette has more
    ///   entries than the format can index
    /// - [`PixelFormatError::InvalidParameter`] for stale handles
    pub fn bind_palette(&self, handle: FormatHandle, palette: Option<PaletteHandle>) -> Result<(), PixelFormatError> {
        self.registry.lock().bind_palette(handle, palette)
    }

    /// Allocates a palette of `count` opaque white entries.
    pub fn allocate_palette(&self, count: usize) -> Result<PaletteHandle, PixelFormatError> {
        let palette = Palette::new(count)?;
        self.registry.lock().palettes.insert(palette)
    }

    pub fn retain_palette(&self, handle: PaletteHandle) -> Result<(), PixelFormatError> {
        if self.registry.lock().palettes.retain(handle) {
            Ok(())
        } else {
            Err(PixelFormatError::InvalidParameter("palette handle"))
        }
    }

    pub fn release_palette(&self, handle: PaletteHandle) -> Result<(), PixelFormatError> {
        self.registry
            .lock()
            .palettes
            .release(handle)
            .map(|_| ())
            .ok_or(PixelFormatError::InvalidParameter("palette handle"))
    }

    /// Writes `colors` starting at `first_index`. See [`Palette::set_colors`].
    pub fn set_palette_colors(
        &self,
        handle: PaletteHandle,
        colors: &[Color8888],
        first_index: usize,
    ) -> Result<(), PixelFormatError> {
        self.registry
            .lock()
            .palettes
            .get_mut(handle)
            .ok_or(PixelFormatError::InvalidParameter("palette handle"))?
            .set_colors(colors, first_index)
    }

    pub fn palette_colors(&self, handle: PaletteHandle) -> Result<Vec<Color8888>, PixelFormatError> {
        self.registry
            .lock()
            .palettes
            .get(handle)
            .map(|palette| palette.colors().to_vec())
            .ok_or(PixelFormatError::InvalidParameter("palette handle"))
    }

    pub fn palette_version(&self, handle: PaletteHandle) -> Result<u32, PixelFormatError> {
        self.registry
            .lock()
            .palettes
            .get(handle)
            .map(Palette::version)
            .ok_or(PixelFormatError::InvalidParameter("palette handle"))
    }

    /// Packs a colour in the format of `handle`, searching its palette if indexed.
    pub fn map_rgba(&self, handle: FormatHandle, r: u8, g: u8, b: u8, a: u8) -> Result<u32, PixelFormatError> {
        let (descriptor, colors) = self.snapshot(handle)?;
        Ok(descriptor.map_rgba(colors.as_deref(), r, g, b, a))
    }

    /// Unpacks a pixel value in the format of `handle`.
    pub fn get_rgba(&self, handle: FormatHandle, pixel: u32) -> Result<Color8888, PixelFormatError> {
        let (descriptor, colors) = self.snapshot(handle)?;
        Ok(descriptor.get_rgba(colors.as_deref(), pixel))
    }

    /// Selects a kernel for blitting between two registered formats.
    ///
    /// The blit is an identity copy when both handles name the same
    /// non-indexed format, or indexed formats of equal depth whose palettes
    /// map to each other unchanged.
    pub fn select_blit(
        &self,
        src: FormatHandle,
        dst: FormatHandle,
        flags: CopyFlags,
    ) -> Result<BlitSelection, BlitError> {
        let (src, src_colors) = self.snapshot(src)?;
        let (dst, dst_colors) = self.snapshot(dst)?;
        let identity = match (src_colors, dst_colors) {
            _ if src.bits_per_pixel != dst.bits_per_pixel => false,
            (Some(s), Some(d)) => map_palette_to_palette(&s, &d)?.is_identity(),
            (None, None) => src.format == dst.format,
            _ => false,
        };
        let request = BlitRequest {
            src: &src,
            dst: &dst,
            flags,
            identity,
        };
        select_blit(&request, self.cpu_features())
    }

    /// Descriptor and palette colours of `handle`, read under one lock.
    pub(crate) fn snapshot(
        &self,
        handle: FormatHandle,
    ) -> Result<(PixelFormatDescriptor, Option<Vec<Color8888>>), PixelFormatError> {
        let registry = self.registry.lock();
        let descriptor = registry
            .formats
            .get(handle)
            .cloned()
            .ok_or(PixelFormatError::InvalidParameter("format handle"))?;
        let colors = descriptor
            .palette
            .and_then(|palette| registry.palettes.get(palette))
            .map(|palette| palette.colors().to_vec());
        Ok((descriptor, colors))
    }

    /// Current palette binding of two descriptors, for blit map staleness checks.
    pub(crate) fn palette_keys(
        &self,
        src: FormatHandle,
        dst: FormatHandle,
    ) -> Result<(PaletteKey, PaletteKey), PixelFormatError> {
        let registry = self.registry.lock();
        let key = |handle: FormatHandle| -> Result<PaletteKey, PixelFormatError> {
            let descriptor = registry
                .formats
                .get(handle)
                .ok_or(PixelFormatError::InvalidParameter("format handle"))?;
            Ok(descriptor.palette.and_then(|palette| {
                registry
                    .palettes
                    .get(palette)
                    .map(|p| (palette, p.version()))
            }))
        };
        Ok((key(src)?, key(dst)?))
    }

    pub(crate) fn next_surface_id(&self) -> u64 {
        self.next_surface.fetch_add(1, Ordering::Relaxed)
    }
}
