//! Reference-counted storage for format descriptors and palettes.
//!
//! Descriptors and palettes live in [`HandlePool`]s: vectors of slots addressed
//! by a generation-checked [`Handle`]. Each slot carries its own reference count
//! and freed slots go on a free list, so acquire and release are O(1) and a
//! handle that outlived its slot is detected instead of aliasing a new value.

use crate::descriptor::PixelFormatDescriptor;
use crate::error::PixelFormatError;
use crate::format::PixelFormat;
use crate::palette::Palette;
use core::marker::PhantomData;
use core::num::NonZeroU64;
use log::{debug, trace};
use std::collections::HashMap;

/// Nonzero handle to a value in a [`HandlePool`].
///
/// The low 32 bits are the slot index and the high 32 bits the slot's
/// generation at insertion time.
pub struct Handle<T>(NonZeroU64, PhantomData<fn() -> T>);

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Handle<T> {}

impl<T> core::hash::Hash for Handle<T> {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> core::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Handle")
            .field("index", &self.index())
            .field("generation", &self.generation())
            .finish()
    }
}

impl<T> Handle<T> {
    fn new(index: u32, generation: u32) -> Option<Self> {
        NonZeroU64::new((u64::from(generation) << 32) | u64::from(index))
            .map(|raw| Self(raw, PhantomData))
    }

    fn index(&self) -> u32 {
        self.0.get() as u32
    }

    fn generation(&self) -> u32 {
        (self.0.get() >> 32) as u32
    }
}

/// Handle to a descriptor owned by a [`crate::PixelContext`].
pub type FormatHandle = Handle<PixelFormatDescriptor>;

/// Handle to a palette owned by a [`crate::PixelContext`].
pub type PaletteHandle = Handle<Palette>;

struct Slot<T> {
    // Odd generations are live, even generations are free.
    generation: u32,
    refcount: u32,
    value: Option<T>,
}

/// Arena of reference-counted values with generation-checked handles.
pub struct HandlePool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for HandlePool<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }
}

impl<T> HandlePool<T> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the pool holds no live values.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Stores `value` with a reference count of one.
    ///
    /// # Errors
    ///
    /// [`PixelFormatError::OutOfMemory`] if the slot vector cannot grow or the
    /// index space is exhausted.
    pub fn insert(&mut self, value: T) -> Result<Handle<T>, PixelFormatError> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.refcount = 1;
            slot.value = Some(value);
            self.live += 1;
            return Handle::new(index, slot.generation).ok_or(PixelFormatError::OutOfMemory);
        }

        let index = u32::try_from(self.slots.len()).map_err(|_| PixelFormatError::OutOfMemory)?;
        self.slots
            .try_reserve(1)
            .map_err(|_| PixelFormatError::OutOfMemory)?;
        self.slots.push(Slot {
            generation: 1,
            refcount: 1,
            value: Some(value),
        });
        self.live += 1;
        Handle::new(index, 1).ok_or(PixelFormatError::OutOfMemory)
    }

    fn slot(&self, handle: Handle<T>) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation() && slot.value.is_some())
    }

    fn slot_mut(&mut self, handle: Handle<T>) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation() && slot.value.is_some())
    }

    /// Whether `handle` refers to a live value.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.slot(handle).is_some()
    }

    /// Borrows the value behind `handle`.
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slot(handle).and_then(|slot| slot.value.as_ref())
    }

    /// Mutably borrows the value behind `handle`.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slot_mut(handle).and_then(|slot| slot.value.as_mut())
    }

    /// Current reference count, or [`None`] for a stale handle.
    pub fn refcount(&self, handle: Handle<T>) -> Option<u32> {
        self.slot(handle).map(|slot| slot.refcount)
    }

    /// Adds a reference. Returns `false` for a stale handle.
    pub fn retain(&mut self, handle: Handle<T>) -> bool {
        match self.slot_mut(handle) {
            Some(slot) => {
                slot.refcount = slot.refcount.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Drops a reference.
    ///
    /// Returns `Some(Some(value))` when this was the last reference and the slot
    /// was freed, `Some(None)` when references remain, and [`None`] for a stale
    /// handle.
    pub fn release(&mut self, handle: Handle<T>) -> Option<Option<T>> {
        let index = handle.index();
        let slot = self.slot_mut(handle)?;
        slot.refcount -= 1;
        if slot.refcount > 0 {
            return Some(None);
        }
        slot.generation = slot.generation.wrapping_add(1);
        let value = slot.value.take();
        self.free.push(index);
        self.live -= 1;
        Some(value)
    }

    /// Iterates over live handles.
    pub fn handles(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .and_then(|_| Handle::new(index as u32, slot.generation))
        })
    }

    /// Drops every value and resets the pool.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.live = 0;
    }
}

/// Descriptor and palette storage guarded by the context lock.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) formats: HandlePool<PixelFormatDescriptor>,
    pub(crate) palettes: HandlePool<Palette>,
    shared: HashMap<PixelFormat, FormatHandle>,
}

impl Registry {
    /// Bumps the shared descriptor of `format` if one exists.
    pub(crate) fn acquire_shared(&mut self, format: PixelFormat) -> Option<FormatHandle> {
        let handle = *self.shared.get(&format)?;
        if self.formats.retain(handle) {
            trace!("Shared descriptor cache hit for {format}");
            Some(handle)
        } else {
            self.shared.remove(&format);
            None
        }
    }

    /// Inserts a freshly built descriptor. Non-indexed descriptors join the
    /// shared index unless another thread won the race, in which case the
    /// winner is retained and `descriptor` is discarded.
    pub(crate) fn insert_descriptor(
        &mut self,
        descriptor: PixelFormatDescriptor,
    ) -> Result<FormatHandle, PixelFormatError> {
        let format = descriptor.format;
        if format.is_indexed() {
            let handle = self.formats.insert(descriptor)?;
            debug!("Created private descriptor for {format}");
            return Ok(handle);
        }

        if let Some(handle) = self.acquire_shared(format) {
            return Ok(handle);
        }
        let handle = self.formats.insert(descriptor)?;
        self.shared.insert(format, handle);
        debug!("Created shared descriptor for {format}");
        Ok(handle)
    }

    pub(crate) fn release_format(&mut self, handle: FormatHandle) -> Result<(), PixelFormatError> {
        let released = self
            .formats
            .release(handle)
            .ok_or(PixelFormatError::InvalidParameter("format handle"))?;

        if let Some(descriptor) = released {
            if self.shared.get(&descriptor.format) == Some(&handle) {
                self.shared.remove(&descriptor.format);
            }
            if let Some(palette) = descriptor.palette {
                self.palettes.release(palette);
            }
            trace!("Freed descriptor for {}", descriptor.format);
        }
        Ok(())
    }

    pub(crate) fn bind_palette(
        &mut self,
        handle: FormatHandle,
        palette: Option<PaletteHandle>,
    ) -> Result<(), PixelFormatError> {
        let descriptor = self
            .formats
            .get(handle)
            .ok_or(PixelFormatError::InvalidParameter("format handle"))?;
        if descriptor.palette == palette {
            return Ok(());
        }

        if let Some(new) = palette {
            let colors = self
                .palettes
                .get(new)
                .ok_or(PixelFormatError::InvalidParameter("palette handle"))?
                .len();
            let bpp = descriptor.bits_per_pixel;
            let capacity = 1u64.checked_shl(bpp as u32).unwrap_or(u64::MAX);
            if colors as u64 > capacity {
                return Err(PixelFormatError::IncompatiblePalette { colors, bpp });
            }
            self.palettes.retain(new);
        }

        let old = self
            .formats
            .get_mut(handle)
            .and_then(|descriptor| core::mem::replace(&mut descriptor.palette, palette));
        if let Some(old) = old {
            self.palettes.release(old);
        }
        Ok(())
    }

    pub(crate) fn shared_handle(&self, format: PixelFormat) -> Option<FormatHandle> {
        self.shared.get(&format).copied()
    }

    pub(crate) fn clear(&mut self) {
        self.shared.clear();
        self.formats.clear();
        self.palettes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    #[test]
    fn pool_reuses_slots_with_new_generation() {
        let mut pool = HandlePool::new();
        let first = pool.insert(10u32).unwrap();
        assert_eq!(pool.release(first), Some(Some(10)));

        let second = pool.insert(20u32).unwrap();
        assert_ne!(first, second);
        assert_eq!(pool.get(first), None);
        assert_eq!(pool.get(second), Some(&20));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn pool_counts_references() {
        let mut pool = HandlePool::new();
        let handle = pool.insert("value").unwrap();
        assert!(pool.retain(handle));
        assert_eq!(pool.refcount(handle), Some(2));
        assert_eq!(pool.release(handle), Some(None));
        assert_eq!(pool.release(handle), Some(Some("value")));
        assert_eq!(pool.release(handle), None);
        assert!(!pool.retain(handle));
        assert!(pool.is_empty());
    }

    #[test]
    fn pool_clear_invalidates_handles() {
        let mut pool = HandlePool::new();
        let a = pool.insert(1u8).unwrap();
        let b = pool.insert(2u8).unwrap();
        pool.clear();
        assert!(!pool.contains(a));
        assert!(!pool.contains(b));
        assert_eq!(pool.handles().count(), 0);
    }

    #[test]
    fn shared_descriptors_are_deduplicated() {
        let mut registry = Registry::default();
        let first = registry
            .insert_descriptor(PixelFormatDescriptor::new(PixelFormat::RGB565).unwrap())
            .unwrap();
        let second = registry
            .insert_descriptor(PixelFormatDescriptor::new(PixelFormat::RGB565).unwrap())
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.formats.refcount(first), Some(2));
        assert_eq!(registry.formats.len(), 1);
    }

    #[test]
    fn indexed_descriptors_are_private() {
        let mut registry = Registry::default();
        let first = registry
            .insert_descriptor(PixelFormatDescriptor::new(PixelFormat::INDEX8).unwrap())
            .unwrap();
        let second = registry
            .insert_descriptor(PixelFormatDescriptor::new(PixelFormat::INDEX8).unwrap())
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(registry.shared_handle(PixelFormat::INDEX8), None);
    }

    #[rstest]
    #[case(PixelFormat::INDEX1MSB, 2, true)]
    #[case(PixelFormat::INDEX1MSB, 3, false)]
    #[case(PixelFormat::INDEX4LSB, 16, true)]
    #[case(PixelFormat::INDEX4LSB, 17, false)]
    #[case(PixelFormat::INDEX8, 256, true)]
    fn bind_palette_checks_capacity(
        #[case] format: PixelFormat,
        #[case] colors: usize,
        #[case] accepted: bool,
    ) {
        let mut registry = Registry::default();
        let handle = registry
            .insert_descriptor(PixelFormatDescriptor::new(format).unwrap())
            .unwrap();
        let palette = registry.palettes.insert(Palette::new(colors).unwrap()).unwrap();

        let result = registry.bind_palette(handle, Some(palette));
        if accepted {
            assert_eq!(result, Ok(()));
            assert_eq!(registry.palettes.refcount(palette), Some(2));
        } else {
            assert_eq!(
                result,
                Err(PixelFormatError::IncompatiblePalette {
                    colors,
                    bpp: format.bits_per_pixel()
                })
            );
            assert_eq!(registry.palettes.refcount(palette), Some(1));
        }
    }

    #[test]
    fn rebinding_releases_previous_palette() {
        let mut registry = Registry::default();
        let handle = registry
            .insert_descriptor(PixelFormatDescriptor::new(PixelFormat::INDEX8).unwrap())
            .unwrap();
        let first = registry.palettes.insert(Palette::new(4).unwrap()).unwrap();
        let second = registry.palettes.insert(Palette::new(4).unwrap()).unwrap();

        registry.bind_palette(handle, Some(first)).unwrap();
        registry.bind_palette(handle, Some(first)).unwrap();
        assert_eq!(registry.palettes.refcount(first), Some(2));

        registry.bind_palette(handle, Some(second)).unwrap();
        assert_eq!(registry.palettes.refcount(first), Some(1));
        assert_eq!(registry.palettes.refcount(second), Some(2));

        registry.release_format(handle).unwrap();
        assert_eq!(registry.palettes.refcount(second), Some(1));
    }
}
