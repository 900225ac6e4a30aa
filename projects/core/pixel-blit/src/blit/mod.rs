//! # Blit Function Selection
//!
//! Picks the kernel that copies pixels from one format to another for a given
//! set of [`CopyFlags`]. Selection walks a fixed list of tiers and stops at
//! the first that produces a kernel:
//!
//! 1. Destinations narrower than 8 bits per pixel are rejected.
//! 2. Run-length encoded sources (handled by the surface blit map, see [`crate::rle`]).
//! 3. Identity mappings without flags use a row copy.
//! 4. A family chosen by source format and flags:
//!    - low-bit indexed sources ([`BlitTier::LowBitIndexed`])
//!    - 8-bit indexed sources ([`BlitTier::Indexed8`])
//!    - blending ([`BlitTier::Alpha`])
//!    - everything else ([`BlitTier::Normal`])
//! 5. The generated table for pairs of 32-bit formats ([`BlitTier::Generated`]).
//! 6. The per-pixel generic path when neither format is indexed ([`BlitTier::Slow`]).
//!
//! Anything left over is [`BlitError::UnsupportedBlit`]. Descriptors with
//! channels wider than 8 bits are only accepted by the copy tier.

pub(crate) mod pixel;

mod alpha;
mod copy;
mod generated;
mod indexed0;
mod indexed1;
mod info;
mod normal;
mod slow;

pub use info::{Area, BlitInfo};

use crate::cpu::CpuFeatures;
use crate::descriptor::PixelFormatDescriptor;
use crate::error::BlitError;
use bitflags::bitflags;
use derive_enum_all_values::AllValues;
use log::{debug, warn};

bitflags! {
    /// How pixels are combined while copying.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CopyFlags: u32 {
        /// Multiply source colour channels by the modulation colour.
        const MODULATE_COLOR = 0x0000_0001;
        /// Multiply source alpha by the modulation alpha.
        const MODULATE_ALPHA = 0x0000_0002;
        /// `dst = src * srcA + dst * (1 - srcA)`.
        const BLEND = 0x0000_0010;
        /// `dst = src * srcA + dst`, saturating.
        const ADD = 0x0000_0020;
        /// `dst = src * dst`.
        const MOD = 0x0000_0040;
        /// `dst = src * dst + dst * (1 - srcA)`, saturating.
        const MUL = 0x0000_0080;
        /// Skip source pixels equal to the colour key.
        const COLORKEY = 0x0000_0100;
        /// Nearest-neighbour scaling.
        const NEAREST = 0x0000_0200;
        /// The caller would like the source run-length encoded.
        const RLE_DESIRED = 0x0000_1000;
        /// The source is encoded with colour-key runs.
        const RLE_COLORKEY = 0x0000_2000;
        /// The source is encoded with alpha runs.
        const RLE_ALPHAKEY = 0x0000_4000;
    }
}

impl CopyFlags {
    /// Modulation flags.
    pub const MODULATE_MASK: Self = Self::MODULATE_COLOR.union(Self::MODULATE_ALPHA);
    /// Blend mode flags; at most one is expected at a time.
    pub const BLEND_MASK: Self = Self::BLEND.union(Self::ADD).union(Self::MOD).union(Self::MUL);
    /// Run-length encoding state, ignored when choosing a kernel.
    pub const RLE_MASK: Self = Self::RLE_DESIRED
        .union(Self::RLE_COLORKEY)
        .union(Self::RLE_ALPHAKEY);
}

/// A blit kernel.
pub type BlitFn = fn(&mut BlitInfo<'_>);

/// Which stage of selection produced a kernel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, AllValues)]
pub enum BlitTier {
    Rle,
    Copy,
    LowBitIndexed,
    Indexed8,
    Alpha,
    Normal,
    Generated,
    Slow,
}

impl BlitTier {
    /// Lowercase name, as printed by tools.
    pub fn name(self) -> &'static str {
        match self {
            BlitTier::Rle => "rle",
            BlitTier::Copy => "copy",
            BlitTier::LowBitIndexed => "indexed0",
            BlitTier::Indexed8 => "indexed1",
            BlitTier::Alpha => "alpha",
            BlitTier::Normal => "normal",
            BlitTier::Generated => "generated",
            BlitTier::Slow => "slow",
        }
    }
}

impl core::fmt::Display for BlitTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A chosen kernel and where it came from.
#[derive(Debug, Clone, Copy)]
pub struct BlitSelection {
    pub tier: BlitTier,
    pub name: &'static str,
    pub func: BlitFn,
}

impl BlitSelection {
    pub(crate) const fn new(tier: BlitTier, name: &'static str, func: BlitFn) -> Self {
        Self { tier, name, func }
    }
}

/// Inputs to [`select_blit`].
#[derive(Debug, Clone, Copy)]
pub struct BlitRequest<'a> {
    pub src: &'a PixelFormatDescriptor,
    pub dst: &'a PixelFormatDescriptor,
    pub flags: CopyFlags,
    /// Source pixels can be copied verbatim (same format, or matching palettes).
    pub identity: bool,
}

/// Picks a kernel for `request` using only kernels whose CPU requirements are
/// met by `features`.
///
/// # Errors
///
/// [`BlitError::UnsupportedBlit`] when no tier accepts the combination.
pub fn select_blit(
    request: &BlitRequest<'_>,
    features: CpuFeatures,
) -> Result<BlitSelection, BlitError> {
    match choose(request, features) {
        Some(selection) => {
            debug!(
                "Selected {} blit {} for {} -> {} ({:?})",
                selection.tier, selection.name, request.src.format, request.dst.format, request.flags
            );
            Ok(selection)
        }
        None => {
            warn!(
                "No blit for {} -> {} with flags {:?}",
                request.src.format, request.dst.format, request.flags
            );
            Err(BlitError::UnsupportedBlit {
                src: request.src.format,
                dst: request.dst.format,
                flags: request.flags,
            })
        }
    }
}

fn choose(request: &BlitRequest<'_>, features: CpuFeatures) -> Option<BlitSelection> {
    let (src, dst) = (request.src, request.dst);
    if dst.bits_per_pixel < 8 {
        return None;
    }

    let flags = request.flags.difference(CopyFlags::RLE_MASK);
    if request.identity && flags.is_empty() {
        return Some(BlitSelection::new(BlitTier::Copy, "copy", copy::blit_copy));
    }
    if src.is_wide() || dst.is_wide() {
        return None;
    }

    let family = if src.bits_per_pixel < 8 && src.is_indexed() {
        indexed0::select(request).map(|(name, func)| BlitSelection::new(BlitTier::LowBitIndexed, name, func))
    } else if src.bytes_per_pixel == 1 && src.is_indexed() {
        indexed1::select(request).map(|(name, func)| BlitSelection::new(BlitTier::Indexed8, name, func))
    } else if flags.contains(CopyFlags::BLEND) {
        alpha::select(request).map(|(name, func)| BlitSelection::new(BlitTier::Alpha, name, func))
    } else {
        normal::select(request, features).map(|(name, func)| BlitSelection::new(BlitTier::Normal, name, func))
    };

    family
        .or_else(|| {
            generated::select(src.format, dst.format, flags, features)
                .map(|(name, func)| BlitSelection::new(BlitTier::Generated, name, func))
        })
        .or_else(|| {
            slow::select(request).map(|(name, func)| BlitSelection::new(BlitTier::Slow, name, func))
        })
}

/// Direct access to the generated-table lookup, for benchmarks.
#[cfg(feature = "bench")]
pub use generated::select as select_generated;
