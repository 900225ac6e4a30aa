//! Error types returned by the format registry and the blit engine.

use crate::blit::CopyFlags;
use crate::format::PixelFormat;
use thiserror::Error;

/// Errors from format decoding, descriptor management and palettes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PixelFormatError {
    /// The format has no mask decomposition (FourCC, unknown layout or order).
    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(PixelFormat),

    /// An argument was zero-sized, out of range, or a handle was stale.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// A palette has more entries than the format's bit depth can index.
    #[error("Palette with {colors} colours is incompatible with a {bpp}-bit format")]
    IncompatiblePalette {
        /// Number of entries in the palette.
        colors: usize,
        /// Bits per pixel of the format the palette was bound to.
        bpp: u8,
    },

    /// A descriptor, palette, table or pixel buffer could not be allocated.
    #[error("Out of memory")]
    OutOfMemory,

    /// A palette update was clamped; the in-range part was still applied.
    #[error("Palette write clamped: wrote {written} of {requested} colours")]
    PartialWrite {
        /// Number of colours actually written.
        written: usize,
        /// Number of colours the caller asked to write.
        requested: usize,
    },
}

/// Errors from blit selection and execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlitError {
    /// No tier could produce a blitter for this format pair and flag set.
    #[error("Blit combination not supported: {src} -> {dst} with flags {flags:?}")]
    UnsupportedBlit {
        /// Source format.
        src: PixelFormat,
        /// Destination format.
        dst: PixelFormat,
        /// Copy flags that were requested.
        flags: CopyFlags,
    },

    /// An underlying format or palette operation failed.
    #[error(transparent)]
    Format(#[from] PixelFormatError),

    /// The surface dimensions overflow the addressable size of a pixel buffer.
    #[error("Surface is too large")]
    SurfaceTooLarge,
}
