#![doc = include_str!(concat!("../", std::env!("CARGO_PKG_README")))]

pub mod blit;
pub mod blit_map;
pub mod context;
pub mod cpu;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod palette;
pub mod palette_map;
pub mod registry;
pub mod rle;
pub mod surface;

#[cfg(test)]
mod test_prelude;

pub use blit::{select_blit, BlitFn, BlitRequest, BlitSelection, BlitTier, CopyFlags};
pub use blit_map::BlitMap;
pub use context::{ContextOptions, PixelContext};
pub use cpu::{CpuFeatures, CpuProbe, FixedCpu, HostCpu, CPU_FEATURES_ENV};
pub use descriptor::{ChannelInfo, PixelFormatDescriptor};
pub use error::{BlitError, PixelFormatError};
pub use format::{Masks, PixelFormat};
pub use palette::Palette;
pub use pixel_blit_common::color_8888::Color8888;
pub use registry::{FormatHandle, PaletteHandle};
pub use rle::{RleKind, RleSurface};
pub use surface::{BlendMode, Rect, Surface, SurfaceId};
