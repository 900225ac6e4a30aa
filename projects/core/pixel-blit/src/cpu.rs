//! CPU feature detection for blit dispatch.
//!
//! Features are probed once per [`crate::PixelContext`] and cached. The
//! `PIXEL_BLIT_CPU_FEATURES` environment variable replaces the probe with a
//! fixed bitmask (decimal or `0x`-prefixed hex), which makes dispatch
//! deterministic in tests and benchmarks.

use bitflags::bitflags;
use log::warn;
use pixel_blit_common::cpu_detect;

/// Environment variable that overrides CPU feature detection.
pub const CPU_FEATURES_ENV: &str = "PIXEL_BLIT_CPU_FEATURES";

bitflags! {
    /// Instruction set extensions a blitter may require.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CpuFeatures: u32 {
        const MMX = 0x0000_0001;
        const THREE_D_NOW = 0x0000_0002;
        const SSE = 0x0000_0004;
        const SSE2 = 0x0000_0008;
        const ALTIVEC_PREFETCH = 0x0000_0010;
        const ALTIVEC_NOPREFETCH = 0x0000_0020;
    }
}

impl CpuFeatures {
    /// Requirement of blitters that run anywhere.
    pub const ANY: Self = Self::empty();
}

/// Source of CPU capability information.
pub trait CpuProbe: Send + Sync {
    fn has_mmx(&self) -> bool;
    fn has_3dnow(&self) -> bool;
    fn has_sse(&self) -> bool;
    fn has_sse2(&self) -> bool;
    fn has_altivec(&self) -> bool;

    /// Whether AltiVec blitters should use the prefetching variants.
    ///
    /// Hosts that cannot measure their cache hierarchy assume they should.
    fn altivec_prefetch(&self) -> bool {
        true
    }

    /// Collects every probe into a feature mask.
    fn features(&self) -> CpuFeatures {
        let mut features = CpuFeatures::empty();
        features.set(CpuFeatures::MMX, self.has_mmx());
        features.set(CpuFeatures::THREE_D_NOW, self.has_3dnow());
        features.set(CpuFeatures::SSE, self.has_sse());
        features.set(CpuFeatures::SSE2, self.has_sse2());
        if self.has_altivec() {
            if self.altivec_prefetch() {
                features |= CpuFeatures::ALTIVEC_PREFETCH;
            } else {
                features |= CpuFeatures::ALTIVEC_NOPREFETCH;
            }
        }
        features
    }
}

/// Probes the machine the code is running on.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostCpu;

impl CpuProbe for HostCpu {
    fn has_mmx(&self) -> bool {
        cpu_detect::has_mmx()
    }

    fn has_3dnow(&self) -> bool {
        cpu_detect::has_3dnow()
    }

    fn has_sse(&self) -> bool {
        cpu_detect::has_sse()
    }

    fn has_sse2(&self) -> bool {
        cpu_detect::has_sse2()
    }

    fn has_altivec(&self) -> bool {
        cpu_detect::has_altivec()
    }
}

/// Reports a fixed feature set. Useful to pin dispatch in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedCpu(pub CpuFeatures);

impl CpuProbe for FixedCpu {
    fn has_mmx(&self) -> bool {
        self.0.contains(CpuFeatures::MMX)
    }

    fn has_3dnow(&self) -> bool {
        self.0.contains(CpuFeatures::THREE_D_NOW)
    }

    fn has_sse(&self) -> bool {
        self.0.contains(CpuFeatures::SSE)
    }

    fn has_sse2(&self) -> bool {
        self.0.contains(CpuFeatures::SSE2)
    }

    fn has_altivec(&self) -> bool {
        self.0
            .intersects(CpuFeatures::ALTIVEC_PREFETCH | CpuFeatures::ALTIVEC_NOPREFETCH)
    }

    fn altivec_prefetch(&self) -> bool {
        self.0.contains(CpuFeatures::ALTIVEC_PREFETCH)
    }
}

/// Parses an override value: decimal, or hex with a `0x` prefix.
///
/// Bits that name no known feature are kept, so an override can force any mask.
pub fn parse_cpu_features(value: &str) -> Option<CpuFeatures> {
    let value = value.trim();
    let raw = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => value.parse::<u32>().ok()?,
    };
    Some(CpuFeatures::from_bits_retain(raw))
}

/// Reads [`CPU_FEATURES_ENV`]. Unparsable values are logged and ignored.
pub(crate) fn features_from_env() -> Option<CpuFeatures> {
    let value = std::env::var(CPU_FEATURES_ENV).ok()?;
    let features = parse_cpu_features(&value);
    if features.is_none() {
        warn!("Ignoring unparsable {CPU_FEATURES_ENV} value {value:?}");
    }
    features
}
