//! Helpers for CPU feature detection without using std.
//!
//! This module provides CPU feature detection for the SIMD instruction sets blit
//! dispatch cares about, using the `cpufeatures` crate on x86. These functions are
//! used to determine at runtime which specialised blitters can be safely executed
//! on the current CPU.
//!
//! The functions are minimal overhead, they have an init that's called once, and every subsequent
//! call simply loads and compares a bool.
//!
//! With the `no-runtime-cpu-detection` feature, or on non-x86 targets, the probes
//! report the features enabled at compile time instead. AltiVec is only ever known
//! at compile time.

/// Checks if the CPU supports MMX instructions.
///
/// # Returns
/// `true` if the CPU supports MMX instructions, `false` otherwise.
#[inline]
pub fn has_mmx() -> bool {
    #[cfg(all(
        any(target_arch = "x86_64", target_arch = "x86"),
        not(feature = "no-runtime-cpu-detection")
    ))]
    {
        cpufeatures::new!(cpuid_mmx, "mmx");
        cpuid_mmx::get()
    }

    #[cfg(any(
        not(any(target_arch = "x86_64", target_arch = "x86")),
        feature = "no-runtime-cpu-detection"
    ))]
    {
        cfg!(target_feature = "mmx")
    }
}

/// Checks if the CPU supports SSE instructions.
///
/// # Returns
/// `true` if the CPU supports SSE instructions, `false` otherwise.
#[inline]
pub fn has_sse() -> bool {
    #[cfg(all(
        any(target_arch = "x86_64", target_arch = "x86"),
        not(feature = "no-runtime-cpu-detection")
    ))]
    {
        cpufeatures::new!(cpuid_sse, "sse");
        cpuid_sse::get()
    }

    #[cfg(any(
        not(any(target_arch = "x86_64", target_arch = "x86")),
        feature = "no-runtime-cpu-detection"
    ))]
    {
        cfg!(target_feature = "sse")
    }
}

/// Checks if the CPU supports SSE2 instructions.
///
/// SSE2 gates the accelerated 32-bit blitters.
///
/// # Returns
/// `true` if the CPU supports SSE2 instructions, `false` otherwise.
#[inline]
pub fn has_sse2() -> bool {
    #[cfg(all(
        any(target_arch = "x86_64", target_arch = "x86"),
        not(feature = "no-runtime-cpu-detection")
    ))]
    {
        cpufeatures::new!(cpuid_sse2, "sse2");
        cpuid_sse2::get()
    }

    #[cfg(any(
        not(any(target_arch = "x86_64", target_arch = "x86")),
        feature = "no-runtime-cpu-detection"
    ))]
    {
        cfg!(target_feature = "sse2")
    }
}

/// Checks if the CPU supports 3DNow! instructions.
///
/// 3DNow! is not exposed by `cpufeatures` and no current CPU ships it, so this
/// always reports `false`.
#[inline]
pub fn has_3dnow() -> bool {
    false
}

/// Checks if the target was compiled with AltiVec enabled.
///
/// # Returns
/// `true` if `target_feature = "altivec"` is set, `false` otherwise.
#[inline]
pub fn has_altivec() -> bool {
    cfg!(target_feature = "altivec")
}
