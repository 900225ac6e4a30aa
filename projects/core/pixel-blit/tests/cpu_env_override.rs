//! `PIXEL_BLIT_CPU_FEATURES` handling. Kept in its own test binary because it
//! mutates the process environment.

use pixel_blit::{ContextOptions, CopyFlags, CpuFeatures, FixedCpu, PixelContext, PixelFormat, CPU_FEATURES_ENV};

fn modulate_selection(context: &PixelContext) -> &'static str {
    let argb = context.acquire_format(PixelFormat::ARGB8888).unwrap();
    let name = context
        .select_blit(argb, argb, CopyFlags::MODULATE_COLOR)
        .unwrap()
        .name;
    context.release_format(argb).unwrap();
    name
}

#[test]
fn environment_overrides_probe() {
    let sse2 = Box::new(FixedCpu(CpuFeatures::SSE | CpuFeatures::SSE2));

    std::env::set_var(CPU_FEATURES_ENV, "0");
    let forced = PixelContext::with_options(ContextOptions::new().with_probe(sse2.clone()));
    assert_eq!(forced.cpu_features(), CpuFeatures::empty());
    assert_eq!(modulate_selection(&forced), "blit_argb8888_to_argb8888_modulate");

    std::env::set_var(CPU_FEATURES_ENV, "0x0C");
    let hex = PixelContext::with_options(ContextOptions::new().with_probe(Box::new(FixedCpu(CpuFeatures::empty()))));
    assert_eq!(hex.cpu_features(), CpuFeatures::SSE | CpuFeatures::SSE2);

    let ignored = PixelContext::with_options(ContextOptions::new().with_probe(sse2).ignore_environment());
    assert_eq!(ignored.cpu_features(), CpuFeatures::SSE | CpuFeatures::SSE2);
    #[cfg(target_arch = "x86_64")]
    assert_eq!(modulate_selection(&ignored), "blit_argb8888_to_argb8888_modulate_sse2");

    let explicit = PixelContext::with_options(ContextOptions::new().with_cpu_features(CpuFeatures::MMX));
    assert_eq!(explicit.cpu_features(), CpuFeatures::MMX);

    std::env::set_var(CPU_FEATURES_ENV, "lots");
    let garbage = PixelContext::with_options(ContextOptions::new().with_probe(Box::new(FixedCpu(CpuFeatures::SSE))));
    assert_eq!(garbage.cpu_features(), CpuFeatures::SSE);

    std::env::remove_var(CPU_FEATURES_ENV);
}
