use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pixel_blit::blit::select_generated;
use pixel_blit::{ContextOptions, CopyFlags, CpuFeatures, PixelContext, PixelFormat};
use std::hint::black_box;

#[cfg(all(
    any(target_os = "linux", target_os = "macos"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
))]
use pprof::criterion::{Output, PProfProfiler};

const PAIRS: &[(PixelFormat, PixelFormat, CopyFlags)] = &[
    (PixelFormat::XRGB8888, PixelFormat::RGB565, CopyFlags::empty()),
    (PixelFormat::ARGB8888, PixelFormat::XRGB8888, CopyFlags::BLEND),
    (PixelFormat::INDEX8, PixelFormat::ARGB8888, CopyFlags::COLORKEY),
    (PixelFormat::BGRA8888, PixelFormat::ABGR8888, CopyFlags::MODULATE_COLOR.union(CopyFlags::NEAREST)),
    (PixelFormat::RGB24, PixelFormat::ARGB4444, CopyFlags::MUL),
];

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Select Blit");
    let context = PixelContext::with_options(ContextOptions::new().with_cpu_features(CpuFeatures::empty()));

    for &(src, dst, flags) in PAIRS {
        let src_handle = context.acquire_format(src).unwrap();
        let dst_handle = context.acquire_format(dst).unwrap();
        let id = format!("{src}_to_{dst}_{:#x}", flags.bits());
        group.bench_with_input(BenchmarkId::new("select_blit", &id), &flags, |b, &flags| {
            b.iter(|| context.select_blit(black_box(src_handle), black_box(dst_handle), black_box(flags)))
        });
    }

    // The last generated entry is the worst case for the linear scan.
    group.bench_function("generated_worst_case", |b| {
        b.iter(|| {
            select_generated(
                black_box(PixelFormat::BGRA8888),
                black_box(PixelFormat::BGRA8888),
                black_box(CopyFlags::MODULATE_MASK | CopyFlags::BLEND | CopyFlags::NEAREST),
                black_box(CpuFeatures::empty()),
            )
        })
    });
    group.bench_function("generated_miss", |b| {
        b.iter(|| {
            select_generated(
                black_box(PixelFormat::RGB565),
                black_box(PixelFormat::XRGB8888),
                black_box(CopyFlags::BLEND),
                black_box(CpuFeatures::empty()),
            )
        })
    });

    group.finish();
}

#[cfg(all(
    any(target_os = "linux", target_os = "macos"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
))]
criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = criterion_benchmark
}

#[cfg(not(all(
    any(target_os = "linux", target_os = "macos"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
)))]
criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = criterion_benchmark
}

criterion_main!(benches);
