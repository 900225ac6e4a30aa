use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pixel_blit::{BlendMode, ContextOptions, PixelContext, PixelFormat, Surface};
use std::sync::Arc;

#[cfg(all(
    any(target_os = "linux", target_os = "macos"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
))]
use pprof::criterion::{Output, PProfProfiler};

const WIDTH: usize = 512;
const HEIGHT: usize = 512;

struct Case {
    name: &'static str,
    src: PixelFormat,
    dst: PixelFormat,
    setup: fn(&mut Surface),
}

const CASES: &[Case] = &[
    Case {
        name: "copy",
        src: PixelFormat::XRGB8888,
        dst: PixelFormat::XRGB8888,
        setup: |_| {},
    },
    Case {
        name: "convert",
        src: PixelFormat::XRGB8888,
        dst: PixelFormat::RGB565,
        setup: |_| {},
    },
    Case {
        name: "palette",
        src: PixelFormat::INDEX8,
        dst: PixelFormat::XRGB8888,
        setup: |_| {},
    },
    Case {
        name: "blend",
        src: PixelFormat::ARGB8888,
        dst: PixelFormat::XRGB8888,
        setup: |s| s.set_blend_mode(BlendMode::Blend),
    },
    Case {
        name: "modulate",
        src: PixelFormat::ARGB8888,
        dst: PixelFormat::ABGR8888,
        setup: |s| {
            s.set_blend_mode(BlendMode::None);
            s.set_color_mod(200, 100, 50);
        },
    },
    Case {
        name: "rle_colorkey",
        src: PixelFormat::XRGB8888,
        dst: PixelFormat::XRGB8888,
        setup: |s| {
            s.set_color_key(Some(0));
            s.set_rle(true);
        },
    },
];

/// Fills a surface with a pattern where roughly a quarter of the pixels are zero.
fn fill_pattern(surface: &mut Surface) {
    for (i, byte) in surface.pixels_mut().iter_mut().enumerate() {
        *byte = if (i / 64) % 4 == 0 { 0 } else { (i * 7 % 251) as u8 };
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Blit Throughput");
    let context = Arc::new(PixelContext::new());

    for case in CASES {
        let mut src = Surface::new(&context, WIDTH, HEIGHT, case.src).unwrap();
        let mut dst = Surface::new(&context, WIDTH, HEIGHT, case.dst).unwrap();
        fill_pattern(&mut src);
        (case.setup)(&mut src);
        src.blit(None, &mut dst, None).unwrap();

        let kernel = src.blit_selection().map_or("none", |s| s.name);
        group.throughput(Throughput::Elements((WIDTH * HEIGHT) as u64));
        group.bench_function(BenchmarkId::new(case.name, kernel), |b| {
            b.iter(|| src.blit(None, &mut dst, None).unwrap())
        });
    }

    let mut src = Surface::new(&context, WIDTH / 2, HEIGHT / 2, PixelFormat::XRGB8888).unwrap();
    let mut dst = Surface::new(&context, WIDTH, HEIGHT, PixelFormat::XRGB8888).unwrap();
    fill_pattern(&mut src);
    group.bench_function("scaled_2x", |b| {
        b.iter(|| src.blit_scaled(None, &mut dst, None).unwrap())
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
