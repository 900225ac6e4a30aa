#![no_main]

// Blits between random formats, sizes, rectangles and surface states. Any
// combination may be rejected with an error, but none may panic.

use libfuzzer_sys::{arbitrary, fuzz_target};
use pixel_blit::{
    BlendMode, ContextOptions, CpuFeatures, PixelContext, PixelFormat, Rect, Surface,
};
use std::sync::Arc;

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct Input {
    pub src_format: u8,
    pub dst_format: u8,
    pub src_size: (u8, u8),
    pub dst_size: (u8, u8),
    pub src_rect: Option<(i8, i8, i8, i8)>,
    pub dst_rect: Option<(i8, i8, i8, i8)>,
    pub scaled: bool,
    pub color_key: Option<u32>,
    pub color_mod: Option<(u8, u8, u8)>,
    pub alpha_mod: u8,
    pub blend: u8,
    pub rle: bool,
    pub features: u32,
    pub pixels: Vec<u8>,
}

fn pick(index: u8) -> Option<PixelFormat> {
    let formats: Vec<PixelFormat> = PixelFormat::ALL
        .iter()
        .copied()
        .filter(|f| !f.is_fourcc())
        .collect();
    formats.get(index as usize % formats.len()).copied()
}

fn rect(r: Option<(i8, i8, i8, i8)>) -> Option<Rect> {
    r.map(|(x, y, w, h)| Rect::new(x as i32, y as i32, w as i32, h as i32))
}

fuzz_target!(|input: Input| {
    let (Some(src_format), Some(dst_format)) = (pick(input.src_format), pick(input.dst_format)) else {
        return;
    };
    let context = Arc::new(PixelContext::with_options(
        ContextOptions::new().with_cpu_features(CpuFeatures::from_bits_truncate(input.features)),
    ));
    let size = |(w, h): (u8, u8)| ((w % 24) as usize, (h % 24) as usize);
    let (sw, sh) = size(input.src_size);
    let (dw, dh) = size(input.dst_size);
    let Ok(mut src) = Surface::new(&context, sw, sh, src_format) else {
        return;
    };
    let Ok(mut dst) = Surface::new(&context, dw, dh, dst_format) else {
        return;
    };

    for (byte, value) in src.pixels_mut().iter_mut().zip(input.pixels.iter().cycle()) {
        *byte = *value;
    }
    src.set_color_key(input.color_key);
    if let Some((r, g, b)) = input.color_mod {
        src.set_color_mod(r, g, b);
    }
    src.set_alpha_mod(input.alpha_mod);
    let modes = BlendMode::all_values();
    src.set_blend_mode(modes[input.blend as usize % modes.len()]);
    src.set_rle(input.rle);

    let result = if input.scaled {
        src.blit_scaled(rect(input.src_rect), &mut dst, rect(input.dst_rect))
    } else {
        src.blit(rect(input.src_rect), &mut dst, rect(input.dst_rect))
    };
    if result.is_ok() {
        // A second blit reuses the cached map.
        let _ = src.blit(rect(input.src_rect), &mut dst, rect(input.dst_rect));
    }
    drop((src, dst));
    assert_eq!(context.live_formats(), 0);
    assert_eq!(context.live_palettes(), 0);
});
