#![no_main]

// Decoding arbitrary masks and re-encoding the result must be stable, and
// building a descriptor from any raw identifier must not panic.

use libfuzzer_sys::{arbitrary, fuzz_target};
use pixel_blit::{Masks, PixelFormat, PixelFormatDescriptor};

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct Input {
    pub bpp: u8,
    pub r: u32,
    pub g: u32,
    pub b: u32,
    pub a: u32,
    pub raw: u32,
}

fuzz_target!(|input: Input| {
    let format = PixelFormat::from_masks(Masks::new(input.bpp, input.r, input.g, input.b, input.a));
    if format != PixelFormat::UNKNOWN {
        let masks = format
            .to_masks()
            .unwrap_or_else(|e| panic!("{format} decoded from masks but has none: {e}"));
        assert_eq!(PixelFormat::from_masks(masks), format, "{masks:?}");
    }

    if let Ok(descriptor) = PixelFormatDescriptor::new(PixelFormat::from_raw(input.raw)) {
        let _ = descriptor.get_rgba(None, input.r);
        let _ = descriptor.map_rgba(None, input.bpp, input.bpp, input.bpp, input.bpp);
    }
});
