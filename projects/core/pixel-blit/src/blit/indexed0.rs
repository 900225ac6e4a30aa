//! Kernels for 1-bit and 4-bit indexed sources.
//!
//! `MSB` sources keep the leftmost pixel in the high bits of each byte
//! (`Order1234`); the others keep it in the low bits (`Order4321`).

use super::pixel::{blend_over, fetch, pack_rgba, store, unpack_rgba};
use super::{BlitFn, BlitInfo, BlitRequest, CopyFlags};
use crate::format::BitmapOrder;
use crate::palette_map::truecolor_entry_size;

#[derive(Clone, Copy)]
enum Variant {
    ToOne,
    ToN,
    ToOneKey,
    ToNKey,
    Alpha,
    AlphaKey,
}

macro_rules! low_bit_kernels {
    ($variant:expr, $bits:literal, $msb:literal, $prefix:literal) => {
        match $variant {
            Variant::ToOne => (concat!("blit_", $prefix, "_to_1"), blit_bits_to_1::<$bits, $msb, false> as BlitFn),
            Variant::ToN => (concat!("blit_", $prefix, "_to_n"), blit_bits_to_n::<$bits, $msb, false> as BlitFn),
            Variant::ToOneKey => (concat!("blit_", $prefix, "_to_1_key"), blit_bits_to_1::<$bits, $msb, true> as BlitFn),
            Variant::ToNKey => (concat!("blit_", $prefix, "_to_n_key"), blit_bits_to_n::<$bits, $msb, true> as BlitFn),
            Variant::Alpha => (concat!("blit_", $prefix, "_to_n_alpha"), blit_bits_to_n_alpha::<$bits, $msb, false> as BlitFn),
            Variant::AlphaKey => (concat!("blit_", $prefix, "_to_n_alpha_key"), blit_bits_to_n_alpha::<$bits, $msb, true> as BlitFn),
        }
    };
}

pub(super) fn select(request: &BlitRequest<'_>) -> Option<(&'static str, BlitFn)> {
    let which = request.dst.bytes_per_pixel;
    let flags = request.flags.difference(CopyFlags::RLE_MASK);
    let surface_alpha = CopyFlags::MODULATE_ALPHA | CopyFlags::BLEND;

    let variant = if flags.is_empty() {
        if which == 1 { Variant::ToOne } else { Variant::ToN }
    } else if flags == CopyFlags::COLORKEY {
        if which == 1 { Variant::ToOneKey } else { Variant::ToNKey }
    } else if which >= 2 && flags == surface_alpha {
        Variant::Alpha
    } else if which >= 2 && flags == surface_alpha | CopyFlags::COLORKEY {
        Variant::AlphaKey
    } else {
        return None;
    };

    let msb = request.src.format.bitmap_order() != Some(BitmapOrder::Order4321);
    let kernel: (&'static str, BlitFn) = match (request.src.bits_per_pixel, msb) {
        (1, true) => low_bit_kernels!(variant, 1, true, "1msb"),
        (1, false) => low_bit_kernels!(variant, 1, false, "1lsb"),
        (4, true) => low_bit_kernels!(variant, 4, true, "4msb"),
        (4, false) => low_bit_kernels!(variant, 4, false, "4lsb"),
        _ => return None,
    };
    Some(kernel)
}

/// The `i`th index of a packed row.
#[inline(always)]
fn index_at<const BITS: usize, const MSB: bool>(row: &[u8], i: usize) -> u8 {
    let per_byte = 8 / BITS;
    let slot = i % per_byte;
    let shift = if MSB { 8 - BITS * (slot + 1) } else { BITS * slot };
    (row[i / per_byte] >> shift) & ((1u8 << BITS) - 1)
}

fn blit_bits_to_1<const BITS: usize, const MSB: bool, const KEYED: bool>(info: &mut BlitInfo<'_>) {
    let (table, key) = (info.table, info.colorkey);
    info.for_each_bit_row(|src, first, dst| {
        for (i, d) in dst.iter_mut().enumerate() {
            let index = index_at::<BITS, MSB>(src, first + i);
            if KEYED && index as u32 == key {
                continue;
            }
            *d = table.map_or(index, |table| table[index as usize]);
        }
    });
}

fn blit_bits_to_n<const BITS: usize, const MSB: bool, const KEYED: bool>(info: &mut BlitInfo<'_>) {
    let Some(table) = info.table else {
        return;
    };
    let key = info.colorkey;
    let bpp = info.dst_bpp();
    let stride = truecolor_entry_size(bpp as u8);
    info.for_each_bit_row(|src, first, dst| {
        for (i, d) in dst.chunks_exact_mut(bpp).enumerate() {
            let index = index_at::<BITS, MSB>(src, first + i);
            if KEYED && index as u32 == key {
                continue;
            }
            let entry = index as usize * stride;
            d.copy_from_slice(&table[entry..entry + bpp]);
        }
    });
}

fn blit_bits_to_n_alpha<const BITS: usize, const MSB: bool, const KEYED: bool>(info: &mut BlitInfo<'_>) {
    let (palette, dst_fmt) = (info.src_palette, info.dst_fmt);
    let (key, alpha) = (info.colorkey, info.modulation.a);
    let bpp = info.dst_bpp();
    info.for_each_bit_row(|src, first, dst| {
        for (i, d) in dst.chunks_exact_mut(bpp).enumerate() {
            let index = index_at::<BITS, MSB>(src, first + i);
            if KEYED && index as u32 == key {
                continue;
            }
            let Some(&color) = palette.get(index as usize) else {
                continue;
            };
            let under = unpack_rgba(dst_fmt, fetch(d, bpp));
            store(d, bpp, pack_rgba(dst_fmt, blend_over(color, under, alpha)));
        }
    });
}
