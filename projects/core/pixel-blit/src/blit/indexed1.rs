//! Kernels for 8-bit indexed sources.
//!
//! The blit map supplies a remap table: source index to destination index for
//! 8-bit destinations, or source index to packed pixel for wider ones (see
//! [`crate::palette_map`]). The alpha variants blend the source palette colour
//! with the surface alpha instead.

use super::pixel::{blend_over, fetch, pack_rgba, store, unpack_rgba};
use super::{BlitFn, BlitInfo, BlitRequest, CopyFlags};
use crate::palette_map::truecolor_entry_size;

pub(super) fn select(request: &BlitRequest<'_>) -> Option<(&'static str, BlitFn)> {
    let which = request.dst.bytes_per_pixel;
    let flags = request.flags.difference(CopyFlags::RLE_MASK);
    let surface_alpha = CopyFlags::MODULATE_ALPHA | CopyFlags::BLEND;

    if flags.is_empty() {
        return match which {
            1 => Some(("blit_1_to_1", blit_1_to_1 as BlitFn)),
            2 => Some(("blit_1_to_2", blit_1_to_n::<2> as BlitFn)),
            3 => Some(("blit_1_to_3", blit_1_to_n::<3> as BlitFn)),
            4 => Some(("blit_1_to_4", blit_1_to_n::<4> as BlitFn)),
            _ => None,
        };
    }
    if flags == CopyFlags::COLORKEY {
        return match which {
            1 => Some(("blit_1_to_1_key", blit_1_to_1_key as BlitFn)),
            2 => Some(("blit_1_to_2_key", blit_1_to_n_key::<2> as BlitFn)),
            3 => Some(("blit_1_to_3_key", blit_1_to_n_key::<3> as BlitFn)),
            4 => Some(("blit_1_to_4_key", blit_1_to_n_key::<4> as BlitFn)),
            _ => None,
        };
    }
    if which >= 2 && flags == surface_alpha {
        return Some(("blit_1_to_n_alpha", blit_1_to_n_alpha::<false> as BlitFn));
    }
    if which >= 2 && flags == surface_alpha | CopyFlags::COLORKEY {
        return Some(("blit_1_to_n_alpha_key", blit_1_to_n_alpha::<true> as BlitFn));
    }
    None
}

fn blit_1_to_1(info: &mut BlitInfo<'_>) {
    match info.table {
        None => info.for_each_row(|src, dst| dst.copy_from_slice(src)),
        Some(table) => info.for_each_row(|src, dst| {
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = table[s as usize];
            }
        }),
    }
}

fn blit_1_to_1_key(info: &mut BlitInfo<'_>) {
    let key = info.colorkey;
    let table = info.table;
    info.for_each_row(|src, dst| {
        for (d, &s) in dst.iter_mut().zip(src) {
            if s as u32 != key {
                *d = table.map_or(s, |table| table[s as usize]);
            }
        }
    });
}

fn blit_1_to_n<const N: usize>(info: &mut BlitInfo<'_>) {
    let Some(table) = info.table else {
        return;
    };
    let stride = truecolor_entry_size(N as u8);
    info.for_each_row(|src, dst| {
        for (d, &s) in dst.chunks_exact_mut(N).zip(src) {
            let entry = s as usize * stride;
            d.copy_from_slice(&table[entry..entry + N]);
        }
    });
}

fn blit_1_to_n_key<const N: usize>(info: &mut BlitInfo<'_>) {
    let Some(table) = info.table else {
        return;
    };
    let key = info.colorkey;
    let stride = truecolor_entry_size(N as u8);
    info.for_each_row(|src, dst| {
        for (d, &s) in dst.chunks_exact_mut(N).zip(src) {
            if s as u32 != key {
                let entry = s as usize * stride;
                d.copy_from_slice(&table[entry..entry + N]);
            }
        }
    });
}

fn blit_1_to_n_alpha<const KEYED: bool>(info: &mut BlitInfo<'_>) {
    let (palette, dst_fmt) = (info.src_palette, info.dst_fmt);
    let (key, alpha) = (info.colorkey, info.modulation.a);
    let bpp = info.dst_bpp();
    info.for_each_row(|src, dst| {
        for (d, &s) in dst.chunks_exact_mut(bpp).zip(src) {
            if KEYED && s as u32 == key {
                continue;
            }
            let Some(&color) = palette.get(s as usize) else {
                continue;
            };
            let under = unpack_rgba(dst_fmt, fetch(d, bpp));
            store(d, bpp, pack_rgba(dst_fmt, blend_over(color, under, alpha)));
        }
    });
}
