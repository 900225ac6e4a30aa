//! Common imports and fixtures for unit tests.

pub use crate::error::{BlitError, PixelFormatError};
pub use pixel_blit_common::color_8888::Color8888;
pub use rstest::rstest;

use crate::blit::pixel::{fetch, store};
use crate::blit::{select_blit, Area, BlitFn, BlitInfo, BlitRequest, BlitSelection, CopyFlags};
use crate::cpu::CpuFeatures;
use crate::descriptor::PixelFormatDescriptor;
use crate::format::PixelFormat;

/// Buffers and state for running one kernel over a whole image.
pub(crate) struct KernelFixture {
    pub src: Vec<u8>,
    pub src_pitch: usize,
    pub dst: Vec<u8>,
    pub dst_pitch: usize,
    pub src_fmt: PixelFormatDescriptor,
    pub dst_fmt: PixelFormatDescriptor,
    pub src_palette: Vec<Color8888>,
    pub dst_palette: Vec<Color8888>,
    pub table: Option<Vec<u8>>,
    pub flags: CopyFlags,
    pub colorkey: u32,
    pub modulation: Color8888,
    pub width: usize,
    pub height: usize,
}

impl KernelFixture {
    /// Zeroed `width x height` source and destination images.
    pub fn new(src: PixelFormat, dst: PixelFormat, width: usize, height: usize) -> Self {
        let src_fmt = PixelFormatDescriptor::new(src).unwrap();
        let dst_fmt = PixelFormatDescriptor::new(dst).unwrap();
        let src_pitch = if src_fmt.bits_per_pixel < 8 {
            (width * src_fmt.bits_per_pixel as usize).div_ceil(8)
        } else {
            width * src_fmt.bytes_per_pixel as usize
        };
        let dst_pitch = width * dst_fmt.bytes_per_pixel as usize;
        Self {
            src: vec![0; src_pitch * height],
            src_pitch,
            dst: vec![0; dst_pitch * height],
            dst_pitch,
            src_fmt,
            dst_fmt,
            src_palette: Vec::new(),
            dst_palette: Vec::new(),
            table: None,
            flags: CopyFlags::empty(),
            colorkey: 0,
            modulation: Color8888::OPAQUE_WHITE,
            width,
            height,
        }
    }

    pub fn set_src(&mut self, x: usize, y: usize, value: u32) {
        let bpp = self.src_fmt.bytes_per_pixel as usize;
        store(&mut self.src[y * self.src_pitch + x * bpp..], bpp, value);
    }

    pub fn set_dst(&mut self, x: usize, y: usize, value: u32) {
        let bpp = self.dst_fmt.bytes_per_pixel as usize;
        store(&mut self.dst[y * self.dst_pitch + x * bpp..], bpp, value);
    }

    pub fn dst_pixel(&self, x: usize, y: usize) -> u32 {
        let bpp = self.dst_fmt.bytes_per_pixel as usize;
        fetch(&self.dst[y * self.dst_pitch + x * bpp..], bpp)
    }

    /// Runs `func` over the whole image.
    pub fn run(&mut self, func: BlitFn) {
        let area = Area::new(0, 0, self.width, self.height);
        let mut info = BlitInfo {
            src: &self.src,
            src_pitch: self.src_pitch,
            src_area: area,
            dst: &mut self.dst,
            dst_pitch: self.dst_pitch,
            dst_area: area,
            src_fmt: &self.src_fmt,
            dst_fmt: &self.dst_fmt,
            src_palette: &self.src_palette,
            dst_palette: &self.dst_palette,
            table: self.table.as_deref(),
            rle: None,
            flags: self.flags,
            colorkey: self.colorkey,
            modulation: self.modulation,
        };
        info.validate().unwrap();
        func(&mut info);
    }

    /// Selects a kernel for the fixture's formats and flags, then runs it.
    pub fn select_and_run(&mut self, identity: bool, features: CpuFeatures) -> BlitSelection {
        let request = BlitRequest {
            src: &self.src_fmt,
            dst: &self.dst_fmt,
            flags: self.flags,
            identity,
        };
        let selection = select_blit(&request, features).unwrap();
        self.run(selection.func);
        selection
    }
}
