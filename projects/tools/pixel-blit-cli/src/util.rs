use pixel_blit::cpu::parse_cpu_features;
use pixel_blit::{BlendMode, CpuFeatures, PixelFormat};

/// Parses a format name such as `ARGB8888` (case-insensitive).
pub fn parse_format(value: &str) -> Result<PixelFormat, String> {
    PixelFormat::from_name(value).ok_or_else(|| {
        format!("Unknown pixel format: {value}. Run the `formats` subcommand for a list.")
    })
}

/// Parses a decimal or `0x`-prefixed hexadecimal number.
pub fn parse_u32(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse::<u32>(),
    };
    parsed.map_err(|e| format!("Invalid number {value}: {e}"))
}

pub fn parse_blend_mode(value: &str) -> Result<BlendMode, String> {
    BlendMode::from_name(value)
        .ok_or_else(|| format!("Invalid blend mode: {value}. Valid modes are: none, blend, add, mod, mul"))
}

pub fn parse_features(value: &str) -> Result<CpuFeatures, String> {
    parse_cpu_features(value).ok_or_else(|| format!("Invalid CPU feature mask: {value}"))
}

/// `0x` hex with `digits` digits.
pub fn hex(value: u32, digits: usize) -> String {
    format!("0x{value:0digits$X}")
}
