use crate::error::CliError;
use crate::util::parse_u32;
use argh::FromArgs;
use pixel_blit::{Masks, PixelFormat};

#[derive(FromArgs, Debug)]
/// Find the canonical pixel format for a set of channel masks
#[argh(subcommand, name = "from-masks")]
pub struct FromMasksCmd {
    /// bits per pixel
    #[argh(positional)]
    pub bpp: u8,

    /// red mask
    #[argh(positional, from_str_fn(parse_u32))]
    pub r: u32,

    /// green mask
    #[argh(positional, from_str_fn(parse_u32))]
    pub g: u32,

    /// blue mask
    #[argh(positional, from_str_fn(parse_u32))]
    pub b: u32,

    /// alpha mask
    #[argh(positional, from_str_fn(parse_u32))]
    pub a: u32,
}

pub fn handle_from_masks_command(cmd: FromMasksCmd) -> Result<(), CliError> {
    let format = PixelFormat::from_masks(Masks::new(cmd.bpp, cmd.r, cmd.g, cmd.b, cmd.a));
    println!("{format}");
    Ok(())
}
