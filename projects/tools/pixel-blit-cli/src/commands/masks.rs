use crate::error::CliError;
use crate::util::{hex, parse_format};
use argh::FromArgs;
use pixel_blit::{ChannelInfo, PixelContext, PixelFormat};

#[derive(FromArgs, Debug)]
/// Print the channel masks and layout of a pixel format
#[argh(subcommand, name = "masks")]
pub struct MasksCmd {
    /// format name, e.g. RGB565
    #[argh(positional, from_str_fn(parse_format))]
    pub format: PixelFormat,
}

pub fn handle_masks_command(cmd: MasksCmd) -> Result<(), CliError> {
    let masks = cmd.format.to_masks()?;
    println!("{} ({})", cmd.format, hex(cmd.format.raw(), 8));
    println!("bpp: {}", masks.bpp);

    let context = PixelContext::new();
    let handle = context.acquire_format(cmd.format)?;
    let descriptor = context.format(handle)?;
    for (name, channel) in [
        ("r", descriptor.r),
        ("g", descriptor.g),
        ("b", descriptor.b),
        ("a", descriptor.a),
    ] {
        print_channel(name, &channel);
    }
    context.release_format(handle)?;
    Ok(())
}

fn print_channel(name: &str, channel: &ChannelInfo) {
    println!(
        "{name}: mask {} shift {:2} bits {:2} loss {}",
        hex(channel.mask, 8),
        channel.shift,
        channel.bits,
        channel.loss
    );
}
