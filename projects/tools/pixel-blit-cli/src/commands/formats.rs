use crate::error::CliError;
use crate::util::hex;
use argh::FromArgs;
use pixel_blit::PixelFormat;

#[derive(FromArgs, Debug)]
/// List every known pixel format
#[argh(subcommand, name = "formats")]
pub struct FormatsCmd {}

pub fn handle_formats_command(_cmd: FormatsCmd) -> Result<(), CliError> {
    println!("{:<14} {:<10} {:>4} {:>5}  kind", "name", "id", "bpp", "bytes");
    for &format in PixelFormat::ALL {
        let kind = if format.is_fourcc() {
            "fourcc"
        } else if format.is_indexed() {
            "indexed"
        } else if format.is_packed() {
            "packed"
        } else if format.is_array() {
            "array"
        } else {
            "-"
        };
        let alpha = if format.is_alpha() { " alpha" } else { "" };
        println!(
            "{:<14} {:<10} {:>4} {:>5}  {kind}{alpha}",
            format.to_string(),
            hex(format.raw(), 8),
            format.bits_per_pixel(),
            format.bytes_per_pixel()
        );
    }
    Ok(())
}
