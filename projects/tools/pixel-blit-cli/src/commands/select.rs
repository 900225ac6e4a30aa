use crate::error::CliError;
use crate::util::{parse_blend_mode, parse_features, parse_format};
use argh::FromArgs;
use pixel_blit::{BlendMode, ContextOptions, CopyFlags, CpuFeatures, PixelContext, PixelFormat};

#[derive(FromArgs, Debug)]
/// Show which blit kernel handles a format pair and set of flags
#[argh(subcommand, name = "select")]
pub struct SelectCmd {
    /// source format name
    #[argh(positional, from_str_fn(parse_format))]
    pub src: PixelFormat,

    /// destination format name
    #[argh(positional, from_str_fn(parse_format))]
    pub dst: PixelFormat,

    /// blend mode (none, blend, add, mod, mul) [default: none]
    #[argh(option, from_str_fn(parse_blend_mode), default = "BlendMode::None")]
    pub blend: BlendMode,

    /// skip pixels matching a colour key
    #[argh(switch)]
    pub colorkey: bool,

    /// modulate source colour
    #[argh(switch)]
    pub modulate_color: bool,

    /// modulate source alpha
    #[argh(switch)]
    pub modulate_alpha: bool,

    /// nearest-neighbour scaling
    #[argh(switch)]
    pub nearest: bool,

    /// request run-length encoding
    #[argh(switch)]
    pub rle: bool,

    /// CPU feature mask to select with, decimal or 0x hex [default: detected]
    #[argh(option, from_str_fn(parse_features))]
    pub cpu_features: Option<CpuFeatures>,
}

impl SelectCmd {
    fn flags(&self) -> CopyFlags {
        let mut flags = self.blend.copy_flags();
        flags.set(CopyFlags::COLORKEY, self.colorkey);
        flags.set(CopyFlags::MODULATE_COLOR, self.modulate_color);
        flags.set(CopyFlags::MODULATE_ALPHA, self.modulate_alpha);
        flags.set(CopyFlags::NEAREST, self.nearest);
        flags.set(CopyFlags::RLE_DESIRED, self.rle);
        flags
    }
}

pub fn handle_select_command(cmd: SelectCmd) -> Result<(), CliError> {
    let mut options = ContextOptions::new();
    if let Some(features) = cmd.cpu_features {
        options = options.with_cpu_features(features);
    }
    let context = PixelContext::with_options(options);
    let flags = cmd.flags();

    let src = context.acquire_format(cmd.src)?;
    let dst = context.acquire_format(cmd.dst)?;
    let selection = context.select_blit(src, dst, flags);
    context.release_format(src)?;
    context.release_format(dst)?;
    let selection = selection?;

    println!("{} -> {}", cmd.src, cmd.dst);
    println!("flags: {flags:?}");
    println!("cpu features: {:?}", context.cpu_features());
    println!("tier: {}", selection.tier);
    println!("kernel: {}", selection.name);
    if flags.contains(CopyFlags::RLE_DESIRED) {
        println!("note: run-length encoding is decided per surface when blitting");
    }
    Ok(())
}
