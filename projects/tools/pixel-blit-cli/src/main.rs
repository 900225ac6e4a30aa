#![cfg(not(tarpaulin_include))]

mod commands;
mod error;
mod util;
use argh::FromArgs;
use core::error::Error;

#[derive(FromArgs, Debug)]
/// Inspect pixel formats and the blit kernels chosen for them.
/// Set RUST_LOG=debug to see selection details.
struct TopLevel {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
enum Commands {
    Masks(commands::masks::MasksCmd),
    FromMasks(commands::from_masks::FromMasksCmd),
    Select(commands::select::SelectCmd),
    Formats(commands::formats::FormatsCmd),
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli: TopLevel = argh::from_env();

    match cli.command {
        Commands::Masks(cmd) => commands::masks::handle_masks_command(cmd)?,
        Commands::FromMasks(cmd) => commands::from_masks::handle_from_masks_command(cmd)?,
        Commands::Select(cmd) => commands::select::handle_select_command(cmd)?,
        Commands::Formats(cmd) => commands::formats::handle_formats_command(cmd)?,
    }

    Ok(())
}
