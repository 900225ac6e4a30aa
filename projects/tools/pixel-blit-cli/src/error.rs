use pixel_blit::{BlitError, PixelFormatError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Format(#[from] PixelFormatError),
    #[error(transparent)]
    Blit(#[from] BlitError),
}
