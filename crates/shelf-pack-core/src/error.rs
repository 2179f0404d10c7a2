use crate::model::BinId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShelfPackError {
    #[error("Invalid dimensions: {width}x{height} (both sides must be positive)")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(
        "Cannot resize to {width}x{height}: placed content needs at least {min_width}x{min_height}"
    )]
    ResizeTooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },
    #[error("Unknown bin: {0}")]
    UnknownBin(BinId),
    #[error("Bin {0} has been released and is no longer live")]
    BinNotLive(BinId),
}

pub type Result<T> = std::result::Result<T, ShelfPackError>;
