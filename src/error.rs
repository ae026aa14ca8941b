use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unable to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image has no pixels")]
    EmptyImage,

    #[error("only {found} usable pixels after filtering, need at least {required}")]
    InsufficientPixels { found: usize, required: usize },

    #[error("invalid hex color {0:?}")]
    InvalidHex(String),
}
