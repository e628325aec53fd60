use crate::{contour, core, template};

/// Faults raised by the facade. A board that is simply not there is a
/// [`core::Detection::NotFound`], never an error.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid grayscale image buffer length (expected {expected} bytes, got {got})")]
    InvalidGrayBuffer { expected: usize, got: usize },

    #[error("invalid grayscale image dimensions (width={width}, height={height})")]
    InvalidGrayDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Buffer(#[from] core::ImageBufferError),

    #[error(transparent)]
    ContourParams(#[from] contour::ParamsError),

    #[error(transparent)]
    TemplateParams(#[from] template::ParamsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "image")]
    #[error(transparent)]
    Image(#[from] ::image::ImageError),
}
