//! Entry points taking `image` crate buffers, backed by [`ImageprocPrimitives`].

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::contour::ContourDetectorParams;
use crate::core::{self, Detection, ImageprocPrimitives};
use crate::template::{BoardTemplate, TemplateDetectorParams};
use crate::DetectError;

/// Borrow an `image::GrayImage` as a core view.
pub fn gray_view(img: &::image::GrayImage) -> core::GrayImageView<'_> {
    core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Luma conversion of any supported pixel layout.
pub fn to_gray(img: &::image::DynamicImage) -> ::image::GrayImage {
    img.to_luma8()
}

/// Copy an `image::GrayImage` into the core buffer type.
pub fn to_core_gray(img: &::image::GrayImage) -> core::GrayImage {
    core::GrayImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    }
}

/// Build an `image::GrayImage` from a raw grayscale buffer.
pub fn gray_image_from_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<::image::GrayImage, DetectError> {
    let w = usize::try_from(width).ok();
    let h = usize::try_from(height).ok();
    let Some((w, h)) = w.zip(h) else {
        return Err(DetectError::InvalidGrayDimensions { width, height });
    };
    let Some(expected) = w.checked_mul(h) else {
        return Err(DetectError::InvalidGrayDimensions { width, height });
    };
    if pixels.len() != expected {
        return Err(DetectError::InvalidGrayBuffer {
            expected,
            got: pixels.len(),
        });
    }
    ::image::GrayImage::from_raw(width, height, pixels.to_vec())
        .ok_or(DetectError::InvalidGrayDimensions { width, height })
}

/// Load an image from disk and convert it to luma.
pub fn load_gray(path: impl AsRef<std::path::Path>) -> Result<::image::GrayImage, DetectError> {
    Ok(::image::open(path)?.to_luma8())
}

/// Contour detection on a decoded image of any channel layout.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn detect_by_contour_image(
    img: &::image::DynamicImage,
    params: &ContourDetectorParams,
) -> Result<Detection, DetectError> {
    let gray = to_gray(img);
    crate::detect_by_contour(&ImageprocPrimitives, &gray_view(&gray), params)
}

/// Template detection on decoded images of any channel layout.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(img, template, params),
        fields(width = img.width(), height = img.height())
    )
)]
pub fn detect_by_template_image(
    img: &::image::DynamicImage,
    template: &::image::DynamicImage,
    params: &TemplateDetectorParams,
) -> Result<Detection, DetectError> {
    let gray = to_gray(img);
    let template = BoardTemplate::new(to_core_gray(&to_gray(template)))?;
    crate::detect_by_template(&ImageprocPrimitives, &gray_view(&gray), &template, params)
}

/// Contour detection on a raw row-major grayscale buffer.
pub fn detect_by_contour_from_gray_u8(
    width: u32,
    height: u32,
    pixels: &[u8],
    params: &ContourDetectorParams,
) -> Result<Detection, DetectError> {
    let img = gray_image_from_slice(width, height, pixels)?;
    crate::detect_by_contour(&ImageprocPrimitives, &gray_view(&img), params)
}
