use board_locate_core::{GrayImage, GrayImageView};

use crate::params::{ParamsError, ScaleRange};

/// Reference image of the board plus the ordered scales to try it at.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardTemplate {
    image: GrayImage,
    scales: Vec<f32>,
}

impl BoardTemplate {
    /// Template with the default coarse sweep ([`ScaleRange::COARSE`]).
    pub fn new(image: GrayImage) -> Result<Self, ParamsError> {
        Self::with_scales(image, ScaleRange::COARSE.values())
    }

    pub fn with_scales(image: GrayImage, scales: Vec<f32>) -> Result<Self, ParamsError> {
        if image.view().is_empty() {
            return Err(ParamsError::EmptyTemplate);
        }
        Ok(Self { image, scales })
    }

    #[inline]
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        self.image.view()
    }

    #[inline]
    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.image.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.image.height
    }

    /// Pixel size of the template resampled by `scale`.
    pub fn scaled_size(&self, scale: f32) -> (usize, usize) {
        (
            (self.image.width as f32 * scale).round() as usize,
            (self.image.height as f32 * scale).round() as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_image() {
        assert_eq!(
            BoardTemplate::new(GrayImage::new(0, 10)),
            Err(ParamsError::EmptyTemplate)
        );
    }

    #[test]
    fn default_scales_and_sizes() {
        let t = BoardTemplate::new(GrayImage::filled(120, 80, 7)).expect("template");
        assert_eq!(t.scales().len(), 50);
        assert_eq!(t.scaled_size(0.5), (60, 40));
        assert_eq!(t.scaled_size(0.404), (48, 32));
    }
}
