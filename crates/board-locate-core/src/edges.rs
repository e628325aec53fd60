use crate::image::{GrayImage, GrayImageView};

/// Binary edge mask with the same extent as the image it was computed from.
///
/// Any non-zero pixel of the wrapped buffer is an edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeMap {
    mask: GrayImage,
}

impl EdgeMap {
    pub fn from_mask(mask: GrayImage) -> Self {
        Self { mask }
    }

    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            mask: GrayImage::new(width, height),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.mask.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.mask.height
    }

    #[inline]
    pub fn is_edge(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y) != 0
    }

    pub fn count(&self) -> usize {
        self.mask.data.iter().filter(|&&v| v != 0).count()
    }

    pub fn view(&self) -> GrayImageView<'_> {
        self.mask.view()
    }

    pub fn into_mask(self) -> GrayImage {
        self.mask
    }
}
