//! The low-level image operations consumed by the detectors.
//!
//! Detectors are written against [`ImagePrimitives`] so the edge, contour and
//! correlation back-ends can be swapped (or stubbed in tests). Segment
//! extraction, minimum-area rectangles, correlation and resampling have
//! built-in implementations; blur, edge and contour extraction must be
//! supplied. [`ImageprocPrimitives`] (feature `imageproc`) provides them.

use crate::correlation::{correlate_normalized, ScoreMap};
use crate::edges::EdgeMap;
use crate::geometry::{Contour, LineSegment, RotatedRect};
use crate::image::{GrayImage, GrayImageView};
use crate::lines::{detect_line_segments, HoughSegmentParams};

pub trait ImagePrimitives: Sync {
    /// Gaussian blur with standard deviation `sigma` (pixels).
    fn blur(&self, image: &GrayImageView<'_>, sigma: f32) -> GrayImage;

    /// Binary edge map using hysteresis thresholds.
    fn edges(&self, image: &GrayImageView<'_>, low: f32, high: f32) -> EdgeMap;

    /// Outermost closed boundaries of the edge components.
    fn contours(&self, edges: &EdgeMap) -> Vec<Contour>;

    fn line_segments(&self, edges: &EdgeMap, params: &HoughSegmentParams) -> Vec<LineSegment> {
        detect_line_segments(edges, params)
    }

    fn min_area_rect(&self, contour: &Contour) -> Option<RotatedRect> {
        contour.min_area_rect()
    }

    fn correlate(&self, image: &GrayImageView<'_>, template: &GrayImageView<'_>) -> Option<ScoreMap> {
        correlate_normalized(image, template)
    }

    fn resize(&self, image: &GrayImageView<'_>, factor: f32) -> Option<GrayImage> {
        image.resize_by_factor(factor)
    }
}

#[cfg(feature = "imageproc")]
pub use backend::ImageprocPrimitives;

#[cfg(feature = "imageproc")]
mod backend {
    use super::*;
    use imageproc::contours::{find_contours, BorderType};
    use imageproc::point::Point;
    use nalgebra::Point2;

    /// [`ImagePrimitives`] backed by `imageproc` (Gaussian blur, Canny,
    /// Suzuki–Abe border following, rotating-calipers rectangles).
    #[derive(Clone, Copy, Debug, Default)]
    pub struct ImageprocPrimitives;

    fn to_image(view: &GrayImageView<'_>) -> ::image::GrayImage {
        ::image::GrayImage::from_raw(view.width as u32, view.height as u32, view.data.to_vec())
            .unwrap_or_else(|| ::image::GrayImage::new(view.width as u32, view.height as u32))
    }

    fn from_image(img: ::image::GrayImage) -> GrayImage {
        let (w, h) = (img.width() as usize, img.height() as usize);
        GrayImage {
            width: w,
            height: h,
            data: img.into_raw(),
        }
    }

    impl ImagePrimitives for ImageprocPrimitives {
        fn blur(&self, image: &GrayImageView<'_>, sigma: f32) -> GrayImage {
            if sigma <= 0.0 || image.is_empty() {
                return image.crop(crate::image::PixelRect {
                    x: 0,
                    y: 0,
                    width: image.width,
                    height: image.height,
                });
            }
            from_image(imageproc::filter::gaussian_blur_f32(&to_image(image), sigma))
        }

        fn edges(&self, image: &GrayImageView<'_>, low: f32, high: f32) -> EdgeMap {
            if image.is_empty() {
                return EdgeMap::empty(image.width, image.height);
            }
            EdgeMap::from_mask(from_image(imageproc::edges::canny(
                &to_image(image),
                low,
                high,
            )))
        }

        fn contours(&self, edges: &EdgeMap) -> Vec<Contour> {
            if edges.width() == 0 || edges.height() == 0 {
                return Vec::new();
            }
            find_contours::<i32>(&to_image(&edges.view()))
                .into_iter()
                .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
                .map(|c| {
                    Contour::new(
                        c.points
                            .iter()
                            .map(|p| Point2::new(p.x as f32, p.y as f32))
                            .collect(),
                    )
                })
                .collect()
        }

        /// Rotating calipers over pixel-rounded boundary points.
        fn min_area_rect(&self, contour: &Contour) -> Option<RotatedRect> {
            if contour.points.is_empty() {
                return None;
            }
            let pts: Vec<Point<i32>> = contour
                .points
                .iter()
                .map(|p| Point::new(p.x.round() as i32, p.y.round() as i32))
                .collect();
            let corners = imageproc::geometry::min_area_rect(&pts)
                .map(|p| Point2::new(p.x as f32, p.y as f32));
            Some(RotatedRect::from_corners(corners))
        }
    }

}
