//! Square-ish, axis-aligned contour rectangles.

use board_locate_core::{Contour, ImagePrimitives, RotatedRect};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::params::SquareParams;

/// A contour whose minimum-area rectangle passed the shape filter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SquareCandidate {
    pub rect: RotatedRect,
    pub corners: [Point2<f32>; 4],
    /// Enclosed contour area (not the rectangle area).
    pub area: f32,
}

impl SquareCandidate {
    /// Degrees away from the nearest axis-aligned pose.
    pub fn rotation_deg(&self) -> f32 {
        self.rect.axis_deviation_deg()
    }

    pub fn aspect_ratio(&self) -> f32 {
        aspect_ratio(&self.rect).unwrap_or(f32::INFINITY)
    }
}

/// `long / short`, `None` for degenerate rectangles.
fn aspect_ratio(rect: &RotatedRect) -> Option<f32> {
    let long = rect.width.max(rect.height);
    let short = rect.width.min(rect.height);
    (short > 0.0 && short.is_finite()).then(|| long / short)
}

#[derive(Clone, Copy, Debug, Default)]
struct Rejections {
    small: usize,
    degenerate: usize,
    rotated: usize,
    not_square: usize,
}

/// Filter contours down to square-like candidates, preserving input order.
///
/// A contour survives when its area reaches `min_area`, its minimum-area
/// rectangle has two non-zero sides, sits within `max_rotation_deg` of an
/// axis, and has `1 - tol < long/short < 1 + tol`.
pub fn find_square_candidates<P: ImagePrimitives + ?Sized>(
    primitives: &P,
    contours: &[Contour],
    min_area: f32,
    params: &SquareParams,
) -> Vec<SquareCandidate> {
    let mut rejected = Rejections::default();
    let lo = 1.0 - params.square_tolerance;
    let hi = 1.0 + params.square_tolerance;

    let out: Vec<SquareCandidate> = contours
        .iter()
        .filter_map(|contour| {
            let area = contour.area();
            if area < min_area {
                rejected.small += 1;
                return None;
            }
            let Some(rect) = primitives.min_area_rect(contour) else {
                rejected.degenerate += 1;
                return None;
            };
            let Some(ar) = aspect_ratio(&rect) else {
                rejected.degenerate += 1;
                return None;
            };
            if rect.axis_deviation_deg() > params.max_rotation_deg {
                rejected.rotated += 1;
                return None;
            }
            if !(lo < ar && ar < hi) {
                rejected.not_square += 1;
                return None;
            }
            Some(SquareCandidate {
                rect,
                corners: rect.corners(),
                area,
            })
        })
        .collect();

    log::debug!(
        "square candidates: {} of {} contours (small={}, degenerate={}, rotated={}, not_square={})",
        out.len(),
        contours.len(),
        rejected.small,
        rejected.degenerate,
        rejected.rotated,
        rejected.not_square
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_locate_core::{EdgeMap, GrayImage, GrayImageView};

    struct GeometryOnly;

    impl ImagePrimitives for GeometryOnly {
        fn blur(&self, image: &GrayImageView<'_>, _sigma: f32) -> GrayImage {
            GrayImage::new(image.width, image.height)
        }
        fn edges(&self, image: &GrayImageView<'_>, _low: f32, _high: f32) -> EdgeMap {
            EdgeMap::empty(image.width, image.height)
        }
        fn contours(&self, _edges: &EdgeMap) -> Vec<Contour> {
            Vec::new()
        }
    }

    fn rect_contour(cx: f32, cy: f32, w: f32, h: f32, angle_deg: f32) -> Contour {
        let rect = RotatedRect {
            center: Point2::new(cx, cy),
            width: w,
            height: h,
            angle_deg,
        };
        Contour::new(rect.corners().to_vec())
    }

    #[test]
    fn keeps_axis_aligned_square() {
        let contours = [rect_contour(200.0, 200.0, 100.0, 100.0, 0.0)];
        let out = find_square_candidates(&GeometryOnly, &contours, 500.0, &SquareParams::default());
        assert_eq!(out.len(), 1);
        assert!((out[0].area - 10_000.0).abs() < 1.0);
        assert!(out[0].rotation_deg() < 0.5);
        assert!((out[0].aspect_ratio() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn area_threshold_is_inclusive() {
        let contours = [rect_contour(50.0, 50.0, 20.0, 20.0, 0.0)];
        let p = SquareParams::default();
        assert_eq!(find_square_candidates(&GeometryOnly, &contours, 400.0, &p).len(), 1);
        assert!(find_square_candidates(&GeometryOnly, &contours, 401.0, &p).is_empty());
    }

    #[test]
    fn rejects_rotated_and_elongated() {
        let contours = [
            rect_contour(200.0, 200.0, 100.0, 100.0, 30.0),
            rect_contour(200.0, 200.0, 100.0, 100.0, 4.0),
            rect_contour(200.0, 200.0, 100.0, 100.0, 87.0),
            rect_contour(200.0, 200.0, 150.0, 100.0, 0.0),
            rect_contour(200.0, 200.0, 100.0, 108.0, 0.0),
            rect_contour(200.0, 200.0, 100.0, 110.0, 0.0),
        ];
        let out = find_square_candidates(&GeometryOnly, &contours, 500.0, &SquareParams::default());
        // 4° and 87° (3° off vertical) stay, 8% elongation stays, 10% does not.
        assert_eq!(out.len(), 3);
        assert!((out[2].aspect_ratio() - 1.08).abs() < 1e-3);
    }

    #[test]
    fn degenerate_contours_are_dropped() {
        let line = Contour::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(50.0, 0.0),
            Point2::new(100.0, 0.0),
        ]);
        let empty = Contour::new(Vec::new());
        let out = find_square_candidates(&GeometryOnly, &[line, empty], 0.0, &SquareParams::default());
        assert!(out.is_empty());
    }
}
