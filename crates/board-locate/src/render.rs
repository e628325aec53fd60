//! Debug overlays. Detection never calls into this module.

use ::image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::core::{BoundingRegion, LineSegment};

/// Outline `region`: the four rotated corners, or the axis-aligned box.
pub fn draw_region(img: &mut RgbImage, region: &BoundingRegion, color: Rgb<u8>) {
    match region {
        BoundingRegion::Rotated { corners, .. } => {
            for i in 0..corners.len() {
                let a = corners[i];
                let b = corners[(i + 1) % corners.len()];
                draw_line_segment_mut(img, (a.x, a.y), (b.x, b.y), color);
            }
        }
        BoundingRegion::Axis {
            top_left,
            bottom_right,
        } => {
            let w = bottom_right.x - top_left.x;
            let h = bottom_right.y - top_left.y;
            if w > 0 && h > 0 {
                draw_hollow_rect_mut(
                    img,
                    Rect::at(top_left.x, top_left.y).of_size(w as u32, h as u32),
                    color,
                );
            }
        }
    }
}

pub fn draw_segments(img: &mut RgbImage, segments: &[LineSegment], color: Rgb<u8>) {
    for s in segments {
        draw_line_segment_mut(img, (s.p0.x, s.p0.y), (s.p1.x, s.p1.y), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RotatedRect;
    use nalgebra::Point2;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    #[test]
    fn axis_region_outline() {
        let mut img = RgbImage::new(20, 20);
        let region = BoundingRegion::Axis {
            top_left: Point2::new(2, 3),
            bottom_right: Point2::new(12, 15),
        };
        draw_region(&mut img, &region, RED);
        assert_eq!(*img.get_pixel(2, 3), RED);
        assert_eq!(*img.get_pixel(11, 14), RED);
        assert_eq!(*img.get_pixel(6, 8), Rgb([0, 0, 0]));
    }

    #[test]
    fn rotated_region_and_segments() {
        let mut img = RgbImage::new(40, 40);
        let region = BoundingRegion::rotated(RotatedRect {
            center: Point2::new(20.0, 20.0),
            width: 20.0,
            height: 20.0,
            angle_deg: 0.0,
        });
        draw_region(&mut img, &region, RED);
        assert_eq!(*img.get_pixel(10, 10), RED);
        assert_eq!(*img.get_pixel(20, 20), Rgb([0, 0, 0]));

        let seg = LineSegment::new(Point2::new(0.0, 39.0), Point2::new(39.0, 39.0));
        draw_segments(&mut img, &[seg], RED);
        assert_eq!(*img.get_pixel(25, 39), RED);
    }
}
