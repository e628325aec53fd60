//! Planar geometry used by the contour pipeline: line segments, contours and
//! minimum-area rotated rectangles.

use crate::image::PixelRect;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// A straight segment between two image points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub p0: Point2<f32>,
    pub p1: Point2<f32>,
}

impl LineSegment {
    pub fn new(p0: Point2<f32>, p1: Point2<f32>) -> Self {
        Self { p0, p1 }
    }

    /// Direction angle in degrees, in `[0, 180)`.
    pub fn angle_deg(&self) -> f32 {
        let d = self.p1 - self.p0;
        let a = d.y.atan2(d.x).to_degrees();
        let a = a.rem_euclid(180.0);
        // rem_euclid can round up to exactly 180 for tiny negative inputs.
        if a >= 180.0 {
            0.0
        } else {
            a
        }
    }

    pub fn length(&self) -> f32 {
        (self.p1 - self.p0).norm()
    }
}

/// Closed boundary traced around a connected edge component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<Point2<f32>>,
}

impl Contour {
    pub fn new(points: Vec<Point2<f32>>) -> Self {
        Self { points }
    }

    /// Enclosed area of the polygon formed by the boundary points (shoelace).
    pub fn area(&self) -> f32 {
        polygon_area(&self.points)
    }

    pub fn min_area_rect(&self) -> Option<RotatedRect> {
        min_area_rect(&self.points)
    }
}

/// Rectangle with arbitrary rotation.
///
/// `angle_deg` is the direction of the `width` side, normalized to `[0, 90)`;
/// `height` runs perpendicular to it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: Point2<f32>,
    pub width: f32,
    pub height: f32,
    pub angle_deg: f32,
}

impl RotatedRect {
    /// Corner points in order around the rectangle, starting from the corner
    /// at `-width/2, -height/2` in the rectangle frame.
    pub fn corners(&self) -> [Point2<f32>; 4] {
        let (s, c) = self.angle_deg.to_radians().sin_cos();
        let u = Vector2::new(c, s) * (0.5 * self.width);
        let v = Vector2::new(-s, c) * (0.5 * self.height);
        [
            self.center - u - v,
            self.center + u - v,
            self.center + u + v,
            self.center - u + v,
        ]
    }

    /// Rectangle through four corners given in order around the outline.
    ///
    /// Side lengths come from the first two edges; the result is normalized
    /// the same way as [`min_area_rect`].
    pub fn from_corners(corners: [Point2<f32>; 4]) -> Self {
        let center = Point2::from(
            (corners[0].coords + corners[1].coords + corners[2].coords + corners[3].coords) * 0.25,
        );
        let edge = corners[1] - corners[0];
        let width = edge.norm();
        let height = (corners[2] - corners[1]).norm();
        let angle = if width > f32::EPSILON {
            edge.y.atan2(edge.x).to_degrees()
        } else {
            0.0
        };
        normalized_rect(center, width, height, angle)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Angular distance in degrees from the nearest axis-aligned pose.
    pub fn axis_deviation_deg(&self) -> f32 {
        let a = self.angle_deg.rem_euclid(90.0);
        a.min(90.0 - a)
    }
}

/// Axis-aligned integer bounds of a point set, clamped to a `width × height`
/// frame. Corners are rounded to the nearest pixel first; the resulting
/// rectangle includes the last row and column. Returns `None` when the
/// clamped rectangle is empty.
pub fn clamped_bounds(points: &[Point2<f32>], width: usize, height: usize) -> Option<PixelRect> {
    if points.is_empty() {
        return None;
    }
    let mut x_min = i64::MAX;
    let mut y_min = i64::MAX;
    let mut x_max = i64::MIN;
    let mut y_max = i64::MIN;
    for p in points {
        let x = p.x.round() as i64;
        let y = p.y.round() as i64;
        x_min = x_min.min(x);
        y_min = y_min.min(y);
        x_max = x_max.max(x);
        y_max = y_max.max(y);
    }
    let x0 = x_min.clamp(0, width as i64);
    let y0 = y_min.clamp(0, height as i64);
    let x1 = (x_max + 1).clamp(0, width as i64);
    let y1 = (y_max + 1).clamp(0, height as i64);
    let rect = PixelRect {
        x: x0 as usize,
        y: y0 as usize,
        width: (x1 - x0).max(0) as usize,
        height: (y1 - y0).max(0) as usize,
    };
    (!rect.is_empty()).then_some(rect)
}

pub fn polygon_area(points: &[Point2<f32>]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        acc += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    (0.5 * acc).abs() as f32
}

fn cross(o: &Point2<f32>, a: &Point2<f32>, b: &Point2<f32>) -> f64 {
    (a.x - o.x) as f64 * (b.y - o.y) as f64 - (a.y - o.y) as f64 * (b.x - o.x) as f64
}

/// Convex hull (Andrew's monotone chain), counter-clockwise in a y-up frame.
/// Collinear points are dropped.
pub fn convex_hull(points: &[Point2<f32>]) -> Vec<Point2<f32>> {
    let mut pts: Vec<Point2<f32>> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point2<f32>> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0
        {
            lower.pop();
        }
        lower.push(*p);
    }
    let mut upper: Vec<Point2<f32>> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0
        {
            upper.pop();
        }
        upper.push(*p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Minimum-area enclosing rectangle via rotating calipers over the hull edges.
///
/// Degenerate inputs (a single point, collinear points) produce a rectangle
/// with zero width or height rather than `None`; `None` is reserved for an
/// empty point set.
pub fn min_area_rect(points: &[Point2<f32>]) -> Option<RotatedRect> {
    let hull = convex_hull(points);
    match hull.len() {
        0 => return None,
        1 => {
            return Some(RotatedRect {
                center: hull[0],
                width: 0.0,
                height: 0.0,
                angle_deg: 0.0,
            })
        }
        _ => {}
    }

    let mut best: Option<(f32, RotatedRect)> = None;
    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        let edge = b - a;
        let len = edge.norm();
        if len <= f32::EPSILON {
            continue;
        }
        let u = edge / len;
        let v = Vector2::new(-u.y, u.x);

        let (mut u_min, mut u_max) = (f32::INFINITY, f32::NEG_INFINITY);
        let (mut v_min, mut v_max) = (f32::INFINITY, f32::NEG_INFINITY);
        for p in &hull {
            let d = *p - a;
            let pu = d.dot(&u);
            let pv = d.dot(&v);
            u_min = u_min.min(pu);
            u_max = u_max.max(pu);
            v_min = v_min.min(pv);
            v_max = v_max.max(pv);
        }
        let w = u_max - u_min;
        let h = v_max - v_min;
        let area = w * h;
        if best.as_ref().is_some_and(|(best_area, _)| *best_area <= area) {
            continue;
        }

        let center = a + u * (0.5 * (u_min + u_max)) + v * (0.5 * (v_min + v_max));
        best = Some((area, normalized_rect(center, w, h, u.y.atan2(u.x).to_degrees())));
    }
    best.map(|(_, r)| r)
}

/// Bring the rectangle angle into `[0, 90)`, swapping sides when the
/// width direction is rotated by a quarter turn.
fn normalized_rect(center: Point2<f32>, width: f32, height: f32, angle_deg: f32) -> RotatedRect {
    let a = angle_deg.rem_euclid(180.0);
    let (width, height, a) = if a >= 90.0 {
        (height, width, a - 90.0)
    } else {
        (width, height, a)
    };
    let a = if a >= 90.0 { 0.0 } else { a };
    RotatedRect {
        center,
        width,
        height,
        angle_deg: a,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square_outline(x0: f32, y0: f32, side: f32) -> Vec<Point2<f32>> {
        let mut pts = Vec::new();
        let n = side as usize;
        for i in 0..n {
            pts.push(Point2::new(x0 + i as f32, y0));
        }
        for i in 0..n {
            pts.push(Point2::new(x0 + side, y0 + i as f32));
        }
        for i in 0..n {
            pts.push(Point2::new(x0 + side - i as f32, y0 + side));
        }
        for i in 0..n {
            pts.push(Point2::new(x0, y0 + side - i as f32));
        }
        pts
    }

    #[test]
    fn segment_angle_is_folded_into_half_turn() {
        let right = LineSegment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        let left = LineSegment::new(Point2::new(10.0, 0.0), Point2::new(0.0, 0.0));
        let down = LineSegment::new(Point2::new(0.0, 0.0), Point2::new(0.0, 10.0));
        let up = LineSegment::new(Point2::new(0.0, 10.0), Point2::new(0.0, 0.0));
        assert_abs_diff_eq!(right.angle_deg(), 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(left.angle_deg(), 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(down.angle_deg(), 90.0, epsilon = 1e-4);
        assert_abs_diff_eq!(up.angle_deg(), 90.0, epsilon = 1e-4);
        assert_abs_diff_eq!(right.length(), 10.0);
    }

    #[test]
    fn contour_area_of_square_outline() {
        let c = Contour::new(square_outline(5.0, 5.0, 20.0));
        assert_abs_diff_eq!(c.area(), 400.0, epsilon = 1e-3);
    }

    #[test]
    fn min_area_rect_axis_aligned() {
        let c = Contour::new(square_outline(10.0, 20.0, 30.0));
        let r = c.min_area_rect().expect("rect");
        assert_abs_diff_eq!(r.width, 30.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.height, 30.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.center.x, 25.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.center.y, 35.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.axis_deviation_deg(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn min_area_rect_rotated_square() {
        let center = Point2::new(50.0f32, 50.0);
        let truth = RotatedRect {
            center,
            width: 40.0,
            height: 20.0,
            angle_deg: 30.0,
        };
        let r = min_area_rect(&truth.corners()).expect("rect");
        assert_abs_diff_eq!(r.area(), 800.0, epsilon = 1e-2);
        assert_abs_diff_eq!(r.center.x, 50.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.center.y, 50.0, epsilon = 1e-3);
        // Either (40 x 20 @ 30°) or the equivalent (20 x 40 @ 120° -> 30° + swap).
        let long = r.width.max(r.height);
        assert_abs_diff_eq!(long, 40.0, epsilon = 1e-2);
        assert!(r.angle_deg >= 0.0 && r.angle_deg < 90.0);
        assert_abs_diff_eq!(r.axis_deviation_deg(), 30.0, epsilon = 1e-2);
    }

    #[test]
    fn collinear_points_give_degenerate_rect() {
        let pts: Vec<Point2<f32>> = (0..10).map(|i| Point2::new(i as f32, 3.0)).collect();
        let r = min_area_rect(&pts).expect("rect");
        assert!(r.width == 0.0 || r.height == 0.0);
        assert!(min_area_rect(&[]).is_none());
    }

    #[test]
    fn clamped_bounds_include_last_pixel() {
        let pts = [Point2::new(2.2, 3.0), Point2::new(7.0, 9.4)];
        let r = clamped_bounds(&pts, 100, 100).unwrap();
        assert_eq!(
            r,
            PixelRect {
                x: 2,
                y: 3,
                width: 6,
                height: 7
            }
        );
        let outside = [Point2::new(-20.0, -20.0), Point2::new(-5.0, -5.0)];
        assert!(clamped_bounds(&outside, 100, 100).is_none());
    }

    #[test]
    fn rect_from_ordered_corners() {
        let truth = RotatedRect {
            center: Point2::new(40.0, 30.0),
            width: 20.0,
            height: 12.0,
            angle_deg: 25.0,
        };
        let r = RotatedRect::from_corners(truth.corners());
        assert_abs_diff_eq!(r.center.x, 40.0, epsilon = 1e-4);
        assert_abs_diff_eq!(r.center.y, 30.0, epsilon = 1e-4);
        assert_abs_diff_eq!(r.width, 20.0, epsilon = 1e-4);
        assert_abs_diff_eq!(r.height, 12.0, epsilon = 1e-4);
        assert_abs_diff_eq!(r.angle_deg, 25.0, epsilon = 1e-3);

        // Starting on the short side swaps width and height into [0, 90).
        let c = truth.corners();
        let r = RotatedRect::from_corners([c[1], c[2], c[3], c[0]]);
        assert_abs_diff_eq!(r.width, 20.0, epsilon = 1e-4);
        assert_abs_diff_eq!(r.height, 12.0, epsilon = 1e-4);
        assert_abs_diff_eq!(r.angle_deg, 25.0, epsilon = 1e-3);
    }
}
