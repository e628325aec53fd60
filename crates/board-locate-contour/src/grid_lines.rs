//! Horizontal / vertical segment counting.

use board_locate_core::{
    EdgeMap, GrayImageView, GridLineCounts, HoughSegmentParams, ImagePrimitives, LineSegment,
};

use crate::params::{EdgeParams, GridLineParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineOrientation {
    Horizontal,
    Vertical,
    /// Inside the dead zone between the two bands.
    Oblique,
}

/// Classify one segment by its direction.
pub fn classify_segment(segment: &LineSegment, params: &GridLineParams) -> LineOrientation {
    classify_angle(segment.angle_deg(), params)
}

/// Classify a direction in `[0, 180)` degrees.
///
/// The angle is folded to its distance from the x axis first, so 100° sits on
/// the 80° band edge. Both band limits are exclusive.
pub fn classify_angle(angle_deg: f32, params: &GridLineParams) -> LineOrientation {
    let folded = angle_deg.min(180.0 - angle_deg);
    if folded < params.horizontal_max_deg {
        LineOrientation::Horizontal
    } else if folded > params.vertical_min_deg {
        LineOrientation::Vertical
    } else {
        LineOrientation::Oblique
    }
}

pub fn count_grid_lines(segments: &[LineSegment], params: &GridLineParams) -> GridLineCounts {
    segments
        .iter()
        .fold(GridLineCounts::default(), |mut acc, s| {
            match classify_segment(s, params) {
                LineOrientation::Horizontal => acc.horizontal += 1,
                LineOrientation::Vertical => acc.vertical += 1,
                LineOrientation::Oblique => {}
            }
            acc
        })
}

/// Blur, then extract edges.
pub fn extract_edges<P: ImagePrimitives + ?Sized>(
    primitives: &P,
    image: &GrayImageView<'_>,
    params: &EdgeParams,
) -> EdgeMap {
    let blurred = primitives.blur(image, params.blur_sigma);
    primitives.edges(&blurred.view(), params.low_threshold, params.high_threshold)
}

/// Segment counts of an already computed edge map.
pub fn measure_grid_lines<P: ImagePrimitives + ?Sized>(
    primitives: &P,
    edges: &EdgeMap,
    hough: &HoughSegmentParams,
    bands: &GridLineParams,
) -> GridLineCounts {
    count_grid_lines(&primitives.line_segments(edges, hough), bands)
}
