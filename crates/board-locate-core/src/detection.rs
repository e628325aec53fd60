use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::RotatedRect;

/// Where a board was found.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundingRegion {
    /// Minimum-area rectangle of the accepted contour.
    Rotated {
        rect: RotatedRect,
        corners: [Point2<f32>; 4],
    },
    /// Axis-aligned box; `bottom_right` is exclusive.
    Axis {
        top_left: Point2<i32>,
        bottom_right: Point2<i32>,
    },
}

impl BoundingRegion {
    pub fn rotated(rect: RotatedRect) -> Self {
        Self::Rotated {
            rect,
            corners: rect.corners(),
        }
    }

    /// Axis-aligned `(x0, y0, x1, y1)` enclosing the region, `x1`/`y1`
    /// exclusive.
    pub fn axis_bounds(&self) -> (f32, f32, f32, f32) {
        match self {
            Self::Rotated { corners, .. } => corners.iter().fold(
                (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
                |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
            ),
            Self::Axis {
                top_left,
                bottom_right,
            } => (
                top_left.x as f32,
                top_left.y as f32,
                bottom_right.x as f32,
                bottom_right.y as f32,
            ),
        }
    }

    pub fn center(&self) -> Point2<f32> {
        match self {
            Self::Rotated { rect, .. } => rect.center,
            Self::Axis {
                top_left,
                bottom_right,
            } => Point2::new(
                0.5 * (top_left.x + bottom_right.x) as f32,
                0.5 * (top_left.y + bottom_right.y) as f32,
            ),
        }
    }
}

/// Why a detection call ended without a board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotFoundReason {
    /// Zero-area input image.
    EmptyImage,
    /// Fewer grid lines than required on at least one axis.
    InsufficientGridLines,
    NoContours,
    NoSquareCandidates,
    ConfidenceBelowThreshold,
    NoTemplateMatchAnyScale,
    /// The call observed a cancelled token or an expired deadline.
    Cancelled,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EmptyImage => "empty-image",
            Self::InsufficientGridLines => "insufficient-grid-lines",
            Self::NoContours => "no-contours",
            Self::NoSquareCandidates => "no-square-candidates",
            Self::ConfidenceBelowThreshold => "confidence-below-threshold",
            Self::NoTemplateMatchAnyScale => "no-template-match-any-scale",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A located board together with the score that accepted it: the confidence
/// for the contour path, the correlation score for the template path.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardLocation {
    pub region: BoundingRegion,
    pub score: f32,
}

/// Outcome of one detection call. Not finding a board is a normal result.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Detection {
    Found(BoardLocation),
    NotFound { reason: NotFoundReason },
}

impl Detection {
    pub fn not_found(reason: NotFoundReason) -> Self {
        Self::NotFound { reason }
    }

    pub fn found(&self) -> Option<&BoardLocation> {
        match self {
            Self::Found(loc) => Some(loc),
            Self::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn reason(&self) -> Option<NotFoundReason> {
        match self {
            Self::Found(_) => None,
            Self::NotFound { reason } => Some(*reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_render_kebab_case() {
        assert_eq!(
            NotFoundReason::InsufficientGridLines.to_string(),
            "insufficient-grid-lines"
        );
        assert_eq!(
            NotFoundReason::NoTemplateMatchAnyScale.to_string(),
            "no-template-match-any-scale"
        );
    }

    #[test]
    fn axis_region_bounds_and_center() {
        let region = BoundingRegion::Axis {
            top_left: Point2::new(10, 20),
            bottom_right: Point2::new(30, 60),
        };
        assert_eq!(region.axis_bounds(), (10.0, 20.0, 30.0, 60.0));
        assert_eq!(region.center(), Point2::new(20.0, 40.0));
    }

    #[test]
    fn rotated_region_bounds_cover_corners() {
        let region = BoundingRegion::rotated(RotatedRect {
            center: Point2::new(50.0, 50.0),
            width: 20.0,
            height: 10.0,
            angle_deg: 0.0,
        });
        let (x0, y0, x1, y1) = region.axis_bounds();
        assert_eq!((x0, y0, x1, y1), (40.0, 45.0, 60.0, 55.0));
    }

    #[test]
    fn detection_accessors() {
        let d = Detection::not_found(NotFoundReason::NoContours);
        assert!(!d.is_found());
        assert_eq!(d.reason(), Some(NotFoundReason::NoContours));
        assert!(d.found().is_none());
    }
}
