use board_locate_core::HoughSegmentParams;
use serde::{Deserialize, Serialize};

/// Minimum contour area policy.
///
/// There is deliberately no default: callers either fix an absolute pixel
/// count or tie the threshold to a resolution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum MinArea {
    /// Fixed threshold in square pixels.
    Absolute { pixels: f32 },
    /// `fraction * reference_area`, e.g. 1% of a configured capture resolution.
    FractionOfReference { reference_area: f32, fraction: f32 },
    /// `fraction * width * height` of the frame being processed.
    FractionOfFrame { fraction: f32 },
}

impl MinArea {
    /// Threshold in square pixels for a frame of the given size.
    pub fn resolve(&self, frame_width: usize, frame_height: usize) -> f32 {
        match *self {
            Self::Absolute { pixels } => pixels,
            Self::FractionOfReference {
                reference_area,
                fraction,
            } => reference_area * fraction,
            Self::FractionOfFrame { fraction } => (frame_width * frame_height) as f32 * fraction,
        }
    }
}

/// Blur + Canny settings shared by the frame and the per-candidate passes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeParams {
    /// Gaussian sigma; 1.1 matches a 5x5 kernel.
    pub blur_sigma: f32,
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            low_threshold: 50.0,
            high_threshold: 100.0,
        }
    }
}

/// Angle bands used to call a segment horizontal or vertical.
///
/// Angles are folded into `[0°, 90°]` first, so the bands apply to both
/// segment directions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLineParams {
    /// Folded angles strictly below this are horizontal.
    pub horizontal_max_deg: f32,
    /// Folded angles strictly above this are vertical.
    pub vertical_min_deg: f32,
}

impl Default for GridLineParams {
    fn default() -> Self {
        Self {
            horizontal_max_deg: 10.0,
            vertical_min_deg: 80.0,
        }
    }
}

/// Shape filter for contour rectangles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquareParams {
    /// Accept rectangles within this many degrees of an axis-aligned pose.
    pub max_rotation_deg: f32,
    /// Accept `1 - tol < long/short < 1 + tol`.
    pub square_tolerance: f32,
}

impl Default for SquareParams {
    fn default() -> Self {
        Self {
            max_rotation_deg: 5.0,
            square_tolerance: 0.1,
        }
    }
}

fn default_grid_line_threshold() -> usize {
    6
}

fn default_acceptance_threshold() -> f32 {
    0.5
}

/// Configuration for [`crate::ContourBoardDetector`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContourDetectorParams {
    pub min_area: MinArea,
    /// Minimum horizontal *and* vertical segments in the whole frame.
    #[serde(default = "default_grid_line_threshold")]
    pub grid_line_threshold: usize,
    /// Minimum confidence of the best candidate.
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f32,
    #[serde(default)]
    pub edges: EdgeParams,
    #[serde(default)]
    pub hough: HoughSegmentParams,
    #[serde(default)]
    pub grid_lines: GridLineParams,
    #[serde(default)]
    pub squares: SquareParams,
}

impl ContourDetectorParams {
    pub fn new(min_area: MinArea) -> Self {
        Self {
            min_area,
            grid_line_threshold: default_grid_line_threshold(),
            acceptance_threshold: default_acceptance_threshold(),
            edges: EdgeParams::default(),
            hough: HoughSegmentParams::default(),
            grid_lines: GridLineParams::default(),
            squares: SquareParams::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        let min_area_ok = match self.min_area {
            MinArea::Absolute { pixels } => pixels.is_finite() && pixels >= 0.0,
            MinArea::FractionOfReference {
                reference_area,
                fraction,
            } => {
                reference_area.is_finite()
                    && reference_area >= 0.0
                    && fraction.is_finite()
                    && fraction >= 0.0
            }
            MinArea::FractionOfFrame { fraction } => fraction.is_finite() && fraction >= 0.0,
        };
        if !min_area_ok {
            return Err(ParamsError::MinArea(self.min_area));
        }
        if !(0.0..=1.0).contains(&self.acceptance_threshold) {
            return Err(ParamsError::AcceptanceThreshold(self.acceptance_threshold));
        }
        let g = self.grid_lines;
        if !(0.0 <= g.horizontal_max_deg
            && g.horizontal_max_deg <= g.vertical_min_deg
            && g.vertical_min_deg <= 90.0)
        {
            return Err(ParamsError::GridLineBands {
                horizontal_max_deg: g.horizontal_max_deg,
                vertical_min_deg: g.vertical_min_deg,
            });
        }
        let s = self.squares;
        if !(s.square_tolerance > 0.0 && s.max_rotation_deg >= 0.0) {
            return Err(ParamsError::SquareFilter {
                max_rotation_deg: s.max_rotation_deg,
                square_tolerance: s.square_tolerance,
            });
        }
        Ok(())
    }
}

/// Rejected configuration values.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("invalid minimum-area policy {0:?}")]
    MinArea(MinArea),
    #[error("acceptance threshold {0} outside [0, 1]")]
    AcceptanceThreshold(f32),
    #[error("grid-line bands must satisfy 0 <= {horizontal_max_deg} <= {vertical_min_deg} <= 90")]
    GridLineBands {
        horizontal_max_deg: f32,
        vertical_min_deg: f32,
    },
    #[error("invalid square filter (max_rotation_deg={max_rotation_deg}, square_tolerance={square_tolerance})")]
    SquareFilter {
        max_rotation_deg: f32,
        square_tolerance: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_area_policies_resolve() {
        assert_eq!(MinArea::Absolute { pixels: 500.0 }.resolve(640, 480), 500.0);
        let reference = MinArea::FractionOfReference {
            reference_area: 1920.0 * 1080.0,
            fraction: 0.01,
        };
        assert!((reference.resolve(10, 10) - 20736.0).abs() < 1e-2);
        let frame = MinArea::FractionOfFrame { fraction: 0.01 };
        assert!((frame.resolve(800, 800) - 6400.0).abs() < 1e-3);
    }

    #[test]
    fn defaults_validate() {
        let params = ContourDetectorParams::new(MinArea::Absolute { pixels: 500.0 });
        assert_eq!(params.grid_line_threshold, 6);
        assert_eq!(params.acceptance_threshold, 0.5);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let mut params = ContourDetectorParams::new(MinArea::Absolute { pixels: -1.0 });
        assert!(matches!(params.validate(), Err(ParamsError::MinArea(_))));

        params.min_area = MinArea::Absolute { pixels: 1.0 };
        params.acceptance_threshold = 1.5;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::AcceptanceThreshold(_))
        ));

        params.acceptance_threshold = 0.5;
        params.grid_lines.horizontal_max_deg = 85.0;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::GridLineBands { .. })
        ));
    }

    #[test]
    fn json_fills_defaults_but_requires_min_area() {
        let params: ContourDetectorParams = serde_json::from_str(
            r#"{ "min_area": { "policy": "fraction_of_frame", "fraction": 0.01 } }"#,
        )
        .expect("parse");
        assert_eq!(
            params,
            ContourDetectorParams::new(MinArea::FractionOfFrame { fraction: 0.01 })
        );

        let missing = serde_json::from_str::<ContourDetectorParams>("{}");
        assert!(missing.is_err());
    }
}
