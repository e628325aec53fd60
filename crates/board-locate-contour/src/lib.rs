//! Contour-based chessboard localization.
//!
//! Pipeline:
//! 1. blur + Canny over the whole frame, then probabilistic Hough segments;
//! 2. require at least `grid_line_threshold` horizontal *and* vertical
//!    segments ([`count_grid_lines`]);
//! 3. outer contours, filtered to near-square, near-axis-aligned rectangles
//!    ([`find_square_candidates`]);
//! 4. re-run the segment count on each candidate crop and combine it with
//!    crop shape and size into a confidence ([`compute_confidence`]);
//! 5. keep the best candidate at or above the acceptance threshold
//!    ([`select_best`]).
//!
//! ```no_run
//! use board_locate_contour::{ContourBoardDetector, ContourDetectorParams, MinArea};
//! use board_locate_core::{GrayImageView, ImageprocPrimitives};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (w, h) = (640usize, 480usize);
//! let pixels = vec![0u8; w * h];
//! let view = GrayImageView::new(w, h, &pixels)?;
//!
//! let params = ContourDetectorParams::new(MinArea::FractionOfFrame { fraction: 0.01 });
//! let detector = ContourBoardDetector::new(params)?;
//! let detection = detector.detect(&ImageprocPrimitives, &view);
//! println!("{detection:?}");
//! # Ok(())
//! # }
//! ```

mod candidates;
mod detector;
mod grid_lines;
mod params;
mod scoring;
mod select;

pub use candidates::{find_square_candidates, SquareCandidate};
pub use detector::ContourBoardDetector;
pub use grid_lines::{
    classify_angle, classify_segment, count_grid_lines, extract_edges, measure_grid_lines,
    LineOrientation,
};
pub use params::{
    ContourDetectorParams, EdgeParams, GridLineParams, MinArea, ParamsError, SquareParams,
};
pub use scoring::{
    compute_confidence, score_candidate, score_candidates, Confidence, ScoredCandidate,
    ASPECT_WEIGHT, GRID_SATURATION_LINES, GRID_WEIGHT, SIZE_SATURATION_RATIO, SIZE_WEIGHT,
};
pub use select::select_best;
