//! Per-candidate confidence.
//!
//! Each candidate is cropped out of the frame, the edge + segment pipeline is
//! re-run on the crop, and the result is folded into one number:
//!
//! ```text
//! grid   = min(h / 7, 1) * min(v / 7, 1)
//! aspect = max(0, 1 - |max(w, h) / min(w, h) - 1|)
//! size   = min((w * h) / (W * H) / 0.05, 1)
//! conf   = 0.4 * grid + 0.4 * aspect + 0.2 * size
//! ```
//!
//! A full 8x8 board has 7 interior lines per axis, so 7 saturates the grid
//! term; a board covering 5% of the frame saturates the size term.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use board_locate_core::{
    clamped_bounds, CandidateScored, DetectContext, GrayImageView, GridCheckStage,
    GridLineCounts, ImagePrimitives, PixelRect,
};
use serde::{Deserialize, Serialize};

use crate::candidates::SquareCandidate;
use crate::grid_lines::{extract_edges, measure_grid_lines};
use crate::params::ContourDetectorParams;

pub const GRID_WEIGHT: f32 = 0.4;
pub const ASPECT_WEIGHT: f32 = 0.4;
pub const SIZE_WEIGHT: f32 = 0.2;
/// Interior lines per axis on an 8x8 board.
pub const GRID_SATURATION_LINES: f32 = 7.0;
/// Frame-area fraction at which the size term saturates.
pub const SIZE_SATURATION_RATIO: f32 = 0.05;

/// The three terms and their weighted sum, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub grid_score: f32,
    pub aspect_penalty: f32,
    pub size_penalty: f32,
    pub value: f32,
}

/// Combine crop geometry and crop line counts into a confidence.
///
/// Returns `None` when the crop or the frame has zero area.
pub fn compute_confidence(
    crop_width: usize,
    crop_height: usize,
    frame_width: usize,
    frame_height: usize,
    lines: GridLineCounts,
) -> Option<Confidence> {
    if crop_width == 0 || crop_height == 0 || frame_width == 0 || frame_height == 0 {
        return None;
    }
    let saturate = |n: usize| (n as f32 / GRID_SATURATION_LINES).min(1.0);
    let grid_score = saturate(lines.horizontal) * saturate(lines.vertical);

    let aspect = crop_width.max(crop_height) as f32 / crop_width.min(crop_height) as f32;
    let aspect_penalty = (1.0 - (aspect - 1.0).abs()).max(0.0);

    let area_ratio =
        (crop_width * crop_height) as f32 / (frame_width as f32 * frame_height as f32);
    let size_penalty = (area_ratio / SIZE_SATURATION_RATIO).min(1.0);

    Some(Confidence {
        grid_score,
        aspect_penalty,
        size_penalty,
        value: GRID_WEIGHT * grid_score + ASPECT_WEIGHT * aspect_penalty + SIZE_WEIGHT * size_penalty,
    })
}

/// A candidate together with its crop, crop line counts and confidence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// Position in the generator output.
    pub index: usize,
    pub candidate: SquareCandidate,
    pub crop: PixelRect,
    pub lines: GridLineCounts,
    pub confidence: Confidence,
}

impl ScoredCandidate {
    fn event(&self) -> CandidateScored {
        CandidateScored {
            index: self.index,
            crop: self.crop,
            lines: self.lines,
            grid_score: self.confidence.grid_score,
            aspect_penalty: self.confidence.aspect_penalty,
            size_penalty: self.confidence.size_penalty,
            confidence: self.confidence.value,
        }
    }
}

/// Score one candidate. `None` when its clamped crop is empty.
pub fn score_candidate<P: ImagePrimitives + ?Sized>(
    primitives: &P,
    image: &GrayImageView<'_>,
    index: usize,
    candidate: &SquareCandidate,
    params: &ContourDetectorParams,
) -> Option<ScoredCandidate> {
    let crop = clamped_bounds(&candidate.corners, image.width, image.height)?;
    let patch = image.crop(crop);
    let edges = extract_edges(primitives, &patch.view(), &params.edges);
    let lines = measure_grid_lines(primitives, &edges, &params.hough, &params.grid_lines);
    let confidence = compute_confidence(crop.width, crop.height, image.width, image.height, lines)?;
    Some(ScoredCandidate {
        index,
        candidate: *candidate,
        crop,
        lines,
        confidence,
    })
}

/// Score every candidate, in generator order.
///
/// Candidates with empty crops are left out. Returns `None` if the context is
/// cancelled before all candidates were scored. Observer events are emitted
/// after scoring, in candidate order, regardless of the `rayon` feature.
pub fn score_candidates<P: ImagePrimitives + ?Sized>(
    primitives: &P,
    image: &GrayImageView<'_>,
    candidates: &[SquareCandidate],
    params: &ContourDetectorParams,
    ctx: &DetectContext<'_>,
) -> Option<Vec<ScoredCandidate>> {
    let score_one = |(index, candidate): (usize, &SquareCandidate)| {
        if ctx.is_cancelled() {
            return None;
        }
        Some(score_candidate(primitives, image, index, candidate, params))
    };

    #[cfg(feature = "rayon")]
    let scored: Option<Vec<Option<ScoredCandidate>>> =
        candidates.par_iter().enumerate().map(score_one).collect();
    #[cfg(not(feature = "rayon"))]
    let scored: Option<Vec<Option<ScoredCandidate>>> =
        candidates.iter().enumerate().map(score_one).collect();

    let scored: Vec<ScoredCandidate> = scored?.into_iter().flatten().collect();
    for s in &scored {
        ctx.observer.grid_lines_counted(GridCheckStage::Candidate, s.lines);
        ctx.observer.candidate_scored(&s.event());
        log::debug!(
            "candidate {} crop={}x{}@({},{}) lines=h{}/v{} conf={:.3}",
            s.index,
            s.crop.width,
            s.crop.height,
            s.crop.x,
            s.crop.y,
            s.lines.horizontal,
            s.lines.vertical,
            s.confidence.value
        );
    }
    Some(scored)
}
