#[cfg(feature = "tracing")]
use tracing::instrument;

use board_locate_core::{
    BoardLocation, BoundingRegion, DetectContext, Detection, GrayImageView, GridCheckStage,
    ImagePrimitives, NotFoundReason,
};

use crate::candidates::find_square_candidates;
use crate::grid_lines::{extract_edges, measure_grid_lines};
use crate::params::{ContourDetectorParams, ParamsError};
use crate::scoring::score_candidates;
use crate::select::select_best;

/// Grid-line gated, contour based board detector.
///
/// The frame must show enough horizontal and vertical segments before any
/// contour is considered; every square-ish contour is then scored on its own
/// crop and the best one above the acceptance threshold wins.
#[derive(Clone, Debug)]
pub struct ContourBoardDetector {
    params: ContourDetectorParams,
}

impl ContourBoardDetector {
    pub fn new(params: ContourDetectorParams) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &ContourDetectorParams {
        &self.params
    }

    pub fn detect<P: ImagePrimitives + ?Sized>(
        &self,
        primitives: &P,
        image: &GrayImageView<'_>,
    ) -> Detection {
        self.detect_with(primitives, image, &DetectContext::default())
    }

    /// Detect with an observer and/or cancellation token.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(width = image.width, height = image.height))
    )]
    pub fn detect_with<P: ImagePrimitives + ?Sized>(
        &self,
        primitives: &P,
        image: &GrayImageView<'_>,
        ctx: &DetectContext<'_>,
    ) -> Detection {
        match self.run(primitives, image, ctx) {
            Ok(location) => {
                log::info!(
                    "contour: board found, confidence {:.3} at ({:.1}, {:.1})",
                    location.score,
                    location.region.center().x,
                    location.region.center().y
                );
                Detection::Found(location)
            }
            Err(reason) => {
                log::info!("contour: no board ({reason})");
                Detection::not_found(reason)
            }
        }
    }

    fn run<P: ImagePrimitives + ?Sized>(
        &self,
        primitives: &P,
        image: &GrayImageView<'_>,
        ctx: &DetectContext<'_>,
    ) -> Result<BoardLocation, NotFoundReason> {
        let params = &self.params;
        if image.is_empty() {
            return Err(NotFoundReason::EmptyImage);
        }
        check_cancel(ctx)?;

        let edges = extract_edges(primitives, image, &params.edges);
        let counts = measure_grid_lines(primitives, &edges, &params.hough, &params.grid_lines);
        ctx.observer.grid_lines_counted(GridCheckStage::Frame, counts);
        log::debug!(
            "frame grid lines: horizontal={} vertical={} (need {})",
            counts.horizontal,
            counts.vertical,
            params.grid_line_threshold
        );
        if counts.vertical < params.grid_line_threshold
            || counts.horizontal < params.grid_line_threshold
        {
            return Err(NotFoundReason::InsufficientGridLines);
        }
        check_cancel(ctx)?;

        let contours = primitives.contours(&edges);
        log::debug!("{} outer contours", contours.len());
        if contours.is_empty() {
            return Err(NotFoundReason::NoContours);
        }

        let min_area = params.min_area.resolve(image.width, image.height);
        let candidates = find_square_candidates(primitives, &contours, min_area, &params.squares);
        if candidates.is_empty() {
            return Err(NotFoundReason::NoSquareCandidates);
        }
        check_cancel(ctx)?;

        let scored = score_candidates(primitives, image, &candidates, params, ctx)
            .ok_or(NotFoundReason::Cancelled)?;
        let best = select_best(&scored, params.acceptance_threshold)?;

        Ok(BoardLocation {
            region: BoundingRegion::rotated(best.candidate.rect),
            score: best.confidence.value,
        })
    }
}

fn check_cancel(ctx: &DetectContext<'_>) -> Result<(), NotFoundReason> {
    if ctx.is_cancelled() {
        Err(NotFoundReason::Cancelled)
    } else {
        Ok(())
    }
}
