#[cfg(feature = "tracing")]
use tracing::instrument;

use board_locate_core::{
    BoardLocation, DetectContext, Detection, GrayImageView, ImagePrimitives, NotFoundReason,
    SearchPass,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::params::{fine_band, ParamsError, TemplateDetectorParams};
use crate::scale_search::{MatchResult, ScaleSearch};
use crate::template::BoardTemplate;

/// What each stage of the coarse-to-fine search produced.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoarseToFineMatch {
    /// Coarse match, in downsampled coordinates.
    pub coarse: MatchResult,
    /// Full-resolution refinement, if any scale in the band matched.
    pub fine: Option<MatchResult>,
    /// Final full-resolution match: `fine`, or `coarse` mapped back.
    pub best: MatchResult,
}

/// Locates a known board image at unknown scale and position.
#[derive(Clone, Debug)]
pub struct TemplateBoardDetector {
    template: BoardTemplate,
    params: TemplateDetectorParams,
}

impl TemplateBoardDetector {
    pub fn new(template: BoardTemplate, params: TemplateDetectorParams) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self { template, params })
    }

    #[inline]
    pub fn template(&self) -> &BoardTemplate {
        &self.template
    }

    #[inline]
    pub fn params(&self) -> &TemplateDetectorParams {
        &self.params
    }

    /// Coarse-to-fine detection with the default context.
    pub fn detect<P: ImagePrimitives + ?Sized>(
        &self,
        primitives: &P,
        target: &GrayImageView<'_>,
    ) -> Detection {
        self.detect_with(primitives, target, &DetectContext::default())
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(width = target.width, height = target.height))
    )]
    pub fn detect_with<P: ImagePrimitives + ?Sized>(
        &self,
        primitives: &P,
        target: &GrayImageView<'_>,
        ctx: &DetectContext<'_>,
    ) -> Detection {
        to_detection(
            "template",
            self.coarse_to_fine(primitives, target, ctx).map(|m| m.best),
        )
    }

    /// Run both stages and return the intermediate matches.
    ///
    /// The coarse pass runs on the target and template resampled by
    /// `downsample_factor`. Without a coarse match the search ends there. The
    /// fine pass sweeps `coarse.scale ± fine_band_width` at full resolution;
    /// if it finds nothing the coarse location is scaled back up.
    pub fn coarse_to_fine<P: ImagePrimitives + ?Sized>(
        &self,
        primitives: &P,
        target: &GrayImageView<'_>,
        ctx: &DetectContext<'_>,
    ) -> Result<CoarseToFineMatch, NotFoundReason> {
        let p = &self.params;
        if target.is_empty() {
            return Err(NotFoundReason::EmptyImage);
        }
        if ctx.is_cancelled() {
            return Err(NotFoundReason::Cancelled);
        }

        let ds = p.downsample_factor;
        let small_target = primitives
            .resize(target, ds)
            .ok_or(NotFoundReason::NoTemplateMatchAnyScale)?;
        let small_template = primitives
            .resize(&self.template.view(), ds)
            .ok_or(NotFoundReason::NoTemplateMatchAnyScale)?;

        let coarse_scales = match p.coarse_scales {
            Some(range) => range.values(),
            None => self.template.scales().to_vec(),
        };
        let coarse = ScaleSearch {
            threshold: p.coarse_threshold,
            min_template_side: p.min_template_side,
            pass: SearchPass::Coarse,
        }
        .run(
            primitives,
            &small_target.view(),
            &small_template.view(),
            &coarse_scales,
            ctx,
        )?
        .ok_or(NotFoundReason::NoTemplateMatchAnyScale)?;

        let band = fine_band(coarse.scale, p.fine_band_width, p.fine_step);
        let fine = ScaleSearch {
            threshold: p.fine_threshold,
            min_template_side: p.min_template_side,
            pass: SearchPass::Fine,
        }
        .run(primitives, target, &self.template.view(), &band, ctx)?;

        let best = match fine {
            Some(m) => m,
            None => {
                log::debug!("fine pass empty, falling back to coarse match");
                self.upscale_coarse(&coarse, ds)
            }
        };
        Ok(CoarseToFineMatch { coarse, fine, best })
    }

    /// Exhaustive full-resolution sweep over `single_pass.scales`.
    pub fn detect_single_pass<P: ImagePrimitives + ?Sized>(
        &self,
        primitives: &P,
        target: &GrayImageView<'_>,
        ctx: &DetectContext<'_>,
    ) -> Detection {
        let result = if target.is_empty() {
            Err(NotFoundReason::EmptyImage)
        } else {
            let sp = self.params.single_pass;
            ScaleSearch {
                threshold: sp.threshold,
                min_template_side: self.params.min_template_side,
                pass: SearchPass::Single,
            }
            .run(primitives, target, &self.template.view(), &sp.scales.values(), ctx)
            .and_then(|m| m.ok_or(NotFoundReason::NoTemplateMatchAnyScale))
        };
        to_detection("template (single pass)", result)
    }

    /// Map a downsampled match back to full resolution, keeping its scale.
    fn upscale_coarse(&self, coarse: &MatchResult, ds: f32) -> MatchResult {
        let (w, h) = self.template.scaled_size(coarse.scale);
        MatchResult {
            top_left: Point2::new(
                (coarse.top_left.x as f32 / ds).round() as i32,
                (coarse.top_left.y as f32 / ds).round() as i32,
            ),
            score: coarse.score,
            scale: coarse.scale,
            template_width: w,
            template_height: h,
        }
    }
}

fn to_detection(label: &str, result: Result<MatchResult, NotFoundReason>) -> Detection {
    match result {
        Ok(m) => {
            log::info!(
                "{label}: board found, score {:.3} at scale {:.4}, top-left ({}, {})",
                m.score,
                m.scale,
                m.top_left.x,
                m.top_left.y
            );
            Detection::Found(BoardLocation {
                region: m.region(),
                score: m.score,
            })
        }
        Err(reason) => {
            log::info!("{label}: no board ({reason})");
            Detection::not_found(reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use board_locate_core::{
        BoundingRegion, CancelToken, Contour, EdgeMap, GrayImage, PixelRect, RecordingObserver,
    };

    struct Builtin;

    impl ImagePrimitives for Builtin {
        fn blur(&self, image: &GrayImageView<'_>, _sigma: f32) -> GrayImage {
            image.crop(PixelRect {
                x: 0,
                y: 0,
                width: image.width,
                height: image.height,
            })
        }
        fn edges(&self, image: &GrayImageView<'_>, _low: f32, _high: f32) -> EdgeMap {
            EdgeMap::empty(image.width, image.height)
        }
        fn contours(&self, _edges: &EdgeMap) -> Vec<Contour> {
            Vec::new()
        }
    }

    /// 8x8 board of `cell`-pixel squares.
    fn board(cell: usize) -> GrayImage {
        let side = 8 * cell;
        let mut img = GrayImage::filled(side, side, 235);
        for r in 0..8 {
            for c in 0..8 {
                if (r + c) % 2 == 1 {
                    img.fill_rect(
                        PixelRect {
                            x: c * cell,
                            y: r * cell,
                            width: cell,
                            height: cell,
                        },
                        20,
                    );
                }
            }
        }
        img
    }

    /// 80x80 template pasted at 0.4 (32 px) into a 120x120 canvas at (30, 44).
    fn scene() -> (BoardTemplate, GrayImage) {
        let tpl = board(10);
        let small = tpl.view().resize_by_factor(0.4).expect("resize");
        let mut canvas = GrayImage::filled(120, 120, 128);
        canvas.paste(&small.view(), 30, 44);
        (BoardTemplate::new(tpl).expect("template"), canvas)
    }

    #[test]
    fn coarse_then_fine_recovers_scale_and_position() {
        let (tpl, canvas) = scene();
        let det = TemplateBoardDetector::new(tpl, TemplateDetectorParams::default()).expect("params");
        let observer = RecordingObserver::default();
        let ctx = DetectContext::default().with_observer(&observer);

        let m = det
            .coarse_to_fine(&Builtin, &canvas.view(), &ctx)
            .expect("match");
        assert_abs_diff_eq!(m.coarse.scale, 0.4, epsilon = 0.05);
        let fine = m.fine.expect("fine pass matched");
        assert_abs_diff_eq!(fine.scale, 0.4, epsilon = 0.002);
        assert!((fine.top_left.x - 30).abs() <= 2, "{fine:?}");
        assert!((fine.top_left.y - 44).abs() <= 2, "{fine:?}");
        assert_eq!(m.best, fine);

        let scales = observer.scales();
        assert_eq!(
            scales.iter().filter(|e| e.pass == SearchPass::Coarse).count(),
            50
        );
        assert_eq!(
            scales.iter().filter(|e| e.pass == SearchPass::Fine).count(),
            11
        );
    }

    #[test]
    fn detection_region_uses_template_size() {
        let (tpl, canvas) = scene();
        let det = TemplateBoardDetector::new(tpl, TemplateDetectorParams::default()).expect("params");
        let detection = det.detect(&Builtin, &canvas.view());
        let loc = detection.found().expect("found");
        let BoundingRegion::Axis {
            top_left,
            bottom_right,
        } = loc.region
        else {
            panic!("expected axis region, got {:?}", loc.region);
        };
        let w = bottom_right.x - top_left.x;
        let h = bottom_right.y - top_left.y;
        assert!((w - 32).abs() <= 1 && (h - 32).abs() <= 1, "{w}x{h}");
        assert!(loc.score > 0.9);
    }

    #[test]
    fn no_match_on_flat_target() {
        let (tpl, _) = scene();
        let det = TemplateBoardDetector::new(tpl, TemplateDetectorParams::default()).expect("params");
        let flat = GrayImage::filled(120, 120, 128);
        assert_eq!(
            det.detect(&Builtin, &flat.view()).reason(),
            Some(NotFoundReason::NoTemplateMatchAnyScale)
        );
    }

    #[test]
    fn template_larger_than_target_at_every_scale() {
        let tpl = BoardTemplate::with_scales(board(10), vec![2.0, 3.0]).expect("template");
        let det = TemplateBoardDetector::new(tpl, TemplateDetectorParams::default()).expect("params");
        let canvas = GrayImage::filled(100, 100, 128);
        assert_eq!(
            det.detect(&Builtin, &canvas.view()).reason(),
            Some(NotFoundReason::NoTemplateMatchAnyScale)
        );
    }

    #[test]
    fn empty_and_cancelled() {
        let (tpl, canvas) = scene();
        let det = TemplateBoardDetector::new(tpl, TemplateDetectorParams::default()).expect("params");
        let empty = GrayImageView::new(0, 0, &[]).expect("view");
        assert_eq!(
            det.detect(&Builtin, &empty).reason(),
            Some(NotFoundReason::EmptyImage)
        );

        let token = CancelToken::new();
        token.cancel();
        let ctx = DetectContext::default().with_cancel(&token);
        assert_eq!(
            det.detect_with(&Builtin, &canvas.view(), &ctx).reason(),
            Some(NotFoundReason::Cancelled)
        );
    }

    #[test]
    fn coarse_fallback_maps_back_to_full_resolution() {
        let (tpl, _) = scene();
        let det = TemplateBoardDetector::new(tpl, TemplateDetectorParams::default()).expect("params");
        let coarse = MatchResult {
            top_left: Point2::new(15, 22),
            score: 0.8,
            scale: 0.4,
            template_width: 16,
            template_height: 16,
        };
        let up = det.upscale_coarse(&coarse, 0.5);
        assert_eq!(up.top_left, Point2::new(30, 44));
        assert_eq!((up.template_width, up.template_height), (32, 32));
        assert_eq!(up.scale, 0.4);
    }

    #[test]
    fn single_pass_finds_the_board() {
        let (tpl, canvas) = scene();
        let mut params = TemplateDetectorParams::default();
        params.single_pass.scales = crate::ScaleRange {
            start: 0.3,
            end: 0.5,
            samples: 21,
        };
        let det = TemplateBoardDetector::new(tpl, params).expect("params");
        let detection = det.detect_single_pass(&Builtin, &canvas.view(), &DetectContext::default());
        let loc = detection.found().expect("found");
        let c = loc.region.center();
        assert!((c.x - 46.0).abs() <= 2.0 && (c.y - 60.0).abs() <= 2.0, "{c:?}");
    }
}
