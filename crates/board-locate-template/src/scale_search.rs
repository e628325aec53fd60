//! Normalized correlation over a list of template scales.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use board_locate_core::{
    BoundingRegion, DetectContext, GrayImageView, ImagePrimitives, NotFoundReason,
    ScaleEvaluated, SearchPass,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Best placement of the template at one scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Top-left of the template placement, in the coordinates of the searched
    /// image.
    pub top_left: Point2<i32>,
    pub score: f32,
    pub scale: f32,
    /// Size of the resampled template.
    pub template_width: usize,
    pub template_height: usize,
}

impl MatchResult {
    /// Axis-aligned box covered by the matched template.
    pub fn region(&self) -> BoundingRegion {
        BoundingRegion::Axis {
            top_left: self.top_left,
            bottom_right: Point2::new(
                self.top_left.x + self.template_width as i32,
                self.top_left.y + self.template_height as i32,
            ),
        }
    }
}

/// One scale sweep configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleSearch {
    /// Matches must score strictly above this.
    pub threshold: f32,
    pub min_template_side: usize,
    /// Reported to the observer.
    pub pass: SearchPass,
}

impl ScaleSearch {
    /// Search `scales` in order and keep the best match above the threshold.
    ///
    /// `Ok(None)` means no scale produced a score above the threshold
    /// (including the case where the template never fits). Ties keep the
    /// earlier scale. The only error is [`NotFoundReason::Cancelled`].
    pub fn run<P: ImagePrimitives + ?Sized>(
        &self,
        primitives: &P,
        target: &GrayImageView<'_>,
        template: &GrayImageView<'_>,
        scales: &[f32],
        ctx: &DetectContext<'_>,
    ) -> Result<Option<MatchResult>, NotFoundReason> {
        let eval = |&scale: &f32| {
            if ctx.is_cancelled() {
                return None;
            }
            Some(self.evaluate(primitives, target, template, scale))
        };

        #[cfg(feature = "rayon")]
        let per_scale: Option<Vec<Option<MatchResult>>> = scales.par_iter().map(eval).collect();
        #[cfg(not(feature = "rayon"))]
        let per_scale: Option<Vec<Option<MatchResult>>> = scales.iter().map(eval).collect();

        let per_scale = per_scale.ok_or(NotFoundReason::Cancelled)?;

        let mut best: Option<MatchResult> = None;
        for (&scale, m) in scales.iter().zip(&per_scale) {
            ctx.observer.scale_evaluated(&ScaleEvaluated {
                pass: self.pass,
                scale,
                best_score: m.map(|m| m.score),
            });
            let Some(m) = m else {
                log::trace!("{:?} scale {scale:.4}: skipped", self.pass);
                continue;
            };
            log::trace!(
                "{:?} scale {scale:.4}: {:.4} at ({}, {})",
                self.pass,
                m.score,
                m.top_left.x,
                m.top_left.y
            );
            if m.score > self.threshold && best.is_none_or(|b| m.score > b.score) {
                best = Some(*m);
            }
        }

        match &best {
            Some(b) => log::debug!(
                "{:?} pass: best scale {:.4}, score {:.4} over {} scales",
                self.pass,
                b.scale,
                b.score,
                scales.len()
            ),
            None => log::debug!(
                "{:?} pass: nothing above {:.2} over {} scales",
                self.pass,
                self.threshold,
                scales.len()
            ),
        }
        Ok(best)
    }

    /// Best placement at a single scale, or `None` when the resampled
    /// template is too small or does not fit.
    pub fn evaluate<P: ImagePrimitives + ?Sized>(
        &self,
        primitives: &P,
        target: &GrayImageView<'_>,
        template: &GrayImageView<'_>,
        scale: f32,
    ) -> Option<MatchResult> {
        let resized = primitives.resize(template, scale)?;
        let (tw, th) = (resized.width, resized.height);
        if tw < self.min_template_side || th < self.min_template_side {
            return None;
        }
        if tw > target.width || th > target.height {
            return None;
        }
        let peak = primitives.correlate(target, &resized.view())?.argmax()?;
        Some(MatchResult {
            top_left: Point2::new(peak.x as i32, peak.y as i32),
            score: peak.score,
            scale,
            template_width: tw,
            template_height: th,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use board_locate_core::{
        CancelToken, Contour, EdgeMap, GrayImage, PixelRect, RecordingObserver,
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

    fn checker(cells: usize, cell: usize) -> GrayImage {
        let side = cells * cell;
        let mut img = GrayImage::filled(side, side, 230);
        for r in 0..cells {
            for c in 0..cells {
                if (r + c) % 2 == 1 {
                    img.fill_rect(
                        PixelRect {
                            x: c * cell,
                            y: r * cell,
                            width: cell,
                            height: cell,
                        },
                        25,
                    );
                }
            }
        }
        img
    }

    fn search(threshold: f32) -> ScaleSearch {
        ScaleSearch {
            threshold,
            min_template_side: 8,
            pass: SearchPass::Single,
        }
    }

    #[test]
    fn finds_pasted_template_at_unit_scale() {
        let tpl = checker(4, 6);
        let mut canvas = GrayImage::filled(60, 50, 128);
        canvas.paste(&tpl.view(), 17, 9);

        let m = search(0.5)
            .run(
                &Builtin,
                &canvas.view(),
                &tpl.view(),
                &[0.5, 1.0, 1.5],
                &DetectContext::default(),
            )
            .expect("not cancelled")
            .expect("match");
        assert_eq!(m.scale, 1.0);
        assert_eq!(m.top_left, Point2::new(17, 9));
        assert_abs_diff_eq!(m.score, 1.0, epsilon = 1e-4);
        assert_eq!((m.template_width, m.template_height), (24, 24));
        assert_eq!(
            m.region(),
            BoundingRegion::Axis {
                top_left: Point2::new(17, 9),
                bottom_right: Point2::new(41, 33),
            }
        );
    }

    #[test]
    fn oversized_and_tiny_scales_are_skipped_and_reported() {
        let tpl = checker(4, 6);
        let canvas = GrayImage::filled(30, 30, 128);
        let observer = RecordingObserver::default();
        let ctx = DetectContext::default().with_observer(&observer);

        // 0.25 -> 6 px (< 8), 2.0 -> 48 px (> 30).
        let out = search(0.0)
            .run(&Builtin, &canvas.view(), &tpl.view(), &[0.25, 2.0], &ctx)
            .expect("not cancelled");
        assert!(out.is_none());

        let events = observer.scales();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.best_score.is_none()));
        assert_eq!(events[0].scale, 0.25);
    }

    #[test]
    fn unit_min_side_keeps_tiny_templates() {
        let tpl = checker(4, 6);
        let small = tpl.view().resize_by_factor(0.25).expect("resize");
        let mut canvas = GrayImage::filled(30, 30, 128);
        canvas.paste(&small.view(), 10, 12);

        let strict = search(0.5)
            .run(&Builtin, &canvas.view(), &tpl.view(), &[0.25], &DetectContext::default())
            .expect("not cancelled");
        assert!(strict.is_none());

        let permissive = ScaleSearch {
            min_template_side: 1,
            ..search(0.5)
        };
        let m = permissive
            .run(&Builtin, &canvas.view(), &tpl.view(), &[0.25], &DetectContext::default())
            .expect("not cancelled")
            .expect("match");
        assert_eq!((m.template_width, m.template_height), (6, 6));
        assert_eq!(m.top_left, Point2::new(10, 12));
        assert_abs_diff_eq!(m.score, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn threshold_is_strict() {
        let tpl = checker(4, 6);
        // Flat canvas: every placement scores 0.
        let canvas = GrayImage::filled(40, 40, 90);
        let out = search(0.0)
            .run(&Builtin, &canvas.view(), &tpl.view(), &[1.0], &DetectContext::default())
            .expect("not cancelled");
        assert!(out.is_none());
    }

    #[test]
    fn cancellation_is_reported() {
        let tpl = checker(4, 6);
        let canvas = GrayImage::filled(40, 40, 90);
        let token = CancelToken::new();
        token.cancel();
        let ctx = DetectContext::default().with_cancel(&token);
        assert_eq!(
            search(0.0).run(&Builtin, &canvas.view(), &tpl.view(), &[1.0], &ctx),
            Err(NotFoundReason::Cancelled)
        );
    }
}
