use board_locate_core::NotFoundReason;

use crate::scoring::ScoredCandidate;

/// Pick the highest-confidence candidate.
///
/// Ties keep the earliest candidate. The winner must reach
/// `acceptance_threshold` (inclusive); an empty list also reports
/// [`NotFoundReason::ConfidenceBelowThreshold`] since nothing scorable
/// remained.
pub fn select_best(
    scored: &[ScoredCandidate],
    acceptance_threshold: f32,
) -> Result<&ScoredCandidate, NotFoundReason> {
    let mut best: Option<&ScoredCandidate> = None;
    for s in scored {
        if best.is_none_or(|b| s.confidence.value > b.confidence.value) {
            best = Some(s);
        }
    }
    match best {
        Some(b) if b.confidence.value >= acceptance_threshold => Ok(b),
        Some(b) => {
            log::debug!(
                "best candidate {} below threshold ({:.3} < {:.3})",
                b.index,
                b.confidence.value,
                acceptance_threshold
            );
            Err(NotFoundReason::ConfidenceBelowThreshold)
        }
        None => Err(NotFoundReason::ConfidenceBelowThreshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::SquareCandidate;
    use crate::scoring::Confidence;
    use board_locate_core::{GridLineCounts, PixelRect, RotatedRect};
    use nalgebra::Point2;

    fn scored(index: usize, value: f32) -> ScoredCandidate {
        let rect = RotatedRect {
            center: Point2::new(10.0 * index as f32, 0.0),
            width: 5.0,
            height: 5.0,
            angle_deg: 0.0,
        };
        ScoredCandidate {
            index,
            candidate: SquareCandidate {
                rect,
                corners: rect.corners(),
                area: 25.0,
            },
            crop: PixelRect {
                x: 0,
                y: 0,
                width: 5,
                height: 5,
            },
            lines: GridLineCounts::default(),
            confidence: Confidence {
                grid_score: 0.0,
                aspect_penalty: 0.0,
                size_penalty: 0.0,
                value,
            },
        }
    }

    #[test]
    fn picks_maximum() {
        let list = [scored(0, 0.6), scored(1, 0.9), scored(2, 0.7)];
        assert_eq!(select_best(&list, 0.5).map(|s| s.index), Ok(1));
    }

    #[test]
    fn ties_keep_first_seen() {
        let list = [scored(0, 0.4), scored(1, 0.8), scored(2, 0.8)];
        assert_eq!(select_best(&list, 0.5).map(|s| s.index), Ok(1));
    }

    #[test]
    fn threshold_is_inclusive() {
        let list = [scored(0, 0.5)];
        assert_eq!(select_best(&list, 0.5).map(|s| s.index), Ok(0));
        let list = [scored(0, 0.49)];
        assert_eq!(
            select_best(&list, 0.5).map(|s| s.index),
            Err(NotFoundReason::ConfidenceBelowThreshold)
        );
    }

    #[test]
    fn empty_list_is_below_threshold() {
        assert_eq!(
            select_best(&[], 0.5).map(|s| s.index),
            Err(NotFoundReason::ConfidenceBelowThreshold)
        );
    }
}
