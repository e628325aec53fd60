//! Template-based chessboard localization.
//!
//! A reference image of the board ([`BoardTemplate`]) is correlated against
//! the target with zero-mean normalized cross-correlation over a set of
//! scales. The canonical detector runs two passes:
//!
//! 1. **coarse**: target and template are both resampled by
//!    `downsample_factor` (0.5) and the template is swept over a wide scale
//!    range (50 samples in 0.05..=0.70), threshold 0.4;
//! 2. **fine**: a narrow band (`±0.01`, step `0.002`) around the coarse
//!    scale at full resolution. If the band finds nothing, the coarse
//!    location is mapped back to full resolution.
//!
//! [`TemplateBoardDetector::detect_single_pass`] keeps the simpler
//! full-resolution sweep (75 scales, threshold 0.5).

mod detector;
mod params;
mod scale_search;
mod template;

pub use detector::{CoarseToFineMatch, TemplateBoardDetector};
pub use params::{fine_band, ParamsError, ScaleRange, SinglePassParams, TemplateDetectorParams};
pub use scale_search::{MatchResult, ScaleSearch};
pub use template::BoardTemplate;
