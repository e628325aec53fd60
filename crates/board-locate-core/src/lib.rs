//! Core types and primitives for locating a chessboard in an image.
//!
//! This crate holds everything the detection strategies share: grayscale
//! buffers, geometry, Hough segment extraction, normalized correlation, the
//! [`ImagePrimitives`] capability trait, and the result types. It has no
//! opinion on *how* a board is found; see `board-locate-contour` and
//! `board-locate-template` for that.
//!
//! With the default `imageproc` feature, [`ImageprocPrimitives`] supplies the
//! blur, Canny and contour back-ends.

mod context;
mod correlation;
mod detection;
mod edges;
mod geometry;
mod image;
mod lines;
mod logger;
mod primitives;

pub use context::{
    CancelToken, CandidateScored, DetectContext, DetectionObserver, GridCheckStage,
    GridLineCounts, NoopObserver, RecordingObserver, ScaleEvaluated, SearchPass,
};
pub use correlation::{correlate_normalized, ScoreMap, ScorePeak};
pub use detection::{BoardLocation, BoundingRegion, Detection, NotFoundReason};
pub use edges::EdgeMap;
pub use geometry::{
    clamped_bounds, convex_hull, min_area_rect, polygon_area, Contour, LineSegment, RotatedRect,
};
pub use crate::image::{GrayImage, GrayImageView, ImageBufferError, PixelRect};
pub use lines::{detect_line_segments, HoughSegmentParams};
pub use primitives::ImagePrimitives;

#[cfg(feature = "imageproc")]
pub use primitives::ImageprocPrimitives;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_logger, LogFilter, LogInitError, LogSpecError};
