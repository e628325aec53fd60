//! High-level facade for the `board-locate-*` workspace.
//!
//! Two strategies find a chessboard in a grayscale frame:
//! - **contour**: count near-horizontal and near-vertical Hough segments, pick
//!   square-ish contours, score each by grid density, aspect and size, keep the
//!   best one above the acceptance threshold;
//! - **template**: correlate a reference board image over a range of scales on
//!   a downsampled frame, then refine in a narrow scale band at full
//!   resolution.
//!
//! Both return a [`Detection`]: either a [`BoundingRegion`] with its score or a
//! typed [`NotFoundReason`].
//!
//! ## Quickstart
//!
//! ```no_run
//! use board_locate::contour::{ContourDetectorParams, MinArea};
//! use board_locate::detect;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("frame.png")?;
//! let params = ContourDetectorParams::new(MinArea::FractionOfFrame { fraction: 0.01 });
//! match detect::detect_by_contour_image(&img, &params)? {
//!     board_locate::Detection::Found(loc) => println!("board at {:?}", loc.region),
//!     board_locate::Detection::NotFound { reason } => println!("no board: {reason}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `board_locate::core`: images, geometry, primitives trait, result types.
//! - `board_locate::contour`: grid-line contour detector.
//! - `board_locate::template`: coarse-to-fine template detector.
//! - `board_locate::detect` (feature `image`): helpers over `image` buffers.
//! - `board_locate::render` (feature `image`): debug overlays.

pub use board_locate_contour as contour;
pub use board_locate_core as core;
pub use board_locate_template as template;

mod config;
mod error;
mod locate;
mod squares;

#[cfg(feature = "image")]
pub mod detect;
#[cfg(feature = "image")]
pub mod render;

pub use config::LocateConfig;
pub use error::DetectError;
pub use locate::{detect_by_contour, detect_by_template, BoardDetector, DetectionStrategy};
pub use squares::{
    region_rect, split_board_squares, BoardSquare, BOARD_CELLS, DEFAULT_SQUARE_SIZE,
};

pub use board_locate_core::{
    BoardLocation, BoundingRegion, CancelToken, DetectContext, Detection, GrayImage,
    GrayImageView, ImagePrimitives, NotFoundReason,
};
