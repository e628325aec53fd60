//! Cut a located board into its 64 squares for downstream classifiers.

use crate::core::{BoundingRegion, GrayImage, GrayImageView, PixelRect};

/// Squares per board side.
pub const BOARD_CELLS: usize = 8;

/// Default output side of each square, in pixels.
pub const DEFAULT_SQUARE_SIZE: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub struct BoardSquare {
    pub row: usize,
    pub col: usize,
    pub image: GrayImage,
}

/// Axis-aligned pixel box of `region`, clamped to the frame.
pub fn region_rect(region: &BoundingRegion, width: usize, height: usize) -> Option<PixelRect> {
    let (x0, y0, x1, y1) = region.axis_bounds();
    let clamp = |v: f32, hi: usize| v.max(0.0).min(hi as f32) as usize;
    let (x0, x1) = (clamp(x0.floor(), width), clamp(x1.ceil(), width));
    let (y0, y1) = (clamp(y0.floor(), height), clamp(y1.ceil(), height));
    let rect = PixelRect {
        x: x0,
        y: y0,
        width: x1.saturating_sub(x0),
        height: y1.saturating_sub(y0),
    };
    (!rect.is_empty()).then_some(rect)
}

/// Crop the board and split it into an 8x8 grid, row-major.
///
/// Cells are `height / 8` by `width / 8` pixels (integer division, leftover
/// rows and columns at the bottom/right are dropped) and each is resampled to
/// `square_size x square_size`. A crop smaller than 8 pixels on either side
/// gives an empty list.
pub fn split_board_squares(
    image: &GrayImageView<'_>,
    region: &BoundingRegion,
    square_size: usize,
) -> Vec<BoardSquare> {
    let Some(rect) = region_rect(region, image.width, image.height) else {
        return Vec::new();
    };
    let board = image.crop(rect);
    let cell_w = board.width / BOARD_CELLS;
    let cell_h = board.height / BOARD_CELLS;
    if cell_w == 0 || cell_h == 0 || square_size == 0 {
        log::debug!(
            "board crop {}x{} too small to split into squares",
            board.width,
            board.height
        );
        return Vec::new();
    }

    let view = board.view();
    let mut out = Vec::with_capacity(BOARD_CELLS * BOARD_CELLS);
    for row in 0..BOARD_CELLS {
        for col in 0..BOARD_CELLS {
            let cell = view.crop(PixelRect {
                x: col * cell_w,
                y: row * cell_h,
                width: cell_w,
                height: cell_h,
            });
            if let Some(image) = cell.view().resize_to(square_size, square_size) {
                out.push(BoardSquare { row, col, image });
            }
        }
    }
    out
}
