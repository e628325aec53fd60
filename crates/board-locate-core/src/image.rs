//! Owned and borrowed 8-bit grayscale buffers.
//!
//! The detection code never mutates a caller's image: crops and resampled
//! copies are always fresh `GrayImage`s.

use serde::{Deserialize, Serialize};

/// Errors raised when wrapping a raw pixel buffer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageBufferError {
    #[error("invalid grayscale buffer length (expected {expected} bytes, got {got})")]
    InvalidLength { expected: usize, got: usize },
    #[error("invalid grayscale dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// Integer pixel rectangle, `[x, x + width) × [y, y + height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelRect {
    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl<'a> GrayImageView<'a> {
    /// Wrap a row-major buffer, checking that its length matches the shape.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageBufferError> {
        let expected = width
            .checked_mul(height)
            .ok_or(ImageBufferError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(ImageBufferError::InvalidLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Copy out a sub-rectangle. The rectangle is clamped to the image bounds.
    pub fn crop(&self, rect: PixelRect) -> GrayImage {
        let x0 = rect.x.min(self.width);
        let y0 = rect.y.min(self.height);
        let x1 = rect.x.saturating_add(rect.width).min(self.width);
        let y1 = rect.y.saturating_add(rect.height).min(self.height);
        let w = x1 - x0;
        let h = y1 - y0;

        let mut data = Vec::with_capacity(w * h);
        for y in y0..y1 {
            data.extend_from_slice(&self.row(y)[x0..x1]);
        }
        GrayImage {
            width: w,
            height: h,
            data,
        }
    }

    /// Area-averaging resample by a uniform factor.
    ///
    /// The output side is `round(side * factor)`; the sampling grid uses the
    /// exact factor, so two nearby factors that round to the same output size
    /// still produce different content. Returns `None` for a non-positive
    /// factor or an empty result.
    pub fn resize_by_factor(&self, factor: f32) -> Option<GrayImage> {
        if !factor.is_finite() || factor <= 0.0 {
            return None;
        }
        let out_w = (self.width as f32 * factor).round() as usize;
        let out_h = (self.height as f32 * factor).round() as usize;
        if out_w == 0 || out_h == 0 {
            return None;
        }
        Some(resample_area(self, out_w, out_h, factor, factor))
    }

    /// Area-averaging resample to an exact output size.
    pub fn resize_to(&self, out_w: usize, out_h: usize) -> Option<GrayImage> {
        if self.is_empty() || out_w == 0 || out_h == 0 {
            return None;
        }
        let fx = out_w as f32 / self.width as f32;
        let fy = out_h as f32 / self.height as f32;
        Some(resample_area(self, out_w, out_h, fx, fy))
    }
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ImageBufferError> {
        GrayImageView::new(width, height, &data)?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn put(&mut self, x: usize, y: usize, v: u8) {
        self.data[y * self.width + x] = v;
    }

    /// Fill a rectangle (clamped to bounds) with a constant value.
    pub fn fill_rect(&mut self, rect: PixelRect, v: u8) {
        let x1 = rect.x.saturating_add(rect.width).min(self.width);
        let y1 = rect.y.saturating_add(rect.height).min(self.height);
        for y in rect.y.min(self.height)..y1 {
            for x in rect.x.min(self.width)..x1 {
                self.put(x, y, v);
            }
        }
    }

    /// Copy `src` into this image with its top-left corner at `(x, y)`.
    /// Pixels falling outside this image are dropped.
    pub fn paste(&mut self, src: &GrayImageView<'_>, x: usize, y: usize) {
        for sy in 0..src.height {
            let dy = y + sy;
            if dy >= self.height {
                break;
            }
            for sx in 0..src.width {
                let dx = x + sx;
                if dx >= self.width {
                    break;
                }
                self.put(dx, dy, src.get(sx, sy));
            }
        }
    }
}

/// Per-output-index list of `(source index, weight)` for one axis.
fn area_weights(src_len: usize, out_len: usize, factor: f32) -> Vec<Vec<(usize, f32)>> {
    let inv = 1.0 / factor as f64;
    let src_end = src_len as f64;
    (0..out_len)
        .map(|o| {
            let a = (o as f64 * inv).min(src_end);
            let b = ((o + 1) as f64 * inv).min(src_end);
            let mut taps = Vec::new();
            if b <= a {
                // Sampling interval falls past the source; replicate the edge.
                taps.push((src_len - 1, 1.0));
                return taps;
            }
            let first = a.floor() as usize;
            let last = (b.ceil() as usize).min(src_len);
            let span = b - a;
            for s in first..last {
                let lo = a.max(s as f64);
                let hi = b.min((s + 1) as f64);
                let cover = hi - lo;
                if cover > 0.0 {
                    taps.push((s, (cover / span) as f32));
                }
            }
            taps
        })
        .collect()
}

fn resample_area(
    src: &GrayImageView<'_>,
    out_w: usize,
    out_h: usize,
    fx: f32,
    fy: f32,
) -> GrayImage {
    let wx = area_weights(src.width, out_w, fx);
    let wy = area_weights(src.height, out_h, fy);

    // Horizontal pass into f32 rows, then vertical pass.
    let mut tmp = vec![0f32; out_w * src.height];
    for y in 0..src.height {
        let row = src.row(y);
        let dst = &mut tmp[y * out_w..(y + 1) * out_w];
        for (ox, taps) in wx.iter().enumerate() {
            dst[ox] = taps.iter().map(|&(s, w)| row[s] as f32 * w).sum();
        }
    }

    let mut out = GrayImage::new(out_w, out_h);
    for (oy, taps) in wy.iter().enumerate() {
        for ox in 0..out_w {
            let v: f32 = taps.iter().map(|&(s, w)| tmp[s * out_w + ox] * w).sum();
            out.data[oy * out_w + ox] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
