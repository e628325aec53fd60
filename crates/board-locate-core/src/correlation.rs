//! Zero-mean normalized cross-correlation of a template over an image.
//!
//! For every placement `(x, y)` of the template inside the image the score is
//!
//! ```text
//! Σ (T - mean(T)) · (I - mean(I_win))
//! ------------------------------------------------
//! sqrt(Σ (T - mean(T))² · Σ (I - mean(I_win))²)
//! ```
//!
//! Window sums come from integral images; the cross term is evaluated directly.
//! Placements where either side has no variance score `0`.

use crate::image::GrayImageView;
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

const VARIANCE_EPS: f64 = 1e-9;

/// Dense map of correlation scores, one per template placement.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreMap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

/// Best placement found in a [`ScoreMap`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScorePeak {
    pub score: f32,
    pub x: usize,
    pub y: usize,
}

impl ScoreMap {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Highest score; the first one in row-major order wins ties.
    pub fn argmax(&self) -> Option<ScorePeak> {
        let mut best: Option<ScorePeak> = None;
        for (i, &score) in self.data.iter().enumerate() {
            if best.is_none_or(|b| score > b.score) {
                best = Some(ScorePeak {
                    score,
                    x: i % self.width,
                    y: i / self.width,
                });
            }
        }
        best
    }
}

struct Integral {
    stride: usize,
    sum: Vec<f64>,
    sq: Vec<f64>,
}

impl Integral {
    fn new(img: &GrayImageView<'_>) -> Self {
        let stride = img.width + 1;
        let mut sum = vec![0f64; stride * (img.height + 1)];
        let mut sq = vec![0f64; stride * (img.height + 1)];
        for y in 0..img.height {
            let mut row_sum = 0f64;
            let mut row_sq = 0f64;
            for (x, &v) in img.row(y).iter().enumerate() {
                let v = v as f64;
                row_sum += v;
                row_sq += v * v;
                let i = (y + 1) * stride + x + 1;
                sum[i] = sum[i - stride] + row_sum;
                sq[i] = sq[i - stride] + row_sq;
            }
        }
        Self { stride, sum, sq }
    }

    #[inline]
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let s = self.stride;
        let a = y * s + x;
        let b = y * s + x + w;
        let c = (y + h) * s + x;
        let d = (y + h) * s + x + w;
        (
            self.sum[d] - self.sum[b] - self.sum[c] + self.sum[a],
            self.sq[d] - self.sq[b] - self.sq[c] + self.sq[a],
        )
    }
}

/// Correlate `template` over every placement inside `image`.
///
/// Returns `None` when the template is empty or does not fit.
pub fn correlate_normalized(
    image: &GrayImageView<'_>,
    template: &GrayImageView<'_>,
) -> Option<ScoreMap> {
    let (tw, th) = (template.width, template.height);
    if tw == 0 || th == 0 || tw > image.width || th > image.height {
        return None;
    }
    let out_w = image.width - tw + 1;
    let out_h = image.height - th + 1;
    let n = (tw * th) as f64;

    let t_mean = template.data.iter().map(|&v| v as f64).sum::<f64>() / n;
    let t_zero: Vec<f64> = template.data.iter().map(|&v| v as f64 - t_mean).collect();
    let t_ss: f64 = t_zero.iter().map(|v| v * v).sum();

    if t_ss <= VARIANCE_EPS {
        return Some(ScoreMap {
            width: out_w,
            height: out_h,
            data: vec![0.0; out_w * out_h],
        });
    }

    let integral = Integral::new(image);

    let score_row = |y: usize| -> Vec<f32> {
        (0..out_w)
            .map(|x| {
                let (s, ss) = integral.window(x, y, tw, th);
                let i_var = ss - s * s / n;
                if i_var <= VARIANCE_EPS {
                    return 0.0;
                }
                // Σ t'·I equals Σ t'·(I - mean) because Σ t' = 0.
                let mut cross = 0f64;
                for ty in 0..th {
                    let img_row = &image.row(y + ty)[x..x + tw];
                    let tpl_row = &t_zero[ty * tw..(ty + 1) * tw];
                    for (&iv, &tv) in img_row.iter().zip(tpl_row) {
                        cross += iv as f64 * tv;
                    }
                }
                (cross / (t_ss * i_var).sqrt()).clamp(-1.0, 1.0) as f32
            })
            .collect()
    };

    #[cfg(feature = "rayon")]
    let rows: Vec<Vec<f32>> = (0..out_h).into_par_iter().map(score_row).collect();

    #[cfg(not(feature = "rayon"))]
    let rows: Vec<Vec<f32>> = (0..out_h).map(score_row).collect();

    Some(ScoreMap {
        width: out_w,
        height: out_h,
        data: rows.into_iter().flatten().collect(),
    })
}
