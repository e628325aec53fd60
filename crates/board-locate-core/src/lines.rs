//! Straight segment extraction from an edge mask.
//!
//! A standard (rho, theta) Hough accumulator is filled from every edge pixel.
//! Local maxima above the vote threshold are visited strongest-first; for each
//! one the supporting line is walked across the mask and split into runs that
//! tolerate gaps of up to `max_gap` pixels. Runs at least `min_length` long are
//! emitted and their pixels are consumed, so parallel duplicates from
//! neighbouring accumulator cells are not reported twice.
//!
//! The procedure is deterministic: equal votes are resolved by accumulator
//! index.

use crate::edges::EdgeMap;
use crate::geometry::LineSegment;
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters for Hough segment extraction, in source-pixel units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughSegmentParams {
    /// Distance resolution of the accumulator.
    pub rho: f32,
    /// Angular resolution of the accumulator, degrees.
    pub theta_deg: f32,
    /// Minimum accumulator votes for a line to be considered.
    pub threshold: u32,
    /// Minimum emitted segment length.
    pub min_length: f32,
    /// Maximum gap bridged between edge pixels on the same segment.
    pub max_gap: f32,
}

impl Default for HoughSegmentParams {
    fn default() -> Self {
        Self {
            rho: 1.0,
            theta_deg: 1.0,
            threshold: 100,
            min_length: 40.0,
            max_gap: 10.0,
        }
    }
}

struct Accumulator {
    n_theta: usize,
    theta_step: f32,
    n_rho: usize,
    rho_offset: i64,
    cos: Vec<f32>,
    sin: Vec<f32>,
    votes: Vec<u32>,
}

impl Accumulator {
    fn new(width: usize, height: usize, params: &HoughSegmentParams) -> Self {
        let theta_step = params.theta_deg.max(1e-3).to_radians();
        let n_theta = ((std::f32::consts::PI / theta_step).round() as usize).max(1);
        let rho_step = params.rho.max(1e-3);
        let diag = ((width * width + height * height) as f32).sqrt();
        let rho_offset = (diag / rho_step).ceil() as i64;
        let n_rho = (2 * rho_offset + 1) as usize;

        let (sin, cos): (Vec<f32>, Vec<f32>) = (0..n_theta)
            .map(|t| (t as f32 * theta_step).sin_cos())
            .map(|(s, c)| (s / rho_step, c / rho_step))
            .unzip();

        Self {
            n_theta,
            theta_step,
            n_rho,
            rho_offset,
            cos,
            sin,
            votes: vec![0; n_theta * n_rho],
        }
    }

    fn vote(&mut self, x: usize, y: usize) {
        for t in 0..self.n_theta {
            let r = (x as f32 * self.cos[t] + y as f32 * self.sin[t]).round() as i64;
            let idx = (r + self.rho_offset) as usize;
            self.votes[t * self.n_rho + idx] += 1;
        }
    }

    #[inline]
    fn at(&self, t: isize, r: isize) -> u32 {
        if t < 0 || r < 0 || t as usize >= self.n_theta || r as usize >= self.n_rho {
            return 0;
        }
        self.votes[t as usize * self.n_rho + r as usize]
    }

    /// Cells over threshold that are local maxima in their 3x3 neighbourhood.
    /// Neighbours earlier in scan order must be strictly lower, later ones
    /// lower or equal, so plateaus yield exactly one peak.
    fn peaks(&self, threshold: u32) -> Vec<(u32, usize, usize)> {
        let mut out = Vec::new();
        for t in 0..self.n_theta {
            for r in 0..self.n_rho {
                let v = self.votes[t * self.n_rho + r];
                if v < threshold.max(1) {
                    continue;
                }
                let (ti, ri) = (t as isize, r as isize);
                let mut is_peak = true;
                'nbhd: for dt in -1isize..=1 {
                    for dr in -1isize..=1 {
                        if dt == 0 && dr == 0 {
                            continue;
                        }
                        let n = self.at(ti + dt, ri + dr);
                        let earlier = dt < 0 || (dt == 0 && dr < 0);
                        if (earlier && n >= v) || (!earlier && n > v) {
                            is_peak = false;
                            break 'nbhd;
                        }
                    }
                }
                if is_peak {
                    out.push((v, t, r));
                }
            }
        }
        out.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
        out
    }
}

/// Working copy of the mask; pixels are cleared once a segment claims them.
struct Mask {
    width: usize,
    height: usize,
    on: Vec<bool>,
}

impl Mask {
    #[inline]
    fn get(&self, x: i64, y: i64) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && self.on[y as usize * self.width + x as usize]
    }

    #[inline]
    fn clear(&mut self, x: i64, y: i64) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.on[y as usize * self.width + x as usize] = false;
        }
    }
}

/// Extract straight segments from an edge mask.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(edges, params), fields(width = edges.width(), height = edges.height()))
)]
pub fn detect_line_segments(edges: &EdgeMap, params: &HoughSegmentParams) -> Vec<LineSegment> {
    let (width, height) = (edges.width(), edges.height());
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut acc = Accumulator::new(width, height, params);
    let mut mask = Mask {
        width,
        height,
        on: vec![false; width * height],
    };
    for y in 0..height {
        for x in 0..width {
            if edges.is_edge(x, y) {
                mask.on[y * width + x] = true;
                acc.vote(x, y);
            }
        }
    }

    let peaks = acc.peaks(params.threshold);
    let rho_step = params.rho.max(1e-3);
    let reach = ((width * width + height * height) as f32).sqrt().ceil() as i64;

    let mut segments = Vec::new();
    for &(_, t, r) in &peaks {
        let theta = t as f32 * acc.theta_step;
        let rho = (r as i64 - acc.rho_offset) as f32 * rho_step;
        let (s, c) = theta.sin_cos();
        walk_line(
            &mut mask,
            Point2::new(rho * c, rho * s),
            (c, s),
            reach,
            params,
            &mut segments,
        );
    }

    debug!(
        "hough: {} edge pixels, {} peaks, {} segments",
        edges.count(),
        peaks.len(),
        segments.len()
    );
    segments
}

/// Walk the line `origin + t * (-sin, cos)` for `t` in `[-reach, reach]`.
fn walk_line(
    mask: &mut Mask,
    origin: Point2<f32>,
    normal: (f32, f32),
    reach: i64,
    params: &HoughSegmentParams,
    out: &mut Vec<LineSegment>,
) {
    let (nx, ny) = normal;
    let (dx, dy) = (-ny, nx);
    let max_gap = params.max_gap.max(0.0) as i64;
    let min_length = params.min_length.max(0.0);

    let pixel_at = |t: i64| -> (f32, f32) {
        (
            origin.x + t as f32 * dx,
            origin.y + t as f32 * dy,
        )
    };
    // Sample the line pixel and its two neighbours across the line.
    let hit = |mask: &Mask, t: i64| -> bool {
        let (px, py) = pixel_at(t);
        [0.0f32, 1.0, -1.0].iter().any(|&k| {
            mask.get(
                (px + k * nx).round() as i64,
                (py + k * ny).round() as i64,
            )
        })
    };

    let mut run: Option<(i64, i64)> = None;
    let mut gap = 0i64;
    let mut runs = Vec::new();
    for t in -reach..=reach {
        if hit(mask, t) {
            run = Some(match run {
                Some((start, _)) => (start, t),
                None => (t, t),
            });
            gap = 0;
        } else if let Some(current) = run {
            gap += 1;
            if gap > max_gap {
                runs.push(current);
                run = None;
                gap = 0;
            }
        }
    }
    if let Some(current) = run {
        runs.push(current);
    }

    for (start, end) in runs {
        if ((end - start) as f32) < min_length {
            continue;
        }
        for t in start..=end {
            let (px, py) = pixel_at(t);
            for k in [0.0f32, 1.0, -1.0] {
                mask.clear(
                    (px + k * nx).round() as i64,
                    (py + k * ny).round() as i64,
                );
            }
        }
        let (x0, y0) = pixel_at(start);
        let (x1, y1) = pixel_at(end);
        out.push(LineSegment::new(
            Point2::new(x0.round(), y0.round()),
            Point2::new(x1.round(), y1.round()),
        ));
    }
}
