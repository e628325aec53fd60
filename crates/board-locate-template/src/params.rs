use serde::{Deserialize, Serialize};

/// `samples` evenly spaced scale factors from `start` to `end`, both ends
/// included.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleRange {
    pub start: f32,
    pub end: f32,
    pub samples: usize,
}

impl ScaleRange {
    /// Wide sweep used by the coarse pass.
    pub const COARSE: Self = Self {
        start: 0.05,
        end: 0.70,
        samples: 50,
    };

    /// Denser sweep used by the single-pass search.
    pub const SINGLE_PASS: Self = Self {
        start: 0.05,
        end: 0.70,
        samples: 75,
    };

    pub fn values(&self) -> Vec<f32> {
        match self.samples {
            0 => Vec::new(),
            1 => vec![self.start],
            n => {
                let step = (self.end as f64 - self.start as f64) / (n - 1) as f64;
                (0..n)
                    .map(|i| (self.start as f64 + step * i as f64) as f32)
                    .collect()
            }
        }
    }
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self::COARSE
    }
}

/// Scales `center - half_width ..= center + half_width` in steps of `step`.
/// Non-positive scales are dropped.
pub fn fine_band(center: f32, half_width: f32, step: f32) -> Vec<f32> {
    if !(step > 0.0) || !(half_width >= 0.0) {
        return if center > 0.0 { vec![center] } else { Vec::new() };
    }
    let n = (2.0 * half_width as f64 / step as f64).round() as usize;
    let start = center as f64 - half_width as f64;
    (0..=n)
        .map(|i| (start + step as f64 * i as f64) as f32)
        .filter(|s| *s > 0.0)
        .collect()
}

/// Settings of [`crate::TemplateBoardDetector::detect_single_pass`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinglePassParams {
    pub scales: ScaleRange,
    pub threshold: f32,
}

impl Default for SinglePassParams {
    fn default() -> Self {
        Self {
            scales: ScaleRange::SINGLE_PASS,
            threshold: 0.5,
        }
    }
}

/// Parameters of the coarse-to-fine template search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateDetectorParams {
    /// Overrides the scales carried by the template for the coarse pass.
    pub coarse_scales: Option<ScaleRange>,
    /// A coarse match must score strictly above this.
    pub coarse_threshold: f32,
    /// Both target and template are resampled by this before the coarse pass.
    pub downsample_factor: f32,
    /// Half width of the fine band around the coarse scale.
    pub fine_band_width: f32,
    pub fine_step: f32,
    pub fine_threshold: f32,
    /// Resized templates smaller than this on either axis are skipped.
    ///
    /// A few pixels of template correlate well with almost any texture, so the
    /// smallest coarse scales of a small template are dropped. Set it to 1 to
    /// evaluate every scale whose template fits.
    pub min_template_side: usize,
    pub single_pass: SinglePassParams,
}

impl Default for TemplateDetectorParams {
    fn default() -> Self {
        Self {
            coarse_scales: None,
            coarse_threshold: 0.4,
            downsample_factor: 0.5,
            fine_band_width: 0.01,
            fine_step: 0.002,
            fine_threshold: 0.4,
            min_template_side: 8,
            single_pass: SinglePassParams::default(),
        }
    }
}

impl TemplateDetectorParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        let f = self.downsample_factor;
        if !(f > 0.0 && f <= 1.0) {
            return Err(ParamsError::DownsampleFactor(f));
        }
        if !(self.fine_step > 0.0 && self.fine_band_width >= 0.0) {
            return Err(ParamsError::FineBand {
                band_width: self.fine_band_width,
                step: self.fine_step,
            });
        }
        for t in [
            self.coarse_threshold,
            self.fine_threshold,
            self.single_pass.threshold,
        ] {
            if !(-1.0..=1.0).contains(&t) {
                return Err(ParamsError::Threshold(t));
            }
        }
        for r in self
            .coarse_scales
            .iter()
            .chain(std::iter::once(&self.single_pass.scales))
        {
            if !(r.start > 0.0 && r.end >= r.start && r.samples > 0) {
                return Err(ParamsError::ScaleRange(*r));
            }
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("downsample factor {0} outside (0, 1]")]
    DownsampleFactor(f32),
    #[error("invalid fine band (band_width={band_width}, step={step})")]
    FineBand { band_width: f32, step: f32 },
    #[error("correlation threshold {0} outside [-1, 1]")]
    Threshold(f32),
    #[error("invalid scale range {0:?}")]
    ScaleRange(ScaleRange),
    #[error("template has no pixels")]
    EmptyTemplate,
}
