//! Strategy facade over the contour and template detectors.

#[cfg(feature = "tracing")]
use tracing::instrument;

use serde::{Deserialize, Serialize};

use crate::contour::{ContourBoardDetector, ContourDetectorParams};
use crate::core::{DetectContext, Detection, GrayImageView, ImagePrimitives};
use crate::template::{BoardTemplate, TemplateBoardDetector, TemplateDetectorParams};
use crate::DetectError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    /// Grid lines, square contours and confidence scoring.
    Contour,
    /// Coarse-to-fine multi-scale template correlation.
    Template,
}

#[derive(Clone, Debug)]
enum Engine {
    Contour(ContourBoardDetector),
    Template(TemplateBoardDetector),
}

/// One configured strategy plus the primitives it runs on.
///
/// The detector holds only immutable parameters; every `detect` call is
/// independent of the previous ones.
#[derive(Clone, Debug)]
pub struct BoardDetector<P> {
    primitives: P,
    engine: Engine,
}

impl<P: ImagePrimitives> BoardDetector<P> {
    pub fn contour(primitives: P, params: ContourDetectorParams) -> Result<Self, DetectError> {
        Ok(Self {
            primitives,
            engine: Engine::Contour(ContourBoardDetector::new(params)?),
        })
    }

    pub fn template(
        primitives: P,
        template: BoardTemplate,
        params: TemplateDetectorParams,
    ) -> Result<Self, DetectError> {
        Ok(Self {
            primitives,
            engine: Engine::Template(TemplateBoardDetector::new(template, params)?),
        })
    }

    pub fn strategy(&self) -> DetectionStrategy {
        match self.engine {
            Engine::Contour(_) => DetectionStrategy::Contour,
            Engine::Template(_) => DetectionStrategy::Template,
        }
    }

    #[inline]
    pub fn primitives(&self) -> &P {
        &self.primitives
    }

    pub fn detect(&self, image: &GrayImageView<'_>) -> Detection {
        self.detect_with(image, &DetectContext::default())
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip_all,
            fields(strategy = ?self.strategy(), width = image.width, height = image.height)
        )
    )]
    pub fn detect_with(&self, image: &GrayImageView<'_>, ctx: &DetectContext<'_>) -> Detection {
        match &self.engine {
            Engine::Contour(d) => d.detect_with(&self.primitives, image, ctx),
            Engine::Template(d) => d.detect_with(&self.primitives, image, ctx),
        }
    }
}

/// Run the contour pipeline once.
pub fn detect_by_contour<P: ImagePrimitives + ?Sized>(
    primitives: &P,
    image: &GrayImageView<'_>,
    params: &ContourDetectorParams,
) -> Result<Detection, DetectError> {
    let detector = ContourBoardDetector::new(params.clone())?;
    Ok(detector.detect(primitives, image))
}

/// Run the coarse-to-fine template search once.
pub fn detect_by_template<P: ImagePrimitives + ?Sized>(
    primitives: &P,
    image: &GrayImageView<'_>,
    template: &BoardTemplate,
    params: &TemplateDetectorParams,
) -> Result<Detection, DetectError> {
    let detector = TemplateBoardDetector::new(template.clone(), params.clone())?;
    Ok(detector.detect(primitives, image))
}
