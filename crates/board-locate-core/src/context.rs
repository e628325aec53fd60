//! Per-call detection context: an observer for intermediate results and an
//! optional cancellation token.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::image::PixelRect;

/// Which whole-image or per-candidate pass produced a grid-line count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridCheckStage {
    Frame,
    Candidate,
}

/// Horizontal / vertical segment counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLineCounts {
    pub vertical: usize,
    pub horizontal: usize,
}

/// Emitted once per scored contour candidate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateScored {
    pub index: usize,
    pub crop: PixelRect,
    pub lines: GridLineCounts,
    pub grid_score: f32,
    pub aspect_penalty: f32,
    pub size_penalty: f32,
    pub confidence: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPass {
    Single,
    Coarse,
    Fine,
}

/// Emitted once per evaluated template scale. `best_score` is `None` when the
/// scale was skipped because the resized template did not fit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleEvaluated {
    pub pass: SearchPass,
    pub scale: f32,
    pub best_score: Option<f32>,
}

/// Receives intermediate detection results. All methods default to no-ops
/// and nothing a detector does depends on them.
pub trait DetectionObserver: Sync {
    fn grid_lines_counted(&self, _stage: GridCheckStage, _counts: GridLineCounts) {}
    fn candidate_scored(&self, _event: &CandidateScored) {}
    fn scale_evaluated(&self, _event: &ScaleEvaluated) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl DetectionObserver for NoopObserver {}

/// Observer that keeps every event, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub grid_checks: Mutex<Vec<(GridCheckStage, GridLineCounts)>>,
    pub candidates: Mutex<Vec<CandidateScored>>,
    pub scales: Mutex<Vec<ScaleEvaluated>>,
}

impl RecordingObserver {
    pub fn candidates(&self) -> Vec<CandidateScored> {
        self.candidates.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn scales(&self) -> Vec<ScaleEvaluated> {
        self.scales.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn grid_checks(&self) -> Vec<(GridCheckStage, GridLineCounts)> {
        self.grid_checks.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl DetectionObserver for RecordingObserver {
    fn grid_lines_counted(&self, stage: GridCheckStage, counts: GridLineCounts) {
        if let Ok(mut v) = self.grid_checks.lock() {
            v.push((stage, counts));
        }
    }

    fn candidate_scored(&self, event: &CandidateScored) {
        if let Ok(mut v) = self.candidates.lock() {
            v.push(*event);
        }
    }

    fn scale_evaluated(&self, event: &ScaleEvaluated) {
        if let Ok(mut v) = self.scales.lock() {
            v.push(*event);
        }
    }
}

/// Cooperative cancellation: an explicit flag plus an optional deadline.
/// Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that also trips once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

static NOOP: NoopObserver = NoopObserver;

/// Borrowed per-call context.
#[derive(Clone, Copy)]
pub struct DetectContext<'a> {
    pub observer: &'a dyn DetectionObserver,
    pub cancel: Option<&'a CancelToken>,
}

impl Default for DetectContext<'_> {
    fn default() -> Self {
        Self {
            observer: &NOOP,
            cancel: None,
        }
    }
}

impl<'a> DetectContext<'a> {
    pub fn with_observer(mut self, observer: &'a dyn DetectionObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }
}
