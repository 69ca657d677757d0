//! ==============================================================================
//! analysis.rs - image analysis state machine
//! ==============================================================================
//!
//! purpose:
//!     the single owner of "what is the analysis doing right now". it is plain
//!     synchronous state with transition functions, so every rule below can be
//!     tested without timers, tasks or a web server.
//!
//! transitions:
//!
//!     ┌──────┐ accept_image ┌───────────┐ finish(Ok)  ┌──────────┐
//!     │ Idle │─────────────>│ Analyzing │────────────>│ Complete │
//!     └──────┘              └───────────┘             └──────────┘
//!        ^ ^                 │    ^   │ finish(Err)        │
//!        │ └──── clear ──────┘    │   └──────> Failed      │
//!        │                        └── accept_image ────────┤
//!        └──────────────────── clear ──────────────────────┘
//!
//!     accept_image while Analyzing supersedes the in-flight run: the new run id
//!     becomes current and any later `finish` for the old id is ignored.
//!
//! relationships:
//!     - used by: service.rs (wraps this in a lock and drives the async run)
//!
//! ==============================================================================

use crate::domain::{AnalysisResult, UploadedImage};
use crate::error::AnalysisError;

use serde::Serialize;
use tracing::debug;

/// Identifies one analysis run. Monotonic per controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RunId(u64);

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Analyzing,
    Complete,
    Failed,
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    Analyzing(RunId),
    Complete(AnalysisResult),
    Failed(AnalysisError),
}

/// Returned by [`AnalysisController::accept_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    pub run: RunId,
    /// run that was in flight and is now abandoned
    pub superseded: Option<RunId>,
}

/// Read-only view for API consumers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSnapshot {
    pub phase: Phase,
    pub run: Option<RunId>,
    pub image: Option<UploadedImage>,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct AnalysisController {
    state: State,
    image: Option<UploadedImage>,
    last_run: u64,
}

impl Default for AnalysisController {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisController {
    pub fn new() -> Self {
        Self { state: State::Idle, image: None, last_run: 0 }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::Analyzing(_) => Phase::Analyzing,
            State::Complete(_) => Phase::Complete,
            State::Failed(_) => Phase::Failed,
        }
    }

    pub fn in_flight(&self) -> Option<RunId> {
        match self.state {
            State::Analyzing(run) => Some(run),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            State::Complete(r) => Some(r),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&AnalysisError> {
        match &self.state {
            State::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    /// Store the image and start a new run from any phase.
    ///
    /// Any previous result or failure is discarded immediately.
    pub fn accept_image(&mut self, image: UploadedImage) -> Accepted {
        let superseded = self.in_flight();
        self.last_run += 1;
        let run = RunId(self.last_run);

        debug!(%run, file = %image.file_name, mime = %image.mime_type, "image accepted");
        self.image = Some(image);
        self.state = State::Analyzing(run);
        Accepted { run, superseded }
    }

    /// Record the outcome of `run`. Returns false (and changes nothing) when
    /// `run` is not the run currently in flight.
    pub fn finish(&mut self, run: RunId, outcome: Result<AnalysisResult, AnalysisError>) -> bool {
        if self.in_flight() != Some(run) {
            debug!(%run, "discarding stale analysis outcome");
            return false;
        }
        self.state = match outcome {
            Ok(result) => State::Complete(result),
            Err(e) => State::Failed(e),
        };
        true
    }

    /// Drop the image and any result. Returns the run that was cancelled, if
    /// one was in flight.
    pub fn clear(&mut self) -> Option<RunId> {
        let cancelled = self.in_flight();
        self.image = None;
        self.state = State::Idle;
        cancelled
    }

    pub fn snapshot(&self) -> AnalysisSnapshot {
        AnalysisSnapshot {
            phase: self.phase(),
            run: self.in_flight(),
            image: self.image.clone(),
            result: self.result().cloned(),
            error: self.failure().map(|e| e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Npk, SoilType};

    fn image(name: &str) -> UploadedImage {
        UploadedImage::new(name, "image/jpeg", vec![0xff, 0xd8])
    }

    fn result(nitrogen: u32) -> AnalysisResult {
        AnalysisResult {
            soil_type: SoilType::Loamy,
            confidence: 90,
            npk: Npk { nitrogen, phosphorus: 25, potassium: 60 },
            ph: "6.4".into(),
            organic_matter: "3.3".into(),
            moisture: 50,
            recommendations: vec![],
            timestamp: "2026-10-17T10:00:00.000Z".into(),
        }
    }

    #[test]
    fn starts_idle_with_nothing() {
        let c = AnalysisController::new();
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.result().is_none());
        assert!(c.image().is_none());
    }

    #[test]
    fn happy_path_reaches_complete() {
        let mut c = AnalysisController::new();
        let a = c.accept_image(image("a.jpg"));
        assert_eq!(a.superseded, None);
        assert_eq!(c.phase(), Phase::Analyzing);
        assert_eq!(c.in_flight(), Some(a.run));

        assert!(c.finish(a.run, Ok(result(45))));
        assert_eq!(c.phase(), Phase::Complete);
        assert_eq!(c.result().unwrap().npk.nitrogen, 45);
        assert_eq!(c.image().unwrap().file_name, "a.jpg");
    }

    #[test]
    fn clear_from_complete_returns_to_idle() {
        let mut c = AnalysisController::new();
        let a = c.accept_image(image("a.jpg"));
        c.finish(a.run, Ok(result(45)));

        assert_eq!(c.clear(), None);
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.result().is_none());
        assert!(c.image().is_none());
    }

    #[test]
    fn second_upload_supersedes_first_run() {
        let mut c = AnalysisController::new();
        let first = c.accept_image(image("a.jpg"));
        let second = c.accept_image(image("b.jpg"));
        assert_eq!(second.superseded, Some(first.run));
        assert!(second.run > first.run);

        assert!(!c.finish(first.run, Ok(result(10))));
        assert_eq!(c.phase(), Phase::Analyzing);

        assert!(c.finish(second.run, Ok(result(50))));
        assert_eq!(c.result().unwrap().npk.nitrogen, 50);
        assert_eq!(c.image().unwrap().file_name, "b.jpg");
    }

    #[test]
    fn clear_while_analyzing_cancels_run() {
        let mut c = AnalysisController::new();
        let a = c.accept_image(image("a.jpg"));
        assert_eq!(c.clear(), Some(a.run));
        assert!(!c.finish(a.run, Ok(result(45))));
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn failure_is_a_visible_state() {
        let mut c = AnalysisController::new();
        let a = c.accept_image(image("a.jpg"));
        assert!(c.finish(a.run, Err(AnalysisError::Backend("model offline".into()))));
        assert_eq!(c.phase(), Phase::Failed);
        assert!(c.result().is_none());

        let snap = c.snapshot();
        assert_eq!(snap.error.as_deref(), Some("analysis backend failed: model offline"));

        let b = c.accept_image(image("b.jpg"));
        assert_eq!(b.superseded, None);
        assert_eq!(c.phase(), Phase::Analyzing);
        assert!(c.failure().is_none());
    }

    #[test]
    fn clear_from_failed_returns_to_idle() {
        let mut c = AnalysisController::new();
        let a = c.accept_image(image("a.jpg"));
        c.finish(a.run, Err(AnalysisError::TimedOut(std::time::Duration::from_secs(30))));
        assert_eq!(c.phase(), Phase::Failed);

        assert_eq!(c.clear(), None);
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.failure().is_none());
        assert!(c.image().is_none());
        assert!(c.snapshot().error.is_none());
    }

    #[test]
    fn new_image_after_complete_replaces_result() {
        let mut c = AnalysisController::new();
        let a = c.accept_image(image("a.jpg"));
        c.finish(a.run, Ok(result(45)));
        c.accept_image(image("b.jpg"));
        assert!(c.result().is_none());
        assert_eq!(c.phase(), Phase::Analyzing);
    }

    #[test]
    fn snapshot_serializes_phase_and_run() {
        let mut c = AnalysisController::new();
        c.accept_image(image("a.jpg"));
        let v = serde_json::to_value(c.snapshot()).unwrap();
        assert_eq!(v["phase"], "analyzing");
        assert_eq!(v["run"], 1);
        assert_eq!(v["image"]["fileName"], "a.jpg");
        assert!(v["result"].is_null());
    }
}
