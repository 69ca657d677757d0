//! ==============================================================================
//! service.rs - async driver for the analysis state machine
//! ==============================================================================
//!
//! purpose:
//!     wraps `AnalysisController` in a lock and owns the one analysis task that
//!     may be in flight. the task is always cancellable:
//!     - a new image aborts the previous task before starting its own
//!     - `clear` aborts it
//!     - `shutdown`, or dropping the last service handle, aborts it
//!
//!     even if an abort loses the race with completion, the controller rejects
//!     the stale run id, so a superseded run can never overwrite newer state.
//!
//! relationships:
//!     - used by: server.rs (http handlers), main.rs (construction/shutdown)
//!     - uses: analysis.rs, analyzer.rs, dropzone.rs
//!
//! ==============================================================================

use crate::analysis::{AnalysisController, AnalysisSnapshot, Phase, RunId};
use crate::analyzer::Analyzer;
use crate::domain::{AnalysisResult, UploadedImage};
use crate::dropzone::{DragEvent, DragOutcome, DropZone};
use crate::error::AnalysisError;

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

struct Slot {
    controller: AnalysisController,
    drop_zone: DropZone,
    task: Option<JoinHandle<()>>,
}

impl Slot {
    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Inner {
    slot: Mutex<Slot>,
    analyzer: Arc<dyn Analyzer>,
    timeout: Duration,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.slot.get_mut().abort_task();
    }
}

/// Cheap to clone; all clones share one controller.
#[derive(Clone)]
pub struct AnalysisService {
    inner: Arc<Inner>,
}

impl AnalysisService {
    pub fn new(analyzer: Arc<dyn Analyzer>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(Slot {
                    controller: AnalysisController::new(),
                    drop_zone: DropZone::new(),
                    task: None,
                }),
                analyzer,
                timeout,
            }),
        }
    }

    /// Accept an image and start analysing it.
    pub async fn submit(&self, image: UploadedImage) -> RunId {
        let mut slot = self.inner.slot.lock().await;
        self.start_locked(&mut slot, image)
    }

    /// Feed one drag event through the drop zone. A drop with at least one
    /// file starts a run on the first file.
    pub async fn drag(&self, event: DragEvent) -> (DragOutcome, Option<RunId>) {
        let mut slot = self.inner.slot.lock().await;
        let mut outcome = slot.drop_zone.handle(event);
        let run = outcome.accepted.take().map(|image| self.start_locked(&mut slot, image));
        (outcome, run)
    }

    /// Drop the image and result, cancelling any in-flight run.
    pub async fn clear(&self) {
        let mut slot = self.inner.slot.lock().await;
        slot.abort_task();
        if let Some(run) = slot.controller.clear() {
            info!(%run, "[ANALYSIS] cancelled by clear");
        } else {
            info!("[ANALYSIS] cleared");
        }
    }

    pub async fn snapshot(&self) -> AnalysisSnapshot {
        self.inner.slot.lock().await.controller.snapshot()
    }

    pub async fn phase(&self) -> Phase {
        self.inner.slot.lock().await.controller.phase()
    }

    pub async fn result(&self) -> Option<AnalysisResult> {
        self.inner.slot.lock().await.controller.result().cloned()
    }

    /// Abort the in-flight run, if any. State is left as it was.
    pub async fn shutdown(&self) {
        self.inner.slot.lock().await.abort_task();
    }

    fn start_locked(&self, slot: &mut Slot, image: UploadedImage) -> RunId {
        slot.abort_task();
        let accepted = slot.controller.accept_image(image.clone());
        if let Some(old) = accepted.superseded {
            info!(%old, new = %accepted.run, "[ANALYSIS] superseded by new image");
        }
        info!(run = %accepted.run, file = %image.file_name, "[ANALYSIS] started");

        let run = accepted.run;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let analyzer = Arc::clone(&self.inner.analyzer);
        let timeout = self.inner.timeout;

        slot.task = Some(tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, analyzer.analyze(&image)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(AnalysisError::TimedOut(timeout)),
            };

            let Some(inner) = weak.upgrade() else { return };
            let mut slot = inner.slot.lock().await;
            let ok = outcome.is_ok();
            if slot.controller.finish(run, outcome) {
                if ok {
                    info!(%run, "[ANALYSIS] complete");
                } else if let Some(e) = slot.controller.failure() {
                    warn!(%run, error = %e, "[ANALYSIS] failed");
                }
            }
        }));

        run
    }
}
