//! Window-level file drag state, debounced over enter/leave churn.

use crate::config::FileDropConfig;
use crate::schedule::{Scheduler, Task, TaskKey};
use crate::store::{Action, Store};

/// Whether files are being dragged over the window.
///
/// Hosts see a storm of enter/leave pairs as the pointer crosses child
/// elements, so a leave only ends the drag once no enter follows within the
/// timeout.
#[derive(Debug)]
pub struct FileDropTracker {
    active: bool,
    timeout_ms: f64,
}

impl FileDropTracker {
    pub fn new(config: &FileDropConfig) -> Self {
        Self {
            active: false,
            timeout_ms: config.end_timeout_ms,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn enter(&mut self, store: &Store, scheduler: &mut Scheduler) {
        scheduler.cancel(TaskKey::FileDragEnd);
        if !self.active {
            self.active = true;
            tracing::debug!(target: "tessel::drag", "file drag start");
            store.dispatch(Action::SetFileDragActive(true));
        }
    }

    pub fn leave(&mut self, scheduler: &mut Scheduler) {
        scheduler.debounce(TaskKey::FileDragEnd, self.timeout_ms, Task::FileDragEnd);
    }

    pub fn drop(&mut self, store: &Store, scheduler: &mut Scheduler) {
        scheduler.cancel(TaskKey::FileDragEnd);
        self.end(store);
    }

    /// End the file drag, if one is active.
    pub fn end(&mut self, store: &Store) {
        if self.active {
            self.active = false;
            tracing::debug!(target: "tessel::drag", "file drag end");
            store.dispatch(Action::SetFileDragActive(false));
        }
    }
}
