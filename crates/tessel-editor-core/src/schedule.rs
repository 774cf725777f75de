//! Cooperative timers: next-tick deferral, delays, debounces and throttles.
//!
//! Nothing here owns a clock. Callers pass millisecond timestamps in, the
//! scheduler hands back the tasks that are due, and the session runs them.
//! Tasks are plain data so they can be queued while the editor is borrowed.

use std::sync::OnceLock;

use web_time::Instant;

use crate::document::NodeId;
use crate::types::Range;

/// Milliseconds since the first call in this process.
///
/// Hosts without their own clock can feed this into the session.
pub fn now_ms() -> f64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

/// Deferred work, executed by the owning session.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Highlight embeds inside a selection once the old set is unhighlighted.
    HighlightSelection { range: Range },
    /// Drop list containers left empty by a drop.
    CleanupEmptyContainers,
    /// Put the selection back on a dropped block.
    RestoreDropSelection { node: NodeId },
    /// Reset a follower's margin after the drop animation.
    EndMarginJump { node: NodeId, margin_top: f64 },
    /// Recompute author labels.
    AuthorshipPass,
    /// Recompute layout-dependent state after a resize.
    Reflow,
    /// Trailing drag-over evaluation left behind by the throttle.
    DragOverTrailing { client_y: f64 },
    /// No drag-enter arrived after a drag-leave: the file drag is over.
    FileDragEnd,
}

/// Keys for tasks that replace each other instead of piling up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    Authorship,
    Reflow,
    DragOver,
    FileDragEnd,
}

#[derive(Debug)]
struct Scheduled {
    due: f64,
    seq: u64,
    key: Option<TaskKey>,
    task: Task,
}

/// Pending task queue ordered by (due time, insertion order).
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: Vec<Scheduled>,
    seq: u64,
    now: f64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last timestamp the scheduler was advanced to.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Move the clock forward. Time never runs backwards.
    pub fn advance(&mut self, now: f64) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Run `task` on the next tick, after whatever is already due now.
    pub fn next_tick(&mut self, task: Task) {
        self.push(self.now, None, task);
    }

    pub fn after(&mut self, delay_ms: f64, task: Task) {
        self.push(self.now + delay_ms.max(0.0), None, task);
    }

    /// Schedule `task` after `delay_ms`, dropping any pending task with the same key.
    pub fn debounce(&mut self, key: TaskKey, delay_ms: f64, task: Task) {
        self.cancel(key);
        self.push(self.now + delay_ms.max(0.0), Some(key), task);
    }

    /// Swap the payload of a pending keyed task, keeping its due time.
    ///
    /// Returns false when nothing with that key is pending.
    pub fn replace(&mut self, key: TaskKey, task: Task) -> bool {
        match self.queue.iter_mut().find(|s| s.key == Some(key)) {
            Some(scheduled) => {
                scheduled.task = task;
                true
            }
            None => false,
        }
    }

    /// Drop the pending task with `key`. Returns whether one was pending.
    pub fn cancel(&mut self, key: TaskKey) -> bool {
        let before = self.queue.len();
        self.queue.retain(|s| s.key != Some(key));
        before != self.queue.len()
    }

    pub fn is_pending(&self, key: TaskKey) -> bool {
        self.queue.iter().any(|s| s.key == Some(key))
    }

    /// Take the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: f64) -> Option<Task> {
        self.advance(now);
        let position = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
            .map(|(i, _)| i)?;
        Some(self.queue.remove(position).task)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn push(&mut self, due: f64, key: Option<TaskKey>, task: Task) {
        self.seq += 1;
        tracing::trace!(target: "tessel::schedule", due, ?key, ?task, "schedule");
        self.queue.push(Scheduled {
            due,
            seq: self.seq,
            key,
            task,
        });
    }
}

/// What a throttled call should do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThrottleCall {
    /// Run immediately.
    Now,
    /// Schedule a trailing run at this time.
    Trailing(f64),
    /// A trailing run is already pending; just refresh its arguments.
    Coalesced,
}

/// Leading plus trailing throttle.
#[derive(Debug, Clone, PartialEq)]
pub struct Throttle {
    interval: f64,
    last_run: Option<f64>,
    trailing_pending: bool,
}

impl Throttle {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval: interval_ms,
            last_run: None,
            trailing_pending: false,
        }
    }

    pub fn call(&mut self, now: f64) -> ThrottleCall {
        match self.last_run {
            Some(last) if now - last < self.interval => {
                if self.trailing_pending {
                    ThrottleCall::Coalesced
                } else {
                    self.trailing_pending = true;
                    ThrottleCall::Trailing(last + self.interval)
                }
            }
            _ => {
                self.last_run = Some(now);
                ThrottleCall::Now
            }
        }
    }

    /// Record that the trailing run happened.
    pub fn fire_trailing(&mut self, now: f64) {
        self.trailing_pending = false;
        self.last_run = Some(now);
    }
}
