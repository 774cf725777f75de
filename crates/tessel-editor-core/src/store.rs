//! Process-wide application state shared by every editor on the page.
//!
//! The store is a single-threaded handle (`Rc<RefCell<..>>`) cloned into each
//! session. Actions that clear or patch per-editor state carry the editor id
//! and are ignored unless the live state belongs to that editor, so one
//! instance can never clobber another's selection or picker.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use crate::analytics::AnalyticsEvent;
use crate::authorship::AuthorLabel;
use crate::drag::DragState;
use crate::selection::SelectionState;
use crate::trackers::{MouseOverState, TrackerState};
use crate::types::EditorId;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// The one live selection across all editors.
    pub selection: Option<SelectionState>,
    pub author_labels: BTreeMap<EditorId, Vec<AuthorLabel>>,
    pub mention: Option<TrackerState>,
    pub emoji: Option<TrackerState>,
    pub mouse_over: Option<MouseOverState>,
    pub drag: Option<DragState>,
    pub file_drag_active: bool,
    /// The latest analytics event. Hosts that forward every event subscribe
    /// to [`StatePath::Analytics`].
    pub analytics: Option<AnalyticsEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetSelection(SelectionState),
    /// Move the live selection without recomputing it.
    UpdateSelectionIndex {
        editor_id: EditorId,
        index: usize,
    },
    ClearSelection {
        editor_id: EditorId,
    },
    SetAuthorLabels {
        editor_id: EditorId,
        labels: Vec<AuthorLabel>,
    },
    /// `None` closes the mention picker if this editor owns it.
    SetMention {
        editor_id: EditorId,
        state: Option<TrackerState>,
    },
    SetEmoji {
        editor_id: EditorId,
        state: Option<TrackerState>,
    },
    SetMouseOver {
        editor_id: EditorId,
        state: Option<MouseOverState>,
    },
    SetDrag(Option<DragState>),
    SetFileDragActive(bool),
    Track(AnalyticsEvent),
}

/// The slice of state an action touches, used to route notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatePath {
    Selection,
    AuthorLabels,
    Mention,
    Emoji,
    MouseOver,
    Drag,
    FileDrag,
    Analytics,
}

impl Action {
    pub fn path(&self) -> StatePath {
        match self {
            Action::SetSelection(_)
            | Action::UpdateSelectionIndex { .. }
            | Action::ClearSelection { .. } => StatePath::Selection,
            Action::SetAuthorLabels { .. } => StatePath::AuthorLabels,
            Action::SetMention { .. } => StatePath::Mention,
            Action::SetEmoji { .. } => StatePath::Emoji,
            Action::SetMouseOver { .. } => StatePath::MouseOver,
            Action::SetDrag(_) => StatePath::Drag,
            Action::SetFileDragActive(_) => StatePath::FileDrag,
            Action::Track(_) => StatePath::Analytics,
        }
    }
}

impl AppState {
    fn reduce(&mut self, action: Action) {
        match action {
            Action::SetSelection(selection) => self.selection = Some(selection),
            Action::UpdateSelectionIndex { editor_id, index } => {
                if let Some(selection) = self.selection.as_mut()
                    && selection.editor_id == editor_id
                {
                    selection.index = index;
                }
            }
            Action::ClearSelection { editor_id } => {
                if self.selection.as_ref().is_some_and(|s| s.editor_id == editor_id) {
                    self.selection = None;
                }
            }
            Action::SetAuthorLabels { editor_id, labels } => {
                self.author_labels.insert(editor_id, labels);
            }
            Action::SetMention { editor_id, state } => {
                owned_set(&mut self.mention, &editor_id, state, |s| &s.editor_id)
            }
            Action::SetEmoji { editor_id, state } => {
                owned_set(&mut self.emoji, &editor_id, state, |s| &s.editor_id)
            }
            Action::SetMouseOver { editor_id, state } => {
                owned_set(&mut self.mouse_over, &editor_id, state, |s| &s.editor_id)
            }
            Action::SetDrag(drag) => self.drag = drag,
            Action::SetFileDragActive(active) => self.file_drag_active = active,
            Action::Track(event) => self.analytics = Some(event),
        }
    }
}

/// Setting always wins; clearing only applies to the owner's state.
fn owned_set<T>(
    slot: &mut Option<T>,
    editor_id: &EditorId,
    state: Option<T>,
    owner: impl Fn(&T) -> &EditorId,
) {
    match state {
        Some(state) => *slot = Some(state),
        None => {
            if slot.as_ref().is_some_and(|s| owner(s) == editor_id) {
                *slot = None;
            }
        }
    }
}

type Callback = Box<dyn FnMut(&AppState)>;

struct Subscriber {
    id: u64,
    path: StatePath,
    callback: Callback,
}

#[derive(Default)]
struct StoreInner {
    state: AppState,
    subscribers: Vec<Subscriber>,
    next_id: u64,
    /// Actions dispatched while callbacks run, reduced once they return.
    pending: VecDeque<Action>,
    dispatching: bool,
    /// Subscriptions dropped while their list was lent out to callbacks.
    removed: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Shared handle to the application state.
#[derive(Clone, Default)]
pub struct Store {
    inner: Rc<RefCell<StoreInner>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Store")
            .field("state", &inner.state)
            .field("subscribers", &inner.subscribers.len())
            .field("pending", &inner.pending.len())
            .finish()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce `action` into the state, then notify subscribers of its path.
    ///
    /// Callbacks run with the store unlocked and may dispatch. Those actions
    /// queue up and are reduced and notified in order after the current
    /// round of callbacks, before the outermost `dispatch` returns.
    pub fn dispatch(&self, action: Action) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.pending.push_back(action);
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
        }

        while let Some(action) = self.next_pending() {
            self.notify(action);
        }
    }

    fn next_pending(&self) -> Option<Action> {
        let mut inner = self.inner.borrow_mut();
        let action = inner.pending.pop_front();
        if action.is_none() {
            inner.dispatching = false;
        }
        action
    }

    fn notify(&self, action: Action) {
        let path = action.path();
        tracing::trace!(target: "tessel::store", ?path, "dispatch");
        let (snapshot, mut subscribers) = {
            let mut inner = self.inner.borrow_mut();
            inner.state.reduce(action);
            if !inner.subscribers.iter().any(|s| s.path == path) {
                return;
            }
            (inner.state.clone(), std::mem::take(&mut inner.subscribers))
        };

        for subscriber in subscribers.iter_mut().filter(|s| s.path == path) {
            if self.inner.borrow().removed.contains(&subscriber.id) {
                continue;
            }
            (subscriber.callback)(&snapshot);
        }

        let mut inner = self.inner.borrow_mut();
        let removed = std::mem::take(&mut inner.removed);
        subscribers.append(&mut inner.subscribers);
        subscribers.retain(|s| !removed.contains(&s.id));
        inner.subscribers = subscribers;
    }

    /// A snapshot of the current state.
    pub fn get_state(&self) -> AppState {
        self.inner.borrow().state.clone()
    }

    /// Read the state in place without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.inner.borrow().state)
    }

    pub fn subscribe(&self, path: StatePath, callback: impl FnMut(&AppState) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.subscribers.push(Subscriber {
            id,
            path,
            callback: Box::new(callback),
        });
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.inner.borrow_mut();
        inner.subscribers.retain(|s| s.id != id.0);
        if inner.dispatching {
            inner.removed.push(id.0);
        }
    }
}
