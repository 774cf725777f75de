//! One editor instance with all its handlers wired up.
//!
//! The session is the only place that calls into more than one subsystem.
//! Gestures go in through its methods, the engine queues what happened, and
//! [`flush`](EditorSession::flush) routes each event to the handlers in a
//! fixed order: id stamping, selection, trackers, authorship. Deferred work
//! sits on the scheduler until the host calls [`tick`](EditorSession::tick).

use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;
use tessel_delta::{AttributeMap, Delta};

use crate::actions::{FocusTarget, Key, KeyCombo, KeydownResult};
use crate::authorship::{AuthorLabel, AuthorshipEngine};
use crate::config::EditorConfig;
use crate::document::{EmbedBlot, EmbedSize, Line, NodeId};
use crate::drag::{DragEngine, DropOutcome, FileDropTracker};
use crate::editor::{Editor, EngineEvent};
use crate::error::{ConfigError, EditorError};
use crate::ids::{IdSource, UuidSource, stamp_line_ids};
use crate::schedule::{Scheduler, Task, TaskKey};
use crate::selection::SelectionManager;
use crate::store::Store;
use crate::trackers::{MouseOverTracker, TriggerKind, TriggerTracker};
use crate::types::{EditorId, Range, Source};

pub struct EditorSession {
    editor: Editor,
    store: Store,
    config: Rc<EditorConfig>,
    scheduler: Scheduler,
    selection: SelectionManager,
    mention: TriggerTracker,
    emoji: TriggerTracker,
    mouse_over: MouseOverTracker,
    authorship: AuthorshipEngine,
    ids: Box<dyn IdSource>,
    drag: DragEngine,
    file_drop: FileDropTracker,
}

impl fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("editor", &self.editor.id())
            .field("scheduler", &self.scheduler)
            .field("drag", &self.drag)
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    /// Build a session over `contents`. Sessions on one page share `store`.
    pub fn new(
        id: EditorId,
        main: bool,
        contents: &Delta,
        store: Store,
        config: Rc<EditorConfig>,
    ) -> Result<Self, ConfigError> {
        let triggers = &config.triggers;
        let session = Self {
            editor: Editor::new(id.clone(), main, contents, &config),
            store,
            scheduler: Scheduler::new(),
            selection: SelectionManager::new(id.clone(), &config.selection),
            mention: TriggerTracker::new(id.clone(), TriggerKind::Mention, &triggers.mention)?,
            emoji: TriggerTracker::new(id.clone(), TriggerKind::Emoji, &triggers.emoji)?,
            mouse_over: MouseOverTracker::new(id.clone()),
            authorship: AuthorshipEngine::new(id.clone(), &config.authorship),
            ids: Box::new(UuidSource),
            drag: DragEngine::new(id.clone(), &config.drag),
            file_drop: FileDropTracker::new(&config.file_drop),
            config,
        };
        tracing::debug!(target: "tessel::session", editor = %id, main, "session created");
        Ok(session)
    }

    /// Replace where fresh line ids come from.
    pub fn with_id_source(mut self, ids: impl IdSource + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn mention(&self) -> &TriggerTracker {
        &self.mention
    }

    pub fn emoji(&self) -> &TriggerTracker {
        &self.emoji
    }

    pub fn drag(&self) -> &DragEngine {
        &self.drag
    }

    pub fn file_drop(&self) -> &FileDropTracker {
        &self.file_drop
    }

    // === Event routing ===

    /// Route every queued engine event, including the ones handlers queue
    /// while running.
    pub fn flush(&mut self) {
        loop {
            let events = self.editor.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                self.route(event);
            }
        }
    }

    fn route(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::TextChange { delta, source, .. } => {
                if source.is_user()
                    && let Some(stamp) = stamp_line_ids(&delta, self.ids.as_mut())
                {
                    self.editor.update_contents(stamp, Source::Silent);
                }
                self.selection
                    .on_text_change(&self.editor, &self.store, &delta, source);
                self.mention
                    .on_text_change(&self.editor, &self.store, &delta, source);
                self.emoji
                    .on_text_change(&self.editor, &self.store, &delta, source);
                self.mouse_over
                    .on_text_change(&self.editor, &self.store, &delta, source);
                self.authorship
                    .on_text_change(&mut self.editor, &mut self.scheduler, &delta, source);
            }
            EngineEvent::SelectionChange { range, source, .. } => {
                self.selection.on_selection_change(
                    &mut self.editor,
                    &self.store,
                    &mut self.scheduler,
                    range,
                    source,
                );
                self.mention.on_selection_change(&self.store, range, source);
                self.emoji.on_selection_change(&self.store, range, source);
            }
        }
    }

    // === Content ===

    /// Apply a change from a collaborator or the host.
    pub fn apply_remote(&mut self, change: Delta) -> Delta {
        let applied = self.editor.update_contents(change, Source::Api);
        self.flush();
        applied
    }

    /// Type `text` over the current selection.
    pub fn type_text(&mut self, text: &str) {
        let Some(range) = self.editor.get_selection() else {
            return;
        };
        if range.length > 0 {
            self.editor.delete_text(range.index, range.length, Source::User);
        }
        self.editor
            .insert_text(range.index, text, AttributeMap::new(), Source::User);
        self.flush();
    }

    pub fn keydown(&mut self, combo: &KeyCombo) -> Result<KeydownResult, EditorError> {
        let result = match self.selection.keydown(&mut self.editor, &self.store, combo)? {
            KeydownResult::Handled => KeydownResult::Handled,
            KeydownResult::NotHandled => self.edit_key(combo),
        };
        self.flush();
        Ok(result)
    }

    /// Plain editing keys on a text selection.
    fn edit_key(&mut self, combo: &KeyCombo) -> KeydownResult {
        if combo.modifiers.ctrl || combo.modifiers.meta || combo.modifiers.alt {
            return KeydownResult::NotHandled;
        }
        let Some(range) = self.editor.get_selection() else {
            return KeydownResult::NotHandled;
        };
        match combo.key {
            Key::Backspace | Key::Delete if range.length > 0 => {
                self.editor.delete_text(range.index, range.length, Source::User);
            }
            Key::Backspace if range.index > 0 => {
                self.editor.delete_text(range.index - 1, 1, Source::User);
            }
            Key::Delete if range.index + 1 < self.editor.length() => {
                self.editor.delete_text(range.index, 1, Source::User);
            }
            Key::Enter => {
                if range.length > 0 {
                    self.editor.delete_text(range.index, range.length, Source::User);
                }
                self.editor
                    .insert_text(range.index, "\n", AttributeMap::new(), Source::User);
            }
            _ => return KeydownResult::NotHandled,
        }
        KeydownResult::Handled
    }

    // === Selection ===

    pub fn set_selection(&mut self, range: Option<Range>, source: Source) {
        self.editor.set_selection(range, source);
        self.flush();
    }

    /// A click of `count` (1 single, 2 double, 3 triple) at `index`.
    pub fn click(&mut self, index: usize, count: u8) {
        self.selection.click(&mut self.editor, index, count);
        self.flush();
    }

    pub fn click_embed(&mut self, node: NodeId, shift: bool) -> Result<(), EditorError> {
        let result = self
            .selection
            .click_embed(&mut self.editor, &self.store, node, shift);
        self.flush();
        result
    }

    pub fn select_embed(&mut self, node: NodeId) -> Result<(), EditorError> {
        let result = self.selection.select_embed(&mut self.editor, &self.store, node);
        self.flush();
        result
    }

    pub fn mouse_down(&mut self, now: f64) {
        self.scheduler.advance(now);
        self.selection.mouse_down(now);
    }

    pub fn mouse_up(&mut self) {
        self.selection.mouse_up();
    }

    /// The platform selection moved while the pointer is down.
    pub fn native_selection_change(&mut self, range: Range, now: f64) {
        self.scheduler.advance(now);
        self.selection
            .native_selection_change(self.editor.scroll_mut(), range, now);
    }

    pub fn focus_changed(&mut self, target: &FocusTarget) {
        self.selection
            .focus_changed(self.editor.scroll_mut(), &self.store, target);
        self.flush();
    }

    /// The pointer entered a block, or left all of them.
    pub fn hover(&mut self, node: Option<NodeId>) {
        self.mouse_over.hover(&self.editor, &self.store, node);
    }

    // === Drag and drop ===

    pub fn drag_start(&mut self, index: usize, drag_handle: Option<NodeId>) -> Result<(), EditorError> {
        if self.drag.is_dragging() {
            tracing::warn!(target: "tessel::session", "drag started over a live drag");
            self.drag.cancel(&mut self.editor, &self.store)?;
        }
        self.drag
            .start(&mut self.editor, &self.store, index, drag_handle)?;
        Ok(())
    }

    pub fn drag_over(&mut self, client_y: f64, now: f64) -> Result<(), EditorError> {
        self.scheduler.advance(now);
        self.drag
            .drag_over(&mut self.editor, &self.store, &mut self.scheduler, client_y, now)
    }

    /// Drop at the current target. `pointer_dy` is the total vertical
    /// distance the pointer covered.
    pub fn drop(&mut self, pointer_dy: f64) -> Result<DropOutcome, EditorError> {
        let outcome = self
            .drag
            .drop(&mut self.editor, &self.store, &mut self.scheduler, pointer_dy);
        self.flush();
        outcome
    }

    pub fn drag_cancel(&mut self) -> Result<(), EditorError> {
        self.drag.cancel(&mut self.editor, &self.store)
    }

    /// The host's drag-end. Forgets the finished item.
    pub fn drag_end(&mut self) {
        self.drag.release();
    }

    pub fn file_drag_enter(&mut self) {
        self.file_drop.enter(&self.store, &mut self.scheduler);
    }

    pub fn file_drag_leave(&mut self) {
        self.file_drop.leave(&mut self.scheduler);
    }

    pub fn file_drag_drop(&mut self) {
        self.file_drop.drop(&self.store, &mut self.scheduler);
    }

    // === Layout ===

    /// The content area changed width. Positions are re-derived once the
    /// resizing settles.
    pub fn resize(&mut self, width: f64) {
        self.editor.scroll_mut().set_content_width(width);
        self.scheduler
            .debounce(TaskKey::Reflow, self.config.reflow.debounce_ms, Task::Reflow);
    }

    /// Scroll position or viewport height changed. Block embeds entering or
    /// leaving the viewport are told so, in one update pass.
    pub fn set_viewport(&mut self, scroll_top: f64, height: f64) {
        self.editor.set_viewport(scroll_top, height);
        let bottom = scroll_top + height;
        let scroll = self.editor.scroll_mut();
        let changed: Vec<(NodeId, bool)> = scroll
            .layout()
            .into_iter()
            .filter(|line_box| scroll.line(line_box.node).is_some_and(Line::is_embed))
            .map(|line_box| {
                let visible = line_box.offset_top < bottom && line_box.bottom() > scroll_top;
                (line_box.node, visible)
            })
            .filter(|&(node, visible)| scroll.state(node).embed.viewable != visible)
            .collect();
        if changed.is_empty() {
            return;
        }

        scroll.batch_start();
        for (node, visible) in changed {
            if let Ok(embed) = scroll.embed_mut(node) {
                if visible {
                    embed.viewable();
                } else {
                    embed.unviewable();
                }
            }
        }
        scroll.batch_end();
    }

    pub fn set_embed_size(&mut self, node: NodeId, size: EmbedSize) -> Result<(), EditorError> {
        self.editor.scroll_mut().embed_mut(node)?.set_size(size);
        self.scheduler
            .debounce(TaskKey::Reflow, self.config.reflow.debounce_ms, Task::Reflow);
        Ok(())
    }

    pub fn add_comment_mark(&mut self, node: NodeId, thread: &str) -> Result<(), EditorError> {
        self.editor.scroll_mut().embed_mut(node)?.add_mark(thread);
        Ok(())
    }

    pub fn remove_comment_mark(&mut self, node: NodeId, thread: &str) -> Result<(), EditorError> {
        self.editor.scroll_mut().embed_mut(node)?.remove_mark(thread);
        Ok(())
    }

    // === Authorship ===

    pub fn set_author(&mut self, author: Option<SmolStr>) {
        self.authorship.set_author(author);
    }

    /// The document finished loading; authorship labels may be computed.
    pub fn mark_loaded(&mut self) {
        self.authorship.mark_loaded(&mut self.scheduler);
    }

    /// Labels from the last authorship pass.
    pub fn author_labels(&self) -> Vec<AuthorLabel> {
        self.store.with_state(|state| {
            state
                .author_labels
                .get(self.editor.id())
                .cloned()
                .unwrap_or_default()
        })
    }

    // === Deferred work ===

    /// Run every task due at `now`, in order. Tasks queued while running
    /// with no delay run in the same call.
    pub fn tick(&mut self, now: f64) {
        self.scheduler.advance(now);
        while let Some(task) = self.scheduler.pop_due(now) {
            if let Err(error) = self.run(task, now) {
                tracing::warn!(target: "tessel::session", %error, "scheduled task failed");
            }
            self.flush();
        }
    }

    fn run(&mut self, task: Task, now: f64) -> Result<(), EditorError> {
        tracing::trace!(target: "tessel::session", ?task, now, "run task");
        match task {
            Task::HighlightSelection { .. } => {
                // The range may have moved since it was queued.
                if let Some(range) = self.editor.get_selection().filter(|r| r.length > 0) {
                    self.selection
                        .highlight_range(self.editor.scroll_mut(), range);
                }
            }
            Task::CleanupEmptyContainers => {
                let old_contents = self.editor.get_contents();
                self.editor.scroll_mut().optimize();
                self.editor.commit_structure(old_contents, Source::Api);
            }
            Task::RestoreDropSelection { node } => {
                let Some(index) = self.editor.get_index(node) else {
                    return Ok(());
                };
                if self.editor.scroll().line(node).is_some_and(Line::is_embed) {
                    self.selection
                        .select_embed(&mut self.editor, &self.store, node)?;
                } else {
                    self.editor
                        .set_selection(Some(Range::caret(index)), Source::Api);
                }
            }
            Task::EndMarginJump { node, margin_top } => {
                let scroll = self.editor.scroll_mut();
                if scroll.contains(node) {
                    scroll.state_mut(node).margin_top = margin_top;
                }
            }
            Task::AuthorshipPass => {
                self.authorship.pass(&self.editor, &self.store);
            }
            Task::Reflow => {
                self.authorship.pass(&self.editor, &self.store);
                self.selection.refresh(&self.editor, &self.store);
                self.mouse_over.refresh(&self.editor, &self.store);
            }
            Task::DragOverTrailing { client_y } => {
                self.drag
                    .drag_over_trailing(&mut self.editor, &self.store, client_y, now);
            }
            Task::FileDragEnd => self.file_drop.end(&self.store),
        }
        Ok(())
    }
}
