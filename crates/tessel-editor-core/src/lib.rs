//! tessel-editor-core: headless block editor logic without a rendering layer.
//!
//! This crate provides:
//! - `Editor` - the engine: a block tree edited through sourced deltas
//! - `SelectionManager` - text and embed selection published to the store
//! - `TriggerTracker` / `MouseOverTracker` - positions kept valid across edits
//! - `DragEngine` - block drag and drop with list-aware units
//! - `AuthorshipEngine` and `stamp_line_ids` - change bookkeeping
//! - `EditorSession` - one editor with every handler wired to a shared `Store`

pub mod actions;
pub mod analytics;
pub mod authorship;
pub mod config;
pub mod document;
pub mod drag;
pub mod editor;
pub mod error;
pub mod ids;
pub mod schedule;
pub mod selection;
pub mod session;
pub mod store;
pub mod trackers;
pub mod types;

pub use actions::{EmbedKeyAction, FocusTarget, Key, KeyCombo, KeydownResult, Modifiers};
pub use analytics::{AnalyticsEvent, Completion, DragContent};
pub use authorship::{AuthorLabel, AuthorshipEngine};
pub use config::EditorConfig;
pub use document::{EmbedBlot, NodeId, Scroll};
pub use drag::{DragEngine, DragType, DropOutcome, FileDropTracker};
pub use editor::{Editor, EngineEvent};
pub use error::{ConfigError, EditorError};
pub use ids::{IdSource, SequentialIds, UuidSource, stamp_line_ids};
pub use schedule::{Scheduler, Task, now_ms};
pub use selection::{SelectionManager, SelectionState, SelectionType};
pub use session::EditorSession;
pub use smol_str::SmolStr;
pub use store::{Action, AppState, StatePath, Store};
pub use tessel_delta::{AttributeMap, Delta, Embed};
pub use trackers::{MouseOverTracker, TrackerState, TriggerKind, TriggerTracker};
pub use types::{Bounds, EditorId, Range, Source};
