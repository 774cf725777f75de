//! Typed analytics events. Building payloads for a tracking backend is the
//! host's business; the editor only says what happened.

use serde::Serialize;
use smol_str::SmolStr;

use crate::types::EditorId;

/// What kind of content a drag carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "service")]
pub enum DragContent {
    Text,
    List,
    Image,
    Video,
    /// A link embed, named by the service behind it.
    ExternalLink(SmolStr),
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    Complete,
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum AnalyticsEvent {
    DragAndDrop {
        editor_id: EditorId,
        content: DragContent,
        completion: Completion,
    },
}
