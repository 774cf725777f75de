//! Error types for the editor core.

use miette::Diagnostic;

use crate::document::NodeId;

/// Errors surfaced to callers when a precondition does not hold.
///
/// Expected empty states (no drop target, null selection, inactive tracker)
/// are not errors and never show up here.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq)]
#[non_exhaustive]
pub enum EditorError {
    /// No block covers the requested document index.
    #[error("no block at index {0}")]
    #[diagnostic(code(tessel::no_block))]
    NoBlockAtIndex(usize),

    /// A node id does not (or no longer) resolve to a block in the scroll.
    #[error("node {0} is not attached to the document")]
    #[diagnostic(code(tessel::unknown_node))]
    UnknownNode(NodeId),

    /// The node exists but is not a block embed.
    #[error("node {0} is not an embed")]
    #[diagnostic(code(tessel::not_an_embed))]
    NotAnEmbed(NodeId),

    /// A drag operation was requested with no drag in progress.
    #[error("no drag in progress")]
    #[diagnostic(code(tessel::no_drag), help("call drag_start before drag_over or drop"))]
    NoActiveDrag,
}

/// Errors loading an [`EditorConfig`](crate::config::EditorConfig).
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ConfigError {
    /// The TOML source did not parse or did not match the config shape.
    #[error(transparent)]
    #[diagnostic(code(tessel::config::toml))]
    Toml(#[from] toml::de::Error),

    /// The config file could not be read.
    #[error(transparent)]
    #[diagnostic(code(tessel::config::io))]
    Io(#[from] std::io::Error),

    /// A trigger produced an activation pattern that does not compile.
    #[error("invalid trigger pattern: {0}")]
    #[diagnostic(code(tessel::config::trigger))]
    Pattern(#[from] regex::Error),

    /// A trigger window smaller than the longest query it must match.
    #[error("trigger {trigger:?}: window {window} cannot hold a query of {max_query} chars")]
    #[diagnostic(code(tessel::config::trigger_window))]
    TriggerWindow {
        trigger: char,
        window: usize,
        max_query: usize,
    },
}
