//! Node identity and the per-node presentation state kept beside the content.

use std::collections::BTreeSet;
use std::fmt;

use smol_str::SmolStr;

/// Identity of a block node: a line, a block embed, or a list container.
///
/// Ids are handed out by the scroll and survive content edits for as long as
/// the node does, so derived state can always re-resolve its index from one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Class names the editor toggles on nodes.
pub mod class {
    pub const DRAGGING: &str = "dragging";
    pub const DRAGOVER: &str = "dragover";
}

/// Presentation state of one node. Never part of the document contents.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeState {
    pub opacity: f32,
    pub classes: BTreeSet<SmolStr>,
    /// Extra space above the node, in px. Used by the drop animation.
    pub margin_top: f64,
    pub embed: EmbedState,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            classes: BTreeSet::new(),
            margin_top: 0.0,
            embed: EmbedState::default(),
        }
    }
}

impl NodeState {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn add_class(&mut self, class: &str) {
        self.classes.insert(SmolStr::new(class));
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.remove(class);
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Rendered size of an embed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmbedSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmbedState {
    pub highlighted: bool,
    /// Comment thread ids anchored on the embed.
    pub marks: BTreeSet<SmolStr>,
    pub size: Option<EmbedSize>,
    /// Whether the embed currently intersects the viewport.
    pub viewable: bool,
}

/// Capability surface every block embed exposes to the editor.
///
/// Selecting an embed needs the engine and the store, so it lives on the
/// session rather than here.
pub trait EmbedBlot {
    fn highlight(&mut self);
    fn unhighlight(&mut self);
    fn add_mark(&mut self, id: &str);
    fn remove_mark(&mut self, id: &str);
    fn set_size(&mut self, size: EmbedSize);
    fn viewable(&mut self);
    fn unviewable(&mut self);
}

impl EmbedBlot for EmbedState {
    fn highlight(&mut self) {
        self.highlighted = true;
    }

    fn unhighlight(&mut self) {
        self.highlighted = false;
    }

    fn add_mark(&mut self, id: &str) {
        self.marks.insert(SmolStr::new(id));
    }

    fn remove_mark(&mut self, id: &str) {
        self.marks.remove(id);
    }

    fn set_size(&mut self, size: EmbedSize) {
        self.size = Some(size);
    }

    fn viewable(&mut self) {
        self.viewable = true;
    }

    fn unviewable(&mut self) {
        self.viewable = false;
    }
}
