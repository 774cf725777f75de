//! Per-character authorship and per-line author labels.
//!
//! Local inserts are retagged with the current author through a silent
//! formatting change. Labels are recomputed from scratch on a debounced pass
//! and published to the store in one update.

use smol_str::SmolStr;
use tessel_delta::{Delta, Insert, Op};

use crate::config::AuthorshipConfig;
use crate::document::{BlockType, Line, LineBody, NodeId};
use crate::editor::{Editor, author_attributes};
use crate::schedule::{Scheduler, Task, TaskKey};
use crate::store::{Action, Store};
use crate::types::{EditorId, Source};

/// Who wrote most of a line, and where to draw the label.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorLabel {
    pub node: NodeId,
    pub line_index: usize,
    pub author: SmolStr,
    /// Vertical offset of the label relative to the scroll container.
    pub top: f64,
}

#[derive(Debug)]
pub struct AuthorshipEngine {
    editor_id: EditorId,
    author: Option<SmolStr>,
    loaded: bool,
    config: AuthorshipConfig,
}

impl AuthorshipEngine {
    pub fn new(editor_id: EditorId, config: &AuthorshipConfig) -> Self {
        Self {
            editor_id,
            author: None,
            loaded: false,
            config: config.clone(),
        }
    }

    pub fn set_author(&mut self, author: Option<SmolStr>) {
        self.author = author;
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The initial document is in: allow passes and run one right away.
    pub fn mark_loaded(&mut self, scheduler: &mut Scheduler) {
        self.loaded = true;
        scheduler.debounce(TaskKey::Authorship, 0.0, Task::AuthorshipPass);
    }

    /// Retag a local change and schedule a label pass.
    ///
    /// Only user changes count. The retag itself is silent, so it never
    /// comes back through here.
    pub fn on_text_change(&mut self, editor: &mut Editor, scheduler: &mut Scheduler, delta: &Delta, source: Source) {
        if !source.is_user() {
            return;
        }
        if let Some(author) = self.author.as_deref()
            && let Some(retag) = retag_inserts(delta, author)
        {
            tracing::trace!(target: "tessel::authorship", %author, "retagging local insert");
            editor.update_contents(retag, Source::Silent);
        }
        scheduler.debounce(TaskKey::Authorship, self.config.debounce_ms, Task::AuthorshipPass);
    }

    /// Recompute every label and publish them. Does nothing before load.
    pub fn pass(&self, editor: &Editor, store: &Store) -> Option<Vec<AuthorLabel>> {
        if !self.loaded {
            return None;
        }
        let scroll = editor.scroll();
        let labels: Vec<AuthorLabel> = scroll
            .lines()
            .zip(scroll.layout())
            .enumerate()
            // The title line is never attributed.
            .skip(1)
            .filter(|(_, (line, _))| self.counts_for_authorship(line))
            .filter_map(|(line_index, (line, line_box))| {
                let author = dominant_author(line)?;
                Some(AuthorLabel {
                    node: line.node,
                    line_index,
                    author,
                    top: line_box.offset_top + self.label_offset(line),
                })
            })
            .collect();
        tracing::debug!(target: "tessel::authorship", editor = %self.editor_id, labels = labels.len(), "authorship pass");
        store.dispatch(Action::SetAuthorLabels {
            editor_id: self.editor_id.clone(),
            labels: labels.clone(),
        });
        Some(labels)
    }

    fn counts_for_authorship(&self, line: &Line) -> bool {
        if self.config.exempt_block_types.iter().any(|t| t == line.blot_name()) {
            return false;
        }
        match line.as_embed() {
            Some(embed) => {
                !embed.omits_authorship()
                    && !embed
                        .service()
                        .is_some_and(|service| self.config.omitted_services.iter().any(|s| s == service))
            }
            None => true,
        }
    }

    fn label_offset(&self, line: &Line) -> f64 {
        match line.block_type() {
            BlockType::Header(level) => self.config.heading_offset(level),
            _ => self.config.body_offset,
        }
    }
}

/// Author with the most chars on the line. Ties go to whoever appears first.
fn dominant_author(line: &Line) -> Option<SmolStr> {
    let contributions: Vec<(&str, usize)> = match &line.body {
        LineBody::Embed(embed) => embed.author().map(|author| (author, 1)).into_iter().collect(),
        LineBody::Text(runs) => runs
            .iter()
            .filter_map(|run| run.author().map(|author| (author, run.len())))
            .collect(),
    };
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for (author, n) in contributions {
        match counts.iter_mut().find(|(a, _)| *a == author) {
            Some((_, count)) => *count += n,
            None => counts.push((author, n)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (author, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((author, count));
        }
    }
    best.map(|(author, _)| SmolStr::new(author))
}

/// Retains tagging every inserted char except newlines with `author`.
/// `None` when the change inserts nothing to tag.
pub fn retag_inserts(delta: &Delta, author: &str) -> Option<Delta> {
    let attributes = author_attributes(author);
    let mut retag = Delta::new();
    let mut tagged = false;
    for op in delta.ops() {
        match op {
            Op::Retain { len, .. } => retag = retag.retain(*len),
            Op::Delete(_) => {}
            Op::Insert {
                insert: Insert::Embed(_),
                ..
            } => {
                retag = retag.retain_with(1, attributes.clone());
                tagged = true;
            }
            Op::Insert {
                insert: Insert::Text(text),
                ..
            } => {
                for (i, segment) in text.split('\n').enumerate() {
                    if i > 0 {
                        retag = retag.retain(1);
                    }
                    let len = segment.chars().count();
                    if len > 0 {
                        retag = retag.retain_with(len, attributes.clone());
                        tagged = true;
                    }
                }
            }
        }
    }
    tagged.then(|| retag.chop())
}
