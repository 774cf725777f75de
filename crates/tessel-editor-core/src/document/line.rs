//! Lines, list containers and block classification.

use smol_str::SmolStr;
use tessel_delta::{AttributeMap, Delta, Embed, Insert, Op, Value};

use super::node::NodeId;

/// Format keys with block-level meaning.
pub mod format {
    pub const HEADER: &str = "header";
    pub const LIST: &str = "list";
    pub const INDENT: &str = "indent";
    pub const CODE_BLOCK: &str = "code-block";
    pub const AUTHOR: &str = "author";
    pub const ID: &str = "id";
    pub const SERVICE: &str = "service";
    pub const OMIT_AUTHORSHIP: &str = "omitAuthorship";
}

/// Placeholder char standing in for an inline embed in position-aligned text.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

/// The `list` format value of a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bullet,
    Ordered,
    Checked,
    Unchecked,
}

impl ListKind {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value.as_str()? {
            "bullet" => Some(Self::Bullet),
            "ordered" => Some(Self::Ordered),
            "checked" => Some(Self::Checked),
            "unchecked" => Some(Self::Unchecked),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bullet => "bullet",
            Self::Ordered => "ordered",
            Self::Checked => "checked",
            Self::Unchecked => "unchecked",
        }
    }

    pub fn is_todo(self) -> bool {
        matches!(self, Self::Checked | Self::Unchecked)
    }

    /// Format of the container this item lives in.
    pub fn container_format(self) -> ListFormat {
        match self {
            Self::Bullet => ListFormat {
                tag: ListTag::Unordered,
                checked: None,
            },
            Self::Ordered => ListFormat {
                tag: ListTag::Ordered,
                checked: None,
            },
            Self::Checked => ListFormat {
                tag: ListTag::Unordered,
                checked: Some(true),
            },
            Self::Unchecked => ListFormat {
                tag: ListTag::Unordered,
                checked: Some(false),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListTag {
    Ordered,
    Unordered,
}

/// What makes two list containers interchangeable: tag plus todo state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListFormat {
    pub tag: ListTag,
    /// `Some` for todo containers.
    pub checked: Option<bool>,
}

impl ListFormat {
    pub fn is_todo(&self) -> bool {
        self.checked.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EmbedKind {
    Image,
    Video,
    Link,
    File,
    Divider,
    Other,
}

impl EmbedKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "image" => Self::Image,
            "video" => Self::Video,
            "link" => Self::Link,
            "file" => Self::File,
            "divider" => Self::Divider,
            _ => Self::Other,
        }
    }
}

/// Block classification of a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockType {
    Paragraph,
    Header(u8),
    List(ListKind),
    CodeBlock,
    Embed(EmbedKind),
}

impl BlockType {
    /// Blot name of a text block. Embeds report their own kind through
    /// [`Line::blot_name`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::Paragraph => "block",
            Self::Header(_) => "header",
            Self::List(_) => "list",
            Self::CodeBlock => "code-block",
            Self::Embed(EmbedKind::Image) => "image",
            Self::Embed(EmbedKind::Video) => "video",
            Self::Embed(EmbedKind::Link) => "link",
            Self::Embed(EmbedKind::File) => "file",
            Self::Embed(EmbedKind::Divider) => "divider",
            Self::Embed(EmbedKind::Other) => "embed",
        }
    }
}

/// A run of inline content sharing one attribute set.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub insert: Insert,
    pub attributes: AttributeMap,
}

impl TextRun {
    pub fn len(&self) -> usize {
        self.insert.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insert.is_empty()
    }

    pub fn author(&self) -> Option<&str> {
        self.attributes.get(format::AUTHOR).and_then(Value::as_str)
    }
}

/// A block embed occupying a whole line.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbedBlock {
    pub embed: Embed,
    pub attributes: AttributeMap,
}

impl EmbedBlock {
    pub fn kind(&self) -> EmbedKind {
        EmbedKind::from_name(&self.embed.kind)
    }

    /// External service backing a link embed, from the payload or the attributes.
    pub fn service(&self) -> Option<&str> {
        self.embed
            .value
            .get(format::SERVICE)
            .and_then(Value::as_str)
            .or_else(|| self.attributes.get(format::SERVICE).and_then(Value::as_str))
    }

    pub fn author(&self) -> Option<&str> {
        self.attributes.get(format::AUTHOR).and_then(Value::as_str)
    }

    pub fn omits_authorship(&self) -> bool {
        let flagged = |value: Option<&Value>| value.and_then(Value::as_bool).unwrap_or(false);
        flagged(self.embed.value.get(format::OMIT_AUTHORSHIP))
            || flagged(self.attributes.get(format::OMIT_AUTHORSHIP))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LineBody {
    Text(Vec<TextRun>),
    Embed(EmbedBlock),
}

/// One line of the document: text terminated by a newline, or a block embed.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub node: NodeId,
    pub body: LineBody,
    /// Block format carried by the terminating newline. Empty for embeds.
    pub format: AttributeMap,
}

impl Line {
    pub fn text(node: NodeId, runs: Vec<TextRun>, format: AttributeMap) -> Self {
        Self {
            node,
            body: LineBody::Text(runs),
            format,
        }
    }

    pub fn embed(node: NodeId, block: EmbedBlock) -> Self {
        Self {
            node,
            body: LineBody::Embed(block),
            format: AttributeMap::new(),
        }
    }

    /// Length in document positions, terminator included.
    pub fn length(&self) -> usize {
        match &self.body {
            LineBody::Text(runs) => runs.iter().map(TextRun::len).sum::<usize>() + 1,
            LineBody::Embed(_) => 1,
        }
    }

    pub fn is_embed(&self) -> bool {
        matches!(self.body, LineBody::Embed(_))
    }

    pub fn as_embed(&self) -> Option<&EmbedBlock> {
        match &self.body {
            LineBody::Embed(block) => Some(block),
            LineBody::Text(_) => None,
        }
    }

    pub fn runs(&self) -> &[TextRun] {
        match &self.body {
            LineBody::Text(runs) => runs,
            LineBody::Embed(_) => &[],
        }
    }

    pub fn list_kind(&self) -> Option<ListKind> {
        if self.is_embed() {
            return None;
        }
        self.format.get(format::LIST).and_then(ListKind::from_value)
    }

    pub fn indent(&self) -> u8 {
        self.format
            .get(format::INDENT)
            .and_then(Value::as_u64)
            .map(|i| i.min(8) as u8)
            .unwrap_or(0)
    }

    pub fn block_type(&self) -> BlockType {
        if let LineBody::Embed(block) = &self.body {
            return BlockType::Embed(block.kind());
        }
        if let Some(kind) = self.list_kind() {
            return BlockType::List(kind);
        }
        if self.format.get(format::CODE_BLOCK).is_some_and(|v| !v.is_null()) {
            return BlockType::CodeBlock;
        }
        match self.format.get(format::HEADER).and_then(Value::as_u64) {
            Some(level @ 1..=6) => BlockType::Header(level as u8),
            _ => BlockType::Paragraph,
        }
    }

    pub fn blot_name(&self) -> &str {
        match &self.body {
            LineBody::Embed(block) => &block.embed.kind,
            LineBody::Text(_) => self.block_type().name(),
        }
    }

    pub fn service(&self) -> Option<&str> {
        self.as_embed().and_then(EmbedBlock::service)
    }

    /// Text of the line without its newline; inline embeds are skipped.
    pub fn plain_text(&self) -> String {
        self.runs()
            .iter()
            .filter_map(|run| run.insert.as_text())
            .collect()
    }

    /// Text of the line with one placeholder char per inline embed, so char
    /// offsets line up with document positions.
    pub fn aligned_text(&self) -> String {
        let mut out = String::new();
        for run in self.runs() {
            match &run.insert {
                Insert::Text(text) => out.push_str(text),
                Insert::Embed(_) => out.push(OBJECT_REPLACEMENT),
            }
        }
        out
    }

    /// A text line with nothing but whitespace in it.
    pub fn is_blank(&self) -> bool {
        match &self.body {
            LineBody::Embed(_) => false,
            LineBody::Text(runs) => runs.iter().all(|run| match &run.insert {
                Insert::Text(text) => text.trim().is_empty(),
                Insert::Embed(_) => false,
            }),
        }
    }

    /// Append this line's ops to a document delta.
    pub fn write_ops(&self, delta: &mut Delta) {
        match &self.body {
            LineBody::Text(runs) => {
                for run in runs {
                    delta.push(Op::Insert {
                        insert: run.insert.clone(),
                        attributes: run.attributes.clone(),
                    });
                }
                delta.push(Op::Insert {
                    insert: Insert::Text("\n".into()),
                    attributes: self.format.clone(),
                });
            }
            LineBody::Embed(block) => {
                delta.push(Op::Insert {
                    insert: Insert::Embed(block.embed.clone()),
                    attributes: block.attributes.clone(),
                });
            }
        }
    }

    pub fn id(&self) -> Option<SmolStr> {
        self.format
            .get(format::ID)
            .and_then(Value::as_str)
            .map(SmolStr::new)
    }
}

/// A run of list items sharing one container format.
#[derive(Clone, Debug, PartialEq)]
pub struct ListContainer {
    pub node: NodeId,
    pub format: ListFormat,
    pub items: Vec<Line>,
}

/// A top-level child of the scroll.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Line(Line),
    List(ListContainer),
}

impl Block {
    pub fn node(&self) -> NodeId {
        match self {
            Block::Line(line) => line.node,
            Block::List(list) => list.node,
        }
    }

    pub fn lines(&self) -> &[Line] {
        match self {
            Block::Line(line) => std::slice::from_ref(line),
            Block::List(list) => &list.items,
        }
    }

    pub fn lines_mut(&mut self) -> &mut [Line] {
        match self {
            Block::Line(line) => std::slice::from_mut(line),
            Block::List(list) => &mut list.items,
        }
    }
}
