//! Structured rich-text document model
//!
//! A [`Document`] is an ordered sequence of [`StructuredNode`] blocks. Text
//! blocks carry [`InlineSpan`] children, each with a set of
//! [`DecoratorMark`]s and at most one link [`Annotation`].

use std::collections::BTreeSet;

/// The conversion unit: blocks in document order
pub type Document = Vec<StructuredNode>;

/// A block-level node
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredNode {
    /// Paragraph, heading, quote or list item
    Text(TextBlock),
    /// Image referencing binary asset data
    Image(ImageBlock),
    /// Verbatim code
    Code(CodeBlock),
    /// A block kind this model does not know; children pass through unwrapped
    Unknown(UnknownBlock),
}

impl StructuredNode {
    /// The block key, if one has been assigned
    pub fn key(&self) -> Option<&str> {
        match self {
            StructuredNode::Text(b) => b.key.as_deref(),
            StructuredNode::Image(b) => b.key.as_deref(),
            StructuredNode::Code(b) => b.key.as_deref(),
            StructuredNode::Unknown(b) => b.key.as_deref(),
        }
    }

    /// Assign a block key
    pub fn set_key(&mut self, key: String) {
        let slot = match self {
            StructuredNode::Text(b) => &mut b.key,
            StructuredNode::Image(b) => &mut b.key,
            StructuredNode::Code(b) => &mut b.key,
            StructuredNode::Unknown(b) => &mut b.key,
        };
        *slot = Some(key);
    }

    /// List membership of a text block
    pub fn list(&self) -> Option<ListInfo> {
        match self {
            StructuredNode::Text(b) => b.list,
            _ => None,
        }
    }
}

impl From<TextBlock> for StructuredNode {
    fn from(block: TextBlock) -> Self {
        StructuredNode::Text(block)
    }
}

impl From<ImageBlock> for StructuredNode {
    fn from(block: ImageBlock) -> Self {
        StructuredNode::Image(block)
    }
}

impl From<CodeBlock> for StructuredNode {
    fn from(block: CodeBlock) -> Self {
        StructuredNode::Code(block)
    }
}

/// Paragraph-level style of a text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockStyle {
    #[default]
    Normal,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Blockquote,
}

impl BlockStyle {
    pub const ALL: [Self; 8] = [
        Self::Normal,
        Self::H1,
        Self::H2,
        Self::H3,
        Self::H4,
        Self::H5,
        Self::H6,
        Self::Blockquote,
    ];

    /// Heading style for a level in 1..=6
    pub const fn heading(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::H1),
            2 => Some(Self::H2),
            3 => Some(Self::H3),
            4 => Some(Self::H4),
            5 => Some(Self::H5),
            6 => Some(Self::H6),
            _ => None,
        }
    }

    pub const fn heading_level(&self) -> Option<u8> {
        match self {
            Self::H1 => Some(1),
            Self::H2 => Some(2),
            Self::H3 => Some(3),
            Self::H4 => Some(4),
            Self::H5 => Some(5),
            Self::H6 => Some(6),
            Self::Normal | Self::Blockquote => None,
        }
    }

    /// Name used in the stored JSON form
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
            Self::Blockquote => "blockquote",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.wire_name() == name)
    }
}

/// Kind of list a text block belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bullet,
    Numbered,
}

impl ListKind {
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::Bullet => "bullet",
            Self::Numbered => "number",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "bullet" => Some(Self::Bullet),
            "number" => Some(Self::Numbered),
            _ => None,
        }
    }
}

/// List membership: kind plus 0-based nesting level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListInfo {
    pub kind: ListKind,
    pub nesting_level: u32,
}

/// Toggleable inline style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DecoratorMark {
    Bold,
    Italic,
    Code,
    Underline,
    Strikethrough,
}

impl DecoratorMark {
    pub const ALL: [Self; 5] = [
        Self::Bold,
        Self::Italic,
        Self::Code,
        Self::Underline,
        Self::Strikethrough,
    ];

    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::Bold => "strong",
            Self::Italic => "em",
            Self::Code => "code",
            Self::Underline => "underline",
            Self::Strikethrough => "strike-through",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.wire_name() == name)
    }
}

/// Where a link points
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkTarget {
    External { url: String },
    Internal { target_document_id: String },
}

/// Link metadata attached to a span
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Annotation {
    pub link: LinkTarget,
    pub open_in_new_tab: bool,
}

impl Annotation {
    pub fn external(url: impl Into<String>) -> Self {
        Self {
            link: LinkTarget::External { url: url.into() },
            open_in_new_tab: false,
        }
    }

    pub fn internal(target_document_id: impl Into<String>) -> Self {
        Self {
            link: LinkTarget::Internal {
                target_document_id: target_document_id.into(),
            },
            open_in_new_tab: false,
        }
    }

    pub fn in_new_tab(mut self) -> Self {
        self.open_in_new_tab = true;
        self
    }
}

/// A run of text sharing the same marks and annotation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InlineSpan {
    pub text: String,
    pub marks: BTreeSet<DecoratorMark>,
    pub annotation: Option<Annotation>,
}

impl InlineSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_mark(mut self, mark: DecoratorMark) -> Self {
        self.marks.insert(mark);
        self
    }

    pub fn with_marks(mut self, marks: impl IntoIterator<Item = DecoratorMark>) -> Self {
        self.marks.extend(marks);
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn has(&self, mark: DecoratorMark) -> bool {
        self.marks.contains(&mark)
    }

    /// Whether two spans can be rendered as one run
    pub fn same_formatting(&self, other: &InlineSpan) -> bool {
        self.marks == other.marks && self.annotation == other.annotation
    }
}

/// Paragraph, heading, quote or list item
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextBlock {
    pub key: Option<String>,
    pub style: BlockStyle,
    pub list: Option<ListInfo>,
    pub children: Vec<InlineSpan>,
}

impl TextBlock {
    pub fn new(style: BlockStyle, children: Vec<InlineSpan>) -> Self {
        Self {
            key: None,
            style,
            list: None,
            children,
        }
    }

    pub fn paragraph(children: Vec<InlineSpan>) -> Self {
        Self::new(BlockStyle::Normal, children)
    }

    pub fn list_item(kind: ListKind, nesting_level: u32, children: Vec<InlineSpan>) -> Self {
        Self {
            list: Some(ListInfo {
                kind,
                nesting_level,
            }),
            ..Self::paragraph(children)
        }
    }

    /// Concatenated text of all spans
    pub fn plain_text(&self) -> String {
        self.children.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Image block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageBlock {
    pub key: Option<String>,
    /// Asset reference (asset id or URL) of the binary image data
    pub asset: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
}

impl ImageBlock {
    pub fn new(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            ..Default::default()
        }
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt_text = Some(alt.into());
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

/// Code block, rendered verbatim
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodeBlock {
    pub key: Option<String>,
    pub language: Option<String>,
    pub filename: Option<String>,
    pub code: String,
}

impl CodeBlock {
    pub fn new(language: Option<&str>, code: impl Into<String>) -> Self {
        Self {
            language: language.map(str::to_string),
            code: code.into(),
            ..Default::default()
        }
    }
}

/// Block of an unrecognised type
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnknownBlock {
    pub key: Option<String>,
    pub type_name: String,
    pub children: Vec<InlineSpan>,
}
