//! Block content schema.
//!
//! The schema lists what the markup → document builder may produce. Anything
//! outside it is dropped while building, with the text kept where there is
//! text to keep.

use blockdown_core::{BlockStyle, DecoratorMark, ListKind};

/// Annotation types a span may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationType {
    Link,
}

/// Non-text block types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Image,
    Code,
}

/// Legal styles, list kinds, marks and block types for built documents
#[derive(Debug, Clone, PartialEq)]
pub struct BlockContentSchema {
    pub styles: Vec<BlockStyle>,
    pub lists: Vec<ListKind>,
    pub decorators: Vec<DecoratorMark>,
    pub annotations: Vec<AnnotationType>,
    pub types: Vec<ObjectType>,
}

impl BlockContentSchema {
    /// Text blocks only: normal paragraphs with no marks
    pub fn plain() -> Self {
        Self {
            styles: vec![BlockStyle::Normal],
            lists: Vec::new(),
            decorators: Vec::new(),
            annotations: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn allows_style(&self, style: BlockStyle) -> bool {
        self.styles.contains(&style)
    }

    pub fn allows_list(&self, kind: ListKind) -> bool {
        self.lists.contains(&kind)
    }

    pub fn allows_decorator(&self, mark: DecoratorMark) -> bool {
        self.decorators.contains(&mark)
    }

    pub fn allows_annotation(&self, annotation: AnnotationType) -> bool {
        self.annotations.contains(&annotation)
    }

    pub fn allows_type(&self, object: ObjectType) -> bool {
        self.types.contains(&object)
    }
}

impl Default for BlockContentSchema {
    /// Everything the `blockContent` field allows
    fn default() -> Self {
        Self {
            styles: BlockStyle::ALL.to_vec(),
            lists: vec![ListKind::Bullet, ListKind::Numbered],
            decorators: DecoratorMark::ALL.to_vec(),
            annotations: vec![AnnotationType::Link],
            types: vec![ObjectType::Image, ObjectType::Code],
        }
    }
}
