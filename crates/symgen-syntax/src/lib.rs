//! The syntax-tree interface between the grammar parser and the semantic model.
//!
//! The core never reads grammar text. A parser (outside this workspace) produces trees of nodes
//! implementing [`SyntaxNode`]; the model walks them with path queries such as
//! `node.find("Extends/Type")`. [`TreeNode`] is a plain in-memory implementation used by tests and
//! by collaborators that do not want to bring their own node type.
//!
//! The node kinds the model understands are listed in [`kinds`].

use symgen_core::SourceRef;

pub mod kinds {
    //! Node kinds consumed by the model.

    pub const UNIT: &str = "Unit";
    pub const IMPORT: &str = "Import";
    pub const INTERFACE: &str = "Interface";
    pub const CLASS: &str = "Class";
    pub const RULE: &str = "Rule";
    pub const METHOD: &str = "Method";
    pub const FIELD: &str = "Field";

    pub const COMMENT: &str = "Comment";
    pub const MODIFIER: &str = "Modifier";
    pub const NAME: &str = "Name";
    pub const TYPE_PARAMETER: &str = "TypeParameter";
    pub const BOUND: &str = "Bound";
    pub const EXTENDS: &str = "Extends";
    pub const IMPLEMENTS: &str = "Implements";
    pub const ARCHETYPE: &str = "Archetype";

    pub const TARGET: &str = "Target";
    pub const SYMBOL: &str = "Symbol";

    pub const RESULT: &str = "Result";
    pub const PARAMETER: &str = "Parameter";
    pub const VARIADIC: &str = "Variadic";
    pub const THROWS: &str = "Throws";
    pub const BODY: &str = "Body";

    pub const TYPE: &str = "Type";
    pub const ARGUMENT: &str = "Argument";
    pub const WILDCARD: &str = "Wildcard";
    pub const DIM: &str = "Dim";
}

/// Read-only view of a parsed syntax node.
pub trait SyntaxNode: Sized {
    /// The node kind, one of [`kinds`] for nodes the model consumes.
    fn kind(&self) -> &str;

    fn children(&self) -> &[Self];

    /// Textual value of a leaf (identifier, keyword, modifier). `None` for inner nodes.
    fn value(&self) -> Option<&str>;

    /// Verbatim source text covered by this node.
    fn image(&self) -> String;

    fn source_ref(&self) -> SourceRef;

    /// All descendants reached by following `path`, a `/`-separated chain of child kinds, in
    /// document order. An empty path yields the node itself.
    fn find(&self, path: &str) -> Vec<&Self> {
        let mut current = vec![self];
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|node| node.children().iter())
                .filter(|child| child.kind() == segment)
                .collect();
        }
        current
    }

    fn find_first(&self, path: &str) -> Option<&Self> {
        self.find(path).into_iter().next()
    }

    /// Value of the first node at `path`.
    fn value_of(&self, path: &str) -> Option<&str> {
        self.find_first(path).and_then(|node| node.value())
    }

    fn has(&self, path: &str) -> bool {
        self.find_first(path).is_some()
    }
}

/// In-memory syntax node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    kind: String,
    value: Option<String>,
    image: Option<String>,
    source: SourceRef,
    children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: None,
            image: None,
            source: SourceRef::default(),
            children: Vec::new(),
        }
    }

    /// A leaf carrying a value.
    pub fn leaf(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(kind).with_value(value)
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    #[must_use]
    pub fn at(mut self, source: SourceRef) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = TreeNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn push(&mut self, child: TreeNode) {
        self.children.push(child);
    }
}

impl SyntaxNode for TreeNode {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The explicit image when one was given, otherwise the leaf values joined by spaces.
    fn image(&self) -> String {
        if let Some(image) = &self.image {
            return image.clone();
        }
        let mut parts = Vec::new();
        collect_values(self, &mut parts);
        parts.join(" ")
    }

    fn source_ref(&self) -> SourceRef {
        self.source.clone()
    }
}

fn collect_values<'a>(node: &'a TreeNode, out: &mut Vec<&'a str>) {
    if let Some(value) = &node.value {
        out.push(value);
    }
    for child in &node.children {
        collect_values(child, out);
    }
}
