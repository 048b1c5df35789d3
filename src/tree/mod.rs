//! An in-memory document and the writer back end that builds it.
//!
//! Nodes are stored in one `Vec` and addressed by [`NodeId`]. Each node
//! keeps its parent and an ordered list of child ids, which is all an
//! append-only builder needs.
//!
//! [`TreeWriter`] takes the same calls as the text writers. Indentation
//! and line breaks, including those between top-level nodes, turn into
//! whitespace text nodes, so [`serialize`] gives back exactly what a text
//! writer with the same options would have produced.

mod node;
mod writer;

pub use node::NodeKind;
pub use writer::{serialize, TreeOutput, TreeWriter};

/// Position of a node in its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A node and its links.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// An attribute as written, with its value unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub prefix: Option<String>,
    pub namespace: Option<String>,
}

impl Attribute {
    /// `prefix:name`, or the bare name.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A document built by a [`TreeWriter`].
///
/// ```
/// use xmlquill::tree::TreeWriter;
///
/// let mut xml = TreeWriter::new();
/// xml.element("greeting", "hello").unwrap();
/// let doc = xml.into_document();
/// let root = doc.root_element().unwrap();
/// assert_eq!(doc.node_name(root), Some("greeting"));
/// assert_eq!(doc.text_content(root), "hello");
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    /// Set when an XML declaration was written.
    pub has_declaration: bool,
}

impl Document {
    /// A document holding only its document node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            has_declaration: false,
        }
    }

    /// The document node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .find(|&id| matches!(self.node(id).kind, NodeKind::Element { .. }))
    }

    /// # Panics
    ///
    /// Panics if `id` came from a larger document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Local name of an element, or target of an instruction.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. }
            | NodeKind::ProcessingInstruction { target: name, .. } => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn node_namespace(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    /// The payload of a text, CDATA, comment or instruction node.
    #[must_use]
    pub fn node_text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { content }
            | NodeKind::CData { content }
            | NodeKind::Comment { content } => Some(content),
            NodeKind::ProcessingInstruction { data, .. } => data.as_deref(),
            NodeKind::Document | NodeKind::Element { .. } => None,
        }
    }

    /// All text and CDATA below `id`, in document order.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let node = self.node(next);
            match &node.kind {
                NodeKind::Text { content } | NodeKind::CData { content } => out.push_str(content),
                _ => pending.extend(node.children.iter().rev()),
            }
        }
        out
    }

    /// Attributes of an element; empty for other nodes.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Looks an attribute up by the name it was written with.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|attribute| attribute.qualified_name() == name)
            .map(|attribute| attribute.value.as_str())
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.last().copied()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id).children.iter().copied()
    }

    /// Adds `kind` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.node_mut(parent).children.push(id);
        id
    }

    /// Number of nodes, the document node included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(name: &str) -> NodeKind {
        NodeKind::Element {
            name: name.to_string(),
            prefix: None,
            namespace: None,
            attributes: Vec::new(),
        }
    }

    fn text(content: &str) -> NodeKind {
        NodeKind::Text {
            content: content.to_string(),
        }
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.root_element(), None);
        assert_eq!(doc.parent(doc.root()), None);
    }

    #[test]
    fn test_children_keep_order() {
        let mut doc = Document::new();
        let root = doc.append(doc.root(), element("root"));
        let a = doc.append(root, element("a"));
        let hi = doc.append(root, text("hi"));
        doc.append(a, text("nested "));

        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![a, hi]);
        assert_eq!(doc.parent(a), Some(root));
        assert_eq!(doc.last_child(root), Some(hi));
        assert_eq!(doc.text_content(root), "nested hi");
        assert_eq!(doc.node_text(hi), Some("hi"));
        assert_eq!(doc.node_text(root), None);
    }

    #[test]
    fn test_attribute_lookup_uses_written_name() {
        let mut doc = Document::new();
        let e = doc.append(
            doc.root(),
            NodeKind::Element {
                name: "e".to_string(),
                prefix: None,
                namespace: None,
                attributes: vec![Attribute {
                    name: "lang".to_string(),
                    value: "en".to_string(),
                    prefix: Some("xml".to_string()),
                    namespace: Some(crate::namespace::XML_NAMESPACE.to_string()),
                }],
            },
        );
        assert_eq!(doc.attribute(e, "xml:lang"), Some("en"));
        assert_eq!(doc.attribute(e, "lang"), None);
        assert!(doc.attributes(doc.root()).is_empty());
    }
}
