//! Node payloads.

use super::Attribute;

/// What a node holds. Structure lives in [`Node`](super::Node).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The node above the root element. Every document has one.
    Document,

    Element {
        name: String,
        prefix: Option<String>,
        namespace: Option<String>,
        /// Attributes in write order, `xmlns` declarations after the rest.
        attributes: Vec<Attribute>,
    },

    /// Character data, unescaped. Adjacent writes are merged.
    Text { content: String },

    CData { content: String },

    /// Comment text without the `<!-- ` and ` -->` padding.
    Comment { content: String },

    ProcessingInstruction {
        target: String,
        /// `None` when the instruction was written with empty data.
        data: Option<String>,
    },
}
