//! Building a [`Document`] through the writer call contract.

use super::{Attribute, Document, NodeId, NodeKind};
use crate::error::MisuseError;
use crate::namespace::XMLNS_NAMESPACE;
use crate::util::qname::QualifiedName;
use crate::writer::{Output, Writer, WriterOptions, XmlStringWriter};

/// A writer appending nodes to an in-memory [`Document`].
pub type TreeWriter = Writer<TreeOutput>;

/// Output appending nodes under a cursor.
#[derive(Debug, Clone)]
pub struct TreeOutput {
    doc: Document,
    current: NodeId,
}

impl TreeOutput {
    /// Creates an output over an empty document.
    pub fn new() -> Self {
        let doc = Document::new();
        let current = doc.root();
        Self { doc, current }
    }

    /// The document built so far.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Unwraps the document.
    pub fn into_document(self) -> Document {
        self.doc
    }

    fn append(&mut self, kind: NodeKind) -> NodeId {
        self.doc.append(self.current, kind)
    }

    fn append_text(&mut self, text: &str) {
        if let Some(last) = self.doc.last_child(self.current) {
            if let NodeKind::Text { content } = &mut self.doc.node_mut(last).kind {
                content.push_str(text);
                return;
            }
        }
        self.append(NodeKind::Text {
            content: text.to_string(),
        });
    }

    fn push_attribute(&mut self, attribute: Attribute) {
        if let NodeKind::Element { attributes, .. } = &mut self.doc.node_mut(self.current).kind {
            attributes.push(attribute);
        }
    }

    fn ascend(&mut self) {
        self.current = self.doc.parent(self.current).unwrap_or(self.doc.root());
    }
}

impl Default for TreeOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl Output for TreeOutput {
    type Error = MisuseError;

    fn xml_declaration(&mut self) -> Result<(), MisuseError> {
        self.doc.has_declaration = true;
        Ok(())
    }

    fn start_tag(&mut self, name: &QualifiedName) -> Result<(), MisuseError> {
        self.current = self.append(NodeKind::Element {
            name: name.local_name.clone(),
            prefix: name.prefix.clone(),
            namespace: name.namespace.clone(),
            attributes: Vec::new(),
        });
        Ok(())
    }

    fn attribute(&mut self, name: &QualifiedName, value: &str) -> Result<(), MisuseError> {
        self.push_attribute(Attribute {
            name: name.local_name.clone(),
            value: value.to_string(),
            prefix: name.prefix.clone(),
            namespace: name.namespace.clone(),
        });
        Ok(())
    }

    fn namespace_declaration(&mut self, prefix: &str, uri: &str) -> Result<(), MisuseError> {
        let (name, prefix) = if prefix.is_empty() {
            ("xmlns".to_string(), None)
        } else {
            (prefix.to_string(), Some("xmlns".to_string()))
        };
        self.push_attribute(Attribute {
            name,
            value: uri.to_string(),
            prefix,
            namespace: Some(XMLNS_NAMESPACE.to_string()),
        });
        Ok(())
    }

    fn finish_start_tag(&mut self, empty: bool) -> Result<(), MisuseError> {
        if empty {
            self.ascend();
        }
        Ok(())
    }

    fn end_tag(&mut self, _name: &QualifiedName) -> Result<(), MisuseError> {
        self.ascend();
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), MisuseError> {
        self.append_text(text);
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<(), MisuseError> {
        self.append(NodeKind::Comment {
            content: text.to_string(),
        });
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), MisuseError> {
        self.append(NodeKind::ProcessingInstruction {
            target: target.to_string(),
            data: (!data.is_empty()).then(|| data.to_string()),
        });
        Ok(())
    }

    fn cdata(&mut self, data: &str) -> Result<(), MisuseError> {
        self.append(NodeKind::CData {
            content: data.to_string(),
        });
        Ok(())
    }

    fn whitespace(&mut self, whitespace: &str) -> Result<(), MisuseError> {
        self.append_text(whitespace);
        Ok(())
    }
}

impl Writer<TreeOutput> {
    /// Creates a tree writer without indentation.
    pub fn new() -> Self {
        Self::with_options(&WriterOptions::default())
    }

    /// Creates a tree writer configured by `options`.
    pub fn with_options(options: &WriterOptions) -> Self {
        Self::from_output(TreeOutput::new(), options)
    }

    /// The document built so far.
    pub fn document(&self) -> &Document {
        self.output().document()
    }

    /// Consumes the writer, returning the document.
    pub fn into_document(self) -> Document {
        self.into_output().into_document()
    }
}

impl Default for Writer<TreeOutput> {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes a document as XML text, in the format of the text writers.
///
/// Fails if the tree holds content the writer rejects, such as a comment
/// containing `--`.
pub fn serialize(doc: &Document) -> Result<String, MisuseError> {
    let mut xml = XmlStringWriter::new();
    if doc.has_declaration {
        xml.xml_decl()?;
    }
    for child in doc.children(doc.root()) {
        write_node(doc, child, &mut xml)?;
    }
    xml.close()?;
    Ok(xml.into_string())
}

fn write_node(doc: &Document, id: NodeId, xml: &mut XmlStringWriter) -> Result<(), MisuseError> {
    match &doc.node(id).kind {
        NodeKind::Document => {
            for child in doc.children(id) {
                write_node(doc, child, xml)?;
            }
        }
        NodeKind::Element {
            name,
            prefix,
            attributes,
            ..
        } => {
            match prefix {
                Some(prefix) => xml.open_element(&format!("{prefix}:{name}"), false)?,
                None => xml.open_element(name, false)?,
            }
            for attribute in attributes {
                xml.attribute(&attribute.qualified_name(), &attribute.value)?;
            }
            for child in doc.children(id) {
                write_node(doc, child, xml)?;
            }
            xml.close_element()?;
        }
        NodeKind::Text { content } => xml.write_text(content)?,
        NodeKind::CData { content } => xml.write_cdata(content)?,
        NodeKind::Comment { content } => xml.write_comment(content)?,
        NodeKind::ProcessingInstruction { target, data } => {
            xml.write_pi(target, data.as_deref().unwrap_or_default())?;
        }
    }
    Ok(())
}
