//! SAX2-style event API: the bridge between the writer and event pipelines.
//!
//! Events flow in both directions:
//!
//! - [`SaxWriter`] accepts writer calls and fires events on a [`SaxHandler`].
//! - [`WriterHandler`] receives events and replays them into a writer.
//! - [`parse_sax`] reads XML text and fires events, so documents can be
//!   piped through the writer (see [`crate::indent`]).
//!
//! # Examples
//!
//! ```
//! use xmlquill::sax::{parse_sax, SaxAttribute, SaxHandler};
//! use xmlquill::parser::ParseOptions;
//!
//! struct Counter {
//!     elements: usize,
//! }
//!
//! impl SaxHandler for Counter {
//!     fn start_element(
//!         &mut self,
//!         _local_name: &str,
//!         _prefix: Option<&str>,
//!         _namespace: Option<&str>,
//!         _attributes: &[SaxAttribute],
//!     ) {
//!         self.elements += 1;
//!     }
//! }
//!
//! let mut counter = Counter { elements: 0 };
//! parse_sax("<root><a/><b/><c/></root>", &ParseOptions::default(), &mut counter).unwrap();
//! assert_eq!(counter.elements, 4);
//! ```

mod logging;
mod output;
mod replay;
mod writable;

pub use logging::LoggingHandler;
pub use output::{SaxOutput, SaxWriter};
pub use replay::WriterHandler;
pub use writable::{emit_events, writable_to_string, XmlWritable};

use crate::error::ParseError;
use crate::namespace::XMLNS_NAMESPACE;
use crate::parser::{self, ParseOptions};

/// An attribute as reported to [`SaxHandler::start_element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaxAttribute {
    /// Local part of the name. Without namespace processing this is the
    /// full name as written.
    pub local_name: String,
    /// The attribute value, unescaped.
    pub value: String,
    /// Namespace prefix, if any.
    pub prefix: Option<String>,
    /// Namespace URI, if any.
    pub namespace: Option<String>,
}

impl SaxAttribute {
    /// Creates an attribute with no namespace.
    pub fn new(local_name: &str, value: &str) -> Self {
        Self {
            local_name: local_name.to_string(),
            value: value.to_string(),
            prefix: None,
            namespace: None,
        }
    }

    /// The name as written in markup, `prefix:local` or `local`.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Whether this attribute is an `xmlns` declaration.
    pub fn is_namespace_declaration(&self) -> bool {
        self.namespace.as_deref() == Some(XMLNS_NAMESPACE)
            || self.prefix.as_deref() == Some("xmlns")
            || (self.prefix.is_none() && self.local_name == "xmlns")
            || self.local_name.starts_with("xmlns:")
    }
}

/// Receives document events in order.
///
/// Every method defaults to doing nothing.
#[allow(unused_variables)]
pub trait SaxHandler {
    /// First event of every document.
    fn start_document(&mut self) {}

    /// Last event of every document.
    fn end_document(&mut self) {}

    /// Called for the XML declaration, if the document has one.
    fn xml_declaration(&mut self, version: &str, encoding: Option<&str>, standalone: Option<bool>) {
    }

    /// Called before the `start_element` of the element declaring the
    /// mapping. An empty prefix is the default namespace.
    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) {}

    /// Called after the `end_element` of the element that declared the
    /// mapping.
    fn end_prefix_mapping(&mut self, prefix: &str) {}

    /// Called when an element start tag is complete.
    fn start_element(
        &mut self,
        local_name: &str,
        prefix: Option<&str>,
        namespace: Option<&str>,
        attributes: &[SaxAttribute],
    ) {
    }

    /// Also fired for `<empty/>` tags.
    fn end_element(&mut self, local_name: &str, prefix: Option<&str>, namespace: Option<&str>) {}

    /// Character data, unescaped. May arrive in several pieces.
    fn characters(&mut self, content: &str) {}

    /// Called for whitespace carrying no content, such as indentation.
    fn ignorable_whitespace(&mut self, content: &str) {}

    /// The content of a `<![CDATA[...]]>` section.
    fn cdata(&mut self, content: &str) {}

    fn comment(&mut self, content: &str) {}

    /// `data` is `None` for an instruction without data.
    fn processing_instruction(&mut self, target: &str, data: Option<&str>) {}
}

impl<H: SaxHandler + ?Sized> SaxHandler for &mut H {
    fn start_document(&mut self) {
        (**self).start_document();
    }

    fn end_document(&mut self) {
        (**self).end_document();
    }

    fn xml_declaration(&mut self, version: &str, encoding: Option<&str>, standalone: Option<bool>) {
        (**self).xml_declaration(version, encoding, standalone);
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) {
        (**self).start_prefix_mapping(prefix, uri);
    }

    fn end_prefix_mapping(&mut self, prefix: &str) {
        (**self).end_prefix_mapping(prefix);
    }

    fn start_element(
        &mut self,
        local_name: &str,
        prefix: Option<&str>,
        namespace: Option<&str>,
        attributes: &[SaxAttribute],
    ) {
        (**self).start_element(local_name, prefix, namespace, attributes);
    }

    fn end_element(&mut self, local_name: &str, prefix: Option<&str>, namespace: Option<&str>) {
        (**self).end_element(local_name, prefix, namespace);
    }

    fn characters(&mut self, content: &str) {
        (**self).characters(content);
    }

    fn ignorable_whitespace(&mut self, content: &str) {
        (**self).ignorable_whitespace(content);
    }

    fn cdata(&mut self, content: &str) {
        (**self).cdata(content);
    }

    fn comment(&mut self, content: &str) {
        (**self).comment(content);
    }

    fn processing_instruction(&mut self, target: &str, data: Option<&str>) {
        (**self).processing_instruction(target, data);
    }
}

/// Ignores every event. Parsing into it checks well-formedness.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHandler;

impl SaxHandler for DefaultHandler {}

/// Parses XML from a string, firing events on `handler`.
///
/// The reader covers elements, attributes, character data, the five
/// predefined entities, character references, comments, processing
/// instructions, CDATA sections and an optional XML declaration. A
/// DOCTYPE, any other entity reference or malformed input fails with a
/// [`ParseError`] pointing at the offending line and column.
///
/// With [`ParseOptions::namespaces`] enabled, prefixes are resolved,
/// `xmlns` attributes are reported as prefix-mapping events instead of
/// attributes, and an undeclared prefix is an error.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed.
///
/// ```
/// use xmlquill::sax::{parse_sax, DefaultHandler};
/// use xmlquill::parser::ParseOptions;
///
/// assert!(parse_sax("<root/>", &ParseOptions::default(), &mut DefaultHandler).is_ok());
/// assert!(parse_sax("<root>", &ParseOptions::default(), &mut DefaultHandler).is_err());
/// ```
pub fn parse_sax(
    input: &str,
    options: &ParseOptions,
    handler: &mut dyn SaxHandler,
) -> Result<(), ParseError> {
    let result = parser::read(input, options, handler);
    if let Err(e) = &result {
        tracing::debug!(error = %e, "parse failed");
    }
    result
}
