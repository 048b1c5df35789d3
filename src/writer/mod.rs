//! The streaming writer.
//!
//! [`Writer`] is a forward-only state machine: elements are opened,
//! given attributes, filled with content and closed, and each call is
//! checked against the element stack before anything is emitted. Misuse is
//! reported as a [`MisuseError`] and never corrected.
//!
//! The same state machine drives every back end through the [`Output`]
//! trait: [`XmlStreamWriter`] writes text to an [`io::Write`],
//! [`XmlStringWriter`] builds a `String`, and the tree and SAX back ends
//! live in [`crate::tree`] and [`crate::sax`].
//!
//! # Examples
//!
//! ```
//! use xmlquill::writer::{WriterOptions, XmlStringWriter};
//!
//! let options = WriterOptions::default().indent("  ").unwrap();
//! let mut xml = XmlStringWriter::with_options(&options);
//! xml.open_element("root", true).unwrap();
//! xml.element("a", "one").unwrap();
//! xml.element("b", "two").unwrap();
//! xml.close_element().unwrap();
//! xml.close().unwrap();
//! assert_eq!(xml.as_str(), "<root>\n  <a>one</a>\n  <b>two</b>\n</root>");
//! ```

mod output;
pub(crate) mod stack;

use std::io;

pub use output::{Output, TextOutput};

use crate::error::MisuseError;
use crate::escape::EscapePolicy;
use crate::namespace::{check_reserved, PrefixDelta, PrefixTable};
use crate::sink::IoSink;
use crate::util::qname::QualifiedName;
use stack::{ElementStack, Frame};

/// A writer producing XML text on an [`io::Write`].
pub type XmlStreamWriter<W> = Writer<TextOutput<IoSink<W>>>;

/// A writer producing XML text in memory. Its error type is
/// [`MisuseError`]: there is no I/O failure to observe.
pub type XmlStringWriter = Writer<TextOutput<String>>;

const NO_NAMESPACES: &str = "This writer does not handle namespaces.";

/// Whether a writer resolves namespace URIs to prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamespaceMode {
    /// Names are written as given; namespace-qualified calls fail with
    /// [`MisuseError::Unsupported`].
    #[default]
    Simple,
    /// URIs are resolved through prefix mappings, and declarations are
    /// emitted on the elements that introduce them.
    Aware,
}

/// Configuration for a writer.
///
/// ```
/// use xmlquill::writer::{NamespaceMode, WriterOptions};
///
/// let options = WriterOptions::default()
///     .indent("\t").unwrap()
///     .encoding("ASCII").unwrap()
///     .namespaces(NamespaceMode::Aware);
/// assert_eq!(options.indent_unit(), Some("\t"));
/// ```
#[derive(Debug, Clone)]
pub struct WriterOptions {
    indent: Option<String>,
    encoding: String,
    policy: EscapePolicy,
    namespaces: NamespaceMode,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            indent: None,
            encoding: "utf-8".to_string(),
            policy: EscapePolicy::Utf8,
            namespaces: NamespaceMode::Simple,
        }
    }
}

impl WriterOptions {
    /// Enables indentation with `unit` per level. The unit must be spaces
    /// and tabs; an empty unit only breaks lines.
    pub fn indent(mut self, unit: &str) -> Result<Self, MisuseError> {
        validate_indent(unit)?;
        self.indent = Some(unit.to_string());
        Ok(self)
    }

    /// Sets the output encoding, which selects the escaping policy and is
    /// named in the XML declaration.
    pub fn encoding(mut self, label: &str) -> Result<Self, MisuseError> {
        self.policy = EscapePolicy::for_encoding(label)
            .ok_or_else(|| MisuseError::UnsupportedEncoding(label.to_string()))?;
        self.encoding = label.to_string();
        Ok(self)
    }

    /// Selects the namespace mode.
    #[must_use]
    pub fn namespaces(mut self, mode: NamespaceMode) -> Self {
        self.namespaces = mode;
        self
    }

    /// Shorthand for [`NamespaceMode::Aware`] or [`NamespaceMode::Simple`].
    #[must_use]
    pub fn namespace_aware(self, aware: bool) -> Self {
        self.namespaces(if aware {
            NamespaceMode::Aware
        } else {
            NamespaceMode::Simple
        })
    }

    /// The indentation unit, if indentation is enabled.
    pub fn indent_unit(&self) -> Option<&str> {
        self.indent.as_deref()
    }

    /// The encoding label.
    pub fn encoding_label(&self) -> &str {
        &self.encoding
    }

    /// The escaping policy derived from the encoding.
    pub fn policy(&self) -> EscapePolicy {
        self.policy
    }

    /// The namespace mode.
    pub fn namespace_mode(&self) -> NamespaceMode {
        self.namespaces
    }
}

/// An indentation unit is a run of spaces and tabs.
pub(crate) fn validate_indent(unit: &str) -> Result<(), MisuseError> {
    if unit.chars().all(|c| matches!(c, ' ' | '\t')) {
        Ok(())
    } else {
        Err(MisuseError::InvalidIndent {
            found: unit.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
enum Namespaces {
    Simple,
    Aware {
        table: PrefixTable,
        /// Live bindings not yet owned by an element.
        pending: Vec<PrefixDelta>,
    },
}

/// The writer state machine over an [`Output`].
#[derive(Debug)]
pub struct Writer<O: Output> {
    output: O,
    stack: ElementStack,
    namespaces: Namespaces,
    indent: Option<String>,
    /// Between `<name` and the character terminating the start tag.
    tag_pending: bool,
    /// Bindings the names already written in the pending start tag rely on.
    tag_bindings: Vec<PrefixDelta>,
    /// Set once the first element is opened.
    started: bool,
    closed: bool,
}

impl<W: io::Write> Writer<TextOutput<IoSink<W>>> {
    /// Creates a simple UTF-8 writer without indentation.
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, &WriterOptions::default())
    }

    /// Creates a writer configured by `options`.
    pub fn with_options(inner: W, options: &WriterOptions) -> Self {
        let sink = IoSink::with_encoding(inner, options.policy.output_encoding());
        let output = TextOutput::new(sink, options.policy, &options.encoding);
        Self::from_output(output, options)
    }

    /// Releases the underlying writer. Output is complete only if
    /// [`Writer::close`] succeeded.
    pub fn into_writer(self) -> W {
        self.output.into_sink().into_inner()
    }
}

impl Writer<TextOutput<String>> {
    /// Creates a simple in-memory writer without indentation.
    pub fn new() -> Self {
        Self::with_options(&WriterOptions::default())
    }

    /// Creates an in-memory writer configured by `options`.
    pub fn with_options(options: &WriterOptions) -> Self {
        let output = TextOutput::new(String::new(), options.policy, &options.encoding);
        Self::from_output(output, options)
    }

    /// The XML written so far.
    pub fn as_str(&self) -> &str {
        self.output.get_ref()
    }

    /// Consumes the writer, returning the XML written so far.
    pub fn into_string(self) -> String {
        self.output.into_sink()
    }
}

impl Default for Writer<TextOutput<String>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Output> Writer<O> {
    /// Creates a writer over an arbitrary output. Only the indentation
    /// and namespace mode of `options` apply here; encoding concerns
    /// belong to the output.
    pub fn from_output(output: O, options: &WriterOptions) -> Self {
        let aware = options.namespaces == NamespaceMode::Aware;
        let namespaces = if aware {
            Namespaces::Aware {
                table: PrefixTable::new(),
                pending: Vec::new(),
            }
        } else {
            Namespaces::Simple
        };
        Self {
            output,
            stack: ElementStack::new(aware),
            namespaces,
            indent: options.indent.clone(),
            tag_pending: false,
            tag_bindings: Vec::new(),
            started: false,
            closed: false,
        }
    }

    /// The namespace mode of this writer.
    pub fn namespace_mode(&self) -> NamespaceMode {
        match self.namespaces {
            Namespaces::Simple => NamespaceMode::Simple,
            Namespaces::Aware { .. } => NamespaceMode::Aware,
        }
    }

    /// Number of open elements.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Whether [`Writer::close`] has succeeded.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns a reference to the output.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Consumes the writer, returning the output.
    pub fn into_output(self) -> O {
        self.output
    }

    /// Sets the indentation unit, or disables indentation with `None`.
    ///
    /// Fails once the first element has been opened.
    pub fn set_indent_chars(&mut self, unit: Option<&str>) -> Result<(), O::Error> {
        self.ensure_open()?;
        if self.started {
            return Err(MisuseError::IndentTooLate.into());
        }
        if let Some(unit) = unit {
            validate_indent(unit)?;
        }
        self.indent = unit.map(str::to_string);
        Ok(())
    }

    /// Writes the XML declaration. Must precede the first element.
    pub fn xml_decl(&mut self) -> Result<(), O::Error> {
        self.ensure_open()?;
        if self.started {
            return Err(MisuseError::DeclarationTooLate.into());
        }
        self.output.xml_declaration()?;
        if self.indent.is_some() {
            self.output.whitespace("\n")?;
        }
        Ok(())
    }

    /// Opens an element. `has_children` announces child elements, which
    /// puts them on their own indented lines.
    pub fn open_element(&mut self, name: &str, has_children: bool) -> Result<(), O::Error> {
        self.ensure_open()?;
        self.open(QualifiedName::local(name), has_children)
    }

    /// Opens an element in namespace `uri`.
    pub fn open_element_ns(
        &mut self,
        uri: Option<&str>,
        name: &str,
        has_children: bool,
    ) -> Result<(), O::Error> {
        self.ensure_open()?;
        let name = self.table()?.resolve_element(uri, name)?;
        self.open(name, has_children)
    }

    /// Writes an element with no content. Identical to opening the element
    /// without children and closing it.
    pub fn empty_element(&mut self, name: &str) -> Result<(), O::Error> {
        self.open_element(name, false)?;
        self.close_element()
    }

    /// Writes an element with no content in namespace `uri`.
    pub fn empty_element_ns(&mut self, uri: Option<&str>, name: &str) -> Result<(), O::Error> {
        self.open_element_ns(uri, name, false)?;
        self.close_element()
    }

    /// Writes an element holding `text`. Empty text yields an empty element.
    pub fn element(&mut self, name: &str, text: &str) -> Result<(), O::Error> {
        self.open_element(name, false)?;
        self.write_text(text)?;
        self.close_element()
    }

    /// Adds an attribute to the element whose start tag is still open.
    pub fn attribute(&mut self, name: &str, value: &str) -> Result<(), O::Error> {
        self.ensure_open()?;
        self.ensure_tag_pending(name)?;
        self.output.attribute(&QualifiedName::local(name), value)
    }

    /// Adds an attribute in namespace `uri`.
    pub fn attribute_ns(
        &mut self,
        uri: Option<&str>,
        name: &str,
        value: &str,
    ) -> Result<(), O::Error> {
        self.ensure_open()?;
        let qualified = self.table()?.resolve_attribute(uri, name)?;
        self.ensure_tag_pending(name)?;
        self.claim_pending()?;
        if let (Some(prefix), Some(uri)) = (&qualified.prefix, &qualified.namespace) {
            self.tag_bindings.push(PrefixDelta::new(prefix, uri));
        }
        self.output.attribute(&qualified, value)
    }

    /// Binds `prefix` to `uri`.
    ///
    /// The binding is live immediately and is declared on the next element
    /// opened, or on the pending start tag if a namespaced attribute comes
    /// first. It is reverted when that element closes. Binding a live
    /// mapping again does nothing, and a queued binding of the same prefix
    /// is replaced.
    pub fn set_prefix_mapping(&mut self, uri: &str, prefix: &str) -> Result<(), O::Error> {
        self.ensure_open()?;
        let Namespaces::Aware { table, pending } = &mut self.namespaces else {
            return Err(unsupported_namespaces().into());
        };
        check_reserved(uri, prefix)?;
        let queued = pending.len();
        pending.retain(|delta| delta.prefix != prefix);
        if pending.len() != queued {
            table.restore(self.stack.scopes().chain([pending.as_slice()]));
        }
        if let Some(delta) = table.bind(uri, prefix)? {
            pending.push(delta);
        }
        Ok(())
    }

    /// Writes escaped character data. Empty text writes nothing.
    pub fn write_text(&mut self, text: &str) -> Result<(), O::Error> {
        self.ensure_open()?;
        if text.is_empty() {
            return Ok(());
        }
        self.complete_start_tag()?;
        self.output.text(text)
    }

    /// Writes `markup` verbatim. The caller is responsible for its
    /// well-formedness.
    pub fn write_xml(&mut self, markup: &str) -> Result<(), O::Error> {
        self.ensure_open()?;
        if !self.output.accepts_raw_markup() {
            tracing::debug!("unparsed markup rejected by output");
            return Err(MisuseError::Unsupported("Cannot use unparsed XML with this writer.").into());
        }
        if markup.is_empty() {
            return Ok(());
        }
        self.complete_start_tag()?;
        self.output.raw(markup)
    }

    /// Writes a comment, rendered as `<!-- text -->`.
    pub fn write_comment(&mut self, text: &str) -> Result<(), O::Error> {
        self.ensure_open()?;
        if text.contains("--") {
            return Err(MisuseError::IllegalComment.into());
        }
        self.complete_start_tag()?;
        self.indent_line()?;
        self.output.comment(text)?;
        self.end_line()
    }

    /// Writes a processing instruction.
    pub fn write_pi(&mut self, target: &str, data: &str) -> Result<(), O::Error> {
        self.ensure_open()?;
        if target.is_empty() || target.eq_ignore_ascii_case("xml") || data.contains("?>") {
            return Err(MisuseError::IllegalProcessingInstruction {
                target: target.to_string(),
            }
            .into());
        }
        self.complete_start_tag()?;
        self.indent_line()?;
        self.output.processing_instruction(target, data)?;
        self.end_line()
    }

    /// Writes a CDATA section.
    pub fn write_cdata(&mut self, data: &str) -> Result<(), O::Error> {
        self.ensure_open()?;
        if data.contains("]]>") {
            return Err(MisuseError::IllegalCdata.into());
        }
        self.complete_start_tag()?;
        self.output.cdata(data)
    }

    /// Closes the innermost open element.
    pub fn close_element(&mut self) -> Result<(), O::Error> {
        self.ensure_open()?;
        let Some(frame) = self.stack.pop() else {
            return Err(MisuseError::NothingToClose.into());
        };
        if self.tag_pending {
            self.tag_pending = false;
            self.declare_namespaces(&frame.deltas)?;
            self.output.finish_start_tag(true)?;
        } else {
            if frame.has_children {
                self.write_indent(self.stack.depth())?;
            }
            self.output.end_tag(&frame.name)?;
        }
        if !frame.deltas.is_empty() {
            if let Namespaces::Aware { table, pending } = &mut self.namespaces {
                table.restore(self.stack.scopes().chain([pending.as_slice()]));
            }
            self.output.end_namespace_scope(&frame.deltas)?;
        }
        if self.stack.depth() > 0 && self.stack.current().has_children {
            self.newline()?;
        }
        Ok(())
    }

    /// Flushes the output.
    pub fn flush(&mut self) -> Result<(), O::Error> {
        self.ensure_open()?;
        self.output.flush()
    }

    /// Finishes the document and flushes the output.
    ///
    /// Fails, naming the innermost element, if any element is still open.
    /// Afterwards every operation fails with [`MisuseError::Closed`].
    pub fn close(&mut self) -> Result<(), O::Error> {
        self.ensure_open()?;
        if let Some(frame) = self.stack.innermost_open() {
            return Err(MisuseError::UnclosedElement {
                name: frame.name.to_string(),
            }
            .into());
        }
        self.output.flush()?;
        self.closed = true;
        tracing::trace!("writer closed");
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), MisuseError> {
        if self.closed {
            Err(MisuseError::Closed)
        } else {
            Ok(())
        }
    }

    fn ensure_tag_pending(&self, name: &str) -> Result<(), MisuseError> {
        if self.tag_pending {
            Ok(())
        } else {
            Err(MisuseError::AttributeTooLate {
                name: name.to_string(),
            })
        }
    }

    fn table(&self) -> Result<&PrefixTable, MisuseError> {
        match &self.namespaces {
            Namespaces::Aware { table, .. } => Ok(table),
            Namespaces::Simple => Err(unsupported_namespaces()),
        }
    }

    /// Moves queued bindings onto the pending start tag. Fails, claiming
    /// nothing, if one would rebind a prefix the tag already uses.
    fn claim_pending(&mut self) -> Result<(), MisuseError> {
        let Namespaces::Aware { pending, .. } = &mut self.namespaces else {
            return Ok(());
        };
        let frame = self.stack.current_mut();
        for delta in pending.iter() {
            let clash = self
                .tag_bindings
                .iter()
                .chain(&frame.deltas)
                .find(|used| used.prefix == delta.prefix && used.uri != delta.uri);
            if clash.is_some() {
                return Err(MisuseError::PrefixInUse {
                    prefix: delta.prefix.clone(),
                });
            }
        }
        for delta in pending.drain(..) {
            if !frame.deltas.contains(&delta) {
                frame.deltas.push(delta);
            }
        }
        Ok(())
    }

    fn open(&mut self, name: QualifiedName, has_children: bool) -> Result<(), O::Error> {
        self.complete_start_tag()?;
        if self.stack.current().has_children {
            self.write_indent(self.stack.depth())?;
        }
        let deltas = match &mut self.namespaces {
            Namespaces::Aware { pending, .. } => std::mem::take(pending),
            Namespaces::Simple => Vec::new(),
        };
        self.output.start_tag(&name)?;
        self.tag_bindings.clear();
        self.tag_bindings.push(PrefixDelta::new(
            name.prefix.as_deref().unwrap_or_default(),
            name.namespace.as_deref().unwrap_or_default(),
        ));
        self.stack.push(Frame {
            name,
            has_children,
            deltas,
        });
        self.tag_pending = true;
        self.started = true;
        Ok(())
    }

    /// Terminates a pending start tag, declaring its namespaces first.
    fn complete_start_tag(&mut self) -> Result<(), O::Error> {
        if !self.tag_pending {
            return Ok(());
        }
        self.tag_pending = false;
        let frame = self.stack.current();
        for delta in &frame.deltas {
            self.output.namespace_declaration(&delta.prefix, &delta.uri)?;
        }
        self.output.finish_start_tag(false)?;
        if self.stack.current().has_children {
            self.newline()?;
        }
        Ok(())
    }

    fn declare_namespaces(&mut self, deltas: &[PrefixDelta]) -> Result<(), O::Error> {
        for delta in deltas {
            self.output.namespace_declaration(&delta.prefix, &delta.uri)?;
        }
        Ok(())
    }

    fn write_indent(&mut self, level: usize) -> Result<(), O::Error> {
        match &self.indent {
            Some(unit) if level > 0 && !unit.is_empty() => {
                self.output.whitespace(&unit.repeat(level))
            }
            _ => Ok(()),
        }
    }

    fn newline(&mut self) -> Result<(), O::Error> {
        if self.indent.is_some() {
            self.output.whitespace("\n")?;
        }
        Ok(())
    }

    /// Indents a comment or processing instruction placed among child
    /// elements.
    fn indent_line(&mut self) -> Result<(), O::Error> {
        if self.stack.current().has_children {
            self.write_indent(self.stack.depth())?;
        }
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), O::Error> {
        if self.stack.current().has_children {
            self.newline()?;
        }
        Ok(())
    }
}

fn unsupported_namespaces() -> MisuseError {
    tracing::debug!("namespace call on a simple writer");
    MisuseError::Unsupported(NO_NAMESPACES)
}
