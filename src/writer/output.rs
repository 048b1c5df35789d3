//! Output back ends for the writer state machine.
//!
//! The [`Writer`](super::Writer) decides *what* happens: tag boundaries,
//! indentation, namespace declarations, misuse checks. An [`Output`]
//! decides how each step is materialized: as text ([`TextOutput`]), as tree
//! nodes or as SAX events. Every call an output receives is already
//! validated.

use crate::error::MisuseError;
use crate::escape::EscapePolicy;
use crate::sink::Sink;
use crate::util::qname::QualifiedName;
use crate::namespace::PrefixDelta;

/// Receives validated writer steps.
pub trait Output {
    /// Error type of the writer driving this output.
    type Error: From<MisuseError>;

    /// Whether [`Output::raw`] is supported.
    fn accepts_raw_markup(&self) -> bool {
        false
    }

    /// Emits the XML declaration.
    fn xml_declaration(&mut self) -> Result<(), Self::Error>;

    /// Begins a start tag.
    fn start_tag(&mut self, name: &QualifiedName) -> Result<(), Self::Error>;

    /// Adds an attribute to the pending start tag.
    fn attribute(&mut self, name: &QualifiedName, value: &str) -> Result<(), Self::Error>;

    /// Adds a namespace declaration to the pending start tag.
    fn namespace_declaration(&mut self, prefix: &str, uri: &str) -> Result<(), Self::Error>;

    /// Terminates the pending start tag. When `empty` is set the element is
    /// complete and no end tag follows.
    fn finish_start_tag(&mut self, empty: bool) -> Result<(), Self::Error>;

    /// Emits an end tag.
    fn end_tag(&mut self, name: &QualifiedName) -> Result<(), Self::Error>;

    /// Called after an element that introduced prefix bindings is complete.
    fn end_namespace_scope(&mut self, _deltas: &[PrefixDelta]) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Emits character data.
    fn text(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Emits unparsed markup verbatim.
    fn raw(&mut self, _markup: &str) -> Result<(), Self::Error> {
        Err(MisuseError::Unsupported("Cannot use unparsed XML with this writer.").into())
    }

    /// Emits a comment. The text never contains `--`.
    fn comment(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Emits a processing instruction.
    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), Self::Error>;

    /// Emits a CDATA section. The data never contains `]]>`.
    fn cdata(&mut self, data: &str) -> Result<(), Self::Error>;

    /// Emits indentation or line breaks.
    fn whitespace(&mut self, whitespace: &str) -> Result<(), Self::Error>;

    /// Flushes buffered output.
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Serializes writer steps as XML text into a [`Sink`].
#[derive(Debug, Clone)]
pub struct TextOutput<S> {
    sink: S,
    policy: EscapePolicy,
    encoding: String,
}

impl<S: Sink> TextOutput<S> {
    /// Creates an output escaping with `policy` and declaring `encoding`.
    pub fn new(sink: S, policy: EscapePolicy, encoding: &str) -> Self {
        Self {
            sink,
            policy,
            encoding: encoding.to_string(),
        }
    }

    /// The escaping policy in use.
    pub fn policy(&self) -> EscapePolicy {
        self.policy
    }

    /// Returns a reference to the sink.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Unwraps the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn write_name(&mut self, name: &QualifiedName) -> Result<(), S::Error> {
        if let Some(prefix) = &name.prefix {
            self.sink.write_str(prefix)?;
            self.sink.write_char(':')?;
        }
        self.sink.write_str(&name.local_name)
    }
}

impl<S: Sink> Output for TextOutput<S> {
    type Error = S::Error;

    fn accepts_raw_markup(&self) -> bool {
        true
    }

    fn xml_declaration(&mut self) -> Result<(), S::Error> {
        self.sink.write_str("<?xml version=\"1.0\" encoding=\"")?;
        self.sink.write_str(&self.encoding)?;
        self.sink.write_str("\"?>")
    }

    fn start_tag(&mut self, name: &QualifiedName) -> Result<(), S::Error> {
        self.sink.write_char('<')?;
        self.write_name(name)
    }

    fn attribute(&mut self, name: &QualifiedName, value: &str) -> Result<(), S::Error> {
        self.sink.write_char(' ')?;
        self.write_name(name)?;
        self.sink.write_str("=\"")?;
        self.policy.write_attribute_value(&mut self.sink, value)?;
        self.sink.write_char('"')
    }

    fn namespace_declaration(&mut self, prefix: &str, uri: &str) -> Result<(), S::Error> {
        if prefix.is_empty() {
            self.sink.write_str(" xmlns=\"")?;
        } else {
            self.sink.write_str(" xmlns:")?;
            self.sink.write_str(prefix)?;
            self.sink.write_str("=\"")?;
        }
        self.policy.write_attribute_value(&mut self.sink, uri)?;
        self.sink.write_char('"')
    }

    fn finish_start_tag(&mut self, empty: bool) -> Result<(), S::Error> {
        self.sink.write_str(if empty { "/>" } else { ">" })
    }

    fn end_tag(&mut self, name: &QualifiedName) -> Result<(), S::Error> {
        self.sink.write_str("</")?;
        self.write_name(name)?;
        self.sink.write_char('>')
    }

    fn text(&mut self, text: &str) -> Result<(), S::Error> {
        self.policy.write_element_text(&mut self.sink, text)
    }

    fn raw(&mut self, markup: &str) -> Result<(), S::Error> {
        self.sink.write_str(markup)
    }

    fn comment(&mut self, text: &str) -> Result<(), S::Error> {
        self.sink.write_str("<!-- ")?;
        self.sink.write_str(text)?;
        self.sink.write_str(" -->")
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), S::Error> {
        self.sink.write_str("<?")?;
        self.sink.write_str(target)?;
        if !data.is_empty() {
            self.sink.write_char(' ')?;
            self.sink.write_str(data)?;
        }
        self.sink.write_str("?>")
    }

    fn cdata(&mut self, data: &str) -> Result<(), S::Error> {
        self.sink.write_str("<![CDATA[")?;
        self.sink.write_str(data)?;
        self.sink.write_str("]]>")
    }

    fn whitespace(&mut self, whitespace: &str) -> Result<(), S::Error> {
        self.sink.write_str(whitespace)
    }

    fn flush(&mut self) -> Result<(), S::Error> {
        self.sink.flush()
    }
}
