use super::{SaxAttribute, SaxHandler};
use crate::error::MisuseError;
use crate::namespace::{PrefixDelta, XMLNS_NAMESPACE};
use crate::util::qname::QualifiedName;
use crate::writer::{Output, Writer, WriterOptions};

/// A writer firing SAX events instead of producing text.
pub type SaxWriter<H> = Writer<SaxOutput<H>>;

/// A start tag whose attributes are still being collected.
#[derive(Debug)]
struct PendingStart {
    name: QualifiedName,
    attributes: Vec<SaxAttribute>,
    mappings: Vec<(String, String)>,
}

/// Output translating writer steps into [`SaxHandler`] events.
///
/// `start_element` fires once the start tag is complete, so handlers see
/// every attribute. Indentation arrives as `ignorable_whitespace`. In
/// namespace-aware mode each declaration also produces
/// `start_prefix_mapping` before the element and `end_prefix_mapping`
/// after it.
#[derive(Debug)]
pub struct SaxOutput<H> {
    handler: H,
    pending: Option<PendingStart>,
}

impl<H: SaxHandler> SaxOutput<H> {
    /// Creates an output firing events on `handler`.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            pending: None,
        }
    }

    /// Returns a reference to the handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Unwraps the handler.
    pub fn into_handler(self) -> H {
        self.handler
    }

    fn pending_mut(&mut self) -> Result<&mut PendingStart, MisuseError> {
        self.pending
            .as_mut()
            .ok_or(MisuseError::Unsupported("no start tag is pending"))
    }
}

fn element_event<H: SaxHandler>(handler: &mut H, name: &QualifiedName) {
    handler.end_element(
        &name.local_name,
        name.prefix.as_deref(),
        name.namespace.as_deref(),
    );
}

impl<H: SaxHandler> Output for SaxOutput<H> {
    type Error = MisuseError;

    fn xml_declaration(&mut self) -> Result<(), MisuseError> {
        self.handler.xml_declaration("1.0", None, None);
        Ok(())
    }

    fn start_tag(&mut self, name: &QualifiedName) -> Result<(), MisuseError> {
        self.pending = Some(PendingStart {
            name: name.clone(),
            attributes: Vec::new(),
            mappings: Vec::new(),
        });
        Ok(())
    }

    fn attribute(&mut self, name: &QualifiedName, value: &str) -> Result<(), MisuseError> {
        self.pending_mut()?.attributes.push(SaxAttribute {
            local_name: name.local_name.clone(),
            value: value.to_string(),
            prefix: name.prefix.clone(),
            namespace: name.namespace.clone(),
        });
        Ok(())
    }

    fn namespace_declaration(&mut self, prefix: &str, uri: &str) -> Result<(), MisuseError> {
        let pending = self.pending_mut()?;
        pending.mappings.push((prefix.to_string(), uri.to_string()));
        let (local_name, prefix) = if prefix.is_empty() {
            ("xmlns".to_string(), None)
        } else {
            (prefix.to_string(), Some("xmlns".to_string()))
        };
        pending.attributes.push(SaxAttribute {
            local_name,
            value: uri.to_string(),
            prefix,
            namespace: Some(XMLNS_NAMESPACE.to_string()),
        });
        Ok(())
    }

    fn finish_start_tag(&mut self, empty: bool) -> Result<(), MisuseError> {
        let Some(start) = self.pending.take() else {
            return Err(MisuseError::Unsupported("no start tag is pending"));
        };
        for (prefix, uri) in &start.mappings {
            self.handler.start_prefix_mapping(prefix, uri);
        }
        self.handler.start_element(
            &start.name.local_name,
            start.name.prefix.as_deref(),
            start.name.namespace.as_deref(),
            &start.attributes,
        );
        if empty {
            element_event(&mut self.handler, &start.name);
        }
        Ok(())
    }

    fn end_tag(&mut self, name: &QualifiedName) -> Result<(), MisuseError> {
        element_event(&mut self.handler, name);
        Ok(())
    }

    fn end_namespace_scope(&mut self, deltas: &[PrefixDelta]) -> Result<(), MisuseError> {
        for delta in deltas.iter().rev() {
            self.handler.end_prefix_mapping(&delta.prefix);
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), MisuseError> {
        self.handler.characters(text);
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<(), MisuseError> {
        self.handler.comment(text);
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), MisuseError> {
        self.handler
            .processing_instruction(target, (!data.is_empty()).then_some(data));
        Ok(())
    }

    fn cdata(&mut self, data: &str) -> Result<(), MisuseError> {
        self.handler.cdata(data);
        Ok(())
    }

    fn whitespace(&mut self, whitespace: &str) -> Result<(), MisuseError> {
        self.handler.ignorable_whitespace(whitespace);
        Ok(())
    }
}

impl<H: SaxHandler> Writer<SaxOutput<H>> {
    /// Creates a writer firing events on `handler`.
    pub fn new(handler: H) -> Self {
        Self::with_options(handler, &WriterOptions::default())
    }

    /// Creates a writer configured by `options`.
    pub fn with_options(handler: H, options: &WriterOptions) -> Self {
        Self::from_output(SaxOutput::new(handler), options)
    }

    /// Returns a reference to the handler.
    pub fn handler(&self) -> &H {
        self.output().handler()
    }

    /// Consumes the writer, returning the handler.
    pub fn into_handler(self) -> H {
        self.into_output().into_handler()
    }
}
