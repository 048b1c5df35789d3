use super::{SaxAttribute, SaxHandler};
use crate::writer::{NamespaceMode, Output, Writer};

/// Replays SAX events into a writer.
///
/// Event handlers cannot fail, so the first writer error is kept and every
/// later event is ignored. [`WriterHandler::finish`] reports it.
///
/// A namespace-aware writer receives prefix mappings through
/// [`Writer::set_prefix_mapping`] and qualified calls; a simple writer
/// receives the names as written, with mappings turned back into `xmlns`
/// attributes.
///
/// ```
/// use xmlquill::parser::ParseOptions;
/// use xmlquill::sax::{parse_sax, WriterHandler};
/// use xmlquill::writer::XmlStringWriter;
///
/// let mut handler = WriterHandler::new(XmlStringWriter::new());
/// parse_sax("<a x='1'><b>t</b></a>", &ParseOptions::default(), &mut handler).unwrap();
/// let xml = handler.finish().unwrap();
/// assert_eq!(xml.as_str(), "<a x=\"1\"><b>t</b></a>");
/// ```
#[derive(Debug)]
pub struct WriterHandler<O: Output> {
    writer: Writer<O>,
    error: Option<O::Error>,
    /// Mappings waiting for the next start tag of a simple writer.
    declarations: Vec<(String, String)>,
}

impl<O: Output> WriterHandler<O> {
    /// Creates a handler writing to `writer`.
    pub fn new(writer: Writer<O>) -> Self {
        Self {
            writer,
            error: None,
            declarations: Vec::new(),
        }
    }

    /// Returns a reference to the writer.
    pub fn writer(&self) -> &Writer<O> {
        &self.writer
    }

    /// The first error raised by the writer, if any.
    pub fn error(&self) -> Option<&O::Error> {
        self.error.as_ref()
    }

    /// Returns the writer, or the first error it raised.
    pub fn finish(self) -> Result<Writer<O>, O::Error> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.writer),
        }
    }

    fn run(&mut self, step: impl FnOnce(&mut Writer<O>) -> Result<(), O::Error>) {
        if self.error.is_none() {
            if let Err(e) = step(&mut self.writer) {
                self.error = Some(e);
            }
        }
    }

    fn aware(&self) -> bool {
        self.writer.namespace_mode() == NamespaceMode::Aware
    }
}

impl<O: Output> SaxHandler for WriterHandler<O> {
    fn end_document(&mut self) {
        self.run(Writer::close);
    }

    fn xml_declaration(&mut self, _version: &str, _encoding: Option<&str>, _standalone: Option<bool>) {
        self.run(Writer::xml_decl);
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) {
        if self.aware() {
            self.run(|xml| xml.set_prefix_mapping(uri, prefix));
        } else {
            self.declarations.push((prefix.to_string(), uri.to_string()));
        }
    }

    fn start_element(
        &mut self,
        local_name: &str,
        prefix: Option<&str>,
        namespace: Option<&str>,
        attributes: &[SaxAttribute],
    ) {
        if self.aware() {
            self.run(|xml| {
                xml.open_element_ns(namespace, local_name, false)?;
                for attribute in attributes {
                    if attribute.is_namespace_declaration() {
                        continue;
                    }
                    match attribute.namespace.as_deref() {
                        Some(uri) => {
                            xml.attribute_ns(Some(uri), &attribute.local_name, &attribute.value)?;
                        }
                        None => xml.attribute(&attribute.local_name, &attribute.value)?,
                    }
                }
                Ok(())
            });
        } else {
            let declarations = std::mem::take(&mut self.declarations);
            let name = match prefix {
                Some(prefix) => format!("{prefix}:{local_name}"),
                None => local_name.to_string(),
            };
            self.run(|xml| {
                xml.open_element(&name, false)?;
                for attribute in attributes {
                    xml.attribute(&attribute.qualified_name(), &attribute.value)?;
                }
                for (prefix, uri) in &declarations {
                    let already_written = attributes.iter().any(|a| {
                        a.is_namespace_declaration()
                            && a.qualified_name() == declaration_name(prefix)
                    });
                    if !already_written {
                        xml.attribute(&declaration_name(prefix), uri)?;
                    }
                }
                Ok(())
            });
        }
    }

    fn end_element(&mut self, _local_name: &str, _prefix: Option<&str>, _namespace: Option<&str>) {
        self.run(Writer::close_element);
    }

    fn characters(&mut self, content: &str) {
        self.run(|xml| xml.write_text(content));
    }

    fn ignorable_whitespace(&mut self, content: &str) {
        self.run(|xml| xml.write_text(content));
    }

    fn cdata(&mut self, content: &str) {
        self.run(|xml| xml.write_cdata(content));
    }

    fn comment(&mut self, content: &str) {
        self.run(|xml| xml.write_comment(content));
    }

    fn processing_instruction(&mut self, target: &str, data: Option<&str>) {
        self.run(|xml| xml.write_pi(target, data.unwrap_or_default()));
    }
}

fn declaration_name(prefix: &str) -> String {
    if prefix.is_empty() {
        "xmlns".to_string()
    } else {
        format!("xmlns:{prefix}")
    }
}
