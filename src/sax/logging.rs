use super::{SaxAttribute, SaxHandler};

/// Reports every event at `debug` level, then forwards it.
#[derive(Debug, Clone, Default)]
pub struct LoggingHandler<H> {
    inner: H,
}

impl<H: SaxHandler> LoggingHandler<H> {
    /// Wraps `inner`.
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    /// Unwraps the inner handler.
    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: SaxHandler> SaxHandler for LoggingHandler<H> {
    fn start_document(&mut self) {
        tracing::debug!("start document");
        self.inner.start_document();
    }

    fn end_document(&mut self) {
        tracing::debug!("end document");
        self.inner.end_document();
    }

    fn xml_declaration(&mut self, version: &str, encoding: Option<&str>, standalone: Option<bool>) {
        tracing::debug!(version, ?encoding, ?standalone, "xml declaration");
        self.inner.xml_declaration(version, encoding, standalone);
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) {
        tracing::debug!(prefix, uri, "start prefix mapping");
        self.inner.start_prefix_mapping(prefix, uri);
    }

    fn end_prefix_mapping(&mut self, prefix: &str) {
        tracing::debug!(prefix, "end prefix mapping");
        self.inner.end_prefix_mapping(prefix);
    }

    fn start_element(
        &mut self,
        local_name: &str,
        prefix: Option<&str>,
        namespace: Option<&str>,
        attributes: &[SaxAttribute],
    ) {
        tracing::debug!(
            local_name,
            ?prefix,
            ?namespace,
            attributes = attributes.len(),
            "start element"
        );
        self.inner
            .start_element(local_name, prefix, namespace, attributes);
    }

    fn end_element(&mut self, local_name: &str, prefix: Option<&str>, namespace: Option<&str>) {
        tracing::debug!(local_name, ?prefix, ?namespace, "end element");
        self.inner.end_element(local_name, prefix, namespace);
    }

    fn characters(&mut self, content: &str) {
        tracing::debug!(len = content.len(), "characters");
        self.inner.characters(content);
    }

    fn ignorable_whitespace(&mut self, content: &str) {
        tracing::debug!(len = content.len(), "ignorable whitespace");
        self.inner.ignorable_whitespace(content);
    }

    fn cdata(&mut self, content: &str) {
        tracing::debug!(len = content.len(), "cdata");
        self.inner.cdata(content);
    }

    fn comment(&mut self, content: &str) {
        tracing::debug!(len = content.len(), "comment");
        self.inner.comment(content);
    }

    fn processing_instruction(&mut self, target: &str, data: Option<&str>) {
        tracing::debug!(target, ?data, "processing instruction");
        self.inner.processing_instruction(target, data);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::ParseOptions;
    use crate::sax::parse_sax;
    use crate::sax::tests::RecordingHandler;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_events_are_forwarded() {
        let mut plain = RecordingHandler::default();
        parse_sax("<a><b x='1'>t</b><!--c--></a>", &ParseOptions::default(), &mut plain).unwrap();

        let mut logged = LoggingHandler::new(RecordingHandler::default());
        parse_sax("<a><b x='1'>t</b><!--c--></a>", &ParseOptions::default(), &mut logged).unwrap();

        assert_eq!(logged.into_inner().events, plain.events);
    }
}
