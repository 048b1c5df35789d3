//! The event-driven reader behind [`crate::sax::parse_sax`].

use super::scanner::Scanner;
use super::ParseOptions;
use crate::error::ParseError;
use crate::namespace::XML_NAMESPACE;
use crate::sax::{SaxAttribute, SaxHandler};
use crate::util::qname::split_qname;

/// Reads `text` as a document, firing events on `handler`.
pub(crate) fn read(
    text: &str,
    options: &ParseOptions,
    handler: &mut dyn SaxHandler,
) -> Result<(), ParseError> {
    let mut reader = Reader {
        scan: Scanner::new(text),
        options,
        handler,
        bindings: Bindings::new(),
        depth: 0,
    };
    reader.document()
}

/// `xmlns` bindings of the open elements, innermost last.
#[derive(Debug)]
struct Bindings {
    /// `(prefix, uri)`; the empty prefix is the default namespace.
    entries: Vec<(String, String)>,
    /// Length of `entries` when each open element started.
    marks: Vec<usize>,
}

impl Bindings {
    fn new() -> Self {
        Self {
            entries: vec![("xml".to_string(), XML_NAMESPACE.to_string())],
            marks: Vec::new(),
        }
    }

    fn enter(&mut self) {
        self.marks.push(self.entries.len());
    }

    fn leave(&mut self) {
        if let Some(mark) = self.marks.pop() {
            self.entries.truncate(mark);
        }
    }

    fn bind(&mut self, prefix: &str, uri: &str) {
        self.entries.push((prefix.to_string(), uri.to_string()));
    }

    /// The URI bound to `prefix`. `xmlns=""` leaves the default namespace
    /// unbound.
    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

/// A start tag as written.
struct StartTag<'a> {
    name: &'a str,
    attributes: Vec<(&'a str, String)>,
    empty: bool,
}

/// A start tag as reported to the handler.
struct Resolved<'a> {
    local_name: &'a str,
    prefix: Option<&'a str>,
    namespace: Option<String>,
    attributes: Vec<SaxAttribute>,
    /// `(prefix, uri)` pairs declared by the tag, in document order.
    declared: Vec<(String, String)>,
}

impl<'a> Resolved<'a> {
    /// Names as written, `xmlns` attributes included.
    fn raw(tag: &StartTag<'a>) -> Self {
        Self {
            local_name: tag.name,
            prefix: None,
            namespace: None,
            attributes: tag
                .attributes
                .iter()
                .map(|(name, value)| SaxAttribute::new(name, value))
                .collect(),
            declared: Vec::new(),
        }
    }
}

struct Reader<'a, 'o, 'h> {
    scan: Scanner<'a>,
    options: &'o ParseOptions,
    handler: &'h mut dyn SaxHandler,
    bindings: Bindings,
    depth: u32,
}

impl<'a> Reader<'a, '_, '_> {
    fn document(&mut self) -> Result<(), ParseError> {
        self.handler.start_document();
        if ["<?xml ", "<?xml\t", "<?xml\r", "<?xml\n"]
            .iter()
            .any(|start| self.scan.at(start))
        {
            self.declaration()?;
        }
        self.misc()?;
        if self.scan.at("<!DOCTYPE") {
            return Err(self.scan.error("DOCTYPE declarations are not supported"));
        }
        if !self.scan.at("<") || self.scan.at("<!") || self.scan.at("<?") {
            return Err(self.scan.error("no root element"));
        }
        self.element()?;
        self.misc()?;
        if !self.scan.is_done() {
            return Err(self.scan.error("content after document element"));
        }
        self.handler.end_document();
        Ok(())
    }

    /// Comments, processing instructions and whitespace outside the root.
    fn misc(&mut self) -> Result<(), ParseError> {
        loop {
            self.scan.skip_space();
            if self.scan.at("<!--") {
                self.comment()?;
            } else if self.scan.at("<?") {
                self.processing_instruction()?;
            } else {
                return Ok(());
            }
        }
    }

    /// `<?xml version="1.0" encoding="..." standalone="..."?>`
    fn declaration(&mut self) -> Result<(), ParseError> {
        const FIELDS: [&str; 3] = ["version", "encoding", "standalone"];
        self.scan.expect("<?xml")?;
        let mut values: [Option<&'a str>; 3] = [None; 3];
        let mut next = 0;
        loop {
            let spaced = self.scan.skip_space();
            if self.scan.eat("?>") {
                break;
            }
            if !spaced {
                return Err(self.scan.error("whitespace required in XML declaration"));
            }
            let name = self.scan.name(self.options.max_name_length)?;
            // Each field at most once, in order.
            let Some(index) = FIELDS[next..].iter().position(|&f| f == name) else {
                return Err(self.scan.error(format!("unexpected '{name}' in XML declaration")));
            };
            next += index + 1;
            self.scan.skip_space();
            self.scan.expect("=")?;
            self.scan.skip_space();
            values[next - 1] = Some(self.scan.literal()?);
        }

        let [version, encoding, standalone] = values;
        let Some(version) = version else {
            return Err(self.scan.error("XML declaration without version"));
        };
        if !is_version(version) {
            return Err(self.scan.error(format!("invalid version number: '{version}'")));
        }
        if let Some(encoding) = encoding.filter(|e| !is_encoding_name(e)) {
            return Err(self.scan.error(format!("invalid encoding name: '{encoding}'")));
        }
        let standalone = match standalone {
            None => None,
            Some("yes") => Some(true),
            Some("no") => Some(false),
            Some(other) => {
                return Err(self.scan.error(format!("invalid standalone value: '{other}'")))
            }
        };
        self.handler.xml_declaration(version, encoding, standalone);
        Ok(())
    }

    fn element(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(self.scan.error(format!(
                "maximum nesting depth exceeded ({})",
                self.options.max_depth
            )));
        }
        let tag = self.start_tag()?;
        let resolved = if self.options.namespaces {
            self.resolve(&tag)?
        } else {
            Resolved::raw(&tag)
        };

        for (prefix, uri) in &resolved.declared {
            self.handler.start_prefix_mapping(prefix, uri);
        }
        let namespace = resolved.namespace.as_deref();
        self.handler.start_element(
            resolved.local_name,
            resolved.prefix,
            namespace,
            &resolved.attributes,
        );
        if !tag.empty {
            self.content()?;
            self.end_tag(tag.name)?;
        }
        self.handler
            .end_element(resolved.local_name, resolved.prefix, namespace);

        if self.options.namespaces {
            for (prefix, _) in resolved.declared.iter().rev() {
                self.handler.end_prefix_mapping(prefix);
            }
            self.bindings.leave();
        }
        self.depth -= 1;
        Ok(())
    }

    fn start_tag(&mut self) -> Result<StartTag<'a>, ParseError> {
        self.scan.expect("<")?;
        let name = self.scan.name(self.options.max_name_length)?;
        let mut attributes: Vec<(&'a str, String)> = Vec::new();
        loop {
            let spaced = self.scan.skip_space();
            if self.scan.eat("/>") {
                return Ok(StartTag {
                    name,
                    attributes,
                    empty: true,
                });
            }
            if self.scan.eat(">") {
                return Ok(StartTag {
                    name,
                    attributes,
                    empty: false,
                });
            }
            if !spaced {
                return Err(self.scan.error("whitespace required between attributes"));
            }
            let attribute = self.scan.name(self.options.max_name_length)?;
            if attributes.iter().any(|(seen, _)| *seen == attribute) {
                return Err(self.scan.error(format!("duplicate attribute '{attribute}'")));
            }
            self.scan.skip_space();
            self.scan.expect("=")?;
            self.scan.skip_space();
            let value = self.scan.attribute_value(self.options.max_name_length)?;
            attributes.push((attribute, value));
        }
    }

    fn end_tag(&mut self, name: &str) -> Result<(), ParseError> {
        self.scan.expect("</")?;
        let found = self.scan.name(self.options.max_name_length)?;
        if found != name {
            return Err(self.scan.error(format!(
                "mismatched end tag: expected </{name}>, found </{found}>"
            )));
        }
        self.scan.skip_space();
        self.scan.expect(">")
    }

    /// Opens a namespace scope for `tag` and resolves its names. `xmlns`
    /// attributes become declarations.
    fn resolve(&mut self, tag: &StartTag<'a>) -> Result<Resolved<'a>, ParseError> {
        self.bindings.enter();
        let mut declared = Vec::new();
        for (name, value) in &tag.attributes {
            let prefix = match *name {
                "xmlns" => "",
                other => match other.strip_prefix("xmlns:") {
                    Some(prefix) => prefix,
                    None => continue,
                },
            };
            if !prefix.is_empty() && value.is_empty() {
                return Err(self.scan.error(format!(
                    "prefix '{prefix}' cannot be bound to the empty URI"
                )));
            }
            self.bindings.bind(prefix, value);
            declared.push((prefix.to_string(), value.clone()));
        }

        let (prefix, local_name) = split_qname(tag.name);
        let namespace = match prefix {
            Some(prefix) => Some(self.uri_for(prefix)?),
            None => self.bindings.lookup("").map(str::to_string),
        };

        let mut attributes = Vec::with_capacity(tag.attributes.len());
        for (name, value) in &tag.attributes {
            if *name == "xmlns" || name.starts_with("xmlns:") {
                continue;
            }
            let (prefix, local) = split_qname(name);
            // Unprefixed attributes are in no namespace.
            let namespace = prefix.map(|p| self.uri_for(p)).transpose()?;
            attributes.push(SaxAttribute {
                local_name: local.to_string(),
                value: value.clone(),
                prefix: prefix.map(str::to_string),
                namespace,
            });
        }

        Ok(Resolved {
            local_name,
            prefix,
            namespace,
            attributes,
            declared,
        })
    }

    fn uri_for(&self, prefix: &str) -> Result<String, ParseError> {
        self.bindings
            .lookup(prefix)
            .map(str::to_string)
            .ok_or_else(|| {
                self.scan
                    .error(format!("namespace prefix '{prefix}' is not declared"))
            })
    }

    /// Element content up to the end tag (XML 1.0 §3.1 `[43]`).
    fn content(&mut self) -> Result<(), ParseError> {
        let mut text = String::new();
        loop {
            if self.scan.is_done() {
                return Err(self.scan.error("unexpected end of input in element content"));
            }
            if self.scan.at("<") {
                if !text.is_empty() {
                    self.handler.characters(&text);
                    text.clear();
                }
                if self.scan.at("</") {
                    return Ok(());
                } else if self.scan.at("<!--") {
                    self.comment()?;
                } else if self.scan.at("<![CDATA[") {
                    self.scan.expect("<![CDATA[")?;
                    let data = self.scan.until("]]>", "CDATA section")?;
                    self.handler.cdata(&data);
                } else if self.scan.at("<?") {
                    self.processing_instruction()?;
                } else {
                    self.element()?;
                }
            } else if self.scan.at("&") {
                text.push(self.scan.reference(self.options.max_name_length)?);
            } else if self.scan.at("]]>") {
                return Err(self.scan.error("']]>' not allowed in character data"));
            } else {
                text.push(self.scan.content_char()?);
            }
        }
    }

    fn comment(&mut self) -> Result<(), ParseError> {
        self.scan.expect("<!--")?;
        let mut content = String::new();
        while !self.scan.eat("-->") {
            if self.scan.at("--") {
                return Err(self.scan.error("'--' not allowed inside comments"));
            }
            if self.scan.is_done() {
                return Err(self.scan.error("unterminated comment"));
            }
            content.push(self.scan.content_char()?);
        }
        self.handler.comment(&content);
        Ok(())
    }

    fn processing_instruction(&mut self) -> Result<(), ParseError> {
        self.scan.expect("<?")?;
        let target = self.scan.name(self.options.max_name_length)?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(self.scan.error("PI target 'xml' is reserved"));
        }
        let data = if self.scan.skip_space() {
            Some(self.scan.until("?>", "processing instruction")?).filter(|d| !d.is_empty())
        } else {
            self.scan.expect("?>")?;
            None
        };
        self.handler.processing_instruction(target, data.as_deref());
        Ok(())
    }
}

/// `'1.' [0-9]+`
fn is_version(version: &str) -> bool {
    matches!(version.split_once('.'),
        Some(("1", minor)) if !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

/// `[A-Za-z] ([A-Za-z0-9._] | '-')*`
fn is_encoding_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_alphabetic())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sax::tests::RecordingHandler;
    use crate::sax::DefaultHandler;
    use pretty_assertions::assert_eq;

    fn record(xml: &str, options: &ParseOptions) -> Vec<String> {
        let mut handler = RecordingHandler::default();
        read(xml, options, &mut handler).unwrap();
        handler.events
    }

    fn fails(xml: &str) -> ParseError {
        read(xml, &ParseOptions::default(), &mut DefaultHandler).unwrap_err()
    }

    #[test]
    fn test_document_events() {
        let events = record(
            "<?xml version=\"1.0\"?><!--c--><r a=\"1\">x &amp; y<![CDATA[<z>]]><?pi d?></r>",
            &ParseOptions::default(),
        );
        assert_eq!(
            events,
            vec![
                "start_document",
                "xml_declaration(1.0, None)",
                "comment(c)",
                "start_element(r, None, None, [a=1])",
                "characters(\"x & y\")",
                "cdata(<z>)",
                "processing_instruction(pi, Some(\"d\"))",
                "end_element(r)",
                "end_document",
            ]
        );
    }

    #[test]
    fn test_declaration_fields() {
        let events = record(
            "<?xml version='1.1' encoding=\"ISO-8859-1\" standalone='no' ?><r/>",
            &ParseOptions::default(),
        );
        assert_eq!(events[1], "xml_declaration(1.1, Some(\"ISO-8859-1\"))");

        for decl in [
            "<?xml version=\"2.0\"?><r/>",
            "<?xml encoding=\"utf-8\"?><r/>",
            "<?xml version=\"1.0\" standalone=\"maybe\"?><r/>",
            "<?xml version=\"1.0\" standalone=\"yes\" encoding=\"utf-8\"?><r/>",
            "<?xml version=\"1.0\"encoding=\"utf-8\"?><r/>",
        ] {
            assert!(read(decl, &ParseOptions::default(), &mut DefaultHandler).is_err(), "{decl}");
        }
    }

    #[test]
    fn test_namespace_events() {
        let events = record(
            "<p:r xmlns:p=\"urn:p\" xmlns=\"urn:d\"><e p:a=\"v\" b=\"w\"/></p:r>",
            &ParseOptions::default(),
        );
        assert_eq!(
            events,
            vec![
                "start_document",
                "start_prefix_mapping(p, urn:p)",
                "start_prefix_mapping(, urn:d)",
                "start_element(r, Some(\"p\"), Some(\"urn:p\"), [])",
                "start_element(e, None, Some(\"urn:d\"), [p:a=v, b=w])",
                "end_element(e)",
                "end_element(r)",
                "end_prefix_mapping()",
                "end_prefix_mapping(p)",
                "end_document",
            ]
        );
    }

    #[test]
    fn test_default_namespace_can_be_undeclared() {
        let events = record("<r xmlns=\"urn:d\"><e xmlns=\"\"/></r>", &ParseOptions::default());
        assert_eq!(events[3], "start_prefix_mapping(, )");
        assert_eq!(events[4], "start_element(e, None, None, [])");
    }

    #[test]
    fn test_without_namespaces_names_are_raw() {
        let events = record(
            "<p:r xmlns:p=\"urn:p\"/>",
            &ParseOptions::default().namespaces(false),
        );
        assert_eq!(events[1], "start_element(p:r, None, None, [xmlns:p=urn:p])");
    }

    #[test]
    fn test_undeclared_prefix_is_an_error() {
        assert!(fails("<p:r/>").message.contains("not declared"));
        assert!(fails("<r p:a=\"1\"/>").message.contains("not declared"));
        assert!(fails("<r xmlns:p=\"\"/>").message.contains("empty URI"));
    }

    #[test]
    fn test_malformed_input_reports_location() {
        let err = fails("<r>\n  <a></b>\n</r>");
        assert!(err.message.contains("mismatched end tag"));
        assert_eq!(err.location.line, 2);
    }

    #[test]
    fn test_rejected_constructs() {
        for xml in [
            "<!DOCTYPE r><r/>",
            "<r>&nbsp;</r>",
            "<r>]]></r>",
            "<r/><s/>",
            "",
            "<r a=\"1\" a=\"2\"/>",
            "<r a=\"1\"b=\"2\"/>",
            "<r><!-- a -- b --></r>",
            "<r><?xml version=\"1.0\"?></r>",
            "<r><![CDATA[open</r>",
            "<r>",
        ] {
            assert!(
                read(xml, &ParseOptions::default(), &mut DefaultHandler).is_err(),
                "accepted {xml:?}"
            );
        }
    }

    #[test]
    fn test_depth_limit() {
        let xml = "<a>".repeat(5) + &"</a>".repeat(5);
        let shallow = ParseOptions::default().max_depth(4);
        assert!(read(&xml, &shallow, &mut DefaultHandler).is_err());
        assert!(read(&xml, &ParseOptions::default(), &mut DefaultHandler).is_ok());
    }

    #[test]
    fn test_bindings_scopes() {
        let mut bindings = Bindings::new();
        assert_eq!(bindings.lookup("xml"), Some(XML_NAMESPACE));
        bindings.enter();
        bindings.bind("", "urn:a");
        bindings.enter();
        bindings.bind("", "");
        assert_eq!(bindings.lookup(""), None);
        bindings.leave();
        assert_eq!(bindings.lookup(""), Some("urn:a"));
        bindings.leave();
        assert_eq!(bindings.lookup(""), None);
    }
}
