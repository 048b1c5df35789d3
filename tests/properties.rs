//! Property tests for the writer invariants.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use xmlquill::escape::{escape_attribute, escape_text};
use xmlquill::parser::ParseOptions;
use xmlquill::sax::{parse_sax, SaxAttribute, SaxHandler};
use xmlquill::{MisuseError, WriterOptions, XmlStringWriter};

const PREFIXES: [&str; 3] = ["", "a", "b"];
const URIS: [&str; 3] = ["urn:one", "urn:two", "urn:three"];

#[derive(Debug, Clone)]
enum Op {
    /// Make each binding, then open a child in the URI bound last.
    Open { bindings: Vec<(usize, usize)> },
    Close,
    /// Write an empty element in the URI of the innermost element.
    Leaf,
    /// Bind a non-empty prefix, then write an attribute in its URI on
    /// whatever start tag is open.
    Claim { prefix: usize, uri: usize },
}

fn binding_strategy() -> impl Strategy<Value = (usize, usize)> {
    (0..PREFIXES.len(), 0..URIS.len())
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::collection::vec(binding_strategy(), 1..4).prop_map(|bindings| Op::Open { bindings }),
        Just(Op::Close),
        Just(Op::Leaf),
        (1..PREFIXES.len(), 0..URIS.len()).prop_map(|(prefix, uri)| Op::Claim { prefix, uri }),
    ]
}

fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_-]{0,8}").unwrap()
}

/// Collects element namespaces, text and attribute values.
#[derive(Default)]
struct Collector {
    namespaces: Vec<Option<String>>,
    text: String,
    attributes: Vec<String>,
    attribute_namespaces: Vec<Option<String>>,
}

impl SaxHandler for Collector {
    fn start_element(
        &mut self,
        _local_name: &str,
        _prefix: Option<&str>,
        namespace: Option<&str>,
        attributes: &[SaxAttribute],
    ) {
        self.namespaces.push(namespace.map(str::to_string));
        self.attributes.extend(attributes.iter().map(|a| a.value.clone()));
        self.attribute_namespaces
            .extend(attributes.iter().map(|a| a.namespace.clone()));
    }

    fn characters(&mut self, content: &str) {
        self.text.push_str(content);
    }
}

fn collect(xml: &str) -> Collector {
    let mut collector = Collector::default();
    if let Err(e) = parse_sax(xml, &ParseOptions::default(), &mut collector) {
        panic!("not well-formed ({e}): {xml}");
    }
    collector
}

proptest! {
    /// Every element and attribute resolves to the URI it was written in,
    /// however prefixes were queued, rebound and restored on the way.
    #[test]
    fn prop_namespace_scopes_restore(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut xml = XmlStringWriter::with_options(&WriterOptions::default().namespace_aware(true));
        let mut open: Vec<usize> = Vec::new();
        let mut expected: Vec<Option<String>> = vec![None];
        let mut expected_attributes: Vec<Option<String>> = Vec::new();
        xml.open_element_ns(None, "root", true).unwrap();

        for op in ops {
            match op {
                Op::Open { bindings } => {
                    for &(prefix, uri) in &bindings {
                        xml.set_prefix_mapping(URIS[uri], PREFIXES[prefix]).unwrap();
                    }
                    let uri = bindings[bindings.len() - 1].1;
                    xml.open_element_ns(Some(URIS[uri]), "e", true).unwrap();
                    open.push(uri);
                    expected.push(Some(URIS[uri].to_string()));
                }
                Op::Close => {
                    if open.pop().is_some() {
                        xml.close_element().unwrap();
                    }
                }
                Op::Leaf => {
                    if let Some(&uri) = open.last() {
                        match xml.empty_element_ns(Some(URIS[uri]), "leaf") {
                            Ok(()) => expected.push(Some(URIS[uri].to_string())),
                            Err(e) => prop_assert!(
                                matches!(e, MisuseError::UndeclaredNamespace { .. }),
                                "unexpected error: {:?}",
                                e
                            ),
                        }
                    }
                }
                Op::Claim { prefix, uri } => {
                    xml.set_prefix_mapping(URIS[uri], PREFIXES[prefix]).unwrap();
                    let name = format!("att{}", expected_attributes.len());
                    match xml.attribute_ns(Some(URIS[uri]), &name, "v") {
                        Ok(()) => expected_attributes.push(Some(URIS[uri].to_string())),
                        Err(e) => prop_assert!(matches!(
                            e,
                            MisuseError::PrefixInUse { .. } | MisuseError::AttributeTooLate { .. }
                        ), "unexpected error"),
                    }
                }
            }
        }
        for _ in 0..=open.len() {
            xml.close_element().unwrap();
        }
        xml.close().unwrap();

        let collector = collect(xml.as_str());
        prop_assert_eq!(collector.namespaces, expected);
        prop_assert_eq!(collector.attribute_namespaces, expected_attributes);
    }

    #[test]
    fn prop_empty_element_matches_open_close(
        name in name_strategy(),
        attribute in prop::option::of(name_strategy()),
        indent in prop::option::of("[ \t]{1,3}"),
    ) {
        let mut options = WriterOptions::default();
        if let Some(unit) = &indent {
            options = options.indent(unit).unwrap();
        }
        let mut long = XmlStringWriter::with_options(&options);
        let mut short = XmlStringWriter::with_options(&options);

        long.open_element("r", true).unwrap();
        long.open_element(&name, false).unwrap();
        if let Some(attribute) = &attribute {
            long.attribute(attribute, "v").unwrap();
        }
        long.close_element().unwrap();
        long.close_element().unwrap();

        short.open_element("r", true).unwrap();
        if let Some(attribute) = &attribute {
            short.open_element(&name, false).unwrap();
            short.attribute(attribute, "v").unwrap();
            short.close_element().unwrap();
        } else {
            short.empty_element(&name).unwrap();
        }
        short.close_element().unwrap();

        prop_assert_eq!(long.as_str(), short.as_str());
    }

    #[test]
    fn prop_plain_printable_ascii_is_unchanged(c in prop::char::range(' ', '~')) {
        prop_assume!(!"&<>\"'".contains(c));
        let s = c.to_string();
        prop_assert_eq!(escape_text(&s), s.as_str());
        prop_assert_eq!(escape_attribute(&s), s.as_str());
    }

    #[test]
    fn prop_markup_characters_never_survive(s in "[ -~]{0,40}") {
        let text = escape_text(&s);
        let attribute = escape_attribute(&s);
        prop_assert!(!text.contains('<'));
        prop_assert!(!attribute.contains('<'));
        prop_assert!(!attribute.contains('"'));
        prop_assert!(!attribute.contains('\''));
        let in_text = s.chars().filter(|c| matches!(c, '&' | '<' | '>')).count();
        let in_attribute = s.chars().filter(|c| matches!(c, '&' | '<' | '"' | '\'')).count();
        prop_assert_eq!(text.matches('&').count(), in_text);
        prop_assert_eq!(attribute.matches('&').count(), in_attribute);
    }

    /// Escaped text and attributes read back as the original characters.
    #[test]
    fn prop_escaped_content_reads_back(s in "[ -~\u{e9}\u{3bb}\u{1F64A}]{1,40}") {
        let mut xml = XmlStringWriter::new();
        xml.open_element("t", false).unwrap();
        xml.attribute("a", &s).unwrap();
        xml.write_text(&s).unwrap();
        xml.close_element().unwrap();
        xml.close().unwrap();

        let collector = collect(xml.as_str());
        prop_assert_eq!(collector.attributes, vec![s.clone()]);
        prop_assert_eq!(collector.text, s);
    }

    #[test]
    fn prop_balanced_nesting_closes(depth in 1usize..64, unit in prop::option::of(" {1,4}")) {
        let mut options = WriterOptions::default();
        if let Some(unit) = &unit {
            options = options.indent(unit).unwrap();
        }
        let mut xml = XmlStringWriter::with_options(&options);
        for i in 0..depth {
            xml.open_element(&format!("e{i}"), i + 1 < depth).unwrap();
        }
        prop_assert_eq!(xml.depth(), depth);
        for _ in 0..depth {
            xml.close_element().unwrap();
        }
        prop_assert_eq!(xml.depth(), 0);
        prop_assert_eq!(xml.close_element().unwrap_err(), MisuseError::NothingToClose);
        xml.close().unwrap();
        collect(xml.as_str());
    }
}

#[test]
fn test_quotes_are_escaped_only_in_attributes() {
    assert_eq!(escape_text("\"'"), "\"'");
    assert_eq!(escape_attribute("\"'"), "&quot;&#39;");
}
