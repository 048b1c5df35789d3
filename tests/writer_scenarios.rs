//! End-to-end scenarios for the text writers.

#![allow(clippy::unwrap_used)]

use std::io;

use pretty_assertions::assert_eq;

use xmlquill::parser::ParseOptions;
use xmlquill::sax::{parse_sax, DefaultHandler};
use xmlquill::{MisuseError, WriteError, WriterOptions, XmlStreamWriter, XmlStringWriter};

const U1: &str = "http://www.test.net/001";

fn assert_well_formed(xml: &str) {
    if let Err(e) = parse_sax(xml, &ParseOptions::default(), &mut DefaultHandler) {
        panic!("not well-formed ({e}): {xml}");
    }
}

// ---------------------------------------------------------------------------
// Structure and indentation
// ---------------------------------------------------------------------------

#[test]
fn test_two_space_indent_document() {
    let options = WriterOptions::default().indent("  ").unwrap();
    let mut xml = XmlStringWriter::with_options(&options);
    xml.open_element("root", true).unwrap();
    xml.open_element("a", false).unwrap();
    xml.write_text("one").unwrap();
    xml.close_element().unwrap();
    xml.open_element("b", false).unwrap();
    xml.write_text("two").unwrap();
    xml.close_element().unwrap();
    xml.close_element().unwrap();
    xml.close().unwrap();
    assert_eq!(xml.as_str(), "<root>\n  <a>one</a>\n  <b>two</b>\n</root>");
}

#[test]
fn test_tab_indented_declaration_and_misc() {
    let options = WriterOptions::default().indent("\t").unwrap();
    let mut xml = XmlStringWriter::with_options(&options);
    xml.xml_decl().unwrap();
    xml.open_element("config", true).unwrap();
    xml.write_comment("generated").unwrap();
    xml.open_element("entry", false).unwrap();
    xml.attribute("key", "a'b").unwrap();
    xml.write_cdata("x < y").unwrap();
    xml.close_element().unwrap();
    xml.write_pi("cache", "off").unwrap();
    xml.close_element().unwrap();
    xml.close().unwrap();
    assert_eq!(
        xml.as_str(),
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <config>\n\
         \t<!-- generated -->\n\
         \t<entry key=\"a&#39;b\"><![CDATA[x < y]]></entry>\n\
         \t<?cache off?>\n\
         </config>"
    );
    assert_well_formed(xml.as_str());
}

#[test]
fn test_closing_nothing_fails() {
    let mut xml = XmlStringWriter::new();
    assert_eq!(xml.close_element().unwrap_err(), MisuseError::NothingToClose);
    xml.close().unwrap();
    assert_eq!(xml.as_str(), "");
}

#[test]
fn test_unclosed_element_is_named() {
    let mut xml = XmlStringWriter::new();
    xml.open_element("a", true).unwrap();
    xml.open_element("b", true).unwrap();
    let err = xml.close().unwrap_err();
    assert_eq!(err.to_string(), "Cannot close the writer: element \"b\" is still open.");
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

#[test]
fn test_supplementary_character_is_one_reference() {
    let mut xml = XmlStringWriter::new();
    xml.element("t", "\u{1F64A}").unwrap();
    xml.close().unwrap();
    assert_eq!(xml.as_str(), "<t>&#x1F64A;</t>");
}

#[test]
fn test_ascii_output_is_seven_bit() {
    let options = WriterOptions::default().encoding("US-ASCII").unwrap();
    let mut xml = XmlStringWriter::with_options(&options);
    xml.xml_decl().unwrap();
    xml.open_element("t", false).unwrap();
    xml.attribute("name", "caf\u{e9}").unwrap();
    xml.write_text("na\u{ef}ve \u{2603}").unwrap();
    xml.close_element().unwrap();
    xml.close().unwrap();
    assert_eq!(
        xml.as_str(),
        "<?xml version=\"1.0\" encoding=\"US-ASCII\"?>\
         <t name=\"caf&#xE9;\">na&#xEF;ve &#x2603;</t>"
    );
    assert!(xml.as_str().is_ascii());
}

#[test]
fn test_control_characters_are_dropped() {
    let mut xml = XmlStringWriter::new();
    xml.open_element("t", false).unwrap();
    xml.attribute("a", "x\u{1}\ty\u{85}").unwrap();
    xml.write_text("\u{0}keep\nlines\u{7f}").unwrap();
    xml.close_element().unwrap();
    xml.close().unwrap();
    assert_eq!(xml.as_str(), "<t a=\"x\ty\">keep\nlines</t>");
    assert_well_formed(xml.as_str());
}

#[test]
fn test_cdata_terminator_in_text_is_escaped() {
    let mut xml = XmlStringWriter::new();
    xml.element("t", "]]>").unwrap();
    assert_eq!(xml.as_str(), "<t>]]&gt;</t>");
}

// ---------------------------------------------------------------------------
// Namespaces
// ---------------------------------------------------------------------------

#[test]
fn test_namespace_restored_after_scope() {
    let options = WriterOptions::default().namespace_aware(true);
    let mut xml = XmlStringWriter::with_options(&options);
    xml.set_prefix_mapping(U1, "").unwrap();
    xml.open_element_ns(Some(U1), "test", true).unwrap();
    xml.set_prefix_mapping(U1, "xx").unwrap();
    xml.open_element_ns(Some(U1), "empty", false).unwrap();
    xml.close_element().unwrap();
    xml.empty_element_ns(Some(U1), "empty").unwrap();
    xml.close_element().unwrap();
    xml.close().unwrap();
    assert_eq!(
        xml.as_str(),
        format!("<test xmlns=\"{U1}\"><xx:empty xmlns:xx=\"{U1}\"/><empty/></test>")
    );
    assert_well_formed(xml.as_str());
}

#[test]
fn test_reserved_bindings_are_rejected() {
    let options = WriterOptions::default().namespace_aware(true);
    let mut xml = XmlStringWriter::with_options(&options);
    assert!(matches!(
        xml.set_prefix_mapping("urn:x", "xml"),
        Err(MisuseError::ReservedNamespace { .. })
    ));
    assert!(matches!(
        xml.set_prefix_mapping("urn:x", "xmlns"),
        Err(MisuseError::ReservedNamespace { .. })
    ));
    assert!(matches!(
        xml.set_prefix_mapping("", "p"),
        Err(MisuseError::ReservedNamespace { .. })
    ));
}

#[test]
fn test_unprefixed_attribute_cannot_carry_namespace() {
    let options = WriterOptions::default().namespace_aware(true);
    let mut xml = XmlStringWriter::with_options(&options);
    xml.set_prefix_mapping(U1, "").unwrap();
    xml.open_element_ns(Some(U1), "e", false).unwrap();
    assert_eq!(
        xml.attribute_ns(Some(U1), "a", "v").unwrap_err(),
        MisuseError::UndeclaredNamespace { uri: U1.to_string() }
    );
}

// ---------------------------------------------------------------------------
// Stream sink
// ---------------------------------------------------------------------------

struct FailingWriter;

impl io::Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_io_failure_propagates() {
    let mut xml = XmlStreamWriter::new(FailingWriter);
    let err = xml.open_element("a", false).unwrap_err();
    match err {
        WriteError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
        WriteError::Misuse(m) => panic!("unexpected misuse: {m}"),
    }
}

#[test]
fn test_stream_and_string_writers_agree() {
    let options = WriterOptions::default()
        .indent(" ")
        .unwrap()
        .encoding("ISO-8859-1")
        .unwrap();
    let mut stream = XmlStreamWriter::with_options(Vec::new(), &options);
    let mut string = XmlStringWriter::with_options(&options);

    stream.xml_decl().unwrap();
    string.xml_decl().unwrap();
    for name in ["a", "b"] {
        stream.open_element(name, true).unwrap();
        string.open_element(name, true).unwrap();
    }
    stream.element("c", "\u{e9}\u{20ac}\u{100}").unwrap();
    string.element("c", "\u{e9}\u{20ac}\u{100}").unwrap();
    for _ in 0..2 {
        stream.close_element().unwrap();
        string.close_element().unwrap();
    }
    stream.close().unwrap();
    string.close().unwrap();

    let bytes = stream.into_writer();
    assert!(bytes.contains(&0xE9));
    assert!(!bytes.contains(&0x80));
    let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(&bytes);
    assert!(!had_errors);
    assert_eq!(decoded, string.into_string());
}

#[test]
fn test_latin1_stream_references_euro_sign() {
    let options = WriterOptions::default().encoding("ISO-8859-1").unwrap();
    let mut xml = XmlStreamWriter::with_options(Vec::new(), &options);
    xml.xml_decl().unwrap();
    xml.element("r", "\u{e9}\u{20AC}").unwrap();
    xml.close().unwrap();
    assert_eq!(
        xml.into_writer(),
        b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r>\xe9&#x20AC;</r>".to_vec()
    );
}
