#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlquill::parser::ParseOptions;
use xmlquill::sax::{parse_sax, DefaultHandler};
use xmlquill::{EscapePolicy, WriterOptions, XmlStringWriter};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Whatever the text, the escaped document must be well-formed
        for label in ["utf-8", "ascii", "ISO-8859-1"] {
            let Ok(options) = WriterOptions::default().encoding(label) else {
                continue;
            };
            let mut xml = XmlStringWriter::with_options(&options);
            xml.open_element("r", false).unwrap();
            xml.attribute("a", s).unwrap();
            xml.write_text(s).unwrap();
            xml.close_element().unwrap();
            xml.close().unwrap();
            let out = xml.into_string();
            assert!(parse_sax(&out, &ParseOptions::default(), &mut DefaultHandler).is_ok());
            if options.policy() == EscapePolicy::Ascii {
                assert!(out.is_ascii());
            }
        }
    }
});
