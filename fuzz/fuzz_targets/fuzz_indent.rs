#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlquill::indent::indent;
use xmlquill::parser::ParseOptions;
use xmlquill::sax::{parse_sax, DefaultHandler};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Indented output must read back
        if let Ok(out) = indent(s) {
            let opts = ParseOptions::default().namespaces(false);
            assert!(parse_sax(&out, &opts, &mut DefaultHandler).is_ok());
        }
    }
});
