//! Character escaping for attribute values and element text.
//!
//! An [`EscapePolicy`] is a plain value chosen from the output encoding. It
//! decides, character by character, whether to copy, drop, or replace. Both
//! the value-returning surface ([`EscapePolicy::element_text`],
//! [`EscapePolicy::attribute_value`]) and the streaming surface
//! ([`EscapePolicy::write_element_text`],
//! [`EscapePolicy::write_attribute_value`]) go through the same decision
//! function, so they always agree.
//!
//! Rules common to both contexts:
//!
//! - `&` and `<` become `&amp;` and `&lt;`.
//! - Tab, line feed and carriage return are kept.
//! - Other C0 controls, DEL, C1 controls and the non-characters U+FFFE and
//!   U+FFFF are dropped.
//! - Characters outside the Basic Multilingual Plane always become a single
//!   numeric reference such as `&#x1F64A;`.
//! - Other characters the target encoding cannot represent become numeric
//!   references.
//!
//! In element text `>` is always escaped. In attribute values `"` and `'`
//! are escaped and `>` is not.
//!
//! Input is assumed to hold no entity references: escaping `&amp;` yields
//! `&amp;amp;`.

use std::borrow::Cow;
use std::convert::Infallible;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::sink::Sink;

/// How characters are escaped for a target output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapePolicy {
    /// Full Unicode output; only BMP characters pass through literally.
    #[default]
    Utf8,
    /// Seven-bit output; every character above U+007F is a numeric reference.
    Ascii,
    /// ISO-8859-1. Only characters up to U+00FF are written literally.
    Latin1,
    /// A single-byte or multi-byte legacy encoding. Characters it cannot
    /// encode become numeric references.
    Legacy(&'static Encoding),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Attribute,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Keep,
    Drop,
    Replace(&'static str),
    CharRef,
}

impl EscapePolicy {
    /// Resolves the policy for an encoding label such as `"utf-8"`,
    /// `"ASCII"` or `"ISO-8859-1"`.
    ///
    /// Returns `None` for labels `encoding_rs` does not know.
    pub fn for_encoding(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("ascii") || label.eq_ignore_ascii_case("us-ascii") {
            return Some(Self::Ascii);
        }
        if is_latin1_label(label) {
            return Some(Self::Latin1);
        }
        let encoding = Encoding::for_label(label.as_bytes())?.output_encoding();
        if encoding == UTF_8 {
            Some(Self::Utf8)
        } else {
            Some(Self::Legacy(encoding))
        }
    }

    /// Canonical name of the target encoding.
    pub fn encoding_name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "ASCII",
            Self::Latin1 => "ISO-8859-1",
            Self::Legacy(encoding) => encoding.name(),
        }
    }

    /// The encoding text must be written in once escaped. Seven-bit output
    /// is plain UTF-8.
    pub fn output_encoding(self) -> &'static Encoding {
        match self {
            Self::Utf8 | Self::Ascii => UTF_8,
            // Same bytes as ISO-8859-1 for U+0000..=U+007F and
            // U+00A0..=U+00FF; C1 controls never reach the sink.
            Self::Latin1 => WINDOWS_1252,
            Self::Legacy(encoding) => encoding,
        }
    }

    /// Escapes `text` for use inside a double-quoted attribute value.
    pub fn attribute_value(self, text: &str) -> Cow<'_, str> {
        self.escape_cow(Context::Attribute, text)
    }

    /// Escapes `text` for use as element content.
    pub fn element_text(self, text: &str) -> Cow<'_, str> {
        self.escape_cow(Context::Text, text)
    }

    /// Escapes UTF-16 code units for use inside an attribute value.
    ///
    /// Surrogate pairs become one numeric reference; lone surrogates are
    /// dropped.
    pub fn attribute_value_utf16(self, units: &[u16]) -> String {
        self.escape_utf16_string(Context::Attribute, units)
    }

    /// Escapes UTF-16 code units for use as element content.
    pub fn element_text_utf16(self, units: &[u16]) -> String {
        self.escape_utf16_string(Context::Text, units)
    }

    /// Streams the escaped attribute value into `sink`.
    pub fn write_attribute_value<S: Sink + ?Sized>(
        self,
        sink: &mut S,
        text: &str,
    ) -> Result<(), S::Error> {
        self.escape_str(Context::Attribute, text, &mut |s| sink.write_str(s))
    }

    /// Streams the escaped element text into `sink`.
    pub fn write_element_text<S: Sink + ?Sized>(
        self,
        sink: &mut S,
        text: &str,
    ) -> Result<(), S::Error> {
        self.escape_str(Context::Text, text, &mut |s| sink.write_str(s))
    }

    /// Streams an escaped UTF-16 attribute value into `sink`.
    pub fn write_attribute_value_utf16<S: Sink + ?Sized>(
        self,
        sink: &mut S,
        units: &[u16],
    ) -> Result<(), S::Error> {
        self.escape_utf16(Context::Attribute, units, &mut |s| sink.write_str(s))
    }

    /// Streams escaped UTF-16 element text into `sink`.
    pub fn write_element_text_utf16<S: Sink + ?Sized>(
        self,
        sink: &mut S,
        units: &[u16],
    ) -> Result<(), S::Error> {
        self.escape_utf16(Context::Text, units, &mut |s| sink.write_str(s))
    }

    fn action(self, context: Context, c: char) -> Action {
        match c {
            '&' => Action::Replace("&amp;"),
            '<' => Action::Replace("&lt;"),
            '>' if context == Context::Text => Action::Replace("&gt;"),
            '"' if context == Context::Attribute => Action::Replace("&quot;"),
            '\'' if context == Context::Attribute => Action::Replace("&#39;"),
            '\t' | '\n' | '\r' => Action::Keep,
            '\u{0}'..='\u{1F}' | '\u{7F}'..='\u{9F}' | '\u{FFFE}' | '\u{FFFF}' => Action::Drop,
            '\u{20}'..='\u{7E}' => Action::Keep,
            c if u32::from(c) > 0xFFFF => Action::CharRef,
            c => match self {
                Self::Utf8 => Action::Keep,
                Self::Ascii => Action::CharRef,
                Self::Latin1 if c <= '\u{FF}' => Action::Keep,
                Self::Latin1 => Action::CharRef,
                Self::Legacy(encoding) => {
                    if is_representable(encoding, c) {
                        Action::Keep
                    } else {
                        Action::CharRef
                    }
                }
            },
        }
    }

    fn escape_str<E>(
        self,
        context: Context,
        text: &str,
        emit: &mut impl FnMut(&str) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut run_start = 0;
        for (i, c) in text.char_indices() {
            let action = self.action(context, c);
            if action == Action::Keep {
                continue;
            }
            if run_start < i {
                emit(&text[run_start..i])?;
            }
            run_start = i + c.len_utf8();
            match action {
                Action::Keep | Action::Drop => {}
                Action::Replace(entity) => emit(entity)?,
                Action::CharRef => emit(&char_ref(c))?,
            }
        }
        if run_start < text.len() {
            emit(&text[run_start..])?;
        }
        Ok(())
    }

    fn escape_utf16<E>(
        self,
        context: Context,
        units: &[u16],
        emit: &mut impl FnMut(&str) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut buf = [0u8; 4];
        for decoded in char::decode_utf16(units.iter().copied()) {
            // Unpaired surrogates cannot be represented in XML.
            let Ok(c) = decoded else { continue };
            match self.action(context, c) {
                Action::Keep => emit(c.encode_utf8(&mut buf))?,
                Action::Drop => {}
                Action::Replace(entity) => emit(entity)?,
                Action::CharRef => emit(&char_ref(c))?,
            }
        }
        Ok(())
    }

    fn escape_cow(self, context: Context, text: &str) -> Cow<'_, str> {
        if text.chars().all(|c| self.action(context, c) == Action::Keep) {
            return Cow::Borrowed(text);
        }
        let mut out = String::with_capacity(text.len() + 16);
        let result = self.escape_str::<Infallible>(context, text, &mut |s| {
            out.push_str(s);
            Ok(())
        });
        match result {
            Ok(()) => Cow::Owned(out),
            Err(never) => match never {},
        }
    }

    fn escape_utf16_string(self, context: Context, units: &[u16]) -> String {
        let mut out = String::with_capacity(units.len());
        let result = self.escape_utf16::<Infallible>(context, units, &mut |s| {
            out.push_str(s);
            Ok(())
        });
        match result {
            Ok(()) => out,
            Err(never) => match never {},
        }
    }
}

fn is_representable(encoding: &'static Encoding, c: char) -> bool {
    let mut buf = [0u8; 4];
    let (_, _, unmappable) = encoding.encode(c.encode_utf8(&mut buf));
    !unmappable
}

/// Labels meaning ISO-8859-1 proper. `encoding_rs` maps them all to
/// windows-1252, which would put 0x80..=0x9F to other uses.
fn is_latin1_label(label: &str) -> bool {
    const LABELS: [&str; 11] = [
        "iso-8859-1",
        "iso8859-1",
        "iso88591",
        "iso_8859-1",
        "iso_8859-1:1987",
        "latin1",
        "l1",
        "cp819",
        "ibm819",
        "iso-ir-100",
        "csisolatin1",
    ];
    LABELS.iter().any(|known| label.eq_ignore_ascii_case(known))
}

fn char_ref(c: char) -> String {
    format!("&#x{:X};", u32::from(c))
}

/// Escapes element text for UTF-8 output.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    EscapePolicy::Utf8.element_text(text)
}

/// Escapes an attribute value for UTF-8 output.
pub fn escape_attribute(text: &str) -> Cow<'_, str> {
    EscapePolicy::Utf8.attribute_value(text)
}
