//! Character-level scanning with line and column tracking.

use crate::error::{ParseError, SourceLocation};

/// `NameStartChar` ranges outside ASCII (XML 1.0 §2.3 `[4]`).
const NAME_START: &[(char, char)] = &[
    ('\u{C0}', '\u{D6}'),
    ('\u{D8}', '\u{F6}'),
    ('\u{F8}', '\u{2FF}'),
    ('\u{370}', '\u{37D}'),
    ('\u{37F}', '\u{1FFF}'),
    ('\u{200C}', '\u{200D}'),
    ('\u{2070}', '\u{218F}'),
    ('\u{2C00}', '\u{2FEF}'),
    ('\u{3001}', '\u{D7FF}'),
    ('\u{F900}', '\u{FDCF}'),
    ('\u{FDF0}', '\u{FFFD}'),
    ('\u{10000}', '\u{EFFFF}'),
];

/// Further `NameChar` ranges outside ASCII (`[4a]`).
const NAME_REST: &[(char, char)] = &[
    ('\u{B7}', '\u{B7}'),
    ('\u{300}', '\u{36F}'),
    ('\u{203F}', '\u{2040}'),
];

fn within(c: char, ranges: &[(char, char)]) -> bool {
    ranges.iter().any(|&(low, high)| (low..=high).contains(&c))
}

pub(crate) fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':' || within(c, NAME_START)
}

pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-' || c == '.' || within(c, NAME_REST)
}

/// Whether `c` may appear in a document at all (XML 1.0 §2.2 `[2]`).
pub(crate) fn is_document_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// A cursor over XML text.
#[derive(Debug, Clone)]
pub(crate) struct Scanner<'a> {
    text: &'a str,
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.offset,
        }
    }

    /// An error at the current position.
    pub fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.offset..]
    }

    pub fn is_done(&self) -> bool {
        self.offset >= self.text.len()
    }

    /// Whether the remaining input starts with `literal`.
    pub fn at(&self, literal: &str) -> bool {
        self.rest().starts_with(literal)
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consumes one character as written.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consumes `literal` if the input continues with it.
    pub fn eat(&mut self, literal: &str) -> bool {
        if !self.at(literal) {
            return false;
        }
        for _ in literal.chars() {
            self.bump();
        }
        true
    }

    pub fn expect(&mut self, literal: &str) -> Result<(), ParseError> {
        if self.eat(literal) {
            return Ok(());
        }
        Err(match self.peek() {
            Some(c) => self.error(format!("expected '{literal}', found '{c}'")),
            None => self.error(format!("expected '{literal}', found end of input")),
        })
    }

    /// Skips whitespace, reporting whether there was any.
    pub fn skip_space(&mut self) -> bool {
        let start = self.offset;
        while matches!(self.peek(), Some(' ' | '\t' | '\r' | '\n')) {
            self.bump();
        }
        self.offset > start
    }

    fn take(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        let start = self.offset;
        while self.peek().is_some_and(&accept) {
            self.bump();
        }
        &self.text[start..self.offset]
    }

    /// Consumes one character of content. `\r\n` and lone `\r` read as
    /// `\n` (XML 1.0 §2.11); characters outside the XML range are errors.
    pub fn content_char(&mut self) -> Result<char, ParseError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unexpected end of input"));
        };
        match c {
            '\r' => {
                self.eat("\n");
                Ok('\n')
            }
            c if is_document_char(c) => Ok(c),
            c => Err(self.error(format!("invalid XML character: U+{:04X}", u32::from(c)))),
        }
    }

    /// Reads content up to and including `terminator`, returning the
    /// content before it.
    pub fn until(&mut self, terminator: &str, construct: &str) -> Result<String, ParseError> {
        let mut content = String::new();
        while !self.eat(terminator) {
            if self.is_done() {
                return Err(self.error(format!("unterminated {construct}")));
            }
            content.push(self.content_char()?);
        }
        Ok(content)
    }

    /// Reads a `Name` (XML 1.0 §2.3 `[5]`) of at most `max_len` bytes.
    pub fn name(&mut self, max_len: usize) -> Result<&'a str, ParseError> {
        let start = self.offset;
        match self.peek() {
            Some(c) if is_name_start(c) => {
                self.bump();
            }
            Some(c) => return Err(self.error(format!("invalid name start character: '{c}'"))),
            None => return Err(self.error("expected a name, found end of input")),
        }
        self.take(is_name_char);
        let name = &self.text[start..self.offset];
        if name.len() > max_len {
            return Err(self.error(format!(
                "name length ({}) exceeds maximum ({max_len})",
                name.len()
            )));
        }
        Ok(name)
    }

    /// Reads a reference and returns the character it stands for. Only
    /// character references and the predefined entities are known.
    pub fn reference(&mut self, max_len: usize) -> Result<char, ParseError> {
        self.expect("&")?;
        if self.eat("#") {
            let (radix, marker, digits) = if self.eat("x") {
                (16, "x", self.take(|c| c.is_ascii_hexdigit()))
            } else {
                (10, "", self.take(|c| c.is_ascii_digit()))
            };
            if digits.is_empty() {
                return Err(self.error("empty character reference"));
            }
            self.expect(";")?;
            return u32::from_str_radix(digits, radix)
                .ok()
                .and_then(char::from_u32)
                .filter(|&c| is_document_char(c))
                .ok_or_else(|| {
                    self.error(format!(
                        "&#{marker}{digits}; does not refer to an XML character"
                    ))
                });
        }
        let name = self.name(max_len)?;
        self.expect(";")?;
        match name {
            "lt" => Ok('<'),
            "gt" => Ok('>'),
            "amp" => Ok('&'),
            "apos" => Ok('\''),
            "quot" => Ok('"'),
            other => Err(self.error(format!("unknown entity reference: &{other};"))),
        }
    }

    fn open_quote(&mut self) -> Result<char, ParseError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                Ok(quote)
            }
            _ => Err(self.error("expected a quoted value")),
        }
    }

    /// Reads a quoted attribute value with references resolved. Tabs and
    /// line ends become spaces (XML 1.0 §3.3.3).
    pub fn attribute_value(&mut self, max_len: usize) -> Result<String, ParseError> {
        let quote = self.open_quote()?;
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated attribute value")),
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(value);
                }
                Some('<') => return Err(self.error("'<' not allowed in attribute values")),
                Some('&') => value.push(self.reference(max_len)?),
                Some(_) => match self.content_char()? {
                    '\t' | '\n' => value.push(' '),
                    c => value.push(c),
                },
            }
        }
    }

    /// Reads a quoted literal as written.
    pub fn literal(&mut self) -> Result<&'a str, ParseError> {
        let quote = self.open_quote()?;
        let value = self.take(|c| c != quote);
        if self.bump() != Some(quote) {
            return Err(self.error("unterminated literal"));
        }
        Ok(value)
    }
}
