//! Re-indenting already serialized XML.
//!
//! The indenter reads a document with the event reader (without namespace
//! processing) and writes it back with one element per line. Each open
//! element is tracked as empty, holding text, or holding children:
//!
//! - an element that never receives content is written self-closing;
//! - an element holding text keeps its content inline, whitespace included;
//! - an element holding only children and comments puts each on its own
//!   indented line, and whitespace between them is dropped.
//!
//! Only the predefined entities are understood; a DOCTYPE is an error.
//!
//! ```
//! let out = xmlquill::indent::indent("<a><b>x</b>  <c/></a>").unwrap();
//! assert_eq!(out, "<a>\n  <b>x</b>\n  <c/>\n</a>\n");
//! ```

use crate::error::{MisuseError, ParseError};
use crate::escape::{escape_attribute, escape_text};
use crate::parser::ParseOptions;
use crate::sax::{parse_sax, SaxAttribute, SaxHandler};
use crate::writer::validate_indent;

/// Default indentation unit.
pub const DEFAULT_INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Empty,
    HasText,
    HasChildren,
}

struct Open {
    name: String,
    state: State,
}

/// Handler re-emitting events as indented text.
struct Indenter<'u> {
    out: String,
    unit: &'u str,
    stack: Vec<Open>,
    /// The start tag of the innermost element still lacks its `>`.
    tag_open: bool,
    /// Whitespace seen since the last event, not yet known to be content.
    whitespace: String,
}

impl<'u> Indenter<'u> {
    fn new(unit: &'u str) -> Self {
        Self {
            out: String::new(),
            unit,
            stack: Vec::new(),
            tag_open: false,
            whitespace: String::new(),
        }
    }

    fn state(&self) -> Option<State> {
        self.stack.last().map(|open| open.state)
    }

    fn set_state(&mut self, state: State) {
        if let Some(open) = self.stack.last_mut() {
            open.state = state;
        }
    }

    fn close_tag(&mut self) {
        if self.tag_open {
            self.out.push('>');
            self.tag_open = false;
        }
    }

    fn indent(&mut self, level: usize) {
        for _ in 0..level {
            self.out.push_str(self.unit);
        }
    }

    /// Prepares for a node placed on its own line: a child element,
    /// comment or processing instruction.
    fn begin_line(&mut self) {
        match self.state() {
            // Prolog and epilog
            None => {}
            Some(State::HasText) => {
                self.close_tag();
                let whitespace = std::mem::take(&mut self.whitespace);
                self.out.push_str(&whitespace);
            }
            Some(State::Empty | State::HasChildren) => {
                self.close_tag();
                self.whitespace.clear();
                self.set_state(State::HasChildren);
                self.out.push('\n');
                self.indent(self.stack.len());
            }
        }
    }

    /// Ends a node begun with [`Indenter::begin_line`].
    fn end_line(&mut self) {
        if self.stack.is_empty() {
            self.out.push('\n');
        }
    }

    /// Marks the current element as holding text.
    fn begin_text(&mut self) {
        self.close_tag();
        let whitespace = std::mem::take(&mut self.whitespace);
        self.out.push_str(&whitespace);
        self.set_state(State::HasText);
    }
}

impl SaxHandler for Indenter<'_> {
    fn xml_declaration(&mut self, version: &str, encoding: Option<&str>, standalone: Option<bool>) {
        self.out.push_str("<?xml version=\"");
        self.out.push_str(version);
        self.out.push('"');
        if let Some(encoding) = encoding {
            self.out.push_str(" encoding=\"");
            self.out.push_str(encoding);
            self.out.push('"');
        }
        if let Some(standalone) = standalone {
            self.out.push_str(if standalone {
                " standalone=\"yes\""
            } else {
                " standalone=\"no\""
            });
        }
        self.out.push_str("?>\n");
    }

    fn start_element(
        &mut self,
        local_name: &str,
        _prefix: Option<&str>,
        _namespace: Option<&str>,
        attributes: &[SaxAttribute],
    ) {
        self.begin_line();
        self.out.push('<');
        self.out.push_str(local_name);
        for attribute in attributes {
            self.out.push(' ');
            self.out.push_str(&attribute.qualified_name());
            self.out.push_str("=\"");
            self.out.push_str(&escape_attribute(&attribute.value));
            self.out.push('"');
        }
        self.tag_open = true;
        self.stack.push(Open {
            name: local_name.to_string(),
            state: State::Empty,
        });
    }

    fn end_element(&mut self, _local_name: &str, _prefix: Option<&str>, _namespace: Option<&str>) {
        let Some(open) = self.stack.pop() else {
            return;
        };
        match open.state {
            State::Empty if self.whitespace.is_empty() => {
                self.out.push_str("/>");
                self.tag_open = false;
            }
            State::Empty | State::HasText => {
                self.close_tag();
                let whitespace = std::mem::take(&mut self.whitespace);
                self.out.push_str(&whitespace);
                self.out.push_str("</");
                self.out.push_str(&open.name);
                self.out.push('>');
            }
            State::HasChildren => {
                self.whitespace.clear();
                self.out.push('\n');
                self.indent(self.stack.len());
                self.out.push_str("</");
                self.out.push_str(&open.name);
                self.out.push('>');
            }
        }
        self.end_line();
    }

    fn characters(&mut self, content: &str) {
        if self.stack.is_empty() {
            return;
        }
        if content.chars().all(char::is_whitespace) && self.state() != Some(State::HasText) {
            self.whitespace.push_str(content);
            return;
        }
        self.begin_text();
        self.out.push_str(&escape_text(content));
    }

    fn cdata(&mut self, content: &str) {
        self.begin_text();
        self.out.push_str("<![CDATA[");
        self.out.push_str(content);
        self.out.push_str("]]>");
    }

    fn comment(&mut self, content: &str) {
        self.begin_line();
        self.out.push_str("<!--");
        self.out.push_str(content);
        self.out.push_str("-->");
        self.end_line();
    }

    fn processing_instruction(&mut self, target: &str, data: Option<&str>) {
        self.begin_line();
        self.out.push_str("<?");
        self.out.push_str(target);
        if let Some(data) = data {
            self.out.push(' ');
            self.out.push_str(data);
        }
        self.out.push_str("?>");
        self.end_line();
    }
}

/// Re-indents `xml` with two spaces per level.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed.
pub fn indent(xml: &str) -> Result<String, ParseError> {
    let mut indenter = Indenter::new(DEFAULT_INDENT);
    parse_sax(xml, &ParseOptions::default().namespaces(false), &mut indenter)?;
    Ok(indenter.out)
}

/// Re-indents `xml` with `unit` per level.
///
/// # Errors
///
/// Returns [`IndentError::Indent`] unless `unit` is spaces and tabs, and
/// [`IndentError::Parse`] if the input is not well-formed.
pub fn indent_with(xml: &str, unit: &str) -> Result<String, IndentError> {
    validate_indent(unit)?;
    let mut indenter = Indenter::new(unit);
    parse_sax(xml, &ParseOptions::default().namespaces(false), &mut indenter)?;
    Ok(indenter.out)
}

/// Re-indents `xml`, returning `None` if it is not well-formed.
pub fn indent_silent(xml: &str) -> Option<String> {
    indent(xml).ok()
}

/// Errors from [`indent_with`].
#[derive(Debug, thiserror::Error)]
pub enum IndentError {
    /// The indentation unit was rejected.
    #[error(transparent)]
    Indent(#[from] MisuseError),
    /// The input is not well-formed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}
