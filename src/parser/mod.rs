//! A minimal XML reader.
//!
//! The reader exists to feed documents back through the writer: it fires
//! [`crate::sax::SaxHandler`] events through [`crate::sax::parse_sax`] and
//! understands no DTDs and no entities beyond the predefined ones.

mod reader;
mod scanner;

pub(crate) use reader::read;

/// Deepest element nesting accepted by default.
pub const DEFAULT_MAX_DEPTH: u32 = 256;

/// Longest name, in bytes, accepted by default.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 50_000;

/// Options controlling the reader and its security limits.
///
/// ```
/// use xmlquill::parser::ParseOptions;
///
/// let options = ParseOptions::default().namespaces(false).max_depth(128);
/// assert_eq!(options.max_depth, 128);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// If true, element and attribute names are resolved against `xmlns`
    /// declarations and prefix-mapping events are reported.
    pub namespaces: bool,
    /// Deeper documents are rejected.
    pub max_depth: u32,
    /// Longer element, attribute or entity names are rejected.
    pub max_name_length: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            namespaces: true,
            max_depth: DEFAULT_MAX_DEPTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

impl ParseOptions {
    /// Enables or disables namespace processing.
    #[must_use]
    pub fn namespaces(mut self, yes: bool) -> Self {
        self.namespaces = yes;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    #[must_use]
    pub fn max_name_length(mut self, bytes: usize) -> Self {
        self.max_name_length = bytes;
        self
    }
}
