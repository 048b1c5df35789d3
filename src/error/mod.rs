//! Error types for writing and reading XML.
//!
//! Writing distinguishes two failure families. [`MisuseError`] covers
//! structural mistakes by the caller (closing too often, attributes after
//! content, undeclared namespaces, ...). These are always detected before
//! anything is written. [`WriteError`] adds failures of the underlying
//! output sink, which are propagated unchanged.
//!
//! Reading (used by the indenter and the SAX reader) reports a
//! [`ParseError`] carrying the [`SourceLocation`] of the offending input.

use std::fmt;
use std::io;

/// A structural misuse of a writer.
///
/// Every variant is a distinct condition the caller can match on. None of
/// them is ever corrected silently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MisuseError {
    /// `close_element` was called with no element open.
    #[error("Attempted to close the document element: no element is open.")]
    NothingToClose,

    /// An attribute was written after the start tag had been completed.
    #[error("Attribute \"{name}\" must be written before any content of its element.")]
    AttributeTooLate {
        /// Name of the rejected attribute.
        name: String,
    },

    /// `close` was called while an element was still open.
    #[error("Cannot close the writer: element \"{name}\" is still open.")]
    UnclosedElement {
        /// Qualified name of the innermost open element.
        name: String,
    },

    /// A comment contained `--`.
    #[error("A comment must not contain \"--\".")]
    IllegalComment,

    /// A CDATA section contained `]]>`.
    #[error("A CDATA section must not contain \"]]>\".")]
    IllegalCdata,

    /// A processing instruction contained `?>` or had an empty target.
    #[error("Illegal processing instruction \"{target}\".")]
    IllegalProcessingInstruction {
        /// The rejected target.
        target: String,
    },

    /// A namespace URI was used without a bound prefix.
    #[error("The namespace URI \"{uri}\" has not been mapped to any prefix.")]
    UndeclaredNamespace {
        /// The unresolved namespace URI.
        uri: String,
    },

    /// A prefix mapping touched the reserved `xml`/`xmlns` bindings or bound
    /// a prefix to the empty URI.
    #[error("Cannot map prefix \"{prefix}\" to \"{uri}\".")]
    ReservedNamespace {
        /// The rejected prefix.
        prefix: String,
        /// The rejected URI.
        uri: String,
    },

    /// A namespaced attribute would have declared a new binding for a
    /// prefix the open start tag already uses.
    #[error("Prefix \"{prefix}\" is already in use on the open start tag.")]
    PrefixInUse {
        /// The prefix that would have been rebound.
        prefix: String,
    },

    /// The indentation unit contained something other than spaces and tabs.
    #[error("Indentation must only contain spaces and tabs, found {found:?}.")]
    InvalidIndent {
        /// The rejected indentation unit.
        found: String,
    },

    /// Indentation was changed after the first element was opened.
    #[error("Cannot change indentation once writing has started.")]
    IndentTooLate,

    /// The XML declaration was requested after the first element.
    #[error("The XML declaration must precede the document element.")]
    DeclarationTooLate,

    /// The encoding label is not known.
    #[error("Unsupported encoding \"{0}\".")]
    UnsupportedEncoding(String),

    /// The writer variant cannot perform this operation.
    #[error("{0}")]
    Unsupported(&'static str),

    /// The writer has already been closed.
    #[error("The writer has been closed.")]
    Closed,
}

/// Failure of a writer backed by an I/O sink.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The underlying sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The caller misused the writer.
    #[error(transparent)]
    Misuse(#[from] MisuseError),
}

impl WriteError {
    /// Returns the misuse condition, if this is one.
    pub fn as_misuse(&self) -> Option<&MisuseError> {
        match self {
            Self::Misuse(misuse) => Some(misuse),
            Self::Io(_) => None,
        }
    }
}

/// A position in XML input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: u32,
    /// Counted in characters from 1.
    pub column: u32,
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Input that is not well-formed XML.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{location}: {message}")]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}
