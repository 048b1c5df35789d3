//! # xmlquill
//!
//! A forward-only XML writer. Elements are opened, given attributes, filled
//! and closed through a single state machine that rejects misuse instead of
//! repairing it, resolves namespace URIs to prefixes, and escapes text for
//! the target encoding.
//!
//! The same call contract drives several back ends: text on any
//! [`std::io::Write`], an in-memory `String`, an in-memory [`Document`] tree, or
//! a stream of SAX events.
//!
//! ## Quick Start
//!
//! ```
//! use xmlquill::{WriterOptions, XmlStringWriter};
//!
//! let options = WriterOptions::default().namespace_aware(true);
//! let mut xml = XmlStringWriter::with_options(&options);
//! xml.set_prefix_mapping("urn:example", "ex").unwrap();
//! xml.open_element_ns(Some("urn:example"), "list", false).unwrap();
//! xml.attribute("size", "1").unwrap();
//! xml.write_text("a < b").unwrap();
//! xml.close_element().unwrap();
//! xml.close().unwrap();
//! assert_eq!(
//!     xml.as_str(),
//!     "<ex:list size=\"1\" xmlns:ex=\"urn:example\">a &lt; b</ex:list>"
//! );
//! ```

pub mod error;
pub mod escape;
pub mod indent;
pub mod namespace;
pub mod parser;
pub mod sax;
pub mod serialize;
pub mod sink;
pub mod tree;
pub mod util;
pub mod writer;

// Re-export primary types at the crate root for convenience.
pub use error::{MisuseError, ParseError, WriteError};
pub use escape::EscapePolicy;
pub use tree::{Document, NodeId, TreeWriter};
pub use writer::{NamespaceMode, Writer, WriterOptions, XmlStreamWriter, XmlStringWriter};
