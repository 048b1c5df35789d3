//! Namespace prefix bindings for the namespace-aware writer.
//!
//! The [`PrefixTable`] maps each namespace URI to its live prefix. At most
//! one prefix is live per URI and one URI per prefix. Every change is
//! recorded as a [`PrefixDelta`] owned by the element frame that declared
//! it. When that frame closes, the table is re-derived from the deltas of
//! the frames still open ([`PrefixTable::restore`]), so each prefix the
//! closing frame touched goes back to the binding of the nearest ancestor
//! that declared it, or is unbound if no ancestor did.

use std::collections::HashMap;

use crate::error::MisuseError;
use crate::util::qname::QualifiedName;

/// The namespace bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace of `xmlns` attributes; it can never be bound.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// One prefix rebinding, reverted when its owning element closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixDelta {
    /// The prefix, empty for the default namespace.
    pub prefix: String,
    /// The namespace URI, empty to undeclare the default namespace.
    pub uri: String,
}

impl PrefixDelta {
    pub(crate) fn new(prefix: &str, uri: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
        }
    }
}

/// Live mapping from namespace URI to prefix.
#[derive(Debug, Clone)]
pub struct PrefixTable {
    by_uri: HashMap<String, String>,
}

impl Default for PrefixTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixTable {
    /// Creates a table holding the built-in bindings: the empty URI to the
    /// default prefix and the XML namespace to `xml`.
    pub fn new() -> Self {
        let mut table = Self {
            by_uri: HashMap::new(),
        };
        for delta in Self::builtin_deltas() {
            table.apply(&delta);
        }
        table
    }

    /// The bindings every document starts with. The writer keeps them on
    /// its sentinel frame so that restoration can fall back to them.
    pub fn builtin_deltas() -> Vec<PrefixDelta> {
        vec![PrefixDelta::new("", ""), PrefixDelta::new("xml", XML_NAMESPACE)]
    }

    /// Returns the prefix currently bound to `uri`.
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.by_uri.get(uri).map(String::as_str)
    }

    /// Returns the URI currently bound to `prefix`.
    pub fn uri_for(&self, prefix: &str) -> Option<&str> {
        self.by_uri
            .iter()
            .find(|(_, p)| p.as_str() == prefix)
            .map(|(uri, _)| uri.as_str())
    }

    /// Binds `prefix` to `uri`, returning the delta to record.
    ///
    /// Returns `Ok(None)` when the binding is already live. A prefix that
    /// was bound to another URI is released first, and so is the URI's
    /// previous prefix.
    pub fn bind(&mut self, uri: &str, prefix: &str) -> Result<Option<PrefixDelta>, MisuseError> {
        check_reserved(uri, prefix)?;
        if self.prefix_for(uri) == Some(prefix) {
            return Ok(None);
        }
        let delta = PrefixDelta::new(prefix, uri);
        self.apply(&delta);
        Ok(Some(delta))
    }

    /// Rebuilds the table from the deltas of the frames still open,
    /// outermost first.
    ///
    /// The outermost scope must carry [`PrefixTable::builtin_deltas`].
    pub fn restore<'a>(&mut self, scopes: impl IntoIterator<Item = &'a [PrefixDelta]>) {
        self.by_uri.clear();
        for scope in scopes {
            for delta in scope {
                self.apply(delta);
            }
        }
    }

    /// Resolves an element name.
    ///
    /// A missing or empty URI yields the bare local name; the XML namespace
    /// always uses `xml`; any other URI must be bound.
    pub fn resolve_element(
        &self,
        uri: Option<&str>,
        local_name: &str,
    ) -> Result<QualifiedName, MisuseError> {
        let uri = match uri {
            None | Some("") => return Ok(QualifiedName::local(local_name)),
            Some(uri) => uri,
        };
        let prefix = self.bound_prefix(uri)?;
        Ok(QualifiedName::resolved(prefix, local_name, Some(uri)))
    }

    /// Resolves an attribute name.
    ///
    /// Unprefixed attributes are in no namespace, so a non-empty URI needs
    /// a non-empty prefix.
    pub fn resolve_attribute(
        &self,
        uri: Option<&str>,
        local_name: &str,
    ) -> Result<QualifiedName, MisuseError> {
        let uri = match uri {
            None | Some("") => return Ok(QualifiedName::local(local_name)),
            Some(uri) => uri,
        };
        match self.bound_prefix(uri)? {
            "" => Err(MisuseError::UndeclaredNamespace {
                uri: uri.to_string(),
            }),
            prefix => Ok(QualifiedName::resolved(prefix, local_name, Some(uri))),
        }
    }

    fn bound_prefix(&self, uri: &str) -> Result<&str, MisuseError> {
        if uri == XML_NAMESPACE {
            return Ok("xml");
        }
        self.prefix_for(uri)
            .ok_or_else(|| MisuseError::UndeclaredNamespace {
                uri: uri.to_string(),
            })
    }

    fn apply(&mut self, delta: &PrefixDelta) {
        self.by_uri.retain(|_, prefix| *prefix != delta.prefix);
        self.by_uri.insert(delta.uri.clone(), delta.prefix.clone());
    }
}

pub(crate) fn check_reserved(uri: &str, prefix: &str) -> Result<(), MisuseError> {
    let reserved = prefix == "xmlns"
        || uri == XMLNS_NAMESPACE
        || (prefix == "xml") != (uri == XML_NAMESPACE)
        || (uri.is_empty() && !prefix.is_empty());
    if reserved {
        return Err(MisuseError::ReservedNamespace {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const U1: &str = "http://www.test.net/001";
    const U2: &str = "http://www.test.net/002";

    #[test]
    fn test_builtin_bindings() {
        let table = PrefixTable::new();
        assert_eq!(table.prefix_for(""), Some(""));
        assert_eq!(table.prefix_for(XML_NAMESPACE), Some("xml"));
        assert_eq!(table.uri_for("xml"), Some(XML_NAMESPACE));
    }

    #[test]
    fn test_bind_same_mapping_is_noop() {
        let mut table = PrefixTable::new();
        assert!(table.bind(U1, "a").unwrap().is_some());
        assert_eq!(table.bind(U1, "a").unwrap(), None);
        assert_eq!(table.bind(XML_NAMESPACE, "xml").unwrap(), None);
    }

    #[test]
    fn test_rebinding_prefix_releases_old_uri() {
        let mut table = PrefixTable::new();
        table.bind(U1, "a").unwrap();
        table.bind(U2, "a").unwrap();
        assert_eq!(table.prefix_for(U1), None);
        assert_eq!(table.prefix_for(U2), Some("a"));
    }

    #[test]
    fn test_rebinding_uri_replaces_prefix() {
        let mut table = PrefixTable::new();
        table.bind(U1, "a").unwrap();
        table.bind(U1, "b").unwrap();
        assert_eq!(table.prefix_for(U1), Some("b"));
        assert_eq!(table.uri_for("a"), None);
    }

    #[test]
    fn test_default_namespace_overrides_empty_uri() {
        let mut table = PrefixTable::new();
        table.bind(U1, "").unwrap();
        assert_eq!(table.prefix_for(""), None);
        assert_eq!(
            table.resolve_element(Some(U1), "test").unwrap().to_string(),
            "test"
        );
        // The empty URI still resolves to the bare local name.
        assert_eq!(table.resolve_element(Some(""), "x").unwrap().to_string(), "x");
    }

    #[test]
    fn test_resolve_undeclared() {
        let table = PrefixTable::new();
        assert_eq!(
            table.resolve_element(Some(U1), "x").unwrap_err(),
            MisuseError::UndeclaredNamespace { uri: U1.to_string() }
        );
    }

    #[test]
    fn test_resolve_xml_namespace() {
        let table = PrefixTable::new();
        assert_eq!(
            table
                .resolve_attribute(Some(XML_NAMESPACE), "lang")
                .unwrap()
                .to_string(),
            "xml:lang"
        );
    }

    #[test]
    fn test_attribute_needs_prefix() {
        let mut table = PrefixTable::new();
        table.bind(U1, "").unwrap();
        assert!(table.resolve_attribute(Some(U1), "a").is_err());
        table.bind(U2, "p").unwrap();
        assert_eq!(table.resolve_attribute(Some(U2), "a").unwrap().to_string(), "p:a");
    }

    #[test]
    fn test_reserved_bindings_rejected() {
        let mut table = PrefixTable::new();
        assert!(table.bind(U1, "xml").is_err());
        assert!(table.bind(XML_NAMESPACE, "x").is_err());
        assert!(table.bind(U1, "xmlns").is_err());
        assert!(table.bind(XMLNS_NAMESPACE, "n").is_err());
        assert!(table.bind("", "p").is_err());
        assert!(table.bind("", "").is_ok());
    }

    #[test]
    fn test_restore_replays_scopes() {
        let mut table = PrefixTable::new();
        let root = PrefixTable::builtin_deltas();
        let outer = vec![table.bind(U1, "").unwrap().unwrap()];
        table.bind(U1, "xx").unwrap();
        assert_eq!(table.prefix_for(U1), Some("xx"));

        table.restore([root.as_slice(), outer.as_slice()]);
        assert_eq!(table.prefix_for(U1), Some(""));
        assert_eq!(table.uri_for("xx"), None);

        table.restore([root.as_slice()]);
        assert_eq!(table.prefix_for(U1), None);
        assert_eq!(table.prefix_for(""), Some(""));
    }
}
