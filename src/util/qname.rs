//! Qualified names, `prefix:local` or a bare `local`
//! (<https://www.w3.org/TR/xml-names/#NT-QName>).
//!
//! This module also derives element names from arbitrary identifiers and
//! Rust type names.

use std::fmt;

/// A resolved element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QualifiedName {
    /// Prefix, or `None` for an unprefixed name.
    pub prefix: Option<String>,
    /// Local part of the name.
    pub local_name: String,
    /// Namespace URI the name was resolved against, if any.
    pub namespace: Option<String>,
}

impl QualifiedName {
    /// A name with no prefix and no namespace.
    pub fn local(name: &str) -> Self {
        Self {
            prefix: None,
            local_name: name.to_string(),
            namespace: None,
        }
    }

    /// A name resolved to `prefix` within `namespace`. An empty prefix
    /// yields an unprefixed name.
    pub fn resolved(prefix: &str, local_name: &str, namespace: Option<&str>) -> Self {
        Self {
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
            local_name: local_name.to_string(),
            namespace: namespace.filter(|uri| !uri.is_empty()).map(str::to_string),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

/// Splits at the first colon, if there is one.
///
/// ```
/// use xmlquill::util::qname::split_qname;
///
/// assert_eq!(split_qname("dc:title"), (Some("dc"), "title"));
/// assert_eq!(split_qname("title"), (None, "title"));
/// ```
#[must_use]
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

/// Turns an arbitrary identifier into a usable element name.
///
/// Letters are lowercased, a leading non-letter becomes `x` and every
/// other non-letter becomes `-`.
///
/// ```
/// use xmlquill::util::qname::to_element_name;
///
/// assert_eq!(to_element_name("FirstName"), "firstname");
/// assert_eq!(to_element_name("2nd place"), "xnd-place");
/// ```
#[must_use]
pub fn to_element_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        if c.is_alphabetic() {
            out.extend(c.to_lowercase());
        } else if i == 0 {
            out.push('x');
        } else {
            out.push('-');
        }
    }
    out
}

/// Derives an element name from a type path such as
/// `my_crate::model::Person` or `alloc::vec::Vec<u8>`.
///
/// Generic arguments and every `::`, `.` or `$` qualifier are stripped and
/// the remainder is lowercased.
#[must_use]
pub fn simple_type_name(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let last = base
        .rsplit(|c: char| c == ':' || c == '.' || c == '$')
        .next()
        .unwrap_or(base);
    last.to_lowercase()
}
