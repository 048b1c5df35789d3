//! Writing plain data as XML.
//!
//! Values are described by a small tagged model, [`Value`], and any type can
//! take part by implementing [`XmlSerializable`]. [`XmlSerializer`] walks a
//! value and drives a writer with nothing but `open_element`, `write_text`
//! and `close_element`.
//!
//! - Scalars become `<name>text</name>`; `Null` is skipped.
//! - Sequence items are named after their kind: `boolean`, `integer`,
//!   `double`, `character`, `string`, `sequence`, `map`, or the element name
//!   of an object.
//! - A map holds one `entry` per pair, each with a `key` and a `value`.
//! - An object holds its fields in order, each named after the field.
//!
//! ```
//! use xmlquill::serialize::{to_xml_string, Object, Value};
//!
//! let person = Object::new("app::model::Person")
//!     .field("name", "Ada")
//!     .field("tags", vec!["math", "code"]);
//! assert_eq!(
//!     to_xml_string(&Value::Object(person)).unwrap(),
//!     "<person><name>Ada</name><tags><string>math</string><string>code</string></tags></person>"
//! );
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::error::MisuseError;
use crate::util::qname::simple_type_name;
use crate::writer::{Output, Writer, XmlStringWriter};

/// A serializable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent data; nothing is written.
    Null,
    Bool(bool),
    Integer(i128),
    Float(f64),
    Char(char),
    String(String),
    /// An ordered sequence of values.
    Sequence(Vec<Value>),
    /// Key/value pairs in order.
    Map(Vec<(Value, Value)>),
    /// A record with named fields.
    Object(Object),
}

impl Value {
    /// The element name used for this value inside a sequence.
    pub fn kind_name(&self) -> Cow<'static, str> {
        match self {
            Self::Null => Cow::Borrowed("null"),
            Self::Bool(_) => Cow::Borrowed("boolean"),
            Self::Integer(_) => Cow::Borrowed("integer"),
            Self::Float(_) => Cow::Borrowed("double"),
            Self::Char(_) => Cow::Borrowed("character"),
            Self::String(_) => Cow::Borrowed("string"),
            Self::Sequence(_) => Cow::Borrowed("sequence"),
            Self::Map(_) => Cow::Borrowed("map"),
            Self::Object(object) => Cow::Owned(object.element_name()),
        }
    }

    fn scalar_text(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Char(c) => Some(c.to_string()),
            Self::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// A record: a type name and ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Full type name, such as `app::model::Person`.
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
}

impl Object {
    /// Creates an object with no fields.
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields: Vec::new(),
        }
    }

    /// Creates an object named after the Rust type `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, name: &str, value: impl XmlSerializable) -> Self {
        self.fields.push((name.to_string(), value.to_value()));
        self
    }

    /// The element name derived from the type name.
    pub fn element_name(&self) -> String {
        simple_type_name(&self.type_name)
    }
}

/// A type that can be described as a [`Value`].
pub trait XmlSerializable {
    fn to_value(&self) -> Value;
}

impl XmlSerializable for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl XmlSerializable for Object {
    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }
}

impl XmlSerializable for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! integer_values {
    ($($t:ty),*) => {
        $(
            impl XmlSerializable for $t {
                fn to_value(&self) -> Value {
                    Value::Integer(i128::from(*self))
                }
            }
        )*
    };
}

integer_values!(i8, i16, i32, i64, u8, u16, u32, u64);

impl XmlSerializable for isize {
    #[allow(clippy::cast_possible_wrap)]
    fn to_value(&self) -> Value {
        Value::Integer(*self as i128)
    }
}

impl XmlSerializable for usize {
    fn to_value(&self) -> Value {
        Value::Integer(*self as i128)
    }
}

impl XmlSerializable for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl XmlSerializable for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl XmlSerializable for char {
    fn to_value(&self) -> Value {
        Value::Char(*self)
    }
}

impl XmlSerializable for str {
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl XmlSerializable for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl<T: XmlSerializable + ?Sized> XmlSerializable for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: XmlSerializable> XmlSerializable for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, XmlSerializable::to_value)
    }
}

impl<T: XmlSerializable> XmlSerializable for [T] {
    fn to_value(&self) -> Value {
        Value::Sequence(self.iter().map(XmlSerializable::to_value).collect())
    }
}

impl<T: XmlSerializable> XmlSerializable for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<K: XmlSerializable, V: XmlSerializable> XmlSerializable for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }
}

/// Drives a writer from [`Value`]s.
pub struct XmlSerializer<'w, O: Output> {
    xml: &'w mut Writer<O>,
}

impl<'w, O: Output> XmlSerializer<'w, O> {
    pub fn new(xml: &'w mut Writer<O>) -> Self {
        Self { xml }
    }

    /// Returns the underlying writer.
    pub fn writer(&mut self) -> &mut Writer<O> {
        &mut *self.xml
    }

    /// Writes `value` as an element named after `name`, stripped of any
    /// `::`, `.` or `$` qualifiers and lowercased.
    pub fn serialize<T: XmlSerializable + ?Sized>(
        &mut self,
        value: &T,
        name: &str,
    ) -> Result<(), O::Error> {
        self.serialize_value(&value.to_value(), name)
    }

    /// Writes `value` as an element named after `name`.
    pub fn serialize_value(&mut self, value: &Value, name: &str) -> Result<(), O::Error> {
        let name = simple_type_name(name);
        match value {
            Value::Null => Ok(()),
            Value::Sequence(items) => {
                self.xml.open_element(&name, !items.is_empty())?;
                self.serialize_sequence(items)?;
                self.xml.close_element()
            }
            Value::Map(entries) => {
                self.xml.open_element(&name, !entries.is_empty())?;
                self.serialize_map(entries)?;
                self.xml.close_element()
            }
            Value::Object(object) => {
                self.xml.open_element(&name, !object.fields.is_empty())?;
                self.serialize_object(object)?;
                self.xml.close_element()
            }
            scalar => {
                let text = scalar.scalar_text().unwrap_or_default();
                self.xml.element(&name, &text)
            }
        }
    }

    /// Writes each item as an element named after its kind.
    pub fn serialize_sequence(&mut self, items: &[Value]) -> Result<(), O::Error> {
        for item in items {
            self.serialize_value(item, &item.kind_name())?;
        }
        Ok(())
    }

    /// Writes one `entry` element per pair.
    pub fn serialize_map(&mut self, entries: &[(Value, Value)]) -> Result<(), O::Error> {
        for (key, value) in entries {
            self.xml.open_element("entry", true)?;
            self.serialize_value(key, "key")?;
            self.serialize_value(value, "value")?;
            self.xml.close_element()?;
        }
        Ok(())
    }

    /// Writes the fields of `object`, without an enclosing element.
    pub fn serialize_object(&mut self, object: &Object) -> Result<(), O::Error> {
        for (name, value) in &object.fields {
            self.serialize_value(value, name)?;
        }
        Ok(())
    }
}

/// Serializes `value` into a string. The root element is named after the
/// value's kind, or after the type of an object.
pub fn to_xml_string<T: XmlSerializable + ?Sized>(value: &T) -> Result<String, MisuseError> {
    let value = value.to_value();
    let mut xml = XmlStringWriter::new();
    XmlSerializer::new(&mut xml).serialize_value(&value, &value.kind_name())?;
    xml.close()?;
    Ok(xml.into_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::writer::WriterOptions;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalars() {
        assert_eq!(to_xml_string(&true).unwrap(), "<boolean>true</boolean>");
        assert_eq!(to_xml_string(&-42i32).unwrap(), "<integer>-42</integer>");
        assert_eq!(to_xml_string(&1.5f64).unwrap(), "<double>1.5</double>");
        assert_eq!(to_xml_string(&'<').unwrap(), "<character>&lt;</character>");
        assert_eq!(to_xml_string("a&b").unwrap(), "<string>a&amp;b</string>");
        assert_eq!(to_xml_string("").unwrap(), "<string/>");
    }

    #[test]
    fn test_null_is_skipped() {
        assert_eq!(to_xml_string(&None::<i32>).unwrap(), "");
        let seq = vec![Some(1), None, Some(3)];
        assert_eq!(
            to_xml_string(&seq).unwrap(),
            "<sequence><integer>1</integer><integer>3</integer></sequence>"
        );
    }

    #[test]
    fn test_map_layout() {
        let mut map = BTreeMap::new();
        map.insert("b", 2u8);
        map.insert("a", 1u8);
        assert_eq!(
            to_xml_string(&map).unwrap(),
            "<map><entry><key>a</key><value>1</value></entry>\
             <entry><key>b</key><value>2</value></entry></map>"
        );
    }

    #[test]
    fn test_object_fields_in_order() {
        struct Point;
        let point = Object::of::<Point>().field("Y", 2).field("x", 1);
        assert_eq!(point.element_name(), "point");
        assert_eq!(
            to_xml_string(&point).unwrap(),
            "<point><y>2</y><x>1</x></point>"
        );
    }

    #[test]
    fn test_nested_objects_are_indented() {
        let options = WriterOptions::default().indent("  ").unwrap();
        let mut xml = XmlStringWriter::with_options(&options);
        let inner = Object::new("geo.Location$Inner").field("lat", 1.25);
        let outer = Object::new("Place").field("where", inner).field("tags", Vec::<String>::new());
        XmlSerializer::new(&mut xml).serialize(&outer, "place").unwrap();
        xml.close().unwrap();
        assert_eq!(
            xml.as_str(),
            "<place>\n  <where>\n    <lat>1.25</lat>\n  </where>\n  <tags/>\n</place>"
        );
    }

    #[test]
    fn test_sequence_of_objects_uses_type_names() {
        let items = vec![Object::new("a::Item").field("n", 1)];
        assert_eq!(
            to_xml_string(&items).unwrap(),
            "<sequence><item><n>1</n></item></sequence>"
        );
    }

    #[test]
    fn test_qualified_field_names_are_stripped() {
        let mut xml = XmlStringWriter::new();
        XmlSerializer::new(&mut xml)
            .serialize("v", "com.example.Field")
            .unwrap();
        assert_eq!(xml.as_str(), "<field>v</field>");
    }
}
