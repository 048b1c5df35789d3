use super::{SaxHandler, SaxWriter};
use crate::error::MisuseError;
use crate::writer::{Output, Writer, WriterOptions, XmlStringWriter};

/// A value that knows how to write itself through any writer.
///
/// ```
/// use xmlquill::sax::{writable_to_string, XmlWritable};
/// use xmlquill::writer::{Output, Writer};
///
/// struct Point(i32, i32);
///
/// impl XmlWritable for Point {
///     fn to_xml<O: Output>(&self, xml: &mut Writer<O>) -> Result<(), O::Error> {
///         xml.open_element("point", false)?;
///         xml.attribute("x", &self.0.to_string())?;
///         xml.attribute("y", &self.1.to_string())?;
///         xml.close_element()
///     }
/// }
///
/// assert_eq!(writable_to_string(&Point(1, 2)).unwrap(), "<point x=\"1\" y=\"2\"/>");
/// ```
pub trait XmlWritable {
    /// Writes this value as XML.
    fn to_xml<O: Output>(&self, xml: &mut Writer<O>) -> Result<(), O::Error>;
}

impl<T: XmlWritable + ?Sized> XmlWritable for &T {
    fn to_xml<O: Output>(&self, xml: &mut Writer<O>) -> Result<(), O::Error> {
        (**self).to_xml(xml)
    }
}

/// Writes `value` into a namespace-aware in-memory writer and returns the
/// text.
pub fn writable_to_string<T: XmlWritable + ?Sized>(value: &T) -> Result<String, MisuseError> {
    let mut xml = XmlStringWriter::with_options(&WriterOptions::default().namespace_aware(true));
    value.to_xml(&mut xml)?;
    xml.close()?;
    Ok(xml.into_string())
}

/// Fires the events of a complete document holding `value` on `handler`:
/// `start_document`, the events of `value`, then `end_document`.
///
/// `end_document` is only fired when the value wrote a balanced document.
pub fn emit_events<T, H>(
    value: &T,
    handler: &mut H,
    options: &WriterOptions,
) -> Result<(), MisuseError>
where
    T: XmlWritable + ?Sized,
    H: SaxHandler + ?Sized,
{
    handler.start_document();
    let mut xml = SaxWriter::with_options(&mut *handler, options);
    value.to_xml(&mut xml)?;
    xml.close()?;
    drop(xml);
    handler.end_document();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sax::tests::RecordingHandler;
    use pretty_assertions::assert_eq;

    struct Note {
        to: &'static str,
        body: &'static str,
    }

    impl XmlWritable for Note {
        fn to_xml<O: Output>(&self, xml: &mut Writer<O>) -> Result<(), O::Error> {
            xml.open_element("note", true)?;
            xml.attribute("to", self.to)?;
            xml.element("body", self.body)?;
            xml.close_element()
        }
    }

    struct Unbalanced;

    impl XmlWritable for Unbalanced {
        fn to_xml<O: Output>(&self, xml: &mut Writer<O>) -> Result<(), O::Error> {
            xml.open_element("open", false)
        }
    }

    #[test]
    fn test_writable_to_string() {
        let note = Note {
            to: "Bob",
            body: "a < b",
        };
        assert_eq!(
            writable_to_string(&note).unwrap(),
            "<note to=\"Bob\"><body>a &lt; b</body></note>"
        );
    }

    #[test]
    fn test_emit_events() {
        let note = Note { to: "Al", body: "hi" };
        let mut handler = RecordingHandler::default();
        emit_events(&note, &mut handler, &WriterOptions::default()).unwrap();
        assert_eq!(
            handler.events,
            vec![
                "start_document",
                "start_element(note, None, None, [to=Al])",
                "start_element(body, None, None, [])",
                "characters(\"hi\")",
                "end_element(body)",
                "end_element(note)",
                "end_document",
            ]
        );
    }

    #[test]
    fn test_unbalanced_writable_fails() {
        let mut handler = RecordingHandler::default();
        let err = emit_events(&Unbalanced, &mut handler, &WriterOptions::default()).unwrap_err();
        assert_eq!(
            err,
            MisuseError::UnclosedElement {
                name: "open".to_string()
            }
        );
        assert!(!handler.events.contains(&"end_document".to_string()));
    }
}
