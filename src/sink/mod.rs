//! Append-only character sinks for the text writer.
//!
//! A sink's error type doubles as the error type of the writer driving it.
//! [`IoSink`] reports [`WriteError`], so I/O failures surface next to
//! misuse. The `String` sink reports [`MisuseError`] alone: writing to
//! memory cannot fail, and a writer over it has no I/O failure to observe.

use std::io;

use encoding_rs::{Encoding, UTF_8};

use crate::error::{MisuseError, WriteError};

/// An append-only character sink.
pub trait Sink {
    /// Error produced by the sink (and by writers using it).
    type Error: From<MisuseError>;

    /// Appends `s`.
    fn write_str(&mut self, s: &str) -> Result<(), Self::Error>;

    /// Appends a single character.
    fn write_char(&mut self, c: char) -> Result<(), Self::Error> {
        let mut buf = [0u8; 4];
        self.write_str(c.encode_utf8(&mut buf))
    }

    /// Flushes any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Sink for String {
    type Error = MisuseError;

    fn write_str(&mut self, s: &str) -> Result<(), MisuseError> {
        self.push_str(s);
        Ok(())
    }

    fn write_char(&mut self, c: char) -> Result<(), MisuseError> {
        self.push(c);
        Ok(())
    }
}

/// A sink encoding text into an [`io::Write`], UTF-8 by default.
///
/// Text reaching the sink has already been escaped for its encoding, so
/// encoding never loses characters. No buffering is added; wrap the writer
/// in an [`io::BufWriter`] for file or socket output.
#[derive(Debug)]
pub struct IoSink<W: io::Write> {
    inner: W,
    encoding: &'static Encoding,
}

impl<W: io::Write> IoSink<W> {
    /// Wraps `inner`, writing UTF-8.
    pub fn new(inner: W) -> Self {
        Self::with_encoding(inner, UTF_8)
    }

    /// Wraps `inner`, writing `encoding`.
    pub fn with_encoding(inner: W, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            encoding: encoding.output_encoding(),
        }
    }

    /// Returns a reference to the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> Sink for IoSink<W> {
    type Error = WriteError;

    fn write_str(&mut self, s: &str) -> Result<(), WriteError> {
        if self.encoding == UTF_8 {
            self.inner.write_all(s.as_bytes())?;
        } else {
            let (bytes, _, _) = self.encoding.encode(s);
            self.inner.write_all(&bytes)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), WriteError> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Broken;

    impl io::Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_string_sink_appends() {
        let mut out = String::new();
        out.write_str("<a").unwrap();
        Sink::write_char(&mut out, '>').unwrap();
        assert_eq!(out, "<a>");
    }

    #[test]
    fn test_io_sink_writes_utf8() {
        let mut sink = IoSink::new(Vec::new());
        sink.write_str("caf\u{e9}").unwrap();
        sink.write_char('!').unwrap();
        assert_eq!(sink.into_inner(), "caf\u{e9}!".as_bytes());
    }

    #[test]
    fn test_io_sink_encodes_legacy_output() {
        let mut sink = IoSink::with_encoding(Vec::new(), encoding_rs::WINDOWS_1252);
        sink.write_str("caf\u{e9}").unwrap();
        assert_eq!(sink.into_inner(), b"caf\xe9");
    }

    #[test]
    fn test_io_sink_propagates_failure() {
        let mut sink = IoSink::new(Broken);
        let err = sink.write_str("x").unwrap_err();
        assert!(matches!(err, WriteError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }
}
