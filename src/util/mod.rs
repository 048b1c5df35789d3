//! Name helpers shared by the writer, the event adapter and the serializer.

pub mod qname;
