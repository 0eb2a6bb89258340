use super::{ByteSink, SectionKind};
use crate::jvm::Error;

/// Utility trait for serializing data inside class files
///
/// Java class files have some peculiarities that make it useful to define an extra trait (instead
/// of just using `serde`):
///
///   - tags are always `u8`
///   - when serializing a sequence, the length of the sequence is usually `u16`
///   - output goes to a [`ByteSink`] with a bounded capacity
///
pub trait Serialize {
    /// Serialize construct into the byte sink
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error>;
}

impl Serialize for u8 {
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error> {
        sink.emit_u1(*self)
    }
}

impl Serialize for u16 {
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error> {
        sink.emit_u2(*self)
    }
}

impl Serialize for u32 {
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error> {
        sink.emit_u4(*self)
    }
}

impl Serialize for u64 {
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error> {
        sink.emit_bytes(&self.to_be_bytes())
    }
}

impl Serialize for i8 {
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error> {
        sink.emit_u1(*self as u8)
    }
}

impl Serialize for i16 {
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error> {
        sink.emit_u2(*self as u16)
    }
}

impl Serialize for i32 {
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error> {
        sink.emit_u4(*self as u32)
    }
}

/// Size in `u16` is the first thing serialized
impl<A: Serialize> Serialize for [A] {
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error> {
        let len = u16::try_from(self.len()).map_err(|_| Error::SectionOverflow {
            kind: SectionKind::Count,
            value: self.len() as u64,
        })?;
        len.serialize(sink)?;
        for elem in self {
            elem.serialize(sink)?;
        }
        Ok(())
    }
}
