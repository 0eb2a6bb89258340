use super::{AttributeList, ByteSink, ConstantIndex, SectionHandle, SectionKind, Serialize};
use crate::jvm::{Error, FieldAccessFlags, MethodAccessFlags};
use std::marker::PhantomData;

/// Count-prefixed table of `u2` interface indices
#[derive(Debug)]
pub struct InterfaceTable {
    count: SectionHandle,
}

impl InterfaceTable {
    pub fn start(sink: &mut ByteSink) -> Result<InterfaceTable, Error> {
        Ok(InterfaceTable {
            count: sink.begin_section(SectionKind::Count)?,
        })
    }

    /// Add a `Class` constant to the list of implemented interfaces
    pub fn interface(&mut self, sink: &mut ByteSink, interface: ConstantIndex) -> Result<(), Error> {
        self.count.record_entries(1)?;
        interface.serialize(sink)
    }

    pub fn end(self, sink: &mut ByteSink) -> Result<u16, Error> {
        let count = sink.end_section(self.count)? as u16;
        log::debug!("Interfaces closed with count {}", count);
        Ok(count)
    }
}

/// Count-prefixed table of `field_info` or `method_info` rows
///
/// Every row is the access flags, name and descriptor, followed by an attribute list. Adding a row
/// hands back that row's [`AttributeList`], which must be ended before the next row starts.
#[derive(Debug)]
pub struct MemberTable<Flags> {
    count: SectionHandle,
    flags: PhantomData<Flags>,
}

/// Table of `field_info`
pub type FieldTable = MemberTable<FieldAccessFlags>;

/// Table of `method_info`
pub type MethodTable = MemberTable<MethodAccessFlags>;

impl<Flags: Serialize> MemberTable<Flags> {
    pub fn start(sink: &mut ByteSink) -> Result<MemberTable<Flags>, Error> {
        Ok(MemberTable {
            count: sink.begin_section(SectionKind::Count)?,
            flags: PhantomData,
        })
    }

    /// Start a new row, opening its attribute list
    pub fn member(
        &mut self,
        sink: &mut ByteSink,
        access_flags: Flags,
        name: ConstantIndex,
        descriptor: ConstantIndex,
    ) -> Result<AttributeList, Error> {
        self.count.record_entries(1)?;
        access_flags.serialize(sink)?;
        name.serialize(sink)?;
        descriptor.serialize(sink)?;
        AttributeList::start(sink)
    }

    /// Number of rows so far
    pub(crate) fn len(&self) -> u16 {
        self.count.tally() as u16
    }

    pub fn end(self, sink: &mut ByteSink) -> Result<u16, Error> {
        Ok(sink.end_section(self.count)? as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interfaces() {
        let mut sink = ByteSink::default();
        let mut table = InterfaceTable::start(&mut sink).unwrap();
        table.interface(&mut sink, ConstantIndex(4)).unwrap();
        table.interface(&mut sink, ConstantIndex(0x0102)).unwrap();
        assert_eq!(table.end(&mut sink).unwrap(), 2);
        assert_eq!(sink.as_bytes(), &[0, 2, 0, 4, 1, 2]);
    }

    #[test]
    fn member_rows_carry_attribute_lists() {
        let mut sink = ByteSink::default();
        let mut fields = FieldTable::start(&mut sink).unwrap();
        assert_eq!(fields.len(), 0);

        let attributes = fields
            .member(
                &mut sink,
                FieldAccessFlags::PRIVATE | FieldAccessFlags::FINAL,
                ConstantIndex(10),
                ConstantIndex(11),
            )
            .unwrap();
        assert_eq!(attributes.end(&mut sink).unwrap(), 0);

        let attributes = fields
            .member(
                &mut sink,
                FieldAccessFlags::STATIC,
                ConstantIndex(12),
                ConstantIndex(13),
            )
            .unwrap();
        attributes.end(&mut sink).unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields.end(&mut sink).unwrap(), 2);
        assert_eq!(
            sink.as_bytes(),
            &[
                0, 2, // fields_count
                0, 0x12, 0, 10, 0, 11, 0, 0, // private final
                0, 0x08, 0, 12, 0, 13, 0, 0, // static
            ]
        );
    }
}
