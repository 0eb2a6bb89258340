use super::{ByteSink, ConstantIndex, SectionHandle, SectionKind, Serialize};
use crate::jvm::code::CodeBuilder;
use crate::jvm::Error;

/// Attribute with an opaque payload
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// `Utf8` constant holding the name of the attribute
    pub name_index: ConstantIndex,

    /// Payload (serialized with a `u4` length prefix)
    pub info: Vec<u8>,
}

impl Serialize for Attribute {
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error> {
        let length = u32::try_from(self.info.len()).map_err(|_| Error::SectionOverflow {
            kind: SectionKind::Length,
            value: self.info.len() as u64,
        })?;
        self.name_index.serialize(sink)?;
        length.serialize(sink)?;
        sink.emit_bytes(&self.info)
    }
}

/// Entry in the exception table of a `Code` attribute
///
/// All `pc` values are offsets from the start of the code array (see `CodeBuilder::label_offset`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,

    /// `Class` constant of the caught exception, or `ConstantIndex(0)` to catch everything
    pub catch_type: ConstantIndex,
}

impl Serialize for ExceptionHandler {
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error> {
        self.start_pc.serialize(sink)?;
        self.end_pc.serialize(sink)?;
        self.handler_pc.serialize(sink)?;
        self.catch_type.serialize(sink)
    }
}

/// Attribute whose body is still being emitted
#[derive(Debug)]
enum OpenAttribute {
    /// Started with `begin_raw`, length pending
    Raw(SectionHandle),

    /// Started with `begin_code`
    Code(CodeBuilder),
}

/// Count-prefixed list of attributes, as found on classes, fields, and methods
///
/// At most one attribute is open at a time. The list can only be ended once that attribute is
/// closed.
#[derive(Debug)]
pub struct AttributeList {
    count: SectionHandle,
    open: Option<OpenAttribute>,
}

impl AttributeList {
    /// Reserve the `attributes_count`
    pub fn start(sink: &mut ByteSink) -> Result<AttributeList, Error> {
        Ok(AttributeList {
            count: sink.begin_section(SectionKind::Count)?,
            open: None,
        })
    }

    /// Whether no attribute is currently open
    pub fn is_idle(&self) -> bool {
        self.open.is_none()
    }

    /// Description of what the list is in the middle of, for protocol errors
    pub fn describe(&self) -> &'static str {
        match self.open {
            None => "between attributes",
            Some(OpenAttribute::Raw(_)) => "inside an attribute",
            Some(OpenAttribute::Code(_)) => "inside a Code attribute",
        }
    }

    fn require_idle(&self, operation: &'static str) -> Result<(), Error> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(Error::ProtocolState {
                operation,
                state: self.describe(),
            })
        }
    }

    /// Emit a complete attribute
    pub fn attribute(&mut self, sink: &mut ByteSink, attribute: &Attribute) -> Result<(), Error> {
        self.require_idle("attribute")?;
        let mut scratch = ByteSink::unbounded();
        attribute.serialize(&mut scratch)?;
        self.count.record_entries(1)?;
        sink.emit_bytes(scratch.as_bytes())
    }

    /// Start an attribute whose payload is written piecewise with [`AttributeList::write_raw`]
    pub fn begin_raw(&mut self, sink: &mut ByteSink, name: ConstantIndex) -> Result<(), Error> {
        self.require_idle("attribute_start")?;
        self.count.record_entries(1)?;
        name.serialize(sink)?;
        self.open = Some(OpenAttribute::Raw(sink.begin_section(SectionKind::Length)?));
        Ok(())
    }

    /// Append payload bytes to the open raw attribute
    pub fn write_raw(&mut self, sink: &mut ByteSink, bytes: &[u8]) -> Result<(), Error> {
        match self.open {
            Some(OpenAttribute::Raw(_)) => sink.emit_bytes(bytes),
            _ => Err(Error::ProtocolState {
                operation: "attribute_write",
                state: self.describe(),
            }),
        }
    }

    /// Close the open raw attribute, returning its patched length
    pub fn end_raw(&mut self, sink: &mut ByteSink) -> Result<u32, Error> {
        match self.open.take() {
            Some(OpenAttribute::Raw(length)) => sink.end_section(length),
            other => {
                self.open = other;
                Err(Error::ProtocolState {
                    operation: "attribute_end",
                    state: self.describe(),
                })
            }
        }
    }

    /// Start a `Code` attribute
    pub fn begin_code(
        &mut self,
        sink: &mut ByteSink,
        name: ConstantIndex,
        max_stack: u16,
        max_locals: u16,
    ) -> Result<(), Error> {
        self.require_idle("code_attribute_start")?;
        self.count.record_entries(1)?;
        let code = CodeBuilder::start(sink, name, max_stack, max_locals)?;
        self.open = Some(OpenAttribute::Code(code));
        Ok(())
    }

    /// The open `Code` attribute, if there is one
    pub fn code_mut(&mut self) -> Option<&mut CodeBuilder> {
        match &mut self.open {
            Some(OpenAttribute::Code(code)) => Some(code),
            _ => None,
        }
    }

    /// Close the open `Code` attribute
    ///
    /// A jump to an unmarked label is reported before anything is emitted, and the attribute then
    /// stays open.
    pub fn end_code(
        &mut self,
        sink: &mut ByteSink,
        exception_table: &[ExceptionHandler],
        attributes: &[Attribute],
    ) -> Result<u32, Error> {
        match self.open.take() {
            Some(OpenAttribute::Code(code)) => {
                if let Err(err) = code.check_resolved() {
                    self.open = Some(OpenAttribute::Code(code));
                    return Err(err);
                }
                code.end(sink, exception_table, attributes)
            }
            other => {
                self.open = other;
                Err(Error::ProtocolState {
                    operation: "code_attribute_end",
                    state: self.describe(),
                })
            }
        }
    }

    /// Patch the attribute count, returning it
    pub fn end(self, sink: &mut ByteSink) -> Result<u16, Error> {
        self.require_idle("end of attributes")?;
        Ok(sink.end_section(self.count)? as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jvm::code::Instruction;

    #[test]
    fn whole_and_piecewise_attributes() {
        let mut sink = ByteSink::default();
        let mut list = AttributeList::start(&mut sink).unwrap();
        list.attribute(
            &mut sink,
            &Attribute {
                name_index: ConstantIndex(5),
                info: vec![1, 2, 3],
            },
        )
        .unwrap();
        list.begin_raw(&mut sink, ConstantIndex(6)).unwrap();
        list.write_raw(&mut sink, &[9, 9]).unwrap();
        list.write_raw(&mut sink, &[8]).unwrap();
        assert_eq!(list.end_raw(&mut sink).unwrap(), 3);
        assert_eq!(list.end(&mut sink).unwrap(), 2);

        assert_eq!(
            sink.as_bytes(),
            &[
                0, 2, // attributes_count
                0, 5, 0, 0, 0, 3, 1, 2, 3, // first
                0, 6, 0, 0, 0, 3, 9, 9, 8, // second
            ]
        );
    }

    #[test]
    fn one_open_attribute_at_a_time() {
        let mut sink = ByteSink::default();
        let mut list = AttributeList::start(&mut sink).unwrap();
        assert!(matches!(
            list.write_raw(&mut sink, &[1]),
            Err(Error::ProtocolState { .. })
        ));
        assert!(matches!(
            list.end_code(&mut sink, &[], &[]),
            Err(Error::ProtocolState { .. })
        ));

        list.begin_code(&mut sink, ConstantIndex(3), 0, 0).unwrap();
        let before = sink.position();
        assert!(matches!(
            list.begin_raw(&mut sink, ConstantIndex(1)),
            Err(Error::ProtocolState {
                state: "inside a Code attribute",
                ..
            })
        ));
        assert!(matches!(
            list.end_raw(&mut sink),
            Err(Error::ProtocolState { .. })
        ));
        assert_eq!(sink.position(), before);

        list.code_mut()
            .unwrap()
            .push(&mut sink, &Instruction::Return)
            .unwrap();
        list.end_code(&mut sink, &[], &[]).unwrap();
        assert!(list.is_idle());
        assert_eq!(list.end(&mut sink).unwrap(), 1);
    }

    #[test]
    fn unresolved_code_stays_open() {
        let mut sink = ByteSink::default();
        let mut list = AttributeList::start(&mut sink).unwrap();
        list.begin_code(&mut sink, ConstantIndex(3), 0, 0).unwrap();
        let code = list.code_mut().unwrap();
        let label = code.reserve_label();
        code.push(&mut sink, &Instruction::Goto(label.into())).unwrap();

        assert!(matches!(
            list.end_code(&mut sink, &[], &[]),
            Err(Error::UnresolvedLabel(_))
        ));
        let code = list.code_mut().unwrap();
        code.mark_label(&mut sink, label).unwrap();
        code.push(&mut sink, &Instruction::Return).unwrap();
        list.end_code(&mut sink, &[], &[]).unwrap();
    }
}
