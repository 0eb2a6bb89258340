use super::{EncodeContext, Instruction, Label, LabelTable};
use crate::jvm::class_file::{
    Attribute, ByteSink, ConstantIndex, ExceptionHandler, SectionHandle, SectionKind, Serialize,
};
use crate::jvm::Error;

/// Builder for the body of one `Code` attribute
///
/// Instructions get encoded and emitted straight into the sink. The two lengths involved (the one
/// of the whole attribute and the one of the code array) are reserved up front and patched in
/// [`CodeBuilder::end`].
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3
#[derive(Debug)]
pub struct CodeBuilder {
    /// `attribute_length` of the `Code` attribute
    body: SectionHandle,

    /// `code_length`
    code: SectionHandle,

    labels: LabelTable,
}

impl CodeBuilder {
    /// Largest number of bytes in the code array of a method
    pub const MAX_CODE_LENGTH: usize = 65535;

    /// Emit the attribute name, `max_stack`, `max_locals` and reserve both lengths
    pub fn start(
        sink: &mut ByteSink,
        name: ConstantIndex,
        max_stack: u16,
        max_locals: u16,
    ) -> Result<CodeBuilder, Error> {
        name.serialize(sink)?;
        let body = sink.begin_section(SectionKind::Length)?;
        max_stack.serialize(sink)?;
        max_locals.serialize(sink)?;
        let code = sink.begin_section(SectionKind::Length)?;
        Ok(CodeBuilder {
            body,
            code,
            labels: LabelTable::default(),
        })
    }

    /// Absolute sink position of the first byte of the code array
    pub fn code_start(&self) -> usize {
        self.code.body_start()
    }

    /// Number of bytes in the code array so far
    pub fn code_len(&self, sink: &ByteSink) -> usize {
        sink.position() - self.code_start()
    }

    /// Encode and emit one instruction
    pub fn push(&mut self, sink: &mut ByteSink, insn: &Instruction) -> Result<(), Error> {
        let context = EncodeContext {
            opcode_position: sink.position(),
            code_start: self.code_start(),
            labels: &self.labels,
        };
        let encoding = insn.encode(&context)?;

        let new_len = self.code_len(sink) + encoding.bytes.position();
        if new_len > Self::MAX_CODE_LENGTH {
            return Err(Error::MethodCodeOverflow(new_len));
        }

        log::trace!("{:>5}: {:?}", self.code_len(sink), insn);
        sink.emit_bytes(encoding.bytes.as_bytes())?;
        self.labels.add_fixups(encoding.fixups);
        Ok(())
    }

    /// Reserve a fresh label, to be placed later with [`CodeBuilder::mark_label`]
    pub fn reserve_label(&mut self) -> Label {
        self.labels.fresh_label()
    }

    /// Place a label at the current position, patching the jumps already waiting on it
    pub fn mark_label(&mut self, sink: &mut ByteSink, label: Label) -> Result<(), Error> {
        self.labels.mark(sink, label, sink.position())
    }

    /// Offset of a marked label from the start of the code array
    ///
    /// This is the form exception table entries expect.
    pub fn label_offset(&self, label: Label) -> Result<u16, Error> {
        let position = self
            .labels
            .position_of(label)?
            .ok_or(Error::UnresolvedLabel(label))?;
        let offset = position - self.code_start();
        u16::try_from(offset).map_err(|_| Error::MethodCodeOverflow(offset))
    }

    /// Check that the attribute can be ended (no jump is still waiting on an unmarked label)
    pub fn check_resolved(&self) -> Result<(), Error> {
        match self.labels.first_unresolved() {
            Some(label) => Err(Error::UnresolvedLabel(label)),
            None => Ok(()),
        }
    }

    /// Close the code array, emit the exception table and nested attributes, and close the
    /// attribute
    ///
    /// Returns the patched `attribute_length`.
    pub fn end(
        self,
        sink: &mut ByteSink,
        exception_table: &[ExceptionHandler],
        attributes: &[Attribute],
    ) -> Result<u32, Error> {
        self.check_resolved()?;
        let code_len = self.code_len(sink);
        if code_len > Self::MAX_CODE_LENGTH {
            return Err(Error::MethodCodeOverflow(code_len));
        }

        sink.end_section(self.code)?;
        exception_table.serialize(sink)?;
        attributes.serialize(sink)?;
        let length = sink.end_section(self.body)?;
        log::debug!(
            "Code attribute closed: {} bytes of code, {} handlers, length {}",
            code_len,
            exception_table.len(),
            length
        );
        Ok(length)
    }
}
