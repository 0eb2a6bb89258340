use super::{
    AssemblerSettings, Attribute, AttributeList, ByteSink, Constant, ConstantIndex,
    ConstantPoolBuilder, ExceptionHandler, FieldTable, InterfaceTable, MethodTable, Serialize,
};
use crate::jvm::code::{CodeBuilder, Instruction, Label};
use crate::jvm::{ClassAccessFlags, Error, FieldAccessFlags, MethodAccessFlags};
use std::mem;

/// First four bytes of every class file
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Sequential assembler for one class file
///
/// Class files are emitted front to back, so the operations must be called in the order in which
/// the sections appear in the file:
///
///   1. [`header`](ClassAssembler::header)
///   2. constant pool: [`constant_pool_start`](ClassAssembler::constant_pool_start), any number
///      of `constant*` calls, [`constant_pool_end`](ClassAssembler::constant_pool_end)
///   3. [`class_info`](ClassAssembler::class_info)
///   4. interfaces: `interfaces_start`, `interface`..., `interfaces_end`
///   5. fields: `fields_start`, then per field `field_info`, attributes, `end_field_info`, and
///      finally `fields_end`
///   6. methods: `methods_start`, then per method `method_info`, usually a `Code` attribute
///      (`code_attribute_start`, instructions, `code_attribute_end`), `end_method_info`, and
///      finally `methods_end`
///   7. class attributes: `attributes_start`, attributes, `attributes_end`
///   8. [`finish`](ClassAssembler::finish)
///
/// An operation called out of order fails with [`Error::ProtocolState`] and leaves the assembler
/// as it was. Fatal errors (see [`Error::is_fatal`]) leave the assembler failed: every operation
/// except [`reset`](ClassAssembler::reset) is then rejected.
///
/// ```
/// use jclass::jvm::class_file::{ClassAssembler, ConstantIndex};
/// use jclass::jvm::ClassAccessFlags;
///
/// # fn main() -> Result<(), jclass::jvm::Error> {
/// let mut class = ClassAssembler::default();
/// class.header()?;
/// class.constant_pool_start()?;
/// let name = class.constant_utf8("Empty")?;
/// let object = class.constant_utf8("java/lang/Object")?;
/// let this_class = class.constant_class(name)?;
/// let super_class = class.constant_class(object)?;
/// class.constant_pool_end()?;
/// class.class_info(ClassAccessFlags::PUBLIC, this_class, super_class)?;
/// class.interfaces_start()?;
/// class.interfaces_end()?;
/// class.fields_start()?;
/// class.fields_end()?;
/// class.methods_start()?;
/// class.methods_end()?;
/// class.attributes_start()?;
/// class.attributes_end()?;
/// let bytes = class.finish()?;
/// assert_eq!(&bytes[0..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
/// assert_eq!(bytes.len(), 57);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ClassAssembler {
    settings: AssemblerSettings,
    sink: ByteSink,
    stage: Stage,
}

/// Where in the class file the assembler currently is
#[derive(Debug)]
enum Stage {
    Empty,
    Header,
    ConstantPool(ConstantPoolBuilder),
    ConstantPoolClosed,
    ClassInfo,
    Interfaces(InterfaceTable),
    InterfacesClosed,
    Fields {
        table: FieldTable,
        row: Option<AttributeList>,
    },
    FieldsClosed,
    Methods {
        table: MethodTable,
        row: Option<AttributeList>,
    },
    MethodsClosed,
    Attributes(AttributeList),
    Complete,
    Finished,
    Failed,
}

impl Stage {
    fn describe(&self) -> &'static str {
        match self {
            Stage::Empty => "nothing has been emitted",
            Stage::Header => "after the header",
            Stage::ConstantPool(_) => "inside the constant pool",
            Stage::ConstantPoolClosed => "after the constant pool",
            Stage::ClassInfo => "after the class info",
            Stage::Interfaces(_) => "inside the interfaces",
            Stage::InterfacesClosed => "after the interfaces",
            Stage::Fields { row: None, .. } => "between fields",
            Stage::Fields { row: Some(list), .. } if list.is_idle() => "inside a field",
            Stage::FieldsClosed => "after the fields",
            Stage::Methods { row: None, .. } => "between methods",
            Stage::Methods { row: Some(list), .. } if list.is_idle() => "inside a method",
            Stage::Fields { row: Some(list), .. } | Stage::Methods { row: Some(list), .. } => {
                list.describe()
            }
            Stage::MethodsClosed => "after the methods",
            Stage::Attributes(list) if list.is_idle() => "inside the class attributes",
            Stage::Attributes(list) => list.describe(),
            Stage::Complete => "the class is complete",
            Stage::Finished => "the class was already finished",
            Stage::Failed => "failed after a fatal error",
        }
    }
}

fn protocol_error(operation: &'static str, stage: &Stage) -> Error {
    Error::ProtocolState {
        operation,
        state: stage.describe(),
    }
}

/// Attribute list currently accepting attributes (that of a field, a method, or the class)
fn current_attributes(stage: &mut Stage) -> Option<&mut AttributeList> {
    match stage {
        Stage::Fields {
            row: Some(list), ..
        }
        | Stage::Methods {
            row: Some(list), ..
        }
        | Stage::Attributes(list) => Some(list),
        _ => None,
    }
}

/// Open `Code` attribute
fn current_code(stage: &mut Stage) -> Option<&mut CodeBuilder> {
    match stage {
        Stage::Methods {
            row: Some(list), ..
        } => list.code_mut(),
        _ => None,
    }
}

/// Close the attribute list of a field or method row, if none of its attributes is still open
fn end_row(
    row: &mut Option<AttributeList>,
    sink: &mut ByteSink,
    operation: &'static str,
    outside: &'static str,
) -> Result<u16, Error> {
    match row.take() {
        Some(list) if list.is_idle() => list.end(sink),
        Some(list) => {
            let err = Error::ProtocolState {
                operation,
                state: list.describe(),
            };
            *row = Some(list);
            Err(err)
        }
        None => Err(Error::ProtocolState {
            operation,
            state: outside,
        }),
    }
}

impl Default for ClassAssembler {
    fn default() -> ClassAssembler {
        ClassAssembler::new(AssemblerSettings::default())
    }
}

impl ClassAssembler {
    pub fn new(settings: AssemblerSettings) -> ClassAssembler {
        ClassAssembler {
            sink: ByteSink::new(settings.capacity),
            settings,
            stage: Stage::Empty,
        }
    }

    pub fn settings(&self) -> &AssemblerSettings {
        &self.settings
    }

    /// Current position in the output (the absolute position the next byte is written to)
    ///
    /// Positions are what [`BranchTarget::Position`](crate::jvm::code::BranchTarget::Position)
    /// expects.
    pub fn position(&self) -> usize {
        self.sink.position()
    }

    /// Bytes emitted so far (counts and lengths of open sections are not patched yet)
    pub fn as_bytes(&self) -> &[u8] {
        self.sink.as_bytes()
    }

    /// Discard everything so that a new class can be assembled
    pub fn reset(&mut self) {
        self.sink.clear();
        self.stage = Stage::Empty;
    }

    fn take_stage(&mut self) -> Stage {
        mem::replace(&mut self.stage, Stage::Failed)
    }

    /// Put back a stage taken with `take_stage` and report the operation as out of order
    fn reject<T>(&mut self, operation: &'static str, stage: Stage) -> Result<T, Error> {
        let err = protocol_error(operation, &stage);
        self.stage = stage;
        Err(err)
    }

    /// Fatal errors move the assembler to the failed stage
    fn guard<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(err) = &result {
            if err.is_fatal() {
                log::debug!("Class assembler failed: {}", err);
                self.stage = Stage::Failed;
            }
        }
        result
    }

    /// Emit the magic number and version
    pub fn header(&mut self) -> Result<(), Error> {
        match self.take_stage() {
            Stage::Empty => {
                MAGIC.serialize(&mut self.sink)?;
                self.settings.version.serialize(&mut self.sink)?;
                self.stage = Stage::Header;
                Ok(())
            }
            other => self.reject("header", other),
        }
    }

    pub fn constant_pool_start(&mut self) -> Result<(), Error> {
        match self.take_stage() {
            Stage::Header => {
                let pool = ConstantPoolBuilder::start(
                    &mut self.sink,
                    self.settings.wide_constants_take_two_slots,
                )?;
                self.stage = Stage::ConstantPool(pool);
                Ok(())
            }
            other => self.reject("constant_pool_start", other),
        }
    }

    /// Append a constant to the pool, returning its index
    pub fn constant(&mut self, constant: Constant) -> Result<ConstantIndex, Error> {
        let result = match &mut self.stage {
            Stage::ConstantPool(pool) => pool.add(&mut self.sink, &constant),
            stage => Err(protocol_error("constant", stage)),
        };
        self.guard(result)
    }

    pub fn constant_utf8(&mut self, string: &str) -> Result<ConstantIndex, Error> {
        self.constant(Constant::Utf8(String::from(string)))
    }

    pub fn constant_integer(&mut self, integer: i32) -> Result<ConstantIndex, Error> {
        self.constant(Constant::Integer(integer as u32))
    }

    pub fn constant_float(&mut self, float: f32) -> Result<ConstantIndex, Error> {
        self.constant(Constant::Float(float.to_bits()))
    }

    pub fn constant_long(&mut self, long: i64) -> Result<ConstantIndex, Error> {
        self.constant(Constant::Long(long as u64))
    }

    pub fn constant_double(&mut self, double: f64) -> Result<ConstantIndex, Error> {
        self.constant(Constant::Double(double.to_bits()))
    }

    pub fn constant_class(&mut self, name: ConstantIndex) -> Result<ConstantIndex, Error> {
        self.constant(Constant::Class(name))
    }

    pub fn constant_string(&mut self, utf8: ConstantIndex) -> Result<ConstantIndex, Error> {
        self.constant(Constant::String(utf8))
    }

    pub fn constant_fieldref(
        &mut self,
        class: ConstantIndex,
        name_and_type: ConstantIndex,
    ) -> Result<ConstantIndex, Error> {
        self.constant(Constant::FieldRef(class, name_and_type))
    }

    pub fn constant_methodref(
        &mut self,
        class: ConstantIndex,
        name_and_type: ConstantIndex,
    ) -> Result<ConstantIndex, Error> {
        self.constant(Constant::MethodRef(class, name_and_type))
    }

    pub fn constant_interface_methodref(
        &mut self,
        interface: ConstantIndex,
        name_and_type: ConstantIndex,
    ) -> Result<ConstantIndex, Error> {
        self.constant(Constant::InterfaceMethodRef(interface, name_and_type))
    }

    pub fn constant_name_and_type(
        &mut self,
        name: ConstantIndex,
        descriptor: ConstantIndex,
    ) -> Result<ConstantIndex, Error> {
        self.constant(Constant::NameAndType { name, descriptor })
    }

    /// Close the constant pool, returning `constant_pool_count`
    pub fn constant_pool_end(&mut self) -> Result<u16, Error> {
        match self.take_stage() {
            Stage::ConstantPool(pool) => {
                let count = pool.end(&mut self.sink)?;
                self.stage = Stage::ConstantPoolClosed;
                Ok(count)
            }
            other => self.reject("constant_pool_end", other),
        }
    }

    /// Emit the access flags, this class, and super class
    pub fn class_info(
        &mut self,
        access_flags: ClassAccessFlags,
        this_class: ConstantIndex,
        super_class: ConstantIndex,
    ) -> Result<(), Error> {
        match self.take_stage() {
            Stage::ConstantPoolClosed => {
                access_flags.serialize(&mut self.sink)?;
                this_class.serialize(&mut self.sink)?;
                super_class.serialize(&mut self.sink)?;
                self.stage = Stage::ClassInfo;
                Ok(())
            }
            other => self.reject("class_info", other),
        }
    }

    pub fn interfaces_start(&mut self) -> Result<(), Error> {
        match self.take_stage() {
            Stage::ClassInfo => {
                self.stage = Stage::Interfaces(InterfaceTable::start(&mut self.sink)?);
                Ok(())
            }
            other => self.reject("interfaces_start", other),
        }
    }

    pub fn interface(&mut self, interface: ConstantIndex) -> Result<(), Error> {
        let result = match &mut self.stage {
            Stage::Interfaces(table) => table.interface(&mut self.sink, interface),
            stage => Err(protocol_error("interface", stage)),
        };
        self.guard(result)
    }

    pub fn interfaces_end(&mut self) -> Result<u16, Error> {
        match self.take_stage() {
            Stage::Interfaces(table) => {
                let count = table.end(&mut self.sink)?;
                self.stage = Stage::InterfacesClosed;
                Ok(count)
            }
            other => self.reject("interfaces_end", other),
        }
    }

    pub fn fields_start(&mut self) -> Result<(), Error> {
        match self.take_stage() {
            Stage::InterfacesClosed => {
                self.stage = Stage::Fields {
                    table: FieldTable::start(&mut self.sink)?,
                    row: None,
                };
                Ok(())
            }
            other => self.reject("fields_start", other),
        }
    }

    /// Start a field, opening its attribute list (closed by [`ClassAssembler::end_field_info`])
    pub fn field_info(
        &mut self,
        access_flags: FieldAccessFlags,
        name: ConstantIndex,
        descriptor: ConstantIndex,
    ) -> Result<(), Error> {
        let result = match &mut self.stage {
            Stage::Fields {
                table,
                row: row @ None,
            } => table
                .member(&mut self.sink, access_flags, name, descriptor)
                .map(|attributes| {
                    log::trace!("Field #{} started", table.len() - 1);
                    *row = Some(attributes);
                }),
            stage => Err(protocol_error("field_info", stage)),
        };
        self.guard(result)
    }

    /// Close the attribute list of the current field, returning its attribute count
    pub fn end_field_info(&mut self) -> Result<u16, Error> {
        let result = match &mut self.stage {
            Stage::Fields { row, .. } => {
                end_row(row, &mut self.sink, "end_field_info", "between fields")
            }
            stage => Err(protocol_error("end_field_info", stage)),
        };
        self.guard(result)
    }

    pub fn fields_end(&mut self) -> Result<u16, Error> {
        match self.take_stage() {
            Stage::Fields { table, row: None } => {
                let count = table.end(&mut self.sink)?;
                log::debug!("Fields closed with count {}", count);
                self.stage = Stage::FieldsClosed;
                Ok(count)
            }
            other => self.reject("fields_end", other),
        }
    }

    pub fn methods_start(&mut self) -> Result<(), Error> {
        match self.take_stage() {
            Stage::FieldsClosed => {
                self.stage = Stage::Methods {
                    table: MethodTable::start(&mut self.sink)?,
                    row: None,
                };
                Ok(())
            }
            other => self.reject("methods_start", other),
        }
    }

    /// Start a method, opening its attribute list (closed by [`ClassAssembler::end_method_info`])
    pub fn method_info(
        &mut self,
        access_flags: MethodAccessFlags,
        name: ConstantIndex,
        descriptor: ConstantIndex,
    ) -> Result<(), Error> {
        let result = match &mut self.stage {
            Stage::Methods {
                table,
                row: row @ None,
            } => table
                .member(&mut self.sink, access_flags, name, descriptor)
                .map(|attributes| {
                    log::trace!("Method #{} started", table.len() - 1);
                    *row = Some(attributes);
                }),
            stage => Err(protocol_error("method_info", stage)),
        };
        self.guard(result)
    }

    /// Start the `Code` attribute of the current method
    ///
    /// `name` must be a `Utf8` constant holding `Code`.
    pub fn code_attribute_start(
        &mut self,
        name: ConstantIndex,
        max_stack: u16,
        max_locals: u16,
    ) -> Result<(), Error> {
        let result = match &mut self.stage {
            Stage::Methods {
                row: Some(attributes),
                ..
            } => attributes.begin_code(&mut self.sink, name, max_stack, max_locals),
            stage => Err(protocol_error("code_attribute_start", stage)),
        };
        self.guard(result)
    }

    /// Append an instruction to the open `Code` attribute
    pub fn instruction(&mut self, insn: Instruction) -> Result<(), Error> {
        let result = match current_code(&mut self.stage) {
            Some(code) => code.push(&mut self.sink, &insn),
            None => Err(protocol_error("instruction", &self.stage)),
        };
        self.guard(result)
    }

    /// Reserve a label in the open `Code` attribute
    pub fn reserve_label(&mut self) -> Result<Label, Error> {
        match current_code(&mut self.stage) {
            Some(code) => Ok(code.reserve_label()),
            None => Err(protocol_error("reserve_label", &self.stage)),
        }
    }

    /// Place a label at the current position in the open `Code` attribute
    pub fn mark_label(&mut self, label: Label) -> Result<(), Error> {
        let result = match current_code(&mut self.stage) {
            Some(code) => code.mark_label(&mut self.sink, label),
            None => Err(protocol_error("mark_label", &self.stage)),
        };
        self.guard(result)
    }

    /// Offset of a marked label from the start of the open code array
    pub fn label_offset(&mut self, label: Label) -> Result<u16, Error> {
        match current_code(&mut self.stage) {
            Some(code) => code.label_offset(label),
            None => Err(protocol_error("label_offset", &self.stage)),
        }
    }

    /// Close the open `Code` attribute with an empty exception table and no nested attributes
    pub fn code_attribute_end(&mut self) -> Result<u32, Error> {
        self.code_attribute_end_with(&[], &[])
    }

    /// Close the open `Code` attribute, returning its length
    pub fn code_attribute_end_with(
        &mut self,
        exception_table: &[ExceptionHandler],
        attributes: &[Attribute],
    ) -> Result<u32, Error> {
        let result = match &mut self.stage {
            Stage::Methods {
                row: Some(list), ..
            } => list.end_code(&mut self.sink, exception_table, attributes),
            stage => Err(protocol_error("code_attribute_end", stage)),
        };
        self.guard(result)
    }

    /// Close the attribute list of the current method, returning its attribute count
    pub fn end_method_info(&mut self) -> Result<u16, Error> {
        let result = match &mut self.stage {
            Stage::Methods { row, .. } => {
                end_row(row, &mut self.sink, "end_method_info", "between methods")
            }
            stage => Err(protocol_error("end_method_info", stage)),
        };
        self.guard(result)
    }

    pub fn methods_end(&mut self) -> Result<u16, Error> {
        match self.take_stage() {
            Stage::Methods { table, row: None } => {
                let count = table.end(&mut self.sink)?;
                log::debug!("Methods closed with count {}", count);
                self.stage = Stage::MethodsClosed;
                Ok(count)
            }
            other => self.reject("methods_end", other),
        }
    }

    pub fn attributes_start(&mut self) -> Result<(), Error> {
        match self.take_stage() {
            Stage::MethodsClosed => {
                self.stage = Stage::Attributes(AttributeList::start(&mut self.sink)?);
                Ok(())
            }
            other => self.reject("attributes_start", other),
        }
    }

    /// Emit a whole attribute into the current attribute list
    ///
    /// The current list is that of the class, or of the field or method being emitted.
    pub fn attribute(&mut self, attribute: &Attribute) -> Result<(), Error> {
        let result = match current_attributes(&mut self.stage) {
            Some(list) => list.attribute(&mut self.sink, attribute),
            None => Err(protocol_error("attribute", &self.stage)),
        };
        self.guard(result)
    }

    /// Start an attribute whose payload is provided by [`ClassAssembler::attribute_write`]
    pub fn attribute_start(&mut self, name: ConstantIndex) -> Result<(), Error> {
        let result = match current_attributes(&mut self.stage) {
            Some(list) => list.begin_raw(&mut self.sink, name),
            None => Err(protocol_error("attribute_start", &self.stage)),
        };
        self.guard(result)
    }

    pub fn attribute_write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let result = match current_attributes(&mut self.stage) {
            Some(list) => list.write_raw(&mut self.sink, bytes),
            None => Err(protocol_error("attribute_write", &self.stage)),
        };
        self.guard(result)
    }

    /// Close the attribute started with [`ClassAssembler::attribute_start`], returning its length
    pub fn attribute_end(&mut self) -> Result<u32, Error> {
        let result = match current_attributes(&mut self.stage) {
            Some(list) => list.end_raw(&mut self.sink),
            None => Err(protocol_error("attribute_end", &self.stage)),
        };
        self.guard(result)
    }

    pub fn attributes_end(&mut self) -> Result<u16, Error> {
        match self.take_stage() {
            Stage::Attributes(list) if list.is_idle() => {
                let count = list.end(&mut self.sink)?;
                log::debug!("Class attributes closed with count {}", count);
                self.stage = Stage::Complete;
                Ok(count)
            }
            other => self.reject("attributes_end", other),
        }
    }

    /// Take the assembled class file
    ///
    /// The assembler must be [`reset`](ClassAssembler::reset) before it is used again.
    pub fn finish(&mut self) -> Result<Vec<u8>, Error> {
        match self.take_stage() {
            Stage::Complete => {
                let sink = mem::replace(&mut self.sink, ByteSink::new(self.settings.capacity));
                let bytes = sink.into_bytes();
                log::debug!("Finished class file of {} bytes", bytes.len());
                self.stage = Stage::Finished;
                Ok(bytes)
            }
            other => self.reject("finish", other),
        }
    }
}
