//! This module contains the AST of JVM bytecode along with its encoder. The representation is
//! slightly different from the usual presentation to make it more convenient to construct
//! bytecode:
//!
//!   - The "wide" instruction doesn't show up at all, but instead gets merged into the
//!     instructions it is allowed to modify (the encoder picks the shortest form)
//!
//!   - Families of instructions (like the `if*` branches, or the `invoke*` calls) get abstracted
//!     into one instruction with a field
//!
//!   - Branches take a [`BranchTarget`], which is either an absolute position in the output or a
//!     [`Label`] that may be marked later
//!

use super::{Fixup, JumpWidth, Label, LabelTable};
use crate::jvm::class_file::{ByteSink, ConstantIndex, Serialize};
use crate::jvm::Error;
use std::ops::Not;

/// JVM bytecode instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Nop,
    AConstNull,
    IConstM1,
    IConst0,
    IConst1,
    IConst2,
    IConst3,
    IConst4,
    IConst5,
    LConst0,
    LConst1,
    FConst0,
    FConst1,
    FConst2,
    DConst0,
    DConst1,
    BiPush(i8), // -1 to 5 get folded into `iconst_*`
    SiPush(i16),
    Ldc(ConstantIndex), // becomes `ldc_w` if the index doesn't fit in a byte
    LdcW(ConstantIndex),
    Ldc2W(ConstantIndex),
    ILoad(u16), // covers `iload`, `iload_{0,3}`, and `wide iload`
    LLoad(u16),
    FLoad(u16),
    DLoad(u16),
    ALoad(u16),
    IALoad,
    LALoad,
    FALoad,
    DALoad,
    AALoad,
    BALoad,
    CALoad,
    SALoad,
    IStore(u16), // covers `istore`, `istore_{0,3}`, and `wide istore`
    LStore(u16),
    FStore(u16),
    DStore(u16),
    AStore(u16),
    IAStore,
    LAStore,
    FAStore,
    DAStore,
    AAStore,
    BAStore,
    CAStore,
    SAStore,
    Pop,
    Pop2,
    Dup,
    DupX1,
    DupX2,
    Dup2,
    Dup2X1,
    Dup2X2,
    Swap,
    IAdd,
    LAdd,
    FAdd,
    DAdd,
    ISub,
    LSub,
    FSub,
    DSub,
    IMul,
    LMul,
    FMul,
    DMul,
    IDiv,
    LDiv,
    FDiv,
    DDiv,
    IRem,
    LRem,
    FRem,
    DRem,
    INeg,
    LNeg,
    FNeg,
    DNeg,
    ISh(ShiftType), // covers `ishr`, `ishl`, and `iushr`
    LSh(ShiftType), // covers `lshr`, `lshl`, and `lushr`
    IAnd,
    LAnd,
    IOr,
    LOr,
    IXor,
    LXor,
    IInc(u16, i16), // covers `iinc` and `wide iinc`
    I2L,
    I2F,
    I2D,
    L2I,
    L2F,
    L2D,
    F2I,
    F2L,
    F2D,
    D2I,
    D2L,
    D2F,
    I2B,
    I2C,
    I2S,
    LCmp,
    FCmp(CompareMode), // covers `fcmpl` and `fcmpg`
    DCmp(CompareMode), // covers `dcmpl` and `dcmpg`
    If(OrdComparison, BranchTarget), // covers `ifeq`, `ifne`, `iflt`, `ifge`, `ifgt`, `ifle`
    IfICmp(OrdComparison, BranchTarget), // covers `if_icmpeq`, `if_icmpne`, ... `if_icmple`
    IfACmp(EqComparison, BranchTarget), // covers `if_acmpeq`, `if_acmpne`
    Goto(BranchTarget), // becomes `goto_w` if the offset doesn't fit in 16 bits (or is unknown)
    Jsr(BranchTarget),  // becomes `jsr_w` if the offset doesn't fit in 16 bits (or is unknown)
    Ret(u16),           // covers `ret` and `wide ret`
    TableSwitch {
        /// Jump target if the argument is less than `low` or greater than
        /// `low + targets.len() - 1`
        default: BranchTarget,

        /// Value associated with the first jump target
        low: i32,

        /// Jump targets (must not be empty)
        targets: Vec<BranchTarget>,
    },
    LookupSwitch {
        /// Jump target if there is no corresponding key
        default: BranchTarget,

        /// Keys and their jump targets (emitted sorted by key)
        targets: Vec<(i32, BranchTarget)>,
    },
    IReturn,
    LReturn,
    FReturn,
    DReturn,
    AReturn,
    Return,
    GetStatic(ConstantIndex),
    PutStatic(ConstantIndex),
    GetField(ConstantIndex),
    PutField(ConstantIndex),
    Invoke(InvokeType, ConstantIndex),
    InvokeDynamic(ConstantIndex),
    New(ConstantIndex),
    NewArray(BaseType),
    ANewArray(ConstantIndex),
    ArrayLength,
    AThrow,
    CheckCast(ConstantIndex),
    InstanceOf(ConstantIndex),
    MonitorEnter,
    MonitorExit,
    MultiANewArray(ConstantIndex, u8),
    IfNull(EqComparison, BranchTarget), // covers `ifnull`, `ifnonnull`
    GotoW(BranchTarget),
    JsrW(BranchTarget),
    Breakpoint,
    ImpDep1,
    ImpDep2,
}

/// Target of a jump
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BranchTarget {
    /// Absolute position in the class file being assembled (eg. from `ClassAssembler::position`)
    Position(usize),

    /// Label reserved in the current `Code` attribute
    Label(Label),
}

impl From<Label> for BranchTarget {
    fn from(label: Label) -> BranchTarget {
        BranchTarget::Label(label)
    }
}

/// Where an instruction is about to be emitted
pub struct EncodeContext<'a> {
    /// Absolute position the opcode will be written to
    pub opcode_position: usize,

    /// Absolute position of the first byte of the code array
    pub code_start: usize,

    /// Labels of the current `Code` attribute
    pub labels: &'a LabelTable,
}

/// Fully encoded instruction, not yet emitted
pub struct Encoding {
    pub bytes: ByteSink,

    /// Forward jumps in `bytes` (positions assume `bytes` gets emitted at the opcode position)
    pub fixups: Vec<Fixup>,
}

impl Instruction {
    /// Encode the instruction in its shortest legal form
    ///
    /// Nothing is emitted into the class file here, so an operand which can't be encoded is
    /// reported before any byte is written.
    pub fn encode(&self, context: &EncodeContext<'_>) -> Result<Encoding, Error> {
        let mut encoder = Encoder {
            instruction: self,
            context,
            out: ByteSink::unbounded(),
            fixups: vec![],
        };
        encoder.encode()?;
        Ok(Encoding {
            bytes: encoder.out,
            fixups: encoder.fixups,
        })
    }
}

/// Jump target once labels have been looked up
enum Resolved {
    /// Offset relative to the opcode of the jump
    Offset(i64),

    /// Label which is not marked yet
    Forward(Label),
}

struct Encoder<'a> {
    instruction: &'a Instruction,
    context: &'a EncodeContext<'a>,
    out: ByteSink,
    fixups: Vec<Fixup>,
}

impl<'a> Encoder<'a> {
    fn operand_range(&self, value: i64) -> Error {
        Error::OperandRange {
            instruction: format!("{:?}", self.instruction),
            value,
        }
    }

    fn op(&mut self, opcode: u8) -> Result<(), Error> {
        opcode.serialize(&mut self.out)
    }

    fn op_with_index(&mut self, opcode: u8, index: ConstantIndex) -> Result<(), Error> {
        opcode.serialize(&mut self.out)?;
        index.serialize(&mut self.out)
    }

    /// The load/store instructions follow the same pattern:
    ///
    ///   - short form (0-3) have special bytes (except for `ret`, which has no short form)
    ///   - normal form (0-255) use `iload` plus a byte operand
    ///   - wide form (256-65535) use `wide iload` plus two byte operands
    fn load_or_store(
        &mut self,
        idx: u16,
        short_form_start: Option<u8>,
        normal_form: u8,
    ) -> Result<(), Error> {
        match (u8::try_from(idx), short_form_start) {
            (Ok(n @ 0..=3), Some(short_form_start)) => self.op(short_form_start + n),
            (Ok(n), _) => {
                self.op(normal_form)?;
                n.serialize(&mut self.out)
            }
            (Err(_), _) => {
                self.op(0xc4)?;
                self.op(normal_form)?;
                idx.serialize(&mut self.out)
            }
        }
    }

    fn resolve(&self, target: &BranchTarget) -> Result<Resolved, Error> {
        let target_position = match target {
            BranchTarget::Position(position) => *position,
            BranchTarget::Label(label) => match self.context.labels.position_of(*label)? {
                Some(position) => position,
                None => return Ok(Resolved::Forward(*label)),
            },
        };
        Ok(Resolved::Offset(
            target_position as i64 - self.context.opcode_position as i64,
        ))
    }

    /// Emit a relative jump offset operand of the given width
    fn jump_offset(&mut self, width: JumpWidth, resolved: Resolved) -> Result<(), Error> {
        match resolved {
            Resolved::Offset(offset) if !width.fits(offset) => Err(self.operand_range(offset)),
            Resolved::Offset(offset) => match width {
                JumpWidth::Narrow => (offset as i16).serialize(&mut self.out),
                JumpWidth::Wide => (offset as i32).serialize(&mut self.out),
            },
            Resolved::Forward(label) => {
                self.fixups.push(Fixup {
                    label,
                    opcode_position: self.context.opcode_position,
                    operand_position: self.context.opcode_position + self.out.position(),
                    width,
                    instruction: format!("{:?}", self.instruction),
                });
                match width {
                    JumpWidth::Narrow => 0u16.serialize(&mut self.out),
                    JumpWidth::Wide => 0u32.serialize(&mut self.out),
                }
            }
        }
    }

    /// Jump which only exists with a 16-bit offset
    fn jump(&mut self, opcode: u8, target: &BranchTarget) -> Result<(), Error> {
        let resolved = self.resolve(target)?;
        self.op(opcode)?;
        self.jump_offset(JumpWidth::Narrow, resolved)
    }

    /// Jump which only exists with a 32-bit offset
    fn wide_jump(&mut self, opcode: u8, target: &BranchTarget) -> Result<(), Error> {
        let resolved = self.resolve(target)?;
        self.op(opcode)?;
        self.jump_offset(JumpWidth::Wide, resolved)
    }

    /// Jump which switches to its wide variant if the offset doesn't fit in 16 bits
    ///
    /// Forward jumps to labels always get the wide form, since the distance isn't known yet.
    fn jump_or_wide(
        &mut self,
        narrow_opcode: u8,
        wide_opcode: u8,
        target: &BranchTarget,
    ) -> Result<(), Error> {
        match self.resolve(target)? {
            Resolved::Offset(offset) if JumpWidth::Narrow.fits(offset) => {
                self.op(narrow_opcode)?;
                self.jump_offset(JumpWidth::Narrow, Resolved::Offset(offset))
            }
            resolved => {
                self.op(wide_opcode)?;
                self.jump_offset(JumpWidth::Wide, resolved)
            }
        }
    }

    /// Switch opcode followed by the 0-3 bytes of padding that align `default` to a multiple of
    /// four bytes from the start of the code array
    fn switch_header(&mut self, opcode: u8, default: &BranchTarget) -> Result<(), Error> {
        let default = self.resolve(default)?;
        self.op(opcode)?;
        let relative = self.context.opcode_position - self.context.code_start + 1;
        let padding = (4 - relative % 4) % 4;
        for _ in 0..padding {
            0x00u8.serialize(&mut self.out)?;
        }
        self.jump_offset(JumpWidth::Wide, default)
    }

    fn encode(&mut self) -> Result<(), Error> {
        let instruction = self.instruction;
        match instruction {
            Instruction::Nop => self.op(0x00)?,
            Instruction::AConstNull => self.op(0x01)?,
            Instruction::IConstM1 => self.op(0x02)?,
            Instruction::IConst0 => self.op(0x03)?,
            Instruction::IConst1 => self.op(0x04)?,
            Instruction::IConst2 => self.op(0x05)?,
            Instruction::IConst3 => self.op(0x06)?,
            Instruction::IConst4 => self.op(0x07)?,
            Instruction::IConst5 => self.op(0x08)?,
            Instruction::LConst0 => self.op(0x09)?,
            Instruction::LConst1 => self.op(0x0a)?,
            Instruction::FConst0 => self.op(0x0b)?,
            Instruction::FConst1 => self.op(0x0c)?,
            Instruction::FConst2 => self.op(0x0d)?,
            Instruction::DConst0 => self.op(0x0e)?,
            Instruction::DConst1 => self.op(0x0f)?,
            Instruction::BiPush(b @ -1..=5) => self.op((0x03 + *b) as u8)?,
            Instruction::BiPush(b) => {
                self.op(0x10)?;
                b.serialize(&mut self.out)?;
            }
            Instruction::SiPush(s) => {
                self.op(0x11)?;
                s.serialize(&mut self.out)?;
            }
            Instruction::Ldc(ConstantIndex(idx)) => match u8::try_from(*idx) {
                Ok(b) => {
                    self.op(0x12)?;
                    b.serialize(&mut self.out)?;
                }
                Err(_) => self.op_with_index(0x13, ConstantIndex(*idx))?,
            },
            Instruction::LdcW(idx) => self.op_with_index(0x13, *idx)?,
            Instruction::Ldc2W(idx) => self.op_with_index(0x14, *idx)?,
            Instruction::ILoad(idx) => self.load_or_store(*idx, Some(0x1a), 0x15)?,
            Instruction::LLoad(idx) => self.load_or_store(*idx, Some(0x1e), 0x16)?,
            Instruction::FLoad(idx) => self.load_or_store(*idx, Some(0x22), 0x17)?,
            Instruction::DLoad(idx) => self.load_or_store(*idx, Some(0x26), 0x18)?,
            Instruction::ALoad(idx) => self.load_or_store(*idx, Some(0x2a), 0x19)?,
            Instruction::IALoad => self.op(0x2e)?,
            Instruction::LALoad => self.op(0x2f)?,
            Instruction::FALoad => self.op(0x30)?,
            Instruction::DALoad => self.op(0x31)?,
            Instruction::AALoad => self.op(0x32)?,
            Instruction::BALoad => self.op(0x33)?,
            Instruction::CALoad => self.op(0x34)?,
            Instruction::SALoad => self.op(0x35)?,
            Instruction::IStore(idx) => self.load_or_store(*idx, Some(0x3b), 0x36)?,
            Instruction::LStore(idx) => self.load_or_store(*idx, Some(0x3f), 0x37)?,
            Instruction::FStore(idx) => self.load_or_store(*idx, Some(0x43), 0x38)?,
            Instruction::DStore(idx) => self.load_or_store(*idx, Some(0x47), 0x39)?,
            Instruction::AStore(idx) => self.load_or_store(*idx, Some(0x4b), 0x3a)?,
            Instruction::IAStore => self.op(0x4f)?,
            Instruction::LAStore => self.op(0x50)?,
            Instruction::FAStore => self.op(0x51)?,
            Instruction::DAStore => self.op(0x52)?,
            Instruction::AAStore => self.op(0x53)?,
            Instruction::BAStore => self.op(0x54)?,
            Instruction::CAStore => self.op(0x55)?,
            Instruction::SAStore => self.op(0x56)?,
            Instruction::Pop => self.op(0x57)?,
            Instruction::Pop2 => self.op(0x58)?,
            Instruction::Dup => self.op(0x59)?,
            Instruction::DupX1 => self.op(0x5a)?,
            Instruction::DupX2 => self.op(0x5b)?,
            Instruction::Dup2 => self.op(0x5c)?,
            Instruction::Dup2X1 => self.op(0x5d)?,
            Instruction::Dup2X2 => self.op(0x5e)?,
            Instruction::Swap => self.op(0x5f)?,
            Instruction::IAdd => self.op(0x60)?,
            Instruction::LAdd => self.op(0x61)?,
            Instruction::FAdd => self.op(0x62)?,
            Instruction::DAdd => self.op(0x63)?,
            Instruction::ISub => self.op(0x64)?,
            Instruction::LSub => self.op(0x65)?,
            Instruction::FSub => self.op(0x66)?,
            Instruction::DSub => self.op(0x67)?,
            Instruction::IMul => self.op(0x68)?,
            Instruction::LMul => self.op(0x69)?,
            Instruction::FMul => self.op(0x6a)?,
            Instruction::DMul => self.op(0x6b)?,
            Instruction::IDiv => self.op(0x6c)?,
            Instruction::LDiv => self.op(0x6d)?,
            Instruction::FDiv => self.op(0x6e)?,
            Instruction::DDiv => self.op(0x6f)?,
            Instruction::IRem => self.op(0x70)?,
            Instruction::LRem => self.op(0x71)?,
            Instruction::FRem => self.op(0x72)?,
            Instruction::DRem => self.op(0x73)?,
            Instruction::INeg => self.op(0x74)?,
            Instruction::LNeg => self.op(0x75)?,
            Instruction::FNeg => self.op(0x76)?,
            Instruction::DNeg => self.op(0x77)?,
            Instruction::ISh(ShiftType::Left) => self.op(0x78)?,
            Instruction::LSh(ShiftType::Left) => self.op(0x79)?,
            Instruction::ISh(ShiftType::ArithmeticRight) => self.op(0x7a)?,
            Instruction::LSh(ShiftType::ArithmeticRight) => self.op(0x7b)?,
            Instruction::ISh(ShiftType::LogicalRight) => self.op(0x7c)?,
            Instruction::LSh(ShiftType::LogicalRight) => self.op(0x7d)?,
            Instruction::IAnd => self.op(0x7e)?,
            Instruction::LAnd => self.op(0x7f)?,
            Instruction::IOr => self.op(0x80)?,
            Instruction::LOr => self.op(0x81)?,
            Instruction::IXor => self.op(0x82)?,
            Instruction::LXor => self.op(0x83)?,
            Instruction::IInc(idx, diff) => match (u8::try_from(*idx), i8::try_from(*diff)) {
                (Ok(b), Ok(d)) => {
                    self.op(0x84)?;
                    b.serialize(&mut self.out)?;
                    d.serialize(&mut self.out)?;
                }
                _ => {
                    self.op(0xc4)?;
                    self.op(0x84)?;
                    idx.serialize(&mut self.out)?;
                    diff.serialize(&mut self.out)?;
                }
            },
            Instruction::I2L => self.op(0x85)?,
            Instruction::I2F => self.op(0x86)?,
            Instruction::I2D => self.op(0x87)?,
            Instruction::L2I => self.op(0x88)?,
            Instruction::L2F => self.op(0x89)?,
            Instruction::L2D => self.op(0x8a)?,
            Instruction::F2I => self.op(0x8b)?,
            Instruction::F2L => self.op(0x8c)?,
            Instruction::F2D => self.op(0x8d)?,
            Instruction::D2I => self.op(0x8e)?,
            Instruction::D2L => self.op(0x8f)?,
            Instruction::D2F => self.op(0x90)?,
            Instruction::I2B => self.op(0x91)?,
            Instruction::I2C => self.op(0x92)?,
            Instruction::I2S => self.op(0x93)?,
            Instruction::LCmp => self.op(0x94)?,
            Instruction::FCmp(CompareMode::L) => self.op(0x95)?,
            Instruction::FCmp(CompareMode::G) => self.op(0x96)?,
            Instruction::DCmp(CompareMode::L) => self.op(0x97)?,
            Instruction::DCmp(CompareMode::G) => self.op(0x98)?,
            Instruction::If(comp, target) => {
                let opcode: u8 = match comp {
                    OrdComparison::EQ => 0x99,
                    OrdComparison::NE => 0x9a,
                    OrdComparison::LT => 0x9b,
                    OrdComparison::GE => 0x9c,
                    OrdComparison::GT => 0x9d,
                    OrdComparison::LE => 0x9e,
                };
                self.jump(opcode, target)?;
            }
            Instruction::IfICmp(comp, target) => {
                let opcode: u8 = match comp {
                    OrdComparison::EQ => 0x9f,
                    OrdComparison::NE => 0xa0,
                    OrdComparison::LT => 0xa1,
                    OrdComparison::GE => 0xa2,
                    OrdComparison::GT => 0xa3,
                    OrdComparison::LE => 0xa4,
                };
                self.jump(opcode, target)?;
            }
            Instruction::IfACmp(comp, target) => {
                let opcode: u8 = match comp {
                    EqComparison::EQ => 0xa5,
                    EqComparison::NE => 0xa6,
                };
                self.jump(opcode, target)?;
            }
            Instruction::Goto(target) => self.jump_or_wide(0xa7, 0xc8, target)?,
            Instruction::Jsr(target) => self.jump_or_wide(0xa8, 0xc9, target)?,
            Instruction::Ret(idx) => self.load_or_store(*idx, None, 0xa9)?,
            Instruction::TableSwitch {
                default,
                low,
                targets,
            } => {
                let high = (*low as i64) + (targets.len() as i64) - 1;
                if targets.is_empty() || i32::try_from(high).is_err() {
                    return Err(self.operand_range(targets.len() as i64));
                }
                self.switch_header(0xaa, default)?;
                low.serialize(&mut self.out)?;
                (high as i32).serialize(&mut self.out)?;
                for target in targets {
                    let resolved = self.resolve(target)?;
                    self.jump_offset(JumpWidth::Wide, resolved)?;
                }
            }
            Instruction::LookupSwitch { default, targets } => {
                let npairs = i32::try_from(targets.len())
                    .map_err(|_| self.operand_range(targets.len() as i64))?;
                let mut sorted: Vec<&(i32, BranchTarget)> = targets.iter().collect();
                sorted.sort_by_key(|(key, _)| *key);

                self.switch_header(0xab, default)?;
                npairs.serialize(&mut self.out)?;
                for (key, target) in sorted {
                    key.serialize(&mut self.out)?;
                    let resolved = self.resolve(target)?;
                    self.jump_offset(JumpWidth::Wide, resolved)?;
                }
            }
            Instruction::IReturn => self.op(0xac)?,
            Instruction::LReturn => self.op(0xad)?,
            Instruction::FReturn => self.op(0xae)?,
            Instruction::DReturn => self.op(0xaf)?,
            Instruction::AReturn => self.op(0xb0)?,
            Instruction::Return => self.op(0xb1)?,
            Instruction::GetStatic(idx) => self.op_with_index(0xb2, *idx)?,
            Instruction::PutStatic(idx) => self.op_with_index(0xb3, *idx)?,
            Instruction::GetField(idx) => self.op_with_index(0xb4, *idx)?,
            Instruction::PutField(idx) => self.op_with_index(0xb5, *idx)?,
            Instruction::Invoke(InvokeType::Virtual, idx) => self.op_with_index(0xb6, *idx)?,
            Instruction::Invoke(InvokeType::Special, idx) => self.op_with_index(0xb7, *idx)?,
            Instruction::Invoke(InvokeType::Static, idx) => self.op_with_index(0xb8, *idx)?,
            Instruction::Invoke(InvokeType::Interface(count), idx) => {
                self.op_with_index(0xb9, *idx)?;
                count.serialize(&mut self.out)?;
                0u8.serialize(&mut self.out)?;
            }
            Instruction::InvokeDynamic(idx) => {
                self.op_with_index(0xba, *idx)?;
                0u16.serialize(&mut self.out)?;
            }
            Instruction::New(idx) => self.op_with_index(0xbb, *idx)?,
            Instruction::NewArray(base_type) => {
                self.op(0xbc)?;
                base_type.atype().serialize(&mut self.out)?;
            }
            Instruction::ANewArray(idx) => self.op_with_index(0xbd, *idx)?,
            Instruction::ArrayLength => self.op(0xbe)?,
            Instruction::AThrow => self.op(0xbf)?,
            Instruction::CheckCast(idx) => self.op_with_index(0xc0, *idx)?,
            Instruction::InstanceOf(idx) => self.op_with_index(0xc1, *idx)?,
            Instruction::MonitorEnter => self.op(0xc2)?,
            Instruction::MonitorExit => self.op(0xc3)?,
            Instruction::MultiANewArray(_, 0) => return Err(self.operand_range(0)),
            Instruction::MultiANewArray(idx, dimensions) => {
                self.op_with_index(0xc5, *idx)?;
                dimensions.serialize(&mut self.out)?;
            }
            Instruction::IfNull(comp, target) => {
                let opcode: u8 = match comp {
                    EqComparison::EQ => 0xc6,
                    EqComparison::NE => 0xc7,
                };
                self.jump(opcode, target)?;
            }
            Instruction::GotoW(target) => self.wide_jump(0xc8, target)?,
            Instruction::JsrW(target) => self.wide_jump(0xc9, target)?,
            Instruction::Breakpoint => self.op(0xca)?,
            Instruction::ImpDep1 => self.op(0xfe)?,
            Instruction::ImpDep2 => self.op(0xff)?,
        }
        Ok(())
    }
}

/// Possible bit shifts
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ShiftType {
    Left,
    LogicalRight,
    ArithmeticRight,
}

/// Comparison modes for floating point
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum CompareMode {
    /// -1 on NaN
    L,

    /// 1 on NaN
    G,
}

/// Binary comparison operators available for `int` branches
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum OrdComparison {
    EQ,
    GE,
    GT,
    LE,
    LT,
    NE,
}

impl Not for OrdComparison {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            OrdComparison::EQ => OrdComparison::NE,
            OrdComparison::GE => OrdComparison::LT,
            OrdComparison::GT => OrdComparison::LE,
            OrdComparison::LE => OrdComparison::GT,
            OrdComparison::LT => OrdComparison::GE,
            OrdComparison::NE => OrdComparison::EQ,
        }
    }
}

/// Equality/inequality comparison operators
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum EqComparison {
    EQ,
    NE,
}

impl Not for EqComparison {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            EqComparison::EQ => EqComparison::NE,
            EqComparison::NE => EqComparison::EQ,
        }
    }
}

/// Type of method to invoke
///
/// Note: `InvokeDynamic` is kept separate because the constant argument it expects is not to a
/// `Constant::MethodRef`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum InvokeType {
    Virtual,
    Special,
    Static,
    Interface(u8), // `count` is of total arguments, where `long`/`double` count for 2
}

/// Element types of primitive arrays created by `newarray`
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum BaseType {
    Boolean,
    Char,
    Float,
    Double,
    Byte,
    Short,
    Int,
    Long,
}

impl BaseType {
    /// Array type code used as the `newarray` operand
    pub fn atype(self) -> u8 {
        match self {
            BaseType::Boolean => 4,
            BaseType::Char => 5,
            BaseType::Float => 6,
            BaseType::Double => 7,
            BaseType::Byte => 8,
            BaseType::Short => 9,
            BaseType::Int => 10,
            BaseType::Long => 11,
        }
    }
}
