use super::{ByteSink, SectionHandle, SectionKind, Serialize};
use crate::jvm::Error;

/// 1-based index into the constant pool
///
/// Indices are never checked against the pool: whoever builds the class is responsible for
/// handing out indices which point at constants of the right kind.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct ConstantIndex(pub u16);

impl From<u16> for ConstantIndex {
    fn from(index: u16) -> ConstantIndex {
        ConstantIndex(index)
    }
}

impl Serialize for ConstantIndex {
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error> {
        self.0.serialize(sink)
    }
}

/// Constants as in the constant pool
///
/// Numeric constants hold their raw bits (eg. `Float` is the IEEE 754 bit pattern), so they are
/// written out exactly as given.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    /// Constant UTF-8 encoded raw string value
    ///
    /// Despite the name, the encoding is not quite UTF-8 (the encoding of the
    /// null character `\u{0000}` and the encoding of supplementary characters
    /// is different).
    Utf8(String),

    /// Constant primitive of type `int`
    Integer(u32),

    /// Constant primitive of type `float` (IEEE 754 bits)
    Float(u32),

    /// Constant primitive of type `long`
    Long(u64),

    /// Constant primitive of type `double` (IEEE 754 bits)
    Double(u64),

    /// Class or an interface, pointing at the `Utf8` name
    Class(ConstantIndex),

    /// Constant object of type `java.lang.String`, pointing at the `Utf8` contents
    String(ConstantIndex),

    /// Field: class and name & type
    FieldRef(ConstantIndex, ConstantIndex),

    /// Method on a class: class and name & type
    MethodRef(ConstantIndex, ConstantIndex),

    /// Method on an interface: interface and name & type
    InterfaceMethodRef(ConstantIndex, ConstantIndex),

    /// Name and a type (eg. for a field or a method)
    NameAndType {
        name: ConstantIndex,
        descriptor: ConstantIndex,
    },

    /// Constant object of type `java.lang.invoke.MethodHandle`
    MethodHandle {
        handle_kind: HandleKind,

        /// `FieldRef`, `MethodRef` or `InterfaceMethodRef` depending on the kind
        member: ConstantIndex,
    },

    /// Method type
    MethodType { descriptor: ConstantIndex },

    /// Dynamically-computed call site
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        name_and_type: ConstantIndex,
    },
}

impl Constant {
    /// Tag byte which starts the serialized constant
    pub fn tag(&self) -> u8 {
        match self {
            Constant::Utf8(_) => 1,
            Constant::Integer(_) => 3,
            Constant::Float(_) => 4,
            Constant::Long(_) => 5,
            Constant::Double(_) => 6,
            Constant::Class(_) => 7,
            Constant::String(_) => 8,
            Constant::FieldRef(_, _) => 9,
            Constant::MethodRef(_, _) => 10,
            Constant::InterfaceMethodRef(_, _) => 11,
            Constant::NameAndType { .. } => 12,
            Constant::MethodHandle { .. } => 15,
            Constant::MethodType { .. } => 16,
            Constant::InvokeDynamic { .. } => 18,
        }
    }

    /// Number of constant pool slots the format reserves for this constant
    ///
    /// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double`.
    /// Quoting the JVM specification:
    ///
    /// > All 8-byte constants take up two entries in the constant_pool table of the class file. If a
    /// > CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the constant_pool table
    /// > at index n, then the next usable item in the pool is located at index n+2.
    pub fn width(&self) -> u32 {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

impl Serialize for Constant {
    fn serialize(&self, sink: &mut ByteSink) -> Result<(), Error> {
        match self {
            Constant::Utf8(string) => {
                let buffer: Vec<u8> = encode_modified_utf8(string);
                let len = u16::try_from(buffer.len()).map_err(|_| Error::OperandRange {
                    instruction: String::from("CONSTANT_Utf8"),
                    value: buffer.len() as i64,
                })?;
                self.tag().serialize(sink)?;
                len.serialize(sink)?;
                sink.emit_bytes(&buffer)?;
            }
            Constant::Integer(bits) | Constant::Float(bits) => {
                self.tag().serialize(sink)?;
                bits.serialize(sink)?;
            }
            Constant::Long(bits) | Constant::Double(bits) => {
                self.tag().serialize(sink)?;
                bits.serialize(sink)?;
            }
            Constant::Class(index) | Constant::String(index) => {
                self.tag().serialize(sink)?;
                index.serialize(sink)?;
            }
            Constant::FieldRef(class, name_and_type)
            | Constant::MethodRef(class, name_and_type)
            | Constant::InterfaceMethodRef(class, name_and_type) => {
                self.tag().serialize(sink)?;
                class.serialize(sink)?;
                name_and_type.serialize(sink)?;
            }
            Constant::NameAndType { name, descriptor } => {
                self.tag().serialize(sink)?;
                name.serialize(sink)?;
                descriptor.serialize(sink)?;
            }
            Constant::MethodHandle {
                handle_kind,
                member,
            } => {
                self.tag().serialize(sink)?;
                (*handle_kind as u8).serialize(sink)?;
                member.serialize(sink)?;
            }
            Constant::MethodType { descriptor } => {
                self.tag().serialize(sink)?;
                descriptor.serialize(sink)?;
            }
            Constant::InvokeDynamic {
                bootstrap_method,
                name_and_type,
            } => {
                self.tag().serialize(sink)?;
                bootstrap_method.serialize(sink)?;
                name_and_type.serialize(sink)?;
            }
        };
        Ok(())
    }
}

/// Kind of method handle
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-5.html#jvms-5.4.3.5
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum HandleKind {
    GetField = 1,
    GetStatic = 2,
    PutField = 3,
    PutStatic = 4,
    InvokeVirtual = 5,
    InvokeStatic = 6,
    InvokeSpecial = 7,
    NewInvokeSpecial = 8,
    InvokeInterface = 9,
}

/// Class file constants pool builder
///
/// Constants are emitted straight into the sink as they are added, and handed consecutive indices
/// starting from 1. There is no deduplication: adding the same constant twice produces two
/// entries.
#[derive(Debug)]
pub struct ConstantPoolBuilder {
    /// Pending `constant_pool_count` (the tally is the next index to hand out)
    count: SectionHandle,

    /// Whether `Long`/`Double` consume two indices
    wide_constants_take_two_slots: bool,
}

impl ConstantPoolBuilder {
    /// Reserve the constant pool count and start the pool
    pub fn start(
        sink: &mut ByteSink,
        wide_constants_take_two_slots: bool,
    ) -> Result<ConstantPoolBuilder, Error> {
        let count = sink.begin_section(SectionKind::Count)?.starting_at(1);
        Ok(ConstantPoolBuilder {
            count,
            wide_constants_take_two_slots,
        })
    }

    /// Index the next added constant will get
    pub fn next_index(&self) -> ConstantIndex {
        ConstantIndex(self.count.tally() as u16)
    }

    /// Append a constant to the pool
    ///
    /// Either the whole constant is emitted and an index is returned, or nothing is emitted and
    /// the index is not consumed.
    pub fn add(&mut self, sink: &mut ByteSink, constant: &Constant) -> Result<ConstantIndex, Error> {
        let mut scratch = ByteSink::unbounded();
        constant.serialize(&mut scratch)?;

        let slots = if self.wide_constants_take_two_slots {
            constant.width()
        } else {
            1
        };
        self.count.tally_after(slots)?;
        sink.emit_bytes(scratch.as_bytes())?;
        let index = self.count.record_entries(slots)?;
        log::trace!("Constant #{}: {:?}", index, constant);
        Ok(ConstantIndex(index as u16))
    }

    /// Patch the constant pool count, returning it (one more than the last index)
    pub fn end(self, sink: &mut ByteSink) -> Result<u16, Error> {
        let count = sink.end_section(self.count)? as u16;
        log::debug!("Constant pool closed with count {}", count);
        Ok(count)
    }
}

/// Modified UTF-8 format used in class files.
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u0000` is encoded in 2-byte format rather than 1-byte, so that the encoded
/// >    strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn encode_modified_utf8(string: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = Vec::with_capacity(string.len());
    for c in string.chars() {
        let len: usize = if c == '\u{0000}' { 2 } else { c.len_utf8() };
        let code: u32 = c as u32;

        match len {
            1 => buffer.push(code as u8),
            2 => {
                buffer.push((code >> 6 & 0x1F) as u8 | 0b1100_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
            3 => {
                buffer.push((code >> 12 & 0x0F) as u8 | 0b1110_0000);
                buffer.push((code >> 6 & 0x3F) as u8 | 0b1000_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }

            // Supplementary characters become a surrogate pair, each encoded in 3 bytes
            _ => {
                buffer.push(0b1110_1101);
                buffer.push(((code >> 16 & 0x0F) as u8).wrapping_sub(1) & 0x0F | 0b1010_0000);
                buffer.push((code >> 10 & 0x3F) as u8 | 0b1000_0000);

                buffer.push(0b1110_1101);
                buffer.push(((code >> 6 & 0x0F) as u8) | 0b1011_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
        }
    }
    buffer
}


#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, ByteOrder};

    fn pool_count(sink: &ByteSink) -> u16 {
        BigEndian::read_u16(&sink.as_bytes()[0..2])
    }

    #[test]
    fn indices_are_sequential_from_one() {
        let mut sink = ByteSink::default();
        let mut pool = ConstantPoolBuilder::start(&mut sink, false).unwrap();
        let constants = vec![
            Constant::Utf8(String::from("Foo")),
            Constant::Class(ConstantIndex(1)),
            Constant::Long(1),
            Constant::Double(2.5f64.to_bits()),
            Constant::Integer(7),
        ];
        for (i, constant) in constants.iter().enumerate() {
            assert_eq!(pool.next_index(), ConstantIndex(i as u16 + 1));
            assert_eq!(
                pool.add(&mut sink, constant).unwrap(),
                ConstantIndex(i as u16 + 1)
            );
        }
        assert_eq!(pool.end(&mut sink).unwrap(), 6);
        assert_eq!(pool_count(&sink), 6);
    }

    #[test]
    fn wide_constants_can_take_two_slots() {
        let mut sink = ByteSink::default();
        let mut pool = ConstantPoolBuilder::start(&mut sink, true).unwrap();
        assert_eq!(pool.add(&mut sink, &Constant::Long(1)).unwrap(), ConstantIndex(1));
        assert_eq!(pool.add(&mut sink, &Constant::Double(0)).unwrap(), ConstantIndex(3));
        assert_eq!(pool.add(&mut sink, &Constant::Float(0)).unwrap(), ConstantIndex(5));
        assert_eq!(pool.end(&mut sink).unwrap(), 6);
    }

    #[test]
    fn entry_layouts() {
        let mut sink = ByteSink::default();
        let mut pool = ConstantPoolBuilder::start(&mut sink, false).unwrap();
        let entries = vec![
            (Constant::Utf8(String::from("()V")), vec![1, 0, 3, b'(', b')', b'V']),
            (Constant::Integer(0xDEAD_BEEF), vec![3, 0xDE, 0xAD, 0xBE, 0xEF]),
            (Constant::Float(1.0f32.to_bits()), vec![4, 0x3F, 0x80, 0, 0]),
            (Constant::Long(0x0102_0304_0506_0708), vec![5, 1, 2, 3, 4, 5, 6, 7, 8]),
            (Constant::Double(0), vec![6, 0, 0, 0, 0, 0, 0, 0, 0]),
            (Constant::Class(ConstantIndex(0x0102)), vec![7, 1, 2]),
            (Constant::String(ConstantIndex(13)), vec![8, 0, 13]),
            (
                Constant::FieldRef(ConstantIndex(15), ConstantIndex(18)),
                vec![9, 0, 15, 0, 18],
            ),
            (
                Constant::MethodRef(ConstantIndex(9), ConstantIndex(10)),
                vec![10, 0, 9, 0, 10],
            ),
            (
                Constant::InterfaceMethodRef(ConstantIndex(1), ConstantIndex(2)),
                vec![11, 0, 1, 0, 2],
            ),
            (
                Constant::NameAndType {
                    name: ConstantIndex(6),
                    descriptor: ConstantIndex(4),
                },
                vec![12, 0, 6, 0, 4],
            ),
            (
                Constant::MethodHandle {
                    handle_kind: HandleKind::InvokeStatic,
                    member: ConstantIndex(3),
                },
                vec![15, 6, 0, 3],
            ),
            (
                Constant::MethodType {
                    descriptor: ConstantIndex(4),
                },
                vec![16, 0, 4],
            ),
            (
                Constant::InvokeDynamic {
                    bootstrap_method: 0,
                    name_and_type: ConstantIndex(11),
                },
                vec![18, 0, 0, 0, 11],
            ),
        ];
        for (constant, expected) in entries {
            let before = sink.position();
            pool.add(&mut sink, &constant).unwrap();
            assert_eq!(&sink.as_bytes()[before..], &expected[..], "{:?}", constant);
        }
        pool.end(&mut sink).unwrap();
    }

    #[test]
    fn oversized_utf8_is_rejected_without_consuming_an_index() {
        let mut sink = ByteSink::new(70_000);
        let mut pool = ConstantPoolBuilder::start(&mut sink, false).unwrap();
        let huge = Constant::Utf8("x".repeat(65536));
        assert!(matches!(
            pool.add(&mut sink, &huge),
            Err(Error::OperandRange { value: 65536, .. })
        ));
        assert_eq!(sink.position(), 2);
        assert_eq!(pool.next_index(), ConstantIndex(1));

        let largest = Constant::Utf8("x".repeat(65535));
        assert_eq!(pool.add(&mut sink, &largest).unwrap(), ConstantIndex(1));
        assert_eq!(&sink.as_bytes()[2..5], &[1, 0xFF, 0xFF]);
        assert_eq!(sink.position(), 2 + 3 + 65535);
    }

    #[test]
    fn full_sink_does_not_consume_an_index_after_partial_write() {
        let mut sink = ByteSink::new(6);
        let mut pool = ConstantPoolBuilder::start(&mut sink, false).unwrap();
        assert!(matches!(
            pool.add(&mut sink, &Constant::Integer(1)),
            Err(Error::BufferCapacityExceeded { .. })
        ));
        assert_eq!(sink.position(), 2);
        assert_eq!(pool.next_index(), ConstantIndex(1));
    }
}
