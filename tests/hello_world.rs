use byteorder::{BigEndian, ByteOrder};
use jclass::jvm::class_file::{AssemblerSettings, ClassAssembler, Constant, ConstantIndex};
use jclass::jvm::code::{Instruction, InvokeType};
use jclass::jvm::{ClassAccessFlags, Error, FieldAccessFlags, MethodAccessFlags};

/// `TestClass.class`, which prints "Hello World" from its `main`
const GOLDEN_HEX: &str = concat!(
    "cafebabe00000034001b01000954657374436c6173730100106a6176612f6c616e672f4f626a6563740100",
    "04436f6465010003282956010016285b4c6a6176612f6c616e672f537472696e673b29560100063c696e69",
    "743e0100046d61696e0700010700020c000600040c000700050a0009000a01000b48656c6c6f20576f726c",
    "640100106a6176612f6c616e672f53797374656d07000e0100036f75740100154c6a6176612f696f2f5072",
    "696e7453747265616d3b0c0010001109000f0012010015284c6a6176612f6c616e672f537472696e673b29",
    "560100077072696e746c6e0c0015001408000d0100136a6176612f696f2f5072696e7453747265616d0700",
    "180a00190016000100080009000000000002000100060004000100030000001100010001000000052ab700",
    "0cb10000000000090007000500010003000000150002000100000009b200131217b6001ab1000000000000",
);

fn decode_hex(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

/// Constants of the class, in pool order
fn constants() -> Vec<Constant> {
    let utf8 = |s: &str| Constant::Utf8(String::from(s));
    let idx = ConstantIndex;
    let nt = |name, descriptor| Constant::NameAndType {
        name: ConstantIndex(name),
        descriptor: ConstantIndex(descriptor),
    };
    vec![
        utf8("TestClass"),
        utf8("java/lang/Object"),
        utf8("Code"),
        utf8("()V"),
        utf8("([Ljava/lang/String;)V"),
        utf8("<init>"),
        utf8("main"),
        Constant::Class(idx(1)),
        Constant::Class(idx(2)),
        nt(6, 4),
        nt(7, 5),
        Constant::MethodRef(idx(9), idx(10)),
        utf8("Hello World"),
        utf8("java/lang/System"),
        Constant::Class(idx(14)),
        utf8("out"),
        utf8("Ljava/io/PrintStream;"),
        nt(16, 17),
        Constant::FieldRef(idx(15), idx(18)),
        utf8("(Ljava/lang/String;)V"),
        utf8("println"),
        nt(21, 20),
        Constant::String(idx(13)),
        utf8("java/io/PrintStream"),
        Constant::Class(idx(24)),
        Constant::MethodRef(idx(25), idx(22)),
    ]
}

fn constructor_code() -> Vec<Instruction> {
    vec![
        Instruction::ALoad(0),
        Instruction::Invoke(InvokeType::Special, ConstantIndex(12)),
        Instruction::Return,
    ]
}

fn main_code() -> Vec<Instruction> {
    vec![
        Instruction::GetStatic(ConstantIndex(19)),
        Instruction::Ldc(ConstantIndex(23)),
        Instruction::Invoke(InvokeType::Virtual, ConstantIndex(26)),
        Instruction::Return,
    ]
}

fn build(class: &mut ClassAssembler) -> Result<Vec<u8>, Error> {
    class.header()?;
    class.constant_pool_start()?;
    for (i, constant) in constants().into_iter().enumerate() {
        assert_eq!(class.constant(constant)?, ConstantIndex(i as u16 + 1));
    }
    class.constant_pool_end()?;

    class.class_info(ClassAccessFlags::PUBLIC, ConstantIndex(8), ConstantIndex(9))?;
    class.interfaces_start()?;
    class.interfaces_end()?;
    class.fields_start()?;
    class.fields_end()?;

    class.methods_start()?;
    class.method_info(MethodAccessFlags::PUBLIC, ConstantIndex(6), ConstantIndex(4))?;
    class.code_attribute_start(ConstantIndex(3), 1, 1)?;
    for insn in constructor_code() {
        class.instruction(insn)?;
    }
    class.code_attribute_end()?;
    class.end_method_info()?;

    class.method_info(
        MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        ConstantIndex(7),
        ConstantIndex(5),
    )?;
    class.code_attribute_start(ConstantIndex(3), 2, 1)?;
    for insn in main_code() {
        class.instruction(insn)?;
    }
    class.code_attribute_end()?;
    class.end_method_info()?;
    class.methods_end()?;

    class.attributes_start()?;
    class.attributes_end()?;
    class.finish()
}

#[test]
fn hello_world_matches_golden_bytes() {
    let bytes = build(&mut ClassAssembler::default()).unwrap();
    assert_eq!(bytes.len(), 344);
    assert_eq!(bytes, decode_hex(GOLDEN_HEX));
}

#[test]
fn hello_world_structure() {
    let bytes = build(&mut ClassAssembler::default()).unwrap();
    assert_eq!(&bytes[0..8], &[0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34]);

    let constants = constants();
    assert_eq!(
        BigEndian::read_u16(&bytes[8..10]) as usize,
        constants.len() + 1
    );

    // Size computed independently from what was emitted
    let pool_size: usize = constants
        .iter()
        .map(|constant| match constant {
            Constant::Utf8(s) => 3 + s.len(),
            Constant::Class(_) | Constant::String(_) => 3,
            _ => 5,
        })
        .sum();
    let method_size = |code: Vec<Instruction>| -> usize {
        let code_len: usize = code
            .iter()
            .map(|insn| match insn {
                Instruction::ALoad(0) | Instruction::Return => 1,
                Instruction::Ldc(_) => 2,
                _ => 3,
            })
            .sum();
        // row with its attribute count, attribute header, Code fields, code, empty tables
        8 + 6 + 8 + code_len + 4
    };
    let expected = 10 + pool_size + 6 + 2 + 2 + 2
        + method_size(constructor_code())
        + method_size(main_code())
        + 2;
    assert_eq!(bytes.len(), expected);
}

#[test]
fn repeated_builds_are_identical() {
    let first = build(&mut ClassAssembler::default()).unwrap();
    let second = build(&mut ClassAssembler::new(AssemblerSettings::default())).unwrap();
    assert_eq!(first, second);

    let mut reused = ClassAssembler::default();
    let third = build(&mut reused).unwrap();
    reused.reset();
    let fourth = build(&mut reused).unwrap();
    assert_eq!(first, third);
    assert_eq!(first, fourth);
}

#[test]
fn independent_assemblers_on_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| build(&mut ClassAssembler::default()).unwrap()))
        .collect();
    let golden = decode_hex(GOLDEN_HEX);
    for handle in handles {
        assert_eq!(handle.join().unwrap(), golden);
    }
}

#[test]
fn constant_after_pool_end_is_rejected() {
    let mut class = ClassAssembler::default();
    class.header().unwrap();
    class.constant_pool_start().unwrap();
    class.constant_utf8("A").unwrap();
    class.constant_utf8("B").unwrap();
    assert_eq!(class.constant_pool_end().unwrap(), 3);

    let before = class.as_bytes().to_vec();
    let err = class.constant_utf8("C").unwrap_err();
    assert!(matches!(err, Error::ProtocolState { operation: "constant", .. }));
    assert!(!err.is_fatal());
    assert_eq!(class.as_bytes(), &before[..]);
    assert_eq!(BigEndian::read_u16(&class.as_bytes()[8..10]), 3);
}

#[test]
fn entries_after_table_end_are_rejected() {
    let mut class = ClassAssembler::default();
    class.header().unwrap();
    class.constant_pool_start().unwrap();
    class.constant_pool_end().unwrap();
    class
        .class_info(ClassAccessFlags::PUBLIC, ConstantIndex(1), ConstantIndex(2))
        .unwrap();
    class.interfaces_start().unwrap();
    class.interfaces_end().unwrap();
    assert!(matches!(
        class.interface(ConstantIndex(3)),
        Err(Error::ProtocolState { .. })
    ));

    class.fields_start().unwrap();
    class
        .field_info(FieldAccessFlags::PRIVATE, ConstantIndex(4), ConstantIndex(5))
        .unwrap();
    class.end_field_info().unwrap();
    assert_eq!(class.fields_end().unwrap(), 1);
    let fields_count_at = class.position() - 10;
    assert!(matches!(
        class.field_info(FieldAccessFlags::PRIVATE, ConstantIndex(4), ConstantIndex(5)),
        Err(Error::ProtocolState { .. })
    ));

    class.methods_start().unwrap();
    assert_eq!(class.methods_end().unwrap(), 0);
    assert!(matches!(
        class.method_info(MethodAccessFlags::PUBLIC, ConstantIndex(6), ConstantIndex(7)),
        Err(Error::ProtocolState { .. })
    ));

    let bytes = class.as_bytes();
    assert_eq!(BigEndian::read_u16(&bytes[fields_count_at..]), 1);
    assert_eq!(BigEndian::read_u16(&bytes[bytes.len() - 2..]), 0);
}
