use jclass::jvm::class_file::{AssemblerSettings, ClassAssembler};
use jclass::jvm::code::{Instruction::*, InvokeType};
use jclass::jvm::*;

use clap::{crate_version, value_parser, Arg, Command};
use std::fs;
use std::path::PathBuf;

fn main() -> Result<(), Error> {
    env_logger::init();

    let matches = Command::new("JVM class assembler")
        .version(crate_version!())
        .about("Assemble a \"Hello World\" class file")
        .arg(
            Arg::new("class")
                .long("class-name")
                .value_name("CLASS_NAME")
                .default_value("TestClass")
                .help("Binary name of the generated class (eg. `foo/bar/Baz`)"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Where to write the class file (defaults to `<simple name>.class`)"),
        )
        .arg(
            Arg::new("capacity")
                .long("capacity")
                .value_name("BYTES")
                .value_parser(value_parser!(usize))
                .help("Maximum size of the generated class file"),
        )
        .get_matches();

    let class_name: &str = matches
        .get_one::<String>("class")
        .map(String::as_str)
        .unwrap_or("TestClass");
    let output: PathBuf = match matches.get_one::<PathBuf>("output") {
        Some(output) => output.clone(),
        None => {
            let simple_name = class_name.rsplit('/').next().unwrap_or(class_name);
            PathBuf::from(format!("{}.class", simple_name))
        }
    };

    let mut settings = AssemblerSettings::default();
    if let Some(capacity) = matches.get_one::<usize>("capacity") {
        settings.capacity = *capacity;
    }

    log::info!("Assembling '{}'", class_name);
    let mut class = ClassAssembler::new(settings);
    let bytes = hello_world(&mut class, class_name)?;

    log::info!("Writing '{}' ({} bytes)", output.display(), bytes.len());
    fs::write(&output, &bytes).map_err(Error::IoError)?;

    Ok(())
}

/// Class with a default constructor and a `main` which prints "Hello World"
fn hello_world(class: &mut ClassAssembler, class_name: &str) -> Result<Vec<u8>, Error> {
    class.header()?;

    class.constant_pool_start()?;
    let this_name = class.constant_utf8(class_name)?;
    let object_name = class.constant_utf8("java/lang/Object")?;
    let code = class.constant_utf8("Code")?;
    let void_descriptor = class.constant_utf8("()V")?;
    let main_descriptor = class.constant_utf8("([Ljava/lang/String;)V")?;
    let init_name = class.constant_utf8("<init>")?;
    let main_name = class.constant_utf8("main")?;
    let this_class = class.constant_class(this_name)?;
    let object_class = class.constant_class(object_name)?;
    let init_nt = class.constant_name_and_type(init_name, void_descriptor)?;
    let _main_nt = class.constant_name_and_type(main_name, main_descriptor)?;
    let object_init = class.constant_methodref(object_class, init_nt)?;

    let message = class.constant_utf8("Hello World")?;
    let system_name = class.constant_utf8("java/lang/System")?;
    let system_class = class.constant_class(system_name)?;
    let out_name = class.constant_utf8("out")?;
    let print_stream_descriptor = class.constant_utf8("Ljava/io/PrintStream;")?;
    let out_nt = class.constant_name_and_type(out_name, print_stream_descriptor)?;
    let system_out = class.constant_fieldref(system_class, out_nt)?;

    let println_descriptor = class.constant_utf8("(Ljava/lang/String;)V")?;
    let println_name = class.constant_utf8("println")?;
    let println_nt = class.constant_name_and_type(println_name, println_descriptor)?;
    let message_string = class.constant_string(message)?;
    let print_stream_name = class.constant_utf8("java/io/PrintStream")?;
    let print_stream_class = class.constant_class(print_stream_name)?;
    let println = class.constant_methodref(print_stream_class, println_nt)?;
    class.constant_pool_end()?;

    class.class_info(ClassAccessFlags::PUBLIC, this_class, object_class)?;
    class.interfaces_start()?;
    class.interfaces_end()?;
    class.fields_start()?;
    class.fields_end()?;

    class.methods_start()?;

    class.method_info(MethodAccessFlags::PUBLIC, init_name, void_descriptor)?;
    class.code_attribute_start(code, 1, 1)?;
    class.instruction(ALoad(0))?;
    class.instruction(Invoke(InvokeType::Special, object_init))?;
    class.instruction(Return)?;
    class.code_attribute_end()?;
    class.end_method_info()?;

    class.method_info(
        MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        main_name,
        main_descriptor,
    )?;
    class.code_attribute_start(code, 2, 1)?;
    class.instruction(GetStatic(system_out))?;
    class.instruction(Ldc(message_string))?;
    class.instruction(Invoke(InvokeType::Virtual, println))?;
    class.instruction(Return)?;
    class.code_attribute_end()?;
    class.end_method_info()?;

    class.methods_end()?;

    class.attributes_start()?;
    class.attributes_end()?;
    class.finish()
}
