//! Assemble JVM classes
//!
//! ### Simple example
//!
//! Consider the following simple Java class:
//!
//! ```java,ignore,no_run
//! public class Point {
//!     public Point() {
//!         super();
//!     }
//! }
//! ```
//!
//! Generating an analogous class file means emitting every section in order. Constant pool
//! indices are handed back as constants get added, and it is up to the caller to pass them along
//! wherever the class file refers to a constant:
//!
//! ```
//! use jclass::jvm::class_file::ClassAssembler;
//! use jclass::jvm::code::{Instruction::*, InvokeType};
//! use jclass::jvm::*;
//!
//! # fn generate_class() -> Result<Vec<u8>, Error> {
//! let mut class = ClassAssembler::default();
//! class.header()?;
//!
//! // Constants
//! class.constant_pool_start()?;
//! let point_name = class.constant_utf8("me/alec/Point")?;
//! let object_name = class.constant_utf8("java/lang/Object")?;
//! let code = class.constant_utf8("Code")?;
//! let init = class.constant_utf8("<init>")?;
//! let init_type = class.constant_utf8("()V")?;
//! let point = class.constant_class(point_name)?;
//! let object = class.constant_class(object_name)?;
//! let init_nt = class.constant_name_and_type(init, init_type)?;
//! let object_init = class.constant_methodref(object, init_nt)?;
//! class.constant_pool_end()?;
//!
//! class.class_info(ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER, point, object)?;
//! class.interfaces_start()?;
//! class.interfaces_end()?;
//! class.fields_start()?;
//! class.fields_end()?;
//!
//! // The constructor
//! class.methods_start()?;
//! class.method_info(MethodAccessFlags::PUBLIC, init, init_type)?;
//! class.code_attribute_start(code, 1, 1)?;
//! class.instruction(ALoad(0))?;
//! class.instruction(Invoke(InvokeType::Special, object_init))?;
//! class.instruction(Return)?;
//! class.code_attribute_end()?;
//! class.end_method_info()?;
//! class.methods_end()?;
//!
//! class.attributes_start()?;
//! class.attributes_end()?;
//! class.finish()
//! # }
//! # assert_eq!(&generate_class().unwrap()[0..8], &[0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52]);
//! ```

mod access_flags;
pub mod class_file;
pub mod code;
mod errors;

pub use access_flags::*;
pub use errors::*;
