//! Bytecode representation and encoding
//!
//! ### Structure
//!
//! Method bodies live in [a `Code` attribute][0], whose code array is a flat sequence of encoded
//! instructions. [`Instruction`] covers every opcode (folding the `wide` prefix and the short
//! forms into the instructions they modify) and knows how to encode itself in its shortest legal
//! form.
//!
//! ### Code generation
//!
//! [`CodeBuilder`] emits the `Code` attribute from top to bottom. Jumps can target absolute
//! positions, or [`Label`]s which get patched once they are marked.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3

mod code_builder;
mod instructions;
mod label;

pub use code_builder::*;
pub use instructions::*;
pub use label::*;
