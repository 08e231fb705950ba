//! toi-mir — the bytecode compiler and the serialized program format
//! (spec §4.F, §4.H, §6).
//!
//! This sits between `toi-par`'s syntax tree and `toi-runtime`'s stack VM:
//! [`compile`] lowers a [`toi_par::Block`] into a [`CompiledProgram`], and
//! [`write_program`]/[`read_program`] persist that program to the
//! line-oriented text format an external tool could also produce or consume.

pub mod compiler;
pub mod opcode;
pub mod program;
pub mod serialize;

pub use compiler::{compile, CompileError, CompileResult};
pub use opcode::{BinaryOp, Op, MAX_ARITY, MAX_CONSTANTS, MAX_FIELDS, MAX_JUMP};
pub use program::{CompiledFunction, CompiledProgram, CompiledType, Constant};
pub use serialize::{read_program, write_program, SerializeError};
