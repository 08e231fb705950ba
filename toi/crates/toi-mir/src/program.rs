//! The compiled program's data shape (spec §3, "Compiled program").

use indexmap::IndexMap;
use toi_util::symbol::Symbol;

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Str(String),
}

/// One user function: its declared parameters and out-variable, its own
/// variable table, and its own opcode buffer. Functions share the
/// program's constant pool (spec §4.F, "the outer and inner compilers
/// share the constant pool") but never share variable slots with each
/// other or with the top level.
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub params: Vec<Symbol>,
    pub out_param: Option<Symbol>,
    pub variables: Vec<Symbol>,
    pub code: Vec<u8>,
}

/// A declared type's field order, shared by `INSTANTIATE` and `FIELD_ACCESS`.
#[derive(Debug, Clone)]
pub struct CompiledType {
    pub fields: Vec<Symbol>,
}

/// Everything the stack VM needs to run a script, and everything the
/// serializer needs to write it out (spec §6). `functions`/`types` use
/// `IndexMap` so both iterate in declaration order, which the line-oriented
/// file format and the dual-engine determinism invariant both depend on.
#[derive(Debug, Clone, Default)]
pub struct CompiledProgram {
    pub constants: Vec<Constant>,
    pub functions: IndexMap<Symbol, CompiledFunction>,
    pub types: IndexMap<Symbol, CompiledType>,
    pub top_level_variables: Vec<Symbol>,
    pub top_level_code: Vec<u8>,
}
