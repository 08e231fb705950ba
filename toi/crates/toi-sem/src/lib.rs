//! toi-sem — the runtime value model, the builtin library, and the
//! tree-walking interpreter (spec §3 "Value"/"Environment", §4.D, §4.E).
//!
//! This sits below `toi-mir` and `toi-runtime`: the bytecode compiler reuses
//! [`value::Value`] for its constant pool, and the stack VM reuses
//! [`builtins`] so both engines call the exact same builtin implementations.

pub mod builtins;
pub mod env;
pub mod interp;
pub mod value;

pub use builtins::{CapturingHost, HostIo};
pub use interp::InterpError;
pub use value::{TypeDef, Value};

/// Runs a parsed program with the tree interpreter, per spec §4.E.
pub fn run(block: &toi_par::Block, host: &mut dyn HostIo) -> Result<(), InterpError> {
    interp::run(block, host)
}
