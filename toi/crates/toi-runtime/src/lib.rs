//! toi-runtime — the stack VM (spec §4.G).
//!
//! Consumes the [`toi_mir::CompiledProgram`] the bytecode compiler produces
//! and executes it against the same [`toi_sem::HostIo`] host the tree
//! interpreter uses, so a driver can run both engines over the same script
//! and diff their output (spec §7, "dual-engine self-check").

pub mod vm;

pub use vm::{run_program, RuntimeError, Vm, MAX_STACK};
