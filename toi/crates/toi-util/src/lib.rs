//! toi-util - shared foundation types for the Toi language pipeline.
//!
//! Every other crate in the workspace (`toi-lex`, `toi-par`, `toi-sem`,
//! `toi-mir`, `toi-runtime`, `toi-drv`) depends on this crate for source
//! locations (`Span`/`FileId`), interned identifiers (`Symbol`), diagnostic
//! reporting (`Handler`/`Diagnostic`/`DiagnosticBuilder`), typed indices
//! (`IndexVec`/`Idx`), definition identity (`DefId`), and the common error
//! types each phase's public API returns.

pub mod builtins;
pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Handler, Level, SourceSnippet};
pub use error::{
    DiagnosticError, DiagnosticResult, IndexVecError, IndexVecResult, SourceMapError,
    SourceMapResult, SymbolError, SymbolResult,
};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::{InternerStats, Symbol};

pub use rustc_hash::{FxHashMap, FxHashSet};
