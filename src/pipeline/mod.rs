//! Optimizing compilation orchestration.
//!
//! [`execute_wasm_compilation`] prepares the per-function scaffold, hands it
//! to a [`Pipeline`] and assembles the result.

pub mod backend;
pub mod compiler;
pub mod config;
pub mod info;
pub mod trace;

pub use backend::{BackendJob, BackendOutcome, Pipeline};
pub use compiler::{execute_wasm_compilation, ZONE_NAME};
pub use config::{CompileOptions, TraceOptions, DEFAULT_HUGE_FUNCTION_THRESHOLD, KB};
pub use info::{CodeKind, CompilationInfo, CompilationState, Outcome};
pub use trace::{AsC1VCompilation, CfgTraceFile};
