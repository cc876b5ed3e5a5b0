//! wasm-tier - optimizing compilation of single WebAssembly functions.
//!
//! This crate wires one function's compilation together: it opens a
//! per-function [`Zone`](core::Zone), builds the graph scaffold the backend
//! extends, creates the [`CompilationInfo`](pipeline::CompilationInfo)
//! descriptor, attaches diagnostics, hands everything to a backend
//! [`Pipeline`](pipeline::Pipeline), and assembles the
//! [`WasmCompilationResult`](wasm::WasmCompilationResult).
//!
//! # Primary Usage
//!
//! ```ignore
//! use wasm_tier::pipeline::{execute_wasm_compilation, CompileOptions};
//! use wasm_tier::wasm::{DetectedFeatures, WasmCompilationData};
//!
//! let detected = DetectedFeatures::new();
//! let mut data = WasmCompilationData::new(body, func_index, &wire_bytes);
//! let result = execute_wasm_compilation(
//!     &env, &mut data, &detected, Some(&counters), &CompileOptions::default(), &mut backend,
//! );
//! if result.succeeded() { /* install code */ }
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Zone, graph scaffold, diagnostic tables, telemetry, errors
//! - [`wasm`] - Module environment, function bodies, features, results
//! - [`x64`] - x86-64 wasm calling convention
//! - [`pipeline`] - Descriptor, tracing, configuration, backend seam, orchestration

pub mod core;
pub mod pipeline;
pub mod wasm;
pub mod x64;

pub use crate::core::{
    CompileError, CompileResult, CounterSink, Graph, Histogram, MachineGraph, Zone,
};
pub use crate::pipeline::{
    execute_wasm_compilation, BackendJob, BackendOutcome, CompilationInfo, CompileOptions,
    Pipeline, TraceOptions,
};
pub use crate::wasm::{
    CompilationEnv, DetectedFeatures, ExecutionTier, WasmCompilationData, WasmCompilationResult,
};
