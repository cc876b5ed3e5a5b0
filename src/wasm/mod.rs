//! WebAssembly module model consumed by the compiler.
//!
//! This module contains the inputs and outputs of a single function
//! compilation:
//! - [`CompilationEnv`] and [`WasmModule`] describe the owning module
//! - [`FunctionBody`] and [`WasmCompilationData`] describe the function
//! - [`DetectedFeatures`] collects features used by compiled code
//! - [`WasmCompilationResult`] is what a compilation produces

pub mod features;
pub mod module;
pub mod result;
pub mod types;

pub use features::{DetectedFeatures, WasmFeature, WasmFeatureSet};
pub use module::{
    get_debug_name, CompilationEnv, WasmFunction, WasmModule, WireBytesRef, WireBytesStorage,
};
pub use result::{
    AssumptionsJournal, CodeDesc, ExecutionTier, WasmCompilationData, WasmCompilationResult,
    WellKnownImport,
};
pub use types::{FunctionBody, FunctionSig, ValueType};
