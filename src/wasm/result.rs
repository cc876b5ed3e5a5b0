// This module defines what goes into and comes out of a single function compilation.
// WasmCompilationData is the caller's working data: the function body, its index, the
// shared wire bytes, and an optional assumptions journal whose ownership moves into the
// result exactly once. WasmCompilationResult is a plain value: either a code descriptor
// with the tier that produced it, or the empty default that signals failure. An
// assumptions journal stored in a result is never empty; "no assumptions" is None.

//! Compilation inputs and results.

use super::module::WireBytesStorage;
use super::types::FunctionBody;
use std::fmt;

/// Code generation strategy that produced a piece of code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionTier {
    #[default]
    None,
    Baseline,
    Optimized,
}

impl fmt::Display for ExecutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionTier::None => "none",
            ExecutionTier::Baseline => "baseline",
            ExecutionTier::Optimized => "optimized",
        };
        f.write_str(name)
    }
}

/// Imports the optimizer may specialize calls to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownImport {
    Generic,
    StringCast,
    StringTest,
    StringLength,
    StringCharCodeAt,
    StringConcat,
    StringEquals,
}

/// Import statuses compiled code depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssumptionsJournal {
    imports: Vec<(u32, WellKnownImport)>,
}

impl AssumptionsJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that import `func_index` was assumed to be `status`.
    pub fn record_assumption(&mut self, func_index: u32, status: WellKnownImport) {
        self.imports.push((func_index, status));
    }

    pub fn import_statuses(&self) -> &[(u32, WellKnownImport)] {
        &self.imports
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }
}

/// Machine code and its metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeDesc {
    pub instructions: Vec<u8>,
    pub frame_slot_count: u32,
    pub tagged_parameter_slots: u32,
    /// `(pc offset, body offset)` pairs.
    pub source_positions: Vec<(u32, u32)>,
    /// Pc offsets of memory accesses that may trap.
    pub protected_instructions: Vec<u32>,
}

/// Outcome of compiling one function.
///
/// The `Default` value is the empty result returned when compilation failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WasmCompilationResult {
    pub code_desc: Option<CodeDesc>,
    pub func_index: u32,
    pub result_tier: ExecutionTier,
    pub assumptions: Option<AssumptionsJournal>,
}

impl WasmCompilationResult {
    pub fn succeeded(&self) -> bool {
        self.code_desc.is_some()
    }

    /// Machine code, empty for a failed compilation.
    pub fn instructions(&self) -> &[u8] {
        self.code_desc
            .as_ref()
            .map(|desc| desc.instructions.as_slice())
            .unwrap_or(&[])
    }
}

/// Caller-owned working data for one function compilation.
#[derive(Debug)]
pub struct WasmCompilationData<'a> {
    pub func_body: FunctionBody<'a>,
    pub func_index: u32,
    pub wire_bytes_storage: &'a WireBytesStorage,
    pub assumptions: Option<AssumptionsJournal>,
}

impl<'a> WasmCompilationData<'a> {
    pub fn new(func_body: FunctionBody<'a>, func_index: u32, wire_bytes_storage: &'a WireBytesStorage) -> Self {
        Self {
            func_body,
            func_index,
            wire_bytes_storage,
            assumptions: None,
        }
    }

    pub fn with_assumptions(mut self, assumptions: AssumptionsJournal) -> Self {
        self.assumptions = Some(assumptions);
        self
    }

    pub fn body_size(&self) -> usize {
        self.func_body.size()
    }
}
