// This module defines CompilationInfo, the per-compilation descriptor. It carries the debug
// name (interned in the zone), the owning zone, the code kind, and the trace flags copied
// from the caller's options, and it holds at most one compilation result. Its state
// machine records how far the compilation got: Created, TracingAttached (only when a trace
// option is on), Invoked, and finally Resolved with a success or failure outcome. Moving
// backwards, skipping the backend call, or storing a second result is an internal defect
// and panics.

//! Per-compilation descriptor.

use super::config::TraceOptions;
use crate::core::Zone;
use crate::wasm::WasmCompilationResult;
use std::fmt;

/// Classification of the code being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    WasmFunction,
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeKind::WasmFunction => f.write_str("WASM_FUNCTION"),
        }
    }
}

/// Terminal outcome of a compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Lifecycle of a [`CompilationInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilationState {
    Created,
    TracingAttached,
    Invoked,
    Resolved(Outcome),
}

impl CompilationState {
    fn can_transition_to(self, next: CompilationState) -> bool {
        use CompilationState::*;
        matches!(
            (self, next),
            (Created, TracingAttached) | (Created | TracingAttached, Invoked) | (Invoked, Resolved(_))
        )
    }
}

/// Metadata and result slot for one function compilation.
pub struct CompilationInfo<'zone> {
    debug_name: &'zone str,
    zone: &'zone Zone,
    code_kind: CodeKind,
    trace_textual: bool,
    trace_structured: bool,
    state: CompilationState,
    wasm_compilation_result: Option<WasmCompilationResult>,
}

impl<'zone> CompilationInfo<'zone> {
    pub fn new(
        debug_name: &'zone str,
        zone: &'zone Zone,
        code_kind: CodeKind,
        trace: &TraceOptions,
    ) -> Self {
        Self {
            debug_name,
            zone,
            code_kind,
            trace_textual: trace.textual,
            trace_structured: trace.structured,
            state: CompilationState::Created,
            wasm_compilation_result: None,
        }
    }

    pub fn debug_name(&self) -> &'zone str {
        self.debug_name
    }

    pub fn zone(&self) -> &'zone Zone {
        self.zone
    }

    pub fn code_kind(&self) -> CodeKind {
        self.code_kind
    }

    /// Whether the compilation record goes to the textual trace file.
    pub fn trace_textual(&self) -> bool {
        self.trace_textual
    }

    /// Whether a node-origin table is attached to the graph.
    pub fn trace_structured(&self) -> bool {
        self.trace_structured
    }

    pub fn state(&self) -> CompilationState {
        self.state
    }

    fn transition(&mut self, next: CompilationState) {
        assert!(
            self.state.can_transition_to(next),
            "{}: invalid compilation state transition {:?} -> {:?}",
            self.debug_name,
            self.state,
            next
        );
        log::trace!("{}: {:?} -> {:?}", self.debug_name, self.state, next);
        self.state = next;
    }

    pub fn mark_tracing_attached(&mut self) {
        self.transition(CompilationState::TracingAttached);
    }

    pub fn mark_invoked(&mut self) {
        self.transition(CompilationState::Invoked);
    }

    pub fn mark_failed(&mut self) {
        self.transition(CompilationState::Resolved(Outcome::Failure));
    }

    /// Store the backend's result. Only one result may ever be stored.
    pub fn set_wasm_compilation_result(&mut self, result: WasmCompilationResult) {
        assert!(
            self.wasm_compilation_result.is_none(),
            "{}: compilation result already set",
            self.debug_name
        );
        self.transition(CompilationState::Resolved(Outcome::Success));
        self.wasm_compilation_result = Some(result);
    }

    /// Take the stored result, leaving the slot empty.
    pub fn release_wasm_compilation_result(&mut self) -> Option<WasmCompilationResult> {
        self.wasm_compilation_result.take()
    }
}

impl fmt::Debug for CompilationInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationInfo")
            .field("debug_name", &self.debug_name)
            .field("zone", &self.zone.name())
            .field("code_kind", &self.code_kind)
            .field("state", &self.state)
            .field("has_result", &self.wasm_compilation_result.is_some())
            .finish()
    }
}
