//! Compilation options.
//!
//! Tracing is configured explicitly per call through [`TraceOptions`]; the
//! `from_env` constructor is a convenience for embedders that want the
//! `WASM_TIER_TRACE_*` environment variables to drive it.

use crate::core::{CompileError, CompileResult};
use std::path::PathBuf;

pub const KB: usize = 1024;

/// Bodies at least this large get a peak-memory sample.
pub const DEFAULT_HUGE_FUNCTION_THRESHOLD: usize = 100 * KB;

const TRACE_TEXT_VAR: &str = "WASM_TIER_TRACE_TEXT";
const TRACE_STRUCTURED_VAR: &str = "WASM_TIER_TRACE_STRUCTURED";
const TRACE_DIR_VAR: &str = "WASM_TIER_TRACE_DIR";

/// Diagnostic output requested for a compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceOptions {
    /// Write the compilation record to the textual trace file.
    pub textual: bool,
    /// Attach a node-origin table to the graph.
    pub structured: bool,
    /// Directory receiving trace files.
    pub trace_dir: PathBuf,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            textual: false,
            structured: false,
            trace_dir: PathBuf::from("."),
        }
    }
}

impl TraceOptions {
    pub fn with_textual(mut self, enabled: bool) -> Self {
        self.textual = enabled;
        self
    }

    pub fn with_structured(mut self, enabled: bool) -> Self {
        self.structured = enabled;
        self
    }

    pub fn with_trace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.trace_dir = dir.into();
        self
    }

    /// Read options from `WASM_TIER_TRACE_TEXT`, `WASM_TIER_TRACE_STRUCTURED`
    /// and `WASM_TIER_TRACE_DIR`.
    pub fn from_env() -> CompileResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`TraceOptions::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CompileResult<Self> {
        let mut options = Self::default();
        if let Some(value) = lookup(TRACE_TEXT_VAR) {
            options.textual = parse_flag(TRACE_TEXT_VAR, &value)?;
        }
        if let Some(value) = lookup(TRACE_STRUCTURED_VAR) {
            options.structured = parse_flag(TRACE_STRUCTURED_VAR, &value)?;
        }
        if let Some(dir) = lookup(TRACE_DIR_VAR) {
            if dir.is_empty() {
                return Err(CompileError::InvalidConfig {
                    key: TRACE_DIR_VAR,
                    value: dir,
                });
            }
            options.trace_dir = PathBuf::from(dir);
        }
        Ok(options)
    }
}

fn parse_flag(key: &'static str, value: &str) -> CompileResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" | "" => Ok(false),
        _ => Err(CompileError::InvalidConfig {
            key,
            value: value.to_string(),
        }),
    }
}

/// Options for one call to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub trace: TraceOptions,
    pub huge_function_threshold: usize,
    /// Cap on zone growth; allocating past it panics.
    pub zone_allocation_limit: Option<usize>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            trace: TraceOptions::default(),
            huge_function_threshold: DEFAULT_HUGE_FUNCTION_THRESHOLD,
            zone_allocation_limit: None,
        }
    }
}

impl CompileOptions {
    pub fn with_trace(mut self, trace: TraceOptions) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_huge_function_threshold(mut self, bytes: usize) -> Self {
        self.huge_function_threshold = bytes;
        self
    }

    pub fn with_zone_allocation_limit(mut self, bytes: usize) -> Self {
        self.zone_allocation_limit = Some(bytes);
        self
    }
}
