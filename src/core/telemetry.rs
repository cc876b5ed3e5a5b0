//! Telemetry sink for compilation metrics.
//!
//! The orchestrator only writes samples; storage and export belong to the
//! embedder, which hands in a [`CounterSink`] shared by all compilations.

/// Histograms the compiler records into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Histogram {
    /// Zone size after compiling a function whose body is at least the
    /// huge-function threshold.
    WasmCompileHugeFunctionPeakMemoryBytes,
}

impl Histogram {
    pub fn name(self) -> &'static str {
        match self {
            Histogram::WasmCompileHugeFunctionPeakMemoryBytes => {
                "wasm.compile.huge_function.peak_memory_bytes"
            }
        }
    }
}

/// Write-only metrics sink shared by concurrent compilations.
pub trait CounterSink: Send + Sync {
    fn add_sample(&self, histogram: Histogram, sample: i64);
}
