// This module drives the optimizing compilation of one wasm function. It creates a fresh
// zone, builds the graph scaffold inside it (graph, common and machine operator registries
// configured with the backend's capabilities), derives the debug name, and creates the
// compilation descriptor. Diagnostics are attached next: the textual trace record first,
// then the node-origin table when structured tracing is on, and always a source-position
// table. The backend then runs against the scaffold. A failed backend yields the empty
// result right away. A successful one has its result checked for the optimized tier,
// receives the caller's assumptions journal when it is non-empty, and for huge function
// bodies the zone size is reported as a peak-memory sample. The zone is released when the
// function returns, so nothing allocated in it can escape.

//! Single-function compilation entry point.

use super::backend::{BackendJob, BackendOutcome, Pipeline};
use super::config::CompileOptions;
use super::info::{CodeKind, CompilationInfo};
use super::trace::{AsC1VCompilation, CfgTraceFile};
use crate::core::{
    CommonOperatorBuilder, CompileResult, CounterSink, Graph, Histogram, MachineGraph,
    MachineOperatorBuilder, MachineRepresentation, NodeOriginTable, SourcePositionTable, Zone,
};
use crate::wasm::{
    get_debug_name, CompilationEnv, DetectedFeatures, ExecutionTier, WasmCompilationData,
    WasmCompilationResult,
};
use crate::x64::get_wasm_call_descriptor;

pub const ZONE_NAME: &str = "wasm-optimized-compilation";

/// Compile one function with the optimizing pipeline.
///
/// Returns the empty [`WasmCompilationResult`] when the backend fails. The
/// caller's assumptions journal is moved into a successful result, unless it
/// is empty.
///
/// # Panics
///
/// Panics if the backend reports success without a result, or with a result
/// for a tier other than [`ExecutionTier::Optimized`], or with assumptions of
/// its own.
pub fn execute_wasm_compilation(
    env: &CompilationEnv,
    data: &mut WasmCompilationData<'_>,
    detected: &DetectedFeatures,
    counters: Option<&dyn CounterSink>,
    options: &CompileOptions,
    pipeline: &mut dyn Pipeline,
) -> WasmCompilationResult {
    let zone = match options.zone_allocation_limit {
        Some(limit) => Zone::with_allocation_limit(ZONE_NAME, limit),
        None => Zone::new(ZONE_NAME),
    };
    let mcgraph = build_machine_graph(&zone, &*pipeline);

    let debug_name = get_debug_name(&zone, &env.module, data.wire_bytes_storage, data.func_index);
    let mut info = CompilationInfo::new(debug_name, &zone, CodeKind::WasmFunction, &options.trace);
    log::debug!(
        "{}: optimizing compilation of {} body bytes",
        debug_name,
        data.body_size()
    );

    let node_origins = attach_tracing(&mut info, mcgraph.graph_mut(), options);
    let source_positions: &SourcePositionTable<'_> = zone.alloc(SourcePositionTable::new(&zone));
    mcgraph.graph_mut().attach_source_positions(source_positions);

    let call_descriptor = get_wasm_call_descriptor(&zone, data.func_body.sig);
    log::trace!("{}: call descriptor {}", debug_name, call_descriptor);

    info.mark_invoked();
    let outcome = pipeline.generate_wasm_code(BackendJob {
        info: &info,
        env,
        data: &*data,
        source_positions,
        node_origins,
        mcgraph: &mut *mcgraph,
        detected,
        call_descriptor,
    });

    match outcome {
        BackendOutcome::Generated(result) => info.set_wasm_compilation_result(result),
        BackendOutcome::Failed => {
            info.mark_failed();
            log::debug!("{}: backend failed", debug_name);
            return WasmCompilationResult::default();
        }
    }

    let Some(mut result) = info.release_wasm_compilation_result() else {
        panic!("{}: backend succeeded without a compilation result", debug_name);
    };
    assert_eq!(
        result.result_tier,
        ExecutionTier::Optimized,
        "{}: optimizing backend produced code for the wrong tier",
        debug_name
    );
    assert!(
        result.assumptions.is_none(),
        "{}: backend must not set assumptions",
        debug_name
    );
    result.assumptions = data.assumptions.take().filter(|journal| !journal.is_empty());

    if let Some(counters) = counters {
        if data.body_size() >= options.huge_function_threshold {
            let zone_bytes = zone.allocation_size();
            log::debug!(
                "{}: huge function ({} body bytes) peaked at {} zone bytes",
                debug_name,
                data.body_size(),
                zone_bytes
            );
            counters.add_sample(
                Histogram::WasmCompileHugeFunctionPeakMemoryBytes,
                i64::try_from(zone_bytes).unwrap_or(i64::MAX),
            );
        }
    }

    log::debug!(
        "{}: generated {} bytes of code",
        debug_name,
        result.instructions().len()
    );
    result
}

fn build_machine_graph<'zone>(zone: &'zone Zone, pipeline: &dyn Pipeline) -> &'zone mut MachineGraph<'zone> {
    let graph = zone.alloc(Graph::new(zone));
    let common: &CommonOperatorBuilder<'zone> = zone.alloc(CommonOperatorBuilder::new(zone));
    let machine: &MachineOperatorBuilder<'zone> = zone.alloc(MachineOperatorBuilder::new(
        zone,
        MachineRepresentation::pointer(),
        pipeline.supported_operators(),
        pipeline.alignment_requirements(),
    ));
    zone.alloc(MachineGraph::new(graph, common, machine))
}

/// Attach the diagnostics requested by the trace options. Returns the origin
/// table when one was attached.
fn attach_tracing<'zone>(
    info: &mut CompilationInfo<'zone>,
    graph: &mut Graph<'zone>,
    options: &CompileOptions,
) -> Option<&'zone NodeOriginTable<'zone>> {
    if !info.trace_textual() && !info.trace_structured() {
        return None;
    }
    info.mark_tracing_attached();

    if info.trace_textual() {
        if let Err(err) = write_trace_record(info, options) {
            log::warn!("{}: skipping trace record: {}", info.debug_name(), err);
        }
    }

    if !info.trace_structured() {
        return None;
    }
    let zone = info.zone();
    let origins: &NodeOriginTable<'zone> = zone.alloc(NodeOriginTable::new(zone));
    graph.attach_node_origins(origins);
    Some(origins)
}

fn write_trace_record(info: &CompilationInfo<'_>, options: &CompileOptions) -> CompileResult<()> {
    let mut trace = CfgTraceFile::open(&options.trace.trace_dir)?;
    trace.write_compilation(&AsC1VCompilation::new(info))?;
    log::trace!("{}: trace record written to {}", info.debug_name(), trace.path().display());
    Ok(())
}
