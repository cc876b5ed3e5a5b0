//! Textual and structured tracing.

mod common;

use common::{init_logging, ModuleBuilder, StubBackend, TestModule, TRIVIAL_BODY};
use wasm_tier::pipeline::{execute_wasm_compilation, CfgTraceFile, CompileOptions, TraceOptions};
use wasm_tier::wasm::DetectedFeatures;

fn compile_traced(module: &TestModule, func_index: u32, trace: TraceOptions, backend: &mut StubBackend) -> bool {
    let mut data = module.data(func_index);
    execute_wasm_compilation(
        &module.env,
        &mut data,
        &DetectedFeatures::new(),
        None,
        &CompileOptions::default().with_trace(trace),
        backend,
    )
    .succeeded()
}

#[test]
fn test_textual_trace_appends_records() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let module = ModuleBuilder::new()
        .function(TRIVIAL_BODY.to_vec(), Some("answer"))
        .function(TRIVIAL_BODY.to_vec(), None)
        .build();
    let trace = TraceOptions::default().with_textual(true).with_trace_dir(dir.path());

    assert!(compile_traced(&module, 0, trace.clone(), &mut StubBackend::default()));
    assert!(compile_traced(&module, 1, trace, &mut StubBackend::default()));

    let contents = std::fs::read_to_string(dir.path().join(CfgTraceFile::file_name())).unwrap();
    assert_eq!(contents.matches("begin_compilation").count(), 2);
    assert_eq!(contents.matches("end_compilation").count(), 2);
    assert!(contents.contains("  name \"answer\"\n  method \"answer\"\n  date "));
    assert!(contents.contains("  name \"wasm-function#1\"\n"));
}

#[test]
fn test_no_trace_file_without_textual_tracing() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let module = TestModule::trivial();
    let trace = TraceOptions::default().with_structured(true).with_trace_dir(dir.path());

    assert!(compile_traced(&module, 0, trace, &mut StubBackend::default()));
    assert!(!dir.path().join(CfgTraceFile::file_name()).exists());
}

#[test]
fn test_structured_trace_records_origins() {
    init_logging();
    let module = TestModule::trivial();
    let mut backend = StubBackend::default();

    assert!(compile_traced(&module, 0, TraceOptions::default().with_structured(true), &mut backend));

    let seen = backend.last();
    assert!(seen.had_origins);
    assert_eq!(seen.origin_count, seen.node_count);
}

#[test]
fn test_unwritable_trace_dir_still_compiles() {
    init_logging();
    let file = tempfile::NamedTempFile::new().unwrap();
    let module = TestModule::trivial();
    let trace = TraceOptions::default().with_textual(true).with_trace_dir(file.path());

    assert!(compile_traced(&module, 0, trace, &mut StubBackend::default()));
}

#[test]
fn test_trace_options_from_environment_lookup() {
    let trace = TraceOptions::from_lookup(|key| match key {
        "WASM_TIER_TRACE_TEXT" => Some("true".to_string()),
        _ => None,
    })
    .unwrap();
    assert!(trace.textual);
    assert!(!trace.structured);
}
