//! Peak-memory telemetry for huge functions.

mod common;

use common::{
    huge_body, init_logging, padded_body, Counters, StubBackend, StubBehavior, TestModule,
};
use wasm_tier::core::Histogram;
use wasm_tier::pipeline::{execute_wasm_compilation, CompileOptions, KB};
use wasm_tier::wasm::DetectedFeatures;

const PEAK: Histogram = Histogram::WasmCompileHugeFunctionPeakMemoryBytes;

fn compile_with(
    module: &TestModule,
    counters: Option<&Counters>,
    options: &CompileOptions,
    backend: &mut StubBackend,
) -> bool {
    let mut data = module.data(0);
    execute_wasm_compilation(
        &module.env,
        &mut data,
        &DetectedFeatures::new(),
        counters.map(|c| c as &dyn wasm_tier::CounterSink),
        options,
        backend,
    )
    .succeeded()
}

#[test]
fn test_small_function_is_not_sampled() {
    init_logging();
    let module = TestModule::trivial();
    let counters = Counters::new();

    assert!(compile_with(&module, Some(&counters), &CompileOptions::default(), &mut StubBackend::default()));
    assert_eq!(counters.sample_count(PEAK), 0);
}

#[test]
fn test_just_below_threshold_is_not_sampled() {
    init_logging();
    let module = TestModule::single(padded_body(100 * KB - 1));
    let counters = Counters::new();

    assert!(compile_with(&module, Some(&counters), &CompileOptions::default(), &mut StubBackend::default()));
    assert_eq!(counters.sample_count(PEAK), 0);
}

#[test]
fn test_threshold_body_samples_zone_size() {
    init_logging();
    let module = TestModule::single(huge_body());
    assert_eq!(module.data(0).body_size(), 100 * KB);
    let counters = Counters::new();
    let mut backend = StubBackend::default();

    assert!(compile_with(&module, Some(&counters), &CompileOptions::default(), &mut backend));

    let samples = counters.samples(PEAK);
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0], backend.last().zone_bytes as i64);
    assert!(samples[0] > 0);
    assert_eq!(PEAK.name(), "wasm.compile.huge_function.peak_memory_bytes");
}

#[test]
fn test_failed_compilation_is_not_sampled() {
    init_logging();
    let module = TestModule::single(huge_body());
    let counters = Counters::new();

    assert!(!compile_with(
        &module,
        Some(&counters),
        &CompileOptions::default(),
        &mut StubBackend::new(StubBehavior::Fail),
    ));
    assert_eq!(counters.total_samples(), 0);
}

#[test]
fn test_missing_sink_is_skipped() {
    init_logging();
    let module = TestModule::single(huge_body());
    assert!(compile_with(&module, None, &CompileOptions::default(), &mut StubBackend::default()));
}

#[test]
fn test_custom_threshold() {
    init_logging();
    let module = TestModule::single(padded_body(64));
    let counters = Counters::new();
    let options = CompileOptions::default().with_huge_function_threshold(64);

    assert!(compile_with(&module, Some(&counters), &options, &mut StubBackend::default()));
    assert!(compile_with(&module, Some(&counters), &options, &mut StubBackend::default()));
    assert_eq!(counters.sample_count(PEAK), 2);
}
