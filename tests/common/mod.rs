//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use iced_x86::code_asm::*;
use iced_x86::IcedError;
use std::sync::{Arc, Mutex};
use wasm_tier::core::{CounterSink, Histogram, SourcePosition};
use wasm_tier::pipeline::{BackendJob, BackendOutcome, Pipeline, KB};
use wasm_tier::wasm::{
    AssumptionsJournal, CodeDesc, CompilationEnv, ExecutionTier, FunctionSig, ValueType,
    WasmCompilationData, WasmCompilationResult, WasmFeature, WasmFeatureSet, WasmModule,
    WellKnownImport, WireBytesRef, WireBytesStorage,
};
use wasm_tier::x64::has_tagged_parameters;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Sample sink that keeps every `(histogram, sample)` pair in arrival order.
#[derive(Debug, Default)]
pub struct Counters {
    samples: Mutex<Vec<(Histogram, i64)>>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self, histogram: Histogram) -> Vec<i64> {
        self.samples
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _)| *h == histogram)
            .map(|&(_, sample)| sample)
            .collect()
    }

    pub fn sample_count(&self, histogram: Histogram) -> usize {
        self.samples(histogram).len()
    }

    pub fn total_samples(&self) -> usize {
        self.samples.lock().unwrap().len()
    }
}

impl CounterSink for Counters {
    fn add_sample(&self, histogram: Histogram, sample: i64) {
        self.samples.lock().unwrap().push((histogram, sample));
    }
}

/// `(func (result i32) i32.const 42)`: no locals, i32.const 42, end.
pub const TRIVIAL_BODY: [u8; 4] = [0x00, 0x41, 0x2a, 0x0b];

pub const RETURN_VALUE: i32 = 42;

/// A body of exactly `size` bytes: no locals, `nop` padding, then `i32.const 42; end`.
pub fn padded_body(size: usize) -> Vec<u8> {
    assert!(size >= TRIVIAL_BODY.len());
    let mut body = vec![0x00];
    body.resize(size - 3, 0x01);
    body.extend_from_slice(&[0x41, 0x2a, 0x0b]);
    body
}

pub fn huge_body() -> Vec<u8> {
    padded_body(100 * KB)
}

/// Builds a module whose functions all have type `[] -> [i32]`.
#[derive(Default)]
pub struct ModuleBuilder {
    bodies: Vec<(Vec<u8>, Option<String>)>,
    raw_names: Vec<(u32, WireBytesRef)>,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(mut self, body: Vec<u8>, name: Option<&str>) -> Self {
        self.bodies.push((body, name.map(str::to_string)));
        self
    }

    /// Point the name-section entry of `func_index` at an arbitrary range.
    pub fn name_range(mut self, func_index: u32, range: WireBytesRef) -> Self {
        self.raw_names.push((func_index, range));
        self
    }

    pub fn build(self) -> TestModule {
        let mut bytes = b"\0asm\x01\0\0\0".to_vec();
        let mut module = WasmModule::new();
        let sig = module.add_signature(FunctionSig::new(Vec::new(), vec![ValueType::I32]));

        let mut names = Vec::new();
        for (body, name) in &self.bodies {
            let code = WireBytesRef::new(bytes.len() as u32, body.len() as u32);
            bytes.extend_from_slice(body);
            let index = module.add_function(sig, code);
            if let Some(name) = name {
                names.push((index, name.clone()));
            }
        }
        for (index, name) in names {
            let range = WireBytesRef::new(bytes.len() as u32, name.len() as u32);
            bytes.extend_from_slice(name.as_bytes());
            module.set_function_name(index, range);
        }
        for (index, range) in self.raw_names {
            module.set_function_name(index, range);
        }

        TestModule {
            env: CompilationEnv::new(Arc::new(module), WasmFeatureSet::all()),
            wire_bytes: WireBytesStorage::new(bytes),
        }
    }
}

pub struct TestModule {
    pub env: CompilationEnv,
    pub wire_bytes: WireBytesStorage,
}

impl TestModule {
    pub fn single(body: Vec<u8>) -> Self {
        ModuleBuilder::new().function(body, None).build()
    }

    pub fn trivial() -> Self {
        Self::single(TRIVIAL_BODY.to_vec())
    }

    pub fn data(&self, func_index: u32) -> WasmCompilationData<'_> {
        let body = self
            .wire_bytes
            .function_body(&self.env.module, func_index)
            .expect("function exists");
        WasmCompilationData::new(body, func_index, &self.wire_bytes)
    }
}

/// How the stub backend finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StubBehavior {
    #[default]
    Succeed,
    Fail,
    /// Report the result as baseline code.
    WrongTier,
    /// Fill in assumptions itself.
    SetAssumptions,
}

/// What the stub saw during one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub debug_name: String,
    pub func_index: u32,
    /// Zone size when the backend returned.
    pub zone_bytes: usize,
    pub node_count: usize,
    pub had_origins: bool,
    pub origin_count: usize,
    pub positioned_nodes: usize,
    pub parameter_count: usize,
}

/// Builds `start -> return 42 -> end` and emits `mov eax, 42; ret`.
#[derive(Default)]
pub struct StubBackend {
    pub behavior: StubBehavior,
    pub detect: Option<WasmFeature>,
    pub observations: Vec<Observation>,
}

impl StubBackend {
    pub fn new(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    pub fn last(&self) -> &Observation {
        self.observations.last().expect("backend ran")
    }
}

pub fn emit_return_constant(value: i32) -> Result<Vec<u8>, IcedError> {
    let mut a = CodeAssembler::new(64)?;
    a.mov(eax, value)?;
    a.ret()?;
    a.assemble(0)
}

impl Pipeline for StubBackend {
    fn generate_wasm_code(&mut self, job: BackendJob<'_, '_>) -> BackendOutcome {
        let body = job.data.func_body;

        let _position = job.source_positions.scope(SourcePosition::new(body.offset));
        let _phase = job.node_origins.map(|origins| {
            origins.set_current_bytecode_position(Some(body.offset));
            origins.phase_scope("stub-graph-builder")
        });

        let start_op = job.mcgraph.common().start(body.sig.parameter_count() as u32);
        let start = job.mcgraph.graph_mut().add_node(start_op, &[]);
        job.mcgraph.graph_mut().set_start(start);
        let value = job.mcgraph.int32_constant(RETURN_VALUE);
        let ret_op = job.mcgraph.common().return_op(1);
        let ret = job.mcgraph.graph_mut().add_node(ret_op, &[value, start]);
        let end_op = job.mcgraph.common().end(1);
        let end = job.mcgraph.graph_mut().add_node(end_op, &[ret]);
        job.mcgraph.graph_mut().set_end(end);

        if let Some(feature) = self.detect {
            job.detected.add(feature);
        }

        let instructions = match self.behavior {
            StubBehavior::Fail => None,
            _ => emit_return_constant(RETURN_VALUE).ok(),
        };

        self.observations.push(Observation {
            debug_name: job.info.debug_name().to_string(),
            func_index: job.data.func_index,
            zone_bytes: job.info.zone().allocation_size(),
            node_count: job.mcgraph.graph().node_count(),
            had_origins: job.node_origins.is_some(),
            origin_count: job.node_origins.map_or(0, |origins| origins.len()),
            positioned_nodes: job.source_positions.len(),
            parameter_count: job.call_descriptor.parameter_count(),
        });

        let Some(instructions) = instructions else {
            return BackendOutcome::Failed;
        };

        let mut assumptions = None;
        if self.behavior == StubBehavior::SetAssumptions {
            let mut journal = AssumptionsJournal::new();
            journal.record_assumption(0, WellKnownImport::Generic);
            assumptions = Some(journal);
        }

        BackendOutcome::Generated(WasmCompilationResult {
            code_desc: Some(CodeDesc {
                instructions,
                tagged_parameter_slots: u32::from(has_tagged_parameters(body.sig)),
                source_positions: vec![(0, body.offset)],
                ..CodeDesc::default()
            }),
            func_index: job.data.func_index,
            result_tier: if self.behavior == StubBehavior::WrongTier {
                ExecutionTier::Baseline
            } else {
                ExecutionTier::Optimized
            },
            assumptions,
        })
    }
}
