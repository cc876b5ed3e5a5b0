//! The seam between the orchestrator and a code generator.
//!
//! A [`Pipeline`] receives one [`BackendJob`] per function: the prepared
//! graph scaffold, the diagnostic tables attached to it, and the call
//! descriptor for the function's signature. It reports back with a
//! [`BackendOutcome`].

use super::info::CompilationInfo;
use crate::core::{
    AlignmentRequirements, MachineGraph, NodeOriginTable, SourcePositionTable, SupportedOperatorFlags,
};
use crate::wasm::{CompilationEnv, DetectedFeatures, WasmCompilationData, WasmCompilationResult};
use crate::x64::CallDescriptor;

/// Everything a backend needs to compile one function.
pub struct BackendJob<'a, 'zone> {
    pub info: &'a CompilationInfo<'zone>,
    pub env: &'a CompilationEnv,
    pub data: &'a WasmCompilationData<'a>,
    pub source_positions: &'zone SourcePositionTable<'zone>,
    /// Present only when structured tracing is on.
    pub node_origins: Option<&'zone NodeOriginTable<'zone>>,
    pub mcgraph: &'a mut MachineGraph<'zone>,
    /// Features the backend observed while decoding are added here.
    pub detected: &'a DetectedFeatures,
    pub call_descriptor: &'zone CallDescriptor<'zone>,
}

/// What the backend produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutcome {
    Generated(WasmCompilationResult),
    Failed,
}

/// Optimizing code generator driven by the orchestrator.
pub trait Pipeline {
    /// Optional machine operators the backend can select.
    fn supported_operators(&self) -> SupportedOperatorFlags {
        SupportedOperatorFlags::all()
    }

    fn alignment_requirements(&self) -> AlignmentRequirements {
        AlignmentRequirements::default()
    }

    fn generate_wasm_code(&mut self, job: BackendJob<'_, '_>) -> BackendOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_utils::test::TestContext;
    use crate::pipeline::config::TraceOptions;
    use crate::pipeline::info::CodeKind;
    use crate::wasm::{
        CodeDesc, ExecutionTier, FunctionBody, FunctionSig, WasmFeature, WasmFeatureSet, WasmModule,
        WireBytesStorage,
    };
    use crate::x64::get_wasm_call_descriptor;
    use std::sync::Arc;

    /// Emits `ret` after adding a start node.
    struct RetOnly;

    impl Pipeline for RetOnly {
        fn generate_wasm_code(&mut self, job: BackendJob<'_, '_>) -> BackendOutcome {
            let start = job.mcgraph.common().start(job.call_descriptor.parameter_count() as u32);
            let id = job.mcgraph.graph_mut().add_node(start, &[]);
            job.mcgraph.graph_mut().set_start(id);
            job.detected.add(WasmFeature::Simd);

            BackendOutcome::Generated(WasmCompilationResult {
                code_desc: Some(CodeDesc {
                    instructions: vec![0xc3],
                    ..CodeDesc::default()
                }),
                func_index: job.data.func_index,
                result_tier: ExecutionTier::Optimized,
                assumptions: None,
            })
        }
    }

    #[test]
    fn test_default_capabilities() {
        let pipeline = RetOnly;
        assert_eq!(pipeline.supported_operators(), SupportedOperatorFlags::all());
        assert_eq!(pipeline.alignment_requirements(), AlignmentRequirements::default());
    }

    #[test]
    fn test_job_round_trip() {
        let ctx = TestContext::with_allocation_limit(1 << 20);
        let sig = FunctionSig::new(vec![crate::wasm::ValueType::I32], Vec::new());
        let storage = WireBytesStorage::new(vec![0x00, 0x0b]);
        let data = WasmCompilationData::new(FunctionBody::new(&sig, 0, storage.module_bytes()), 7, &storage);
        let env = CompilationEnv::new(Arc::new(WasmModule::new()), WasmFeatureSet::empty());
        let detected = DetectedFeatures::new();

        let zone = ctx.zone();
        let mcgraph = ctx.machine_graph();
        let source_positions = &*zone.alloc(SourcePositionTable::new(zone));
        let info = CompilationInfo::new("f", zone, CodeKind::WasmFunction, &TraceOptions::default());

        let outcome = RetOnly.generate_wasm_code(BackendJob {
            info: &info,
            env: &env,
            data: &data,
            source_positions,
            node_origins: None,
            mcgraph: &mut *mcgraph,
            detected: &detected,
            call_descriptor: get_wasm_call_descriptor(zone, &sig),
        });
        assert_eq!(mcgraph.graph().node_count(), 1);

        let BackendOutcome::Generated(result) = outcome else {
            panic!("backend failed");
        };
        assert_eq!(result.func_index, 7);
        assert_eq!(result.instructions(), &[0xc3]);
        assert!(detected.contains(WasmFeature::Simd));
        assert!(ctx.memory_used() > 0);
        assert_eq!(ctx.with_zone(|zone| zone.allocation_size()), ctx.memory_used());
    }
}
