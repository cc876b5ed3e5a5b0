// This module implements the x86-64 calling convention for optimized wasm functions and
// derives the call descriptor handed to the backend. The implicit instance parameter comes
// first and always occupies RSI. Remaining GP parameters use RAX, RDX, RCX, RBX, R9 in
// order. Float and SIMD parameters use XMM1-XMM6. Parameters beyond the register budget go
// to caller frame slots of pointer size (SIMD values take two slots). Results use RAX/RDX
// and XMM1/XMM2, spilling further results to caller frame slots. No registers are
// callee-saved for wasm code. The derivation is a pure function of the signature; the
// descriptor and its location arrays are allocated in the compilation zone.

//! x86-64 wasm calling convention.
//!
//! A stateful assigner walks the signature and hands out registers, then
//! stack slots once a bank is exhausted.

use crate::core::register_file::{AsmReg, RegBitSet};
use crate::core::{MachineRepresentation, Zone};
use crate::wasm::{FunctionSig, ValueType};
use bumpalo::collections::Vec as BumpVec;
use std::fmt;

/// Register banks for different register types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegBank {
    GeneralPurpose = 0,
    Xmm = 1,
}

/// Where a parameter or result is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkageLocation {
    Register {
        reg: AsmReg,
        rep: MachineRepresentation,
    },
    /// Pointer-sized slot in the caller's frame.
    CallerFrameSlot {
        slot: u32,
        rep: MachineRepresentation,
    },
}

impl LinkageLocation {
    pub fn representation(&self) -> MachineRepresentation {
        match *self {
            LinkageLocation::Register { rep, .. } | LinkageLocation::CallerFrameSlot { rep, .. } => {
                rep
            }
        }
    }

    pub fn register(&self) -> Option<AsmReg> {
        match *self {
            LinkageLocation::Register { reg, .. } => Some(reg),
            LinkageLocation::CallerFrameSlot { .. } => None,
        }
    }

    pub fn is_caller_frame_slot(&self) -> bool {
        matches!(self, LinkageLocation::CallerFrameSlot { .. })
    }
}

/// Kind of callee a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    WasmFunction,
}

/// Immutable description of how a function receives arguments and returns results.
#[derive(Debug)]
pub struct CallDescriptor<'zone> {
    pub kind: CallKind,
    /// Parameter locations, instance first.
    params: &'zone [LinkageLocation],
    returns: &'zone [LinkageLocation],
    /// Caller frame slots used by stack parameters.
    pub param_slot_count: u32,
    /// Caller frame slots used by stack results.
    pub return_slot_count: u32,
    pub callee_saved: RegBitSet,
    pub allocatable: RegBitSet,
}

impl<'zone> CallDescriptor<'zone> {
    /// Number of parameters including the instance.
    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    pub fn return_count(&self) -> usize {
        self.returns.len()
    }

    pub fn parameter_location(&self, index: usize) -> LinkageLocation {
        self.params[index]
    }

    pub fn return_location(&self, index: usize) -> LinkageLocation {
        self.returns[index]
    }

    pub fn parameters(&self) -> &'zone [LinkageLocation] {
        self.params
    }

    pub fn returns(&self) -> &'zone [LinkageLocation] {
        self.returns
    }
}

impl fmt::Display for CallDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}:{}p/{}r stack={}+{}",
            self.kind,
            self.params.len(),
            self.returns.len(),
            self.param_slot_count,
            self.return_slot_count
        )
    }
}

/// x86-64 wasm register assignment.
pub struct WasmLinkageAssigner {
    gp_cnt: usize,
    xmm_cnt: usize,
    stack_slots: u32,
}

impl WasmLinkageAssigner {
    /// Instance data register (RSI).
    pub const INSTANCE_REG: AsmReg = AsmReg::gp(6);

    /// GP parameter registers; RSI first for the instance.
    const GP_PARAM_REGS: [AsmReg; 6] = [
        AsmReg::gp(6), // RSI
        AsmReg::gp(0), // RAX
        AsmReg::gp(2), // RDX
        AsmReg::gp(1), // RCX
        AsmReg::gp(3), // RBX
        AsmReg::gp(9), // R9
    ];

    const XMM_PARAM_REGS: [AsmReg; 6] = [
        AsmReg::fp(1),
        AsmReg::fp(2),
        AsmReg::fp(3),
        AsmReg::fp(4),
        AsmReg::fp(5),
        AsmReg::fp(6),
    ];

    const GP_RETURN_REGS: [AsmReg; 2] = [
        AsmReg::gp(0), // RAX
        AsmReg::gp(2), // RDX
    ];

    const XMM_RETURN_REGS: [AsmReg; 2] = [AsmReg::fp(1), AsmReg::fp(2)];

    fn params() -> Self {
        Self {
            gp_cnt: 0,
            xmm_cnt: 0,
            stack_slots: 0,
        }
    }

    fn returns() -> Self {
        Self::params()
    }

    fn bank(rep: MachineRepresentation) -> RegBank {
        if rep.is_floating_point() {
            RegBank::Xmm
        } else {
            RegBank::GeneralPurpose
        }
    }

    fn slots_for(rep: MachineRepresentation) -> u32 {
        let slot_size = MachineRepresentation::pointer().size_in_bytes();
        rep.size_in_bytes().div_ceil(slot_size).max(1)
    }

    fn next(&mut self, rep: MachineRepresentation, gp: &[AsmReg], xmm: &[AsmReg]) -> LinkageLocation {
        let reg = match Self::bank(rep) {
            RegBank::GeneralPurpose => gp.get(self.gp_cnt).inspect(|_| self.gp_cnt += 1),
            RegBank::Xmm => xmm.get(self.xmm_cnt).inspect(|_| self.xmm_cnt += 1),
        };
        match reg {
            Some(&reg) => LinkageLocation::Register { reg, rep },
            None => {
                let slot = self.stack_slots;
                self.stack_slots += Self::slots_for(rep);
                LinkageLocation::CallerFrameSlot { slot, rep }
            }
        }
    }

    pub fn assign_param(&mut self, rep: MachineRepresentation) -> LinkageLocation {
        self.next(rep, &Self::GP_PARAM_REGS, &Self::XMM_PARAM_REGS)
    }

    pub fn assign_return(&mut self, rep: MachineRepresentation) -> LinkageLocation {
        self.next(rep, &Self::GP_RETURN_REGS, &Self::XMM_RETURN_REGS)
    }

    pub fn stack_slots(&self) -> u32 {
        self.stack_slots
    }

    fn allocatable() -> RegBitSet {
        // All GP registers except RSP, RBP and the scratch R10, plus XMM0-XMM15.
        (0..16u8)
            .filter(|&id| !matches!(id, 4 | 5 | 10))
            .map(AsmReg::gp)
            .chain((0..16u8).map(AsmReg::fp))
            .collect()
    }
}

/// Derive the call descriptor for a wasm function with signature `sig`.
pub fn get_wasm_call_descriptor<'zone>(zone: &'zone Zone, sig: &FunctionSig) -> &'zone CallDescriptor<'zone> {
    let mut params = BumpVec::with_capacity_in(sig.parameter_count() + 1, zone.bump());
    let mut param_assigner = WasmLinkageAssigner::params();
    params.push(param_assigner.assign_param(MachineRepresentation::pointer()));
    for ty in sig.params() {
        params.push(param_assigner.assign_param(ty.machine_representation()));
    }

    let mut returns = BumpVec::with_capacity_in(sig.return_count(), zone.bump());
    let mut return_assigner = WasmLinkageAssigner::returns();
    for ty in sig.returns() {
        returns.push(return_assigner.assign_return(ty.machine_representation()));
    }

    let descriptor = CallDescriptor {
        kind: CallKind::WasmFunction,
        params: params.into_bump_slice(),
        returns: returns.into_bump_slice(),
        param_slot_count: param_assigner.stack_slots(),
        return_slot_count: return_assigner.stack_slots(),
        callee_saved: RegBitSet::new(),
        allocatable: WasmLinkageAssigner::allocatable(),
    };
    log::trace!("call descriptor for {}: {}", sig, descriptor);
    zone.alloc(descriptor)
}

/// Whether any parameter of `sig` is a reference that must be visited by the GC.
pub fn has_tagged_parameters(sig: &FunctionSig) -> bool {
    sig.params().iter().any(|ty| ValueType::is_reference(*ty))
}
