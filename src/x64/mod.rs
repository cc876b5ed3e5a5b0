//! x86-64 architecture-specific components.
//!
//! This module contains the x86-64 wasm calling convention used to derive the
//! call descriptor for each compiled function.

pub mod calling_convention;

pub use calling_convention::{
    get_wasm_call_descriptor, has_tagged_parameters, CallDescriptor, CallKind, LinkageLocation, RegBank,
    WasmLinkageAssigner,
};
