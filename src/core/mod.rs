// This module is the hub for the compilation infrastructure shared by every function
// compilation: the zone (a named bump arena that owns all transient compiler objects and
// releases them in one step), the graph scaffold (operation graph plus the common and
// machine operator registries), the diagnostic side tables that decorate the graph
// (source positions and node origins), the register model used by calling conventions,
// the telemetry sink interface, and the error types for fallible ambient operations.
// Everything allocated here is tied to the zone lifetime so nothing can outlive the
// compilation that created it.

//! Core compilation infrastructure.
//!
//! # Key Components
//!
//! ## Zone (`zone`)
//! - Arena-based allocation using `bumpalo`
//! - Single release point when the zone is dropped
//! - Allocation size reporting for telemetry
//!
//! ## Graph Scaffold (`graph`, `operators`)
//! - Sea-of-nodes style operation graph stored in the zone
//! - Common and machine operator registries
//!
//! ## Diagnostics (`diagnostics`)
//! - Source-position and node-origin tables that stamp new nodes
//!
//! ## Telemetry (`telemetry`)
//! - Write-only histogram sink shared across compilations

pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod operators;
pub mod register_file;
pub mod telemetry;
pub mod test_utils;
pub mod zone;

pub use diagnostics::{NodeOrigin, NodeOriginTable, OriginKind, SourcePosition, SourcePositionTable};
pub use error::{CompileError, CompileResult};
pub use graph::{Graph, MachineGraph, Node, NodeId};
pub use operators::{
    AlignmentRequirements, CommonOperatorBuilder, MachineOperatorBuilder, MachineRepresentation,
    Opcode, Operator, SupportedOperatorFlags,
};
pub use register_file::{AsmReg, RegBitSet};
pub use telemetry::{CounterSink, Histogram};
pub use zone::Zone;
