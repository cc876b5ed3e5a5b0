// This module implements the two diagnostic side tables that decorate the operation graph.
// SourcePositionTable maps nodes to byte offsets in the function body; it is always attached
// because later backend stages need positions for trap handlers and code source maps.
// NodeOriginTable records which phase and reducer created each node, or which bytecode
// offset it was built from, and is only attached when structured tracing is requested.
// Both tables keep a "current" value; once attached, the graph stamps every newly added
// node with it. Storage lives in the zone through hashbrown maps using the zone allocator.

//! Source-position and node-origin tables.

use super::graph::NodeId;
use super::zone::Zone;
use bumpalo::Bump;
use hashbrown::{DefaultHashBuilder, HashMap};
use std::cell::{Cell, RefCell};
use std::fmt;

type ZoneMap<'zone, K, V> = HashMap<K, V, DefaultHashBuilder, &'zone Bump>;

/// Byte offset of a node's origin in the function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    offset: Option<u32>,
}

impl SourcePosition {
    pub const fn new(offset: u32) -> Self {
        Self {
            offset: Some(offset),
        }
    }

    pub const fn unknown() -> Self {
        Self { offset: None }
    }

    pub fn is_known(&self) -> bool {
        self.offset.is_some()
    }

    pub fn script_offset(&self) -> Option<u32> {
        self.offset
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Node to source-position mapping.
pub struct SourcePositionTable<'zone> {
    current_position: Cell<SourcePosition>,
    table: RefCell<ZoneMap<'zone, NodeId, SourcePosition>>,
}

impl<'zone> SourcePositionTable<'zone> {
    pub fn new(zone: &'zone Zone) -> Self {
        Self {
            current_position: Cell::new(SourcePosition::unknown()),
            table: RefCell::new(HashMap::new_in(zone.bump())),
        }
    }

    pub fn current_position(&self) -> SourcePosition {
        self.current_position.get()
    }

    pub fn set_current_position(&self, position: SourcePosition) {
        self.current_position.set(position);
    }

    /// Make `position` current until the returned guard is dropped.
    pub fn scope(&self, position: SourcePosition) -> SourcePositionScope<'_, 'zone> {
        let previous = self.current_position.replace(position);
        SourcePositionScope {
            table: self,
            previous,
        }
    }

    pub fn get_source_position(&self, node: NodeId) -> SourcePosition {
        self.table
            .borrow()
            .get(&node)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_source_position(&self, node: NodeId, position: SourcePosition) {
        self.table.borrow_mut().insert(node, position);
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.borrow().is_empty()
    }

    /// Called by the graph for every new node.
    pub(crate) fn record_new_node(&self, node: NodeId) {
        let position = self.current_position.get();
        if position.is_known() {
            self.set_source_position(node, position);
        }
    }
}

/// Restores the previous current position on drop.
pub struct SourcePositionScope<'t, 'zone> {
    table: &'t SourcePositionTable<'zone>,
    previous: SourcePosition,
}

impl Drop for SourcePositionScope<'_, '_> {
    fn drop(&mut self) {
        self.table.current_position.set(self.previous);
    }
}

/// What a node was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginKind {
    GraphNode,
    WasmBytecode,
}

/// Provenance of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeOrigin {
    phase_name: &'static str,
    reducer_name: &'static str,
    kind: OriginKind,
    created_from: Option<u32>,
}

impl NodeOrigin {
    /// Node created by `reducer` in `phase` while replacing `created_from`.
    pub fn new(phase_name: &'static str, reducer_name: &'static str, created_from: NodeId) -> Self {
        Self {
            phase_name,
            reducer_name,
            kind: OriginKind::GraphNode,
            created_from: Some(created_from.index() as u32),
        }
    }

    /// Node built from the bytecode at `offset`.
    pub fn from_bytecode(phase_name: &'static str, reducer_name: &'static str, offset: u32) -> Self {
        Self {
            phase_name,
            reducer_name,
            kind: OriginKind::WasmBytecode,
            created_from: Some(offset),
        }
    }

    pub const fn unknown() -> Self {
        Self {
            phase_name: "",
            reducer_name: "",
            kind: OriginKind::GraphNode,
            created_from: None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.created_from.is_some()
    }

    pub fn phase_name(&self) -> &'static str {
        self.phase_name
    }

    pub fn reducer_name(&self) -> &'static str {
        self.reducer_name
    }

    pub fn kind(&self) -> OriginKind {
        self.kind
    }

    pub fn created_from(&self) -> Option<u32> {
        self.created_from
    }
}

impl Default for NodeOrigin {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Node to origin mapping, attached only for structured tracing.
pub struct NodeOriginTable<'zone> {
    current_origin: Cell<NodeOrigin>,
    current_phase_name: Cell<&'static str>,
    current_bytecode_position: Cell<Option<u32>>,
    table: RefCell<ZoneMap<'zone, NodeId, NodeOrigin>>,
}

impl<'zone> NodeOriginTable<'zone> {
    pub fn new(zone: &'zone Zone) -> Self {
        Self {
            current_origin: Cell::new(NodeOrigin::unknown()),
            current_phase_name: Cell::new("unknown"),
            current_bytecode_position: Cell::new(None),
            table: RefCell::new(HashMap::new_in(zone.bump())),
        }
    }

    pub fn current_phase_name(&self) -> &'static str {
        self.current_phase_name.get()
    }

    /// Make `phase_name` current until the returned guard is dropped.
    pub fn phase_scope(&self, phase_name: &'static str) -> PhaseScope<'_, 'zone> {
        let previous = self.current_phase_name.replace(phase_name);
        PhaseScope {
            table: self,
            previous,
        }
    }

    pub fn set_current_origin(&self, origin: NodeOrigin) {
        self.current_origin.set(origin);
    }

    pub fn set_current_bytecode_position(&self, offset: Option<u32>) {
        self.current_bytecode_position.set(offset);
    }

    pub fn get_node_origin(&self, node: NodeId) -> NodeOrigin {
        self.table.borrow().get(&node).copied().unwrap_or_default()
    }

    pub fn set_node_origin(&self, node: NodeId, origin: NodeOrigin) {
        self.table.borrow_mut().insert(node, origin);
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.borrow().is_empty()
    }

    /// Called by the graph for every new node.
    pub(crate) fn record_new_node(&self, node: NodeId) {
        let origin = self.current_origin.get();
        if origin.is_known() {
            self.set_node_origin(node, origin);
        } else if let Some(offset) = self.current_bytecode_position.get() {
            self.set_node_origin(
                node,
                NodeOrigin::from_bytecode(self.current_phase_name.get(), "", offset),
            );
        }
    }

    /// Write the table as a JSON object keyed by node id.
    pub fn write_json(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let table = self.table.borrow();
        let mut entries: Vec<_> = table.iter().map(|(id, origin)| (*id, *origin)).collect();
        entries.sort_by_key(|(id, _)| *id);

        out.write_char('{')?;
        for (i, (id, origin)) in entries.iter().enumerate() {
            if i > 0 {
                out.write_char(',')?;
            }
            let key = match origin.kind {
                OriginKind::GraphNode => "nodeId",
                OriginKind::WasmBytecode => "bytecodePosition",
            };
            write!(
                out,
                "\"{}\" : {{\"{}\" : {}, \"reducer\" : \"{}\", \"phase\" : \"{}\"}}",
                id.index(),
                key,
                origin.created_from.unwrap_or_default(),
                origin.reducer_name,
                origin.phase_name
            )?;
        }
        out.write_char('}')
    }
}

/// Restores the previous phase name on drop.
pub struct PhaseScope<'t, 'zone> {
    table: &'t NodeOriginTable<'zone>,
    previous: &'static str,
}

impl Drop for PhaseScope<'_, '_> {
    fn drop(&mut self) {
        self.table.current_phase_name.set(self.previous);
    }
}
