// This module implements the graph scaffold handed to the backend. Graph is a zone-allocated
// node list: each node carries an operator from one of the registries and a zone slice of
// input node ids, so the whole graph is released with the zone. Diagnostic tables can be
// attached to the graph as decorators; every node added afterwards is stamped with the
// table's current source position or origin. MachineGraph bundles the graph with the
// common and machine operator registries and caches constant nodes so repeated requests
// for the same constant share one node. The backend may extend the graph; the registries
// stay read-only.

//! Operation graph and machine graph scaffold.

use super::diagnostics::{NodeOriginTable, SourcePositionTable};
use super::operators::{CommonOperatorBuilder, MachineOperatorBuilder, Operator};
use super::zone::Zone;
use bumpalo::{collections::Vec as BumpVec, Bump};
use hashbrown::{DefaultHashBuilder, HashMap};
use std::fmt;

/// Index of a node in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A graph node.
#[derive(Debug, Clone, Copy)]
pub struct Node<'zone> {
    id: NodeId,
    op: &'zone Operator,
    inputs: &'zone [NodeId],
}

impl<'zone> Node<'zone> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn op(&self) -> &'zone Operator {
        self.op
    }

    pub fn inputs(&self) -> &'zone [NodeId] {
        self.inputs
    }
}

/// Zone-allocated operation graph.
pub struct Graph<'zone> {
    zone: &'zone Zone,
    nodes: BumpVec<'zone, Node<'zone>>,
    start: Option<NodeId>,
    end: Option<NodeId>,
    source_positions: Option<&'zone SourcePositionTable<'zone>>,
    node_origins: Option<&'zone NodeOriginTable<'zone>>,
}

impl<'zone> Graph<'zone> {
    pub fn new(zone: &'zone Zone) -> Self {
        Self {
            zone,
            nodes: BumpVec::new_in(zone.bump()),
            start: None,
            end: None,
            source_positions: None,
            node_origins: None,
        }
    }

    pub fn zone(&self) -> &'zone Zone {
        self.zone
    }

    /// Add a node; attached decorators see it immediately.
    pub fn add_node(&mut self, op: &'zone Operator, inputs: &[NodeId]) -> NodeId {
        debug_assert_eq!(
            inputs.len(),
            op.input_count(),
            "{} expects {} inputs",
            op,
            op.input_count()
        );
        debug_assert!(inputs.iter().all(|input| input.index() < self.nodes.len()));

        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node {
            id,
            op,
            inputs: self.zone.alloc_slice_copy(inputs),
        });

        if let Some(positions) = self.source_positions {
            positions.record_new_node(id);
        }
        if let Some(origins) = self.node_origins {
            origins.record_new_node(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> &Node<'zone> {
        &self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node<'zone>> {
        self.nodes.iter()
    }

    pub fn set_start(&mut self, start: NodeId) {
        self.start = Some(start);
    }

    pub fn start(&self) -> Option<NodeId> {
        self.start
    }

    pub fn set_end(&mut self, end: NodeId) {
        self.end = Some(end);
    }

    pub fn end(&self) -> Option<NodeId> {
        self.end
    }

    pub fn attach_source_positions(&mut self, table: &'zone SourcePositionTable<'zone>) {
        self.source_positions = Some(table);
    }

    pub fn attach_node_origins(&mut self, table: &'zone NodeOriginTable<'zone>) {
        self.node_origins = Some(table);
    }

    pub fn source_positions(&self) -> Option<&'zone SourcePositionTable<'zone>> {
        self.source_positions
    }

    pub fn node_origins(&self) -> Option<&'zone NodeOriginTable<'zone>> {
        self.node_origins
    }
}

impl fmt::Display for Graph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "{}: {}(", node.id, node.op)?;
            for (i, input) in node.inputs.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", input)?;
            }
            writeln!(f, ")")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ConstantKey {
    Int32(i32),
    Int64(i64),
    Float32(u32),
    Float64(u64),
}

/// Graph plus the operator registries the backend builds with.
pub struct MachineGraph<'zone> {
    graph: &'zone mut Graph<'zone>,
    common: &'zone CommonOperatorBuilder<'zone>,
    machine: &'zone MachineOperatorBuilder<'zone>,
    constants: HashMap<ConstantKey, NodeId, DefaultHashBuilder, &'zone Bump>,
}

impl<'zone> MachineGraph<'zone> {
    pub fn new(
        graph: &'zone mut Graph<'zone>,
        common: &'zone CommonOperatorBuilder<'zone>,
        machine: &'zone MachineOperatorBuilder<'zone>,
    ) -> Self {
        let zone = graph.zone();
        Self {
            graph,
            common,
            machine,
            constants: HashMap::new_in(zone.bump()),
        }
    }

    pub fn graph(&self) -> &Graph<'zone> {
        &*self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph<'zone> {
        &mut *self.graph
    }

    pub fn common(&self) -> &'zone CommonOperatorBuilder<'zone> {
        self.common
    }

    pub fn machine(&self) -> &'zone MachineOperatorBuilder<'zone> {
        self.machine
    }

    pub fn zone(&self) -> &'zone Zone {
        self.graph.zone()
    }

    fn cached_constant(&mut self, key: ConstantKey, op: impl FnOnce() -> &'zone Operator) -> NodeId {
        if let Some(&node) = self.constants.get(&key) {
            return node;
        }
        let node = self.graph.add_node(op(), &[]);
        self.constants.insert(key, node);
        node
    }

    pub fn int32_constant(&mut self, value: i32) -> NodeId {
        let common = self.common;
        self.cached_constant(ConstantKey::Int32(value), || common.int32_constant(value))
    }

    pub fn int64_constant(&mut self, value: i64) -> NodeId {
        let common = self.common;
        self.cached_constant(ConstantKey::Int64(value), || common.int64_constant(value))
    }

    /// Pointer-sized constant.
    pub fn intptr_constant(&mut self, value: i64) -> NodeId {
        if self.machine.is_64() {
            self.int64_constant(value)
        } else {
            self.int32_constant(value as i32)
        }
    }

    pub fn float32_constant(&mut self, value: f32) -> NodeId {
        let common = self.common;
        self.cached_constant(ConstantKey::Float32(value.to_bits()), || {
            common.float32_constant(value)
        })
    }

    pub fn float64_constant(&mut self, value: f64) -> NodeId {
        let common = self.common;
        self.cached_constant(ConstantKey::Float64(value.to_bits()), || {
            common.float64_constant(value)
        })
    }
}
