// This module provides the generic instruction DAG shared by the target-independent IR
// and every target instruction set. A Dag owns its nodes in an append-only arena (a Vec)
// and all edges are NodeId indices into that arena, so a reference can never dangle and
// a node's id is its position. Each node carries an opcode, a type, ordered operand
// edges, ordered immediates and one optional chain edge used for side-effect ordering.
// Nodes are created through an explicit builder taking operands and immediates as two
// separate collections. Instruction selection pre-allocates same-id placeholders with
// with_placeholders and then rewrites them in place through IndexMut. Traversal is a
// breadth-first walk from the root over operand edges only.

//! Arena-backed instruction DAG.

use std::collections::VecDeque;
use std::fmt;
use std::ops::{Index, IndexMut};

use super::error::Submodule;
use crate::invariant;

/// Stable index of a node inside its owning [`Dag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Inline compile-time constant attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Immediate {
    U64(u64),
}

impl Immediate {
    pub const fn as_u64(self) -> u64 {
        match self {
            Immediate::U64(v) => v,
        }
    }
}

impl From<u64> for Immediate {
    fn from(v: u64) -> Self {
        Immediate::U64(v)
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::U64(v) => write!(f, "{v}"),
        }
    }
}

/// One instruction or value in a [`Dag`].
#[derive(Debug, Clone, PartialEq)]
pub struct Node<O, T> {
    id: NodeId,
    pub opcode: O,
    pub ty: T,
    pub operands: Vec<NodeId>,
    pub imm: Vec<Immediate>,
    pub chain: Option<NodeId>,
}

impl<O, T> Node<O, T> {
    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// Append-only owning container of nodes plus a designated root.
#[derive(Debug, Clone, PartialEq)]
pub struct Dag<O, T> {
    nodes: Vec<Node<O, T>>,
    root: Option<NodeId>,
}

impl<O, T> Default for Dag<O, T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }
}

impl<O: Copy, T: Copy> Dag<O, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node and return its id.
    ///
    /// Every operand and the chain must already exist in this DAG.
    pub fn create(
        &mut self,
        chain: Option<NodeId>,
        opcode: O,
        ty: T,
        operands: impl IntoIterator<Item = NodeId>,
        imm: impl IntoIterator<Item = Immediate>,
    ) -> NodeId {
        let id = next_id(self.nodes.len());
        let operands: Vec<NodeId> = operands.into_iter().collect();
        for &operand in &operands {
            self.check_ref(operand);
        }
        if let Some(chain) = chain {
            self.check_ref(chain);
        }

        self.nodes.push(Node {
            id,
            opcode,
            ty,
            operands,
            imm: imm.into_iter().collect(),
            chain,
        });
        id
    }

    /// Start building a node with the given opcode and type.
    pub fn build(&mut self, opcode: O, ty: T) -> NodeBuilder<'_, O, T> {
        NodeBuilder {
            dag: self,
            opcode,
            ty,
            chain: None,
            operands: Vec::new(),
            imm: Vec::new(),
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Designate the node whose value this DAG computes.
    pub fn set_root(&mut self, id: NodeId) {
        self.check_ref(id);
        self.root = Some(id);
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<O, T>> {
        self.nodes.get(id.index())
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> &[Node<O, T>] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node<O, T>] {
        &mut self.nodes
    }

    /// Breadth-first walk from the root over operand edges, visiting each node once.
    pub fn visit(&self, mut callback: impl FnMut(&Node<O, T>)) {
        let Some(root) = self.root else {
            return;
        };

        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::new();
        queue.push_back(root);

        while let Some(id) = queue.pop_front() {
            if visited[id.index()] {
                continue;
            }
            visited[id.index()] = true;

            let node = &self.nodes[id.index()];
            callback(node);
            queue.extend(node.operands.iter().copied());
        }
    }

    /// Ids of the nodes reachable from the root, in [`Dag::visit`] order.
    pub fn reachable(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.visit(|node| ids.push(node.id()));
        ids
    }

    #[track_caller]
    fn check_ref(&self, id: NodeId) {
        invariant!(
            Submodule::Misc,
            id.index() < self.nodes.len(),
            "node {} referenced outside its DAG ({} nodes)",
            id,
            self.nodes.len()
        );
    }
}

/// Id of the node appended after `len` existing ones.
#[track_caller]
fn next_id(len: usize) -> NodeId {
    let index = u32::try_from(len);
    invariant!(Submodule::Misc, index.is_ok(), "DAG exceeds {} nodes", u32::MAX);
    NodeId(index.unwrap_or(u32::MAX))
}

impl<O: Copy + Default, T: Copy + Default> Dag<O, T> {
    /// A DAG of `count` placeholder nodes with default opcode and type.
    pub fn with_placeholders(count: usize) -> Self {
        let mut dag = Self::new();
        dag.nodes.reserve(count);
        for _ in 0..count {
            dag.create(None, O::default(), T::default(), [], []);
        }
        dag
    }
}

impl<O, T> Index<NodeId> for Dag<O, T> {
    type Output = Node<O, T>;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.index()]
    }
}

impl<O, T> IndexMut<NodeId> for Dag<O, T> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        &mut self.nodes[id.index()]
    }
}

/// Fluent builder returned by [`Dag::build`].
pub struct NodeBuilder<'a, O, T> {
    dag: &'a mut Dag<O, T>,
    opcode: O,
    ty: T,
    chain: Option<NodeId>,
    operands: Vec<NodeId>,
    imm: Vec<Immediate>,
}

impl<'a, O: Copy, T: Copy> NodeBuilder<'a, O, T> {
    pub fn chain(mut self, chain: NodeId) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn operand(mut self, operand: NodeId) -> Self {
        self.operands.push(operand);
        self
    }

    pub fn operands(mut self, operands: impl IntoIterator<Item = NodeId>) -> Self {
        self.operands.extend(operands);
        self
    }

    pub fn imm(mut self, imm: impl Into<Immediate>) -> Self {
        self.imm.push(imm.into());
        self
    }

    pub fn finish(self) -> NodeId {
        self.dag.create(self.chain, self.opcode, self.ty, self.operands, self.imm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    enum Op {
        #[default]
        Nop,
        Leaf,
        Pair,
    }

    fn diamond() -> (Dag<Op, u8>, [NodeId; 4]) {
        let mut dag = Dag::new();
        let a = dag.build(Op::Leaf, 0).imm(1u64).finish();
        let b = dag.build(Op::Pair, 0).operand(a).operand(a).finish();
        let c = dag.build(Op::Leaf, 0).imm(2u64).finish();
        let d = dag.build(Op::Pair, 0).operands([b, c]).chain(c).finish();
        dag.set_root(d);
        (dag, [a, b, c, d])
    }

    #[test]
    fn test_ids_follow_creation_order() {
        let (dag, ids) = diamond();
        assert_eq!(ids, [NodeId(0), NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(dag.len(), 4);
        for (i, node) in dag.nodes().iter().enumerate() {
            assert_eq!(node.id().index(), i);
        }
        assert_eq!(dag[NodeId(3)].chain, Some(NodeId(2)));
    }

    #[test]
    fn test_operands_and_immediates_kept_apart() {
        let mut dag: Dag<Op, u8> = Dag::new();
        let a = dag.create(None, Op::Leaf, 0, [], []);
        let b = dag.create(None, Op::Leaf, 0, [], []);
        let n = dag
            .build(Op::Pair, 1)
            .imm(7u64)
            .operand(b)
            .imm(9u64)
            .operand(a)
            .finish();

        assert_eq!(dag[n].operands, vec![b, a]);
        assert_eq!(dag[n].imm, vec![Immediate::U64(7), Immediate::U64(9)]);
    }

    #[test]
    fn test_visit_is_breadth_first_and_unique() {
        let (dag, [a, b, c, d]) = diamond();
        assert_eq!(dag.reachable(), vec![d, b, c, a]);
    }

    #[test]
    fn test_visit_skips_chain_and_unreachable() {
        let mut dag: Dag<Op, u8> = Dag::new();
        let side = dag.create(None, Op::Leaf, 0, [], []);
        let _orphan = dag.create(None, Op::Leaf, 0, [], []);
        let root = dag.create(Some(side), Op::Leaf, 0, [], []);
        dag.set_root(root);
        assert_eq!(dag.reachable(), vec![root]);
    }

    #[test]
    fn test_visit_without_root() {
        let (mut dag, _) = diamond();
        dag.root = None;
        assert!(dag.reachable().is_empty());
    }

    #[test]
    fn test_placeholders_are_mutable_in_place() {
        let mut dag: Dag<Op, u8> = Dag::with_placeholders(3);
        assert!(dag.nodes().iter().all(|n| n.opcode == Op::Nop && n.operands.is_empty()));

        // forward reference through a pre-allocated placeholder
        dag[NodeId(0)].operands.push(NodeId(2));
        dag[NodeId(0)].opcode = Op::Pair;
        assert_eq!(dag[NodeId(0)].operands, vec![NodeId(2)]);
    }

    #[test]
    #[should_panic(expected = "referenced outside its DAG")]
    fn test_foreign_root_fails_fast() {
        let mut dag: Dag<Op, u8> = Dag::new();
        dag.create(None, Op::Leaf, 0, [], []);
        dag.set_root(NodeId(5));
    }

    #[test]
    #[should_panic(expected = "referenced outside its DAG")]
    fn test_forward_reference_fails_fast() {
        let mut dag: Dag<Op, u8> = Dag::new();
        dag.create(None, Op::Pair, 0, [NodeId(0)], []);
    }

    #[test]
    fn test_next_id_follows_length() {
        assert_eq!(next_id(0), NodeId(0));
        assert_eq!(next_id(u32::MAX as usize), NodeId(u32::MAX));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "DAG exceeds 4294967295 nodes")]
    fn test_id_space_overflow_fails_fast() {
        next_id(u32::MAX as usize + 1);
    }
}
