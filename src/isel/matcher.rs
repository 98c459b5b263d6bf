// This module implements the matcher combinators used to describe instruction patterns.
// A Matcher is an immutable tree value evaluated against one IR node. Every matcher has
// a capture arity (eat_size), the number of slots it fills in the flat capture buffer
// handed to a rule's rewrite. Leaves consume one node (eat, eat_silent) or nothing
// (skip); sel constrains an opcode and matches nested matchers against operands in
// positional order; sel_comm tries both orientations of a two-operand node but always
// captures in matcher order, so a rewrite sees the left capture first regardless of
// which physical operand satisfied it; typed narrows any matcher to one scalar type;
// capture records the matched node itself in front of the nested captures.
// Matching is two-phase: fast_match answers yes/no without touching the buffer, and
// capture_into populates the buffer for a node already known to match. Both go through
// the same predicate so they can never disagree.

//! Tree-pattern matchers over IR DAG nodes.

use crate::core::dag::NodeId;
use crate::core::types::Primitive;
use crate::ir::{IrDag, IrOpcode};

/// A composable pattern over an IR node and its operand subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Any node; consumes one slot and captures the node.
    Eat,
    /// Any node; consumes one slot but leaves it empty.
    EatSilent,
    /// Always matches; consumes nothing.
    Skip,
    /// Fixed opcode with positional operand matchers.
    Sel { opcode: IrOpcode, operands: Vec<Matcher> },
    /// Fixed opcode with exactly two operands, matched in either order.
    SelComm {
        opcode: IrOpcode,
        lhs: Box<Matcher>,
        rhs: Box<Matcher>,
    },
    /// Inner matcher plus a required node type.
    Typed { ty: Primitive, inner: Box<Matcher> },
    /// Inner matcher plus a capture of the matched node itself.
    Capture(Box<Matcher>),
}

pub fn eat() -> Matcher {
    Matcher::Eat
}

pub fn eat_silent() -> Matcher {
    Matcher::EatSilent
}

pub fn skip() -> Matcher {
    Matcher::Skip
}

pub fn sel(opcode: IrOpcode, operands: impl IntoIterator<Item = Matcher>) -> Matcher {
    Matcher::Sel {
        opcode,
        operands: operands.into_iter().collect(),
    }
}

/// `capture(sel(opcode, operands))`
pub fn sel_cap(opcode: IrOpcode, operands: impl IntoIterator<Item = Matcher>) -> Matcher {
    capture(sel(opcode, operands))
}

pub fn sel_comm(opcode: IrOpcode, lhs: Matcher, rhs: Matcher) -> Matcher {
    Matcher::SelComm {
        opcode,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

pub fn capture(inner: Matcher) -> Matcher {
    Matcher::Capture(Box::new(inner))
}

impl Matcher {
    /// Narrow this matcher to nodes of type `ty`.
    ///
    /// Only `U8`..`U64` and `PTR` are valid; anything else is rejected when the
    /// selector table is built.
    pub fn typed(self, ty: Primitive) -> Matcher {
        Matcher::Typed {
            ty,
            inner: Box::new(self),
        }
    }

    /// Number of capture slots this matcher fills.
    pub fn eat_size(&self) -> usize {
        match self {
            Matcher::Eat | Matcher::EatSilent => 1,
            Matcher::Skip => 0,
            Matcher::Sel { operands, .. } => operands.iter().map(Matcher::eat_size).sum(),
            Matcher::SelComm { lhs, rhs, .. } => lhs.eat_size() + rhs.eat_size(),
            Matcher::Typed { inner, .. } => inner.eat_size(),
            Matcher::Capture(inner) => 1 + inner.eat_size(),
        }
    }

    /// Opcode this matcher roots on, if it constrains one.
    pub fn root_opcode(&self) -> Option<IrOpcode> {
        match self {
            Matcher::Sel { opcode, .. } | Matcher::SelComm { opcode, .. } => Some(*opcode),
            Matcher::Typed { inner, .. } | Matcher::Capture(inner) => inner.root_opcode(),
            Matcher::Eat | Matcher::EatSilent | Matcher::Skip => None,
        }
    }

    /// Check that every type narrowing in the tree names a scalar class.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Matcher::Eat | Matcher::EatSilent | Matcher::Skip => Ok(()),
            Matcher::Sel { operands, .. } => operands.iter().try_for_each(Matcher::validate),
            Matcher::SelComm { lhs, rhs, .. } => {
                lhs.validate()?;
                rhs.validate()
            }
            Matcher::Typed { ty, inner } => {
                if !ty.is_scalar_constraint() {
                    return Err(format!("type selection must be U8-U64 or PTR, got {ty}"));
                }
                inner.validate()
            }
            Matcher::Capture(inner) => inner.validate(),
        }
    }

    /// Structural check of `node` against this pattern, without captures.
    pub fn fast_match(&self, dag: &IrDag, node: NodeId) -> bool {
        match self {
            Matcher::Eat | Matcher::EatSilent | Matcher::Skip => true,
            Matcher::Sel { opcode, operands } => {
                let n = &dag[node];
                n.opcode == *opcode
                    && n.operands.len() >= operands.len()
                    && operands
                        .iter()
                        .zip(&n.operands)
                        .all(|(m, &operand)| m.fast_match(dag, operand))
            }
            Matcher::SelComm { opcode, lhs, rhs } => {
                let n = &dag[node];
                if n.opcode != *opcode || n.operands.len() != 2 {
                    return false;
                }
                let (a, b) = (n.operands[0], n.operands[1]);
                (lhs.fast_match(dag, a) && rhs.fast_match(dag, b)) || (rhs.fast_match(dag, a) && lhs.fast_match(dag, b))
            }
            Matcher::Typed { ty, inner } => {
                dag[node].ty.primitive() == Some(*ty) && inner.fast_match(dag, node)
            }
            Matcher::Capture(inner) => inner.fast_match(dag, node),
        }
    }

    /// Full match: check `node` and, on success, fill `out` with the captures.
    ///
    /// `out` must hold at least [`Matcher::eat_size`] slots.
    pub fn match_into(&self, dag: &IrDag, node: NodeId, out: &mut [Option<NodeId>]) -> bool {
        if !self.fast_match(dag, node) {
            return false;
        }
        self.capture_into(dag, node, out);
        true
    }

    /// Fill `out` for a node that already passed [`Matcher::fast_match`].
    pub fn capture_into(&self, dag: &IrDag, node: NodeId, out: &mut [Option<NodeId>]) {
        match self {
            Matcher::Eat => out[0] = Some(node),
            Matcher::EatSilent | Matcher::Skip => {}
            Matcher::Sel { operands, .. } => {
                let mut offset = 0;
                for (m, &operand) in operands.iter().zip(&dag[node].operands) {
                    let size = m.eat_size();
                    m.capture_into(dag, operand, &mut out[offset..offset + size]);
                    offset += size;
                }
            }
            Matcher::SelComm { lhs, rhs, .. } => {
                let (a, b) = (dag[node].operands[0], dag[node].operands[1]);
                let (left, right) = if lhs.fast_match(dag, a) && rhs.fast_match(dag, b) {
                    (a, b)
                } else {
                    (b, a)
                };
                let split = lhs.eat_size();
                lhs.capture_into(dag, left, &mut out[..split]);
                rhs.capture_into(dag, right, &mut out[split..]);
            }
            Matcher::Typed { inner, .. } => inner.capture_into(dag, node, out),
            Matcher::Capture(inner) => {
                out[0] = Some(node);
                inner.capture_into(dag, node, &mut out[1..]);
            }
        }
    }
}
