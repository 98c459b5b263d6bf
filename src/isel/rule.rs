// This module defines selection rules: a Matcher paired with a Rewrite that shapes the
// same-id target node. The generic rewrite (n2n) copies opcode shape verbatim: chain and
// every operand by id, with the type lowered through the table. The simple rewrite sets
// a new opcode, carries the chain over, and then runs an ordered list of transforms that
// copy a captured node's immediate, copy a captured node as an operand, or lower the
// type; this is what collapses e.g. add(imm, x) into one reg-imm instruction. Custom
// rewrites are plain function pointers for shapes neither form covers. Because target
// node ids equal source ids, "the target counterpart of node n" is n itself.

//! Selection rules and rewrite actions.

use std::fmt;

use super::lowering::TypeLowering;
use super::matcher::{eat_silent, sel, Matcher};
use super::Target;
use crate::core::dag::{Node, NodeId};
use crate::core::error::CompileError;
use crate::ir::{IrDag, IrNode, IrOpcode};

/// One step of a simple rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Append immediate `index` of the node in capture slot `capture`.
    CopyImm { capture: usize, index: usize },
    /// Append the target counterpart of the node in capture slot `capture`.
    CopyOperand { capture: usize },
    /// Set the target type from the lowered source type.
    MapType,
}

pub const fn copy_imm(capture: usize, index: usize) -> Transform {
    Transform::CopyImm { capture, index }
}

pub const fn copy_operand(capture: usize) -> Transform {
    Transform::CopyOperand { capture }
}

pub const fn map_type() -> Transform {
    Transform::MapType
}

/// Everything a rewrite may look at.
pub struct RewriteCtx<'a, T: Target> {
    pub source: &'a IrDag,
    pub node: &'a IrNode,
    pub captures: &'a [Option<NodeId>],
    pub lowering: &'a TypeLowering<T::Type>,
}

impl<T: Target> RewriteCtx<'_, T> {
    /// Node recorded in capture slot `slot`.
    pub fn capture(&self, slot: usize) -> Result<NodeId, CompileError> {
        self.captures
            .get(slot)
            .copied()
            .flatten()
            .ok_or_else(|| self.invalid(format!("capture slot {slot} is empty")))
    }

    pub fn lower_type(&self) -> Result<T::Type, CompileError> {
        self.lowering
            .lower_token(self.node.ty)
            .ok_or_else(|| CompileError::IllegalType {
                node: self.node.id(),
                ty: self.node.ty.to_string(),
                reason: "non-lowerable",
            })
    }

    /// The matched node has a shape the rule cannot lower.
    fn unsupported(&self) -> CompileError {
        CompileError::UnsupportedPattern {
            node: self.node.id(),
            opcode: self.node.opcode.name().to_string(),
        }
    }

    fn invalid(&self, reason: String) -> CompileError {
        CompileError::InvalidRule {
            opcode: self.node.opcode.name().to_string(),
            reason,
        }
    }
}

/// Hand-written rewrite for shapes the declarative forms do not cover.
pub type CustomRewrite<T> = fn(&RewriteCtx<'_, T>, &mut Node<<T as Target>::Opcode, <T as Target>::Type>) -> Result<(), CompileError>;

/// How a matched node is turned into its target counterpart.
pub enum Rewrite<T: Target> {
    Generic { opcode: T::Opcode },
    Simple { opcode: T::Opcode, steps: Vec<Transform> },
    Custom(CustomRewrite<T>),
}

impl<T: Target> Rewrite<T> {
    pub fn apply(&self, ctx: &RewriteCtx<'_, T>, target: &mut Node<T::Opcode, T::Type>) -> Result<(), CompileError> {
        match self {
            Rewrite::Generic { opcode } => {
                target.opcode = *opcode;
                target.chain = ctx.node.chain;
                target.operands.extend_from_slice(&ctx.node.operands);
                target.ty = ctx.lower_type()?;
                Ok(())
            }
            Rewrite::Simple { opcode, steps } => {
                target.opcode = *opcode;
                target.chain = ctx.node.chain;
                for step in steps {
                    match *step {
                        Transform::CopyImm { capture, index } => {
                            let captured = &ctx.source[ctx.capture(capture)?];
                            let imm = captured.imm.get(index).copied().ok_or_else(|| ctx.unsupported())?;
                            target.imm.push(imm);
                        }
                        Transform::CopyOperand { capture } => {
                            target.operands.push(ctx.capture(capture)?);
                        }
                        Transform::MapType => target.ty = ctx.lower_type()?,
                    }
                }
                Ok(())
            }
            Rewrite::Custom(f) => f(ctx, target),
        }
    }
}

impl<T: Target> fmt::Debug for Rewrite<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rewrite::Generic { opcode } => f.debug_struct("Generic").field("opcode", opcode).finish(),
            Rewrite::Simple { opcode, steps } => f
                .debug_struct("Simple")
                .field("opcode", opcode)
                .field("steps", steps)
                .finish(),
            Rewrite::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A matcher paired with its rewrite.
#[derive(Debug)]
pub struct Rule<T: Target> {
    pub matcher: Matcher,
    pub rewrite: Rewrite<T>,
}

impl<T: Target> Rule<T> {
    /// Same shape, new opcode and lowered type.
    ///
    /// Matches nodes of `source` that have at least its declared operand count.
    pub fn n2n(source: IrOpcode, opcode: T::Opcode) -> Self {
        Self {
            matcher: sel(source, vec![eat_silent(); source.operand_count()]),
            rewrite: Rewrite::Generic { opcode },
        }
    }

    pub fn simple(matcher: Matcher, opcode: T::Opcode, steps: impl IntoIterator<Item = Transform>) -> Self {
        Self {
            matcher,
            rewrite: Rewrite::Simple {
                opcode,
                steps: steps.into_iter().collect(),
            },
        }
    }

    pub fn custom(matcher: Matcher, rewrite: CustomRewrite<T>) -> Self {
        Self {
            matcher,
            rewrite: Rewrite::Custom(rewrite),
        }
    }
}
