// This module holds the two passes that do the actual selection work. NormalizePointers
// is the housekeeping pre-pass that folds every typed pointer class into the generic
// PTR primitive before matching. GenericIsel is the selection pass itself: it allocates
// a target DAG with one placeholder per IR node, so every IR id already has a target
// counterpart, then walks the IR nodes in id order, picks the first rule whose fast
// match succeeds, fills the capture buffer and lets the rule's rewrite mutate the
// same-id placeholder in place. Capture buffers live in a bumpalo arena that is reset
// between nodes. A node no rule accepts is a fatal UnsupportedPattern diagnostic. The
// target root is the counterpart of the IR root. The selector table is shared through
// an Arc and never mutated here.

//! Pointer normalization and generic instruction selection.

use std::sync::Arc;

use bumpalo::Bump;

use super::rule::RewriteCtx;
use super::table::SelectorTable;
use super::{Target, TargetDag};
use crate::core::error::{CompileError, Diagnostic, PassResult, Submodule};
use crate::core::pass::Pass;
use crate::core::types::{Primitive, TypeToken};
use crate::ir::IrDag;

/// Rewrites typed pointer types (`P_U8` .. `P_BOOL`) to the generic `PTR` primitive.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizePointers;

impl Pass<IrDag, IrDag> for NormalizePointers {
    fn name(&self) -> String {
        "cg::ir::lower_to_isel".to_string()
    }

    fn transform(&self, mut dag: IrDag) -> PassResult<IrDag> {
        for node in dag.nodes_mut() {
            if node.ty.is_pointer() {
                node.ty = TypeToken::Primitive(Primitive::Ptr);
            }
        }
        Ok(dag)
    }
}

/// Table-driven selection from IR into target `T`.
pub struct GenericIsel<T: Target> {
    name: String,
    table: Arc<SelectorTable<T>>,
}

impl<T: Target> GenericIsel<T> {
    pub fn new(name: impl Into<String>, table: Arc<SelectorTable<T>>) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }

    pub fn table(&self) -> &Arc<SelectorTable<T>> {
        &self.table
    }
}

impl<T: Target> Pass<IrDag, TargetDag<T>> for GenericIsel<T> {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn transform(&self, dag: IrDag) -> PassResult<TargetDag<T>> {
        log::debug!("{}: selecting {} nodes", self.name, dag.len());

        let mut target = TargetDag::<T>::with_placeholders(dag.len());
        let mut scratch = Bump::new();

        for node in dag.nodes() {
            scratch.reset();
            let id = node.id();

            let Some((index, rule)) = self.table.select(&dag, id) else {
                log::debug!("{}: no rule for {} ({}, {})", self.name, id, node.opcode.name(), node.ty);
                return Err(Diagnostic::new(
                    CompileError::UnsupportedPattern {
                        node: id,
                        opcode: node.opcode.name().to_string(),
                    },
                    Submodule::Isel,
                )
                .in_pass(self.name.clone()));
            };
            log::trace!("{}: {} ({}) -> rule #{}", self.name, id, node.opcode.name(), index);

            let mut captures = bumpalo::vec![in &scratch; None; rule.matcher.eat_size()];
            rule.matcher.capture_into(&dag, id, &mut captures);

            let ctx = RewriteCtx {
                source: &dag,
                node,
                captures: &captures,
                lowering: self.table.lowering(),
            };
            rule.rewrite.apply(&ctx, &mut target[id]).map_err(|error| {
                Diagnostic::new(error, Submodule::Isel)
                    .in_pass(self.name.clone())
                    .with_note(format!("while rewriting {} with rule #{}", id, index))
            })?;
        }

        if let Some(root) = dag.root() {
            target.set_root(root);
        }
        Ok(target)
    }
}
