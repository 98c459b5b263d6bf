//! Structural precondition check run before instruction selection.
//!
//! Every node, reachable from the root or not, must carry one of the
//! primitive types selection understands.

use crate::core::error::{CompileError, Diagnostic, PassResult, Submodule};
use crate::core::pass::Pass;
use crate::core::types::Primitive;
use crate::ir::IrDag;

/// Rejects descriptor types and primitives outside `U8`..`U64`, `BOOL` and `PTR`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IselDagCheck;

impl Pass<IrDag, IrDag> for IselDagCheck {
    fn name(&self) -> String {
        "cg::isel::dag_check".to_string()
    }

    fn transform(&self, dag: IrDag) -> PassResult<IrDag> {
        for node in dag.nodes() {
            let reason = match node.ty.primitive() {
                None => "non-primitive",
                Some(Primitive::U8 | Primitive::U16 | Primitive::U32 | Primitive::U64 | Primitive::Bool | Primitive::Ptr) => {
                    continue
                }
                Some(_) => "primitive",
            };

            return Err(Diagnostic::new(
                CompileError::IllegalType {
                    node: node.id(),
                    ty: node.ty.to_string(),
                    reason,
                },
                Submodule::Isel,
            )
            .in_pass(self.name())
            .with_note(format!("In pass {}", self.name())));
        }
        Ok(dag)
    }
}
