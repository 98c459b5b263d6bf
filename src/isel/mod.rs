// This module is the instruction-selection engine. It is target independent: a target
// only names its opcode and type enums through the Target trait and supplies a
// SelectorTable (rules plus a type-lowering table). The engine then validates IR DAGs
// (check), normalizes typed pointers (pass::NormalizePointers) and rewrites every IR
// node into a same-id target node using the first matching rule (pass::GenericIsel).

//! Instruction selection by declarative tree patterns.
//!
//! # Building a target
//!
//! ```ignore
//! let table = SelectorTable::<MyTarget>::new(LOWERING, [
//!     Rule::simple(
//!         sel_comm(IrOpcode::Add, sel_cap(IrOpcode::Imm, []), eat()),
//!         MyOp::AddRi,
//!         [copy_imm(0, 0), copy_operand(1), map_type()],
//!     ),
//!     Rule::n2n(IrOpcode::Add, MyOp::AddRr),
//! ])?;
//! let isel = GenericIsel::new("cg::my::isel", Arc::new(table));
//! ```

use std::fmt::Debug;

use crate::core::dag::{Dag, Node};

pub mod check;
pub mod lowering;
pub mod matcher;
pub mod pass;
pub mod rule;
pub mod table;

pub use check::IselDagCheck;
pub use lowering::TypeLowering;
pub use matcher::{capture, eat, eat_silent, sel, sel_cap, sel_comm, skip, Matcher};
pub use pass::{GenericIsel, NormalizePointers};
pub use rule::{copy_imm, copy_operand, map_type, Rewrite, RewriteCtx, Rule, Transform};
pub use table::SelectorTable;

/// A machine instruction set instruction selection can target.
pub trait Target: Debug + Send + Sync + 'static {
    /// Target opcodes; `Default` is the placeholder no-op.
    type Opcode: Copy + Default + Debug + PartialEq + Send + Sync + 'static;
    /// Target value types; `Default` is the placeholder no-type.
    type Type: Copy + Default + Debug + PartialEq + Send + Sync + 'static;
}

pub type TargetDag<T> = Dag<<T as Target>::Opcode, <T as Target>::Type>;
pub type TargetNode<T> = Node<<T as Target>::Opcode, <T as Target>::Type>;
