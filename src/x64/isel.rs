// This module is the x86 instance of the generic selection engine. It names the target
// (X86 with X86Opcode/X86Type), lowers the unsigned integer primitives to operand widths
// (BOOL and every pointer class have no x86 width and lower to NONE) and lists the
// rules: an immediate load becomes
// MOV_ri, an ADD with an immediate on either side folds it into ADD_ri, a SUB folds only
// an immediate right operand into SUB_ri, and everything else falls back to the
// register-register forms. The table is built on first use and shared through an Arc.
// MUL/UDIV/SDIV have no rules and are reported as unsupported patterns.

//! x86 instruction selection.

use std::sync::{Arc, OnceLock};

use super::instr::{X86Opcode, X86Type};
use crate::core::dag::Dag;
use crate::core::error::{invariant_failed, Submodule};
use crate::core::pass::{Pipeline, Then};
use crate::ir::{IrDag, IrOpcode};
use crate::isel::{
    copy_imm, copy_operand, eat, map_type, sel, sel_cap, sel_comm, GenericIsel, IselDagCheck, NormalizePointers, Rule,
    SelectorTable, Target, TypeLowering,
};

/// The x86 selection target.
#[derive(Debug, Clone, Copy)]
pub struct X86;

impl Target for X86 {
    type Opcode = X86Opcode;
    type Type = X86Type;
}

pub type X86Dag = Dag<X86Opcode, X86Type>;

pub const X86_TYPE_LOWERING: TypeLowering<X86Type> = TypeLowering {
    none: X86Type::None,
    u8: X86Type::U8,
    u16: X86Type::U16,
    u32: X86Type::U32,
    u64: X86Type::U64,
    bool: X86Type::None,
    ptr: X86Type::None,
};

/// Selection pass name used in diagnostics.
pub const X86_ISEL_PASS: &str = "cg::x86::isel";

fn x86_rules() -> Vec<Rule<X86>> {
    vec![
        Rule::simple(
            sel_comm(IrOpcode::Add, sel_cap(IrOpcode::Imm, []), eat()),
            X86Opcode::AddRi,
            [copy_imm(0, 0), copy_operand(1), map_type()],
        ),
        Rule::n2n(IrOpcode::Add, X86Opcode::AddRr),
        Rule::simple(
            sel(IrOpcode::Sub, [eat(), sel_cap(IrOpcode::Imm, [])]),
            X86Opcode::SubRi,
            [copy_imm(1, 0), copy_operand(0), map_type()],
        ),
        Rule::n2n(IrOpcode::Sub, X86Opcode::SubRr),
        Rule::simple(sel_cap(IrOpcode::Imm, []), X86Opcode::MovRi, [map_type(), copy_imm(0, 0)]),
    ]
}

/// The process-wide x86 selector table.
pub fn selector_table() -> Arc<SelectorTable<X86>> {
    static TABLE: OnceLock<Arc<SelectorTable<X86>>> = OnceLock::new();
    TABLE
        .get_or_init(|| match SelectorTable::new(X86_TYPE_LOWERING, x86_rules()) {
            Ok(table) => Arc::new(table),
            Err(err) => invariant_failed(Submodule::Isel, format!("x86 rule set rejected: {err}")),
        })
        .clone()
}

pub fn x86_isel() -> GenericIsel<X86> {
    GenericIsel::new(X86_ISEL_PASS, selector_table())
}

/// IR preparation passes followed by x86 selection.
pub type X86Compile = Then<Pipeline<IrDag>, GenericIsel<X86>, IrDag>;

/// Full IR to x86 compile: pointer normalization, the isel DAG check, then selection.
pub fn compile_pipeline() -> X86Compile {
    let mut prepare = Pipeline::<IrDag>::default();
    prepare.push(NormalizePointers).push(IselDagCheck);
    Then::new(prepare, x86_isel())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dag::{Immediate, NodeId};
    use crate::core::dot::to_dot;
    use crate::core::error::CompileError;
    use crate::core::pass::Pass;
    use crate::core::types::{Primitive, TypeDescId, TypeToken};

    /// `ADD(SUB(imm, imm), SUB(imm, imm))` over a single shared `IMM(u32, 1)`.
    fn sub_sub_add() -> IrDag {
        let mut dag = IrDag::new();
        let one = dag.load_imm(Primitive::U32, 1);
        let a = dag.binary(IrOpcode::Sub, Primitive::U32, one, one);
        let b = dag.binary(IrOpcode::Sub, Primitive::U32, one, one);
        let root = dag.binary(IrOpcode::Add, Primitive::U32, a, b);
        dag.set_root(root);
        dag
    }

    #[test]
    fn test_end_to_end_selection() {
        let out = compile_pipeline().transform(sub_sub_add()).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out.root(), Some(NodeId(3)));

        let mov = &out[NodeId(0)];
        assert_eq!(mov.opcode, X86Opcode::MovRi);
        assert_eq!(mov.ty, X86Type::U32);
        assert_eq!(mov.imm, vec![Immediate::U64(1)]);
        assert!(mov.operands.is_empty());

        for sub in [NodeId(1), NodeId(2)] {
            let sub = &out[sub];
            assert_eq!(sub.opcode, X86Opcode::SubRi);
            assert_eq!(sub.imm, vec![Immediate::U64(1)]);
            assert_eq!(sub.operands, vec![NodeId(0)]);
            assert_eq!(sub.ty, X86Type::U32);
        }

        let add = &out[NodeId(3)];
        assert_eq!(add.opcode, X86Opcode::AddRr);
        assert_eq!(add.operands, vec![NodeId(1), NodeId(2)]);
        assert!(add.imm.is_empty());
    }

    #[test]
    fn test_add_immediate_folds_from_either_side() {
        for swap in [false, true] {
            let mut dag = IrDag::new();
            let imm = dag.load_imm(Primitive::U16, 5);
            let x = dag.load_imm(Primitive::U16, 6);
            let x = dag.binary(IrOpcode::Sub, Primitive::U16, x, x);
            let (lhs, rhs) = if swap { (x, imm) } else { (imm, x) };
            let add = dag.binary(IrOpcode::Add, Primitive::U16, lhs, rhs);
            dag.set_root(add);

            let out = x86_isel().transform(dag).unwrap();
            assert_eq!(out[add].opcode, X86Opcode::AddRi, "swap = {swap}");
            assert_eq!(out[add].imm, vec![Immediate::U64(5)]);
            assert_eq!(out[add].operands, vec![x]);
            assert_eq!(out[add].ty, X86Type::U16);
        }
    }

    #[test]
    fn test_sub_with_left_immediate_stays_register_form() {
        let mut dag = IrDag::new();
        let imm = dag.load_imm(Primitive::U64, 9);
        let x = dag.load_imm(Primitive::U64, 2);
        let x = dag.binary(IrOpcode::Add, Primitive::U64, x, x);
        let sub = dag.binary(IrOpcode::Sub, Primitive::U64, imm, x);

        let out = x86_isel().transform(dag).unwrap();
        assert_eq!(out[sub].opcode, X86Opcode::SubRr);
        assert_eq!(out[sub].operands, vec![imm, x]);
        assert!(out[sub].imm.is_empty());
    }

    #[test]
    fn test_unsupported_opcodes_are_rejected() {
        for opcode in [IrOpcode::Mul, IrOpcode::UDiv, IrOpcode::SDiv] {
            let mut dag = IrDag::new();
            let a = dag.load_imm(Primitive::U32, 4);
            let node = dag.binary(opcode, Primitive::U32, a, a);
            dag.set_root(node);

            let err = x86_isel().transform(dag).unwrap_err();
            assert_eq!(err.node(), Some(node));
            assert_eq!(err.pass(), Some(X86_ISEL_PASS));
            assert!(
                matches!(err.error(), CompileError::UnsupportedPattern { opcode: name, .. } if name == opcode.name()),
                "{opcode:?}"
            );
        }

        let mut dag = IrDag::new();
        let none = dag.create(None, IrOpcode::None, Primitive::U32.into(), [], []);
        assert_eq!(x86_isel().transform(dag).unwrap_err().node(), Some(none));
    }

    #[test]
    fn test_binary_with_missing_operand_is_rejected() {
        for opcode in [IrOpcode::Add, IrOpcode::Sub] {
            let mut dag = IrDag::new();
            let a = dag.load_imm(Primitive::U8, 1);
            let node = dag.create(None, opcode, Primitive::U8.into(), [a], []);
            let err = x86_isel().transform(dag).unwrap_err();
            assert!(matches!(err.error(), CompileError::UnsupportedPattern { node: n, .. } if *n == node));
        }
    }

    #[test]
    fn test_bool_and_pointers_lower_to_none() {
        assert_eq!(X86_TYPE_LOWERING.lower(Primitive::Bool), X86Type::None);
        assert_eq!(X86_TYPE_LOWERING.lower(Primitive::Ptr), X86Type::None);
        assert_eq!(X86_TYPE_LOWERING.lower(Primitive::PtrU64), X86Type::None);
        assert_eq!(X86_TYPE_LOWERING.lower(Primitive::U8), X86Type::U8);
        assert_eq!(X86_TYPE_LOWERING.lower(Primitive::U64), X86Type::U64);

        let mut dag = IrDag::new();
        let p = dag.load_imm(Primitive::PtrU32, 0x1000);
        let q = dag.load_imm(Primitive::Ptr, 0x2000);
        let flag = dag.load_imm(Primitive::Bool, 1);
        let sum = dag.binary(IrOpcode::Add, Primitive::PtrU32, p, q);
        dag.set_root(sum);

        let out = compile_pipeline().transform(dag).unwrap();
        assert_eq!(out[p].ty, X86Type::None);
        assert_eq!(out[q].ty, X86Type::None);
        assert_eq!(out[flag].ty, X86Type::None);
        assert_eq!(out[sum].opcode, X86Opcode::AddRi);
        assert_eq!(out[sum].imm, vec![Immediate::U64(0x1000)]);
        assert_eq!(out[sum].ty, X86Type::None);
    }

    #[test]
    fn test_compile_stops_at_dag_check() {
        let mut dag = sub_sub_add();
        dag.create(None, IrOpcode::Imm, TypeToken::Descriptor(TypeDescId(1)), [], [Immediate::U64(0)]);

        let compile = compile_pipeline();
        assert_eq!(
            compile.name(),
            "pipeline(cg::ir::lower_to_isel, cg::isel::dag_check) -> cg::x86::isel"
        );
        let err = compile.transform(dag).unwrap_err();
        assert_eq!(err.pass(), Some("cg::isel::dag_check"));
        assert_eq!(err.node(), Some(NodeId(4)));
    }

    #[test]
    fn test_table_is_built_once_and_shared() {
        let table = selector_table();
        assert!(Arc::ptr_eq(&table, &selector_table()));
        assert_eq!(table.len(), 5);
        assert_eq!(table.rules_for(IrOpcode::Add).len(), 2);
        assert!(table.rules_for(IrOpcode::Mul).is_empty());

        let roots: Vec<Option<NodeId>> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..4)
                .map(|_| s.spawn(|| x86_isel().transform(sub_sub_add()).map(|dag| dag.root())))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap().unwrap()).collect()
        });
        assert!(roots.iter().all(|root| *root == Some(NodeId(3))));
    }

    #[test]
    fn test_dot_dump_of_selected_dag() {
        let out = compile_pipeline().transform(sub_sub_add()).unwrap();
        let dot = to_dot(&out);
        assert!(dot.contains("mc_x86_opcode::ADD_rr"));
        assert!(dot.contains("mc_x86_opcode::SUB_ri"));
        assert!(dot.contains("mc_x86_opcode::MOV_ri"));
        for id in 0..4 {
            assert!(dot.contains(&format!("node{id} ")), "node{id} missing");
        }
    }
}
