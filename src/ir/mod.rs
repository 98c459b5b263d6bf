//! Target-independent instruction set.
//!
//! IR DAGs are [`Dag`]s over [`IrOpcode`] and [`TypeToken`]. They are produced
//! by the bytecode decoder (or built directly) and consumed by instruction
//! selection.

use crate::core::dag::{Dag, Immediate, Node, NodeId};
use crate::core::dot::InstrInfo;
use crate::core::types::TypeToken;

/// IR operation. Discriminants double as bytecode record tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum IrOpcode {
    #[default]
    None = 0,
    Imm = 1,
    Add = 2,
    Sub = 3,
    Mul = 4,
    UDiv = 5,
    SDiv = 6,
}

impl IrOpcode {
    pub const ALL: [IrOpcode; 7] = [
        IrOpcode::None,
        IrOpcode::Imm,
        IrOpcode::Add,
        IrOpcode::Sub,
        IrOpcode::Mul,
        IrOpcode::UDiv,
        IrOpcode::SDiv,
    ];

    pub fn from_raw(raw: u64) -> Option<Self> {
        Self::ALL.get(usize::try_from(raw).ok()?).copied()
    }

    pub const fn raw(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            IrOpcode::None => "NONE",
            IrOpcode::Imm => "IMM",
            IrOpcode::Add => "ADD",
            IrOpcode::Sub => "SUB",
            IrOpcode::Mul => "MUL",
            IrOpcode::UDiv => "UDIV",
            IrOpcode::SDiv => "SDIV",
        }
    }

    /// Number of operand edges a well-formed node of this opcode has.
    pub const fn operand_count(self) -> usize {
        match self {
            IrOpcode::None | IrOpcode::Imm => 0,
            IrOpcode::Add | IrOpcode::Sub | IrOpcode::Mul | IrOpcode::UDiv | IrOpcode::SDiv => 2,
        }
    }

    pub const fn is_binary(self) -> bool {
        self.operand_count() == 2
    }
}

impl InstrInfo for IrOpcode {
    const INSTR_SET: &'static str = "ir_opcode";

    fn mnemonic(self) -> &'static str {
        self.name()
    }

    fn operand_name(self, index: usize) -> Option<&'static str> {
        match (self.is_binary(), index) {
            (true, 0) => Some("lhs"),
            (true, 1) => Some("rhs"),
            _ => None,
        }
    }

    fn imm_name(self, index: usize) -> Option<&'static str> {
        match (self, index) {
            (IrOpcode::Imm, 0) => Some("value"),
            _ => None,
        }
    }
}

pub type IrDag = Dag<IrOpcode, TypeToken>;
pub type IrNode = Node<IrOpcode, TypeToken>;

impl Dag<IrOpcode, TypeToken> {
    /// Append an immediate load.
    pub fn load_imm(&mut self, ty: impl Into<TypeToken>, value: u64) -> NodeId {
        self.create(None, IrOpcode::Imm, ty.into(), [], [Immediate::U64(value)])
    }

    /// Append a two-operand arithmetic node.
    pub fn binary(&mut self, opcode: IrOpcode, ty: impl Into<TypeToken>, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.create(None, opcode, ty.into(), [lhs, rhs], [])
    }
}
