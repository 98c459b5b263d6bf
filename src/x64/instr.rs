//! x86 machine opcodes and value types.

use std::fmt;

use crate::core::dot::InstrInfo;

/// Selected x86 instruction. `_ri` forms take an immediate, `_rr` forms two registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum X86Opcode {
    #[default]
    None,
    AddRi,
    AddRr,
    SubRi,
    SubRr,
    MovRi,
}

impl X86Opcode {
    pub const fn name(self) -> &'static str {
        match self {
            X86Opcode::None => "NONE",
            X86Opcode::AddRi => "ADD_ri",
            X86Opcode::AddRr => "ADD_rr",
            X86Opcode::SubRi => "SUB_ri",
            X86Opcode::SubRr => "SUB_rr",
            X86Opcode::MovRi => "MOV_ri",
        }
    }
}

impl fmt::Display for X86Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl InstrInfo for X86Opcode {
    const INSTR_SET: &'static str = "mc_x86_opcode";

    fn mnemonic(self) -> &'static str {
        self.name()
    }

    fn operand_name(self, index: usize) -> Option<&'static str> {
        match (self, index) {
            (X86Opcode::AddRi | X86Opcode::SubRi, 0) => Some("operand"),
            (X86Opcode::AddRr | X86Opcode::SubRr, 0) => Some("lhs"),
            (X86Opcode::AddRr | X86Opcode::SubRr, 1) => Some("rhs"),
            _ => None,
        }
    }

    fn imm_name(self, index: usize) -> Option<&'static str> {
        match (self, index) {
            (X86Opcode::AddRi | X86Opcode::SubRi | X86Opcode::MovRi, 0) => Some("imm"),
            _ => None,
        }
    }
}

/// Operand width of a selected instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum X86Type {
    #[default]
    None,
    U8,
    U16,
    U32,
    U64,
}

impl fmt::Display for X86Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            X86Type::None => "NONE",
            X86Type::U8 => "U8",
            X86Type::U16 => "U16",
            X86Type::U32 => "U32",
            X86Type::U64 => "U64",
        })
    }
}
