//! x86-64 architecture-specific components.
//!
//! This module contains the x86 instruction-selection target:
//! - [`instr`] - machine opcodes and value types
//! - [`isel`] - type lowering, selection rules and the selection pass
//!
//! Register allocation and encoding are not part of this crate; the selected
//! DAG is the hand-off point for them.

pub mod instr;
pub mod isel;

pub use instr::{X86Opcode, X86Type};
pub use isel::{compile_pipeline, selector_table, x86_isel, X86Dag, X86, X86_TYPE_LOWERING};
