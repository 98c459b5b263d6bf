//! dagsel - DAG-based instruction selection.
//!
//! A small compiler back-end core: a generic instruction DAG, a declarative
//! tree-pattern language for selection rules, and a pass pipeline that rewrites
//! a target-independent IR DAG into a target DAG one node at a time.
//!
//! # Primary Usage
//!
//! ```ignore
//! use dagsel::bytecode::BytecodeFile;
//! use dagsel::core::Pass;
//! use dagsel::x64::compile_pipeline;
//!
//! let file = BytecodeFile::parse(&bytes)?;
//! let ir = file.entry_function().unwrap().dag.clone();
//! let x86 = compile_pipeline().transform(ir)?;
//! println!("{}", dagsel::core::to_dot(&x86));
//! ```
//!
//! # Architecture
//!
//! - [`core`] - types, DAG, diagnostics, passes, Graphviz output
//! - [`ir`] - the target-independent instruction set
//! - [`isel`] - matchers, rules, selector tables and the generic selection pass
//! - [`x64`] - the x86 selection target
//! - [`bytecode`] - the container format functions are loaded from

pub mod bytecode;
pub mod core;
pub mod ir;
pub mod isel;
pub mod x64;

pub use crate::bytecode::{BytecodeError, BytecodeFile};
pub use crate::core::{CompileError, Dag, Diagnostic, NodeId, Pass, PassResult, Pipeline, Primitive, TypeToken};
pub use crate::ir::{IrDag, IrOpcode};
pub use crate::isel::{GenericIsel, SelectorTable, Target};
