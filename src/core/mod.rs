// This module is the central hub for dagsel's target-independent infrastructure. It
// exports the building blocks every other part of the crate is written against: value
// types (primitive type tokens and out-of-line descriptor handles), the arena DAG with
// integer node ids and same-id placeholder construction, the error and diagnostic
// surface (CompileError, Diagnostic, invariant!), the Pass trait with its Pipeline and
// Then combinators, and the Graphviz writer used to dump any DAG whose opcodes describe
// themselves through InstrInfo. Nothing in here knows about a particular instruction
// set; the IR and each target plug their opcode and type enums into the generic Dag.

//! Core dagsel infrastructure
//!
//! # Key Components
//!
//! ## Types (`types`)
//! - `Primitive` classes with their bytecode discriminants
//! - `TypeToken`: primitive or descriptor reference
//!
//! ## DAG (`dag`)
//! - Append-only node arena addressed by `NodeId`
//! - Breadth-first traversal from the root over operand edges
//!
//! ## Errors (`error`)
//! - `CompileError` root causes and the `Diagnostic` report
//!
//! ## Passes (`pass`)
//! - `Pass<In, Out>`, `Pipeline<T>`, `Then`
//!
//! ## Graphviz (`dot`)
//! - Record-style dumps of IR and target DAGs

pub mod dag;
pub mod dot;
pub mod error;
pub mod pass;
pub mod types;

pub use dag::{Dag, Immediate, Node, NodeBuilder, NodeId};
pub use dot::{to_dot, DotWriter, InstrInfo};
pub use error::{invariant_failed, CompileError, Diagnostic, PassResult, Submodule};
pub use pass::{Pass, Pipeline, Then, Transformer, TransformerRef};
pub use types::{Primitive, TypeDescId, TypeToken};
