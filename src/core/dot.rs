// This module writes any Dag as a Graphviz digraph for debugging. Each reachable node
// becomes a record with one port per operand, a chain port when the node is chained,
// one field per immediate, the type and the opcode label. Operand edges are drawn
// plain, chain edges dotted blue, and the root gets a dotted edge to an InstrRoot
// marker. Opcode enums describe themselves through the InstrInfo trait so the same
// writer serves the IR and every target.

//! Graphviz dump of instruction DAGs.

use std::fmt::{self, Display, Write};

use super::dag::{Dag, Node};

/// Naming information an opcode enum provides to the dot writer.
pub trait InstrInfo: Copy {
    /// Name of the instruction set, used as the opcode label prefix.
    const INSTR_SET: &'static str;

    fn mnemonic(self) -> &'static str;

    fn operand_name(self, _index: usize) -> Option<&'static str> {
        None
    }

    fn imm_name(self, _index: usize) -> Option<&'static str> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    Operand,
    Chain,
}

/// Streams a [`Dag`] as Graphviz text into any [`fmt::Write`] sink.
pub struct DotWriter<W: Write> {
    out: W,
}

impl<W: Write> DotWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_dag<O, T>(&mut self, dag: &Dag<O, T>) -> fmt::Result
    where
        O: InstrInfo,
        T: Copy + Display,
    {
        writeln!(self.out, "digraph G {{")?;
        writeln!(self.out, "node [shape=record,style=rounded]\nedge [dir=\"back\"]")?;

        let mut result = Ok(());
        dag.visit(|node| {
            if result.is_ok() {
                result = self.write_node(node);
            }
        });
        result?;

        if let Some(root) = dag.root() {
            writeln!(self.out, "node{} -> InstrRoot [style=dotted]", root.0)?;
        }
        writeln!(self.out, "}}")
    }

    fn write_node<O, T>(&mut self, node: &Node<O, T>) -> fmt::Result
    where
        O: InstrInfo,
        T: Copy + Display,
    {
        let id = node.id().0;
        write!(self.out, "node{id} [label=\"{{")?;

        if !node.operands.is_empty() || node.chain.is_some() {
            let mut ports = Vec::new();
            if node.chain.is_some() {
                ports.push("<chain>ch".to_string());
            }
            for i in 0..node.operands.len() {
                let name = node.opcode.operand_name(i).map_or_else(|| i.to_string(), str::to_string);
                ports.push(format!("<{i}>{name}"));
            }
            write!(self.out, "{{{}}}|", ports.join("|"))?;
        }

        for (i, imm) in node.imm.iter().enumerate() {
            let name = node.opcode.imm_name(i).unwrap_or("imm");
            write!(self.out, "<i{i}>[I]{name}: {imm}|")?;
        }

        writeln!(
            self.out,
            "T:{}|<opc>{}::{}}}\"]",
            node.ty,
            O::INSTR_SET,
            node.opcode.mnemonic()
        )?;

        if let Some(chain) = node.chain {
            self.write_edge(id, "chain", chain.0, EdgeKind::Chain)?;
        }
        for (i, operand) in node.operands.iter().enumerate() {
            self.write_edge(id, &format!("{i}:n"), operand.0, EdgeKind::Operand)?;
        }
        Ok(())
    }

    fn write_edge(&mut self, from: u32, port: &str, to: u32, kind: EdgeKind) -> fmt::Result {
        write!(self.out, "node{to}:opc:s -> node{from}:{port}")?;
        if kind == EdgeKind::Chain {
            write!(self.out, " [style=dotted,color=blue]")?;
        }
        writeln!(self.out)
    }
}

/// Render a DAG to a Graphviz string.
pub fn to_dot<O, T>(dag: &Dag<O, T>) -> String
where
    O: InstrInfo,
    T: Copy + Display,
{
    let mut writer = DotWriter::new(String::new());
    // Writing into a String cannot fail.
    let _ = writer.write_dag(dag);
    writer.into_inner()
}
