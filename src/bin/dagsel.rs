//! dagsel driver.
//!
//! Loads a function from a bytecode container, runs the x86 compile pipeline
//! on it and prints the selected DAG, either as a listing or as Graphviz.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use dagsel::bytecode::{BytecodeFile, BytecodeWriter, FunctionEntry, FunctionWriter};
use dagsel::core::{to_dot, Dag, InstrInfo, Pass};
use dagsel::ir::IrOpcode;
use dagsel::x64::compile_pipeline;
use dagsel::Primitive;

#[derive(Parser, Debug)]
#[command(name = "dagsel", version, about = "DAG instruction selection for bytecode functions")]
struct Args {
    /// Bytecode container to load
    #[arg(required_unless_present = "demo")]
    input: Option<PathBuf>,

    /// Function pool index to compile (defaults to the entrypoint)
    #[arg(short, long)]
    function: Option<usize>,

    /// Print Graphviz instead of a listing
    #[arg(long)]
    dot: bool,

    /// Stop before selection and print the IR DAG
    #[arg(long)]
    ir: bool,

    /// Use a built-in sample container instead of INPUT
    #[arg(long)]
    demo: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// `ADD(SUB(1, 1), SUB(1, 1))` over one shared u32 immediate, as the entrypoint.
fn demo_container() -> Vec<u8> {
    let mut entry = FunctionWriter::new(FunctionEntry::ENTRYPOINT);
    entry
        .imm(Primitive::U32, 1)
        .reference(0)
        .binary(IrOpcode::Sub, Primitive::U32)
        .reference(0)
        .reference(0)
        .binary(IrOpcode::Sub, Primitive::U32)
        .binary(IrOpcode::Add, Primitive::U32);

    let mut writer = BytecodeWriter::new(0, 1);
    writer.function(entry);
    writer.finish()
}

fn print_listing<O, T>(dag: &Dag<O, T>)
where
    O: InstrInfo,
    T: Copy + std::fmt::Display,
{
    for node in dag.nodes() {
        let mut line = format!("{} = {} {}", node.id(), node.opcode.mnemonic(), node.ty);
        let args: Vec<String> = node
            .operands
            .iter()
            .map(ToString::to_string)
            .chain(node.imm.iter().map(|imm| format!("#{imm}")))
            .collect();
        if !args.is_empty() {
            line.push(' ');
            line.push_str(&args.join(", "));
        }
        if let Some(chain) = node.chain {
            line.push_str(&format!(" chain {chain}"));
        }
        if dag.root() == Some(node.id()) {
            line.push_str("  ; root");
        }
        println!("{line}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).parse_default_env().init();

    let bytes = match &args.input {
        Some(path) if !args.demo => fs::read(path)?,
        _ => demo_container(),
    };
    let file = BytecodeFile::parse(&bytes)?;

    let index = match args.function.or(file.entrypoint()) {
        Some(index) => index,
        None => return Err("no entrypoint in container; pass --function".into()),
    };
    let Some(function) = file.functions.get(index) else {
        return Err(format!("function {index} out of range ({} functions)", file.functions.len()).into());
    };
    log::debug!("compiling function {index} ({} nodes)", function.dag.len());

    if args.ir {
        if args.dot {
            print!("{}", to_dot(&function.dag));
        } else {
            print_listing(&function.dag);
        }
        return Ok(());
    }

    let compile = compile_pipeline();
    match compile.transform(function.dag.clone()) {
        Ok(selected) => {
            if args.dot {
                print!("{}", to_dot(&selected));
            } else {
                print_listing(&selected);
            }
            Ok(())
        }
        Err(diagnostic) => {
            eprintln!("{}", diagnostic.report());
            std::process::exit(1);
        }
    }
}
