// This module reads and writes the bytecode container that feeds the compiler. A
// container is a little-endian header (magic 0xF00D1234, major and minor version, then
// ULEB128 counts of constants, functions and extra entries) followed by the three pools.
// Constants carry permission flags and either a payload or only a reserved size.
// Functions carry u32 flags, one of which marks the single entrypoint, and a postfix
// record stream that decode turns into an IR DAG while the pool is read. Extra entries
// are kept as opaque byte strings. Every malformed input is a BytecodeError value; no
// input can reach an invariant panic in the DAG.

//! Bytecode container format.

use thiserror::Error;

use crate::ir::IrDag;

pub mod decode;
pub mod leb128;
pub mod reader;
pub mod writer;

pub use decode::decode_function;
pub use leb128::{decode_uleb, write_uleb};
pub use reader::ByteReader;
pub use writer::{BytecodeWriter, FunctionWriter};

pub const MAGIC: u32 = 0xF00D_1234;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BytecodeError {
    #[error("bad magic {found:#010x}, expected {:#010x}", MAGIC)]
    BadMagic { found: u32 },

    #[error("unexpected end of input at offset {offset}, {needed} more bytes needed")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("uleb128 at offset {offset} does not fit in 64 bits")]
    Leb128Overflow { offset: usize },

    #[error("unknown record kind {kind:#x} at offset {offset}")]
    UnknownRecord { kind: u64, offset: usize },

    #[error("illegal type token {raw} at offset {offset}")]
    IllegalType { raw: u64, offset: usize },

    #[error("record {record} needs {needed} stack values, {available} available")]
    StackUnderflow { record: u64, needed: usize, available: usize },

    #[error("function leaves {depth} values on the stack, expected exactly 1")]
    UnbalancedStack { depth: usize },

    #[error("record {record} references node {id}, but only {count} nodes exist")]
    DanglingRef { record: u64, id: u64, count: usize },

    #[error("function {index} is a second entrypoint (first was function {first})")]
    DuplicateEntrypoint { first: usize, index: usize },

    #[error("length {length} at offset {offset} exceeds the remaining input")]
    LengthOverflow { length: u64, offset: usize },
}

pub type BytecodeResult<T> = Result<T, BytecodeError>;

/// Permission flags of a constant pool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConstantFlags(pub u8);

impl ConstantFlags {
    pub const READ: u8 = 1 << 0;
    pub const WRITE: u8 = 1 << 1;
    pub const EXEC: u8 = 1 << 2;
    /// Only the size is stored; the payload is zero-filled at load time.
    pub const RESERVE_ONLY: u8 = 1 << 3;

    pub const fn contains(self, bit: u8) -> bool {
        self.0 & bit == bit
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantEntry {
    pub flags: ConstantFlags,
    pub size: u64,
    /// Empty for reserve-only entries.
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionEntry {
    pub flags: u32,
    pub dag: IrDag,
}

impl FunctionEntry {
    pub const ENTRYPOINT: u32 = 1 << 16;

    pub fn is_entrypoint(&self) -> bool {
        self.flags & Self::ENTRYPOINT != 0
    }
}

/// A fully parsed container.
#[derive(Debug, Clone, PartialEq)]
pub struct BytecodeFile {
    pub major: u16,
    pub minor: u16,
    pub constants: Vec<ConstantEntry>,
    pub functions: Vec<FunctionEntry>,
    pub extra: Vec<Vec<u8>>,
    entrypoint: Option<usize>,
}

impl BytecodeFile {
    pub fn parse(data: &[u8]) -> BytecodeResult<Self> {
        let mut reader = ByteReader::new(data);

        let found = reader.read_u32()?;
        if found != MAGIC {
            return Err(BytecodeError::BadMagic { found });
        }
        let major = reader.read_u16()?;
        let minor = reader.read_u16()?;
        let constant_count = reader.read_uleb()?;
        let function_count = reader.read_uleb()?;
        let extra_count = reader.read_uleb()?;
        log::debug!(
            "bytecode v{major}.{minor}: {constant_count} constants, {function_count} functions, {extra_count} extra entries"
        );

        let mut constants = Vec::new();
        for _ in 0..constant_count {
            let flags = ConstantFlags(reader.read_u8()?);
            if flags.contains(ConstantFlags::RESERVE_ONLY) {
                let size = reader.read_uleb()?;
                constants.push(ConstantEntry {
                    flags,
                    size,
                    data: Vec::new(),
                });
            } else {
                let len = reader.read_len()?;
                let data = reader.read_bytes(len)?.to_vec();
                constants.push(ConstantEntry {
                    flags,
                    size: len as u64,
                    data,
                });
            }
        }

        let mut functions = Vec::new();
        let mut entrypoint = None;
        for index in 0..function_count {
            let index = index as usize;
            let flags = reader.read_u32()?;
            let record_count = reader.read_uleb()?;
            let dag = decode_function(&mut reader, record_count)?;
            log::debug!("function {index}: {} records, {} nodes", record_count, dag.len());

            let entry = FunctionEntry { flags, dag };
            if entry.is_entrypoint() {
                if let Some(first) = entrypoint {
                    return Err(BytecodeError::DuplicateEntrypoint { first, index });
                }
                entrypoint = Some(index);
            }
            functions.push(entry);
        }

        let mut extra = Vec::new();
        for _ in 0..extra_count {
            let len = reader.read_len()?;
            extra.push(reader.read_bytes(len)?.to_vec());
        }

        if !reader.is_empty() {
            log::warn!("ignoring {} trailing bytes after the extra table", reader.remaining());
        }

        Ok(Self {
            major,
            minor,
            constants,
            functions,
            extra,
            entrypoint,
        })
    }

    /// Index of the function flagged as entrypoint.
    pub fn entrypoint(&self) -> Option<usize> {
        self.entrypoint
    }

    pub fn entry_function(&self) -> Option<&FunctionEntry> {
        self.entrypoint.map(|index| &self.functions[index])
    }
}
