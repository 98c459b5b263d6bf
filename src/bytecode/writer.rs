//! Container and record stream emission.

use super::decode::{RECORD_CHAIN, RECORD_IMM, RECORD_REF};
use super::leb128::write_uleb;
use super::{ConstantFlags, MAGIC};
use crate::core::types::Primitive;
use crate::ir::IrOpcode;

/// Record stream of one function, with its flags.
#[derive(Debug, Clone, Default)]
pub struct FunctionWriter {
    flags: u32,
    records: u64,
    body: Vec<u8>,
}

impl FunctionWriter {
    pub fn new(flags: u32) -> Self {
        Self {
            flags,
            records: 0,
            body: Vec::new(),
        }
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn record_count(&self) -> u64 {
        self.records
    }

    /// Encoded records, without flags or count.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Immediate load. `value` is truncated to the type's immediate width; types
    /// without one get no payload.
    pub fn imm(&mut self, ty: Primitive, value: u64) -> &mut Self {
        write_uleb(RECORD_IMM, &mut self.body);
        write_uleb(u64::from(ty.raw()), &mut self.body);
        let width = ty.immediate_width().unwrap_or(0);
        self.body.extend_from_slice(&value.to_le_bytes()[..width]);
        self.records += 1;
        self
    }

    pub fn binary(&mut self, opcode: IrOpcode, ty: Primitive) -> &mut Self {
        write_uleb(u64::from(opcode.raw()), &mut self.body);
        write_uleb(u64::from(ty.raw()), &mut self.body);
        self.records += 1;
        self
    }

    /// Push an already decoded node again.
    pub fn reference(&mut self, node: u64) -> &mut Self {
        write_uleb(RECORD_REF, &mut self.body);
        write_uleb(node, &mut self.body);
        self.records += 1;
        self
    }

    /// Pop the top node and make it the chain of the node below.
    pub fn chain(&mut self) -> &mut Self {
        write_uleb(RECORD_CHAIN, &mut self.body);
        self.records += 1;
        self
    }

    /// Append one pre-encoded record verbatim.
    pub fn raw_record(&mut self, bytes: &[u8]) -> &mut Self {
        self.body.extend_from_slice(bytes);
        self.records += 1;
        self
    }
}

enum Constant {
    Data(u8, Vec<u8>),
    Reserved(u8, u64),
}

/// Collects pool entries and lays out a complete container on [`BytecodeWriter::finish`].
pub struct BytecodeWriter {
    major: u16,
    minor: u16,
    constants: Vec<Constant>,
    functions: Vec<FunctionWriter>,
    extra: Vec<Vec<u8>>,
}

impl BytecodeWriter {
    pub fn new(major: u16, minor: u16) -> Self {
        Self {
            major,
            minor,
            constants: Vec::new(),
            functions: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// Constant with an inline payload. The reserve-only bit is cleared.
    pub fn constant(&mut self, flags: u8, data: &[u8]) -> &mut Self {
        self.constants
            .push(Constant::Data(flags & !ConstantFlags::RESERVE_ONLY, data.to_vec()));
        self
    }

    /// Constant that only reserves `size` bytes.
    pub fn reserve(&mut self, flags: u8, size: u64) -> &mut Self {
        self.constants
            .push(Constant::Reserved(flags | ConstantFlags::RESERVE_ONLY, size));
        self
    }

    pub fn function(&mut self, function: FunctionWriter) -> &mut Self {
        self.functions.push(function);
        self
    }

    pub fn extra(&mut self, data: &[u8]) -> &mut Self {
        self.extra.push(data.to_vec());
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&self.major.to_le_bytes());
        out.extend_from_slice(&self.minor.to_le_bytes());
        write_uleb(self.constants.len() as u64, &mut out);
        write_uleb(self.functions.len() as u64, &mut out);
        write_uleb(self.extra.len() as u64, &mut out);

        for constant in &self.constants {
            match constant {
                Constant::Data(flags, data) => {
                    out.push(*flags);
                    write_uleb(data.len() as u64, &mut out);
                    out.extend_from_slice(data);
                }
                Constant::Reserved(flags, size) => {
                    out.push(*flags);
                    write_uleb(*size, &mut out);
                }
            }
        }

        for function in &self.functions {
            out.extend_from_slice(&function.flags.to_le_bytes());
            write_uleb(function.records, &mut out);
            out.extend_from_slice(&function.body);
        }

        for entry in &self.extra {
            write_uleb(entry.len() as u64, &mut out);
            out.extend_from_slice(entry);
        }
        out
    }
}
