//! Function record stream to IR DAG.
//!
//! Records are postfix and stack based:
//!
//! ```text
//! 0x01 IMM   <type:uleb> <value:width(type) bytes LE>   push new node
//! 0x02..=0x06 ADD SUB MUL UDIV SDIV <type:uleb>         pop rhs, pop lhs, push new node
//! 0x40 REF   <node:uleb>                                push existing node
//! 0x41 CHAIN                                            pop c, top.chain = c
//! ```
//!
//! Exactly one value must remain when the declared record count is reached; it
//! becomes the root. Node ids follow record order, so a stream produced from a
//! builder-made DAG decodes to an identical DAG.

use super::reader::ByteReader;
use super::{BytecodeError, BytecodeResult};
use crate::core::dag::NodeId;
use crate::core::types::Primitive;
use crate::ir::{IrDag, IrOpcode};

pub const RECORD_IMM: u64 = 0x01;
pub const RECORD_REF: u64 = 0x40;
pub const RECORD_CHAIN: u64 = 0x41;

fn read_type(reader: &mut ByteReader<'_>) -> BytecodeResult<Primitive> {
    let offset = reader.offset();
    let raw = reader.read_uleb()?;
    Primitive::from_raw(raw).ok_or(BytecodeError::IllegalType { raw, offset })
}

fn underflow(record: u64, stack: &[NodeId]) -> BytecodeError {
    BytecodeError::StackUnderflow {
        record,
        needed: 2,
        available: stack.len(),
    }
}

/// Decode `record_count` records from `reader` into a fresh DAG.
pub fn decode_function(reader: &mut ByteReader<'_>, record_count: u64) -> BytecodeResult<IrDag> {
    let mut dag = IrDag::new();
    let mut stack: Vec<NodeId> = Vec::new();

    for record in 0..record_count {
        let offset = reader.offset();
        let kind = reader.read_uleb()?;

        match kind {
            RECORD_IMM => {
                let type_offset = reader.offset();
                let ty = read_type(reader)?;
                let Some(width) = ty.immediate_width() else {
                    return Err(BytecodeError::IllegalType {
                        raw: u64::from(ty.raw()),
                        offset: type_offset,
                    });
                };
                let value = reader.read_uint(width)?;
                let id = dag.load_imm(ty, value);
                log::trace!("record {record}: {id} = IMM {ty} {value}");
                stack.push(id);
            }
            RECORD_REF => {
                let id = reader.read_uleb()?;
                if id >= dag.len() as u64 {
                    return Err(BytecodeError::DanglingRef {
                        record,
                        id,
                        count: dag.len(),
                    });
                }
                stack.push(NodeId(id as u32));
            }
            RECORD_CHAIN => {
                let &[.., top, chain] = stack.as_slice() else {
                    return Err(underflow(record, &stack));
                };
                stack.pop();
                dag[top].chain = Some(chain);
            }
            _ => {
                let Some(opcode) = IrOpcode::from_raw(kind).filter(|op| op.is_binary()) else {
                    return Err(BytecodeError::UnknownRecord { kind, offset });
                };
                let ty = read_type(reader)?;
                let &[.., lhs, rhs] = stack.as_slice() else {
                    return Err(underflow(record, &stack));
                };
                stack.truncate(stack.len() - 2);
                let id = dag.binary(opcode, ty, lhs, rhs);
                log::trace!("record {record}: {id} = {} {ty} {lhs}, {rhs}", opcode.name());
                stack.push(id);
            }
        }
    }

    match stack.as_slice() {
        [root] => {
            dag.set_root(*root);
            Ok(dag)
        }
        _ => Err(BytecodeError::UnbalancedStack { depth: stack.len() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::writer::FunctionWriter;
    use crate::bytecode::write_uleb;
    use crate::core::dag::Immediate;

    fn decode(f: &FunctionWriter) -> BytecodeResult<IrDag> {
        let mut reader = ByteReader::new(f.body());
        decode_function(&mut reader, f.record_count())
    }

    #[test]
    fn test_decodes_shared_operands_like_the_builder() {
        let mut f = FunctionWriter::new(0);
        f.imm(Primitive::U32, 1)
            .reference(0)
            .binary(IrOpcode::Sub, Primitive::U32)
            .reference(0)
            .reference(0)
            .binary(IrOpcode::Sub, Primitive::U32)
            .binary(IrOpcode::Add, Primitive::U32);

        let mut expected = IrDag::new();
        let one = expected.load_imm(Primitive::U32, 1);
        let a = expected.binary(IrOpcode::Sub, Primitive::U32, one, one);
        let b = expected.binary(IrOpcode::Sub, Primitive::U32, one, one);
        let root = expected.binary(IrOpcode::Add, Primitive::U32, a, b);
        expected.set_root(root);

        assert_eq!(decode(&f).unwrap(), expected);
    }

    #[test]
    fn test_chain_record() {
        let mut f = FunctionWriter::new(0);
        f.imm(Primitive::U8, 1)
            .imm(Primitive::U8, 2)
            .reference(0)
            .chain()
            .binary(IrOpcode::Add, Primitive::U8);

        let dag = decode(&f).unwrap();
        assert_eq!(dag.len(), 3);
        assert_eq!(dag[NodeId(1)].chain, Some(NodeId(0)));
        assert_eq!(dag[NodeId(2)].operands, vec![NodeId(0), NodeId(1)]);
        assert_eq!(dag.root(), Some(NodeId(2)));
    }

    #[test]
    fn test_immediate_widths() {
        let mut f = FunctionWriter::new(0);
        f.imm(Primitive::U64, u64::MAX)
            .imm(Primitive::U16, 0xbeef)
            .binary(IrOpcode::Mul, Primitive::U64);
        // 1 + 1 + 8 bytes, then 1 + 1 + 2 bytes, then 1 + 1 bytes
        assert_eq!(f.body().len(), 16);

        let dag = decode(&f).unwrap();
        assert_eq!(dag[NodeId(0)].imm, vec![Immediate::U64(u64::MAX)]);
        assert_eq!(dag[NodeId(1)].imm, vec![Immediate::U64(0xbeef)]);
    }

    #[test]
    fn test_rejects_bad_streams() {
        let mut underflow = FunctionWriter::new(0);
        underflow.imm(Primitive::U8, 1).binary(IrOpcode::Add, Primitive::U8);
        assert_eq!(
            decode(&underflow),
            Err(BytecodeError::StackUnderflow {
                record: 1,
                needed: 2,
                available: 1
            })
        );

        let mut unbalanced = FunctionWriter::new(0);
        unbalanced.imm(Primitive::U8, 1).imm(Primitive::U8, 2);
        assert_eq!(decode(&unbalanced), Err(BytecodeError::UnbalancedStack { depth: 2 }));
        assert_eq!(decode(&FunctionWriter::new(0)), Err(BytecodeError::UnbalancedStack { depth: 0 }));

        let mut dangling = FunctionWriter::new(0);
        dangling.imm(Primitive::U8, 1).reference(1);
        assert_eq!(
            decode(&dangling),
            Err(BytecodeError::DanglingRef {
                record: 1,
                id: 1,
                count: 1
            })
        );

        let mut lonely_chain = FunctionWriter::new(0);
        lonely_chain.imm(Primitive::U8, 1).chain();
        assert!(matches!(decode(&lonely_chain), Err(BytecodeError::StackUnderflow { .. })));
    }

    #[test]
    fn test_rejects_unknown_records_and_types() {
        let mut buf = Vec::new();
        write_uleb(0x07, &mut buf);
        let mut f = FunctionWriter::new(0);
        f.raw_record(&buf);
        assert_eq!(decode(&f), Err(BytecodeError::UnknownRecord { kind: 7, offset: 0 }));

        // IMM of type 12 (past PTR)
        let mut f = FunctionWriter::new(0);
        f.raw_record(&[0x01, 12, 0]);
        assert_eq!(decode(&f), Err(BytecodeError::IllegalType { raw: 12, offset: 1 }));

        // pointers carry no inline immediate
        let mut f = FunctionWriter::new(0);
        f.raw_record(&[0x01, Primitive::Ptr.raw(), 0]);
        assert!(matches!(decode(&f), Err(BytecodeError::IllegalType { raw: 11, .. })));
    }

    #[test]
    fn test_truncated_immediate() {
        let mut f = FunctionWriter::new(0);
        f.raw_record(&[0x01, Primitive::U32.raw(), 0xaa, 0xbb]);
        assert!(matches!(decode(&f), Err(BytecodeError::UnexpectedEof { needed: 2, .. })));
    }
}
