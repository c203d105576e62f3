//! Bytecode decoding
//!
//! Offsets in errors are relative to the start of the code array; callers
//! embedding the code in a bigger buffer rebase them with
//! [`ParseError::rebase`].

use crate::jvm::code::instruction::{opcode, ArrayType, Instruction, Operands, WideOperands};
use crate::jvm::errors::{ParseError, ParseErrorKind};
use crate::jvm::reader::ClassReader;

/// Decode an entire code array into instructions keyed by byte offset
///
/// The reader must start at the beginning of the code array, since
/// `tableswitch`/`lookupswitch` padding is aligned relative to it.
pub fn decode_code(code: &[u8]) -> Result<Vec<(u32, Instruction)>, ParseError> {
    let mut reader = ClassReader::new(code);
    let mut instructions = vec![];
    while !reader.is_done() {
        let offset = reader.offset() as u32;
        instructions.push((offset, decode_instruction(&mut reader)?));
    }
    Ok(instructions)
}

/// Decode a single instruction at the reader's current position
pub fn decode_instruction(reader: &mut ClassReader) -> Result<Instruction, ParseError> {
    let opcode_offset = reader.offset();
    let op = reader.read_u1()?;

    let operands = match op {
        // nop through dconst_1
        0x00..=0x0f => Operands::None,

        opcode::BIPUSH => Operands::Byte(reader.read_i1()?),
        opcode::SIPUSH => Operands::Short(reader.read_i2()?),

        // ldc takes its pool index on a single byte
        opcode::LDC => Operands::PoolIndex(reader.read_u1()? as u16),
        opcode::LDC_W | opcode::LDC2_W => Operands::PoolIndex(reader.read_u2()?),

        // iload through aload, istore through astore
        opcode::ILOAD..=opcode::ALOAD | opcode::ISTORE..=opcode::ASTORE => {
            Operands::LocalIndex(reader.read_u1()?)
        }

        // the _<n> load/store forms, array loads and stores, stack
        // shuffling, arithmetic, conversions, and comparisons
        0x1a..=0x35 | 0x3b..=0x83 | 0x85..=0x98 => Operands::None,

        opcode::IINC => Operands::Iinc {
            index: reader.read_u1()?,
            constant: reader.read_i1()?,
        },

        // ifeq through if_acmpne, goto, jsr, ifnull, ifnonnull
        opcode::IFEQ..=opcode::JSR | opcode::IFNULL | opcode::IFNONNULL => {
            Operands::Branch(reader.read_i2()?)
        }

        opcode::RET => Operands::LocalIndex(reader.read_u1()?),

        opcode::TABLESWITCH => {
            reader.align4()?;
            let default = reader.read_i4()?;
            let low_offset = reader.offset();
            let low = reader.read_i4()?;
            let high = reader.read_i4()?;
            if low > high {
                return Err(ParseError::at(
                    low_offset,
                    ParseErrorKind::InvalidSwitchRange { low, high },
                ));
            }
            let count = (high as i64 - low as i64 + 1) as usize;
            let mut offsets = Vec::with_capacity(count);
            for _ in 0..count {
                offsets.push(reader.read_i4()?);
            }
            Operands::TableSwitch {
                default,
                low,
                high,
                offsets,
            }
        }

        opcode::LOOKUPSWITCH => {
            reader.align4()?;
            let default = reader.read_i4()?;
            let npairs_offset = reader.offset();
            let npairs = reader.read_i4()?;
            if npairs < 0 {
                return Err(ParseError::at(
                    npairs_offset,
                    ParseErrorKind::InvalidSwitchRange {
                        low: 0,
                        high: npairs,
                    },
                ));
            }
            let mut pairs = Vec::with_capacity(npairs as usize);
            for _ in 0..npairs {
                let matched = reader.read_i4()?;
                let target = reader.read_i4()?;
                pairs.push((matched, target));
            }
            Operands::LookupSwitch { default, pairs }
        }

        // ireturn through return, arraylength, athrow, monitorenter, monitorexit
        0xac..=0xb1 | 0xbe | 0xbf | 0xc2 | 0xc3 => Operands::None,

        // getstatic through invokestatic, new, anewarray, checkcast, instanceof
        opcode::GETSTATIC..=opcode::INVOKESTATIC
        | opcode::NEW
        | opcode::ANEWARRAY
        | opcode::CHECKCAST
        | opcode::INSTANCEOF => Operands::PoolIndex(reader.read_u2()?),

        opcode::INVOKEINTERFACE => {
            let index = reader.read_u2()?;
            let count_offset = reader.offset();
            let count = reader.read_u1()?;
            if count == 0 {
                return Err(ParseError::at(
                    count_offset,
                    ParseErrorKind::InvalidInvokeInterfaceFormat,
                ));
            }
            let zero_offset = reader.offset();
            if reader.read_u1()? != 0 {
                return Err(ParseError::at(
                    zero_offset,
                    ParseErrorKind::InvalidInvokeInterfaceFormat,
                ));
            }
            Operands::InvokeInterface { index, count }
        }

        opcode::NEWARRAY => {
            let atype_offset = reader.offset();
            let atype = reader.read_u1()?;
            match ArrayType::from_atype(atype) {
                Some(typ) => Operands::NewArray(typ),
                None => {
                    return Err(ParseError::at(
                        atype_offset,
                        ParseErrorKind::UnknownArrayType(atype),
                    ))
                }
            }
        }

        opcode::WIDE => {
            let sub_offset = reader.offset();
            let sub = reader.read_u1()?;
            match sub {
                opcode::IINC => Operands::Wide(WideOperands::Iinc {
                    index: reader.read_u2()?,
                    constant: reader.read_i2()?,
                }),
                opcode::ILOAD..=opcode::ALOAD
                | opcode::ISTORE..=opcode::ASTORE
                | opcode::RET => Operands::Wide(WideOperands::LocalIndex {
                    opcode: sub,
                    index: reader.read_u2()?,
                }),
                _ => {
                    return Err(ParseError::at(
                        sub_offset,
                        ParseErrorKind::InvalidWideOpcode(sub),
                    ))
                }
            }
        }

        opcode::MULTIANEWARRAY => {
            let index = reader.read_u2()?;
            let dims_offset = reader.offset();
            let dimensions = reader.read_u1()?;
            if dimensions == 0 {
                return Err(ParseError::at(dims_offset, ParseErrorKind::InvalidDimensions));
            }
            Operands::MultiANewArray { index, dimensions }
        }

        opcode::GOTO_W | opcode::JSR_W => Operands::BranchWide(reader.read_i4()?),

        _ => {
            return Err(ParseError::at(
                opcode_offset,
                ParseErrorKind::UnknownOpcode(op),
            ))
        }
    };

    Ok(Instruction { opcode: op, operands })
}

#[cfg(test)]
mod test {
    use super::*;

    fn decode_one(code: &[u8]) -> Result<Instruction, ParseError> {
        decode_instruction(&mut ClassReader::new(code))
    }

    #[test]
    fn straight_line_code() {
        let code = [
            0x03, // iconst_0
            0x3c, // istore_1
            0x10, 0x2a, // bipush 42
            0x11, 0x01, 0x00, // sipush 256
            0xb1, // return
        ];
        let decoded = decode_code(&code).unwrap();
        let offsets: Vec<u32> = decoded.iter().map(|(off, _)| *off).collect();
        assert_eq!(offsets, vec![0, 1, 2, 4, 7]);
        assert_eq!(decoded[2].1.operands, Operands::Byte(42));
        assert_eq!(decoded[3].1.operands, Operands::Short(256));
    }

    #[test]
    fn truncated_operand() {
        let err = decode_one(&[0x11, 0x01]).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TruncatedInput);
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn unknown_opcode() {
        // invokedynamic is not supported
        let err = decode_one(&[0xba, 0x00, 0x01, 0x00, 0x00]).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownOpcode(0xba));
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn tableswitch_alignment() {
        // Opcode at offset 1: two zero pad bytes align the default to
        // offset 4
        #[rustfmt::skip]
        let code = [
            0x00,                   // nop
            0xaa,                   // tableswitch
            0x00, 0x00,             // padding to offset 4
            0x00, 0x00, 0x00, 0x14, // default +20
            0x00, 0x00, 0x00, 0x01, // low 1
            0x00, 0x00, 0x00, 0x02, // high 2
            0x00, 0x00, 0x00, 0x0a, // offset for 1
            0x00, 0x00, 0x00, 0x0b, // offset for 2
        ];
        let decoded = decode_code(&code).unwrap();
        assert_eq!(
            decoded[1].1.operands,
            Operands::TableSwitch {
                default: 20,
                low: 1,
                high: 2,
                offsets: vec![10, 11],
            }
        );
    }

    #[test]
    fn tableswitch_no_padding_at_aligned_offset() {
        // Opcode at offset 3: the payload is already aligned
        #[rustfmt::skip]
        let code = [
            0x00, 0x00, 0x00,       // nop nop nop
            0xaa,                   // tableswitch
            0x00, 0x00, 0x00, 0x08, // default
            0x00, 0x00, 0x00, 0x05, // low 5
            0x00, 0x00, 0x00, 0x05, // high 5
            0x00, 0x00, 0x00, 0x04, // offset for 5
        ];
        let decoded = decode_code(&code).unwrap();
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded[3].0, 3);
    }

    #[test]
    fn tableswitch_rejects_nonzero_padding() {
        let code = [
            0x00, 0xaa, 0x00, 0x01, 0x00, // bad pad byte at offset 3
        ];
        let err = decode_code(&code).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPadding { byte: 1 });
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn tableswitch_rejects_inverted_range() {
        #[rustfmt::skip]
        let code = [
            0xaa,                   // tableswitch
            0x00, 0x00, 0x00,       // padding to offset 4
            0x00, 0x00, 0x00, 0x00, // default
            0x00, 0x00, 0x00, 0x09, // low 9
            0x00, 0x00, 0x00, 0x02, // high 2
        ];
        let err = decode_code(&code).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidSwitchRange { low: 9, high: 2 });
    }

    #[test]
    fn lookupswitch_pairs() {
        #[rustfmt::skip]
        let code = [
            0xab,                   // lookupswitch
            0x00, 0x00, 0x00,       // padding to offset 4
            0x00, 0x00, 0x00, 0x1c, // default +28
            0x00, 0x00, 0x00, 0x02, // npairs 2
            0xff, 0xff, 0xff, 0xff, // match -1
            0x00, 0x00, 0x00, 0x10, // offset +16
            0x00, 0x00, 0x00, 0x63, // match 99
            0x00, 0x00, 0x00, 0x14, // offset +20
        ];
        let decoded = decode_code(&code).unwrap();
        assert_eq!(
            decoded[0].1.operands,
            Operands::LookupSwitch {
                default: 28,
                pairs: vec![(-1, 16), (99, 20)],
            }
        );
    }

    #[test]
    fn invokeinterface_trailing_zero() {
        let good = decode_one(&[0xb9, 0x00, 0x07, 0x02, 0x00]).unwrap();
        assert_eq!(
            good.operands,
            Operands::InvokeInterface { index: 7, count: 2 }
        );

        let err = decode_one(&[0xb9, 0x00, 0x07, 0x02, 0x01]).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidInvokeInterfaceFormat);
        assert_eq!(err.offset, 4);

        let err = decode_one(&[0xb9, 0x00, 0x07, 0x00, 0x00]).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidInvokeInterfaceFormat);
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn newarray_type_codes() {
        let insn = decode_one(&[0xbc, 0x0a]).unwrap();
        assert_eq!(insn.operands, Operands::NewArray(ArrayType::Int));

        let err = decode_one(&[0xbc, 0x0c]).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownArrayType(12));
    }

    #[test]
    fn multianewarray_dimensions() {
        let insn = decode_one(&[0xc5, 0x00, 0x03, 0x02]).unwrap();
        assert_eq!(
            insn.operands,
            Operands::MultiANewArray {
                index: 3,
                dimensions: 2
            }
        );

        let err = decode_one(&[0xc5, 0x00, 0x03, 0x00]).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidDimensions);
    }

    #[test]
    fn wide_forms() {
        let insn = decode_one(&[0xc4, 0x15, 0x01, 0x00]).unwrap();
        assert_eq!(
            insn.operands,
            Operands::Wide(WideOperands::LocalIndex {
                opcode: 0x15,
                index: 256
            })
        );

        let insn = decode_one(&[0xc4, 0x84, 0x01, 0x00, 0xff, 0x38]).unwrap();
        assert_eq!(
            insn.operands,
            Operands::Wide(WideOperands::Iinc {
                index: 256,
                constant: -200
            })
        );

        let err = decode_one(&[0xc4, 0x60, 0x00, 0x01]).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidWideOpcode(0x60));
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn wide_branches() {
        let insn = decode_one(&[0xc8, 0xff, 0xff, 0xff, 0x00]).unwrap();
        assert_eq!(insn.operands, Operands::BranchWide(-256));
    }
}
