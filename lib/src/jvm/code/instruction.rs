//! Decoded bytecode instructions
//!
//! See [this section of the JVM spec][0] for more information.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-6.html

use std::fmt;

/// Opcodes with operand bytes (or other special handling) in the decoder
///
/// Opcodes whose instructions are a bare opcode byte are not named here; the
/// full table lives in [`MNEMONICS`].
pub mod opcode {
    pub const BIPUSH: u8 = 0x10;
    pub const SIPUSH: u8 = 0x11;
    pub const LDC: u8 = 0x12;
    pub const LDC_W: u8 = 0x13;
    pub const LDC2_W: u8 = 0x14;
    pub const ILOAD: u8 = 0x15;
    pub const ALOAD: u8 = 0x19;
    pub const ISTORE: u8 = 0x36;
    pub const ASTORE: u8 = 0x3a;
    pub const IINC: u8 = 0x84;
    pub const IFEQ: u8 = 0x99;
    pub const GOTO: u8 = 0xa7;
    pub const JSR: u8 = 0xa8;
    pub const RET: u8 = 0xa9;
    pub const TABLESWITCH: u8 = 0xaa;
    pub const LOOKUPSWITCH: u8 = 0xab;
    pub const GETSTATIC: u8 = 0xb2;
    pub const PUTFIELD: u8 = 0xb5;
    pub const INVOKEVIRTUAL: u8 = 0xb6;
    pub const INVOKESTATIC: u8 = 0xb8;
    pub const INVOKEINTERFACE: u8 = 0xb9;
    pub const NEW: u8 = 0xbb;
    pub const NEWARRAY: u8 = 0xbc;
    pub const ANEWARRAY: u8 = 0xbd;
    pub const CHECKCAST: u8 = 0xc0;
    pub const INSTANCEOF: u8 = 0xc1;
    pub const WIDE: u8 = 0xc4;
    pub const MULTIANEWARRAY: u8 = 0xc5;
    pub const IFNULL: u8 = 0xc6;
    pub const IFNONNULL: u8 = 0xc7;
    pub const GOTO_W: u8 = 0xc8;
    pub const JSR_W: u8 = 0xc9;
}

/// Mnemonics for every defined opcode, indexed by opcode byte
///
/// `None` marks bytes with no corresponding instruction (this includes
/// `invokedynamic`, which the VM core does not support).
pub const MNEMONICS: [Option<&str>; 256] = {
    let mut table: [Option<&str>; 256] = [None; 256];
    table[0x00] = Some("nop");
    table[0x01] = Some("aconst_null");
    table[0x02] = Some("iconst_m1");
    table[0x03] = Some("iconst_0");
    table[0x04] = Some("iconst_1");
    table[0x05] = Some("iconst_2");
    table[0x06] = Some("iconst_3");
    table[0x07] = Some("iconst_4");
    table[0x08] = Some("iconst_5");
    table[0x09] = Some("lconst_0");
    table[0x0a] = Some("lconst_1");
    table[0x0b] = Some("fconst_0");
    table[0x0c] = Some("fconst_1");
    table[0x0d] = Some("fconst_2");
    table[0x0e] = Some("dconst_0");
    table[0x0f] = Some("dconst_1");
    table[0x10] = Some("bipush");
    table[0x11] = Some("sipush");
    table[0x12] = Some("ldc");
    table[0x13] = Some("ldc_w");
    table[0x14] = Some("ldc2_w");
    table[0x15] = Some("iload");
    table[0x16] = Some("lload");
    table[0x17] = Some("fload");
    table[0x18] = Some("dload");
    table[0x19] = Some("aload");
    table[0x1a] = Some("iload_0");
    table[0x1b] = Some("iload_1");
    table[0x1c] = Some("iload_2");
    table[0x1d] = Some("iload_3");
    table[0x1e] = Some("lload_0");
    table[0x1f] = Some("lload_1");
    table[0x20] = Some("lload_2");
    table[0x21] = Some("lload_3");
    table[0x22] = Some("fload_0");
    table[0x23] = Some("fload_1");
    table[0x24] = Some("fload_2");
    table[0x25] = Some("fload_3");
    table[0x26] = Some("dload_0");
    table[0x27] = Some("dload_1");
    table[0x28] = Some("dload_2");
    table[0x29] = Some("dload_3");
    table[0x2a] = Some("aload_0");
    table[0x2b] = Some("aload_1");
    table[0x2c] = Some("aload_2");
    table[0x2d] = Some("aload_3");
    table[0x2e] = Some("iaload");
    table[0x2f] = Some("laload");
    table[0x30] = Some("faload");
    table[0x31] = Some("daload");
    table[0x32] = Some("aaload");
    table[0x33] = Some("baload");
    table[0x34] = Some("caload");
    table[0x35] = Some("saload");
    table[0x36] = Some("istore");
    table[0x37] = Some("lstore");
    table[0x38] = Some("fstore");
    table[0x39] = Some("dstore");
    table[0x3a] = Some("astore");
    table[0x3b] = Some("istore_0");
    table[0x3c] = Some("istore_1");
    table[0x3d] = Some("istore_2");
    table[0x3e] = Some("istore_3");
    table[0x3f] = Some("lstore_0");
    table[0x40] = Some("lstore_1");
    table[0x41] = Some("lstore_2");
    table[0x42] = Some("lstore_3");
    table[0x43] = Some("fstore_0");
    table[0x44] = Some("fstore_1");
    table[0x45] = Some("fstore_2");
    table[0x46] = Some("fstore_3");
    table[0x47] = Some("dstore_0");
    table[0x48] = Some("dstore_1");
    table[0x49] = Some("dstore_2");
    table[0x4a] = Some("dstore_3");
    table[0x4b] = Some("astore_0");
    table[0x4c] = Some("astore_1");
    table[0x4d] = Some("astore_2");
    table[0x4e] = Some("astore_3");
    table[0x4f] = Some("iastore");
    table[0x50] = Some("lastore");
    table[0x51] = Some("fastore");
    table[0x52] = Some("dastore");
    table[0x53] = Some("aastore");
    table[0x54] = Some("bastore");
    table[0x55] = Some("castore");
    table[0x56] = Some("sastore");
    table[0x57] = Some("pop");
    table[0x58] = Some("pop2");
    table[0x59] = Some("dup");
    table[0x5a] = Some("dup_x1");
    table[0x5b] = Some("dup_x2");
    table[0x5c] = Some("dup2");
    table[0x5d] = Some("dup2_x1");
    table[0x5e] = Some("dup2_x2");
    table[0x5f] = Some("swap");
    table[0x60] = Some("iadd");
    table[0x61] = Some("ladd");
    table[0x62] = Some("fadd");
    table[0x63] = Some("dadd");
    table[0x64] = Some("isub");
    table[0x65] = Some("lsub");
    table[0x66] = Some("fsub");
    table[0x67] = Some("dsub");
    table[0x68] = Some("imul");
    table[0x69] = Some("lmul");
    table[0x6a] = Some("fmul");
    table[0x6b] = Some("dmul");
    table[0x6c] = Some("idiv");
    table[0x6d] = Some("ldiv");
    table[0x6e] = Some("fdiv");
    table[0x6f] = Some("ddiv");
    table[0x70] = Some("irem");
    table[0x71] = Some("lrem");
    table[0x72] = Some("frem");
    table[0x73] = Some("drem");
    table[0x74] = Some("ineg");
    table[0x75] = Some("lneg");
    table[0x76] = Some("fneg");
    table[0x77] = Some("dneg");
    table[0x78] = Some("ishl");
    table[0x79] = Some("lshl");
    table[0x7a] = Some("ishr");
    table[0x7b] = Some("lshr");
    table[0x7c] = Some("iushr");
    table[0x7d] = Some("lushr");
    table[0x7e] = Some("iand");
    table[0x7f] = Some("land");
    table[0x80] = Some("ior");
    table[0x81] = Some("lor");
    table[0x82] = Some("ixor");
    table[0x83] = Some("lxor");
    table[0x84] = Some("iinc");
    table[0x85] = Some("i2l");
    table[0x86] = Some("i2f");
    table[0x87] = Some("i2d");
    table[0x88] = Some("l2i");
    table[0x89] = Some("l2f");
    table[0x8a] = Some("l2d");
    table[0x8b] = Some("f2i");
    table[0x8c] = Some("f2l");
    table[0x8d] = Some("f2d");
    table[0x8e] = Some("d2i");
    table[0x8f] = Some("d2l");
    table[0x90] = Some("d2f");
    table[0x91] = Some("i2b");
    table[0x92] = Some("i2c");
    table[0x93] = Some("i2s");
    table[0x94] = Some("lcmp");
    table[0x95] = Some("fcmpl");
    table[0x96] = Some("fcmpg");
    table[0x97] = Some("dcmpl");
    table[0x98] = Some("dcmpg");
    table[0x99] = Some("ifeq");
    table[0x9a] = Some("ifne");
    table[0x9b] = Some("iflt");
    table[0x9c] = Some("ifge");
    table[0x9d] = Some("ifgt");
    table[0x9e] = Some("ifle");
    table[0x9f] = Some("if_icmpeq");
    table[0xa0] = Some("if_icmpne");
    table[0xa1] = Some("if_icmplt");
    table[0xa2] = Some("if_icmpge");
    table[0xa3] = Some("if_icmpgt");
    table[0xa4] = Some("if_icmple");
    table[0xa5] = Some("if_acmpeq");
    table[0xa6] = Some("if_acmpne");
    table[0xa7] = Some("goto");
    table[0xa8] = Some("jsr");
    table[0xa9] = Some("ret");
    table[0xaa] = Some("tableswitch");
    table[0xab] = Some("lookupswitch");
    table[0xac] = Some("ireturn");
    table[0xad] = Some("lreturn");
    table[0xae] = Some("freturn");
    table[0xaf] = Some("dreturn");
    table[0xb0] = Some("areturn");
    table[0xb1] = Some("return");
    table[0xb2] = Some("getstatic");
    table[0xb3] = Some("putstatic");
    table[0xb4] = Some("getfield");
    table[0xb5] = Some("putfield");
    table[0xb6] = Some("invokevirtual");
    table[0xb7] = Some("invokespecial");
    table[0xb8] = Some("invokestatic");
    table[0xb9] = Some("invokeinterface");
    table[0xbb] = Some("new");
    table[0xbc] = Some("newarray");
    table[0xbd] = Some("anewarray");
    table[0xbe] = Some("arraylength");
    table[0xbf] = Some("athrow");
    table[0xc0] = Some("checkcast");
    table[0xc1] = Some("instanceof");
    table[0xc2] = Some("monitorenter");
    table[0xc3] = Some("monitorexit");
    table[0xc4] = Some("wide");
    table[0xc5] = Some("multianewarray");
    table[0xc6] = Some("ifnull");
    table[0xc7] = Some("ifnonnull");
    table[0xc8] = Some("goto_w");
    table[0xc9] = Some("jsr_w");
    table
};

/// Primitive element types accepted by `newarray`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArrayType {
    Boolean = 4,
    Char = 5,
    Float = 6,
    Double = 7,
    Byte = 8,
    Short = 9,
    Int = 10,
    Long = 11,
}

impl ArrayType {
    pub fn from_atype(atype: u8) -> Option<ArrayType> {
        let typ = match atype {
            4 => ArrayType::Boolean,
            5 => ArrayType::Char,
            6 => ArrayType::Float,
            7 => ArrayType::Double,
            8 => ArrayType::Byte,
            9 => ArrayType::Short,
            10 => ArrayType::Int,
            11 => ArrayType::Long,
            _ => return None,
        };
        Some(typ)
    }
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ArrayType::Boolean => "boolean",
            ArrayType::Char => "char",
            ArrayType::Float => "float",
            ArrayType::Double => "double",
            ArrayType::Byte => "byte",
            ArrayType::Short => "short",
            ArrayType::Int => "int",
            ArrayType::Long => "long",
        };
        f.write_str(name)
    }
}

/// One decoded instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: u8,
    pub operands: Operands,
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        MNEMONICS[self.opcode as usize].unwrap_or("<unknown>")
    }
}

/// Operand payload of an instruction, by operand shape
#[derive(Debug, Clone, PartialEq)]
pub enum Operands {
    /// The instruction is the opcode byte alone
    None,

    /// Unsigned 1-byte local variable index (loads, stores, `ret`)
    LocalIndex(u8),

    /// Constant pool index (`ldc` encodes it on 1 byte, the rest on 2)
    PoolIndex(u16),

    /// `bipush` immediate
    Byte(i8),

    /// `sipush` immediate
    Short(i16),

    /// Signed 16-bit branch offset, relative to the opcode byte
    Branch(i16),

    /// Signed 32-bit branch offset (`goto_w`, `jsr_w`)
    BranchWide(i32),

    Iinc {
        index: u8,
        constant: i8,
    },

    /// `count` is the historical argument-slot count and must be nonzero;
    /// the trailing zero byte is checked by the decoder and not retained
    InvokeInterface {
        index: u16,
        count: u8,
    },

    NewArray(ArrayType),

    MultiANewArray {
        index: u16,
        dimensions: u8,
    },

    /// Branch offsets are relative to the opcode byte, like `goto`
    TableSwitch {
        default: i32,
        low: i32,
        high: i32,
        offsets: Vec<i32>,
    },

    /// Match/offset pairs, sorted by match value in the class file
    LookupSwitch {
        default: i32,
        pairs: Vec<(i32, i32)>,
    },

    Wide(WideOperands),
}

/// Payload of a `wide`-prefixed instruction
#[derive(Debug, Clone, PartialEq)]
pub enum WideOperands {
    /// Load, store, or `ret` with a 2-byte local index
    LocalIndex { opcode: u8, index: u16 },

    Iinc { index: u16, constant: i16 },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.operands {
            Operands::None => f.write_str(self.mnemonic()),
            Operands::LocalIndex(index) => write!(f, "{} {}", self.mnemonic(), index),
            Operands::PoolIndex(index) => write!(f, "{} #{}", self.mnemonic(), index),
            Operands::Byte(value) => write!(f, "{} {}", self.mnemonic(), value),
            Operands::Short(value) => write!(f, "{} {}", self.mnemonic(), value),
            Operands::Branch(offset) => write!(f, "{} {:+}", self.mnemonic(), offset),
            Operands::BranchWide(offset) => write!(f, "{} {:+}", self.mnemonic(), offset),
            Operands::Iinc { index, constant } => {
                write!(f, "iinc {}, {}", index, constant)
            }
            Operands::InvokeInterface { index, count } => {
                write!(f, "invokeinterface #{}, {}", index, count)
            }
            Operands::NewArray(typ) => write!(f, "newarray {}", typ),
            Operands::MultiANewArray { index, dimensions } => {
                write!(f, "multianewarray #{}, {}", index, dimensions)
            }
            Operands::TableSwitch {
                default, low, high, ..
            } => {
                write!(f, "tableswitch {}..{} default {:+}", low, high, default)
            }
            Operands::LookupSwitch { default, pairs } => {
                write!(
                    f,
                    "lookupswitch {} pairs, default {:+}",
                    pairs.len(),
                    default
                )
            }
            Operands::Wide(WideOperands::LocalIndex { opcode, index }) => {
                let inner = MNEMONICS[*opcode as usize].unwrap_or("<unknown>");
                write!(f, "wide {} {}", inner, index)
            }
            Operands::Wide(WideOperands::Iinc { index, constant }) => {
                write!(f, "wide iinc {}, {}", index, constant)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mnemonic_table_covers_standard_opcodes() {
        assert_eq!(MNEMONICS[0x00], Some("nop"));
        assert_eq!(MNEMONICS[0x74], Some("ineg"));
        assert_eq!(MNEMONICS[0xc9], Some("jsr_w"));
        assert_eq!(MNEMONICS[0xba], None);
        assert_eq!(MNEMONICS[0xca], None);
        assert_eq!(MNEMONICS[0xff], None);
    }

    #[test]
    fn array_type_bounds() {
        assert_eq!(ArrayType::from_atype(3), None);
        assert_eq!(ArrayType::from_atype(4), Some(ArrayType::Boolean));
        assert_eq!(ArrayType::from_atype(11), Some(ArrayType::Long));
        assert_eq!(ArrayType::from_atype(12), None);
    }

    #[test]
    fn display_forms() {
        let insn = Instruction {
            opcode: opcode::SIPUSH,
            operands: Operands::Short(-300),
        };
        assert_eq!(insn.to_string(), "sipush -300");

        let insn = Instruction {
            opcode: opcode::INVOKEINTERFACE,
            operands: Operands::InvokeInterface { index: 9, count: 2 },
        };
        assert_eq!(insn.to_string(), "invokeinterface #9, 2");
    }
}
