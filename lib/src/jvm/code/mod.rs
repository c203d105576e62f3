//! Bytecode instructions and their decoder

mod decode;
mod instruction;

pub use decode::{decode_code, decode_instruction};
pub use instruction::{opcode, ArrayType, Instruction, Operands, WideOperands, MNEMONICS};
