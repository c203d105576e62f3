//! Class file attributes
//!
//! Only the attributes the VM core needs are given structured forms; anything
//! else is retained opaquely so the inspector can still report its presence.
//!
//! See [this section of the JVM spec][0] for more information.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.7

use crate::jvm::code::Instruction;

#[derive(Debug)]
pub enum Attribute {
    /// Initial value of a `static final` field (pool index of the value)
    ConstantValue { constant_value_index: u16 },

    Code(Code),

    /// Pool indices of `Class` entries for checked exceptions
    Exceptions { exception_index_table: Vec<u16> },

    /// Attribute the VM core does not interpret
    Other { name: String, info: Vec<u8> },
}

impl Attribute {
    /// Attribute name as it appears in the class file
    pub fn name(&self) -> &str {
        match self {
            Attribute::ConstantValue { .. } => "ConstantValue",
            Attribute::Code(_) => "Code",
            Attribute::Exceptions { .. } => "Exceptions",
            Attribute::Other { name, .. } => name.as_str(),
        }
    }
}

/// Body of a `Code` attribute, with the bytecode already decoded
#[derive(Debug)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,

    /// Length in bytes of the encoded `code` array
    pub code_length: u32,

    /// Decoded instructions, keyed by their byte offset in the `code` array
    pub instructions: Vec<(u32, Instruction)>,

    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// Start (inclusive) of the range where the handler is active
    pub start_pc: u16,

    /// End (exclusive) of the range where the handler is active
    pub end_pc: u16,

    pub handler_pc: u16,

    /// Pool index of the caught class, or 0 to catch everything
    pub catch_type: u16,
}
