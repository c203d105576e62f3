use crate::jvm::memory::SlotType;
use crate::jvm::names::BinaryName;

/// Top-level error for anything that can go wrong while loading or running classes
#[derive(Debug)]
pub enum Error {
    Parse(ParseError),
    Link(LinkError),
    Memory(MemoryError),
    IoError(std::io::Error),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<LinkError> for Error {
    fn from(err: LinkError) -> Error {
        Error::Link(err)
    }
}

impl From<MemoryError> for Error {
    fn from(err: MemoryError) -> Error {
        Error::Memory(err)
    }
}

/// Structural violation in a class file, fatal to the class being parsed
///
/// The offset always points at (or just past) the bytes that triggered the error, so a
/// malformed input can be diagnosed down to the byte.
#[derive(Debug)]
pub struct ParseError {
    pub offset: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn at(offset: usize, kind: ParseErrorKind) -> ParseError {
        ParseError { offset, kind }
    }

    /// Shift the offset by `base` bytes
    ///
    /// The bytecode decoder reports offsets relative to the start of the code array; the
    /// class-file parser rebases them onto the enclosing buffer.
    pub fn rebase(mut self, base: usize) -> ParseError {
        self.offset += base;
        self
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// First four bytes were not `0xCAFEBABE`
    BadMagic(u32),

    /// Input ended before a fixed-width read could complete
    TruncatedInput,

    /// Illegal lead byte in a modified UTF-8 string
    InvalidEncoding { byte: u8 },

    UnknownConstantTag(u8),
    ConstantPoolIndexOutOfBounds { index: u16 },
    ExpectedClassConstant { index: u16 },
    ExpectedUtf8Constant { index: u16 },

    /// A fixed-size attribute declared the wrong length
    InvalidAttributeLength { attribute: &'static str, length: u32 },

    /// `ConstantValue` referenced a constant that is not a loadable value
    InvalidConstantValueType { index: u16 },

    /// A `Code` attribute declared `code_length == 0`
    EmptyCode,

    /// The instruction stream did not line up with the declared `code_length`
    CodeLengthMismatch,

    /// Non-zero byte in `tableswitch`/`lookupswitch` alignment padding
    InvalidPadding { byte: u8 },

    /// `tableswitch` with `low > high`
    InvalidSwitchRange { low: i32, high: i32 },

    /// Sub-opcode not in the load/store/iinc/ret family after a `wide` prefix
    InvalidWideOpcode(u8),

    /// `invokeinterface` without its mandatory trailing zero byte
    InvalidInvokeInterfaceFormat,

    /// `newarray` type code outside `[T_BOOLEAN, T_LONG]`
    UnknownArrayType(u8),

    /// `multianewarray` with zero dimensions
    InvalidDimensions,

    UnknownOpcode(u8),
}

/// Violation of an inter-class rule while linking, fatal to the requesting class
#[derive(Debug)]
pub enum LinkError {
    /// Parsing the bytes for a requested class failed
    Malformed(BinaryName, ParseError),

    /// The class provider had no bytes for this name
    NoClassDefFound(BinaryName),

    /// A class appeared in its own super-class/interface resolution chain
    ClassCircularity(BinaryName),

    /// A super class turned out to be an interface, or a `Methodref`/`InterfaceMethodref`
    /// disagreed with the interface bit of its owner
    IncompatibleClassChange(String),

    CannotExtendFinalClass {
        class: BinaryName,
        superclass: BinaryName,
    },
    FinalMethodOverride {
        class: BinaryName,
        method: String,
    },

    /// A class other than the root class has no super class
    MissingSuperClass(BinaryName),

    InterfaceMustExtendObject(BinaryName),
    NotAnInterface(BinaryName),

    /// Method names may not start with `<` (except `<init>`/`<clinit>`)
    IllegalMethodName(String),
    IllegalFieldName(String),
    IllegalClassName(String),
    ConstructorMustReturnVoid(String),

    /// A field or method descriptor failed to parse
    BadDescriptor(String),

    ExpectedClassConstant { index: u16 },
    ExpectedUtf8Constant { index: u16 },
    ExpectedNameAndType { index: u16 },
    ConstantPoolIndexOutOfBounds { index: u16 },
}

/// Runtime type-safety violation in the memory model
#[derive(Debug, PartialEq, Eq)]
pub enum MemoryError {
    /// A stack slot was read with the wrong type tag
    TypeMismatch {
        slot: usize,
        expected: SlotType,
        actual: SlotType,
    },
    SlotOutOfRange {
        slot: usize,
        capacity: usize,
    },
}
