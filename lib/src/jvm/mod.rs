//! Core of a small JVM: class file parsing, bytecode decoding, linking, and
//! the runtime memory model
//!
//! The pipeline goes bytes → [`class_file::ClassFile`] (via
//! [`class_file::parse_class_file`]) → [`class_graph::LinkedClass`] (via
//! [`class_graph::ClassGraph::load_class`]). Bytecode is decoded into
//! [`code::Instruction`] streams as part of parsing; execution semantics are
//! out of scope. The [`memory`] module supplies the typed stack and heap the
//! eventual interpreter runs against.

mod access_flags;
pub mod class_file;
pub mod class_graph;
pub mod code;
mod descriptors;
mod errors;
pub mod memory;
pub mod mutf8;
mod names;
mod reader;

pub use access_flags::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};
pub use descriptors::{
    BaseType, DescriptorError, FieldType, MethodDescriptor, ParseDescriptor, RenderDescriptor,
};
pub use errors::{Error, LinkError, MemoryError, ParseError, ParseErrorKind};
pub use names::{BinaryName, Name, UnqualifiedName};
pub use reader::ClassReader;
