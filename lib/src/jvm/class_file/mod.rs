//! Binary class file representation

mod attribute;
mod class;
pub mod constants;
mod parse;

pub use attribute::{Attribute, Code, ExceptionHandler};
pub use class::{ClassFile, Field, Method};
pub use constants::{Constant, ConstantPool};
pub use parse::parse_class_file;
