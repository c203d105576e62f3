//! Constant pool entries
//!
//! See [this section of the JVM spec][0] for more information.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.4

/// Tags discriminating constant pool entries
pub mod tag {
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELDREF: u8 = 9;
    pub const METHODREF: u8 = 10;
    pub const INTERFACE_METHODREF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
}

/// A single entry in the constant pool
///
/// Entries which refer to other entries do so by their 1-based pool index.
/// The referents are only checked during linking, not parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Modified UTF-8 string, already decoded
    Utf8(String),

    Integer(i32),
    Float(f32),

    /// Occupies two pool slots
    Long(i64),

    /// Occupies two pool slots
    Double(f64),

    /// Class or interface, pointing at a `Utf8` binary name
    Class { name_index: u16 },

    /// String literal, pointing at a `Utf8` entry
    String { string_index: u16 },

    FieldRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    MethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },

    /// Name and descriptor pair, both pointing at `Utf8` entries
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
}

impl Constant {
    /// Number of pool slots the entry occupies
    pub fn width(&self) -> u16 {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }

    /// Short human-readable name, matching `javap` output
    pub fn type_name(&self) -> &'static str {
        match self {
            Constant::Utf8(_) => "Utf8",
            Constant::Integer(_) => "Integer",
            Constant::Float(_) => "Float",
            Constant::Long(_) => "Long",
            Constant::Double(_) => "Double",
            Constant::Class { .. } => "Class",
            Constant::String { .. } => "String",
            Constant::FieldRef { .. } => "Fieldref",
            Constant::MethodRef { .. } => "Methodref",
            Constant::InterfaceMethodRef { .. } => "InterfaceMethodref",
            Constant::NameAndType { .. } => "NameAndType",
        }
    }
}

/// The constant pool of one class file
///
/// Indices are 1-based. Index 0 is always unoccupied, and `Long`/`Double`
/// entries leave the slot after them unoccupied too.
#[derive(Debug, Default)]
pub struct ConstantPool {
    slots: Vec<Option<Constant>>,
}

impl ConstantPool {
    pub fn with_count(count: u16) -> ConstantPool {
        let mut slots = Vec::with_capacity(count as usize);
        slots.push(None);
        ConstantPool { slots }
    }

    /// Declared `constant_pool_count` (one more than the last valid index)
    pub fn count(&self) -> u16 {
        self.slots.len() as u16
    }

    pub(crate) fn push(&mut self, constant: Constant) {
        let width = constant.width();
        self.slots.push(Some(constant));
        if width == 2 {
            self.slots.push(None);
        }
    }

    /// Look up an entry, returning `None` for index 0, out of range
    /// indices, and the trailing slot of a `Long`/`Double`
    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.slots.get(index as usize)?.as_ref()
    }

    /// Look up a `Utf8` entry
    pub fn utf8(&self, index: u16) -> Option<&str> {
        match self.get(index)? {
            Constant::Utf8(string) => Some(string.as_str()),
            _ => None,
        }
    }

    /// Look up a `Class` entry and follow it to its binary name
    pub fn class_name(&self, index: u16) -> Option<&str> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => None,
        }
    }

    /// Look up a `NameAndType` entry and follow both references
    pub fn name_and_type(&self, index: u16) -> Option<(&str, &str)> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Some((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => None,
        }
    }

    /// Iterate over occupied slots along with their 1-based indices
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| Some((idx as u16, slot.as_ref()?)))
    }
}
