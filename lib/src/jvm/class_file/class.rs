use crate::jvm::class_file::attribute::Attribute;
use crate::jvm::class_file::constants::ConstantPool;
use crate::jvm::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};

/// A parsed (but not yet linked) class file
///
/// Symbolic references in the constant pool still point at pool indices;
/// the linker is responsible for chasing and checking them.
#[derive(Debug)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: ClassAccessFlags,

    /// Pool index of the `Class` entry naming this class
    pub this_class: u16,

    /// Pool index of the superclass, or 0 for `java/lang/Object`
    pub super_class: u16,

    /// Pool indices of `Class` entries for direct superinterfaces
    pub interfaces: Vec<u16>,

    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Binary name of this class, if the pool indices check out
    pub fn this_class_name(&self) -> Option<&str> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Binary name of the superclass (`None` when `super_class` is 0)
    pub fn super_class_name(&self) -> Option<&str> {
        if self.super_class == 0 {
            None
        } else {
            self.constant_pool.class_name(self.super_class)
        }
    }
}

#[derive(Debug)]
pub struct Field {
    pub access_flags: FieldAccessFlags,

    /// Pool index of the `Utf8` unqualified name
    pub name_index: u16,

    /// Pool index of the `Utf8` field descriptor
    pub descriptor_index: u16,

    pub attributes: Vec<Attribute>,
}

#[derive(Debug)]
pub struct Method {
    pub access_flags: MethodAccessFlags,

    /// Pool index of the `Utf8` unqualified name
    pub name_index: u16,

    /// Pool index of the `Utf8` method descriptor
    pub descriptor_index: u16,

    pub attributes: Vec<Attribute>,
}

impl Field {
    pub fn name<'a>(&self, pool: &'a ConstantPool) -> Option<&'a str> {
        pool.utf8(self.name_index)
    }

    pub fn descriptor<'a>(&self, pool: &'a ConstantPool) -> Option<&'a str> {
        pool.utf8(self.descriptor_index)
    }
}

impl Method {
    pub fn name<'a>(&self, pool: &'a ConstantPool) -> Option<&'a str> {
        pool.utf8(self.name_index)
    }

    pub fn descriptor<'a>(&self, pool: &'a ConstantPool) -> Option<&'a str> {
        pool.utf8(self.descriptor_index)
    }

    /// The method's `Code` attribute, if it carries one
    pub fn code(&self) -> Option<&crate::jvm::class_file::attribute::Code> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::Code(code) => Some(code),
            _ => None,
        })
    }
}
