//! Linked classes and the graph that owns them
//!
//! Linked classes reference each other (super classes, interfaces, resolved
//! constant-pool entries) through plain borrowed references. The graph is
//! the sole owner: classes live in an arena whose lifetime `'g` bounds every
//! reference between them, so the inheritance "graph" can never turn into an
//! ownership cycle.

use crate::jvm::class_file::{Code, Constant, ConstantPool};
use crate::jvm::descriptors::{FieldType, MethodDescriptor};
use crate::jvm::names::{BinaryName, Name, UnqualifiedName};
use crate::jvm::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};
use elsa::map::FrozenMap;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use typed_arena::Arena;

mod link;

/// Source of class file bytes, keyed by binary name
///
/// The graph never fetches anything itself; a provider hands it complete,
/// already-buffered class files. `None` means the name cannot be resolved
/// and surfaces as [`LinkError::NoClassDefFound`](crate::jvm::LinkError).
pub trait ClassProvider {
    fn class_bytes(&self, name: &BinaryName) -> Option<Vec<u8>>;
}

impl ClassProvider for HashMap<BinaryName, Vec<u8>> {
    fn class_bytes(&self, name: &BinaryName) -> Option<Vec<u8>> {
        self.get(name).cloned()
    }
}

/// Provider mapping `com/example/Foo` to `<root>/com/example/Foo.class`
pub struct DirectoryClassProvider {
    root: PathBuf,
}

impl DirectoryClassProvider {
    pub fn new(root: PathBuf) -> DirectoryClassProvider {
        DirectoryClassProvider { root }
    }
}

impl ClassProvider for DirectoryClassProvider {
    fn class_bytes(&self, name: &BinaryName) -> Option<Vec<u8>> {
        let mut path = self.root.clone();
        for segment in name.as_str().split('/') {
            path.push(segment);
        }
        path.set_extension("class");
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::debug!("No class bytes at {}: {}", path.display(), err);
                None
            }
        }
    }
}

pub struct ClassGraphArenas<'g> {
    class_arena: Arena<LinkedClass<'g>>,
}

impl<'g> ClassGraphArenas<'g> {
    pub fn new() -> Self {
        ClassGraphArenas {
            class_arena: Arena::new(),
        }
    }
}

impl<'g> Default for ClassGraphArenas<'g> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write-once registry of linked classes
///
/// The first successful load of a name wins; later requests for the same
/// name are served from the cache, so linking is idempotent per class.
pub struct ClassGraph<'g> {
    arenas: &'g ClassGraphArenas<'g>,

    /// Cache of linked classes; the values are arena references, so
    /// lookups hand out `'g` data rather than borrows of the graph
    classes: RefCell<HashMap<&'g BinaryName, &'g LinkedClass<'g>>>,

    provider: Box<dyn ClassProvider + 'g>,

    /// Names whose constant resolution failed after the class was already
    /// published; later loads of these report the failure instead of
    /// handing out a partially resolved class
    failed: RefCell<HashSet<BinaryName>>,
}

impl<'g> ClassGraph<'g> {
    /// New graph containing only the root class `java/lang/Object`
    ///
    /// The root class is built in rather than fetched from the provider: it
    /// is the one class allowed to have no super class, and every load
    /// eventually bottoms out on it.
    pub fn new(arenas: &'g ClassGraphArenas<'g>, provider: Box<dyn ClassProvider + 'g>) -> Self {
        let graph = ClassGraph {
            arenas,
            classes: RefCell::new(HashMap::new()),
            provider,
            failed: RefCell::new(HashSet::new()),
        };
        graph.add_class(LinkedClass {
            name: BinaryName::OBJECT,
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            superclass: None,
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
            constant_pool: ConstantPool::default(),
            resolved: FrozenMap::new(),
        });
        graph
    }

    /// Find an already-linked class
    ///
    /// Returns arena-lifetime data, not a borrow of the graph, so the
    /// class stays usable after the graph itself is gone. Names whose
    /// linking failed partway are not returned.
    pub fn lookup_class(&self, name: &BinaryName) -> Option<&'g LinkedClass<'g>> {
        if self.failed.borrow().contains(name) {
            return None;
        }
        self.classes.borrow().get(name).copied()
    }

    fn add_class(&self, class: LinkedClass<'g>) -> &'g LinkedClass<'g> {
        let class = &*self.arenas.class_arena.alloc(class);
        self.classes.borrow_mut().insert(&class.name, class);
        class
    }
}

/// A class whose constant pool and hierarchy have been fully resolved
pub struct LinkedClass<'g> {
    pub name: BinaryName,
    pub access_flags: ClassAccessFlags,

    /// `None` only for the root class
    pub superclass: Option<&'g LinkedClass<'g>>,

    pub interfaces: Vec<&'g LinkedClass<'g>>,
    pub fields: Vec<LinkedField>,
    pub methods: Vec<LinkedMethod>,

    /// The original pool, kept for `ldc`-style value lookups and inspection
    pub constant_pool: ConstantPool,

    /// Resolved symbolic references, keyed by pool index (filled once,
    /// during linking)
    resolved: FrozenMap<u16, Box<ResolvedConstant<'g>>>,
}

impl<'g> LinkedClass<'g> {
    pub fn is_interface(&self) -> bool {
        self.access_flags.is_interface()
    }

    /// Resolved form of a symbolic constant-pool entry, if the entry at
    /// this index was one
    pub fn resolved_constant(&self, index: u16) -> Option<&ResolvedConstant<'g>> {
        self.resolved.get(&index)
    }

    /// Walk from this class up through its super classes (inclusive)
    pub fn ancestors(&'g self) -> impl Iterator<Item = &'g LinkedClass<'g>> {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.superclass;
            Some(current)
        })
    }

    pub fn method(
        &self,
        name: &UnqualifiedName,
        descriptor: &MethodDescriptor,
    ) -> Option<&LinkedMethod> {
        self.methods
            .iter()
            .find(|method| method.name == *name && method.descriptor == *descriptor)
    }
}

impl<'g> PartialEq for LinkedClass<'g> {
    fn eq(&self, other: &LinkedClass<'g>) -> bool {
        self.name == other.name
    }
}

impl<'g> Eq for LinkedClass<'g> {}

impl<'g> fmt::Debug for LinkedClass<'g> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LinkedClass")
            .field("name", &self.name)
            .field("access_flags", &self.access_flags)
            .field("superclass", &self.superclass.map(|cls| &cls.name))
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct LinkedField {
    pub name: UnqualifiedName,
    pub access_flags: FieldAccessFlags,
    pub descriptor: FieldType,

    /// Value from a `ConstantValue` attribute, for `static final` fields
    pub constant_value: Option<Constant>,
}

#[derive(Debug)]
pub struct LinkedMethod {
    pub name: UnqualifiedName,
    pub access_flags: MethodAccessFlags,
    pub descriptor: MethodDescriptor,
    pub code: Option<Code>,
}

/// A symbolic constant-pool reference after resolution
#[derive(Debug)]
pub enum ResolvedConstant<'g> {
    Class(&'g LinkedClass<'g>),
    Field {
        class: &'g LinkedClass<'g>,
        name: UnqualifiedName,
        descriptor: FieldType,
    },
    Method {
        class: &'g LinkedClass<'g>,
        name: UnqualifiedName,
        descriptor: MethodDescriptor,

        /// Whether this came from an `InterfaceMethodref`
        is_interface: bool,
    },
}
