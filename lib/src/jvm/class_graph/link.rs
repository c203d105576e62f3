//! Class loading and linking
//!
//! Loading a class parses its bytes, recursively links its super class and
//! interfaces, verifies the inter-class rules (finality, interface bits,
//! special method names), and resolves every symbolic constant-pool entry.
//! The ancestry set threaded through recursive calls is copied per call, so
//! sibling loads cannot observe names added deeper in the chain; it is what
//! turns cyclic inheritance into [`LinkError::ClassCircularity`] instead of
//! unbounded recursion.

use super::{ClassGraph, LinkedClass, LinkedField, LinkedMethod, ResolvedConstant};
use crate::jvm::class_file::{parse_class_file, Attribute, ClassFile, Constant, ConstantPool};
use crate::jvm::descriptors::{FieldType, MethodDescriptor, ParseDescriptor, RenderDescriptor};
use crate::jvm::errors::LinkError;
use crate::jvm::names::{BinaryName, Name, UnqualifiedName};
use crate::jvm::MethodAccessFlags;
use elsa::map::FrozenMap;
use std::collections::HashSet;

impl<'g> ClassGraph<'g> {
    /// Load and link a class by name, along with everything it references
    ///
    /// Loading is idempotent: the first successful load of a name is cached
    /// and every later request returns the same linked class. A name whose
    /// constant resolution failed is poisoned and every later request fails
    /// with [`LinkError::NoClassDefFound`], never a half-resolved class.
    pub fn load_class(&self, name: &BinaryName) -> Result<&'g LinkedClass<'g>, LinkError> {
        self.load_class_with_ancestry(name, &HashSet::new())
    }

    fn load_class_with_ancestry(
        &self,
        name: &BinaryName,
        ancestry: &HashSet<BinaryName>,
    ) -> Result<&'g LinkedClass<'g>, LinkError> {
        if self.failed.borrow().contains(name) {
            return Err(LinkError::NoClassDefFound(name.clone()));
        }
        if let Some(class) = self.lookup_class(name) {
            return Ok(class);
        }
        if ancestry.contains(name) {
            return Err(LinkError::ClassCircularity(name.clone()));
        }

        let bytes = self
            .provider
            .class_bytes(name)
            .ok_or_else(|| LinkError::NoClassDefFound(name.clone()))?;
        let class_file =
            parse_class_file(&bytes).map_err(|err| LinkError::Malformed(name.clone(), err))?;
        self.link_class(name, class_file, ancestry)
    }

    fn link_class(
        &self,
        name: &BinaryName,
        class_file: ClassFile,
        ancestry: &HashSet<BinaryName>,
    ) -> Result<&'g LinkedClass<'g>, LinkError> {
        let declared = class_name_at(&class_file.constant_pool, class_file.this_class)?;
        if declared != *name {
            log::warn!("Requested class {} but its bytes declare {}", name, declared);
            return Err(LinkError::NoClassDefFound(name.clone()));
        }

        // Copied, not shared: sibling recursive loads must each see only
        // their own chain
        let mut ancestry = ancestry.clone();
        ancestry.insert(name.clone());

        let access_flags = class_file.access_flags;

        let superclass = if class_file.super_class == 0 {
            if *name != BinaryName::OBJECT {
                return Err(LinkError::MissingSuperClass(name.clone()));
            }
            None
        } else {
            let super_name = class_name_at(&class_file.constant_pool, class_file.super_class)?;
            if access_flags.is_interface() && super_name != BinaryName::OBJECT {
                return Err(LinkError::InterfaceMustExtendObject(name.clone()));
            }
            let superclass = self.load_class_with_ancestry(&super_name, &ancestry)?;
            if superclass.is_interface() {
                return Err(LinkError::IncompatibleClassChange(format!(
                    "{} has interface {} as its super class",
                    name, super_name
                )));
            }
            if superclass.access_flags.is_final() {
                return Err(LinkError::CannotExtendFinalClass {
                    class: name.clone(),
                    superclass: super_name,
                });
            }
            Some(superclass)
        };

        let mut interfaces = Vec::with_capacity(class_file.interfaces.len());
        for &index in &class_file.interfaces {
            let interface_name = class_name_at(&class_file.constant_pool, index)?;
            let interface = self.load_class_with_ancestry(&interface_name, &ancestry)?;
            if !interface.is_interface() {
                return Err(LinkError::NotAnInterface(interface_name));
            }
            interfaces.push(interface);
        }

        // Loading the hierarchy can have linked this very class already: a
        // super class's pool may reference back down to it, and resolving
        // that reference re-enters the loader. The recursive link won.
        if let Some(existing) = self.lookup_class(name) {
            return Ok(existing);
        }

        // From here on only the pool is still needed from the parsed file
        let ClassFile {
            constant_pool,
            fields: raw_fields,
            methods: raw_methods,
            ..
        } = class_file;

        let mut fields = Vec::with_capacity(raw_fields.len());
        for field in raw_fields {
            let field_name = utf8_at(&constant_pool, field.name_index)?;
            let field_name = UnqualifiedName::from_string(String::from(field_name))
                .map_err(LinkError::IllegalFieldName)?;
            let descriptor = FieldType::parse(utf8_at(&constant_pool, field.descriptor_index)?)
                .map_err(|err| LinkError::BadDescriptor(err.0))?;

            let mut constant_value = None;
            for attribute in field.attributes {
                if let Attribute::ConstantValue {
                    constant_value_index,
                } = attribute
                {
                    constant_value = constant_pool.get(constant_value_index).cloned();
                }
            }

            fields.push(LinkedField {
                name: field_name,
                access_flags: field.access_flags,
                descriptor,
                constant_value,
            });
        }

        let mut methods = Vec::with_capacity(raw_methods.len());
        for method in raw_methods {
            let name_str = utf8_at(&constant_pool, method.name_index)?;
            let descriptor_str = utf8_at(&constant_pool, method.descriptor_index)?;
            let descriptor = MethodDescriptor::parse(descriptor_str)
                .map_err(|err| LinkError::BadDescriptor(err.0))?;
            check_special_method_name(name, name_str, &descriptor)?;
            let method_name = UnqualifiedName::from_string(String::from(name_str))
                .map_err(LinkError::IllegalMethodName)?;

            if !method.access_flags.is_static() {
                self.check_final_override(name, superclass, &method_name, &descriptor)?;
            }

            let mut code = None;
            for attribute in method.attributes {
                if let Attribute::Code(body) = attribute {
                    code = Some(body);
                }
            }

            methods.push(LinkedMethod {
                name: method_name,
                access_flags: method.access_flags,
                descriptor,
                code,
            });
        }

        let class = self.add_class(LinkedClass {
            name: name.clone(),
            access_flags,
            superclass,
            interfaces,
            fields,
            methods,
            constant_pool,
            resolved: FrozenMap::new(),
        });

        // The class is already cached, so references back to it (including
        // self-references) resolve without re-entering the loader. If
        // resolution fails the name is poisoned: the cache is write-once,
        // so the partial class can only be unpublished by refusing to
        // serve it.
        if let Err(err) = self.resolve_constants(class) {
            self.failed.borrow_mut().insert(class.name.clone());
            return Err(err);
        }
        log::debug!("Linked class {}", class.name);
        Ok(class)
    }

    fn check_final_override(
        &self,
        class_name: &BinaryName,
        superclass: Option<&'g LinkedClass<'g>>,
        method_name: &UnqualifiedName,
        descriptor: &MethodDescriptor,
    ) -> Result<(), LinkError> {
        let superclass = match superclass {
            Some(superclass) => superclass,
            None => return Ok(()),
        };
        for ancestor in superclass.ancestors() {
            if let Some(existing) = ancestor.method(method_name, descriptor) {
                let flags = existing.access_flags;
                if flags.is_final()
                    && !flags.is_static()
                    && !flags.contains(MethodAccessFlags::PRIVATE)
                {
                    return Err(LinkError::FinalMethodOverride {
                        class: class_name.clone(),
                        method: format!("{}{}", method_name.as_str(), descriptor.render()),
                    });
                }
                // The closest declaration decides; further ancestors are
                // shadowed by it
                break;
            }
        }
        Ok(())
    }

    /// Resolve every symbolic reference in the class's pool
    fn resolve_constants(&self, class: &'g LinkedClass<'g>) -> Result<(), LinkError> {
        let pool = &class.constant_pool;
        for (index, constant) in pool.iter() {
            let resolved = match constant {
                Constant::Class { name_index } => {
                    let target = utf8_at(pool, *name_index)?;
                    // Array class names are descriptors, not loadable names
                    if target.starts_with('[') {
                        continue;
                    }
                    let target = binary_name(target)?;
                    ResolvedConstant::Class(self.load_class(&target)?)
                }

                Constant::FieldRef {
                    class_index,
                    name_and_type_index,
                } => {
                    let owner = self.resolve_owner(pool, *class_index)?;
                    let (member, descriptor) = name_and_type_at(pool, *name_and_type_index)?;
                    let descriptor = FieldType::parse(descriptor)
                        .map_err(|err| LinkError::BadDescriptor(err.0))?;
                    let member = UnqualifiedName::from_string(String::from(member))
                        .map_err(LinkError::IllegalFieldName)?;
                    ResolvedConstant::Field {
                        class: owner,
                        name: member,
                        descriptor,
                    }
                }

                Constant::MethodRef {
                    class_index,
                    name_and_type_index,
                }
                | Constant::InterfaceMethodRef {
                    class_index,
                    name_and_type_index,
                } => {
                    let is_interface = matches!(constant, Constant::InterfaceMethodRef { .. });
                    let owner = self.resolve_owner(pool, *class_index)?;
                    if owner.is_interface() != is_interface {
                        let expected = if is_interface {
                            "InterfaceMethodref to a class"
                        } else {
                            "Methodref to an interface"
                        };
                        return Err(LinkError::IncompatibleClassChange(format!(
                            "{} ({} at index {})",
                            owner.name, expected, index
                        )));
                    }
                    let (member, descriptor_str) = name_and_type_at(pool, *name_and_type_index)?;
                    let descriptor = MethodDescriptor::parse(descriptor_str)
                        .map_err(|err| LinkError::BadDescriptor(err.0))?;
                    check_special_method_name(&class.name, member, &descriptor)?;
                    let member = UnqualifiedName::from_string(String::from(member))
                        .map_err(LinkError::IllegalMethodName)?;
                    ResolvedConstant::Method {
                        class: owner,
                        name: member,
                        descriptor,
                        is_interface,
                    }
                }

                Constant::String { string_index } => {
                    utf8_at(pool, *string_index)?;
                    continue;
                }

                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    utf8_at(pool, *name_index)?;
                    utf8_at(pool, *descriptor_index)?;
                    continue;
                }

                // Plain values need no resolution
                _ => continue,
            };
            class.resolved.insert(index, Box::new(resolved));
        }
        Ok(())
    }

    fn resolve_owner(
        &self,
        pool: &ConstantPool,
        index: u16,
    ) -> Result<&'g LinkedClass<'g>, LinkError> {
        let owner_name = class_name_at(pool, index)?;
        self.load_class(&owner_name)
    }
}

/// `<init>` must return void; no other method name may begin with `<`
/// (`UnqualifiedName` itself rejects everything but `<init>`/`<clinit>`)
fn check_special_method_name(
    class_name: &BinaryName,
    method_name: &str,
    descriptor: &MethodDescriptor,
) -> Result<(), LinkError> {
    if method_name == "<init>" && descriptor.return_type.is_some() {
        return Err(LinkError::ConstructorMustReturnVoid(format!(
            "{}.<init>",
            class_name
        )));
    }
    Ok(())
}

fn class_name_at(pool: &ConstantPool, index: u16) -> Result<BinaryName, LinkError> {
    match pool.get(index) {
        Some(Constant::Class { name_index }) => binary_name(utf8_at(pool, *name_index)?),
        Some(_) => Err(LinkError::ExpectedClassConstant { index }),
        None => Err(LinkError::ConstantPoolIndexOutOfBounds { index }),
    }
}

fn utf8_at(pool: &ConstantPool, index: u16) -> Result<&str, LinkError> {
    pool.utf8(index)
        .ok_or(LinkError::ExpectedUtf8Constant { index })
}

fn name_and_type_at(pool: &ConstantPool, index: u16) -> Result<(&str, &str), LinkError> {
    pool.name_and_type(index)
        .ok_or(LinkError::ExpectedNameAndType { index })
}

fn binary_name(name: &str) -> Result<BinaryName, LinkError> {
    BinaryName::from_string(String::from(name)).map_err(LinkError::IllegalClassName)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_file::constants::tag;
    use crate::jvm::class_graph::{ClassGraphArenas, ClassProvider};
    use std::collections::HashMap;

    const ACC_PUBLIC: u16 = 0x0001;
    const ACC_FINAL: u16 = 0x0010;
    const ACC_SUPER: u16 = 0x0020;
    const ACC_INTERFACE: u16 = 0x0200;
    const ACC_ABSTRACT: u16 = 0x0400;

    /// Assembles the bytes of one class file for linker tests
    #[derive(Default)]
    struct ClassAssembler {
        pool: Vec<u8>,
        pool_entries: u16,
    }

    impl ClassAssembler {
        fn utf8(&mut self, string: &str) -> u16 {
            let encoded = crate::jvm::mutf8::encode(string);
            self.pool.push(tag::UTF8);
            self.pool.extend_from_slice(&(encoded.len() as u16).to_be_bytes());
            self.pool.extend_from_slice(&encoded);
            self.pool_entries += 1;
            self.pool_entries
        }

        fn class(&mut self, name: &str) -> u16 {
            let name_index = self.utf8(name);
            self.pool.push(tag::CLASS);
            self.pool.extend_from_slice(&name_index.to_be_bytes());
            self.pool_entries += 1;
            self.pool_entries
        }

        fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
            let name_index = self.utf8(name);
            let descriptor_index = self.utf8(descriptor);
            self.pool.push(tag::NAME_AND_TYPE);
            self.pool.extend_from_slice(&name_index.to_be_bytes());
            self.pool.extend_from_slice(&descriptor_index.to_be_bytes());
            self.pool_entries += 1;
            self.pool_entries
        }

        fn member_ref(&mut self, ref_tag: u8, class: &str, name: &str, descriptor: &str) -> u16 {
            let class_index = self.class(class);
            let nat_index = self.name_and_type(name, descriptor);
            self.pool.push(ref_tag);
            self.pool.extend_from_slice(&class_index.to_be_bytes());
            self.pool.extend_from_slice(&nat_index.to_be_bytes());
            self.pool_entries += 1;
            self.pool_entries
        }
    }

    /// A class with the given super, interfaces, and attribute-less methods
    fn class_bytes(
        assembler: &mut ClassAssembler,
        name: &str,
        flags: u16,
        super_name: Option<&str>,
        interfaces: &[&str],
        methods: &[(&str, &str, u16)],
    ) -> Vec<u8> {
        let this_index = assembler.class(name);
        let super_index = super_name.map(|s| assembler.class(s)).unwrap_or(0);
        let interface_indices: Vec<u16> = interfaces.iter().map(|s| assembler.class(s)).collect();
        let method_indices: Vec<(u16, u16, u16)> = methods
            .iter()
            .map(|(name, descriptor, flags)| {
                (assembler.utf8(name), assembler.utf8(descriptor), *flags)
            })
            .collect();

        let mut out = vec![];
        out.extend_from_slice(&0xCAFEBABEu32.to_be_bytes());
        out.extend_from_slice(&[0, 0, 0, 52]); // minor 0, major 52
        out.extend_from_slice(&(assembler.pool_entries + 1).to_be_bytes());
        out.extend_from_slice(&assembler.pool);
        out.extend_from_slice(&flags.to_be_bytes());
        out.extend_from_slice(&this_index.to_be_bytes());
        out.extend_from_slice(&super_index.to_be_bytes());
        out.extend_from_slice(&(interface_indices.len() as u16).to_be_bytes());
        for index in interface_indices {
            out.extend_from_slice(&index.to_be_bytes());
        }
        out.extend_from_slice(&0u16.to_be_bytes()); // fields
        out.extend_from_slice(&(method_indices.len() as u16).to_be_bytes());
        for (name_index, descriptor_index, method_flags) in method_indices {
            out.extend_from_slice(&method_flags.to_be_bytes());
            out.extend_from_slice(&name_index.to_be_bytes());
            out.extend_from_slice(&descriptor_index.to_be_bytes());
            out.extend_from_slice(&0u16.to_be_bytes()); // attributes
        }
        out.extend_from_slice(&0u16.to_be_bytes()); // class attributes
        out
    }

    fn simple_class(
        name: &str,
        flags: u16,
        super_name: Option<&str>,
        interfaces: &[&str],
        methods: &[(&str, &str, u16)],
    ) -> Vec<u8> {
        let mut assembler = ClassAssembler::default();
        class_bytes(&mut assembler, name, flags, super_name, interfaces, methods)
    }

    fn provider(classes: &[(&str, Vec<u8>)]) -> Box<dyn ClassProvider> {
        let mut map = HashMap::new();
        for (name, bytes) in classes {
            map.insert(
                BinaryName::from_string(String::from(*name)).unwrap(),
                bytes.clone(),
            );
        }
        Box::new(map)
    }

    fn name(string: &str) -> BinaryName {
        BinaryName::from_string(String::from(string)).unwrap()
    }

    #[test]
    fn root_class_is_built_in() {
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&[]));
        let object = graph.load_class(&BinaryName::OBJECT).unwrap();
        assert!(object.superclass.is_none());
        assert!(!object.is_interface());
    }

    #[test]
    fn links_a_hierarchy_and_caches_it() {
        let classes = [
            (
                "B",
                simple_class("B", ACC_PUBLIC | ACC_SUPER, Some("java/lang/Object"), &[], &[]),
            ),
            ("A", simple_class("A", ACC_PUBLIC | ACC_SUPER, Some("B"), &[], &[])),
        ];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));

        let a = graph.load_class(&name("A")).unwrap();
        assert_eq!(a.superclass.unwrap().name, name("B"));
        assert_eq!(
            a.superclass.unwrap().superclass.unwrap().name,
            BinaryName::OBJECT
        );

        // Loading again returns the identical linked class
        let again = graph.load_class(&name("A")).unwrap();
        assert!(std::ptr::eq(a, again));
    }

    #[test]
    fn linked_classes_outlive_the_graph() {
        // Classes are arena data: dropping the graph must not invalidate
        // references it handed out
        let arenas = ClassGraphArenas::new();
        let object = {
            let graph = ClassGraph::new(&arenas, provider(&[]));
            graph.load_class(&BinaryName::OBJECT).unwrap()
        };
        assert_eq!(object.name, BinaryName::OBJECT);
        assert!(object.superclass.is_none());
    }

    #[test]
    fn failed_resolution_poisons_the_name() {
        // "Q" is not a field descriptor, so resolving A's pool fails after
        // A is already in the cache
        let mut assembler = ClassAssembler::default();
        assembler.member_ref(tag::FIELDREF, "A", "x", "Q");
        let a_bytes = class_bytes(
            &mut assembler,
            "A",
            ACC_PUBLIC | ACC_SUPER,
            Some("java/lang/Object"),
            &[],
            &[],
        );
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&[("A", a_bytes)]));

        let err = graph.load_class(&name("A")).unwrap_err();
        assert!(matches!(err, LinkError::BadDescriptor(_)));

        // Later loads keep failing rather than serving the partial class
        let again = graph.load_class(&name("A")).unwrap_err();
        assert!(matches!(again, LinkError::NoClassDefFound(poisoned) if poisoned == name("A")));
        assert!(graph.lookup_class(&name("A")).is_none());
    }

    #[test]
    fn superclass_pool_may_reference_the_subclass() {
        // B's pool points back down at A while A extends B; resolving B
        // re-enters the loader for A mid-link, and only one A may win
        let mut assembler_b = ClassAssembler::default();
        let a_ref = assembler_b.member_ref(tag::FIELDREF, "A", "a", "LA;");
        let b_bytes = class_bytes(
            &mut assembler_b,
            "B",
            ACC_PUBLIC | ACC_SUPER,
            Some("java/lang/Object"),
            &[],
            &[],
        );
        let classes = [
            ("A", simple_class("A", ACC_PUBLIC | ACC_SUPER, Some("B"), &[], &[])),
            ("B", b_bytes),
        ];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));

        let a = graph.load_class(&name("A")).unwrap();
        assert!(std::ptr::eq(graph.load_class(&name("A")).unwrap(), a));

        // B's resolved reference is that same A
        let b = graph.lookup_class(&name("B")).unwrap();
        match b.resolved_constant(a_ref) {
            Some(ResolvedConstant::Field { class, .. }) => assert!(std::ptr::eq(*class, a)),
            other => panic!("unexpected resolution: {:?}", other),
        }
    }

    #[test]
    fn unresolvable_class() {
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&[]));
        let err = graph.load_class(&name("ghost/Missing")).unwrap_err();
        assert!(matches!(err, LinkError::NoClassDefFound(missing) if missing == name("ghost/Missing")));
    }

    #[test]
    fn cannot_extend_final_class() {
        let classes = [
            (
                "B",
                simple_class(
                    "B",
                    ACC_PUBLIC | ACC_FINAL | ACC_SUPER,
                    Some("java/lang/Object"),
                    &[],
                    &[],
                ),
            ),
            ("A", simple_class("A", ACC_PUBLIC | ACC_SUPER, Some("B"), &[], &[])),
        ];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        let err = graph.load_class(&name("A")).unwrap_err();
        assert!(matches!(
            err,
            LinkError::CannotExtendFinalClass { class, superclass }
                if class == name("A") && superclass == name("B")
        ));
    }

    #[test]
    fn inheritance_cycle_is_an_error_not_a_hang() {
        let classes = [
            ("A", simple_class("A", ACC_PUBLIC | ACC_SUPER, Some("B"), &[], &[])),
            ("B", simple_class("B", ACC_PUBLIC | ACC_SUPER, Some("A"), &[], &[])),
        ];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        let err = graph.load_class(&name("A")).unwrap_err();
        assert!(matches!(err, LinkError::ClassCircularity(cycled) if cycled == name("A")));
    }

    #[test]
    fn missing_super_class() {
        let classes = [("A", simple_class("A", ACC_PUBLIC | ACC_SUPER, None, &[], &[]))];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        let err = graph.load_class(&name("A")).unwrap_err();
        assert!(matches!(err, LinkError::MissingSuperClass(missing) if missing == name("A")));
    }

    #[test]
    fn implements_an_interface() {
        let classes = [
            (
                "I",
                simple_class(
                    "I",
                    ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT,
                    Some("java/lang/Object"),
                    &[],
                    &[],
                ),
            ),
            (
                "A",
                simple_class("A", ACC_PUBLIC | ACC_SUPER, Some("java/lang/Object"), &["I"], &[]),
            ),
        ];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        let a = graph.load_class(&name("A")).unwrap();
        assert_eq!(a.interfaces.len(), 1);
        assert!(a.interfaces[0].is_interface());
    }

    #[test]
    fn implemented_type_must_be_an_interface() {
        let classes = [
            (
                "NotIface",
                simple_class(
                    "NotIface",
                    ACC_PUBLIC | ACC_SUPER,
                    Some("java/lang/Object"),
                    &[],
                    &[],
                ),
            ),
            (
                "A",
                simple_class(
                    "A",
                    ACC_PUBLIC | ACC_SUPER,
                    Some("java/lang/Object"),
                    &["NotIface"],
                    &[],
                ),
            ),
        ];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        let err = graph.load_class(&name("A")).unwrap_err();
        assert!(matches!(err, LinkError::NotAnInterface(not_iface) if not_iface == name("NotIface")));
    }

    #[test]
    fn interface_must_extend_the_root_class() {
        let classes = [
            (
                "B",
                simple_class("B", ACC_PUBLIC | ACC_SUPER, Some("java/lang/Object"), &[], &[]),
            ),
            (
                "J",
                simple_class("J", ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT, Some("B"), &[], &[]),
            ),
        ];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        let err = graph.load_class(&name("J")).unwrap_err();
        assert!(matches!(err, LinkError::InterfaceMustExtendObject(iface) if iface == name("J")));
    }

    #[test]
    fn superclass_may_not_be_an_interface() {
        let classes = [
            (
                "I",
                simple_class(
                    "I",
                    ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT,
                    Some("java/lang/Object"),
                    &[],
                    &[],
                ),
            ),
            ("A", simple_class("A", ACC_PUBLIC | ACC_SUPER, Some("I"), &[], &[])),
        ];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        let err = graph.load_class(&name("A")).unwrap_err();
        assert!(matches!(err, LinkError::IncompatibleClassChange(_)));
    }

    #[test]
    fn final_methods_cannot_be_overridden() {
        let classes = [
            (
                "B",
                simple_class(
                    "B",
                    ACC_PUBLIC | ACC_SUPER,
                    Some("java/lang/Object"),
                    &[],
                    &[("run", "()V", ACC_PUBLIC | ACC_FINAL)],
                ),
            ),
            (
                "A",
                simple_class(
                    "A",
                    ACC_PUBLIC | ACC_SUPER,
                    Some("B"),
                    &[],
                    &[("run", "()V", ACC_PUBLIC)],
                ),
            ),
        ];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        let err = graph.load_class(&name("A")).unwrap_err();
        assert!(matches!(err, LinkError::FinalMethodOverride { class, .. } if class == name("A")));
    }

    #[test]
    fn overriding_with_a_different_descriptor_is_an_overload() {
        let classes = [
            (
                "B",
                simple_class(
                    "B",
                    ACC_PUBLIC | ACC_SUPER,
                    Some("java/lang/Object"),
                    &[],
                    &[("run", "()V", ACC_PUBLIC | ACC_FINAL)],
                ),
            ),
            (
                "A",
                simple_class(
                    "A",
                    ACC_PUBLIC | ACC_SUPER,
                    Some("B"),
                    &[],
                    &[("run", "(I)V", ACC_PUBLIC)],
                ),
            ),
        ];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        assert!(graph.load_class(&name("A")).is_ok());
    }

    #[test]
    fn constructors_return_void() {
        let classes = [(
            "A",
            simple_class(
                "A",
                ACC_PUBLIC | ACC_SUPER,
                Some("java/lang/Object"),
                &[],
                &[("<init>", "()I", ACC_PUBLIC)],
            ),
        )];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        let err = graph.load_class(&name("A")).unwrap_err();
        assert!(matches!(err, LinkError::ConstructorMustReturnVoid(_)));
    }

    #[test]
    fn angle_bracket_method_names_are_illegal() {
        let classes = [(
            "A",
            simple_class(
                "A",
                ACC_PUBLIC | ACC_SUPER,
                Some("java/lang/Object"),
                &[],
                &[("<run>", "()V", ACC_PUBLIC)],
            ),
        )];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        let err = graph.load_class(&name("A")).unwrap_err();
        assert!(matches!(err, LinkError::IllegalMethodName(_)));
    }

    #[test]
    fn resolves_member_references() {
        let mut assembler = ClassAssembler::default();
        let field_ref = assembler.member_ref(tag::FIELDREF, "B", "x", "I");
        let method_ref = assembler.member_ref(tag::METHODREF, "B", "get", "()I");
        let a_bytes = class_bytes(
            &mut assembler,
            "A",
            ACC_PUBLIC | ACC_SUPER,
            Some("java/lang/Object"),
            &[],
            &[],
        );
        let classes = [
            (
                "B",
                simple_class("B", ACC_PUBLIC | ACC_SUPER, Some("java/lang/Object"), &[], &[]),
            ),
            ("A", a_bytes),
        ];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        let a = graph.load_class(&name("A")).unwrap();

        match a.resolved_constant(field_ref) {
            Some(ResolvedConstant::Field {
                class,
                name: member,
                descriptor,
            }) => {
                assert_eq!(class.name, name("B"));
                assert_eq!(member.as_str(), "x");
                assert_eq!(*descriptor, FieldType::INT);
            }
            other => panic!("unexpected resolution: {:?}", other),
        }
        match a.resolved_constant(method_ref) {
            Some(ResolvedConstant::Method { class, is_interface, .. }) => {
                assert_eq!(class.name, name("B"));
                assert!(!*is_interface);
            }
            other => panic!("unexpected resolution: {:?}", other),
        }
    }

    #[test]
    fn methodref_to_an_interface_is_rejected() {
        let mut assembler = ClassAssembler::default();
        assembler.member_ref(tag::METHODREF, "I", "run", "()V");
        let a_bytes = class_bytes(
            &mut assembler,
            "A",
            ACC_PUBLIC | ACC_SUPER,
            Some("java/lang/Object"),
            &[],
            &[],
        );
        let classes = [
            (
                "I",
                simple_class(
                    "I",
                    ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT,
                    Some("java/lang/Object"),
                    &[],
                    &[],
                ),
            ),
            ("A", a_bytes),
        ];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        let err = graph.load_class(&name("A")).unwrap_err();
        assert!(matches!(err, LinkError::IncompatibleClassChange(_)));
    }

    #[test]
    fn mutually_referencing_classes_link() {
        // A's pool references B and B's pool references A: legal, because
        // each class is cached before its references resolve
        let mut assembler_a = ClassAssembler::default();
        assembler_a.member_ref(tag::FIELDREF, "B", "b", "LB;");
        let a_bytes = class_bytes(
            &mut assembler_a,
            "A",
            ACC_PUBLIC | ACC_SUPER,
            Some("java/lang/Object"),
            &[],
            &[],
        );
        let mut assembler_b = ClassAssembler::default();
        assembler_b.member_ref(tag::FIELDREF, "A", "a", "LA;");
        let b_bytes = class_bytes(
            &mut assembler_b,
            "B",
            ACC_PUBLIC | ACC_SUPER,
            Some("java/lang/Object"),
            &[],
            &[],
        );
        let classes = [("A", a_bytes), ("B", b_bytes)];
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas, provider(&classes));
        let a = graph.load_class(&name("A")).unwrap();
        let b = graph.lookup_class(&name("B")).unwrap();
        assert!(std::ptr::eq(graph.load_class(&name("B")).unwrap(), b));
        assert_eq!(a.name, name("A"));
    }
}
