use mochavm::jvm;
use mochavm::jvm::class_file::{ClassFile, Code, Constant, ConstantPool};
use mochavm::jvm::class_graph::{ClassGraph, ClassGraphArenas, DirectoryClassProvider};
use mochavm::jvm::{
    BinaryName, ClassAccessFlags, FieldAccessFlags, MethodAccessFlags, Name,
};

use clap::{Arg, ArgAction, Command};
use std::fs;
use std::path::PathBuf;

fn main() -> Result<(), jvm::Error> {
    env_logger::init();

    let matches = Command::new("mochavm-javap")
        .version("0.1.0")
        .about("Inspect compiled class files using the mochavm core")
        .arg(
            Arg::new("constants")
                .long("constants")
                .short('c')
                .action(ArgAction::SetTrue)
                .help("Print the constant pool"),
        )
        .arg(
            Arg::new("code")
                .long("code")
                .action(ArgAction::SetTrue)
                .help("Disassemble method bytecode"),
        )
        .arg(
            Arg::new("link")
                .long("link")
                .value_name("CLASS_DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Also link each class, resolving references against this directory"),
        )
        .arg(
            Arg::new("INPUT")
                .help("Class files to inspect")
                .required(true)
                .num_args(1..),
        )
        .get_matches();

    let show_constants = matches.get_flag("constants");
    let show_code = matches.get_flag("code");
    let link_root = matches.get_one::<PathBuf>("link").cloned();

    for input in matches.get_many::<String>("INPUT").into_iter().flatten() {
        log::info!("Reading '{}'", input);
        let bytes = fs::read(input).map_err(jvm::Error::IoError)?;
        let class = jvm::class_file::parse_class_file(&bytes)?;

        print_class(&class, show_constants, show_code);

        if let Some(root) = &link_root {
            link_class(&class, root.clone());
        }
    }

    Ok(())
}

fn link_class(class: &ClassFile, root: PathBuf) {
    let declared = match class.this_class_name() {
        Some(name) => name,
        None => {
            eprintln!("Cannot link: this_class does not name a class");
            return;
        }
    };
    let name = match BinaryName::from_string(String::from(declared)) {
        Ok(name) => name,
        Err(err) => {
            eprintln!("Cannot link: {}", err);
            return;
        }
    };

    let arenas = ClassGraphArenas::new();
    let graph = ClassGraph::new(&arenas, Box::new(DirectoryClassProvider::new(root)));
    match graph.load_class(&name) {
        Ok(linked) => println!("Linked {} successfully", linked.name),
        Err(err) => eprintln!("Linking {} failed: {:?}", name, err),
    }
}

fn print_class(class: &ClassFile, show_constants: bool, show_code: bool) {
    let kind = if class.access_flags.is_interface() {
        "interface"
    } else {
        "class"
    };
    println!(
        "{} {}",
        kind,
        class.this_class_name().unwrap_or("<unresolved>")
    );
    println!("  minor version: {}", class.minor_version);
    println!("  major version: {}", class.major_version);
    println!("  flags: {}", class_flags(class.access_flags));
    println!(
        "  this_class: #{}  // {}",
        class.this_class,
        class.this_class_name().unwrap_or("<unresolved>")
    );
    if class.super_class != 0 {
        println!(
            "  super_class: #{}  // {}",
            class.super_class,
            class.super_class_name().unwrap_or("<unresolved>")
        );
    }
    for &interface in &class.interfaces {
        println!(
            "  interface: #{}  // {}",
            interface,
            class.constant_pool.class_name(interface).unwrap_or("<unresolved>")
        );
    }

    if show_constants {
        println!("Constant pool:");
        for (index, constant) in class.constant_pool.iter() {
            println!(
                "  #{:<4}= {:<19}{}",
                index,
                constant.type_name(),
                constant_operands(constant, &class.constant_pool)
            );
        }
    }

    println!("{{");
    for field in &class.fields {
        println!(
            "  {}{};",
            field_flags(field.access_flags),
            field.name(&class.constant_pool).unwrap_or("<unresolved>")
        );
        println!(
            "    descriptor: {}",
            field.descriptor(&class.constant_pool).unwrap_or("<unresolved>")
        );
        println!();
    }
    for method in &class.methods {
        println!(
            "  {}{}();",
            method_flags(method.access_flags),
            method.name(&class.constant_pool).unwrap_or("<unresolved>")
        );
        println!(
            "    descriptor: {}",
            method.descriptor(&class.constant_pool).unwrap_or("<unresolved>")
        );
        if show_code {
            if let Some(code) = method.code() {
                print_code(code);
            }
        }
        println!();
    }
    println!("}}");
}

fn print_code(code: &Code) {
    println!("    Code:");
    println!(
        "      stack={}, locals={}",
        code.max_stack, code.max_locals
    );
    for (offset, instruction) in &code.instructions {
        println!("      {:4}: {}", offset, instruction);
    }
    for handler in &code.exception_table {
        println!(
            "      handler: [{}, {}) -> {} (catch_type #{})",
            handler.start_pc, handler.end_pc, handler.handler_pc, handler.catch_type
        );
    }
    for attribute in &code.attributes {
        println!("      attribute: {}", attribute.name());
    }
}

fn constant_operands(constant: &Constant, pool: &ConstantPool) -> String {
    match constant {
        Constant::Utf8(string) => string.clone(),
        Constant::Integer(value) => value.to_string(),
        Constant::Float(value) => format!("{}f", value),
        Constant::Long(value) => format!("{}l", value),
        Constant::Double(value) => format!("{}d", value),
        Constant::Class { name_index } => format!(
            "#{}  // {}",
            name_index,
            pool.utf8(*name_index).unwrap_or("<unresolved>")
        ),
        Constant::String { string_index } => format!(
            "#{}  // {}",
            string_index,
            pool.utf8(*string_index).unwrap_or("<unresolved>")
        ),
        Constant::FieldRef {
            class_index,
            name_and_type_index,
        }
        | Constant::MethodRef {
            class_index,
            name_and_type_index,
        }
        | Constant::InterfaceMethodRef {
            class_index,
            name_and_type_index,
        } => {
            let class = pool.class_name(*class_index).unwrap_or("<unresolved>");
            let member = match pool.name_and_type(*name_and_type_index) {
                Some((name, descriptor)) => format!("{}:{}", name, descriptor),
                None => String::from("<unresolved>"),
            };
            format!(
                "#{}.#{}  // {}.{}",
                class_index, name_and_type_index, class, member
            )
        }
        Constant::NameAndType {
            name_index,
            descriptor_index,
        } => format!(
            "#{}:#{}  // {}:{}",
            name_index,
            descriptor_index,
            pool.utf8(*name_index).unwrap_or("<unresolved>"),
            pool.utf8(*descriptor_index).unwrap_or("<unresolved>")
        ),
    }
}

fn class_flags(flags: ClassAccessFlags) -> String {
    let names = [
        (ClassAccessFlags::PUBLIC, "ACC_PUBLIC"),
        (ClassAccessFlags::FINAL, "ACC_FINAL"),
        (ClassAccessFlags::SUPER, "ACC_SUPER"),
        (ClassAccessFlags::INTERFACE, "ACC_INTERFACE"),
        (ClassAccessFlags::ABSTRACT, "ACC_ABSTRACT"),
        (ClassAccessFlags::SYNTHETIC, "ACC_SYNTHETIC"),
        (ClassAccessFlags::ANNOTATION, "ACC_ANNOTATION"),
        (ClassAccessFlags::ENUM, "ACC_ENUM"),
    ];
    join_flags(names.iter().filter(|(flag, _)| flags.contains(*flag)))
}

fn field_flags(flags: FieldAccessFlags) -> String {
    let names = [
        (FieldAccessFlags::PUBLIC, "public "),
        (FieldAccessFlags::PRIVATE, "private "),
        (FieldAccessFlags::PROTECTED, "protected "),
        (FieldAccessFlags::STATIC, "static "),
        (FieldAccessFlags::FINAL, "final "),
        (FieldAccessFlags::VOLATILE, "volatile "),
        (FieldAccessFlags::TRANSIENT, "transient "),
    ];
    names
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, name)| *name)
        .collect()
}

fn method_flags(flags: MethodAccessFlags) -> String {
    let names = [
        (MethodAccessFlags::PUBLIC, "public "),
        (MethodAccessFlags::PRIVATE, "private "),
        (MethodAccessFlags::PROTECTED, "protected "),
        (MethodAccessFlags::STATIC, "static "),
        (MethodAccessFlags::FINAL, "final "),
        (MethodAccessFlags::SYNCHRONIZED, "synchronized "),
        (MethodAccessFlags::NATIVE, "native "),
        (MethodAccessFlags::ABSTRACT, "abstract "),
    ];
    names
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, name)| *name)
        .collect()
}

fn join_flags<'a>(flags: impl Iterator<Item = &'a (ClassAccessFlags, &'a str)>) -> String {
    flags
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}
