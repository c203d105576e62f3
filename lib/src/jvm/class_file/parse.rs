//! Class file parsing
//!
//! Parsing is structural plus shape checks: pool indices embedded in the
//! class file (interface entries, member names and descriptors, attribute
//! names, catch types) must point at a constant of the right variant, but
//! symbolic resolution across classes is the linker's job.
//!
//! See [this section of the JVM spec][0] for more information.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html

use crate::jvm::class_file::attribute::{Attribute, Code, ExceptionHandler};
use crate::jvm::class_file::constants::{tag, Constant, ConstantPool};
use crate::jvm::class_file::{ClassFile, Field, Method};
use crate::jvm::code::decode_code;
use crate::jvm::errors::{ParseError, ParseErrorKind};
use crate::jvm::mutf8::{self, Mutf8Error};
use crate::jvm::reader::ClassReader;
use crate::jvm::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};
use byteorder::{BigEndian, ByteOrder};

const MAGIC: u32 = 0xCAFE_BABE;

/// Parse a complete class file from its bytes
pub fn parse_class_file(bytes: &[u8]) -> Result<ClassFile, ParseError> {
    let mut reader = ClassReader::new(bytes);

    let magic = reader.read_u4()?;
    if magic != MAGIC {
        return Err(ParseError::at(0, ParseErrorKind::BadMagic(magic)));
    }
    let minor_version = reader.read_u2()?;
    let major_version = reader.read_u2()?;

    let constant_pool = parse_constant_pool(&mut reader)?;

    let access_flags = ClassAccessFlags::from_u16(reader.read_u2()?);
    let this_class = reader.read_u2()?;
    let super_class = reader.read_u2()?;

    let interfaces_count = reader.read_u2()?;
    let mut interfaces = Vec::with_capacity(interfaces_count as usize);
    for _ in 0..interfaces_count {
        interfaces.push(read_class_index(&mut reader, &constant_pool)?);
    }

    let fields_count = reader.read_u2()?;
    let mut fields = Vec::with_capacity(fields_count as usize);
    for _ in 0..fields_count {
        fields.push(Field {
            access_flags: FieldAccessFlags::from_u16(reader.read_u2()?),
            name_index: read_utf8_index(&mut reader, &constant_pool)?,
            descriptor_index: read_utf8_index(&mut reader, &constant_pool)?,
            attributes: parse_attributes(&mut reader, &constant_pool)?,
        });
    }

    let methods_count = reader.read_u2()?;
    let mut methods = Vec::with_capacity(methods_count as usize);
    for _ in 0..methods_count {
        methods.push(Method {
            access_flags: MethodAccessFlags::from_u16(reader.read_u2()?),
            name_index: read_utf8_index(&mut reader, &constant_pool)?,
            descriptor_index: read_utf8_index(&mut reader, &constant_pool)?,
            attributes: parse_attributes(&mut reader, &constant_pool)?,
        });
    }

    let attributes = parse_attributes(&mut reader, &constant_pool)?;

    log::debug!(
        "Parsed class file: version {}.{}, {} constants, {} fields, {} methods",
        major_version,
        minor_version,
        constant_pool.count(),
        fields.len(),
        methods.len(),
    );

    Ok(ClassFile {
        minor_version,
        major_version,
        constant_pool,
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attributes,
    })
}

fn parse_constant_pool(reader: &mut ClassReader) -> Result<ConstantPool, ParseError> {
    let count = reader.read_u2()?;
    let mut pool = ConstantPool::with_count(count);

    // Long and Double advance the index by two, so this is not a plain loop
    // over `count` entries
    while pool.count() < count {
        let tag_offset = reader.offset();
        let tag = reader.read_u1()?;
        let constant = match tag {
            tag::UTF8 => {
                let length = reader.read_u2()?;
                let bytes_offset = reader.offset();
                let bytes = reader.take(length as usize)?;
                let decoded = mutf8::decode(bytes).map_err(|err| match err {
                    Mutf8Error::InvalidByte { offset, byte } => ParseError::at(
                        bytes_offset + offset,
                        ParseErrorKind::InvalidEncoding { byte },
                    ),
                    Mutf8Error::Truncated { offset } => {
                        ParseError::at(bytes_offset + offset, ParseErrorKind::TruncatedInput)
                    }
                })?;
                Constant::Utf8(decoded)
            }
            tag::INTEGER => Constant::Integer(reader.read_i4()?),
            tag::FLOAT => Constant::Float(f32::from_bits(reader.read_u4()?)),
            tag::LONG => {
                let high = reader.read_u4()? as u64;
                let low = reader.read_u4()? as u64;
                Constant::Long(((high << 32) | low) as i64)
            }
            tag::DOUBLE => {
                let high = reader.read_u4()? as u64;
                let low = reader.read_u4()? as u64;
                Constant::Double(f64::from_bits((high << 32) | low))
            }
            tag::CLASS => Constant::Class {
                name_index: reader.read_u2()?,
            },
            tag::STRING => Constant::String {
                string_index: reader.read_u2()?,
            },
            tag::FIELDREF => Constant::FieldRef {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            tag::METHODREF => Constant::MethodRef {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            tag::INTERFACE_METHODREF => Constant::InterfaceMethodRef {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            tag::NAME_AND_TYPE => Constant::NameAndType {
                name_index: reader.read_u2()?,
                descriptor_index: reader.read_u2()?,
            },
            other => {
                return Err(ParseError::at(
                    tag_offset,
                    ParseErrorKind::UnknownConstantTag(other),
                ))
            }
        };
        pool.push(constant);
    }

    Ok(pool)
}

/// Read a pool index which must name a `Class` constant
fn read_class_index(reader: &mut ClassReader, pool: &ConstantPool) -> Result<u16, ParseError> {
    let offset = reader.offset();
    let index = reader.read_u2()?;
    if !matches!(pool.get(index), Some(Constant::Class { .. })) {
        return Err(ParseError::at(
            offset,
            ParseErrorKind::ExpectedClassConstant { index },
        ));
    }
    Ok(index)
}

/// Read a pool index which must name a `Utf8` constant
fn read_utf8_index(reader: &mut ClassReader, pool: &ConstantPool) -> Result<u16, ParseError> {
    let offset = reader.offset();
    let index = reader.read_u2()?;
    if pool.utf8(index).is_none() {
        return Err(ParseError::at(
            offset,
            ParseErrorKind::ExpectedUtf8Constant { index },
        ));
    }
    Ok(index)
}

fn parse_attributes(
    reader: &mut ClassReader,
    pool: &ConstantPool,
) -> Result<Vec<Attribute>, ParseError> {
    let count = reader.read_u2()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        attributes.push(parse_attribute(reader, pool)?);
    }
    Ok(attributes)
}

fn parse_attribute(reader: &mut ClassReader, pool: &ConstantPool) -> Result<Attribute, ParseError> {
    let name_offset = reader.offset();
    let name_index = reader.read_u2()?;
    let name = pool.utf8(name_index).ok_or_else(|| {
        ParseError::at(
            name_offset,
            ParseErrorKind::ExpectedUtf8Constant { index: name_index },
        )
    })?;

    let length_offset = reader.offset();
    let length = reader.read_u4()?;
    let info_offset = reader.offset();
    let info = reader.take(length as usize)?;

    let attribute = match name {
        "ConstantValue" => {
            if length != 2 {
                return Err(ParseError::at(
                    length_offset,
                    ParseErrorKind::InvalidAttributeLength {
                        attribute: "ConstantValue",
                        length,
                    },
                ));
            }
            let constant_value_index = BigEndian::read_u16(info);
            match pool.get(constant_value_index) {
                Some(
                    Constant::Integer(_)
                    | Constant::Float(_)
                    | Constant::Long(_)
                    | Constant::Double(_)
                    | Constant::String { .. },
                ) => (),
                _ => {
                    return Err(ParseError::at(
                        info_offset,
                        ParseErrorKind::InvalidConstantValueType {
                            index: constant_value_index,
                        },
                    ))
                }
            }
            Attribute::ConstantValue {
                constant_value_index,
            }
        }

        "Code" => {
            let code = parse_code(info, pool).map_err(|err| err.rebase(info_offset))?;
            Attribute::Code(code)
        }

        "Exceptions" => {
            let mut info_reader = ClassReader::new(info);
            let result = (|| -> Result<Vec<u16>, ParseError> {
                let number_of_exceptions = info_reader.read_u2()?;
                let mut table = Vec::with_capacity(number_of_exceptions as usize);
                for _ in 0..number_of_exceptions {
                    table.push(read_class_index(&mut info_reader, pool)?);
                }
                Ok(table)
            })();
            let exception_index_table = result.map_err(|err| err.rebase(info_offset))?;
            if !info_reader.is_done() {
                return Err(ParseError::at(
                    length_offset,
                    ParseErrorKind::InvalidAttributeLength {
                        attribute: "Exceptions",
                        length,
                    },
                ));
            }
            Attribute::Exceptions {
                exception_index_table,
            }
        }

        // Attributes the VM core does not interpret are kept but not decoded
        other => Attribute::Other {
            name: String::from(other),
            info: info.to_vec(),
        },
    };

    Ok(attribute)
}

/// Parse the body of a `Code` attribute (offsets relative to the body)
fn parse_code(info: &[u8], pool: &ConstantPool) -> Result<Code, ParseError> {
    let mut reader = ClassReader::new(info);

    let max_stack = reader.read_u2()?;
    let max_locals = reader.read_u2()?;

    let code_length_offset = reader.offset();
    let code_length = reader.read_u4()?;
    if code_length == 0 {
        return Err(ParseError::at(code_length_offset, ParseErrorKind::EmptyCode));
    }
    let code_offset = reader.offset();
    let code = reader.take(code_length as usize)?;
    let instructions = decode_code(code).map_err(|err| err.rebase(code_offset))?;

    let exception_table_length = reader.read_u2()?;
    let mut exception_table = Vec::with_capacity(exception_table_length as usize);
    for _ in 0..exception_table_length {
        let start_pc = reader.read_u2()?;
        let end_pc = reader.read_u2()?;
        let handler_pc = reader.read_u2()?;

        // A zero catch type means "catch everything"
        let catch_type_offset = reader.offset();
        let catch_type = reader.read_u2()?;
        if catch_type != 0 && !matches!(pool.get(catch_type), Some(Constant::Class { .. })) {
            return Err(ParseError::at(
                catch_type_offset,
                ParseErrorKind::ExpectedClassConstant { index: catch_type },
            ));
        }

        exception_table.push(ExceptionHandler {
            start_pc,
            end_pc,
            handler_pc,
            catch_type,
        });
    }

    let attributes = parse_attributes(&mut reader, pool)?;

    if !reader.is_done() {
        return Err(ParseError::at(
            reader.offset(),
            ParseErrorKind::CodeLengthMismatch,
        ));
    }

    Ok(Code {
        max_stack,
        max_locals,
        code_length,
        instructions,
        exception_table,
        attributes,
    })
}
