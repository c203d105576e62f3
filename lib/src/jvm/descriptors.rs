use crate::jvm::names::{BinaryName, Name};
use std::iter::Peekable;
use std::str::Chars;

/// Utility trait for turning descriptors back into their string form
pub trait RenderDescriptor {
    fn render(&self) -> String {
        let mut string = String::new();
        self.render_to(&mut string);
        string
    }

    fn render_to(&self, write_to: &mut String);
}

/// A descriptor parse failure, carrying a human-readable reason
///
/// The linker wraps this into [`LinkError::BadDescriptor`](crate::jvm::LinkError).
#[derive(Debug, PartialEq, Eq)]
pub struct DescriptorError(pub String);

pub trait ParseDescriptor: Sized {
    /// Parse a descriptor from a string, requiring all input to be consumed
    fn parse(source: &str) -> Result<Self, DescriptorError> {
        let mut chars = source.chars().peekable();
        let ret = Self::parse_from(&mut chars)?;
        match chars.next() {
            None => Ok(ret),
            Some(c) => Err(DescriptorError(format!(
                "Unexpected leftover input '{}' in '{}'",
                c, source
            ))),
        }
    }

    /// Read the descriptor from a character buffer
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, DescriptorError>;
}

/// Primitive value types
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl RenderDescriptor for BaseType {
    fn render_to(&self, write_to: &mut String) {
        let c = match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        };
        write_to.push(c);
    }
}

impl ParseDescriptor for BaseType {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, DescriptorError> {
        let typ = match source.next() {
            Some('B') => BaseType::Byte,
            Some('C') => BaseType::Char,
            Some('D') => BaseType::Double,
            Some('F') => BaseType::Float,
            Some('I') => BaseType::Int,
            Some('J') => BaseType::Long,
            Some('S') => BaseType::Short,
            Some('Z') => BaseType::Boolean,
            Some(c) => {
                return Err(DescriptorError(format!(
                    "Invalid base type character '{}'",
                    c
                )))
            }
            None => return Err(DescriptorError(String::from("Missing base type character"))),
        };
        Ok(typ)
    }
}

/// Type of a field, parameter, or array element
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum FieldType {
    Base(BaseType),
    Object(BinaryName),
    Array(Box<FieldType>),
}

impl FieldType {
    pub const INT: FieldType = FieldType::Base(BaseType::Int);

    pub fn array(element: FieldType) -> FieldType {
        FieldType::Array(Box::new(element))
    }

    pub fn object(name: BinaryName) -> FieldType {
        FieldType::Object(name)
    }
}

impl RenderDescriptor for FieldType {
    fn render_to(&self, write_to: &mut String) {
        match self {
            FieldType::Base(base) => base.render_to(write_to),
            FieldType::Object(name) => {
                write_to.push('L');
                write_to.push_str(name.as_str());
                write_to.push(';');
            }
            FieldType::Array(element) => {
                write_to.push('[');
                element.render_to(write_to);
            }
        }
    }
}

impl ParseDescriptor for FieldType {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, DescriptorError> {
        match source.peek().copied() {
            Some('L') => {
                source.next();
                let mut class_name = String::new();
                loop {
                    match source.next() {
                        None => {
                            return Err(DescriptorError(format!(
                                "Missing ';' terminator for 'L{}'",
                                class_name
                            )))
                        }
                        Some(';') => {
                            let name = BinaryName::from_string(class_name)
                                .map_err(DescriptorError)?;
                            return Ok(FieldType::Object(name));
                        }
                        Some(c) => class_name.push(c),
                    }
                }
            }
            Some('[') => {
                source.next();
                Ok(FieldType::array(FieldType::parse_from(source)?))
            }
            Some(_) => BaseType::parse_from(source).map(FieldType::Base),
            None => Err(DescriptorError(String::from("Missing field type"))),
        }
    }
}

/// Signature of a method
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,

    /// `None` is for `void` (ie. no return)
    pub return_type: Option<FieldType>,
}

impl RenderDescriptor for MethodDescriptor {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('(');
        for parameter in &self.parameters {
            parameter.render_to(write_to);
        }
        write_to.push(')');
        match &self.return_type {
            None => write_to.push('V'),
            Some(typ) => typ.render_to(write_to),
        };
    }
}

impl ParseDescriptor for MethodDescriptor {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, DescriptorError> {
        if source.next() != Some('(') {
            return Err(DescriptorError(String::from("Expected '(' for method")));
        }

        let mut parameters = vec![];
        while source.peek().copied() != Some(')') {
            if source.peek().is_none() {
                return Err(DescriptorError(String::from("Expected ')' for method")));
            }
            parameters.push(FieldType::parse_from(source)?);
        }
        source.next();

        let return_type = if source.peek().copied() == Some('V') {
            let _ = source.next();
            None
        } else {
            Some(FieldType::parse_from(source)?)
        };

        Ok(MethodDescriptor {
            parameters,
            return_type,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fmt::Debug;

    fn round_trip<T: RenderDescriptor + ParseDescriptor + Debug + Eq>(rendered: &str, parsed: T) {
        assert_eq!(rendered, parsed.render());
        assert_eq!(T::parse(rendered).unwrap(), parsed);
    }

    fn object(name: &str) -> FieldType {
        FieldType::object(BinaryName::from_string(String::from(name)).unwrap())
    }

    #[test]
    fn base_types() {
        round_trip("B", BaseType::Byte);
        round_trip("C", BaseType::Char);
        round_trip("D", BaseType::Double);
        round_trip("F", BaseType::Float);
        round_trip("I", BaseType::Int);
        round_trip("J", BaseType::Long);
        round_trip("S", BaseType::Short);
        round_trip("Z", BaseType::Boolean);
    }

    #[test]
    fn field_types() {
        round_trip("I", FieldType::INT);
        round_trip("Ljava/lang/Object;", object("java/lang/Object"));
        round_trip(
            "[[[D",
            FieldType::array(FieldType::array(FieldType::array(FieldType::Base(
                BaseType::Double,
            )))),
        );
        round_trip(
            "[Ljava/lang/String;",
            FieldType::array(object("java/lang/String")),
        );
    }

    #[test]
    fn method_descriptors() {
        round_trip(
            "(IDLjava/lang/Integer;)Ljava/lang/Object;",
            MethodDescriptor {
                parameters: vec![
                    FieldType::INT,
                    FieldType::Base(BaseType::Double),
                    object("java/lang/Integer"),
                ],
                return_type: Some(object("java/lang/Object")),
            },
        );
        round_trip(
            "()V",
            MethodDescriptor {
                parameters: vec![],
                return_type: None,
            },
        );
    }

    #[test]
    fn malformed_descriptors() {
        assert!(FieldType::parse("").is_err());
        assert!(FieldType::parse("Q").is_err());
        assert!(FieldType::parse("Ljava/lang/Object").is_err());
        assert!(FieldType::parse("II").is_err());
        assert!(MethodDescriptor::parse("(I").is_err());
        assert!(MethodDescriptor::parse("I)V").is_err());
    }
}
