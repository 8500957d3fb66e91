use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
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

impl BaseType {
    const ALL: [BaseType; 8] = [
        BaseType::Byte,
        BaseType::Char,
        BaseType::Double,
        BaseType::Float,
        BaseType::Int,
        BaseType::Long,
        BaseType::Short,
        BaseType::Boolean,
    ];

    pub fn descriptor_char(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }

    /// The Java source keyword (`int`, `boolean`, ...).
    pub fn keyword(self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|base| base.keyword() == keyword)
    }

    fn from_descriptor_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|base| base.descriptor_char() == c)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Base(BaseType),
    /// Internal (slash separated) class name.
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    pub fn to_descriptor(&self) -> String {
        match self {
            FieldType::Base(base) => base.descriptor_char().to_string(),
            FieldType::Object(name) => format!("L{name};"),
            FieldType::Array(component) => format!("[{}", component.to_descriptor()),
        }
    }

    pub fn java_name(&self) -> String {
        match self {
            FieldType::Base(base) => base.keyword().to_string(),
            FieldType::Object(name) => name.replace('/', "."),
            FieldType::Array(component) => format!("{}[]", component.java_name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Void,
    Type(FieldType),
}

impl ReturnType {
    pub fn to_descriptor(&self) -> String {
        match self {
            ReturnType::Void => "V".to_string(),
            ReturnType::Type(ty) => ty.to_descriptor(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    pub return_type: ReturnType,
}

pub fn parse_field_descriptor(desc: &str) -> Result<FieldType> {
    let (ty, rest) = parse_field_type(desc)?;
    if !rest.is_empty() {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }
    Ok(ty)
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    let Some(mut remaining) = desc.strip_prefix('(') else {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    };

    let mut params = Vec::new();
    loop {
        if let Some(rest) = remaining.strip_prefix(')') {
            remaining = rest;
            break;
        }
        if remaining.is_empty() {
            return Err(Error::InvalidDescriptor(desc.to_string()));
        }
        let (param, rest) = parse_field_type(remaining)?;
        params.push(param);
        remaining = rest;
    }

    if remaining.is_empty() {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }

    let (return_type, rest) = if let Some(rest) = remaining.strip_prefix('V') {
        (ReturnType::Void, rest)
    } else {
        let (ty, rest) = parse_field_type(remaining)?;
        (ReturnType::Type(ty), rest)
    };

    if !rest.is_empty() {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }

    Ok(MethodDescriptor { params, return_type })
}

fn parse_field_type(input: &str) -> Result<(FieldType, &str)> {
    let Some(first) = input.chars().next() else {
        return Err(Error::InvalidDescriptor(input.to_string()));
    };
    if let Some(base) = BaseType::from_descriptor_char(first) {
        return Ok((FieldType::Base(base), &input[1..]));
    }
    match first {
        'L' => match input.find(';') {
            Some(end) if end > 1 => {
                let name = &input[1..end];
                Ok((FieldType::Object(name.to_string()), &input[end + 1..]))
            }
            _ => Err(Error::InvalidDescriptor(input.to_string())),
        },
        '[' => {
            let (component, rest) = parse_field_type(&input[1..])?;
            Ok((FieldType::Array(Box::new(component)), rest))
        }
        _ => Err(Error::InvalidDescriptor(input.to_string())),
    }
}

/// Converts a Java source type name (`int`, `void`, `java.util.Map$Entry[]`)
/// into a JVM descriptor.
pub fn java_type_to_descriptor(name: &str) -> Result<String> {
    let invalid = || Error::InvalidTypeName(name.to_string());

    let mut base = name;
    let mut dimensions = 0usize;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped;
        dimensions += 1;
    }

    let mut out = "[".repeat(dimensions);
    if base == "void" {
        if dimensions > 0 {
            return Err(invalid());
        }
        out.push('V');
    } else if let Some(base_type) = BaseType::from_keyword(base) {
        out.push(base_type.descriptor_char());
    } else if is_valid_class_name(base) {
        out.push('L');
        out.push_str(&base.replace('.', "/"));
        out.push(';');
    } else {
        return Err(invalid());
    }
    Ok(out)
}

/// Inverse of [`java_type_to_descriptor`].
pub fn descriptor_to_java_type(desc: &str) -> Result<String> {
    if desc == "V" {
        return Ok("void".to_string());
    }
    parse_field_descriptor(desc).map(|ty| ty.java_name())
}

fn is_valid_class_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with('.')
        && !name.contains("..")
        && !name.chars().any(|c| {
            c.is_whitespace() || matches!(c, '/' | ';' | '[' | ']' | '(' | ')' | '#' | ',')
        })
}
