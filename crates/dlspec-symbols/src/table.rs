use std::collections::HashMap;
use std::fmt;

use lasso::{Rodeo, Spur};

use crate::descriptor::{
    descriptor_to_java_type, java_type_to_descriptor, parse_field_descriptor,
    parse_method_descriptor, BaseType, FieldType,
};
use crate::error::Result;

macro_rules! symbol_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn to_raw(self) -> u32 {
                self.0
            }

            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

symbol_id!(
    /// Handle to an interned type (primitive, `void`, array or class).
    TypeId
);
symbol_id!(
    /// Handle to an interned method reference.
    MethodId
);
symbol_id!(
    /// Handle to an interned field reference.
    FieldId
);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Void,
    Primitive(BaseType),
    Array { dimensions: usize },
    Class,
}

#[derive(Debug)]
struct TypeEntry {
    descriptor: Spur,
    kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MethodEntry {
    holder: TypeId,
    name: Spur,
    return_type: TypeId,
    parameters: Box<[TypeId]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FieldEntry {
    holder: TypeId,
    ty: TypeId,
    name: Spur,
}

/// Interning table for every symbol referenced by a specification.
///
/// Handles are only meaningful for the table that produced them.
#[derive(Default)]
pub struct SymbolTable {
    strings: Rodeo,
    types: Vec<TypeEntry>,
    type_ids: HashMap<Spur, TypeId>,
    methods: Vec<MethodEntry>,
    method_ids: HashMap<MethodEntry, MethodId>,
    fields: Vec<FieldEntry>,
    field_ids: HashMap<FieldEntry, FieldId>,
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolTable")
            .field("types", &self.types.len())
            .field("methods", &self.methods.len())
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a type from its JVM descriptor (`I`, `V`, `[I`, `Ljava/util/Map;`).
    pub fn intern_descriptor(&mut self, descriptor: &str) -> Result<TypeId> {
        if let Some(id) = self
            .strings
            .get(descriptor)
            .and_then(|spur| self.type_ids.get(&spur))
        {
            return Ok(*id);
        }

        let kind = if descriptor == "V" {
            TypeKind::Void
        } else {
            match parse_field_descriptor(descriptor)? {
                FieldType::Base(base) => TypeKind::Primitive(base),
                FieldType::Object(_) => TypeKind::Class,
                FieldType::Array(_) => TypeKind::Array {
                    dimensions: descriptor.bytes().take_while(|b| *b == b'[').count(),
                },
            }
        };

        let spur = self.strings.get_or_intern(descriptor);
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeEntry {
            descriptor: spur,
            kind,
        });
        self.type_ids.insert(spur, id);
        Ok(id)
    }

    /// Interns a type from its Java source name (`int`, `java.util.Map$Entry[]`).
    pub fn intern_java_type(&mut self, name: &str) -> Result<TypeId> {
        let descriptor = java_type_to_descriptor(name)?;
        self.intern_descriptor(&descriptor)
    }

    /// Looks up an already interned type without interning it.
    pub fn lookup_java_type(&self, name: &str) -> Option<TypeId> {
        let descriptor = java_type_to_descriptor(name).ok()?;
        let spur = self.strings.get(descriptor.as_str())?;
        self.type_ids.get(&spur).copied()
    }

    pub fn descriptor(&self, ty: TypeId) -> &str {
        self.strings.resolve(&self.types[ty.index()].descriptor)
    }

    pub fn kind(&self, ty: TypeId) -> TypeKind {
        self.types[ty.index()].kind
    }

    pub fn is_void(&self, ty: TypeId) -> bool {
        self.kind(ty) == TypeKind::Void
    }

    pub fn is_primitive(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Primitive(_))
    }

    pub fn is_array(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Array { .. })
    }

    pub fn is_class(&self, ty: TypeId) -> bool {
        self.kind(ty) == TypeKind::Class
    }

    pub fn array_dimensions(&self, ty: TypeId) -> usize {
        match self.kind(ty) {
            TypeKind::Array { dimensions } => dimensions,
            _ => 0,
        }
    }

    /// Descriptor of the innermost element type; the descriptor itself for
    /// non-array types.
    pub fn element_descriptor(&self, ty: TypeId) -> &str {
        self.descriptor(ty).trim_start_matches('[')
    }

    /// Java source name of the type, e.g. `java.util.Map$Entry[]`.
    pub fn java_name(&self, ty: TypeId) -> String {
        let descriptor = self.descriptor(ty);
        // Descriptors are validated on interning.
        descriptor_to_java_type(descriptor).unwrap_or_else(|_| descriptor.to_string())
    }

    /// Slash separated internal name of a class type.
    pub fn internal_name(&self, ty: TypeId) -> Option<&str> {
        if !self.is_class(ty) {
            return None;
        }
        let descriptor = self.descriptor(ty);
        descriptor.strip_prefix('L')?.strip_suffix(';')
    }

    /// Dotted package of a class type; empty for the default package.
    pub fn package_name(&self, ty: TypeId) -> Option<String> {
        let internal = self.internal_name(ty)?;
        Some(match internal.rfind('/') {
            Some(idx) => internal[..idx].replace('/', "."),
            None => String::new(),
        })
    }

    /// Class name without its package (inner classes keep their `$` suffixes).
    pub fn simple_name(&self, ty: TypeId) -> Option<&str> {
        let internal = self.internal_name(ty)?;
        Some(match internal.rfind('/') {
            Some(idx) => &internal[idx + 1..],
            None => internal,
        })
    }

    pub fn intern_method(
        &mut self,
        holder: TypeId,
        name: &str,
        return_type: TypeId,
        parameters: &[TypeId],
    ) -> MethodId {
        let entry = MethodEntry {
            holder,
            name: self.strings.get_or_intern(name),
            return_type,
            parameters: parameters.into(),
        };
        if let Some(id) = self.method_ids.get(&entry) {
            return *id;
        }
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(entry.clone());
        self.method_ids.insert(entry, id);
        id
    }

    /// Interns a method from a JVM method descriptor such as `(ILjava/lang/Object;)V`.
    pub fn intern_method_with_descriptor(
        &mut self,
        holder: TypeId,
        name: &str,
        descriptor: &str,
    ) -> Result<MethodId> {
        let parsed = parse_method_descriptor(descriptor)?;
        let return_type = self.intern_descriptor(&parsed.return_type.to_descriptor())?;
        let parameters = parsed
            .params
            .iter()
            .map(|param| self.intern_descriptor(&param.to_descriptor()))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.intern_method(holder, name, return_type, &parameters))
    }

    pub fn method_holder(&self, method: MethodId) -> TypeId {
        self.methods[method.index()].holder
    }

    pub fn method_name(&self, method: MethodId) -> &str {
        self.strings.resolve(&self.methods[method.index()].name)
    }

    pub fn method_return_type(&self, method: MethodId) -> TypeId {
        self.methods[method.index()].return_type
    }

    pub fn method_parameters(&self, method: MethodId) -> &[TypeId] {
        &self.methods[method.index()].parameters
    }

    pub fn method_parameter(&self, method: MethodId, index: usize) -> Option<TypeId> {
        self.method_parameters(method).get(index).copied()
    }

    /// The same name and signature moved onto another holder.
    pub fn method_with_holder(&mut self, method: MethodId, holder: TypeId) -> MethodId {
        let entry = self.methods[method.index()].clone();
        if entry.holder == holder {
            return method;
        }
        let name = self.strings.resolve(&entry.name).to_string();
        self.intern_method(holder, &name, entry.return_type, &entry.parameters)
    }

    /// JVM method descriptor, e.g. `(I)Ljava/lang/String;`.
    pub fn method_descriptor(&self, method: MethodId) -> String {
        let entry = &self.methods[method.index()];
        let mut out = String::from("(");
        for param in entry.parameters.iter() {
            out.push_str(self.descriptor(*param));
        }
        out.push(')');
        out.push_str(self.descriptor(entry.return_type));
        out
    }

    pub fn intern_field(&mut self, holder: TypeId, ty: TypeId, name: &str) -> FieldId {
        let entry = FieldEntry {
            holder,
            ty,
            name: self.strings.get_or_intern(name),
        };
        if let Some(id) = self.field_ids.get(&entry) {
            return *id;
        }
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(entry);
        self.field_ids.insert(entry, id);
        id
    }

    pub fn field_holder(&self, field: FieldId) -> TypeId {
        self.fields[field.index()].holder
    }

    pub fn field_type(&self, field: FieldId) -> TypeId {
        self.fields[field.index()].ty
    }

    pub fn field_name(&self, field: FieldId) -> &str {
        self.strings.resolve(&self.fields[field.index()].name)
    }

    /// Human readable `ret holder#name(p1, p2)` form using Java type names.
    pub fn display_method(&self, method: MethodId) -> String {
        let params = self
            .method_parameters(method)
            .iter()
            .map(|param| self.java_name(*param))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} {}#{}({})",
            self.java_name(self.method_return_type(method)),
            self.java_name(self.method_holder(method)),
            self.method_name(method),
            params
        )
    }

    /// Human readable `type holder#name` form using Java type names.
    pub fn display_field(&self, field: FieldId) -> String {
        format!(
            "{} {}#{}",
            self.java_name(self.field_type(field)),
            self.java_name(self.field_holder(field)),
            self.field_name(field)
        )
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}
