//! String forms of types, methods and fields.
//!
//! Methods are written `ret holder#name(p1, p2)` and fields `type holder#name`,
//! with every type in the compressed form of [`crate::package_map`]. Amended
//! members are prefixed with their modifier keywords.

use dlspec_symbols::{
    descriptor_to_java_type, FieldAccessFlags, FieldId, MethodAccessFlags, MethodId, SymbolTable,
    TypeId,
};

use crate::error::{Origin, Result, SpecificationError};
use crate::package_map::{PackageMap, TokenAllocator};

/// Turns encoded strings into interned symbols.
pub(crate) struct SymbolDecoder<'a> {
    pub(crate) table: &'a mut SymbolTable,
    packages: &'a PackageMap,
    origin: &'a Origin,
}

impl<'a> SymbolDecoder<'a> {
    pub(crate) fn new(table: &'a mut SymbolTable, packages: &'a PackageMap, origin: &'a Origin) -> Self {
        Self {
            table,
            packages,
            origin,
        }
    }

    pub(crate) fn origin(&self) -> &Origin {
        self.origin
    }

    fn malformed(&self, symbol: &str, reason: impl Into<String>) -> SpecificationError {
        SpecificationError::MalformedSymbol {
            origin: self.origin.clone(),
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn ty(&mut self, encoded: &str) -> Result<TypeId> {
        let name = self.packages.decode(encoded, self.origin)?;
        self.table
            .intern_java_type(&name)
            .map_err(|err| self.malformed(encoded, err.to_string()))
    }

    pub(crate) fn method(&mut self, encoded: &str) -> Result<MethodId> {
        let (return_type, rest) = encoded
            .split_once(' ')
            .ok_or_else(|| self.malformed(encoded, "expected `<return type> <holder>#<name>(...)`"))?;
        let (holder, rest) = rest
            .split_once('#')
            .ok_or_else(|| self.malformed(encoded, "missing `#` between holder and name"))?;
        let (name, parameters) = rest
            .split_once('(')
            .ok_or_else(|| self.malformed(encoded, "missing parameter list"))?;
        let parameters = parameters
            .strip_suffix(')')
            .ok_or_else(|| self.malformed(encoded, "unterminated parameter list"))?;
        if name.is_empty() {
            return Err(self.malformed(encoded, "empty method name"));
        }

        let holder = self.ty(holder)?;
        let return_type = self.ty(return_type)?;
        let parameters = if parameters.trim().is_empty() {
            Vec::new()
        } else {
            parameters
                .split(',')
                .map(|param| self.ty(param.trim()))
                .collect::<Result<Vec<_>>>()?
        };
        Ok(self.table.intern_method(holder, name, return_type, &parameters))
    }

    pub(crate) fn field(&mut self, encoded: &str) -> Result<FieldId> {
        let (ty, rest) = encoded
            .split_once(' ')
            .ok_or_else(|| self.malformed(encoded, "expected `<type> <holder>#<name>`"))?;
        let (holder, name) = rest
            .split_once('#')
            .ok_or_else(|| self.malformed(encoded, "missing `#` between holder and name"))?;
        if name.is_empty() || name.contains(' ') {
            return Err(self.malformed(encoded, "invalid field name"));
        }
        let holder = self.ty(holder)?;
        let ty = self.ty(ty)?;
        Ok(self.table.intern_field(holder, ty, name))
    }

    /// Splits `<modifiers> <type> <holder>#<rest>` into modifiers and member.
    fn split_modifiers<'s>(&self, encoded: &'s str) -> Result<(Vec<&'s str>, String)> {
        let hash = encoded
            .find('#')
            .ok_or_else(|| self.malformed(encoded, "missing `#` between holder and name"))?;
        let words: Vec<&str> = encoded[..hash].split_whitespace().collect();
        if words.len() < 2 {
            return Err(self.malformed(encoded, "expected `<modifiers> <member>`"));
        }
        let (modifiers, member) = words.split_at(words.len() - 2);
        Ok((
            modifiers.to_vec(),
            format!("{} {}{}", member[0], member[1], &encoded[hash..]),
        ))
    }

    pub(crate) fn amended_method(&mut self, encoded: &str) -> Result<(MethodId, MethodAccessFlags)> {
        let (modifiers, member) = self.split_modifiers(encoded)?;
        let flags = MethodAccessFlags::parse_keywords(modifiers)
            .map_err(|err| self.malformed(encoded, err.to_string()))?;
        Ok((self.method(&member)?, flags))
    }

    pub(crate) fn amended_field(&mut self, encoded: &str) -> Result<(FieldId, FieldAccessFlags)> {
        let (modifiers, member) = self.split_modifiers(encoded)?;
        let flags = FieldAccessFlags::parse_keywords(modifiers)
            .map_err(|err| self.malformed(encoded, err.to_string()))?;
        Ok((self.field(&member)?, flags))
    }
}

/// Renders interned symbols in compressed form.
///
/// Tokens are allocated on first use. The exporter registers every package up
/// front, in sorted order, so the assignment does not depend on traversal
/// order.
pub(crate) struct SymbolEncoder<'a> {
    table: &'a SymbolTable,
    tokens: TokenAllocator,
}

impl<'a> SymbolEncoder<'a> {
    pub(crate) fn new(table: &'a SymbolTable) -> Self {
        Self {
            table,
            tokens: TokenAllocator::new(),
        }
    }

    pub(crate) fn table(&self) -> &'a SymbolTable {
        self.table
    }

    pub(crate) fn register_package(&mut self, package: &str) -> Result<()> {
        self.tokens.token_for(package).map(|_| ())
    }

    pub(crate) fn into_package_map(self) -> PackageMap {
        self.tokens.into_package_map()
    }

    pub(crate) fn ty(&mut self, ty: TypeId) -> Result<String> {
        let element = self.table.element_descriptor(ty);
        let rendered = match class_internal_name(element) {
            Some(internal) => self.class(internal)?,
            None => descriptor_to_java_type(element)?,
        };
        Ok(rendered + &"[]".repeat(self.table.array_dimensions(ty)))
    }

    fn class(&mut self, internal: &str) -> Result<String> {
        let (package, simple) = split_internal_name(internal);
        let token = self.tokens.token_for(&package)?;
        Ok(format!("{token}{simple}"))
    }

    pub(crate) fn method(&mut self, method: MethodId) -> Result<String> {
        let table = self.table;
        let parameters = table
            .method_parameters(method)
            .iter()
            .map(|param| self.ty(*param))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        Ok(format!(
            "{} {}#{}({})",
            self.ty(table.method_return_type(method))?,
            self.ty(table.method_holder(method))?,
            table.method_name(method),
            parameters
        ))
    }

    pub(crate) fn field(&mut self, field: FieldId) -> Result<String> {
        let table = self.table;
        Ok(format!(
            "{} {}#{}",
            self.ty(table.field_type(field))?,
            self.ty(table.field_holder(field))?,
            table.field_name(field)
        ))
    }

    pub(crate) fn amended_method(&mut self, method: MethodId, flags: MethodAccessFlags) -> Result<String> {
        Ok(with_modifiers(flags.to_string(), self.method(method)?))
    }

    pub(crate) fn amended_field(&mut self, field: FieldId, flags: FieldAccessFlags) -> Result<String> {
        Ok(with_modifiers(flags.to_string(), self.field(field)?))
    }
}

fn with_modifiers(modifiers: String, member: String) -> String {
    if modifiers.is_empty() {
        member
    } else {
        format!("{modifiers} {member}")
    }
}

fn class_internal_name(descriptor: &str) -> Option<&str> {
    descriptor.strip_prefix('L')?.strip_suffix(';')
}

fn split_internal_name(internal: &str) -> (String, &str) {
    match internal.rfind('/') {
        Some(idx) => (internal[..idx].replace('/', "."), &internal[idx + 1..]),
        None => (String::new(), internal),
    }
}

/// Package of the class a type refers to, looking through arrays. `None` for
/// primitives and `void`.
pub(crate) fn referenced_package(table: &SymbolTable, ty: TypeId) -> Option<String> {
    class_internal_name(table.element_descriptor(ty)).map(|internal| split_internal_name(internal).0)
}
