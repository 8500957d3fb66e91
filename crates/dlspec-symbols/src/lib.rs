//! Interned symbols (types, methods, fields) shared by the desugared library
//! specification engine.
//!
//! Every symbol is handed out as a small `Copy` handle by a [`SymbolTable`].
//! Interning is idempotent, so two handles are equal exactly when they denote
//! the same entity and can be used directly as map keys.

#![forbid(unsafe_code)]

mod access;
mod descriptor;
mod error;
mod table;

pub use crate::access::{FieldAccessFlags, MethodAccessFlags};
pub use crate::descriptor::{descriptor_to_java_type, java_type_to_descriptor};
pub use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
pub use crate::descriptor::{BaseType, FieldType, MethodDescriptor, ReturnType};
pub use crate::error::{Error, Result};
pub use crate::table::{FieldId, MethodId, SymbolTable, TypeId, TypeKind};
