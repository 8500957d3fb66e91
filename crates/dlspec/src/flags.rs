use std::hash::Hash;

use dlspec_symbols::{FieldAccessFlags, FieldId, MethodAccessFlags, MethodId, SymbolTable, TypeId};
use indexmap::{IndexMap, IndexSet};

use crate::descriptors::{
    CustomConversionDescriptor, EmulatedDispatchMethodDescriptor,
    EmulatedInterfaceDescriptor, WrapperDescriptor,
};
use crate::error::{Result, SpecificationError};
use crate::keys;
use crate::ordered_map::OrderedMap;

/// The rule categories of a rule set, in document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleCategory {
    RewriteType,
    MaintainType,
    RewriteDerivedTypeOnly,
    StaticFieldRetarget,
    CovariantRetarget,
    StaticRetarget,
    NonEmulatedVirtualRetarget,
    EmulatedVirtualRetarget,
    EmulatedVirtualRetargetThroughEmulatedInterface,
    ApiGenericTypesConversion,
    EmulatedInterface,
    Wrapper,
    LegacyBackport,
    DontRetarget,
    CustomConversion,
    AmendLibraryMethod,
    AmendLibraryField,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 17] = [
        RuleCategory::RewriteType,
        RuleCategory::MaintainType,
        RuleCategory::RewriteDerivedTypeOnly,
        RuleCategory::StaticFieldRetarget,
        RuleCategory::CovariantRetarget,
        RuleCategory::StaticRetarget,
        RuleCategory::NonEmulatedVirtualRetarget,
        RuleCategory::EmulatedVirtualRetarget,
        RuleCategory::EmulatedVirtualRetargetThroughEmulatedInterface,
        RuleCategory::ApiGenericTypesConversion,
        RuleCategory::EmulatedInterface,
        RuleCategory::Wrapper,
        RuleCategory::LegacyBackport,
        RuleCategory::DontRetarget,
        RuleCategory::CustomConversion,
        RuleCategory::AmendLibraryMethod,
        RuleCategory::AmendLibraryField,
    ];

    /// The JSON key of the category inside a rule set.
    pub const fn key(self) -> &'static str {
        match self {
            RuleCategory::RewriteType => keys::REWRITE_TYPE,
            RuleCategory::MaintainType => keys::MAINTAIN_TYPE,
            RuleCategory::RewriteDerivedTypeOnly => keys::REWRITE_DERIVED_TYPE_ONLY,
            RuleCategory::StaticFieldRetarget => keys::STATIC_FIELD_RETARGET,
            RuleCategory::CovariantRetarget => keys::COVARIANT_RETARGET,
            RuleCategory::StaticRetarget => keys::STATIC_RETARGET,
            RuleCategory::NonEmulatedVirtualRetarget => keys::NON_EMULATED_VIRTUAL_RETARGET,
            RuleCategory::EmulatedVirtualRetarget => keys::EMULATED_VIRTUAL_RETARGET,
            RuleCategory::EmulatedVirtualRetargetThroughEmulatedInterface => {
                keys::EMULATED_VIRTUAL_RETARGET_THROUGH_EMULATED_INTERFACE
            }
            RuleCategory::ApiGenericTypesConversion => keys::API_GENERIC_TYPES_CONVERSION,
            RuleCategory::EmulatedInterface => keys::EMULATED_INTERFACE,
            RuleCategory::Wrapper => keys::WRAPPER,
            RuleCategory::LegacyBackport => keys::LEGACY_BACKPORT,
            RuleCategory::DontRetarget => keys::DONT_RETARGET,
            RuleCategory::CustomConversion => keys::CUSTOM_CONVERSION,
            RuleCategory::AmendLibraryMethod => keys::AMEND_LIBRARY_METHOD,
            RuleCategory::AmendLibraryField => keys::AMEND_LIBRARY_FIELD,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.key() == key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SymbolKey {
    Type(TypeId),
    Method(MethodId),
    Field(FieldId),
}

impl SymbolKey {
    fn display(self, table: &SymbolTable) -> String {
        match self {
            SymbolKey::Type(ty) => table.java_name(ty),
            SymbolKey::Method(method) => table.display_method(method),
            SymbolKey::Field(field) => table.display_field(field),
        }
    }
}

impl From<TypeId> for SymbolKey {
    fn from(ty: TypeId) -> Self {
        SymbolKey::Type(ty)
    }
}

impl From<MethodId> for SymbolKey {
    fn from(method: MethodId) -> Self {
        SymbolKey::Method(method)
    }
}

impl From<FieldId> for SymbolKey {
    fn from(field: FieldId) -> Self {
        SymbolKey::Field(field)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Conflict {
    category: RuleCategory,
    key: SymbolKey,
}

/// The rules that apply to one compilation (or one API level range of a
/// document). Immutable once built; see [`RewritingFlagsBuilder`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewritingFlags {
    rewrite_type: IndexMap<TypeId, TypeId>,
    maintain_type: IndexSet<TypeId>,
    rewrite_derived_type_only: IndexMap<TypeId, TypeId>,
    static_field_retarget: IndexMap<FieldId, FieldId>,
    covariant_retarget: IndexMap<MethodId, MethodId>,
    static_retarget: IndexMap<MethodId, MethodId>,
    non_emulated_virtual_retarget: IndexMap<MethodId, MethodId>,
    emulated_virtual_retarget: IndexMap<MethodId, EmulatedDispatchMethodDescriptor>,
    emulated_virtual_retarget_through_emulated_interface: IndexMap<MethodId, MethodId>,
    api_generic_types_conversion: IndexMap<MethodId, Vec<Option<MethodId>>>,
    emulated_interfaces: IndexMap<TypeId, EmulatedInterfaceDescriptor>,
    wrappers: OrderedMap<TypeId, WrapperDescriptor>,
    legacy_backport: IndexMap<TypeId, TypeId>,
    dont_retarget: IndexSet<TypeId>,
    custom_conversions: IndexMap<TypeId, CustomConversionDescriptor>,
    amend_library_method: IndexMap<MethodId, MethodAccessFlags>,
    amend_library_field: IndexMap<FieldId, FieldAccessFlags>,
}

impl RewritingFlags {
    pub fn builder() -> RewritingFlagsBuilder {
        RewritingFlagsBuilder::default()
    }

    pub fn rewrite_type(&self) -> &IndexMap<TypeId, TypeId> {
        &self.rewrite_type
    }

    pub fn maintain_type(&self) -> &IndexSet<TypeId> {
        &self.maintain_type
    }

    pub fn rewrite_derived_type_only(&self) -> &IndexMap<TypeId, TypeId> {
        &self.rewrite_derived_type_only
    }

    pub fn static_field_retarget(&self) -> &IndexMap<FieldId, FieldId> {
        &self.static_field_retarget
    }

    pub fn covariant_retarget(&self) -> &IndexMap<MethodId, MethodId> {
        &self.covariant_retarget
    }

    pub fn static_retarget(&self) -> &IndexMap<MethodId, MethodId> {
        &self.static_retarget
    }

    pub fn non_emulated_virtual_retarget(&self) -> &IndexMap<MethodId, MethodId> {
        &self.non_emulated_virtual_retarget
    }

    pub fn emulated_virtual_retarget(&self) -> &IndexMap<MethodId, EmulatedDispatchMethodDescriptor> {
        &self.emulated_virtual_retarget
    }

    pub fn emulated_virtual_retarget_through_emulated_interface(
        &self,
    ) -> &IndexMap<MethodId, MethodId> {
        &self.emulated_virtual_retarget_through_emulated_interface
    }

    /// One slot per generic parameter; `None` means the slot needs no
    /// conversion.
    pub fn api_generic_types_conversion(&self) -> &IndexMap<MethodId, Vec<Option<MethodId>>> {
        &self.api_generic_types_conversion
    }

    pub fn emulated_interfaces(&self) -> &IndexMap<TypeId, EmulatedInterfaceDescriptor> {
        &self.emulated_interfaces
    }

    pub fn wrappers(&self) -> &OrderedMap<TypeId, WrapperDescriptor> {
        &self.wrappers
    }

    pub fn legacy_backport(&self) -> &IndexMap<TypeId, TypeId> {
        &self.legacy_backport
    }

    pub fn dont_retarget(&self) -> &IndexSet<TypeId> {
        &self.dont_retarget
    }

    pub fn custom_conversions(&self) -> &IndexMap<TypeId, CustomConversionDescriptor> {
        &self.custom_conversions
    }

    pub fn amend_library_method(&self) -> &IndexMap<MethodId, MethodAccessFlags> {
        &self.amend_library_method
    }

    pub fn amend_library_field(&self) -> &IndexMap<FieldId, FieldAccessFlags> {
        &self.amend_library_field
    }

    /// Number of entries stored under `category`.
    pub fn len(&self, category: RuleCategory) -> usize {
        match category {
            RuleCategory::RewriteType => self.rewrite_type.len(),
            RuleCategory::MaintainType => self.maintain_type.len(),
            RuleCategory::RewriteDerivedTypeOnly => self.rewrite_derived_type_only.len(),
            RuleCategory::StaticFieldRetarget => self.static_field_retarget.len(),
            RuleCategory::CovariantRetarget => self.covariant_retarget.len(),
            RuleCategory::StaticRetarget => self.static_retarget.len(),
            RuleCategory::NonEmulatedVirtualRetarget => self.non_emulated_virtual_retarget.len(),
            RuleCategory::EmulatedVirtualRetarget => self.emulated_virtual_retarget.len(),
            RuleCategory::EmulatedVirtualRetargetThroughEmulatedInterface => {
                self.emulated_virtual_retarget_through_emulated_interface.len()
            }
            RuleCategory::ApiGenericTypesConversion => self.api_generic_types_conversion.len(),
            RuleCategory::EmulatedInterface => self.emulated_interfaces.len(),
            RuleCategory::Wrapper => self.wrappers.len(),
            RuleCategory::LegacyBackport => self.legacy_backport.len(),
            RuleCategory::DontRetarget => self.dont_retarget.len(),
            RuleCategory::CustomConversion => self.custom_conversions.len(),
            RuleCategory::AmendLibraryMethod => self.amend_library_method.len(),
            RuleCategory::AmendLibraryField => self.amend_library_field.len(),
        }
    }

    /// Whether no category holds any entry at all.
    pub fn has_no_entries(&self) -> bool {
        RuleCategory::ALL.into_iter().all(|category| self.len(category) == 0)
    }

    pub fn has_retargeting(&self) -> bool {
        !self.covariant_retarget.is_empty()
            || !self.static_retarget.is_empty()
            || !self.non_emulated_virtual_retarget.is_empty()
            || !self.emulated_virtual_retarget.is_empty()
            || !self.static_field_retarget.is_empty()
    }

    /// Whether the rule set leaves the program untouched: no type rewriting,
    /// no retargeting and no emulated interfaces.
    pub fn is_empty(&self) -> bool {
        self.rewrite_type.is_empty()
            && self.maintain_type.is_empty()
            && self.rewrite_derived_type_only.is_empty()
            && !self.has_retargeting()
            && self.emulated_interfaces.is_empty()
            && self.legacy_backport.is_empty()
    }

    pub fn is_custom_conversion_rewritten_type(&self, table: &SymbolTable, ty: TypeId) -> bool {
        self.custom_conversions.values().any(|descriptor| {
            table.method_holder(descriptor.from()) == ty || table.method_holder(descriptor.to()) == ty
        })
    }

    pub fn is_emulated_interface_rewritten_type(&self, ty: TypeId) -> bool {
        self.emulated_interfaces
            .values()
            .any(|descriptor| descriptor.rewritten_type() == ty)
    }

    pub fn has_emulated_interfaces(&self) -> bool {
        !self.emulated_interfaces.is_empty()
    }

    /// The dispatch descriptor of an emulated interface method, looked up
    /// through the method's holder.
    pub fn emulated_interface_dispatch_descriptor(
        &self,
        table: &SymbolTable,
        method: MethodId,
    ) -> Option<&EmulatedDispatchMethodDescriptor> {
        self.emulated_interfaces
            .get(&table.method_holder(method))?
            .emulated_methods()
            .get(&method)
    }

    /// Keys of the static, non-emulated virtual and emulated virtual retarget
    /// maps.
    pub fn retarget_methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.static_retarget
            .keys()
            .chain(self.non_emulated_virtual_retarget.keys())
            .chain(self.emulated_virtual_retarget.keys())
            .copied()
    }

    /// Relocates the desugared library: every occurrence of `old_prefix` in
    /// the descriptors of rewrite targets, emulated interface types and
    /// custom conversion signatures is replaced with `new_prefix`.
    pub fn with_post_prefix(
        &self,
        table: &mut SymbolTable,
        old_prefix: &str,
        new_prefix: &str,
    ) -> Result<Self> {
        let mut relocate = PostPrefix {
            table,
            old_prefix,
            new_prefix,
        };

        let mut rewrite_type = IndexMap::with_capacity(self.rewrite_type.len());
        for (from, to) in &self.rewrite_type {
            rewrite_type.insert(*from, relocate.ty(*to)?);
        }
        let mut rewrite_derived_type_only =
            IndexMap::with_capacity(self.rewrite_derived_type_only.len());
        for (from, to) in &self.rewrite_derived_type_only {
            rewrite_derived_type_only.insert(*from, relocate.ty(*to)?);
        }

        let mut emulated_interfaces = IndexMap::with_capacity(self.emulated_interfaces.len());
        for (interface, descriptor) in &self.emulated_interfaces {
            let rewritten = relocate.ty(descriptor.rewritten_type())?;
            let emulated_methods = descriptor
                .emulated_methods()
                .iter()
                .map(|(method, dispatch)| {
                    let interface_method = dispatch
                        .interface_method()
                        .map_method(|m| relocate.table.method_with_holder(m, rewritten));
                    (*method, dispatch.with_interface_method(interface_method))
                })
                .collect();
            emulated_interfaces.insert(
                *interface,
                EmulatedInterfaceDescriptor::new(rewritten, emulated_methods),
            );
        }

        let mut custom_conversions = IndexMap::with_capacity(self.custom_conversions.len());
        for (ty, descriptor) in &self.custom_conversions {
            let to = relocate.method(descriptor.to())?;
            let from = relocate.method(descriptor.from())?;
            custom_conversions.insert(*ty, CustomConversionDescriptor::new(relocate.table, to, from)?);
        }

        Ok(Self {
            rewrite_type,
            rewrite_derived_type_only,
            emulated_interfaces,
            custom_conversions,
            ..self.clone()
        })
    }
}

struct PostPrefix<'a> {
    table: &'a mut SymbolTable,
    old_prefix: &'a str,
    new_prefix: &'a str,
}

impl PostPrefix<'_> {
    fn ty(&mut self, ty: TypeId) -> Result<TypeId> {
        let descriptor = self
            .table
            .descriptor(ty)
            .replace(self.old_prefix, self.new_prefix);
        Ok(self.table.intern_descriptor(&descriptor)?)
    }

    fn method(&mut self, method: MethodId) -> Result<MethodId> {
        let holder = self.table.method_holder(method);
        let name = self.table.method_name(method).to_string();
        let return_type = self.table.method_return_type(method);
        let return_type = self.ty(return_type)?;
        let parameters = self.table.method_parameters(method).to_vec();
        let parameters = parameters
            .into_iter()
            .map(|param| self.ty(param))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.table.intern_method(holder, &name, return_type, &parameters))
    }
}

fn check_insert<K, V>(
    conflicts: &mut Vec<Conflict>,
    category: RuleCategory,
    key: K,
    existing: Option<&V>,
    value: &V,
) -> bool
where
    K: Into<SymbolKey>,
    V: PartialEq,
{
    match existing {
        None => true,
        Some(previous) if previous == value => false,
        Some(_) => {
            conflicts.push(Conflict {
                category,
                key: key.into(),
            });
            false
        }
    }
}

fn put<K, V>(
    conflicts: &mut Vec<Conflict>,
    category: RuleCategory,
    map: &mut IndexMap<K, V>,
    key: K,
    value: V,
) where
    K: Copy + Hash + Eq + Into<SymbolKey>,
    V: PartialEq,
{
    if check_insert(conflicts, category, key, map.get(&key), &value) {
        map.insert(key, value);
    }
}

/// Accumulates rules, possibly from several API level ranges, into a
/// [`RewritingFlags`].
///
/// Re-inserting an identical entry is a no-op. Inserting a different value
/// for an existing key is recorded and makes [`build`](Self::build) fail.
#[derive(Debug, Default)]
pub struct RewritingFlagsBuilder {
    flags: RewritingFlags,
    conflicts: Vec<Conflict>,
}

impl RewritingFlagsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rewrite_type(&mut self, from: TypeId, to: TypeId) {
        if from == to {
            self.conflicts.push(Conflict {
                category: RuleCategory::RewriteType,
                key: from.into(),
            });
            return;
        }
        put(
            &mut self.conflicts,
            RuleCategory::RewriteType,
            &mut self.flags.rewrite_type,
            from,
            to,
        );
    }

    pub fn rewritten_type(&self, ty: TypeId) -> Option<TypeId> {
        self.flags.rewrite_type.get(&ty).copied()
    }

    pub fn maintain_type(&mut self, ty: TypeId) {
        self.flags.maintain_type.insert(ty);
    }

    pub fn rewrite_derived_type_only(&mut self, from: TypeId, to: TypeId) {
        put(
            &mut self.conflicts,
            RuleCategory::RewriteDerivedTypeOnly,
            &mut self.flags.rewrite_derived_type_only,
            from,
            to,
        );
    }

    pub fn put_static_field_retarget(&mut self, from: FieldId, to: FieldId) {
        put(
            &mut self.conflicts,
            RuleCategory::StaticFieldRetarget,
            &mut self.flags.static_field_retarget,
            from,
            to,
        );
    }

    pub fn put_covariant_retarget(&mut self, from: MethodId, to: MethodId) {
        put(
            &mut self.conflicts,
            RuleCategory::CovariantRetarget,
            &mut self.flags.covariant_retarget,
            from,
            to,
        );
    }

    pub fn put_static_retarget(&mut self, from: MethodId, to: MethodId) {
        put(
            &mut self.conflicts,
            RuleCategory::StaticRetarget,
            &mut self.flags.static_retarget,
            from,
            to,
        );
    }

    pub fn put_non_emulated_virtual_retarget(&mut self, from: MethodId, to: MethodId) {
        put(
            &mut self.conflicts,
            RuleCategory::NonEmulatedVirtualRetarget,
            &mut self.flags.non_emulated_virtual_retarget,
            from,
            to,
        );
    }

    pub fn put_emulated_virtual_retarget(
        &mut self,
        method: MethodId,
        descriptor: EmulatedDispatchMethodDescriptor,
    ) {
        put(
            &mut self.conflicts,
            RuleCategory::EmulatedVirtualRetarget,
            &mut self.flags.emulated_virtual_retarget,
            method,
            descriptor,
        );
    }

    pub fn put_emulated_virtual_retarget_through_emulated_interface(
        &mut self,
        from: MethodId,
        to: MethodId,
    ) {
        put(
            &mut self.conflicts,
            RuleCategory::EmulatedVirtualRetargetThroughEmulatedInterface,
            &mut self.flags.emulated_virtual_retarget_through_emulated_interface,
            from,
            to,
        );
    }

    pub fn add_api_generic_types_conversion(
        &mut self,
        method: MethodId,
        conversions: Vec<Option<MethodId>>,
    ) {
        put(
            &mut self.conflicts,
            RuleCategory::ApiGenericTypesConversion,
            &mut self.flags.api_generic_types_conversion,
            method,
            conversions,
        );
    }

    pub fn put_emulated_interface(&mut self, ty: TypeId, descriptor: EmulatedInterfaceDescriptor) {
        put(
            &mut self.conflicts,
            RuleCategory::EmulatedInterface,
            &mut self.flags.emulated_interfaces,
            ty,
            descriptor,
        );
    }

    pub fn add_wrapper(&mut self, ty: TypeId, descriptor: WrapperDescriptor) {
        let wrappers = &mut self.flags.wrappers;
        if check_insert(
            &mut self.conflicts,
            RuleCategory::Wrapper,
            ty,
            wrappers.get(&ty),
            &descriptor,
        ) {
            wrappers.insert(ty, descriptor);
        }
    }

    pub fn put_legacy_backport(&mut self, from: TypeId, to: TypeId) {
        put(
            &mut self.conflicts,
            RuleCategory::LegacyBackport,
            &mut self.flags.legacy_backport,
            from,
            to,
        );
    }

    pub fn add_dont_retarget(&mut self, ty: TypeId) {
        self.flags.dont_retarget.insert(ty);
    }

    pub fn put_custom_conversion(&mut self, ty: TypeId, descriptor: CustomConversionDescriptor) {
        put(
            &mut self.conflicts,
            RuleCategory::CustomConversion,
            &mut self.flags.custom_conversions,
            ty,
            descriptor,
        );
    }

    pub fn amend_library_method(&mut self, method: MethodId, flags: MethodAccessFlags) {
        put(
            &mut self.conflicts,
            RuleCategory::AmendLibraryMethod,
            &mut self.flags.amend_library_method,
            method,
            flags,
        );
    }

    pub fn amend_library_field(&mut self, field: FieldId, flags: FieldAccessFlags) {
        put(
            &mut self.conflicts,
            RuleCategory::AmendLibraryField,
            &mut self.flags.amend_library_field,
            field,
            flags,
        );
    }

    /// Inserts every entry of an already built rule set.
    pub fn extend_from(&mut self, other: &RewritingFlags) {
        for (from, to) in &other.rewrite_type {
            self.rewrite_type(*from, *to);
        }
        for ty in &other.maintain_type {
            self.maintain_type(*ty);
        }
        for (from, to) in &other.rewrite_derived_type_only {
            self.rewrite_derived_type_only(*from, *to);
        }
        for (from, to) in &other.static_field_retarget {
            self.put_static_field_retarget(*from, *to);
        }
        for (from, to) in &other.covariant_retarget {
            self.put_covariant_retarget(*from, *to);
        }
        for (from, to) in &other.static_retarget {
            self.put_static_retarget(*from, *to);
        }
        for (from, to) in &other.non_emulated_virtual_retarget {
            self.put_non_emulated_virtual_retarget(*from, *to);
        }
        for (method, descriptor) in &other.emulated_virtual_retarget {
            self.put_emulated_virtual_retarget(*method, descriptor.clone());
        }
        for (from, to) in &other.emulated_virtual_retarget_through_emulated_interface {
            self.put_emulated_virtual_retarget_through_emulated_interface(*from, *to);
        }
        for (method, conversions) in &other.api_generic_types_conversion {
            self.add_api_generic_types_conversion(*method, conversions.clone());
        }
        for (ty, descriptor) in &other.emulated_interfaces {
            self.put_emulated_interface(*ty, descriptor.clone());
        }
        for (ty, descriptor) in &other.wrappers {
            self.add_wrapper(*ty, descriptor.clone());
        }
        for (from, to) in &other.legacy_backport {
            self.put_legacy_backport(*from, *to);
        }
        for ty in &other.dont_retarget {
            self.add_dont_retarget(*ty);
        }
        for (ty, descriptor) in &other.custom_conversions {
            self.put_custom_conversion(*ty, *descriptor);
        }
        for (method, flags) in &other.amend_library_method {
            self.amend_library_method(*method, *flags);
        }
        for (field, flags) in &other.amend_library_field {
            self.amend_library_field(*field, *flags);
        }
    }

    /// Freezes the rule set, failing on the first recorded conflict or on
    /// types that are both rewritten and maintained.
    pub fn build(self, table: &SymbolTable) -> Result<RewritingFlags> {
        if let Some(conflict) = self.conflicts.first() {
            tracing::debug!(
                target: "dlspec.flags",
                conflicts = self.conflicts.len(),
                category = conflict.category.key(),
                "rejecting rule set with conflicting entries"
            );
            return Err(SpecificationError::ConflictingEntry {
                category: conflict.category.key(),
                key: conflict.key.display(table),
            });
        }

        let mut ambiguous: Vec<String> = self
            .flags
            .rewrite_type
            .keys()
            .filter(|ty| self.flags.maintain_type.contains(*ty))
            .map(|ty| table.java_name(*ty))
            .collect();
        if !ambiguous.is_empty() {
            ambiguous.sort();
            return Err(SpecificationError::RewrittenAndMaintained { types: ambiguous });
        }

        Ok(self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ty(table: &mut SymbolTable, name: &str) -> TypeId {
        table.intern_java_type(name).unwrap()
    }

    #[test]
    fn identical_reinsert_is_idempotent() {
        let mut table = SymbolTable::new();
        let stream = ty(&mut table, "java.util.stream.Stream");
        let desugared = ty(&mut table, "j$.util.stream.Stream");

        let mut builder = RewritingFlags::builder();
        builder.rewrite_type(stream, desugared);
        builder.rewrite_type(stream, desugared);
        let flags = builder.build(&table).unwrap();
        assert_eq!(flags.len(RuleCategory::RewriteType), 1);
        assert_eq!(flags.rewrite_type().get(&stream), Some(&desugared));
    }

    #[test]
    fn conflicting_entries_fail_the_build() {
        let mut table = SymbolTable::new();
        let stream = ty(&mut table, "java.util.stream.Stream");
        let first = ty(&mut table, "j$.util.stream.Stream");
        let second = ty(&mut table, "k$.util.stream.Stream");

        let mut builder = RewritingFlags::builder();
        builder.rewrite_type(stream, first);
        builder.rewrite_type(stream, second);
        let err = builder.build(&table).unwrap_err();
        assert!(matches!(
            err,
            SpecificationError::ConflictingEntry {
                category: "rewrite_type",
                ref key,
            } if key == "java.util.stream.Stream"
        ));
    }

    #[test]
    fn self_rewrite_is_rejected() {
        let mut table = SymbolTable::new();
        let stream = ty(&mut table, "java.util.stream.Stream");
        let mut builder = RewritingFlags::builder();
        builder.rewrite_type(stream, stream);
        assert!(builder.build(&table).is_err());
    }

    #[test]
    fn rewritten_and_maintained_types_are_rejected() {
        let mut table = SymbolTable::new();
        let stream = ty(&mut table, "java.util.stream.Stream");
        let desugared = ty(&mut table, "j$.util.stream.Stream");
        let mut builder = RewritingFlags::builder();
        builder.rewrite_type(stream, desugared);
        builder.maintain_type(stream);
        let err = builder.build(&table).unwrap_err();
        assert!(err
            .to_string()
            .contains("both rewritten and maintained [java.util.stream.Stream]"));
    }

    #[test]
    fn queries() {
        let mut table = SymbolTable::new();
        let optional = ty(&mut table, "java.util.Optional");
        let desugared = ty(&mut table, "j$.util.Optional");
        let conversions = ty(&mut table, "j$.util.OptionalConversions");
        let to = table.intern_method(conversions, "convert", optional, &[desugared]);
        let from = table.intern_method(conversions, "convert", desugared, &[optional]);

        let mut builder = RewritingFlags::builder();
        assert!(builder.flags.is_empty());
        builder.put_custom_conversion(
            optional,
            CustomConversionDescriptor::new(&table, to, from).unwrap(),
        );
        builder.add_dont_retarget(optional);
        let flags = builder.build(&table).unwrap();

        // Conversions and dont-retarget entries alone do not rewrite anything.
        assert!(flags.is_empty());
        assert!(!flags.has_no_entries());
        assert!(!flags.has_retargeting());
        assert!(flags.is_custom_conversion_rewritten_type(&table, conversions));
        assert!(!flags.is_custom_conversion_rewritten_type(&table, optional));
        assert_eq!(flags.retarget_methods().count(), 0);
    }

    #[test]
    fn extend_from_merges_disjoint_rule_sets() {
        let mut table = SymbolTable::new();
        let int = ty(&mut table, "int");
        let math = ty(&mut table, "java.lang.Math");
        let backport = ty(&mut table, "j$.lang.Math$-CC");
        let floor_div = table.intern_method(math, "floorDiv", int, &[int, int]);
        let floor_mod = table.intern_method(math, "floorMod", int, &[int, int]);
        let floor_div_backport = table.method_with_holder(floor_div, backport);
        let floor_mod_backport = table.method_with_holder(floor_mod, backport);

        let mut first = RewritingFlags::builder();
        first.put_static_retarget(floor_div, floor_div_backport);
        let first = first.build(&table).unwrap();
        let mut second = RewritingFlags::builder();
        second.put_static_retarget(floor_mod, floor_mod_backport);
        let second = second.build(&table).unwrap();

        let mut merged = RewritingFlags::builder();
        merged.extend_from(&first);
        merged.extend_from(&second);
        merged.extend_from(&first);
        let merged = merged.build(&table).unwrap();
        assert_eq!(merged.static_retarget().len(), 2);
        assert_eq!(
            merged.retarget_methods().collect::<Vec<_>>(),
            vec![floor_div, floor_mod]
        );
        assert!(merged.has_retargeting());
    }

    #[test]
    fn post_prefix_relocates_rewrite_targets_and_conversions() {
        let mut table = SymbolTable::new();
        let stream = ty(&mut table, "java.util.stream.Stream");
        let desugared = ty(&mut table, "j$.util.stream.Stream");
        let platform_zone = ty(&mut table, "java.time.ZoneId");
        let desugared_zone = ty(&mut table, "j$.time.ZoneId");
        let conversions = ty(&mut table, "j$.time.TimeConversions");
        let to = table.intern_method(conversions, "convert", platform_zone, &[desugared_zone]);
        let from = table.intern_method(conversions, "convert", desugared_zone, &[platform_zone]);

        let mut builder = RewritingFlags::builder();
        builder.rewrite_type(stream, desugared);
        builder.put_custom_conversion(
            platform_zone,
            CustomConversionDescriptor::new(&table, to, from).unwrap(),
        );
        let flags = builder.build(&table).unwrap();

        let relocated = flags.with_post_prefix(&mut table, "Lj$/", "Lcom/example/j$/").unwrap();
        let target = relocated.rewrite_type()[&stream];
        assert_eq!(table.java_name(target), "com.example.j$.util.stream.Stream");

        let conversion = relocated.custom_conversions()[&platform_zone];
        assert_eq!(
            table.display_method(conversion.to()),
            "java.time.ZoneId j$.time.TimeConversions#convert(com.example.j$.time.ZoneId)"
        );
        // Untouched categories are carried over.
        assert_eq!(relocated.len(RuleCategory::RewriteType), 1);
        assert_eq!(flags.rewrite_type()[&stream], desugared);
    }
}
