//! Writing specification documents in canonical form.
//!
//! Maps are emitted sorted by their rendered key, except dispatch cases and
//! wrappers whose order is meaningful. Rule sets are emitted most recent
//! range first and empty categories are left out.

use std::collections::BTreeSet;

use dlspec_symbols::{FieldId, MethodId, SymbolTable, TypeId};
use serde_json::{Map, Value};

use crate::api_level::ApiLevelRange;
use crate::descriptors::{DerivedMethod, SpecificationDescriptor};
use crate::error::{Result, SpecificationError};
use crate::flags::{RewritingFlags, RuleCategory};
use crate::keys;
use crate::member::{referenced_package, SymbolEncoder};
use crate::specification::{MachineSpecification, MultiApiLevelSpecification};

/// Renders `specification` as a JSON document.
pub fn export(table: &SymbolTable, specification: &MultiApiLevelSpecification) -> Result<Value> {
    let mut exporter = Exporter::new(table);
    for package in collect_packages(table, specification) {
        exporter.encoder.register_package(&package)?;
    }

    let top = specification.top_level_flags();
    let mut root = Map::new();
    root.insert(keys::IDENTIFIER.into(), top.identifier.clone().into());
    root.insert(
        keys::REQUIRED_COMPILATION_API_LEVEL.into(),
        top.required_compilation_api_level.into(),
    );
    root.insert(
        keys::SYNTHESIZED_LIBRARY_CLASSES_PACKAGE_PREFIX.into(),
        top.synthesized_library_classes_package_prefix.clone().into(),
    );
    root.insert(
        keys::SUPPORT_ALL_CALLBACKS_FROM_LIBRARY.into(),
        top.support_all_callbacks_from_library.into(),
    );
    root.insert(keys::SHRINKER_CONFIG.into(), top.extra_keep_rules.clone().into());
    root.insert(
        keys::CONFIGURATION_FORMAT_VERSION.into(),
        keys::CURRENT_VERSION.into(),
    );

    let collections = [
        (keys::COMMON_FLAGS, specification.common_flags()),
        (keys::PROGRAM_FLAGS, specification.program_flags()),
        (keys::LIBRARY_FLAGS, specification.library_flags()),
    ];
    let mut rule_sets = 0usize;
    for (key, collection) in collections {
        let rendered = collection
            .iter()
            .rev()
            .map(|(range, flags)| exporter.rule_set(range, flags).map(Value::Object))
            .collect::<Result<Vec<_>>>()?;
        rule_sets += rendered.len();
        root.insert(key.into(), Value::Array(rendered));
    }

    let packages = exporter.encoder.into_package_map();
    let package_map: Map<String, Value> = packages
        .iter()
        .map(|(token, package)| (token.to_string(), Value::from(package)))
        .collect();
    root.insert(keys::PACKAGE_MAP.into(), Value::Object(package_map));

    tracing::info!(
        target: "dlspec.exporter",
        identifier = %top.identifier,
        rule_sets,
        packages = packages.len(),
        "exported desugared library specification"
    );
    Ok(Value::Object(root))
}

/// Renders a resolved specification as a document with one unbounded common
/// rule set.
pub fn export_resolved(table: &SymbolTable, specification: &MachineSpecification) -> Result<Value> {
    export(
        table,
        &MultiApiLevelSpecification::from_resolved(Default::default(), specification),
    )
}

pub fn export_to_string(
    table: &SymbolTable,
    specification: &MultiApiLevelSpecification,
    pretty: bool,
) -> Result<String> {
    let document = export(table, specification)?;
    let rendered = if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    };
    rendered.map_err(|source| SpecificationError::Json {
        origin: specification.origin().clone(),
        source,
    })
}

struct Exporter<'a> {
    encoder: SymbolEncoder<'a>,
}

impl<'a> Exporter<'a> {
    fn new(table: &'a SymbolTable) -> Self {
        Self {
            encoder: SymbolEncoder::new(table),
        }
    }

    fn rule_set(&mut self, range: &ApiLevelRange, flags: &RewritingFlags) -> Result<Map<String, Value>> {
        let mut object = Map::new();
        object.insert(
            keys::API_LEVEL_BELOW_OR_EQUAL.into(),
            range.api_level_below_or_equal().into(),
        );
        if let Some(min) = range.api_level_greater_or_equal() {
            object.insert(keys::API_LEVEL_GREATER_OR_EQUAL.into(), min.into());
        }
        for category in RuleCategory::ALL {
            if flags.len(category) == 0 {
                continue;
            }
            let value = self.category(category, flags)?;
            object.insert(category.key().into(), value);
        }
        tracing::debug!(
            target: "dlspec.exporter",
            %range,
            categories = object.len(),
            "rendered rule set"
        );
        Ok(object)
    }

    fn category(&mut self, category: RuleCategory, flags: &RewritingFlags) -> Result<Value> {
        Ok(match category {
            RuleCategory::RewriteType => self.type_map(flags.rewrite_type())?,
            RuleCategory::MaintainType => self.type_set(flags.maintain_type())?,
            RuleCategory::RewriteDerivedTypeOnly => {
                self.type_map(flags.rewrite_derived_type_only())?
            }
            RuleCategory::StaticFieldRetarget => {
                let mut entries = Vec::with_capacity(flags.static_field_retarget().len());
                for (from, to) in flags.static_field_retarget() {
                    entries.push((self.encoder.field(*from)?, self.encoder.field(*to)?.into()));
                }
                sorted_object(entries)
            }
            RuleCategory::CovariantRetarget => self.method_map(flags.covariant_retarget())?,
            RuleCategory::StaticRetarget => self.method_map(flags.static_retarget())?,
            RuleCategory::NonEmulatedVirtualRetarget => {
                self.method_map(flags.non_emulated_virtual_retarget())?
            }
            RuleCategory::EmulatedVirtualRetarget => {
                let mut entries = Vec::with_capacity(flags.emulated_virtual_retarget().len());
                for (method, descriptor) in flags.emulated_virtual_retarget() {
                    entries.push((
                        self.encoder.method(*method)?,
                        self.descriptor(SpecificationDescriptor::EmulatedDispatch(descriptor))?,
                    ));
                }
                sorted_object(entries)
            }
            RuleCategory::EmulatedVirtualRetargetThroughEmulatedInterface => {
                self.method_map(flags.emulated_virtual_retarget_through_emulated_interface())?
            }
            RuleCategory::ApiGenericTypesConversion => {
                let mut entries = Vec::with_capacity(flags.api_generic_types_conversion().len());
                for (method, conversions) in flags.api_generic_types_conversion() {
                    let slots = conversions
                        .iter()
                        .map(|slot| match slot {
                            Some(conversion) => self.encoder.method(*conversion).map(Value::from),
                            None => Ok(Value::from("")),
                        })
                        .collect::<Result<Vec<_>>>()?;
                    entries.push((self.encoder.method(*method)?, Value::Array(slots)));
                }
                sorted_object(entries)
            }
            RuleCategory::EmulatedInterface => {
                let mut entries = Vec::with_capacity(flags.emulated_interfaces().len());
                for (ty, descriptor) in flags.emulated_interfaces() {
                    entries.push((
                        self.encoder.ty(*ty)?,
                        self.descriptor(SpecificationDescriptor::EmulatedInterface(descriptor))?,
                    ));
                }
                sorted_object(entries)
            }
            RuleCategory::Wrapper => {
                let mut wrappers = Map::new();
                for (ty, descriptor) in flags.wrappers() {
                    wrappers.insert(
                        self.encoder.ty(*ty)?,
                        self.descriptor(SpecificationDescriptor::Wrapper(descriptor))?,
                    );
                }
                Value::Object(wrappers)
            }
            RuleCategory::LegacyBackport => self.type_map(flags.legacy_backport())?,
            RuleCategory::DontRetarget => self.type_set(flags.dont_retarget())?,
            RuleCategory::CustomConversion => {
                let mut entries = Vec::with_capacity(flags.custom_conversions().len());
                for (ty, descriptor) in flags.custom_conversions() {
                    entries.push((
                        self.encoder.ty(*ty)?,
                        self.descriptor(SpecificationDescriptor::CustomConversion(descriptor))?,
                    ));
                }
                sorted_object(entries)
            }
            RuleCategory::AmendLibraryMethod => {
                let mut members = Vec::with_capacity(flags.amend_library_method().len());
                for (method, access) in flags.amend_library_method() {
                    members.push(self.encoder.amended_method(*method, *access)?);
                }
                sorted_array(members)
            }
            RuleCategory::AmendLibraryField => {
                let mut members = Vec::with_capacity(flags.amend_library_field().len());
                for (field, access) in flags.amend_library_field() {
                    members.push(self.encoder.amended_field(*field, *access)?);
                }
                sorted_array(members)
            }
        })
    }

    fn descriptor(&mut self, descriptor: SpecificationDescriptor<'_>) -> Result<Value> {
        Ok(match descriptor {
            SpecificationDescriptor::CustomConversion(conversion) => Value::Array(vec![
                self.encoder.method(conversion.to())?.into(),
                self.encoder.method(conversion.from())?.into(),
            ]),
            SpecificationDescriptor::DerivedMethod(derived) => Value::Array(vec![
                self.encoder.method(derived.method())?.into(),
                derived
                    .holder_kind()
                    .map_or(Value::from(-1), |kind| Value::from(kind.id())),
            ]),
            SpecificationDescriptor::EmulatedDispatch(dispatch) => {
                let mut cases = Map::new();
                for (ty, method) in dispatch.dispatch_cases() {
                    cases.insert(self.encoder.ty(*ty)?, self.derived(method)?);
                }
                Value::Array(vec![
                    self.derived(dispatch.interface_method())?,
                    self.derived(dispatch.emulated_dispatch_method())?,
                    self.derived(dispatch.forwarding_method())?,
                    Value::Object(cases),
                ])
            }
            SpecificationDescriptor::EmulatedInterface(interface) => {
                let mut methods = Vec::with_capacity(interface.emulated_methods().len());
                for (method, dispatch) in interface.emulated_methods() {
                    methods.push((
                        self.encoder.method(*method)?,
                        self.descriptor(SpecificationDescriptor::EmulatedDispatch(dispatch))?,
                    ));
                }
                Value::Array(vec![
                    self.encoder.ty(interface.rewritten_type())?.into(),
                    sorted_object(methods),
                ])
            }
            SpecificationDescriptor::Wrapper(wrapper) => {
                let methods = wrapper
                    .methods()
                    .iter()
                    .map(|method| self.encoder.method(*method).map(Value::from))
                    .collect::<Result<Vec<_>>>()?;
                let subwrappers = wrapper
                    .subwrappers()
                    .iter()
                    .map(|ty| self.encoder.ty(*ty).map(Value::from))
                    .collect::<Result<Vec<_>>>()?;
                Value::Array(vec![
                    Value::Array(methods),
                    wrapper.has_non_public_access().into(),
                    Value::Array(subwrappers),
                ])
            }
        })
    }

    fn derived(&mut self, derived: &DerivedMethod) -> Result<Value> {
        self.descriptor(SpecificationDescriptor::DerivedMethod(derived))
    }

    fn type_map<'m>(&mut self, map: impl IntoIterator<Item = (&'m TypeId, &'m TypeId)>) -> Result<Value> {
        let mut entries = Vec::new();
        for (from, to) in map {
            entries.push((self.encoder.ty(*from)?, self.encoder.ty(*to)?.into()));
        }
        Ok(sorted_object(entries))
    }

    fn type_set<'m>(&mut self, set: impl IntoIterator<Item = &'m TypeId>) -> Result<Value> {
        let types = set
            .into_iter()
            .map(|ty| self.encoder.ty(*ty))
            .collect::<Result<Vec<_>>>()?;
        Ok(sorted_array(types))
    }

    fn method_map<'m>(
        &mut self,
        map: impl IntoIterator<Item = (&'m MethodId, &'m MethodId)>,
    ) -> Result<Value> {
        let mut entries = Vec::new();
        for (from, to) in map {
            entries.push((self.encoder.method(*from)?, self.encoder.method(*to)?.into()));
        }
        Ok(sorted_object(entries))
    }
}

fn sorted_object(mut entries: Vec<(String, Value)>) -> Value {
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    Value::Object(entries.into_iter().collect())
}

fn sorted_array(mut items: Vec<String>) -> Value {
    items.sort();
    Value::Array(items.into_iter().map(Value::from).collect())
}

/// Every package referenced by the document, sorted, so that token
/// assignment only depends on the document's content.
fn collect_packages(table: &SymbolTable, specification: &MultiApiLevelSpecification) -> BTreeSet<String> {
    let mut collector = PackageCollector {
        table,
        packages: BTreeSet::new(),
    };
    let collections = [
        specification.common_flags(),
        specification.library_flags(),
        specification.program_flags(),
    ];
    for flags in collections.into_iter().flat_map(|collection| collection.values()) {
        collector.flags(flags);
    }
    collector.packages
}

struct PackageCollector<'a> {
    table: &'a SymbolTable,
    packages: BTreeSet<String>,
}

impl PackageCollector<'_> {
    fn ty(&mut self, ty: TypeId) {
        if let Some(package) = referenced_package(self.table, ty) {
            self.packages.insert(package);
        }
    }

    fn method(&mut self, method: MethodId) {
        let table = self.table;
        self.ty(table.method_holder(method));
        self.ty(table.method_return_type(method));
        for param in table.method_parameters(method) {
            self.ty(*param);
        }
    }

    fn field(&mut self, field: FieldId) {
        let table = self.table;
        self.ty(table.field_holder(field));
        self.ty(table.field_type(field));
    }

    fn descriptor(&mut self, descriptor: SpecificationDescriptor<'_>) {
        match descriptor {
            SpecificationDescriptor::CustomConversion(conversion) => {
                self.method(conversion.to());
                self.method(conversion.from());
            }
            SpecificationDescriptor::DerivedMethod(derived) => self.method(derived.method()),
            SpecificationDescriptor::EmulatedDispatch(dispatch) => {
                for derived in [
                    dispatch.interface_method(),
                    dispatch.emulated_dispatch_method(),
                    dispatch.forwarding_method(),
                ] {
                    self.method(derived.method());
                }
                for (ty, derived) in dispatch.dispatch_cases() {
                    self.ty(*ty);
                    self.method(derived.method());
                }
            }
            SpecificationDescriptor::EmulatedInterface(interface) => {
                self.ty(interface.rewritten_type());
                for (method, dispatch) in interface.emulated_methods() {
                    self.method(*method);
                    self.descriptor(SpecificationDescriptor::EmulatedDispatch(dispatch));
                }
            }
            SpecificationDescriptor::Wrapper(wrapper) => {
                for method in wrapper.methods() {
                    self.method(*method);
                }
                for ty in wrapper.subwrappers() {
                    self.ty(*ty);
                }
            }
        }
    }

    fn flags(&mut self, flags: &RewritingFlags) {
        let type_pairs = flags
            .rewrite_type()
            .iter()
            .chain(flags.rewrite_derived_type_only())
            .chain(flags.legacy_backport());
        for (from, to) in type_pairs {
            self.ty(*from);
            self.ty(*to);
        }
        for ty in flags.maintain_type().iter().chain(flags.dont_retarget()) {
            self.ty(*ty);
        }
        for (from, to) in flags.static_field_retarget() {
            self.field(*from);
            self.field(*to);
        }
        let method_pairs = flags
            .covariant_retarget()
            .iter()
            .chain(flags.static_retarget())
            .chain(flags.non_emulated_virtual_retarget())
            .chain(flags.emulated_virtual_retarget_through_emulated_interface());
        for (from, to) in method_pairs {
            self.method(*from);
            self.method(*to);
        }
        for (method, descriptor) in flags.emulated_virtual_retarget() {
            self.method(*method);
            self.descriptor(SpecificationDescriptor::EmulatedDispatch(descriptor));
        }
        for (method, conversions) in flags.api_generic_types_conversion() {
            self.method(*method);
            for conversion in conversions.iter().flatten() {
                self.method(*conversion);
            }
        }
        for (ty, descriptor) in flags.emulated_interfaces() {
            self.ty(*ty);
            self.descriptor(SpecificationDescriptor::EmulatedInterface(descriptor));
        }
        for (ty, descriptor) in flags.wrappers() {
            self.ty(*ty);
            self.descriptor(SpecificationDescriptor::Wrapper(descriptor));
        }
        for (ty, descriptor) in flags.custom_conversions() {
            self.ty(*ty);
            self.descriptor(SpecificationDescriptor::CustomConversion(descriptor));
        }
        for method in flags.amend_library_method().keys() {
            self.method(*method);
        }
        for field in flags.amend_library_field().keys() {
            self.field(*field);
        }
    }
}
