//! Reading machine specification documents.
//!
//! [`parse`] resolves a document for one compilation: only the rule sets whose
//! range matches the minimum API level are decoded and merged.
//! [`parse_multi_api_level`] decodes every rule set and keeps them keyed by
//! range.

use std::collections::BTreeMap;
use std::path::Path;

use dlspec_symbols::{MethodId, SymbolTable, TypeId};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::api_level::ApiLevelRange;
use crate::descriptors::{
    CustomConversionDescriptor, DerivedMethod, EmulatedDispatchMethodDescriptor,
    EmulatedInterfaceDescriptor, WrapperDescriptor,
};
use crate::error::{Origin, Result, SpecificationError};
use crate::flags::{RewritingFlags, RewritingFlagsBuilder};
use crate::keys;
use crate::member::SymbolDecoder;
use crate::ordered_map::OrderedMap;
use crate::package_map::{is_token, PackageMap};
use crate::specification::{
    range_applies, CompilationKind, MachineSpecification, MultiApiLevelSpecification,
    TopLevelFlags,
};
use crate::synthetic::SyntheticKind;

type Object = Map<String, Value>;

/// Parses `text` and resolves it for a compilation with the given minimum API
/// level.
pub fn parse(
    table: &mut SymbolTable,
    text: &str,
    origin: Origin,
    min_api_level: u32,
    compilation: CompilationKind,
) -> Result<MachineSpecification> {
    let document = Document::read(text, origin)?;
    let top_level_flags = document.top_level_flags(text)?;
    let packages = document.package_map()?;
    let origin = &document.origin;

    let mut builder = RewritingFlagsBuilder::new();
    let mut applied = 0usize;
    for collection in [keys::COMMON_FLAGS, compilation.flags_key()] {
        for (range, rule_set) in document.rule_sets(collection)? {
            if !range_applies(&range, min_api_level, collection) {
                continue;
            }
            let mut decoder = SymbolDecoder::new(&mut *table, &packages, origin);
            parse_rule_set(&mut decoder, rule_set, &mut builder)?;
            applied += 1;
        }
    }
    let rewriting_flags = builder.build(table)?;

    tracing::info!(
        target: "dlspec.parser",
        origin = %origin,
        identifier = %top_level_flags.identifier,
        min_api_level,
        compilation = %compilation,
        rule_sets = applied,
        "parsed desugared library specification"
    );
    Ok(MachineSpecification::new(
        compilation,
        top_level_flags,
        rewriting_flags,
    ))
}

pub fn parse_path(
    table: &mut SymbolTable,
    path: impl AsRef<Path>,
    min_api_level: u32,
    compilation: CompilationKind,
) -> Result<MachineSpecification> {
    let path = path.as_ref();
    let text = read(path)?;
    parse(table, &text, Origin::path(path), min_api_level, compilation)
}

/// Parses every rule set of the document without range selection.
///
/// Rule sets of one collection that share a range are merged.
pub fn parse_multi_api_level(
    table: &mut SymbolTable,
    text: &str,
    origin: Origin,
) -> Result<MultiApiLevelSpecification> {
    let document = Document::read(text, origin)?;
    let top_level_flags = document.top_level_flags(text)?;
    let packages = document.package_map()?;

    let common = parse_collection(table, &document, &packages, keys::COMMON_FLAGS)?;
    let library = parse_collection(table, &document, &packages, keys::LIBRARY_FLAGS)?;
    let program = parse_collection(table, &document, &packages, keys::PROGRAM_FLAGS)?;

    tracing::info!(
        target: "dlspec.parser",
        origin = %document.origin,
        identifier = %top_level_flags.identifier,
        "parsed multi API level desugared library specification"
    );
    Ok(MultiApiLevelSpecification::new(
        document.origin,
        top_level_flags,
        common,
        library,
        program,
    ))
}

fn parse_collection(
    table: &mut SymbolTable,
    document: &Document,
    packages: &PackageMap,
    collection: &str,
) -> Result<BTreeMap<ApiLevelRange, RewritingFlags>> {
    let mut builders: BTreeMap<ApiLevelRange, RewritingFlagsBuilder> = BTreeMap::new();
    for (range, rule_set) in document.rule_sets(collection)? {
        if range.is_empty() {
            tracing::warn!(
                target: "dlspec.parser",
                collection,
                %range,
                "rule set window can never match any API level"
            );
        }
        let builder = builders.entry(range).or_default();
        let mut decoder = SymbolDecoder::new(&mut *table, packages, &document.origin);
        parse_rule_set(&mut decoder, rule_set, builder)?;
    }
    tracing::debug!(
        target: "dlspec.parser",
        collection,
        rule_sets = builders.len(),
        "parsed rule set collection"
    );
    builders
        .into_iter()
        .map(|(range, builder)| builder.build(table).map(|flags| (range, flags)))
        .collect()
}

pub fn parse_multi_api_level_path(
    table: &mut SymbolTable,
    path: impl AsRef<Path>,
) -> Result<MultiApiLevelSpecification> {
    let path = path.as_ref();
    let text = read(path)?;
    parse_multi_api_level(table, &text, Origin::path(path))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| SpecificationError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// A version-checked document.
struct Document {
    origin: Origin,
    root: Object,
}

impl Document {
    fn read(text: &str, origin: Origin) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|source| SpecificationError::Json {
            origin: origin.clone(),
            source,
        })?;
        let Value::Object(root) = value else {
            return Err(unexpected(&origin, "<document>", "a JSON object"));
        };

        let version = as_i64(
            &origin,
            required(&origin, &root, keys::CONFIGURATION_FORMAT_VERSION)?,
            keys::CONFIGURATION_FORMAT_VERSION,
        )?;
        if !(keys::MIN_SUPPORTED_VERSION..=keys::MAX_SUPPORTED_VERSION).contains(&version) {
            return Err(SpecificationError::UnsupportedVersion {
                origin,
                version,
                min: keys::MIN_SUPPORTED_VERSION,
                max: keys::MAX_SUPPORTED_VERSION,
            });
        }
        Ok(Self { origin, root })
    }

    fn required(&self, key: &str) -> Result<&Value> {
        required(&self.origin, &self.root, key)
    }

    fn top_level_flags(&self, text: &str) -> Result<TopLevelFlags> {
        let origin = &self.origin;
        let string = |key: &str| -> Result<String> {
            Ok(as_str(origin, self.required(key)?, key)?.to_string())
        };
        Ok(TopLevelFlags {
            identifier: string(keys::IDENTIFIER)?,
            required_compilation_api_level: as_u32(
                origin,
                self.required(keys::REQUIRED_COMPILATION_API_LEVEL)?,
                keys::REQUIRED_COMPILATION_API_LEVEL,
            )?,
            synthesized_library_classes_package_prefix: string(
                keys::SYNTHESIZED_LIBRARY_CLASSES_PACKAGE_PREFIX,
            )?,
            support_all_callbacks_from_library: as_bool(
                origin,
                self.required(keys::SUPPORT_ALL_CALLBACKS_FROM_LIBRARY)?,
                keys::SUPPORT_ALL_CALLBACKS_FROM_LIBRARY,
            )?,
            extra_keep_rules: string(keys::SHRINKER_CONFIG)?,
            json_source: Some(text.to_string()),
        })
    }

    /// Reads the package map in either orientation: the token-shaped side of
    /// each entry is the token.
    fn package_map(&self) -> Result<PackageMap> {
        let origin = &self.origin;
        let entries = as_object(origin, self.required(keys::PACKAGE_MAP)?, keys::PACKAGE_MAP)?;
        let mut packages = PackageMap::new();
        for (key, value) in entries {
            let value = as_str(origin, value, key)?;
            let (token, package) = if is_token(key) {
                (key.as_str(), value)
            } else if is_token(value) {
                (value, key.as_str())
            } else {
                return Err(unexpected(origin, key, "a package token such as `a$`"));
            };
            packages.insert(token, package, origin)?;
        }
        Ok(packages)
    }

    /// The rule sets of one collection, in document order.
    fn rule_sets(&self, collection: &str) -> Result<Vec<(ApiLevelRange, &Object)>> {
        let origin = &self.origin;
        as_array(origin, self.required(collection)?, collection)?
            .iter()
            .map(|rule_set| {
                let rule_set = as_object(origin, rule_set, collection)?;
                let below_or_equal = as_u32(
                    origin,
                    required(origin, rule_set, keys::API_LEVEL_BELOW_OR_EQUAL)?,
                    keys::API_LEVEL_BELOW_OR_EQUAL,
                )?;
                let greater_or_equal = rule_set
                    .get(keys::API_LEVEL_GREATER_OR_EQUAL)
                    .map(|value| as_u32(origin, value, keys::API_LEVEL_GREATER_OR_EQUAL))
                    .transpose()?;
                Ok((
                    ApiLevelRange::new(below_or_equal, greater_or_equal),
                    rule_set,
                ))
            })
            .collect()
    }
}

fn parse_rule_set(
    decoder: &mut SymbolDecoder<'_>,
    rule_set: &Object,
    builder: &mut RewritingFlagsBuilder,
) -> Result<()> {
    let origin = decoder.origin().clone();
    let origin = &origin;
    let object = |key: &str| -> Result<Option<&Object>> {
        rule_set
            .get(key)
            .map(|value| as_object(origin, value, key))
            .transpose()
    };
    let array = |key: &str| -> Result<Option<&Vec<Value>>> {
        rule_set
            .get(key)
            .map(|value| as_array(origin, value, key))
            .transpose()
    };

    if let Some(entries) = object(keys::REWRITE_TYPE)? {
        for (from, to) in entries {
            let from = decoder.ty(from)?;
            let to = decoder.ty(as_str(origin, to, keys::REWRITE_TYPE)?)?;
            builder.rewrite_type(from, to);
        }
    }
    if let Some(types) = array(keys::MAINTAIN_TYPE)? {
        for ty in types {
            let ty = decoder.ty(as_str(origin, ty, keys::MAINTAIN_TYPE)?)?;
            builder.maintain_type(ty);
        }
    }
    if let Some(entries) = object(keys::REWRITE_DERIVED_TYPE_ONLY)? {
        for (from, to) in entries {
            let from = decoder.ty(from)?;
            let to = decoder.ty(as_str(origin, to, keys::REWRITE_DERIVED_TYPE_ONLY)?)?;
            builder.rewrite_derived_type_only(from, to);
        }
    }
    if let Some(entries) = object(keys::STATIC_FIELD_RETARGET)? {
        for (from, to) in entries {
            let from = decoder.field(from)?;
            let to = decoder.field(as_str(origin, to, keys::STATIC_FIELD_RETARGET)?)?;
            builder.put_static_field_retarget(from, to);
        }
    }
    let method_maps: [(&str, fn(&mut RewritingFlagsBuilder, MethodId, MethodId)); 4] = [
        (
            keys::COVARIANT_RETARGET,
            RewritingFlagsBuilder::put_covariant_retarget,
        ),
        (keys::STATIC_RETARGET, RewritingFlagsBuilder::put_static_retarget),
        (
            keys::NON_EMULATED_VIRTUAL_RETARGET,
            RewritingFlagsBuilder::put_non_emulated_virtual_retarget,
        ),
        (
            keys::EMULATED_VIRTUAL_RETARGET_THROUGH_EMULATED_INTERFACE,
            RewritingFlagsBuilder::put_emulated_virtual_retarget_through_emulated_interface,
        ),
    ];
    for (key, put) in method_maps {
        if let Some(entries) = object(key)? {
            for (from, to) in entries {
                let from = decoder.method(from)?;
                let to = decoder.method(as_str(origin, to, key)?)?;
                put(builder, from, to);
            }
        }
    }
    if let Some(entries) = object(keys::EMULATED_VIRTUAL_RETARGET)? {
        for (method, descriptor) in entries {
            let method = decoder.method(method)?;
            let descriptor = emulated_dispatch(decoder, descriptor)?;
            builder.put_emulated_virtual_retarget(method, descriptor);
        }
    }
    if let Some(entries) = object(keys::API_GENERIC_TYPES_CONVERSION)? {
        for (method, conversions) in entries {
            let method = decoder.method(method)?;
            let conversions = as_array(origin, conversions, keys::API_GENERIC_TYPES_CONVERSION)?
                .iter()
                .map(|slot| match as_str(origin, slot, keys::API_GENERIC_TYPES_CONVERSION)? {
                    "" => Ok(None),
                    conversion => decoder.method(conversion).map(Some),
                })
                .collect::<Result<Vec<_>>>()?;
            builder.add_api_generic_types_conversion(method, conversions);
        }
    }
    if let Some(entries) = object(keys::EMULATED_INTERFACE)? {
        for (ty, descriptor) in entries {
            let ty = decoder.ty(ty)?;
            let descriptor = emulated_interface(decoder, descriptor)?;
            builder.put_emulated_interface(ty, descriptor);
        }
    }
    if let Some(entries) = object(keys::WRAPPER)? {
        for (ty, descriptor) in entries {
            let ty = decoder.ty(ty)?;
            let descriptor = wrapper(decoder, descriptor)?;
            builder.add_wrapper(ty, descriptor);
        }
    }
    if let Some(entries) = object(keys::LEGACY_BACKPORT)? {
        for (from, to) in entries {
            let from = decoder.ty(from)?;
            let to = decoder.ty(as_str(origin, to, keys::LEGACY_BACKPORT)?)?;
            builder.put_legacy_backport(from, to);
        }
    }
    if let Some(types) = array(keys::DONT_RETARGET)? {
        for ty in types {
            let ty = decoder.ty(as_str(origin, ty, keys::DONT_RETARGET)?)?;
            builder.add_dont_retarget(ty);
        }
    }
    if let Some(entries) = object(keys::CUSTOM_CONVERSION)? {
        for (ty, descriptor) in entries {
            let ty = decoder.ty(ty)?;
            let [to, from] = array_of_size::<2>(
                origin,
                descriptor,
                keys::CUSTOM_CONVERSION,
                "custom conversion descriptor",
            )?;
            let to = decoder.method(as_str(origin, to, keys::CUSTOM_CONVERSION)?)?;
            let from = decoder.method(as_str(origin, from, keys::CUSTOM_CONVERSION)?)?;
            let descriptor = CustomConversionDescriptor::new(&*decoder.table, to, from)?;
            builder.put_custom_conversion(ty, descriptor);
        }
    }
    if let Some(members) = array(keys::AMEND_LIBRARY_METHOD)? {
        for member in members {
            let (method, flags) =
                decoder.amended_method(as_str(origin, member, keys::AMEND_LIBRARY_METHOD)?)?;
            builder.amend_library_method(method, flags);
        }
    }
    if let Some(members) = array(keys::AMEND_LIBRARY_FIELD)? {
        for member in members {
            let (field, flags) =
                decoder.amended_field(as_str(origin, member, keys::AMEND_LIBRARY_FIELD)?)?;
            builder.amend_library_field(field, flags);
        }
    }
    Ok(())
}

/// `[method, kindId]`; `-1` means no holder kind. The id may be written as a
/// number or as a decimal string.
fn derived_method(decoder: &mut SymbolDecoder<'_>, value: &Value) -> Result<DerivedMethod> {
    let origin = decoder.origin().clone();
    let [method, kind] = array_of_size::<2>(&origin, value, "derived method", "derived method")?;
    let method = decoder.method(as_str(&origin, method, "derived method")?)?;
    let id = match kind {
        Value::String(id) => id
            .trim()
            .parse::<i64>()
            .map_err(|_| unexpected(&origin, id, "a synthetic kind id"))?,
        other => as_i64(&origin, other, "derived method")?,
    };
    if id == -1 {
        return Ok(DerivedMethod::new(method));
    }
    let kind =
        SyntheticKind::from_id(id).ok_or(SpecificationError::UnknownSyntheticKind { origin, id })?;
    Ok(DerivedMethod::with_holder_kind(method, kind))
}

/// `[interfaceMethod, emulatedDispatchMethod, forwardingMethod, {type: derived}]`.
fn emulated_dispatch(
    decoder: &mut SymbolDecoder<'_>,
    value: &Value,
) -> Result<EmulatedDispatchMethodDescriptor> {
    let origin = decoder.origin().clone();
    let [interface_method, emulated_dispatch_method, forwarding_method, cases] =
        array_of_size::<4>(
            &origin,
            value,
            keys::EMULATED_VIRTUAL_RETARGET,
            "emulated dispatch descriptor",
        )?;
    let interface_method = derived_method(decoder, interface_method)?;
    let emulated_dispatch_method = derived_method(decoder, emulated_dispatch_method)?;
    let forwarding_method = derived_method(decoder, forwarding_method)?;
    let mut dispatch_cases: OrderedMap<TypeId, DerivedMethod> = OrderedMap::new();
    for (ty, method) in as_object(&origin, cases, "dispatch cases")? {
        let ty = decoder.ty(ty)?;
        dispatch_cases.insert(ty, derived_method(decoder, method)?);
    }
    Ok(EmulatedDispatchMethodDescriptor::new(
        interface_method,
        emulated_dispatch_method,
        forwarding_method,
        dispatch_cases,
    ))
}

/// `[rewrittenType, {method: emulatedDispatchDescriptor}]`.
fn emulated_interface(
    decoder: &mut SymbolDecoder<'_>,
    value: &Value,
) -> Result<EmulatedInterfaceDescriptor> {
    let origin = decoder.origin().clone();
    let [rewritten_type, methods] = array_of_size::<2>(
        &origin,
        value,
        keys::EMULATED_INTERFACE,
        "emulated interface descriptor",
    )?;
    let rewritten_type = decoder.ty(as_str(&origin, rewritten_type, keys::EMULATED_INTERFACE)?)?;
    let mut emulated_methods = IndexMap::new();
    for (method, descriptor) in as_object(&origin, methods, keys::EMULATED_INTERFACE)? {
        let method = decoder.method(method)?;
        emulated_methods.insert(method, emulated_dispatch(decoder, descriptor)?);
    }
    Ok(EmulatedInterfaceDescriptor::new(
        rewritten_type,
        emulated_methods,
    ))
}

/// `[[method], nonPublicAccess, [subwrapperType]]`.
fn wrapper(decoder: &mut SymbolDecoder<'_>, value: &Value) -> Result<WrapperDescriptor> {
    let origin = decoder.origin().clone();
    let [methods, non_public_access, subwrappers] =
        array_of_size::<3>(&origin, value, keys::WRAPPER, "wrapper descriptor")?;
    let methods = as_array(&origin, methods, keys::WRAPPER)?
        .iter()
        .map(|method| decoder.method(as_str(&origin, method, keys::WRAPPER)?))
        .collect::<Result<Vec<_>>>()?;
    let non_public_access = as_bool(&origin, non_public_access, keys::WRAPPER)?;
    let subwrappers = as_array(&origin, subwrappers, keys::WRAPPER)?
        .iter()
        .map(|ty| decoder.ty(as_str(&origin, ty, keys::WRAPPER)?))
        .collect::<Result<Vec<_>>>()?;
    Ok(WrapperDescriptor::new(methods, subwrappers, non_public_access))
}

fn unexpected(origin: &Origin, context: &str, expected: &'static str) -> SpecificationError {
    SpecificationError::UnexpectedValue {
        origin: origin.clone(),
        context: context.to_string(),
        expected,
    }
}

fn required<'v>(origin: &Origin, object: &'v Object, key: &str) -> Result<&'v Value> {
    object.get(key).ok_or_else(|| SpecificationError::MissingKey {
        origin: origin.clone(),
        key: key.to_string(),
    })
}

fn as_object<'v>(origin: &Origin, value: &'v Value, context: &str) -> Result<&'v Object> {
    value
        .as_object()
        .ok_or_else(|| unexpected(origin, context, "a JSON object"))
}

fn as_array<'v>(origin: &Origin, value: &'v Value, context: &str) -> Result<&'v Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| unexpected(origin, context, "a JSON array"))
}

fn as_str<'v>(origin: &Origin, value: &'v Value, context: &str) -> Result<&'v str> {
    value
        .as_str()
        .ok_or_else(|| unexpected(origin, context, "a string"))
}

fn as_bool(origin: &Origin, value: &Value, context: &str) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| unexpected(origin, context, "a boolean"))
}

fn as_i64(origin: &Origin, value: &Value, context: &str) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| unexpected(origin, context, "an integer"))
}

fn as_u32(origin: &Origin, value: &Value, context: &str) -> Result<u32> {
    value
        .as_u64()
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| unexpected(origin, context, "an API level"))
}

/// An array that must have exactly `N` elements.
fn array_of_size<'v, const N: usize>(
    origin: &Origin,
    value: &'v Value,
    context: &str,
    description: &'static str,
) -> Result<&'v [Value; N]> {
    let array = as_array(origin, value, context)?;
    <&[Value; N]>::try_from(array.as_slice()).map_err(|_| SpecificationError::ArraySize {
        origin: origin.clone(),
        description,
        size: array.len(),
    })
}
