//! Machine-readable desugared library specifications.
//!
//! A specification document lists rule sets keyed by API level range. For a
//! given compilation the applicable rule sets are merged into one
//! [`RewritingFlags`] that tells the rewriting passes which library types,
//! methods and fields to redirect to their backports.

#![forbid(unsafe_code)]

mod api_level;
mod descriptors;
mod error;
mod exporter;
mod flags;
pub mod keys;
mod member;
mod ordered_map;
mod package_map;
mod parser;
mod specification;
mod synthetic;

pub use crate::api_level::{emission_order, ApiLevelRange};
pub use crate::descriptors::{
    CallSite, CustomConversionDescriptor, DerivedMethod, DispatchStep,
    EmulatedDispatchMethodDescriptor, EmulatedInterfaceDescriptor, SpecificationDescriptor,
    WrapperDescriptor,
};
pub use crate::error::{Origin, Result, SpecificationError};
pub use crate::exporter::{export, export_resolved, export_to_string};
pub use crate::flags::{RewritingFlags, RewritingFlagsBuilder, RuleCategory};
pub use crate::ordered_map::OrderedMap;
pub use crate::package_map::{is_token, PackageMap, TokenAllocator, TOKEN_ALPHABET};
pub use crate::parser::{parse, parse_multi_api_level, parse_multi_api_level_path, parse_path};
pub use crate::specification::{
    CompilationKind, MachineSpecification, MultiApiLevelSpecification, TopLevelFlags,
};
pub use crate::synthetic::{
    FixedSuffixNaming, SyntheticKind, SyntheticNaming, SyntheticShape, ALL_KINDS,
};

pub use dlspec_symbols::{FieldId, MethodId, SymbolTable, TypeId};
