use std::collections::BTreeMap;
use std::fmt;

use dlspec_symbols::SymbolTable;

use crate::api_level::{emission_order, ApiLevelRange};
use crate::error::{Origin, Result};
use crate::flags::{RewritingFlags, RewritingFlagsBuilder};
use crate::keys;

/// Whether the desugared library itself or a program using it is compiled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompilationKind {
    #[default]
    Program,
    Library,
}

impl CompilationKind {
    pub fn is_library(self) -> bool {
        self == CompilationKind::Library
    }

    /// The document key of the rule sets specific to this kind.
    pub fn flags_key(self) -> &'static str {
        match self {
            CompilationKind::Program => keys::PROGRAM_FLAGS,
            CompilationKind::Library => keys::LIBRARY_FLAGS,
        }
    }
}

impl fmt::Display for CompilationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompilationKind::Program => "program",
            CompilationKind::Library => "library",
        })
    }
}

/// Document-wide settings that do not depend on the API level.
///
/// `json_source` keeps the text the flags were parsed from; it does not take
/// part in equality.
#[derive(Clone, Debug, Default)]
pub struct TopLevelFlags {
    pub identifier: String,
    pub required_compilation_api_level: u32,
    pub synthesized_library_classes_package_prefix: String,
    pub support_all_callbacks_from_library: bool,
    pub extra_keep_rules: String,
    pub json_source: Option<String>,
}

impl PartialEq for TopLevelFlags {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.required_compilation_api_level == other.required_compilation_api_level
            && self.synthesized_library_classes_package_prefix
                == other.synthesized_library_classes_package_prefix
            && self.support_all_callbacks_from_library == other.support_all_callbacks_from_library
            && self.extra_keep_rules == other.extra_keep_rules
    }
}

impl Eq for TopLevelFlags {}

/// The effective rules of one compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineSpecification {
    compilation: CompilationKind,
    top_level_flags: TopLevelFlags,
    rewriting_flags: RewritingFlags,
}

impl MachineSpecification {
    pub fn new(
        compilation: CompilationKind,
        top_level_flags: TopLevelFlags,
        rewriting_flags: RewritingFlags,
    ) -> Self {
        Self {
            compilation,
            top_level_flags,
            rewriting_flags,
        }
    }

    pub fn compilation_kind(&self) -> CompilationKind {
        self.compilation
    }

    pub fn is_library_compilation(&self) -> bool {
        self.compilation.is_library()
    }

    pub fn top_level_flags(&self) -> &TopLevelFlags {
        &self.top_level_flags
    }

    pub fn rewriting_flags(&self) -> &RewritingFlags {
        &self.rewriting_flags
    }

    pub fn identifier(&self) -> &str {
        &self.top_level_flags.identifier
    }

    pub fn synthesized_library_classes_package_prefix(&self) -> &str {
        &self.top_level_flags.synthesized_library_classes_package_prefix
    }

    pub fn required_compilation_api_level(&self) -> u32 {
        self.top_level_flags.required_compilation_api_level
    }

    pub fn support_all_callbacks_from_library(&self) -> bool {
        self.top_level_flags.support_all_callbacks_from_library
    }

    pub fn extra_keep_rules(&self) -> &str {
        &self.top_level_flags.extra_keep_rules
    }

    pub fn is_empty(&self) -> bool {
        self.rewriting_flags.is_empty()
    }

    /// See [`RewritingFlags::with_post_prefix`]. Top-level flags are kept.
    pub fn with_post_prefix(
        &self,
        table: &mut SymbolTable,
        old_prefix: &str,
        new_prefix: &str,
    ) -> Result<Self> {
        Ok(Self {
            rewriting_flags: self
                .rewriting_flags
                .with_post_prefix(table, old_prefix, new_prefix)?,
            ..self.clone()
        })
    }
}

/// Whether a rule set stored under `range` applies to a compilation whose
/// minimum API level is `level`.
pub(crate) fn range_applies(range: &ApiLevelRange, level: u32, collection: &str) -> bool {
    if range.is_empty() {
        tracing::warn!(
            target: "dlspec.parser",
            collection,
            %range,
            "rule set window can never match any API level"
        );
    }
    let applies = range.matches(level);
    tracing::debug!(
        target: "dlspec.parser",
        collection,
        %range,
        min_api_level = level,
        applies,
        "range gating"
    );
    applies
}

/// The whole rule database, keyed by API level range.
///
/// Equality ignores the origin.
#[derive(Clone, Debug, Default)]
pub struct MultiApiLevelSpecification {
    origin: Origin,
    top_level_flags: TopLevelFlags,
    common_flags: BTreeMap<ApiLevelRange, RewritingFlags>,
    library_flags: BTreeMap<ApiLevelRange, RewritingFlags>,
    program_flags: BTreeMap<ApiLevelRange, RewritingFlags>,
}

impl PartialEq for MultiApiLevelSpecification {
    fn eq(&self, other: &Self) -> bool {
        self.top_level_flags == other.top_level_flags
            && self.common_flags == other.common_flags
            && self.library_flags == other.library_flags
            && self.program_flags == other.program_flags
    }
}

impl Eq for MultiApiLevelSpecification {}

impl MultiApiLevelSpecification {
    pub fn new(
        origin: Origin,
        top_level_flags: TopLevelFlags,
        common_flags: BTreeMap<ApiLevelRange, RewritingFlags>,
        library_flags: BTreeMap<ApiLevelRange, RewritingFlags>,
        program_flags: BTreeMap<ApiLevelRange, RewritingFlags>,
    ) -> Self {
        Self {
            origin,
            top_level_flags,
            common_flags,
            library_flags,
            program_flags,
        }
    }

    /// Wraps a resolved specification as a document with a single common
    /// rule set that applies at every API level.
    pub fn from_resolved(origin: Origin, specification: &MachineSpecification) -> Self {
        Self {
            origin,
            top_level_flags: specification.top_level_flags().clone(),
            common_flags: BTreeMap::from([(
                ApiLevelRange::unbounded(),
                specification.rewriting_flags().clone(),
            )]),
            library_flags: BTreeMap::new(),
            program_flags: BTreeMap::new(),
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn top_level_flags(&self) -> &TopLevelFlags {
        &self.top_level_flags
    }

    pub fn common_flags(&self) -> &BTreeMap<ApiLevelRange, RewritingFlags> {
        &self.common_flags
    }

    pub fn library_flags(&self) -> &BTreeMap<ApiLevelRange, RewritingFlags> {
        &self.library_flags
    }

    pub fn program_flags(&self) -> &BTreeMap<ApiLevelRange, RewritingFlags> {
        &self.program_flags
    }

    pub fn flags_for(&self, compilation: CompilationKind) -> &BTreeMap<ApiLevelRange, RewritingFlags> {
        match compilation {
            CompilationKind::Program => &self.program_flags,
            CompilationKind::Library => &self.library_flags,
        }
    }

    /// Every distinct range of the document, most recent first.
    pub fn ranges(&self) -> Vec<ApiLevelRange> {
        let mut ranges = emission_order(
            self.common_flags
                .keys()
                .chain(self.library_flags.keys())
                .chain(self.program_flags.keys()),
        );
        ranges.dedup();
        ranges
    }

    /// Merges every common and `compilation` specific rule set whose range
    /// matches `min_api_level`, in document order.
    pub fn resolve(
        &self,
        table: &SymbolTable,
        min_api_level: u32,
        compilation: CompilationKind,
    ) -> Result<MachineSpecification> {
        let mut builder = RewritingFlagsBuilder::new();
        let collections = [
            (keys::COMMON_FLAGS, &self.common_flags),
            (compilation.flags_key(), self.flags_for(compilation)),
        ];
        for (collection, rule_sets) in collections {
            for (range, flags) in rule_sets.iter().rev() {
                if range_applies(range, min_api_level, collection) {
                    builder.extend_from(flags);
                }
            }
        }
        let rewriting_flags = builder.build(table)?;
        Ok(MachineSpecification::new(
            compilation,
            self.top_level_flags.clone(),
            rewriting_flags,
        ))
    }
}
