//! Stable table of synthetic kinds.
//!
//! Kind ids are persisted in specification documents (see
//! [`crate::DerivedMethod`]). They are assigned densely starting at 1 and must
//! never be renumbered: new kinds are appended at the end of [`ALL_KINDS`].

use dlspec_symbols::{SymbolTable, TypeId};

use crate::error::{Result, SpecificationError};

/// How a synthetic kind names the items it produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntheticShape {
    /// The context type itself is the synthetic (global type namespace).
    Global,
    /// Global, but only ever present on the classpath.
    GlobalClasspath,
    /// `<context><suffix>`; one synthetic per context.
    FixedSuffix,
    /// Locally generated class, numbered per context.
    InstanceClass { shareable: bool },
    /// A class holding a single generated method.
    SingleMethod { global_merging: bool },
}

macro_rules! synthetic_kinds {
    ($($variant:ident = $id:literal, $shape:expr, $descriptor:literal;)*) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum SyntheticKind {
            $($variant,)*
        }

        /// Every kind, indexed by `id - 1`.
        pub const ALL_KINDS: &[SyntheticKind] = &[$(SyntheticKind::$variant,)*];

        impl SyntheticKind {
            pub const fn id(self) -> u32 {
                match self {
                    $(SyntheticKind::$variant => $id,)*
                }
            }

            pub const fn shape(self) -> SyntheticShape {
                match self {
                    $(SyntheticKind::$variant => $shape,)*
                }
            }

            /// Name fragment the kind contributes to synthesized type names.
            pub const fn descriptor(self) -> &'static str {
                match self {
                    $(SyntheticKind::$variant => $descriptor,)*
                }
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $(SyntheticKind::$variant => stringify!($variant),)*
                }
            }
        }
    };
}

use SyntheticShape::{FixedSuffix, Global, GlobalClasspath, InstanceClass, SingleMethod};

synthetic_kinds! {
    RecordTag = 1, Global, "";
    ApiModelStub = 2, Global, "";
    MethodHandlesLookup = 3, Global, "";
    VarHandle = 4, Global, "";
    GenericApiConversionStub = 5, GlobalClasspath, "";
    RetargetStub = 6, GlobalClasspath, "";
    EmulatedInterfaceMarkerClass = 7, GlobalClasspath, "";
    EnumUnboxingLocalUtilityClass = 8, FixedSuffix, "$EnumUnboxingLocalUtility";
    EnumUnboxingSharedUtilityClass = 9, FixedSuffix, "$EnumUnboxingSharedUtility";
    CompanionClass = 10, FixedSuffix, "$-CC";
    EmulatedInterfaceClass = 11, FixedSuffix, "$-EL";
    RetargetClass = 12, FixedSuffix, "RetargetClass";
    RetargetInterface = 13, FixedSuffix, "RetargetInterface";
    Wrapper = 14, FixedSuffix, "$Wrapper";
    VivifiedWrapper = 15, FixedSuffix, "$VivifiedWrapper";
    InitTypeArgument = 16, FixedSuffix, "-IA";
    HorizontalInitTypeArgument1 = 17, FixedSuffix, "$$IA$1";
    HorizontalInitTypeArgument2 = 18, FixedSuffix, "$$IA$2";
    HorizontalInitTypeArgument3 = 19, FixedSuffix, "$$IA$3";
    EnumConversion = 20, FixedSuffix, "$EnumConversion";
    Lambda = 21, InstanceClass { shareable: true }, "Lambda";
    ThreadLocal = 22, InstanceClass { shareable: true }, "ThreadLocal";
    SharedSuperClass = 23, InstanceClass { shareable: false }, "SharedSuper";
    NonFixedInitTypeArgument = 24, InstanceClass { shareable: false }, "$IA";
    ConstDynamic = 25, InstanceClass { shareable: false }, "$Condy";
    EnumUnboxingCheckNotZeroMethod = 26, SingleMethod { global_merging: true }, "CheckNotZero";
    RecordHelper = 27, SingleMethod { global_merging: true }, "Record";
    Backport = 28, SingleMethod { global_merging: true }, "Backport";
    BackportWithForwarding = 29, SingleMethod { global_merging: false }, "BackportWithForwarding";
    StaticInterfaceCall = 30, SingleMethod { global_merging: false }, "StaticInterfaceCall";
    ToStringIfNotNull = 31, SingleMethod { global_merging: true }, "ToStringIfNotNull";
    ThrowCceIfNotNull = 32, SingleMethod { global_merging: true }, "ThrowCCEIfNotNull";
    ThrowIae = 33, SingleMethod { global_merging: true }, "ThrowIAE";
    ThrowIcce = 34, SingleMethod { global_merging: true }, "ThrowICCE";
    ThrowNsme = 35, SingleMethod { global_merging: true }, "ThrowNSME";
    ThrowRte = 36, SingleMethod { global_merging: true }, "ThrowRTE";
    TwrCloseResource = 37, SingleMethod { global_merging: true }, "TwrCloseResource";
    ServiceLoader = 38, SingleMethod { global_merging: true }, "ServiceLoad";
    Outline = 39, SingleMethod { global_merging: false }, "Outline";
    CovariantOutline = 40, SingleMethod { global_merging: false }, "CovariantOutline";
    ApiConversion = 41, SingleMethod { global_merging: false }, "APIConversion";
    ApiConversionParameters = 42, SingleMethod { global_merging: false }, "APIConversionParameters";
    CollectionConversion = 43, SingleMethod { global_merging: false }, "$CollectionConversion";
    ApiModelOutline = 44, SingleMethod { global_merging: true }, "ApiModelOutline";
    ApiModelOutlineWithoutGlobalMerging = 45, SingleMethod { global_merging: false }, "ApiModelOutline";
    DesugaredLibraryBridge = 46, SingleMethod { global_merging: false }, "DesugaredLibraryBridge";
}

impl SyntheticKind {
    /// Resolves a persisted id. Ids outside the table are unknown.
    pub fn from_id(id: i64) -> Option<Self> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        ALL_KINDS.get(index).copied()
    }

    pub fn is_fixed_suffix(self) -> bool {
        matches!(
            self.shape(),
            SyntheticShape::FixedSuffix | SyntheticShape::Global | SyntheticShape::GlobalClasspath
        )
    }

    pub fn is_global(self) -> bool {
        matches!(
            self.shape(),
            SyntheticShape::Global | SyntheticShape::GlobalClasspath
        )
    }
}

/// Computes the holder type of a synthetic derived from a context type.
///
/// The naming of synthetics is owned by the compiler; the specification only
/// records `(context, kind)` pairs.
pub trait SyntheticNaming {
    fn derive_holder(
        &self,
        table: &mut SymbolTable,
        context: TypeId,
        kind: SyntheticKind,
    ) -> Result<TypeId>;
}

/// Naming for kinds whose holder is a pure function of the context: global
/// kinds reuse the context and fixed-suffix kinds append their suffix to the
/// context's binary name.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedSuffixNaming;

impl SyntheticNaming for FixedSuffixNaming {
    fn derive_holder(
        &self,
        table: &mut SymbolTable,
        context: TypeId,
        kind: SyntheticKind,
    ) -> Result<TypeId> {
        let unsupported = |table: &SymbolTable| SpecificationError::UnsupportedHolderKind {
            kind: kind.name(),
            context: table.java_name(context),
        };
        if kind.is_global() {
            return Ok(context);
        }
        if kind.shape() != SyntheticShape::FixedSuffix {
            return Err(unsupported(table));
        }
        let Some(internal) = table.internal_name(context) else {
            return Err(unsupported(table));
        };
        let descriptor = format!("L{internal}{};", kind.descriptor());
        table
            .intern_descriptor(&descriptor)
            .map_err(|_| unsupported(table))
    }
}
