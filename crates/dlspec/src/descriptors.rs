//! Value objects describing individual rewriting rules.
//!
//! Descriptors hold symbol handles only; they never point back into the rule
//! set that contains them and can be freely cloned and shared.

use dlspec_symbols::{MethodId, SymbolTable, TypeId};
use indexmap::IndexMap;

use crate::error::{Result, SpecificationError};
use crate::ordered_map::OrderedMap;
use crate::synthetic::{SyntheticKind, SyntheticNaming};

/// A method whose holder may have to be synthesized.
///
/// Without a holder kind the method is used verbatim. With one, the method's
/// holder is only the *context* from which the synthetic holder is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DerivedMethod {
    method: MethodId,
    holder_kind: Option<SyntheticKind>,
}

impl DerivedMethod {
    pub fn new(method: MethodId) -> Self {
        Self {
            method,
            holder_kind: None,
        }
    }

    pub fn with_holder_kind(method: MethodId, holder_kind: SyntheticKind) -> Self {
        Self {
            method,
            holder_kind: Some(holder_kind),
        }
    }

    pub fn method(&self) -> MethodId {
        self.method
    }

    pub fn holder_kind(&self) -> Option<SyntheticKind> {
        self.holder_kind
    }

    /// The method's holder: the concrete holder for plain methods, the
    /// synthetic context otherwise.
    pub fn holder_context(&self, table: &SymbolTable) -> TypeId {
        table.method_holder(self.method)
    }

    /// Computes the concrete method, deriving the holder through `naming`
    /// when a holder kind is present.
    pub fn resolve(
        &self,
        table: &mut SymbolTable,
        naming: &impl SyntheticNaming,
    ) -> Result<MethodId> {
        let Some(kind) = self.holder_kind else {
            return Ok(self.method);
        };
        let context = table.method_holder(self.method);
        let holder = naming.derive_holder(table, context, kind)?;
        Ok(table.method_with_holder(self.method, holder))
    }

    pub(crate) fn map_method(&self, f: impl FnOnce(MethodId) -> MethodId) -> Self {
        Self {
            method: f(self.method),
            holder_kind: self.holder_kind,
        }
    }
}

/// How a call site consumes an emulated dispatch descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallSite {
    /// A regular `invoke-virtual`/`invoke-interface`.
    Virtual,
    /// An `invoke-super` targeting the emulated method.
    Super,
    /// A forwarding bridge generated for a default method.
    DefaultMethodBridge,
}

/// One step of the generated dispatch chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchStep<'a> {
    /// `receiver instanceof interface` then `invoke-interface method`.
    InterfaceCall {
        interface: TypeId,
        method: &'a DerivedMethod,
    },
    /// `receiver instanceof ty` then `invoke-static method`.
    TypeCase {
        ty: TypeId,
        method: &'a DerivedMethod,
    },
    /// Unconditional `invoke-static` of the forwarding method.
    Fallback(&'a DerivedMethod),
}

impl<'a> DispatchStep<'a> {
    pub fn method(&self) -> &'a DerivedMethod {
        match self {
            DispatchStep::InterfaceCall { method, .. } | DispatchStep::TypeCase { method, .. } => {
                method
            }
            DispatchStep::Fallback(method) => method,
        }
    }

    /// The type tested before taking this step; `None` for the fallback.
    pub fn guard(&self) -> Option<TypeId> {
        match self {
            DispatchStep::InterfaceCall { interface, .. } => Some(*interface),
            DispatchStep::TypeCase { ty, .. } => Some(*ty),
            DispatchStep::Fallback(_) => None,
        }
    }
}

/// A synthesized dispatch point for an interface method whose implementation
/// depends on the runtime type of the receiver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmulatedDispatchMethodDescriptor {
    interface_method: DerivedMethod,
    emulated_dispatch_method: DerivedMethod,
    forwarding_method: DerivedMethod,
    dispatch_cases: OrderedMap<TypeId, DerivedMethod>,
}

impl EmulatedDispatchMethodDescriptor {
    pub fn new(
        interface_method: DerivedMethod,
        emulated_dispatch_method: DerivedMethod,
        forwarding_method: DerivedMethod,
        dispatch_cases: OrderedMap<TypeId, DerivedMethod>,
    ) -> Self {
        Self {
            interface_method,
            emulated_dispatch_method,
            forwarding_method,
            dispatch_cases,
        }
    }

    pub fn interface_method(&self) -> &DerivedMethod {
        &self.interface_method
    }

    pub fn emulated_dispatch_method(&self) -> &DerivedMethod {
        &self.emulated_dispatch_method
    }

    pub fn forwarding_method(&self) -> &DerivedMethod {
        &self.forwarding_method
    }

    /// Cases in evaluation order; the first matching type wins.
    pub fn dispatch_cases(&self) -> &OrderedMap<TypeId, DerivedMethod> {
        &self.dispatch_cases
    }

    /// The method a call site is redirected to.
    pub fn target_for(&self, call_site: CallSite) -> &DerivedMethod {
        match call_site {
            CallSite::Virtual => &self.emulated_dispatch_method,
            CallSite::Super | CallSite::DefaultMethodBridge => &self.forwarding_method,
        }
    }

    /// The type-test chain the emulated dispatch method performs.
    pub fn dispatch_plan(&self, table: &SymbolTable) -> Vec<DispatchStep<'_>> {
        let mut plan = Vec::with_capacity(self.dispatch_cases.len() + 2);
        plan.push(DispatchStep::InterfaceCall {
            interface: self.interface_method.holder_context(table),
            method: &self.interface_method,
        });
        plan.extend(
            self.dispatch_cases
                .iter()
                .map(|(ty, method)| DispatchStep::TypeCase { ty: *ty, method }),
        );
        plan.push(DispatchStep::Fallback(&self.forwarding_method));
        plan
    }

    /// Evaluates the dispatch chain for a receiver described by `is_instance`.
    pub fn select_case(
        &self,
        table: &SymbolTable,
        mut is_instance: impl FnMut(TypeId) -> bool,
    ) -> DispatchStep<'_> {
        self.dispatch_plan(table)
            .into_iter()
            .find(|step| step.guard().map_or(true, &mut is_instance))
            .unwrap_or(DispatchStep::Fallback(&self.forwarding_method))
    }

    pub(crate) fn with_interface_method(&self, interface_method: DerivedMethod) -> Self {
        Self {
            interface_method,
            ..self.clone()
        }
    }
}

/// An interface whose methods are dispatched through emulated dispatch points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmulatedInterfaceDescriptor {
    rewritten_type: TypeId,
    emulated_methods: IndexMap<MethodId, EmulatedDispatchMethodDescriptor>,
}

impl EmulatedInterfaceDescriptor {
    pub fn new(
        rewritten_type: TypeId,
        emulated_methods: IndexMap<MethodId, EmulatedDispatchMethodDescriptor>,
    ) -> Self {
        Self {
            rewritten_type,
            emulated_methods,
        }
    }

    pub fn rewritten_type(&self) -> TypeId {
        self.rewritten_type
    }

    pub fn emulated_methods(&self) -> &IndexMap<MethodId, EmulatedDispatchMethodDescriptor> {
        &self.emulated_methods
    }
}

/// A generated adapter class wrapping a library type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WrapperDescriptor {
    methods: Vec<MethodId>,
    subwrappers: Vec<TypeId>,
    non_public_access: bool,
}

impl WrapperDescriptor {
    pub fn new(methods: Vec<MethodId>, subwrappers: Vec<TypeId>, non_public_access: bool) -> Self {
        Self {
            methods,
            subwrappers,
            non_public_access,
        }
    }

    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    /// Wrappers of related types that must be generated alongside this one.
    pub fn subwrappers(&self) -> &[TypeId] {
        &self.subwrappers
    }

    pub fn has_non_public_access(&self) -> bool {
        self.non_public_access
    }
}

/// A pair of inverse single-argument conversions between a platform type and
/// its desugared counterpart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CustomConversionDescriptor {
    to: MethodId,
    from: MethodId,
}

impl CustomConversionDescriptor {
    /// Fails unless `to` and `from` are single-argument methods whose return
    /// type is the other's parameter type.
    pub fn new(table: &SymbolTable, to: MethodId, from: MethodId) -> Result<Self> {
        let inverse = table.method_parameters(to).len() == 1
            && table.method_parameters(from).len() == 1
            && table.method_parameter(from, 0) == Some(table.method_return_type(to))
            && table.method_parameter(to, 0) == Some(table.method_return_type(from));
        if !inverse {
            return Err(SpecificationError::InvalidCustomConversion {
                to: table.display_method(to),
                from: table.display_method(from),
            });
        }
        Ok(Self { to, from })
    }

    pub fn to(&self) -> MethodId {
        self.to
    }

    pub fn from(&self) -> MethodId {
        self.from
    }
}

/// Every descriptor kind, for code that has to treat them uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecificationDescriptor<'a> {
    CustomConversion(&'a CustomConversionDescriptor),
    DerivedMethod(&'a DerivedMethod),
    EmulatedDispatch(&'a EmulatedDispatchMethodDescriptor),
    EmulatedInterface(&'a EmulatedInterfaceDescriptor),
    Wrapper(&'a WrapperDescriptor),
}
