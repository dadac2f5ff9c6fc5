//! Type identities and the nominal subtype lattice.
//!
//! A [`TypeIdentity`] is the stable identity of a parametric family of
//! types: every instantiation of the same family (e.g. `List{Int}` and
//! `List{Str}`) shares one identity. Identities are created once, when the
//! family is declared, and live for the rest of the process.
//!
//! Subtyping is nominal: each identity has at most one declared abstract
//! supertype, and chains terminate at `Any`, the explicit top element of
//! the lattice. `Any` is an ordinary identity rather than an absence of a
//! type, so applicability and specificity checks have a single uniform
//! code path with no null-checks.

use std::sync::OnceLock;

use string_interner::DefaultSymbol;

use crate::dispatch::MethodTable;
use crate::registry::Runtime;
use crate::value::Value;

/// Index of a [`TypeIdentity`] in the process-wide registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// The raw registry index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Stable identity for a parametric family of types.
///
/// Owns exactly one [`MethodTable`] (created with the identity, so a call
/// against a type that never defined a method finds an empty table and
/// fails with `NoMethod` rather than a missing-table special case).
pub struct TypeIdentity {
    id: TypeId,
    name: DefaultSymbol,
    arity: usize,
    supertype: Option<TypeId>,
    /// Field names, for record-like identities (closure captures).
    fields: Vec<DefaultSymbol>,
    pub(crate) table: MethodTable,
    /// Lazily created keyword-sorter function for function identities
    /// that have at least one keyword-bearing method.
    pub(crate) keyword_sorter: OnceLock<Value>,
}

impl TypeIdentity {
    pub(crate) fn new(
        id: TypeId,
        name: DefaultSymbol,
        arity: usize,
        supertype: Option<TypeId>,
        fields: Vec<DefaultSymbol>,
    ) -> Self {
        Self {
            id,
            name,
            arity,
            supertype,
            fields,
            table: MethodTable::new(),
            keyword_sorter: OnceLock::new(),
        }
    }

    /// This identity's registry id.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Interned display name.
    pub(crate) fn name_symbol(&self) -> DefaultSymbol {
        self.name
    }

    /// Number of type parameters instantiations of this family carry.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Declared abstract supertype, if any. `None` only for `Any`.
    pub fn supertype(&self) -> Option<TypeId> {
        self.supertype
    }

    /// Field names for record-like identities (empty otherwise).
    pub(crate) fn field_names(&self) -> &[DefaultSymbol] {
        &self.fields
    }

    /// The method table owned by this identity.
    pub fn method_table(&self) -> &MethodTable {
        &self.table
    }
}

impl std::fmt::Debug for TypeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeIdentity")
            .field("id", &self.id)
            .field("arity", &self.arity)
            .field("supertype", &self.supertype)
            .finish_non_exhaustive()
    }
}

/// A concrete instantiation of a type family: the identity plus its type
/// arguments. Equality and hashing are structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub identity: TypeId,
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    /// An instantiation with no type arguments.
    pub fn nullary(identity: TypeId) -> Self {
        Self {
            identity,
            args: Vec::new(),
        }
    }

    /// An instantiation of a parametric family.
    pub fn parametric(identity: TypeId, args: Vec<TypeRef>) -> Self {
        Self { identity, args }
    }
}

impl Runtime {
    /// Check whether `a` is a subtype of `b`.
    ///
    /// Rules, in order:
    /// 1. Everything is a subtype of `Any`.
    /// 2. Same identity: type arguments are covariant, pairwise.
    /// 3. Otherwise `a`'s supertype chain must reach `b`'s identity, and
    ///    `b` must be a bare (unparameterized) abstract type; walking up
    ///    the chain discards argument information.
    pub fn is_subtype(&self, a: &TypeRef, b: &TypeRef) -> bool {
        if b.identity == crate::builtins::ANY {
            return true;
        }

        if a.identity == b.identity {
            return a.args.len() == b.args.len()
                && a.args
                    .iter()
                    .zip(&b.args)
                    .all(|(x, y)| self.is_subtype(x, y));
        }

        if !b.args.is_empty() {
            return false;
        }

        let mut current = self.identity(a.identity).supertype();
        while let Some(id) = current {
            if id == b.identity {
                return true;
            }
            current = self.identity(id).supertype();
        }
        false
    }

    /// Static specificity depth of a type: distance from `Any` along the
    /// supertype chain, plus the depth of every type argument. Used only
    /// to pre-order candidate scans; selection never depends on it.
    pub(crate) fn specificity_depth(&self, t: &TypeRef) -> u32 {
        let mut depth = 0u32;
        let mut current = self.identity(t.identity).supertype();
        while let Some(id) = current {
            depth += 1;
            current = self.identity(id).supertype();
        }
        depth + t.args.iter().map(|a| self.specificity_depth(a)).sum::<u32>()
    }

    /// Render a type for diagnostics, e.g. `List{Int}`.
    pub fn type_display(&self, t: &TypeRef) -> String {
        let name = self.type_name(t.identity);
        if t.args.is_empty() {
            name
        } else {
            let args: Vec<String> = t.args.iter().map(|a| self.type_display(a)).collect();
            format!("{}{{{}}}", name, args.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    #[test]
    fn builtin_lattice_subtyping() {
        let rt = Runtime::new();
        let int = TypeRef::nullary(builtins::INT);
        let number = TypeRef::nullary(builtins::NUMBER);
        let any = TypeRef::nullary(builtins::ANY);
        let str_ = TypeRef::nullary(builtins::STR);

        assert!(rt.is_subtype(&int, &number));
        assert!(rt.is_subtype(&int, &any));
        assert!(rt.is_subtype(&number, &any));
        assert!(!rt.is_subtype(&number, &int));
        assert!(!rt.is_subtype(&str_, &number));
        assert!(rt.is_subtype(&int, &int));
    }

    #[test]
    fn parametric_args_are_covariant() {
        let rt = Runtime::new();
        let list = rt.declare_type("List", 1, Some(builtins::ANY));

        let list_int = TypeRef::parametric(list, vec![TypeRef::nullary(builtins::INT)]);
        let list_number = TypeRef::parametric(list, vec![TypeRef::nullary(builtins::NUMBER)]);
        let list_str = TypeRef::parametric(list, vec![TypeRef::nullary(builtins::STR)]);

        assert!(rt.is_subtype(&list_int, &list_number));
        assert!(!rt.is_subtype(&list_number, &list_int));
        assert!(!rt.is_subtype(&list_int, &list_str));
        assert!(rt.is_subtype(&list_int, &TypeRef::nullary(builtins::ANY)));
    }

    #[test]
    fn supertype_chain_discards_arguments() {
        let rt = Runtime::new();
        let container = rt.declare_type("Container", 0, Some(builtins::ANY));
        let list = rt.declare_type("List", 1, Some(container));

        let list_int = TypeRef::parametric(list, vec![TypeRef::nullary(builtins::INT)]);
        // List{Int} <: Container, but not <: Container{Int}-style shapes.
        assert!(rt.is_subtype(&list_int, &TypeRef::nullary(container)));
    }

    #[test]
    fn specificity_depth_orders_the_chain() {
        let rt = Runtime::new();
        let any = TypeRef::nullary(builtins::ANY);
        let number = TypeRef::nullary(builtins::NUMBER);
        let int = TypeRef::nullary(builtins::INT);

        assert_eq!(rt.specificity_depth(&any), 0);
        assert!(rt.specificity_depth(&int) > rt.specificity_depth(&number));
        assert!(rt.specificity_depth(&number) > rt.specificity_depth(&any));
    }

    #[test]
    fn type_display_renders_parameters() {
        let rt = Runtime::new();
        let list = rt.declare_type("List", 1, Some(builtins::ANY));
        let list_int = TypeRef::parametric(list, vec![TypeRef::nullary(builtins::INT)]);
        assert_eq!(rt.type_display(&list_int), "List{Int}");
    }
}
