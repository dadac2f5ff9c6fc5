//! Process-wide runtime registry.
//!
//! The [`Runtime`] owns the single registry of type identities (each with
//! its 1:1 method table), the string interner for type and keyword names,
//! and the global invalidation generation. All method-table mutation
//! funnels through [`Runtime::define_method`]; nothing edits a table
//! directly, so the generation invariant is enforced centrally.
//!
//! The registry is created at process start and torn down only at process
//! exit; identities are never destroyed during normal operation.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use string_interner::{DefaultStringInterner, DefaultSymbol};
use tracing::debug;

use crate::builtins;
use crate::dispatch::{EntryId, MethodEntry};
use crate::signature::PatternSignature;
use crate::types::{TypeId, TypeIdentity, TypeRef};
use crate::value::{KeywordName, MethodBody, Value};

/// The generic-function runtime: type registry, method tables, and the
/// global generation counter.
///
/// Dispatch entry points take `&self` and are safe to call from many
/// threads; definitions may run concurrently with ongoing dispatch.
pub struct Runtime {
    names: Mutex<DefaultStringInterner>,
    types: RwLock<Vec<Arc<TypeIdentity>>>,
    /// Name index for introspection; insertion-ordered so diagnostics
    /// enumerate deterministically. Last declaration wins per name.
    by_name: RwLock<IndexMap<DefaultSymbol, TypeId>>,
    /// Bumped exactly once per successful method definition, anywhere.
    generation: AtomicU64,
    next_entry: AtomicU32,
}

impl Runtime {
    /// Create a runtime with the builtin type lattice registered.
    pub fn new() -> Self {
        let rt = Self {
            names: Mutex::new(DefaultStringInterner::new()),
            types: RwLock::new(Vec::new()),
            by_name: RwLock::new(IndexMap::new()),
            generation: AtomicU64::new(0),
            next_entry: AtomicU32::new(0),
        };
        builtins::register_builtin_types(&rt);
        rt
    }

    // === Type declaration ===

    /// Declare a new type family. The identity and its (empty) method
    /// table are created together and live for the process lifetime.
    pub fn declare_type(&self, name: &str, arity: usize, supertype: Option<TypeId>) -> TypeId {
        self.declare_type_with_fields(name, arity, supertype, &[])
    }

    /// Declare a record-like type family with named fields (used for
    /// closure records; fields are addressed by position at runtime).
    pub fn declare_type_with_fields(
        &self,
        name: &str,
        arity: usize,
        supertype: Option<TypeId>,
        fields: &[&str],
    ) -> TypeId {
        let name_sym = self.intern(name);
        let field_syms: Vec<DefaultSymbol> = fields.iter().map(|f| self.intern(f)).collect();

        let mut types = self.types.write();
        let id = TypeId(types.len() as u32);
        types.push(Arc::new(TypeIdentity::new(
            id, name_sym, arity, supertype, field_syms,
        )));
        drop(types);

        self.by_name.write().insert(name_sym, id);
        debug!(type_name = name, id = id.index(), "declared type identity");
        id
    }

    /// Fetch an identity by id.
    pub fn identity(&self, id: TypeId) -> Arc<TypeIdentity> {
        self.types.read()[id.index()].clone()
    }

    /// Look up a type identity by display name (last declaration wins
    /// when names collide; names are diagnostics-only).
    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        let sym = self.names.lock().get(name)?;
        self.by_name.read().get(&sym).copied()
    }

    /// Number of declared identities.
    pub fn type_count(&self) -> usize {
        self.types.read().len()
    }

    // === Names ===

    pub(crate) fn intern(&self, s: &str) -> DefaultSymbol {
        self.names.lock().get_or_intern(s)
    }

    pub(crate) fn resolve_symbol(&self, sym: DefaultSymbol) -> String {
        self.names
            .lock()
            .resolve(sym)
            .unwrap_or("<unknown>")
            .to_string()
    }

    /// Intern a keyword name for keyword-argument associations.
    pub fn keyword(&self, name: &str) -> KeywordName {
        KeywordName(self.intern(name))
    }

    /// Resolve a keyword name back to its text.
    pub fn keyword_text(&self, name: KeywordName) -> String {
        self.resolve_symbol(name.0)
    }

    /// Display name of a type identity.
    pub fn type_name(&self, id: TypeId) -> String {
        self.resolve_symbol(self.identity(id).name_symbol())
    }

    // === Generation counter ===

    /// Current value of the global invalidation generation.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Increment the global generation. The `SeqCst` read-modify-write
    /// makes the bump visible to all threads before `define` returns.
    pub(crate) fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn next_entry_id(&self) -> EntryId {
        EntryId(self.next_entry.fetch_add(1, Ordering::Relaxed))
    }

    // === Functions and methods ===

    /// Create a generic function: a singleton value whose own identity
    /// owns the function's method table. The function dispatches on
    /// itself at position 0 like any other value.
    pub fn define_function(&self, name: &str) -> Value {
        let ty = self.declare_type(name, 0, Some(builtins::ANY));
        Value::instance(TypeRef::nullary(ty), Vec::new())
    }

    /// Register a method on the table owned by `ty`.
    ///
    /// The pattern's position 0 constrains the callee itself. Definition
    /// never fails due to ambiguity: an ambiguous overlap is reported at
    /// the first dispatch that actually hits it, not here.
    pub fn define_method(
        &self,
        ty: TypeId,
        pattern: PatternSignature,
        body: MethodBody,
    ) -> Arc<MethodEntry> {
        self.identity(ty).table.define(self, ty, pattern, body, false)
    }

    /// Convenience form of [`Runtime::define_method`] for function
    /// values: prepends the callee's own type to the argument pattern.
    pub fn add_method(
        &self,
        function: &Value,
        params: Vec<TypeRef>,
        rest: Option<TypeRef>,
        body: MethodBody,
    ) -> Arc<MethodEntry> {
        let mut full = Vec::with_capacity(params.len() + 1);
        full.push(function.type_ref());
        full.extend(params);
        self.define_method(function.type_id(), PatternSignature::new(full, rest), body)
    }

    // === Introspection (read-only) ===

    /// Snapshot of a table's entries, in insertion order.
    pub fn method_entries(&self, ty: TypeId) -> Vec<Arc<MethodEntry>> {
        self.identity(ty).table.entries_snapshot()
    }

    /// Number of entries in a table.
    pub fn entry_count(&self, ty: TypeId) -> usize {
        self.identity(ty).table.entry_count()
    }

    /// Number of memoized lookups (positive and negative) in a table's
    /// dispatch cache.
    pub fn cache_len(&self, ty: TypeId) -> usize {
        self.identity(ty).table.cache_len()
    }

    /// The global generation value captured at the table's last mutation.
    pub fn table_generation(&self, ty: TypeId) -> u64 {
        self.identity(ty).table.generation()
    }

    /// Field names of a record-like identity (closure captures), in
    /// declaration order.
    pub fn field_names(&self, ty: TypeId) -> Vec<String> {
        self.identity(ty)
            .field_names()
            .iter()
            .map(|sym| self.resolve_symbol(*sym))
            .collect()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("types", &self.types.read().len())
            .field("generation", &self.current_generation())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_identity_is_stable_and_named() {
        let rt = Runtime::new();
        let point = rt.declare_type("Point", 0, Some(builtins::ANY));
        assert_eq!(rt.lookup_type("Point"), Some(point));
        assert_eq!(rt.type_name(point), "Point");
        assert_eq!(rt.identity(point).id(), point);
    }

    #[test]
    fn define_method_bumps_generation_once() {
        let rt = Runtime::new();
        let f = rt.define_function("f");
        let before = rt.current_generation();
        rt.add_method(&f, vec![], None, Arc::new(|_, _| Ok(Value::Unit)));
        assert_eq!(rt.current_generation(), before + 1);
    }

    #[test]
    fn function_value_is_singleton_instance_of_its_identity() {
        let rt = Runtime::new();
        let f = rt.define_function("f");
        let ty = f.type_id();
        assert_eq!(rt.type_name(ty), "f");
        assert_eq!(rt.entry_count(ty), 0);
    }
}
