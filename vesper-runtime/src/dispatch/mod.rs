//! Multiple dispatch resolution for Vesper.
//!
//! This module implements the engine that resolves a call site
//! `f(a1, ..., an)` to a concrete method based on the runtime types of
//! *all* arguments, not just a receiver.
//!
//! # Algorithm Overview
//!
//! 1. **Locate the table**: the callee's own runtime type owns the method
//!    table; the callee participates in dispatch at position 0 like any
//!    other argument, so parametrized callables (closures, intrinsics,
//!    generic-function singletons) need no special path.
//! 2. **Consult the cache**: results are memoized per exact concrete
//!    signature and validated against the table generation before trust.
//! 3. **Full search on miss**: filter applicable entries, then select the
//!    unique maximum of the specificity partial order.
//! 4. **Invoke**: call the entry's opaque body with the full argument
//!    list (callee included) and return its result unchanged.
//!
//! NoMethod and Ambiguous failures are surfaced to the caller and never
//! retried: no state changes between attempts, so a retry would only
//! reproduce the failure.

mod result;
mod specificity;
mod table;


pub use result::LookupOutcome;
pub use specificity::{is_applicable, is_more_specific, pattern_rank, patterns_overlap};
pub use table::{EntryId, MethodEntry, MethodTable};

use std::sync::Arc;

use crate::error::DispatchError;
use crate::registry::Runtime;
use crate::signature::ArgumentSignature;
use crate::types::TypeIdentity;
use crate::value::Value;

impl Runtime {
    /// Dispatch a call: resolve the best-matching method for the concrete
    /// argument types and invoke it.
    ///
    /// The body's result is returned directly; the engine neither wraps
    /// nor inspects it.
    pub fn call(&self, callee: &Value, args: &[Value]) -> Result<Value, DispatchError> {
        let entry = self.resolve(callee, args)?;
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(callee.clone());
        argv.extend_from_slice(args);
        (entry.body())(self, &argv)
    }

    /// Resolve a call to its method entry through the dispatch cache.
    pub fn resolve(&self, callee: &Value, args: &[Value]) -> Result<Arc<MethodEntry>, DispatchError> {
        let identity = self.identity(callee.type_id());
        let concrete = ArgumentSignature::of_call(callee, args);
        let outcome = identity.table.cached_lookup(self, &concrete);
        self.into_entry(&identity, &concrete, outcome)
    }

    /// Resolve a call with the full search, bypassing the cache. Selects
    /// the same entry as [`Runtime::resolve`] for any fixed table state;
    /// only the cost differs.
    pub fn resolve_uncached(
        &self,
        callee: &Value,
        args: &[Value],
    ) -> Result<Arc<MethodEntry>, DispatchError> {
        let identity = self.identity(callee.type_id());
        let concrete = ArgumentSignature::of_call(callee, args);
        let outcome = identity.table.lookup(self, &concrete);
        self.into_entry(&identity, &concrete, outcome)
    }

    fn into_entry(
        &self,
        identity: &TypeIdentity,
        concrete: &ArgumentSignature,
        outcome: LookupOutcome,
    ) -> Result<Arc<MethodEntry>, DispatchError> {
        match outcome {
            LookupOutcome::Found(entry) => Ok(entry),
            LookupOutcome::NoMethod => Err(DispatchError::NoMethod {
                function: self.type_name(identity.id()),
                signature: self.render_signature(concrete),
                considered: identity.table.entry_count(),
            }),
            LookupOutcome::Ambiguous(candidates) => Err(DispatchError::Ambiguous {
                function: self.type_name(identity.id()),
                signature: self.render_signature(concrete),
                candidates: candidates
                    .iter()
                    .map(|entry| self.render_pattern(entry.pattern()))
                    .collect(),
            }),
        }
    }

    /// Render a concrete signature for diagnostics, omitting the callee
    /// position (the function name carries that information).
    pub(crate) fn render_signature(&self, sig: &ArgumentSignature) -> String {
        let args: Vec<String> = sig
            .types()
            .iter()
            .skip(1)
            .map(|t| self.type_display(t))
            .collect();
        format!("({})", args.join(", "))
    }

    pub(crate) fn render_pattern(&self, pattern: &crate::signature::PatternSignature) -> String {
        let mut parts: Vec<String> = pattern
            .params()
            .iter()
            .skip(1)
            .map(|t| self.type_display(t))
            .collect();
        if let Some(rest) = pattern.rest() {
            parts.push(format!("{}...", self.type_display(rest)));
        }
        format!("({})", parts.join(", "))
    }
}
