//! Dispatch lookup outcomes.

use std::sync::Arc;

use super::table::MethodEntry;

/// Result of resolving a concrete signature against a method table.
///
/// Failures are first-class outcomes rather than errors at this level so
/// that negative lookups can be memoized in the dispatch cache; the
/// engine converts them to [`crate::DispatchError`] at the call boundary.
#[derive(Clone)]
pub enum LookupOutcome {
    /// A unique most-specific applicable entry.
    Found(Arc<MethodEntry>),
    /// No entry's pattern is applicable.
    NoMethod,
    /// Multiple maximal applicable entries, none dominating the others.
    Ambiguous(Vec<Arc<MethodEntry>>),
}

impl LookupOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, LookupOutcome::Found(_))
    }

    /// The resolved entry, if the lookup succeeded.
    pub fn entry(&self) -> Option<&Arc<MethodEntry>> {
        match self {
            LookupOutcome::Found(entry) => Some(entry),
            _ => None,
        }
    }
}

impl std::fmt::Debug for LookupOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupOutcome::Found(entry) => f.debug_tuple("Found").field(&entry.id()).finish(),
            LookupOutcome::NoMethod => f.write_str("NoMethod"),
            LookupOutcome::Ambiguous(entries) => {
                let ids: Vec<_> = entries.iter().map(|e| e.id()).collect();
                f.debug_tuple("Ambiguous").field(&ids).finish()
            }
        }
    }
}
