//! Method tables: entry storage, specificity search, and the generation-
//! validated dispatch cache.
//!
//! A table's entry list only ever grows. Redefining a method (a new entry
//! whose pattern is structurally identical to an existing one) appends
//! rather than edits in place, preserving referential stability of old
//! entry refs; the newer entry shadows the older one during lookup. Every
//! mutation bumps the global generation and records the new value as this
//! table's generation, which logically invalidates every prior cache
//! entry: a cached result is trusted only when its tag equals the current
//! table generation.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::registry::Runtime;
use crate::signature::{ArgumentSignature, PatternSignature};
use crate::types::TypeId;
use crate::value::MethodBody;

use super::result::LookupOutcome;
use super::specificity::{is_applicable, is_more_specific, pattern_rank, patterns_overlap};

/// Identity of a method entry, unique across the whole runtime and
/// monotonically increasing with definition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u32);

/// One method implementation: a pattern, a static specificity rank, and
/// an opaque callable handle. Immutable after construction and owned
/// exclusively by its table.
pub struct MethodEntry {
    id: EntryId,
    pattern: PatternSignature,
    rank: u32,
    /// Intrinsic entries are the sole catch-all of a builtin's table;
    /// lookup short-circuits the specificity search for them.
    intrinsic: bool,
    body: MethodBody,
}

impl MethodEntry {
    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn pattern(&self) -> &PatternSignature {
        &self.pattern
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn is_intrinsic(&self) -> bool {
        self.intrinsic
    }

    pub(crate) fn body(&self) -> &MethodBody {
        &self.body
    }
}

impl std::fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodEntry")
            .field("id", &self.id)
            .field("pattern", &self.pattern)
            .field("rank", &self.rank)
            .field("intrinsic", &self.intrinsic)
            .finish_non_exhaustive()
    }
}

/// A memoized lookup, positive or negative, tagged with the table
/// generation at which it was computed.
#[derive(Clone)]
struct CachedLookup {
    outcome: LookupOutcome,
    generation: u64,
}

/// Ordered method entries plus the dispatch cache for one type identity.
pub struct MethodTable {
    /// Insertion-ordered entries. Grown under `define_lock`, published by
    /// a short write-lock section; readers snapshot before or after a
    /// definition, never mid-edit.
    entries: RwLock<Vec<Arc<MethodEntry>>>,
    /// Exact concrete signature -> memoized outcome. Concurrent writers
    /// may race; last-writer-wins is safe because every entry is
    /// re-validated against the table generation before trust.
    cache: RwLock<FxHashMap<ArgumentSignature, CachedLookup>>,
    /// Serializes definitions on this table. Never held during dispatch.
    define_lock: Mutex<()>,
    /// Global generation value captured at this table's last mutation.
    generation: std::sync::atomic::AtomicU64,
}

impl MethodTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            cache: RwLock::new(FxHashMap::default()),
            define_lock: Mutex::new(()),
            generation: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Insert a new entry and bump the generation.
    ///
    /// Ambiguity against existing entries is deliberately not an error
    /// here: an ambiguous overlap that no call ever reaches is valid, so
    /// it is only logged and later reported by the dispatch that hits it.
    pub(crate) fn define(
        &self,
        rt: &Runtime,
        owner: TypeId,
        pattern: PatternSignature,
        body: MethodBody,
        intrinsic: bool,
    ) -> Arc<MethodEntry> {
        let _guard = self.define_lock.lock();

        let rank = pattern_rank(rt, &pattern);
        let entry = Arc::new(MethodEntry {
            id: rt.next_entry_id(),
            pattern,
            rank,
            intrinsic,
            body,
        });

        {
            let entries = self.entries.read();
            for existing in entries.iter() {
                if existing.pattern != entry.pattern
                    && patterns_overlap(rt, &existing.pattern, &entry.pattern)
                    && !is_more_specific(rt, &existing.pattern, &entry.pattern)
                    && !is_more_specific(rt, &entry.pattern, &existing.pattern)
                {
                    debug!(
                        owner = %rt.type_name(owner),
                        new = ?entry.id,
                        existing = ?existing.id,
                        "method definition introduces an ambiguous overlap"
                    );
                }
            }
        }

        // Insert-then-publish: the new entry becomes visible atomically,
        // then the generation bump invalidates stale cache entries.
        self.entries.write().push(entry.clone());
        let generation = rt.bump_generation();
        self.generation
            .store(generation, std::sync::atomic::Ordering::SeqCst);

        debug!(
            owner = %rt.type_name(owner),
            entry = ?entry.id,
            rank = entry.rank,
            generation,
            "defined method"
        );
        entry
    }

    /// Full search: filter applicable entries, drop shadowed duplicates,
    /// then select the unique maximum of the specificity partial order.
    pub(crate) fn lookup(&self, rt: &Runtime, concrete: &ArgumentSignature) -> LookupOutcome {
        let entries = self.entries.read().clone();

        // Intrinsic tables hold exactly one catch-all entry; there is
        // nothing to disambiguate.
        if let [only] = entries.as_slice() {
            if only.intrinsic {
                return LookupOutcome::Found(only.clone());
            }
        }

        let mut applicable: Vec<Arc<MethodEntry>> = entries
            .iter()
            .filter(|e| is_applicable(rt, &e.pattern, concrete))
            .cloned()
            .collect();

        if applicable.is_empty() {
            return LookupOutcome::NoMethod;
        }

        // Redefinition shadowing: among structurally identical patterns,
        // only the newest entry competes.
        let shadowed: Vec<bool> = applicable
            .iter()
            .map(|e| {
                applicable
                    .iter()
                    .any(|other| other.pattern == e.pattern && other.id > e.id)
            })
            .collect();
        let mut idx = 0;
        applicable.retain(|_| {
            let keep = !shadowed[idx];
            idx += 1;
            keep
        });

        // Scan order only; selection is decided by the partial order.
        applicable.sort_by(|a, b| b.rank.cmp(&a.rank).then(a.id.cmp(&b.id)));

        let maximal: Vec<Arc<MethodEntry>> = applicable
            .iter()
            .filter(|e| {
                !applicable
                    .iter()
                    .any(|other| other.id != e.id && is_more_specific(rt, &other.pattern, &e.pattern))
            })
            .cloned()
            .collect();

        if maximal.len() == 1 {
            LookupOutcome::Found(maximal.into_iter().next().unwrap())
        } else {
            LookupOutcome::Ambiguous(maximal)
        }
    }

    /// Cache-validated lookup. Memoizes failures as well, so a repeated
    /// futile search costs one map probe until the next definition.
    pub(crate) fn cached_lookup(&self, rt: &Runtime, concrete: &ArgumentSignature) -> LookupOutcome {
        // Read the generation before searching: if a definition lands in
        // between, the inserted entry is tagged stale and recomputed on
        // the next call rather than trusted.
        let table_generation = self.generation.load(std::sync::atomic::Ordering::Acquire);

        if let Some(cached) = self.cache.read().get(concrete) {
            if cached.generation == table_generation {
                trace!(?concrete, "dispatch cache hit");
                return cached.outcome.clone();
            }
            trace!(
                ?concrete,
                cached = cached.generation,
                current = table_generation,
                "dispatch cache entry stale"
            );
        }

        let outcome = self.lookup(rt, concrete);
        self.cache.write().insert(
            concrete.clone(),
            CachedLookup {
                outcome: outcome.clone(),
                generation: table_generation,
            },
        );
        outcome
    }

    // === Introspection ===

    pub(crate) fn entries_snapshot(&self) -> Vec<Arc<MethodEntry>> {
        self.entries.read().clone()
    }

    pub(crate) fn entry_count(&self) -> usize {
        self.entries.read().len()
    }

    pub(crate) fn cache_len(&self) -> usize {
        self.cache.read().len()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(std::sync::atomic::Ordering::Acquire)
    }
}
