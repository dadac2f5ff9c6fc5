//! Dispatch error taxonomy.
//!
//! All dispatch failures are local, synchronous errors surfaced at the
//! `call`/`keyword_call` boundary. None of them are retried internally:
//! table state does not change between attempts, so a retry would only
//! reproduce the same failure. Failed lookups are memoized in the dispatch
//! cache as negative results, tagged with the generation current at the
//! time of the search.

use thiserror::Error;

/// Errors produced by dispatch resolution and keyword canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No method's pattern is applicable to the concrete argument types.
    #[error("no method matching {signature} for `{function}` ({considered} method(s) considered)")]
    NoMethod {
        /// Name of the generic function that was called.
        function: String,
        /// Rendered concrete argument signature, e.g. `(Int, Str)`.
        signature: String,
        /// How many entries the table held when the search failed.
        considered: usize,
    },

    /// More than one maximally specific applicable method exists and none
    /// strictly dominates the others.
    #[error("ambiguous call to `{function}` with {signature}: candidates {candidates:?}")]
    Ambiguous {
        /// Name of the generic function that was called.
        function: String,
        /// Rendered concrete argument signature.
        signature: String,
        /// Rendered pattern signatures of every maximal candidate.
        candidates: Vec<String>,
    },

    /// A spliced keyword-association element did not decompose into exactly
    /// a keyword name and a value. Raised before any default is evaluated.
    #[error("malformed keyword argument: {detail}")]
    MalformedKeyword {
        /// Description of the offending element.
        detail: String,
    },
}

impl DispatchError {
    /// True for failures produced by method resolution itself (as opposed
    /// to keyword canonicalization).
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            DispatchError::NoMethod { .. } | DispatchError::Ambiguous { .. }
        )
    }
}
