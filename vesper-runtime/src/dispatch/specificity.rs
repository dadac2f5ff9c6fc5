//! Applicability and specificity over pattern signatures.
//!
//! This is the type-system oracle consumed by method lookup:
//! `is_applicable` decides whether a pattern covers a concrete call, and
//! `is_more_specific` is a strict partial order used to pick the winner
//! among applicable entries. Both reduce to pairwise nominal subtyping
//! over the lattice in [`crate::types`], with the rest element handled as
//! an explicit trailing constraint rather than a special case per call
//! site.

use crate::registry::Runtime;
use crate::signature::{ArgumentSignature, PatternSignature};

/// Whether `pattern` covers the concrete call signature: the arity is
/// accepted and the concrete type at every position is a subtype of the
/// pattern's constraint there.
pub fn is_applicable(rt: &Runtime, pattern: &PatternSignature, concrete: &ArgumentSignature) -> bool {
    if !pattern.accepts_arity(concrete.len()) {
        return false;
    }
    concrete.types().iter().enumerate().all(|(i, arg)| {
        match pattern.param_at(i) {
            Some(constraint) => rt.is_subtype(arg, constraint),
            None => false,
        }
    })
}

/// Strict partial order: `a` is more specific than `b` when `a`'s
/// constraint at every comparable position is a subtype of `b`'s, and the
/// relation is strict somewhere.
///
/// Rest handling:
/// - fixed vs fixed: arities must be equal; strictness comes from some
///   position being a proper subtype.
/// - fixed vs rest: a fixed pattern whose positions all fit under the
///   open pattern's coverage is strictly more specific: it excludes the
///   arities the open pattern accepts.
/// - rest vs fixed: never more specific.
/// - rest vs rest: compared position-wise over the longer fixed prefix
///   plus the rest elements.
pub fn is_more_specific(rt: &Runtime, a: &PatternSignature, b: &PatternSignature) -> bool {
    match (a.rest(), b.rest()) {
        (None, None) => {
            if a.fixed_len() != b.fixed_len() {
                return false;
            }
            let mut some_strict = false;
            for (pa, pb) in a.params().iter().zip(b.params()) {
                if !rt.is_subtype(pa, pb) {
                    return false;
                }
                if !rt.is_subtype(pb, pa) {
                    some_strict = true;
                }
            }
            some_strict
        }
        (None, Some(_)) => {
            if a.fixed_len() < b.fixed_len() {
                return false;
            }
            a.params().iter().enumerate().all(|(i, pa)| {
                b.param_at(i).is_some_and(|pb| rt.is_subtype(pa, pb))
            })
        }
        (Some(_), None) => false,
        (Some(ra), Some(rb)) => {
            let prefix = a.fixed_len().max(b.fixed_len());
            let mut some_strict = false;
            for i in 0..prefix {
                let (Some(pa), Some(pb)) = (a.param_at(i), b.param_at(i)) else {
                    return false;
                };
                if !rt.is_subtype(pa, pb) {
                    return false;
                }
                if !rt.is_subtype(pb, pa) {
                    some_strict = true;
                }
            }
            if !rt.is_subtype(ra, rb) {
                return false;
            }
            if !rt.is_subtype(rb, ra) {
                some_strict = true;
            }
            some_strict
        }
    }
}

/// Whether two patterns can both apply to some call: their accepted
/// arities intersect and every shared position is comparable (one
/// constraint a subtype of the other). Used only for definition-time
/// diagnostics; dispatch correctness never depends on it.
pub fn patterns_overlap(rt: &Runtime, a: &PatternSignature, b: &PatternSignature) -> bool {
    let arities_intersect = match (a.rest(), b.rest()) {
        (None, None) => a.fixed_len() == b.fixed_len(),
        (None, Some(_)) => a.fixed_len() >= b.fixed_len(),
        (Some(_), None) => b.fixed_len() >= a.fixed_len(),
        (Some(_), Some(_)) => true,
    };
    if !arities_intersect {
        return false;
    }
    let shared = a.fixed_len().min(b.fixed_len());
    (0..shared).all(|i| {
        let (Some(pa), Some(pb)) = (a.param_at(i), b.param_at(i)) else {
            return false;
        };
        rt.is_subtype(pa, pb) || rt.is_subtype(pb, pa)
    })
}

/// Static specificity rank of a pattern: the summed lattice depth of its
/// fixed positions. Ranks pre-order candidate scans from most to least
/// specific; the partial order above always has the final say.
pub fn pattern_rank(rt: &Runtime, pattern: &PatternSignature) -> u32 {
    let fixed: u32 = pattern
        .params()
        .iter()
        .map(|t| rt.specificity_depth(t))
        .sum();
    // An open pattern is ranked below any fixed pattern with the same
    // positional depth.
    if pattern.rest().is_some() {
        fixed.saturating_sub(1)
    } else {
        fixed
    }
}
