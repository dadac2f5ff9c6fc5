//! Argument signatures: concrete call shapes and method patterns.
//!
//! An [`ArgumentSignature`] is the ordered tuple of concrete argument
//! types at a call site; a [`PatternSignature`] is a method's declared
//! applicability pattern, which may contain abstract types and an
//! optional trailing rest element ("any number of further arguments of
//! this type"). In both, position 0 is the callee's own type: the callee
//! can itself carry type parameters that affect applicability, so it
//! participates in specificity resolution like any other argument.

use crate::types::TypeRef;
use crate::value::Value;

/// Concrete argument types of one call, callee first. Fixed length once
/// constructed; equality is structural. Used as the dispatch-cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgumentSignature(Vec<TypeRef>);

impl ArgumentSignature {
    pub fn new(types: Vec<TypeRef>) -> Self {
        Self(types)
    }

    /// Build the signature of a call: the callee's concrete type at
    /// position 0, followed by the concrete types of the arguments.
    pub fn of_call(callee: &Value, args: &[Value]) -> Self {
        let mut types = Vec::with_capacity(args.len() + 1);
        types.push(callee.type_ref());
        types.extend(args.iter().map(Value::type_ref));
        Self(types)
    }

    pub fn types(&self) -> &[TypeRef] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A method's declared applicability pattern: fixed positional types plus
/// an optional rest element matching any number of trailing arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternSignature {
    params: Vec<TypeRef>,
    rest: Option<TypeRef>,
}

impl PatternSignature {
    pub fn new(params: Vec<TypeRef>, rest: Option<TypeRef>) -> Self {
        Self { params, rest }
    }

    /// A pattern with only fixed positions.
    pub fn exact(params: Vec<TypeRef>) -> Self {
        Self { params, rest: None }
    }

    pub fn fixed_len(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    pub fn rest(&self) -> Option<&TypeRef> {
        self.rest.as_ref()
    }

    /// Whether this pattern can match a call of `n` arguments (callee
    /// included).
    pub fn accepts_arity(&self, n: usize) -> bool {
        if self.rest.is_some() {
            n >= self.params.len()
        } else {
            n == self.params.len()
        }
    }

    /// The constraint governing position `i`, falling back to the rest
    /// element past the fixed positions. `None` when the pattern cannot
    /// cover position `i` at all.
    pub fn param_at(&self, i: usize) -> Option<&TypeRef> {
        self.params.get(i).or(self.rest.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::registry::Runtime;

    #[test]
    fn call_signature_places_callee_first() {
        let rt = Runtime::new();
        let f = rt.define_function("f");
        let sig = ArgumentSignature::of_call(&f, &[Value::Int(1), Value::Bool(true)]);
        assert_eq!(sig.len(), 3);
        assert_eq!(sig.types()[0], f.type_ref());
        assert_eq!(sig.types()[1], TypeRef::nullary(builtins::INT));
        assert_eq!(sig.types()[2], TypeRef::nullary(builtins::BOOL));
    }

    #[test]
    fn exact_pattern_arity() {
        let p = PatternSignature::exact(vec![
            TypeRef::nullary(builtins::ANY),
            TypeRef::nullary(builtins::INT),
        ]);
        assert!(p.accepts_arity(2));
        assert!(!p.accepts_arity(1));
        assert!(!p.accepts_arity(3));
        assert!(p.param_at(2).is_none());
    }

    #[test]
    fn rest_pattern_arity() {
        let p = PatternSignature::new(
            vec![TypeRef::nullary(builtins::ANY)],
            Some(TypeRef::nullary(builtins::NUMBER)),
        );
        assert!(p.accepts_arity(1));
        assert!(p.accepts_arity(4));
        assert!(!p.accepts_arity(0));
        assert_eq!(p.param_at(3), Some(&TypeRef::nullary(builtins::NUMBER)));
    }
}
