//! Runtime values and the opaque callable handle.
//!
//! Every value has exactly one owning [`TypeId`], and that identity's
//! method table is consulted uniformly whether the value is a plain
//! record, a closure, a generic-function singleton, or an intrinsic.
//! There is no "is this callable?" branch anywhere in the engine; a value
//! is callable exactly when its type's table resolves the call.

use std::sync::Arc;

use string_interner::DefaultSymbol;

use crate::error::DispatchError;
use crate::registry::Runtime;
use crate::types::{TypeId, TypeRef};

/// Opaque invocable unit stored in a method entry.
///
/// The engine never inspects a body; it only invokes it with the full
/// argument list, callee included at position 0, and returns the result
/// unchanged. Bodies may themselves dispatch (closures calling other
/// generic functions), which is why they receive the runtime.
pub type MethodBody = Arc<dyn Fn(&Runtime, &[Value]) -> Result<Value, DispatchError> + Send + Sync>;

/// Interned keyword name, as used in keyword-argument associations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeywordName(pub(crate) DefaultSymbol);

/// An ordered sequence of keyword/value pairs.
///
/// Duplicate names are permitted; lookups take the leftmost occurrence.
#[derive(Debug, Clone)]
pub struct AssocList {
    pairs: Vec<(KeywordName, Value)>,
}

impl AssocList {
    pub fn new(pairs: Vec<(KeywordName, Value)>) -> Self {
        Self { pairs }
    }

    pub fn empty() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Leftmost value bound to `name`, if any.
    pub fn get(&self, name: KeywordName) -> Option<&Value> {
        self.pairs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn pairs(&self) -> &[(KeywordName, Value)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// An instance of a user-declared (or synthesized) type family.
#[derive(Debug, Clone)]
pub struct InstanceData {
    /// The concrete instantiation this value belongs to.
    pub ty: TypeRef,
    /// Field values, in declaration order.
    pub fields: Vec<Value>,
}

/// A Vesper runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Int8(i8),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Keyword(KeywordName),
    Tuple(Arc<[Value]>),
    Assoc(Arc<AssocList>),
    Instance(Arc<InstanceData>),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(items.into())
    }

    pub fn assoc(pairs: Vec<(KeywordName, Value)>) -> Self {
        Value::Assoc(Arc::new(AssocList::new(pairs)))
    }

    pub fn empty_assoc() -> Self {
        Value::Assoc(Arc::new(AssocList::empty()))
    }

    pub fn instance(ty: TypeRef, fields: Vec<Value>) -> Self {
        Value::Instance(Arc::new(InstanceData { ty, fields }))
    }

    /// The concrete type of this value, i.e. the dispatch key.
    pub fn type_ref(&self) -> TypeRef {
        use crate::builtins;
        match self {
            Value::Unit => TypeRef::nullary(builtins::UNIT),
            Value::Bool(_) => TypeRef::nullary(builtins::BOOL),
            Value::Int8(_) => TypeRef::nullary(builtins::INT8),
            Value::Int(_) => TypeRef::nullary(builtins::INT),
            Value::Float(_) => TypeRef::nullary(builtins::FLOAT),
            Value::Str(_) => TypeRef::nullary(builtins::STR),
            Value::Keyword(_) => TypeRef::nullary(builtins::KEYWORD),
            Value::Tuple(_) => TypeRef::nullary(builtins::TUPLE),
            Value::Assoc(_) => TypeRef::nullary(builtins::ASSOC),
            Value::Instance(data) => data.ty.clone(),
        }
    }

    /// The owning identity of this value's type.
    pub fn type_id(&self) -> TypeId {
        self.type_ref().identity
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_assoc(&self) -> Option<&AssocList> {
        match self {
            Value::Assoc(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&InstanceData> {
        match self {
            Value::Instance(data) => Some(data),
            _ => None,
        }
    }

    /// Field of an instance by position (captured values of a closure).
    pub fn field(&self, index: usize) -> Option<&Value> {
        self.as_instance().and_then(|data| data.fields.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    #[test]
    fn primitive_values_have_builtin_identities() {
        assert_eq!(Value::Int(1).type_id(), builtins::INT);
        assert_eq!(Value::Int8(1).type_id(), builtins::INT8);
        assert_eq!(Value::Bool(true).type_id(), builtins::BOOL);
        assert_eq!(Value::str("x").type_id(), builtins::STR);
        assert_eq!(Value::Unit.type_id(), builtins::UNIT);
    }

    #[test]
    fn assoc_lookup_takes_leftmost() {
        let rt = Runtime::new();
        let color = rt.keyword("color");
        let assoc = AssocList::new(vec![
            (color, Value::str("red")),
            (color, Value::str("blue")),
        ]);
        assert_eq!(assoc.get(color).and_then(|v| v.as_str()), Some("red"));
    }
}
