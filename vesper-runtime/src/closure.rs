//! Closure records.
//!
//! A closure is a nominal type: one identity per syntactic closure
//! expression, with a field per captured variable, and a single method on
//! that identity's table implementing the body with the callee position
//! bound to "any instance of this identity". Instances are created per
//! evaluation, carrying the captured values of that evaluation.
//!
//! Calling a closure is therefore ordinary dispatch; the engine has no
//! awareness that a callee is a closure.

use crate::builtins;
use crate::registry::Runtime;
use crate::signature::PatternSignature;
use crate::types::{TypeId, TypeRef};
use crate::value::{MethodBody, Value};

impl Runtime {
    /// Synthesize the identity and sole method for one syntactic closure
    /// expression. Called once per expression; the returned id is reused
    /// across evaluations.
    ///
    /// `captures` names the captured variables (one field each, addressed
    /// by position inside the body via `argv[0].field(i)`); `params` and
    /// `rest` form the closure's declared argument pattern.
    pub fn declare_closure(
        &self,
        name: &str,
        captures: &[&str],
        params: Vec<TypeRef>,
        rest: Option<TypeRef>,
        body: MethodBody,
    ) -> TypeId {
        let ty = self.declare_type_with_fields(name, 0, Some(builtins::ANY), captures);

        let mut full = Vec::with_capacity(params.len() + 1);
        full.push(TypeRef::nullary(ty));
        full.extend(params);
        self.define_method(ty, PatternSignature::new(full, rest), body);
        ty
    }

    /// Instantiate a closure value with the current captured values.
    pub fn make_closure(&self, ty: TypeId, captured: Vec<Value>) -> Value {
        Value::instance(TypeRef::nullary(ty), captured)
    }
}
